//! Vehicle → nation resolution.
//!
//! Ground vehicles (and some aircraft) carry their nation in a name prefix such as `us_` or
//! `germ_`. Everything else is looked up in a plain-text catalog made of sections like
//!
//! ```text
//! ==== France ====
//! d_520
//! mb_152c1
//! ```
//!
//! A vehicle belongs to the section that encloses the first occurrence of its name in the
//! catalog text.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use hashbrown::HashMap;
use log::{debug, trace, warn};
use memchr::memmem;
use serde::{Serialize, Serializer};

/// Catalog shipped with the crate, used when no other catalog is configured.
pub const BUNDLED_CATALOG: &str = include_str!("../resources/nation_catalog.txt");

/// Case-sensitive name prefixes, tried in order.
pub const NATION_PREFIXES: &[(&str, &str)] = &[
    ("us_", "USA"),
    ("germ_", "Germany"),
    ("ussr_", "USSR"),
    ("uk_", "Great Britain"),
    ("jp_", "Japan"),
    ("cn_", "China"),
    ("it_", "Italy"),
    ("fr_", "France"),
    ("sw_", "Sweden"),
    ("il_", "Israel"),
];

const SECTION_DELIMITER: &str = "====";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Nation {
    Known(String),
    /// Neither the prefix table nor the catalog know the vehicle.
    Unknown,
}

impl Nation {
    pub fn as_str(&self) -> &str {
        match self {
            Nation::Known(name) => name,
            Nation::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Nation::Known(_))
    }
}

impl fmt::Display for Nation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Nation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where the text catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Bundled,
    Text(String),
    /// Read on the first lookup that misses the prefix table.
    Path(PathBuf),
    /// Prefix table only.
    Empty,
}

#[derive(Debug)]
struct CatalogSection {
    nation: String,
    /// Offset of the delimiter line in the catalog text.
    start: usize,
}

#[derive(Debug, Default)]
struct ParsedCatalog {
    text: String,
    /// Sorted by `start`.
    sections: Vec<CatalogSection>,
}

fn section_name(line: &str) -> Option<&str> {
    let line = line.trim();
    let inner = line
        .strip_prefix(SECTION_DELIMITER)?
        .strip_suffix(SECTION_DELIMITER)?
        .trim();

    (!inner.is_empty()).then_some(inner)
}

impl ParsedCatalog {
    fn parse(text: String) -> Self {
        let mut sections = Vec::new();
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            if let Some(nation) = section_name(line) {
                sections.push(CatalogSection {
                    nation: nation.to_owned(),
                    start: offset,
                });
            }
            offset += line.len();
        }

        debug!("nation catalog has {} sections", sections.len());
        ParsedCatalog { text, sections }
    }

    fn nation_of(&self, vehicle: &str) -> Option<&str> {
        if vehicle.is_empty() {
            return None;
        }

        let pos = memmem::find(self.text.as_bytes(), vehicle.as_bytes())?;
        let enclosing = self.sections.partition_point(|s| s.start <= pos);
        enclosing
            .checked_sub(1)
            .map(|i| self.sections[i].nation.as_str())
    }
}

/// The prefix table plus a lazily loaded text catalog.
///
/// The catalog is read-only once loaded and may be shared between decoders on several threads.
#[derive(Debug)]
pub struct NationCatalog {
    prefixes: &'static [(&'static str, &'static str)],
    source: CatalogSource,
    parsed: OnceLock<ParsedCatalog>,
}

impl Default for NationCatalog {
    fn default() -> Self {
        NationCatalog::new(CatalogSource::Bundled)
    }
}

impl NationCatalog {
    pub fn new(source: CatalogSource) -> Self {
        NationCatalog {
            prefixes: NATION_PREFIXES,
            source,
            parsed: OnceLock::new(),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        NationCatalog::new(CatalogSource::Text(text.into()))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        NationCatalog::new(CatalogSource::Path(path.into()))
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Whether the text catalog has been read yet.
    pub fn is_loaded(&self) -> bool {
        self.parsed.get().is_some()
    }

    pub fn prefix_nation(&self, vehicle: &str) -> Option<&'static str> {
        self.prefixes
            .iter()
            .find(|&&(prefix, _)| vehicle.starts_with(prefix))
            .map(|&(_, nation)| nation)
    }

    pub fn catalog_nation(&self, vehicle: &str) -> Option<&str> {
        self.parsed().nation_of(vehicle)
    }

    /// Uncached lookup: prefix table first, then the text catalog.
    pub fn lookup(&self, vehicle: &str) -> Nation {
        if let Some(nation) = self.prefix_nation(vehicle) {
            return Nation::Known(nation.to_owned());
        }

        match self.catalog_nation(vehicle) {
            Some(nation) => Nation::Known(nation.to_owned()),
            None => Nation::Unknown,
        }
    }

    fn parsed(&self) -> &ParsedCatalog {
        self.parsed.get_or_init(|| {
            let text = match &self.source {
                CatalogSource::Bundled => BUNDLED_CATALOG.to_owned(),
                CatalogSource::Text(text) => text.clone(),
                CatalogSource::Path(path) => match std::fs::read_to_string(path) {
                    Ok(text) => {
                        debug!("loaded nation catalog from {}", path.display());
                        text
                    }
                    Err(e) => {
                        warn!(
                            "failed to read nation catalog {}: {}, catalog lookups will fail",
                            path.display(),
                            e
                        );
                        String::new()
                    }
                },
                CatalogSource::Empty => String::new(),
            };
            ParsedCatalog::parse(text)
        })
    }
}

/// Memoizes nation lookups for the duration of one decode.
///
/// Created per replay and dropped with it, so results never outlive the catalog they came from.
#[derive(Debug)]
pub struct NationResolver<'c> {
    catalog: &'c NationCatalog,
    cache: HashMap<String, Nation>,
}

impl<'c> NationResolver<'c> {
    pub fn new(catalog: &'c NationCatalog) -> Self {
        NationResolver {
            catalog,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, vehicle: &str) -> Nation {
        if let Some(nation) = self.cache.get(vehicle) {
            return nation.clone();
        }

        let nation = self.catalog.lookup(vehicle);
        trace!("`{}` resolves to {}", vehicle, nation);
        self.cache.insert(vehicle.to_owned(), nation.clone());
        nation
    }

    /// Number of distinct vehicle names resolved so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
