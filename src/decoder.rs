use std::path::Path;

use log::{debug, info};

use crate::err::{DecodeResult, FormatError};
use crate::nation::{CatalogSource, NationCatalog, NationResolver};
use crate::players::decode_players;
use crate::record::{MatchRecord, assemble_records};
use crate::scores::decode_scores;
use crate::sections::ReplaySections;
use crate::vehicles::scan_vehicle_usage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderSettings {
    catalog: CatalogSource,
    resolve_nations: bool,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        DecoderSettings {
            catalog: CatalogSource::Bundled,
            resolve_nations: true,
        }
    }
}

impl DecoderSettings {
    pub fn new() -> Self {
        DecoderSettings::default()
    }

    /// Sets the text catalog consulted for vehicles without a nation prefix.
    pub fn catalog(mut self, source: CatalogSource) -> Self {
        self.catalog = source;
        self
    }

    /// Shorthand for `catalog(CatalogSource::Path(..))`.
    pub fn catalog_path(self, path: impl AsRef<Path>) -> Self {
        self.catalog(CatalogSource::Path(path.as_ref().to_path_buf()))
    }

    /// When disabled, every record's nation is `Unknown` and the catalog is never read.
    pub fn resolve_nations(mut self, resolve_nations: bool) -> Self {
        self.resolve_nations = resolve_nations;
        self
    }

    pub fn get_catalog(&self) -> &CatalogSource {
        &self.catalog
    }

    pub fn should_resolve_nations(&self) -> bool {
        self.resolve_nations
    }
}

/// Decodes the match results of `.wrpl` replays.
///
/// One decoder can be reused for many replays; the nation catalog is loaded once and shared,
/// while nation lookups are cached per replay.
#[derive(Debug)]
pub struct ReplayDecoder {
    settings: DecoderSettings,
    catalog: NationCatalog,
}

impl Default for ReplayDecoder {
    fn default() -> Self {
        ReplayDecoder::new()
    }
}

impl ReplayDecoder {
    pub fn new() -> Self {
        ReplayDecoder::with_configuration(DecoderSettings::default())
    }

    pub fn with_configuration(settings: DecoderSettings) -> Self {
        let catalog = NationCatalog::new(settings.get_catalog().clone());
        ReplayDecoder { settings, catalog }
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &NationCatalog {
        &self.catalog
    }

    pub fn decode_path(&self, path: impl AsRef<Path>) -> DecodeResult<Vec<MatchRecord>> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FormatError::FailedToOpenFile {
            path: path.to_path_buf(),
            source,
        })?;

        let records = self.decode(&data)?;
        info!("{}: decoded {} players", path.display(), records.len());
        Ok(records)
    }

    /// Decodes one replay held in memory.
    ///
    /// Missing structural markers or a short score table fail the whole replay. Problems with
    /// individual players (unreadable names, unknown vehicles) are recovered from.
    pub fn decode(&self, buf: &[u8]) -> DecodeResult<Vec<MatchRecord>> {
        let sections = ReplaySections::locate(buf)?;
        debug!("{:?}", sections);

        let players = decode_players(sections.players(buf));
        let scores = decode_scores(sections.scores(buf), players.len())?;
        let usage = scan_vehicle_usage(buf);

        let mut resolver = NationResolver::new(&self.catalog);
        let resolver = self.settings.should_resolve_nations().then_some(&mut resolver);

        Ok(assemble_records(players, scores, &usage, resolver))
    }
}
