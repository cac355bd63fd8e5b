#![deny(unused_must_use)]
#![forbid(unsafe_code)]
//! A parser for the match results embedded in War Thunder `.wrpl` replays.
//!
//! The replay format is undocumented. Everything this crate knows about it (marker bytes, the
//! size of the results table header, score row offsets, the vehicle signature) was found by
//! inspecting recordings, and is treated as a single frozen layout.
//!
//! ```rust,no_run
//! use wrpl::ReplayDecoder;
//!
//! fn main() -> Result<(), wrpl::err::FormatError> {
//!     let decoder = ReplayDecoder::new();
//!
//!     for record in decoder.decode_path("#2024.05.01 20.13.44.wrpl")? {
//!         println!(
//!             "{} {} kills, {} ({})",
//!             record.display_name,
//!             record.stats.ground_kills + record.stats.air_kills,
//!             record.vehicles.join(", "),
//!             record.nation
//!         );
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod decoder;
pub mod err;
pub mod nation;
pub mod players;
pub mod record;
pub mod scores;
pub mod sections;
pub mod vehicles;

mod utils;

pub use decoder::{DecoderSettings, ReplayDecoder};
pub use err::{DecodeResult, FormatError, Marker};
pub use nation::{CatalogSource, Nation, NationCatalog, NationResolver};
pub use players::{PlayerIdentity, UNDECODABLE_ID, UNDECODABLE_NAME};
pub use record::{MatchRecord, PLACEHOLDER_VEHICLE};
pub use scores::ScoreStats;
pub use vehicles::VehicleUsage;
