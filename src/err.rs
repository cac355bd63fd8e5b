use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type DecodeResult<T> = std::result::Result<T, FormatError>;

/// The structural markers the decoder needs to find in a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    StartOfTable,
    EndOfPlayers,
    StartOfScores,
}

impl Marker {
    pub fn bytes(self) -> &'static [u8; 4] {
        match self {
            Marker::StartOfTable => &[0x01, 0x16, 0xC6, 0x01],
            Marker::EndOfPlayers => &[0x00, 0x00, 0x00, 0x00],
            Marker::StartOfScores => &[0x03, 0x00, 0x00, 0x01],
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Marker::StartOfTable => "start-of-table",
            Marker::EndOfPlayers => "end-of-players",
            Marker::StartOfScores => "start-of-scores",
        };
        write!(f, "{} `{:02X?}`", name, self.bytes())
    }
}

/// Fatal errors for the decode of one replay buffer.
///
/// Only structural failures of the buffer surface here. Per-player anomalies are
/// recovered in place: an undecodable name becomes [`crate::UNDECODABLE_NAME`], an
/// unreadable ID becomes [`crate::UNDECODABLE_ID`] and an unresolvable vehicle keeps
/// its raw name.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Offset {searched_from}: {marker} marker not found")]
    MissingMarker { marker: Marker, searched_from: u64 },

    #[error("Offset {offset}: results table header is truncated (need {need} bytes, have {have})")]
    TruncatedHeader { offset: u64, need: usize, have: usize },

    #[error(
        "Score table is too short for {players} players (need {need} bytes, have {have})"
    )]
    TruncatedScoreTable {
        players: usize,
        need: usize,
        have: usize,
    },

    #[error("Failed to open file {}: {source}", path.display())]
    FailedToOpenFile { path: PathBuf, source: io::Error },
}
