//! Locates the results table inside a replay.
//!
//! ```text
//! [start-of-table 01 16 C6 01]
//! [header (211 bytes)]
//! [player table ...]            0x00-delimited tokens
//! [end-of-players 00 00 00 00]
//! [...]
//! [start-of-scores 03 00 00 01]
//! [score rows (152 bytes each) ...]
//! ```
//!
//! The end-of-players marker is four zero bytes, so a run of four zeros inside the player table
//! would end it early. Player tokens are text and decimal IDs separated by single zeros, so this
//! does not happen in the recordings seen so far.

use std::ops::Range;

use log::trace;

use crate::err::{DecodeResult, FormatError, Marker};
use crate::utils::bytes;

pub const TABLE_HEADER_SIZE: usize = 211;

/// Byte ranges of the two tables, relative to the start of the replay buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySections {
    pub players: Range<usize>,
    /// Runs to the end of the buffer; the score decoder truncates it by row count.
    pub scores: Range<usize>,
}

impl ReplaySections {
    pub fn locate(buf: &[u8]) -> DecodeResult<Self> {
        let table_start = find_marker(buf, Marker::StartOfTable, 0)?;
        let header_start = table_start + Marker::StartOfTable.bytes().len();

        let players_start = header_start + TABLE_HEADER_SIZE;
        if players_start > buf.len() {
            return Err(FormatError::TruncatedHeader {
                offset: header_start as u64,
                need: TABLE_HEADER_SIZE,
                have: buf.len() - header_start,
            });
        }

        let players_end = find_marker(buf, Marker::EndOfPlayers, players_start)?;
        let after_players = players_end + Marker::EndOfPlayers.bytes().len();

        let scores_marker = find_marker(buf, Marker::StartOfScores, after_players)?;
        let scores_start = scores_marker + Marker::StartOfScores.bytes().len();

        trace!(
            "results table at {}, players {}..{}, scores from {}",
            table_start, players_start, players_end, scores_start
        );

        Ok(ReplaySections {
            players: players_start..players_end,
            scores: scores_start..buf.len(),
        })
    }

    /// The player table of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than the buffer these sections were located in. Pass the same
    /// buffer that was given to [`ReplaySections::locate`].
    pub fn players<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.players.clone()]
    }

    /// The score rows of `buf`. Same buffer requirement as [`ReplaySections::players`].
    pub fn scores<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.scores.clone()]
    }
}

fn find_marker(buf: &[u8], marker: Marker, from: usize) -> DecodeResult<usize> {
    bytes::find_from(buf, marker.bytes(), from).ok_or(FormatError::MissingMarker {
        marker,
        searched_from: from as u64,
    })
}
