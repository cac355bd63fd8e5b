//! Score table decoding.
//!
//! Each player has one fixed-size row. Rows are in the same order as the player table, and the
//! table continues with non-player rows after the last player, so only the first `player_count`
//! rows are read.
//!
//! ```text
//! [16]  air kills     (u32)
//! [24]  ground kills  (u32)
//! [72]  assists       (u8)
//! [80]  deaths        (u8)
//! [88]  captures      (u8)
//! [104] score         (u16, low byte then high byte)
//! [128] squad id      (u8)
//! [144] team id       (u8)
//! ```

use log::debug;
use serde::Serialize;

use crate::err::{DecodeResult, FormatError};
use crate::utils::bytes;

pub const ROW_SIZE: usize = 152;

const AIR_KILLS: usize = 16;
const GROUND_KILLS: usize = 24;
const ASSISTS: usize = 72;
const DEATHS: usize = 80;
const CAPTURES: usize = 88;
const SCORE: usize = 104;
const SQUAD: usize = 128;
const TEAM: usize = 144;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreStats {
    pub air_kills: u32,
    pub ground_kills: u32,
    pub assists: u8,
    pub deaths: u8,
    pub captures: u8,
    pub squad_id: u8,
    pub team_id: u8,
    pub score: u16,
}

impl ScoreStats {
    /// `row` must be at least [`ROW_SIZE`] bytes.
    fn from_row(row: &[u8]) -> Option<Self> {
        Some(ScoreStats {
            air_kills: bytes::read_u32_le(row, AIR_KILLS)?,
            ground_kills: bytes::read_u32_le(row, GROUND_KILLS)?,
            assists: bytes::read_u8(row, ASSISTS)?,
            deaths: bytes::read_u8(row, DEATHS)?,
            captures: bytes::read_u8(row, CAPTURES)?,
            squad_id: bytes::read_u8(row, SQUAD)?,
            team_id: bytes::read_u8(row, TEAM)?,
            score: bytes::read_u16_le(row, SCORE)?,
        })
    }
}

/// Decodes exactly `player_count` rows; element `i` belongs to the player with `order_index == i`.
pub fn decode_scores(table: &[u8], player_count: usize) -> DecodeResult<Vec<ScoreStats>> {
    let need = player_count * ROW_SIZE;
    let truncated = || FormatError::TruncatedScoreTable {
        players: player_count,
        need,
        have: table.len(),
    };

    let rows = bytes::slice(table, 0, need).ok_or_else(truncated)?;

    debug!(
        "reading {} score rows, ignoring {} trailing bytes",
        player_count,
        table.len() - need
    );

    rows.chunks_exact(ROW_SIZE)
        .map(|row| ScoreStats::from_row(row).ok_or_else(truncated))
        .collect()
}
