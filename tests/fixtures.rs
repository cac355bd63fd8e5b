#![allow(dead_code)]
use std::sync::Once;

use wrpl::Marker;
use wrpl::ScoreStats;
use wrpl::scores::ROW_SIZE;
use wrpl::sections::TABLE_HEADER_SIZE;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .is_test(true)
            .init();
    });
}

pub const AIR_KILLS: usize = 16;
pub const GROUND_KILLS: usize = 24;
pub const ASSISTS: usize = 72;
pub const DEATHS: usize = 80;
pub const CAPTURES: usize = 88;
pub const SCORE: usize = 104;
pub const SQUAD: usize = 128;
pub const TEAM: usize = 144;

pub fn score_row(stats: &ScoreStats) -> Vec<u8> {
    let mut row = vec![0x11; ROW_SIZE];
    row[AIR_KILLS..AIR_KILLS + 4].copy_from_slice(&stats.air_kills.to_le_bytes());
    row[GROUND_KILLS..GROUND_KILLS + 4].copy_from_slice(&stats.ground_kills.to_le_bytes());
    row[ASSISTS] = stats.assists;
    row[DEATHS] = stats.deaths;
    row[CAPTURES] = stats.captures;
    row[SQUAD] = stats.squad_id;
    row[TEAM] = stats.team_id;
    row[SCORE] = (stats.score & 0xFF) as u8;
    row[SCORE + 1] = (stats.score >> 8) as u8;
    row
}

pub fn stats(seed: u8) -> ScoreStats {
    ScoreStats {
        air_kills: u32::from(seed) + 1,
        ground_kills: u32::from(seed) * 3 + 2,
        assists: seed + 4,
        deaths: seed % 3,
        captures: seed % 2,
        squad_id: seed + 20,
        team_id: 1 + seed % 2,
        score: 300 + u16::from(seed) * 257,
    }
}

/// A vehicle selection as found by the signature scan.
pub fn vehicle_record(raw_order: u8, name: &str) -> Vec<u8> {
    let mut buf = vec![raw_order, 0x90, 0x5A, 0xA5, 0x01, 0x20, 0x01, name.len() as u8];
    buf.extend_from_slice(name.as_bytes());
    buf
}

/// Lays out a replay: results table first, then `trailer` (typically vehicle records).
pub fn build_replay(player_table: &[u8], rows: &[Vec<u8>], trailer: &[u8]) -> Vec<u8> {
    let mut buf = b"WRPL\x10\x20\x30 replay preamble".to_vec();
    buf.extend_from_slice(Marker::StartOfTable.bytes());
    buf.extend(std::iter::repeat_n(0xAA, TABLE_HEADER_SIZE));
    buf.extend_from_slice(player_table);
    buf.extend_from_slice(Marker::EndOfPlayers.bytes());
    buf.extend_from_slice(b"\x05\x06\x07");
    buf.extend_from_slice(Marker::StartOfScores.bytes());
    for row in rows {
        buf.extend_from_slice(row);
    }
    buf.extend_from_slice(trailer);
    buf
}

pub const ALICE_AND_BOB: &[u8] = b"Alice\x0012345\x00Bob\x00-TAG-\x0067890\x00";

/// Two players, two score rows and no vehicles.
pub fn alice_and_bob() -> Vec<u8> {
    build_replay(ALICE_AND_BOB, &[score_row(&stats(1)), score_row(&stats(2))], b"")
}
