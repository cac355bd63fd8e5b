//! Player table decoding.
//!
//! The player table is a run of `0x00`-delimited tokens. Each player is encoded as
//!
//! ```text
//! <name> 00 [<clan tag> 00] <decimal id> 00
//! ```
//!
//! so the ID is the only token that can be recognized on its own, and it comes *after* the tokens
//! it belongs to. The decoder therefore walks the tokens from the end of the table toward the
//! start, and uses one token of lookahead past the ID to tell whether a clan tag is present.

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use log::{debug, trace, warn};
use serde::Serialize;

/// Substituted for a name or clan tag that is not valid UTF-8, or a name that is missing.
pub const UNDECODABLE_NAME: &str = "<undecodable>";

/// Substituted for an ID token that does not fit in 64 bits.
pub const UNDECODABLE_ID: u64 = u64::MAX;

const TOKEN_DELIMITER: u8 = 0x00;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerIdentity {
    pub id: u64,
    pub display_name: String,
    pub clan_tag: Option<String>,
    /// Position of the player in the table, left to right.
    pub order_index: usize,
}

/// A player as read off the reversed token stream, before text decoding.
///
/// `id` is `None` when the ID token does not fit in 64 bits, `name` is `None` when the table ends
/// before the name token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawPlayer<'a> {
    pub id: Option<u64>,
    pub name: Option<&'a [u8]>,
    pub clan_tag: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState<'a> {
    SeekingId,
    ExpectClanTag { id: Option<u64> },
    ExpectName { id: Option<u64>, clan_tag: Option<&'a [u8]> },
}

fn is_id_token(token: &[u8]) -> bool {
    !token.is_empty() && token.iter().all(u8::is_ascii_digit)
}

fn parse_id(token: &[u8]) -> Option<u64> {
    // Digits only, so this is always valid UTF-8.
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Runs the reverse scan over `reversed` (tokens in end-to-start order).
///
/// Players are returned in scan order, i.e. the last player of the table first. Every ID token
/// yields a player, even if the ID or the name cannot be read, so positions stay aligned with the
/// score rows.
pub(crate) fn scan_reversed_tokens<'a>(reversed: &[&'a [u8]]) -> Vec<RawPlayer<'a>> {
    let mut players = Vec::new();
    let mut state = ScanState::SeekingId;

    for (i, &token) in reversed.iter().enumerate() {
        state = match state {
            ScanState::SeekingId => {
                if !is_id_token(token) {
                    continue;
                }

                let id = parse_id(token);
                if id.is_none() {
                    warn!(
                        "player id `{}` does not fit in 64 bits, substituting",
                        String::from_utf8_lossy(token)
                    );
                }

                // A clan tag sits between the ID and the name, so if the token two places ahead
                // is not itself an ID, the next token is the clan tag.
                let has_clan_tag = reversed.get(i + 2).is_some_and(|t| !is_id_token(t));
                trace!("id {:?} at reversed token {}, clan tag: {}", id, i, has_clan_tag);

                if has_clan_tag {
                    ScanState::ExpectClanTag { id }
                } else {
                    ScanState::ExpectName { id, clan_tag: None }
                }
            }
            ScanState::ExpectClanTag { id } => ScanState::ExpectName {
                id,
                clan_tag: Some(token),
            },
            ScanState::ExpectName { id, clan_tag } => {
                players.push(RawPlayer {
                    id,
                    name: Some(token),
                    clan_tag,
                });
                ScanState::SeekingId
            }
        };
    }

    let dangling = match state {
        ScanState::SeekingId => None,
        ScanState::ExpectClanTag { id } => Some((id, None)),
        ScanState::ExpectName { id, clan_tag } => Some((id, clan_tag)),
    };

    if let Some((id, clan_tag)) = dangling {
        warn!("player id {:?} has no name token, substituting", id);
        players.push(RawPlayer {
            id,
            name: None,
            clan_tag,
        });
    }

    players
}

fn decode_text(token: &[u8], id: u64, what: &str) -> String {
    match std::str::from_utf8(token) {
        Ok(text) => text.to_owned(),
        Err(e) => {
            warn!("player {}: {} is not valid UTF-8 ({}), substituting", id, what, e);
            UNDECODABLE_NAME.to_owned()
        }
    }
}

/// Decodes the player table into identities sorted by `order_index`.
///
/// An ID that does not fit in 64 bits becomes [`UNDECODABLE_ID`] and a missing name becomes
/// [`UNDECODABLE_NAME`]; the player keeps its position either way.
///
/// A later occurrence of an already seen ID overwrites the earlier player's name and clan tag
/// but keeps its position, so the order indices stay dense. The table then has one player fewer
/// than it has entries, and score rows no longer line up with the players.
pub fn decode_players(table: &[u8]) -> Vec<PlayerIdentity> {
    let mut reversed: Vec<&[u8]> = table.split(|&b| b == TOKEN_DELIMITER).collect();
    reversed.reverse();

    let mut decoded: Vec<(u64, String, Option<String>)> = Vec::new();
    let mut by_id: HashMap<u64, usize> = HashMap::new();

    for raw in scan_reversed_tokens(&reversed) {
        let id = raw.id.unwrap_or(UNDECODABLE_ID);
        let name = match raw.name {
            Some(name) => decode_text(name, id, "name"),
            None => UNDECODABLE_NAME.to_owned(),
        };
        let clan_tag = raw.clan_tag.map(|tag| decode_text(tag, id, "clan tag"));

        let Some(known_id) = raw.id else {
            decoded.push((id, name, clan_tag));
            continue;
        };

        match by_id.entry(known_id) {
            Entry::Occupied(slot) => {
                warn!("duplicate player id {}, keeping the later record", known_id);
                decoded[*slot.get()] = (id, name, clan_tag);
            }
            Entry::Vacant(slot) => {
                slot.insert(decoded.len());
                decoded.push((id, name, clan_tag));
            }
        }
    }

    let total = decoded.len();
    debug!("decoded {} players", total);

    // Reverse scan order is right-to-left, so flipping it restores table order.
    decoded
        .into_iter()
        .enumerate()
        .rev()
        .map(|(provisional, (id, display_name, clan_tag))| PlayerIdentity {
            id,
            display_name,
            clan_tag,
            order_index: total - provisional - 1,
        })
        .collect()
}
