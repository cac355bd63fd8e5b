//! Vehicle usage scanning.
//!
//! Vehicle selections are scattered across the whole replay and are not indexed by anything the
//! decoder understands. They are found by a signature scan instead:
//!
//! ```text
//! [p-1] player order (u8, offset by a per-replay constant)
//! [p]   90 ?? ?? 01 20 01
//! [p+6] name length (u8)
//! [p+7] vehicle name (UTF-8, `length` bytes)
//! ```
//!
//! The raw player order has been observed to be consistent within one replay but shifted by an
//! unknown amount between replays, so it is normalized by subtracting the smallest value seen.
//! This is a heuristic, and false positives in unrelated data are possible.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use log::{debug, trace};
use memchr::memchr;

use crate::utils::bytes;

const SIGNATURE: [u8; 6] = [0x90, 0x00, 0x00, 0x01, 0x20, 0x01];
const SIGNATURE_MASK: [u8; 6] = [0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF];

/// Vehicles seen for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleUsage {
    pub order_index: usize,
    /// Sorted, so iteration order is deterministic.
    pub vehicle_names: BTreeSet<String>,
}

pub type VehicleUsageMap = HashMap<usize, VehicleUsage>;

fn signature_matches(window: &[u8]) -> bool {
    window.len() == SIGNATURE.len()
        && window
            .iter()
            .zip(SIGNATURE_MASK.iter().zip(SIGNATURE.iter()))
            .all(|(&b, (&mask, &expected))| b & mask == expected)
}

/// Offsets of all non-overlapping signature matches, in buffer order.
fn find_signatures(buf: &[u8]) -> Vec<usize> {
    let mut matches = Vec::new();
    let mut pos = 0;

    while let Some(found) = buf.get(pos..).and_then(|tail| memchr(SIGNATURE[0], tail)) {
        let p = pos + found;
        match bytes::slice(buf, p, SIGNATURE.len()) {
            Some(window) if signature_matches(window) => {
                matches.push(p);
                pos = p + SIGNATURE.len();
            }
            Some(_) => pos = p + 1,
            None => break,
        }
    }

    matches
}

/// The player order byte just before a match. Matches at offset 0 have none.
fn read_raw_order(buf: &[u8], p: usize) -> Option<u8> {
    bytes::read_u8(buf, p.checked_sub(1)?)
}

fn read_vehicle_name(buf: &[u8], p: usize) -> Option<&str> {
    let len = usize::from(bytes::read_u8(buf, p + SIGNATURE.len())?);
    let name = bytes::slice(buf, p + SIGNATURE.len() + 1, len)?;

    std::str::from_utf8(name).ok().filter(|name| !name.is_empty())
}

/// Scans the entire replay for vehicle selections.
///
/// The raw order base is the minimum over every match with an order byte, including matches whose
/// vehicle name is then rejected. Never fails: a buffer without any signature yields an empty map.
pub fn scan_vehicle_usage(buf: &[u8]) -> VehicleUsageMap {
    let matches: Vec<(usize, u8)> = find_signatures(buf)
        .into_iter()
        .filter_map(|p| read_raw_order(buf, p).map(|raw_order| (p, raw_order)))
        .collect();

    let mut usage = VehicleUsageMap::new();
    let Some(base) = matches.iter().map(|&(_, raw_order)| raw_order).min() else {
        debug!("no vehicle signatures found");
        return usage;
    };

    for (p, raw_order) in matches {
        let Some(name) = read_vehicle_name(buf, p) else {
            debug!("signature at {} does not carry a readable vehicle name", p);
            continue;
        };
        trace!("vehicle `{}` for raw player {} at {}", name, raw_order, p);

        let order_index = usize::from(raw_order - base);
        usage
            .entry(order_index)
            .or_insert_with(|| VehicleUsage {
                order_index,
                vehicle_names: BTreeSet::new(),
            })
            .vehicle_names
            .insert(name.to_owned());
    }

    debug!("found vehicles for {} players (raw order base {})", usage.len(), base);
    usage
}
