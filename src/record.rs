use serde::Serialize;

use crate::nation::{Nation, NationResolver};
use crate::players::PlayerIdentity;
use crate::scores::ScoreStats;
use crate::vehicles::VehicleUsageMap;

/// Placeholder vehicle name that does not belong to any player's lineup.
pub const PLACEHOLDER_VEHICLE: &str = "dummy_plane";

/// Everything decoded about one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub order_index: usize,
    pub id: u64,
    pub display_name: String,
    pub clan_tag: Option<String>,
    pub stats: ScoreStats,
    /// Sorted and free of duplicates.
    pub vehicles: Vec<String>,
    pub nation: Nation,
}

/// Joins the decoded tables into one record per player, in `order_index` order.
///
/// `players` and `scores` must both be indexed by order index (as produced by
/// [`decode_players`](crate::players::decode_players) and
/// [`decode_scores`](crate::scores::decode_scores)). Without a resolver every nation is
/// [`Nation::Unknown`].
pub fn assemble_records(
    players: Vec<PlayerIdentity>,
    scores: Vec<ScoreStats>,
    usage: &VehicleUsageMap,
    mut resolver: Option<&mut NationResolver<'_>>,
) -> Vec<MatchRecord> {
    debug_assert_eq!(players.len(), scores.len());

    players
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(order_index, (player, stats))| {
            debug_assert_eq!(player.order_index, order_index);

            let vehicles: Vec<String> = usage
                .get(&order_index)
                .into_iter()
                .flat_map(|u| u.vehicle_names.iter())
                .filter(|name| name.as_str() != PLACEHOLDER_VEHICLE)
                .cloned()
                .collect();

            let nation = match resolver.as_deref_mut() {
                Some(resolver) => vehicles
                    .iter()
                    .map(|vehicle| resolver.resolve(vehicle))
                    .find(Nation::is_known)
                    .unwrap_or(Nation::Unknown),
                None => Nation::Unknown,
            };

            MatchRecord {
                order_index,
                id: player.id,
                display_name: player.display_name,
                clan_tag: player.clan_tag,
                stats,
                vehicles,
                nation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nation::NationCatalog;
    use crate::vehicles::VehicleUsage;
    use pretty_assertions::assert_eq;

    fn players(n: usize) -> Vec<PlayerIdentity> {
        (0..n)
            .map(|i| PlayerIdentity {
                id: 1000 + i as u64,
                display_name: format!("player{}", i),
                clan_tag: None,
                order_index: i,
            })
            .collect()
    }

    fn usage(entries: &[(usize, &[&str])]) -> VehicleUsageMap {
        entries
            .iter()
            .map(|&(order_index, names)| {
                (
                    order_index,
                    VehicleUsage {
                        order_index,
                        vehicle_names: names.iter().map(|n| n.to_string()).collect(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_placeholder_only_player_has_no_vehicles() {
        let catalog = NationCatalog::from_text("==== USA ====\ndummy_plane\n");
        let mut resolver = NationResolver::new(&catalog);
        let usage = usage(&[(0, &[PLACEHOLDER_VEHICLE])]);

        let records = assemble_records(
            players(1),
            vec![ScoreStats::default()],
            &usage,
            Some(&mut resolver),
        );

        assert_eq!(records[0].vehicles, Vec::<String>::new());
        assert_eq!(records[0].nation, Nation::Unknown);
        assert_eq!(resolver.cached(), 0);
    }

    #[test]
    fn test_first_resolvable_vehicle_sets_nation() {
        let catalog = NationCatalog::from_text("==== France ====\nd_520\n");
        let mut resolver = NationResolver::new(&catalog);
        // Sorted: "aaa_unknown" < "d_520" < "dummy_plane" < "us_p47".
        let usage = usage(&[(0, &["us_p47", "d_520", "dummy_plane", "aaa_unknown"])]);

        let records = assemble_records(
            players(1),
            vec![ScoreStats::default()],
            &usage,
            Some(&mut resolver),
        );

        assert_eq!(records[0].vehicles, vec!["aaa_unknown", "d_520", "us_p47"]);
        assert_eq!(records[0].nation, Nation::Known("France".to_owned()));
    }

    #[test]
    fn test_players_without_usage_get_empty_vehicles() {
        let catalog = NationCatalog::default();
        let mut resolver = NationResolver::new(&catalog);
        let usage = usage(&[(1, &["ussr_t_34_1941"]), (7, &["uk_a13_mk1"])]);
        let scores = vec![
            ScoreStats {
                score: 10,
                ..Default::default()
            },
            ScoreStats {
                score: 20,
                ..Default::default()
            },
        ];

        let records = assemble_records(players(2), scores, &usage, Some(&mut resolver));

        assert_eq!(records.len(), 2);
        assert!(records[0].vehicles.is_empty());
        assert_eq!(records[0].nation, Nation::Unknown);
        assert_eq!(records[0].stats.score, 10);
        assert_eq!(records[1].vehicles, vec!["ussr_t_34_1941"]);
        assert_eq!(records[1].nation, Nation::Known("USSR".to_owned()));
        assert_eq!(records[1].stats.score, 20);
    }

    #[test]
    fn test_without_resolver_nations_are_unknown() {
        let usage = usage(&[(0, &["us_p47"])]);
        let records = assemble_records(players(1), vec![ScoreStats::default()], &usage, None);
        assert_eq!(records[0].vehicles, vec!["us_p47"]);
        assert_eq!(records[0].nation, Nation::Unknown);
    }
}
