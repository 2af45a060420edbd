// Best-order templates: the stored shapes and their upgrade into a
// `RosterOrder` against a team's arena.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::arena::PlayerId;
use crate::order::{RosterOrder, LINEUP_SLOTS};
use crate::player::Position;
use crate::team::Team;

/// A reference to a player as it appears in a stored template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotRef {
    Handle(PlayerId),
    /// Position in the team's live player list, counting only players
    /// still signed; negative means empty.
    Index(i64),
}

impl SlotRef {
    fn resolve(self, team: &Team) -> Option<PlayerId> {
        match self {
            SlotRef::Handle(id) => team.player(id).map(|_| id),
            SlotRef::Index(i) if i < 0 => None,
            SlotRef::Index(i) => team.players().nth(i as usize).map(|(id, _)| id),
        }
    }
}

/// The dict-of-lists template shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredOrder {
    #[serde(default, alias = "current_lineup")]
    pub lineup: Vec<Option<SlotRef>>,
    /// Fielding labels, as abbreviations or long names.
    #[serde(default, alias = "lineup_positions")]
    pub positions: Vec<Option<String>>,
    #[serde(default, alias = "bench_batters")]
    pub bench: Vec<Option<SlotRef>>,
    #[serde(default)]
    pub rotation: Vec<Option<SlotRef>>,
    #[serde(default, alias = "setup_pitchers")]
    pub setup: Vec<Option<SlotRef>>,
    #[serde(default)]
    pub closers: Vec<Option<SlotRef>>,
}

/// Every template shape accepted on load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StoredBestOrder {
    /// Older saves kept only the batting order as a flat index list.
    Legacy(Vec<Option<i64>>),
    Full(StoredOrder),
}

impl StoredBestOrder {
    /// Upgrade to the canonical in-memory order. Entries that do not
    /// resolve on `team` become empty slots.
    pub fn upgrade(self, team: &Team) -> RosterOrder {
        match self {
            StoredBestOrder::Legacy(lineup) => {
                let mut order = RosterOrder::default();
                for (slot, entry) in lineup.into_iter().take(LINEUP_SLOTS).enumerate() {
                    order.lineup[slot] = entry.and_then(|i| SlotRef::Index(i).resolve(team));
                }
                order
            }
            StoredBestOrder::Full(stored) => {
                let mut order = RosterOrder::default();
                resolve_into(&mut order.lineup, &stored.lineup, team);
                resolve_into(&mut order.rotation, &stored.rotation, team);
                resolve_into(&mut order.setup, &stored.setup, team);
                resolve_into(&mut order.closers, &stored.closers, team);
                for (slot, label) in stored.positions.iter().take(LINEUP_SLOTS).enumerate() {
                    order.positions[slot] = label.as_deref().and_then(Position::from_str_pos);
                }
                order.bench = stored
                    .bench
                    .iter()
                    .flatten()
                    .filter_map(|r| r.resolve(team))
                    .collect();
                order
            }
        }
    }
}

fn resolve_into(slots: &mut [Option<PlayerId>], stored: &[Option<SlotRef>], team: &Team) {
    for (slot, entry) in slots.iter_mut().zip(stored.iter()) {
        *slot = entry.and_then(|r| r.resolve(team));
    }
}

/// Decode a stored template for `team`.
///
/// Returns `None` (no template) when the value matches neither shape.
pub fn load_best_order(stored: &Value, team: &Team) -> Option<RosterOrder> {
    match StoredBestOrder::deserialize(stored) {
        Ok(shape) => Some(shape.upgrade(team)),
        Err(e) => {
            warn!("ignoring best-order template for {}: {}", team.name, e);
            None
        }
    }
}

/// Encode `order` in the full shape, with handles.
pub fn best_order_to_value(order: &RosterOrder) -> serde_json::Result<Value> {
    let refs = |slots: &[Option<PlayerId>]| -> Vec<Option<SlotRef>> {
        slots.iter().map(|s| s.map(SlotRef::Handle)).collect()
    };
    let stored = StoredOrder {
        lineup: refs(&order.lineup),
        positions: order
            .positions
            .iter()
            .map(|p| p.map(|p| p.long_name().to_string()))
            .collect(),
        bench: order.bench.iter().map(|id| Some(SlotRef::Handle(*id))).collect(),
        rotation: refs(&order.rotation),
        setup: refs(&order.setup),
        closers: refs(&order.closers),
    };
    serde_json::to_value(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Player, TeamLevel};
    use serde_json::json;

    fn team() -> (Team, Vec<PlayerId>) {
        let mut team = Team::new("Mariners", 31);
        let ids = vec![
            team.sign_player(Player::batter("Arai", Position::Catcher), TeamLevel::First)
                .unwrap(),
            team.sign_player(Player::batter("Mori", Position::ShortStop), TeamLevel::First)
                .unwrap(),
            team.sign_player(Player::pitcher("Sato"), TeamLevel::First).unwrap(),
        ];
        (team, ids)
    }

    #[test]
    fn legacy_list_upgrades_to_lineup_only() {
        let (team, ids) = team();
        let order = load_best_order(&json!([1, 0, -1, null]), &team).unwrap();
        assert_eq!(order.lineup[0], Some(ids[1]));
        assert_eq!(order.lineup[1], Some(ids[0]));
        assert_eq!(order.lineup[2], None);
        assert!(order.positions.iter().all(Option::is_none));
        assert_eq!(order.rotation_filled(), 0);
    }

    #[test]
    fn full_dict_with_indices_and_long_names() {
        let (team, ids) = team();
        let stored = json!({
            "current_lineup": [0, 1, -1],
            "lineup_positions": ["Catcher", "SS", null],
            "bench_batters": [],
            "rotation": [2, -1],
            "setup_pitchers": [],
            "closers": [null, null],
        });
        let order = load_best_order(&stored, &team).unwrap();
        assert_eq!(order.lineup[0], Some(ids[0]));
        assert_eq!(order.positions[0], Some(Position::Catcher));
        assert_eq!(order.positions[1], Some(Position::ShortStop));
        assert_eq!(order.rotation[0], Some(ids[2]));
    }

    #[test]
    fn stale_entries_become_empty() {
        let (mut team, ids) = team();
        let mut order = RosterOrder::default();
        order.lineup[0] = Some(ids[0]);
        order.rotation[0] = Some(ids[2]);
        let stored = best_order_to_value(&order).unwrap();

        team.release_player(ids[0]).unwrap();
        team.sign_player(Player::batter("Replacement", Position::Catcher), TeamLevel::First)
            .unwrap();

        let back = load_best_order(&stored, &team).unwrap();
        assert_eq!(back.lineup[0], None);
        assert_eq!(back.rotation[0], Some(ids[2]));
    }

    #[test]
    fn legacy_index_counts_only_signed_players() {
        let (mut team, ids) = team();
        team.release_player(ids[0]).unwrap();

        let order = load_best_order(&json!([0, 1, 2]), &team).unwrap();
        assert_eq!(order.lineup[0], Some(ids[1]));
        assert_eq!(order.lineup[1], Some(ids[2]));
        assert_eq!(order.lineup[2], None);
    }

    #[test]
    fn out_of_range_index_is_empty() {
        let (team, _) = team();
        let order = load_best_order(&json!([42]), &team).unwrap();
        assert_eq!(order.lineup[0], None);
    }

    #[test]
    fn saved_shape_round_trips() {
        let (team, ids) = team();
        let mut order = RosterOrder::default();
        order.place_starter(ids[1], Position::ShortStop);
        order.bench.push(ids[0]);
        order.closers[0] = Some(ids[2]);

        let stored = best_order_to_value(&order).unwrap();
        assert!(stored.get("lineup").is_some());
        assert_eq!(load_best_order(&stored, &team), Some(order));
    }

    #[test]
    fn unrecognised_shape_is_no_template() {
        let (team, _) = team();
        assert_eq!(load_best_order(&json!("lineup"), &team), None);
        assert_eq!(load_best_order(&json!({"lineup": "abc"}), &team), None);
    }
}
