// The shape shared by a team's current order, an auto-fill result and a
// saved best-order template.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::arena::PlayerId;
use crate::player::Position;

pub const LINEUP_SLOTS: usize = 9;
pub const ROTATION_SLOTS: usize = 8;
pub const SETUP_SLOTS: usize = 8;
pub const CLOSER_SLOTS: usize = 2;

/// Lineup, fielding labels, bench and pitching staff. Empty slots are
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterOrder {
    pub lineup: [Option<PlayerId>; LINEUP_SLOTS],
    /// Fielding label for the batter in the same lineup slot.
    pub positions: [Option<Position>; LINEUP_SLOTS],
    pub bench: Vec<PlayerId>,
    pub rotation: [Option<PlayerId>; ROTATION_SLOTS],
    pub setup: [Option<PlayerId>; SETUP_SLOTS],
    pub closers: [Option<PlayerId>; CLOSER_SLOTS],
}

impl RosterOrder {
    pub fn lineup_filled(&self) -> usize {
        self.lineup.iter().flatten().count()
    }

    pub fn rotation_filled(&self) -> usize {
        self.rotation.iter().flatten().count()
    }

    /// Pitchers placed in rotation, setup and closer slots.
    pub fn pitchers_placed(&self) -> usize {
        self.rotation_filled()
            + self.setup.iter().flatten().count()
            + self.closers.iter().flatten().count()
    }

    /// Starting batters, in lineup order.
    pub fn starters(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.lineup.iter().flatten().copied()
    }

    /// Every handle referenced, in list order, duplicates included.
    pub fn all_entries(&self) -> Vec<PlayerId> {
        self.lineup
            .iter()
            .flatten()
            .copied()
            .chain(self.bench.iter().copied())
            .chain(self.rotation.iter().flatten().copied())
            .chain(self.setup.iter().flatten().copied())
            .chain(self.closers.iter().flatten().copied())
            .collect()
    }

    /// The set of players this order registers on the active roster.
    pub fn active_set(&self) -> BTreeSet<PlayerId> {
        self.all_entries().into_iter().collect()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.all_entries().contains(&id)
    }

    /// Handles listed more than once across all lists.
    pub fn duplicates(&self) -> Vec<PlayerId> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for id in self.all_entries() {
            if !seen.insert(id) && !dups.contains(&id) {
                dups.push(id);
            }
        }
        dups
    }

    /// Whether a lineup slot already carries `position`.
    pub fn has_label(&self, position: Position) -> bool {
        self.positions
            .iter()
            .zip(self.lineup.iter())
            .any(|(label, id)| id.is_some() && *label == Some(position))
    }

    /// Put a batter in the first empty lineup slot. Returns the slot used.
    pub fn place_starter(&mut self, id: PlayerId, position: Position) -> Option<usize> {
        let slot = self.lineup.iter().position(Option::is_none)?;
        self.lineup[slot] = Some(id);
        self.positions[slot] = Some(position);
        Some(slot)
    }

    /// Drop every reference to `id`, leaving its slots empty.
    pub fn remove(&mut self, id: PlayerId) {
        for (slot, label) in self.lineup.iter_mut().zip(self.positions.iter_mut()) {
            if *slot == Some(id) {
                *slot = None;
                *label = None;
            }
        }
        self.bench.retain(|b| *b != id);
        for slot in self
            .rotation
            .iter_mut()
            .chain(self.setup.iter_mut())
            .chain(self.closers.iter_mut())
        {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }
}

/// Put `id` in the first empty slot of a fixed list.
pub(crate) fn fill_first_empty(slots: &mut [Option<PlayerId>], id: PlayerId) -> bool {
    match slots.iter_mut().find(|s| s.is_none()) {
        Some(slot) => {
            *slot = Some(id);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    fn ids(n: usize) -> Vec<PlayerId> {
        let mut arena = Arena::new();
        (0..n).map(|i| arena.insert(i)).collect()
    }

    #[test]
    fn place_starter_uses_first_empty_slot() {
        let ids = ids(3);
        let mut order = RosterOrder::default();
        order.lineup[0] = Some(ids[0]);
        order.positions[0] = Some(Position::Catcher);

        assert_eq!(order.place_starter(ids[1], Position::ShortStop), Some(1));
        assert_eq!(order.positions[1], Some(Position::ShortStop));
        assert!(order.has_label(Position::ShortStop));
        assert!(!order.has_label(Position::CenterField));
    }

    #[test]
    fn duplicates_and_active_set() {
        let ids = ids(3);
        let mut order = RosterOrder::default();
        order.lineup[0] = Some(ids[0]);
        order.bench.push(ids[0]);
        order.rotation[0] = Some(ids[1]);
        order.closers[1] = Some(ids[2]);

        assert_eq!(order.duplicates(), vec![ids[0]]);
        assert_eq!(order.active_set().len(), 3);
        assert_eq!(order.pitchers_placed(), 2);
    }

    #[test]
    fn remove_clears_slot_and_label() {
        let ids = ids(2);
        let mut order = RosterOrder::default();
        order.place_starter(ids[0], Position::Catcher);
        order.setup[3] = Some(ids[1]);
        order.bench.push(ids[1]);

        order.remove(ids[0]);
        order.remove(ids[1]);
        assert_eq!(order, RosterOrder::default());
    }

    #[test]
    fn fill_first_empty_reports_full() {
        let ids = ids(3);
        let mut closers = [None; CLOSER_SLOTS];
        assert!(fill_first_empty(&mut closers, ids[0]));
        assert!(fill_first_empty(&mut closers, ids[1]));
        assert!(!fill_first_empty(&mut closers, ids[2]));
    }
}
