// Greedy auto-assignment of lineup, bench and pitching staff.

use std::collections::BTreeSet;

use dugout_core::config::RosterRules;
use tracing::debug;

use crate::arena::PlayerId;
use crate::order::{fill_first_empty, RosterOrder, LINEUP_SLOTS, ROTATION_SLOTS};
use crate::player::{PitcherRole, Player, Position, FIELDING_POSITIONS};
use crate::scoring::{defense_score, lineup_score, pitcher_score, PriorityMode};
use crate::team::Team;

/// Build a complete roster order for `team`.
///
/// Template entries are seeded first when the player is available; the
/// remaining slots are filled greedily by score. Slots with no eligible
/// candidate stay empty. The fill never plans more active players than
/// `team.active_limit`: nine lineup places are held back first, pitchers
/// come out of what remains and the bench absorbs any shortfall. Equal
/// scores go to the lower handle, so the result is a pure function of the
/// inputs.
pub fn auto_assign(
    team: &Team,
    template: Option<&RosterOrder>,
    rules: &RosterRules,
    mode: PriorityMode,
) -> RosterOrder {
    let mut assigner = Assigner {
        team,
        rules,
        mode,
        budget: team
            .active_limit
            .min(rules.target_pitchers + rules.target_batters),
        used: BTreeSet::new(),
        order: RosterOrder::default(),
        template_bench: Vec::new(),
    };

    if let Some(template) = template {
        assigner.seed(template);
    }
    let seeded = assigner.used.len();

    assigner.fill_rotation();
    assigner.fill_closer();
    assigner.fill_setup();
    assigner.fill_lineup();
    assigner.fill_bench();

    let order = assigner.order;
    debug!(
        "auto-assigned {} ({} mode): {} seeded, lineup {}/{}, rotation {}, pitchers {}, bench {}",
        team.name,
        mode,
        seeded,
        order.lineup_filled(),
        LINEUP_SLOTS,
        order.rotation_filled(),
        order.pitchers_placed(),
        order.bench.len()
    );
    order
}

struct Assigner<'a> {
    team: &'a Team,
    rules: &'a RosterRules,
    mode: PriorityMode,
    /// Active-roster places this fill may use.
    budget: usize,
    used: BTreeSet<PlayerId>,
    order: RosterOrder,
    /// Bench preferences from the template, honoured after the lineup.
    template_bench: Vec<PlayerId>,
}

impl<'a> Assigner<'a> {
    // -----------------------------------------------------------------------
    // Eligibility
    // -----------------------------------------------------------------------

    /// Resolve `id` if the player may take any active-roster slot.
    fn eligible(&self, id: PlayerId) -> Option<&'a Player> {
        if self.used.contains(&id) {
            return None;
        }
        let team: &'a Team = self.team;
        team.player(id)
            .filter(|p| p.is_available() && !p.is_developmental)
    }

    fn pitchers(&self) -> Vec<PlayerId> {
        self.candidates(true)
    }

    fn batters(&self) -> Vec<PlayerId> {
        self.candidates(false)
    }

    fn candidates(&self, pitchers: bool) -> Vec<PlayerId> {
        self.team
            .players()
            .filter(|(_, p)| p.is_pitcher() == pitchers)
            .map(|(id, _)| id)
            .filter(|id| self.eligible(*id).is_some())
            .collect()
    }

    /// Highest-scoring candidate. Candidates arrive in handle order and
    /// only a strictly greater score displaces the leader.
    fn best<F>(&self, candidates: &[PlayerId], score: F) -> Option<PlayerId>
    where
        F: Fn(&Player, bool) -> Option<f64>,
    {
        let mut best: Option<(PlayerId, f64)> = None;
        for &id in candidates {
            if self.used.contains(&id) {
                continue;
            }
            let Some(player) = self.team.player(id) else {
                continue;
            };
            let Some(s) = score(player, self.team.is_active(id)) else {
                continue;
            };
            match best {
                Some((_, top)) if s <= top => {}
                _ => best = Some((id, s)),
            }
        }
        best.map(|(id, _)| id)
    }

    fn take(&mut self, id: PlayerId) {
        self.used.insert(id);
    }

    /// Pitching places left once the lineup is reserved.
    fn pitcher_budget(&self) -> usize {
        self.rules
            .target_pitchers
            .min(self.budget.saturating_sub(LINEUP_SLOTS))
    }

    fn pitcher_room(&self) -> usize {
        self.pitcher_budget()
            .saturating_sub(self.order.pitchers_placed())
    }

    fn bench_capacity(&self) -> usize {
        let used = self.order.pitchers_placed() + self.order.lineup_filled();
        self.rules
            .target_batters
            .saturating_sub(LINEUP_SLOTS)
            .min(self.budget.saturating_sub(used))
    }

    // -----------------------------------------------------------------------
    // Template seeding
    // -----------------------------------------------------------------------

    fn seed(&mut self, template: &RosterOrder) {
        for (slot, entry) in template.rotation.iter().enumerate() {
            if let Some(id) = entry.filter(|id| self.eligible(*id).is_some()) {
                self.order.rotation[slot] = Some(id);
                self.take(id);
            }
        }
        for (slot, entry) in template.closers.iter().enumerate() {
            if let Some(id) = entry.filter(|id| self.eligible(*id).is_some()) {
                self.order.closers[slot] = Some(id);
                self.take(id);
            }
        }
        for (slot, entry) in template.setup.iter().enumerate() {
            if let Some(id) = entry.filter(|id| self.eligible(*id).is_some()) {
                self.order.setup[slot] = Some(id);
                self.take(id);
            }
        }

        for slot in 0..LINEUP_SLOTS {
            let Some(id) = template.lineup[slot] else {
                continue;
            };
            let Some(player) = self.eligible(id) else {
                continue;
            };
            // Unlabelled entries come from the lineup-only template shape.
            let label = template.positions[slot].unwrap_or(player.position);
            if !self.can_field(player, label) {
                continue;
            }
            self.order.lineup[slot] = Some(id);
            self.order.positions[slot] = Some(label);
            self.take(id);
        }

        self.template_bench = template.bench.clone();
    }

    /// Whether `player` may start under `label` in the current order.
    fn can_field(&self, player: &Player, label: Position) -> bool {
        if self.order.has_label(label) {
            return false;
        }
        match label {
            Position::DesignatedHitter => true,
            Position::Pitcher => false,
            pos => defense_score(player, pos).is_some(),
        }
    }

    // -----------------------------------------------------------------------
    // Greedy fill
    // -----------------------------------------------------------------------

    fn fill_rotation(&mut self) {
        let target = self.rules.rotation_starters.min(ROTATION_SLOTS);
        let pool = self.pitchers();
        let mode = self.mode;
        while self.order.rotation_filled() < target && self.pitcher_room() > 0 {
            let Some(id) = self.best(&pool, |p, inc| {
                Some(pitcher_score(p, PitcherRole::Starter, mode, inc))
            }) else {
                break;
            };
            if !fill_first_empty(&mut self.order.rotation, id) {
                break;
            }
            self.take(id);
        }
    }

    fn fill_closer(&mut self) {
        if self.order.closers[0].is_some() || self.pitcher_room() == 0 {
            return;
        }
        let pool = self.pitchers();
        let mode = self.mode;
        if let Some(id) = self.best(&pool, |p, inc| {
            Some(pitcher_score(p, PitcherRole::Closer, mode, inc))
        }) {
            self.order.closers[0] = Some(id);
            self.take(id);
        }
    }

    fn fill_setup(&mut self) {
        let open = self.order.setup.iter().filter(|s| s.is_none()).count();
        let room = self.pitcher_room();
        let pool = self.pitchers();
        let mode = self.mode;
        for _ in 0..open.min(room) {
            let Some(id) = self.best(&pool, |p, inc| {
                Some(pitcher_score(p, PitcherRole::Relief, mode, inc))
            }) else {
                break;
            };
            fill_first_empty(&mut self.order.setup, id);
            self.take(id);
        }
    }

    fn fill_lineup(&mut self) {
        let pool = self.batters();
        let mode = self.mode;
        let labels = FIELDING_POSITIONS
            .iter()
            .copied()
            .chain(std::iter::once(Position::DesignatedHitter));

        for position in labels {
            if self.order.has_label(position) {
                continue;
            }
            if self.order.lineup_filled() == LINEUP_SLOTS {
                break;
            }
            let Some(id) = self.best(&pool, |p, inc| lineup_score(p, position, mode, inc)) else {
                debug!("no eligible starter at {} for {}", position, self.team.name);
                continue;
            };
            self.order.place_starter(id, position);
            self.take(id);
        }
    }

    fn fill_bench(&mut self) {
        let capacity = self.bench_capacity();
        for id in std::mem::take(&mut self.template_bench) {
            if self.order.bench.len() >= capacity {
                break;
            }
            if self.eligible(id).is_some_and(|p| !p.is_pitcher()) {
                self.order.bench.push(id);
                self.take(id);
            }
        }

        let room = capacity.saturating_sub(self.order.bench.len());
        let mut pool: Vec<(PlayerId, f64)> = self
            .batters()
            .into_iter()
            .filter_map(|id| self.team.player(id).map(|p| (id, p.overall_batting())))
            .collect();
        // Stable sort keeps handle order among equal ratings.
        pool.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (id, _) in pool.into_iter().take(room) {
            self.order.bench.push(id);
            self.take(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PitchingAbility, TeamLevel};

    fn rules() -> RosterRules {
        RosterRules::default()
    }

    fn starter(name: &str, stamina: u8, starter_apt: u8) -> Player {
        let mut p = Player::pitcher(name);
        p.pitching = PitchingAbility {
            velocity: 145,
            control: 60,
            stamina,
            stuff: 60,
        };
        p.pitcher_aptitude.starter = starter_apt;
        p
    }

    fn fielder(name: &str, pos: Position, contact: u8) -> Player {
        let mut p = Player::batter(name, pos);
        p.batting.contact = contact;
        p
    }

    /// Nine batters, one per fielding position plus a spare first baseman.
    fn lineup_team() -> Team {
        let mut team = Team::new("Mariners", 31);
        for (i, pos) in FIELDING_POSITIONS.iter().enumerate() {
            team.sign_player(fielder(&format!("F{i}"), *pos, 60), TeamLevel::Second)
                .unwrap();
        }
        team.sign_player(fielder("Spare", Position::FirstBase, 40), TeamLevel::Second)
            .unwrap();
        team
    }

    #[test]
    fn rotation_takes_best_starters_without_repeats() {
        let mut team = Team::new("Mariners", 31);
        let ids: Vec<_> = (0..8)
            .map(|i| {
                team.sign_player(starter(&format!("P{i}"), 40 + i as u8 * 5, 60), TeamLevel::Second)
                    .unwrap()
            })
            .collect();

        let order = auto_assign(&team, None, &rules(), PriorityMode::Ability);
        let rotation: Vec<_> = order.rotation.iter().flatten().copied().collect();
        assert_eq!(rotation, vec![ids[7], ids[6], ids[5], ids[4], ids[3], ids[2]]);
        assert!(order.rotation[6].is_none());
        assert!(order.duplicates().is_empty());
    }

    #[test]
    fn equal_scores_go_to_lower_handle() {
        let mut team = Team::new("Mariners", 31);
        let a = team.sign_player(starter("A", 50, 50), TeamLevel::Second).unwrap();
        let b = team.sign_player(starter("B", 50, 50), TeamLevel::Second).unwrap();
        let mut one = rules();
        one.rotation_starters = 1;

        let order = auto_assign(&team, None, &one, PriorityMode::Balanced);
        assert_eq!(order.rotation[0], Some(a));
        assert_eq!(order.closers[0], Some(b));
    }

    #[test]
    fn setup_is_limited_by_pitcher_target() {
        let mut team = Team::new("Mariners", 31);
        for i in 0..12 {
            team.sign_player(starter(&format!("P{i}"), 50, 50), TeamLevel::Second)
                .unwrap();
        }
        let mut small = rules();
        small.target_pitchers = 9;

        let order = auto_assign(&team, None, &small, PriorityMode::Balanced);
        assert_eq!(order.rotation_filled(), 6);
        assert!(order.closers[0].is_some());
        assert_eq!(order.setup.iter().flatten().count(), 2);
        assert_eq!(order.pitchers_placed(), 9);
    }

    #[test]
    fn lineup_covers_every_label_once() {
        let team = lineup_team();
        let order = auto_assign(&team, None, &rules(), PriorityMode::Balanced);

        assert_eq!(order.lineup_filled(), 9);
        let labels: BTreeSet<_> = order.positions.iter().flatten().copied().collect();
        assert_eq!(labels.len(), 9);
        assert!(labels.contains(&Position::DesignatedHitter));
        for (slot, label) in order.lineup.iter().zip(order.positions.iter()) {
            let (Some(id), Some(label)) = (slot, label) else {
                panic!("lineup slot left empty");
            };
            if label.is_fielding() {
                assert!(team.player(*id).unwrap().aptitude_at(*label) >= 20);
            }
        }
    }

    #[test]
    fn short_roster_leaves_slots_empty() {
        let mut team = Team::new("Mariners", 31);
        team.sign_player(fielder("Only", Position::Catcher, 60), TeamLevel::Second)
            .unwrap();
        let order = auto_assign(&team, None, &rules(), PriorityMode::Balanced);
        assert_eq!(order.lineup_filled(), 1);
        assert_eq!(order.positions[0], Some(Position::Catcher));
        assert_eq!(order.rotation_filled(), 0);
    }

    #[test]
    fn unavailable_and_developmental_players_are_skipped() {
        let mut team = Team::new("Mariners", 31);
        let hurt = team.sign_player(starter("Hurt", 99, 99), TeamLevel::Second).unwrap();
        let cooling = team.sign_player(starter("Cooling", 98, 99), TeamLevel::Second).unwrap();
        let mut kid = starter("Kid", 97, 99);
        kid.is_developmental = true;
        let kid = team.sign_player(kid, TeamLevel::Third).unwrap();
        let healthy = team.sign_player(starter("Healthy", 40, 40), TeamLevel::Second).unwrap();
        team.injure(hurt, 5).unwrap();
        team.player_mut(cooling).unwrap().days_until_promotion = 10;

        let order = auto_assign(&team, None, &rules(), PriorityMode::Balanced);
        assert_eq!(order.active_set(), BTreeSet::from([healthy]));
        assert!(!order.contains(kid));
    }

    #[test]
    fn template_seed_beats_better_candidate() {
        let mut team = Team::new("Mariners", 31);
        let star = team.sign_player(fielder("Star", Position::Catcher, 95), TeamLevel::Second).unwrap();
        let backup = team.sign_player(fielder("Backup", Position::Catcher, 30), TeamLevel::Second).unwrap();

        let mut template = RosterOrder::default();
        template.lineup[4] = Some(backup);
        template.positions[4] = Some(Position::Catcher);

        let order = auto_assign(&team, Some(&template), &rules(), PriorityMode::Ability);
        assert_eq!(order.lineup[4], Some(backup));
        assert_eq!(order.positions[4], Some(Position::Catcher));
        assert_ne!(
            order.positions[order.lineup.iter().position(|s| *s == Some(star)).unwrap()],
            Some(Position::Catcher)
        );
    }

    #[test]
    fn injured_template_player_is_replaced_by_greedy_fill() {
        let mut team = lineup_team();
        let catcher = team.find_by_name("F0").unwrap();
        let mut backup = fielder("Backup", Position::Catcher, 30);
        backup.defense_ranges.insert(Position::Catcher, 40);
        let backup = team.sign_player(backup, TeamLevel::Second).unwrap();
        team.injure(catcher, 3).unwrap();

        let mut template = RosterOrder::default();
        template.lineup[0] = Some(catcher);
        template.positions[0] = Some(Position::Catcher);

        let order = auto_assign(&team, Some(&template), &rules(), PriorityMode::Balanced);
        assert!(!order.contains(catcher));
        let slot = order.lineup.iter().position(|s| *s == Some(backup)).unwrap();
        assert_eq!(order.positions[slot], Some(Position::Catcher));
    }

    #[test]
    fn unlabelled_seed_takes_primary_position() {
        let team = lineup_team();
        let shortstop = team.find_by_name("F4").unwrap();
        let mut template = RosterOrder::default();
        template.lineup[0] = Some(shortstop);

        let order = auto_assign(&team, Some(&template), &rules(), PriorityMode::Balanced);
        assert_eq!(order.lineup[0], Some(shortstop));
        assert_eq!(order.positions[0], Some(Position::ShortStop));
    }

    #[test]
    fn bench_is_capped_and_sorted_by_overall() {
        let mut team = lineup_team();
        let mut bench_ids = Vec::new();
        for i in 0..10 {
            let p = fielder(&format!("B{i}"), Position::LeftField, 10 + i as u8);
            bench_ids.push(team.sign_player(p, TeamLevel::Second).unwrap());
        }
        let order = auto_assign(&team, None, &rules(), PriorityMode::Balanced);
        assert_eq!(order.bench.len(), 7);
        let ratings: Vec<f64> = order
            .bench
            .iter()
            .map(|id| team.player(*id).unwrap().overall_batting())
            .collect();
        assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn active_limit_shrinks_bench_before_staff() {
        let mut team = lineup_team();
        for i in 0..10 {
            team.sign_player(fielder(&format!("B{i}"), Position::LeftField, 30), TeamLevel::Second)
                .unwrap();
        }
        for i in 0..17 {
            team.sign_player(starter(&format!("P{i}"), 50, 50), TeamLevel::Second)
                .unwrap();
        }
        team.active_limit = 27;

        let order = auto_assign(&team, None, &rules(), PriorityMode::Balanced);
        assert_eq!(order.lineup_filled(), 9);
        assert_eq!(order.pitchers_placed(), 15);
        assert_eq!(order.bench.len(), 3);
        assert_eq!(order.active_set().len(), 27);
    }

    #[test]
    fn tight_limit_trims_pitching_to_keep_the_lineup() {
        let mut team = lineup_team();
        for i in 0..10 {
            team.sign_player(starter(&format!("P{i}"), 50, 50), TeamLevel::Second)
                .unwrap();
        }
        team.active_limit = 13;

        let order = auto_assign(&team, None, &rules(), PriorityMode::Balanced);
        assert_eq!(order.lineup_filled(), 9);
        assert_eq!(order.rotation_filled(), 4);
        assert!(order.closers[0].is_none());
        assert!(order.bench.is_empty());
        assert_eq!(order.active_set().len(), 13);
    }

    #[test]
    fn template_bench_skips_pitchers() {
        let mut team = lineup_team();
        let extra = team
            .sign_player(fielder("Extra", Position::LeftField, 20), TeamLevel::Second)
            .unwrap();
        let arm = team.sign_player(starter("Arm", 50, 50), TeamLevel::Second).unwrap();
        let mut no_staff = rules();
        no_staff.target_pitchers = 0;
        let mut template = RosterOrder::default();
        template.bench.push(arm);

        let order = auto_assign(&team, Some(&template), &no_staff, PriorityMode::Balanced);
        assert!(!order.contains(arm));
        assert_eq!(order.bench, vec![extra]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut team = lineup_team();
        for i in 0..8 {
            team.sign_player(starter(&format!("P{i}"), 50, 50), TeamLevel::Second)
                .unwrap();
        }
        let first = auto_assign(&team, None, &rules(), PriorityMode::Condition);
        let second = auto_assign(&team, None, &rules(), PriorityMode::Condition);
        assert_eq!(first, second);
    }
}
