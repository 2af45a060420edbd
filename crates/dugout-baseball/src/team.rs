// Team: the player arena plus every roster list that refers into it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::arena::{Arena, PlayerId};
use crate::order::RosterOrder;
use crate::player::{AttributeOutOfRange, Player, TeamLevel, CONDITION_MAX, CONDITION_MIN};

#[derive(Debug, Error)]
pub enum TeamError {
    #[error("no player with handle {0} on this team")]
    UnknownPlayer(PlayerId),

    #[error(transparent)]
    InvalidAttribute(#[from] AttributeOutOfRange),

    #[error("active roster is full ({limit} players)")]
    ActiveRosterFull { limit: usize },

    #[error("{player} is on the active roster; move them with a roster save")]
    OnActiveRoster { player: String },

    #[error("{player} can only join the active roster through a roster save")]
    PromotionRequiresSave { player: String },
}

/// A team and its roster state.
///
/// Invariant: every handle in `active_roster`, `farm_roster`,
/// `third_roster` and `order` resolves in `players`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    players: Arena<Player>,
    #[serde(default)]
    active_roster: Vec<PlayerId>,
    #[serde(default)]
    farm_roster: Vec<PlayerId>,
    #[serde(default)]
    third_roster: Vec<PlayerId>,
    /// The lineup and staff last accepted by a roster save.
    #[serde(default)]
    order: RosterOrder,
    /// Set by the first successful save of a season.
    #[serde(default)]
    pub order_initialized: bool,
    /// Active-roster cap for this team.
    pub active_limit: usize,
}

impl Team {
    pub fn new(name: &str, active_limit: usize) -> Self {
        Self {
            name: name.to_string(),
            players: Arena::new(),
            active_roster: Vec::new(),
            farm_roster: Vec::new(),
            third_roster: Vec::new(),
            order: RosterOrder::default(),
            order_initialized: false,
            active_limit,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// All players in handle order.
    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &Player)> {
        self.players.iter()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Name for messages; stale handles render as the handle itself.
    pub fn name_of(&self, id: PlayerId) -> String {
        self.player(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn find_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|(_, p)| p.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id)
    }

    pub fn active_roster(&self) -> &[PlayerId] {
        &self.active_roster
    }

    pub fn farm_roster(&self) -> &[PlayerId] {
        &self.farm_roster
    }

    pub fn third_roster(&self) -> &[PlayerId] {
        &self.third_roster
    }

    pub fn order(&self) -> &RosterOrder {
        &self.order
    }

    pub fn is_active(&self, id: PlayerId) -> bool {
        self.active_roster.contains(&id)
    }

    /// Which roster list holds `id`, if any.
    pub fn roster_of(&self, id: PlayerId) -> Option<TeamLevel> {
        if self.active_roster.contains(&id) {
            Some(TeamLevel::First)
        } else if self.farm_roster.contains(&id) {
            Some(TeamLevel::Second)
        } else if self.third_roster.contains(&id) {
            Some(TeamLevel::Third)
        } else {
            None
        }
    }

    /// Handles referenced by any roster list that no longer resolve.
    pub fn dangling_references(&self) -> Vec<PlayerId> {
        self.active_roster
            .iter()
            .chain(self.farm_roster.iter())
            .chain(self.third_roster.iter())
            .copied()
            .chain(self.order.all_entries())
            .filter(|id| !self.players.contains(*id))
            .collect()
    }

    // ------------------------------------------------------------------
    // Roster membership
    // ------------------------------------------------------------------

    /// Add a new player to the organisation on the roster for `level`.
    /// Developmental players always start on the third roster.
    pub fn sign_player(&mut self, mut player: Player, level: TeamLevel) -> Result<PlayerId, TeamError> {
        player.validate()?;

        let level = if player.is_developmental {
            TeamLevel::Third
        } else {
            level
        };
        if level == TeamLevel::First && self.active_roster.len() >= self.active_limit {
            return Err(TeamError::ActiveRosterFull {
                limit: self.active_limit,
            });
        }

        player.team_level = level;
        let name = player.name.clone();
        let id = self.players.insert(player);
        self.list_for(level).push(id);

        info!("signed {} ({}) to {:?} roster of {}", name, id, level, self.name);
        Ok(id)
    }

    /// Release a player to free agency. Every roster list drops the
    /// handle; no other handle changes.
    pub fn release_player(&mut self, id: PlayerId) -> Result<Player, TeamError> {
        let player = self.players.remove(id).ok_or(TeamError::UnknownPlayer(id))?;

        self.active_roster.retain(|p| *p != id);
        self.farm_roster.retain(|p| *p != id);
        self.third_roster.retain(|p| *p != id);
        self.order.remove(id);

        info!("released {} ({}) from {}", player.name, id, self.name);
        Ok(player)
    }

    /// Move a non-active player between the farm and third rosters.
    pub fn transfer(&mut self, id: PlayerId, level: TeamLevel) -> Result<(), TeamError> {
        let name = self
            .player(id)
            .map(|p| p.name.clone())
            .ok_or(TeamError::UnknownPlayer(id))?;

        if self.is_active(id) {
            return Err(TeamError::OnActiveRoster { player: name });
        }
        if level == TeamLevel::First {
            return Err(TeamError::PromotionRequiresSave { player: name });
        }

        self.farm_roster.retain(|p| *p != id);
        self.third_roster.retain(|p| *p != id);
        self.list_for(level).push(id);
        if let Some(p) = self.player_mut(id) {
            p.team_level = level;
        }

        debug!("transferred {} to {:?} roster", name, level);
        Ok(())
    }

    fn list_for(&mut self, level: TeamLevel) -> &mut Vec<PlayerId> {
        match level {
            TeamLevel::First => &mut self.active_roster,
            TeamLevel::Second => &mut self.farm_roster,
            TeamLevel::Third => &mut self.third_roster,
        }
    }

    /// Register `id` on the active roster. Used by the save transaction.
    pub(crate) fn promote_to_active(&mut self, id: PlayerId) {
        self.farm_roster.retain(|p| *p != id);
        self.third_roster.retain(|p| *p != id);
        if !self.active_roster.contains(&id) {
            self.active_roster.push(id);
        }
    }

    /// Move `id` from the active roster to the farm roster.
    pub(crate) fn demote_to_farm(&mut self, id: PlayerId) {
        self.active_roster.retain(|p| *p != id);
        if !self.farm_roster.contains(&id) {
            self.farm_roster.push(id);
        }
    }

    pub(crate) fn set_order(&mut self, order: RosterOrder) {
        self.order = order;
    }

    // ------------------------------------------------------------------
    // Daily status
    // ------------------------------------------------------------------

    /// Count one simulated day off every cooldown and injury. Returns the
    /// players whose re-registration cooldown ended today.
    pub fn advance_day(&mut self) -> Vec<PlayerId> {
        let mut cleared = Vec::new();
        let ids = self.players.ids();
        for id in ids {
            let Some(player) = self.players.get_mut(id) else {
                continue;
            };
            if player.days_until_promotion > 0 {
                player.days_until_promotion -= 1;
                if player.days_until_promotion == 0 {
                    cleared.push(id);
                }
            }
            player.injury_days = player.injury_days.saturating_sub(1);
        }
        if !cleared.is_empty() {
            debug!("{} players eligible for re-registration on {}", cleared.len(), self.name);
        }
        cleared
    }

    pub fn injure(&mut self, id: PlayerId, days: u32) -> Result<(), TeamError> {
        let player = self.player_mut(id).ok_or(TeamError::UnknownPlayer(id))?;
        player.injury_days = days;
        Ok(())
    }

    pub fn set_condition(&mut self, id: PlayerId, condition: u8) -> Result<(), TeamError> {
        let player = self.player_mut(id).ok_or(TeamError::UnknownPlayer(id))?;
        if !(CONDITION_MIN..=CONDITION_MAX).contains(&condition) {
            return Err(AttributeOutOfRange {
                player: player.name.clone(),
                attribute: "condition".into(),
                value: condition as i64,
                min: CONDITION_MIN as i64,
                max: CONDITION_MAX as i64,
            }
            .into());
        }
        player.condition = condition;
        Ok(())
    }

    /// Start a new season: the next save is again the first of the season.
    pub fn new_season(&mut self) {
        self.order_initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;

    fn sample_team() -> (Team, Vec<PlayerId>) {
        let mut team = Team::new("Mariners", 31);
        let ids = vec![
            team.sign_player(Player::batter("Arai", Position::Catcher), TeamLevel::First)
                .unwrap(),
            team.sign_player(Player::batter("Mori", Position::ShortStop), TeamLevel::Second)
                .unwrap(),
            team.sign_player(Player::pitcher("Sato"), TeamLevel::First).unwrap(),
            team.sign_player(Player::batter("Ueda", Position::LeftField), TeamLevel::Third)
                .unwrap(),
        ];
        (team, ids)
    }

    #[test]
    fn sign_player_places_on_requested_roster() {
        let (team, ids) = sample_team();
        assert_eq!(team.active_roster(), &[ids[0], ids[2]]);
        assert_eq!(team.farm_roster(), &[ids[1]]);
        assert_eq!(team.third_roster(), &[ids[3]]);
        assert_eq!(team.player(ids[1]).unwrap().team_level, TeamLevel::Second);
    }

    #[test]
    fn developmental_players_start_on_third_roster() {
        let mut team = Team::new("Mariners", 31);
        let mut prospect = Player::batter("Kid", Position::CenterField);
        prospect.is_developmental = true;
        let id = team.sign_player(prospect, TeamLevel::First).unwrap();
        assert_eq!(team.roster_of(id), Some(TeamLevel::Third));
    }

    #[test]
    fn sign_player_rejects_out_of_range_attributes() {
        let mut team = Team::new("Mariners", 31);
        let mut p = Player::batter("Bad", Position::Catcher);
        p.batting.power = 0;
        assert!(matches!(
            team.sign_player(p, TeamLevel::Second),
            Err(TeamError::InvalidAttribute(_))
        ));
        assert_eq!(team.player_count(), 0);
    }

    #[test]
    fn sign_player_respects_active_limit() {
        let mut team = Team::new("Mariners", 1);
        team.sign_player(Player::pitcher("A"), TeamLevel::First).unwrap();
        assert!(matches!(
            team.sign_player(Player::pitcher("B"), TeamLevel::First),
            Err(TeamError::ActiveRosterFull { limit: 1 })
        ));
    }

    #[test]
    fn release_removes_every_reference_and_keeps_other_handles() {
        let (mut team, ids) = sample_team();
        let mut order = RosterOrder::default();
        order.place_starter(ids[0], Position::Catcher);
        order.rotation[0] = Some(ids[2]);
        team.set_order(order);

        let released = team.release_player(ids[0]).unwrap();
        assert_eq!(released.name, "Arai");
        assert!(team.dangling_references().is_empty());
        assert!(team.order().lineup.iter().all(Option::is_none));
        assert!(team.order().positions.iter().all(Option::is_none));

        // Remaining handles still resolve to the same players.
        assert_eq!(team.player(ids[1]).unwrap().name, "Mori");
        assert_eq!(team.player(ids[2]).unwrap().name, "Sato");
        assert_eq!(team.order().rotation[0], Some(ids[2]));

        assert!(matches!(
            team.release_player(ids[0]),
            Err(TeamError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn released_slot_reuse_does_not_revive_old_handle() {
        let (mut team, ids) = sample_team();
        team.release_player(ids[1]).unwrap();
        let newcomer = team
            .sign_player(Player::batter("Newcomer", Position::FirstBase), TeamLevel::Second)
            .unwrap();
        assert_eq!(newcomer.slot(), ids[1].slot());
        assert!(team.player(ids[1]).is_none());
        assert_eq!(team.farm_roster(), &[newcomer]);
    }

    #[test]
    fn transfer_between_farm_and_third() {
        let (mut team, ids) = sample_team();
        team.transfer(ids[1], TeamLevel::Third).unwrap();
        assert_eq!(team.roster_of(ids[1]), Some(TeamLevel::Third));
        assert_eq!(team.player(ids[1]).unwrap().team_level, TeamLevel::Third);

        assert!(matches!(
            team.transfer(ids[0], TeamLevel::Second),
            Err(TeamError::OnActiveRoster { .. })
        ));
        assert!(matches!(
            team.transfer(ids[3], TeamLevel::First),
            Err(TeamError::PromotionRequiresSave { .. })
        ));
    }

    #[test]
    fn advance_day_counts_down_cooldown_and_injury() {
        let (mut team, ids) = sample_team();
        team.player_mut(ids[1]).unwrap().days_until_promotion = 2;
        team.injure(ids[0], 1).unwrap();

        assert!(team.advance_day().is_empty());
        assert!(!team.player(ids[0]).unwrap().is_injured());
        assert_eq!(team.player(ids[1]).unwrap().days_until_promotion, 1);

        assert_eq!(team.advance_day(), vec![ids[1]]);
        assert!(team.player(ids[1]).unwrap().is_available());
        assert!(team.advance_day().is_empty());
    }

    #[test]
    fn set_condition_validates_range() {
        let (mut team, ids) = sample_team();
        team.set_condition(ids[0], 9).unwrap();
        assert_eq!(team.player(ids[0]).unwrap().condition, 9);
        assert!(team.set_condition(ids[0], 10).is_err());
    }

    #[test]
    fn serde_round_trip_preserves_handles() {
        let (team, ids) = sample_team();
        let json = serde_json::to_value(&team).unwrap();
        let back: Team = serde_json::from_value(json).unwrap();
        assert_eq!(back, team);
        assert_eq!(back.player(ids[3]).unwrap().name, "Ueda");
    }
}
