// Roster save: validate a proposed order, then promote and demote players
// so the active roster matches it.

use std::collections::BTreeSet;

use dugout_core::config::RosterRules;
use dugout_core::db::RosterMoveRecord;
use thiserror::Error;
use tracing::{info, warn};

use crate::arena::PlayerId;
use crate::order::{RosterOrder, LINEUP_SLOTS};
use crate::player::{Position, TeamLevel};
use crate::team::Team;

/// Why a roster save was refused. A refused save changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveRejection {
    #[error("lineup has {filled} of 9 batting slots filled")]
    IncompleteLineup { filled: usize },

    #[error("rotation has no starting pitchers")]
    EmptyRotation,

    #[error("{player} is injured ({days} days) and cannot start")]
    InjuredStarter { player: String, days: u32 },

    #[error("{player} cannot rejoin the active roster for {days} more days")]
    PromotionCooldown { player: String, days: u32 },

    #[error("no player with handle {id} on this team")]
    UnknownPlayer { id: PlayerId },

    #[error("{player} is listed more than once")]
    DuplicatePlayer { player: String },

    #[error("{player} is a developmental player and cannot be registered")]
    DevelopmentalPlayer { player: String },

    #[error("active roster would hold {size} players (limit {limit})")]
    RosterOverLimit { size: usize, limit: usize },

    #[error("invalid lineup positions: {detail}")]
    InvalidPositions { detail: String },
}

impl SaveRejection {
    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SaveRejection::IncompleteLineup { .. } => "incomplete_lineup",
            SaveRejection::EmptyRotation => "empty_rotation",
            SaveRejection::InjuredStarter { .. } => "injured_starter",
            SaveRejection::PromotionCooldown { .. } => "promotion_cooldown",
            SaveRejection::UnknownPlayer { .. } => "unknown_player",
            SaveRejection::DuplicatePlayer { .. } => "duplicate_player",
            SaveRejection::DevelopmentalPlayer { .. } => "developmental_player",
            SaveRejection::RosterOverLimit { .. } => "roster_over_limit",
            SaveRejection::InvalidPositions { .. } => "invalid_positions",
        }
    }

    /// The offending player, when the rejection names one.
    pub fn player(&self) -> Option<&str> {
        match self {
            SaveRejection::InjuredStarter { player, .. }
            | SaveRejection::PromotionCooldown { player, .. }
            | SaveRejection::DuplicatePlayer { player }
            | SaveRejection::DevelopmentalPlayer { player } => Some(player),
            _ => None,
        }
    }
}

/// Result of an accepted save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub promoted: Vec<PlayerId>,
    pub demoted: Vec<PlayerId>,
    pub moves: Vec<RosterMoveRecord>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check `proposal` against `team` without changing anything.
pub fn validate_save(team: &Team, proposal: &RosterOrder) -> Result<(), SaveRejection> {
    for id in proposal.all_entries() {
        if team.player(id).is_none() {
            return Err(SaveRejection::UnknownPlayer { id });
        }
    }
    if let Some(&id) = proposal.duplicates().first() {
        return Err(SaveRejection::DuplicatePlayer {
            player: team.name_of(id),
        });
    }

    let filled = proposal.lineup_filled();
    if filled < LINEUP_SLOTS {
        return Err(SaveRejection::IncompleteLineup { filled });
    }
    if proposal.rotation_filled() == 0 {
        return Err(SaveRejection::EmptyRotation);
    }

    validate_positions(team, proposal)?;

    for id in proposal.starters() {
        if let Some(p) = team.player(id).filter(|p| p.is_injured()) {
            return Err(SaveRejection::InjuredStarter {
                player: p.name.clone(),
                days: p.injury_days,
            });
        }
    }

    let active = proposal.active_set();
    for &id in &active {
        let Some(p) = team.player(id) else {
            continue;
        };
        if p.days_until_promotion > 0 {
            return Err(SaveRejection::PromotionCooldown {
                player: p.name.clone(),
                days: p.days_until_promotion,
            });
        }
        if p.is_developmental {
            return Err(SaveRejection::DevelopmentalPlayer {
                player: p.name.clone(),
            });
        }
    }

    if active.len() > team.active_limit {
        return Err(SaveRejection::RosterOverLimit {
            size: active.len(),
            limit: team.active_limit,
        });
    }

    Ok(())
}

/// Every starter carries a batting label and no label is used twice.
fn validate_positions(team: &Team, proposal: &RosterOrder) -> Result<(), SaveRejection> {
    let mut seen = BTreeSet::new();
    for (slot, (id, label)) in proposal.lineup.iter().zip(proposal.positions.iter()).enumerate() {
        let Some(id) = id else {
            continue;
        };
        let Some(label) = label else {
            return Err(SaveRejection::InvalidPositions {
                detail: format!("{} in slot {} has no position", team.name_of(*id), slot + 1),
            });
        };
        if *label == Position::Pitcher {
            return Err(SaveRejection::InvalidPositions {
                detail: format!("slot {} is labelled pitcher", slot + 1),
            });
        }
        if !seen.insert(*label) {
            return Err(SaveRejection::InvalidPositions {
                detail: format!("{} is assigned more than once", label.long_name()),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// Apply `proposal` as the team's new roster order.
///
/// Players dropped from the active set go to the farm roster with a
/// re-registration cooldown (waived on the season's first save). Players
/// added are registered on the active roster. On rejection `team` is left
/// untouched.
pub fn commit_roster_save(
    team: &mut Team,
    proposal: &RosterOrder,
    rules: &RosterRules,
) -> Result<SaveOutcome, SaveRejection> {
    if let Err(rejection) = validate_save(team, proposal) {
        warn!("rejected roster save for {}: {}", team.name, rejection);
        return Err(rejection);
    }

    let old_active: BTreeSet<PlayerId> = team.active_roster().iter().copied().collect();
    let new_active = proposal.active_set();
    let cooldown = if team.order_initialized {
        rules.demotion_cooldown_days
    } else {
        0
    };

    let mut outcome = SaveOutcome::default();

    for &id in old_active.difference(&new_active) {
        team.demote_to_farm(id);
        let Some(player) = team.player_mut(id) else {
            continue;
        };
        player.team_level = TeamLevel::Second;
        if cooldown > 0 {
            player.days_until_promotion = cooldown;
        }
        let detail = if cooldown > 0 {
            format!("to farm roster, eligible again in {cooldown} days")
        } else {
            "to farm roster, no cooldown on the season's first save".to_string()
        };
        outcome.moves.push(RosterMoveRecord {
            player_name: player.name.clone(),
            kind: "demoted".into(),
            detail,
        });
        outcome.demoted.push(id);
    }

    for &id in new_active.difference(&old_active) {
        let from = team.roster_of(id);
        team.promote_to_active(id);
        let Some(player) = team.player_mut(id) else {
            continue;
        };
        player.days_until_promotion = 0;
        player.team_level = TeamLevel::First;
        let detail = match from {
            Some(TeamLevel::Third) => "to active roster from third roster",
            _ => "to active roster from farm roster",
        };
        outcome.moves.push(RosterMoveRecord {
            player_name: player.name.clone(),
            kind: "promoted".into(),
            detail: detail.to_string(),
        });
        outcome.promoted.push(id);
    }

    team.set_order(proposal.clone());
    team.order_initialized = true;

    info!(
        "saved roster for {}: {} promoted, {} demoted, {} active",
        team.name,
        outcome.promoted.len(),
        outcome.demoted.len(),
        team.active_roster().len()
    );
    Ok(outcome)
}
