// Fitness scores for placing a player in a batting slot, a fielding
// position or a pitching role.

use crate::player::{Player, PitcherRole, Position};

pub use dugout_core::config::PriorityMode;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fielding aptitude below this excludes a player from the position.
pub const FIELDING_FLOOR: u8 = 20;

/// Score multiplier for players already on the active roster.
pub const INCUMBENCY_BONUS: f64 = 1.15;

/// Neutral condition on the 1-9 scale.
const NEUTRAL_CONDITION: f64 = 5.0;

/// Role aptitude that leaves the pitching base score unscaled.
const ROLE_APTITUDE_PAR: f64 = 50.0;

/// Relative weights of the batting components under one priority mode.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BattingWeights {
    contact: f64,
    power: f64,
    speed: f64,
    eye: f64,
}

fn batting_weights(mode: PriorityMode) -> BattingWeights {
    match mode {
        PriorityMode::Ability => BattingWeights {
            contact: 1.2,
            power: 1.2,
            speed: 0.5,
            eye: 0.8,
        },
        PriorityMode::Balanced => BattingWeights {
            contact: 1.0,
            power: 1.0,
            speed: 0.6,
            eye: 0.8,
        },
        PriorityMode::Condition => BattingWeights {
            contact: 0.8,
            power: 0.8,
            speed: 0.5,
            eye: 0.6,
        },
    }
}

// ---------------------------------------------------------------------------
// Multipliers
// ---------------------------------------------------------------------------

/// How strongly condition swings a score under each mode.
pub fn condition_sensitivity(mode: PriorityMode) -> f64 {
    match mode {
        PriorityMode::Condition => 0.15,
        PriorityMode::Balanced => 0.10,
        PriorityMode::Ability => 0.03,
    }
}

/// `1 + (condition - 5) * k`
pub fn condition_multiplier(condition: u8, mode: PriorityMode) -> f64 {
    1.0 + (condition as f64 - NEUTRAL_CONDITION) * condition_sensitivity(mode)
}

pub fn incumbency_multiplier(incumbent: bool) -> f64 {
    if incumbent {
        INCUMBENCY_BONUS
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Batting fitness. `incumbent` is whether the player currently holds an
/// active-roster spot.
pub fn batting_score(player: &Player, mode: PriorityMode, incumbent: bool) -> f64 {
    let w = batting_weights(mode);
    let b = &player.batting;
    let base = b.contact as f64 * w.contact
        + b.power as f64 * w.power
        + b.speed as f64 * w.speed
        + b.eye as f64 * w.eye;
    base * condition_multiplier(player.condition, mode) * incumbency_multiplier(incumbent)
}

/// Defensive fitness at `position`, or `None` when the player's aptitude
/// there is below [`FIELDING_FLOOR`].
pub fn defense_score(player: &Player, position: Position) -> Option<f64> {
    let aptitude = player.aptitude_at(position);
    if aptitude < FIELDING_FLOOR {
        return None;
    }
    Some(
        aptitude as f64 * 1.5
            + player.batting.fielding as f64 * 0.5
            + player.batting.arm as f64 * 0.5,
    )
}

/// Extra weight on the defensive term for up-the-middle positions.
pub fn position_weight(position: Position) -> f64 {
    match position {
        Position::Catcher | Position::ShortStop | Position::SecondBase => 1.5,
        _ => 1.0,
    }
}

/// Score for starting at `position`: batting plus weighted defense. The
/// designated hitter is scored on batting alone.
pub fn lineup_score(
    player: &Player,
    position: Position,
    mode: PriorityMode,
    incumbent: bool,
) -> Option<f64> {
    let batting = batting_score(player, mode, incumbent);
    if position == Position::DesignatedHitter {
        return Some(batting);
    }
    defense_score(player, position).map(|d| batting + d * position_weight(position))
}

/// Pitching fitness for `role`.
pub fn pitcher_score(player: &Player, role: PitcherRole, mode: PriorityMode, incumbent: bool) -> f64 {
    let base = player.overall_pitching() * 99.0;
    let aptitude_ratio = player.pitcher_aptitude.for_role(role) as f64 / ROLE_APTITUDE_PAR;
    let p = &player.pitching;
    let bonus = match role {
        PitcherRole::Starter => p.stamina as f64,
        PitcherRole::Closer => (p.velocity as f64 - 130.0) * 2.0 + p.stuff as f64 * 0.5,
        PitcherRole::Relief => 0.0,
    };
    (base * aptitude_ratio + bonus)
        * condition_multiplier(player.condition, mode)
        * incumbency_multiplier(incumbent)
}
