// Player records: identity, aptitudes, abilities and day-to-day status.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::{BattingLine, PitchingLine};

/// Fielding positions plus the pitcher designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Catcher,
    FirstBase,
    SecondBase,
    ThirdBase,
    ShortStop,
    LeftField,
    CenterField,
    RightField,
    DesignatedHitter,
    Pitcher,
}

/// The eight positions that take the field, in lineup fill order.
pub const FIELDING_POSITIONS: [Position; 8] = [
    Position::Catcher,
    Position::FirstBase,
    Position::SecondBase,
    Position::ThirdBase,
    Position::ShortStop,
    Position::LeftField,
    Position::CenterField,
    Position::RightField,
];

impl Position {
    /// Parse a position string.
    ///
    /// Accepts scorebook abbreviations ("C", "1B", "SS", "DH", "P"/"SP"/"RP")
    /// and long names ("Catcher", "First Base", ...), case-insensitive.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" | "CATCHER" => Some(Position::Catcher),
            "1B" | "FIRST BASE" => Some(Position::FirstBase),
            "2B" | "SECOND BASE" => Some(Position::SecondBase),
            "3B" | "THIRD BASE" => Some(Position::ThirdBase),
            "SS" | "SHORTSTOP" => Some(Position::ShortStop),
            "LF" | "LEFT FIELD" => Some(Position::LeftField),
            "CF" | "CENTER FIELD" => Some(Position::CenterField),
            "RF" | "RIGHT FIELD" => Some(Position::RightField),
            "DH" | "DESIGNATED HITTER" => Some(Position::DesignatedHitter),
            "P" | "SP" | "RP" | "PITCHER" => Some(Position::Pitcher),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Catcher => "C",
            Position::FirstBase => "1B",
            Position::SecondBase => "2B",
            Position::ThirdBase => "3B",
            Position::ShortStop => "SS",
            Position::LeftField => "LF",
            Position::CenterField => "CF",
            Position::RightField => "RF",
            Position::DesignatedHitter => "DH",
            Position::Pitcher => "P",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            Position::Catcher => "Catcher",
            Position::FirstBase => "First Base",
            Position::SecondBase => "Second Base",
            Position::ThirdBase => "Third Base",
            Position::ShortStop => "Shortstop",
            Position::LeftField => "Left Field",
            Position::CenterField => "Center Field",
            Position::RightField => "Right Field",
            Position::DesignatedHitter => "Designated Hitter",
            Position::Pitcher => "Pitcher",
        }
    }

    /// Whether this is one of the eight positions that take the field.
    pub fn is_fielding(&self) -> bool {
        FIELDING_POSITIONS.contains(self)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Pitching roles the auto-fill staffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitcherRole {
    Starter,
    Relief,
    Closer,
}

/// Which of the three organisational rosters a player is registered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamLevel {
    First,
    #[default]
    Second,
    Third,
}

impl TeamLevel {
    pub fn from_str_level(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" | "1" | "active" => Some(TeamLevel::First),
            "second" | "2" | "farm" => Some(TeamLevel::Second),
            "third" | "3" => Some(TeamLevel::Third),
            _ => None,
        }
    }
}

/// Suitability for each pitching role, 0-99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PitcherAptitude {
    #[serde(default)]
    pub starter: u8,
    #[serde(default)]
    pub middle: u8,
    #[serde(default)]
    pub closer: u8,
}

impl PitcherAptitude {
    pub fn for_role(&self, role: PitcherRole) -> u8 {
        match role {
            PitcherRole::Starter => self.starter,
            PitcherRole::Relief => self.middle,
            PitcherRole::Closer => self.closer,
        }
    }
}

/// Hitting and fielding abilities, 1-99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingAbility {
    pub contact: u8,
    pub power: u8,
    pub speed: u8,
    /// On-base skill (pitch recognition).
    pub eye: u8,
    pub arm: u8,
    /// Sure-handedness; higher means fewer errors.
    pub fielding: u8,
}

impl Default for BattingAbility {
    fn default() -> Self {
        Self {
            contact: 50,
            power: 50,
            speed: 50,
            eye: 50,
            arm: 50,
            fielding: 50,
        }
    }
}

/// Pitching abilities. Velocity is in km/h; everything else is 1-99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchingAbility {
    pub velocity: u16,
    pub control: u8,
    pub stamina: u8,
    pub stuff: u8,
}

impl Default for PitchingAbility {
    fn default() -> Self {
        Self {
            velocity: 140,
            control: 50,
            stamina: 50,
            stuff: 50,
        }
    }
}

pub const CONDITION_MIN: u8 = 1;
pub const CONDITION_MAX: u8 = 9;
pub const CONDITION_NEUTRAL: u8 = 5;
pub const FATIGUE_MAX: u8 = 100;
const VELOCITY_RANGE: std::ops::RangeInclusive<u16> = 100..=170;

fn default_condition() -> u8 {
    CONDITION_NEUTRAL
}

/// Raised when a record carries a value outside its documented range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("player '{player}': {attribute} = {value} is out of range {min}..={max}")]
pub struct AttributeOutOfRange {
    pub player: String,
    pub attribute: String,
    pub value: i64,
    pub min: i64,
    pub max: i64,
}

/// A player. Every attribute has a concrete value; omitted fields in stored
/// documents take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub uniform_number: u16,
    pub position: Position,
    /// Fielding aptitude per position, 0-99. Missing positions count as 0.
    #[serde(default)]
    pub defense_ranges: BTreeMap<Position, u8>,
    #[serde(default)]
    pub pitcher_aptitude: PitcherAptitude,
    #[serde(default)]
    pub batting: BattingAbility,
    #[serde(default)]
    pub pitching: PitchingAbility,
    /// Game-day form, 1-9; 5 is neutral.
    #[serde(default = "default_condition")]
    pub condition: u8,
    /// Accumulated tiredness, 0-100.
    #[serde(default)]
    pub fatigue: u8,
    /// Days until recovered; zero means healthy.
    #[serde(default)]
    pub injury_days: u32,
    /// Re-registration cooldown after a demotion.
    #[serde(default)]
    pub days_until_promotion: u32,
    #[serde(default)]
    pub is_developmental: bool,
    #[serde(default)]
    pub team_level: TeamLevel,
    #[serde(default)]
    pub season_batting: BattingLine,
    #[serde(default)]
    pub season_pitching: PitchingLine,
}

impl Player {
    /// A position player with neutral abilities and full aptitude at
    /// their primary position.
    pub fn batter(name: &str, position: Position) -> Self {
        let mut defense_ranges = BTreeMap::new();
        if position.is_fielding() {
            defense_ranges.insert(position, 70);
        }
        Self {
            name: name.to_string(),
            uniform_number: 0,
            position,
            defense_ranges,
            pitcher_aptitude: PitcherAptitude::default(),
            batting: BattingAbility::default(),
            pitching: PitchingAbility::default(),
            condition: CONDITION_NEUTRAL,
            fatigue: 0,
            injury_days: 0,
            days_until_promotion: 0,
            is_developmental: false,
            team_level: TeamLevel::default(),
            season_batting: BattingLine::default(),
            season_pitching: PitchingLine::default(),
        }
    }

    /// A pitcher with neutral abilities and middling role aptitudes.
    pub fn pitcher(name: &str) -> Self {
        Self {
            pitcher_aptitude: PitcherAptitude {
                starter: 50,
                middle: 50,
                closer: 50,
            },
            batting: BattingAbility {
                contact: 10,
                power: 10,
                speed: 30,
                eye: 10,
                arm: 60,
                fielding: 50,
            },
            ..Self::batter(name, Position::Pitcher)
        }
    }

    pub fn is_pitcher(&self) -> bool {
        self.position == Position::Pitcher
    }

    pub fn is_injured(&self) -> bool {
        self.injury_days > 0
    }

    /// Healthy and not serving a re-registration cooldown.
    pub fn is_available(&self) -> bool {
        !self.is_injured() && self.days_until_promotion == 0
    }

    /// Fielding aptitude at `position`; unlisted positions are 0.
    pub fn aptitude_at(&self, position: Position) -> u8 {
        self.defense_ranges.get(&position).copied().unwrap_or(0)
    }

    /// Overall hitting rating on the 1-99 scale, used for bench ordering.
    pub fn overall_batting(&self) -> f64 {
        let b = &self.batting;
        let best_defense = self.defense_ranges.values().copied().max().unwrap_or(0);
        (b.contact as f64 * 0.25
            + b.power as f64 * 0.25
            + b.eye as f64 * 0.15
            + b.speed as f64 * 0.1
            + b.fielding as f64 * 0.1
            + b.arm as f64 * 0.05
            + best_defense as f64 * 0.1)
            .clamp(1.0, 99.0)
    }

    /// Overall pitching rating normalised to 0.0-1.0.
    pub fn overall_pitching(&self) -> f64 {
        let p = &self.pitching;
        let velocity_score = ((p.velocity as f64 - 130.0) * 99.0 / 30.0).clamp(1.0, 99.0);
        let raw = p.stuff as f64 * 0.35 + p.control as f64 * 0.35 + velocity_score * 0.3;
        (raw / 99.0).clamp(0.0, 1.0)
    }

    /// Check every bounded attribute against its documented range.
    pub fn validate(&self) -> Result<(), AttributeOutOfRange> {
        let out = |attribute: &str, value: i64, min: i64, max: i64| AttributeOutOfRange {
            player: self.name.clone(),
            attribute: attribute.to_string(),
            value,
            min,
            max,
        };

        for (pos, &apt) in &self.defense_ranges {
            if apt > 99 {
                return Err(out(&format!("defense_ranges[{pos}]"), apt as i64, 0, 99));
            }
        }

        let aptitudes = [
            ("pitcher_aptitude.starter", self.pitcher_aptitude.starter),
            ("pitcher_aptitude.middle", self.pitcher_aptitude.middle),
            ("pitcher_aptitude.closer", self.pitcher_aptitude.closer),
        ];
        for (name, value) in aptitudes {
            if value > 99 {
                return Err(out(name, value as i64, 0, 99));
            }
        }

        let b = &self.batting;
        let p = &self.pitching;
        let abilities = [
            ("batting.contact", b.contact),
            ("batting.power", b.power),
            ("batting.speed", b.speed),
            ("batting.eye", b.eye),
            ("batting.arm", b.arm),
            ("batting.fielding", b.fielding),
            ("pitching.control", p.control),
            ("pitching.stamina", p.stamina),
            ("pitching.stuff", p.stuff),
        ];
        for (name, value) in abilities {
            if !(1..=99).contains(&value) {
                return Err(out(name, value as i64, 1, 99));
            }
        }

        if !VELOCITY_RANGE.contains(&p.velocity) {
            return Err(out(
                "pitching.velocity",
                p.velocity as i64,
                *VELOCITY_RANGE.start() as i64,
                *VELOCITY_RANGE.end() as i64,
            ));
        }

        if !(CONDITION_MIN..=CONDITION_MAX).contains(&self.condition) {
            return Err(out(
                "condition",
                self.condition as i64,
                CONDITION_MIN as i64,
                CONDITION_MAX as i64,
            ));
        }

        if self.fatigue > FATIGUE_MAX {
            return Err(out("fatigue", self.fatigue as i64, 0, FATIGUE_MAX as i64));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_pos_abbreviations_and_long_names() {
        assert_eq!(Position::from_str_pos("C"), Some(Position::Catcher));
        assert_eq!(Position::from_str_pos("ss"), Some(Position::ShortStop));
        assert_eq!(Position::from_str_pos("Center Field"), Some(Position::CenterField));
        assert_eq!(Position::from_str_pos("SP"), Some(Position::Pitcher));
        assert_eq!(Position::from_str_pos("UTIL"), None);
    }

    #[test]
    fn long_name_round_trips_through_parser() {
        for pos in FIELDING_POSITIONS {
            assert_eq!(Position::from_str_pos(pos.long_name()), Some(pos));
            assert_eq!(Position::from_str_pos(pos.display_str()), Some(pos));
        }
    }

    #[test]
    fn dh_and_pitcher_are_not_fielding_positions() {
        assert!(!Position::DesignatedHitter.is_fielding());
        assert!(!Position::Pitcher.is_fielding());
        assert!(Position::Catcher.is_fielding());
    }

    #[test]
    fn availability_requires_health_and_no_cooldown() {
        let mut p = Player::batter("Kenta Arai", Position::Catcher);
        assert!(p.is_available());

        p.injury_days = 3;
        assert!(p.is_injured());
        assert!(!p.is_available());

        p.injury_days = 0;
        p.days_until_promotion = 10;
        assert!(!p.is_available());
    }

    #[test]
    fn aptitude_defaults_to_zero_for_unlisted_positions() {
        let p = Player::batter("Kenta Arai", Position::Catcher);
        assert_eq!(p.aptitude_at(Position::Catcher), 70);
        assert_eq!(p.aptitude_at(Position::ShortStop), 0);
    }

    #[test]
    fn overall_pitching_is_normalised() {
        let mut p = Player::pitcher("Ryo Sato");
        p.pitching = PitchingAbility {
            velocity: 160,
            control: 99,
            stamina: 99,
            stuff: 99,
        };
        assert!((p.overall_pitching() - 1.0).abs() < 1e-9);

        p.pitching = PitchingAbility {
            velocity: 120,
            control: 1,
            stamina: 1,
            stuff: 1,
        };
        assert!(p.overall_pitching() > 0.0);
        assert!(p.overall_pitching() < 0.05);
    }

    #[test]
    fn validate_rejects_out_of_range_condition() {
        let mut p = Player::batter("Kenta Arai", Position::Catcher);
        p.condition = 0;
        let err = p.validate().unwrap_err();
        assert_eq!(err.attribute, "condition");
        assert_eq!(err.min, 1);
    }

    #[test]
    fn validate_rejects_aptitude_over_99() {
        let mut p = Player::batter("Kenta Arai", Position::Catcher);
        p.defense_ranges.insert(Position::FirstBase, 120);
        let err = p.validate().unwrap_err();
        assert!(err.attribute.starts_with("defense_ranges"));
    }

    #[test]
    fn deserialize_fills_defaults_for_missing_fields() {
        let p: Player = serde_json::from_str(r#"{"name": "Sparse", "position": "ShortStop"}"#).unwrap();
        assert_eq!(p.condition, CONDITION_NEUTRAL);
        assert_eq!(p.team_level, TeamLevel::Second);
        assert_eq!(p.batting, BattingAbility::default());
        assert!(p.validate().is_ok());
    }
}
