// Player pool import from CSV.
//
// One row per player. Aptitude columns left blank or zero mean "cannot
// play there"; blank or zero ability columns take the model defaults.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::arena::PlayerId;
use crate::player::{
    BattingAbility, PitcherAptitude, PitchingAbility, Player, Position, TeamLevel,
    CONDITION_NEUTRAL,
};
use crate::team::{Team, TeamError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV row
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawPlayerRow {
    Name: String,
    #[serde(default)]
    Number: Option<u16>,
    Pos: String,
    #[serde(default)]
    C: Option<u8>,
    #[serde(default, rename = "1B")]
    FirstBase: Option<u8>,
    #[serde(default, rename = "2B")]
    SecondBase: Option<u8>,
    #[serde(default, rename = "3B")]
    ThirdBase: Option<u8>,
    #[serde(default)]
    SS: Option<u8>,
    #[serde(default)]
    LF: Option<u8>,
    #[serde(default)]
    CF: Option<u8>,
    #[serde(default)]
    RF: Option<u8>,
    #[serde(default)]
    Starter: Option<u8>,
    #[serde(default, alias = "Relief")]
    Middle: Option<u8>,
    #[serde(default)]
    Closer: Option<u8>,
    #[serde(default)]
    Contact: Option<u8>,
    #[serde(default)]
    Power: Option<u8>,
    #[serde(default)]
    Speed: Option<u8>,
    #[serde(default)]
    Eye: Option<u8>,
    #[serde(default)]
    Arm: Option<u8>,
    #[serde(default)]
    Fielding: Option<u8>,
    #[serde(default)]
    Velocity: Option<u16>,
    #[serde(default)]
    Control: Option<u8>,
    #[serde(default)]
    Stamina: Option<u8>,
    #[serde(default)]
    Stuff: Option<u8>,
    #[serde(default)]
    Condition: Option<u8>,
    #[serde(default)]
    Level: Option<String>,
    #[serde(default)]
    Developmental: Option<bool>,
}

/// Zero and blank both mean "use the default".
fn or_default<T: Copy + Default + PartialEq>(value: Option<T>, default: T) -> T {
    match value {
        Some(v) if v != T::default() => v,
        _ => default,
    }
}

impl RawPlayerRow {
    fn into_player(self) -> Option<Player> {
        let name = self.Name.trim().to_string();
        let Some(position) = Position::from_str_pos(&self.Pos) else {
            warn!("skipping player '{}': unknown position '{}'", name, self.Pos);
            return None;
        };

        let aptitudes = [
            (Position::Catcher, self.C),
            (Position::FirstBase, self.FirstBase),
            (Position::SecondBase, self.SecondBase),
            (Position::ThirdBase, self.ThirdBase),
            (Position::ShortStop, self.SS),
            (Position::LeftField, self.LF),
            (Position::CenterField, self.CF),
            (Position::RightField, self.RF),
        ];
        let defense_ranges: BTreeMap<Position, u8> = aptitudes
            .into_iter()
            .filter_map(|(pos, apt)| apt.filter(|a| *a > 0).map(|a| (pos, a)))
            .collect();

        let bat = BattingAbility::default();
        let pitch = PitchingAbility::default();
        let level = match self.Level.as_deref().map(str::trim) {
            None | Some("") => TeamLevel::default(),
            Some(s) => match TeamLevel::from_str_level(s) {
                Some(level) => level,
                None => {
                    warn!("player '{}': unknown level '{}', using farm roster", name, s);
                    TeamLevel::default()
                }
            },
        };

        Some(Player {
            uniform_number: self.Number.unwrap_or(0),
            position,
            defense_ranges,
            pitcher_aptitude: PitcherAptitude {
                starter: self.Starter.unwrap_or(0),
                middle: self.Middle.unwrap_or(0),
                closer: self.Closer.unwrap_or(0),
            },
            batting: BattingAbility {
                contact: or_default(self.Contact, bat.contact),
                power: or_default(self.Power, bat.power),
                speed: or_default(self.Speed, bat.speed),
                eye: or_default(self.Eye, bat.eye),
                arm: or_default(self.Arm, bat.arm),
                fielding: or_default(self.Fielding, bat.fielding),
            },
            pitching: PitchingAbility {
                velocity: or_default(self.Velocity, pitch.velocity),
                control: or_default(self.Control, pitch.control),
                stamina: or_default(self.Stamina, pitch.stamina),
                stuff: or_default(self.Stuff, pitch.stuff),
            },
            condition: or_default(self.Condition, CONDITION_NEUTRAL),
            is_developmental: self.Developmental.unwrap_or(false),
            team_level: level,
            ..Player::batter(&name, position)
        })
    }
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        match result {
            Ok(raw) => {
                let Some(player) = raw.into_player() else {
                    continue;
                };
                if let Err(e) = player.validate() {
                    warn!("skipping player row: {}", e);
                    continue;
                }
                players.push(player);
            }
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(players)
}

/// Load a player pool from a CSV file.
pub fn load_players(path: &Path) -> Result<Vec<Player>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_players_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Sign every player onto `team` at the level recorded on the player.
/// When the active roster is full, the player goes to the farm roster.
pub fn sign_all(team: &mut Team, players: Vec<Player>) -> Vec<PlayerId> {
    let mut ids = Vec::with_capacity(players.len());
    for player in players {
        let level = player.team_level;
        let name = player.name.clone();
        let result = match team.sign_player(player.clone(), level) {
            Err(TeamError::ActiveRosterFull { limit }) => {
                warn!("active roster full ({}), signing '{}' to farm roster", limit, name);
                team.sign_player(player, TeamLevel::Second)
            }
            other => other,
        };
        match result {
            Ok(id) => ids.push(id),
            Err(e) => warn!("could not sign '{}': {}", name, e),
        }
    }
    ids
}
