// Counting-stat lines and the rate statistics derived from them.
//
// Rate stats are always computed from counting totals. A team line is the
// sum of its players' lines run through the same functions, never an
// average of the players' rates.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// League-constant added to the FIP numerator quotient.
pub const FIP_CONSTANT: f64 = 3.10;

/// Linear weights used by wOBA.
pub const WOBA_WEIGHT_BB: f64 = 0.69;
pub const WOBA_WEIGHT_HBP: f64 = 0.72;
pub const WOBA_WEIGHT_1B: f64 = 0.89;
pub const WOBA_WEIGHT_2B: f64 = 1.27;
pub const WOBA_WEIGHT_3B: f64 = 1.62;
pub const WOBA_WEIGHT_HR: f64 = 2.10;

/// Divide, yielding 0.0 for an empty denominator.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

// ---------------------------------------------------------------------------
// Batting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BattingLine {
    pub at_bats: u32,
    pub hits: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub walks: u32,
    pub hit_by_pitch: u32,
    pub sacrifice_flies: u32,
    pub strikeouts: u32,
    pub runs: u32,
    pub runs_batted_in: u32,
    pub stolen_bases: u32,
}

impl BattingLine {
    pub fn singles(&self) -> u32 {
        self.hits
            .saturating_sub(self.doubles + self.triples + self.home_runs)
    }

    pub fn total_bases(&self) -> u32 {
        self.singles() + 2 * self.doubles + 3 * self.triples + 4 * self.home_runs
    }

    pub fn plate_appearances(&self) -> u32 {
        self.at_bats + self.walks + self.hit_by_pitch + self.sacrifice_flies
    }

    pub fn batting_average(&self) -> f64 {
        ratio(self.hits as f64, self.at_bats as f64)
    }

    pub fn on_base_percentage(&self) -> f64 {
        ratio(
            (self.hits + self.walks + self.hit_by_pitch) as f64,
            self.plate_appearances() as f64,
        )
    }

    pub fn slugging(&self) -> f64 {
        ratio(self.total_bases() as f64, self.at_bats as f64)
    }

    pub fn ops(&self) -> f64 {
        self.on_base_percentage() + self.slugging()
    }

    /// Isolated power.
    pub fn iso(&self) -> f64 {
        self.slugging() - self.batting_average()
    }

    pub fn babip(&self) -> f64 {
        let in_play = (self.at_bats + self.sacrifice_flies)
            .saturating_sub(self.strikeouts + self.home_runs);
        ratio(
            self.hits.saturating_sub(self.home_runs) as f64,
            in_play as f64,
        )
    }

    pub fn woba(&self) -> f64 {
        let numerator = WOBA_WEIGHT_BB * self.walks as f64
            + WOBA_WEIGHT_HBP * self.hit_by_pitch as f64
            + WOBA_WEIGHT_1B * self.singles() as f64
            + WOBA_WEIGHT_2B * self.doubles as f64
            + WOBA_WEIGHT_3B * self.triples as f64
            + WOBA_WEIGHT_HR * self.home_runs as f64;
        ratio(numerator, self.plate_appearances() as f64)
    }
}

impl Add for BattingLine {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for BattingLine {
    fn add_assign(&mut self, rhs: Self) {
        self.at_bats += rhs.at_bats;
        self.hits += rhs.hits;
        self.doubles += rhs.doubles;
        self.triples += rhs.triples;
        self.home_runs += rhs.home_runs;
        self.walks += rhs.walks;
        self.hit_by_pitch += rhs.hit_by_pitch;
        self.sacrifice_flies += rhs.sacrifice_flies;
        self.strikeouts += rhs.strikeouts;
        self.runs += rhs.runs;
        self.runs_batted_in += rhs.runs_batted_in;
        self.stolen_bases += rhs.stolen_bases;
    }
}

impl Sum for BattingLine {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a BattingLine> for BattingLine {
    fn sum<I: Iterator<Item = &'a BattingLine>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Pitching
// ---------------------------------------------------------------------------

/// Innings are kept as recorded outs so that 6⅔ innings is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchingLine {
    pub outs_recorded: u32,
    pub earned_runs: u32,
    pub hits_allowed: u32,
    pub walks_allowed: u32,
    pub hit_batters: u32,
    pub strikeouts: u32,
    pub home_runs_allowed: u32,
    pub wins: u32,
    pub losses: u32,
    pub saves: u32,
    pub holds: u32,
}

impl PitchingLine {
    pub fn innings_pitched(&self) -> f64 {
        self.outs_recorded as f64 / 3.0
    }

    /// Innings in scorebook notation: whole innings plus `.1`/`.2` for
    /// extra outs.
    pub fn innings_display(&self) -> String {
        format!("{}.{}", self.outs_recorded / 3, self.outs_recorded % 3)
    }

    pub fn era(&self) -> f64 {
        ratio(self.earned_runs as f64 * 9.0, self.innings_pitched())
    }

    pub fn whip(&self) -> f64 {
        ratio(
            (self.walks_allowed + self.hits_allowed) as f64,
            self.innings_pitched(),
        )
    }

    pub fn strikeouts_per_nine(&self) -> f64 {
        ratio(self.strikeouts as f64 * 9.0, self.innings_pitched())
    }

    pub fn walks_per_nine(&self) -> f64 {
        ratio(self.walks_allowed as f64 * 9.0, self.innings_pitched())
    }

    /// Fielding-independent pitching. Zero when no innings are recorded.
    pub fn fip(&self) -> f64 {
        let ip = self.innings_pitched();
        if ip == 0.0 {
            return 0.0;
        }
        let numerator = 13.0 * self.home_runs_allowed as f64
            + 3.0 * (self.walks_allowed + self.hit_batters) as f64
            - 2.0 * self.strikeouts as f64;
        numerator / ip + FIP_CONSTANT
    }
}

impl Add for PitchingLine {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for PitchingLine {
    fn add_assign(&mut self, rhs: Self) {
        self.outs_recorded += rhs.outs_recorded;
        self.earned_runs += rhs.earned_runs;
        self.hits_allowed += rhs.hits_allowed;
        self.walks_allowed += rhs.walks_allowed;
        self.hit_batters += rhs.hit_batters;
        self.strikeouts += rhs.strikeouts;
        self.home_runs_allowed += rhs.home_runs_allowed;
        self.wins += rhs.wins;
        self.losses += rhs.losses;
        self.saves += rhs.saves;
        self.holds += rhs.holds;
    }
}

impl Sum for PitchingLine {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a PitchingLine> for PitchingLine {
    fn sum<I: Iterator<Item = &'a PitchingLine>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
