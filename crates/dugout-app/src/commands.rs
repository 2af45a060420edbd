// Command handlers. Each loads the team from the store, runs one engine
// operation and writes the result back.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use dugout_baseball::assignment::auto_assign;
use dugout_baseball::import::{load_players, sign_all};
use dugout_baseball::order::RosterOrder;
use dugout_baseball::promotion::commit_roster_save;
use dugout_baseball::stats::{BattingLine, PitchingLine};
use dugout_baseball::store::TeamStore;
use dugout_baseball::{PlayerId, PriorityMode, Team, TeamLevel};
use dugout_core::config::Config;
use dugout_core::db::RosterMoveRecord;
use tracing::info;

use crate::cli::Command;

pub struct App {
    pub base_dir: PathBuf,
    pub config: Config,
    pub store: TeamStore,
}

impl App {
    pub fn new(base_dir: PathBuf, config: Config, store: TeamStore) -> Self {
        Self {
            base_dir,
            config,
            store,
        }
    }

    pub fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Import { team, csv } => self.import(&team, csv.as_deref(), out),
            Command::Show { team } => self.show(&team, out),
            Command::Auto { team, mode, apply } => self.auto(&team, mode, apply, out),
            Command::SaveOrder { team } => self.save_order(&team, out),
            Command::Advance { team, days } => self.advance(&team, days, out),
            Command::Release { team, player } => self.release(&team, &player, out),
            Command::Stats { team } => self.stats(&team, out),
            Command::NewSeason { team } => self.new_season(&team, out),
        }
    }

    fn load_team(&self, name: &str) -> Result<Team> {
        self.store
            .load_team(name)?
            .ok_or_else(|| anyhow!("no team named '{name}'; import a player pool first"))
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn import<W: Write>(&self, team_name: &str, csv: Option<&Path>, out: &mut W) -> Result<()> {
        let path = match csv {
            Some(p) => p.to_path_buf(),
            None => self.base_dir.join(&self.config.data_paths.players),
        };
        let players = load_players(&path).context("failed to import players")?;

        let mut team = match self.store.load_team(team_name)? {
            Some(team) => team,
            None => Team::new(team_name, self.config.league.roster.active_limit),
        };
        let ids = sign_all(&mut team, players);
        let moves: Vec<RosterMoveRecord> = ids
            .iter()
            .filter_map(|id| {
                let p = team.player(*id)?;
                Some(RosterMoveRecord {
                    player_name: p.name.clone(),
                    kind: "signed".into(),
                    detail: format!("to {} roster", level_name(p.team_level)),
                })
            })
            .collect();
        self.store.commit(&team, &moves)?;

        info!("imported {} players into {}", ids.len(), team_name);
        writeln!(
            out,
            "Imported {} players into {} from {}",
            ids.len(),
            team_name,
            path.display()
        )?;
        Ok(())
    }

    pub fn show<W: Write>(&self, team_name: &str, out: &mut W) -> Result<()> {
        let team = self.load_team(team_name)?;
        writeln!(
            out,
            "{}: {} active / {} farm / {} third (limit {})",
            team.name,
            team.active_roster().len(),
            team.farm_roster().len(),
            team.third_roster().len(),
            team.active_limit
        )?;
        write_order(&team, team.order(), out)?;

        let unavailable: Vec<String> = team
            .players()
            .filter(|(_, p)| !p.is_available())
            .map(|(_, p)| {
                if p.is_injured() {
                    format!("{} (injured, {}d)", p.name, p.injury_days)
                } else {
                    format!("{} (cooldown, {}d)", p.name, p.days_until_promotion)
                }
            })
            .collect();
        if !unavailable.is_empty() {
            writeln!(out, "Unavailable: {}", unavailable.join(", "))?;
        }
        Ok(())
    }

    pub fn auto<W: Write>(
        &self,
        team_name: &str,
        mode: Option<PriorityMode>,
        apply: bool,
        out: &mut W,
    ) -> Result<()> {
        let mut team = self.load_team(team_name)?;
        let rules = self.config.league.roster;
        let mode = mode.unwrap_or(self.config.strategy.priority_mode);
        let template = self.store.load_best_order(&team)?;
        if template.is_none() {
            writeln!(out, "No best-order template; filling every slot")?;
        }

        let order = auto_assign(&team, template.as_ref(), &rules, mode);
        writeln!(out, "Auto-assignment ({mode} priority)")?;
        write_order(&team, &order, out)?;

        if !apply {
            return Ok(());
        }

        match commit_roster_save(&mut team, &order, &rules) {
            Ok(outcome) => {
                self.store.commit(&team, &outcome.moves)?;
                writeln!(
                    out,
                    "Saved: {} promoted, {} demoted",
                    outcome.promoted.len(),
                    outcome.demoted.len()
                )?;
                for m in &outcome.moves {
                    writeln!(out, "  {} {} {}", m.kind, m.player_name, m.detail)?;
                }
                Ok(())
            }
            Err(rejection) => {
                writeln!(out, "Save rejected ({}): {}", rejection.kind(), rejection)?;
                Err(anyhow::Error::new(rejection).context("roster save rejected"))
            }
        }
    }

    pub fn save_order<W: Write>(&self, team_name: &str, out: &mut W) -> Result<()> {
        let team = self.load_team(team_name)?;
        if !team.order_initialized {
            anyhow::bail!("{team_name} has no saved roster order yet; run `auto --apply` first");
        }
        self.store.save_best_order(&team, team.order())?;
        writeln!(out, "Stored best order for {team_name}")?;
        Ok(())
    }

    pub fn advance<W: Write>(&self, team_name: &str, days: u32, out: &mut W) -> Result<()> {
        let mut team = self.load_team(team_name)?;
        let mut day = self.store.db().game_day(team_name)?;
        for _ in 0..days {
            day += 1;
            for id in team.advance_day() {
                let name = team.name_of(id);
                info!("{} eligible for re-registration on day {}", name, day);
                writeln!(out, "Day {day}: {name} may rejoin the active roster")?;
            }
        }
        self.store.save_team(&team)?;
        self.store.db().set_game_day(team_name, day)?;
        writeln!(out, "Advanced {team_name} to day {day}")?;
        Ok(())
    }

    pub fn release<W: Write>(&self, team_name: &str, player: &str, out: &mut W) -> Result<()> {
        let mut team = self.load_team(team_name)?;
        let id = team
            .find_by_name(player)
            .ok_or_else(|| anyhow!("no player named '{player}' on {team_name}"))?;
        let released = team.release_player(id)?;
        let record = RosterMoveRecord {
            player_name: released.name.clone(),
            kind: "released".into(),
            detail: "to free agency".into(),
        };
        self.store.commit(&team, &[record])?;
        writeln!(out, "Released {} from {}", released.name, team_name)?;
        Ok(())
    }

    pub fn stats<W: Write>(&self, team_name: &str, out: &mut W) -> Result<()> {
        let team = self.load_team(team_name)?;

        writeln!(out, "{:<20} {:>5} {:>5} {:>5} {:>5} {:>5}", "Batter", "AB", "AVG", "OBP", "SLG", "OPS")?;
        for (_, p) in team.players().filter(|(_, p)| p.season_batting.plate_appearances() > 0) {
            write_batting_row(&p.name, &p.season_batting, out)?;
        }
        let batting: BattingLine = team.players().map(|(_, p)| &p.season_batting).sum();
        write_batting_row("Team", &batting, out)?;

        writeln!(out)?;
        writeln!(out, "{:<20} {:>6} {:>5} {:>5} {:>5}", "Pitcher", "IP", "ERA", "WHIP", "FIP")?;
        for (_, p) in team.players().filter(|(_, p)| p.season_pitching.outs_recorded > 0) {
            write_pitching_row(&p.name, &p.season_pitching, out)?;
        }
        let pitching: PitchingLine = team.players().map(|(_, p)| &p.season_pitching).sum();
        write_pitching_row("Team", &pitching, out)?;
        Ok(())
    }

    pub fn new_season<W: Write>(&self, team_name: &str, out: &mut W) -> Result<()> {
        let mut team = self.load_team(team_name)?;
        team.new_season();
        self.store.save_team(&team)?;
        self.store.db().set_game_day(team_name, 0)?;
        writeln!(out, "{team_name}: new season started")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn level_name(level: TeamLevel) -> &'static str {
    match level {
        TeamLevel::First => "active",
        TeamLevel::Second => "farm",
        TeamLevel::Third => "third",
    }
}

fn label(team: &Team, id: Option<PlayerId>) -> String {
    match id {
        Some(id) => team.name_of(id),
        None => "-".to_string(),
    }
}

fn write_order<W: Write>(team: &Team, order: &RosterOrder, out: &mut W) -> Result<()> {
    writeln!(out, "Lineup:")?;
    for (slot, (id, pos)) in order.lineup.iter().zip(order.positions.iter()).enumerate() {
        let pos = pos.map(|p| p.display_str()).unwrap_or("-");
        writeln!(out, "  {}. {:<3} {}", slot + 1, pos, label(team, *id))?;
    }
    let bench: Vec<String> = order.bench.iter().map(|id| team.name_of(*id)).collect();
    writeln!(out, "Bench: {}", bench.join(", "))?;

    let list = |slots: &[Option<PlayerId>]| -> String {
        slots
            .iter()
            .flatten()
            .map(|id| team.name_of(*id))
            .collect::<Vec<_>>()
            .join(", ")
    };
    writeln!(out, "Rotation: {}", list(&order.rotation))?;
    writeln!(out, "Setup: {}", list(&order.setup))?;
    writeln!(out, "Closers: {}", list(&order.closers))?;
    Ok(())
}

fn write_batting_row<W: Write>(name: &str, line: &BattingLine, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "{:<20} {:>5} {:>5.3} {:>5.3} {:>5.3} {:>5.3}",
        name,
        line.at_bats,
        line.batting_average(),
        line.on_base_percentage(),
        line.slugging(),
        line.ops()
    )?;
    Ok(())
}

fn write_pitching_row<W: Write>(name: &str, line: &PitchingLine, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "{:<20} {:>6} {:>5.2} {:>5.2} {:>5.2}",
        name,
        line.innings_display(),
        line.era(),
        line.whip(),
        line.fip()
    )?;
    Ok(())
}
