// Team persistence on top of the SQLite document store.

use anyhow::{Context, Result};
use dugout_core::db::{Database, RosterMoveRecord};
use tracing::debug;

use crate::order::RosterOrder;
use crate::team::Team;
use crate::template::{best_order_to_value, load_best_order};

/// Loads and saves teams and their best-order templates.
pub struct TeamStore {
    db: Database,
}

impl TeamStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database at `path` (`":memory:"` for an ephemeral store).
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn save_team(&self, team: &Team) -> Result<()> {
        self.commit(team, &[])
    }

    /// Write `team` together with the moves that produced it, atomically.
    pub fn commit(&self, team: &Team, moves: &[RosterMoveRecord]) -> Result<()> {
        let value = serde_json::to_value(team)
            .with_context(|| format!("failed to encode team {}", team.name))?;
        self.db.commit_team(&team.name, &value, moves)
    }

    pub fn load_team(&self, name: &str) -> Result<Option<Team>> {
        let Some(value) = self.db.load_team(name)? else {
            return Ok(None);
        };
        let team: Team = serde_json::from_value(value)
            .with_context(|| format!("stored team {name} is not readable"))?;
        let dangling = team.dangling_references();
        if !dangling.is_empty() {
            anyhow::bail!(
                "stored team {} references {} released players",
                name,
                dangling.len()
            );
        }
        debug!("loaded team {} with {} players", name, team.player_count());
        Ok(Some(team))
    }

    pub fn list_teams(&self) -> Result<Vec<String>> {
        self.db.list_teams()
    }

    pub fn save_best_order(&self, team: &Team, order: &RosterOrder) -> Result<()> {
        let value = best_order_to_value(order).context("failed to encode best order")?;
        self.db.save_best_order(&team.name, &value)
    }

    /// The team's template, upgraded to the current shape. Unreadable
    /// templates count as absent.
    pub fn load_best_order(&self, team: &Team) -> Result<Option<RosterOrder>> {
        Ok(self
            .db
            .load_best_order(&team.name)?
            .and_then(|value| load_best_order(&value, team)))
    }
}
