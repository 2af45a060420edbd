// Roster model and the auto-assignment engine.

pub mod arena;
pub mod assignment;
pub mod import;
pub mod order;
pub mod player;
pub mod promotion;
pub mod scoring;
pub mod stats;
pub mod store;
pub mod team;
pub mod template;

pub use arena::PlayerId;
pub use assignment::auto_assign;
pub use order::RosterOrder;
pub use player::{Player, Position, TeamLevel};
pub use promotion::{commit_roster_save, validate_save, SaveOutcome, SaveRejection};
pub use scoring::PriorityMode;
pub use team::{Team, TeamError};
