//! Two-shift duty rota engine for the U-Engine ecosystem.
//!
//! Builds a day-by-day rota for a small fixed team working two daily shifts
//! plus a rotating day off, with a daily key-holder drawn from the leaders.
//! Manually pinned cells are always respected; the rest of the rota is
//! re-derived around them.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Roster`, `Member`, `Shift`, `Assignment`,
//!   `DaySchedule`, `Schedule`, `Violation`, calendar helpers and holidays
//! - **`validation`**: Roster checks and hard-rule queries on committed days
//! - **`scheduler`**: Scoring rules, constraint repair, generation,
//!   regeneration and KPIs
//! - **`config`**: TOML-backed engine configuration
//! - **`random`**: Injectable random source for tie-breaks and ordering
//! - **`error`**: Error type shared by every fallible API
//!
//! # Hard rules
//!
//! Every committed day aims for: two or more members per shift, a male and a
//! leader on each shift, the exclusive leader pair apart, at most one member
//! Off, at most one Off per member per ISO week, yesterday's key-holder on
//! Shift1 and yesterday's Off member on Shift2. When locked cells make this
//! impossible the day is committed anyway; see [`validation::day_violations`].

pub mod config;
pub mod error;
pub mod models;
pub mod random;
pub mod scheduler;
pub mod validation;

pub use config::EngineConfig;
pub use error::{Result, ScheduleError};
pub use scheduler::{PriorDay, ScheduleRequest, ShiftScheduler};
