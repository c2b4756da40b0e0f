//! Rota generation, regeneration and KPI evaluation.
//!
//! # Algorithm
//!
//! `ShiftScheduler` is a greedy day-by-day heuristic: each member is scored
//! for Shift1, Shift2 and Off by a set of additive rules, then the day is
//! repaired against the hard rules. It is not optimal, but it is fast and
//! always honours locked cells.
//!
//! Generation and regeneration share the same per-day step; they differ only
//! in how the rotation state at the first planned day is obtained (prior-day
//! carries vs. replaying committed days).
//!
//! # KPI
//!
//! `RotaKpi` computes per-member load, key-duty fairness and violation counts.

mod generator;
mod kpi;
mod regenerate;
mod repair;
mod rules;
mod state;

pub use generator::{PriorDay, ScheduleRequest, ShiftScheduler};
pub use kpi::{MemberLoad, RotaKpi};
pub use repair::{repair_day, RepairMove, RepairOutcome, RepairStep};
pub use rules::{
    Continuity, LeaderConflict, LoadBalance, OffReadiness, PreOffDiscipline, ScoreContext,
    ScoringWeights, ShiftRule, ShiftScorer, Zigzag,
};
pub use state::{RotationState, Streak};
