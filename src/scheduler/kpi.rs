//! Rota quality metrics (KPIs).
//!
//! Computes workload and fairness indicators from a committed rota.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Shift counts | Shift1 / Shift2 / Off days per member |
//! | Key days | Days each leader held the key |
//! | Key spread | max − min key days among leaders |
//! | Violation days | Days breaking at least one hard rule |
//! | Off coverage | Fraction of non-event days with exactly one member Off |

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{Roster, Schedule, Shift};
use crate::validation::day_violations;

/// Per-member day counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberLoad {
    pub first: usize,
    pub second: usize,
    pub off: usize,
    /// Days holding the key.
    pub key_days: usize,
}

impl MemberLoad {
    /// Working days (Shift1 + Shift2).
    pub fn working(&self) -> usize {
        self.first + self.second
    }
}

/// Rota performance indicators.
#[derive(Debug, Clone)]
pub struct RotaKpi {
    /// Days evaluated.
    pub days: usize,
    /// Per-member load, keyed by member id.
    pub load: BTreeMap<String, MemberLoad>,
    /// Largest minus smallest key-day count among leaders.
    pub key_spread: usize,
    /// Days with at least one violation.
    pub violation_days: usize,
    /// Total violations across all days.
    pub violation_count: usize,
    /// Fraction of non-event days with exactly one Off (0.0..1.0).
    pub off_coverage: f64,
}

impl RotaKpi {
    /// Computes KPIs for every stored day of `schedule`.
    pub fn calculate(
        roster: &Roster,
        schedule: &Schedule,
        event_days: &BTreeSet<NaiveDate>,
    ) -> Self {
        let mut load: BTreeMap<String, MemberLoad> = roster
            .ids()
            .map(|id| (id.to_string(), MemberLoad::default()))
            .collect();
        let mut violation_days = 0;
        let mut violation_count = 0;
        let mut regular_days = 0;
        let mut single_off_days = 0;

        for (date, day) in schedule.iter() {
            for (id, entry) in load.iter_mut() {
                let Some(cell) = day.get(id) else { continue };
                match cell.shift {
                    Shift::First => entry.first += 1,
                    Shift::Second => entry.second += 1,
                    Shift::Off => entry.off += 1,
                    Shift::Unset => {}
                }
                if cell.is_key_holder {
                    entry.key_days += 1;
                }
            }

            let is_event = event_days.contains(&date);
            let violations = day_violations(roster, schedule, date, is_event);
            if !violations.is_empty() {
                violation_days += 1;
                violation_count += violations.len();
            }

            if !is_event {
                regular_days += 1;
                if day.count(Shift::Off) == 1 {
                    single_off_days += 1;
                }
            }
        }

        let key_days: Vec<usize> = roster
            .key_eligible()
            .filter_map(|m| load.get(&m.id).map(|l| l.key_days))
            .collect();
        let key_spread = match (key_days.iter().max(), key_days.iter().min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        };

        let off_coverage = if regular_days == 0 {
            0.0
        } else {
            single_off_days as f64 / regular_days as f64
        };

        Self {
            days: schedule.len(),
            load,
            key_spread,
            violation_days,
            violation_count,
            off_coverage,
        }
    }

    /// Load of one member.
    pub fn member(&self, id: &str) -> Option<&MemberLoad> {
        self.load.get(id)
    }

    /// Whether the rota is violation-free and the key duty is spread within
    /// `max_key_spread` days.
    pub fn meets_thresholds(&self, max_key_spread: usize) -> bool {
        self.violation_days == 0 && self.key_spread <= max_key_spread
    }
}
