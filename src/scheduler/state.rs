//! Rotation state threaded through a generation pass.
//!
//! The state is a plain value: [`RotationState::advance`] consumes the
//! state for day N and returns the state for day N+1. Replaying committed
//! days is therefore just a fold over them.

use std::collections::BTreeMap;

use crate::models::{DaySchedule, Roster, Shift};

/// Current run of identical shifts for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streak {
    /// Shift of the run; `None` before any day was processed.
    pub shift: Option<Shift>,
    /// Consecutive days on `shift`.
    pub length: u32,
}

impl Streak {
    /// Extends or restarts the run with today's shift.
    pub fn step(self, today: Shift) -> Self {
        if self.shift == Some(today) {
            Self {
                shift: self.shift,
                length: self.length + 1,
            }
        } else {
            Self {
                shift: Some(today),
                length: 1,
            }
        }
    }
}

/// Per-run counters carried from one day to the next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RotationState {
    /// Who held the key yesterday (must work Shift1 today).
    pub last_key_holder: Option<String>,
    /// Who was Off yesterday (must work Shift2 today).
    pub last_off: Option<String>,
    streaks: BTreeMap<String, Streak>,
    key_counts: BTreeMap<String, u32>,
}

impl RotationState {
    /// Fresh state: no obligations, empty streaks, zero key counts.
    pub fn new(roster: &Roster) -> Self {
        Self::seeded(roster, None, None)
    }

    /// Fresh counters with explicit carries from the day before the range.
    pub fn seeded(roster: &Roster, key_holder: Option<String>, off: Option<String>) -> Self {
        Self {
            last_key_holder: key_holder,
            last_off: off,
            streaks: roster
                .ids()
                .map(|id| (id.to_string(), Streak::default()))
                .collect(),
            key_counts: roster
                .key_eligible()
                .map(|m| (m.id.clone(), 0))
                .collect(),
        }
    }

    /// Rebuilds the state by replaying committed days in order.
    ///
    /// Locked cells count exactly like generated ones.
    pub fn replay<'a>(roster: &Roster, days: impl IntoIterator<Item = &'a DaySchedule>) -> Self {
        days.into_iter()
            .fold(Self::new(roster), |state, day| state.advance(roster, day))
    }

    /// Streak record of a member.
    pub fn streak(&self, member: &str) -> Streak {
        self.streaks.get(member).copied().unwrap_or_default()
    }

    /// Days a member has held the key so far in this run.
    pub fn key_count(&self, member: &str) -> u32 {
        self.key_counts.get(member).copied().unwrap_or(0)
    }

    /// Moves past a committed day.
    ///
    /// Records the day's key-holder and Off member as tomorrow's carries,
    /// bumps the key-holder's count, and steps every streak.
    pub fn advance(mut self, roster: &Roster, day: &DaySchedule) -> Self {
        self.last_key_holder = day.key_holder(roster).map(str::to_string);
        if let Some(holder) = &self.last_key_holder {
            *self.key_counts.entry(holder.clone()).or_insert(0) += 1;
        }
        self.last_off = day.off_member(roster).map(str::to_string);

        for id in roster.ids() {
            let streak = self.streaks.entry(id.to_string()).or_default();
            *streak = streak.step(day.shift_of(id));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Assignment;

    fn day(shifts: [Shift; 5], key: Option<&str>) -> DaySchedule {
        let ids = ["CIF", "SSL", "SJL", "SCB1", "SCB2"];
        let mut d = DaySchedule::from_shifts(ids.into_iter().zip(shifts));
        if let Some(k) = key {
            d.set(k, Assignment::new(Shift::Second).with_key());
        }
        d
    }

    fn run(shift: Shift, length: u32) -> Streak {
        Streak {
            shift: Some(shift),
            length,
        }
    }

    #[test]
    fn test_streak_step() {
        let s = Streak::default().step(Shift::First);
        assert_eq!(s, run(Shift::First, 1));
        let s = s.step(Shift::First).step(Shift::First);
        assert_eq!(s.length, 3);
        let s = s.step(Shift::Off);
        assert_eq!(s, run(Shift::Off, 1));
    }

    #[test]
    fn test_seeded_state() {
        let r = Roster::standard();
        let s = RotationState::seeded(&r, Some("CIF".into()), None);
        assert_eq!(s.last_key_holder.as_deref(), Some("CIF"));
        assert_eq!(s.last_off, None);
        assert_eq!(s.key_count("CIF"), 0);
        assert_eq!(s.streak("SCB1"), Streak::default());
    }

    #[test]
    fn test_advance_records_carries() {
        use Shift::*;
        let r = Roster::standard();
        let d1 = day([First, Second, First, Second, Off], Some("SSL"));
        let s = RotationState::new(&r).advance(&r, &d1);
        assert_eq!(s.last_key_holder.as_deref(), Some("SSL"));
        assert_eq!(s.last_off.as_deref(), Some("SCB2"));
        assert_eq!(s.key_count("SSL"), 1);
        assert_eq!(s.streak("CIF").length, 1);

        let d2 = day([First, First, Second, Second, Second], None);
        let s = s.advance(&r, &d2);
        assert_eq!(s.last_key_holder, None);
        assert_eq!(s.last_off, None);
        assert_eq!(s.key_count("SSL"), 1);
        assert_eq!(s.streak("CIF"), run(First, 2));
        assert_eq!(s.streak("SSL"), run(First, 1));
    }

    #[test]
    fn test_replay_matches_manual_fold() {
        use Shift::*;
        let r = Roster::standard();
        let days = vec![
            day([First, Second, First, Second, Off], Some("SSL")),
            day([Second, First, Second, Off, First], Some("CIF")),
            day([First, Second, Second, Second, First], Some("SJL")),
        ];
        let replayed = RotationState::replay(&r, &days);
        let manual = days
            .iter()
            .fold(RotationState::new(&r), |s, d| s.advance(&r, d));
        assert_eq!(replayed, manual);
        assert_eq!(replayed.key_count("CIF"), 1);
        assert_eq!(replayed.key_count("SJL"), 1);
        assert_eq!(replayed.last_key_holder.as_deref(), Some("SJL"));
        assert_eq!(replayed.streak("SCB1"), run(Second, 1));
    }
}
