//! Rota (solution) model.
//!
//! A [`Schedule`] maps each calendar date to a [`DaySchedule`], which in turn
//! maps every roster member to an [`Assignment`]. Committed days have every
//! member resolved to Shift1, Shift2 or Off; `Unset` only exists while a day
//! is under construction.
//!
//! The serialised form (`date → member → {shift, isKeyHolder, isLocked}`)
//! is the contract with presentation layers.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Roster;
use crate::models::calendar::date_range;

/// Daily shift value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Shift {
    /// Shift 1 (early).
    #[serde(rename = "1")]
    First,
    /// Shift 2 (late).
    #[serde(rename = "2")]
    Second,
    /// Day off.
    #[serde(rename = "OFF")]
    Off,
    /// Not yet decided.
    #[default]
    #[serde(rename = "-")]
    Unset,
}

impl Shift {
    /// Whether this is one of the two working shifts.
    #[inline]
    pub fn is_working(self) -> bool {
        matches!(self, Shift::First | Shift::Second)
    }

    /// The other working shift. `Off` and `Unset` map to themselves.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Shift::First => Shift::Second,
            Shift::Second => Shift::First,
            other => other,
        }
    }

    /// Next value in the manual-edit cycle: 1 → 2 → OFF → 1.
    pub fn cycled(self) -> Self {
        match self {
            Shift::First => Shift::Second,
            Shift::Second => Shift::Off,
            Shift::Off | Shift::Unset => Shift::First,
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Shift::First => "1",
            Shift::Second => "2",
            Shift::Off => "OFF",
            Shift::Unset => "-",
        };
        f.write_str(s)
    }
}

/// One member's assignment for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub shift: Shift,
    /// Carries the key ("PK"). Only valid on Shift2.
    pub is_key_holder: bool,
    /// Manually pinned; never overwritten by generation or repair.
    pub is_locked: bool,
}

impl Assignment {
    /// An unlocked assignment.
    pub fn new(shift: Shift) -> Self {
        Self {
            shift,
            ..Self::default()
        }
    }

    /// A manually pinned assignment.
    pub fn locked(shift: Shift) -> Self {
        Self {
            shift,
            is_key_holder: false,
            is_locked: true,
        }
    }

    /// Sets the key-holder flag.
    pub fn with_key(mut self) -> Self {
        self.is_key_holder = true;
        self
    }
}

/// Assignments of every roster member for one date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySchedule {
    cells: BTreeMap<String, Assignment>,
}

impl DaySchedule {
    /// A day with every roster member `Unset`.
    pub fn blank(roster: &Roster) -> Self {
        Self {
            cells: roster
                .ids()
                .map(|id| (id.to_string(), Assignment::default()))
                .collect(),
        }
    }

    /// Builds a day from `(member, shift)` pairs, all unlocked.
    pub fn from_shifts<'a>(pairs: impl IntoIterator<Item = (&'a str, Shift)>) -> Self {
        Self {
            cells: pairs
                .into_iter()
                .map(|(id, shift)| (id.to_string(), Assignment::new(shift)))
                .collect(),
        }
    }

    /// Assignment for a member.
    pub fn get(&self, member: &str) -> Option<&Assignment> {
        self.cells.get(member)
    }

    /// Mutable assignment for a member.
    pub fn get_mut(&mut self, member: &str) -> Option<&mut Assignment> {
        self.cells.get_mut(member)
    }

    /// Inserts or replaces an assignment.
    pub fn set(&mut self, member: impl Into<String>, assignment: Assignment) {
        self.cells.insert(member.into(), assignment);
    }

    /// Shift of a member (`Unset` when absent).
    pub fn shift_of(&self, member: &str) -> Shift {
        self.cells.get(member).map(|a| a.shift).unwrap_or_default()
    }

    /// Whether a member's cell is locked.
    pub fn is_locked(&self, member: &str) -> bool {
        self.cells.get(member).is_some_and(|a| a.is_locked)
    }

    /// Number of members on `shift`.
    pub fn count(&self, shift: Shift) -> usize {
        self.cells.values().filter(|a| a.shift == shift).count()
    }

    /// Member ids on `shift`, in roster order.
    pub fn members_on<'a>(&'a self, roster: &'a Roster, shift: Shift) -> Vec<&'a str> {
        roster
            .ids()
            .filter(|id| self.shift_of(id) == shift)
            .collect()
    }

    /// First member (roster order) who is Off.
    pub fn off_member<'a>(&self, roster: &'a Roster) -> Option<&'a str> {
        roster.ids().find(|id| self.shift_of(id) == Shift::Off)
    }

    /// First member (roster order) flagged as key-holder.
    pub fn key_holder<'a>(&self, roster: &'a Roster) -> Option<&'a str> {
        roster
            .ids()
            .find(|id| self.cells.get(*id).is_some_and(|a| a.is_key_holder))
    }

    /// Whether every roster member has a resolved (non-`Unset`) shift.
    pub fn is_resolved(&self, roster: &Roster) -> bool {
        roster.ids().all(|id| self.shift_of(id) != Shift::Unset)
    }

    /// Iterates `(member, assignment)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Index<&str> for DaySchedule {
    type Output = Assignment;

    /// Panics when the member has no cell; the roster is fixed at startup so
    /// a missing cell is a programming error.
    fn index(&self, member: &str) -> &Assignment {
        match self.cells.get(member) {
            Some(a) => a,
            None => panic!("no assignment for member '{member}'"),
        }
    }
}

/// A rota: date → day assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    days: BTreeMap<NaiveDate, DaySchedule>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Day assignments for `date`.
    pub fn day(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.days.get(&date)
    }

    /// Mutable day assignments for `date`.
    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DaySchedule> {
        self.days.get_mut(&date)
    }

    /// Inserts or replaces a day.
    pub fn insert_day(&mut self, date: NaiveDate, day: DaySchedule) {
        self.days.insert(date, day);
    }

    /// Assignment of `member` on `date`.
    pub fn cell(&self, date: NaiveDate, member: &str) -> Option<&Assignment> {
        self.days.get(&date).and_then(|d| d.get(member))
    }

    /// Mutable assignment of `member` on `date`.
    pub fn cell_mut(&mut self, date: NaiveDate, member: &str) -> Option<&mut Assignment> {
        self.days.get_mut(&date).and_then(|d| d.get_mut(member))
    }

    /// Earliest stored date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    /// Latest stored date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    /// Stored dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    /// Iterates `(date, day)` ascending.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DaySchedule)> {
        self.days.iter().map(|(d, s)| (*d, s))
    }

    /// Days within `[start, end]`.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> Schedule {
        if start > end {
            return Schedule::new();
        }
        Schedule {
            days: self
                .days
                .range(start..=end)
                .map(|(d, s)| (*d, s.clone()))
                .collect(),
        }
    }

    /// Copies every day of `other` into `self`, replacing existing dates.
    pub fn extend(&mut self, other: Schedule) {
        self.days.extend(other.days);
    }

    /// Whether stored dates form one gap-free run.
    pub fn is_contiguous(&self) -> bool {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => date_range(first, last).len() == self.days.len(),
            _ => true,
        }
    }

    /// Number of stored days.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether no days are stored.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// A broken hard rule on a committed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Day the violation was found on.
    pub date: NaiveDate,
    /// Related member id, or the shift label for shift-level rules.
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of rota violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationType {
    /// Fewer than two members on a shift.
    Understaffed,
    /// No male member on a shift.
    NoMale,
    /// No leader on a shift.
    NoLeader,
    /// The exclusive leader pair share a working shift.
    ExclusiveLeadersTogether,
    /// More than one member Off on the same day.
    TooManyOff,
    /// A member has more than one Off in an ISO week.
    WeeklyOffExceeded,
    /// Someone is Off on an event day.
    OffOnEventDay,
    /// Yesterday's key-holder is not on Shift1.
    KeyCarryBroken,
    /// Yesterday's Off member is not on Shift2.
    OffCarryBroken,
    /// Key-holder flag on a non-Shift2 cell, or more than one key-holder.
    InvalidKeyHolder,
    /// A member has no resolved shift.
    Unresolved,
}

impl Violation {
    /// Creates a violation with the default severity for its type.
    pub fn new(
        violation_type: ViolationType,
        date: NaiveDate,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            date,
            entity_id: entity_id.into(),
            message: message.into(),
            severity: violation_type.default_severity(),
        }
    }
}

impl ViolationType {
    /// Default severity for this type.
    pub fn default_severity(self) -> i32 {
        match self {
            ViolationType::Unresolved => 100,
            ViolationType::Understaffed => 95,
            ViolationType::NoLeader => 90,
            ViolationType::NoMale => 85,
            ViolationType::ExclusiveLeadersTogether => 80,
            ViolationType::OffOnEventDay => 75,
            ViolationType::TooManyOff => 70,
            ViolationType::KeyCarryBroken | ViolationType::OffCarryBroken => 60,
            ViolationType::InvalidKeyHolder => 50,
            ViolationType::WeeklyOffExceeded => 40,
        }
    }

    /// Whether this is one of the staffing rules (headcount, gender,
    /// leadership, leader separation).
    pub fn is_staffing(self) -> bool {
        matches!(
            self,
            ViolationType::Understaffed
                | ViolationType::NoMale
                | ViolationType::NoLeader
                | ViolationType::ExclusiveLeadersTogether
        )
    }
}
