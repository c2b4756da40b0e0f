//! Input validation and rota invariant checks.
//!
//! Two kinds of checks live here:
//! - Structural checks on input data (roster definition), run before any
//!   schedule is touched. These return [`ValidationError`]s.
//! - Invariant queries on committed days. The engine commits a day even when
//!   locked cells make a hard rule unsatisfiable; these queries let callers
//!   detect and surface that degraded state as [`Violation`]s.
//!
//! # Hard rules
//! 1. Each shift has at least two members.
//! 2. Each shift has at least one male member.
//! 3. Each shift has at least one leader.
//! 4. The exclusive leader pair never share a working shift.
//! 5. At most one member Off per day, at most one Off per member per ISO week.
//! 6. Yesterday's key-holder works Shift1 today unless locked otherwise.
//! 7. Yesterday's Off member works Shift2 today unless locked otherwise.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::calendar::week_start;
use crate::models::{DaySchedule, Member, Roster, Schedule, Shift, Violation, ViolationType};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two members share the same ID.
    DuplicateId,
    /// The roster has no members.
    EmptyRoster,
    /// The exclusive pair does not name two distinct leaders.
    InvalidExclusivePair,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a roster definition.
///
/// Checks:
/// 1. At least one member
/// 2. No duplicate member IDs
/// 3. Both ids of the exclusive pair exist, differ, and are leaders
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_roster(members: &[Member], exclusive_pair: (&str, &str)) -> ValidationResult {
    let mut errors = Vec::new();

    if members.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            "Roster has no members",
        ));
    }

    let mut ids = HashSet::new();
    for m in members {
        if !ids.insert(m.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate member ID: {}", m.id),
            ));
        }
    }

    let (a, b) = exclusive_pair;
    if a == b {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidExclusivePair,
            format!("Exclusive pair names '{a}' twice"),
        ));
    }
    for id in [a, b] {
        match members.iter().find(|m| m.id == id) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidExclusivePair,
                format!("Exclusive pair references unknown member '{id}'"),
            )),
            Some(m) if !m.is_leader => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidExclusivePair,
                format!("Exclusive pair member '{id}' is not a leader"),
            )),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks the day-local staffing rules (1–4) plus "at most one Off".
///
/// Only looks at `day`; no history is needed.
pub fn staffing_violations(roster: &Roster, date: NaiveDate, day: &DaySchedule) -> Vec<Violation> {
    let mut violations = Vec::new();

    for shift in [Shift::First, Shift::Second] {
        let on_shift: Vec<&Member> = roster
            .members()
            .iter()
            .filter(|m| day.shift_of(&m.id) == shift)
            .collect();
        let label = shift.to_string();

        if on_shift.len() < 2 {
            violations.push(Violation::new(
                ViolationType::Understaffed,
                date,
                &label,
                format!("Shift {label} has {} member(s), needs 2", on_shift.len()),
            ));
        }
        if !on_shift.iter().any(|m| m.is_male()) {
            violations.push(Violation::new(
                ViolationType::NoMale,
                date,
                &label,
                format!("Shift {label} has no male member"),
            ));
        }
        if !on_shift.iter().any(|m| m.is_leader) {
            violations.push(Violation::new(
                ViolationType::NoLeader,
                date,
                &label,
                format!("Shift {label} has no leader"),
            ));
        }
    }

    let (a, b) = roster.exclusive_pair();
    let shift_a = day.shift_of(a);
    if shift_a.is_working() && shift_a == day.shift_of(b) {
        violations.push(Violation::new(
            ViolationType::ExclusiveLeadersTogether,
            date,
            a,
            format!("{a} and {b} both work shift {shift_a}"),
        ));
    }

    let off = day.count(Shift::Off);
    if off > 1 {
        violations.push(Violation::new(
            ViolationType::TooManyOff,
            date,
            "OFF",
            format!("{off} members are Off"),
        ));
    }

    violations
}

/// Checks every hard rule (1–7) for one committed day.
///
/// Returns an empty list when `date` is not stored.
pub fn day_violations(
    roster: &Roster,
    schedule: &Schedule,
    date: NaiveDate,
    is_event: bool,
) -> Vec<Violation> {
    let Some(day) = schedule.day(date) else {
        return Vec::new();
    };

    let mut violations = Vec::new();

    for id in roster.ids() {
        if day.shift_of(id) == Shift::Unset {
            violations.push(Violation::new(
                ViolationType::Unresolved,
                date,
                id,
                format!("{id} has no shift"),
            ));
        }
    }

    violations.extend(staffing_violations(roster, date, day));

    if is_event {
        for id in day.members_on(roster, Shift::Off) {
            violations.push(Violation::new(
                ViolationType::OffOnEventDay,
                date,
                id,
                format!("{id} is Off on an event day"),
            ));
        }
    }

    // Weekly quota: flag the second and later Off of the week.
    let monday = week_start(date);
    for id in day.members_on(roster, Shift::Off) {
        let earlier = schedule
            .range(monday, date)
            .iter()
            .filter(|(d, s)| *d < date && s.shift_of(id) == Shift::Off)
            .count();
        if earlier >= 1 {
            violations.push(Violation::new(
                ViolationType::WeeklyOffExceeded,
                date,
                id,
                format!("{id} already had {earlier} Off day(s) this week"),
            ));
        }
    }

    let holders: Vec<&str> = roster
        .ids()
        .filter(|id| day.get(id).is_some_and(|a| a.is_key_holder))
        .collect();
    if holders.len() > 1 {
        violations.push(Violation::new(
            ViolationType::InvalidKeyHolder,
            date,
            holders.join(","),
            format!("{} key-holders on one day", holders.len()),
        ));
    }
    for id in &holders {
        if day.shift_of(id) != Shift::Second {
            violations.push(Violation::new(
                ViolationType::InvalidKeyHolder,
                date,
                *id,
                format!("{id} holds the key but is not on shift 2"),
            ));
        }
    }

    if let Some(prev) = date.pred_opt().and_then(|p| schedule.day(p)) {
        if let Some(holder) = prev.key_holder(roster) {
            if !day.is_locked(holder) && day.shift_of(holder) != Shift::First {
                violations.push(Violation::new(
                    ViolationType::KeyCarryBroken,
                    date,
                    holder,
                    format!("{holder} held the key yesterday but is not on shift 1"),
                ));
            }
        }
        if let Some(off) = prev.off_member(roster) {
            if !day.is_locked(off) && day.shift_of(off) != Shift::Second {
                violations.push(Violation::new(
                    ViolationType::OffCarryBroken,
                    date,
                    off,
                    format!("{off} was Off yesterday but is not on shift 2"),
                ));
            }
        }
    }

    violations
}

/// Checks every stored day.
pub fn schedule_violations(
    roster: &Roster,
    schedule: &Schedule,
    event_days: &BTreeSet<NaiveDate>,
) -> Vec<Violation> {
    schedule
        .dates()
        .flat_map(|date| day_violations(roster, schedule, date, event_days.contains(&date)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Gender};

    fn d(day: u32) -> NaiveDate {
        // March 2026: the 2nd is a Monday
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn good_day() -> DaySchedule {
        DaySchedule::from_shifts([
            ("CIF", Shift::First),
            ("SSL", Shift::Second),
            ("SJL", Shift::First),
            ("SCB1", Shift::Second),
            ("SCB2", Shift::Off),
        ])
    }

    fn kinds(vs: &[Violation]) -> Vec<ViolationType> {
        vs.iter().map(|v| v.violation_type).collect()
    }

    #[test]
    fn test_valid_roster() {
        let r = Roster::standard();
        assert!(validate_roster(r.members(), ("CIF", "SSL")).is_ok());
    }

    #[test]
    fn test_duplicate_member_id() {
        let members = vec![
            Member::leader("A", Gender::Male),
            Member::leader("A", Gender::Female),
            Member::leader("B", Gender::Male),
        ];
        let errors = validate_roster(&members, ("A", "B")).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_empty_roster() {
        let errors = validate_roster(&[], ("A", "B")).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptyRoster));
        // Pair also references unknown members
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_pair_naming_same_member() {
        let members = Roster::standard().members().to_vec();
        let errors = validate_roster(&members, ("CIF", "CIF")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidExclusivePair);
    }

    #[test]
    fn test_good_day_has_no_staffing_violations() {
        let r = Roster::standard();
        assert!(staffing_violations(&r, d(2), &good_day()).is_empty());
    }

    #[test]
    fn test_understaffed_and_no_leader() {
        let r = Roster::standard();
        let day = DaySchedule::from_shifts([
            ("CIF", Shift::Second),
            ("SSL", Shift::Off),
            ("SJL", Shift::Second),
            ("SCB1", Shift::First),
            ("SCB2", Shift::Second),
        ]);
        let vs = staffing_violations(&r, d(2), &day);
        let k = kinds(&vs);
        assert!(k.contains(&ViolationType::Understaffed));
        assert!(k.contains(&ViolationType::NoLeader));
        assert!(!k.contains(&ViolationType::NoMale));
        assert!(vs.iter().all(|v| v.entity_id == "1"));
    }

    #[test]
    fn test_no_male_and_exclusive_pair() {
        let r = Roster::standard();
        let day = DaySchedule::from_shifts([
            ("CIF", Shift::First),
            ("SSL", Shift::First),
            ("SJL", Shift::Second),
            ("SCB1", Shift::First),
            ("SCB2", Shift::Second),
        ]);
        let k = kinds(&staffing_violations(&r, d(2), &day));
        assert!(k.contains(&ViolationType::NoMale));
        assert!(k.contains(&ViolationType::ExclusiveLeadersTogether));
    }

    #[test]
    fn test_exclusive_pair_off_is_exempt() {
        let r = Roster::standard();
        let day = DaySchedule::from_shifts([
            ("CIF", Shift::Off),
            ("SSL", Shift::First),
            ("SJL", Shift::Second),
            ("SCB1", Shift::Second),
            ("SCB2", Shift::First),
        ]);
        assert!(staffing_violations(&r, d(2), &day).is_empty());
    }

    #[test]
    fn test_weekly_off_exceeded() {
        let r = Roster::standard();
        let mut s = Schedule::new();
        s.insert_day(d(2), good_day());
        let mut second = DaySchedule::from_shifts([
            ("CIF", Shift::First),
            ("SSL", Shift::Second),
            ("SJL", Shift::First),
            ("SCB1", Shift::Second),
            ("SCB2", Shift::Off),
        ]);
        second.set("SCB2", Assignment::locked(Shift::Off));
        s.insert_day(d(3), second);

        let k = kinds(&day_violations(&r, &s, d(3), false));
        assert!(k.contains(&ViolationType::WeeklyOffExceeded));
        // Yesterday's Off member is locked Off today: carry exempt
        assert!(!k.contains(&ViolationType::OffCarryBroken));
    }

    #[test]
    fn test_weekly_off_resets_on_monday() {
        let r = Roster::standard();
        let mut s = Schedule::new();
        s.insert_day(d(8), good_day()); // Sunday
        s.insert_day(d(9), good_day()); // Monday, new week
        let k = kinds(&day_violations(&r, &s, d(9), false));
        assert!(!k.contains(&ViolationType::WeeklyOffExceeded));
        // SCB2 Off two days running breaks the Off carry
        assert!(k.contains(&ViolationType::OffCarryBroken));
    }

    #[test]
    fn test_key_carry() {
        let r = Roster::standard();
        let mut s = Schedule::new();
        let mut yesterday = good_day();
        yesterday.set("SSL", Assignment::new(Shift::Second).with_key());
        s.insert_day(d(2), yesterday);

        let today = DaySchedule::from_shifts([
            ("CIF", Shift::Second),
            ("SSL", Shift::First),
            ("SJL", Shift::First),
            ("SCB1", Shift::Off),
            ("SCB2", Shift::Second),
        ]);
        s.insert_day(d(3), today);
        assert!(day_violations(&r, &s, d(3), false).is_empty());

        let broken = DaySchedule::from_shifts([
            ("CIF", Shift::First),
            ("SSL", Shift::Second),
            ("SJL", Shift::First),
            ("SCB1", Shift::Off),
            ("SCB2", Shift::Second),
        ]);
        s.insert_day(d(3), broken);
        let k = kinds(&day_violations(&r, &s, d(3), false));
        assert!(k.contains(&ViolationType::KeyCarryBroken));
    }

    #[test]
    fn test_invalid_key_holder_and_event_off() {
        let r = Roster::standard();
        let mut s = Schedule::new();
        let mut day = good_day();
        day.set("CIF", Assignment::new(Shift::First).with_key());
        s.insert_day(d(4), day);

        let k = kinds(&day_violations(&r, &s, d(4), true));
        assert!(k.contains(&ViolationType::InvalidKeyHolder));
        assert!(k.contains(&ViolationType::OffOnEventDay));
    }

    #[test]
    fn test_unresolved_cells() {
        let r = Roster::standard();
        let mut s = Schedule::new();
        s.insert_day(d(4), DaySchedule::blank(&r));
        let vs = day_violations(&r, &s, d(4), false);
        assert_eq!(
            vs.iter()
                .filter(|v| v.violation_type == ViolationType::Unresolved)
                .count(),
            5
        );
        assert!(day_violations(&r, &s, d(5), false).is_empty());
    }

    #[test]
    fn test_schedule_violations_collects_all_days() {
        let r = Roster::standard();
        let mut s = Schedule::new();
        s.insert_day(d(2), good_day());
        s.insert_day(d(3), DaySchedule::blank(&r));
        let events = BTreeSet::from([d(2)]);
        let vs = schedule_violations(&r, &s, &events);
        assert!(vs.iter().any(|v| v.date == d(2)));
        assert!(vs.iter().any(|v| v.date == d(3)));
    }
}
