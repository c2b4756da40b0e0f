//! Constraint repair for one tentative day.
//!
//! After the day scorer has assigned everyone, [`repair_day`] restores the
//! hard rules by moving unlocked cells. Locked cells are never touched.
//!
//! # Ordered steps
//! 1. Event day: every unlocked Off member joins the smaller shift (ties: Shift1)
//! 2. Understaffed shift: pull from the other shift if it has more than two,
//!    else from the Off pool
//! 3. Exclusive pair on one shift: flip one of them
//! 4. Shift without a male (Shift1, then Shift2): swap a male in for a female
//! 5. Shift without a leader: swap a surplus leader in for a non-leader
//!
//! Members obligated by today's carries are *held*: the ordered steps never
//! move them. If a hard rule is still broken afterwards, a minimal-change
//! search over unlocked cells runs (see [`RepairConfig`]). It never adds an
//! Off, and it only moves held members when no solution leaves them in place.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::RepairConfig;
use crate::models::{Assignment, DaySchedule, Member, Roster, Shift, Violation, ViolationType};
use crate::validation::staffing_violations;

/// Upper bound on unlocked members for the exhaustive search.
const MAX_SEARCH_MEMBERS: usize = 10;

/// Which repair step made a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStep {
    EventOff,
    Staffing,
    LeaderSeparation,
    MaleCoverage,
    LeaderCoverage,
    Search,
}

/// One cell changed by repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairMove {
    pub member: String,
    pub from: Shift,
    pub to: Shift,
    pub step: RepairStep,
}

/// Result of repairing one day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairOutcome {
    /// Cells changed, in order.
    pub moves: Vec<RepairMove>,
    /// Hard rules still broken (unsatisfiable under the current locks).
    pub unresolved: Vec<Violation>,
}

impl RepairOutcome {
    /// Whether the day satisfies every day-local hard rule.
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Repairs a fully assigned day in place.
///
/// `held` lists members pinned by today's key/Off carries.
pub fn repair_day(
    roster: &Roster,
    date: NaiveDate,
    day: &mut DaySchedule,
    is_event: bool,
    held: &BTreeSet<String>,
    config: &RepairConfig,
) -> RepairOutcome {
    let mut repairer = Repairer {
        roster,
        date,
        day,
        held,
        moves: Vec::new(),
    };

    if is_event {
        repairer.clear_event_off();
    }
    repairer.fill_understaffed();
    repairer.separate_exclusive_pair();
    repairer.cover_males();
    repairer.cover_leaders();

    if config.exhaustive_fallback && !repairer.remaining(is_event).is_empty() {
        repairer.search(is_event);
    }

    let unresolved = repairer.remaining(is_event);
    RepairOutcome {
        moves: repairer.moves,
        unresolved,
    }
}

struct Repairer<'a> {
    roster: &'a Roster,
    date: NaiveDate,
    day: &'a mut DaySchedule,
    held: &'a BTreeSet<String>,
    moves: Vec<RepairMove>,
}

impl Repairer<'_> {
    fn movable(&self, id: &str) -> bool {
        !self.day.is_locked(id) && !self.held.contains(id)
    }

    fn on(&self, shift: Shift) -> Vec<String> {
        self.day
            .members_on(self.roster, shift)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// First movable member (roster order) on `shift` matching `pred`.
    fn find_on(&self, shift: Shift, pred: impl Fn(&Member) -> bool) -> Option<String> {
        self.roster
            .members()
            .iter()
            .find(|m| self.day.shift_of(&m.id) == shift && self.movable(&m.id) && pred(m))
            .map(|m| m.id.clone())
    }

    fn count_on(&self, shift: Shift, pred: impl Fn(&Member) -> bool) -> usize {
        self.roster
            .members()
            .iter()
            .filter(|m| self.day.shift_of(&m.id) == shift && pred(m))
            .count()
    }

    fn shift_to(&mut self, id: &str, to: Shift, step: RepairStep) {
        let from = self.day.shift_of(id);
        if from == to {
            return;
        }
        self.day.set(id, Assignment::new(to));
        debug!(date = %self.date, member = id, %from, %to, ?step, "repair move");
        self.moves.push(RepairMove {
            member: id.to_string(),
            from,
            to,
            step,
        });
    }

    fn swap(&mut self, a: &str, b: &str, step: RepairStep) {
        let shift_a = self.day.shift_of(a);
        let shift_b = self.day.shift_of(b);
        self.shift_to(a, shift_b, step);
        self.shift_to(b, shift_a, step);
    }

    fn clear_event_off(&mut self) {
        for id in self.on(Shift::Off) {
            if self.day.is_locked(&id) {
                continue;
            }
            let target = if self.day.count(Shift::First) <= self.day.count(Shift::Second) {
                Shift::First
            } else {
                Shift::Second
            };
            self.shift_to(&id, target, RepairStep::EventOff);
        }
    }

    fn fill_understaffed(&mut self) {
        for shift in [Shift::First, Shift::Second] {
            while self.day.count(shift) < 2 {
                let other = shift.opposite();
                let mut donors = Vec::new();
                if self.day.count(other) > 2 {
                    donors.extend(self.on(other).into_iter().rev());
                }
                donors.extend(self.on(Shift::Off).into_iter().rev());

                match donors.into_iter().find(|id| self.movable(id)) {
                    Some(id) => self.shift_to(&id, shift, RepairStep::Staffing),
                    None => break,
                }
            }
        }
    }

    fn separate_exclusive_pair(&mut self) {
        let roster = self.roster;
        let (a, b) = roster.exclusive_pair();
        let shift = self.day.shift_of(a);
        if !shift.is_working() || shift != self.day.shift_of(b) {
            return;
        }
        let target = if self.movable(b) {
            b
        } else if self.movable(a) {
            a
        } else {
            debug!(date = %self.date, a, b, "exclusive pair pinned together");
            return;
        };
        self.shift_to(target, shift.opposite(), RepairStep::LeaderSeparation);
    }

    fn cover_males(&mut self) {
        for shift in [Shift::First, Shift::Second] {
            if self.count_on(shift, Member::is_male) > 0 {
                continue;
            }
            let male = self.find_on(shift.opposite(), Member::is_male);
            let female = self.find_on(shift, |m| !m.is_male());
            if let (Some(male), Some(female)) = (male, female) {
                self.swap(&male, &female, RepairStep::MaleCoverage);
            }
        }
    }

    fn cover_leaders(&mut self) {
        for shift in [Shift::First, Shift::Second] {
            let other = shift.opposite();
            if self.count_on(shift, |m| m.is_leader) > 0
                || self.count_on(other, |m| m.is_leader) < 2
            {
                continue;
            }
            let Some(leader) = self.find_on(other, |m| m.is_leader) else {
                continue;
            };
            let gender = self.roster.member(&leader).map(|m| m.gender);
            // Same gender keeps male coverage intact on both shifts
            let partner = self
                .find_on(shift, |m| !m.is_leader && Some(m.gender) == gender)
                .or_else(|| self.find_on(shift, |m| !m.is_leader));
            if let Some(partner) = partner {
                self.swap(&leader, &partner, RepairStep::LeaderCoverage);
            }
        }
    }

    /// Day-local hard rules still broken.
    fn remaining(&self, is_event: bool) -> Vec<Violation> {
        let mut violations = staffing_violations(self.roster, self.date, self.day);
        if is_event {
            for id in self.day.members_on(self.roster, Shift::Off) {
                violations.push(Violation::new(
                    ViolationType::OffOnEventDay,
                    self.date,
                    id,
                    format!("{id} is locked Off on an event day"),
                ));
            }
        }
        violations
    }

    /// Minimal-change enumeration over unlocked cells.
    ///
    /// Working members may take either shift; an unlocked Off member may
    /// stay Off (not on event days) or work. Cost is the number of changed
    /// cells, where moving a held member outweighs any number of free moves.
    fn search(&mut self, is_event: bool) {
        let vars: Vec<(String, Shift, bool)> = self
            .roster
            .ids()
            .filter(|id| !self.day.is_locked(id))
            .map(|id| (id.to_string(), self.day.shift_of(id), self.held.contains(id)))
            .collect();
        if vars.is_empty() || vars.len() > MAX_SEARCH_MEMBERS {
            return;
        }

        let domains: Vec<Vec<Shift>> = vars
            .iter()
            .map(|(_, current, _)| match current {
                Shift::Off if is_event => vec![Shift::First, Shift::Second],
                Shift::Off => vec![Shift::Off, Shift::First, Shift::Second],
                Shift::First | Shift::Second => vec![*current, current.opposite()],
                Shift::Unset => vec![Shift::First, Shift::Second],
            })
            .collect();
        let held_weight = vars.len() + 1;

        let mut trial = self.day.clone();
        let mut index = vec![0usize; vars.len()];
        let mut best: Option<(usize, Vec<Shift>)> = None;

        'enumerate: loop {
            let mut cost = 0;
            for (i, (id, current, held)) in vars.iter().enumerate() {
                let shift = domains[i][index[i]];
                if let Some(cell) = trial.get_mut(id) {
                    cell.shift = shift;
                }
                if shift != *current {
                    cost += if *held { held_weight } else { 1 };
                }
            }

            let improves = best.as_ref().map_or(true, |(c, _)| cost < *c);
            if improves && staffing_violations(self.roster, self.date, &trial).is_empty() {
                let choice = index
                    .iter()
                    .enumerate()
                    .map(|(i, &k)| domains[i][k])
                    .collect();
                best = Some((cost, choice));
            }

            let mut pos = 0;
            loop {
                if pos == index.len() {
                    break 'enumerate;
                }
                index[pos] += 1;
                if index[pos] < domains[pos].len() {
                    break;
                }
                index[pos] = 0;
                pos += 1;
            }
        }

        let Some((cost, choice)) = best else {
            debug!(date = %self.date, "repair search found no feasible assignment");
            return;
        };
        debug!(date = %self.date, cost, "repair search applied");
        for ((id, _, _), shift) in vars.iter().zip(choice) {
            self.shift_to(id, shift, RepairStep::Search);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
    }

    fn day(shifts: [Shift; 5]) -> DaySchedule {
        let ids = ["CIF", "SSL", "SJL", "SCB1", "SCB2"];
        DaySchedule::from_shifts(ids.into_iter().zip(shifts))
    }

    fn no_held() -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn ordered_only() -> RepairConfig {
        RepairConfig {
            exhaustive_fallback: false,
        }
    }

    #[test]
    fn test_clean_day_untouched() {
        use Shift::*;
        let r = Roster::standard();
        let mut dd = day([First, Second, First, Second, Off]);
        let before = dd.clone();
        let out = repair_day(&r, d(), &mut dd, false, &no_held(), &RepairConfig::default());
        assert!(out.is_clean());
        assert!(out.moves.is_empty());
        assert_eq!(dd, before);
    }

    #[test]
    fn test_event_day_clears_off() {
        use Shift::*;
        let r = Roster::standard();
        let mut dd = day([First, Second, First, Second, Off]);
        let out = repair_day(&r, d(), &mut dd, true, &no_held(), &ordered_only());
        assert_eq!(dd.count(Off), 0);
        assert_eq!(dd.shift_of("SCB2"), First);
        assert_eq!(out.moves[0].step, RepairStep::EventOff);
        assert!(out.is_clean());
    }

    #[test]
    fn test_locked_off_on_event_day_is_reported() {
        use Shift::*;
        let r = Roster::standard();
        let mut dd = day([First, Second, First, Second, Off]);
        dd.set("SCB2", Assignment::locked(Off));
        let out = repair_day(&r, d(), &mut dd, true, &no_held(), &RepairConfig::default());
        assert_eq!(dd.shift_of("SCB2"), Off);
        assert!(out
            .unresolved
            .iter()
            .any(|v| v.violation_type == ViolationType::OffOnEventDay));
    }

    #[test]
    fn test_understaffed_pulls_from_larger_shift() {
        use Shift::*;
        let r = Roster::standard();
        // Shift1 has one member; Shift2 has four
        let mut dd = day([First, Second, Second, Second, Second]);
        repair_day(&r, d(), &mut dd, false, &no_held(), &ordered_only());
        assert!(dd.count(First) >= 2);
        assert!(dd.count(Second) >= 2);
        // Last in roster order donates
        assert_eq!(dd.shift_of("SCB2"), First);
    }

    #[test]
    fn test_understaffed_pulls_from_off_pool() {
        use Shift::*;
        let r = Roster::standard();
        let mut dd = day([First, Second, Off, Second, First]);
        dd.set("SCB1", Assignment::locked(Off));
        dd.set("SJL", Assignment::new(Off));
        // Shift2 has only SSL and Shift1 has no surplus to give
        repair_day(&r, d(), &mut dd, false, &no_held(), &ordered_only());
        assert_eq!(dd.shift_of("SJL"), Second);
        assert_eq!(dd.shift_of("SCB1"), Off);
    }

    #[test]
    fn test_exclusive_pair_separated() {
        use Shift::*;
        let r = Roster::standard();
        let mut dd = day([First, First, Second, Second, Off]);
        let out = repair_day(&r, d(), &mut dd, false, &no_held(), &ordered_only());
        assert_eq!(dd.shift_of("CIF"), First);
        assert_eq!(dd.shift_of("SSL"), Second);
        assert!(out
            .moves
            .iter()
            .any(|m| m.step == RepairStep::LeaderSeparation));
    }

    #[test]
    fn test_held_member_not_flipped() {
        use Shift::*;
        let r = Roster::standard();
        let mut dd = day([First, First, Second, Second, Off]);
        let held = BTreeSet::from(["SSL".to_string()]);
        repair_day(&r, d(), &mut dd, false, &held, &ordered_only());
        assert_eq!(dd.shift_of("SSL"), First);
        assert_eq!(dd.shift_of("CIF"), Second);
    }

    #[test]
    fn test_male_swap() {
        use Shift::*;
        let r = Roster::standard();
        // Shift2 = SJL (F), SCB2 (F): no male
        let mut dd = day([First, Off, Second, First, Second]);
        let out = repair_day(&r, d(), &mut dd, false, &no_held(), &ordered_only());
        assert!(out.moves.iter().any(|m| m.step == RepairStep::MaleCoverage));
        assert!(staffing_violations(&r, d(), &dd)
            .iter()
            .all(|v| v.violation_type != ViolationType::NoMale));
    }

    #[test]
    fn test_leader_swap() {
        use Shift::*;
        let r = Roster::standard();
        // Shift2 = SCB1, SCB2: no leader, Shift1 has two
        let mut dd = day([First, Off, First, Second, Second]);
        let out = repair_day(&r, d(), &mut dd, false, &no_held(), &ordered_only());
        assert!(out.is_clean(), "{:?}", out.unresolved);
        assert!(out.moves.iter().any(|m| m.step == RepairStep::LeaderCoverage));
        // CIF trades places with SCB1 so both shifts keep a male
        assert_eq!(dd.shift_of("CIF"), Second);
        assert_eq!(dd.shift_of("SCB1"), First);
    }

    #[test]
    fn test_search_fixes_what_ordered_steps_break() {
        use Shift::*;
        let r = Roster::standard();
        // Separating the pair leaves Shift1 with CIF alone
        let start = day([First, First, Second, Second, Second]);

        let mut ordered = start.clone();
        let out = repair_day(&r, d(), &mut ordered, false, &no_held(), &ordered_only());
        assert!(out
            .unresolved
            .iter()
            .any(|v| v.violation_type == ViolationType::Understaffed));

        let mut searched = start;
        let out = repair_day(&r, d(), &mut searched, false, &no_held(), &RepairConfig::default());
        assert!(out.is_clean());
        assert!(out.moves.iter().any(|m| m.step == RepairStep::Search));
        assert_eq!(searched.count(Off), 0);
    }

    #[test]
    fn test_search_keeps_held_members() {
        use Shift::*;
        let r = Roster::standard();
        let mut dd = day([First, First, Second, Second, Second]);
        let held = BTreeSet::from(["CIF".to_string(), "SCB2".to_string()]);
        let out = repair_day(&r, d(), &mut dd, false, &held, &RepairConfig::default());
        assert!(out.is_clean());
        assert_eq!(dd.shift_of("CIF"), First);
        assert_eq!(dd.shift_of("SCB2"), Second);
    }

    #[test]
    fn test_locked_conflict_left_intact() {
        use Shift::*;
        let r = Roster::standard();
        let mut dd = DaySchedule::default();
        let shifts = [First, First, Second, Second, Off];
        for (id, shift) in ["CIF", "SSL", "SJL", "SCB1", "SCB2"].into_iter().zip(shifts) {
            dd.set(id, Assignment::locked(shift));
        }
        let before = dd.clone();
        let out = repair_day(&r, d(), &mut dd, false, &no_held(), &RepairConfig::default());
        assert_eq!(dd, before);
        assert!(out.moves.is_empty());
        assert!(out
            .unresolved
            .iter()
            .any(|v| v.violation_type == ViolationType::ExclusiveLeadersTogether));
    }
}
