//! Rota generator.
//!
//! # Algorithm
//!
//! One pass over the date range, threading a [`RotationState`] from day to day:
//!
//! 1. Copy locked cells already stored for the date; everything else starts `Unset`.
//! 2. Apply the carries: yesterday's key-holder works Shift1, yesterday's Off
//!    member works Shift2 (unless their cell is locked).
//! 3. Score the remaining members one by one, in shuffled order.
//! 4. Repair the hard rules.
//! 5. Hand the key to an eligible Shift2 leader.
//! 6. Advance the rotation state.
//!
//! Steps 1-6 are shared with [regeneration](ShiftScheduler::regenerate_from),
//! which only differs in how the initial state is obtained.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::repair::repair_day;
use super::rules::{ScoreContext, ShiftScorer};
use super::state::RotationState;
use crate::config::EngineConfig;
use crate::error::{Result, ScheduleError};
use crate::models::calendar::{date_range, parse_date, week_end, week_start};
use crate::models::{Assignment, DaySchedule, Roster, Schedule, Shift};
use crate::random::{shuffle, RandomSource};

/// Carries into the first day of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PriorDay {
    /// Caller-supplied key-holder and Off member of the day before the range.
    Explicit {
        key_holder: Option<String>,
        off: Option<String>,
    },
    /// Read them from the stored day before the range (none if absent).
    #[default]
    Detect,
}

impl PriorDay {
    /// Explicit carries.
    pub fn explicit(key_holder: Option<&str>, off: Option<&str>) -> Self {
        PriorDay::Explicit {
            key_holder: key_holder.map(str::to_string),
            off: off.map(str::to_string),
        }
    }
}

/// Input container for a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// First date (inclusive).
    pub start: NaiveDate,
    /// Last date (inclusive).
    pub end: NaiveDate,
    /// Days on which nobody may be Off.
    pub event_days: BTreeSet<NaiveDate>,
    /// Carries into `start`.
    pub prior: PriorDay,
}

impl ScheduleRequest {
    /// Creates a request with no event days and auto-detected carries.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            event_days: BTreeSet::new(),
            prior: PriorDay::Detect,
        }
    }

    /// Creates a request from ISO `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// Adds one event day.
    pub fn with_event_day(mut self, date: NaiveDate) -> Self {
        self.event_days.insert(date);
        self
    }

    /// Adds several event days.
    pub fn with_event_days(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.event_days.extend(dates);
        self
    }

    /// Sets the carries into `start`.
    pub fn with_prior(mut self, prior: PriorDay) -> Self {
        self.prior = prior;
        self
    }

    /// Whether `date` is an event day.
    pub fn is_event(&self, date: NaiveDate) -> bool {
        self.event_days.contains(&date)
    }

    /// Whether `date` lies within `[start, end]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Dates of the range, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        date_range(self.start, self.end)
    }

    /// Rejects an inverted range.
    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(ScheduleError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Heuristic rota builder for a fixed roster.
///
/// # Example
///
/// ```
/// use u_rota::models::{Roster, Schedule, Shift};
/// use u_rota::random::RngSource;
/// use u_rota::scheduler::{PriorDay, ScheduleRequest, ShiftScheduler};
/// use u_rota::validation::staffing_violations;
///
/// let scheduler = ShiftScheduler::new(Roster::standard());
/// let request = ScheduleRequest::parse("2026-03-02", "2026-03-08")
///     .unwrap()
///     .with_prior(PriorDay::explicit(Some("CIF"), None));
///
/// let rota = scheduler
///     .generate(&Schedule::new(), &request, &mut RngSource::seeded(7))
///     .unwrap();
/// assert_eq!(rota.len(), 7);
///
/// let first = rota.first_date().unwrap();
/// assert_eq!(rota.cell(first, "CIF").unwrap().shift, Shift::First);
/// for (date, day) in rota.iter() {
///     assert!(staffing_violations(scheduler.roster(), date, day).is_empty());
/// }
/// ```
#[derive(Debug)]
pub struct ShiftScheduler {
    roster: Roster,
    config: EngineConfig,
    scorer: ShiftScorer,
}

impl ShiftScheduler {
    /// Creates a scheduler with the default configuration.
    pub fn new(roster: Roster) -> Self {
        Self::with_config(roster, EngineConfig::default())
    }

    /// Creates a scheduler with a custom configuration.
    pub fn with_config(roster: Roster, config: EngineConfig) -> Self {
        let scorer = ShiftScorer::from_config(&config);
        Self {
            roster,
            config,
            scorer,
        }
    }

    /// The roster being scheduled.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generates the requested range.
    ///
    /// `stored` is only read: locked cells inside the range are kept, and
    /// earlier days feed the weekly Off count and carry detection. Returns
    /// the newly built days of the range.
    ///
    /// # Errors
    /// `InvalidRange` for `start > end`; `UnknownMember` / `NotKeyEligible`
    /// for bad explicit carries. Unsatisfiable locks are not errors.
    pub fn generate<R: RandomSource + ?Sized>(
        &self,
        stored: &Schedule,
        request: &ScheduleRequest,
        rng: &mut R,
    ) -> Result<Schedule> {
        request.validate()?;
        let state = self.initial_state(stored, request)?;

        info!(
            start = %request.start,
            end = %request.end,
            events = request.event_days.len(),
            "generating rota"
        );
        let mut working = stored.clone();
        let unresolved = self.run(&mut working, request, request.start, state, rng);
        info!(days = request.dates().len(), unresolved, "rota generated");

        Ok(working.range(request.start, request.end))
    }

    /// Rotation state at `request.start` from the request's carries.
    pub(crate) fn initial_state(
        &self,
        stored: &Schedule,
        request: &ScheduleRequest,
    ) -> Result<RotationState> {
        let (key_holder, off) = match &request.prior {
            PriorDay::Explicit { key_holder, off } => {
                if let Some(id) = key_holder {
                    if !self.roster.require(id)?.is_leader {
                        return Err(ScheduleError::NotKeyEligible(id.clone()));
                    }
                }
                if let Some(id) = off {
                    self.roster.require(id)?;
                }
                (key_holder.clone(), off.clone())
            }
            PriorDay::Detect => {
                let prev = request.start.pred_opt().and_then(|d| stored.day(d));
                (
                    prev.and_then(|d| d.key_holder(&self.roster)).map(str::to_string),
                    prev.and_then(|d| d.off_member(&self.roster)).map(str::to_string),
                )
            }
        };
        Ok(RotationState::seeded(&self.roster, key_holder, off))
    }

    /// Plans every day from `from` to `request.end` into `schedule`.
    ///
    /// Returns the number of days committed with unresolved violations.
    pub(crate) fn run<R: RandomSource + ?Sized>(
        &self,
        schedule: &mut Schedule,
        request: &ScheduleRequest,
        from: NaiveDate,
        mut state: RotationState,
        rng: &mut R,
    ) -> usize {
        let mut unresolved = 0;
        for date in date_range(from, request.end) {
            let (day, clean) = self.plan_day(schedule, date, request.is_event(date), &state, rng);
            state = state.advance(&self.roster, &day);
            schedule.insert_day(date, day);
            if !clean {
                unresolved += 1;
            }
        }
        unresolved
    }

    /// Builds one day. `schedule` holds every earlier day of the run.
    ///
    /// Returns the day and whether it satisfies the day-local hard rules.
    pub(crate) fn plan_day<R: RandomSource + ?Sized>(
        &self,
        schedule: &Schedule,
        date: NaiveDate,
        is_event: bool,
        state: &RotationState,
        rng: &mut R,
    ) -> (DaySchedule, bool) {
        let roster = &self.roster;

        let mut day = DaySchedule::blank(roster);
        if let Some(stored) = schedule.day(date) {
            for (id, cell) in stored.iter() {
                if cell.is_locked && roster.contains(id) {
                    day.set(id, *cell);
                }
            }
        }

        let mut held: BTreeSet<String> = BTreeSet::new();
        let carries = [
            (state.last_key_holder.as_deref(), Shift::First),
            (state.last_off.as_deref(), Shift::Second),
        ];
        for (member, shift) in carries {
            let Some(id) = member else { continue };
            if roster.contains(id) && !day.is_locked(id) && !held.contains(id) {
                day.set(id, Assignment::new(shift));
                held.insert(id.to_string());
            }
        }

        let mut order: Vec<&str> = roster
            .ids()
            .filter(|id| day.shift_of(id) == Shift::Unset)
            .collect();
        shuffle(&mut order, rng);
        for id in order {
            let Some(member) = roster.member(id) else {
                continue;
            };
            let ctx = ScoreContext::new(date, member, &day)
                .with_streak(state.streak(id))
                .with_rival_shift(roster.rival_of(id).map(|r| day.shift_of(r)))
                .with_event(is_event)
                .with_weekly_off(weekly_off_count(schedule, id, date));
            let shift = self.scorer.choose(&ctx, rng);
            day.set(id, Assignment::new(shift));
        }

        let outcome = repair_day(roster, date, &mut day, is_event, &held, &self.config.repair);
        if !outcome.is_clean() {
            warn!(
                %date,
                violations = outcome.unresolved.len(),
                "day committed with unresolved violations"
            );
        }

        assign_key_holder(roster, &mut day, state);

        debug!(
            %date,
            key_holder = day.key_holder(roster),
            off = day.off_member(roster),
            moves = outcome.moves.len(),
            "day planned"
        );
        (day, outcome.is_clean())
    }
}

/// Picks today's key-holder.
///
/// A locked Shift2 leader already flagged PK keeps it; otherwise the unlocked
/// Shift2 leader with the fewest PK days so far (roster order on ties).
///
/// The pinned flag is checked before the unlocked candidates rather than as a
/// fallback: a PK is never written onto a locked cell, so honouring the pin
/// first is what keeps the day at a single key-holder.
fn assign_key_holder(roster: &Roster, day: &mut DaySchedule, state: &RotationState) {
    for id in roster.ids() {
        if let Some(cell) = day.get_mut(id) {
            if !cell.is_locked {
                cell.is_key_holder = false;
            }
        }
    }

    let pinned = roster.key_eligible().any(|m| {
        day.get(&m.id)
            .is_some_and(|a| a.is_locked && a.is_key_holder && a.shift == Shift::Second)
    });
    if pinned {
        return;
    }

    let chosen = roster
        .key_eligible()
        .filter(|m| !day.is_locked(&m.id) && day.shift_of(&m.id) == Shift::Second)
        .min_by_key(|m| state.key_count(&m.id))
        .map(|m| m.id.clone());
    if let Some(cell) = chosen.and_then(|id| day.get_mut(&id)) {
        cell.is_key_holder = true;
    }
}

/// Off days a member has in `date`'s week: every Off before `date`, plus
/// locked Offs after it. Unlocked later days are about to be rebuilt.
pub(crate) fn weekly_off_count(schedule: &Schedule, member: &str, date: NaiveDate) -> u32 {
    date_range(week_start(date), week_end(date))
        .into_iter()
        .filter(|d| *d != date)
        .filter_map(|d| schedule.cell(d, member).map(|cell| (d, cell)))
        .filter(|(d, cell)| cell.shift == Shift::Off && (*d < date || cell.is_locked))
        .count() as u32
}
