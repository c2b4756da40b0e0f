//! Incremental regeneration after manual edits.
//!
//! Days before the pivot are read, never written: the rotation state at the
//! pivot is rebuilt by replaying them. From the pivot on, every unlocked cell
//! is planned again with the same per-day step as generation.

use chrono::NaiveDate;
use tracing::info;

use super::generator::{ScheduleRequest, ShiftScheduler};
use super::state::RotationState;
use crate::error::{Result, ScheduleError};
use crate::models::calendar::date_range;
use crate::models::{Schedule, Shift};
use crate::random::RandomSource;

impl ShiftScheduler {
    /// Re-plans `[pivot, request.end]` in place.
    ///
    /// Every day before the pivot and every locked cell is left untouched.
    /// With `pivot == request.start` the carries come from `request.prior`.
    ///
    /// # Errors
    /// `DateOutOfRange` if the pivot is outside the request; `MissingDay` /
    /// `IncompleteDay` if a day between `start` and the pivot is not fully
    /// committed. The schedule is unchanged on error.
    pub fn regenerate_from<R: RandomSource + ?Sized>(
        &self,
        schedule: &mut Schedule,
        request: &ScheduleRequest,
        pivot: NaiveDate,
        rng: &mut R,
    ) -> Result<()> {
        let state = self.pivot_state(schedule, request, pivot)?;
        self.rebuild(schedule, request, pivot, state, rng);
        Ok(())
    }

    /// Manual edit: cycles a cell 1 → 2 → OFF → 1, pins it, and re-plans
    /// from that date.
    ///
    /// The key flag survives only when the new shift is Shift2. Returns the
    /// cell's new shift.
    pub fn toggle_cell<R: RandomSource + ?Sized>(
        &self,
        schedule: &mut Schedule,
        request: &ScheduleRequest,
        date: NaiveDate,
        member: &str,
        rng: &mut R,
    ) -> Result<Shift> {
        self.roster().require(member)?;
        let state = self.pivot_state(schedule, request, date)?;
        require_cell(schedule, date, member)?;

        let mut shift = Shift::Unset;
        if let Some(cell) = schedule.cell_mut(date, member) {
            shift = cell.shift.cycled();
            cell.shift = shift;
            cell.is_key_holder = cell.is_key_holder && shift == Shift::Second;
            cell.is_locked = true;
        }
        info!(%date, member, %shift, "cell pinned");

        self.rebuild(schedule, request, date, state, rng);
        Ok(shift)
    }

    /// Unpins a cell and re-plans from that date.
    pub fn release_cell<R: RandomSource + ?Sized>(
        &self,
        schedule: &mut Schedule,
        request: &ScheduleRequest,
        date: NaiveDate,
        member: &str,
        rng: &mut R,
    ) -> Result<()> {
        self.roster().require(member)?;
        let state = self.pivot_state(schedule, request, date)?;
        require_cell(schedule, date, member)?;

        if let Some(cell) = schedule.cell_mut(date, member) {
            cell.is_locked = false;
        }
        info!(%date, member, "cell released");

        self.rebuild(schedule, request, date, state, rng);
        Ok(())
    }

    /// Validates the pivot and rebuilds the rotation state in front of it.
    fn pivot_state(
        &self,
        schedule: &Schedule,
        request: &ScheduleRequest,
        pivot: NaiveDate,
    ) -> Result<RotationState> {
        request.validate()?;
        if !request.contains(pivot) {
            return Err(ScheduleError::DateOutOfRange {
                date: pivot,
                start: request.start,
                end: request.end,
            });
        }
        if pivot == request.start {
            return self.initial_state(schedule, request);
        }

        let Some(last) = pivot.pred_opt() else {
            return self.initial_state(schedule, request);
        };
        let mut committed = Vec::new();
        for date in date_range(request.start, last) {
            let day = schedule.day(date).ok_or(ScheduleError::MissingDay(date))?;
            if let Some(member) = self.roster().ids().find(|id| {
                day.get(id)
                    .map_or(true, |cell| cell.shift == Shift::Unset)
            }) {
                return Err(ScheduleError::IncompleteDay {
                    date,
                    member: member.to_string(),
                });
            }
            committed.push(day);
        }
        Ok(RotationState::replay(self.roster(), committed))
    }

    fn rebuild<R: RandomSource + ?Sized>(
        &self,
        schedule: &mut Schedule,
        request: &ScheduleRequest,
        pivot: NaiveDate,
        state: RotationState,
        rng: &mut R,
    ) {
        info!(%pivot, end = %request.end, "regenerating rota");
        let unresolved = self.run(schedule, request, pivot, state, rng);
        info!(%pivot, unresolved, "rota regenerated");
    }
}

fn require_cell(schedule: &Schedule, date: NaiveDate, member: &str) -> Result<()> {
    match schedule.day(date) {
        None => Err(ScheduleError::MissingDay(date)),
        Some(day) if day.get(member).is_none() => Err(ScheduleError::IncompleteDay {
            date,
            member: member.to_string(),
        }),
        Some(_) => Ok(()),
    }
}
