//! Day scorer: per-candidate shift preference rules.
//!
//! For one unassigned member on one day, every legal candidate shift is
//! scored by summing independent rules. The highest total wins; a small
//! random jitter breaks ties so iteration order alone never decides.
//!
//! # Categories
//!
//! - **Continuity**: favour 1-1-2-2 runs, discourage long monotony
//! - **Zigzag**: penalise 1-2-1-2 alternation
//! - **Off readiness**: steer the weekly Off quota (and force it late in the week)
//! - **Pre-Off discipline**: an Off should follow a Shift1 day
//! - **Load balance**: fill the smaller shift first
//! - **Leader conflict**: keep the exclusive leader pair apart
//!
//! # Score Convention
//! **Higher score = preferred.** Rules return 0 when they do not apply.

use std::fmt::Debug;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::state::Streak;
use crate::config::EngineConfig;
use crate::models::{DaySchedule, Member, Shift};
use crate::random::RandomSource;

/// Tunable constants of the day scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Same working shift as yesterday while the run is shorter than 2.
    pub continuity_bonus: f64,
    /// Same working shift as yesterday once the run is 3 or longer.
    pub monotony_penalty: f64,
    /// Switching shift after a one-day run.
    pub zigzag_penalty: f64,
    /// Off while the weekly quota is still open.
    pub off_quota_bonus: f64,
    /// Off on a mandatory-off day with the quota still open.
    pub mandatory_off_bonus: f64,
    /// Off on a late-week day with the quota still open.
    pub late_week_off_bonus: f64,
    /// Off when the member already had one this week.
    pub repeat_off_penalty: f64,
    /// Off when nobody else is Off yet today.
    pub sole_off_bonus: f64,
    /// Off when someone else is already Off today.
    pub crowded_off_penalty: f64,
    /// Off when yesterday was not Shift1.
    pub pre_off_penalty: f64,
    /// Joining the currently smaller shift.
    pub balance_bonus: f64,
    /// Joining the shift the exclusive partner already occupies.
    pub leader_conflict_penalty: f64,
    /// Upper bound (exclusive) of the uniform tie-break jitter.
    pub jitter: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            continuity_bonus: 25.0,
            monotony_penalty: 15.0,
            zigzag_penalty: 20.0,
            off_quota_bonus: 60.0,
            mandatory_off_bonus: 1000.0,
            late_week_off_bonus: 40.0,
            repeat_off_penalty: 50.0,
            sole_off_bonus: 25.0,
            crowded_off_penalty: 15.0,
            pre_off_penalty: 20.0,
            balance_bonus: 5.0,
            leader_conflict_penalty: 100.0,
            jitter: 2.0,
        }
    }
}

/// Everything a rule may look at for one member on one day.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    pub date: NaiveDate,
    pub member: &'a Member,
    /// Yesterday's shift, if known.
    pub previous: Option<Shift>,
    pub streak: Streak,
    /// The day's partially built assignment.
    pub day: &'a DaySchedule,
    /// Today's shift of the member's exclusive partner, if the member is one
    /// of the pair.
    pub rival_shift: Option<Shift>,
    /// No Off allowed today.
    pub is_event: bool,
    /// Off days already taken this week.
    pub weekly_off: u32,
}

impl<'a> ScoreContext<'a> {
    /// Creates a context with no history and an open Off quota.
    pub fn new(date: NaiveDate, member: &'a Member, day: &'a DaySchedule) -> Self {
        Self {
            date,
            member,
            previous: None,
            streak: Streak::default(),
            day,
            rival_shift: None,
            is_event: false,
            weekly_off: 0,
        }
    }

    /// Sets the streak; yesterday's shift is the streak's shift.
    pub fn with_streak(mut self, streak: Streak) -> Self {
        self.streak = streak;
        self.previous = streak.shift;
        self
    }

    /// Sets the exclusive partner's shift today.
    pub fn with_rival_shift(mut self, shift: Option<Shift>) -> Self {
        self.rival_shift = shift;
        self
    }

    /// Marks the day as an event day.
    pub fn with_event(mut self, is_event: bool) -> Self {
        self.is_event = is_event;
        self
    }

    /// Sets the weekly Off count.
    pub fn with_weekly_off(mut self, count: u32) -> Self {
        self.weekly_off = count;
        self
    }
}

/// A rule contributing to a candidate's score.
pub trait ShiftRule: Send + Sync + Debug {
    /// Rule name.
    fn name(&self) -> &'static str;

    /// Score contribution of `candidate`. Higher = preferred.
    fn evaluate(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> f64;
}

// ======================== Rotation shape ========================

/// Rewards staying on yesterday's working shift for a second day, and
/// penalises runs of three or more.
#[derive(Debug, Clone, Copy)]
pub struct Continuity {
    pub bonus: f64,
    pub monotony_penalty: f64,
}

impl ShiftRule for Continuity {
    fn name(&self) -> &'static str {
        "continuity"
    }

    fn evaluate(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> f64 {
        if candidate == Shift::Off || ctx.previous != Some(candidate) {
            return 0.0;
        }
        match ctx.streak.length {
            0 | 1 => self.bonus,
            2 => 0.0,
            _ => -self.monotony_penalty,
        }
    }
}

/// Penalises switching working shift after a one-day run (1-2-1-2).
#[derive(Debug, Clone, Copy)]
pub struct Zigzag {
    pub penalty: f64,
}

impl ShiftRule for Zigzag {
    fn name(&self) -> &'static str {
        "zigzag"
    }

    fn evaluate(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> f64 {
        let Some(previous) = ctx.previous else {
            return 0.0;
        };
        let switching = previous.is_working() && candidate.is_working() && previous != candidate;
        if switching && ctx.streak.length == 1 && ctx.streak.shift != Some(candidate) {
            -self.penalty
        } else {
            0.0
        }
    }
}

// ======================== Off placement ========================

/// Steers the weekly Off quota.
///
/// With the quota open, Off is attractive, overwhelmingly so on a
/// mandatory-off day and more so late in the week. With the quota used, a
/// second Off is discouraged. Independently, Off is preferred when nobody
/// else is Off today.
#[derive(Debug, Clone)]
pub struct OffReadiness {
    pub quota_bonus: f64,
    pub mandatory_bonus: f64,
    pub late_week_bonus: f64,
    pub repeat_penalty: f64,
    pub sole_bonus: f64,
    pub crowded_penalty: f64,
    pub mandatory_days: Vec<Weekday>,
    pub late_week_days: Vec<Weekday>,
}

impl OffReadiness {
    /// Whether the mandatory-off safety valve fires: quota still open on one
    /// of the mandatory weekdays.
    pub fn is_mandatory(&self, ctx: &ScoreContext<'_>) -> bool {
        ctx.weekly_off == 0 && self.mandatory_days.contains(&ctx.date.weekday())
    }

    /// Whether `date` earns the late-week bonus.
    pub fn is_late_week(&self, date: NaiveDate) -> bool {
        self.late_week_days.contains(&date.weekday())
    }
}

impl ShiftRule for OffReadiness {
    fn name(&self) -> &'static str {
        "off_readiness"
    }

    fn evaluate(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> f64 {
        if candidate != Shift::Off {
            return 0.0;
        }

        let mut score = if ctx.weekly_off == 0 {
            let mut s = self.quota_bonus;
            if self.is_mandatory(ctx) {
                s += self.mandatory_bonus;
            } else if self.is_late_week(ctx.date) {
                s += self.late_week_bonus;
            }
            s
        } else {
            -self.repeat_penalty
        };

        if ctx.day.count(Shift::Off) == 0 {
            score += self.sole_bonus;
        } else {
            score -= self.crowded_penalty;
        }
        score
    }
}

/// An Off should follow a Shift1 day.
#[derive(Debug, Clone, Copy)]
pub struct PreOffDiscipline {
    pub penalty: f64,
}

impl ShiftRule for PreOffDiscipline {
    fn name(&self) -> &'static str {
        "pre_off"
    }

    fn evaluate(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> f64 {
        if candidate == Shift::Off && ctx.previous != Some(Shift::First) {
            -self.penalty
        } else {
            0.0
        }
    }
}

// ======================== Day composition ========================

/// Prefers the shift with the strictly smaller headcount so far.
#[derive(Debug, Clone, Copy)]
pub struct LoadBalance {
    pub bonus: f64,
}

impl ShiftRule for LoadBalance {
    fn name(&self) -> &'static str {
        "load_balance"
    }

    fn evaluate(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> f64 {
        let first = ctx.day.count(Shift::First);
        let second = ctx.day.count(Shift::Second);
        match candidate {
            Shift::First if first < second => self.bonus,
            Shift::Second if second < first => self.bonus,
            _ => 0.0,
        }
    }
}

/// Near-veto on joining the exclusive partner's working shift.
#[derive(Debug, Clone, Copy)]
pub struct LeaderConflict {
    pub penalty: f64,
}

impl ShiftRule for LeaderConflict {
    fn name(&self) -> &'static str {
        "leader_conflict"
    }

    fn evaluate(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> f64 {
        if candidate.is_working() && ctx.rival_shift == Some(candidate) {
            -self.penalty
        } else {
            0.0
        }
    }
}

// ======================== Scorer ========================

/// Sums every rule per candidate and picks the best.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_rota::models::{DaySchedule, Roster, Shift};
/// use u_rota::random::SequenceSource;
/// use u_rota::scheduler::{ScoreContext, ShiftScorer};
///
/// let roster = Roster::standard();
/// let day = DaySchedule::blank(&roster);
/// let member = roster.member("SCB1").unwrap();
/// // 2026-03-04 is a Wednesday
/// let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
///
/// // Quota already used: Off is not even a candidate.
/// let ctx = ScoreContext::new(date, member, &day).with_weekly_off(1);
/// let scorer = ShiftScorer::default();
/// assert_eq!(scorer.candidates(&ctx), vec![Shift::First, Shift::Second]);
/// let pick = scorer.choose(&ctx, &mut SequenceSource::zeros());
/// assert!(pick.is_working());
/// ```
#[derive(Debug)]
pub struct ShiftScorer {
    rules: Vec<Box<dyn ShiftRule>>,
    jitter: f64,
}

impl ShiftScorer {
    /// Builds the stock rule set from configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        let w = &config.scoring;
        Self {
            rules: vec![
                Box::new(Continuity {
                    bonus: w.continuity_bonus,
                    monotony_penalty: w.monotony_penalty,
                }),
                Box::new(Zigzag {
                    penalty: w.zigzag_penalty,
                }),
                Box::new(OffReadiness {
                    quota_bonus: w.off_quota_bonus,
                    mandatory_bonus: w.mandatory_off_bonus,
                    late_week_bonus: w.late_week_off_bonus,
                    repeat_penalty: w.repeat_off_penalty,
                    sole_bonus: w.sole_off_bonus,
                    crowded_penalty: w.crowded_off_penalty,
                    mandatory_days: config.mandatory_off_days.clone(),
                    late_week_days: config.late_week_days.clone(),
                }),
                Box::new(PreOffDiscipline {
                    penalty: w.pre_off_penalty,
                }),
                Box::new(LoadBalance {
                    bonus: w.balance_bonus,
                }),
                Box::new(LeaderConflict {
                    penalty: w.leader_conflict_penalty,
                }),
            ],
            jitter: w.jitter,
        }
    }

    /// Legal candidates: both shifts, plus Off unless today is an event day
    /// or the weekly quota is used. The mandatory-off valve only fires with
    /// the quota open, so it never widens this set.
    pub fn candidates(&self, ctx: &ScoreContext<'_>) -> Vec<Shift> {
        let mut options = vec![Shift::First, Shift::Second];
        if !ctx.is_event && ctx.weekly_off == 0 {
            options.push(Shift::Off);
        }
        options
    }

    /// Deterministic score of `candidate` (no jitter).
    pub fn score(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> f64 {
        self.rules.iter().map(|r| r.evaluate(candidate, ctx)).sum()
    }

    /// Per-rule contributions of `candidate`.
    pub fn breakdown(&self, candidate: Shift, ctx: &ScoreContext<'_>) -> Vec<(&'static str, f64)> {
        self.rules
            .iter()
            .map(|r| (r.name(), r.evaluate(candidate, ctx)))
            .collect()
    }

    /// Highest-scoring candidate after jitter. Strictly greater wins, so on
    /// an exact tie the earlier candidate (Shift1, Shift2, Off) is kept.
    pub fn choose<R: RandomSource + ?Sized>(&self, ctx: &ScoreContext<'_>, rng: &mut R) -> Shift {
        let mut best = Shift::First;
        let mut best_score = f64::NEG_INFINITY;
        for candidate in self.candidates(ctx) {
            let score = self.score(candidate, ctx) + rng.next_unit() * self.jitter;
            if score > best_score {
                best_score = score;
                best = candidate;
            }
        }
        best
    }
}

impl Default for ShiftScorer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
