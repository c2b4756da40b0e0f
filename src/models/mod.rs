//! Rota domain models.
//!
//! Provides the data types shared by every engine component: calendar
//! helpers, the fixed team roster, and the date → member → assignment
//! schedule.
//!
//! # Domain Mappings
//!
//! | u-rota | Meaning |
//! |--------|---------|
//! | Member | Team member (gender, leader flag) |
//! | Shift | Shift1, Shift2, Off |
//! | Assignment | One member on one day (+ key-holder, lock) |
//! | DaySchedule | Whole team on one day |
//! | Schedule | Contiguous run of days |

pub mod calendar;
mod roster;
mod schedule;

pub use calendar::Holidays;
pub use roster::{Gender, Member, Roster};
pub use schedule::{Assignment, DaySchedule, Schedule, Shift, Violation, ViolationType};
