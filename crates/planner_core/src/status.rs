use serde::Serialize;
use time::{Duration, PrimitiveDateTime, Time};

use crate::calendar::parse_date_key;
use crate::model::Task;

/// Urgency state shown next to a task. Completion always wins; anything
/// that fails to parse is `Unscheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Unscheduled,
    DueSoon,
    Overdue,
    Completed,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unscheduled => "unscheduled",
            Self::DueSoon => "due_soon",
            Self::Overdue => "overdue",
            Self::Completed => "completed",
        }
    }
}

/// Lead time before a single due bound during which a task counts as due
/// soon.
const DUE_SOON_LEAD: Duration = Duration::hours(1);

pub fn classify(task: &Task, now: PrimitiveDateTime) -> Urgency {
    if task.is_completed() {
        return Urgency::Completed;
    }

    let start = instant_for(&task.date, &task.start_time);
    let end = instant_for(&task.date, &task.end_time);

    match (start, end) {
        (None, None) => Urgency::Unscheduled,
        (Some(start), Some(end)) => {
            if now > end {
                Urgency::Overdue
            } else if now >= start {
                Urgency::DueSoon
            } else {
                Urgency::Unscheduled
            }
        }
        (Some(due), None) | (None, Some(due)) => {
            if now >= due {
                Urgency::Overdue
            } else if due
                .checked_sub(DUE_SOON_LEAD)
                .is_some_and(|lead| now >= lead)
            {
                Urgency::DueSoon
            } else {
                Urgency::Unscheduled
            }
        }
    }
}

fn instant_for(date: &str, hhmm: &str) -> Option<PrimitiveDateTime> {
    if hhmm.is_empty() {
        return None;
    }

    let day = parse_date_key(date)?;
    let mut parts = hhmm.splitn(2, ':');
    let hours: u8 = parts.next()?.trim().parse().ok()?;
    let minutes: u8 = parts.next()?.trim().parse().ok()?;
    let clock = Time::from_hms(hours, minutes, 0).ok()?;
    Some(PrimitiveDateTime::new(day, clock))
}
