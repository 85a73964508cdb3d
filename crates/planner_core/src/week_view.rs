use serde::Serialize;
use time::Date;

use crate::calendar::{date_key, week_days};
use crate::model::Task;
use crate::timefmt::parse_time_to_min;

/// Open/completed/total counts for one day or for the whole week; the
/// series the summary chart is drawn from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub open: usize,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct DayView {
    pub date: Date,
    pub tasks: Vec<Task>,
    pub tally: Tally,
}

#[derive(Debug, Clone)]
pub struct WeekView {
    pub week_start: Date,
    pub days: Vec<DayView>,
    pub totals: Tally,
}

/// Bucket the collection into the seven days starting at `week_start`.
/// Tasks dated outside the week are simply not part of the view.
pub fn build_week_view(tasks: &[Task], week_start: Date) -> WeekView {
    let days: Vec<DayView> = week_days(week_start)
        .into_iter()
        .map(|date| day_view(tasks, date))
        .collect();

    let totals = days.iter().fold(Tally::default(), |acc, day| Tally {
        open: acc.open + day.tally.open,
        completed: acc.completed + day.tally.completed,
        total: acc.total + day.tally.total,
    });

    WeekView {
        week_start,
        days,
        totals,
    }
}

fn day_view(tasks: &[Task], date: Date) -> DayView {
    let key = date_key(date);
    let mut bucket: Vec<Task> = tasks
        .iter()
        .filter(|task| task.date == key)
        .cloned()
        .collect();
    sort_day(&mut bucket);

    let completed = bucket.iter().filter(|task| task.is_completed()).count();
    let tally = Tally {
        open: bucket.len() - completed,
        completed,
        total: bucket.len(),
    };

    DayView {
        date,
        tasks: bucket,
        tally,
    }
}

// Open before done, then by time of day (unset first), then by creation.
// The fixed-width RFC3339 created_at makes the lexicographic tie-break
// chronological.
fn sort_day(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        u8::from(a.is_completed())
            .cmp(&u8::from(b.is_completed()))
            .then_with(|| {
                parse_time_to_min(a.schedule_time()).cmp(&parse_time_to_min(b.schedule_time()))
            })
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::build_week_view;
    use crate::calendar::date_key;
    use crate::model::Task;
    use time::macros::date;

    fn task(id: &str, date: &str, start: &str, created: &str, done: bool) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: String::new(),
            created_at: created.to_string(),
            completed_at: done.then(|| "2024-01-05T00:00:00Z".to_string()),
        }
    }

    #[test]
    fn buckets_tasks_by_date_key() {
        let week_start = date!(2024 - 01 - 07);
        let tasks = vec![
            task("sun", "2024-01-07", "", "2024-01-01T00:00:01Z", false),
            task("wed", "2024-01-10", "", "2024-01-01T00:00:02Z", false),
            task("outside", "2024-01-20", "", "2024-01-01T00:00:03Z", false),
        ];

        let view = build_week_view(&tasks, week_start);

        assert_eq!(view.days.len(), 7);
        assert_eq!(view.days[0].tasks.len(), 1);
        assert_eq!(view.days[0].tasks[0].id, "sun");
        assert_eq!(view.days[3].tasks[0].id, "wed");
        assert_eq!(view.totals.total, 2);

        for day in &view.days {
            for entry in &day.tasks {
                assert_eq!(entry.date, date_key(day.date));
            }
        }
    }

    #[test]
    fn open_tasks_sort_before_completed_regardless_of_time() {
        let week_start = date!(2024 - 01 - 07);
        let tasks = vec![
            task("done-9", "2024-01-07", "09:00", "2024-01-01T00:00:01Z", true),
            task("open-8", "2024-01-07", "08:00", "2024-01-01T00:00:02Z", false),
            task("open-10", "2024-01-07", "10:00", "2024-01-01T00:00:03Z", false),
        ];

        let view = build_week_view(&tasks, week_start);
        let order: Vec<&str> = view.days[0]
            .tasks
            .iter()
            .map(|entry| entry.id.as_str())
            .collect();

        assert_eq!(order, ["open-8", "open-10", "done-9"]);
    }

    #[test]
    fn unset_times_sort_first_and_created_at_breaks_ties() {
        let week_start = date!(2024 - 01 - 07);
        let tasks = vec![
            task("later", "2024-01-07", "", "2024-01-02T00:00:00Z", false),
            task("earlier", "2024-01-07", "", "2024-01-01T00:00:00Z", false),
            task("timed", "2024-01-07", "07:00", "2024-01-01T00:00:00Z", false),
        ];

        let view = build_week_view(&tasks, week_start);
        let order: Vec<&str> = view.days[0]
            .tasks
            .iter()
            .map(|entry| entry.id.as_str())
            .collect();

        assert_eq!(order, ["earlier", "later", "timed"]);
    }

    #[test]
    fn end_time_orders_a_task_without_a_start() {
        let week_start = date!(2024 - 01 - 07);
        let mut end_only = task("end-only", "2024-01-07", "", "2024-01-01T00:00:01Z", false);
        end_only.end_time = "09:30".to_string();
        let tasks = vec![
            end_only,
            task("early", "2024-01-07", "08:00", "2024-01-01T00:00:02Z", false),
        ];

        let view = build_week_view(&tasks, week_start);
        let order: Vec<&str> = view.days[0]
            .tasks
            .iter()
            .map(|entry| entry.id.as_str())
            .collect();

        assert_eq!(order, ["early", "end-only"]);
    }

    #[test]
    fn tallies_count_open_and_completed_per_day_and_week() {
        let week_start = date!(2024 - 01 - 07);
        let tasks = vec![
            task("a", "2024-01-07", "", "2024-01-01T00:00:01Z", false),
            task("b", "2024-01-07", "", "2024-01-01T00:00:02Z", true),
            task("c", "2024-01-08", "", "2024-01-01T00:00:03Z", true),
        ];

        let view = build_week_view(&tasks, week_start);

        assert_eq!(view.days[0].tally.open, 1);
        assert_eq!(view.days[0].tally.completed, 1);
        assert_eq!(view.days[0].tally.total, 2);
        assert_eq!(view.days[1].tally.completed, 1);
        assert_eq!(view.totals.open, 1);
        assert_eq!(view.totals.completed, 2);
        assert_eq!(view.totals.total, 3);
    }
}
