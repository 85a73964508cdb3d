use clap::{Parser, Subcommand};

use planner_core::timefmt::{Meridiem, to_24_hour};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Color theme (default, plain)
    #[arg(long, global = true, value_name = "THEME")]
    pub theme: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    ///
    /// Example: planner signup ada secret
    Signup {
        username: String,
        password: String,
    },
    /// Sign in with an existing account
    ///
    /// Example: planner login ada secret
    Login {
        username: String,
        password: String,
    },
    /// Sign out of the active session
    Logout,
    /// Show the signed-in username
    Whoami,
    /// Add a task to a day
    ///
    /// Example: planner add "Buy milk" --date 2024-01-01 --start "9:30 AM"
    Add {
        title: String,
        /// Day the task belongs to (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Start time in 12-hour form, e.g. "9:30 AM"
        #[arg(long)]
        start: Option<String>,
        /// End time in 12-hour form, e.g. "10:00 AM"
        #[arg(long)]
        end: Option<String>,
    },
    /// Toggle a task between open and completed
    ///
    /// Example: planner done task-17
    Done {
        id: String,
    },
    /// Edit a task's fields
    ///
    /// Example: planner edit task-17 --title "Buy oat milk" --start "8:00 AM"
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Clear the start time
        #[arg(long)]
        clear_start: bool,
        /// Clear the end time
        #[arg(long)]
        clear_end: bool,
    },
    /// Delete a task
    ///
    /// Example: planner delete task-17
    Delete {
        id: String,
    },
    /// Show the week grid
    ///
    /// Example: planner week --offset -1
    Week {
        /// Whole weeks away from the current week
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// Show open/completed totals per day
    ///
    /// Example: planner chart
    Chart {
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// Show a month picker grid
    ///
    /// Example: planner month --year 2024 --month 2
    Month {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
        month: Option<u8>,
    },
    /// Re-render the week on a timer until Enter is pressed
    ///
    /// Example: planner watch --interval 30
    Watch {
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
        /// Seconds between re-renders (defaults to the configured tick)
        #[arg(long)]
        interval: Option<u64>,
    },
}

/// Turn a "9:30 AM" style argument into a canonical time through the core
/// codec. Blank input means no time set.
pub fn parse_12h(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    if trimmed.len() < 3 || !trimmed.is_char_boundary(trimmed.len() - 2) {
        return Err(format!("time '{raw}' must end in AM or PM"));
    }

    let (clock_part, meridiem_text) = trimmed.split_at(trimmed.len() - 2);
    let Some(meridiem) = Meridiem::parse(meridiem_text) else {
        return Err(format!("time '{raw}' must end in AM or PM"));
    };

    let mut parts = clock_part.trim().splitn(2, ':');
    let hour_text = parts.next().unwrap_or("").trim();
    let minute_text = parts.next().unwrap_or("0").trim();

    let canonical = to_24_hour(hour_text, minute_text, meridiem);
    if canonical.is_empty() {
        return Err(format!("time '{raw}' has no usable hour"));
    }
    Ok(canonical)
}
