use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use std::time::Duration;

use planner_cli::cli::{Cli, Command, parse_12h};
use planner_core::calendar::{
    date_key, month_day_label, month_grid, month_label, week_start_for_offset, weekday_label,
};
use planner_core::clock::{Clock, SystemClock, Ticker};
use planner_core::config::{self, Palette};
use planner_core::error::AppError;
use planner_core::model::{Task, TaskChanges};
use planner_core::session;
use planner_core::status::{Urgency, classify};
use planner_core::storage::kv::{FileKvStore, KeyValueStore};
use planner_core::store::{TaskStore, TaskStoreLoad};
use planner_core::timefmt::format_time_12;
use planner_core::week_view::build_week_view;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::Month;

fn task_json(task: &Task, urgency: Urgency) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "date": task.date,
        "startTime": task.start_time,
        "endTime": task.end_time,
        "createdAt": task.created_at,
        "completedAt": task.completed_at,
        "urgency": urgency,
    })
}

fn print_task_json(task: &Task) {
    let urgency = classify(task, SystemClock.now());
    println!("{}", task_json(task, urgency));
}

fn time_range_label(task: &Task) -> String {
    let start = format_time_12(&task.start_time);
    let end = format_time_12(&task.end_time);
    match (start.is_empty(), end.is_empty()) {
        (true, true) => "-".to_string(),
        (false, true) => start,
        (true, false) => format!("until {end}"),
        (false, false) => format!("{start} - {end}"),
    }
}

fn task_line(task: &Task, urgency: Urgency, palette: &Palette) -> String {
    let mut line = String::new();
    let dot = palette.urgency_dot(urgency);
    if !dot.is_empty() {
        line.push_str(&dot);
        line.push(' ');
    }
    let marker = if task.is_completed() { "[x]" } else { "[ ]" };
    line.push_str(&format!(
        "{marker} {} | {} | {} | {}",
        task.id,
        task.title,
        time_range_label(task),
        urgency.label()
    ));
    line
}

/// Load the signed-in identity's collection, surfacing a degraded load on
/// stderr instead of failing the command.
fn load_session_store(kv: &dyn KeyValueStore) -> TaskStoreLoad {
    let username = session::current_session(kv).map(|session| session.username);
    let load = TaskStore::load(kv, username.as_deref());
    if let Some(err) = load.error.as_ref() {
        eprintln!("WARNING: stored tasks were unreadable, starting empty: {err}");
    }
    load
}

fn report_save(store: &TaskStore) {
    if let Some(err) = store.last_save_error() {
        eprintln!("WARNING: changes were not persisted: {err}");
    }
}

fn resolve_time_arg(
    value: Option<String>,
    clear: bool,
    flag: &str,
) -> Result<Option<String>, AppError> {
    if clear {
        if value.is_some() {
            return Err(AppError::invalid_input(format!(
                "--{flag} conflicts with --clear-{flag}"
            )));
        }
        return Ok(Some(String::new()));
    }

    match value {
        Some(raw) => Ok(Some(parse_12h(&raw).map_err(AppError::invalid_input)?)),
        None => Ok(None),
    }
}

fn print_week(kv: &dyn KeyValueStore, palette: &Palette, json: bool, offset: i32) {
    let now = SystemClock.now();
    let week_start = week_start_for_offset(now.date(), offset);
    let load = load_session_store(kv);
    let view = build_week_view(load.store.tasks(), week_start);

    if json {
        let days: Vec<serde_json::Value> = view
            .days
            .iter()
            .map(|day| {
                serde_json::json!({
                    "date": date_key(day.date),
                    "weekday": weekday_label(day.date),
                    "tally": day.tally,
                    "tasks": day
                        .tasks
                        .iter()
                        .map(|task| task_json(task, classify(task, now)))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "weekStart": date_key(view.week_start),
                "totals": view.totals,
                "days": days,
            })
        );
        return;
    }

    println!(
        "Week of {} - {}",
        month_day_label(view.days[0].date),
        month_day_label(view.days[6].date)
    );
    for day in &view.days {
        println!("{} {}", weekday_label(day.date), month_day_label(day.date));
        if day.tasks.is_empty() {
            println!("  (no tasks)");
            continue;
        }
        for task in &day.tasks {
            let urgency = classify(task, now);
            println!("  {}", task_line(task, urgency, palette));
        }
    }
    println!(
        "Open {} | Completed {} | Total {}",
        view.totals.open, view.totals.completed, view.totals.total
    );
}

#[derive(Tabled)]
struct ChartRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Open")]
    open: usize,
    #[tabled(rename = "Completed")]
    completed: usize,
    #[tabled(rename = "Total")]
    total: usize,
}

fn print_chart(kv: &dyn KeyValueStore, json: bool, offset: i32) {
    let today = SystemClock.today();
    let week_start = week_start_for_offset(today, offset);
    let load = load_session_store(kv);
    let view = build_week_view(load.store.tasks(), week_start);

    if json {
        let days: Vec<serde_json::Value> = view
            .days
            .iter()
            .map(|day| {
                serde_json::json!({
                    "date": date_key(day.date),
                    "weekday": weekday_label(day.date),
                    "open": day.tally.open,
                    "completed": day.tally.completed,
                    "total": day.tally.total,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "weekStart": date_key(view.week_start),
                "days": days,
                "totals": view.totals,
            })
        );
        return;
    }

    let mut rows: Vec<ChartRow> = view
        .days
        .iter()
        .map(|day| ChartRow {
            day: weekday_label(day.date).to_string(),
            date: date_key(day.date),
            open: day.tally.open,
            completed: day.tally.completed,
            total: day.tally.total,
        })
        .collect();
    rows.push(ChartRow {
        day: "Week".to_string(),
        date: String::new(),
        open: view.totals.open,
        completed: view.totals.completed,
        total: view.totals.total,
    });

    let table = Table::new(rows).with(Style::sharp()).to_string();
    println!("{table}");
}

fn print_month(
    palette: &Palette,
    json: bool,
    year: Option<i32>,
    month: Option<u8>,
) -> Result<(), AppError> {
    let today = SystemClock.today();
    let year = year.unwrap_or_else(|| today.year());
    let month = match month {
        Some(number) => {
            Month::try_from(number).map_err(|_| AppError::invalid_input("month must be 1-12"))?
        }
        None => today.month(),
    };

    let grid = month_grid(year, month);
    if grid.is_empty() {
        return Err(AppError::invalid_input("year is out of range"));
    }

    if json {
        let days: Vec<serde_json::Value> = grid
            .iter()
            .map(|day| {
                serde_json::json!({
                    "date": date_key(*day),
                    "inMonth": day.month() == month,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "year": year,
                "month": u8::from(month),
                "days": days,
            })
        );
        return Ok(());
    }

    println!("{} {year}", month_label(month));
    println!("Sun Mon Tue Wed Thu Fri Sat");
    for week in grid.chunks(7) {
        let cells: Vec<String> = week
            .iter()
            .map(|day| {
                let cell = format!("{:>3}", day.day());
                if day.month() == month {
                    cell
                } else {
                    palette.mutedize(&cell)
                }
            })
            .collect();
        println!("{}", cells.join(" "));
    }
    Ok(())
}

fn run_watch(
    kv: FileKvStore,
    palette: Palette,
    interval: Duration,
    offset: i32,
) -> Result<(), AppError> {
    print_week(&kv, &palette, false, offset);
    println!(
        "Watching (re-renders every {}s). Press Enter to stop.",
        interval.as_secs()
    );

    let ticker = Ticker::start(interval, move || {
        println!();
        print_week(&kv, &palette, false, offset);
    });

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| AppError::storage(err.to_string()))?;
    ticker.cancel();
    Ok(())
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let kv = FileKvStore::open_default()?;
    let config_load = config::load_config_with_fallback();
    if let Some(err) = config_load.error.as_ref() {
        eprintln!("WARNING: config was unreadable, using defaults: {err}");
    }
    let mut config = config_load.config;
    if cli.theme.is_some() {
        config.theme = cli.theme.clone();
    }
    let palette = config::palette_for_theme(config.theme.as_deref());

    match cli.command {
        Command::Signup { username, password } => {
            let session = session::sign_up(&kv, &username, &password)?;
            if cli.json {
                println!("{}", serde_json::json!({ "username": session.username }));
            } else {
                println!("Signed up as {}", session.username);
            }
        }
        Command::Login { username, password } => {
            let session = session::log_in(&kv, &username, &password)?;
            if cli.json {
                println!("{}", serde_json::json!({ "username": session.username }));
            } else {
                println!("Signed in as {}", session.username);
            }
        }
        Command::Logout => {
            session::log_out(&kv)?;
            if cli.json {
                println!("{}", serde_json::json!({ "signedOut": true }));
            } else {
                println!("Signed out");
            }
        }
        Command::Whoami => {
            let username = session::current_session(&kv).map(|session| session.username);
            if cli.json {
                println!("{}", serde_json::json!({ "username": username }));
            } else {
                match username {
                    Some(name) => println!("{name}"),
                    None => println!("(not signed in)"),
                }
            }
        }
        Command::Add {
            title,
            date,
            start,
            end,
        } => {
            let mut load = load_session_store(&kv);
            let date = match date {
                Some(value) => value,
                None => date_key(SystemClock.today()),
            };
            let start = match start {
                Some(raw) => parse_12h(&raw).map_err(AppError::invalid_input)?,
                None => String::new(),
            };
            let end = match end {
                Some(raw) => parse_12h(&raw).map_err(AppError::invalid_input)?,
                None => String::new(),
            };

            let task = load.store.add(&kv, &title, &date, &start, &end)?;
            report_save(&load.store);
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Done { id } => {
            let mut load = load_session_store(&kv);
            let task = load
                .store
                .toggle_complete(&kv, &id)
                .ok_or_else(|| AppError::invalid_input("task not found"))?;
            report_save(&load.store);
            if cli.json {
                print_task_json(&task);
            } else if task.is_completed() {
                println!("Completed task: {} ({})", task.title, task.id);
            } else {
                println!("Reopened task: {} ({})", task.title, task.id);
            }
        }
        Command::Edit {
            id,
            title,
            date,
            start,
            end,
            clear_start,
            clear_end,
        } => {
            let changes = TaskChanges {
                title,
                date,
                start_time: resolve_time_arg(start, clear_start, "start")?,
                end_time: resolve_time_arg(end, clear_end, "end")?,
            };

            let mut load = load_session_store(&kv);
            let task = load
                .store
                .update(&kv, &id, changes)?
                .ok_or_else(|| AppError::invalid_input("task not found"))?;
            report_save(&load.store);
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { id } => {
            let mut load = load_session_store(&kv);
            let task = load
                .store
                .remove(&kv, &id)
                .ok_or_else(|| AppError::invalid_input("task not found"))?;
            report_save(&load.store);
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::Week { offset } => {
            print_week(&kv, &palette, cli.json, offset);
        }
        Command::Chart { offset } => {
            print_chart(&kv, cli.json, offset);
        }
        Command::Month { year, month } => {
            print_month(&palette, cli.json, year, month)?;
        }
        Command::Watch { offset, interval } => {
            let interval = match interval {
                Some(seconds) if seconds > 0 => Duration::from_secs(seconds),
                _ => config.tick_interval(),
            };
            run_watch(kv, palette, interval, offset)?;
        }
    }

    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::storage(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("planner".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
