use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use time::{Date, Duration, OffsetDateTime, UtcOffset};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("planner-{nanos}-{file_name}"))
}

fn planner(store_path: &PathBuf) -> Command {
    let exe = env!("CARGO_BIN_EXE_planner");
    let mut cmd = Command::new(exe);
    cmd.env("PLANNER_STORE_PATH", store_path)
        .env("PLANNER_CONFIG_PATH", store_path.with_extension("config"));
    cmd
}

fn write_store(store_path: &PathBuf, username: &str, tasks: serde_json::Value) {
    let mut entries = serde_json::Map::new();
    entries.insert(
        "session_v1".to_string(),
        serde_json::Value::String(serde_json::json!({ "username": username }).to_string()),
    );
    entries.insert(
        format!("items_{username}"),
        serde_json::Value::String(tasks.to_string()),
    );
    std::fs::write(
        store_path,
        serde_json::to_string_pretty(&serde_json::Value::Object(entries)).unwrap(),
    )
    .unwrap();
}

fn local_today() -> Date {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset).date()
}

fn key_of(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn week_json(store_path: &PathBuf, extra: &[&str]) -> serde_json::Value {
    let mut args = vec!["week", "--json"];
    args.extend_from_slice(extra);
    let output = planner(store_path).args(args).output().expect("week runs");
    assert!(output.status.success());
    serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap()
}

#[test]
fn week_sorts_open_before_completed_then_by_time() {
    let store_path = temp_path("week-sort.json");
    let today = key_of(local_today());
    write_store(
        &store_path,
        "ada",
        serde_json::json!([
            {
                "id": "task-done",
                "title": "done nine",
                "date": today,
                "startTime": "09:00",
                "endTime": "",
                "createdAt": "2024-01-01T00:00:01Z",
                "completedAt": "2024-01-01T12:00:00Z"
            },
            {
                "id": "task-late",
                "title": "open ten",
                "date": today,
                "startTime": "10:00",
                "endTime": "",
                "createdAt": "2024-01-01T00:00:02Z",
                "completedAt": null
            },
            {
                "id": "task-early",
                "title": "open eight",
                "date": today,
                "startTime": "08:00",
                "endTime": "",
                "createdAt": "2024-01-01T00:00:03Z",
                "completedAt": null
            }
        ]),
    );

    let payload = week_json(&store_path, &[]);
    std::fs::remove_file(&store_path).ok();

    let day = payload["days"]
        .as_array()
        .unwrap()
        .iter()
        .find(|day| day["date"] == today)
        .expect("today is in the visible week");
    let order: Vec<&str> = day["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["id"].as_str().unwrap())
        .collect();

    assert_eq!(order, ["task-early", "task-late", "task-done"]);
    assert_eq!(day["tally"]["open"], 2);
    assert_eq!(day["tally"]["completed"], 1);
}

#[test]
fn week_starts_on_a_sunday_and_spans_seven_days() {
    let store_path = temp_path("week-shape.json");
    write_store(&store_path, "ada", serde_json::json!([]));

    let payload = week_json(&store_path, &[]);
    std::fs::remove_file(&store_path).ok();

    let days = payload["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["weekday"], "Sun");
    assert_eq!(days[6]["weekday"], "Sat");
    assert_eq!(days[0]["date"], payload["weekStart"]);
}

#[test]
fn week_migrates_a_legacy_time_field() {
    let store_path = temp_path("week-legacy.json");
    let today = key_of(local_today());
    write_store(
        &store_path,
        "ada",
        serde_json::json!([
            {
                "id": "task-legacy",
                "title": "old schema",
                "date": today,
                "time": "14:00",
                "createdAt": "2024-01-01T00:00:01Z",
                "completedAt": null
            }
        ]),
    );

    let payload = week_json(&store_path, &[]);
    std::fs::remove_file(&store_path).ok();

    let day = payload["days"]
        .as_array()
        .unwrap()
        .iter()
        .find(|day| day["date"] == today)
        .unwrap();
    let task = &day["tasks"][0];

    assert_eq!(task["startTime"], "14:00");
    assert_eq!(task["endTime"], "");
    assert!(task.get("time").is_none());
}

#[test]
fn week_offset_brings_other_weeks_into_view() {
    let store_path = temp_path("week-offset.json");
    let future = key_of(local_today() + Duration::days(14));
    write_store(
        &store_path,
        "ada",
        serde_json::json!([
            {
                "id": "task-future",
                "title": "later",
                "date": future,
                "startTime": "",
                "endTime": "",
                "createdAt": "2024-01-01T00:00:01Z",
                "completedAt": null
            }
        ]),
    );

    let this_week = week_json(&store_path, &[]);
    assert_eq!(this_week["totals"]["total"], 0);

    let that_week = week_json(&store_path, &["--offset", "2"]);
    std::fs::remove_file(&store_path).ok();

    assert_eq!(that_week["totals"]["total"], 1);
    let day = that_week["days"]
        .as_array()
        .unwrap()
        .iter()
        .find(|day| day["date"] == future)
        .expect("task day visible at offset 2");
    assert_eq!(day["tasks"][0]["id"], "task-future");
}

#[test]
fn week_reports_corrupt_storage_and_starts_empty() {
    let store_path = temp_path("week-corrupt.json");
    let mut entries = serde_json::Map::new();
    entries.insert(
        "session_v1".to_string(),
        serde_json::Value::String(serde_json::json!({ "username": "ada" }).to_string()),
    );
    entries.insert(
        "items_ada".to_string(),
        serde_json::Value::String("{ not a list ".to_string()),
    );
    std::fs::write(
        &store_path,
        serde_json::to_string(&serde_json::Value::Object(entries)).unwrap(),
    )
    .unwrap();

    let output = planner(&store_path)
        .args(["week", "--json"])
        .output()
        .unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("starting empty"));
    let payload: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(payload["totals"]["total"], 0);
}

#[test]
fn chart_totals_count_open_and_completed() {
    let store_path = temp_path("chart-totals.json");
    let today = key_of(local_today());
    write_store(
        &store_path,
        "ada",
        serde_json::json!([
            {
                "id": "task-open",
                "title": "open",
                "date": today,
                "startTime": "",
                "endTime": "",
                "createdAt": "2024-01-01T00:00:01Z",
                "completedAt": null
            },
            {
                "id": "task-done",
                "title": "done",
                "date": today,
                "startTime": "",
                "endTime": "",
                "createdAt": "2024-01-01T00:00:02Z",
                "completedAt": "2024-01-02T00:00:00Z"
            }
        ]),
    );

    let output = planner(&store_path)
        .args(["chart", "--json"])
        .output()
        .unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(payload["totals"]["open"], 1);
    assert_eq!(payload["totals"]["completed"], 1);
    assert_eq!(payload["totals"]["total"], 2);

    let day = payload["days"]
        .as_array()
        .unwrap()
        .iter()
        .find(|day| day["date"] == today)
        .unwrap();
    assert_eq!(day["open"], 1);
    assert_eq!(day["completed"], 1);
}

#[test]
fn chart_renders_a_table_with_a_week_row() {
    let store_path = temp_path("chart-table.json");
    write_store(&store_path, "ada", serde_json::json!([]));

    let output = planner(&store_path)
        .args(["chart", "--theme", "plain"])
        .output()
        .unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Open"));
    assert!(stdout.contains("Completed"));
    assert!(stdout.contains("Week"));
}
