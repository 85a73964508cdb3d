#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }

    pub fn parse(raw: &str) -> Option<Meridiem> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AM" => Some(Self::Am),
            "PM" => Some(Self::Pm),
            _ => None,
        }
    }
}

/// 12-hour input/display triple. `hour` and `minute` stay textual because
/// they mirror form fields; empty hour means no time set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwelveHour {
    pub hour: String,
    pub minute: String,
    pub meridiem: Meridiem,
}

/// Convert a 12-hour triple into canonical `HH:MM`. An hour that parses to
/// zero (including blank or garbage text) collapses to the empty canonical
/// time; "12" is the only way to express noon or midnight.
pub fn to_24_hour(hour_text: &str, minute_text: &str, meridiem: Meridiem) -> String {
    let hour: u32 = hour_text.trim().parse().unwrap_or(0);
    if hour == 0 {
        return String::new();
    }

    let minute: u32 = minute_text.trim().parse().unwrap_or(0);
    let mut hours = hour % 12;
    if meridiem == Meridiem::Pm {
        hours += 12;
    }
    format!("{hours:02}:{minute:02}")
}

pub fn split_24_to_12(canonical: &str) -> TwelveHour {
    if canonical.is_empty() {
        return TwelveHour {
            hour: String::new(),
            minute: String::new(),
            meridiem: Meridiem::Am,
        };
    }

    let (raw_hour, minute) = split_hhmm(canonical);
    let mut hour = raw_hour;
    let mut meridiem = Meridiem::Am;
    if hour == 0 {
        hour = 12;
    } else if hour == 12 {
        meridiem = Meridiem::Pm;
    } else if hour > 12 {
        hour -= 12;
        meridiem = Meridiem::Pm;
    }

    TwelveHour {
        hour: hour.to_string(),
        minute: format!("{minute:02}"),
        meridiem,
    }
}

/// Human label for a canonical time, `"H:MM AM"` style. Empty stays empty.
pub fn format_time_12(canonical: &str) -> String {
    if canonical.is_empty() {
        return String::new();
    }

    let twelve = split_24_to_12(canonical);
    format!(
        "{}:{} {}",
        twelve.hour,
        twelve.minute,
        twelve.meridiem.as_str()
    )
}

/// Minutes since midnight, for ordering only. Empty or malformed input is 0
/// so unset times sort first.
pub fn parse_time_to_min(canonical: &str) -> u32 {
    let (hours, minutes) = split_hhmm(canonical);
    hours * 60 + minutes
}

fn split_hhmm(canonical: &str) -> (u32, u32) {
    let mut parts = canonical.splitn(2, ':');
    let hours = parts
        .next()
        .and_then(|part| part.trim().parse().ok())
        .unwrap_or(0);
    let minutes = parts
        .next()
        .and_then(|part| part.trim().parse().ok())
        .unwrap_or(0);
    (hours, minutes)
}
