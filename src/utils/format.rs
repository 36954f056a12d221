//! Human-readable rendering of timer values

use crate::state::{TimerPhase, TimerSnapshot};

/// Layout for [`format_time`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeFormat {
    /// `MM:SS`, switching to `HH:MM:SS` from one hour on
    #[default]
    Dynamic,
    /// `MM:SS` with minutes not wrapped at the hour
    MinutesSeconds,
    HoursMinutesSeconds,
}

pub fn format_time(seconds: u64, format: TimeFormat) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    match format {
        TimeFormat::HoursMinutesSeconds => format!("{:02}:{:02}:{:02}", hours, minutes, secs),
        TimeFormat::MinutesSeconds => format!("{:02}:{:02}", seconds / 60, secs),
        TimeFormat::Dynamic if hours > 0 => format!("{:02}:{:02}:{:02}", hours, minutes, secs),
        TimeFormat::Dynamic => format!("{:02}:{:02}", minutes, secs),
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// "45 seconds", "2 minutes", "2m 5s", "1 hour", "1h 30m"
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return plural(seconds, "second");
    }

    let minutes = seconds / 60;
    let rem_secs = seconds % 60;
    if minutes < 60 {
        return if rem_secs == 0 {
            plural(minutes, "minute")
        } else {
            format!("{}m {}s", minutes, rem_secs)
        };
    }

    let hours = minutes / 60;
    let rem_mins = minutes % 60;
    if rem_mins == 0 {
        plural(hours, "hour")
    } else {
        format!("{}h {}m", hours, rem_mins)
    }
}

/// Display string for the snapshot's current value
///
/// Breaks always count down in `MM:SS`; work and idle values grow past an hour.
pub fn format_display(snapshot: &TimerSnapshot) -> String {
    let format = match snapshot.state {
        TimerPhase::Breaking => TimeFormat::MinutesSeconds,
        TimerPhase::Working | TimerPhase::Idle => TimeFormat::Dynamic,
    };
    format_time(snapshot.current_display_seconds, format)
}

/// Label of the primary action for this snapshot
pub fn action_label(snapshot: &TimerSnapshot) -> &'static str {
    match snapshot.state {
        TimerPhase::Working => "Stop Work",
        TimerPhase::Breaking => "Stop Break",
        TimerPhase::Idle if snapshot.break_available() => "Start Break",
        TimerPhase::Idle => "Start Work",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_dynamic() {
        assert_eq!(format_time(0, TimeFormat::Dynamic), "00:00");
        assert_eq!(format_time(65, TimeFormat::Dynamic), "01:05");
        assert_eq!(format_time(3_599, TimeFormat::Dynamic), "59:59");
        assert_eq!(format_time(3_661, TimeFormat::Dynamic), "01:01:01");
    }

    #[test]
    fn test_format_time_fixed_layouts() {
        assert_eq!(format_time(3_661, TimeFormat::MinutesSeconds), "61:01");
        assert_eq!(format_time(59, TimeFormat::HoursMinutesSeconds), "00:00:59");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(45), "45 seconds");
        assert_eq!(format_duration(60), "1 minute");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(7_200), "2 hours");
        assert_eq!(format_duration(5_400), "1h 30m");
    }

    #[test]
    fn test_action_label_follows_state() {
        let mut snapshot = TimerSnapshot::new();
        assert_eq!(action_label(&snapshot), "Start Work");

        snapshot.break_seconds = 20;
        assert_eq!(action_label(&snapshot), "Start Break");

        snapshot.state = TimerPhase::Breaking;
        assert_eq!(action_label(&snapshot), "Stop Break");

        snapshot.state = TimerPhase::Working;
        assert_eq!(action_label(&snapshot), "Stop Work");
    }

    #[test]
    fn test_format_display_for_break() {
        let snapshot = TimerSnapshot {
            state: TimerPhase::Breaking,
            break_seconds: 4_000,
            current_display_seconds: 3_700,
            is_running: true,
            start_timestamp: Some(0),
            ..TimerSnapshot::default()
        };
        assert_eq!(format_display(&snapshot), "61:40");
    }
}
