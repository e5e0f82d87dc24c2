use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::HistoryEntry;

pub const NOT_AVAILABLE: &str = "N/A";

/// Human-readable elapsed time, using the two largest units that apply:
/// `2d 3h`, `4h 5m`, `1m 30s`, `42s`. Negative input (clock skew) is `N/A`.
pub fn format_duration(milliseconds: i64) -> String {
    if milliseconds < 0 {
        return NOT_AVAILABLE.to_string();
    }
    let seconds = milliseconds / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h", hours % 24)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

/// One line of the history view.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub department: Option<String>,
    pub action: String,
    pub received_by: Option<String>,
    pub duration: String,
    pub remarks: Option<String>,
}

/// Label shown for an entry; unreconciled rows read as `Updated`.
pub fn action_label(entry: &HistoryEntry) -> String {
    format!(
        "{} ({})",
        entry.action.as_deref().unwrap_or("Updated"),
        entry.status.as_deref().unwrap_or(NOT_AVAILABLE)
    )
}

/// Project entries (already ascending by `created_at`) into view rows. Each
/// row's duration is the time since the previous entry; the first has none.
pub fn history_timeline(entries: &[HistoryEntry]) -> Vec<HistoryRow> {
    let mut previous: Option<DateTime<Utc>> = None;
    entries
        .iter()
        .map(|entry| {
            let duration = match previous {
                Some(prev) => format_duration((entry.created_at - prev).num_milliseconds()),
                None => NOT_AVAILABLE.to_string(),
            };
            previous = Some(entry.created_at);
            HistoryRow {
                id: entry.id,
                created_at: entry.created_at,
                department: entry.department.clone(),
                action: action_label(entry),
                received_by: entry.received_by.clone(),
                duration,
                remarks: entry.remarks.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn entry(id: i64, at: DateTime<Utc>, action: Option<&str>, status: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            id,
            created_at: at,
            document_id: Uuid::nil(),
            action: action.map(String::from),
            department: Some("Treasury".into()),
            status: status.map(String::from),
            received_by: None,
            remarks: None,
        }
    }

    #[test]
    fn picks_the_largest_unit() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59_999), "59s");
        assert_eq!(format_duration(90_000), "1m 30s");
        assert_eq!(format_duration(3_600_000), "1h 0m");
        assert_eq!(format_duration(5 * 3_600_000 + 7 * 60_000 + 59_000), "5h 7m");
        assert_eq!(format_duration(86_400_000 * 2 + 3_600_000 * 3), "2d 3h");
    }

    #[test]
    fn negative_durations_are_not_available() {
        assert_eq!(format_duration(-1000), "N/A");
        assert_eq!(format_duration(-1), "N/A");
    }

    #[test]
    fn timeline_measures_from_the_previous_entry() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let rows = history_timeline(&[
            entry(1, t0, Some("Created"), Some("Submitted")),
            entry(2, t0 + Duration::milliseconds(90_000), None, Some("Reviewing")),
            entry(3, t0 + Duration::milliseconds(89_000), Some("Received"), None),
        ]);
        assert_eq!(rows[0].duration, "N/A");
        assert_eq!(rows[1].duration, "1m 30s");
        assert_eq!(rows[2].duration, "N/A");
        assert_eq!(rows[0].action, "Created (Submitted)");
        assert_eq!(rows[1].action, "Updated (Reviewing)");
        assert_eq!(rows[2].action, "Received (N/A)");
    }

    #[test]
    fn empty_history_has_no_rows() {
        assert!(history_timeline(&[]).is_empty());
    }
}
