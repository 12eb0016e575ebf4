use chrono::{DateTime, Utc};

/// Whole seconds since `started_at`, clamped at zero.
pub fn elapsed_secs(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - started_at).num_seconds().max(0) as u64
}

/// `MM:SS`; minutes keep counting past 59.
pub fn format_elapsed(secs: Option<u64>) -> String {
    match secs {
        Some(s) => format!("{:02}:{:02}", s / 60, s % 60),
        None => "00:00".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_elapsed(None), "00:00");
        assert_eq!(format_elapsed(Some(5)), "00:05");
        assert_eq!(format_elapsed(Some(754)), "12:34");
        assert_eq!(format_elapsed(Some(6000)), "100:00");
    }

    #[test]
    fn elapsed_never_negative() {
        let now = Utc::now();
        assert_eq!(elapsed_secs(now + Duration::seconds(5), now), 0);
        assert_eq!(elapsed_secs(now - Duration::seconds(65), now), 65);
    }
}
