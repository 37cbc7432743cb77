//! Plain-text rendering for `syncwatch history`.

use syncwatch_core::UploadRecord;

const NAME_WIDTH: usize = 48;

/// Truncate to `max_len` characters, marking the cut with "...".
pub fn truncate_name(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

pub fn render_row(record: &UploadRecord) -> String {
    format!(
        "{}  {:<7}  {:>10}  {}",
        record.upload_time.format("%Y-%m-%d %H:%M:%S"),
        record.status.as_str(),
        human_size(record.size),
        truncate_name(&record.filename, NAME_WIDTH)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use syncwatch_core::UploadStatus;

    #[test]
    fn truncate_keeps_short_names() {
        assert_eq!(truncate_name("movie.mkv", 20), "movie.mkv");
        assert_eq!(truncate_name("movie.mkv", 9), "movie.mkv");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_name("电影合集第一季第二集.mkv", 8), "电影合集第...");
        assert_eq!(truncate_name("abc", 2), "...");
    }

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(524_288_000), "500.00 MB");
    }

    #[test]
    fn row_layout() {
        let record = UploadRecord {
            filename: "movie.mkv".into(),
            size: 2048,
            upload_time: Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap(),
            status: UploadStatus::Failed,
        };
        assert_eq!(
            render_row(&record),
            "2025-03-01 12:30:00  failed      2.00 KB  movie.mkv"
        );
    }
}
