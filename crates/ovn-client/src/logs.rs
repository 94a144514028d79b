//! Log file statistics.
//!
//! OVS/OVN daemons write vlog lines as
//! `2024-01-05T10:00:00.123Z|00042|reconnect|INFO|unix:/run/db.sock: connected`.

use ovn_types::LogEventHistogram;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Count lines by severity and source module.
pub fn parse_log_events(text: &str) -> LogEventHistogram {
    let mut histogram = LogEventHistogram::new();
    for line in text.lines() {
        record_line(&mut histogram, line);
    }
    histogram
}

pub async fn read_log_events(path: &Path) -> std::io::Result<LogEventHistogram> {
    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut histogram = LogEventHistogram::new();
    while let Some(line) = lines.next_line().await? {
        record_line(&mut histogram, &line);
    }
    Ok(histogram)
}

fn record_line(histogram: &mut LogEventHistogram, line: &str) {
    let mut fields = line.splitn(5, '|');
    let (Some(_ts), Some(_seq), Some(source), Some(level), Some(_msg)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return;
    };
    if source.is_empty() || level.is_empty() {
        return;
    }
    *histogram
        .entry(level.to_ascii_lowercase())
        .or_default()
        .entry(source.to_string())
        .or_default() += 1;
}
