/*!
 * Context windows for context-aware translation.
 */

use crate::models::TimedSegment;

/// Marker appended to the line being translated
pub const CURRENT_MARKER: &str = "[CURRENT]";

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`)
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render the segments around `current` as timestamped lines.
///
/// The window spans `window / 2` segments on each side; blank neighbours are
/// left out and the current segment is marked with `[CURRENT]`.
pub fn build_context_text(segments: &[TimedSegment], current: usize, window: usize) -> String {
    if current >= segments.len() {
        return String::new();
    }

    let half = window / 2;
    let first = current.saturating_sub(half);
    let last = (current + half + 1).min(segments.len());

    segments[first..last]
        .iter()
        .enumerate()
        .filter(|(offset, segment)| first + offset == current || !segment.is_blank())
        .map(|(offset, segment)| {
            let mut line = format!(
                "[{}-{}] {}",
                format_timestamp(segment.start),
                format_timestamp(segment.end),
                segment.text.trim()
            );
            if first + offset == current {
                line.push(' ');
                line.push_str(CURRENT_MARKER);
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
