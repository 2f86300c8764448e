/// Conversion of local and catalog chapter markers into one record shape
use super::{LocalChapter, RemoteChapter};

/// Canonical chapter record shared by both sides of an alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    /// Position in the source list
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub title: String,
}

/// Convert seconds to milliseconds, rounding to the nearest millisecond.
///
/// Negative and non-finite inputs map to 0.
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0).round() as u64
}

/// Normalize local chapters, preserving order and dropping nothing
pub fn normalize_local(chapters: &[LocalChapter]) -> Vec<ChapterRecord> {
    chapters
        .iter()
        .enumerate()
        .map(|(index, chapter)| ChapterRecord {
            index,
            start_ms: chapter.start_ms,
            end_ms: chapter.end_ms,
            title: chapter.title.clone(),
        })
        .collect()
}

/// Normalize catalog chapters; the end is derived from start + duration
pub fn normalize_remote(chapters: &[RemoteChapter]) -> Vec<ChapterRecord> {
    chapters
        .iter()
        .enumerate()
        .map(|(index, chapter)| ChapterRecord {
            index,
            start_ms: chapter.start_ms,
            end_ms: chapter.end_ms(),
            title: chapter.title.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_ms() {
        assert_eq!(seconds_to_ms(0.0), 0);
        assert_eq!(seconds_to_ms(1.0), 1000);
        assert_eq!(seconds_to_ms(0.0004), 0);
        assert_eq!(seconds_to_ms(0.0006), 1);
        assert_eq!(seconds_to_ms(600.25), 600_250);
        assert_eq!(seconds_to_ms(-3.0), 0);
        assert_eq!(seconds_to_ms(f64::NAN), 0);
    }

    #[test]
    fn test_normalize_local_keeps_degenerate_chapters() {
        let local = vec![
            LocalChapter::new("", 0, 0),
            LocalChapter::new("Chapter 2", 0, 120_000),
        ];

        let records = normalize_local(&local);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].end_ms, 0);
        assert_eq!(records[1].index, 1);
        assert_eq!(records[1].end_ms, 120_000);
    }

    #[test]
    fn test_normalize_remote_derives_end() {
        let remote = vec![
            RemoteChapter::new("Opening Credits", 0, 15_000),
            RemoteChapter::new("Chapter One", 15_000, 600_000),
        ];

        let records = normalize_remote(&remote);
        assert_eq!(records[0].end_ms, 15_000);
        assert_eq!(records[1].start_ms, 15_000);
        assert_eq!(records[1].end_ms, 615_000);
        assert_eq!(records[1].title, "Chapter One");
    }
}
