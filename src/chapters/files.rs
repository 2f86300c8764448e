/// Reading local and catalog chapter lists from disk
use super::normalize::seconds_to_ms;
use super::{LocalChapter, RemoteChapter};
use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Markdown chapter line: "1. **Title** - M:SS"
static CHAPTER_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\.\s+\*\*(.+?)\*\*\s+-\s+(\d+(?::\d{1,2})*(?:\.\d+)?)").unwrap()
});

/// Local chapter file layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocalChapterFile {
    Plain(Vec<LocalChapter>),
    Probe(ProbeOutput),
}

/// `ffprobe -show_chapters -of json` output
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    chapters: Vec<ProbeChapter>,
}

#[derive(Debug, Deserialize)]
struct ProbeChapter {
    start_time: String,
    end_time: String,
    #[serde(default)]
    tags: ProbeTags,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    #[serde(default)]
    title: String,
}

/// Catalog chapter file layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteChapterFile {
    Plain(Vec<RemoteChapter>),
    Export(CatalogExport),
}

/// Catalog export with offsets named the way catalog APIs report them
#[derive(Debug, Deserialize)]
struct CatalogExport {
    chapters: Vec<ExportChapter>,
}

#[derive(Debug, Deserialize)]
struct ExportChapter {
    title: String,
    start_offset_ms: u64,
    length_ms: u64,
}

/// Load local chapters from a `.json`, `.md` or `.txt` file
pub async fn load_local_chapters(path: &Path) -> Result<Vec<LocalChapter>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read chapter file {}", path.display()))?;

    let chapters = match extension(path).as_str() {
        "json" => parse_local_json(&content)
            .with_context(|| format!("Invalid local chapter file {}", path.display()))?,
        "md" | "txt" => parse_chapters_markdown(&content, None),
        other => return Err(anyhow!("Unsupported chapter file type '{}': {}", other, path.display())),
    };

    info!("📁 Loaded {} local chapters from {}", chapters.len(), path.display());
    Ok(chapters)
}

/// Load catalog chapters from a JSON file
pub async fn load_remote_chapters(path: &Path) -> Result<Vec<RemoteChapter>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read catalog file {}", path.display()))?;

    let chapters = parse_remote_json(&content)
        .with_context(|| format!("Invalid catalog chapter file {}", path.display()))?;

    debug!("Loaded {} catalog chapters from {}", chapters.len(), path.display());
    Ok(chapters)
}

/// Parse local chapters from a plain list or ffprobe output
pub fn parse_local_json(content: &str) -> Result<Vec<LocalChapter>> {
    match serde_json::from_str::<LocalChapterFile>(content)? {
        LocalChapterFile::Plain(chapters) => Ok(chapters),
        LocalChapterFile::Probe(probe) => probe
            .chapters
            .into_iter()
            .map(|chapter| -> Result<LocalChapter> {
                let start: f64 = chapter
                    .start_time
                    .parse()
                    .map_err(|_| anyhow!("Invalid start_time '{}'", chapter.start_time))?;
                let end: f64 = chapter
                    .end_time
                    .parse()
                    .map_err(|_| anyhow!("Invalid end_time '{}'", chapter.end_time))?;
                Ok(LocalChapter::new(chapter.tags.title, seconds_to_ms(start), seconds_to_ms(end)))
            })
            .collect(),
    }
}

/// Parse catalog chapters from a plain list or a catalog export
pub fn parse_remote_json(content: &str) -> Result<Vec<RemoteChapter>> {
    match serde_json::from_str::<RemoteChapterFile>(content)? {
        RemoteChapterFile::Plain(chapters) => Ok(chapters),
        RemoteChapterFile::Export(export) => Ok(export
            .chapters
            .into_iter()
            .map(|chapter| RemoteChapter::new(chapter.title, chapter.start_offset_ms, chapter.length_ms))
            .collect()),
    }
}

/// Parse chapters from the markdown chapter list format.
///
/// Each chapter ends where the next one starts. The last chapter ends at
/// `total_duration_ms` when given, otherwise it has zero length.
pub fn parse_chapters_markdown(content: &str, total_duration_ms: Option<u64>) -> Vec<LocalChapter> {
    let starts: Vec<(String, u64)> = content
        .lines()
        .filter_map(|line| {
            let captures = CHAPTER_LINE_REGEX.captures(line)?;
            let title = clean_chapter_title(captures.get(1)?.as_str());
            let seconds = parse_timestamp(captures.get(2)?.as_str())?;
            Some((title, seconds_to_ms(seconds)))
        })
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, (title, start_ms))| {
            let end_ms = match starts.get(i + 1) {
                Some((_, next_start)) => *next_start,
                None => total_duration_ms.unwrap_or(*start_ms),
            };
            LocalChapter::new(title.clone(), *start_ms, end_ms.max(*start_ms))
        })
        .collect()
}

/// Parse "SS", "M:SS" or "H:MM:SS" (optional fractional seconds) to seconds
pub fn parse_timestamp(timestamp: &str) -> Option<f64> {
    let parts: Vec<&str> = timestamp.trim().split(':').collect();
    let (seconds_part, larger) = parts.split_last()?;

    let seconds: f64 = seconds_part.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 || (!larger.is_empty() && seconds >= 60.0) {
        return None;
    }

    let minutes_and_hours = match larger {
        [] => 0,
        [minutes] => minutes.parse::<u64>().ok()? * 60,
        [hours, minutes] => {
            let minutes = minutes.parse::<u64>().ok()?;
            if minutes >= 60 {
                return None;
            }
            hours.parse::<u64>().ok()? * 3600 + minutes * 60
        }
        _ => return None,
    };

    Some(minutes_and_hours as f64 + seconds)
}

/// Clean and normalize chapter title
pub fn clean_chapter_title(title: &str) -> String {
    title
        .trim()
        .trim_matches(|c| c == '-' || c == '–' || c == '|' || c == ':')
        .trim()
        .to_string()
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("45"), Some(45.0));
        assert_eq!(parse_timestamp("3:05"), Some(185.0));
        assert_eq!(parse_timestamp("1:02:03"), Some(3723.0));
        assert_eq!(parse_timestamp("0:01.5"), Some(1.5));
        assert_eq!(parse_timestamp("1:75"), None);
        assert_eq!(parse_timestamp("1:61:00"), None);
        assert_eq!(parse_timestamp("1:2:3:4"), None);
        assert_eq!(parse_timestamp("abc"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_clean_chapter_title() {
        assert_eq!(clean_chapter_title(" - The Storm | "), "The Storm");
        assert_eq!(clean_chapter_title(": Aftermath"), "Aftermath");
    }

    #[test]
    fn test_parse_chapters_markdown() {
        let content = "# Book Chapters\n\n\
                       ## Chapters\n\n\
                       1. **Opening Credits** - 0:00\n\
                       2. **The Storm** - 1:30\n\
                       not a chapter line\n\
                       3. **Aftermath** - 1:02:03\n";

        let chapters = parse_chapters_markdown(content, Some(4_000_000));
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0], LocalChapter::new("Opening Credits", 0, 90_000));
        assert_eq!(chapters[1], LocalChapter::new("The Storm", 90_000, 3_723_000));
        assert_eq!(chapters[2], LocalChapter::new("Aftermath", 3_723_000, 4_000_000));

        let open_ended = parse_chapters_markdown(content, None);
        assert_eq!(open_ended[2].end_ms, open_ended[2].start_ms);
    }

    #[test]
    fn test_parse_local_json_layouts() {
        let plain = r#"[{"title": "Chapter 1", "start_ms": 0, "end_ms": 1000}]"#;
        assert_eq!(parse_local_json(plain).unwrap(), vec![LocalChapter::new("Chapter 1", 0, 1000)]);

        let probe = r#"{"chapters": [
            {"id": 0, "start_time": "0.000000", "end_time": "600.500000", "tags": {"title": "Chapter 1"}},
            {"id": 1, "start_time": "600.500000", "end_time": "1200.000000"}
        ]}"#;
        let chapters = parse_local_json(probe).unwrap();
        assert_eq!(chapters[0], LocalChapter::new("Chapter 1", 0, 600_500));
        assert_eq!(chapters[1], LocalChapter::new("", 600_500, 1_200_000));

        assert!(parse_local_json(r#"{"chapters": [{"start_time": "x", "end_time": "1"}]}"#).is_err());
        assert!(parse_local_json("not json").is_err());
    }

    #[test]
    fn test_parse_remote_json_layouts() {
        let plain = r#"[{"title": "Prologue", "start_ms": 0, "duration_ms": 5000}]"#;
        assert_eq!(parse_remote_json(plain).unwrap(), vec![RemoteChapter::new("Prologue", 0, 5000)]);

        let export = r#"{"chapters": [
            {"title": "Prologue", "start_offset_ms": 0, "length_ms": 5000},
            {"title": "The Storm", "start_offset_ms": 5000, "length_ms": 7000}
        ]}"#;
        let chapters = parse_remote_json(export).unwrap();
        assert_eq!(chapters[1], RemoteChapter::new("The Storm", 5000, 7000));
    }

    #[tokio::test]
    async fn test_load_local_chapters_by_extension() {
        let temp_dir = TempDir::new().unwrap();

        let md_path = temp_dir.path().join("book_chapters.txt");
        fs::write(&md_path, "1. **Prologue** - 0:00\n2. **Arrival** - 10:00\n")
            .await
            .unwrap();
        let chapters = load_local_chapters(&md_path).await.unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1].start_ms, 600_000);

        let bad_path = temp_dir.path().join("chapters.xml");
        fs::write(&bad_path, "<chapters/>").await.unwrap();
        assert!(load_local_chapters(&bad_path).await.is_err());

        assert!(load_local_chapters(&temp_dir.path().join("missing.json")).await.is_err());
    }
}
