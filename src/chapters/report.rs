/// Human-readable and JSON reports of an alignment
use super::confidence::ConfidenceBand;
use super::{AlignmentResult, ChapterMatch, LocalChapter, RemoteChapter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One local chapter with its proposed title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    pub index: usize,
    pub start_ms: u64,
    pub current_title: String,
    pub suggested_name: String,
    pub confidence: f64,
    pub kind: ChapterMatch,
    /// True when applying the suggestion would change the stored title
    pub changes_title: bool,
}

/// Alignment report for one book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub overall_confidence: f64,
    pub needs_update: bool,
    /// Catalog chapters with no local counterpart
    pub unmatched_remote: usize,
}

impl AlignmentReport {
    pub fn new(local: &[LocalChapter], remote: &[RemoteChapter], result: &AlignmentResult) -> Self {
        let rows = result
            .aligned
            .iter()
            .zip(local)
            .map(|(aligned, chapter)| ReportRow {
                index: aligned.index,
                start_ms: chapter.start_ms,
                current_title: chapter.title.clone(),
                suggested_name: aligned.suggested_name.clone(),
                confidence: aligned.confidence,
                kind: aligned.kind,
                changes_title: aligned.is_matched() && aligned.suggested_name != chapter.title,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            rows,
            overall_confidence: result.overall_confidence,
            needs_update: result.needs_update,
            unmatched_remote: remote.len().saturating_sub(result.matched_count()),
        }
    }

    /// Rows whose suggestion differs from the current title
    pub fn proposed_changes(&self) -> Vec<&ReportRow> {
        self.rows.iter().filter(|row| row.changes_title).collect()
    }

    /// Render the report as markdown
    pub fn to_markdown(&self) -> String {
        let mut content = String::new();

        content.push_str("# Chapter Alignment\n\n");
        content.push_str(&format!("- **Chapters**: {}\n", self.rows.len()));
        content.push_str(&format!(
            "- **Matched**: {}\n",
            self.rows.iter().filter(|row| matches!(row.kind, ChapterMatch::Matched { .. })).count()
        ));
        content.push_str(&format!("- **Unmatched catalog chapters**: {}\n", self.unmatched_remote));
        content.push_str(&format!("- **Overall confidence**: {:.2}\n", self.overall_confidence));
        content.push_str(&format!(
            "- **Needs update**: {}\n",
            if self.needs_update { "yes" } else { "no" }
        ));
        content.push_str(&format!("- **Proposed changes**: {}\n\n", self.proposed_changes().len()));

        content.push_str("## Chapters\n\n");
        for row in &self.rows {
            let start_seconds = row.start_ms / 1000;
            let timestamp = format!("{}:{:02}", start_seconds / 60, start_seconds % 60);
            let current = if row.current_title.is_empty() { "(untitled)" } else { row.current_title.as_str() };

            match row.kind {
                ChapterMatch::Matched { remote_index } => {
                    let marker = if row.changes_title { "->" } else { "==" };
                    content.push_str(&format!(
                        "{}. **{}** - {} {} {} (catalog #{}, {} {:.2})\n",
                        row.index + 1,
                        current,
                        timestamp,
                        marker,
                        row.suggested_name,
                        remote_index + 1,
                        ConfidenceBand::from_confidence(row.confidence).label(),
                        row.confidence
                    ));
                }
                ChapterMatch::Inserted => {
                    content.push_str(&format!(
                        "{}. **{}** - {} (no catalog match)\n",
                        row.index + 1,
                        current,
                        timestamp
                    ));
                }
            }
        }

        content.push_str("\n---\n");
        content.push_str(&format!(
            "*Generated by Chapter Aligner - {}*\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        content
    }
}
