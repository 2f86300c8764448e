/// Temporal and textual similarity between one local and one catalog chapter
use super::normalize::ChapterRecord;
use crate::config::AlignmentConfig;

/// Weight of token-set overlap within the title similarity
const TOKEN_WEIGHT: f64 = 0.5;
/// Weight of edit-distance similarity within the title similarity
const EDIT_WEIGHT: f64 = 0.5;

/// Individual scores behind a pair cost
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub time: f64,
    pub text: f64,
    pub cost: f64,
}

/// Lowercase, drop punctuation and collapse whitespace.
///
/// Dashes, underscores and slashes separate words rather than vanish, so
/// "Part-One" and "Part One" normalize the same way.
pub fn normalize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || matches!(c, '-' | '–' | '—' | '_' | '/') {
                Some(' ')
            } else {
                None
            }
        })
        .collect::<String>()
        .to_lowercase();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sorted, deduplicated tokens of a normalized title
fn token_set(normalized: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens
}

/// Jaccard overlap of two sorted token sets
fn jaccard(a: &[&str], b: &[&str]) -> f64 {
    let (mut i, mut j, mut shared) = (0, 0, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }

    let union = a.len() + b.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Title similarity in [0, 1].
///
/// A missing title on either side scores 0: absence of a title cannot confirm
/// a match.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_title(a);
    let b = normalize_title(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let token_score = jaccard(&token_set(&a), &token_set(&b));
    let edit_score = strsim::normalized_levenshtein(&a, &b);

    (TOKEN_WEIGHT * token_score + EDIT_WEIGHT * edit_score).clamp(0.0, 1.0)
}

/// Start-time proximity in [0, 1]: 1 at zero offset, falling linearly to 0
/// at `window_ms` and staying 0 beyond it.
pub fn time_similarity(local_start_ms: u64, remote_start_ms: u64, window_ms: u64) -> f64 {
    let offset = local_start_ms.abs_diff(remote_start_ms);
    if window_ms == 0 || offset >= window_ms {
        return if offset == 0 { 1.0 } else { 0.0 };
    }
    1.0 - offset as f64 / window_ms as f64
}

/// Score a local/catalog pair
pub fn score_pair(local: &ChapterRecord, remote: &ChapterRecord, config: &AlignmentConfig) -> PairScore {
    let time = time_similarity(local.start_ms, remote.start_ms, config.time_window_ms);
    let text = text_similarity(&local.title, &remote.title);
    let cost = (1.0 - (config.weight_time * time + config.weight_text * text)).clamp(0.0, 1.0);

    PairScore { time, text, cost }
}

/// Cost of matching `local` with `remote`, in [0, 1]
pub fn pair_cost(local: &ChapterRecord, remote: &ChapterRecord, config: &AlignmentConfig) -> f64 {
    score_pair(local, remote, config).cost
}
