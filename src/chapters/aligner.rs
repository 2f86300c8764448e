/// Order-preserving alignment of local chapters against catalog chapters
///
/// The aligner fills an `(m+1) x (n+1)` cost table where each cell is the
/// cheapest way to explain the first `i` local and first `j` catalog chapters.
/// A cell is reached by matching the pair `(i-1, j-1)`, by leaving local
/// chapter `i-1` unmatched, or by leaving catalog chapter `j-1` unmatched.
/// The chosen move is recorded per cell so backtracking never compares floats.
use super::confidence::{overall_confidence, pair_confidence};
use super::normalize::{normalize_local, normalize_remote, ChapterRecord};
use super::placeholder::analyze_with_threshold;
use super::similarity::pair_cost;
use super::{AlignedChapter, AlignmentError, AlignmentResult, ChapterMatch, LocalChapter, RemoteChapter};
use crate::config::AlignmentConfig;
use tracing::debug;

/// One step of the optimal alignment path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignStep {
    /// Local chapter paired with a catalog chapter
    Match { local: usize, remote: usize, cost: f64 },
    /// Local chapter with no catalog counterpart
    LocalUnmatched { local: usize },
    /// Catalog chapter with no local counterpart
    RemoteUnmatched { remote: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Match,
    SkipLocal,
    SkipRemote,
}

/// Chapter aligner holding a validated configuration
#[derive(Debug, Clone, Default)]
pub struct ChapterAligner {
    config: AlignmentConfig,
}

impl ChapterAligner {
    /// Create an aligner, failing fast on an invalid configuration
    pub fn new(config: AlignmentConfig) -> Result<Self, AlignmentError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Align one book's local chapters against its catalog chapters
    pub fn align(&self, local: &[LocalChapter], remote: &[RemoteChapter]) -> AlignmentResult {
        let local_records = normalize_local(local);
        let remote_records = normalize_remote(remote);

        let steps = align_sequences(&local_records, &remote_records, &self.config);
        let aligned = steps_to_chapters(&steps, &remote_records);
        let overall = overall_confidence(&aligned);
        let analysis = analyze_with_threshold(local, self.config.needs_update_threshold);

        debug!(
            "Aligned {} local / {} catalog chapters: {} matched, overall confidence {:.3}",
            local.len(),
            remote.len(),
            aligned.iter().filter(|c| c.is_matched()).count(),
            overall
        );

        AlignmentResult {
            aligned,
            overall_confidence: overall,
            needs_update: analysis.needs_update,
        }
    }
}

/// Validate `config`, then align `local` against `remote`
pub fn align(
    local: &[LocalChapter],
    remote: &[RemoteChapter],
    config: &AlignmentConfig,
) -> Result<AlignmentResult, AlignmentError> {
    let aligner = ChapterAligner::new(config.clone())?;
    Ok(aligner.align(local, remote))
}

/// Compute the minimum-cost monotonic alignment path.
///
/// Ties resolve as match, then local-unmatched, then remote-unmatched.
pub fn align_sequences(
    local: &[ChapterRecord],
    remote: &[ChapterRecord],
    config: &AlignmentConfig,
) -> Vec<AlignStep> {
    let m = local.len();
    let n = remote.len();
    let cols = n + 1;

    let mut costs = vec![0.0f64; m * n];
    for (i, l) in local.iter().enumerate() {
        for (j, r) in remote.iter().enumerate() {
            costs[i * n + j] = pair_cost(l, r, config);
        }
    }

    let mut dp = vec![0.0f64; (m + 1) * cols];
    let mut moves = vec![Move::Match; (m + 1) * cols];

    for j in 1..=n {
        dp[j] = j as f64 * config.delete_cost;
        moves[j] = Move::SkipRemote;
    }
    for i in 1..=m {
        dp[i * cols] = i as f64 * config.insert_cost;
        moves[i * cols] = Move::SkipLocal;
    }

    for i in 1..=m {
        for j in 1..=n {
            let mut best = dp[(i - 1) * cols + (j - 1)] + costs[(i - 1) * n + (j - 1)];
            let mut step = Move::Match;

            let skip_local = dp[(i - 1) * cols + j] + config.insert_cost;
            if skip_local < best {
                best = skip_local;
                step = Move::SkipLocal;
            }

            let skip_remote = dp[i * cols + (j - 1)] + config.delete_cost;
            if skip_remote < best {
                best = skip_remote;
                step = Move::SkipRemote;
            }

            dp[i * cols + j] = best;
            moves[i * cols + j] = step;
        }
    }

    let mut path = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        match moves[i * cols + j] {
            Move::Match => {
                path.push(AlignStep::Match {
                    local: i - 1,
                    remote: j - 1,
                    cost: costs[(i - 1) * n + (j - 1)],
                });
                i -= 1;
                j -= 1;
            }
            Move::SkipLocal => {
                path.push(AlignStep::LocalUnmatched { local: i - 1 });
                i -= 1;
            }
            Move::SkipRemote => {
                path.push(AlignStep::RemoteUnmatched { remote: j - 1 });
                j -= 1;
            }
        }
    }
    path.reverse();

    debug!("Alignment cost {:.4} over {} steps", dp[m * cols + n], path.len());
    path
}

/// Map an alignment path to one entry per local chapter
fn steps_to_chapters(steps: &[AlignStep], remote: &[ChapterRecord]) -> Vec<AlignedChapter> {
    let mut aligned = Vec::with_capacity(steps.len());
    let mut unmatched_remote = 0usize;

    for step in steps {
        match *step {
            AlignStep::Match { local, remote: remote_index, cost } => aligned.push(AlignedChapter {
                index: local,
                suggested_name: remote[remote_index].title.clone(),
                confidence: pair_confidence(cost),
                kind: ChapterMatch::Matched { remote_index },
            }),
            AlignStep::LocalUnmatched { local } => aligned.push(AlignedChapter {
                index: local,
                suggested_name: String::new(),
                confidence: 0.0,
                kind: ChapterMatch::Inserted,
            }),
            AlignStep::RemoteUnmatched { .. } => unmatched_remote += 1,
        }
    }

    if unmatched_remote > 0 {
        debug!("{} catalog chapters have no local counterpart", unmatched_remote);
    }

    aligned
}
