use crate::git::SkippedDirectory;
use crate::review::ReviewOutcome;
use std::fmt;
use std::path::PathBuf;

/// 仓库流水线中的阶段，用于失败定位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Baseline,
    Branch,
    Scan,
    Rewrite,
    Commit,
    Push,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Baseline => "baseline",
            Stage::Branch => "branch",
            Stage::Scan => "scan",
            Stage::Rewrite => "rewrite",
            Stage::Commit => "commit",
            Stage::Push => "push",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    Skipped,
    Requested(ReviewOutcome),
    Failed(String),
}

/// 单个仓库的最终状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    NoMatch,
    Failed {
        stage: Stage,
        error: String,
    },
    Pushed {
        branch: String,
        files: usize,
        replacements: usize,
        review: ReviewState,
    },
}

#[derive(Debug, Clone)]
pub struct RepoReport {
    pub name: String,
    pub path: PathBuf,
    pub outcome: RepoOutcome,
}

/// 一次批处理的汇总
#[derive(Debug, Default)]
pub struct BatchReport {
    pub skipped: Vec<SkippedDirectory>,
    pub repositories: Vec<RepoReport>,
}

impl BatchReport {
    pub fn new(skipped: Vec<SkippedDirectory>) -> Self {
        Self {
            skipped,
            repositories: Vec::new(),
        }
    }

    pub fn push(&mut self, report: RepoReport) {
        self.repositories.push(report);
    }

    pub fn pushed(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Pushed { .. }))
    }

    pub fn no_match(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::NoMatch))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Failed { .. }))
    }

    pub fn outcome_of(&self, name: &str) -> Option<&RepoOutcome> {
        self.repositories
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&RepoOutcome) -> bool) -> usize {
        self.repositories.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for skipped in &self.skipped {
            writeln!(f, "  - {} (skipped: {})", skipped.path.display(), skipped.reason)?;
        }
        for repo in &self.repositories {
            match &repo.outcome {
                RepoOutcome::NoMatch => writeln!(f, "  - {}: no matching files", repo.name)?,
                RepoOutcome::Failed { stage, error } => {
                    writeln!(f, "  ✗ {}: failed at {}: {}", repo.name, stage, error)?
                }
                RepoOutcome::Pushed {
                    branch,
                    files,
                    replacements,
                    review,
                } => {
                    let review = match review {
                        ReviewState::Skipped => "no pull request".to_string(),
                        ReviewState::Requested(ReviewOutcome::Created) => "pull request created".to_string(),
                        ReviewState::Requested(ReviewOutcome::Rejected { status, .. }) => {
                            format!("pull request rejected ({})", status)
                        }
                        ReviewState::Failed(e) => format!("pull request failed: {}", e),
                    };
                    writeln!(
                        f,
                        "  ✓ {}: {} file(s), {} replacement(s), pushed to {}, {}",
                        repo.name, files, replacements, branch, review
                    )?
                }
            }
        }
        write!(
            f,
            "📊 总计: {} pushed, {} no match, {} failed, {} skipped",
            self.pushed(),
            self.no_match(),
            self.failed(),
            self.skipped.len()
        )
    }
}
