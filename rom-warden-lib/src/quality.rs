//! Quality scoring: structural validity, header checks, and reference
//! status combined into a 0–100 score with a discrete tier.
//!
//! The point values are heuristic, kept in [`ScoreWeights`] as plain
//! configurable constants. Tier boundaries are the stable contract; exact
//! scores between them are not.

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use rom_warden_core::SystemProvider;
use rom_warden_dat::RefMatch;

/// Severity of a detected issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Categories of quality defects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    ZeroBytes,
    TruncatedFile,
    Unreadable,
    InvalidHeader,
    InvalidChecksum,
    SuspiciousSize,
    MetadataMissing,
    PossiblyModified,
    Unverified,
}

/// One detected defect, with enough context to act on it.
#[derive(Debug, Clone, Serialize)]
pub struct QualityIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub description: String,
    /// Offset or file region, where meaningful.
    pub location: Option<String>,
    pub recommendation: Option<String>,
}

impl QualityIssue {
    fn new(kind: IssueKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            location: None,
            recommendation: None,
        }
    }

    fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    fn advising(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// Discrete quality tiers, monotonic in score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityTier {
    Perfect,
    Good,
    Questionable,
    Damaged,
    Corrupt,
    Unknown,
}

/// Result of scoring one file.
#[derive(Debug, Clone, Serialize)]
pub struct QualityVerdict {
    /// Clamped to 0..=100.
    pub score: u8,
    pub tier: QualityTier,
    pub is_playable: bool,
    pub issues: Vec<QualityIssue>,
    /// Every check that ran, pass or fail.
    pub checks_performed: Vec<String>,
}

/// Point values and tier thresholds. Heuristic constants, not a contract.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub structural: i32,
    pub header: i32,
    pub internal_checksum: i32,
    pub reference_bonus: i32,
    pub minor_deduction: i32,
    pub tier_perfect: i32,
    pub tier_good: i32,
    pub tier_questionable: i32,
    pub tier_damaged: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            structural: 30,
            header: 30,
            internal_checksum: 20,
            reference_bonus: 20,
            minor_deduction: 5,
            tier_perfect: 95,
            tier_good: 80,
            tier_questionable: 60,
            tier_damaged: 40,
        }
    }
}

/// Inputs for scoring one catalog entry.
pub struct QualityInput<'a> {
    pub path: &'a Path,
    pub provider: Option<&'a dyn SystemProvider>,
    pub ref_match: &'a RefMatch,
    /// Whether identity extraction produced a serial or title.
    pub has_identity: bool,
}

/// Score a file. Never fails: a check that cannot run simply omits its
/// points and records a low-severity issue.
pub fn score_file(input: &QualityInput<'_>, weights: &ScoreWeights) -> QualityVerdict {
    let mut score: i32 = 0;
    let mut issues = Vec::new();
    let mut checks = vec!["file basics".to_string()];

    // Basic sanity: missing/unreadable/empty files short-circuit.
    let file_size = match std::fs::metadata(input.path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            issues.push(
                QualityIssue::new(
                    IssueKind::Unreadable,
                    Severity::Critical,
                    format!("file could not be read: {e}"),
                )
                .advising("check that the file exists and is accessible"),
            );
            return finish(0, false, issues, checks, weights);
        }
    };

    if file_size == 0 {
        issues.push(QualityIssue::new(
            IssueKind::ZeroBytes,
            Severity::Critical,
            "file is empty (0 bytes)",
        ));
        return finish(0, input.ref_match.is_verified(), issues, checks, weights);
    }

    let size_range = input.provider.map(|p| p.plausible_size());
    if let Some(range) = size_range {
        if file_size < range.min {
            issues.push(
                QualityIssue::new(
                    IssueKind::TruncatedFile,
                    Severity::Critical,
                    format!(
                        "file is {file_size} bytes, below the {} byte minimum for {}",
                        range.min,
                        input.provider.map(|p| p.short_name()).unwrap_or("?"),
                    ),
                )
                .advising("the dump is likely truncated"),
            );
            return finish(0, input.ref_match.is_verified(), issues, checks, weights);
        }
        score += weights.structural;
        if file_size > range.max {
            issues.push(QualityIssue::new(
                IssueKind::SuspiciousSize,
                Severity::Medium,
                format!(
                    "file is {file_size} bytes, above the expected maximum of {}",
                    range.max
                ),
            ));
            score -= weights.minor_deduction;
        }

        // Blank-dump check for cartridge-scale formats. Disc images
        // legitimately start with zero sectors, so skip them.
        if range.min < 16 * 1024 * 1024 {
            checks.push("blank content sample".to_string());
            if leading_sample_is_blank(input.path) {
                issues.push(
                    QualityIssue::new(
                        IssueKind::ZeroBytes,
                        Severity::High,
                        "leading content is entirely null bytes",
                    )
                    .at("first 4 KB")
                    .advising("possible blank or failed dump"),
                );
                score -= weights.structural;
            }
        }
    } else {
        // No provider: structural points cannot be assessed.
        issues.push(QualityIssue::new(
            IssueKind::MetadataMissing,
            Severity::Low,
            "no system provider; structural checks skipped",
        ));
    }

    // System-specific header validity and embedded checksum.
    if let Some(provider) = input.provider {
        checks.push("header signature".to_string());
        match open_and_check(provider, input.path, file_size) {
            Ok(report) => {
                if report.signature_ok {
                    score += weights.header;
                } else {
                    issues.push(
                        QualityIssue::new(
                            IssueKind::InvalidHeader,
                            Severity::High,
                            format!(
                                "{} header signature not found",
                                provider.short_name()
                            ),
                        )
                        .advising("the file may be corrupt or misclassified"),
                    );
                    score -= weights.header;
                }

                if let Some(check) = report.embedded_checksum {
                    checks.push(format!("embedded {} checksum", check.kind.name()));
                    if check.matches() {
                        score += weights.internal_checksum;
                    } else {
                        issues.push(
                            QualityIssue::new(
                                IssueKind::InvalidChecksum,
                                Severity::High,
                                format!(
                                    "embedded {} checksum invalid (expected {:#x}, computed {:#x})",
                                    check.kind.name(),
                                    check.expected,
                                    check.actual
                                ),
                            )
                            .advising("header corrupt or content modified"),
                        );
                        score -= weights.internal_checksum;
                    }
                }
            }
            Err(e) => {
                // The check could not run: omit its points, record why.
                issues.push(QualityIssue::new(
                    IssueKind::MetadataMissing,
                    Severity::Low,
                    format!("header check could not run: {e}"),
                ));
            }
        }
    }

    // Reference-database status.
    checks.push("reference match".to_string());
    match input.ref_match {
        RefMatch::Verified { .. } => score += weights.reference_bonus,
        RefMatch::Mismatch { expected } => {
            issues.push(
                QualityIssue::new(
                    IssueKind::PossiblyModified,
                    Severity::Medium,
                    format!(
                        "fast checksum matches '{expected}' but cryptographic hash differs"
                    ),
                )
                .advising("the file may be modified or partially corrupt"),
            );
        }
        RefMatch::Unknown => {
            issues.push(QualityIssue::new(
                IssueKind::Unverified,
                Severity::Low,
                "no reference entry matches this file",
            ));
        }
    }

    if !input.has_identity {
        issues.push(QualityIssue::new(
            IssueKind::MetadataMissing,
            Severity::Low,
            "no serial or title could be extracted",
        ));
        score -= weights.minor_deduction;
    }

    finish(score, input.ref_match.is_verified(), issues, checks, weights)
}

fn finish(
    score: i32,
    verified: bool,
    issues: Vec<QualityIssue>,
    checks_performed: Vec<String>,
    weights: &ScoreWeights,
) -> QualityVerdict {
    let score = score.clamp(0, 100);
    let tier = tier_for(score, verified, weights);
    QualityVerdict {
        score: score as u8,
        tier,
        is_playable: matches!(
            tier,
            QualityTier::Perfect | QualityTier::Good | QualityTier::Questionable
        ),
        issues,
        checks_performed,
    }
}

/// Monotonic tier mapping. Perfect additionally requires verification.
fn tier_for(score: i32, verified: bool, weights: &ScoreWeights) -> QualityTier {
    if score >= weights.tier_perfect && verified {
        QualityTier::Perfect
    } else if score >= weights.tier_good {
        QualityTier::Good
    } else if score >= weights.tier_questionable {
        QualityTier::Questionable
    } else if score >= weights.tier_damaged {
        QualityTier::Damaged
    } else {
        QualityTier::Corrupt
    }
}

fn open_and_check(
    provider: &dyn SystemProvider,
    path: &Path,
    file_size: u64,
) -> Result<rom_warden_core::HeaderReport, rom_warden_core::IdentityError> {
    let mut file = std::fs::File::open(path)?;
    provider.header_check(&mut file, file_size)
}

/// True if the first 4 KB (or the whole file, if smaller) is all zeros.
fn leading_sample_is_blank(path: &Path) -> bool {
    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut buf = [0u8; 4096];
    match file.read(&mut buf) {
        Ok(n) if n > 0 => buf[..n].iter().all(|&b| b == 0),
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/quality_tests.rs"]
mod tests;
