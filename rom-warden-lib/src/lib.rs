//! Collection management engines: scanning, hashing, quality scoring, and
//! duplicate detection over the catalog store.
//!
//! Everything here takes its catalog connection, provider registry, and
//! configuration as explicit arguments — there is no ambient session
//! state. The per-system providers live in `rom-warden-systems`, the
//! reference index in `rom-warden-dat`, and persistence in
//! `rom-warden-db`.

pub mod cancel;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod hasher;
pub mod quality;
pub mod report;
pub mod retry;
pub mod scanner;
pub mod settings;
pub mod worker_pool;

pub use cancel::CancelToken;
pub use dedup::{find_all_duplicates, DedupOptions, DuplicateGroup, DuplicateType};
pub use error::{ScanError, ToolError};
pub use extract::{extract_identity, filename_identity};
pub use hasher::{
    compute_digests, digest_file, digest_file_with_tool, CommandContainerTool, ContainerTool,
    HashAlgorithms,
};
pub use quality::{
    score_file, IssueKind, QualityInput, QualityIssue, QualityTier, QualityVerdict, ScoreWeights,
    Severity,
};
pub use report::{
    duplicate_report, scan_report, write_csv, write_json, DuplicateReportRow, ScanReportRow,
};
pub use retry::{retry_io, RetryPolicy};
pub use scanner::{ScanOptions, ScanSummary, Scanner};
pub use worker_pool::WorkerPool;
