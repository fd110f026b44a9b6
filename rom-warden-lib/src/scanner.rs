//! Library scan orchestration.
//!
//! Walks a directory tree and runs the per-file pipeline — classify →
//! extract → hash → reference match — on a worker pool, funneling results
//! to this task, which is the single writer into the catalog store.
//! Per-file failures are counted and logged, never fatal to the run.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use rom_warden_core::{Platform, ProviderRegistry};
use rom_warden_dat::{RefMatch, ReferenceIndex};
use rom_warden_db::{
    log_action, query_entries, remove_entry, upsert_batch, ActionKind, CatalogEntry, Connection,
    EntryFilter, EntryStatus,
};

use crate::cancel::CancelToken;
use crate::error::ScanError;
use crate::extract::extract_identity;
use crate::hasher::{digest_file_with_tool, ContainerTool, HashAlgorithms};
use crate::retry::RetryPolicy;
use crate::worker_pool::WorkerPool;

/// Options controlling a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Worker count; 0 uses available parallelism.
    pub workers: usize,
    /// Compute all supported digests instead of crc32 + sha1.
    pub deep_verify: bool,
    /// Route known container formats through the external tool before
    /// hashing.
    pub decompress_containers: bool,
    /// Entries per catalog transaction.
    pub batch_size: usize,
    pub retry: RetryPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            deep_verify: false,
            decompress_containers: false,
            batch_size: 100,
            retry: RetryPolicy::default(),
        }
    }
}

/// Counters returned from every scan, including cancelled and partially
/// failed ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Files considered.
    pub scanned: u64,
    /// New catalog entries.
    pub added: u64,
    /// Entries refreshed in place.
    pub updated: u64,
    /// Entries pruned because the path no longer exists.
    pub removed: u64,
    /// Files skipped (unknown extension, or unchanged since last scan).
    pub skipped: u64,
    /// Files whose pipeline failed; each is logged with its cause.
    pub failed: u64,
    /// Entries that matched a reference exactly.
    pub verified: u64,
}

/// Per-file pipeline outcome, funneled back to the scan driver.
enum Outcome {
    Entry {
        entry: CatalogEntry,
        was_new: bool,
    },
    Unchanged,
    Skipped {
        path: PathBuf,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

/// The scan engine. Holds the provider registry and per-system reference
/// indexes, both read-only and shared across workers.
pub struct Scanner {
    registry: Arc<ProviderRegistry>,
    references: Arc<HashMap<Platform, ReferenceIndex>>,
    container_tool: Option<Arc<dyn ContainerTool>>,
    options: ScanOptions,
}

impl Scanner {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        references: HashMap<Platform, ReferenceIndex>,
        options: ScanOptions,
    ) -> Self {
        Self {
            registry,
            references: Arc::new(references),
            container_tool: None,
            options,
        }
    }

    /// Attach the external decompressor used when
    /// [`ScanOptions::decompress_containers`] is set.
    pub fn with_container_tool(mut self, tool: Arc<dyn ContainerTool>) -> Self {
        self.container_tool = Some(tool);
        self
    }

    /// Scan a directory tree into the catalog.
    ///
    /// The root is validated before any work begins. Results are committed
    /// in batches; cancellation stops scheduling but keeps committed rows.
    pub async fn scan_library(
        &self,
        conn: &mut Connection,
        root: &Path,
        cancel: &CancelToken,
    ) -> Result<ScanSummary, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::InvalidRoot(root.to_path_buf()));
        }

        let existing: HashMap<String, CatalogEntry> =
            query_entries(conn, &EntryFilter::default())?
                .into_iter()
                .map(|e| (e.path.clone(), e))
                .collect();
        let existing = Arc::new(existing);

        let files = collect_files(root)?;
        let mut summary = ScanSummary {
            scanned: files.len() as u64,
            ..Default::default()
        };

        let workers = if self.options.workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.options.workers
        };

        let registry = self.registry.clone();
        let references = self.references.clone();
        let tool = self.container_tool.clone();
        let options = self.options.clone();
        let existing_for_workers = existing.clone();

        let mut pool = WorkerPool::start(workers, files, cancel.clone(), move |path| {
            let registry = registry.clone();
            let references = references.clone();
            let tool = tool.clone();
            let options = options.clone();
            let existing = existing_for_workers.clone();
            async move {
                let blocking = tokio::task::spawn_blocking(move || {
                    process_file(
                        &path,
                        &registry,
                        &references,
                        tool.as_deref(),
                        &options,
                        &existing,
                    )
                })
                .await;
                blocking.unwrap_or_else(|e| Outcome::Failed {
                    path: PathBuf::new(),
                    error: format!("worker panicked: {e}"),
                })
            }
        });

        let mut batch: Vec<CatalogEntry> = Vec::with_capacity(self.options.batch_size);
        let mut seen: HashSet<String> = HashSet::new();

        while let Some(outcome) = pool.recv().await {
            match outcome {
                Outcome::Entry { entry, was_new } => {
                    if was_new {
                        summary.added += 1;
                    } else {
                        summary.updated += 1;
                    }
                    if entry.status == EntryStatus::Verified {
                        summary.verified += 1;
                    }
                    seen.insert(entry.path.clone());
                    batch.push(entry);
                    if batch.len() >= self.options.batch_size {
                        upsert_batch(conn, &batch)?;
                        batch.clear();
                    }
                }
                Outcome::Unchanged => {
                    summary.skipped += 1;
                }
                Outcome::Skipped { path } => {
                    summary.skipped += 1;
                    seen.insert(path.to_string_lossy().into_owned());
                }
                Outcome::Failed { path, error } => {
                    summary.failed += 1;
                    log::error!("scan failed for {}: {error}", path.display());
                    log_action(
                        conn,
                        &path.to_string_lossy(),
                        ActionKind::Error,
                        Some(&error),
                    )?;
                }
            }
        }

        if !batch.is_empty() {
            upsert_batch(conn, &batch)?;
        }

        // Prune entries whose files are gone. Skipped under cancellation:
        // an interrupted walk can't distinguish "missing" from "unvisited".
        if !cancel.is_cancelled() {
            // Unchanged files were never re-examined; they still exist.
            for path in existing.keys() {
                if !seen.contains(path) && !Path::new(path).exists() {
                    remove_entry(conn, path)?;
                    log_action(conn, path, ActionKind::Pruned, None)?;
                    summary.removed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Walk the tree collecting candidate files. Hidden and `_`-prefixed
/// names are skipped, directories are descended in sorted order.
fn collect_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut entries: Vec<std::fs::DirEntry> = std::fs::read_dir(&dir)?.flatten().collect();
        entries.sort_by_key(|e| e.path());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(absolute(&path));
            }
        }
    }

    Ok(files)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The per-file pipeline: classify, extract, hash, match. Runs on a
/// blocking worker; must never panic on malformed content.
fn process_file(
    path: &Path,
    registry: &ProviderRegistry,
    references: &HashMap<Platform, ReferenceIndex>,
    tool: Option<&dyn ContainerTool>,
    options: &ScanOptions,
    existing: &HashMap<String, CatalogEntry>,
) -> Outcome {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            return Outcome::Failed {
                path: path.to_path_buf(),
                error: format!("stat failed: {e}"),
            }
        }
    };
    let size = meta.len();
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    let classification = registry.classify(path);
    let Some(platform) = classification.platform() else {
        log::debug!("no provider claims {}", path.display());
        return Outcome::Skipped {
            path: path.to_path_buf(),
        };
    };
    let Some(provider) = registry.get(platform) else {
        return Outcome::Skipped {
            path: path.to_path_buf(),
        };
    };

    let key = path.to_string_lossy().into_owned();
    let previous = existing.get(&key);

    // Rescan detection: unchanged size+mtime means the digests are still
    // valid unless a deep verify was requested.
    if let Some(prev) = previous {
        let unchanged = prev.size == size && (prev.mtime - mtime).abs() < 1.0;
        let already_deep = prev.sha256.is_some();
        if unchanged && (!options.deep_verify || already_deep) {
            return Outcome::Unchanged;
        }
    }

    let identity = extract_identity(provider, path, size, &options.retry);

    let algorithms = if options.deep_verify {
        HashAlgorithms::DEEP
    } else {
        HashAlgorithms::STANDARD
    };
    let active_tool = if options.decompress_containers {
        tool
    } else {
        None
    };
    let digests =
        match digest_file_with_tool(path, algorithms, &options.retry, active_tool) {
            Ok(digests) => digests,
            Err(e) => {
                // Un-hashable, not corrupt: the entry keeps its previous
                // state and this pass records the failure.
                return Outcome::Failed {
                    path: path.to_path_buf(),
                    error: format!("hashing failed: {e}"),
                };
            }
        };

    let ref_match = references
        .get(&platform)
        .map(|index| index.lookup(&digests))
        .unwrap_or(RefMatch::Unknown);

    let mut entry = CatalogEntry::new(key, platform.short_name(), size, mtime);
    entry.crc32 = digests.crc32;
    entry.md5 = digests.md5;
    entry.sha1 = digests.sha1;
    entry.sha256 = digests.sha256;

    match &ref_match {
        RefMatch::Verified { name } => {
            entry.status = EntryStatus::Verified;
            entry.match_name = Some(name.clone());
        }
        RefMatch::Mismatch { expected } => {
            entry.status = EntryStatus::Mismatch;
            entry.match_name = Some(expected.clone());
        }
        RefMatch::Unknown => {}
    }

    entry.dat_name = identity.serial.clone();
    if let Some(serial) = &identity.serial {
        entry.extra.insert("serial".into(), serial.clone());
    }
    if let Some(title) = &identity.title {
        entry.extra.insert("title".into(), title.clone());
    }
    if let Some(region) = identity.regions.first() {
        entry.extra.insert("region".into(), region.name().into());
    }
    if let Some(version) = &identity.version {
        entry.extra.insert("version".into(), version.clone());
    }
    if !classification.is_confirmed() {
        entry.extra.insert("classified_by".into(), "fallback".into());
    }
    for (k, v) in identity.extra {
        entry.extra.entry(k).or_insert(v);
    }

    Outcome::Entry {
        entry,
        was_new: previous.is_none(),
    }
}

#[cfg(test)]
#[path = "tests/scanner_tests.rs"]
mod tests;
