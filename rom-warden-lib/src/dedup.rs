//! Duplicate detection over catalog entries.
//!
//! Four independent passes at decreasing strictness: identical bytes
//! (hash), same game across regions, same game across versions, and
//! fuzzy name similarity. Each pass produces its own groups, so one entry
//! can appear in groups of different types. The detector only reports —
//! deleting or moving files is an explicit action outside this module.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use rom_warden_core::filename::{
    normalize_name, parse_file_name, strip_region_tags, strip_version_tags, version_number,
};
use rom_warden_core::Region;
use rom_warden_db::{CatalogEntry, EntryStatus, HashKind};

use crate::cancel::CancelToken;

/// How a group was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DuplicateType {
    Exact,
    CrossRegion,
    Version,
    Fuzzy,
}

impl DuplicateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::CrossRegion => "cross_region",
            Self::Version => "version",
            Self::Fuzzy => "fuzzy",
        }
    }
}

/// A set of entries judged to be the same game.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub duplicate_type: DuplicateType,
    /// Grouping key: the shared hash or normalized name.
    pub key: String,
    /// At least two entries, all on the same system.
    pub entries: Vec<CatalogEntry>,
    /// Path of the entry recommended to keep — always one of `entries`.
    pub recommended_keep: String,
    /// Bytes reclaimable if everything but the keeper were removed.
    pub space_savings: u64,
    /// Human-readable justification for the recommendation.
    pub reason: String,
}

/// Tunables for detection and the keep recommendation.
#[derive(Debug, Clone)]
pub struct DedupOptions {
    /// Similarity floor for the fuzzy pass, 0..=1.
    pub fuzzy_threshold: f64,
    /// Relative size tolerance for name-based grouping (0.10 = 10%).
    pub size_tolerance: f64,
    /// Regions in descending preference order.
    pub region_priority: Vec<Region>,
    /// Hash columns tried in order for the exact pass.
    pub hash_preference: Vec<HashKind>,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.85,
            size_tolerance: 0.10,
            region_priority: vec![
                Region::World,
                Region::Usa,
                Region::Europe,
                Region::Japan,
                Region::Asia,
                Region::Australia,
                Region::Korea,
                Region::Brazil,
                Region::China,
            ],
            hash_preference: vec![HashKind::Sha1, HashKind::Sha256, HashKind::Md5, HashKind::Crc32],
        }
    }
}

/// Run all four passes. Cancellation is honored at entry/comparison
/// boundaries; groups found before the signal are returned.
pub fn find_all_duplicates(
    entries: &[CatalogEntry],
    options: &DedupOptions,
    cancel: &CancelToken,
) -> Vec<DuplicateGroup> {
    let mut groups = Vec::new();
    groups.extend(find_exact(entries, options, cancel));
    if !cancel.is_cancelled() {
        groups.extend(find_name_based(entries, options, cancel, DuplicateType::CrossRegion));
    }
    if !cancel.is_cancelled() {
        groups.extend(find_name_based(entries, options, cancel, DuplicateType::Version));
    }
    if !cancel.is_cancelled() {
        groups.extend(find_fuzzy(entries, options, cancel));
    }
    groups
}

// ── Pass 1: exact (hash) ────────────────────────────────────────────────────

fn hash_of(entry: &CatalogEntry, kind: HashKind) -> Option<&str> {
    match kind {
        HashKind::Crc32 => entry.crc32.as_deref(),
        HashKind::Md5 => entry.md5.as_deref(),
        HashKind::Sha1 => entry.sha1.as_deref(),
        HashKind::Sha256 => entry.sha256.as_deref(),
    }
}

/// Group entries sharing an identical digest. The first hash kind an
/// entry pair has in common decides the group; entries without any hash
/// are excluded, not errors.
pub fn find_exact(
    entries: &[CatalogEntry],
    options: &DedupOptions,
    cancel: &CancelToken,
) -> Vec<DuplicateGroup> {
    let mut groups = Vec::new();
    let mut grouped: HashSet<&str> = HashSet::new();

    for &kind in &options.hash_preference {
        let mut by_hash: BTreeMap<(&str, &str), Vec<&CatalogEntry>> = BTreeMap::new();
        for entry in entries {
            if cancel.is_cancelled() {
                return groups;
            }
            if grouped.contains(entry.path.as_str()) {
                continue;
            }
            if let Some(value) = hash_of(entry, kind) {
                by_hash
                    .entry((entry.system.as_str(), value))
                    .or_default()
                    .push(entry);
            }
        }

        for ((_system, value), members) in by_hash {
            if members.len() < 2 {
                continue;
            }
            for member in &members {
                grouped.insert(member.path.as_str());
            }
            groups.push(build_group(
                DuplicateType::Exact,
                value.to_string(),
                members.into_iter().cloned().collect(),
                options,
            ));
        }
    }

    groups
}

// ── Passes 2 & 3: cross-region and version ──────────────────────────────────

/// The token that must differ for a name-based group to be meaningful:
/// region tags for the cross-region pass, version tags for the version
/// pass.
fn distinguishing_token(entry: &CatalogEntry, pass: DuplicateType) -> Option<String> {
    let parsed = parse_file_name(entry.display_name());
    match pass {
        DuplicateType::CrossRegion => parsed.regions.first().map(|r| r.name().to_string()),
        DuplicateType::Version => parsed.version.or(parsed.revision),
        _ => None,
    }
}

fn name_key(entry: &CatalogEntry, pass: DuplicateType) -> Option<String> {
    let stripped = match pass {
        DuplicateType::CrossRegion => strip_region_tags(entry.display_name()),
        DuplicateType::Version => strip_version_tags(entry.display_name()),
        _ => return None,
    };
    let normalized = normalize_name(&stripped);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn find_name_based(
    entries: &[CatalogEntry],
    options: &DedupOptions,
    cancel: &CancelToken,
    pass: DuplicateType,
) -> Vec<DuplicateGroup> {
    let mut by_key: BTreeMap<(String, String), Vec<&CatalogEntry>> = BTreeMap::new();
    for entry in entries {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        if let Some(key) = name_key(entry, pass) {
            by_key
                .entry((entry.system.clone(), key))
                .or_default()
                .push(entry);
        }
    }

    let mut groups = Vec::new();
    for ((_system, key), members) in by_key {
        if members.len() < 2 || !sizes_within_tolerance(&members, options.size_tolerance) {
            continue;
        }

        // Require at least two distinct region/version tokens: equal names
        // with the same token are not this kind of duplicate.
        let tokens: HashSet<String> = members
            .iter()
            .filter_map(|e| distinguishing_token(e, pass))
            .collect();
        if tokens.len() < 2 {
            continue;
        }

        groups.push(build_group(
            pass,
            key,
            members.into_iter().cloned().collect(),
            options,
        ));
    }
    groups
}

/// Largest-to-smallest size spread must stay inside the tolerance. Guards
/// against conflating unrelated games that share a stripped name.
fn sizes_within_tolerance(entries: &[&CatalogEntry], tolerance: f64) -> bool {
    let max = entries.iter().map(|e| e.size).max().unwrap_or(0);
    let min = entries.iter().map(|e| e.size).min().unwrap_or(0);
    if max == 0 {
        return true;
    }
    (max - min) as f64 / max as f64 <= tolerance
}

// ── Pass 4: fuzzy ───────────────────────────────────────────────────────────

/// Pairwise similarity over cleaned names within a system. O(n²) per
/// system; comparisons are skipped once a pair is already grouped
/// together in this pass.
pub fn find_fuzzy(
    entries: &[CatalogEntry],
    options: &DedupOptions,
    cancel: &CancelToken,
) -> Vec<DuplicateGroup> {
    let mut by_system: HashMap<&str, Vec<&CatalogEntry>> = HashMap::new();
    for entry in entries {
        by_system.entry(entry.system.as_str()).or_default().push(entry);
    }

    let mut groups = Vec::new();
    for members in by_system.into_values() {
        let normalized: Vec<(String, &CatalogEntry)> = members
            .iter()
            .filter_map(|e| {
                let name = normalize_name(e.display_name());
                (!name.is_empty()).then_some((name, *e))
            })
            .collect();

        let mut taken: HashSet<&str> = HashSet::new();
        for i in 0..normalized.len() {
            if taken.contains(normalized[i].1.path.as_str()) {
                continue;
            }
            let mut matched: Vec<&CatalogEntry> = vec![normalized[i].1];

            for (name_j, entry_j) in normalized.iter().skip(i + 1) {
                if cancel.is_cancelled() {
                    return groups;
                }
                if taken.contains(entry_j.path.as_str()) {
                    continue;
                }
                let similarity =
                    strsim::normalized_levenshtein(&normalized[i].0, name_j);
                if similarity >= options.fuzzy_threshold
                    && sizes_within_tolerance(
                        &[normalized[i].1, entry_j],
                        options.size_tolerance,
                    )
                {
                    matched.push(entry_j);
                    taken.insert(entry_j.path.as_str());
                }
            }

            if matched.len() > 1 {
                taken.insert(normalized[i].1.path.as_str());
                groups.push(build_group(
                    DuplicateType::Fuzzy,
                    normalized[i].0.clone(),
                    matched.into_iter().cloned().collect(),
                    options,
                ));
            }
        }
    }
    groups
}

// ── Keep recommendation ─────────────────────────────────────────────────────

struct KeepScore {
    total: f64,
    factors: Vec<String>,
}

/// Score one entry for the keep recommendation.
fn keep_score(entry: &CatalogEntry, max_size: u64, options: &DedupOptions) -> KeepScore {
    let mut total = 0.0;
    let mut factors = Vec::new();

    if entry.status == EntryStatus::Verified {
        total += 100.0;
        factors.push("verified".to_string());
    }

    let parsed = parse_file_name(entry.display_name());
    if let Some(region) = parsed.regions.first() {
        if let Some(rank) = options.region_priority.iter().position(|r| r == region) {
            let len = options.region_priority.len() as f64;
            total += (len - rank as f64) / len * 100.0;
            factors.push(format!("preferred region {}", region.name()));
        }
    }

    if let Some(version) = parsed.version.or(parsed.revision) {
        if let Some(number) = version_number(&version) {
            total += (number * 5.0).min(50.0);
            factors.push(format!("latest version ({version})"));
        }
    }

    if max_size > 0 {
        total += entry.size as f64 / max_size as f64 * 10.0;
        if entry.size == max_size {
            factors.push("largest file".to_string());
        }
    }

    KeepScore { total, factors }
}

fn build_group(
    duplicate_type: DuplicateType,
    key: String,
    entries: Vec<CatalogEntry>,
    options: &DedupOptions,
) -> DuplicateGroup {
    let max_size = entries.iter().map(|e| e.size).max().unwrap_or(0);

    // Highest total wins; ties break to the larger file, then the
    // lexically first path.
    let mut best_index = 0;
    let mut best_score = f64::MIN;
    let mut best_factors = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let scored = keep_score(entry, max_size, options);
        let better = scored.total > best_score
            || (scored.total == best_score && {
                let best = &entries[best_index];
                entry.size > best.size
                    || (entry.size == best.size && entry.path < best.path)
            });
        if better {
            best_index = i;
            best_score = scored.total;
            best_factors = scored.factors;
        }
    }

    let keeper = &entries[best_index];
    let space_savings = entries
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != best_index)
        .map(|(_, e)| e.size)
        .sum();

    let reason = if best_factors.is_empty() {
        "kept: manual review recommended".to_string()
    } else {
        format!("kept: {}", best_factors.join(" + "))
    };

    DuplicateGroup {
        duplicate_type,
        key,
        recommended_keep: keeper.path.clone(),
        space_savings,
        reason,
        entries,
    }
}

#[cfg(test)]
#[path = "tests/dedup_tests.rs"]
mod tests;
