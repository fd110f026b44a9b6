//! Streaming checksum engine.
//!
//! Computes the fast crc32 plus any requested cryptographic digests in a
//! single pass over 64 KB chunks — the file is never loaded whole. Known
//! container formats can be routed through an external decompression tool
//! before hashing.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use sha1::Digest;

use rom_warden_dat::FileDigests;

use crate::error::ToolError;
use crate::retry::{retry_io, RetryPolicy};

const CHUNK_SIZE: usize = 64 * 1024;

/// Which digests to compute. The empty selection is valid and yields an
/// empty digest set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashAlgorithms {
    pub crc32: bool,
    pub sha1: bool,
    pub md5: bool,
    pub sha256: bool,
}

impl HashAlgorithms {
    /// Nothing requested.
    pub const NONE: Self = Self {
        crc32: false,
        sha1: false,
        md5: false,
        sha256: false,
    };

    /// Default scan mode: fast checksum + one cryptographic hash.
    pub const STANDARD: Self = Self {
        crc32: true,
        sha1: true,
        md5: false,
        sha256: false,
    };

    /// Deep-verify mode: every supported digest.
    pub const DEEP: Self = Self {
        crc32: true,
        sha1: true,
        md5: true,
        sha256: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.crc32 || self.sha1 || self.md5 || self.sha256)
    }
}

/// Compute the requested digests over a stream in one pass.
pub fn compute_digests(
    reader: &mut dyn Read,
    algorithms: HashAlgorithms,
) -> std::io::Result<FileDigests> {
    let mut digests = FileDigests::default();
    if algorithms.is_empty() {
        return Ok(digests);
    }

    let mut crc = algorithms.crc32.then(crc32fast::Hasher::new);
    let mut sha1 = algorithms.sha1.then(sha1::Sha1::new);
    let mut md5 = algorithms.md5.then(md5::Context::new);
    let mut sha256 = algorithms.sha256.then(sha2::Sha256::new);

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        total += n as u64;
        let chunk = &buf[..n];
        if let Some(ref mut h) = crc {
            h.update(chunk);
        }
        if let Some(ref mut h) = sha1 {
            h.update(chunk);
        }
        if let Some(ref mut h) = md5 {
            h.consume(chunk);
        }
        if let Some(ref mut h) = sha256 {
            h.update(chunk);
        }
    }

    digests.data_size = total;
    digests.crc32 = crc.map(|h| format!("{:08x}", h.finalize()));
    digests.sha1 = sha1.map(|h| format!("{:x}", h.finalize()));
    digests.md5 = md5.map(|h| format!("{:x}", h.compute()));
    digests.sha256 = sha256.map(|h| format!("{:x}", h.finalize()));
    Ok(digests)
}

/// Compute digests for a file, retrying per the policy.
///
/// Returns `Err` only after the last attempt fails; the caller treats the
/// file as un-hashable for this pass (not corrupt) and records the error.
pub fn digest_file(
    path: &Path,
    algorithms: HashAlgorithms,
    retry: &RetryPolicy,
) -> std::io::Result<FileDigests> {
    retry_io(retry, &format!("hash {}", path.display()), || {
        let mut file = std::fs::File::open(path)?;
        compute_digests(&mut file, algorithms)
    })
}

/// Compute digests for a file, optionally decompressing a known container
/// first via the external tool seam.
pub fn digest_file_with_tool(
    path: &Path,
    algorithms: HashAlgorithms,
    retry: &RetryPolicy,
    tool: Option<&dyn ContainerTool>,
) -> Result<FileDigests, ToolError> {
    if let Some(tool) = tool {
        if tool.can_extract(path) {
            let mut stream = tool.extract(path)?;
            return compute_digests(&mut stream, algorithms).map_err(ToolError::Spawn);
        }
    }
    digest_file(path, algorithms, retry).map_err(ToolError::Spawn)
}

// ── External decompressor seam ──────────────────────────────────────────────

/// External collaborator that turns a compressed container into a readable
/// byte stream. Tool absence or failure is a catalogued per-file error,
/// never fatal to a run.
pub trait ContainerTool: Send + Sync {
    /// Whether this tool handles the file's container format.
    fn can_extract(&self, path: &Path) -> bool;

    /// Produce a stream of the decompressed content.
    fn extract(&self, path: &Path) -> Result<Box<dyn Read + Send>, ToolError>;
}

/// Shells out to a converter binary (chdman-style) that writes the
/// decompressed image to stdout.
pub struct CommandContainerTool {
    program: String,
    /// Extensions (lowercase, no dot) this tool handles.
    extensions: Vec<String>,
    /// Arguments before the input path.
    args: Vec<String>,
}

impl CommandContainerTool {
    pub fn new(
        program: impl Into<String>,
        extensions: &[&str],
        args: &[&str],
    ) -> Self {
        Self {
            program: program.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Locate the program in PATH.
    fn resolve(&self) -> Result<std::path::PathBuf, ToolError> {
        let path_var = std::env::var_os("PATH").unwrap_or_default();
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(&self.program);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(ToolError::NotFound(self.program.clone()))
    }
}

impl ContainerTool for CommandContainerTool {
    fn can_extract(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    fn extract(&self, path: &Path) -> Result<Box<dyn Read + Send>, ToolError> {
        let program = self.resolve()?;
        let mut child = Command::new(program)
            .args(&self.args)
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Spawn(std::io::Error::other("no stdout pipe")))?;
        Ok(Box::new(stdout))
    }
}

#[cfg(test)]
#[path = "tests/hasher_tests.rs"]
mod tests;
