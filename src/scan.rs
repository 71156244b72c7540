//! Install-root scanning into manifest file entries.
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

/// Permission bits with the file-type bits stripped (`S_IMODE`).
const PERMISSION_MASK: u32 = 0o7777;

/// Owner or group of an entry: an override name, or the numeric id on disk.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Principal {
    Name(String),
    Id(u32),
}

impl Principal {
    fn resolve(name: Option<&str>, id: u32) -> Self {
        match name {
            Some(name) if !name.is_empty() => Principal::Name(name.to_string()),
            _ => Principal::Id(id),
        }
    }
}

/// Ownership and permission record for one filesystem object.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub uname: Principal,
    pub gname: Principal,
    pub perm: String,
}

impl FileEntry {
    fn from_metadata(meta: &Metadata, owner: Option<&str>, group: Option<&str>) -> Self {
        Self {
            uname: Principal::resolve(owner, meta.uid()),
            gname: Principal::resolve(group, meta.gid()),
            perm: format_perm(meta.mode()),
        }
    }
}

/// Normalized relative path -> entry.
pub type FileEntries = BTreeMap<String, FileEntry>;

/// Render permission bits as a `0`-prefixed octal string (`0o644` -> `"0644"`).
pub fn format_perm(mode: u32) -> String {
    let bits = mode & PERMISSION_MASK;
    if bits == 0 {
        "0".to_string()
    } else {
        format!("0{bits:o}")
    }
}

/// Key a relative path the way pkg manifests expect.
///
/// `./name` loses its leading `.`, anything else gains a leading `/`.
/// The bare root marker `.` becomes `/` rather than the literal `/.`; the
/// walk never yields the root itself, so no manifest key depends on it.
pub fn normalize_rel_path(rel_path: &str) -> String {
    if rel_path == "." {
        "/".to_string()
    } else if let Some(stripped) = rel_path.strip_prefix('.').filter(|s| s.starts_with('/')) {
        stripped.to_string()
    } else if rel_path.starts_with('/') {
        rel_path.to_string()
    } else {
        format!("/{rel_path}")
    }
}

/// Walk `root` and record every file and directory below it.
///
/// Symlinks are described, not followed. Any walk or metadata error aborts
/// the scan.
pub fn scan_tree(root: &Path, owner: Option<&str>, group: Option<&str>) -> Result<FileEntries> {
    if !root.is_dir() {
        return Err(anyhow!("install root {} is not a directory", root.display()));
    }

    let start = Instant::now();
    let mut entries = FileEntries::new();

    // Entries come back pre-order: a directory is recorded before its
    // children, using its own lstat information.
    for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = entry.with_context(|| format!("scan {}", root.display()))?;
        let rel_path = relative_entry_path(root, entry.path())?;
        let meta = entry
            .metadata()
            .with_context(|| format!("inspect {}", entry.path().display()))?;
        let key = normalize_rel_path(&rel_path);
        tracing::trace!(path = %key, "manifest entry");
        entries.insert(key, FileEntry::from_metadata(&meta, owner, group));
    }

    tracing::debug!(
        root = %root.display(),
        entry_count = entries.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "scanned install root"
    );
    Ok(entries)
}

/// Relative path of `path` under `root`, joined as `<parent>/<name>` with
/// `.` standing in for the top-level parent.
fn relative_entry_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("strip scan root from {}", path.display()))?;
    let rel = rel
        .to_str()
        .ok_or_else(|| anyhow!("path is not valid UTF-8: {}", path.display()))?;
    let parent = match Path::new(rel).parent().and_then(Path::to_str) {
        Some(parent) if !parent.is_empty() => parent,
        _ => ".",
    };
    let name = Path::new(rel)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("path has no file name: {}", path.display()))?;
    Ok(format!("{parent}/{name}"))
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
