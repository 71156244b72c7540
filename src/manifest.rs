//! Manifest template loading and merge.
//!
//! The template is passed through untouched except for the `abi` and `files`
//! keys, which are always overwritten with freshly computed values.
use crate::abi::{self, PkgCommand};
use crate::scan::{self, FileEntries};
use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const ABI_KEY: &str = "abi";
pub const FILES_KEY: &str = "files";

/// Manifest document: template keys plus `abi` and `files`.
pub type Manifest = Map<String, Value>;

/// Inputs for a single manifest generation run.
pub struct GenerateArgs<'a> {
    pub source_manifest: &'a Path,
    pub install_root: &'a Path,
    pub owner: Option<&'a str>,
    pub group: Option<&'a str>,
    pub pkg_command: &'a PkgCommand,
}

/// Load a template document, which must be a JSON object.
pub fn load_template(path: &Path) -> Result<Manifest> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_template(&text).with_context(|| format!("parse {}", path.display()))
}

fn parse_template(text: &str) -> Result<Manifest> {
    match serde_json::from_str::<Value>(text).context("invalid JSON")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!(
            "manifest template must be a JSON object, found {}",
            json_kind(&other)
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Merge the ABI and file entries into the template.
pub fn build_manifest(
    mut template: Manifest,
    abi: Option<String>,
    files: FileEntries,
) -> Result<Manifest> {
    let files = serde_json::to_value(files).context("serialize file entries")?;
    template.insert(ABI_KEY.to_string(), abi.map_or(Value::Null, Value::String));
    template.insert(FILES_KEY.to_string(), files);
    Ok(template)
}

/// Load the template, resolve the ABI, scan the install root and merge.
///
/// Steps run in that order and the first failure aborts the run.
pub fn generate(args: &GenerateArgs<'_>) -> Result<Manifest> {
    let template = load_template(args.source_manifest)?;
    tracing::debug!(
        source = %args.source_manifest.display(),
        keys = template.len(),
        "loaded manifest template"
    );
    let abi = abi::resolve_abi(args.pkg_command)?;
    let files = scan::scan_tree(args.install_root, args.owner, args.group)?;
    tracing::info!(
        root = %args.install_root.display(),
        entry_count = files.len(),
        "collected install root entries"
    );
    build_manifest(template, abi, files)
}

/// Serialize a manifest, newline-terminated, ready for a single write.
pub fn render_manifest(manifest: &Manifest, pretty: bool) -> Result<String> {
    let mut text = if pretty {
        serde_json::to_string_pretty(manifest)
    } else {
        serde_json::to_string(manifest)
    }
    .context("serialize manifest")?;
    text.push('\n');
    Ok(text)
}
