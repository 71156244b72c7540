//! CLI argument parsing for manifest generation.
//!
//! Flags mirror the packaging scripts that call this tool, so existing
//! `make-manifest --root ... --uid ...` invocations keep working.
use clap::Parser;
use std::path::PathBuf;

/// Default template file, relative to the working directory.
pub const DEFAULT_SOURCE_MANIFEST: &str = "manifest.source";

/// Default staging directory produced by `make install DESTDIR=...`.
pub const DEFAULT_INSTALL_ROOT: &str = "install-root";

/// Default package tool invocation used to discover the ABI string.
pub const DEFAULT_PKG_COMMAND: &str = "pkg -vv";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "make-manifest",
    version,
    about = "Generates MANIFEST for pkg.",
    after_help = "Examples:\n  make-manifest > +MANIFEST\n  make-manifest --source-manifest manifest.source --root /tmp/stage --uid root --gid wheel\n  make-manifest --uid '' --gid ''   # keep numeric owner ids from the install root"
)]
pub struct RootArgs {
    /// Source MANIFEST template (JSON object)
    #[arg(
        long,
        value_name = "PATH",
        env = "PKG_MANIFEST_SOURCE",
        default_value = DEFAULT_SOURCE_MANIFEST
    )]
    pub source_manifest: PathBuf,

    /// `make install`ed DESTDIR to scan
    #[arg(
        long,
        value_name = "DIR",
        env = "PKG_MANIFEST_ROOT",
        default_value = DEFAULT_INSTALL_ROOT
    )]
    pub root: PathBuf,

    /// Owner recorded for installed files; empty keeps the numeric uid
    #[arg(long, value_name = "NAME", default_value = "root")]
    pub uid: String,

    /// Group recorded for installed files; empty keeps the numeric gid
    #[arg(long, value_name = "NAME", default_value = "wheel")]
    pub gid: String,

    /// Package tool command whose verbose output carries the ABI line
    #[arg(
        long,
        value_name = "CMD",
        env = "PKG_MANIFEST_PKG_COMMAND",
        default_value = DEFAULT_PKG_COMMAND
    )]
    pub pkg_command: String,

    /// Pretty-print the manifest JSON
    #[arg(long)]
    pub pretty: bool,

    /// Emit debug logging on stderr
    #[arg(long)]
    pub verbose: bool,
}

impl RootArgs {
    /// Owner override, or `None` when the caller asked for numeric ids.
    pub fn owner(&self) -> Option<&str> {
        non_empty(&self.uid)
    }

    /// Group override, or `None` when the caller asked for numeric ids.
    pub fn group(&self) -> Option<&str> {
        non_empty(&self.gid)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
