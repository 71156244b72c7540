//! `make-manifest`: generate a pkg `+MANIFEST` from a template and an
//! install root.
//!
//! stdout carries only the finished manifest; logs go to stderr.
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

mod abi;
mod cli;
mod manifest;
mod scan;

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    init_tracing(args.verbose);
    run(&args)
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run(args: &cli::RootArgs) -> Result<()> {
    let pkg_command = abi::PkgCommand::parse(&args.pkg_command)?;
    let manifest = manifest::generate(&manifest::GenerateArgs {
        source_manifest: &args.source_manifest,
        install_root: &args.root,
        owner: args.owner(),
        group: args.group(),
        pkg_command: &pkg_command,
    })?;

    // Render fully before touching stdout so failures never leave a partial
    // manifest behind.
    let text = manifest::render_manifest(&manifest, args.pretty)?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .context("write manifest to stdout")?;
    Ok(())
}
