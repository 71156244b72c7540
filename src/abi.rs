//! ABI discovery via the package tool's verbose diagnostics.
//!
//! `pkg -vv` dumps its effective configuration, including a line such as
//! `ABI = "FreeBSD:13:amd64";`. Parsing is kept separate from process
//! execution so it can be tested without a real `pkg` on the host.
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Instant;

/// Argv for the package tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgCommand {
    argv: Vec<String>,
}

impl PkgCommand {
    /// Parse a shell-words command line such as `"/usr/local/sbin/pkg -vv"`.
    pub fn parse(command: &str) -> Result<Self> {
        let argv =
            shell_words::split(command).with_context(|| format!("parse pkg command: {command}"))?;
        if argv.is_empty() {
            return Err(anyhow!("pkg command is empty"));
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

fn abi_line_regex() -> &'static Regex {
    static ABI_LINE: OnceLock<Regex> = OnceLock::new();
    ABI_LINE.get_or_init(|| {
        Regex::new(r#"^ABI\s*=\s*"(.+)"\s*;\s*"#).expect("ABI line pattern is valid")
    })
}

/// Extract the ABI value from package tool output.
///
/// Every line is checked and the last match wins, so a later `ABI = ...;`
/// overrides an earlier one.
pub fn parse_abi(text: &str) -> Option<String> {
    let regex = abi_line_regex();
    let mut abi = None;
    for line in text.lines() {
        if let Some(captures) = regex.captures(line) {
            abi = Some(captures[1].to_string());
        }
    }
    abi
}

/// Run the package tool and extract its ABI string.
///
/// A missing or unspawnable tool is an error. No ABI line is not.
pub fn resolve_abi(command: &PkgCommand) -> Result<Option<String>> {
    let program = which::which(command.program())
        .with_context(|| format!("locate package tool {}", command.program()))?;

    let start = Instant::now();
    let output = Command::new(&program)
        .args(command.args())
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .with_context(|| format!("spawn package tool {}", program.display()))?;
    let elapsed_ms = start.elapsed().as_millis();

    tracing::debug!(
        elapsed_ms,
        program = %program.display(),
        stdout_bytes = output.stdout.len(),
        "package tool complete"
    );

    if !output.status.success() {
        tracing::warn!(
            status = %output.status,
            "package tool exited unsuccessfully; scanning its output anyway"
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let abi = parse_abi(&stdout);
    match &abi {
        Some(abi) => tracing::info!(abi = %abi, "resolved ABI"),
        None => tracing::warn!("package tool output has no ABI line"),
    }
    Ok(abi)
}
