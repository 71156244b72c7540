//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch workspace holding a template, an install root and a fake `pkg`.
pub struct TestFixture {
    pub temp_dir: TempDir,
}

/// Result from running make-manifest.
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Parse stdout as the generated manifest.
    pub fn manifest(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|err| {
            panic!(
                "stdout is not JSON ({err}): {}\nstderr: {}",
                self.stdout, self.stderr
            )
        })
    }
}

impl TestFixture {
    pub fn setup() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        fs::create_dir(temp_dir.path().join("install-root")).expect("create install root");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn install_root(&self) -> PathBuf {
        self.path().join("install-root")
    }

    /// Write `manifest.source` in the fixture directory.
    pub fn write_template(&self, json: &str) {
        fs::write(self.path().join("manifest.source"), json).expect("write template");
    }

    /// Stage a file under the install root with the given mode.
    pub fn stage_file(&self, rel_path: &str, mode: u32) {
        let path = self.install_root().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create staged parent");
        }
        fs::write(&path, b"staged").expect("write staged file");
        set_mode(&path, mode);
    }

    /// Stage a file whose name is raw bytes, possibly not UTF-8.
    pub fn stage_raw_name(&self, name: &[u8]) {
        let path = self.install_root().join(OsStr::from_bytes(name));
        fs::write(&path, b"staged").expect("write staged file");
    }

    /// Stage a directory under the install root with the given mode.
    pub fn stage_dir(&self, rel_path: &str, mode: u32) {
        let path = self.install_root().join(rel_path);
        fs::create_dir_all(&path).expect("create staged dir");
        set_mode(&path, mode);
    }

    /// Install a fake package tool that prints `output` and exits with `code`.
    ///
    /// The script runs through `sh` rather than being exec'd directly, which
    /// avoids ETXTBSY when parallel tests fork while it is still open.
    pub fn fake_pkg(&self, output: &str, code: i32) -> String {
        let script = self.path().join("fake-pkg.sh");
        let body = format!("cat <<'PKG_EOF'\n{output}\nPKG_EOF\nexit {code}\n");
        fs::write(&script, body).expect("write fake pkg");
        let script = script.to_str().expect("fake pkg path is UTF-8");
        format!("sh {} -vv", shell_words::quote(script))
    }

    /// Run make-manifest from the fixture directory.
    pub fn run(&self, pkg_command: &str, extra_args: &[&str]) -> TestResult {
        let output = Command::new(env!("CARGO_BIN_EXE_make-manifest"))
            .current_dir(self.path())
            .env_remove("PKG_MANIFEST_SOURCE")
            .env_remove("PKG_MANIFEST_ROOT")
            .env_remove("RUST_LOG")
            .env("PKG_MANIFEST_PKG_COMMAND", pkg_command)
            .args(extra_args)
            .output()
            .expect("spawn make-manifest");
        TestResult::from_output(output)
    }
}

fn set_mode(path: &Path, mode: u32) {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("chmod");
}
