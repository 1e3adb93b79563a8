//! External command execution behind an injectable seam.

use anyhow::{bail, Context, Result};
use std::process::Command;

/// Runs external commands on behalf of the metadata collectors.
///
/// Injected so callers can substitute canned output in tests instead of
/// shelling out.
pub trait CommandRunner {
    /// Run `program` with `args` and return its stdout.
    ///
    /// Exit codes listed in `allowed_codes` are treated as success; any
    /// other non-zero status is an error carrying the command's stderr.
    fn output(&self, program: &str, args: &[&str], allowed_codes: &[i32]) -> Result<Vec<u8>>;
}

/// Production runner executing real processes.
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn output(&self, program: &str, args: &[&str], allowed_codes: &[i32]) -> Result<Vec<u8>> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("run {}", program))?;
        let code = output.status.code().unwrap_or(-1);
        if output.status.success() || allowed_codes.contains(&code) {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} exited with status {}: {}", program, code, stderr.trim());
    }
}
