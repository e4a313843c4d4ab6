//! Subprocess execution for external tools (git, npm).

use std::path::Path;
use tokio::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    /// Exit code, if the process was not killed by a signal
    pub code: Option<i32>,
    /// stdout, lossily decoded
    pub stdout: String,
    /// stderr, lossily decoded
    pub stderr: String,
}

impl CommandOutput {
    /// stdout with surrounding whitespace removed
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Non-empty trimmed stdout lines
    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    /// Best description of a failure: stderr, else stdout
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Run `program args...` inside `cwd` and capture its output
pub async fn run(program: &Path, args: &[&str], cwd: &Path) -> std::io::Result<CommandOutput> {
    log::debug!("$ {} {} (in {})", program.display(), args.join(" "), cwd.display());

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        // Output is parsed, so keep tool messages unlocalised
        .env("LC_ALL", "C")
        .output()
        .await?;

    let result = CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };

    if !result.success {
        log::debug!("exit {:?}: {}", result.code, result.failure_reason());
    }

    Ok(result)
}
