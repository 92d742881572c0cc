//! Downstream command execution once a task is cleared to run.

use carbonaware_core::error::{CarbonAwareError, Result};
use std::process::Stdio;

/// Captured result of a downstream command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `argv[0]` with the remaining arguments and capture both stdout and stderr.
pub async fn run_downstream(argv: &[String], workdir: Option<&str>) -> Result<CommandOutput> {
    let Some((program, args)) = argv.split_first() else {
        return Err(CarbonAwareError::config("downstream command is empty"));
    };

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }

    tracing::debug!("Running downstream command: {}", argv.join(" "));
    let output = cmd.output().await?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_echo() {
        let out = run_downstream(&["echo".into(), "hello".into()], None).await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert!(out.stderr.is_empty());
        assert!(out.success());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let out = run_downstream(&["sh".into(), "-c".into(), "echo oops >&2; exit 3".into()], None)
            .await
            .unwrap();
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stderr.trim(), "oops");
        assert!(!out.success());
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        assert!(matches!(run_downstream(&[], None).await, Err(CarbonAwareError::Config(_))));
    }
}
