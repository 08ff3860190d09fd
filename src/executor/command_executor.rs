use super::{BackupExecutor, ExecutionOutcome, WorkItem};
use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// Runs a backup definition's command as a child process.
#[derive(Clone)]
pub struct CommandExecutor {
    work_root: PathBuf,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(work_root: PathBuf, timeout: Duration) -> Self {
        Self { work_root, timeout }
    }

    async fn run(
        &self,
        work: &WorkItem,
        args: Vec<String>,
        work_dir: &Path,
    ) -> Result<ExecutionOutcome> {
        let mut cmd = tokio::process::Command::new(&work.backup.command);
        cmd.args(&args);
        cmd.current_dir(work_dir);
        cmd.env("BACKUP_NAME", work.backup_name());
        cmd.env("BACKUP_WORK_ID", &work.work_id);

        // Capture output
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            AppError::Execution(format!(
                "Failed to start '{}': {}",
                work.backup.command, e
            ))
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Ok(ExecutionOutcome::Failed {
                    detail: format!("timed out after {}s", self.timeout.as_secs_f64()),
                });
            }
        };

        if output.status.success() {
            return Ok(ExecutionOutcome::Success);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if !stderr.is_empty() {
            stderr
        } else {
            match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            }
        };
        Ok(ExecutionOutcome::Failed { detail })
    }
}

impl BackupExecutor for CommandExecutor {
    async fn execute(&self, work: &WorkItem) -> Result<ExecutionOutcome> {
        let args = work.backup.parsed_args()?;

        let work_dir = self.work_root.join(&work.work_id);
        tokio::fs::create_dir_all(&work_dir).await?;

        tracing::info!(
            "Running backup '{}' ({}): {} {:?}",
            work.backup_name(),
            work.work_id,
            work.backup.command,
            args
        );
        let result = self.run(work, args, &work_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            tracing::warn!("Failed to remove work dir {}: {}", work_dir.display(), e);
        }

        result
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::BackupDefinition;

    fn work(script: &str) -> WorkItem {
        WorkItem {
            work_id: "w-1".to_string(),
            backup: BackupDefinition {
                name: "nightly-db".to_string(),
                command: "sh".to_string(),
                args: Some(serde_json::to_string(&["-c", script]).unwrap()),
                enabled: true,
                created_at: 0,
                updated_at: 0,
            },
        }
    }

    fn executor(root: &Path, timeout: Duration) -> CommandExecutor {
        CommandExecutor::new(root.to_path_buf(), timeout)
    }

    #[tokio::test]
    async fn zero_exit_is_success_and_sees_environment() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = executor(dir.path(), Duration::from_secs(10))
            .execute(&work(r#"test "$BACKUP_NAME" = nightly-db && test "$BACKUP_WORK_ID" = w-1"#))
            .await
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::Success);
        assert!(!dir.path().join("w-1").exists());
    }

    #[tokio::test]
    async fn failure_reports_stderr_or_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor(dir.path(), Duration::from_secs(10));

        let outcome = exec.execute(&work("echo 'disk full' >&2; exit 3")).await.unwrap();
        assert_eq!(
            outcome,
            ExecutionOutcome::Failed {
                detail: "disk full".to_string()
            }
        );

        let outcome = exec.execute(&work("exit 4")).await.unwrap();
        assert_eq!(
            outcome,
            ExecutionOutcome::Failed {
                detail: "exit code 4".to_string()
            }
        );
    }

    #[tokio::test]
    async fn timeout_fails_the_execution() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = executor(dir.path(), Duration::from_millis(100))
            .execute(&work("sleep 5"))
            .await
            .unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn missing_command_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut item = work("true");
        item.backup.command = "/nonexistent/backup-tool".to_string();
        let err = executor(dir.path(), Duration::from_secs(1))
            .execute(&item)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Execution(_)));
    }
}
