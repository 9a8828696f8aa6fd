//! Stage execution: one external process per stage, run to completion.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use super::stage::Stage;

/// How much captured stderr to keep in a failure value.
const STDERR_TAIL_BYTES: usize = 4096;

/// A stage process failed. Always fatal to the pipeline run: there is
/// no retry policy and no partial success.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Executes one stage to completion.
///
/// Behind a trait so the orchestrator can be exercised with a spy
/// runner that records invocations instead of spawning processes.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn run(&self, stage: &Stage) -> Result<(), StageError>;
}

/// Production runner: spawns the stage command as a child process and
/// suspends until it terminates. The child does its own I/O; the runner
/// only manages the process lifecycle and captures output for
/// diagnosis.
pub struct ProcessRunner {
    working_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(working_dir: PathBuf) -> Self {
        Self { working_dir }
    }
}

#[async_trait]
impl StageRunner for ProcessRunner {
    async fn run(&self, stage: &Stage) -> Result<(), StageError> {
        info!(stage = %stage.name, command = %stage.command_line(), "starting stage");
        let started = Instant::now();

        let output = tokio::process::Command::new(stage.program())
            .args(stage.args())
            .current_dir(&self.working_dir)
            .output()
            .await
            .map_err(|source| StageError::Spawn {
                command: stage.command_line(),
                source,
            })?;

        let elapsed = started.elapsed();
        if output.status.success() {
            info!(stage = %stage.name, duration_ms = elapsed.as_millis() as u64, "stage complete");
            Ok(())
        } else {
            let stderr = tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_BYTES);
            error!(
                stage = %stage.name,
                code = ?output.status.code(),
                duration_ms = elapsed.as_millis() as u64,
                "stage failed"
            );
            Err(StageError::Failed {
                code: output.status.code(),
                stderr,
            })
        }
    }
}

/// Last `max` bytes of a string, on a char boundary.
fn tail(s: &str, max: usize) -> String {
    let trimmed = s.trim();
    if trimmed.len() <= max {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - max;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}
