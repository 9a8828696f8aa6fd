//! Daily pipeline orchestration.
//!
//! Declares the four stages (scrape -> load -> enrich -> transform) and
//! executes them in topological order, threading a completed-stage set
//! so no stage starts before every predecessor has succeeded. The
//! current graph is a linear chain, but the executor handles general
//! acyclic edges so adding stages never requires re-architecture.
//!
//! Stages run strictly one at a time. Load and parts of enrich could
//! overlap in principle; sequencing them is a deliberate
//! simplicity-over-throughput tradeoff. There is no rollback: completed
//! stages stay completed, and the recovery path for an aborted run is
//! an idempotent re-run from the top (every stage's writes are
//! full-table replacements).

pub mod runner;
pub mod stage;

pub use runner::{ProcessRunner, StageError, StageRunner};
pub use stage::Stage;

use std::collections::HashSet;

use thiserror::Error;
use tracing::info;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage `{stage}` failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: StageError,
    },
    #[error("stage `{stage}` depends on unknown stage `{dependency}`")]
    UnknownDependency { stage: String, dependency: String },
    #[error("duplicate stage name `{0}`")]
    DuplicateStage(String),
    #[error("dependency cycle involving stage `{0}`")]
    Cycle(String),
    #[error("stage `{0}` has an empty command")]
    EmptyCommand(String),
}

/// A validated stage graph.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Validate the stage set: unique names, known dependencies,
    /// non-empty commands, and an acyclic graph. All configuration
    /// errors surface here, before any stage starts.
    pub fn new(stages: Vec<Stage>) -> Result<Self, PipelineError> {
        let mut names = HashSet::new();
        for stage in &stages {
            if !names.insert(stage.name.as_str()) {
                return Err(PipelineError::DuplicateStage(stage.name.clone()));
            }
            if stage.command.is_empty() {
                return Err(PipelineError::EmptyCommand(stage.name.clone()));
            }
        }
        for stage in &stages {
            for dep in &stage.depends_on {
                if !names.contains(dep.as_str()) {
                    return Err(PipelineError::UnknownDependency {
                        stage: stage.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let pipeline = Self { stages };
        pipeline.execution_order()?; // rejects cycles up front
        Ok(pipeline)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Topological order (Kahn), stable with respect to declaration
    /// order among ready stages.
    fn execution_order(&self) -> Result<Vec<&Stage>, PipelineError> {
        let mut remaining: Vec<&Stage> = self.stages.iter().collect();
        let mut done: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(self.stages.len());

        while !remaining.is_empty() {
            let ready = remaining
                .iter()
                .position(|s| s.depends_on.iter().all(|d| done.contains(d.as_str())));
            match ready {
                Some(idx) => {
                    let stage = remaining.remove(idx);
                    done.insert(stage.name.as_str());
                    order.push(stage);
                }
                None => {
                    // Every remaining stage waits on another remaining one.
                    return Err(PipelineError::Cycle(remaining[0].name.clone()));
                }
            }
        }

        Ok(order)
    }

    /// Execute all stages in dependency order, fail-fast.
    ///
    /// A stage starts only once every predecessor is in the completed
    /// set; the first failure aborts the run with all remaining stages
    /// unstarted.
    pub async fn execute(&self, runner: &dyn StageRunner) -> Result<(), PipelineError> {
        let order = self.execution_order()?;
        let mut completed: HashSet<&str> = HashSet::new();

        info!(stages = order.len(), "starting pipeline run");
        for stage in order {
            debug_assert!(stage
                .depends_on
                .iter()
                .all(|d| completed.contains(d.as_str())));

            runner
                .run(stage)
                .await
                .map_err(|source| PipelineError::StageFailed {
                    stage: stage.name.clone(),
                    source,
                })?;
            completed.insert(stage.name.as_str());
        }
        info!("pipeline run complete");

        Ok(())
    }
}

/// Build the daily four-stage pipeline from resolved settings.
pub fn daily_pipeline(settings: &Settings) -> Result<Pipeline, PipelineError> {
    let p = &settings.pipeline;
    Pipeline::new(vec![
        Stage::new("scrape", p.scrape_command.clone(), &[]),
        Stage::new("load", p.load_command.clone(), &["scrape"]),
        Stage::new("enrich", p.enrich_command.clone(), &["load"]),
        Stage::new("transform", p.transform_command.clone(), &["enrich"]),
    ])
}
