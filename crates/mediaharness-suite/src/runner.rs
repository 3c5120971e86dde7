//! Sequential scenario execution.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use mediaharness_engine::{BindMount, ContainerLogs, ContainerRuntime, ContainerSpec};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::check::CheckContext;
use crate::concat::{ConcatEntry, ConcatList};
use crate::config::SuiteConfig;
use crate::error::{Result, SuiteError};
use crate::scenario::{Input, ListLayout, Scenario, Step, ToolRun};
use crate::workspace::OutputDir;

/// Label carrying the scenario name on every container the runner creates.
pub const SCENARIO_LABEL: &str = "dev.mediaharness.scenario";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// One container that ran as part of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub image: String,
    pub id: String,
    pub exit_code: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub tool: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    /// Failure or skip reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub containers: Vec<RunRecord>,
    /// Output directory, when kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteReport {
    fn push(&mut self, report: ScenarioReport) {
        match report.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
        }
        self.scenarios.push(report);
    }

    /// No scenario failed.
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs scenarios one after another against a container runtime.
///
/// Cancellation is cooperative: the flag is checked before each scenario and
/// between steps, never while a container is running.
pub struct Runner<R> {
    runtime: R,
    config: SuiteConfig,
    cancel: Arc<AtomicBool>,
}

impl<R: ContainerRuntime> Runner<R> {
    pub fn new(runtime: R, config: SuiteConfig) -> Self {
        Self {
            runtime,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned cancellation flag, e.g. one set by a signal
    /// handler.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn run_all(&self, scenarios: &[Scenario]) -> SuiteReport {
        let mut report = SuiteReport::default();
        for scenario in scenarios {
            report.push(self.run_scenario(scenario));
        }
        info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            "suite finished"
        );
        report
    }

    pub fn run_scenario(&self, scenario: &Scenario) -> ScenarioReport {
        let started = Instant::now();
        let mut report = ScenarioReport {
            name: scenario.name.clone(),
            tool: scenario.tool.to_string(),
            outcome: Outcome::Passed,
            duration_ms: 0,
            message: None,
            containers: Vec::new(),
            workspace: None,
        };

        if let Some(reason) = &scenario.skip {
            info!(scenario = %scenario.name, reason = %reason, "skipped");
            report.outcome = Outcome::Skipped;
            report.message = Some(reason.clone());
            return report;
        }

        info!(scenario = %scenario.name, "running");
        let result = self.execute(scenario, &mut report);
        report.duration_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

        match result {
            Ok(()) => info!(scenario = %scenario.name, ms = report.duration_ms, "passed"),
            Err(SuiteError::Cancelled) => {
                info!(scenario = %scenario.name, "cancelled");
                report.outcome = Outcome::Skipped;
                report.message = Some(SuiteError::Cancelled.to_string());
            }
            Err(err) => {
                let message = match &err {
                    SuiteError::ContainerFailed { stderr_tail, .. } if !stderr_tail.is_empty() => {
                        format!("{err}\n{stderr_tail}")
                    }
                    _ => err.to_string(),
                };
                warn!(scenario = %scenario.name, error = %err, "failed");
                report.outcome = Outcome::Failed;
                report.message = Some(message);
            }
        }
        report
    }

    fn execute(&self, scenario: &Scenario, report: &mut ScenarioReport) -> Result<()> {
        if self.cancelled() {
            return Err(SuiteError::Cancelled);
        }
        if scenario.needs_sample() {
            let sample = self.config.sample_path();
            if !sample.is_file() {
                return Err(SuiteError::MissingFixture(sample));
            }
        }

        let mut workspace = OutputDir::create(self.config.output_root())?;
        if self.config.keep_outputs {
            workspace.set_keep(true);
            report.workspace = Some(workspace.path().to_path_buf());
        }

        let mode = self.config.demux_mode;
        let mut last_logs: Option<ContainerLogs> = None;

        for step in &scenario.steps {
            if self.cancelled() {
                return Err(SuiteError::Cancelled);
            }
            match step {
                Step::Run(run) => {
                    let spec = self.container_spec(scenario, run, &workspace)?;
                    let exited = self.runtime.run(&spec)?;
                    debug!(
                        scenario = %scenario.name,
                        container = %exited.id,
                        exit_code = exited.exit_code,
                        output = %exited.logs.text(mode),
                        "container exited"
                    );
                    report.containers.push(RunRecord {
                        image: exited.image.clone(),
                        id: exited.id.clone(),
                        exit_code: exited.exit_code,
                    });
                    if !exited.success() {
                        return Err(SuiteError::ContainerFailed {
                            image: exited.image,
                            exit_code: exited.exit_code,
                            stderr_tail: exited.logs.stderr_tail(self.config.log_tail_lines),
                        });
                    }
                    last_logs = Some(exited.logs);
                }
                Step::WriteConcatList {
                    file,
                    segments,
                    layout,
                } => {
                    let list = concat_list(&workspace, segments, layout)?;
                    if list.is_empty() {
                        warn!(
                            scenario = %scenario.name,
                            pattern = %segments,
                            "no segments to list"
                        );
                    }
                    workspace.write_file(file, list.render().as_bytes())?;
                    debug!(file = %file, entries = list.entries().len(), "wrote concat list");
                }
                Step::Check(check) => {
                    let ctx = CheckContext {
                        workspace: &workspace,
                        logs: last_logs.as_ref(),
                        mode,
                    };
                    check.evaluate(&ctx)?;
                    debug!(scenario = %scenario.name, check = %check, "check passed");
                }
            }
        }
        Ok(())
    }

    fn container_spec(
        &self,
        scenario: &Scenario,
        run: &ToolRun,
        workspace: &OutputDir,
    ) -> Result<ContainerSpec> {
        let mut spec = ContainerSpec::new(self.config.images.image(run.tool))
            .args(run.args.iter().cloned())
            .pull_policy(self.config.pull_policy)
            .label(SCENARIO_LABEL, &scenario.name);

        for (input, target) in &run.inputs {
            let host = match input {
                Input::Sample => self.config.sample_path(),
                Input::Workspace(name) => workspace.join(name),
            };
            if !host.is_file() {
                return Err(SuiteError::MissingFixture(host));
            }
            let host = std::fs::canonicalize(&host).map_err(|e| SuiteError::io(&host, e))?;
            spec = spec.stage_file(host, target.as_str());
        }

        if let Some(target) = &run.mount {
            spec = spec.bind(BindMount::new(workspace.path(), target.as_str()));
        }
        Ok(spec)
    }
}

/// Build a concat list from the workspace files matching `pattern`, by base
/// name in sorted order.
fn concat_list(workspace: &OutputDir, pattern: &str, layout: &ListLayout) -> Result<ConcatList> {
    let names: Vec<String> = workspace
        .glob(pattern)?
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();

    let list = match layout {
        ListLayout::Plain => names.into_iter().map(ConcatEntry::new).collect(),
        ListLayout::Duration(seconds) => names
            .into_iter()
            .map(|name| ConcatEntry::new(name).with_duration(*seconds))
            .collect(),
        ListLayout::Trim(points) => names
            .into_iter()
            .zip(points)
            .map(|(name, (inpoint, outpoint))| {
                ConcatEntry::new(name).with_trim(*inpoint, *outpoint)
            })
            .collect(),
    };
    Ok(list)
}
