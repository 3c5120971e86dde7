//! Integration scenarios for containerized media tools.
//!
//! A [`Scenario`] is a list of steps: run a tool container against the
//! sample file, write an input list, or check what the tool produced. The
//! [`Runner`] executes scenarios against any [`ContainerRuntime`], giving each
//! one a fresh [`OutputDir`] that is removed afterwards.
//!
//! [`ContainerRuntime`]: mediaharness_engine::ContainerRuntime

pub mod catalog;
pub mod check;
pub mod concat;
pub mod config;
pub mod error;
pub mod probe;
pub mod runner;
pub mod scenario;
pub mod workspace;

pub use check::{Check, CheckContext, CheckFailure, ProbeExpectation};
pub use concat::{ConcatEntry, ConcatList};
pub use config::{ImageSet, SuiteConfig, Tool};
pub use error::{Result, SuiteError};
pub use probe::{parse_stream_info, ProbeFormat, ProbeOutput, ProbeStream, StreamInfo};
pub use runner::{Outcome, RunRecord, Runner, ScenarioReport, SuiteReport, SCENARIO_LABEL};
pub use scenario::{Input, ListLayout, Scenario, Step, ToolRun};
pub use workspace::OutputDir;
