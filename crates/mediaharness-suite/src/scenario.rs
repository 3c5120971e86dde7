use crate::check::Check;
use crate::config::Tool;

/// Where a staged input file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// The configured sample media file.
    Sample,
    /// A file produced earlier in the same scenario.
    Workspace(String),
}

/// One tool container invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub tool: Tool,
    pub args: Vec<String>,
    /// Files exposed read-only inside the container, by container path.
    pub inputs: Vec<(Input, String)>,
    /// Container path where the scenario's output directory is mounted.
    pub mount: Option<String>,
}

impl ToolRun {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            args: Vec::new(),
            inputs: Vec::new(),
            mount: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Stage the sample at `/input/sample.mp4`.
    pub fn sample(self) -> Self {
        self.input(Input::Sample, "/input/sample.mp4")
    }

    pub fn input(mut self, input: Input, container_path: impl Into<String>) -> Self {
        self.inputs.push((input, container_path.into()));
        self
    }

    pub fn mount(mut self, target: impl Into<String>) -> Self {
        self.mount = Some(target.into());
        self
    }

    /// Shorthand for the common `/output` mount.
    pub fn output(self) -> Self {
        self.mount("/output")
    }
}

/// Per-file options written into a concat list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListLayout {
    /// Bare `file` lines.
    Plain,
    /// A `duration` line after every file.
    Duration(f64),
    /// `inpoint`/`outpoint` pairs for the first files, one pair per file.
    /// Files beyond the last pair are left out.
    Trim(Vec<(f64, f64)>),
}

/// One step of a scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Run(ToolRun),
    /// Write a concat list named `file` listing the workspace files matching
    /// `segments`, in name order.
    WriteConcatList {
        file: String,
        segments: String,
        layout: ListLayout,
    },
    Check(Check),
}

/// A named, ordered list of steps exercising one tool family.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub tool: Tool,
    pub description: String,
    pub steps: Vec<Step>,
    /// Reason the scenario is not run, if any.
    pub skip: Option<String>,
}

impl Scenario {
    pub fn new(tool: Tool, name: &str, description: impl Into<String>) -> Self {
        Self {
            name: format!("{tool}/{name}"),
            tool,
            description: description.into(),
            steps: Vec::new(),
            skip: None,
        }
    }

    pub fn run(mut self, run: ToolRun) -> Self {
        self.steps.push(Step::Run(run));
        self
    }

    pub fn concat_list(mut self, file: &str, segments: &str, layout: ListLayout) -> Self {
        self.steps.push(Step::WriteConcatList {
            file: file.to_string(),
            segments: segments.to_string(),
            layout,
        });
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.steps.push(Step::Check(check));
        self
    }

    pub fn checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.steps.extend(checks.into_iter().map(Step::Check));
        self
    }

    pub fn skipped(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    /// Tool runs in step order.
    pub fn runs(&self) -> impl Iterator<Item = &ToolRun> {
        self.steps.iter().filter_map(|step| match step {
            Step::Run(run) => Some(run),
            _ => None,
        })
    }

    /// Whether any run stages the sample file.
    pub fn needs_sample(&self) -> bool {
        self.runs()
            .any(|run| run.inputs.iter().any(|(input, _)| *input == Input::Sample))
    }

    /// The short name without the tool prefix.
    pub fn short_name(&self) -> &str {
        self.name
            .split_once('/')
            .map_or(self.name.as_str(), |(_, short)| short)
    }
}
