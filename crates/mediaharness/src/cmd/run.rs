use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mediaharness_engine::{resolve_socket_path, DockerEngine, EngineConfig};
use mediaharness_suite::{catalog, ImageSet, Runner, Scenario, SuiteConfig};
use tracing::{info, warn};

use crate::cmd::{parse_duration, EnvArgs, ImageArgs, RunArgs};
use crate::exit::{
    engine_error, suite_error, CliError, CliResult, CHECKS_FAILED, FAILURE, INTERNAL, SUCCESS,
    USAGE,
};
use crate::output::{print_report, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let scenarios = select(&args.selectors, &args.tool)?;
    if scenarios.is_empty() {
        return Err(CliError::new(USAGE, "no scenarios selected"));
    }

    let mut engine_config = engine_config(&args.env);
    engine_config.wait_timeout =
        parse_duration(&args.wait_timeout).map_err(|err| CliError::new(USAGE, err))?;
    let engine = DockerEngine::new(engine_config)
        .map_err(|err| engine_error("docker client setup failed", err))?;
    engine
        .ping()
        .map_err(|err| engine_error("docker daemon unreachable", err))?;

    let config = SuiteConfig {
        images: images(&args.images),
        demux_mode: args.mode,
        pull_policy: args.pull.into(),
        keep_outputs: args.keep,
        log_tail_lines: args.tail,
        ..suite_config(&args.env)
    };
    info!(
        scenarios = scenarios.len(),
        sample = %config.sample_path().display(),
        output_root = %config.output_root().display(),
        mode = %config.demux_mode,
        "starting run"
    );

    let cancel = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&cancel))?;

    let runner = Runner::new(engine, config).with_cancel(Arc::clone(&cancel));
    let report = runner.run_all(&scenarios);
    print_report(&report, format);

    if !report.success() {
        return Ok(CHECKS_FAILED);
    }
    if cancel.load(Ordering::SeqCst) {
        warn!(skipped = report.skipped, "run interrupted");
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

/// Positional selectors first, then `--tool` filters, in catalog order when
/// neither is given. Duplicates are dropped.
pub(crate) fn select(
    selectors: &[String],
    tools: &[mediaharness_suite::Tool],
) -> CliResult<Vec<Scenario>> {
    let mut chosen: Vec<Scenario> = Vec::new();
    for selector in selectors {
        let found = catalog::select(selector).map_err(|err| suite_error("select", err))?;
        chosen.extend(found);
    }
    for tool in tools {
        chosen.extend(catalog::for_tool(*tool));
    }
    if selectors.is_empty() && tools.is_empty() {
        chosen = catalog::all();
    }

    let mut seen = std::collections::HashSet::new();
    chosen.retain(|s| seen.insert(s.name.clone()));
    Ok(chosen)
}

pub(crate) fn engine_config(env: &EnvArgs) -> EngineConfig {
    EngineConfig {
        socket_path: resolve_socket_path(env.docker_host.as_deref()),
        ..EngineConfig::default()
    }
}

pub(crate) fn suite_config(env: &EnvArgs) -> SuiteConfig {
    SuiteConfig {
        testdata_dir: env.testdata.clone(),
        sample_name: env.sample.clone(),
        output_root: env.output_root.clone(),
        ..SuiteConfig::default()
    }
}

pub(crate) fn images(args: &ImageArgs) -> ImageSet {
    let mut images = ImageSet::default();
    for (tool, image) in args.overrides() {
        images.set(tool, image);
    }
    images
}

fn install_ctrlc_handler(cancel: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        cancel.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
