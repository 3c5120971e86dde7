use mediaharness_engine::{DockerEngine, EngineConfig};
use mediaharness_suite::{OutputDir, SuiteConfig};
use serde::Serialize;

use crate::cmd::run::{engine_config, suite_config};
use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, CHECKS_FAILED, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let engine = engine_config(&args.env);
    let suite = suite_config(&args.env);

    let mut checks = vec![socket_check(&engine)];
    checks.extend(daemon_checks(&engine));
    checks.push(sample_check(&suite));
    checks.push(output_root_check(&suite));

    let failed = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        checks,
        overall: if failed { "fail" } else { "pass" },
    };
    print_doctor(&output, format);

    Ok(if failed { CHECKS_FAILED } else { SUCCESS })
}

fn socket_check(config: &EngineConfig) -> CheckResult {
    let path = &config.socket_path;
    if path.exists() {
        CheckResult::new("docker_socket", CheckStatus::Pass, path.display().to_string())
    } else {
        CheckResult::new(
            "docker_socket",
            CheckStatus::Fail,
            format!("{} does not exist", path.display()),
        )
    }
}

fn daemon_checks(config: &EngineConfig) -> Vec<CheckResult> {
    let engine = match DockerEngine::new(config.clone()) {
        Ok(engine) => engine,
        Err(err) => {
            return vec![CheckResult::new("docker_ping", CheckStatus::Fail, err.to_string())]
        }
    };
    if let Err(err) = engine.ping() {
        return vec![CheckResult::new("docker_ping", CheckStatus::Fail, err.to_string())];
    }

    let version = match engine.version() {
        Ok(v) => CheckResult::new(
            "docker_version",
            CheckStatus::Info,
            format!("{} (API {}, {}/{})", v.version, v.api_version, v.os, v.arch),
        ),
        Err(err) => CheckResult::new("docker_version", CheckStatus::Warn, err.to_string()),
    };
    vec![
        CheckResult::new("docker_ping", CheckStatus::Pass, "OK"),
        version,
    ]
}

fn sample_check(config: &SuiteConfig) -> CheckResult {
    let sample = config.sample_path();
    match std::fs::metadata(&sample) {
        Ok(meta) if meta.is_file() => CheckResult::new(
            "sample_file",
            CheckStatus::Pass,
            format!("{} ({} bytes)", sample.display(), meta.len()),
        ),
        Ok(_) => CheckResult::new(
            "sample_file",
            CheckStatus::Fail,
            format!("{} is not a file", sample.display()),
        ),
        Err(err) => CheckResult::new(
            "sample_file",
            CheckStatus::Fail,
            format!("{}: {err}", sample.display()),
        ),
    }
}

fn output_root_check(config: &SuiteConfig) -> CheckResult {
    let root = config.output_root();
    let probe = OutputDir::create(root)
        .and_then(|dir| dir.write_file("doctor.txt", b"ok").map(|_| dir));
    match probe {
        Ok(_) => CheckResult::new(
            "output_root",
            CheckStatus::Pass,
            format!("{} is writable", root.display()),
        ),
        Err(err) => CheckResult::new("output_root", CheckStatus::Fail, err.to_string()),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("mediaharness doctor\n");
            for c in &output.checks {
                println!("  [{:>4}] {:<16} {}", status_text(c.status), c.name, c.detail);
            }
            if output.overall == "pass" {
                println!("\n  Result: ready to run");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => println!("{}", output.overall),
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn missing_socket_fails() {
        let config = EngineConfig {
            socket_path: PathBuf::from("/nonexistent/docker.sock"),
            ..EngineConfig::default()
        };
        assert_eq!(socket_check(&config).status, CheckStatus::Fail);
        let daemon = daemon_checks(&config);
        assert_eq!(daemon.len(), 1);
        assert_eq!(daemon[0].status, CheckStatus::Fail);
    }

    #[test]
    fn sample_and_output_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = SuiteConfig {
            testdata_dir: dir.path().to_path_buf(),
            ..SuiteConfig::default()
        };
        assert_eq!(sample_check(&config).status, CheckStatus::Fail);

        std::fs::write(dir.path().join("sample.mp4"), b"....").unwrap();
        let sample = sample_check(&config);
        assert_eq!(sample.status, CheckStatus::Pass);
        assert!(sample.detail.ends_with("(4 bytes)"));

        assert_eq!(output_root_check(&config).status, CheckStatus::Pass);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1, "probe directory removed");
    }

    #[test]
    fn doctor_output_serializes_lowercase() {
        let output = DoctorOutput {
            checks: vec![CheckResult::new("docker_ping", CheckStatus::Pass, "OK")],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"status\":\"pass\""));
        assert!(json.contains("\"overall\":\"pass\""));
    }
}
