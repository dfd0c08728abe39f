/*!
 * pspawn - Command Line Runner
 *
 * Usage:
 *   pspawn [--json] <request.json|->      spawn a positional (array) or named (object) request
 *   pspawn [--json] -- <cmd> [args...]    spawn a command with the inherited environment
 *
 * Exits with the child's exit code (129 when the child died from a signal).
 */

use miette::{bail, IntoDiagnostic, Result};
use nix::sys::wait::WaitStatus;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Read;
use tracing::info;

use pspawn::{init_tracing, named, positional, Config, Process, SpawnRequest};

const USAGE: &str = "usage: pspawn [--json] <request.json|->\n       pspawn [--json] -- <cmd> [args...]";

#[derive(Debug, Serialize)]
struct RunReport {
    pid: Option<i32>,
    exit_code: i32,
    signal: Option<&'static str>,
}

impl RunReport {
    fn new(process: &Process, exit_code: i32) -> Self {
        let signal = match process.wait_status() {
            Some(WaitStatus::Signaled(_, sig, _)) => Some(sig.as_str()),
            _ => None,
        };
        Self {
            pid: process.pid().map(|pid| pid.as_raw()),
            exit_code,
            signal,
        }
    }
}

fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let json_report = args.first().is_some_and(|a| a == "--json");
    if json_report {
        args.remove(0);
    }

    let mut process = match args.split_first() {
        Some((sep, command)) if sep == "--" => {
            let Some((cmd, rest)) = command.split_first() else {
                bail!(USAGE);
            };
            SpawnRequest::new(cmd.as_str())
                .args(rest.iter().cloned())
                .close_signal(config.close_signal)
                .spawn()?
        }
        Some((source, [])) => spawn_request(&read_request(source)?, &config)?,
        _ => bail!(USAGE),
    };

    let exit_code = process.wait()?;
    let report = RunReport::new(&process, exit_code);
    info!(pid = ?report.pid, exit_code, signal = ?report.signal, "child finished");

    if json_report {
        println!("{}", serde_json::to_string(&report).into_diagnostic()?);
    }

    drop(process);
    std::process::exit(exit_code)
}

fn read_request(source: &str) -> Result<Value> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
        buf
    } else {
        std::fs::read_to_string(source).into_diagnostic()?
    };
    serde_json::from_str(&text).into_diagnostic()
}

fn spawn_request(request: &Value, config: &Config) -> Result<Process> {
    let process = match request {
        Value::Array(slots) => positional::spawn(slots)?,
        Value::Object(options) => {
            let mut options = options.clone();
            options
                .entry("close-signal")
                .or_insert_with(|| json!(config.close_signal));
            named::spawn(&Value::Object(options))?
        }
        other => bail!("request must be an array or an object, got {}", other),
    };
    Ok(process)
}
