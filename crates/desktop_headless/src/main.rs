//! Binary entrypoint that drives a desktop session from a script and prints JSON snapshots.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
};

use desktop_headless::{init_tracing, parse_script, HeadlessSession, ScriptError, DEMO_SCRIPT};
use desktop_runtime::RuntimeConfig;
use platform_host::SystemLocalClock;
use serde::Serialize;
use tracing::info;

fn main() -> ExitCode {
    if let Err(err) = init_tracing() {
        eprintln!("warning: failed to initialise logging: {err}");
    }
    let mut args = env::args().skip(1);

    let Some(cmd) = args.next() else {
        print_usage();
        return ExitCode::from(2);
    };

    let rest: Vec<String> = args.collect();

    let result = match cmd.as_str() {
        "run" => run(rest),
        "check-config" => check_config(rest),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown command: {other}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    eprintln!(
        "Usage: desktop_headless <command> [args]\n\
         \n\
         Commands:\n\
           run [--config PATH] [--script PATH]   Drive a session and print one JSON snapshot per step\n\
           check-config PATH                     Validate a runtime config file\n\
         \n\
         Logging honours RUST_LOG (default: info) and goes to stderr.\n"
    );
}

struct RunArgs {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_run_args(args: Vec<String>) -> Result<RunArgs, String> {
    let mut parsed = RunArgs {
        config: None,
        script: None,
    };
    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        let slot = match flag.as_str() {
            "--config" => &mut parsed.config,
            "--script" => &mut parsed.script,
            other => return Err(format!("unknown run argument: {other}")),
        };
        let value = args
            .next()
            .ok_or_else(|| format!("{flag} requires a path"))?;
        *slot = Some(PathBuf::from(value));
    }
    Ok(parsed)
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig, String> {
    match path {
        Some(path) => RuntimeConfig::load(path).map_err(|err| err.to_string()),
        None => Ok(RuntimeConfig::default()),
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let args = parse_run_args(args)?;
    let config = load_config(args.config.as_deref())?;
    let source = match &args.script {
        Some(path) => fs::read_to_string(path).map_err(|err| {
            ScriptError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            }
            .to_string()
        })?,
        None => DEMO_SCRIPT.to_string(),
    };
    let lines = parse_script(&source).map_err(|err| err.to_string())?;

    let mut session =
        HeadlessSession::new(config, Rc::new(SystemLocalClock)).map_err(|err| err.to_string())?;
    print_json(&session.boot())?;
    info!(steps = lines.len(), "running session script");
    for line in lines {
        let report = session.apply(line).map_err(|err| err.to_string())?;
        print_json(&report)?;
    }
    Ok(())
}

fn check_config(args: Vec<String>) -> Result<(), String> {
    let [path] = args.as_slice() else {
        return Err("check-config expects exactly one path".to_string());
    };
    let config = load_config(Some(Path::new(path)))?;
    println!(
        "{}: ok ({} apps, max history {}, refresh every {}s)",
        path,
        config.apps.len(),
        config.initial_max_history_length,
        config.wallpaper_refresh_secs
    );
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let line = serde_json::to_string(value).map_err(|err| err.to_string())?;
    println!("{line}");
    Ok(())
}
