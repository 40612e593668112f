//! Line-oriented session scripts.
//!
//! One command per line; blank lines and `#` comments are skipped:
//!
//! ```text
//! open <app_id>
//! click <id> [label...]
//! interact <json interaction payload>
//! close
//! history <0..=10>
//! stateful on|off
//! wallpaper [prompt...]
//! auto-wallpaper on|off
//! advance <seconds>
//! ```

use desktop_runtime::{ConfigError, ReducerError};
use platform_host::{parse_interaction_payload, InteractionRecord};
use serde::Serialize;
use thiserror::Error;

/// Script run when no script file is given.
pub const DEMO_SCRIPT: &str = "\
# Visit notepad twice with statefulness on; the second visit is served from the cache.
stateful on
open notepad
click save Save
close
open notepad
click save Save
auto-wallpaper on
advance 300
# Touching an unstable resource crashes the session for good.
click access_unstable_file_kernel kernel.sys
open documents
";

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: {source}")]
    Step {
        line: usize,
        #[source]
        source: ReducerError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum ScriptStep {
    Open { app_id: String },
    Click { id: String, label: String },
    Interact { record: InteractionRecord },
    Close,
    History { length: usize },
    Stateful { enabled: bool },
    Wallpaper { prompt: Option<String> },
    AutoWallpaper { enabled: bool },
    Advance { seconds: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based source line.
    pub line: usize,
    pub step: ScriptStep,
}

/// Parses a whole script, failing on the first malformed line.
///
/// # Errors
///
/// Returns [`ScriptError::Parse`] naming the offending line.
pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    source
        .lines()
        .enumerate()
        .map(|(index, text)| (index + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
        .map(|(line, text)| {
            parse_step(text)
                .map(|step| ScriptLine { line, step })
                .map_err(|message| ScriptError::Parse { line, message })
        })
        .collect()
}

fn parse_step(text: &str) -> Result<ScriptStep, String> {
    let (command, rest) = match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (text, ""),
    };
    match command {
        "open" => Ok(ScriptStep::Open {
            app_id: required(rest, "open needs an app id")?.to_string(),
        }),
        "click" => {
            let rest = required(rest, "click needs an element id")?;
            let (id, label) = match rest.split_once(char::is_whitespace) {
                Some((id, label)) => (id, label.trim()),
                None => (rest, rest),
            };
            Ok(ScriptStep::Click {
                id: id.to_string(),
                label: label.to_string(),
            })
        }
        "interact" => parse_interaction_payload(rest).map(|record| ScriptStep::Interact { record }),
        "close" => Ok(ScriptStep::Close),
        "history" => rest
            .parse()
            .map(|length| ScriptStep::History { length })
            .map_err(|err| format!("invalid history length `{rest}`: {err}")),
        "stateful" => parse_switch(rest).map(|enabled| ScriptStep::Stateful { enabled }),
        "wallpaper" => Ok(ScriptStep::Wallpaper {
            prompt: (!rest.is_empty()).then(|| rest.to_string()),
        }),
        "auto-wallpaper" => parse_switch(rest).map(|enabled| ScriptStep::AutoWallpaper { enabled }),
        "advance" => rest
            .parse()
            .map(|seconds| ScriptStep::Advance { seconds })
            .map_err(|err| format!("invalid duration `{rest}`: {err}")),
        other => Err(format!("unknown command `{other}`")),
    }
}

fn required<'a>(rest: &'a str, message: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(message.to_string())
    } else {
        Ok(rest)
    }
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(format!("expected on/off, got `{other}`")),
    }
}
