//! Headless host for the desktop runtime: placeholder generators, a virtual clock, and
//! line-oriented session scripts.

mod logging;
mod placeholder;
mod script;
mod session;

pub use logging::{init_tracing, DEFAULT_LOG_FILTER};
pub use placeholder::PlaceholderContentService;
pub use script::{parse_script, ScriptError, ScriptLine, ScriptStep, DEMO_SCRIPT};
pub use session::{HeadlessSession, StepReport};
