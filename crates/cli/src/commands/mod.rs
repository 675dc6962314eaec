pub mod config_cmd;
pub mod run;
pub mod tools;

use std::process::ExitCode;

/// Exit status for problems before a run could start (config, provider setup).
pub const SETUP_ERROR: u8 = 2;

pub fn setup_error() -> ExitCode {
    ExitCode::from(SETUP_ERROR)
}
