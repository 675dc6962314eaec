//! `open_image_in_preview`: hands a rendered image to the desktop viewer.
//!
//! Best effort: a missing file is the model's mistake and is rejected, but
//! a viewer that fails to launch only shows up in the result text.

use std::path::PathBuf;
use async_trait::async_trait;
use reckon_config::ImageConfig;
use reckon_core::args::{ArgKind, ArgValue, Param};
use reckon_core::error::ToolError;
use reckon_core::tool::Tool;
use reckon_core::value::ToolValue;
use tokio::process::Command;
use tracing::{debug, warn};

pub struct OpenImageTool {
    default_path: PathBuf,
    launcher: Vec<String>,
}

impl OpenImageTool {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            default_path: config.default_path.clone(),
            launcher: default_launcher(),
        }
    }

    /// Replace the viewer command; the image path is appended as the last argument.
    pub fn with_launcher(mut self, launcher: Vec<String>) -> Self {
        self.launcher = launcher;
        self
    }
}

fn default_launcher() -> Vec<String> {
    let argv: &[&str] = if cfg!(target_os = "macos") {
        &["open", "-a", "Preview"]
    } else if cfg!(target_os = "windows") {
        &["cmd", "/C", "start", ""]
    } else {
        &["xdg-open"]
    };
    argv.iter().map(|s| s.to_string()).collect()
}

const PATH: &[Param] = &[Param::new("path", ArgKind::Text)];

#[async_trait]
impl Tool for OpenImageTool {
    fn name(&self) -> &str {
        "open_image_in_preview"
    }

    fn description(&self) -> &str {
        "Open an image file in the system image viewer (empty path uses the default file)."
    }

    fn params(&self) -> &[Param] {
        PATH
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let path = match args.first().and_then(ArgValue::as_text).map(str::trim) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => self.default_path.clone(),
        };

        if !path.exists() {
            return Err(ToolError::invalid(
                self.name(),
                format!("file {} does not exist", path.display()),
            ));
        }

        let Some((program, rest)) = self.launcher.split_first() else {
            return Ok(ToolValue::Text("No image viewer configured".into()));
        };

        debug!(program = %program, path = %path.display(), "Launching image viewer");
        let status = Command::new(program).args(rest).arg(&path).status().await;

        let text = match status {
            Ok(status) if status.success() => format!("Opened {} in the image viewer", path.display()),
            Ok(status) => {
                let code = status.code().unwrap_or(-1);
                warn!(path = %path.display(), exit_code = code, "Image viewer failed");
                format!("Could not open {}: viewer exited with code {code}", path.display())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Image viewer could not be launched");
                format!("Could not open {}: {e}", path.display())
            }
        };
        Ok(ToolValue::Text(text))
    }
}
