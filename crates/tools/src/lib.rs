//! Built-in tool implementations for Reckon.
//!
//! The fixed tool set the agent can call by name: arithmetic and
//! trigonometry, character/sequence helpers, expression evaluation, and
//! the side-effecting answer image, image viewer and e-mail tools.

pub mod answer_image;
pub mod calculator;
pub mod email;
pub mod math;
pub mod preview;
pub mod reasoning;
pub mod sequence;

use reckon_config::AppConfig;
use reckon_core::tool::ToolRegistry;

/// Create a tool registry with every built-in tool, wired to `config`.
pub fn default_registry(config: &AppConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in math::tools() {
        registry.register(Box::new(tool));
    }
    registry.register(Box::new(sequence::StringsToCharsToIntTool));
    registry.register(Box::new(sequence::ExponentialSumTool));
    registry.register(Box::new(sequence::FibonacciTool));
    registry.register(Box::new(reasoning::ShowReasoningTool));
    registry.register(Box::new(calculator::CalculateTool));
    registry.register(Box::new(calculator::VerifyTool));
    registry.register(Box::new(answer_image::CreateImageTool::new(&config.image)));
    registry.register(Box::new(preview::OpenImageTool::new(&config.image)));
    registry.register(Box::new(email::SendEmailTool::new(config.email.clone())));
    registry
}
