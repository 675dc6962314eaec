//! `reckon config`: Configuration management commands.

use reckon_config::AppConfig;

const REDACTED: &str = "***";

pub fn validate(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");
    config.validate()?;
    println!("   ✅ Config parsed successfully");

    let warnings = warnings(config);
    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    let router = reckon_providers::build_from_config(config);
    println!("   Provider:    {}", config.default_provider);
    println!("   Configured:  {}", router.list().join(", "));
    println!("   Model:       {}", config.default_model);
    println!("   Iterations:  {}", config.agent.max_iterations);
    println!(
        "   Timeouts:    {}s (model), {}s (tools)",
        config.agent.request_timeout_secs, config.agent.tool_timeout_secs
    );
    Ok(())
}

fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push("No API key set (set RECKON_API_KEY or GEMINI_API_KEY)".to_string());
    }
    if config.email.username.is_none() || config.email.password.is_none() {
        warnings.push("SMTP credentials missing; send_email will fail".to_string());
    }
    if config.email.recipient().is_none() {
        warnings.push("No email recipient configured".to_string());
    }
    for path in config.image.font_paths.iter().filter(|p| !p.exists()) {
        warnings.push(format!("Font not found: {}", path.display()));
    }
    warnings
}

pub fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = toml::to_string_pretty(&redacted(config))?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
}

fn redacted(config: &AppConfig) -> AppConfig {
    let mut config = config.clone();
    if config.api_key.is_some() {
        config.api_key = Some(REDACTED.into());
    }
    if config.email.password.is_some() {
        config.email.password = Some(REDACTED.into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.into());
        }
    }
    config
}
