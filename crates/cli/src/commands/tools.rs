//! `reckon tools`: List the tools the model can call.

use reckon_config::AppConfig;

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = reckon_tools::default_registry(config);
    println!("🧰 {} tools available", registry.len());
    println!();
    for line in registry.catalogue().lines() {
        println!("  {line}");
    }
    Ok(())
}
