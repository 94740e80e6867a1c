//! Config command implementation.

use anyhow::Result;

use crate::config::Config;

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    println!("propweave configuration");
    println!("{:-<40}", "");

    println!("Default weaving:   {}", config.weaver.default_weaving);
    println!(
        "Namespaces:        {}",
        if config.weaver.namespace_filters.is_empty() {
            "(all)".to_string()
        } else {
            config.weaver.namespace_filters.join(", ")
        }
    );
    println!("Event invoker:     {}", config.weaver.invoker_name());
    println!("Disabled:          {}", config.weaver.disabled);
    println!("Conflict policy:   {}", config.get("conflict-policy")?);
    println!("Module:            {}", config.get("module")?);

    if let Some(config_path) = Config::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Set a configuration value and persist it.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    config.set(key, value)?;
    config.save()?;
    println!("Set {} to: {}", key, config.get(key)?);
    Ok(())
}

/// Print a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    println!("{}", config.get(key)?);
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    Config::default().save()?;
    println!("Configuration reset to defaults");
    Ok(())
}
