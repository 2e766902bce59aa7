//! Handler functions for config CLI commands.

use docgate_core::{DocgateConfig, Error, Result};

use crate::cli::ConfigAction;

/// Handle a config subcommand.
pub fn handle_config(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => cmd_config_show(config_path),
        ConfigAction::Init { force } => cmd_config_init(config_path, force),
    }
}

/// Show the resolved config file path.
pub fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    match DocgateConfig::resolve_config_path(config_path) {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist - run `docgate config init` to create it)");
            }
            Ok(())
        }
        None => Err(Error::config(
            "could not determine config directory for this platform",
        )),
    }
}

/// Print the effective configuration (file plus defaults) as TOML.
pub fn cmd_config_show(config_path: Option<&str>) -> Result<()> {
    let config = DocgateConfig::load(config_path)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Write a default config file at the resolved path.
pub fn cmd_config_init(config_path: Option<&str>, force: bool) -> Result<()> {
    let path = DocgateConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("could not determine config directory for this platform")
    })?;

    if path.exists() && !force {
        return Err(Error::config(format!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let content = DocgateConfig::default().to_toml_string()?;
    std::fs::write(&path, content).map_err(|e| Error::io_with_path(e, &path))?;

    println!("wrote {}", path.display());
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
