use super::cli::Args;
use super::{Config, DEFAULT_STORE_PATH, PartialConfig};
use crate::util::{expand_tilde_path, home_dir};
use anyhow::{Context, Result};
use log::trace;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{env, str::FromStr};

pub fn resolve_config(cli: &Args) -> Result<Config> {
    let (mut partial_config, mut sources) = load_partial(cli.no_config)?;

    // Override with environment variables if set
    if let Ok(log_level) = env::var("DISG_LOG_LEVEL") {
        if let Ok(log_level) = log::LevelFilter::from_str(&log_level) {
            partial_config.log_level = Some(log_level);
            sources.insert("log_level".into(), "environment".into());
        } else {
            return Err(anyhow::anyhow!("Invalid log level: {}", log_level));
        }
    }
    for (var, slot, key) in [
        ("DISG_PATH", &mut partial_config.path, "path"),
        ("DISG_SUBUID_FILE", &mut partial_config.subuid_file, "subuid_file"),
        ("DISG_SUBGID_FILE", &mut partial_config.subgid_file, "subgid_file"),
        ("DISG_NEWUIDMAP", &mut partial_config.newuidmap, "newuidmap"),
        ("DISG_NEWGIDMAP", &mut partial_config.newgidmap, "newgidmap"),
    ] {
        if let Ok(value) = env::var(var) {
            if !value.is_empty() {
                *slot = Some(value);
                sources.insert(key.into(), "environment".into());
            }
        }
    }

    // Override with CLI args if provided (highest precedence)
    if let Some(log_level) = cli.log_level {
        partial_config.log_level = Some(log_level);
        sources.insert("log_level".into(), "cli".into());
    }
    for (value, slot, key) in [
        (&cli.path, &mut partial_config.path, "path"),
        (&cli.subuid_file, &mut partial_config.subuid_file, "subuid_file"),
        (&cli.subgid_file, &mut partial_config.subgid_file, "subgid_file"),
        (&cli.newuidmap, &mut partial_config.newuidmap, "newuidmap"),
        (&cli.newgidmap, &mut partial_config.newgidmap, "newgidmap"),
    ] {
        if let Some(value) = value {
            *slot = Some(value.clone());
            sources.insert(key.into(), "cli".into());
        }
    }

    // If nothing else, fill in with some default values
    for key in [
        "log_level",
        "path",
        "subuid_file",
        "subgid_file",
        "newuidmap",
        "newgidmap",
    ] {
        if !sources.contains_key(key) {
            sources.insert(key.into(), "default".into());
        }
    }

    let path = expand_tilde_path(Path::new(
        &partial_config.path.unwrap_or(DEFAULT_STORE_PATH.to_string()),
    ))?;
    let subuid_file = expand_tilde_path(Path::new(
        &partial_config.subuid_file.unwrap_or("/etc/subuid".to_string()),
    ))?;
    let subgid_file = expand_tilde_path(Path::new(
        &partial_config.subgid_file.unwrap_or("/etc/subgid".to_string()),
    ))?;

    let config = Config {
        log_level: partial_config.log_level.unwrap_or(log::LevelFilter::Info),
        path,
        subuid_file,
        subgid_file,
        newuidmap: partial_config.newuidmap.unwrap_or("newuidmap".to_string()),
        newgidmap: partial_config.newgidmap.unwrap_or("newgidmap".to_string()),
        sources,
    };

    validate_config(&config)?;

    trace!("Store path: {}", config.path.display());
    trace!(
        "Mapping helpers: {} {}",
        config.newuidmap, config.newgidmap
    );

    Ok(config)
}

pub fn load_partial(
    no_config: bool,
) -> Result<(PartialConfig, HashMap<String, String>)> {
    let config_paths = if no_config {
        vec![]
    } else {
        find_config_files()?
    };
    let mut sources = HashMap::new();
    if config_paths.is_empty() {
        trace!("No config files found, using default config");
        return Ok((PartialConfig::default(), sources));
    }

    let mut merged_config = PartialConfig::default();
    for path in config_paths.iter() {
        let config_str = std::fs::read_to_string(path).context(format!(
            "Failed to read config file {}",
            path.display()
        ))?;

        let config: PartialConfig = toml::from_str(&config_str).context(
            format!("Failed to parse config file {}", path.display()),
        )?;

        merge_configs(
            &mut merged_config,
            &mut sources,
            config,
            &path.to_string_lossy(),
        );
        trace!("Loaded config file: {}", path.display());
    }

    Ok((merged_config, sources))
}

/** Returns all config files found, lowest precedence first */
fn find_config_files() -> Result<Vec<PathBuf>> {
    let home = home_dir();
    let mut paths_to_check = Vec::new();

    // Any project specific files
    let mut current_dir = env::current_dir()?;
    loop {
        paths_to_check.push(current_dir.join(".disg.toml"));
        if Some(&current_dir) == home.as_ref() || !current_dir.pop() {
            break;
        }
    }

    // ~/.config/disg/config.toml
    if let Some(home) = &home {
        paths_to_check.push(home.join(".config/disg/config.toml"));
    }

    // /etc/disg.toml
    paths_to_check.push(PathBuf::from("/etc/disg.toml"));

    // Finally reverse them so we can process them in order nicely
    paths_to_check.reverse();

    Ok(paths_to_check
        .into_iter()
        .filter(|path| path.is_file())
        .collect())
}

fn merge_configs(
    base: &mut PartialConfig,
    sources: &mut HashMap<String, String>,
    override_config: PartialConfig,
    source: &str,
) {
    if let Some(log_level) = override_config.log_level {
        base.log_level = Some(log_level);
        sources.insert("log_level".into(), source.into());
    }
    for (value, slot, key) in [
        (override_config.path, &mut base.path, "path"),
        (override_config.subuid_file, &mut base.subuid_file, "subuid_file"),
        (override_config.subgid_file, &mut base.subgid_file, "subgid_file"),
        (override_config.newuidmap, &mut base.newuidmap, "newuidmap"),
        (override_config.newgidmap, &mut base.newgidmap, "newgidmap"),
    ] {
        if value.is_some() {
            *slot = value;
            sources.insert(key.into(), source.into());
        }
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if config.path.as_os_str().is_empty() {
        return Err(anyhow::anyhow!("Image store path must not be empty"));
    }
    if config.newuidmap.is_empty() || config.newgidmap.is_empty() {
        return Err(anyhow::anyhow!("Mapping helper names must not be empty"));
    }

    Ok(())
}
