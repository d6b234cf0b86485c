#![allow(clippy::option_map_unit_fn)]
use crate::config::Config;
use crate::outln;
use anyhow::Result;
use log::debug;
use std::collections::HashMap;

const KEYS: [&str; 6] = [
    "log_level",
    "path",
    "subuid_file",
    "subgid_file",
    "newuidmap",
    "newgidmap",
];

pub fn config(config: &Config, keys: Option<Vec<String>>) -> Result<()> {
    let keys = keys
        .filter(|keys| !keys.is_empty())
        .unwrap_or_else(|| KEYS.map(String::from).to_vec());
    let multi_line = keys.len() > 1;

    for key in keys {
        let (key, value) = config_value(config, &key)?;
        print_config_line(key, &value, multi_line, &config.sources);
    }

    Ok(())
}

fn config_value(config: &Config, key: &str) -> Result<(&'static str, String)> {
    Ok(match key {
        "log_level" | "log-level" => ("log_level", config.log_level.to_string()),
        "path" => ("path", config.path.display().to_string()),
        "subuid_file" | "subuid-file" => {
            ("subuid_file", config.subuid_file.display().to_string())
        }
        "subgid_file" | "subgid-file" => {
            ("subgid_file", config.subgid_file.display().to_string())
        }
        "newuidmap" => ("newuidmap", config.newuidmap.clone()),
        "newgidmap" => ("newgidmap", config.newgidmap.clone()),
        _ => {
            return Err(anyhow::anyhow!("Unknown key: {}", key));
        }
    })
}

fn print_config_line(
    key: &str,
    value: &str,
    multi_line: bool,
    sources: &HashMap<String, String>,
) {
    sources.get(key).map(|s| {
        debug!("{}={} set from {}", key, value, s);
    });

    if multi_line {
        outln!("{}={}", key, value);
    } else {
        outln!("{}", value);
    }
}
