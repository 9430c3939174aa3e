mod description;

pub use description::*;

use std::fs;
use std::path::Path;

use crate::error::{Result, ServiceError};

/// Load a service description from a file (YAML, JSON, or TOML)
pub fn load(path: &Path) -> Result<ServiceDescription> {
    let content = fs::read_to_string(path).map_err(|e| {
        ServiceError::io(
            format!("Failed to read service description: {}", path.display()),
            e,
        )
    })?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let description = match extension {
        "yaml" | "yml" => parse_yaml(&content)?,
        "json" => parse_json(&content)?,
        "toml" => parse_toml(&content)?,
        _ => parse_auto(&content)?,
    };

    description.validate()?;
    Ok(description)
}

fn parse_yaml(content: &str) -> Result<ServiceDescription> {
    serde_yaml::from_str(content).map_err(|e| ServiceError::Config {
        message: format!("Failed to parse YAML description: {}", e),
    })
}

fn parse_json(content: &str) -> Result<ServiceDescription> {
    serde_json::from_str(content).map_err(|e| ServiceError::Config {
        message: format!("Failed to parse JSON description: {}", e),
    })
}

fn parse_toml(content: &str) -> Result<ServiceDescription> {
    toml::from_str(content).map_err(|e| ServiceError::Config {
        message: format!("Failed to parse TOML description: {}", e),
    })
}

/// Auto-detect format and parse
pub fn parse_auto(content: &str) -> Result<ServiceDescription> {
    if content.trim().starts_with('{') {
        parse_json(content)
    } else {
        parse_yaml(content)
    }
}
