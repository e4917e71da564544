//! TOML parser with helpful error messages.

use std::path::Path;

use anyhow::{Context, Result};

use super::schema::{self, RolloutConfig};

/// Parse rollout.toml with detailed error messages.
pub fn parse_rollout_toml(path: &Path) -> Result<RolloutConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_rollout_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse rollout.toml content from string.
pub fn parse_rollout_toml_str(content: &str) -> Result<RolloutConfig> {
    let config: RolloutConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    schema::validate(&config)?;

    Ok(config)
}

/// Point at the offending line when the TOML library reports one.
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let Some(span) = error.span() else {
        return anyhow::anyhow!("TOML parsing error: {}", error.message());
    };

    let line_num = content[..span.start.min(content.len())]
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
        + 1;
    let line = content.lines().nth(line_num - 1).unwrap_or("");
    anyhow::anyhow!(
        "TOML parsing error at line {}:\n>>> {}\n\nError: {}",
        line_num,
        line,
        error.message()
    )
}
