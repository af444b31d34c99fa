//! Build-graph enumeration
//!
//! Asks the build tool for every resolved shell command (`ninja -t commands`
//! by default), one per line.

use crate::config::ProfileConfig;
use crate::error::{ProfileError, Result};
use std::process::Command;

const GUARD_PREFIX: &str = ": && ";
const GUARD_SUFFIX: &str = " && :";

/// Remove the shell guards ninja wraps around some commands
pub fn strip_guards(line: &str) -> &str {
    let line = line.strip_prefix(GUARD_PREFIX).unwrap_or(line);
    line.strip_suffix(GUARD_SUFFIX).unwrap_or(line)
}

/// Turn enumerator output into command lines
pub fn parse_command_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| strip_guards(line).to_string())
        .collect()
}

/// Run the configured enumerator inside the build directory
pub fn enumerate_commands(config: &ProfileConfig) -> Result<Vec<String>> {
    let (program, args) = config
        .settings
        .enumerator
        .split_first()
        .ok_or_else(|| ProfileError::Config("enumerator must name a program".to_string()))?;

    let output = Command::new(program)
        .args(args)
        .current_dir(&config.build_dir)
        .output()
        .map_err(|source| ProfileError::Spawn {
            command: config.settings.enumerator.join(" "),
            source,
        })?;

    if !output.status.success() {
        return Err(ProfileError::Enumerator(format!(
            "`{}` exited with {}: {}",
            config.settings.enumerator.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let commands = parse_command_list(&String::from_utf8_lossy(&output.stdout));
    tracing::info!("{} build commands", commands.len());
    Ok(commands)
}
