//! Run configuration
//!
//! `ProfileConfig` is built once in `main` and passed by reference to every
//! component. Tunables can be overridden from a TOML file; every field has a
//! serde default so a partial file is fine.
//!
//! # Example TOML
//! ```toml
//! cache_file = "compile-timer.json"
//! command_timeout_secs = 600
//! duplicate_allow_list = ["bits/mathcalls.h", "X11/keysym.h"]
//! overlap_policy = "best-effort"
//! ```

use crate::error::{ProfileError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the optional config file looked up in the build directory
pub const DEFAULT_CONFIG_FILE: &str = "compile-timer.toml";

/// What to do with a translation unit whose intervals partially overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Attribute the unit without nesting (own time = total time)
    #[default]
    Flatten,
    /// Fall back to the pairwise midpoint rule over all intervals
    BestEffort,
}

/// Tunables that can come from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Build-graph file that must exist in the build directory
    pub build_graph_file: String,

    /// Program and arguments that print every resolved build command
    pub enumerator: Vec<String>,

    /// Command cache store, relative to the build directory
    pub cache_file: String,

    /// Flag appended to compile commands to make the compiler emit a trace
    pub trace_flag: String,

    /// Kill a child process after this many seconds (no limit when unset)
    pub command_timeout_secs: Option<u64>,

    /// Header path suffixes allowed to appear more than once per unit
    pub duplicate_allow_list: Vec<String>,

    pub overlap_policy: OverlapPolicy,

    pub commands_report: String,
    pub headers_report: String,
    pub folders_report: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            build_graph_file: "build.ninja".to_string(),
            enumerator: vec![
                "ninja".to_string(),
                "-t".to_string(),
                "commands".to_string(),
            ],
            cache_file: "compile-timer.json".to_string(),
            trace_flag: "-ftime-trace".to_string(),
            command_timeout_secs: None,
            duplicate_allow_list: vec![
                "bits/mathcalls.h".to_string(),
                "X11/keysym.h".to_string(),
                "X11/keysymdef.h".to_string(),
            ],
            overlap_policy: OverlapPolicy::Flatten,
            commands_report: "ct-commands.csv".to_string(),
            headers_report: "ct-headers.csv".to_string(),
            folders_report: "ct-header-folders.csv".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ProfileError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Context object for one profiling run
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub build_dir: PathBuf,
    /// Instrumented C compiler
    pub c_compiler: String,
    /// Instrumented C++ compiler
    pub cxx_compiler: String,
    pub settings: Settings,
}

impl ProfileConfig {
    /// Create a config from the build directory and either compiler variant
    ///
    /// The counterpart compiler is derived by adding or stripping `++`.
    pub fn new(build_dir: impl Into<PathBuf>, compiler: &str) -> Self {
        let (c_compiler, cxx_compiler) = derive_compilers(compiler);
        Self {
            build_dir: build_dir.into(),
            c_compiler,
            cxx_compiler,
            settings: Settings::default(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Look for `compile-timer.toml` in the build directory and apply it
    pub fn with_settings_from_build_dir(self) -> Result<Self> {
        let candidate = self.build_dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::info!("loading settings from {}", candidate.display());
            let settings = Settings::from_toml(&candidate)?;
            Ok(self.with_settings(settings))
        } else {
            Ok(self)
        }
    }

    pub fn build_graph_path(&self) -> PathBuf {
        self.build_dir.join(&self.settings.build_graph_file)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.build_dir.join(&self.settings.cache_file)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.settings.command_timeout_secs.map(Duration::from_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.c_compiler.is_empty() || self.cxx_compiler.is_empty() {
            return Err(ProfileError::Config(
                "compiler path must not be empty".to_string(),
            ));
        }

        if self.settings.enumerator.is_empty() {
            return Err(ProfileError::Config(
                "enumerator must name a program".to_string(),
            ));
        }

        if self.settings.command_timeout_secs == Some(0) {
            return Err(ProfileError::Config(
                "command_timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Fail unless the build directory holds the build-graph file
    pub fn ensure_build_graph(&self) -> Result<()> {
        if self.build_graph_path().is_file() {
            Ok(())
        } else {
            Err(ProfileError::BuildGraphMissing {
                dir: self.build_dir.clone(),
                file: self.settings.build_graph_file.clone(),
            })
        }
    }
}

/// Split a compiler path into its (C, C++) pair
pub fn derive_compilers(compiler: &str) -> (String, String) {
    match compiler.strip_suffix("++") {
        Some(c) => (c.to_string(), compiler.to_string()),
        None => (compiler.to_string(), format!("{}++", compiler)),
    }
}
