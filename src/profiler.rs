//! Profiling engine
//!
//! Ties the pieces together for one run: every enumerated build command is
//! classified and looked up in the command cache (executing it on a miss);
//! afterwards the trace of every cached compile is parsed and attributed.

use crate::action::{self, ActionKind, Classification};
use crate::attribution::Aggregator;
use crate::cache::{CacheOutcome, CommandCache};
use crate::config::ProfileConfig;
use crate::error::{ProfileError, Result};
use crate::report::{self, CommandRow};
use crate::runner::CommandRunner;
use crate::trace;
use std::fs;
use std::path::PathBuf;

/// What happened to one build command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Executed(ActionKind),
    Cached(ActionKind),
    Skipped,
}

/// Counts for one pass over the build commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub executed: usize,
    pub cached: usize,
    pub skipped: usize,
}

/// Aggregated results of the analysis pass
#[derive(Debug, Clone)]
pub struct Analysis {
    pub commands: Vec<CommandRow>,
    pub total_build_secs: f64,
    pub attribution: Aggregator,
}

/// One profiling run over a build directory
pub struct Profiler<R: CommandRunner> {
    config: ProfileConfig,
    cache: CommandCache,
    runner: R,
}

impl<R: CommandRunner> Profiler<R> {
    /// Create the engine, loading any previously cached timings
    pub fn new(config: ProfileConfig, runner: R) -> Result<Self> {
        let cache = CommandCache::load(config.cache_path())?;
        Ok(Self {
            config,
            cache,
            runner,
        })
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn cache(&self) -> &CommandCache {
        &self.cache
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Classify one command line and time it unless it is cached
    pub fn process_line(&mut self, line: &str) -> Result<LineOutcome> {
        let kind = match action::classify(line) {
            Classification::Action(kind) => kind,
            Classification::Auxiliary => {
                tracing::debug!("skipping auxiliary command: {}", line);
                return Ok(LineOutcome::Skipped);
            }
            Classification::UnknownCompilerCommand => {
                tracing::warn!("unknown compiler command: {}", line);
                return Ok(LineOutcome::Skipped);
            }
            Classification::Unrecognized => {
                tracing::warn!("unrecognized command: {}", line);
                return Ok(LineOutcome::Skipped);
            }
        };

        let (_, outcome) = self.cache.get_or_run(line, kind, &mut self.runner)?;
        Ok(match outcome {
            CacheOutcome::Hit => LineOutcome::Cached(kind),
            CacheOutcome::Executed => LineOutcome::Executed(kind),
        })
    }

    /// Process every build command in order, one at a time
    pub fn run_build<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<BuildStats> {
        let mut stats = BuildStats::default();
        for line in lines {
            match self.process_line(line.as_ref())? {
                LineOutcome::Executed(_) => stats.executed += 1,
                LineOutcome::Cached(_) => stats.cached += 1,
                LineOutcome::Skipped => stats.skipped += 1,
            }
        }
        tracing::info!(
            "{} executed, {} cached, {} skipped",
            stats.executed,
            stats.cached,
            stats.skipped
        );
        Ok(stats)
    }

    /// Attribute header time for every cached compile
    ///
    /// A compile whose trace file is missing aborts the analysis.
    pub fn analyze(&self) -> Result<Analysis> {
        let mut commands = Vec::with_capacity(self.cache.len());
        let mut total_build_secs = 0.0;
        let mut attribution = Aggregator::from_settings(&self.config.settings);

        for (command, record) in self.cache.records() {
            let file = action::represented_file(record.kind, command).unwrap_or_else(|| {
                tracing::warn!("could not find output or source file in {}", command);
                ""
            });
            commands.push(CommandRow {
                file: file.to_string(),
                kind: record.kind,
                elapsed_ms: (record.elapsed_secs * 1000.0) as u64,
            });
            total_build_secs += record.elapsed_secs;

            if !record.kind.is_compile() {
                continue;
            }

            let trace_path = action::trace_path(&self.config.build_dir, command)
                .unwrap_or_else(|| PathBuf::from("<no -o output>"));
            if !trace_path.is_file() {
                return Err(ProfileError::TraceMissing {
                    path: trace_path,
                    command: command.clone(),
                });
            }

            let unit = trace::parse_trace_file(&trace_path)?;
            attribution.add_unit(&unit);
        }

        Ok(Analysis {
            commands,
            total_build_secs,
            attribution,
        })
    }

    /// Write the CSV reports into the build directory and print the summaries
    pub fn write_reports(&self, analysis: &Analysis) -> Result<()> {
        let settings = &self.config.settings;
        let dir = &self.config.build_dir;

        fs::write(
            dir.join(&settings.commands_report),
            report::commands_csv(&analysis.commands),
        )?;
        print!("{}", report::build_time_text(analysis.total_build_secs));

        fs::write(
            dir.join(&settings.headers_report),
            report::headers_csv(&analysis.attribution.header_rows()),
        )?;
        fs::write(
            dir.join(&settings.folders_report),
            report::folders_csv(&analysis.attribution.folder_rows()),
        )?;

        print!(
            "{}",
            report::summary_text(
                &analysis.attribution.summary(),
                &analysis.attribution.ranked_categories()
            )
        );
        Ok(())
    }
}
