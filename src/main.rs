use anyhow::{Context, Result};
use compile_timer::cli::{self, Cli, ParseOutcome};
use compile_timer::config::{ProfileConfig, Settings};
use compile_timer::profiler::Profiler;
use compile_timer::{build_graph, runner::InstrumentedRunner};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Log filter: `--debug` forces TRACE, else `RUST_LOG` when it parses, else INFO
fn log_filter(debug: bool, rust_log: Option<&str>) -> EnvFilter {
    if debug {
        return EnvFilter::new("trace");
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Initialize tracing subscriber on stderr
fn init_tracing(debug: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(debug, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Assemble the run context from the command line and optional settings file
fn build_config(args: &Cli) -> Result<ProfileConfig> {
    let config = ProfileConfig::new(&args.build_dir, &args.compiler);
    let mut config = match &args.config {
        Some(path) => {
            let settings = Settings::from_toml(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
            config.with_settings(settings)
        }
        None => config.with_settings_from_build_dir()?,
    };

    if let Some(secs) = args.timeout {
        config.settings.command_timeout_secs = Some(secs);
    }

    config.validate()?;
    Ok(config)
}

fn print_config(config: &ProfileConfig) {
    println!("Config:");
    println!("  build path:  {}", config.build_dir.display());
    println!("  clang bin:   {}", config.c_compiler);
    println!("  clang++ bin: {}", config.cxx_compiler);
}

fn main() -> Result<ExitCode> {
    let args = match cli::parse_args(std::env::args_os()) {
        ParseOutcome::Run(args) => args,
        ParseOutcome::Usage => {
            println!("{}", cli::USAGE);
            return Ok(ExitCode::SUCCESS);
        }
        ParseOutcome::Exit(e) => e.exit(),
    };

    init_tracing(args.debug);

    let config = build_config(&args)?;
    print_config(&config);

    if let Err(e) = config.ensure_build_graph() {
        eprintln!("{}", e);
        return Ok(ExitCode::FAILURE);
    }

    let runner = InstrumentedRunner::new(&config);
    let mut profiler = Profiler::new(config, runner).context("Failed to load command cache")?;

    if !args.analyze_only {
        let commands = build_graph::enumerate_commands(profiler.config())?;
        profiler.run_build(commands.as_slice())?;
    }

    let analysis = profiler.analyze()?;
    profiler
        .write_reports(&analysis)
        .context("Failed to write reports")?;

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    fn hint(debug: bool, rust_log: Option<&str>) -> Option<LevelFilter> {
        log_filter(debug, rust_log).max_level_hint()
    }

    #[test]
    fn test_default_level_is_info() {
        assert_eq!(hint(false, None), Some(LevelFilter::INFO));
        assert_eq!(hint(false, Some("  ")), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_rust_log_overrides_default() {
        assert_eq!(hint(false, Some("warn")), Some(LevelFilter::WARN));
        assert_eq!(hint(false, Some("debug")), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_debug_flag_forces_trace() {
        assert_eq!(hint(true, Some("warn")), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_unparsable_rust_log_falls_back_to_info() {
        assert_eq!(hint(false, Some("compile_timer=loud")), Some(LevelFilter::INFO));
    }
}
