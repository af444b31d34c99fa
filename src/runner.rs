//! Command execution with wall-clock timing
//!
//! Compile commands are rewritten to go through the instrumented compiler
//! with the trace flag appended; link commands run verbatim. One child at a
//! time, timed from spawn to exit. With a timeout configured the child gets
//! its own process group, and the whole group is killed on expiry.

use crate::action::{split_command, ActionKind};
use crate::config::ProfileConfig;
use crate::error::{ProfileError, Result};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Executes one build command and reports its elapsed wall time
pub trait CommandRunner {
    fn run(&mut self, command: &str, kind: ActionKind) -> Result<Duration>;
}

/// Build the command line that actually gets executed
pub fn rewrite_command(config: &ProfileConfig, command: &str, kind: ActionKind) -> String {
    if kind.is_link() {
        return command.to_string();
    }

    let compiler = if kind.is_cpp() {
        &config.cxx_compiler
    } else {
        &config.c_compiler
    };
    let args = split_command(command).map(|(_, args)| args).unwrap_or("");

    format!("{} {} {}", compiler, config.settings.trace_flag, args)
}

/// Runs commands through `sh -c` inside the build directory
#[derive(Debug, Clone)]
pub struct InstrumentedRunner {
    config: ProfileConfig,
}

impl InstrumentedRunner {
    pub fn new(config: &ProfileConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn working_dir(&self) -> &PathBuf {
        &self.config.build_dir
    }
}

impl CommandRunner for InstrumentedRunner {
    fn run(&mut self, command: &str, kind: ActionKind) -> Result<Duration> {
        let exec_cmd = rewrite_command(&self.config, command, kind);
        tracing::info!("Executing command: {}", exec_cmd);

        let timeout = self.config.command_timeout();
        let mut shell = Command::new("sh");
        shell.arg("-c").arg(&exec_cmd).current_dir(self.working_dir());
        if timeout.is_some() {
            shell.process_group(0);
        }

        let start = Instant::now();
        let mut child = shell.spawn().map_err(|source| ProfileError::Spawn {
            command: exec_cmd.clone(),
            source,
        })?;

        let status = match timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout, &exec_cmd)?,
            None => child.wait()?,
        };
        let elapsed = start.elapsed();

        if !status.success() {
            tracing::warn!("command exited with {}: {}", status, exec_cmd);
        }
        tracing::info!("  .. in {:.0} ms", elapsed.as_secs_f64() * 1000.0);

        Ok(elapsed)
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration, command: &str) -> Result<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            kill_group(child)?;
            child.wait()?;
            return Err(ProfileError::CommandTimedOut {
                command: command.to_string(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// SIGKILL the child's process group, which the child leads
fn kill_group(child: &Child) -> Result<()> {
    let pgid = Pid::from_raw(child.id() as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(std::io::Error::from(errno).into()),
    }
}
