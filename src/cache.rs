//! Persistent command timing cache
//!
//! Maps the literal command line to its action kind and elapsed seconds.
//! A command is executed at most once: any later lookup with the exact same
//! string is a hit. The store is rewritten in full after every execution, so
//! a crash loses at most the command that was running.

use crate::action::ActionKind;
use crate::error::{ProfileError, Result};
use crate::runner::CommandRunner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Timing of one executed build command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompileRecord {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(rename = "elapsedSeconds")]
    pub elapsed_secs: f64,
}

/// Whether `get_or_run` hit the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Executed,
}

/// Command cache bound to its on-disk store
#[derive(Debug)]
pub struct CommandCache {
    path: PathBuf,
    records: BTreeMap<String, CompileRecord>,
}

impl CommandCache {
    /// Load the store at `path`; a missing file yields an empty cache
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| ProfileError::CacheFormat {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            BTreeMap::new()
        };

        tracing::info!(" .. loaded {} results", records.len());
        Ok(Self { path, records })
    }

    /// Return the cached record for `command`, running it on a miss
    ///
    /// On a miss the new record is persisted before returning.
    pub fn get_or_run<R: CommandRunner + ?Sized>(
        &mut self,
        command: &str,
        kind: ActionKind,
        runner: &mut R,
    ) -> Result<(CompileRecord, CacheOutcome)> {
        if let Some(record) = self.records.get(command) {
            return Ok((*record, CacheOutcome::Hit));
        }

        let elapsed = runner.run(command, kind)?;
        let record = CompileRecord {
            kind,
            elapsed_secs: elapsed.as_secs_f64(),
        };
        self.records.insert(command.to_string(), record);
        self.save()?;

        Ok((record, CacheOutcome::Executed))
    }

    /// Rewrite the whole store
    ///
    /// Written to a sibling temp file first and renamed over the store.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records).map_err(|e| {
            ProfileError::CacheFormat {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn get(&self, command: &str) -> Option<&CompileRecord> {
        self.records.get(command)
    }

    pub fn records(&self) -> &BTreeMap<String, CompileRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
