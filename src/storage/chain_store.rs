use crate::core::{Ledger, LedgerSnapshot};
use crate::error::Result;
use crate::utils::{from_json, to_json};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_FILE: &str = "tally_chain.json";

/// Ledger snapshot kept as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct ChainStore {
    path: PathBuf,
}

impl ChainStore {
    pub fn new(path: impl Into<PathBuf>) -> ChainStore {
        ChainStore { path: path.into() }
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write through a sibling temp file so a crash never leaves half a snapshot
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let text = to_json(&ledger.snapshot())?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, text)?;
        fs::rename(&staging, &self.path)?;
        info!(
            "Saved {} block(s) to {}",
            ledger.height(),
            self.path.display()
        );
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<LedgerSnapshot> {
        debug!("Reading snapshot from {}", self.path.display());
        let text = fs::read_to_string(&self.path)?;
        from_json(&text)
    }

    /// Load and re-validate; a tampered file yields `ChainCorrupted`
    pub fn load(&self) -> Result<Ledger> {
        Ledger::from_snapshot(self.load_snapshot()?)
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_FILE)
    }
}
