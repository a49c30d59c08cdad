//! Trading-session table
//!
//! Session metadata lives in the release data folder of a root
//! (`Release/Data`, with `Debug/Data` accepted as a stand-in). The table file
//! maps a (timezone profile, product) pair to its intraday windows:
//!
//! ```text
//! 210,SHFE.rb,09:00:00-10:15:00;10:30:00-11:30:00;13:30:00-15:00:00
//! ```

use chrono::NaiveTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::{BAR_TIME_FORMAT, DEBUG_DATA_RELPATH, RELEASE_DATA_RELPATH, SESSION_FILE_NAME};
use crate::error::{Error, Result};
use crate::models::{Product, TradingSession};

/// Locate the session/ticker metadata folder under a data root
pub fn metadata_dir(root: &Path) -> Result<PathBuf> {
    let release = root.join(RELEASE_DATA_RELPATH);
    if release.is_dir() {
        return Ok(release);
    }
    let debug = root.join(DEBUG_DATA_RELPATH);
    if debug.is_dir() {
        return Ok(debug);
    }
    Err(Error::Config(format!(
        "No metadata folder under {} (looked for {} and {})",
        root.display(),
        RELEASE_DATA_RELPATH,
        DEBUG_DATA_RELPATH
    )))
}

/// (profile, product) -> trading session, loaded once per run
#[derive(Debug, Clone)]
pub struct SessionTable {
    sessions: HashMap<(String, Product), TradingSession>,
}

impl SessionTable {
    /// Load `TradingSessions.csv` from a metadata folder
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SESSION_FILE_NAME);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read session table {}: {}", path.display(), e))
        })?;
        Self::parse(&content, &path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut sessions = HashMap::new();
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.splitn(3, ',').collect();
            if fields.len() != 3 {
                return Err(Error::Config(format!(
                    "Session table {} line {}: expected 3 fields, got {}",
                    path.display(),
                    line_num + 1,
                    fields.len()
                )));
            }
            let profile = fields[0].to_string();
            let product: Product = fields[1].parse().map_err(|e: Error| {
                Error::Config(format!(
                    "Session table {} line {}: {}",
                    path.display(),
                    line_num + 1,
                    e
                ))
            })?;
            let windows = parse_windows(fields[2]).map_err(|e| {
                Error::Config(format!(
                    "Session table {} line {}: {}",
                    path.display(),
                    line_num + 1,
                    e
                ))
            })?;
            sessions.insert((profile, product), TradingSession::new(windows));
        }
        Ok(Self { sessions })
    }

    /// Session for a (profile, product) pair; misses are routine
    pub fn get(&self, profile: &str, product: &Product) -> Option<&TradingSession> {
        self.sessions.get(&(profile.to_string(), product.clone()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn parse_windows(raw: &str) -> Result<Vec<(NaiveTime, NaiveTime)>> {
    let mut windows = Vec::new();
    for part in raw.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (start_str, end_str) = part
            .split_once('-')
            .ok_or_else(|| Error::Parse(format!("bad session window '{}'", part)))?;
        let start = NaiveTime::parse_from_str(start_str, BAR_TIME_FORMAT)
            .map_err(|e| Error::Parse(format!("bad window start '{}': {}", start_str, e)))?;
        let end = NaiveTime::parse_from_str(end_str, BAR_TIME_FORMAT)
            .map_err(|e| Error::Parse(format!("bad window end '{}': {}", end_str, e)))?;
        if end < start {
            return Err(Error::Parse(format!(
                "session window ends before it starts: '{}'",
                part
            )));
        }
        windows.push((start, end));
    }
    Ok(windows)
}
