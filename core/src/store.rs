//! File-based save persistence.
//!
//! RULE: Only store.rs touches the save directory.
//! Everything else works on `SaveData` and calls store methods.
//!
//! FILE LAYOUT:
//!   <save_dir>/<nickname>_<stamp>.<ext>
//! where <stamp> is microseconds since the Unix epoch, zero padded to
//! STAMP_WIDTH digits, so a plain directory listing sorts chronologically.
//! Ordering always comes from the stamp, never from filesystem mtimes.
//! The nickname is everything before the last '_', so it must not contain
//! path separators; underscores are fine.

use crate::{
    catalog::ValuableCatalog,
    config::{FountainConfig, GenerationConfig, SaveConfig},
    error::{FountainError, FountainResult},
    save_data::SaveData,
    types::{Nickname, Timestamp},
};
use std::fs;
use std::path::{Path, PathBuf};

pub const STAMP_WIDTH: usize = 18;
const MAX_STAMP: u64 = 999_999_999_999_999_999;

/// One save file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFileEntry {
    pub nickname: Nickname,
    pub stamp:    u64,
    pub path:     PathBuf,
}

pub struct SaveStore {
    dir:        PathBuf,
    config:     SaveConfig,
    generation: GenerationConfig,
    catalog:    ValuableCatalog,
}

impl SaveStore {
    /// Open (or create) the save directory named in `config`.
    pub fn open(config: &FountainConfig, catalog: ValuableCatalog) -> FountainResult<Self> {
        config.validate()?;
        let dir = PathBuf::from(&config.save.save_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            config: config.save.clone(),
            generation: config.generation.clone(),
            catalog,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog(&self) -> &ValuableCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Create a blank save for `nickname` and persist it immediately.
    pub fn new_save_file(&self, nickname: &str, now: Timestamp) -> FountainResult<SaveData> {
        validate_nickname(nickname)?;
        let mut data = SaveData::new_blank(nickname, &self.catalog, &self.generation, now)?;
        let path = self.write_new(&mut data, now)?;
        log::info!("save: created '{nickname}' at {}", path.display());
        Ok(data)
    }

    /// Load the newest save for `nickname`, creating one if none exists.
    ///
    /// Creation is retried at most `load_retry_limit` times; a save that
    /// exists but cannot be parsed fails straight away.
    pub fn load(&self, nickname: &str, now: Timestamp) -> FountainResult<SaveData> {
        validate_nickname(nickname)?;
        let limit = self.config.load_retry_limit;
        let mut attempts = 0;
        loop {
            if let Some(entry) = self.latest_save(nickname)? {
                let mut data = self.read_entry(&entry)?;
                data.mark_loaded(now)?;
                log::info!(
                    "save: loaded '{nickname}' from {} (offline since last throw: {})",
                    entry.path.display(),
                    data.out_of_game_time_since_last_throw()
                );
                return Ok(data);
            }
            if attempts >= limit {
                return Err(FountainError::SaveNotFound { nickname: nickname.to_string(), attempts });
            }
            attempts += 1;
            log::warn!("save: no save for '{nickname}', creating one (attempt {attempts}/{limit})");
            self.new_save_file(nickname, now)?;
        }
    }

    /// Discard in-memory state and load the newest file again.
    pub fn reload(&self, data: &SaveData, now: Timestamp) -> FountainResult<SaveData> {
        self.load(&data.nickname, now)
    }

    /// Persist `data` as a new file, then trim old files.
    ///
    /// With `use_re_save_delay`, refuses to write within the configured
    /// re-save delay of the previous save.
    pub fn save(&self, data: &mut SaveData, now: Timestamp, use_re_save_delay: bool) -> FountainResult<PathBuf> {
        if use_re_save_delay {
            let delay = self.config.re_save_delay();
            if now - data.last_save_time() < delay {
                log::warn!(
                    "save: '{}' throttled, last save {} attempted {now}",
                    data.nickname,
                    data.last_save_time()
                );
                return Err(FountainError::ReSaveThrottled {
                    nickname:  data.nickname.clone(),
                    last_save: data.last_save_time(),
                    attempted: now,
                    delay,
                });
            }
        }
        let path = self.write_new(data, now)?;
        log::info!("save: wrote '{}' to {}", data.nickname, path.display());
        Ok(path)
    }

    // ── Listing ────────────────────────────────────────────────

    /// Every save for `nickname`, oldest first.
    pub fn list_saves(&self, nickname: &str) -> FountainResult<Vec<SaveFileEntry>> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            let file_name = dir_entry.file_name();
            let Some(file_name) = file_name.to_str() else { continue };
            if let Some((name, stamp)) = parse_save_file_name(file_name, &self.config.extension) {
                if name == nickname {
                    entries.push(SaveFileEntry {
                        nickname: name.to_string(),
                        stamp,
                        path: dir_entry.path(),
                    });
                }
            }
        }
        entries.sort_by_key(|e| e.stamp);
        Ok(entries)
    }

    pub fn latest_save(&self, nickname: &str) -> FountainResult<Option<SaveFileEntry>> {
        Ok(self.list_saves(nickname)?.pop())
    }

    /// Delete every save for `nickname`. Returns how many files went.
    pub fn delete_saves(&self, nickname: &str) -> FountainResult<usize> {
        validate_nickname(nickname)?;
        let entries = self.list_saves(nickname)?;
        for entry in &entries {
            fs::remove_file(&entry.path)?;
        }
        log::info!("save: deleted {} saves for '{nickname}'", entries.len());
        Ok(entries.len())
    }

    // ── Internals ──────────────────────────────────────────────

    fn write_new(&self, data: &mut SaveData, now: Timestamp) -> FountainResult<PathBuf> {
        let mut stamp = stamp_for(now)?;
        if let Some(latest) = self.latest_save(&data.nickname)? {
            if latest.stamp >= stamp {
                stamp = latest.stamp + 1;
            }
        }
        if stamp > MAX_STAMP {
            return Err(FountainError::InvalidArgument(format!(
                "save stamp {stamp} does not fit in {STAMP_WIDTH} digits"
            )));
        }

        let previous_save_time = data.last_save_time();
        data.set_last_save_time(now);
        let result = self.write_file(data, stamp);
        if result.is_err() {
            data.set_last_save_time(previous_save_time);
        }
        let path = result?;

        let trimmed = self.trim(&data.nickname)?;
        if trimmed > 0 {
            log::debug!("save: trimmed {trimmed} old saves for '{}'", data.nickname);
        }
        Ok(path)
    }

    /// Write via a temporary sibling and rename, so a crash mid-write never
    /// leaves a half-written file with a valid save name.
    fn write_file(&self, data: &SaveData, stamp: u64) -> FountainResult<PathBuf> {
        let json = serde_json::to_string_pretty(data)?;
        let path = self.dir.join(save_file_name(&data.nickname, stamp, &self.config.extension));
        let tmp = path.with_file_name(format!(
            "{}.tmp",
            save_file_name(&data.nickname, stamp, &self.config.extension)
        ));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Delete the oldest files beyond `backup_save_slots`.
    fn trim(&self, nickname: &str) -> FountainResult<usize> {
        let entries = self.list_saves(nickname)?;
        let excess = entries.len().saturating_sub(self.config.backup_save_slots);
        for entry in entries.iter().take(excess) {
            fs::remove_file(&entry.path)?;
        }
        Ok(excess)
    }

    fn read_entry(&self, entry: &SaveFileEntry) -> FountainResult<SaveData> {
        let raw = fs::read_to_string(&entry.path)?;
        let corrupt = |reason: String, raw: String| FountainError::SaveData {
            nickname: entry.nickname.clone(),
            reason,
            raw,
        };

        let data: SaveData = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(e) => return Err(corrupt(format!("{}: {e}", entry.path.display()), raw)),
        };
        if data.nickname != entry.nickname {
            return Err(corrupt(
                format!("file {} holds nickname '{}'", entry.path.display(), data.nickname),
                raw,
            ));
        }
        if let Err(e) = data.validate(&self.catalog) {
            return Err(corrupt(format!("{}: {e}", entry.path.display()), raw));
        }
        Ok(data)
    }
}

/// `<nickname>_<stamp>.<ext>` with the stamp zero padded to STAMP_WIDTH.
pub fn save_file_name(nickname: &str, stamp: u64, extension: &str) -> String {
    format!("{nickname}_{stamp:0width$}.{extension}", width = STAMP_WIDTH)
}

/// Inverse of `save_file_name`. `None` for anything that isn't a save.
pub fn parse_save_file_name<'a>(file_name: &'a str, extension: &str) -> Option<(&'a str, u64)> {
    let stem = file_name.strip_suffix(extension)?.strip_suffix('.')?;
    let (nickname, digits) = stem.rsplit_once('_')?;
    if nickname.is_empty() || digits.len() != STAMP_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((nickname, digits.parse().ok()?))
}

/// File stamp for an instant: microseconds since the Unix epoch.
pub fn stamp_for(at: Timestamp) -> FountainResult<u64> {
    u64::try_from(at.timestamp_micros()).map_err(|_| {
        FountainError::InvalidArgument(format!("cannot stamp a save at {at}, before the Unix epoch"))
    })
}

pub fn validate_nickname(nickname: &str) -> FountainResult<()> {
    let bad = nickname.is_empty()
        || nickname.starts_with('.')
        || nickname
            .chars()
            .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control());
    if bad {
        return Err(FountainError::InvalidNickname(nickname.to_string()));
    }
    Ok(())
}
