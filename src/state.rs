// ===============================
// src/state.rs
// ===============================
//
// State file (CSV) per fund:
//   code,alerted
//   150797,true
//   151796,false
//
// - load(): file belum ada -> map kosong (run pertama).
// - save(): tulis seluruh tabel ke <file>.tmp lalu rename, jadi file lama
//   tetap utuh kalau penulisan gagal di tengah jalan.
// - Nilai `True`/`False` dari file lama (notebook) tetap terbaca.
//

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::parse_bool;
use crate::domain::StateMap;
use crate::error::StateError;

#[derive(Debug, Serialize)]
struct StateRow<'a> {
    code: &'a str,
    alerted: bool,
}

#[derive(Debug, Deserialize)]
struct RawStateRow {
    code: String,
    alerted: String,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<StateMap, StateError> {
        let mut out = StateMap::new();
        if !self.path.exists() {
            info!(path = %self.path.display(), "no prior state, starting fresh");
            return Ok(out);
        }

        let file = fs::File::open(&self.path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        for (i, result) in reader.deserialize::<RawStateRow>().enumerate() {
            let row = result?;
            let alerted = parse_bool(&row.alerted).ok_or_else(|| StateError::BadFlag {
                row: i + 1,
                value: row.alerted.clone(),
            })?;
            out.insert(row.code, alerted);
        }
        debug!(path = %self.path.display(), entries = out.len(), "state loaded");
        Ok(out)
    }

    /// Replace the whole file with `entries`, written in the given order.
    pub fn save(&self, entries: &[(String, bool)]) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.tmp_path();
        let written = write_rows(&tmp, entries).and_then(|_| fs::rename(&tmp, &self.path).map_err(StateError::from));
        if let Err(e) = written {
            // jangan tinggalkan .tmp setengah jadi
            if let Err(rm) = fs::remove_file(&tmp) {
                debug!(path = %tmp.display(), error = %rm, "tmp state not removed");
            }
            return Err(e);
        }

        info!(path = %self.path.display(), entries = entries.len(), "state saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_rows(path: &Path, entries: &[(String, bool)]) -> Result<(), StateError> {
    let file = fs::File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for (code, alerted) in entries {
        writer.serialize(StateRow { code: code.as_str(), alerted: *alerted })?;
    }
    writer.flush()?;
    Ok(())
}
