//! CSV file data adapter.
//!
//! One `{symbol}.csv` per symbol under a base directory, optionally split
//! into download chunks named `{symbol}_<suffix>.csv` (for example
//! `SPY_2023.csv`, `SPY_2024.csv`); all files for a symbol are merged, with
//! the earlier-listed file winning on duplicate timestamps. Columns are
//! addressed through the header row: a `Datetime` (or `Date`) column and a
//! `Close` column, extra columns ignored. Timestamps parse as
//! `%Y-%m-%d %H:%M:%S` with a date-only fallback read as midnight.

use crate::domain::bar::{merge_chunks, PriceBar};
use crate::domain::error::PairtraderError;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Chunk files for `symbol`, sorted by name so merge order is stable.
    fn chunk_paths(&self, symbol: &str) -> Result<Vec<PathBuf>, PairtraderError> {
        let entries = match fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PairtraderError::DataSource {
                    reason: format!(
                        "failed to read directory {}: {}",
                        self.base_path.display(),
                        e
                    ),
                })
            }
        };

        let prefix = format!("{}_", symbol);
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PairtraderError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.starts_with(&prefix) && name_str.ends_with(".csv") {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<PriceBar>, PairtraderError> {
        let mut paths = Vec::new();
        let base = self.csv_path(symbol);
        if base.is_file() {
            paths.push(base);
        }
        paths.extend(self.chunk_paths(symbol)?);

        if paths.is_empty() {
            return Err(PairtraderError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let mut chunks = Vec::with_capacity(paths.len());
        for path in &paths {
            chunks.push(self.read_file(path, symbol)?);
        }
        Ok(merge_chunks(chunks))
    }

    fn read_file(&self, path: &Path, symbol: &str) -> Result<Vec<PriceBar>, PairtraderError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PairtraderError::NoData {
                    symbol: symbol.to_string(),
                }
            } else {
                PairtraderError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                }
            }
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| PairtraderError::DataSource {
            reason: format!("{}: {}", path.display(), e),
        })?;
        let ts_idx = find_column(headers, &["datetime", "date"]).ok_or_else(|| {
            PairtraderError::DataSource {
                reason: format!("{}: missing Datetime column", path.display()),
            }
        })?;
        let close_idx =
            find_column(headers, &["close"]).ok_or_else(|| PairtraderError::DataSource {
                reason: format!("{}: missing Close column", path.display()),
            })?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| PairtraderError::DataSource {
                reason: format!("{}: {}", path.display(), e),
            })?;

            let ts_str = record
                .get(ts_idx)
                .ok_or_else(|| PairtraderError::DataSource {
                    reason: format!("{}: short row", path.display()),
                })?;
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| {
                PairtraderError::DataSource {
                    reason: format!("{}: unparseable timestamp {:?}", path.display(), ts_str),
                }
            })?;

            let close_str = record
                .get(close_idx)
                .ok_or_else(|| PairtraderError::DataSource {
                    reason: format!("{}: short row", path.display()),
                })?;
            let close: f64 = close_str
                .trim()
                .parse()
                .map_err(|_| PairtraderError::DataSource {
                    reason: format!("{}: unparseable close {:?}", path.display(), close_str),
                })?;

            // Holiday rows and data glitches come through as zeros; drop
            // them here so every bar downstream is usable.
            if !(close.is_finite() && close > 0.0) {
                continue;
            }

            bars.push(PriceBar {
                symbol: symbol.to_string(),
                timestamp,
                close,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

impl DataPort for CsvAdapter {
    fn fetch_history(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, PairtraderError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| {
            let date = b.timestamp.date();
            start_date.is_none_or(|start| date >= start) && end_date.is_none_or(|end| date <= end)
        });
        Ok(bars)
    }

    fn fetch_recent(&self, symbol: &str, limit: usize) -> Result<Vec<PriceBar>, PairtraderError> {
        let bars = self.read_all(symbol)?;
        let skip = bars.len().saturating_sub(limit);
        Ok(bars[skip..].to_vec())
    }

    fn list_symbols(&self) -> Result<Vec<String>, PairtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PairtraderError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| PairtraderError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".csv") {
                // A chunk file's symbol is everything before the first
                // underscore.
                let symbol = match stem.split_once('_') {
                    Some((base, _)) => base,
                    None => stem,
                };
                symbols.insert(symbol.to_string());
            }
        }

        Ok(symbols.into_iter().collect())
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PairtraderError> {
        let bars = self.read_all(symbol)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.timestamp, last.timestamp, bars.len()))),
            _ => Ok(None),
        }
    }
}
