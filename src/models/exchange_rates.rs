// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use super::currencies::{normalize_code, Currency};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use csv::Writer;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Every rate in a table is expressed as units of this currency per 1 USD
pub const BASE_CURRENCY: &str = "USD";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Mapping from currency code to its USD-relative rate.
///
/// All present rates are finite and `> 0`, and the base currency maps to `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    /// Build a table from raw provider or cache data. Codes are normalized,
    /// invalid rates are dropped, and a non-empty table always gets the base.
    ///
    /// When several raw keys normalize to the same code, a key already in
    /// normalized form wins, then the lexicographically smallest key.
    pub fn new(raw: HashMap<String, f64>) -> Self {
        let mut entries: Vec<(String, String, f64)> = raw
            .into_iter()
            .filter_map(|(key, rate)| normalize_code(&key).map(|code| (key, code, rate)))
            .collect();
        entries.sort_by(|(a_key, a_code, _), (b_key, b_code, _)| {
            (a_key.trim() != a_code.as_str(), a_key).cmp(&(b_key.trim() != b_code.as_str(), b_key))
        });

        let mut rates = BTreeMap::new();
        for (key, code, rate) in entries {
            if !rate.is_finite() || rate <= 0.0 {
                log::warn!("Dropping invalid rate for {}: {}", code, rate);
                continue;
            }
            if rates.contains_key(&code) {
                log::warn!("Dropping duplicate rate for {} under key {:?}", code, key);
                continue;
            }
            rates.insert(code, rate);
        }

        if rates.is_empty() {
            return Self { rates };
        }

        match rates.insert(BASE_CURRENCY.to_string(), 1.0) {
            Some(previous) if previous != 1.0 => {
                log::warn!("Base currency {} had rate {}, forcing 1.0", BASE_CURRENCY, previous);
            }
            _ => {}
        }

        Self { rates }
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        let code = normalize_code(code)?;
        self.rates.get(&code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Entries sorted by code
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.rates).context("Failed to encode rate table")
    }

    /// Decode a table written by [`RateTable::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, f64> =
            serde_json::from_str(json).context("Failed to decode rate table")?;
        Ok(Self::new(raw))
    }
}

/// An immutable, timestamped rate table produced by one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    table: RateTable,
    fetched_at: Option<DateTime<Utc>>,
    label: String,
}

impl RateSnapshot {
    pub fn new(table: RateTable, fetched_at: Option<DateTime<Utc>>) -> Self {
        let label = fetched_at.map(format_timestamp).unwrap_or_default();
        Self {
            table,
            fetched_at,
            label,
        }
    }

    /// Snapshot restored from storage. The stored `lastUpdated` text is kept
    /// as-is even when it is not in a format we can parse.
    pub fn from_cached(table: RateTable, last_updated: Option<String>) -> Self {
        let label = last_updated.unwrap_or_default();
        Self {
            fetched_at: parse_timestamp(&label),
            table,
            label,
        }
    }

    /// Snapshot stamped with the current time
    pub fn fetched_now(table: RateTable) -> Self {
        Self::new(table, Some(Utc::now()))
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Convert `amount` of `from` into `to`.
    ///
    /// Returns `None` when either code is missing from the table. No rounding
    /// is applied.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        convert(amount, from, to, self)
    }

    /// `lastUpdated` value as stored: empty when the timestamp is unknown
    pub fn last_updated_label(&self) -> String {
        self.label.clone()
    }
}

/// `amount * rate(to) / rate(from)`, or `None` on a lookup miss
pub fn convert(amount: f64, from: &str, to: &str, snapshot: &RateSnapshot) -> Option<f64> {
    let from_rate = snapshot.table.get(from)?;
    let to_rate = snapshot.table.get(to)?;
    Some(amount * (to_rate / from_rate))
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored `lastUpdated` value. Empty or unrecognised input yields `None`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Write the snapshot as CSV rows, sorted by code
pub fn write_rates_csv<W: Write>(snapshot: &RateSnapshot, writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);

    writer.write_record(["Code", "Name", "Rate", "Base", "Last Updated"])?;

    let last_updated = snapshot.last_updated_label();
    for (code, rate) in snapshot.table().iter() {
        let currency = Currency::from_code(code);
        writer.write_record([
            code,
            currency.name.as_str(),
            rate.to_string().as_str(),
            BASE_CURRENCY,
            last_updated.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Export the snapshot to `output_dir/exchange_rates_<timestamp>.csv`
pub fn export_rates_csv(snapshot: &RateSnapshot, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let csv_path = output_dir.join(format!("exchange_rates_{}.csv", timestamp));
    let file = fs::File::create(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;

    write_rates_csv(snapshot, file)?;
    log::info!("Wrote {} rates to {}", snapshot.table().len(), csv_path.display());

    Ok(csv_path)
}
