// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};

use crate::api::RateProvider;
use crate::error::FetchError;
use crate::models::{Currency, KnownCurrencies, RateSnapshot, RateTable};
use crate::storage::KeyValueStore;

pub const RATES_KEY: &str = "exchangeRates";
pub const LAST_UPDATED_KEY: &str = "lastUpdated";
pub const CURRENCIES_KEY: &str = "knownCurrencies";

/// Latest known rate snapshot and the known-currency set, backed by
/// key-value storage.
///
/// Either no rates are known, or a snapshot is; `refresh` and `load_cached`
/// are the only ways to install one.
pub struct RateStore<P, S> {
    provider: P,
    storage: S,
    snapshot: Option<RateSnapshot>,
    known: KnownCurrencies,
}

impl<P: RateProvider, S: KeyValueStore> RateStore<P, S> {
    pub fn new(provider: P, storage: S) -> Self {
        Self {
            provider,
            storage,
            snapshot: None,
            known: KnownCurrencies::default(),
        }
    }

    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn known_currencies(&self) -> &KnownCurrencies {
        &self.known
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the persisted snapshot and make it current.
    ///
    /// Missing, unreadable or malformed data yields `None` and leaves the
    /// store untouched.
    pub async fn load_cached(&mut self) -> Option<RateSnapshot> {
        let raw = match self.storage.get(RATES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read cached rates: {:#}", e);
                return None;
            }
        };

        let table = match RateTable::from_json(&raw) {
            Ok(table) if !table.is_empty() => table,
            Ok(_) => return None,
            Err(e) => {
                log::warn!("Ignoring malformed cached rates: {:#}", e);
                return None;
            }
        };

        let last_updated = match self.storage.get(LAST_UPDATED_KEY).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read cached timestamp: {:#}", e);
                None
            }
        };

        let snapshot = RateSnapshot::from_cached(table, last_updated);
        log::info!("Loaded {} cached rates", snapshot.table().len());

        if let Err(e) = self.persist(&snapshot).await {
            log::warn!("Failed to persist cached rates: {:#}", e);
        }

        self.snapshot = Some(snapshot.clone());
        Some(snapshot)
    }

    /// Fetch a new snapshot from the provider and make it current.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&mut self) -> Result<RateSnapshot, FetchError> {
        let table = match self.provider.latest_rates().await {
            Ok(table) => table,
            Err(e) => {
                log::warn!("Failed to fetch exchange rates: {}", e);
                return Err(e);
            }
        };

        let snapshot = RateSnapshot::fetched_now(table);
        log::info!("Fetched {} exchange rates", snapshot.table().len());

        if let Err(e) = self.persist(&snapshot).await {
            log::warn!("Failed to persist exchange rates: {:#}", e);
        }

        self.snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Write the snapshot's table and timestamp. Empty tables are not written.
    pub async fn persist(&self, snapshot: &RateSnapshot) -> Result<()> {
        if snapshot.table().is_empty() {
            return Ok(());
        }

        self.storage
            .set(RATES_KEY, &snapshot.table().to_json()?)
            .await
            .context("Failed to store exchange rates")?;
        self.storage
            .set(LAST_UPDATED_KEY, &snapshot.last_updated_label())
            .await
            .context("Failed to store last updated timestamp")?;

        Ok(())
    }

    /// Convert using the current snapshot. `None` when no rates are known or
    /// either code is missing.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        let result = self.snapshot.as_ref()?.convert(amount, from, to);
        if result.is_none() {
            log::debug!("No rate for {} -> {}", from, to);
        }
        result
    }

    /// Restore the known-currency set. Missing or malformed data keeps the
    /// current set.
    pub async fn load_known_currencies(&mut self) {
        let raw = match self.storage.get(CURRENCIES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                log::warn!("Failed to read known currencies: {:#}", e);
                return;
            }
        };

        match serde_json::from_str::<Vec<Currency>>(&raw) {
            Ok(currencies) => {
                let known: KnownCurrencies = currencies.into_iter().collect();
                if !known.is_empty() {
                    self.known = known;
                }
            }
            Err(e) => log::warn!("Ignoring malformed known currencies: {}", e),
        }
    }

    /// Add a currency code to the known set. Returns whether it was added.
    pub async fn add_currency(&mut self, code: &str) -> Result<bool> {
        if !self.known.insert(code) {
            return Ok(false);
        }
        self.persist_known_currencies().await?;
        Ok(true)
    }

    /// Merge every code the provider currently quotes into the known set.
    /// Returns the number of new codes.
    pub async fn fetch_currencies(&mut self) -> Result<usize, FetchError> {
        let table = match self.provider.latest_rates().await {
            Ok(table) => table,
            Err(e) => {
                log::warn!("Error fetching currencies: {}", e);
                return Err(e);
            }
        };

        let listed: KnownCurrencies = table.codes().map(Currency::from_code).collect();
        let added = self.known.merge(&listed);

        if added > 0 {
            if let Err(e) = self.persist_known_currencies().await {
                log::warn!("Failed to persist known currencies: {:#}", e);
            }
        }

        Ok(added)
    }

    async fn persist_known_currencies(&self) -> Result<()> {
        let json = serde_json::to_string(&self.known)?;
        self.storage
            .set(CURRENCIES_KEY, &json)
            .await
            .context("Failed to store known currencies")
    }
}
