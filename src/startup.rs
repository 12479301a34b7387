// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::api::RateProvider;
use crate::error::FetchError;
use crate::models::RateSnapshot;
use crate::storage::KeyValueStore;
use crate::store::RateStore;

/// How startup obtained its rates
#[derive(Debug, Clone, PartialEq)]
pub enum StartupOutcome {
    Cached(RateSnapshot),
    Fetched(RateSnapshot),
    Failed(FetchError),
}

impl StartupOutcome {
    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        match self {
            StartupOutcome::Cached(snapshot) | StartupOutcome::Fetched(snapshot) => Some(snapshot),
            StartupOutcome::Failed(_) => None,
        }
    }
}

/// Use cached rates when present, otherwise fetch.
///
/// With `force_refresh` the cache is skipped; if that fetch fails the cache
/// is still loaded so the store has something to convert with, but the
/// outcome reports the failure.
pub async fn initialize<P, S>(store: &mut RateStore<P, S>, force_refresh: bool) -> StartupOutcome
where
    P: RateProvider,
    S: KeyValueStore,
{
    store.load_known_currencies().await;

    if !force_refresh {
        if let Some(snapshot) = store.load_cached().await {
            return StartupOutcome::Cached(snapshot);
        }
    }

    match store.refresh().await {
        Ok(snapshot) => StartupOutcome::Fetched(snapshot),
        Err(e) => {
            if force_refresh && store.load_cached().await.is_some() {
                log::info!("Falling back to cached rates");
            }
            StartupOutcome::Failed(e)
        }
    }
}
