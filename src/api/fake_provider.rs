// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::RateProvider;
use crate::error::FetchError;
use crate::models::RateTable;

/// Provider that replays queued responses, then fails with a network error
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    responses: Arc<Mutex<VecDeque<Result<RateTable, FetchError>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rates(rates: &[(&str, f64)]) -> Self {
        let provider = Self::new();
        provider.push_rates(rates);
        provider
    }

    pub fn push_rates(&self, rates: &[(&str, f64)]) {
        let raw: HashMap<String, f64> = rates
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect();
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(RateTable::new(raw)));
    }

    pub fn push_error(&self, error: FetchError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RateProvider for ScriptedProvider {
    async fn latest_rates(&self) -> Result<RateTable, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Network("no scripted response".to_string())))
    }
}
