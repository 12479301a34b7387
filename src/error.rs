// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

/// Failure of a rate refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport failure, or a payload that does not have the expected shape
    #[error("Network error: {0}")]
    Network(String),
    /// The provider answered with `result: "error"`
    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Network(format!("Failed to parse response: {}", e))
    }
}
