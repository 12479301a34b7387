// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Exchange-rate cache and currency conversion.
//!
//! [`store::RateStore`] keeps the latest USD-based rate snapshot from a
//! [`api::RateProvider`] and persists it through a [`storage::KeyValueStore`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod startup;
pub mod storage;
pub mod store;
pub mod utils;

pub use error::FetchError;
pub use models::{add_currency, convert, Currency, KnownCurrencies, RateSnapshot, RateTable};
pub use startup::{initialize, StartupOutcome};
pub use store::RateStore;
