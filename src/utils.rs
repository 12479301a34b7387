// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::models::{Currency, RateSnapshot};

/// `1 USD = 0.92 EUR`. The converted value is rounded to two decimals here,
/// never in the store.
pub fn format_conversion(amount: f64, from: &str, converted: f64, to: &str) -> String {
    format!(
        "{} {} = {:.2} {}",
        amount,
        from.to_uppercase(),
        converted,
        to.to_uppercase()
    )
}

pub fn format_currency(currency: &Currency) -> String {
    let mut line = String::new();
    if !currency.flag.is_empty() {
        line.push_str(&currency.flag);
        line.push(' ');
    }
    line.push_str(&format!("{} ({})", currency.name, currency.code));
    if !currency.symbol.is_empty() {
        line.push_str(&format!(" {}", currency.symbol));
    }
    line
}

pub fn format_last_updated(snapshot: &RateSnapshot) -> String {
    format!("Last updated: {}", display_label(snapshot))
}

pub fn format_status(snapshot: Option<&RateSnapshot>) -> String {
    match snapshot {
        None => "No rates known".to_string(),
        Some(snapshot) => format!(
            "Rates known ({} currencies), last updated {}",
            snapshot.table().len(),
            display_label(snapshot)
        ),
    }
}

fn display_label(snapshot: &RateSnapshot) -> String {
    let label = snapshot.last_updated_label();
    if label.trim().is_empty() {
        "unknown".to_string()
    } else {
        label
    }
}
