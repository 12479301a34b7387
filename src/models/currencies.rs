// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};

/// A currency the user can pick. Identity is `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub flag: String,
}

/// Display metadata for the currencies offered out of the box
const CATALOG: [(&str, &str, &str, &str); 5] = [
    ("USD", "United States Dollar", "$", "🇺🇸"),
    ("EUR", "Euro", "€", "🇪🇺"),
    ("GBP", "British Pound", "£", "🇬🇧"),
    ("JPY", "Japanese Yen", "¥", "🇯🇵"),
    ("INR", "Indian Rupee", "₹", "🇮🇳"),
];

/// Trim and uppercase a currency code. Returns `None` for blank input.
pub fn normalize_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_uppercase())
    }
}

impl Currency {
    /// Build a currency for an already normalized code, using catalog
    /// metadata when the code is known.
    pub fn from_code(code: &str) -> Self {
        match CATALOG.iter().find(|(c, ..)| *c == code) {
            Some((code, name, symbol, flag)) => Self {
                code: code.to_string(),
                name: name.to_string(),
                symbol: symbol.to_string(),
                flag: flag.to_string(),
            },
            None => Self {
                code: code.to_string(),
                name: code.to_string(),
                symbol: String::new(),
                flag: String::new(),
            },
        }
    }
}

/// The set of currency codes offered for selection, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownCurrencies {
    currencies: Vec<Currency>,
}

impl Default for KnownCurrencies {
    fn default() -> Self {
        Self {
            currencies: CATALOG
                .iter()
                .map(|(code, ..)| Currency::from_code(code))
                .collect(),
        }
    }
}

impl KnownCurrencies {
    pub fn empty() -> Self {
        Self {
            currencies: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.iter()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.currencies.iter().map(|c| c.code.as_str()).collect()
    }

    /// Case-insensitive membership test
    pub fn contains(&self, code: &str) -> bool {
        match normalize_code(code) {
            Some(code) => self.currencies.iter().any(|c| c.code == code),
            None => false,
        }
    }

    pub fn get(&self, code: &str) -> Option<&Currency> {
        let code = normalize_code(code)?;
        self.currencies.iter().find(|c| c.code == code)
    }

    /// Normalize `code` and append it if not already present.
    /// Returns true when the set changed.
    pub fn insert(&mut self, code: &str) -> bool {
        let Some(code) = normalize_code(code) else {
            return false;
        };
        if self.currencies.iter().any(|c| c.code == code) {
            return false;
        }
        self.currencies.push(Currency::from_code(&code));
        true
    }

    /// Append every currency from `other` not already present, keeping
    /// the current entries in place. Returns the number added.
    pub fn merge(&mut self, other: &KnownCurrencies) -> usize {
        let mut added = 0;
        for currency in other.iter() {
            if !self.currencies.iter().any(|c| c.code == currency.code) {
                self.currencies.push(currency.clone());
                added += 1;
            }
        }
        added
    }
}

impl FromIterator<Currency> for KnownCurrencies {
    fn from_iter<I: IntoIterator<Item = Currency>>(iter: I) -> Self {
        let mut known = KnownCurrencies::empty();
        for currency in iter {
            if let Some(code) = normalize_code(&currency.code) {
                if !known.contains(&code) {
                    known.currencies.push(Currency { code, ..currency });
                }
            }
        }
        known
    }
}

/// Return `known` with `code` added. Blank input and duplicates leave it unchanged.
pub fn add_currency(code: &str, known: &KnownCurrencies) -> KnownCurrencies {
    let mut updated = known.clone();
    updated.insert(code);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" jpy "), Some("JPY".to_string()));
        assert_eq!(normalize_code("Eur"), Some("EUR".to_string()));
        assert_eq!(normalize_code(""), None);
        assert_eq!(normalize_code("   \t"), None);
    }

    #[test]
    fn test_default_known_currencies() {
        let known = KnownCurrencies::default();
        assert_eq!(known.codes(), vec!["USD", "EUR", "GBP", "JPY", "INR"]);

        let eur = known.get("eur").unwrap();
        assert_eq!(eur.name, "Euro");
        assert_eq!(eur.symbol, "€");
    }

    #[test]
    fn test_add_currency_normalizes_and_is_idempotent() {
        let known = KnownCurrencies::empty();
        let once = add_currency("jpy", &known);
        let twice = add_currency("JPY", &once);
        let thrice = add_currency("  Jpy ", &twice);

        assert_eq!(thrice.codes(), vec!["JPY"]);
        assert_eq!(thrice.get("JPY").unwrap().name, "Japanese Yen");
    }

    #[test]
    fn test_add_currency_blank_is_noop() {
        let known = KnownCurrencies::default();
        assert_eq!(add_currency("", &known), known);
        assert_eq!(add_currency("   ", &known), known);
    }

    #[test]
    fn test_add_unknown_code_uses_code_as_name() {
        let mut known = KnownCurrencies::default();
        assert!(known.insert("chf"));
        assert!(!known.insert("CHF"));

        let chf = known.get("CHF").unwrap();
        assert_eq!(chf.name, "CHF");
        assert!(chf.symbol.is_empty());
        assert!(chf.flag.is_empty());
        assert_eq!(known.codes().last(), Some(&"CHF"));
    }

    #[test]
    fn test_merge_keeps_existing_order() {
        let mut known = KnownCurrencies::empty();
        known.insert("EUR");
        known.insert("XAU");

        let provider: KnownCurrencies = ["AUD", "EUR", "USD"]
            .iter()
            .map(|c| Currency::from_code(c))
            .collect();

        assert_eq!(known.merge(&provider), 2);
        assert_eq!(known.codes(), vec!["EUR", "XAU", "AUD", "USD"]);
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let mut known = KnownCurrencies::empty();
        known.insert("GBP");
        let json = serde_json::to_string(&known).unwrap();
        assert!(json.starts_with('['));
        let back: KnownCurrencies = serde_json::from_str(&json).unwrap();
        assert_eq!(back, known);
    }
}
