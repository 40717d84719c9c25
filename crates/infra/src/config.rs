//! Ledger configuration.
//!
//! Read from environment variables with defaults. A value that does not parse is
//! logged and replaced by its default, so a typo never keeps the service from
//! starting.
//!
//! | Variable                      | Default |
//! |-------------------------------|---------|
//! | `STOCKLEDGER_INBOUND_PREFIX`  | `PN`    |
//! | `STOCKLEDGER_OUTBOUND_PREFIX` | `PX`    |
//! | `STOCKLEDGER_CODE_WIDTH`      | `4`     |

use stockledger_inventory::{Direction, ReceiptCodeFormat};

pub const INBOUND_PREFIX_VAR: &str = "STOCKLEDGER_INBOUND_PREFIX";
pub const OUTBOUND_PREFIX_VAR: &str = "STOCKLEDGER_OUTBOUND_PREFIX";
pub const CODE_WIDTH_VAR: &str = "STOCKLEDGER_CODE_WIDTH";

const MAX_CODE_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub inbound: ReceiptCodeFormat,
    pub outbound: ReceiptCodeFormat,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            inbound: ReceiptCodeFormat::default_for(Direction::Inbound),
            outbound: ReceiptCodeFormat::default_for(Direction::Outbound),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let width = match lookup(CODE_WIDTH_VAR) {
            None => defaults.inbound.width,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(w) if (1..=MAX_CODE_WIDTH).contains(&w) => w,
                _ => {
                    tracing::warn!(
                        var = CODE_WIDTH_VAR,
                        value = %raw,
                        "invalid receipt code width, using default"
                    );
                    defaults.inbound.width
                }
            },
        };

        let inbound_prefix = prefix(&lookup, INBOUND_PREFIX_VAR, &defaults.inbound.prefix);
        let outbound_prefix = prefix(&lookup, OUTBOUND_PREFIX_VAR, &defaults.outbound.prefix);

        // Codes are resolved across both ledgers by prefix.
        if outbound_prefix == inbound_prefix {
            tracing::warn!(
                prefix = %inbound_prefix,
                "inbound and outbound prefixes are equal, using defaults"
            );
            return Self {
                inbound: ReceiptCodeFormat::new(defaults.inbound.prefix, width),
                outbound: ReceiptCodeFormat::new(defaults.outbound.prefix, width),
            };
        }

        Self {
            inbound: ReceiptCodeFormat::new(inbound_prefix, width),
            outbound: ReceiptCodeFormat::new(outbound_prefix, width),
        }
    }

    pub fn format(&self, direction: Direction) -> &ReceiptCodeFormat {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        }
    }
}

fn prefix(lookup: &impl Fn(&str) -> Option<String>, var: &str, default: &str) -> String {
    match lookup(var) {
        None => default.to_string(),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
                tracing::warn!(var, value = %raw, "invalid receipt prefix, using default");
                default.to_string()
            } else {
                trimmed.to_ascii_uppercase()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = LedgerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.inbound.format(1).as_str(), "PN0001");
    }

    #[test]
    fn reads_prefixes_and_width() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (INBOUND_PREFIX_VAR, "in"),
            (OUTBOUND_PREFIX_VAR, "OUT"),
            (CODE_WIDTH_VAR, "6"),
        ]));
        assert_eq!(config.format(Direction::Inbound).format(12).as_str(), "IN000012");
        assert_eq!(config.format(Direction::Outbound).format(3).as_str(), "OUT000003");
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (INBOUND_PREFIX_VAR, "P-1"),
            (CODE_WIDTH_VAR, "zero"),
        ]));
        assert_eq!(config, LedgerConfig::default());

        let config = LedgerConfig::from_lookup(lookup(&[(CODE_WIDTH_VAR, "0")]));
        assert_eq!(config.inbound.width, 4);
    }

    #[test]
    fn equal_prefixes_are_rejected() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (INBOUND_PREFIX_VAR, "R"),
            (OUTBOUND_PREFIX_VAR, "R"),
            (CODE_WIDTH_VAR, "5"),
        ]));
        assert_eq!(config.inbound.prefix, "PN");
        assert_eq!(config.outbound.prefix, "PX");
        assert_eq!(config.inbound.width, 5);
    }
}
