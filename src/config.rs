use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use simple_expand_tilde::expand_tilde;

use crate::Card;

/// Expand '~' in the given path.
pub fn normalize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    expand_tilde(path.as_ref()).ok_or_else(|| anyhow!("Cannot expand ~ to a home directory"))
}

/// Which parsing family a statement export belongs to.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StatementFormat {
    /// date, post date, description, category, type, amount - canonical signs.
    Chase,
    /// date, description, amount, category - inverted signs.
    Amex,
}

/// One statement export and the account it belongs to.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// The label to give this account in reports.
    pub label: String,
    /// The card to tag parsed transactions with.
    pub card: Card,
    /// The parsing family for this issuer's exports.
    pub format: StatementFormat,
    /// Where the statement CSV lives.
    #[serde(deserialize_with = "deserialize_path")]
    pub file: PathBuf,
}

/// A fixed monthly obligation with no statement row of its own.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RecurringCharge {
    /// The description to synthesize, e.g. "Monthly Rent Payment".
    pub description: String,
    /// The monthly amount. Must be negative - it is spending.
    pub amount: Decimal,
    /// The category to file the charge under.
    pub category: String,
}

/// Locations of paths used by the program.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuxiliaryPaths {
    /// The directory where credits and category overrides are persisted.
    #[serde(deserialize_with = "deserialize_path")]
    pub storage: PathBuf,
}

/// The aggregation of everything found in the config file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigData {
    /// The statement exports to load, one entry per account.
    pub accounts: Vec<AccountConfig>,
    /// The recurring charge to synthesize alongside parsed statements.
    pub recurring: RecurringCharge,
    /// Locations of paths used by the program.
    pub paths: AuxiliaryPaths,
}

impl ConfigData {
    /// Create a new ConfigData from raw string data.
    pub fn new(raw_data: &str) -> Result<Self> {
        let config: ConfigData = toml::from_str(raw_data)?;
        config.validate()?;
        Ok(config)
    }

    /// Ensure the read-in config makes logical sense.
    fn validate(&self) -> Result<()> {
        if !self.paths.storage.is_dir() {
            return Err(anyhow!(format!(
                "The storage path {:#?} is not a directory.",
                self.paths.storage
            )));
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(&account.label) {
                return Err(anyhow!(format!(
                    "The account label {:#?} is defined more than once.",
                    account.label
                )));
            }
            if !account.file.is_file() {
                return Err(anyhow!(format!(
                    "The statement file {:#?} for account {:#?} does not exist.",
                    account.file, account.label
                )));
            }
        }

        if self.recurring.amount >= Decimal::ZERO {
            return Err(anyhow!(
                "The recurring amount must be negative - it represents spending."
            ));
        }

        Ok(())
    }
}

/// Instructions on how to deserialize a path object.
fn deserialize_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    normalize_path(s).map_err(serde::de::Error::custom)
}
