use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};

use crate::Transaction;

/// The categories a transaction can be reassigned to.
pub const AVAILABLE_CATEGORIES: [&str; 11] = [
    "Food & Drink",
    "Groceries",
    "Shopping",
    "Travel",
    "Health & Wellness",
    "Bills & Utilities",
    "Entertainment",
    "Gas",
    "Professional Services",
    "Personal",
    "Rent",
];

/// User-entered credits and category overrides, keyed by transaction key.
///
/// The store never touches the parsed transactions; it computes effective
/// values on top of them at read time. Every mutation updates the map in
/// memory first and then writes the whole document back to disk before
/// returning, so the persisted copy can trail the in-memory state but
/// never the other way around.
#[derive(Debug)]
pub struct AdjustmentStore {
    credits: BTreeMap<String, Decimal>,
    overrides: BTreeMap<String, String>,
    credits_path: PathBuf,
    overrides_path: PathBuf,
}

impl AdjustmentStore {
    /// Load both namespaces from the storage directory. Missing files
    /// mean nothing has been recorded yet and are not an error.
    pub fn load(storage: impl AsRef<Path>) -> Result<Self> {
        let credits_path = storage.as_ref().join("credits.json");
        let overrides_path = storage.as_ref().join("category-overrides.json");
        Ok(AdjustmentStore {
            credits: read_map(&credits_path)?,
            overrides: read_map(&overrides_path)?,
            credits_path,
            overrides_path,
        })
    }

    /// Record a partial or full credit against a transaction, e.g. a
    /// reimbursed share of a purchase. Rejected if negative or larger
    /// than the transaction's magnitude; prior state is kept on error.
    pub fn set_credit(&mut self, transaction: &Transaction, credit: Decimal) -> Result<()> {
        if credit < Decimal::ZERO {
            return Err(anyhow!("A credit cannot be negative."));
        }
        if credit > transaction.amount.abs() {
            return Err(anyhow!(format!(
                "A credit of {credit} exceeds the transaction amount of {}.",
                transaction.amount.abs()
            )));
        }
        self.credits.insert(transaction.key(), credit);
        write_map(&self.credits_path, &self.credits)
    }

    /// Clear any credit recorded against a transaction.
    pub fn clear_credit(&mut self, transaction: &Transaction) -> Result<()> {
        self.credits.remove(&transaction.key());
        write_map(&self.credits_path, &self.credits)
    }

    /// Reassign a transaction's category. The replacement must come from
    /// [`AVAILABLE_CATEGORIES`].
    pub fn set_category(&mut self, transaction: &Transaction, category: &str) -> Result<()> {
        if !AVAILABLE_CATEGORIES.contains(&category) {
            return Err(anyhow!(format!(
                "{category:?} is not one of the available categories."
            )));
        }
        self.overrides
            .insert(transaction.key(), category.to_string());
        write_map(&self.overrides_path, &self.overrides)
    }

    /// Reset a transaction to its original category.
    pub fn clear_category(&mut self, transaction: &Transaction) -> Result<()> {
        self.overrides.remove(&transaction.key());
        write_map(&self.overrides_path, &self.overrides)
    }

    /// The transaction's amount after applying any recorded credit.
    ///
    /// Crediting shrinks the magnitude toward zero but never flips the
    /// sign; a full credit yields exactly zero.
    pub fn effective_amount(&self, transaction: &Transaction) -> Decimal {
        let Some(credit) = self.credits.get(&transaction.key()) else {
            return transaction.amount;
        };
        let remaining = (transaction.amount.abs() - credit).max(Decimal::ZERO);
        if transaction.amount < Decimal::ZERO {
            -remaining
        } else {
            remaining
        }
    }

    /// The transaction's category after applying any recorded override.
    pub fn effective_category(&self, transaction: &Transaction) -> String {
        self.overrides
            .get(&transaction.key())
            .cloned()
            .unwrap_or_else(|| transaction.category.clone())
    }
}

/// Read one persisted namespace, defaulting to empty when absent.
fn read_map<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Cannot read the adjustment file {path:#?}"))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("The adjustment file {path:#?} is not valid JSON"))
}

/// Write one namespace back to disk as a whole document.
fn write_map<T: Serialize>(path: &Path, map: &BTreeMap<String, T>) -> Result<()> {
    let raw = serde_json::to_string_pretty(map)?;
    fs::write(path, raw)
        .with_context(|| format!("Cannot write the adjustment file {path:#?}"))?;
    Ok(())
}
