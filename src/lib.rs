mod adjust;
mod config;
mod dataset;
mod merchant;
mod statement;
mod stats;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;

pub use adjust::{AdjustmentStore, AVAILABLE_CATEGORIES};
pub use config::{normalize_path, ConfigData, StatementFormat};
pub use dataset::{detect_year, recurring_transactions, Dataset};
pub use merchant::{display_merchant, normalize_merchant, MIN_MERCHANT_LEN};
pub use statement::{parse_amex_csv, parse_chase_csv, StatementParse};
pub use stats::{
    net_spend, search_merchants, spend_by_category, spend_by_month, top_merchants, MerchantSummary,
};

/// The date format used by card statement exports.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Three-letter month abbreviations, indexed by zero-based month.
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The accounts a transaction can belong to.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Card {
    ChaseSapphire,
    Amazon,
    Amex,
    Checking,
}

impl Card {
    /// The label used for this account in display output.
    pub fn label(&self) -> &'static str {
        match self {
            Card::ChaseSapphire => "chase-sapphire",
            Card::Amazon => "amazon",
            Card::Amex => "amex",
            Card::Checking => "checking",
        }
    }
}

/// A single transaction in the canonical sign convention:
/// negative amount = purchase, positive amount = return/credit.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub card: Card,
    pub is_return: bool,
}

impl Transaction {
    /// The three-letter abbreviation of the month this transaction falls in.
    pub fn month_abbrev(&self) -> &'static str {
        MONTHS[self.date.month0() as usize]
    }

    /// The key under which credits and category overrides are recorded.
    ///
    /// Two transactions with identical date, description, and amount share
    /// a key on purpose - they are indistinguishable entries and any
    /// adjustment applies to both.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.date.format(DATE_FORMAT),
            self.description,
            self.amount
        )
    }
}

#[cfg(test)]
pub(crate) fn sample_transaction(
    date: &str,
    description: &str,
    amount: Decimal,
    card: Card,
) -> Transaction {
    Transaction {
        date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
        description: description.to_string(),
        category: "Other".to_string(),
        amount,
        card,
        is_return: amount > Decimal::ZERO,
    }
}
