use std::fs;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::config::{ConfigData, RecurringCharge, StatementFormat};
use crate::statement::{parse_amex_csv, parse_chase_csv};
use crate::{Card, Transaction};

/// Infer the reporting year for a set of transactions by plurality vote
/// over their dates. Ties go to the highest year. An empty set falls
/// back to the current local year.
pub fn detect_year(transactions: &[Transaction]) -> i32 {
    if transactions.is_empty() {
        return chrono::Local::now().date_naive().year();
    }

    let mut counts = std::collections::HashMap::new();
    for transaction in transactions {
        *counts.entry(transaction.date.year()).or_insert(0usize) += 1;
    }

    counts
        .into_iter()
        .max_by(|(year_a, count_a), (year_b, count_b)| {
            count_a.cmp(count_b).then(year_a.cmp(year_b))
        })
        .map(|(year, _)| year)
        .unwrap()
}

/// Synthesize twelve transactions for a fixed monthly obligation that
/// appears on no statement, dated the first of each month in the given
/// year so they line up with the statement-derived data.
pub fn recurring_transactions(recurring: &RecurringCharge, year: i32) -> Vec<Transaction> {
    (1..=12)
        .map(|month| Transaction {
            // The first of the month always exists.
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            description: recurring.description.clone(),
            category: recurring.category.clone(),
            amount: recurring.amount,
            card: Card::Checking,
            is_return: false,
        })
        .collect()
}

/// The aggregated transaction data for all configured accounts.
///
/// Built once by [`Dataset::load`] and treated as immutable afterwards;
/// every downstream query works from this handle. Statements are not
/// deduplicated across accounts - exports are disjoint by issuer.
#[derive(Debug)]
pub struct Dataset {
    /// Every transaction, statement-derived and synthetic, tagged by card.
    pub transactions: Vec<Transaction>,
    /// The year the statement data belongs to.
    pub year: i32,
    /// Row-level problems encountered while parsing, for reporting.
    pub errors: Vec<String>,
}

impl Dataset {
    /// Read and parse every configured statement, detect the reporting
    /// year, and append the synthetic recurring ledger.
    pub fn load(config: &ConfigData) -> Result<Dataset> {
        let mut transactions = vec![];
        let mut errors = vec![];

        for account in &config.accounts {
            let text = fs::read_to_string(&account.file)
                .with_context(|| format!("Cannot read the statement file {:#?}", account.file))?;
            let mut parse = match account.format {
                StatementFormat::Chase => parse_chase_csv(&text, account.card),
                StatementFormat::Amex => parse_amex_csv(&text, account.card),
            };
            errors.extend(
                parse
                    .errors
                    .drain(..)
                    .map(|err| format!("{}: {err}", account.label)),
            );
            transactions.append(&mut parse.transactions);
        }

        // The vote happens before the synthetic rows exist, so twelve
        // generated entries can never outvote the statements.
        let year = detect_year(&transactions);
        transactions.extend(recurring_transactions(&config.recurring, year));

        Ok(Dataset {
            transactions,
            year,
            errors,
        })
    }

    /// Find the transaction matching the given key fields, if any.
    pub fn find(&self, date: NaiveDate, description: &str, amount: Decimal) -> Option<&Transaction> {
        self.transactions
            .iter()
            .find(|t| t.date == date && t.description == description && t.amount == amount)
    }
}
