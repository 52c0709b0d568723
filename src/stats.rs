use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::adjust::AdjustmentStore;
use crate::merchant::{display_merchant, normalize_merchant, MIN_MERCHANT_LEN};
use crate::{Transaction, MONTHS};

/// A merchant grouping with its net spend over the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantSummary {
    pub name: String,
    /// Net spend: purchase magnitudes minus return magnitudes.
    pub total: Decimal,
    /// How many transactions grouped under this name.
    pub count: usize,
    /// The single largest purchase.
    pub largest: Decimal,
}

/// Fold one adjusted amount into a net-spend total. Purchases add their
/// magnitude; returns subtract theirs. Summing `abs()` of everything
/// would count refunds as spending, which is exactly wrong.
fn add_net(total: &mut Decimal, adjusted: Decimal) {
    if adjusted < Decimal::ZERO {
        *total += adjusted.abs();
    } else {
        *total -= adjusted;
    }
}

/// Net spend over the whole set, after adjustments.
pub fn net_spend(transactions: &[Transaction], store: &AdjustmentStore) -> Decimal {
    let mut total = Decimal::ZERO;
    for transaction in transactions {
        add_net(&mut total, store.effective_amount(transaction));
    }
    total
}

/// Net spend per month, in calendar order, one entry per month.
pub fn spend_by_month(
    transactions: &[Transaction],
    store: &AdjustmentStore,
) -> Vec<(&'static str, Decimal)> {
    let mut totals = [Decimal::ZERO; 12];
    for transaction in transactions {
        use chrono::Datelike;
        add_net(
            &mut totals[transaction.date.month0() as usize],
            store.effective_amount(transaction),
        );
    }
    MONTHS.into_iter().zip(totals).collect()
}

/// Net spend per effective category.
pub fn spend_by_category(
    transactions: &[Transaction],
    store: &AdjustmentStore,
) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for transaction in transactions {
        add_net(
            totals
                .entry(store.effective_category(transaction))
                .or_insert(Decimal::ZERO),
            store.effective_amount(transaction),
        );
    }
    totals
}

/// The merchants with the highest net spend, grouped under the loose
/// display key. Groups that net to zero or a refund are dropped.
pub fn top_merchants(
    transactions: &[Transaction],
    store: &AdjustmentStore,
    limit: usize,
) -> Vec<MerchantSummary> {
    let mut groups: HashMap<String, MerchantSummary> = HashMap::new();

    for transaction in transactions {
        let name = display_merchant(&transaction.description);
        if name.chars().count() < MIN_MERCHANT_LEN {
            continue;
        }
        let adjusted = store.effective_amount(transaction);
        let entry = groups.entry(name.clone()).or_insert(MerchantSummary {
            name,
            total: Decimal::ZERO,
            count: 0,
            largest: Decimal::ZERO,
        });
        add_net(&mut entry.total, adjusted);
        if adjusted < Decimal::ZERO {
            entry.largest = entry.largest.max(adjusted.abs());
        }
        entry.count += 1;
    }

    let mut merchants: Vec<MerchantSummary> = groups
        .into_values()
        .filter(|m| m.total > Decimal::ZERO)
        .collect();
    merchants.sort_by(|a, b| b.total.cmp(&a.total));
    merchants.truncate(limit);
    merchants
}

/// Merchant groups matching a free-text query, under the strict search
/// key, ranked by activity (absolute net). A match against either the
/// normalized name or the raw description counts.
pub fn search_merchants(
    transactions: &[Transaction],
    store: &AdjustmentStore,
    query: &str,
) -> Vec<MerchantSummary> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return vec![];
    }

    let mut groups: HashMap<String, MerchantSummary> = HashMap::new();
    for transaction in transactions {
        let name = normalize_merchant(&transaction.description);
        if !name.to_lowercase().contains(&query)
            && !transaction.description.to_lowercase().contains(&query)
        {
            continue;
        }
        if name.chars().count() < MIN_MERCHANT_LEN {
            continue;
        }
        let adjusted = store.effective_amount(transaction);
        let entry = groups.entry(name.clone()).or_insert(MerchantSummary {
            name,
            total: Decimal::ZERO,
            count: 0,
            largest: Decimal::ZERO,
        });
        add_net(&mut entry.total, adjusted);
        if adjusted < Decimal::ZERO {
            entry.largest = entry.largest.max(adjusted.abs());
        }
        entry.count += 1;
    }

    let mut merchants: Vec<MerchantSummary> = groups.into_values().collect();
    merchants.sort_by(|a, b| b.total.abs().cmp(&a.total.abs()));
    merchants.truncate(10);
    merchants
}
