use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::{Card, Transaction, DATE_FORMAT};

/// Statement dates must look like M/D/YYYY before we hand them to chrono.
static STATEMENT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap());

/// The result of parsing one statement export.
///
/// Rows that cannot be read are reported in `errors` rather than failing
/// the parse - statement exports are dirty often enough that one bad row
/// must never cost the rest of the file.
#[derive(Debug, Default)]
pub struct StatementParse {
    pub transactions: Vec<Transaction>,
    pub errors: Vec<String>,
}

/// Parse a Chase-style statement export.
///
/// Columns: date, post date (unused), description, category, type,
/// amount, and an optional memo. Amounts already use the canonical sign
/// convention (negative = purchase), so they are taken as-is. Rows whose
/// type is "Payment", or whose description mentions an automatic payment,
/// are the card paying its own bill and are dropped entirely.
pub fn parse_chase_csv(csv_text: &str, card: Card) -> StatementParse {
    let mut parse = StatementParse::default();

    for (line, record) in read_rows(csv_text) {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                parse.errors.push(format!("line {line}: {err}"));
                continue;
            }
        };

        if record.len() < 6 {
            parse.errors.push(format!(
                "line {line}: expected at least 6 fields, got {}",
                record.len()
            ));
            continue;
        }

        let date = record.get(0).unwrap_or("").trim();
        let description = record.get(2).unwrap_or("").trim();
        let category = record.get(3).unwrap_or("").trim();
        let txn_type = record.get(4).unwrap_or("").trim();
        let amount_str = record.get(5).unwrap_or("").trim();

        // The issuer paying itself is not spending.
        if txn_type == "Payment" || description.contains("AUTOMATIC PAYMENT") {
            continue;
        }

        let (date, amount) = match validate_row(line, date, description, amount_str) {
            Ok(parsed) => parsed,
            Err(err) => {
                parse.errors.push(err);
                continue;
            }
        };

        parse.transactions.push(Transaction {
            date,
            description: clean_description(description),
            category: if category.is_empty() {
                "Other".to_string()
            } else {
                category.to_string()
            },
            amount,
            card,
            is_return: amount > Decimal::ZERO,
        });
    }

    parse
}

/// Parse an Amex-style statement export.
///
/// Columns: date, description, amount, category. Amex reports purchases
/// as positive and credits as negative - the opposite of the canonical
/// convention - so every amount is negated here, and `is_return` is
/// decided from the sign as the issuer reported it.
pub fn parse_amex_csv(csv_text: &str, card: Card) -> StatementParse {
    let mut parse = StatementParse::default();

    for (line, record) in read_rows(csv_text) {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                parse.errors.push(format!("line {line}: {err}"));
                continue;
            }
        };

        if record.len() < 4 {
            parse.errors.push(format!(
                "line {line}: expected at least 4 fields, got {}",
                record.len()
            ));
            continue;
        }

        let date = record.get(0).unwrap_or("").trim();
        let description = record.get(1).unwrap_or("").trim();
        let amount_str = record.get(2).unwrap_or("").trim();
        let category = record.get(3).unwrap_or("").trim();

        if description.contains("PAYMENT") || description.contains("AUTOPAY") {
            continue;
        }

        let (date, amount) = match validate_row(line, date, description, amount_str) {
            Ok(parsed) => parsed,
            Err(err) => {
                parse.errors.push(err);
                continue;
            }
        };

        parse.transactions.push(Transaction {
            date,
            description: clean_description(description),
            category: if category.is_empty() {
                "Other".to_string()
            } else {
                category.to_string()
            },
            // Flip into the canonical convention: purchases become negative.
            amount: -amount,
            card,
            is_return: amount < Decimal::ZERO,
        });
    }

    parse
}

/// Read the data rows of a statement, skipping the header line and
/// pairing each record with the line it started on.
fn read_rows(csv_text: &str) -> Vec<(u64, Result<csv::StringRecord, csv::Error>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(csv_text.as_bytes());

    // Force the header read so positions below point at data rows.
    if reader.headers().is_err() {
        return vec![];
    }

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        let line = reader.position().line();
        match reader.read_record(&mut record) {
            Ok(true) => rows.push((line, Ok(record.clone()))),
            Ok(false) => break,
            Err(err) => {
                rows.push((line, Err(err)));
                // Stop if the reader cannot make progress past the bad row.
                if reader.position().line() == line {
                    break;
                }
            }
        }
    }
    rows
}

/// Check the required fields of a row, returning the parsed date and
/// amount, or a message describing why the row must be skipped.
fn validate_row(
    line: u64,
    date: &str,
    description: &str,
    amount_str: &str,
) -> Result<(NaiveDate, Decimal), String> {
    if date.is_empty() || description.is_empty() || amount_str.is_empty() {
        return Err(format!("line {line}: missing required fields"));
    }

    let Some(amount) = Decimal::from_str_exact(amount_str).ok() else {
        return Err(format!("line {line}: invalid amount {amount_str:?}"));
    };

    if !STATEMENT_DATE.is_match(date) {
        return Err(format!(
            "line {line}: invalid date {date:?} (expected MM/DD/YYYY)"
        ));
    }
    let Some(date) = NaiveDate::parse_from_str(date, DATE_FORMAT).ok() else {
        return Err(format!("line {line}: {date:?} is not a calendar date"));
    };

    Ok((date, amount))
}

/// Strip stray quote characters left over from the export.
fn clean_description(description: &str) -> String {
    description.replace('"', "").trim().to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn chase_sample() -> &'static str {
        indoc! { r#"
            Transaction Date,Post Date,Description,Category,Type,Amount,Memo
            12/15/2025,12/16/2025,WHOLE FOODS,Groceries,Sale,-50.00,
            12/14/2025,12/15/2025,UBER,Travel,Sale,-25.50,
            12/13/2025,12/14/2025,AMAZON REFUND,Shopping,Return,30.00,
            12/12/2025,12/13/2025,RESTAURANT,Food & Drink,Sale,-75.25,
            12/11/2025,12/12/2025,PAYMENT,Payment,Payment,-500.00,
        "# }
    }

    fn amex_sample() -> &'static str {
        indoc! { r#"
            Date,Description,Amount,Category
            12/15/2025,NETFLIX,15.99,Entertainment
            12/14/2025,UBER,22.50,Transportation
            12/13/2025,REFUND,-10.00,Shopping
            12/12/2025,GYM,50.00,Health & Wellness
        "# }
    }

    #[test]
    fn test_chase_negative_amounts_are_purchases() {
        let parse = parse_chase_csv(chase_sample(), Card::ChaseSapphire);
        let whole_foods = parse
            .transactions
            .iter()
            .find(|t| t.description == "WHOLE FOODS")
            .unwrap();
        assert_eq!(whole_foods.amount, dec!(-50.00));
        assert!(!whole_foods.is_return);
    }

    #[test]
    fn test_chase_positive_amounts_are_returns() {
        let parse = parse_chase_csv(chase_sample(), Card::ChaseSapphire);
        let refund = parse
            .transactions
            .iter()
            .find(|t| t.description == "AMAZON REFUND")
            .unwrap();
        assert_eq!(refund.amount, dec!(30.00));
        assert!(refund.is_return);
    }

    #[test]
    fn test_chase_filters_out_payments() {
        let parse = parse_chase_csv(chase_sample(), Card::ChaseSapphire);
        assert_eq!(parse.transactions.len(), 4);
        assert!(parse
            .transactions
            .iter()
            .all(|t| t.description != "PAYMENT"));
        assert!(parse.errors.is_empty());
    }

    #[test]
    fn test_chase_filters_automatic_payment_descriptions() {
        let given = indoc! { r#"
            Transaction Date,Post Date,Description,Category,Type,Amount,Memo
            12/15/2025,12/16/2025,AUTOMATIC PAYMENT - THANK,Fees,Sale,-500.00,
            12/14/2025,12/15/2025,UBER,Travel,Sale,-25.50,
        "# };
        let parse = parse_chase_csv(given, Card::Amazon);
        assert_eq!(parse.transactions.len(), 1);
        assert_eq!(parse.transactions[0].description, "UBER");
    }

    #[test]
    fn test_amex_flips_purchases_negative() {
        let parse = parse_amex_csv(amex_sample(), Card::Amex);
        let netflix = parse
            .transactions
            .iter()
            .find(|t| t.description == "NETFLIX")
            .unwrap();
        assert_eq!(netflix.amount, dec!(-15.99));
        assert!(!netflix.is_return);
    }

    #[test]
    fn test_amex_flips_credits_positive() {
        let parse = parse_amex_csv(amex_sample(), Card::Amex);
        let refund = parse
            .transactions
            .iter()
            .find(|t| t.description == "REFUND")
            .unwrap();
        assert_eq!(refund.amount, dec!(10.00));
        // is_return reflects the sign before negation.
        assert!(refund.is_return);
    }

    #[test]
    fn test_amex_filters_payments_and_autopay() {
        let given = indoc! { r#"
            Date,Description,Amount,Category
            12/15/2025,ONLINE PAYMENT - THANK YOU,-400.00,Other
            12/14/2025,AUTOPAY RECEIVED,-250.00,Other
            12/13/2025,GYM,50.00,Health & Wellness
        "# };
        let parse = parse_amex_csv(given, Card::Amex);
        assert_eq!(parse.transactions.len(), 1);
        assert_eq!(parse.transactions[0].description, "GYM");
    }

    #[rstest]
    #[case("")]
    #[case("Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n")]
    fn test_empty_or_header_only_is_not_an_error(#[case] given: &str) {
        let parse = parse_chase_csv(given, Card::ChaseSapphire);
        assert!(parse.transactions.is_empty());
        assert!(parse.errors.is_empty());
    }

    #[test]
    fn test_malformed_row_does_not_abort_the_parse() {
        let given = indoc! { r#"
            Transaction Date,Post Date,Description,Category,Type,Amount,Memo
            12/15/2025,12/16/2025,WHOLE FOODS,Groceries,Sale,-50.00,
            this line has no commas at all
            12/13/2025,12/14/2025,UBER,Travel,Sale,-25.50,
        "# };
        let parse = parse_chase_csv(given, Card::ChaseSapphire);
        assert_eq!(parse.transactions.len(), 2);
        assert_eq!(parse.errors.len(), 1);
    }

    #[rstest]
    #[case("12/15/2025,12/16/2025,STORE,Shopping,Sale,not-a-number,", "invalid amount")]
    #[case("2025-12-15,12/16/2025,STORE,Shopping,Sale,-50.00,", "invalid date")]
    #[case("12/15/25,12/16/2025,STORE,Shopping,Sale,-50.00,", "invalid date")]
    #[case("12/15/2025,12/16/2025,,Shopping,Sale,-50.00,", "missing required fields")]
    #[case(",12/16/2025,STORE,Shopping,Sale,-50.00,", "missing required fields")]
    #[case("02/30/2025,12/16/2025,STORE,Shopping,Sale,-50.00,", "not a calendar date")]
    fn test_bad_rows_are_skipped_with_a_diagnostic(#[case] row: &str, #[case] message: &str) {
        let given = format!("Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n{row}\n");
        let parse = parse_chase_csv(&given, Card::ChaseSapphire);
        assert!(parse.transactions.is_empty());
        assert_eq!(parse.errors.len(), 1);
        assert!(parse.errors[0].contains(message), "got: {}", parse.errors[0]);
    }

    #[test]
    fn test_blank_category_defaults_to_other() {
        let given = indoc! { r#"
            Transaction Date,Post Date,Description,Category,Type,Amount,Memo
            12/15/2025,12/16/2025,MYSTERY STORE,,Sale,-12.00,
        "# };
        let parse = parse_chase_csv(given, Card::ChaseSapphire);
        assert_eq!(parse.transactions[0].category, "Other");
    }

    #[test]
    fn test_description_quotes_are_stripped() {
        let given = indoc! { r#"
            Date,Description,Amount,Category
            12/15/2025,"TRADER JOE'S",42.17,Groceries
        "# };
        let parse = parse_amex_csv(given, Card::Amex);
        assert_eq!(parse.transactions[0].description, "TRADER JOE'S");
    }

    #[test]
    fn test_single_digit_month_and_day_accepted() {
        let given = indoc! { r#"
            Transaction Date,Post Date,Description,Category,Type,Amount,Memo
            1/5/2025,1/6/2025,CORNER CAFE,Food & Drink,Sale,-8.75,
        "# };
        let parse = parse_chase_csv(given, Card::ChaseSapphire);
        assert_eq!(parse.transactions.len(), 1);
        assert_eq!(parse.transactions[0].month_abbrev(), "Jan");
    }
}
