use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use config_finder::ConfigDirs;
use indoc::indoc;
use rust_decimal::Decimal;

use cardtally::{
    net_spend, normalize_path, search_merchants, spend_by_category, spend_by_month, top_merchants,
    AdjustmentStore, ConfigData, Dataset, Transaction, DATE_FORMAT,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Parse the configured statements and print a spending report")]
    Report {},
    #[command(about = "Show the merchants with the highest net spend")]
    Merchants {
        #[arg(long, default_value_t = 12)]
        limit: usize,
    },
    #[command(about = "Search merchants by name")]
    Search { query: String },
    #[command(about = "Record a partial or full credit against a transaction")]
    Credit {
        date: String,
        description: String,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
        #[arg(allow_negative_numbers = true)]
        credit: Decimal,
    },
    #[command(about = "Clear the credit recorded against a transaction")]
    Uncredit {
        date: String,
        description: String,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
    #[command(about = "Reassign a transaction's category")]
    Recategorize {
        date: String,
        description: String,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
        category: String,
    },
    #[command(about = "Reset a transaction to its original category")]
    ResetCategory {
        date: String,
        description: String,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
    #[command(about = "Show the location of the config.toml file")]
    ShowConfig {},
    #[command(about = "Create the config.toml file")]
    CreateConfig {},
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CreateConfig {} => {
            let config_file = get_config_file()?;
            if config_file.is_file() {
                return Err(anyhow!(format!(
                    "The config file {:#?} already exists.",
                    config_file
                )));
            }
            let parent = config_file
                .parent()
                .ok_or(anyhow!("Cannot identify parent of {:#?}", config_file))?;
            if !parent.is_dir() {
                fs::create_dir_all(parent)?;
            }
            fs::write(
                &config_file,
                indoc! {
                    r#"
                [[accounts]]
                label = "chase-sapphire"
                card = "chase-sapphire"
                format = "chase"
                file = "/path/to/chase-sapphire.csv"

                [[accounts]]
                label = "amex"
                card = "amex"
                format = "amex"
                file = "/path/to/amex.csv"

                [recurring]
                description = "Monthly Rent Payment"
                amount = -3335
                category = "Rent"

                [paths]
                storage = "/path/to/storage/directory"
                "#
                },
            )?;
            println!("Created {:#?}.\n", config_file);
            println!("Edit this file to point at your statement exports.");
        }
        Commands::ShowConfig {} => {
            println!("{}", get_config_file()?.to_str().unwrap());
        }
        Commands::Report {} => {
            let (dataset, store) = load_everything()?;
            report_errors(&dataset);

            println!("Reporting year: {}", dataset.year);
            println!("Transactions:   {}", dataset.transactions.len());
            println!(
                "Net spend:      ${}",
                net_spend(&dataset.transactions, &store)
            );

            println!("\nBy month:");
            for (month, total) in spend_by_month(&dataset.transactions, &store) {
                println!("  {month}  ${total}");
            }

            println!("\nBy category:");
            for (category, total) in spend_by_category(&dataset.transactions, &store) {
                println!("  {category}: ${total}");
            }
        }
        Commands::Merchants { limit } => {
            let (dataset, store) = load_everything()?;
            report_errors(&dataset);
            for merchant in top_merchants(&dataset.transactions, &store, limit) {
                println!(
                    "{}: ${} across {} transactions (largest ${})",
                    merchant.name, merchant.total, merchant.count, merchant.largest
                );
            }
        }
        Commands::Search { query } => {
            let (dataset, store) = load_everything()?;
            report_errors(&dataset);
            let results = search_merchants(&dataset.transactions, &store, &query);
            if results.is_empty() {
                println!("No merchants match {query:?}.");
            }
            for merchant in results {
                println!(
                    "{}: ${} across {} transactions",
                    merchant.name, merchant.total, merchant.count
                );
            }
        }
        Commands::Credit {
            date,
            description,
            amount,
            credit,
        } => {
            let (dataset, mut store) = load_everything()?;
            let transaction = lookup(&dataset, &date, &description, amount)?;
            store.set_credit(&transaction, credit)?;
            println!(
                "Recorded a credit of ${credit}; effective amount is now ${}.",
                store.effective_amount(&transaction)
            );
        }
        Commands::Uncredit {
            date,
            description,
            amount,
        } => {
            let (dataset, mut store) = load_everything()?;
            let transaction = lookup(&dataset, &date, &description, amount)?;
            store.clear_credit(&transaction)?;
            println!("Cleared the credit; the original amount stands.");
        }
        Commands::Recategorize {
            date,
            description,
            amount,
            category,
        } => {
            let (dataset, mut store) = load_everything()?;
            let transaction = lookup(&dataset, &date, &description, amount)?;
            store.set_category(&transaction, &category)?;
            println!("Recategorized {description:?} as {category:?}.");
        }
        Commands::ResetCategory {
            date,
            description,
            amount,
        } => {
            let (dataset, mut store) = load_everything()?;
            let transaction = lookup(&dataset, &date, &description, amount)?;
            store.clear_category(&transaction)?;
            println!(
                "Restored the original category {:?}.",
                transaction.category
            );
        }
    }

    Ok(())
}

/// Load the config, the aggregated dataset, and the adjustment store.
fn load_everything() -> Result<(Dataset, AdjustmentStore)> {
    let config_file = get_config_file()?;
    if !config_file.is_file() {
        return Err(anyhow!(format!(
            "The file {:#?} does not exist - create it with 'cardtally create-config'.",
            config_file
        )));
    }
    let config = ConfigData::new(&fs::read_to_string(&config_file)?)?;
    let dataset = Dataset::load(&config)?;
    let store = AdjustmentStore::load(&config.paths.storage)?;
    Ok((dataset, store))
}

/// Print row-level parse problems without failing the run.
fn report_errors(dataset: &Dataset) {
    for error in &dataset.errors {
        eprintln!("warning: skipped {error}");
    }
}

/// Find the transaction the user is pointing at by its key fields.
fn lookup(
    dataset: &Dataset,
    date: &str,
    description: &str,
    amount: Decimal,
) -> Result<Transaction> {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| anyhow!(format!("Cannot read {date:?} as an MM/DD/YYYY date.")))?;
    dataset
        .find(date, description, amount)
        .cloned()
        .ok_or_else(|| {
            anyhow!(format!(
                "No transaction matches {date}|{description}|{amount}."
            ))
        })
}

/// Return the path to the config.toml file.
fn get_config_file() -> Result<PathBuf> {
    let mut conf_dirs = ConfigDirs::empty();
    let mut conf_files = conf_dirs
        .add_platform_config_dir()
        .search("cardtally", "config", "toml");
    normalize_path(
        conf_files
            .next()
            .ok_or(anyhow!("Cannot identify the path to the config.toml file"))?
            .path(),
    )
}
