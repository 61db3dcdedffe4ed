use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};

use crate::application::{AddOutcome, SalesLedger};
use crate::config::{Backend, Config, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::domain::{
    format_amount, format_liters, parse_quantity, parse_sale_date, NewSale, SaleRecord, Totals,
};
use crate::logging::init_logging;
use crate::storage::SqliteSalesStore;

/// Milkpro - Milk Sales Ledger
#[derive(Parser)]
#[command(name = "milkpro")]
#[command(about = "Record milk sales per buyer and keep track of what is owed")]
#[command(version)]
pub struct Cli {
    /// Base URL of the sales service
    #[arg(long, env = "MILKPRO_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Keep sales in a local SQLite file instead of the sales service
    #[arg(short, long, env = "MILKPRO_DATABASE", global = true)]
    pub database: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "MILKPRO_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,

    /// Comma-separated buyer names (defaults to the built-in list)
    #[arg(long, env = "MILKPRO_BUYERS", global = true)]
    pub buyers: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the local database (requires --database)
    Init,

    /// List known buyers
    Buyers,

    /// List sales with totals
    List {
        /// Only show this buyer's sales
        #[arg(long)]
        buyer: Option<String>,
    },

    /// Record a sale, or update the quantity of an existing one
    Add {
        /// Buyer name
        buyer: String,

        /// Liters sold (e.g., "5" or "2.5")
        quantity: String,

        /// Date of the sale (YYYY-MM-DD, defaults to today in local time)
        #[arg(long)]
        date: Option<String>,

        /// Overwrite an existing sale for the same day without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete the sale of a buyer on a day
    Delete {
        /// Buyer name
        buyer: String,

        /// Date of the sale (YYYY-MM-DD)
        date: String,
    },

    /// Delete every sale of a buyer up to a day
    Reset {
        /// Buyer name
        buyer: String,

        /// Last day to clear, inclusive (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Show totals for one buyer, or the summary for everyone
    Totals {
        /// Buyer name (omit for all buyers)
        buyer: Option<String>,
    },

    /// Export sales to CSV or JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Only export this buyer's sales (csv only)
        #[arg(long)]
        buyer: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config::new(
            self.api_url.clone(),
            self.database.clone(),
            self.timeout,
            self.buyers.as_deref(),
        )
    }

    pub async fn run(self) -> Result<()> {
        init_logging(self.verbose);
        let config = self.config();

        match self.command {
            Commands::Init => {
                let Backend::Sqlite { path } = &config.backend else {
                    anyhow::bail!("`init` only applies to a local database. Pass --database <FILE>");
                };
                SqliteSalesStore::init(path).await?;
                println!("Database initialized: {}", path);
            }

            Commands::Buyers => {
                for name in config.roster.names() {
                    println!("{}", name);
                }
            }

            Commands::List { buyer } => {
                let ledger = loaded_ledger(&config).await?;
                run_list_command(&ledger, buyer.as_deref()).await?;
            }

            Commands::Add {
                buyer,
                quantity,
                date,
                yes,
            } => {
                let quantity = parse_quantity(&quantity)
                    .with_context(|| format!("Invalid quantity '{}'. Use '5' or '2.5'", quantity))?;
                let date = match date {
                    Some(date_str) => parse_date(&date_str)?,
                    None => default_sale_date(),
                };
                let ledger = loaded_ledger(&config).await?;
                run_add_command(&ledger, NewSale::new(buyer, quantity, date), yes).await?;
            }

            Commands::Delete { buyer, date } => {
                let date = parse_date(&date)?;
                let ledger = loaded_ledger(&config).await?;
                ledger.delete(&buyer, date).await?;
                println!("Deleted sale: {} on {}", buyer, date);
            }

            Commands::Reset { buyer, as_of } => {
                let as_of = as_of.as_deref().map(parse_end_of_day).transpose()?;
                let ledger = loaded_ledger(&config).await?;
                ledger.reset(&buyer, as_of).await?;
                let totals = ledger.totals_for(&buyer).await;
                println!(
                    "Reset sales for {}. Remaining: {} L, {}",
                    buyer,
                    format_liters(totals.total_quantity),
                    format_amount(totals.total_amount)
                );
            }

            Commands::Totals { buyer } => {
                let ledger = loaded_ledger(&config).await?;
                run_totals_command(&ledger, buyer.as_deref()).await;
            }

            Commands::Export {
                output,
                format,
                buyer,
            } => {
                let ledger = loaded_ledger(&config).await?;
                run_export_command(&ledger, output.as_deref(), &format, buyer.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn loaded_ledger(config: &Config) -> Result<SalesLedger> {
    let ledger = config.open_ledger().await?;
    ledger.load().await?;
    Ok(ledger)
}

async fn run_add_command(ledger: &SalesLedger, sale: NewSale, yes: bool) -> Result<()> {
    let proceed = match ledger.check_for_conflict(&sale.buyer, sale.date).await {
        Some(existing) if !yes => confirm(&format!(
            "A sale of {} L already exists for {} on {}. Update the quantity to {} L?",
            format_liters(existing.quantity),
            existing.buyer,
            existing.date,
            format_liters(sale.quantity)
        ))?,
        _ => yes,
    };

    let buyer = sale.buyer.clone();
    let date = sale.date;
    let quantity = sale.quantity;

    match ledger.add_or_update(sale, proceed).await? {
        AddOutcome::Created => {
            println!(
                "Recorded sale: {} L for {} on {} ({})",
                format_liters(quantity),
                buyer,
                date,
                format_amount(crate::domain::amount(quantity))
            );
        }
        AddOutcome::Updated { previous } => {
            println!(
                "Updated sale: {} on {}: {} L -> {} L",
                buyer,
                date,
                format_liters(previous.quantity),
                format_liters(quantity)
            );
        }
        AddOutcome::Declined { .. } => {
            println!("Kept existing sale for {} on {}", buyer, date);
        }
    }

    let totals = ledger.totals_for(&buyer).await;
    println!(
        "  {} total: {} L, {}",
        buyer,
        format_liters(totals.total_quantity),
        format_amount(totals.total_amount)
    );
    Ok(())
}

async fn run_list_command(ledger: &SalesLedger, buyer: Option<&str>) -> Result<()> {
    match buyer {
        Some(name) => {
            anyhow::ensure!(
                ledger.roster().contains(name),
                "Unknown buyer '{}'. Known buyers: {}",
                name,
                ledger.roster().names().join(", ")
            );
            let sales = ledger.sales_for(name).await;
            println!("Sales for {}", name);
            print_sales(&sales, false);
            print_totals(&ledger.totals_for(name).await);
        }
        None => {
            let sales = ledger.records().await;
            print_sales(&sales, true);
            print_totals(&ledger.grand_totals().await);
        }
    }
    Ok(())
}

async fn run_totals_command(ledger: &SalesLedger, buyer: Option<&str>) {
    match buyer {
        Some(name) => {
            let totals = ledger.totals_for(name).await;
            println!(
                "{}: {} L, {}",
                name,
                format_liters(totals.total_quantity),
                format_amount(totals.total_amount)
            );
        }
        None => {
            let summary = ledger.summary().await;
            println!("{:<20} {:>12} {:>14}", "BUYER", "LITERS", "AMOUNT");
            println!("{}", "-".repeat(48));
            for row in &summary.buyers {
                println!(
                    "{:<20} {:>12} {:>14}",
                    truncate(&row.buyer, 20),
                    format_liters(row.totals.total_quantity),
                    format_amount(row.totals.total_amount)
                );
            }
            println!("{}", "-".repeat(48));
            println!(
                "{:<20} {:>12} {:>14}",
                "Total",
                format_liters(summary.total.total_quantity),
                format_amount(summary.total.total_amount)
            );
        }
    }
}

async fn run_export_command(
    ledger: &SalesLedger,
    output: Option<&str>,
    format: &str,
    buyer: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::stdout;

    let exporter = Exporter::new(ledger);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format {
        "csv" => {
            let count = exporter.export_sales_csv(writer, buyer).await?;
            if output.is_some() {
                eprintln!("Exported {} sales", count);
            }
        }
        "json" => {
            let snapshot = exporter.export_json(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} sales with summary", snapshot.records.len());
            }
        }
        _ => {
            anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
        }
    }

    Ok(())
}

fn print_sales(sales: &[SaleRecord], with_buyer: bool) {
    if sales.is_empty() {
        println!("No sales found.");
        return;
    }

    if with_buyer {
        println!("{:<16} {:<20} {:>10} {:>12}", "DATE", "BUYER", "LITERS", "AMOUNT");
        println!("{}", "-".repeat(61));
    } else {
        println!("{:<16} {:>10} {:>12}", "DATE", "LITERS", "AMOUNT");
        println!("{}", "-".repeat(40));
    }

    for sale in sales {
        let date = sale.date.format("%a %b %d %Y").to_string();
        if with_buyer {
            println!(
                "{:<16} {:<20} {:>10} {:>12}",
                date,
                truncate(&sale.buyer, 20),
                format_liters(sale.quantity),
                format_amount(sale.amount())
            );
        } else {
            println!(
                "{:<16} {:>10} {:>12}",
                date,
                format_liters(sale.quantity),
                format_amount(sale.amount())
            );
        }
    }
}

fn print_totals(totals: &Totals) {
    println!();
    println!("Total liters: {}", format_liters(totals.total_quantity));
    println!("Total amount: {}", format_amount(totals.total_amount));
}

/// Ask a yes/no question on stdin. Anything but "y"/"yes" is a no.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    parse_sale_date(date_str)
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

/// Last millisecond of the given day, in UTC.
/// Sales are recorded against the seller's calendar day, not UTC.
fn default_sale_date() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_end_of_day(date_str: &str) -> Result<DateTime<Utc>> {
    let date = parse_date(date_str)?;
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
    Ok(end.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_command() {
        let cli = Cli::try_parse_from([
            "milkpro", "add", "Ravi", "2.5", "--date", "2024-01-10", "--yes",
        ])
        .unwrap();

        match cli.command {
            Commands::Add {
                buyer,
                quantity,
                date,
                yes,
            } => {
                assert_eq!(buyer, "Ravi");
                assert_eq!(quantity, "2.5");
                assert_eq!(date.as_deref(), Some("2024-01-10"));
                assert!(yes);
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_global_database_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["milkpro", "list", "--database", "sales.db"]).unwrap();
        assert_eq!(cli.database.as_deref(), Some("sales.db"));
        assert!(matches!(cli.config().backend, Backend::Sqlite { .. }));
    }

    #[test]
    fn test_parse_end_of_day() {
        let end = parse_end_of_day("2024-02-01").unwrap();
        assert_eq!(end.to_rfc3339(), "2024-02-01T23:59:59.999+00:00");
    }

    #[test]
    fn test_default_sale_date_is_local_today() {
        let before = Local::now().date_naive();
        let date = default_sale_date();
        let after = Local::now().date_naive();
        assert!(date == before || date == after);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ravi", 20), "Ravi");
        assert_eq!(truncate("Rajeshwari Krishnamurthy", 10), "Rajeshw...");
    }
}
