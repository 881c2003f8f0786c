use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, NewReceipt};
use migration::MigratorTrait;
use sea_orm::Database;

#[derive(Parser, Debug)]
#[command(name = "expenseflow_admin")]
#[command(about = "Admin utilities for ExpenseFlow (seed receipts, run reconciliation)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./expenseflow.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert a receipt directly, bypassing extraction.
    Seed(SeedArgs),
    /// Reconcile receipts into a base currency.
    Reconcile(ReconcileArgs),
    /// Print the reconciliation ledger, newest attempt first.
    History,
    /// Print the currencies the rate provider supports.
    Currencies,
}

#[derive(Args, Debug)]
struct SeedArgs {
    #[arg(long)]
    file_name: String,
    #[arg(long)]
    merchant: Option<String>,
    /// Transaction date, `YYYY-MM-DD`.
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    currency: Option<String>,
    #[arg(long)]
    total: Option<f64>,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    /// Target base currency, e.g. `USD`.
    #[arg(long)]
    base: String,
    /// Re-reconcile every eligible receipt, not only pending ones.
    #[arg(long)]
    all: bool,
    /// Explicit receipt ids; overrides the pending/all selection.
    #[arg(long)]
    ids: Vec<i32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = Database::connect(&cli.database_url).await?;
    migration::Migrator::up(&db, None).await?;
    let engine = Engine::builder().database(db).build()?;

    match cli.command {
        Command::Seed(args) => {
            let receipt = engine
                .new_receipt(NewReceipt {
                    file_name: args.file_name,
                    merchant_name: args.merchant,
                    transaction_date: args.date,
                    original_currency: args.currency,
                    original_total: args.total,
                })
                .await?;
            println!("seeded receipt {}", receipt.id);
        }
        Command::Reconcile(args) => {
            let ids = if !args.ids.is_empty() {
                args.ids
            } else if args.all {
                engine.eligible_receipt_ids().await?
            } else {
                engine.pending_receipt_ids(&args.base).await?
            };

            let outcomes = engine.reconcile(&ids, &args.base).await?;
            for outcome in &outcomes {
                let marker = if outcome.success { " ok " } else { "FAIL" };
                println!("[{marker}] {}", outcome.message);
            }
            let converted = outcomes.iter().filter(|o| o.success).count();
            println!("{converted}/{} converted", outcomes.len());
        }
        Command::History => {
            for entry in engine.reconciliation_history().await? {
                println!(
                    "#{} receipt {} at {} [{}] {}",
                    entry.id,
                    entry.receipt_id,
                    entry.reconciliation_time.format("%Y-%m-%d %H:%M:%S"),
                    entry.status,
                    entry.notes
                );
            }
        }
        Command::Currencies => {
            let set = engine.available_currencies().await;
            if !set.success {
                eprintln!("provider unreachable, showing the fallback list");
            }
            for code in set.currencies {
                println!("{code}");
            }
        }
    }

    Ok(())
}
