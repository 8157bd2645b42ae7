use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use finance_tracker::{initialize_db, local_today, process_all_due_recurring_transactions};

/// Create the transactions for every user's recurring transactions that are due.
///
/// Meant to be run periodically, e.g. daily from cron. Running it more than
/// once a day does no harm.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let today = match local_today(&args.timezone) {
        Ok(today) => today,
        Err(error) => {
            eprintln!("{error}");
            exit(1);
        }
    };

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            eprintln!("Could not open the database at {}: {error}", args.db_path);
            exit(1);
        }
    };

    if let Err(error) = initialize_db(&connection) {
        eprintln!("Could not initialize the database: {error}");
        exit(1);
    }

    match process_all_due_recurring_transactions(today, &connection) {
        Ok(summary) => {
            tracing::info!(
                "Processed {} recurring transactions up to {today}, created {} transactions",
                summary.recurring_processed,
                summary.transactions_created
            );
        }
        Err(error) => {
            eprintln!("Could not process recurring transactions: {error}");
            exit(1);
        }
    }
}
