use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use finance_tracker::{CategoryType, NewCategory, create_category, initialize_db};

/// Add a category that every user can see and use but nobody can edit.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The name of the category.
    #[arg(long)]
    name: String,

    /// Either "income" or "expense".
    #[arg(long = "type", default_value = "expense")]
    category_type: CategoryType,

    /// A hex colour such as "#ff8800".
    #[arg(long)]
    color: Option<String>,
}

fn main() {
    let args = Args::parse();

    let result = Connection::open(&args.db_path)
        .map_err(finance_tracker::Error::from)
        .and_then(|connection| {
            initialize_db(&connection)?;
            create_category(
                None,
                &NewCategory {
                    name: args.name,
                    category_type: args.category_type,
                    color: args.color,
                },
                &connection,
            )
        });

    match result {
        Ok(category) => println!(
            "Created shared category \"{}\" with ID {}",
            category.name, category.id
        ),
        Err(error) => {
            eprintln!("Could not create the category: {error}");
            exit(1);
        }
    }
}
