use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use std::env;

/// Drops every table by rolling back all migrations.
#[derive(Parser)]
#[command(about = "Reset the document verification database")]
struct Args {
    /// Re-apply the migrations after dropping, leaving an empty schema.
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

    let db = Database::connect(database_url).await?;

    if args.fresh {
        Migrator::fresh(&db).await?;
        println!("Database reset and migrated");
    } else {
        Migrator::reset(&db).await?;
        println!("Database reset successfully");
    }
    Ok(())
}
