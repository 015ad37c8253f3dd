use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use clap::Parser;
use doc_verifier::entities::user;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, EntityTrait, QueryFilter, Set};
use std::env;

/// Creates an admin account for the management API.
#[derive(Parser)]
#[command(about = "Create an admin user")]
struct Args {
    /// Login name of the new user.
    #[arg(short, long)]
    username: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

    let username = args.username.trim().to_string();
    if username.is_empty() {
        return Err("username must not be empty".into());
    }

    let db = Database::connect(database_url).await?;
    Migrator::up(&db, None).await?;

    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&db)
        .await?
        .is_some();
    if taken {
        return Err(format!("user '{}' already exists", username).into());
    }

    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        return Err("passwords do not match".into());
    }
    if password.len() < 8 {
        return Err("password must be at least 8 characters".into());
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("failed to hash password: {}", e))?
        .to_string();

    let created = user::ActiveModel {
        username: Set(username),
        password: Set(hash),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    println!("Created admin user '{}' (id {})", created.username, created.id);
    Ok(())
}
