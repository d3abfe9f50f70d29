//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and one account per role.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by EMPORIUM_DATABASE_PATH (default ./emporium.db)
//! cargo run -p emporium-db --bin seed
//!
//! # Specify database path and the password given to every seeded account
//! cargo run -p emporium-db --bin seed -- --db ./data/shop.db --password hunter22
//! ```
//!
//! ## Seeded Data
//! - Products across a few categories, each in several sizes
//! - `general@`, `user@`, `admin@`, `super-admin@emporium.test`, one per role
//!
//! Seeding is skipped when the catalog already has products.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use emporium_core::{CredentialEngine, Money, Product, RoleTier, User, UserStatus};
use emporium_db::{Database, ProductRepository, ServiceConfig, UserRepository};
use std::env;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Product families for demo data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Stationery",
        &["Ballpoint Pen", "Fountain Pen", "Pencil", "Notebook", "Sketchbook", "Highlighter"],
    ),
    (
        "Kitchen",
        &["Coffee Mug", "Tea Kettle", "Cutting Board", "Chef Knife", "Salad Bowl"],
    ),
    (
        "Outdoor",
        &["Water Bottle", "Camping Lantern", "Folding Chair", "Rain Jacket", "Day Pack"],
    ),
];

/// Size variants and their price add-on in cents
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Medium", 250), ("Large", 500)];

const DEFAULT_PASSWORD: &str = "emporium";

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = ServiceConfig::load().context("reading configuration")?;
    let mut password = DEFAULT_PASSWORD.to_string();

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--db needs a path");
                };
                config.database_path = PathBuf::from(path);
                i += 1;
            }
            "--password" | "-p" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("--password needs a value");
                };
                password = value.clone();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Emporium Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: $EMPORIUM_DATABASE_PATH)");
                println!("  -p, --password <VALUE>   Password for seeded accounts (default: {DEFAULT_PASSWORD})");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    config.init_tracing();
    info!(path = %config.database_path.display(), "Seeding database");

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;

    let engine = CredentialEngine::new();
    let hash = tokio::task::spawn_blocking(move || engine.hash(&password)).await??;

    let mut tx = db.begin().await?;

    let existing = ProductRepository::new(&mut tx).count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} products, skipping seed.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut generated = 0;
    for (category_idx, (category, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_name, addon) in SIZES {
                let seed = category_idx * 100 + name_idx;
                let product = generate_product(name, size_name, *addon, seed, now);
                ProductRepository::new(&mut tx)
                    .insert(&product)
                    .await
                    .with_context(|| format!("inserting {} ({category})", product.name))?;
                generated += 1;
            }
        }
    }
    println!("✓ Generated {generated} products");

    for tier in RoleTier::ALL {
        let email = format!("{}@emporium.test", tier.name().to_lowercase().replace('_', "-"));
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            password_hash: Some(hash.clone()),
            status: UserStatus::Active,
            role: tier,
            name: format!("Demo {}", tier.name()),
            phone: None,
            address: None,
            created_by: None,
            created_on: now,
            updated_by: None,
            updated_on: now,
        };
        UserRepository::new(&mut tx)
            .insert(&user)
            .await
            .with_context(|| format!("inserting {email}"))?;
        println!("✓ Account {email} ({tier})");
    }

    tx.commit().await?;
    db.close().await;

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// One product with a deterministic price and rating.
fn generate_product(name: &str, size: &str, price_addon: i64, seed: usize, now: chrono::DateTime<Utc>) -> Product {
    // $4.99 - $24.99 before the size add-on
    let base_cents = 499 + ((seed * 173) % 2000) as i64;

    let mut product = Product::new(format!("{name} {size}"), Money::from_cents(base_cents + price_addon), now);
    product.rating = Some((seed % 6) as i64);
    product
}
