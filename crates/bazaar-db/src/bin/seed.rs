//! # Seed Data Generator
//!
//! Populates the database with artisan sellers, buyers and products for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by BAZAAR_DATABASE_PATH (./bazaar.db by default)
//! cargo run -p bazaar-db --bin seed
//!
//! # Limit the number of products
//! cargo run -p bazaar-db --bin seed -- --products 8
//!
//! # Specify database path
//! cargo run -p bazaar-db --bin seed -- --db ./data/bazaar.db
//! ```
//!
//! ## Generated Data
//! - One seller per craft region, each owning a handful of products
//! - A few buyer profiles
//! - Prices between ৳450.00 and ৳18,000.00, stock between 1 and 25

use std::env;

use bazaar_core::{Actor, Money, NewProduct};
use bazaar_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Seller email and the crafts they list: (name, motif, base price in paisa).
const SELLERS: &[(&str, &[(&str, &str, i64)])] = &[
    (
        "jessore.stitchers@example.com",
        &[
            ("Nakshi Kantha", "Nakshi", 350_000),
            ("Kantha Stitch Dupatta", "Kantha", 180_000),
            ("Embroidered Cushion Cover", "Nakshi", 45_000),
        ],
    ),
    (
        "tangail.weavers@example.com",
        &[
            ("Jamdani Saree", "Jamdani", 1_800_000),
            ("Tangail Taant Saree", "Taant", 420_000),
            ("Handloom Gamchha", "Taant", 45_000),
        ],
    ),
    (
        "sylhet.craft@example.com",
        &[
            ("Shital Pati Mat", "Shital Pati", 260_000),
            ("Cane Basket", "Bet", 90_000),
        ],
    ),
    (
        "bogura.metalworks@example.com",
        &[
            ("Dokra Horse", "Dokra", 320_000),
            ("Brass Kolshi", "Kasha", 540_000),
            ("Terracotta Plaque", "Pora Mati", 75_000),
        ],
    ),
];

const BUYERS: &[&str] = &[
    "rina@example.com",
    "karim@example.com",
    "nusrat@example.com",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut limit: usize = usize::MAX;
    let mut config = DbConfig::from_env()?;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    limit = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Maximum number of products to create");
                println!("  -d, --db <PATH>     Database file path (default: $BAZAAR_DATABASE_PATH)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");
    let db = Database::new(config).await?;

    // Profiles, not stock, mark a seeded database.
    let (first_seller, _) = SELLERS[0];
    if db.profiles().find_seller_by_email(first_seller).await?.is_some() {
        warn!(email = first_seller, "Database already seeded, skipping to avoid duplicates");
        return Ok(());
    }

    for email in BUYERS {
        let id = db.profiles().create_buyer(email).await?;
        info!(buyer_id = id, email, "Created buyer");
    }

    let mut created = 0usize;
    let mut catalogue_value = Money::zero();

    'sellers: for (seller_idx, (email, crafts)) in SELLERS.iter().enumerate() {
        let seller = Actor::seller(db.profiles().create_seller(email).await?);

        for (craft_idx, (name, motif, price_cents)) in crafts.iter().enumerate() {
            if created >= limit {
                break 'sellers;
            }

            let quantity = 1 + ((seller_idx * 7 + craft_idx * 5) % 25) as i64;
            let product = NewProduct {
                seller_id: seller.user_id,
                name: name.to_string(),
                description: Some(format!("Handmade {} by {}", motif, email)),
                cultural_motif: Some(motif.to_string()),
                price_cents: *price_cents,
                quantity,
            };

            match db.products().insert(&seller, &product).await {
                Ok(product) => {
                    catalogue_value += product.price().checked_mul(product.quantity)?;
                    created += 1;
                }
                Err(e) => warn!(name, error = %e, "Failed to insert product"),
            }
        }
    }

    info!(
        products = created,
        buyers = BUYERS.len(),
        catalogue_value = %catalogue_value,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
