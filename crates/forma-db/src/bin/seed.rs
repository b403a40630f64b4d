//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p forma-db --bin seed
//!
//! # Specify database path
//! cargo run -p forma-db --bin seed -- --db ./data/forma.db
//! ```
//!
//! ## Generated Catalog
//! - Product type "Bicycle" with Frame type, Frame finish, Wheels, Rim
//!   color and Chain, plus the shop's not-allowed combinations
//! - Product type "Gift card" (not customizable)
//! - Three bicycles with different overrides, one gift card

use std::env;

use forma_core::{Attribute, Customisation, NewAttribute, OptionRef, ProductOverride};
use forma_db::{Database, DbConfig, NewProduct, NewProductType};

/// Attributes of the demo bicycle, in definition order.
const BICYCLE_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("Frame type", &["Full-suspension", "Diamond", "Step-through"]),
    ("Frame finish", &["Matte", "Shiny"]),
    ("Wheels", &["Road wheels", "Mountain wheels", "Fat bike wheels"]),
    ("Rim color", &["Red", "Black", "Blue"]),
    ("Chain", &["Single-speed chain", "8-speed chain"]),
];

/// Shared rules as (attribute name, option name) pairs.
const BICYCLE_RULES: &[&[(&str, &str)]] = &[
    &[("Frame type", "Diamond"), ("Wheels", "Mountain wheels")],
    &[("Frame type", "Step-through"), ("Wheels", "Mountain wheels")],
    &[("Wheels", "Fat bike wheels"), ("Rim color", "Red")],
    &[("Frame type", "Full-suspension"), ("Frame finish", "Shiny"), ("Chain", "Single-speed chain")],
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./forma_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Forma Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./forma_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Forma Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.product_types().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} product types", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Bicycle catalog
    let bicycle = db
        .product_types()
        .create(&NewProductType {
            name: "Bicycle".to_string(),
            customisation: Customisation::FullyCustomizable,
        })
        .await?;

    let inputs: Vec<NewAttribute> = BICYCLE_ATTRIBUTES
        .iter()
        .map(|(name, options)| NewAttribute {
            attribute_name: name.to_string(),
            possible_options: options.iter().map(|o| o.to_string()).collect(),
        })
        .collect();
    let attributes = db.product_types().add_attributes(&bicycle.id, &inputs).await?;
    println!("✓ Bicycle: {} attributes", attributes.len());

    let rules: Vec<Vec<OptionRef>> = BICYCLE_RULES
        .iter()
        .map(|pairs| {
            pairs
                .iter()
                .map(|(a, o)| lookup(&attributes, a, o))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, String>>()?;
    let stored_rules = db
        .product_types()
        .add_not_allowed_combinations(&bicycle.id, &rules)
        .await?;
    println!("✓ Bicycle: {} not-allowed combinations", stored_rules.len());

    // Products
    let products = db.products();

    products
        .create(
            &NewProduct {
                product_type_id: bicycle.id.clone(),
                name: "Trail Explorer".to_string(),
                sku: "BIKE-TRAIL-01".to_string(),
                description: Some("Every option, shop rules only".to_string()),
            },
            &ProductOverride::default(),
        )
        .await?;

    let city_override = ProductOverride {
        deactivated_options: [lookup(&attributes, "Wheels", "Fat bike wheels")?]
            .into_iter()
            .collect(),
        out_of_stock_options: [lookup(&attributes, "Rim color", "Blue")?]
            .into_iter()
            .collect(),
        ..Default::default()
    };
    products
        .create(
            &NewProduct {
                product_type_id: bicycle.id.clone(),
                name: "City Cruiser".to_string(),
                sku: "BIKE-CITY-01".to_string(),
                description: Some("No fat bike wheels, blue rims on back order".to_string()),
            },
            &city_override,
        )
        .await?;

    let chain = attribute_id(&attributes, "Chain")?;
    let fixie_override = ProductOverride {
        deactivated_attributes: [chain].into_iter().collect(),
        deactivated_combinations: stored_rules.iter().take(1).map(|r| r.id).collect(),
        ..Default::default()
    };
    products
        .create(
            &NewProduct {
                product_type_id: bicycle.id.clone(),
                name: "Urban Fixie".to_string(),
                sku: "BIKE-FIXIE-01".to_string(),
                description: None,
            },
            &fixie_override,
        )
        .await?;

    // Fixed product
    let gift_card = db
        .product_types()
        .create(&NewProductType {
            name: "Gift card".to_string(),
            customisation: Customisation::NotCustomizable,
        })
        .await?;
    products
        .create(
            &NewProduct {
                product_type_id: gift_card.id,
                name: "Gift card 50".to_string(),
                sku: "GIFT-50".to_string(),
                description: None,
            },
            &ProductOverride::default(),
        )
        .await?;

    println!("✓ {} products", products.count().await?);
    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}

fn attribute_id(attributes: &[Attribute], name: &str) -> Result<i64, String> {
    attributes
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.id)
        .ok_or_else(|| format!("unknown attribute {name}"))
}

fn lookup(attributes: &[Attribute], attribute: &str, option: &str) -> Result<OptionRef, String> {
    let found = attributes
        .iter()
        .find(|a| a.name == attribute)
        .and_then(|a| {
            a.options
                .iter()
                .find(|o| o.name == option)
                .map(|o| OptionRef::new(a.id, o.id))
        });
    found.ok_or_else(|| format!("unknown option {attribute}/{option}"))
}
