//! Database seeder for Recibo development and testing.
//!
//! Seeds a development household, a user belonging to it, and the default
//! category set.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use recibo_db::entities::{categories, households, users};

/// Development household ID (consistent for all seeds)
const DEV_HOUSEHOLD_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Development user ID (consistent for all seeds)
const DEV_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

/// The default category set every new household starts with.
const DEFAULT_CATEGORIES: &[(&str, &str, &str, i32)] = &[
    ("Groceries", "groceries", "🛒", 1),
    ("Dining", "dining", "🍽️", 2),
    ("Coffee", "coffee", "☕", 3),
    ("Transportation", "transportation", "🚗", 4),
    ("Entertainment", "entertainment", "🎬", 5),
    ("Shopping", "shopping", "🛍️", 6),
    ("Utilities", "utilities", "💡", 7),
    ("Healthcare", "healthcare", "🏥", 8),
    ("Home", "home", "🏠", 9),
    ("Mortgage/Rent", "mortgage-rent", "🏦", 10),
    ("Insurance", "insurance", "🛡️", 11),
    ("Subscriptions", "subscriptions", "📱", 12),
    ("Personal Care", "personal-care", "💇", 13),
    ("Daycare", "daycare", "👶", 14),
    ("Kids/Family", "kids-family", "👨‍👩‍👧", 15),
    ("Pets", "pets", "🐕", 16),
    ("Travel", "travel", "✈️", 17),
    ("Gifts", "gifts", "🎁", 18),
    ("Other", "other", "📦", 99),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = recibo_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding development household...");
    seed_household(&db).await;

    println!("Seeding development user...");
    seed_user(&db).await;

    println!("Seeding default categories...");
    seed_categories(&db).await;

    println!("Seeding complete!");
}

fn dev_household_id() -> Uuid {
    Uuid::parse_str(DEV_HOUSEHOLD_ID).unwrap()
}

fn dev_user_id() -> Uuid {
    Uuid::parse_str(DEV_USER_ID).unwrap()
}

/// Seeds the development household.
async fn seed_household(db: &DatabaseConnection) {
    if households::Entity::find_by_id(dev_household_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Development household already exists, skipping...");
        return;
    }

    let household = households::ActiveModel {
        id: Set(dev_household_id()),
        name: Set("Dev Household".to_string()),
        created_at: Set(Utc::now().into()),
    };

    if let Err(e) = household.insert(db).await {
        eprintln!("Failed to insert household: {e}");
    } else {
        println!("  Created development household");
    }
}

/// Seeds a user belonging to the development household.
async fn seed_user(db: &DatabaseConnection) {
    if users::Entity::find_by_id(dev_user_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Development user already exists, skipping...");
        return;
    }

    let user = users::ActiveModel {
        id: Set(dev_user_id()),
        email: Set("dev@recibo.dev".to_string()),
        name: Set("Dev User".to_string()),
        household_id: Set(Some(dev_household_id())),
        created_at: Set(Utc::now().into()),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert user: {e}");
    } else {
        println!("  Created development user: dev@recibo.dev");
    }
}

/// Seeds the default category set, skipping slugs that already exist.
async fn seed_categories(db: &DatabaseConnection) {
    for (name, slug, icon, sort_order) in DEFAULT_CATEGORIES {
        let existing = categories::Entity::find()
            .filter(categories::Column::HouseholdId.eq(dev_household_id()))
            .filter(categories::Column::Slug.eq(*slug))
            .one(db)
            .await
            .ok()
            .flatten();

        if existing.is_some() {
            continue;
        }

        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            household_id: Set(dev_household_id()),
            name: Set((*name).to_string()),
            slug: Set((*slug).to_string()),
            icon: Set(Some((*icon).to_string())),
            is_active: Set(true),
            sort_order: Set(*sort_order),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = category.insert(db).await {
            eprintln!("Failed to insert category '{slug}': {e}");
        } else {
            println!("  Created category: {name}");
        }
    }
}
