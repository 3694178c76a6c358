//! Development seed script
//!
//! - 2 accounts: admin@gmail.com / admin123 and user@gmail.com / user123
//! - A curated menu catalog (5 cuisines, every meal slot), each dish with a variant
//! - Preferences and a notification schedule for the sample user
//!
//! Usage:
//!   DATABASE_URL=... ./seed [--skip-menus]

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::PgPool;

use meal_planner_api::{
    db,
    models::{
        menu::{CreateMenuRequest, MealType},
        preference::UpdatePreferenceRequest,
        schedule::UpdateScheduleRequest,
        user::UserRole,
    },
    services::{
        menu::MenuService, preferences::PreferenceService, schedules::ScheduleService,
        users::BCRYPT_COST,
    },
};

use MealType::{Breakfast, Dinner, Lunch};

const SEED_TIMEZONE: &str = "Asia/Bangkok";
const VARIANTS: [&str; 4] = ["Signature", "Deluxe", "Premium", "Chef's Special"];

#[derive(Parser, Debug)]
#[command(about = "Seed the meal planner database with sample accounts and menus")]
struct Args {
    /// Keep the existing menu catalog.
    #[arg(long)]
    skip_menus: bool,
}

struct Dish {
    title: &'static str,
    cuisine: &'static str,
    meal_type: MealType,
    photo_id: &'static str,
    budget: (f64, f64),
    allergens: &'static [&'static str],
}

const fn dish(
    title: &'static str,
    cuisine: &'static str,
    meal_type: MealType,
    photo_id: &'static str,
    budget: (f64, f64),
    allergens: &'static [&'static str],
) -> Dish {
    Dish { title, cuisine, meal_type, photo_id, budget, allergens }
}

const CURATED: &[Dish] = &[
    // Thai
    dish("Thai Jok (Rice Porridge)", "Thai", Breakfast, "1516684981049-7b3f9b5f52c7", (45.0, 80.0), &[]),
    dish("Pad Thai", "Thai", Lunch, "1559847844-5315695daece", (70.0, 120.0), &["peanut", "shrimp", "egg"]),
    dish("Tom Yum Goong", "Thai", Dinner, "1578662996442-48f60103fc96", (100.0, 160.0), &["shrimp"]),
    dish("Green Curry Chicken", "Thai", Dinner, "1586190848861-99aa4a171e90", (100.0, 170.0), &["dairy"]),
    // Japanese
    dish("Japanese Breakfast Set", "Japanese", Breakfast, "1567620905732-2d1ec7ab7445", (120.0, 180.0), &["fish", "soy", "egg"]),
    dish("Salmon Sushi Set", "Japanese", Lunch, "1563379091339-03246963d18c", (180.0, 320.0), &["fish", "soy"]),
    dish("Tonkotsu Ramen", "Japanese", Dinner, "1555939594-58d7cb561ad1", (160.0, 280.0), &["gluten", "egg", "soy"]),
    dish("Tempura Bento", "Japanese", Lunch, "1571091718761-18b5b1457add", (150.0, 260.0), &["egg", "gluten", "soy"]),
    // Chinese
    dish("Chinese Congee", "Chinese", Breakfast, "1572802419224-296b0aeee0d9", (50.0, 90.0), &[]),
    dish("Yangzhou Fried Rice", "Chinese", Lunch, "1565299624946-b28f40a0ca4b", (80.0, 140.0), &["egg"]),
    dish("Kung Pao Chicken", "Chinese", Dinner, "1574484284002-8dcaaaeaf4a4", (120.0, 200.0), &["peanut", "soy"]),
    dish("Dim Sum Assortment", "Chinese", Lunch, "1565299543927-795dd21bf5b2", (140.0, 240.0), &["gluten", "soy", "egg", "shrimp"]),
    // Korean
    dish("Korean Egg Toast", "Korean", Breakfast, "1572802419224-296b0aeee0d9", (70.0, 110.0), &["egg", "dairy", "gluten"]),
    dish("Bibimbap", "Korean", Lunch, "1579952363873-27d3bfad9c0d", (130.0, 220.0), &["egg", "soy"]),
    dish("Korean BBQ Set", "Korean", Dinner, "1586190848861-99aa4a171e90", (220.0, 450.0), &["soy"]),
    dish("Kimchi Jjigae", "Korean", Dinner, "1578662996442-48f60103fc96", (120.0, 190.0), &["soy", "fish"]),
    // Western
    dish("Pancakes with Berries", "Western", Breakfast, "1567620905732-2d1ec7ab7445", (120.0, 200.0), &["egg", "dairy", "gluten"]),
    dish("Margherita Pizza", "Western", Lunch, "1565299624946-b28f40a0ca4b", (150.0, 260.0), &["dairy", "gluten"]),
    dish("Classic Cheeseburger", "Western", Dinner, "1571091718761-18b5b1457add", (150.0, 240.0), &["gluten", "dairy"]),
    dish("Spaghetti Carbonara", "Western", Dinner, "1555939594-58d7cb561ad1", (140.0, 230.0), &["egg", "dairy", "gluten"]),
];

fn image_url(photo_id: &str) -> String {
    format!("https://images.unsplash.com/photo-{photo_id}?auto=format&fit=crop&w=800&h=600&q=85")
}

/// The base dish plus one variant with a slightly wider budget.
fn menu_requests(index: usize, d: &Dish) -> [CreateMenuRequest; 2] {
    let (min, max) = d.budget;
    let allergens: Vec<String> = d.allergens.iter().map(|a| a.to_string()).collect();
    let variant = VARIANTS[index % VARIANTS.len()];
    [
        CreateMenuRequest {
            title: d.title.to_string(),
            meal_type: d.meal_type,
            cuisine: d.cuisine.to_string(),
            is_active: true,
            notes: Some(format!("Authentic {} {}", d.cuisine, d.meal_type)),
            allergens: allergens.clone(),
            budget_min: Some(min),
            budget_max: Some(max),
            image_url: Some(image_url(d.photo_id)),
        },
        CreateMenuRequest {
            title: format!("{} {variant}", d.title),
            meal_type: d.meal_type,
            cuisine: d.cuisine.to_string(),
            is_active: true,
            notes: Some(format!("{variant} edition")),
            allergens,
            budget_min: Some((min - 10.0).max(40.0)),
            budget_max: Some(max + 20.0),
            image_url: Some(image_url(d.photo_id)),
        },
    ]
}

async fn upsert_account(
    pool: &PgPool,
    email: &str,
    password: &str,
    name: &str,
    role: UserRole,
) -> Result<uuid::Uuid> {
    let hash = bcrypt::hash(password, BCRYPT_COST).context("Failed to hash password")?;
    let id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, password_hash, name, role, timezone)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (email) DO UPDATE SET
             password_hash = EXCLUDED.password_hash,
             name = EXCLUDED.name,
             role = EXCLUDED.role,
             timezone = EXCLUDED.timezone,
             updated_at = NOW()
         RETURNING id",
    )
    .bind(email)
    .bind(&hash)
    .bind(name)
    .bind(role.to_string())
    .bind(SEED_TIMEZONE)
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to upsert {email}"))?;
    println!("  {email} ({role})");
    Ok(id)
}

async fn seed_menus(pool: &PgPool) -> Result<()> {
    sqlx::query("DELETE FROM menus")
        .execute(pool)
        .await
        .context("Failed to clear menus")?;

    let mut count = 0;
    for (i, d) in CURATED.iter().enumerate() {
        for req in menu_requests(i, d) {
            MenuService::create(pool, &req)
                .await
                .with_context(|| format!("Failed to insert menu {}", req.title))?;
            count += 1;
        }
    }
    println!("  {count} menus inserted");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let pool = db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool).await?;

    println!("=== Seed meal planner ===");

    println!("Seeding users...");
    upsert_account(&pool, "admin@gmail.com", "admin123", "Admin User", UserRole::Admin).await?;
    let user_id =
        upsert_account(&pool, "user@gmail.com", "user123", "Sample User", UserRole::User).await?;

    if args.skip_menus {
        println!("Skipping menus");
    } else {
        println!("Seeding menus...");
        seed_menus(&pool).await?;
    }

    println!("Seeding preferences and schedule for the sample user...");
    let preference = UpdatePreferenceRequest {
        cuisines: Some(vec!["Thai".into(), "Japanese".into()]),
        allergens_avoid: Some(vec!["peanut".into()]),
        budget_min: Some(Some(50.0)),
        budget_max: Some(Some(120.0)),
        excluded_meal_types: Some(vec![]),
    };
    PreferenceService::upsert(&pool, user_id, &preference).await?;
    ScheduleService::upsert(&pool, user_id, &UpdateScheduleRequest::default(), SEED_TIMEZONE)
        .await?;

    println!("Done.");
    println!("Admin: admin@gmail.com / admin123");
    println!("User:  user@gmail.com / user123");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_widens_budget() {
        let [base, variant] = menu_requests(1, &CURATED[0]);
        assert_eq!(base.title, "Thai Jok (Rice Porridge)");
        assert_eq!(variant.title, "Thai Jok (Rice Porridge) Deluxe");
        assert_eq!(variant.budget_min, Some(40.0));
        assert_eq!(variant.budget_max, Some(100.0));
        assert!(base.validate().is_ok() && variant.validate().is_ok());
    }

    #[test]
    fn test_catalog_covers_every_slot() {
        for slot in MealType::ALL {
            assert!(CURATED.iter().any(|d| d.meal_type == slot), "{slot} missing");
        }
    }
}
