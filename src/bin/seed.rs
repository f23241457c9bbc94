use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use storefront_access_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_profile(&pool, "admin@example.com", "admin123", "admin").await?;
    let owner_one = ensure_profile(&pool, "boutique@example.com", "owner123", "user").await?;
    let owner_two = ensure_profile(&pool, "outfitters@example.com", "owner123", "user").await?;
    let customer_id = ensure_profile(&pool, "customer@example.com", "user123", "user").await?;

    let boutique = ensure_store(&pool, owner_one, "Velvet Boutique").await?;
    let outfitters = ensure_store(&pool, owner_two, "North Outfitters").await?;

    seed_products(&pool, boutique, outfitters).await?;

    println!(
        "Seed completed. Admin: {admin_id}, owners: {owner_one}/{owner_two}, customer: {customer_id}"
    );
    Ok(())
}

async fn ensure_profile(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO profiles (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let profile_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured profile {email} (role={role})");
    Ok(profile_id)
}

async fn ensure_store(pool: &sqlx::PgPool, owner_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO stores (id, owner_id, name, is_active)
        VALUES ($1, $2, $3, true)
        ON CONFLICT (name) DO UPDATE SET owner_id = EXCLUDED.owner_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    let store_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM stores WHERE name = $1")
                .bind(name)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured store {name}");
    Ok(store_id)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    boutique: Uuid,
    outfitters: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        (boutique, "Silk Scarf", "Hand-rolled hem", 45000_i64, 40),
        (boutique, "Linen Dress", "Summer weight", 120000, 25),
        (outfitters, "Wool Overcoat", "Heavy winter cut", 380000, 12),
        (outfitters, "Canvas Tote", "Everyday carry", 28000, 80),
    ];

    for (store_id, name, desc, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, store_id, name, description, price, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
