use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use axum_tour_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user_with_role(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "user@example.com", "user123", "user").await?;
    let guide_ids = seed_guides(&pool).await?;
    seed_tours(&pool, &guide_ids).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
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
        INSERT INTO users (id, email, password_hash, role)
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

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_guides(pool: &sqlx::PgPool) -> anyhow::Result<Vec<Uuid>> {
    let guides = vec![
        ("Lan Nguyen", "lan@example.com", vec!["vi", "en"], 7),
        ("Minh Pham", "minh@example.com", vec!["vi", "en", "fr"], 4),
        ("Huong Le", "huong@example.com", vec!["vi"], 10),
    ];

    let mut ids = Vec::new();
    for (name, email, languages, years) in guides {
        sqlx::query(
            r#"
            INSERT INTO guides (id, full_name, email, languages, experience_years)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(serde_json::json!(languages))
        .bind(years)
        .execute(pool)
        .await?;

        let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM guides WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await?;
        ids.push(id);
    }

    println!("Seeded guides");
    Ok(ids)
}

async fn seed_tours(pool: &sqlx::PgPool, guide_ids: &[Uuid]) -> anyhow::Result<()> {
    let tours = vec![
        ("Mekong Delta Day Trip", "Boat ride and floating market", 1_200_000i64, 12, 1),
        ("Ha Giang Loop", "Three days through the northern passes", 5_400_000, 8, 3),
        ("Hoi An Old Town Walk", "Lanterns, food, and tailor shops", 650_000, 15, 1),
    ];

    for (name, desc, price, max_guests, days) in tours {
        sqlx::query(
            r#"
            INSERT INTO tours (id, name, description, price, max_guests, duration_days, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(max_guests)
        .bind(days)
        .execute(pool)
        .await?;

        let (tour_id,): (Uuid,) = sqlx::query_as("SELECT id FROM tours WHERE name = $1")
            .bind(name)
            .fetch_one(pool)
            .await?;

        // First two guides per tour, first one as default.
        for (position, guide_id) in guide_ids.iter().take(2).enumerate() {
            sqlx::query(
                r#"
                INSERT INTO tour_guides (id, tour_id, guide_id, is_default, position)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (tour_id, guide_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(tour_id)
            .bind(guide_id)
            .bind(position == 0)
            .bind(position as i32)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded tours");
    Ok(())
}
