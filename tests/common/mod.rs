use axum_tour_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        guides::ActiveModel as GuideActive, tours::ActiveModel as TourActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

// Tests in one binary run on parallel threads but share the database; the
// guard serializes them around the truncate.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub struct TestDb {
    pub state: AppState,
    _guard: MutexGuard<'static, ()>,
}

/// Returns None (and prints why) when no database is configured, so the
/// integration flows skip instead of failing on laptops without Postgres.
pub async fn setup_state() -> anyhow::Result<Option<TestDb>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let guard = DB_LOCK.lock().await;

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE bookings, tour_guides, guides, tours, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-jwt-secret".into(),
        payment_secret: "test-payment-secret".into(),
        payment_base_url: "https://pay.example.test/pay".into(),
        payment_return_url: "http://127.0.0.1:3000/api/payments/return".into(),
    };

    Ok(Some(TestDb {
        state: AppState { pool, orm, config },
        _guard: guard,
    }))
}

pub async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set("admin@example.com".into()),
        password_hash: Set("dummy".into()),
        role: Set("admin".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: "admin".into(),
    })
}

pub async fn seed_tour(
    state: &AppState,
    name: &str,
    price: i64,
    max_guests: i32,
) -> anyhow::Result<Uuid> {
    let tour = TourActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        description: Set(None),
        price: Set(price),
        max_guests: Set(max_guests),
        duration_days: Set(1),
        status: Set("active".into()),
        is_featured: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(tour.id)
}

pub async fn seed_guide(state: &AppState, name: &str, email: &str) -> anyhow::Result<Uuid> {
    let guide = GuideActive {
        id: Set(Uuid::new_v4()),
        full_name: Set(name.into()),
        email: Set(email.into()),
        phone: Set(None),
        languages: Set(serde_json::json!(["vi", "en"])),
        experience_years: Set(5),
        average_rating: Set(None),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(guide.id)
}
