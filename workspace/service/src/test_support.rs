use chrono::Duration;
use migration::{Migrator, MigratorTrait};
use model::entities::loan::{self, Currency, LoanStatus, LoanType};
use model::entities::user::{self, Role};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

use crate::token::{DEFAULT_VALIDITY_HOURS, TokenIssuer};

/// In-memory SQLite database with the schema applied.
pub async fn setup_db() -> DatabaseConnection {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None).await.expect("Migrations failed");
    db
}

pub fn test_issuer() -> TokenIssuer {
    TokenIssuer::new("service test secret", Duration::hours(DEFAULT_VALIDITY_HOURS))
}

pub async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    role: Role,
    is_blocked: bool,
) -> user::Model {
    user::ActiveModel {
        first_name: Set("Giorgi".to_string()),
        last_name: Set("Kapanadze".to_string()),
        username: Set(username.to_string()),
        age: Set(35),
        salary: Set(Decimal::new(4000, 0)),
        is_blocked: Set(is_blocked),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(role),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed user")
}

pub async fn seed_loan(db: &DatabaseConnection, user_id: i32, status: LoanStatus) -> loan::Model {
    loan::ActiveModel {
        loan_type: Set(LoanType::Rapid),
        amount: Set(Decimal::new(5000, 0)),
        currency: Set(Currency::Gel),
        loan_period: Set(12),
        status: Set(status),
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed loan")
}

pub async fn loan_count(db: &DatabaseConnection) -> u64 {
    loan::Entity::find()
        .count(db)
        .await
        .expect("Failed to count loans")
}
