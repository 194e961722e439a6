use crate::adapter::database_error::DatabaseError;
use sqlx::{MySql, Pool};

/// スキーマのマイグレーション
/// ファイル名の番号順に実行する
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_concerts_table",
        include_str!("../../migrations/001_create_concerts_table.sql"),
    ),
    (
        "002_create_performers_table",
        include_str!("../../migrations/002_create_performers_table.sql"),
    ),
    (
        "003_create_concert_dates_table",
        include_str!("../../migrations/003_create_concert_dates_table.sql"),
    ),
    (
        "004_create_concert_performers_table",
        include_str!("../../migrations/004_create_concert_performers_table.sql"),
    ),
    (
        "005_create_users_table",
        include_str!("../../migrations/005_create_users_table.sql"),
    ),
    (
        "006_create_seats_table",
        include_str!("../../migrations/006_create_seats_table.sql"),
    ),
    (
        "007_create_bookings_table",
        include_str!("../../migrations/007_create_bookings_table.sql"),
    ),
    (
        "008_create_booking_seats_table",
        include_str!("../../migrations/008_create_booking_seats_table.sql"),
    ),
];

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// すべて CREATE TABLE IF NOT EXISTS のため何度実行してもよい
    pub async fn run(&self) -> Result<(), DatabaseError> {
        for (name, sql) in MIGRATIONS {
            tracing::debug!(migration = %name, "running migration");
            sqlx::query(sql).execute(&self.pool).await.map_err(|e| {
                DatabaseError::MigrationError(format!("Migration {} failed: {}", name, e))
            })?;
        }

        tracing::info!(count = MIGRATIONS.len(), "all migrations completed");
        Ok(())
    }
}
