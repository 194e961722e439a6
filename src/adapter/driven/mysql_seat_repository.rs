use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Booking, Money, Seat, SeatAvailability, SeatLabel, SeatStatusFilter};
use crate::domain::port::{
    ClaimOutcome, CommitOutcome, RepositoryError, SeatClaimTransaction, SeatRepository,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlDatabaseError, MySqlRow};
use sqlx::{MySql, Pool, Row, Transaction};

/// 行から座席を復元する
/// date, label, price_cents, is_booked, version の列を必要とする
pub(crate) fn seat_from_row(row: &MySqlRow) -> Result<Seat, RepositoryError> {
    let decode = |e: sqlx::Error| {
        DatabaseError::DecodeError(format!("座席の列の取得に失敗しました: {}", e))
    };

    let label: String = row.try_get("label").map_err(decode)?;
    let date: NaiveDateTime = row.try_get("date").map_err(decode)?;
    let price_cents: i64 = row.try_get("price_cents").map_err(decode)?;
    let is_booked: bool = row.try_get("is_booked").map_err(decode)?;
    let version: u64 = row.try_get("version").map_err(decode)?;

    let label = SeatLabel::new(label).map_err(|e| {
        RepositoryError::FetchFailed(format!("座席ラベルの解析に失敗しました: {}", e))
    })?;

    Ok(Seat::reconstruct(
        label,
        date,
        Money::nzd(price_cents),
        is_booked,
        version,
    ))
}

/// ER_LOCK_WAIT_TIMEOUT
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
/// ER_LOCK_DEADLOCK
const ER_LOCK_DEADLOCK: u16 = 1213;

fn is_lock_contention_code(number: u16) -> bool {
    number == ER_LOCK_DEADLOCK || number == ER_LOCK_WAIT_TIMEOUT
}

/// 行ロックの競合（デッドロック・ロック待ちタイムアウト）によるエラーか
fn is_lock_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(|mysql_err| is_lock_contention_code(mysql_err.number()))
            .unwrap_or(false),
        _ => false,
    }
}

fn count_to_u32(value: i64, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::FetchFailed(format!("{} が範囲外です: {}", column, value))
    })
}

/// MySQL座席在庫リポジトリ
pub struct MySqlSeatRepository {
    pool: Pool<MySql>,
}

impl MySqlSeatRepository {
    /// 新しいMySQL座席在庫リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeatRepository for MySqlSeatRepository {
    async fn find_by_date_and_label(
        &self,
        date: NaiveDateTime,
        label: &SeatLabel,
    ) -> Result<Option<Seat>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT date, label, price_cents, is_booked, version
            FROM seats
            WHERE date = ? AND label = ?
            "#,
        )
        .bind(date)
        .bind(label.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("座席の取得に失敗しました", e))?;

        row.as_ref().map(seat_from_row).transpose()
    }

    async fn find_by_date(
        &self,
        date: NaiveDateTime,
        filter: SeatStatusFilter,
    ) -> Result<Vec<Seat>, RepositoryError> {
        let query = match filter {
            SeatStatusFilter::Any => sqlx::query(
                r#"
                SELECT date, label, price_cents, is_booked, version
                FROM seats
                WHERE date = ?
                ORDER BY label
                "#,
            )
            .bind(date),
            SeatStatusFilter::Booked | SeatStatusFilter::Unbooked => sqlx::query(
                r#"
                SELECT date, label, price_cents, is_booked, version
                FROM seats
                WHERE date = ? AND is_booked = ?
                ORDER BY label
                "#,
            )
            .bind(date)
            .bind(filter == SeatStatusFilter::Booked),
        };

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("座席一覧の取得に失敗しました", e))?;

        rows.iter().map(seat_from_row).collect()
    }

    async fn availability(&self, date: NaiveDateTime) -> Result<SeatAvailability, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT
                CAST(COALESCE(SUM(CASE WHEN is_booked THEN 0 ELSE 1 END), 0) AS SIGNED) AS free,
                CAST(COUNT(*) AS SIGNED) AS total
            FROM seats
            WHERE date = ?
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("空席数の集計に失敗しました", e))?;

        let decode = |e: sqlx::Error| {
            DatabaseError::DecodeError(format!("空席数の取得に失敗しました: {}", e))
        };
        let free: i64 = row.try_get("free").map_err(decode)?;
        let total: i64 = row.try_get("total").map_err(decode)?;

        Ok(SeatAvailability::new(
            count_to_u32(free, "free")?,
            count_to_u32(total, "total")?,
        ))
    }

    async fn begin_claim(&self) -> Result<Box<dyn SeatClaimTransaction>, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::connection("トランザクション開始に失敗しました", e))?;

        Ok(Box::new(MySqlSeatClaimTransaction { tx }))
    }
}

/// MySQLの座席確保トランザクション
/// 確保と予約の保存を1つのデータベーストランザクションで行う
/// commit されずに破棄された場合は sqlx がロールバックする
pub struct MySqlSeatClaimTransaction {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl SeatClaimTransaction for MySqlSeatClaimTransaction {
    async fn claim(&mut self, seat: &Seat) -> Result<ClaimOutcome, RepositoryError> {
        // 読み取り時のバージョンのままで空席の場合のみ更新される
        let result = sqlx::query(
            r#"
            UPDATE seats
            SET is_booked = TRUE, version = version + 1
            WHERE date = ? AND label = ? AND version = ? AND is_booked = FALSE
            "#,
        )
        .bind(seat.date())
        .bind(seat.label().as_str())
        .bind(seat.version())
        .execute(&mut *self.tx)
        .await;

        // ロック競合で敗れた側は他の予約に先を越されたものとして扱う
        let result = match result {
            Ok(result) => result,
            Err(e) if is_lock_contention(&e) => return Ok(ClaimOutcome::Conflict),
            Err(e) => return Err(DatabaseError::query("座席の確保に失敗しました", e).into()),
        };

        if result.rows_affected() == 1 {
            Ok(ClaimOutcome::Claimed)
        } else {
            Ok(ClaimOutcome::Conflict)
        }
    }

    async fn save_booking(&mut self, booking: &Booking) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, concert_id, date, username)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(booking.id().to_string())
        .bind(booking.concert_id().as_i64())
        .bind(booking.date())
        .bind(booking.username())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::query("予約の保存に失敗しました", e))?;

        for (position, seat) in booking.seats().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO booking_seats (booking_id, position, date, label)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(booking.id().to_string())
            .bind(position as i32)
            .bind(seat.date())
            .bind(seat.label().as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::query("予約座席の保存に失敗しました", e))?;
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<CommitOutcome, RepositoryError> {
        let MySqlSeatClaimTransaction { tx } = *self;
        // 確保の UPDATE が行ロックを保持しているため、ここで競合が見つかることはない
        tx.commit()
            .await
            .map_err(|e| DatabaseError::query("トランザクションのコミットに失敗しました", e))?;
        Ok(CommitOutcome::Committed)
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        let MySqlSeatClaimTransaction { tx } = *self;
        tx.rollback().await.map_err(|e| {
            DatabaseError::query("トランザクションのロールバックに失敗しました", e)
        })?;
        Ok(())
    }
}
