use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_seat_repository::seat_from_row;
use crate::domain::model::{Booking, BookingId, ConcertId};
use crate::domain::port::{BookingRepository, RepositoryError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

/// 予約と座席を JOIN して取得する共通部分
const BOOKING_SELECT: &str = r#"
    SELECT
        b.id AS booking_id, b.concert_id, b.username,
        s.date, s.label, s.price_cents, s.is_booked, s.version
    FROM bookings b
    JOIN booking_seats bs ON bs.booking_id = b.id
    JOIN seats s ON s.date = bs.date AND s.label = bs.label
"#;

/// MySQL予約リポジトリ（参照専用）
/// 予約の保存は MySqlSeatClaimTransaction が座席の確保と同じトランザクションで行う
pub struct MySqlBookingRepository {
    pool: Pool<MySql>,
}

impl MySqlBookingRepository {
    /// 新しいMySQL予約リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// 予約ID順・座席順に並んだ行から予約を組み立てる
    fn build_bookings(rows: &[MySqlRow]) -> Result<Vec<Booking>, RepositoryError> {
        let decode = |e: sqlx::Error| {
            DatabaseError::DecodeError(format!("予約の列の取得に失敗しました: {}", e))
        };

        // (id, concert_id, date, username, seats)
        let mut groups: Vec<(String, i64, NaiveDateTime, String, Vec<_>)> = Vec::new();
        for row in rows {
            let booking_id: String = row.try_get("booking_id").map_err(decode)?;
            let seat = seat_from_row(row)?;

            match groups.last_mut() {
                Some(group) if group.0 == booking_id => group.4.push(seat),
                _ => {
                    let concert_id: i64 = row.try_get("concert_id").map_err(decode)?;
                    let username: String = row.try_get("username").map_err(decode)?;
                    groups.push((booking_id, concert_id, seat.date(), username, vec![seat]));
                }
            }
        }

        groups
            .into_iter()
            .map(|(id, concert_id, date, username, seats)| {
                let id = BookingId::from_string(&id).map_err(|e| {
                    RepositoryError::FetchFailed(format!("予約IDの解析に失敗しました: {}", e))
                })?;
                Booking::new(id, ConcertId::new(concert_id), date, seats, username).map_err(|e| {
                    RepositoryError::FetchFailed(format!("予約の再構築に失敗しました: {}", e))
                })
            })
            .collect()
    }
}

#[async_trait]
impl BookingRepository for MySqlBookingRepository {
    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        let sql = format!("{} WHERE b.id = ? ORDER BY bs.position", BOOKING_SELECT);
        let rows = sqlx::query(&sql)
            .bind(booking_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("予約の取得に失敗しました", e))?;

        Ok(Self::build_bookings(&rows)?.into_iter().next())
    }

    async fn find_by_username(&self, username: &str) -> Result<Vec<Booking>, RepositoryError> {
        let sql = format!(
            "{} WHERE b.username = ? ORDER BY b.created_at, b.id, bs.position",
            BOOKING_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("ユーザーの予約一覧の取得に失敗しました", e))?;

        Self::build_bookings(&rows)
    }

    fn next_identity(&self) -> BookingId {
        BookingId::new()
    }
}
