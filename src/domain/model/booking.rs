use crate::domain::error::DomainError;
use crate::domain::model::{BookingId, ConcertId, Money, Seat, SeatLabel};
use chrono::NaiveDateTime;

/// 予約リクエスト
/// 永続化されない予約処理への入力
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub concert_id: ConcertId,
    pub date: NaiveDateTime,
    /// 呼び出し側が指定した順序の座席ラベル
    pub seat_labels: Vec<SeatLabel>,
}

/// 予約集約
/// 一度の予約トランザクションで確保された座席の集合
/// 作成後は変更されない
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    id: BookingId,
    concert_id: ConcertId,
    date: NaiveDateTime,
    seats: Vec<Seat>,
    username: String,
}

impl Booking {
    /// 新しい予約を作成
    ///
    /// # Arguments
    /// * `id` - 予約ID
    /// * `concert_id` - コンサートID
    /// * `date` - 公演日時
    /// * `seats` - 確保済みの座席（1つ以上）
    /// * `username` - 予約したユーザー
    ///
    /// # Returns
    /// * `Ok(Booking)` - 作成成功
    /// * `Err(DomainError)` - 座席が空、または公演日時が一致しない座席を含む
    pub fn new(
        id: BookingId,
        concert_id: ConcertId,
        date: NaiveDateTime,
        seats: Vec<Seat>,
        username: String,
    ) -> Result<Self, DomainError> {
        if seats.is_empty() {
            return Err(DomainError::EmptySeatSelection);
        }
        if let Some(seat) = seats.iter().find(|seat| seat.date() != date) {
            return Err(DomainError::InvalidValue(format!(
                "座席 {} の公演日時が予約と一致しません",
                seat.label()
            )));
        }
        Ok(Self {
            id,
            concert_id,
            date,
            seats,
            username,
        })
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn concert_id(&self) -> ConcertId {
        self.concert_id
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// 指定ユーザーの予約か
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.username == username
    }

    /// 座席価格の合計を計算
    pub fn total_price(&self) -> Result<Money, DomainError> {
        self.seats
            .iter()
            .try_fold(Money::nzd(0), |total, seat| total.add(&seat.price()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::parse_concert_date;

    fn seat(label: &str, date: &str, cents: i64) -> Seat {
        Seat::new(
            SeatLabel::new(label).unwrap(),
            parse_concert_date(date).unwrap(),
            Money::nzd(cents),
        )
    }

    #[test]
    fn test_booking_creation() {
        let date = parse_concert_date("2020-02-15T20:00:00").unwrap();
        let seats = vec![
            seat("A1", "2020-02-15T20:00:00", 9500),
            seat("A2", "2020-02-15T20:00:00", 9500),
        ];
        let booking = Booking::new(
            BookingId::new(),
            ConcertId::new(1),
            date,
            seats,
            "testuser".to_string(),
        )
        .unwrap();

        assert_eq!(booking.seats().len(), 2);
        assert!(booking.is_owned_by("testuser"));
        assert!(!booking.is_owned_by("someone"));
        assert_eq!(booking.total_price().unwrap(), Money::nzd(19000));
    }

    #[test]
    fn test_booking_requires_seats() {
        let date = parse_concert_date("2020-02-15T20:00:00").unwrap();
        let result = Booking::new(
            BookingId::new(),
            ConcertId::new(1),
            date,
            Vec::new(),
            "testuser".to_string(),
        );
        assert_eq!(result.unwrap_err(), DomainError::EmptySeatSelection);
    }

    #[test]
    fn test_booking_rejects_seat_from_other_date() {
        let date = parse_concert_date("2020-02-15T20:00:00").unwrap();
        let seats = vec![seat("A1", "2020-02-16T20:00:00", 9500)];
        let result = Booking::new(
            BookingId::new(),
            ConcertId::new(1),
            date,
            seats,
            "testuser".to_string(),
        );
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }
}
