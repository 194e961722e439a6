use crate::domain::error::DomainError;
use crate::domain::model::{parse_concert_date, BookingRequest, ConcertId, SeatLabel};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// ログイン用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 予約用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub concert_id: i64,
    /// ISO-8601 ローカル日時（例: "2020-02-15T20:00:00"）
    pub date: String,
    pub seat_labels: Vec<String>,
}

impl CreateBookingRequest {
    /// ドメインの予約リクエストに変換する
    pub fn into_domain(self) -> Result<BookingRequest, DomainError> {
        let date = parse_concert_date(&self.date)?;
        let seat_labels = self
            .seat_labels
            .into_iter()
            .map(SeatLabel::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BookingRequest {
            concert_id: ConcertId::new(self.concert_id),
            date,
            seat_labels,
        })
    }
}

/// 空席状況の購読用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct ConcertInfoSubscriptionRequest {
    pub concert_id: i64,
    pub date: String,
    /// 空席率がこの値（%）を下回ったら通知する
    pub percentage_threshold: u32,
}

impl ConcertInfoSubscriptionRequest {
    pub fn concert_id(&self) -> ConcertId {
        ConcertId::new(self.concert_id)
    }

    pub fn parsed_date(&self) -> Result<NaiveDateTime, DomainError> {
        parse_concert_date(&self.date)
    }
}

/// 座席一覧取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct SeatsQueryParams {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_request_into_domain() {
        let request: CreateBookingRequest = serde_json::from_str(
            r#"{"concert_id": 1, "date": "2020-02-15T20:00:00", "seat_labels": ["A1", "B2"]}"#,
        )
        .unwrap();

        let booking_request = request.into_domain().unwrap();

        assert_eq!(booking_request.concert_id, ConcertId::new(1));
        assert_eq!(booking_request.date.to_string(), "2020-02-15 20:00:00");
        assert_eq!(
            booking_request.seat_labels,
            vec![SeatLabel::new("A1").unwrap(), SeatLabel::new("B2").unwrap()]
        );
    }

    #[test]
    fn test_booking_request_with_invalid_values() {
        let bad_date = CreateBookingRequest {
            concert_id: 1,
            date: "15/02/2020".to_string(),
            seat_labels: vec!["A1".to_string()],
        };
        assert!(bad_date.into_domain().is_err());

        let bad_label = CreateBookingRequest {
            concert_id: 1,
            date: "2020-02-15T20:00:00".to_string(),
            seat_labels: vec!["A1".to_string(), "A-2".to_string()],
        };
        assert!(bad_label.into_domain().is_err());
    }

    #[test]
    fn test_subscription_request_deserialization() {
        let request: ConcertInfoSubscriptionRequest = serde_json::from_str(
            r#"{"concert_id": 3, "date": "2020-02-15T20:00:00", "percentage_threshold": 50}"#,
        )
        .unwrap();

        assert_eq!(request.concert_id(), ConcertId::new(3));
        assert!(request.parsed_date().is_ok());
        assert_eq!(request.percentage_threshold, 50);
    }
}
