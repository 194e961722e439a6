use crate::domain::model::{Booking, Concert, ConcertSummary, Performer, Seat};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 日時を "2020-02-15T20:00:00" 形式に変換
fn format_date(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// 出演者用のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct PerformerResponse {
    pub id: i64,
    pub name: String,
    pub image_name: String,
    pub genre: String,
    pub blurb: String,
}

impl PerformerResponse {
    pub fn from_performer(performer: &Performer) -> Self {
        Self {
            id: performer.id.as_i64(),
            name: performer.name.clone(),
            image_name: performer.image_name.clone(),
            genre: performer.genre.to_string(),
            blurb: performer.blurb.clone(),
        }
    }
}

/// コンサート詳細用のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct ConcertResponse {
    pub id: i64,
    pub title: String,
    pub image_name: String,
    pub blurb: String,
    pub dates: Vec<String>,
    pub performers: Vec<PerformerResponse>,
}

impl ConcertResponse {
    pub fn from_concert(concert: &Concert) -> Self {
        Self {
            id: concert.id.as_i64(),
            title: concert.title.clone(),
            image_name: concert.image_name.clone(),
            blurb: concert.blurb.clone(),
            dates: concert.dates.iter().copied().map(format_date).collect(),
            performers: concert
                .performers
                .iter()
                .map(PerformerResponse::from_performer)
                .collect(),
        }
    }
}

/// コンサート一覧用のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct ConcertSummaryResponse {
    pub id: i64,
    pub title: String,
    pub image_name: String,
}

impl ConcertSummaryResponse {
    pub fn from_summary(summary: &ConcertSummary) -> Self {
        Self {
            id: summary.id.as_i64(),
            title: summary.title.clone(),
            image_name: summary.image_name.clone(),
        }
    }
}

/// 座席用のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct SeatResponse {
    pub label: String,
    /// "99.00" 形式の価格
    pub price: String,
    pub currency: String,
    pub is_booked: bool,
}

impl SeatResponse {
    pub fn from_seat(seat: &Seat) -> Self {
        Self {
            label: seat.label().to_string(),
            price: seat.price().to_decimal_string(),
            currency: seat.price().currency(),
            is_booked: seat.is_booked(),
        }
    }
}

/// 予約用のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: String,
    pub concert_id: i64,
    pub date: String,
    pub seats: Vec<SeatResponse>,
    /// 座席価格の合計（通貨が混在する場合は省略）
    pub total_price: Option<String>,
}

impl BookingResponse {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            id: booking.id().to_string(),
            concert_id: booking.concert_id().as_i64(),
            date: format_date(booking.date()),
            seats: booking.seats().iter().map(SeatResponse::from_seat).collect(),
            total_price: booking
                .total_price()
                .ok()
                .map(|total| total.to_decimal_string()),
        }
    }
}

/// 予約作成用のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub booking_id: String,
}

/// ログイン用のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
