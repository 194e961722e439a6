use crate::domain::error::DomainError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// コンサートの識別子
/// カタログ側で採番される数値ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConcertId(i64);

impl ConcertId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// 内部の数値を取得
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConcertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 出演者の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PerformerId(i64);

impl PerformerId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PerformerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 予約の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// 新しい一意のBookingIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから BookingId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からBookingIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

/// 座席ラベル（例: "A12"）
/// 英数字のみ、最大8文字
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatLabel(String);

impl SeatLabel {
    const MAX_LENGTH: usize = 8;

    pub fn new(label: impl Into<String>) -> Result<Self, DomainError> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidValue(
                "座席ラベルが空です".to_string(),
            ));
        }
        if trimmed.len() > Self::MAX_LENGTH || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidValue(format!(
                "無効な座席ラベル: {}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// ニュージーランドドル
    #[allow(clippy::upper_case_acronyms)]
    NZD,
}

/// 金額を表す値オブジェクト
/// 最小通貨単位（セント）の固定小数点で保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// 金額と通貨から作成
    pub fn new(amount: i64, currency: String) -> Result<Self, DomainError> {
        let currency = match currency.as_str() {
            "NZD" => Currency::NZD,
            _ => {
                return Err(DomainError::InvalidValue(format!(
                    "サポートされていない通貨: {}",
                    currency
                )))
            }
        };
        Ok(Self { amount, currency })
    }

    /// NZDの金額をセント単位で作成
    pub fn nzd(amount: i64) -> Self {
        Self {
            amount,
            currency: Currency::NZD,
        }
    }

    /// 金額（セント）を取得
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 通貨を文字列として取得
    pub fn currency(&self) -> String {
        match self.currency {
            Currency::NZD => "NZD".to_string(),
        }
    }

    /// 金額を加算
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch);
        }
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        })
    }

    /// "123.45" 形式の文字列に変換
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// 座席一覧取得時の予約状態フィルター
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeatStatusFilter {
    Any,
    Booked,
    Unbooked,
}

impl SeatStatusFilter {
    /// 文字列からフィルターを作成（大文字小文字を区別する）
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "Any" => Ok(SeatStatusFilter::Any),
            "Booked" => Ok(SeatStatusFilter::Booked),
            "Unbooked" => Ok(SeatStatusFilter::Unbooked),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な予約状態フィルター: {}",
                s
            ))),
        }
    }

    /// 予約状態がフィルター条件に合致するか
    pub fn accepts(&self, is_booked: bool) -> bool {
        match self {
            SeatStatusFilter::Any => true,
            SeatStatusFilter::Booked => is_booked,
            SeatStatusFilter::Unbooked => !is_booked,
        }
    }
}

impl fmt::Display for SeatStatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SeatStatusFilter::Any => "Any",
            SeatStatusFilter::Booked => "Booked",
            SeatStatusFilter::Unbooked => "Unbooked",
        };
        write!(f, "{}", s)
    }
}

/// 出演者のジャンル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Pop,
    HipHop,
    RhythmAndBlues,
    Acappella,
    Metal,
    Rock,
}

impl Genre {
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "Pop" => Ok(Genre::Pop),
            "HipHop" => Ok(Genre::HipHop),
            "RhythmAndBlues" => Ok(Genre::RhythmAndBlues),
            "Acappella" => Ok(Genre::Acappella),
            "Metal" => Ok(Genre::Metal),
            "Rock" => Ok(Genre::Rock),
            _ => Err(DomainError::InvalidValue(format!("無効なジャンル: {}", s))),
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Genre::Pop => "Pop",
            Genre::HipHop => "HipHop",
            Genre::RhythmAndBlues => "RhythmAndBlues",
            Genre::Acappella => "Acappella",
            Genre::Metal => "Metal",
            Genre::Rock => "Rock",
        };
        write!(f, "{}", s)
    }
}

/// ある公演日時の空席状況
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatAvailability {
    free: u32,
    total: u32,
}

impl SeatAvailability {
    pub fn new(free: u32, total: u32) -> Self {
        Self { free, total }
    }

    /// 空席数
    pub fn free(&self) -> u32 {
        self.free
    }

    /// 総座席数
    pub fn total(&self) -> u32 {
        self.total
    }

    /// 空席率（%）を切り捨てで計算する
    /// 座席が1つもない日時は計算できないため None を返す
    pub fn free_percentage(&self) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        Some(((self.free as u64 * 100) / self.total as u64) as u32)
    }
}

/// ISO-8601 形式のローカル日時文字列を公演日時に変換する
/// 例: "2020-02-15T20:00:00"
pub fn parse_concert_date(s: &str) -> Result<NaiveDateTime, DomainError> {
    s.parse::<NaiveDateTime>()
        .map_err(|_| DomainError::InvalidValue(format!("無効な日時形式: {}", s)))
}
