use crate::domain::error::DomainError;
use crate::domain::model::{Money, SeatLabel};
use chrono::NaiveDateTime;

/// 座席エンティティ
/// 公演日時と座席ラベルの組で一意に識別される
/// version は楽観的排他制御のための単調増加カウンター
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    label: SeatLabel,
    date: NaiveDateTime,
    price: Money,
    is_booked: bool,
    version: u64,
}

impl Seat {
    /// 空席として新しい座席を作成
    ///
    /// # Arguments
    /// * `label` - 座席ラベル
    /// * `date` - 公演日時
    /// * `price` - 座席価格
    pub fn new(label: SeatLabel, date: NaiveDateTime, price: Money) -> Self {
        Self {
            label,
            date,
            price,
            is_booked: false,
            version: 0,
        }
    }

    /// 永続化された状態から座席を再構築
    pub fn reconstruct(
        label: SeatLabel,
        date: NaiveDateTime,
        price: Money,
        is_booked: bool,
        version: u64,
    ) -> Self {
        Self {
            label,
            date,
            price,
            is_booked,
            version,
        }
    }

    pub fn label(&self) -> &SeatLabel {
        &self.label
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn is_booked(&self) -> bool {
        self.is_booked
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// 座席が予約可能か確認する
    ///
    /// # Returns
    /// * `Ok(())` - 空席
    /// * `Err(DomainError::SeatAlreadyBooked)` - 予約済み
    pub fn ensure_available(&self) -> Result<(), DomainError> {
        if self.is_booked {
            return Err(DomainError::SeatAlreadyBooked(self.label.clone()));
        }
        Ok(())
    }

    /// 読み取り時のバージョンを条件に座席を確保する
    /// バージョンが一致しない、または予約済みの場合は競合として拒否する
    ///
    /// # Arguments
    /// * `expected_version` - 呼び出し側が読み取った時点のバージョン
    ///
    /// # Returns
    /// * `true` - 確保成功（予約済みになり、バージョンが1つ進む）
    /// * `false` - 競合
    pub fn claim_if_version(&mut self, expected_version: u64) -> bool {
        if !self.is_claimable_at(expected_version) {
            return false;
        }
        self.is_booked = true;
        self.version += 1;
        true
    }

    /// 読み取り時のバージョンのまま空席であるか（状態は変更しない）
    pub fn is_claimable_at(&self, expected_version: u64) -> bool {
        !self.is_booked && self.version == expected_version
    }
}
