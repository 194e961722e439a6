use crate::domain::model::SeatLabel;

/// ドメイン層のエラー型
/// 座席確保のルール違反を表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 指定日時に存在しない座席ラベル
    SeatNotFound(SeatLabel),
    /// 既に予約済みの座席
    SeatAlreadyBooked(SeatLabel),
    /// 楽観ロックの競合（同時に別の予約が同じ座席を確保した）
    SeatClaimConflict(SeatLabel),
    /// 座席が1つも指定されていない
    EmptySeatSelection,
    /// 同じ座席ラベルが重複して指定された
    DuplicateSeatLabel(SeatLabel),
    /// 通貨の不一致
    CurrencyMismatch,
    /// 無効な値
    InvalidValue(String),
    /// リポジトリ操作の失敗
    RepositoryError(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::SeatNotFound(label) => write!(f, "Seat not found: {}", label),
            DomainError::SeatAlreadyBooked(label) => write!(f, "Seat already booked: {}", label),
            DomainError::SeatClaimConflict(label) => {
                write!(f, "Seat claimed concurrently: {}", label)
            }
            DomainError::EmptySeatSelection => write!(f, "No seats requested"),
            DomainError::DuplicateSeatLabel(label) => {
                write!(f, "Seat requested more than once: {}", label)
            }
            DomainError::CurrencyMismatch => write!(f, "Currency mismatch"),
            DomainError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
            DomainError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
