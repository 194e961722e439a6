use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;

/// アプリケーション層のエラー型
/// 呼び出し側に区別して返す結果の分類
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// 認証情報がない、または無効
    #[error("Unauthorized")]
    Unauthorized,
    /// 認証済みだが他のユーザーのリソース
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// 書き込み系の入力検証エラー（存在しないコンサート・座席・日時など）
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// 座席の競合（予約済み、または同時確保に敗れた）
    #[error("Conflict: {0}")]
    Conflict(String),
    /// 参照系で見つからないリソース
    #[error("Not found: {0}")]
    NotFound(String),
    /// 購読が解決される前に待機時間が切れた
    #[error("Subscription expired")]
    SubscriptionExpired,
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

// ドメインエラーを呼び出し側の結果分類に変換
impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::SeatNotFound(_)
            | DomainError::EmptySeatSelection
            | DomainError::DuplicateSeatLabel(_)
            | DomainError::CurrencyMismatch
            | DomainError::InvalidValue(_) => ApplicationError::BadRequest(err.to_string()),
            DomainError::SeatAlreadyBooked(_) | DomainError::SeatClaimConflict(_) => {
                ApplicationError::Conflict(err.to_string())
            }
            DomainError::RepositoryError(msg) => {
                ApplicationError::RepositoryError(RepositoryError::OperationFailed(msg))
            }
        }
    }
}
