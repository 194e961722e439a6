use crate::domain::port::RepositoryError;

/// データベースエラー型
/// MySQLアダプターの内部で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseError {
    /// 接続・トランザクション開始の失敗
    ConnectionError(String),
    /// SQLの実行失敗
    QueryError(String),
    /// 取得した行からドメインオブジェクトを復元できない
    DecodeError(String),
    /// マイグレーションの失敗
    MigrationError(String),
}

impl DatabaseError {
    /// sqlxのエラーに処理内容を添えてクエリエラーにする
    pub fn query(context: &str, err: sqlx::Error) -> Self {
        DatabaseError::QueryError(format!("{}: {}", context, err))
    }

    /// sqlxのエラーに処理内容を添えて接続エラーにする
    pub fn connection(context: &str, err: sqlx::Error) -> Self {
        DatabaseError::ConnectionError(format!("{}: {}", context, err))
    }
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::ConnectionError(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::QueryError(msg) => write!(f, "Database query error: {}", msg),
            DatabaseError::DecodeError(msg) => write!(f, "Row decode error: {}", msg),
            DatabaseError::MigrationError(msg) => write!(f, "Migration error: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::DecodeError(msg) => RepositoryError::FetchFailed(msg),
            DatabaseError::QueryError(msg) | DatabaseError::MigrationError(msg) => {
                RepositoryError::OperationFailed(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_repository_error() {
        assert_eq!(
            RepositoryError::from(DatabaseError::ConnectionError("down".to_string())),
            RepositoryError::ConnectionFailed("down".to_string())
        );
        assert_eq!(
            RepositoryError::from(DatabaseError::DecodeError("bad row".to_string())),
            RepositoryError::FetchFailed("bad row".to_string())
        );
        assert_eq!(
            RepositoryError::from(DatabaseError::QueryError("syntax".to_string())),
            RepositoryError::OperationFailed("syntax".to_string())
        );
    }
}
