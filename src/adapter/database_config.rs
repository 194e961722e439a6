use std::env;

/// データベース接続設定を管理する構造体
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

/// 設定エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// 環境変数を読み取り、未設定ならデフォルト値を使う
pub(crate) fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 環境変数を数値として読み取る
pub(crate) fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", key, e)))
}

impl DatabaseConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or("DATABASE_HOST", "localhost"),
            port: parse_env("DATABASE_PORT", "3306")?,
            database: env_or("DATABASE_NAME", "concert_db"),
            username: env_or("DATABASE_USER", "concert_user"),
            password: env_or("DATABASE_PASSWORD", "concert_password"),
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10")?,
        })
    }

    /// MySQL接続文字列を生成
    pub fn connection_string(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}
