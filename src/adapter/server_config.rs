use crate::adapter::database_config::{env_or, parse_env, ConfigError};
use std::time::Duration;

/// 座席・予約データの保存先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// MySQL（永続化あり）
    MySql,
    /// プロセス内メモリ（デモ用データを投入して起動する）
    Memory,
}

impl StorageBackend {
    pub fn from_string(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid STORAGE_BACKEND: {}",
                s
            ))),
        }
    }
}

/// サーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub storage_backend: StorageBackend,
    /// 購読が通知を待つ最大時間
    pub subscription_timeout: Duration,
    /// 切断済み購読を掃除する間隔
    pub subscription_sweep_interval: Duration,
}

impl ServerConfig {
    /// 環境変数から設定を読み取る
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parse_env("SUBSCRIPTION_TIMEOUT_SECS", "300")?;
        let sweep_secs: u64 = parse_env("SUBSCRIPTION_SWEEP_INTERVAL_SECS", "30")?;
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SUBSCRIPTION_SWEEP_INTERVAL_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            port: parse_env("SERVER_PORT", "10000")?,
            storage_backend: StorageBackend::from_string(&env_or("STORAGE_BACKEND", "mysql"))?,
            subscription_timeout: Duration::from_secs(timeout_secs),
            subscription_sweep_interval: Duration::from_secs(sweep_secs),
        })
    }

    /// 待ち受けアドレス
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 4] = [
        "SERVER_PORT",
        "STORAGE_BACKEND",
        "SUBSCRIPTION_TIMEOUT_SECS",
        "SUBSCRIPTION_SWEEP_INTERVAL_SECS",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.port, 10000);
        assert_eq!(config.storage_backend, StorageBackend::MySql);
        assert_eq!(config.subscription_timeout, Duration::from_secs(300));
        assert_eq!(config.subscription_sweep_interval, Duration::from_secs(30));
        assert_eq!(config.bind_address(), "0.0.0.0:10000");
    }

    #[test]
    fn test_memory_backend_and_overrides() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("SERVER_PORT", "8080");
        env::set_var("STORAGE_BACKEND", "Memory");
        env::set_var("SUBSCRIPTION_TIMEOUT_SECS", "5");

        let config = ServerConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.subscription_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("STORAGE_BACKEND", "postgres");
        assert!(ServerConfig::from_env().is_err());
        env::remove_var("STORAGE_BACKEND");

        env::set_var("SUBSCRIPTION_SWEEP_INTERVAL_SECS", "0");
        assert!(ServerConfig::from_env().is_err());
        env::remove_var("SUBSCRIPTION_SWEEP_INTERVAL_SECS");
    }
}
