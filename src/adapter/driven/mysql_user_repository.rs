use crate::adapter::database_error::DatabaseError;
use crate::domain::model::User;
use crate::domain::port::{RepositoryError, UserRepository};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

fn user_from_row(row: &MySqlRow) -> Result<User, RepositoryError> {
    let decode = |e: sqlx::Error| {
        DatabaseError::DecodeError(format!("ユーザーの列の取得に失敗しました: {}", e))
    };

    Ok(User::reconstruct(
        row.try_get("username").map_err(decode)?,
        row.try_get("password").map_err(decode)?,
        row.try_get("token").map_err(decode)?,
    ))
}

/// MySQLユーザーリポジトリ
pub struct MySqlUserRepository {
    pool: Pool<MySql>,
}

impl MySqlUserRepository {
    /// 新しいMySQLユーザーリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT username, password, token
            FROM users
            WHERE username = ? AND password = ?
            "#,
        )
        .bind(username)
        .bind(password)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("ユーザーの取得に失敗しました", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT username, password, token
            FROM users
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("トークンによるユーザーの取得に失敗しました", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_token(&self, username: &str, token: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET token = ? WHERE username = ?")
            .bind(token)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("トークンの更新に失敗しました", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::OperationFailed(format!(
                "unknown user: {}",
                username
            )));
        }
        Ok(())
    }
}
