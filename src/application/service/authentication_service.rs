use crate::application::ApplicationError;
use crate::domain::model::User;
use crate::domain::port::{Logger, UserRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// 認証サービス
/// セッショントークンの発行と、トークンからユーザーへの解決を行う
pub struct AuthenticationService {
    user_repository: Arc<dyn UserRepository>,
    logger: Arc<dyn Logger>,
}

impl AuthenticationService {
    /// 新しい認証サービスを作成
    ///
    /// # Arguments
    /// * `user_repository` - ユーザーリポジトリ
    /// * `logger` - ロガー
    pub fn new(user_repository: Arc<dyn UserRepository>, logger: Arc<dyn Logger>) -> Self {
        Self {
            user_repository,
            logger,
        }
    }

    /// ユーザー名とパスワードでログインし、新しいトークンを発行する
    /// 以前のトークンは無効になる
    ///
    /// # Returns
    /// * `Ok(String)` - 発行したトークン
    /// * `Err(ApplicationError::Unauthorized)` - 認証情報が一致しない
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApplicationError> {
        let mut user = self
            .user_repository
            .find_by_credentials(username, password)
            .await?
            .ok_or_else(|| {
                let mut context = HashMap::new();
                context.insert("username".to_string(), username.to_string());
                self.logger.warn(
                    "AuthenticationService",
                    "Login rejected: credentials did not match",
                    None,
                    Some(context),
                );
                ApplicationError::Unauthorized
            })?;

        let token = user.issue_token();
        self.user_repository
            .update_token(user.username(), &token)
            .await?;

        let mut context = HashMap::new();
        context.insert("username".to_string(), user.username().to_string());
        self.logger
            .info("AuthenticationService", "User logged in", None, Some(context));

        Ok(token)
    }

    /// トークンをユーザーに解決する（読み取りのみ）
    ///
    /// # Returns
    /// * `Ok(User)` - 認証済みユーザー
    /// * `Err(ApplicationError::Unauthorized)` - トークンがない、または無効
    pub async fn authenticate(&self, token: Option<&str>) -> Result<User, ApplicationError> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ApplicationError::Unauthorized),
        };

        self.user_repository
            .find_by_token(token)
            .await?
            .ok_or(ApplicationError::Unauthorized)
    }
}
