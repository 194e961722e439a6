use uuid::Uuid;

/// ユーザー
/// パスワードは不透明な値として等価比較のみ行う
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    username: String,
    password: String,
    token: Option<String>,
}

impl User {
    pub fn new(username: String, password: String) -> Self {
        Self {
            username,
            password,
            token: None,
        }
    }

    /// 永続化された状態からユーザーを再構築
    pub fn reconstruct(username: String, password: String, token: Option<String>) -> Self {
        Self {
            username,
            password,
            token,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn matches_password(&self, password: &str) -> bool {
        self.password == password
    }

    /// 新しいセッショントークンを発行し、以前のトークンを置き換える
    pub fn issue_token(&mut self) -> String {
        let token = Uuid::new_v4().to_string();
        self.token = Some(token.clone());
        token
    }
}
