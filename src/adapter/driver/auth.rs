use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::convert::Infallible;

/// セッショントークンを保持するクッキー名
pub const AUTH_COOKIE: &str = "auth";

/// リクエストのセッショントークン
/// トークンがなくても抽出は失敗せず、認証の可否はアプリケーション層が判断する
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthToken(pub Option<String>);

impl AuthToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// `Authorization: Bearer <token>` ヘッダー、なければ `auth` クッキーからトークンを読み取る
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// ログイン成功時に返すクッキー
pub fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthToken(token_from_headers(&parts.headers)))
    }
}
