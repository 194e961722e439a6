// 駆動する側アダプター（REST API）

pub mod auth;
pub mod request_dto;
pub mod response_dto;
pub mod rest_api;

pub use auth::{AuthToken, AUTH_COOKIE};
pub use rest_api::{create_router, map_application_error, ApiError, AppState, Repositories, API_PREFIX};
