use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::driver::auth::{auth_cookie, AuthToken};
use crate::adapter::driver::request_dto::{
    ConcertInfoSubscriptionRequest, CreateBookingRequest, LoginRequest, SeatsQueryParams,
};
use crate::adapter::driver::response_dto::{
    BookingResponse, ConcertResponse, ConcertSummaryResponse, CreateBookingResponse,
    LoginResponse, PerformerResponse, SeatResponse,
};
use crate::application::service::{
    AuthenticationService, BookingApplicationService, ConcertQueryService,
    SubscriptionApplicationService,
};
use crate::application::ApplicationError;
use crate::domain::event::ConcertInfoNotification;
use crate::domain::model::{parse_concert_date, BookingId, ConcertId, PerformerId};
use crate::domain::port::{
    AvailabilityNotifier, BookingRepository, ConcertRepository, Logger, PerformerRepository,
    SeatRepository, SubscriptionRegistry, UserRepository,
};
use std::time::Duration;

/// すべての業務APIのパス接頭辞
pub const API_PREFIX: &str = "/concert-service";

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn api_error(
    status: StatusCode,
    code: &str,
    error: impl Into<String>,
) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub booking_service: Arc<BookingApplicationService>,
    pub authentication_service: Arc<AuthenticationService>,
    pub concert_query_service: Arc<ConcertQueryService>,
    pub subscription_service: Arc<SubscriptionApplicationService>,
}

/// アプリケーションサービスが使うリポジトリ一式
pub struct Repositories {
    pub concerts: Arc<dyn ConcertRepository>,
    pub performers: Arc<dyn PerformerRepository>,
    pub seats: Arc<dyn SeatRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// リポジトリと購読レジストリからアプリケーションサービスを組み立てる
    ///
    /// # Arguments
    /// * `repositories` - リポジトリ一式
    /// * `registry` - 購読レジストリ（空席状況通知を兼ねる）
    /// * `logger` - ロガー
    /// * `subscription_timeout` - 購読の最大待機時間
    pub fn new<R>(
        repositories: Repositories,
        registry: Arc<R>,
        logger: Arc<dyn Logger>,
        subscription_timeout: Duration,
    ) -> Self
    where
        R: SubscriptionRegistry + AvailabilityNotifier + 'static,
    {
        let authentication_service = Arc::new(AuthenticationService::new(
            repositories.users,
            logger.clone(),
        ));

        let booking_service = BookingApplicationService::new(
            authentication_service.clone(),
            repositories.concerts.clone(),
            repositories.seats,
            repositories.bookings,
            registry.clone(),
            logger.clone(),
        );

        let concert_query_service =
            ConcertQueryService::new(repositories.concerts.clone(), repositories.performers);

        let subscription_service = SubscriptionApplicationService::new(
            authentication_service.clone(),
            repositories.concerts,
            registry,
            logger,
            subscription_timeout,
        );

        Self {
            booking_service: Arc::new(booking_service),
            authentication_service,
            concert_query_service: Arc::new(concert_query_service),
            subscription_service: Arc::new(subscription_service),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    let api = Router::new()
        .route("/concerts", get(get_concerts))
        .route("/concerts/summaries", get(get_concert_summaries))
        .route("/concerts/:concert_id", get(get_concert))
        .route("/performers", get(get_performers))
        .route("/performers/:performer_id", get(get_performer))
        .route("/login", post(login))
        .route("/bookings", post(make_booking).get(get_user_bookings))
        .route("/bookings/:booking_id", get(get_booking))
        .route("/seats/:date", get(get_seats))
        .route("/subscribe/concertInfo", post(subscribe_concert_info));

    Router::new()
        .route("/health", get(health_check))
        .nest(API_PREFIX, api)
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "concert-booking-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn invalid_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    api_error(
        StatusCode::BAD_REQUEST,
        "INVALID_BODY",
        format!("無効なリクエストボディです: {}", rejection.body_text()),
    )
}

// コンサート一覧取得エンドポイント
async fn get_concerts(State(state): State<AppState>) -> ApiResult<Json<Vec<ConcertResponse>>> {
    let concerts = state
        .concert_query_service
        .get_all_concerts()
        .await
        .map_err(map_application_error)?;

    Ok(Json(concerts.iter().map(ConcertResponse::from_concert).collect()))
}

// コンサート概要一覧取得エンドポイント
async fn get_concert_summaries(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ConcertSummaryResponse>>> {
    let summaries = state
        .concert_query_service
        .get_concert_summaries()
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        summaries
            .iter()
            .map(ConcertSummaryResponse::from_summary)
            .collect(),
    ))
}

// コンサート詳細取得エンドポイント
async fn get_concert(
    State(state): State<AppState>,
    Path(concert_id): Path<i64>,
) -> ApiResult<Json<ConcertResponse>> {
    let concert = state
        .concert_query_service
        .get_concert(ConcertId::new(concert_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(ConcertResponse::from_concert(&concert)))
}

// 出演者一覧取得エンドポイント
async fn get_performers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PerformerResponse>>> {
    let performers = state
        .concert_query_service
        .get_all_performers()
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        performers
            .iter()
            .map(PerformerResponse::from_performer)
            .collect(),
    ))
}

// 出演者詳細取得エンドポイント
async fn get_performer(
    State(state): State<AppState>,
    Path(performer_id): Path<i64>,
) -> ApiResult<Json<PerformerResponse>> {
    let performer = state
        .concert_query_service
        .get_performer(PerformerId::new(performer_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(PerformerResponse::from_performer(&performer)))
}

// ログインエンドポイント
// トークンをボディで返し、同じトークンを auth クッキーにも設定する
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let Json(request) = body.map_err(invalid_body)?;

    let token = state
        .authentication_service
        .login(&request.username, &request.password)
        .await
        .map_err(map_application_error)?;

    Ok((
        jar.add(auth_cookie(token.clone())),
        Json(LoginResponse { token }),
    ))
}

// 予約エンドポイント
async fn make_booking(
    State(state): State<AppState>,
    token: AuthToken,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<Response> {
    // 認証エラーを入力エラーより優先する
    if token.as_deref().is_none() {
        return Err(map_application_error(ApplicationError::Unauthorized));
    }
    let Json(request) = body.map_err(invalid_body)?;
    let request = request
        .into_domain()
        .map_err(|e| map_application_error(e.into()))?;

    let booking_id = state
        .booking_service
        .make_booking(token.as_deref(), request)
        .await
        .map_err(map_application_error)?;

    let location = format!("{}/bookings/{}", API_PREFIX, booking_id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CreateBookingResponse {
            booking_id: booking_id.to_string(),
        }),
    )
        .into_response())
}

// ユーザーの予約一覧取得エンドポイント
async fn get_user_bookings(
    State(state): State<AppState>,
    token: AuthToken,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = state
        .booking_service
        .get_user_bookings(token.as_deref())
        .await
        .map_err(map_application_error)?;

    Ok(Json(bookings.iter().map(BookingResponse::from_booking).collect()))
}

// 予約詳細取得エンドポイント
async fn get_booking(
    State(state): State<AppState>,
    token: AuthToken,
    Path(booking_id): Path<String>,
) -> ApiResult<Json<BookingResponse>> {
    let booking_id = BookingId::from_string(&booking_id).map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_BOOKING_ID",
            "無効な予約ID形式です",
        )
    })?;

    let booking = state
        .booking_service
        .get_booking(token.as_deref(), booking_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookingResponse::from_booking(&booking)))
}

// 座席一覧取得エンドポイント
async fn get_seats(
    State(state): State<AppState>,
    Path(date): Path<String>,
    query: Result<Query<SeatsQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<SeatResponse>>> {
    let Query(params) = query.map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_PARAMETER",
            "無効なクエリパラメータです",
        )
    })?;
    let date = parse_concert_date(&date).map_err(|e| map_application_error(e.into()))?;

    let seats = state
        .booking_service
        .get_seats(date, params.status.as_deref())
        .await
        .map_err(map_application_error)?;

    Ok(Json(seats.iter().map(SeatResponse::from_seat).collect()))
}

// 空席状況の購読エンドポイント
// 条件を満たすか待機時間が切れるまでレスポンスを返さない
async fn subscribe_concert_info(
    State(state): State<AppState>,
    token: AuthToken,
    body: Result<Json<ConcertInfoSubscriptionRequest>, JsonRejection>,
) -> ApiResult<Json<ConcertInfoNotification>> {
    if token.as_deref().is_none() {
        return Err(map_application_error(ApplicationError::Unauthorized));
    }
    let Json(request) = body.map_err(invalid_body)?;
    let date = request
        .parsed_date()
        .map_err(|e| map_application_error(e.into()))?;

    let notification = state
        .subscription_service
        .subscribe(
            token.as_deref(),
            request.concert_id(),
            date,
            request.percentage_threshold,
        )
        .await
        .map_err(map_application_error)?;

    Ok(Json(notification))
}

// アプリケーションエラーをHTTPエラーにマッピング
pub fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::Unauthorized => api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "認証が必要です",
        ),
        ApplicationError::Forbidden(msg) => api_error(StatusCode::FORBIDDEN, "FORBIDDEN", msg),
        ApplicationError::BadRequest(msg) => api_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        ApplicationError::Conflict(msg) => api_error(StatusCode::CONFLICT, "SEAT_CONFLICT", msg),
        ApplicationError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
        ApplicationError::SubscriptionExpired => api_error(
            StatusCode::REQUEST_TIMEOUT,
            "SUBSCRIPTION_EXPIRED",
            "購読の待機時間が切れました",
        ),
        ApplicationError::RepositoryError(repo_err) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "REPOSITORY_ERROR",
            repo_err.to_string(),
        ),
    }
}
