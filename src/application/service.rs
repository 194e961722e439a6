mod authentication_service;
mod concert_query_service;
mod subscription_service;

pub use authentication_service::AuthenticationService;
pub use concert_query_service::ConcertQueryService;
pub use subscription_service::SubscriptionApplicationService;

use crate::application::ApplicationError;
use crate::domain::model::{Booking, BookingId, BookingRequest, Seat, SeatStatusFilter};
use crate::domain::port::{
    AvailabilityNotifier, BookingRepository, ConcertRepository, Logger, SeatRepository,
};
use crate::domain::service::{SeatClaimService, SeatSelection};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// 予約アプリケーションサービス
/// 認証、コンサートの解決、座席確保、空席通知を順に実行する
pub struct BookingApplicationService {
    authentication: Arc<AuthenticationService>,
    concert_repository: Arc<dyn ConcertRepository>,
    seat_repository: Arc<dyn SeatRepository>,
    booking_repository: Arc<dyn BookingRepository>,
    seat_claim_service: SeatClaimService,
    notifier: Arc<dyn AvailabilityNotifier>,
    logger: Arc<dyn Logger>,
}

impl BookingApplicationService {
    /// 新しい予約アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `authentication` - 認証サービス
    /// * `concert_repository` - コンサートリポジトリ
    /// * `seat_repository` - 座席在庫リポジトリ
    /// * `booking_repository` - 予約リポジトリ
    /// * `notifier` - 空席状況通知
    /// * `logger` - ロガー
    pub fn new(
        authentication: Arc<AuthenticationService>,
        concert_repository: Arc<dyn ConcertRepository>,
        seat_repository: Arc<dyn SeatRepository>,
        booking_repository: Arc<dyn BookingRepository>,
        notifier: Arc<dyn AvailabilityNotifier>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            authentication,
            concert_repository,
            seat_claim_service: SeatClaimService::new(seat_repository.clone()),
            seat_repository,
            booking_repository,
            notifier,
            logger,
        }
    }

    /// 座席を予約する
    /// 要求されたすべての座席を確保できた場合のみ予約を作成する
    ///
    /// # Arguments
    /// * `token` - セッショントークン
    /// * `request` - 予約リクエスト
    ///
    /// # Returns
    /// * `Ok(BookingId)` - 作成された予約のID
    /// * `Err(ApplicationError::Unauthorized)` - 認証失敗
    /// * `Err(ApplicationError::BadRequest)` - 存在しないコンサート・公演日時・座席
    /// * `Err(ApplicationError::Conflict)` - 座席が予約済み、または同時確保に敗れた
    pub async fn make_booking(
        &self,
        token: Option<&str>,
        request: BookingRequest,
    ) -> Result<BookingId, ApplicationError> {
        let correlation_id = Uuid::new_v4();
        let start_time = Instant::now();

        let user = self.authentication.authenticate(token).await?;

        // 書き込み系ではコンサートが見つからないことを入力エラーとして扱う
        let concert = self
            .concert_repository
            .find_by_id(request.concert_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::BadRequest(format!(
                    "コンサートが見つかりません: {}",
                    request.concert_id
                ))
            })?;

        if !concert.is_scheduled_on(request.date) {
            return Err(ApplicationError::BadRequest(format!(
                "コンサート {} は {} に公演予定がありません",
                request.concert_id, request.date
            )));
        }

        let mut context = HashMap::new();
        context.insert("username".to_string(), user.username().to_string());
        context.insert("concert_id".to_string(), request.concert_id.to_string());
        context.insert("date".to_string(), request.date.to_string());
        context.insert(
            "seats".to_string(),
            request
                .seat_labels
                .iter()
                .map(|label| label.as_str())
                .collect::<Vec<_>>()
                .join(","),
        );
        self.logger.debug(
            "BookingApplicationService",
            "Attempting to claim seats",
            Some(correlation_id),
            Some(context.clone()),
        );

        let selection = SeatSelection {
            booking_id: self.booking_repository.next_identity(),
            concert_id: request.concert_id,
            date: request.date,
            labels: &request.seat_labels,
            username: user.username(),
        };

        let booking = match self.seat_claim_service.reserve_seats(selection).await {
            Ok(booking) => booking,
            Err(err) => {
                context.insert("reason".to_string(), err.to_string());
                self.logger.info(
                    "BookingApplicationService",
                    "Booking rejected",
                    Some(correlation_id),
                    Some(context),
                );
                return Err(ApplicationError::from(err));
            }
        };

        context.insert("booking_id".to_string(), booking.id().to_string());
        context.insert(
            "execution_time_ms".to_string(),
            start_time.elapsed().as_millis().to_string(),
        );
        self.logger.info(
            "BookingApplicationService",
            "Booking committed",
            Some(correlation_id),
            Some(context),
        );

        self.notify_availability(&booking, correlation_id).await;

        Ok(booking.id())
    }

    /// 予約確定後の空席状況を購読者に通知する
    /// 予約自体は確定済みのため、ここでの失敗は予約結果に影響させない
    async fn notify_availability(&self, booking: &Booking, correlation_id: Uuid) {
        match self.seat_repository.availability(booking.date()).await {
            Ok(availability) => {
                let resolved = self.notifier.notify_after_booking(
                    booking.concert_id(),
                    booking.date(),
                    availability,
                );

                let mut context = HashMap::new();
                context.insert("free".to_string(), availability.free().to_string());
                context.insert("total".to_string(), availability.total().to_string());
                context.insert("resolved_subscriptions".to_string(), resolved.to_string());
                self.logger.debug(
                    "BookingApplicationService",
                    "Availability notified",
                    Some(correlation_id),
                    Some(context),
                );
            }
            Err(err) => {
                let mut context = HashMap::new();
                context.insert("error".to_string(), err.to_string());
                self.logger.error(
                    "BookingApplicationService",
                    "Failed to read availability after booking; subscribers not notified",
                    Some(correlation_id),
                    Some(context),
                );
            }
        }
    }

    /// 予約IDで予約を取得する
    ///
    /// # Returns
    /// * `Ok(Booking)` - 予約
    /// * `Err(ApplicationError::Unauthorized)` - 認証失敗
    /// * `Err(ApplicationError::NotFound)` - 予約が存在しない
    /// * `Err(ApplicationError::Forbidden)` - 他のユーザーの予約
    pub async fn get_booking(
        &self,
        token: Option<&str>,
        booking_id: BookingId,
    ) -> Result<Booking, ApplicationError> {
        let user = self.authentication.authenticate(token).await?;

        let booking = self
            .booking_repository
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("予約が見つかりません: {}", booking_id))
            })?;

        if !booking.is_owned_by(user.username()) {
            return Err(ApplicationError::Forbidden(format!(
                "予約 {} は他のユーザーの予約です",
                booking_id
            )));
        }

        Ok(booking)
    }

    /// 認証済みユーザーのすべての予約を取得する
    pub async fn get_user_bookings(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<Booking>, ApplicationError> {
        let user = self.authentication.authenticate(token).await?;
        self.booking_repository
            .find_by_username(user.username())
            .await
            .map_err(ApplicationError::from)
    }

    /// 公演日時の座席を予約状態でフィルタリングして取得する
    /// ステータス文字列が指定されない場合はすべての座席を返す
    ///
    /// # Returns
    /// * `Ok(Vec<Seat>)` - 座席ラベル順の座席
    /// * `Err(ApplicationError::BadRequest)` - ステータス文字列が無効
    pub async fn get_seats(
        &self,
        date: NaiveDateTime,
        status: Option<&str>,
    ) -> Result<Vec<Seat>, ApplicationError> {
        let filter = match status {
            Some(status) => SeatStatusFilter::from_string(status)?,
            None => SeatStatusFilter::Any,
        };

        self.seat_repository
            .find_by_date(date, filter)
            .await
            .map_err(ApplicationError::from)
    }
}
