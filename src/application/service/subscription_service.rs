use crate::application::service::AuthenticationService;
use crate::application::ApplicationError;
use crate::domain::event::ConcertInfoNotification;
use crate::domain::model::ConcertId;
use crate::domain::port::{ConcertRepository, Logger, SubscriptionRegistry};
use crate::domain::subscription::{Subscription, SubscriptionOutcome};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// 空席状況購読サービス
/// 購読を検証して登録し、通知または期限切れまで待機する
pub struct SubscriptionApplicationService {
    authentication: Arc<AuthenticationService>,
    concert_repository: Arc<dyn ConcertRepository>,
    registry: Arc<dyn SubscriptionRegistry>,
    logger: Arc<dyn Logger>,
    timeout: Duration,
}

impl SubscriptionApplicationService {
    /// 新しい購読サービスを作成
    ///
    /// # Arguments
    /// * `authentication` - 認証サービス
    /// * `concert_repository` - コンサートリポジトリ
    /// * `registry` - 購読レジストリ
    /// * `logger` - ロガー
    /// * `timeout` - 購読の最大待機時間
    pub fn new(
        authentication: Arc<AuthenticationService>,
        concert_repository: Arc<dyn ConcertRepository>,
        registry: Arc<dyn SubscriptionRegistry>,
        logger: Arc<dyn Logger>,
        timeout: Duration,
    ) -> Self {
        Self {
            authentication,
            concert_repository,
            registry,
            logger,
            timeout,
        }
    }

    /// 空席率がしきい値を下回るまで待機する
    ///
    /// 無効なコンサート・公演日時は登録せずに即座に拒否する
    ///
    /// # Returns
    /// * `Ok(ConcertInfoNotification)` - 条件を満たした時点の空席数
    /// * `Err(ApplicationError::Unauthorized)` - 認証失敗
    /// * `Err(ApplicationError::BadRequest)` - 無効なコンサート・公演日時・しきい値
    /// * `Err(ApplicationError::SubscriptionExpired)` - 待機時間切れ
    pub async fn subscribe(
        &self,
        token: Option<&str>,
        concert_id: ConcertId,
        date: NaiveDateTime,
        threshold_percent: u32,
    ) -> Result<ConcertInfoNotification, ApplicationError> {
        let user = self.authentication.authenticate(token).await?;

        let subscription = Subscription::new(concert_id, date, threshold_percent)?;

        let concert = self
            .concert_repository
            .find_by_id(concert_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::BadRequest(format!("コンサートが見つかりません: {}", concert_id))
            })?;

        if !concert.is_scheduled_on(date) {
            return Err(ApplicationError::BadRequest(format!(
                "コンサート {} は {} に公演予定がありません",
                concert_id, date
            )));
        }

        let ticket = self.registry.register(subscription);

        let mut context = HashMap::new();
        context.insert("username".to_string(), user.username().to_string());
        context.insert("concert_id".to_string(), concert_id.to_string());
        context.insert("date".to_string(), date.to_string());
        context.insert("threshold".to_string(), threshold_percent.to_string());
        self.logger.debug(
            "SubscriptionApplicationService",
            "Subscription registered",
            None,
            Some(context.clone()),
        );

        match ticket.wait(self.timeout).await {
            SubscriptionOutcome::Notified(notification) => Ok(notification),
            SubscriptionOutcome::Expired => {
                self.logger.info(
                    "SubscriptionApplicationService",
                    "Subscription expired before availability crossed threshold",
                    None,
                    Some(context),
                );
                Err(ApplicationError::SubscriptionExpired)
            }
        }
    }
}
