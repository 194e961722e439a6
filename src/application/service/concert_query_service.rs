use crate::application::ApplicationError;
use crate::domain::model::{Concert, ConcertId, ConcertSummary, Performer, PerformerId};
use crate::domain::port::{ConcertRepository, PerformerRepository};
use std::sync::Arc;

/// コンサートクエリサービス
/// カタログの読み取り専用操作を提供する
pub struct ConcertQueryService {
    concert_repository: Arc<dyn ConcertRepository>,
    performer_repository: Arc<dyn PerformerRepository>,
}

impl ConcertQueryService {
    pub fn new(
        concert_repository: Arc<dyn ConcertRepository>,
        performer_repository: Arc<dyn PerformerRepository>,
    ) -> Self {
        Self {
            concert_repository,
            performer_repository,
        }
    }

    /// コンサートIDでコンサートを取得
    ///
    /// # Returns
    /// * `Ok(Concert)` - コンサートが見つかった
    /// * `Err(ApplicationError::NotFound)` - 見つからなかった
    pub async fn get_concert(&self, concert_id: ConcertId) -> Result<Concert, ApplicationError> {
        self.concert_repository
            .find_by_id(concert_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("コンサートが見つかりません: {}", concert_id))
            })
    }

    pub async fn get_all_concerts(&self) -> Result<Vec<Concert>, ApplicationError> {
        self.concert_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }

    /// すべてのコンサートの概要を取得
    pub async fn get_concert_summaries(&self) -> Result<Vec<ConcertSummary>, ApplicationError> {
        let concerts = self.concert_repository.find_all().await?;
        Ok(concerts.iter().map(Concert::summary).collect())
    }

    /// 出演者IDで出演者を取得
    ///
    /// # Returns
    /// * `Ok(Performer)` - 出演者が見つかった
    /// * `Err(ApplicationError::NotFound)` - 見つからなかった
    pub async fn get_performer(
        &self,
        performer_id: PerformerId,
    ) -> Result<Performer, ApplicationError> {
        self.performer_repository
            .find_by_id(performer_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("出演者が見つかりません: {}", performer_id))
            })
    }

    pub async fn get_all_performers(&self) -> Result<Vec<Performer>, ApplicationError> {
        self.performer_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}
