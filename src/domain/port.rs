// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{
    Booking, BookingId, Concert, ConcertId, Performer, PerformerId, Seat, SeatAvailability,
    SeatLabel, SeatStatusFilter, User,
};
use crate::domain::subscription::{Subscription, SubscriptionTicket};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use uuid::Uuid;

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

/// 条件付き座席確保の結果
/// 競合は例外ではなく通常の結果として扱う
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// 読み取り時のバージョンのまま確保できた
    Claimed,
    /// 既に予約済み、または他のトランザクションが先に更新した
    Conflict,
}

/// 確保トランザクションの確定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// すべての確保と予約が確定した
    Committed,
    /// 確定前に他の予約が座席を更新していたため、何も反映されなかった
    Conflict(SeatLabel),
}

/// 座席確保トランザクション
/// 予約1件につき1つ開始し、commit するまで他の予約からは確定状態に見えない
/// commit せずに破棄した場合はロールバックされる
#[async_trait]
pub trait SeatClaimTransaction: Send {
    /// 座席を読み取り時のバージョンを条件に確保する
    ///
    /// # Arguments
    /// * `seat` - 確保する座席（読み取り時点の状態）
    ///
    /// # Returns
    /// * `Ok(ClaimOutcome::Claimed)` - 確保成功
    /// * `Ok(ClaimOutcome::Conflict)` - 競合
    /// * `Err(RepositoryError)` - 永続化層の失敗
    async fn claim(&mut self, seat: &Seat) -> Result<ClaimOutcome, RepositoryError>;

    /// 予約を同じトランザクション内で保存する
    async fn save_booking(&mut self, booking: &Booking) -> Result<(), RepositoryError>;

    /// 確保した座席と予約を確定する
    ///
    /// # Returns
    /// * `Ok(CommitOutcome::Committed)` - 確定成功
    /// * `Ok(CommitOutcome::Conflict)` - 競合のため何も反映されなかった
    /// * `Err(RepositoryError)` - 永続化層の失敗
    async fn commit(self: Box<Self>) -> Result<CommitOutcome, RepositoryError>;

    /// すべての確保を取り消す
    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// 座席在庫リポジトリトレイト
/// 公演日時ごとの座席の予約状態を永続化する
#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// 公演日時と座席ラベルで座席を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Seat))` - 座席が見つかった
    /// * `Ok(None)` - 座席が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_date_and_label(
        &self,
        date: NaiveDateTime,
        label: &SeatLabel,
    ) -> Result<Option<Seat>, RepositoryError>;

    /// 公演日時の座席を予約状態でフィルタリングして取得する
    /// 座席ラベルの昇順で並べて返す
    async fn find_by_date(
        &self,
        date: NaiveDateTime,
        filter: SeatStatusFilter,
    ) -> Result<Vec<Seat>, RepositoryError>;

    /// 公演日時の空席数と総座席数を取得する
    async fn availability(&self, date: NaiveDateTime) -> Result<SeatAvailability, RepositoryError>;

    /// 座席確保トランザクションを開始する
    async fn begin_claim(&self) -> Result<Box<dyn SeatClaimTransaction>, RepositoryError>;
}

/// 予約リポジトリトレイト
/// 予約の保存は SeatClaimTransaction が行うため、ここでは参照のみ
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// 予約IDで予約を検索する
    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError>;

    /// ユーザーの予約をすべて取得する
    async fn find_by_username(&self, username: &str) -> Result<Vec<Booking>, RepositoryError>;

    /// 新しい一意の予約IDを生成する
    fn next_identity(&self) -> BookingId;
}

/// コンサートリポジトリトレイト
#[async_trait]
pub trait ConcertRepository: Send + Sync {
    async fn find_by_id(&self, concert_id: ConcertId) -> Result<Option<Concert>, RepositoryError>;

    /// すべてのコンサートをID昇順で取得する
    async fn find_all(&self) -> Result<Vec<Concert>, RepositoryError>;
}

/// 出演者リポジトリトレイト
#[async_trait]
pub trait PerformerRepository: Send + Sync {
    async fn find_by_id(
        &self,
        performer_id: PerformerId,
    ) -> Result<Option<Performer>, RepositoryError>;

    /// すべての出演者をID昇順で取得する
    async fn find_all(&self) -> Result<Vec<Performer>, RepositoryError>;
}

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザー名とパスワードの組でユーザーを検索する
    async fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// セッショントークンでユーザーを検索する
    async fn find_by_token(&self, token: &str) -> Result<Option<User>, RepositoryError>;

    /// ユーザーのセッショントークンを置き換える
    async fn update_token(&self, username: &str, token: &str) -> Result<(), RepositoryError>;
}

/// 空席状況通知トレイト
/// 予約確定後に呼び出され、条件を満たした購読を解決する
pub trait AvailabilityNotifier: Send + Sync {
    /// 予約確定後の空席状況を通知する
    ///
    /// # Returns
    /// * 解決した購読の数
    fn notify_after_booking(
        &self,
        concert_id: ConcertId,
        date: NaiveDateTime,
        availability: SeatAvailability,
    ) -> usize;
}

/// 購読レジストリトレイト
/// 待機中の購読を保持する
pub trait SubscriptionRegistry: Send + Sync {
    /// 購読を登録し、通知を待つためのチケットを返す
    fn register(&self, subscription: Subscription) -> SubscriptionTicket;
}
