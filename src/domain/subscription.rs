// 空席状況の購読
// 購読は登録時に検証され、条件を満たしたときに一度だけ解決される

use crate::domain::error::DomainError;
use crate::domain::event::ConcertInfoNotification;
use crate::domain::model::ConcertId;
use chrono::NaiveDateTime;
use std::time::Duration;
use tokio::sync::oneshot;

/// 購読条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    concert_id: ConcertId,
    date: NaiveDateTime,
    threshold_percent: u32,
}

impl Subscription {
    /// 新しい購読条件を作成
    ///
    /// # Arguments
    /// * `concert_id` - コンサートID
    /// * `date` - 公演日時
    /// * `threshold_percent` - 空席率がこの値を下回ったら通知する（0〜100）
    pub fn new(
        concert_id: ConcertId,
        date: NaiveDateTime,
        threshold_percent: u32,
    ) -> Result<Self, DomainError> {
        if threshold_percent > 100 {
            return Err(DomainError::InvalidValue(format!(
                "しきい値は0〜100で指定してください: {}",
                threshold_percent
            )));
        }
        Ok(Self {
            concert_id,
            date,
            threshold_percent,
        })
    }

    pub fn concert_id(&self) -> ConcertId {
        self.concert_id
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn threshold_percent(&self) -> u32 {
        self.threshold_percent
    }

    /// 空席率（%）がしきい値を厳密に下回っているか
    pub fn is_satisfied_by(&self, free_percentage: u32) -> bool {
        self.threshold_percent > free_percentage
    }
}

/// 購読の待機結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    /// 条件を満たして通知された
    Notified(ConcertInfoNotification),
    /// 通知される前に待機時間が切れた
    Expired,
}

/// 登録済み購読の待機チケット
/// 通知を受け取る前に破棄された場合は登録を取り消す
pub struct SubscriptionTicket {
    receiver: oneshot::Receiver<ConcertInfoNotification>,
    on_abandon: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionTicket {
    /// 新しいチケットを作成
    ///
    /// # Arguments
    /// * `receiver` - 通知の受信側
    /// * `on_abandon` - 解決前に破棄されたときに登録を取り消す処理
    pub fn new(
        receiver: oneshot::Receiver<ConcertInfoNotification>,
        on_abandon: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            on_abandon: Some(Box::new(on_abandon)),
        }
    }

    /// 通知を待つ
    /// スレッドを占有せず、通知・タイムアウトのいずれかで再開する
    pub async fn wait(mut self, timeout: Duration) -> SubscriptionOutcome {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(notification)) => {
                self.on_abandon = None;
                SubscriptionOutcome::Notified(notification)
            }
            // 送信側が破棄された場合も通知は来ないため期限切れとして扱う
            Ok(Err(_)) | Err(_) => SubscriptionOutcome::Expired,
        }
    }
}

impl Drop for SubscriptionTicket {
    fn drop(&mut self) {
        if let Some(on_abandon) = self.on_abandon.take() {
            on_abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::parse_concert_date;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn date() -> NaiveDateTime {
        parse_concert_date("2020-02-15T20:00:00").unwrap()
    }

    #[test]
    fn test_threshold_must_be_a_percentage() {
        assert!(Subscription::new(ConcertId::new(1), date(), 0).is_ok());
        assert!(Subscription::new(ConcertId::new(1), date(), 100).is_ok());
        assert!(Subscription::new(ConcertId::new(1), date(), 101).is_err());
    }

    #[test]
    fn test_is_satisfied_only_when_strictly_below_threshold() {
        let subscription = Subscription::new(ConcertId::new(1), date(), 50).unwrap();
        assert!(subscription.is_satisfied_by(40));
        assert!(subscription.is_satisfied_by(49));
        assert!(!subscription.is_satisfied_by(50));
        assert!(!subscription.is_satisfied_by(90));
    }

    #[tokio::test]
    async fn test_wait_returns_notification() {
        let (tx, rx) = oneshot::channel();
        let abandoned = Arc::new(AtomicBool::new(false));
        let flag = abandoned.clone();
        let ticket = SubscriptionTicket::new(rx, move || flag.store(true, Ordering::SeqCst));

        tx.send(ConcertInfoNotification::new(4)).unwrap();
        let outcome = ticket.wait(Duration::from_secs(1)).await;

        assert_eq!(
            outcome,
            SubscriptionOutcome::Notified(ConcertInfoNotification::new(4))
        );
        assert!(!abandoned.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_wait_expires_and_abandons_registration() {
        let (_tx, rx) = oneshot::channel();
        let abandoned = Arc::new(AtomicBool::new(false));
        let flag = abandoned.clone();
        let ticket = SubscriptionTicket::new(rx, move || flag.store(true, Ordering::SeqCst));

        let outcome = ticket.wait(Duration::from_millis(20)).await;

        assert_eq!(outcome, SubscriptionOutcome::Expired);
        assert!(abandoned.load(Ordering::SeqCst));
    }

    #[test]
    fn test_dropping_ticket_abandons_registration() {
        let (_tx, rx) = oneshot::channel();
        let abandoned = Arc::new(AtomicBool::new(false));
        let flag = abandoned.clone();
        let ticket = SubscriptionTicket::new(rx, move || flag.store(true, Ordering::SeqCst));

        drop(ticket);
        assert!(abandoned.load(Ordering::SeqCst));
    }
}
