use crate::domain::event::ConcertInfoNotification;
use crate::domain::model::{ConcertId, SeatAvailability};
use crate::domain::port::{AvailabilityNotifier, SubscriptionRegistry};
use crate::domain::subscription::{Subscription, SubscriptionTicket};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

type RegistryKey = (ConcertId, NaiveDateTime);

/// 待機中の購読
struct PendingSubscription {
    id: u64,
    subscription: Subscription,
    sender: oneshot::Sender<ConcertInfoNotification>,
}

#[derive(Default)]
struct RegistryState {
    pending: Mutex<HashMap<RegistryKey, Vec<PendingSubscription>>>,
    next_id: AtomicU64,
}

impl RegistryState {
    // 毒化したロックも中身はそのまま使える
    fn lock(&self) -> MutexGuard<'_, HashMap<RegistryKey, Vec<PendingSubscription>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove(&self, key: RegistryKey, id: u64) {
        let mut pending = self.lock();
        if let Some(entries) = pending.get_mut(&key) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                pending.remove(&key);
            }
        }
    }
}

/// プロセス内の購読レジストリ
/// 空席状況通知（AvailabilityNotifier）も兼ねる
///
/// 登録・通知・削除はすべて1つのミューテックスの中で行うため、
/// 同じ購読が二重に解決されることはない
#[derive(Clone, Default)]
pub struct InMemorySubscriptionRegistry {
    state: Arc<RegistryState>,
}

impl InMemorySubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 待機中の購読数
    pub fn pending_count(&self) -> usize {
        self.state.lock().values().map(Vec::len).sum()
    }

    /// 呼び出し側が既に待機をやめた購読を削除する
    ///
    /// # Returns
    /// * 削除した購読の数
    pub fn purge_closed(&self) -> usize {
        let mut pending = self.state.lock();
        let mut purged = 0;
        pending.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|entry| !entry.sender.is_closed());
            purged += before - entries.len();
            !entries.is_empty()
        });
        purged
    }

    /// 一定間隔で purge_closed を実行するタスクを起動する
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 最初の tick は即座に完了する
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = registry.purge_closed();
                if purged > 0 {
                    tracing::debug!(purged, "removed abandoned subscriptions");
                }
            }
        })
    }
}

impl SubscriptionRegistry for InMemorySubscriptionRegistry {
    fn register(&self, subscription: Subscription) -> SubscriptionTicket {
        let (sender, receiver) = oneshot::channel();
        let key = (subscription.concert_id(), subscription.date());
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);

        self.state
            .lock()
            .entry(key)
            .or_default()
            .push(PendingSubscription {
                id,
                subscription,
                sender,
            });

        let state = Arc::downgrade(&self.state);
        SubscriptionTicket::new(receiver, move || {
            if let Some(state) = state.upgrade() {
                state.remove(key, id);
            }
        })
    }
}

impl AvailabilityNotifier for InMemorySubscriptionRegistry {
    fn notify_after_booking(
        &self,
        concert_id: ConcertId,
        date: NaiveDateTime,
        availability: SeatAvailability,
    ) -> usize {
        let Some(free_percentage) = availability.free_percentage() else {
            return 0;
        };
        let key = (concert_id, date);

        let mut pending = self.state.lock();
        let Some(entries) = pending.remove(&key) else {
            return 0;
        };

        let notification = ConcertInfoNotification::new(availability.free());
        let mut resolved = 0;
        let mut remaining = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.subscription.is_satisfied_by(free_percentage) {
                // 受信側が既に無い場合は送信に失敗するが、どちらにしても登録からは外す
                if entry.sender.send(notification).is_ok() {
                    resolved += 1;
                }
            } else if !entry.sender.is_closed() {
                remaining.push(entry);
            }
        }

        if !remaining.is_empty() {
            pending.insert(key, remaining);
        }
        resolved
    }
}
