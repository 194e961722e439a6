use serde::{Deserialize, Serialize};

/// 空席状況の通知
/// 購読条件が満たされたときに待機中の呼び出し側へ渡される
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcertInfoNotification {
    /// 通知時点の空席数
    pub free_seat_count: u32,
}

impl ConcertInfoNotification {
    pub fn new(free_seat_count: u32) -> Self {
        Self { free_seat_count }
    }
}
