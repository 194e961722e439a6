use crate::domain::model::{
    Booking, BookingId, Concert, ConcertId, Performer, PerformerId, Seat, SeatAvailability,
    SeatLabel, SeatStatusFilter, User,
};
use crate::domain::port::{
    BookingRepository, ClaimOutcome, CommitOutcome, ConcertRepository, PerformerRepository,
    RepositoryError, SeatClaimTransaction, SeatRepository, UserRepository,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

type SeatKey = (NaiveDateTime, SeatLabel);

#[derive(Default)]
struct InventoryState {
    seats: BTreeMap<SeatKey, Seat>,
    bookings: Vec<Booking>,
}

fn lock_state(state: &Mutex<InventoryState>) -> MutexGuard<'_, InventoryState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// インメモリ座席在庫・予約リポジトリ
/// 開発用サーバーとテストで使用する
///
/// 確保はトランザクション内に保持し、確定時に1回のロックの中で
/// すべての座席のバージョンを再検証してから反映する
#[derive(Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<Mutex<InventoryState>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 座席を追加する（同じ日時・ラベルの座席は置き換える）
    pub fn add_seats(&self, seats: impl IntoIterator<Item = Seat>) {
        let mut state = lock_state(&self.state);
        for seat in seats {
            state
                .seats
                .insert((seat.date(), seat.label().clone()), seat);
        }
    }

    /// 確定済みの予約数
    pub fn booking_count(&self) -> usize {
        lock_state(&self.state).bookings.len()
    }
}

#[async_trait]
impl SeatRepository for InMemoryInventory {
    async fn find_by_date_and_label(
        &self,
        date: NaiveDateTime,
        label: &SeatLabel,
    ) -> Result<Option<Seat>, RepositoryError> {
        let state = lock_state(&self.state);
        Ok(state.seats.get(&(date, label.clone())).cloned())
    }

    async fn find_by_date(
        &self,
        date: NaiveDateTime,
        filter: SeatStatusFilter,
    ) -> Result<Vec<Seat>, RepositoryError> {
        let state = lock_state(&self.state);
        // BTreeMap のキー順がそのままラベル順になる
        Ok(state
            .seats
            .values()
            .filter(|seat| seat.date() == date && filter.accepts(seat.is_booked()))
            .cloned()
            .collect())
    }

    async fn availability(&self, date: NaiveDateTime) -> Result<SeatAvailability, RepositoryError> {
        let state = lock_state(&self.state);
        let (free, total) = state
            .seats
            .values()
            .filter(|seat| seat.date() == date)
            .fold((0u32, 0u32), |(free, total), seat| {
                (free + u32::from(!seat.is_booked()), total + 1)
            });
        Ok(SeatAvailability::new(free, total))
    }

    async fn begin_claim(&self) -> Result<Box<dyn SeatClaimTransaction>, RepositoryError> {
        Ok(Box::new(InMemoryClaimTransaction {
            state: self.state.clone(),
            staged: Vec::new(),
            booking: None,
        }))
    }
}

#[async_trait]
impl BookingRepository for InMemoryInventory {
    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        let state = lock_state(&self.state);
        Ok(state
            .bookings
            .iter()
            .find(|booking| booking.id() == booking_id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Vec<Booking>, RepositoryError> {
        let state = lock_state(&self.state);
        Ok(state
            .bookings
            .iter()
            .filter(|booking| booking.is_owned_by(username))
            .cloned()
            .collect())
    }

    fn next_identity(&self) -> BookingId {
        BookingId::new()
    }
}

/// インメモリの座席確保トランザクション
/// 確定するまで共有の座席表は変更しない
struct InMemoryClaimTransaction {
    state: Arc<Mutex<InventoryState>>,
    /// 確保した座席と読み取り時のバージョン
    staged: Vec<(SeatKey, u64)>,
    booking: Option<Booking>,
}

#[async_trait]
impl SeatClaimTransaction for InMemoryClaimTransaction {
    async fn claim(&mut self, seat: &Seat) -> Result<ClaimOutcome, RepositoryError> {
        let key = (seat.date(), seat.label().clone());
        if self.staged.iter().any(|(staged, _)| *staged == key) {
            return Ok(ClaimOutcome::Conflict);
        }

        let claimable = lock_state(&self.state)
            .seats
            .get(&key)
            .map(|stored| stored.is_claimable_at(seat.version()))
            .unwrap_or(false);

        if claimable {
            self.staged.push((key, seat.version()));
            Ok(ClaimOutcome::Claimed)
        } else {
            Ok(ClaimOutcome::Conflict)
        }
    }

    async fn save_booking(&mut self, booking: &Booking) -> Result<(), RepositoryError> {
        if self.booking.is_some() {
            return Err(RepositoryError::OperationFailed(
                "a claim transaction can save only one booking".to_string(),
            ));
        }
        self.booking = Some(booking.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<CommitOutcome, RepositoryError> {
        let tx = *self;
        let mut state = lock_state(&tx.state);

        // 1席でも読み取り後に更新されていれば何も反映しない
        let stale = tx.staged.iter().find(|(key, version)| {
            !state
                .seats
                .get(key)
                .map(|stored| stored.is_claimable_at(*version))
                .unwrap_or(false)
        });
        if let Some(((_, label), _)) = stale {
            return Ok(CommitOutcome::Conflict(label.clone()));
        }

        for (key, version) in &tx.staged {
            if let Some(stored) = state.seats.get_mut(key) {
                stored.claim_if_version(*version);
            }
        }
        if let Some(booking) = tx.booking {
            state.bookings.push(booking);
        }
        Ok(CommitOutcome::Committed)
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        // 共有の座席表には何も反映していないため破棄するだけでよい
        drop(self);
        Ok(())
    }
}

/// インメモリのコンサート・出演者カタログ
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    concerts: Arc<BTreeMap<ConcertId, Concert>>,
    performers: Arc<BTreeMap<PerformerId, Performer>>,
}

impl InMemoryCatalog {
    /// コンサートと出演者からカタログを作成
    /// コンサートに含まれる出演者も出演者一覧に登録する
    pub fn new(concerts: Vec<Concert>, performers: Vec<Performer>) -> Self {
        let mut performer_map: BTreeMap<PerformerId, Performer> = performers
            .into_iter()
            .map(|performer| (performer.id, performer))
            .collect();
        for concert in &concerts {
            for performer in &concert.performers {
                performer_map
                    .entry(performer.id)
                    .or_insert_with(|| performer.clone());
            }
        }

        Self {
            concerts: Arc::new(concerts.into_iter().map(|c| (c.id, c)).collect()),
            performers: Arc::new(performer_map),
        }
    }
}

#[async_trait]
impl ConcertRepository for InMemoryCatalog {
    async fn find_by_id(&self, concert_id: ConcertId) -> Result<Option<Concert>, RepositoryError> {
        Ok(self.concerts.get(&concert_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Concert>, RepositoryError> {
        Ok(self.concerts.values().cloned().collect())
    }
}

#[async_trait]
impl PerformerRepository for InMemoryCatalog {
    async fn find_by_id(
        &self,
        performer_id: PerformerId,
    ) -> Result<Option<Performer>, RepositoryError> {
        Ok(self.performers.get(&performer_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Performer>, RepositoryError> {
        Ok(self.performers.values().cloned().collect())
    }
}

/// インメモリユーザーリポジトリ
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(
                users
                    .into_iter()
                    .map(|user| (user.username().to_string(), user))
                    .collect(),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, User>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .get(username)
            .filter(|user| user.matches_password(password))
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .values()
            .find(|user| user.token() == Some(token))
            .cloned())
    }

    async fn update_token(&self, username: &str, token: &str) -> Result<(), RepositoryError> {
        let mut users = self.lock();
        let user = users.get_mut(username).ok_or_else(|| {
            RepositoryError::OperationFailed(format!("unknown user: {}", username))
        })?;
        *user = User::reconstruct(
            user.username().to_string(),
            user.password().to_string(),
            Some(token.to_string()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{parse_concert_date, Money};

    fn date() -> NaiveDateTime {
        parse_concert_date("2020-02-15T20:00:00").unwrap()
    }

    fn label(s: &str) -> SeatLabel {
        SeatLabel::new(s).unwrap()
    }

    fn inventory_with(labels: &[&str]) -> InMemoryInventory {
        let inventory = InMemoryInventory::new();
        inventory.add_seats(
            labels
                .iter()
                .map(|l| Seat::new(label(l), date(), Money::nzd(5000))),
        );
        inventory
    }

    fn booking(seats: Vec<Seat>) -> Booking {
        Booking::new(
            BookingId::new(),
            ConcertId::new(1),
            date(),
            seats,
            "testuser".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_by_date_filters_and_orders_by_label() {
        let inventory = inventory_with(&["B1", "A2", "A1"]);
        let seat = inventory
            .find_by_date_and_label(date(), &label("A2"))
            .await
            .unwrap()
            .unwrap();
        let mut tx = inventory.begin_claim().await.unwrap();
        assert_eq!(tx.claim(&seat).await.unwrap(), ClaimOutcome::Claimed);
        assert_eq!(tx.commit().await.unwrap(), CommitOutcome::Committed);

        let all = inventory.find_by_date(date(), SeatStatusFilter::Any).await.unwrap();
        let labels: Vec<&str> = all.iter().map(|s| s.label().as_str()).collect();
        assert_eq!(labels, vec!["A1", "A2", "B1"]);

        let booked = inventory
            .find_by_date(date(), SeatStatusFilter::Booked)
            .await
            .unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].label().as_str(), "A2");

        let unbooked = inventory
            .find_by_date(date(), SeatStatusFilter::Unbooked)
            .await
            .unwrap();
        assert_eq!(unbooked.len(), 2);

        assert_eq!(
            inventory.availability(date()).await.unwrap(),
            SeatAvailability::new(2, 3)
        );
    }

    #[tokio::test]
    async fn test_stale_version_claim_conflicts() {
        let inventory = inventory_with(&["A1"]);
        let stale = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();

        let mut winner = inventory.begin_claim().await.unwrap();
        assert_eq!(winner.claim(&stale).await.unwrap(), ClaimOutcome::Claimed);
        assert_eq!(winner.commit().await.unwrap(), CommitOutcome::Committed);

        let mut loser = inventory.begin_claim().await.unwrap();
        assert_eq!(loser.claim(&stale).await.unwrap(), ClaimOutcome::Conflict);
    }

    #[tokio::test]
    async fn test_claims_are_invisible_until_commit() {
        let inventory = inventory_with(&["A1", "A2"]);
        let seat = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();

        let mut tx = inventory.begin_claim().await.unwrap();
        assert_eq!(tx.claim(&seat).await.unwrap(), ClaimOutcome::Claimed);

        let during = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();
        assert!(!during.is_booked());
        assert_eq!(
            inventory.availability(date()).await.unwrap(),
            SeatAvailability::new(2, 2)
        );

        assert_eq!(tx.commit().await.unwrap(), CommitOutcome::Committed);
        let after = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();
        assert!(after.is_booked());
        assert_eq!(after.version(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_claims_and_booking() {
        let inventory = inventory_with(&["A1", "A2"]);
        let seat = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();

        let mut tx = inventory.begin_claim().await.unwrap();
        assert_eq!(tx.claim(&seat).await.unwrap(), ClaimOutcome::Claimed);
        tx.save_booking(&booking(vec![seat.clone()])).await.unwrap();
        tx.rollback().await.unwrap();

        let after = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();
        assert!(!after.is_booked());
        assert_eq!(after.version(), 0);
        assert_eq!(inventory.booking_count(), 0);

        // 取り消し後も同じ読み取り結果で確保できる
        let mut retry = inventory.begin_claim().await.unwrap();
        assert_eq!(retry.claim(&seat).await.unwrap(), ClaimOutcome::Claimed);
        assert_eq!(retry.commit().await.unwrap(), CommitOutcome::Committed);
    }

    #[tokio::test]
    async fn test_dropping_uncommitted_transaction_changes_nothing() {
        let inventory = inventory_with(&["A1"]);
        let seat = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();

        {
            let mut tx = inventory.begin_claim().await.unwrap();
            assert_eq!(tx.claim(&seat).await.unwrap(), ClaimOutcome::Claimed);
        }

        assert_eq!(
            inventory.availability(date()).await.unwrap(),
            SeatAvailability::new(1, 1)
        );
    }

    #[tokio::test]
    async fn test_second_commit_on_same_seat_conflicts_and_applies_nothing() {
        let inventory = inventory_with(&["A1", "A2"]);
        let a1 = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();
        let a2 = inventory
            .find_by_date_and_label(date(), &label("A2"))
            .await
            .unwrap()
            .unwrap();

        let mut first = inventory.begin_claim().await.unwrap();
        let mut second = inventory.begin_claim().await.unwrap();
        assert_eq!(first.claim(&a1).await.unwrap(), ClaimOutcome::Claimed);
        assert_eq!(second.claim(&a2).await.unwrap(), ClaimOutcome::Claimed);
        assert_eq!(second.claim(&a1).await.unwrap(), ClaimOutcome::Claimed);
        second
            .save_booking(&booking(vec![a2.clone(), a1.clone()]))
            .await
            .unwrap();

        assert_eq!(first.commit().await.unwrap(), CommitOutcome::Committed);
        assert_eq!(
            second.commit().await.unwrap(),
            CommitOutcome::Conflict(label("A1"))
        );

        // 競合した側の A2 と予約は反映されない
        assert_eq!(
            inventory.availability(date()).await.unwrap(),
            SeatAvailability::new(1, 2)
        );
        assert_eq!(inventory.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_committed_booking_is_visible() {
        let inventory = inventory_with(&["A1"]);
        let seat = inventory
            .find_by_date_and_label(date(), &label("A1"))
            .await
            .unwrap()
            .unwrap();
        let booking = booking(vec![seat.clone()]);

        let mut tx = inventory.begin_claim().await.unwrap();
        tx.claim(&seat).await.unwrap();
        tx.save_booking(&booking).await.unwrap();
        assert_eq!(tx.commit().await.unwrap(), CommitOutcome::Committed);

        assert_eq!(
            BookingRepository::find_by_id(&inventory, booking.id())
                .await
                .unwrap(),
            Some(booking.clone())
        );
        assert_eq!(inventory.find_by_username("testuser").await.unwrap().len(), 1);
        assert!(inventory.find_by_username("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_token_lookup() {
        let repository = InMemoryUserRepository::new(vec![User::new(
            "testuser".to_string(),
            "pa55word".to_string(),
        )]);

        assert!(repository
            .find_by_credentials("testuser", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(repository
            .find_by_credentials("testuser", "pa55word")
            .await
            .unwrap()
            .is_some());

        repository.update_token("testuser", "token-1").await.unwrap();
        let user = repository.find_by_token("token-1").await.unwrap().unwrap();
        assert_eq!(user.username(), "testuser");

        repository.update_token("testuser", "token-2").await.unwrap();
        assert!(repository.find_by_token("token-1").await.unwrap().is_none());
        assert!(repository.update_token("nobody", "t").await.is_err());
    }
}
