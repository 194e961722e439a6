// ドメインサービス
// 複数の座席にまたがる確保ルールを実装

use crate::domain::error::DomainError;
use crate::domain::model::{Booking, BookingId, ConcertId, Seat, SeatLabel};
use crate::domain::port::{ClaimOutcome, CommitOutcome, SeatClaimTransaction, SeatRepository};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::sync::Arc;

/// 座席確保サービス
/// 要求された座席をすべて確保するか、何も変更しないかのどちらかを保証する
pub struct SeatClaimService {
    seat_repository: Arc<dyn SeatRepository>,
}

/// 予約対象の指定
pub struct SeatSelection<'a> {
    pub booking_id: BookingId,
    pub concert_id: ConcertId,
    pub date: NaiveDateTime,
    pub labels: &'a [SeatLabel],
    pub username: &'a str,
}

impl SeatClaimService {
    /// 新しい座席確保サービスを作成
    ///
    /// # Arguments
    /// * `seat_repository` - 座席在庫リポジトリ
    pub fn new(seat_repository: Arc<dyn SeatRepository>) -> Self {
        Self { seat_repository }
    }

    /// 指定された座席をすべて確保し、予約を保存する
    ///
    /// 1. 要求順に座席を検索し、存在しない・予約済みの座席があれば何も変更せずに失敗する
    /// 2. 確保トランザクション内で各座席を (日時, ラベル) 順にバージョン条件付きで確保する
    /// 3. すべて確保できた場合のみ予約を保存して確定する
    ///
    /// 確保順を固定しているため、重なる座席を逆順に要求する予約同士でも
    /// 行ロックの待ち合いにならない
    ///
    /// # Returns
    /// * `Ok(Booking)` - 確定した予約
    /// * `Err(DomainError::SeatNotFound)` - 存在しない座席ラベル
    /// * `Err(DomainError::SeatAlreadyBooked)` - 予約済みの座席
    /// * `Err(DomainError::SeatClaimConflict)` - 同時に他の予約が確保した
    pub async fn reserve_seats(&self, selection: SeatSelection<'_>) -> Result<Booking, DomainError> {
        let seats = self.resolve_seats(selection.date, selection.labels).await?;

        let mut tx = self
            .seat_repository
            .begin_claim()
            .await
            .map_err(|e| DomainError::RepositoryError(format!("トランザクション開始に失敗: {}", e)))?;

        match Self::claim_and_save(tx.as_mut(), seats, &selection).await {
            Ok(booking) => {
                let outcome = tx.commit().await.map_err(|e| {
                    DomainError::RepositoryError(format!("予約の確定に失敗: {}", e))
                })?;
                match outcome {
                    CommitOutcome::Committed => Ok(booking),
                    CommitOutcome::Conflict(label) => Err(DomainError::SeatClaimConflict(label)),
                }
            }
            Err(err) => {
                // 破棄時にもロールバックされるため、ここでの失敗は元のエラーを優先する
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }

    /// 要求された座席ラベルを座席に解決する（変更は行わない）
    pub async fn resolve_seats(
        &self,
        date: NaiveDateTime,
        labels: &[SeatLabel],
    ) -> Result<Vec<Seat>, DomainError> {
        if labels.is_empty() {
            return Err(DomainError::EmptySeatSelection);
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = labels.iter().find(|label| !seen.insert(*label)) {
            return Err(DomainError::DuplicateSeatLabel(duplicate.clone()));
        }

        let mut seats = Vec::with_capacity(labels.len());
        for label in labels {
            let seat = self
                .seat_repository
                .find_by_date_and_label(date, label)
                .await
                .map_err(|e| DomainError::RepositoryError(format!("座席の取得に失敗: {}", e)))?
                .ok_or_else(|| DomainError::SeatNotFound(label.clone()))?;

            seat.ensure_available()?;
            seats.push(seat);
        }

        Ok(seats)
    }

    async fn claim_and_save(
        tx: &mut dyn SeatClaimTransaction,
        seats: Vec<Seat>,
        selection: &SeatSelection<'_>,
    ) -> Result<Booking, DomainError> {
        let mut claim_order: Vec<&Seat> = seats.iter().collect();
        claim_order.sort_by(|a, b| (a.date(), a.label()).cmp(&(b.date(), b.label())));

        for seat in claim_order {
            let outcome = tx
                .claim(seat)
                .await
                .map_err(|e| DomainError::RepositoryError(format!("座席の確保に失敗: {}", e)))?;

            if outcome == ClaimOutcome::Conflict {
                return Err(DomainError::SeatClaimConflict(seat.label().clone()));
            }
        }

        // 予約の座席は要求順のまま
        let claimed = seats
            .iter()
            .map(|seat| {
                Seat::reconstruct(
                    seat.label().clone(),
                    seat.date(),
                    seat.price(),
                    true,
                    seat.version() + 1,
                )
            })
            .collect();

        let booking = Booking::new(
            selection.booking_id,
            selection.concert_id,
            selection.date,
            claimed,
            selection.username.to_string(),
        )?;

        tx.save_booking(&booking)
            .await
            .map_err(|e| DomainError::RepositoryError(format!("予約の保存に失敗: {}", e)))?;

        Ok(booking)
    }
}
