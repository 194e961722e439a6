use proptest::prelude::*;
use concert_booking_service::domain::model::{
    parse_concert_date, Booking, BookingId, ConcertId, Money, Seat, SeatAvailability, SeatLabel,
};
use concert_booking_service::domain::subscription::Subscription;

fn concert_date() -> chrono::NaiveDateTime {
    parse_concert_date("2020-02-15T20:00:00").unwrap()
}

// SeatAvailability のプロパティベーステスト
proptest! {
    /// 空席率は常に 0〜100 に収まる
    #[test]
    fn test_free_percentage_is_bounded(
        (total, free) in (1u32..10_000).prop_flat_map(|total| (Just(total), 0..=total)),
    ) {
        let percentage = SeatAvailability::new(free, total).free_percentage().unwrap();

        prop_assert!(percentage <= 100);
    }

    /// 空席率は切り捨てで計算される
    #[test]
    fn test_free_percentage_rounds_down(
        (total, free) in (1u32..10_000).prop_flat_map(|total| (Just(total), 0..=total)),
    ) {
        let percentage = SeatAvailability::new(free, total).free_percentage().unwrap();

        prop_assert!(percentage as u64 * total as u64 <= free as u64 * 100);
        prop_assert!((percentage as u64 + 1) * total as u64 > free as u64 * 100);
    }

    /// 座席のない日時の空席率は計算されない
    #[test]
    fn test_free_percentage_without_seats(free in 0u32..100) {
        prop_assert_eq!(SeatAvailability::new(free, 0).free_percentage(), None);
    }
}

// Subscription のプロパティベーステスト
proptest! {
    /// 購読はしきい値が空席率を厳密に上回るときだけ満たされる
    #[test]
    fn test_subscription_threshold_is_strict(
        threshold in 0u32..=100,
        percentage in 0u32..=100,
    ) {
        let subscription = Subscription::new(ConcertId::new(1), concert_date(), threshold).unwrap();

        prop_assert_eq!(subscription.is_satisfied_by(percentage), percentage < threshold);
    }

    /// 100 を超えるしきい値は拒否される
    #[test]
    fn test_subscription_rejects_threshold_above_100(threshold in 101u32..10_000) {
        prop_assert!(Subscription::new(ConcertId::new(1), concert_date(), threshold).is_err());
    }
}

// Seat のプロパティベーステスト
proptest! {
    /// 確保は読み取り時のバージョンと一致する空席でのみ成功する
    #[test]
    fn test_claim_succeeds_only_with_current_version(
        version in 0u64..1_000,
        expected in 0u64..1_000,
        is_booked in any::<bool>(),
    ) {
        let mut seat = Seat::reconstruct(
            SeatLabel::new("A1").unwrap(),
            concert_date(),
            Money::nzd(5000),
            is_booked,
            version,
        );

        let claimed = seat.claim_if_version(expected);

        prop_assert_eq!(claimed, !is_booked && version == expected);
        if claimed {
            prop_assert!(seat.is_booked());
            prop_assert_eq!(seat.version(), version + 1);
        } else {
            prop_assert_eq!(seat.is_booked(), is_booked);
            prop_assert_eq!(seat.version(), version);
        }
    }

    /// 確保可否の判定は実際の確保結果と一致し、座席を変更しない
    #[test]
    fn test_claimable_check_agrees_with_claim(
        version in 0u64..1_000,
        expected in 0u64..1_000,
        is_booked in any::<bool>(),
    ) {
        let mut seat = Seat::reconstruct(
            SeatLabel::new("A1").unwrap(),
            concert_date(),
            Money::nzd(5000),
            is_booked,
            version,
        );

        let claimable = seat.is_claimable_at(expected);
        prop_assert_eq!(seat.version(), version);
        prop_assert_eq!(seat.is_booked(), is_booked);
        prop_assert_eq!(claimable, seat.claim_if_version(expected));
    }

    /// 英数字のみのラベルは受け付けられる
    #[test]
    fn test_alphanumeric_seat_labels_are_accepted(label in "[A-Z][0-9]{1,3}") {
        let parsed = SeatLabel::new(label.clone()).unwrap();
        prop_assert_eq!(parsed.as_str(), label.as_str());
    }
}

// Booking のプロパティベーステスト
proptest! {
    /// 予約の合計金額は常に座席価格の合計と等しい
    #[test]
    fn test_booking_total_is_sum_of_seat_prices(
        prices in prop::collection::vec(1i64..100_000, 1..20),
    ) {
        let seats: Vec<Seat> = prices
            .iter()
            .enumerate()
            .map(|(i, price)| {
                Seat::reconstruct(
                    SeatLabel::new(format!("A{}", i + 1)).unwrap(),
                    concert_date(),
                    Money::nzd(*price),
                    true,
                    1,
                )
            })
            .collect();

        let booking = Booking::new(
            BookingId::new(),
            ConcertId::new(1),
            concert_date(),
            seats,
            "testuser".to_string(),
        )
        .unwrap();

        prop_assert_eq!(booking.total_price().unwrap(), Money::nzd(prices.iter().sum()));
    }

    /// Money の加算は交換法則を満たす (a + b = b + a)
    #[test]
    fn test_money_addition_is_commutative(
        amount1 in 0i64..1_000_000,
        amount2 in 0i64..1_000_000,
    ) {
        let money1 = Money::nzd(amount1);
        let money2 = Money::nzd(amount2);

        prop_assert_eq!(money1.add(&money2).unwrap(), money2.add(&money1).unwrap());
    }
}
