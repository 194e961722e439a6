// メモリ保存先で起動したときの初期データ

use crate::adapter::driven::in_memory_repository::{
    InMemoryCatalog, InMemoryInventory, InMemoryUserRepository,
};
use crate::domain::model::{
    Concert, ConcertId, Genre, Money, Performer, PerformerId, Seat, SeatLabel, User,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

/// 1列あたりの座席数
const SEATS_PER_ROW: u32 = 15;

/// 列ごとの価格（セント）
const ROW_PRICES: [(char, i64); 8] = [
    ('A', 9900),
    ('B', 9900),
    ('C', 7900),
    ('D', 7900),
    ('E', 7900),
    ('F', 5900),
    ('G', 5900),
    ('H', 5900),
];

/// デモ用データ一式
pub struct DemoData {
    pub catalog: InMemoryCatalog,
    pub inventory: InMemoryInventory,
    pub users: InMemoryUserRepository,
}

/// デモ公演の日時
pub fn demo_concert_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2027, 3, 20)
        .and_then(|date| date.and_hms_opt(20, 0, 0))
        .unwrap_or_default()
}

/// 指定日時に A〜H 列の座席（計120席）を作成する
pub fn venue_seats(date: NaiveDateTime) -> Vec<Seat> {
    ROW_PRICES
        .iter()
        .flat_map(|&(row, cents)| {
            (1..=SEATS_PER_ROW).filter_map(move |number| {
                SeatLabel::new(format!("{}{}", row, number))
                    .ok()
                    .map(|label| Seat::new(label, date, Money::nzd(cents)))
            })
        })
        .collect()
}

/// デモ用のコンサート1件・座席・ユーザーを作成する
pub fn demo_data() -> DemoData {
    let date = demo_concert_date();

    let performer = Performer {
        id: PerformerId::new(1),
        name: "The Harbour Echoes".to_string(),
        image_name: "harbour_echoes.jpg".to_string(),
        genre: Genre::Acappella,
        blurb: "Six voices, no instruments.".to_string(),
    };

    let concert = Concert {
        id: ConcertId::new(1),
        title: "Harbour Echoes Live".to_string(),
        image_name: "harbour_echoes_live.jpg".to_string(),
        blurb: "One night only at the Town Hall.".to_string(),
        dates: BTreeSet::from([date]),
        performers: vec![performer],
    };

    let inventory = InMemoryInventory::new();
    inventory.add_seats(venue_seats(date));

    DemoData {
        catalog: InMemoryCatalog::new(vec![concert], Vec::new()),
        inventory,
        users: InMemoryUserRepository::new(vec![
            User::new("testuser".to_string(), "pa55word".to_string()),
            User::new("guest".to_string(), "guest123".to_string()),
        ]),
    }
}
