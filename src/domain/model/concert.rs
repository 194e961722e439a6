use crate::domain::model::{ConcertId, Genre, PerformerId};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// 出演者
#[derive(Debug, Clone, PartialEq)]
pub struct Performer {
    pub id: PerformerId,
    pub name: String,
    pub image_name: String,
    pub genre: Genre,
    pub blurb: String,
}

/// コンサート
/// 公演日時の集合と出演者を持つ
#[derive(Debug, Clone, PartialEq)]
pub struct Concert {
    pub id: ConcertId,
    pub title: String,
    pub image_name: String,
    pub blurb: String,
    pub dates: BTreeSet<NaiveDateTime>,
    pub performers: Vec<Performer>,
}

/// コンサート一覧表示用の概要
#[derive(Debug, Clone, PartialEq)]
pub struct ConcertSummary {
    pub id: ConcertId,
    pub title: String,
    pub image_name: String,
}

impl Concert {
    /// 指定日時が公演日時に含まれるか
    pub fn is_scheduled_on(&self, date: NaiveDateTime) -> bool {
        self.dates.contains(&date)
    }

    pub fn summary(&self) -> ConcertSummary {
        ConcertSummary {
            id: self.id,
            title: self.title.clone(),
            image_name: self.image_name.clone(),
        }
    }
}
