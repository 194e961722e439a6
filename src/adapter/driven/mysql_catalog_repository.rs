use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Concert, ConcertId, Genre, Performer, PerformerId};
use crate::domain::port::{ConcertRepository, PerformerRepository, RepositoryError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};
use std::collections::{BTreeMap, BTreeSet};

fn performer_from_row(row: &MySqlRow) -> Result<Performer, RepositoryError> {
    let decode = |e: sqlx::Error| {
        DatabaseError::DecodeError(format!("出演者の列の取得に失敗しました: {}", e))
    };

    let genre: String = row.try_get("genre").map_err(decode)?;
    Ok(Performer {
        id: PerformerId::new(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        image_name: row.try_get("image_name").map_err(decode)?,
        genre: Genre::from_string(&genre).map_err(|e| {
            RepositoryError::FetchFailed(format!("ジャンルの解析に失敗しました: {}", e))
        })?,
        blurb: row.try_get("blurb").map_err(decode)?,
    })
}

/// MySQLコンサート・出演者カタログ
pub struct MySqlCatalogRepository {
    pool: Pool<MySql>,
}

impl MySqlCatalogRepository {
    /// 新しいMySQLカタログリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// コンサートの行に公演日時と出演者を付けてコンサートを組み立てる
    /// concert_id を指定しない場合はすべてのコンサートを対象にする
    async fn load_concerts(
        &self,
        concert_id: Option<ConcertId>,
    ) -> Result<Vec<Concert>, RepositoryError> {
        let id_filter = concert_id.map(|id| id.as_i64());
        let decode = |e: sqlx::Error| {
            DatabaseError::DecodeError(format!("コンサートの列の取得に失敗しました: {}", e))
        };

        let concert_rows = sqlx::query(
            r#"
            SELECT id, title, image_name, blurb
            FROM concerts
            WHERE (? IS NULL OR id = ?)
            ORDER BY id
            "#,
        )
        .bind(id_filter)
        .bind(id_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("コンサートの取得に失敗しました", e))?;

        let date_rows = sqlx::query(
            r#"
            SELECT concert_id, date
            FROM concert_dates
            WHERE (? IS NULL OR concert_id = ?)
            "#,
        )
        .bind(id_filter)
        .bind(id_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("公演日時の取得に失敗しました", e))?;

        let performer_rows = sqlx::query(
            r#"
            SELECT cp.concert_id, p.id, p.name, p.image_name, p.genre, p.blurb
            FROM concert_performers cp
            JOIN performers p ON p.id = cp.performer_id
            WHERE (? IS NULL OR cp.concert_id = ?)
            ORDER BY p.id
            "#,
        )
        .bind(id_filter)
        .bind(id_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("出演者の取得に失敗しました", e))?;

        let mut dates: BTreeMap<i64, BTreeSet<NaiveDateTime>> = BTreeMap::new();
        for row in &date_rows {
            let id: i64 = row.try_get("concert_id").map_err(decode)?;
            let date: NaiveDateTime = row.try_get("date").map_err(decode)?;
            dates.entry(id).or_default().insert(date);
        }

        let mut performers: BTreeMap<i64, Vec<Performer>> = BTreeMap::new();
        for row in &performer_rows {
            let id: i64 = row.try_get("concert_id").map_err(decode)?;
            performers.entry(id).or_default().push(performer_from_row(row)?);
        }

        concert_rows
            .iter()
            .map(|row| -> Result<Concert, RepositoryError> {
                let id: i64 = row.try_get("id").map_err(decode)?;
                Ok(Concert {
                    id: ConcertId::new(id),
                    title: row.try_get("title").map_err(decode)?,
                    image_name: row.try_get("image_name").map_err(decode)?,
                    blurb: row.try_get("blurb").map_err(decode)?,
                    dates: dates.remove(&id).unwrap_or_default(),
                    performers: performers.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ConcertRepository for MySqlCatalogRepository {
    async fn find_by_id(&self, concert_id: ConcertId) -> Result<Option<Concert>, RepositoryError> {
        Ok(self.load_concerts(Some(concert_id)).await?.into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<Concert>, RepositoryError> {
        self.load_concerts(None).await
    }
}

#[async_trait]
impl PerformerRepository for MySqlCatalogRepository {
    async fn find_by_id(
        &self,
        performer_id: PerformerId,
    ) -> Result<Option<Performer>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, image_name, genre, blurb
            FROM performers
            WHERE id = ?
            "#,
        )
        .bind(performer_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("出演者の取得に失敗しました", e))?;

        row.as_ref().map(performer_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Performer>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, image_name, genre, blurb
            FROM performers
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("出演者一覧の取得に失敗しました", e))?;

        rows.iter().map(performer_from_row).collect()
    }
}
