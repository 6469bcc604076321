use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{
    Alert, AlertFilter, AlertUpdate, NewAlert, NewNewsItem, NewsFilter, NewsItem, SourceCount,
};

use super::schema::SCHEMA;

const ALERT_COLUMNS: &str = "id, symbol, alert_type, condition, threshold_value, message, \
                             is_active, created_at, updated_at";

const NEWS_COLUMNS: &str = "id, title, description, link, published_at, source, \
                            keywords_matched, is_relevant, created_at, updated_at";

/// Result of committing one feed's staged news items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInsert {
    pub inserted: Vec<i64>,
    /// Links rejected by the unique constraint.
    pub duplicates: Vec<String>,
}

#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::with_connection(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Alert operations

    pub async fn create_alert(&self, alert: NewAlert) -> Result<Alert> {
        let created = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO alerts (symbol, alert_type, condition, threshold_value, message, is_active)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    params![
                        alert.symbol.to_uppercase(),
                        alert.alert_type,
                        alert.condition,
                        alert.threshold_value,
                        alert.message,
                        alert.is_active,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                let alert = conn.query_row(
                    &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
                    params![id],
                    alert_from_row,
                )?;
                Ok(alert)
            })
            .await?;
        Ok(created)
    }

    pub async fn get_alert(&self, id: i64) -> Result<Option<Alert>> {
        let alert = self
            .conn
            .call(move |conn| {
                let alert = conn
                    .query_row(
                        &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
                        params![id],
                        alert_from_row,
                    )
                    .optional()?;
                Ok(alert)
            })
            .await?;
        Ok(alert)
    }

    /// Returns the requested page together with the unpaginated total.
    pub async fn list_alerts(&self, filter: AlertFilter) -> Result<(Vec<Alert>, i64)> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(symbol) = filter.symbol.filter(|s| !s.is_empty()) {
            clauses.push("symbol = ?");
            values.push(Value::Text(symbol.to_uppercase()));
        }
        if let Some(is_active) = filter.is_active {
            clauses.push("is_active = ?");
            values.push(Value::Integer(is_active as i64));
        }

        let where_sql = where_clause(&clauses);
        let (limit, skip) = (filter.limit, filter.skip);

        let page = self
            .conn
            .call(move |conn| {
                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM alerts{where_sql}"),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )?;

                values.push(Value::Integer(limit.into()));
                values.push(Value::Integer(skip.into()));

                let mut stmt = conn.prepare(&format!(
                    "SELECT {ALERT_COLUMNS} FROM alerts{where_sql} ORDER BY id LIMIT ? OFFSET ?"
                ))?;
                let alerts = stmt
                    .query_map(params_from_iter(values.iter()), alert_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok((alerts, total))
            })
            .await?;
        Ok(page)
    }

    pub async fn active_alerts(&self) -> Result<Vec<Alert>> {
        let alerts = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ALERT_COLUMNS} FROM alerts WHERE is_active = 1 ORDER BY id"
                ))?;
                let alerts = stmt
                    .query_map([], alert_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(alerts)
            })
            .await?;
        Ok(alerts)
    }

    /// Applies a partial update. `None` when the alert does not exist.
    pub async fn update_alert(&self, id: i64, update: AlertUpdate) -> Result<Option<Alert>> {
        let updated = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let existing = tx
                    .query_row(
                        &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
                        params![id],
                        alert_from_row,
                    )
                    .optional()?;

                let Some(mut alert) = existing else {
                    return Ok(None);
                };
                update.apply(&mut alert);

                tx.execute(
                    r#"UPDATE alerts
                       SET symbol = ?1, alert_type = ?2, condition = ?3, threshold_value = ?4,
                           message = ?5, is_active = ?6, updated_at = datetime('now')
                       WHERE id = ?7"#,
                    params![
                        alert.symbol,
                        alert.alert_type,
                        alert.condition,
                        alert.threshold_value,
                        alert.message,
                        alert.is_active,
                        id,
                    ],
                )?;
                let alert = tx.query_row(
                    &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
                    params![id],
                    alert_from_row,
                )?;
                tx.commit()?;
                Ok(Some(alert))
            })
            .await?;
        Ok(updated)
    }

    /// Physically removes an alert. Returns whether a row was deleted.
    pub async fn delete_alert(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let rows = conn.execute("DELETE FROM alerts WHERE id = ?1", params![id])?;
                Ok(rows > 0)
            })
            .await?;
        Ok(deleted)
    }

    // News operations

    pub async fn news_link_exists(&self, link: &str) -> Result<bool> {
        let link = link.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM news_items WHERE link = ?1)",
                    params![link],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await?;
        Ok(exists)
    }

    /// Inserts a feed's staged items in a single transaction.
    ///
    /// A unique-constraint violation only rejects that one item (SQLite rolls
    /// back the failing statement, not the transaction) and is reported in
    /// [`BatchInsert::duplicates`]. Any other failure, including the commit
    /// itself, discards the whole batch.
    pub async fn insert_news_batch(&self, items: Vec<NewNewsItem>) -> Result<BatchInsert> {
        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut outcome = BatchInsert::default();
                {
                    let mut stmt = tx.prepare(
                        r#"INSERT INTO news_items (title, description, link, published_at, source, keywords_matched, is_relevant)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)"#,
                    )?;
                    for item in items {
                        let result = stmt.execute(params![
                            item.title,
                            item.description,
                            item.link,
                            item.published_at.map(|dt| dt.to_rfc3339()),
                            item.source,
                            item.keywords_matched,
                        ]);
                        match result {
                            Ok(_) => outcome.inserted.push(tx.last_insert_rowid()),
                            Err(e) if is_unique_violation(&e) => outcome.duplicates.push(item.link),
                            Err(e) => return Err(e.into()),
                        }
                    }
                }
                tx.commit()?;
                Ok(outcome)
            })
            .await?;
        Ok(outcome)
    }

    pub async fn get_news_item(&self, id: i64) -> Result<Option<NewsItem>> {
        let item = self
            .conn
            .call(move |conn| {
                let item = conn
                    .query_row(
                        &format!("SELECT {NEWS_COLUMNS} FROM news_items WHERE id = ?1"),
                        params![id],
                        news_item_from_row,
                    )
                    .optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    /// Relevant items only, newest first.
    pub async fn list_news(&self, filter: NewsFilter) -> Result<(Vec<NewsItem>, i64)> {
        let mut clauses = vec!["is_relevant = 1"];
        let mut values = Vec::new();

        if let Some(source) = filter.source.as_deref().filter(|s| !s.is_empty()) {
            clauses.push("source LIKE ?");
            values.push(Value::Text(format!("%{}%", source)));
        }
        for keyword in filter.keyword_list() {
            clauses.push("keywords_matched LIKE ?");
            values.push(Value::Text(format!("%{}%", keyword)));
        }

        let where_sql = where_clause(&clauses);
        let (limit, skip) = (filter.limit, filter.skip);

        let page = self
            .conn
            .call(move |conn| {
                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM news_items{where_sql}"),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )?;

                values.push(Value::Integer(limit.into()));
                values.push(Value::Integer(skip.into()));

                let mut stmt = conn.prepare(&format!(
                    "SELECT {NEWS_COLUMNS} FROM news_items{where_sql} \
                     ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
                ))?;
                let items = stmt
                    .query_map(params_from_iter(values.iter()), news_item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok((items, total))
            })
            .await?;
        Ok(page)
    }

    /// Soft delete: the row stays, flagged as not relevant.
    pub async fn mark_news_irrelevant(&self, id: i64) -> Result<bool> {
        let updated = self
            .conn
            .call(move |conn| {
                let rows = conn.execute(
                    "UPDATE news_items SET is_relevant = 0, updated_at = datetime('now') WHERE id = ?1",
                    params![id],
                )?;
                Ok(rows > 0)
            })
            .await?;
        Ok(updated)
    }

    pub async fn news_sources(&self) -> Result<Vec<SourceCount>> {
        let sources = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT source, COUNT(id) FROM news_items
                       WHERE is_relevant = 1
                       GROUP BY source
                       ORDER BY source"#,
                )?;
                let sources = stmt
                    .query_map([], |row| {
                        Ok(SourceCount {
                            name: row.get(0)?,
                            count: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sources)
            })
            .await?;
        Ok(sources)
    }
}

fn where_clause(clauses: &[&str]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // RFC3339 (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn required_datetime(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn optional_datetime(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| parse_datetime(&s)))
}

fn alert_from_row(row: &Row) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: row.get(0)?,
        symbol: row.get(1)?,
        alert_type: row.get(2)?,
        condition: row.get(3)?,
        threshold_value: row.get(4)?,
        message: row.get(5)?,
        is_active: row.get::<_, i64>(6)? != 0,
        created_at: required_datetime(row, 7)?,
        updated_at: optional_datetime(row, 8)?,
    })
}

fn news_item_from_row(row: &Row) -> rusqlite::Result<NewsItem> {
    Ok(NewsItem {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        link: row.get(3)?,
        published_at: optional_datetime(row, 4)?,
        source: row.get(5)?,
        keywords_matched: row.get(6)?,
        is_relevant: row.get::<_, i64>(7)? != 0,
        created_at: required_datetime(row, 8)?,
        updated_at: optional_datetime(row, 9)?,
    })
}
