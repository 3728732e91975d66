//! # Movement Repository
//!
//! Database operations for entries and exits.
//!
//! ## Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a listing is built                               │
//! │                                                                         │
//! │  MovementQuery { start, end, category, search, page, limit }           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE date >= start AND date <= end           (inclusive, ISO text)   │
//! │    AND category = tag                          (exact)                 │
//! │    AND search_text LIKE '%term%'               (folded term)           │
//! │       │                                                                 │
//! │       ├──► SELECT COUNT(*)            → total                          │
//! │       └──► ORDER BY date DESC, created_at DESC                         │
//! │            LIMIT limit OFFSET (page - 1) * limit  → rows               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A page past the end yields no rows but still reports the real total.
//!
//! ## Search Folding
//! SQLite's `LOWER()` and `LIKE` only fold ASCII. Every write stores the
//! searchable fields (code, description, responsible, area and, for exits,
//! project) lowercased with Rust's Unicode rules in `search_text`, and the
//! term is folded the same way, so "ÁREA" finds "Área Norte".

use chrono::{NaiveDate, SecondsFormat, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockflow_core::{Money, MovementKind, MovementPayload, MovementQuery, MovementRecord, Resource};

/// Storage format of the `date` column.
const DATE_FORMAT: &str = "%Y-%m-%d";

const ENTRY_COLUMNS: &str = "id, date, product_code, description, unit_price_cents, quantity, \
     responsible, area, category, NULL AS project";

const EXIT_COLUMNS: &str = "id, date, product_code, description, unit_price_cents, quantity, \
     responsible, area, category, project";

/// Separates fields in `search_text` so a term cannot match across two.
const SEARCH_FIELD_SEPARATOR: &str = "\n";

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw row shape shared by both tables.
#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: String,
    date: String,
    product_code: String,
    description: String,
    unit_price_cents: i64,
    quantity: i64,
    responsible: Option<String>,
    area: Option<String>,
    category: Option<String>,
    project: Option<String>,
}

impl MovementRow {
    fn into_record(self, resource: Resource) -> DbResult<MovementRecord> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|_| {
            DbError::Decode {
                column: "date".to_string(),
                value: self.date.clone(),
            }
        })?;

        let kind = match resource {
            Resource::Entries => MovementKind::Entry,
            Resource::Exits => MovementKind::Exit {
                project: self.project,
            },
        };

        Ok(MovementRecord {
            id: self.id,
            date,
            product_code: self.product_code,
            description: self.description,
            unit_price: Money::from_cents(self.unit_price_cents),
            quantity: self.quantity,
            responsible: self.responsible,
            area: self.area,
            category: self.category,
            kind,
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Folded text of every searchable field of `payload`.
fn search_text(resource: Resource, payload: &MovementPayload) -> String {
    let mut fields = vec![
        Some(payload.product_code.as_str()),
        Some(payload.description.as_str()),
        payload.responsible.as_deref(),
        payload.area.as_deref(),
    ];
    if resource == Resource::Exits {
        fields.push(payload.project.as_deref());
    }

    fields
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(SEARCH_FIELD_SEPARATOR)
}

/// Turns a search term into a LIKE pattern, escaping LIKE wildcards so a
/// literal `%` or `_` in the term only matches itself.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for one movement collection.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.movements(Resource::Exits);
///
/// let created = repo.insert(&payload).await?;
/// let (rows, total) = repo.list(&query).await?;
/// repo.update_quantity(&created.id, 4).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
    resource: Resource,
}

impl MovementRepository {
    /// Creates a repository bound to one resource's table.
    pub fn new(pool: SqlitePool, resource: Resource) -> Self {
        MovementRepository { pool, resource }
    }

    /// The collection this repository reads and writes.
    pub fn resource(&self) -> Resource {
        self.resource
    }

    fn table(&self) -> &'static str {
        match self.resource {
            Resource::Entries => "entries",
            Resource::Exits => "exits",
        }
    }

    fn columns(&self) -> &'static str {
        match self.resource {
            Resource::Entries => ENTRY_COLUMNS,
            Resource::Exits => EXIT_COLUMNS,
        }
    }

    fn has_project(&self) -> bool {
        self.resource == Resource::Exits
    }

    /// Appends the WHERE clause for the query's filters.
    fn push_filters(&self, builder: &mut QueryBuilder<'_, Sqlite>, query: &MovementQuery) {
        builder.push(" WHERE 1 = 1");

        if let Some(start) = query.start_date {
            builder.push(" AND date >= ").push_bind(format_date(start));
        }

        if let Some(end) = query.end_date {
            builder.push(" AND date <= ").push_bind(format_date(end));
        }

        if let Some(category) = &query.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }

        if let Some(term) = &query.search {
            builder
                .push(" AND search_text LIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
    }

    /// Lists one page of movements matching the query.
    ///
    /// ## Returns
    /// * `(rows, total)` - the page's rows and the number of matching rows
    ///   across all pages
    pub async fn list(&self, query: &MovementQuery) -> DbResult<(Vec<MovementRecord>, u64)> {
        debug!(resource = %self.resource, ?query, "Listing movements");

        let total = self.count(query).await?;

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM {}", self.columns(), self.table()));
        self.push_filters(&mut builder, query);
        builder.push(" ORDER BY date DESC, created_at DESC LIMIT ");
        builder.push_bind(i64::from(query.limit));
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows: Vec<MovementRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        let records = rows
            .into_iter()
            .map(|row| row.into_record(self.resource))
            .collect::<DbResult<Vec<_>>>()?;

        debug!(
            resource = %self.resource,
            rows = records.len(),
            total,
            "Listing complete"
        );
        Ok((records, total))
    }

    /// Counts movements matching the query's filters (paging is ignored).
    pub async fn count(&self, query: &MovementQuery) -> DbResult<u64> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", self.table()));
        self.push_filters(&mut builder, query);

        let total: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    /// Gets a movement by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(record))` - Movement found
    /// * `Ok(None)` - No such movement in this collection
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MovementRecord>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            self.columns(),
            self.table()
        );

        let row: Option<MovementRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.into_record(self.resource)).transpose()
    }

    /// Inserts a new movement and returns the stored record.
    ///
    /// The id (UUID v4) and audit timestamps are assigned here. `project`
    /// is dropped for entries.
    pub async fn insert(&self, payload: &MovementPayload) -> DbResult<MovementRecord> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp();

        let (project_column, project_value) = if self.has_project() {
            (", project", ", ?")
        } else {
            ("", "")
        };

        let sql = format!(
            "INSERT INTO {} (id, date, product_code, description, unit_price_cents, quantity, \
             responsible, area, category, search_text, created_at, updated_at{}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?{})",
            self.table(),
            project_column,
            project_value
        );

        let mut statement = sqlx::query(&sql)
            .bind(&id)
            .bind(format_date(payload.date))
            .bind(payload.product_code.as_str())
            .bind(payload.description.as_str())
            .bind(payload.unit_price.cents())
            .bind(payload.quantity)
            .bind(payload.responsible.clone())
            .bind(payload.area.clone())
            .bind(payload.category.clone())
            .bind(search_text(self.resource, payload))
            .bind(&now)
            .bind(&now);

        if self.has_project() {
            statement = statement.bind(payload.project.clone());
        }

        statement.execute(&self.pool).await?;

        debug!(resource = %self.resource, id = %id, "Movement inserted");
        Ok(payload.clone().into_record(id, self.resource))
    }

    /// Replaces every writable field of an existing movement.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no movement with this id in this collection
    pub async fn update(&self, id: &str, payload: &MovementPayload) -> DbResult<MovementRecord> {
        let project_set = if self.has_project() {
            ", project = ?"
        } else {
            ""
        };

        let sql = format!(
            "UPDATE {} SET date = ?, product_code = ?, description = ?, unit_price_cents = ?, \
             quantity = ?, responsible = ?, area = ?, category = ?, search_text = ?, \
             updated_at = ?{} \
             WHERE id = ?",
            self.table(),
            project_set
        );

        let mut statement = sqlx::query(&sql)
            .bind(format_date(payload.date))
            .bind(payload.product_code.as_str())
            .bind(payload.description.as_str())
            .bind(payload.unit_price.cents())
            .bind(payload.quantity)
            .bind(payload.responsible.clone())
            .bind(payload.area.clone())
            .bind(payload.category.clone())
            .bind(search_text(self.resource, payload))
            .bind(timestamp());

        if self.has_project() {
            statement = statement.bind(payload.project.clone());
        }

        let result = statement.bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(self.resource.singular(), id));
        }

        debug!(resource = %self.resource, id = %id, "Movement updated");
        Ok(payload.clone().into_record(id, self.resource))
    }

    /// Deletes a movement.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no movement with this id in this collection
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table());

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(self.resource.singular(), id));
        }

        debug!(resource = %self.resource, id = %id, "Movement deleted");
        Ok(())
    }

    /// Sets the quantity of a movement and returns the updated record.
    ///
    /// Callers restrict this to exits; the repository itself works on
    /// whichever table it is bound to.
    pub async fn update_quantity(&self, id: &str, quantity: i64) -> DbResult<MovementRecord> {
        let sql = format!(
            "UPDATE {} SET quantity = ?, updated_at = ? WHERE id = ?",
            self.table()
        );

        let result = sqlx::query(&sql)
            .bind(quantity)
            .bind(timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(self.resource.singular(), id));
        }

        debug!(resource = %self.resource, id = %id, quantity, "Movement quantity updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(self.resource.singular(), id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
