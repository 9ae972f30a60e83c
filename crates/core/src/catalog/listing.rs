//! Paginated, filtered resource listing.
//!
//! A page is fetched with two independent reads issued concurrently:
//!
//! - a count over `resources` alone (no join) for the total;
//! - a windowed query that sorts and limits bare ids first and only then
//!   joins full rows and category fields onto that page of ids.
//!
//! Limiting before joining keeps the per-page cost flat as the catalog grows,
//! provided the sort column is indexed.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite::types::Value;

use super::resources::{RESOURCE_COLUMNS, Resource};
use super::status::Status;
use crate::Error;
use crate::executor::QueryExecutor;
use crate::store::row::decode;

/// Sortable resource columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    DownloadCount,
    Title,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::DownloadCount => "download_count",
            SortField::Title => "title",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(SortField::CreatedAt),
            "download_count" => Ok(SortField::DownloadCount),
            "title" => Ok(SortField::Title),
            other => Err(Error::InvalidInput(format!(
                "unknown sort field `{other}` (expected created_at, download_count or title)"
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[serde(alias = "asc")]
    Asc,
    #[default]
    #[serde(alias = "desc")]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Desc)
        } else {
            Err(Error::InvalidInput(format!("unknown sort order `{s}` (expected ASC or DESC)")))
        }
    }
}

/// Filter, sort and window over resource rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResourceQuery {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub limit: u32,
    pub category_id: Option<i64>,
    /// Case-insensitive substring matched against title or description.
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub status: Status,
}

impl Default for ResourceQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            category_id: None,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            status: Status::Active,
        }
    }
}

impl ResourceQuery {
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `page` or `limit` is 0.
    pub fn validate(&self) -> Result<(), Error> {
        if self.page == 0 {
            return Err(Error::InvalidInput("page must be at least 1".into()));
        }
        if self.limit == 0 {
            return Err(Error::InvalidInput("limit must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn offset(&self) -> Result<i64, Error> {
        i64::from(self.page.saturating_sub(1))
            .checked_mul(i64::from(self.limit))
            .ok_or_else(|| Error::InvalidInput("page offset overflows".into()))
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// The two statements behind one listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingStatements {
    pub count_sql: String,
    pub count_params: Vec<Value>,
    pub page_sql: String,
    pub page_params: Vec<Value>,
}

/// Escape LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Build the count and windowed-id statements for a query.
pub fn build_statements(query: &ResourceQuery) -> Result<ListingStatements, Error> {
    query.validate()?;

    let mut predicate = String::from("WHERE r.status = ?");
    let mut params: Vec<Value> = vec![query.status.into()];

    if let Some(category_id) = query.category_id {
        predicate.push_str(" AND r.category_id = ?");
        params.push(Value::Integer(category_id));
    }

    if let Some(term) = query.search_term() {
        predicate.push_str(r" AND (r.title LIKE ? ESCAPE '\' OR r.description LIKE ? ESCAPE '\')");
        let pattern = escape_like(term);
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }

    let direction = query.sort_order.keyword();
    let order = format!("ORDER BY r.{} {direction}, r.id {direction}", query.sort_by.column());

    let count_sql = format!("SELECT COUNT(*) AS total FROM resources r {predicate}");

    let page_sql = format!(
        "SELECT {RESOURCE_COLUMNS} \
         FROM (SELECT r.id FROM resources r {predicate} {order} LIMIT ? OFFSET ?) AS filtered_ids \
         JOIN resources r ON r.id = filtered_ids.id \
         LEFT JOIN categories c ON r.category_id = c.id \
         {order}"
    );

    let mut page_params = params.clone();
    page_params.push(Value::Integer(i64::from(query.limit)));
    page_params.push(Value::Integer(query.offset()?));

    Ok(ListingStatements { count_sql, count_params: params, page_sql, page_params })
}

/// One page of resources plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ResourcePage {
    pub rows: Vec<Resource>,
    pub total: u64,
}

impl ResourcePage {
    /// Number of pages of `limit` rows needed to cover `total`.
    pub fn total_pages(&self, limit: u32) -> u64 {
        if limit == 0 { 0 } else { self.total.div_ceil(u64::from(limit)) }
    }
}

/// Fetch one page of resources.
pub async fn list_resources(executor: &QueryExecutor, query: &ResourceQuery) -> Result<ResourcePage, Error> {
    let ListingStatements { count_sql, count_params, page_sql, page_params } = build_statements(query)?;

    let (rows, total) = tokio::try_join!(
        executor.fetch_all(&page_sql, page_params),
        executor.fetch_i64(&count_sql, count_params, "total"),
    )?;

    let rows = rows.iter().map(decode::<Resource>).collect::<Result<Vec<_>, _>>()?;
    let total = u64::try_from(total).map_err(|_| Error::InvalidData(format!("negative row count {total}")))?;

    tracing::debug!(page = query.page, limit = query.limit, returned = rows.len(), total, "listed resources");
    Ok(ResourcePage { rows, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query() {
        let query = ResourceQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort_by, SortField::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert_eq!(query.status, Status::Active);
    }

    #[test]
    fn test_sort_field_allow_list() {
        assert_eq!("download_count".parse::<SortField>().unwrap(), SortField::DownloadCount);
        assert!(matches!("id; DROP TABLE resources".parse::<SortField>(), Err(Error::InvalidInput(_))));
        assert!(serde_json::from_str::<SortField>("\"file_size\"").is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(serde_json::from_str::<SortOrder>("\"asc\"").unwrap(), SortOrder::Asc);
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(ResourceQuery { page: 0, ..Default::default() }.validate().is_err());
        assert!(ResourceQuery { limit: 0, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_offset() {
        let query = ResourceQuery { page: 3, limit: 10, ..Default::default() };
        assert_eq!(query.offset().unwrap(), 20);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("audac"), "%audac%");
        assert_eq!(escape_like("50%_off\\"), r"%50\%\_off\\%");
    }

    #[test]
    fn test_build_minimal_statements() {
        let stmts = build_statements(&ResourceQuery::default()).unwrap();

        assert_eq!(stmts.count_sql, "SELECT COUNT(*) AS total FROM resources r WHERE r.status = ?");
        assert_eq!(stmts.count_params, vec![Value::Text("active".into())]);
        assert!(!stmts.count_sql.contains("JOIN"));

        assert!(stmts.page_sql.starts_with("SELECT "));
        assert!(stmts.page_sql.contains(
            "FROM (SELECT r.id FROM resources r WHERE r.status = ? \
             ORDER BY r.created_at DESC, r.id DESC LIMIT ? OFFSET ?) AS filtered_ids"
        ));
        assert!(stmts.page_sql.ends_with("ORDER BY r.created_at DESC, r.id DESC"));
        assert_eq!(stmts.page_params, vec![Value::Text("active".into()), Value::Integer(20), Value::Integer(0)]);
    }

    #[test]
    fn test_build_with_filters() {
        let query = ResourceQuery {
            page: 2,
            limit: 5,
            category_id: Some(4),
            search: Some("  audac ".into()),
            sort_by: SortField::Title,
            sort_order: SortOrder::Asc,
            status: Status::Inactive,
        };
        let stmts = build_statements(&query).unwrap();

        assert!(stmts.count_sql.contains("AND r.category_id = ?"));
        assert!(stmts.count_sql.contains(r"r.title LIKE ? ESCAPE '\' OR r.description LIKE ? ESCAPE '\'"));
        assert!(stmts.page_sql.contains("ORDER BY r.title ASC, r.id ASC"));
        assert_eq!(stmts.count_params, vec![
            Value::Text("inactive".into()),
            Value::Integer(4),
            Value::Text("%audac%".into()),
            Value::Text("%audac%".into()),
        ]);
        assert_eq!(stmts.page_params[4..], [Value::Integer(5), Value::Integer(5)]);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ResourceQuery { search: Some("   ".into()), ..Default::default() };
        let stmts = build_statements(&query).unwrap();
        assert!(!stmts.count_sql.contains("LIKE"));
    }

    #[test]
    fn test_total_pages() {
        let page = ResourcePage { rows: Vec::new(), total: 25 };
        assert_eq!(page.total_pages(10), 3);
        assert_eq!(page.total_pages(25), 1);
        assert_eq!(ResourcePage { rows: Vec::new(), total: 0 }.total_pages(10), 0);
    }
}
