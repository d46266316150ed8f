use axum::extract::RawQuery;

use crate::database::models::Condition;
use crate::database::TenantSession;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

use super::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Parsed `GET /conditions` query. `animal_ids` may repeat, which the
/// serde-based `Query` extractor cannot express.
#[derive(Debug, PartialEq, Eq)]
pub struct ConditionFilter {
    pub animal_ids: Vec<i64>,
    pub pagination: Pagination,
    pub sort_order: SortOrder,
}

impl ConditionFilter {
    pub fn parse(query: Option<&str>) -> Result<Self, ApiError> {
        let mut animal_ids = Vec::new();
        let mut page = 0;
        let mut page_size = super::DEFAULT_PAGE_SIZE;
        let mut sort_order = SortOrder::Desc;

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "animal_ids" => animal_ids.push(parse_int(&key, &value)?),
                "page" => page = parse_int(&key, &value)?,
                "page_size" => page_size = parse_int(&key, &value)?,
                // Anything but "asc" sorts newest first
                "sort_order" => {
                    sort_order = if value == "asc" { SortOrder::Asc } else { SortOrder::Desc };
                }
                _ => {}
            }
        }

        Ok(Self {
            animal_ids,
            pagination: Pagination::new(page, page_size)?,
            sort_order,
        })
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{} must be an integer, got '{}'", key, value)))
}

/// GET /conditions
pub async fn list(mut session: TenantSession, RawQuery(query): RawQuery) -> ApiResult<Vec<Condition>> {
    let filter = ConditionFilter::parse(query.as_deref())?;

    let conditions = sqlx::query_as::<_, Condition>(&format!(
        "SELECT id, animal_id, condition_type, is_enabled, created, created_by_user_id, updated, updated_by_user_id
         FROM conditions
         WHERE cardinality($1::BIGINT[]) = 0 OR animal_id = ANY($1)
         ORDER BY id {}
         LIMIT $2 OFFSET $3",
        filter.sort_order.as_sql()
    ))
    .bind(&filter.animal_ids)
    .bind(filter.pagination.limit())
    .bind(filter.pagination.offset())
    .fetch_all(session.connection())
    .await?;

    Ok(ApiResponse::success(conditions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_animal_ids() {
        let filter = ConditionFilter::parse(Some("animal_ids=1&animal_ids=7&page=2&page_size=10&sort_order=asc")).unwrap();
        assert_eq!(filter.animal_ids, vec![1, 7]);
        assert_eq!(filter.pagination.offset(), 20);
        assert_eq!(filter.sort_order, SortOrder::Asc);
    }

    #[test]
    fn defaults_to_everything_newest_first() {
        let filter = ConditionFilter::parse(None).unwrap();
        assert!(filter.animal_ids.is_empty());
        assert_eq!(filter.pagination.limit(), 100);
        assert_eq!(filter.sort_order, SortOrder::Desc);

        let filter = ConditionFilter::parse(Some("sort_order=sideways")).unwrap();
        assert_eq!(filter.sort_order, SortOrder::Desc);
    }

    #[test]
    fn rejects_non_numeric_ids() {
        assert!(ConditionFilter::parse(Some("animal_ids=rex")).is_err());
    }
}
