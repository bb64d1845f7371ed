//! User repository for SQLite operations

use sqlx::sqlite::SqliteArguments;
use sqlx::{Arguments, SqlitePool};

use crate::core::constants::QUERY_LIST_USERS;
use crate::data::filters::{Filter, FilterCompiler, SqlValue};
use crate::data::sqlite::{BaseQueries, SqliteError};
use crate::data::types::{ListUserRow, NewUser, UserRow};

/// Insert a user with a generated CUID2 ID
///
/// Runs in its own transaction. On failure the transaction is rolled back
/// and the database error is returned.
pub async fn insert_user(pool: &SqlitePool, new_user: &NewUser) -> Result<UserRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO users (id, name, address, education, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&new_user.name)
    .bind(new_user.address.as_deref())
    .bind(new_user.education.as_deref())
    .bind(now)
    .execute(&mut *tx)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, "User insert failed, rolling back");
        if let Err(rollback_err) = tx.rollback().await {
            tracing::warn!(error = %rollback_err, "Rollback failed");
        }
        return Err(e.into());
    }

    tx.commit().await?;

    tracing::debug!(%id, "User inserted");
    Ok(UserRow {
        id,
        name: new_user.name.clone(),
        address: new_user.address.clone(),
        education: new_user.education.clone(),
        created_at: now,
    })
}

/// List users matching a filter
///
/// The compiled clause is appended to the `list_users` base query. A filter
/// that fails to compile is reported before any query runs.
pub async fn list_users(
    pool: &SqlitePool,
    queries: &BaseQueries,
    compiler: &FilterCompiler,
    filter: &Filter,
) -> Result<Vec<ListUserRow>, SqliteError> {
    let base = queries.get(QUERY_LIST_USERS)?;
    let clause = compiler.compile(filter)?;

    let sql = format!("{}{}", base, clause.sql);
    let args = bind_args(&clause.args)?;

    tracing::debug!(%sql, args = clause.args.len(), "Listing users");

    let rows: Vec<(String, Option<String>, Option<String>, i64)> =
        sqlx::query_as_with(&sql, args).fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(|(name, address, education, filter_count)| ListUserRow {
            name,
            address,
            education,
            filter_count,
        })
        .collect())
}

/// Total number of stored users
pub async fn count_users(pool: &SqlitePool) -> Result<i64, SqliteError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Bind compiled arguments positionally, keeping each value's native type
fn bind_args(values: &[SqlValue]) -> Result<SqliteArguments<'_>, SqliteError> {
    let mut args = SqliteArguments::default();
    for value in values {
        let added = match value {
            SqlValue::Null => args.add(None::<String>),
            SqlValue::Bool(b) => args.add(*b),
            SqlValue::Integer(i) => args.add(*i),
            SqlValue::Real(f) => args.add(*f),
            SqlValue::Text(s) => args.add(s.as_str()),
        };
        added.map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::{
        CompilerConfig, FilterError, FilterField, FilterValue, Operator, Sort, SortOrder, columns,
        parse_filter,
    };
    use crate::data::sqlite::SqliteService;

    async fn seeded() -> SqliteService {
        let service = SqliteService::in_memory().await.unwrap();
        let users = [
            NewUser::new("Alice")
                .with_address("Jakarta")
                .with_education("S1"),
            NewUser::new("Bob").with_education("S2"),
            NewUser::new("Carol").with_address("Bandung"),
            NewUser::new("Dave")
                .with_address("Jakarta")
                .with_education("S1"),
        ];
        for user in &users {
            insert_user(service.pool(), user).await.unwrap();
        }
        service
    }

    async fn list(service: &SqliteService, filter: &Filter) -> Vec<ListUserRow> {
        list_users(
            service.pool(),
            &BaseQueries::default(),
            &FilterCompiler::default(),
            filter,
        )
        .await
        .unwrap()
    }

    fn names(rows: &[ListUserRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    fn by_name() -> Sort {
        Sort::new("name", SortOrder::Asc)
    }

    #[tokio::test]
    async fn test_insert_user() {
        let service = SqliteService::in_memory().await.unwrap();
        let user = insert_user(
            service.pool(),
            &NewUser::new("Alice").with_address("Jakarta"),
        )
        .await
        .unwrap();

        assert!(!user.id.is_empty());
        assert_eq!(user.name, "Alice");
        assert_eq!(user.address.as_deref(), Some("Jakarta"));
        assert!(user.education.is_none());
        assert_eq!(count_users(service.pool()).await.unwrap(), 1);

        let stored: (String, Option<String>) =
            sqlx::query_as("SELECT name, address FROM users WHERE id = ?")
                .bind(&user.id)
                .fetch_one(service.pool())
                .await
                .unwrap();
        assert_eq!(stored, ("Alice".to_string(), Some("Jakarta".to_string())));
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_no_row() {
        let service = SqliteService::in_memory().await.unwrap();

        let err = insert_user(service.pool(), &NewUser::new("")).await.unwrap_err();
        assert!(matches!(err, SqliteError::Database(_)));

        let err = insert_user(service.pool(), &NewUser::new("x".repeat(201)))
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteError::Database(_)));

        assert_eq!(count_users(service.pool()).await.unwrap(), 0);

        // Pool is still usable after the rollback
        insert_user(service.pool(), &NewUser::new("Alice")).await.unwrap();
        assert_eq!(count_users(service.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_without_filter() {
        let service = seeded().await;
        let rows = list(&service, &Filter::new()).await;

        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.filter_count == 4));
    }

    #[tokio::test]
    async fn test_list_equal() {
        let service = seeded().await;
        let rows = list(
            &service,
            &Filter::new().with_field(FilterField::equal("name", "Alice")),
        )
        .await;

        assert_eq!(
            rows,
            vec![ListUserRow {
                name: "Alice".to_string(),
                address: Some("Jakarta".to_string()),
                education: Some("S1".to_string()),
                filter_count: 1,
            }]
        );
    }

    #[tokio::test]
    async fn test_list_not_and_in() {
        let service = seeded().await;
        let filter = Filter::new()
            .with_field(
                FilterField::new("education", Operator::In, FilterValue::list(["S1", "S2"]))
                    .unwrap(),
            )
            .with_field(FilterField::not("name", "Dave"))
            .with_sort(by_name());

        let rows = list(&service, &filter).await;
        assert_eq!(names(&rows), vec!["Alice", "Bob"]);
        assert!(rows.iter().all(|r| r.filter_count == 2));
    }

    #[tokio::test]
    async fn test_list_empty_in_matches_nothing() {
        let service = seeded().await;
        let filter = Filter::new().with_field(
            FilterField::new("name", Operator::In, FilterValue::List(vec![])).unwrap(),
        );

        assert!(list(&service, &filter).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_or() {
        let service = seeded().await;
        let filter = Filter::new()
            .with_field(
                FilterField::new(
                    "address,education",
                    Operator::Or,
                    FilterValue::pair("Bandung", "S2"),
                )
                .unwrap(),
            )
            .with_sort(by_name());

        assert_eq!(names(&list(&service, &filter).await), vec!["Bob", "Carol"]);
    }

    #[tokio::test]
    async fn test_list_range() {
        let service = seeded().await;
        let filter = Filter::new()
            .with_field(
                FilterField::new("name", Operator::Range, FilterValue::pair("B", "Cz")).unwrap(),
            )
            .with_sort(by_name());

        assert_eq!(names(&list(&service, &filter).await), vec!["Bob", "Carol"]);
    }

    #[tokio::test]
    async fn test_list_is_null() {
        let service = seeded().await;

        let filter = Filter::new().with_field(FilterField::is_null("address", true));
        assert_eq!(names(&list(&service, &filter).await), vec!["Bob"]);

        let filter = Filter::new()
            .with_field(FilterField::is_null("education", false))
            .with_sort(by_name());
        assert_eq!(
            names(&list(&service, &filter).await),
            vec!["Alice", "Bob", "Dave"]
        );
    }

    #[tokio::test]
    async fn test_list_sort_desc() {
        let service = seeded().await;
        let filter = Filter::new().with_sort(Sort::new("name", SortOrder::Desc));

        assert_eq!(
            names(&list(&service, &filter).await),
            vec!["Dave", "Carol", "Bob", "Alice"]
        );
    }

    #[tokio::test]
    async fn test_list_null_safe_sort() {
        let service = seeded().await;
        let filter = Filter::new()
            .with_sort(Sort::null_safe("address", SortOrder::Asc))
            .with_sort(Sort::null_safe("education", SortOrder::Asc));

        // Bob has no address and sorts by his education instead
        let rows = list(&service, &filter).await;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].name, "Carol");
        assert_eq!(rows[3].name, "Bob");
    }

    #[tokio::test]
    async fn test_list_parsed_null_safe_sort_runs() {
        let service = seeded().await;
        let filter = parse_filter(
            r#"{"sorts": [
                {"field": "address", "order": "desc", "condition": "ifnull"},
                {"field": "education", "condition": "ifnull"}
            ]}"#,
            columns::USER_FILTERABLE,
            columns::USER_SORTABLE,
        )
        .unwrap();

        let rows = list(&service, &filter).await;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].name, "Bob");
        assert_eq!(rows[3].name, "Carol");
    }

    #[tokio::test]
    async fn test_list_pagination_keeps_total_count() {
        let service = seeded().await;
        let filter = Filter::new().with_sort(by_name()).with_pagination(2, 3);

        let rows = list(&service, &filter).await;
        assert_eq!(names(&rows), vec!["Dave"]);
        assert_eq!(rows[0].filter_count, 4);
    }

    #[tokio::test]
    async fn test_list_native_value_types() {
        let service = seeded().await;

        let filter = Filter::new().with_field(FilterField::equal("name", SqlValue::Null));
        assert!(list(&service, &filter).await.is_empty());

        let filter = Filter::new().with_field(
            FilterField::new(
                "created_at",
                Operator::Range,
                FilterValue::pair(0i64, i64::MAX),
            )
            .unwrap(),
        );
        assert_eq!(list(&service, &filter).await.len(), 4);
    }

    #[tokio::test]
    async fn test_list_compile_error_runs_no_query() {
        let service = seeded().await;
        let compiler = FilterCompiler::new(CompilerConfig {
            max_page_size: 2,
            ..CompilerConfig::default()
        });

        let err = list_users(
            service.pool(),
            &BaseQueries::default(),
            &compiler,
            &Filter::new().with_pagination(1, 3),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            SqliteError::Filter(FilterError::PageSizeTooLarge {
                page_size: 3,
                max: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_list_unknown_column_is_database_error() {
        let service = seeded().await;
        let filter = Filter::new().with_field(FilterField::equal("age", 30i64));

        let err = list_users(
            service.pool(),
            &BaseQueries::default(),
            &FilterCompiler::default(),
            &filter,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SqliteError::Database(_)));
    }

    #[tokio::test]
    async fn test_list_missing_base_query() {
        let service = seeded().await;
        let err = list_users(
            service.pool(),
            &BaseQueries::empty(),
            &FilterCompiler::default(),
            &Filter::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SqliteError::UnknownQuery(_)));
    }
}
