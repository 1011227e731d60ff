//! End-to-end statement flows through the public API.

mod common;

use common::{ScriptedDriver, row};
use fluentsql::{
    BuilderConfig, DefaultDialect, IdentStyle, PageContext, PostgresDialect, QueryError, QueryResult,
    StatementFactory, TableRegistry, UpsertSpec,
};
use serde_json::{Value, json};

fn registry(style: IdentStyle) -> TableRegistry {
    let mut tables = TableRegistry::with_prefix(style, "app_");
    tables
        .add_table("users", ["id", "username", "email", "logins"])
        .add_table("posts", ["id", "user_id", "title"]);
    tables
}

fn postgres(driver: ScriptedDriver) -> StatementFactory<ScriptedDriver> {
    StatementFactory::new(driver, PostgresDialect, registry(IdentStyle::DoubleQuote))
}

fn default_dialect(driver: ScriptedDriver) -> StatementFactory<ScriptedDriver> {
    StatementFactory::new(driver, DefaultDialect, registry(IdentStyle::Backtick))
}

#[test]
fn registry_renders_prefixed_columns() -> QueryResult<()> {
    let pg = postgres(ScriptedDriver::new());
    let tables = pg.tables();
    assert_eq!(tables.table("users")?, "app_users");
    assert_eq!(
        tables.pick_table("users", ["email", "id", "nope"])?,
        r#""app_users"."email", "app_users"."id""#
    );
    assert_eq!(
        tables.except_table("users", ["email"])?,
        r#""app_users"."id", "app_users"."username", "app_users"."logins""#
    );
    assert!(tables.table("comments").unwrap_err().is_configuration());

    let my = default_dialect(ScriptedDriver::new());
    assert_eq!(my.tables().column("posts", "title")?, "app_posts.`title`");
    Ok(())
}

#[tokio::test]
async fn builds_a_joined_select_from_registry_names() -> QueryResult<()> {
    let f = postgres(ScriptedDriver::new().returning(vec![row(json!({"username": "alice", "title": "hi"}))]));
    let tables = f.tables();
    let users = tables.table("users")?;
    let posts = tables.table("posts")?;
    let columns = tables.pick([("users", vec!["username"]), ("posts", vec!["title"])])?;

    let mut q = f.query();
    q.select(&columns)
        .from(&users)
        .join(
            &posts,
            &tables.column("posts", "user_id")?,
            "=",
            &tables.column("users", "id")?,
        )?
        .and_where(&tables.column("users", "email")?, "<=>", Value::Null)?
        .order_by_asc(&tables.column("posts", "title")?);

    assert_eq!(
        q.sql(),
        r#"SELECT "app_users"."username", "app_posts"."title" FROM app_users INNER JOIN app_posts ON "app_posts"."user_id" = "app_users"."id" WHERE "app_users"."email" IS NOT DISTINCT FROM ? ORDER BY "app_posts"."title" ASC"#
    );

    let rows = q.fetch_result().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("title"), Some(&json!("hi")));
    assert_eq!(q.row_count(), Some(1));
    assert_eq!(f.driver().log()[0].1, vec![Value::Null]);
    Ok(())
}

#[tokio::test]
async fn upsert_chunks_and_sums_counts() -> QueryResult<()> {
    let affected = vec![row(json!({})); 50];
    let driver = ScriptedDriver::new()
        .returning(affected.clone())
        .returning(affected.clone())
        .returning(affected);
    let f = StatementFactory::with_config(
        driver,
        PostgresDialect,
        registry(IdentStyle::DoubleQuote),
        BuilderConfig::new().chunk_size(50),
    );

    let rows: Vec<Value> = (0..150)
        .map(|i| json!({"email": format!("u{i}@example.com"), "logins": i, "username": format!("u{i}")}))
        .collect();
    let spec = UpsertSpec::set(["email", "logins"]).conflict(["username"]);

    let mut q = f.query();
    let total = q.insert_on_duplicate("app_users", Value::Array(rows), &spec).await?;
    assert_eq!(total, 150);
    assert_eq!(q.row_count(), Some(150));

    let log = f.driver().log();
    assert_eq!(log.len(), 3);
    assert!(log.iter().all(|(_, params)| params.len() == 150));
    assert!(log[0].0.starts_with(r#"INSERT INTO app_users ("email","logins","username") VALUES (?,?,?),(?,?,?)"#));
    assert!(log[0].0.ends_with(
        r#" ON CONFLICT ("username") DO UPDATE SET "email" = EXCLUDED."email", "logins" = EXCLUDED."logins""#
    ));
    Ok(())
}

#[tokio::test]
async fn upsert_without_target_fails_before_the_driver() {
    let f = postgres(ScriptedDriver::new());
    let err = f
        .query()
        .insert_on_duplicate("app_users", json!({"username": "a"}), &UpsertSpec::set(["username"]))
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(f.driver().log().is_empty());
}

async fn rename_user(factory: &StatementFactory<ScriptedDriver>) -> QueryResult<u64> {
    fluentsql::transaction!(factory, {
        let mut q = factory.query();
        q.update("app_users").set("username", "bob").and_where("id", "=", 1)?;
        let updated = q.exec().await?;
        Ok::<_, QueryError>(updated)
    })
}

#[tokio::test]
async fn transaction_commits_after_the_body() -> QueryResult<()> {
    let f = default_dialect(
        ScriptedDriver::new()
            .returning(Vec::new())
            .returning(vec![row(json!({}))]),
    );
    assert_eq!(rename_user(&f).await?, 1);
    assert_eq!(
        f.driver().sql_log(),
        vec!["BEGIN", "UPDATE app_users SET username = ? WHERE id = ?", "COMMIT"]
    );
    Ok(())
}

#[tokio::test]
async fn transaction_rolls_back_driver_failures() {
    let f = default_dialect(
        ScriptedDriver::new()
            .returning(Vec::new())
            .failing("duplicate key value"),
    );
    let err = rename_user(&f).await.unwrap_err();
    assert!(err.is_driver());
    assert_eq!(err.to_string(), "Driver error: duplicate key value");
    assert_eq!(
        f.driver().sql_log(),
        vec!["BEGIN", "UPDATE app_users SET username = ? WHERE id = ?", "ROLLBACK"]
    );
}

#[tokio::test]
async fn simple_paginate_serializes_a_page() -> QueryResult<()> {
    let data: Vec<_> = (6..=10)
        .map(|i| row(json!({"id": i, "username": format!("user{i}")})))
        .collect();
    let driver = ScriptedDriver::new()
        .returning(vec![row(json!({"total": "12"}))])
        .returning(data);
    let f = default_dialect(driver);

    let mut q = f.query();
    q.select("id, username")
        .from("app_users")
        .and_where("logins", ">", 0)?;
    let ctx = PageContext::parse("/users?page=2&sort=id");
    let page = q.simple_paginate(5, &ctx, "page").await?;

    let page = serde_json::to_value(&page).map_err(|e| QueryError::decode("page", e.to_string()))?;
    assert_eq!(page["current_page"], json!(2));
    assert_eq!(page["per_page"], json!(5));
    assert_eq!(page["total_rows"], json!(12));
    assert_eq!(page["total_pages"], json!(3));
    assert_eq!(page["from"], json!(6));
    assert_eq!(page["to"], json!(10));
    assert_eq!(page["prev_page_url"], json!("/users?page=1&sort=id"));
    assert_eq!(page["next_page_url"], json!("/users?page=3&sort=id"));
    assert_eq!(page["data"][0], json!({"id": 6, "username": "user6"}));
    assert_eq!(page["link_window"].as_array().map(Vec::len), Some(3));

    let log = f.driver().log();
    assert_eq!(log[0].1, vec![json!(0)]);
    assert_eq!(log[1].1, vec![json!(0), json!(5), json!(5)]);
    Ok(())
}

#[tokio::test]
async fn driver_errors_pass_through_unchanged() {
    let f = postgres(ScriptedDriver::new().failing("relation \"app_users\" does not exist"));
    let mut q = f.query();
    q.select("*").from("app_users");
    let err = q.fetch_first().await.unwrap_err();
    assert!(matches!(err, QueryError::Driver(_)));
    assert_eq!(q.row_count(), None);
}

#[tokio::test]
async fn missing_row_is_none() -> QueryResult<()> {
    let f = postgres(ScriptedDriver::new());
    let mut q = f.query();
    q.select("*").from("app_users").and_where("id", "=", 404)?;
    assert!(q.fetch_first().await?.is_none());
    Ok(())
}
