//! Runs against a real database when `DATABASE_URL` is set.
#![cfg(feature = "postgres")]

use fluentsql::{
    IdentStyle, PageContext, PostgresDialect, QueryError, QueryResult, StatementFactory, TableRegistry,
    UpsertSpec,
};
use serde_json::{Value, json};
use tokio_postgres::NoTls;

const SCHEMA: &str = r#"
-- session-scoped fixture
CREATE TEMP TABLE fluent_users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT,
    logins INT NOT NULL DEFAULT 0,
    metadata JSONB NOT NULL DEFAULT '{}'
);
CREATE TEMP TABLE fluent_notes (id BIGSERIAL PRIMARY KEY, body TEXT NOT NULL);
"#;

async fn connect() -> QueryResult<Option<StatementFactory<tokio_postgres::Client>>> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    let mut tables = TableRegistry::new(IdentStyle::DoubleQuote);
    tables
        .add_table("fluent_users", ["id", "username", "email", "logins", "metadata"])
        .add_table("fluent_notes", ["id", "body"]);
    let factory = StatementFactory::new(client, PostgresDialect, tables);
    factory.query().exec_raw(SCHEMA).await?;
    Ok(Some(factory))
}

async fn usernames(factory: &StatementFactory<tokio_postgres::Client>, filter: &str, needle: &str) -> QueryResult<Vec<String>> {
    let mut q = factory.query();
    q.select("username").from("fluent_users");
    match filter {
        "like" => q.where_like("username", needle),
        "starts" => q.where_starts("username", needle),
        _ => q.where_ends("username", needle),
    };
    q.order_by_asc("username");
    let rows = q.fetch_result().await?;
    rows.iter().map(|row| row.try_get("username")).collect()
}

#[tokio::test]
async fn statements_round_trip() -> QueryResult<()> {
    let Some(factory) = connect().await? else {
        eprintln!("DATABASE_URL is not set; skipping statements_round_trip");
        return Ok(());
    };

    let inserted = factory
        .query()
        .insert(
            "fluent_users",
            json!([
                {"username": "alice", "email": "alice@example.com", "logins": 1, "metadata": {"author": "A"}},
                {"username": "bob", "email": null, "logins": 4, "metadata": {}},
                {"username": "admin_user", "email": "root@example.com", "logins": 9, "metadata": {}},
                {"username": "test123", "email": null, "logins": 0, "metadata": {}},
            ]),
        )
        .await?;
    assert_eq!(inserted, 4);

    assert_eq!(usernames(&factory, "like", "ali").await?, vec!["alice"]);
    assert_eq!(usernames(&factory, "starts", "admin").await?, vec!["admin_user"]);
    assert_eq!(usernames(&factory, "ends", "123").await?, vec!["test123"]);

    // Null-safe equality matches NULL, plain `=` never does.
    let mut q = factory.query();
    q.select("username").from("fluent_users").and_where("email", "<=>", Value::Null)?;
    assert_eq!(q.fetch_result().await?.len(), 2);
    let mut q = factory.query();
    q.select("username").from("fluent_users").and_where("email", "=", Value::Null)?;
    assert!(q.fetch_result().await?.is_empty());

    // Upsert: one colliding row, one fresh row.
    let spec = UpsertSpec::set(["email", "logins"]).conflict(["username"]);
    let mut q = factory.query();
    q.insert_on_duplicate(
        "fluent_users",
        json!({"username": "bob", "email": "bob@example.com", "logins": 5}),
        &spec,
    )
    .await?;
    assert_eq!(q.row_count(), Some(1));
    factory
        .query()
        .insert_on_duplicate(
            "fluent_users",
            json!({"username": "carol", "email": "carol@example.com", "logins": 1}),
            &spec,
        )
        .await?;

    let mut q = factory.query();
    q.select("email, logins").from("fluent_users").and_where("username", "=", "bob")?;
    let bob = q.fetch_first().await?.ok_or_else(|| QueryError::usage("bob is missing"))?;
    assert_eq!(bob.get("email"), Some(&json!("bob@example.com")));
    assert_eq!(bob.get("logins"), Some(&json!(5)));

    // JSON set, then extract the same path.
    let mut expr = factory.query();
    expr.json_set("metadata", [("author", json!("Updated Author"))])?;
    let mut q = factory.query();
    q.update("fluent_users")
        .set_query("metadata", &expr)?
        .and_where("username", "=", "alice")?;
    assert_eq!(q.exec().await?, 1);

    let mut q = factory.query();
    q.select("")
        .json_extract("metadata", "$.author")
        .alias("author")
        .from("fluent_users")
        .and_where("username", "=", "alice")?;
    let row = q.fetch_first().await?.ok_or_else(|| QueryError::usage("alice is missing"))?;
    assert_eq!(row.get("author"), Some(&json!("Updated Author")));

    // A JSON null is stored as a value and keeps the rest of the document.
    let mut expr = factory.query();
    expr.json_set("metadata", [("editor", Value::Null)])?;
    let mut q = factory.query();
    q.update("fluent_users")
        .set_query("metadata", &expr)?
        .and_where("username", "=", "alice")?;
    assert_eq!(q.exec().await?, 1);

    let mut q = factory.query();
    q.select("metadata").from("fluent_users").and_where("username", "=", "alice")?;
    let row = q.fetch_first().await?.ok_or_else(|| QueryError::usage("alice is missing"))?;
    assert_eq!(row.get("metadata"), Some(&json!({"author": "Updated Author", "editor": null})));

    // Native RETURNING.
    let returned = factory
        .query()
        .insert_returning("fluent_notes", json!([{"body": "one"}, {"body": "two"}]), &["id", "body"], "id")
        .await?;
    assert_eq!(returned.len(), 2);
    assert_eq!(returned[1].get("body"), Some(&json!("two")));

    // Ten notes in total, five per page.
    let more: Vec<Value> = (0..8).map(|i| json!({"body": format!("note {i}")})).collect();
    factory.query().insert("fluent_notes", Value::Array(more)).await?;
    let mut q = factory.query();
    q.select("id, body").from("fluent_notes").order_by_asc("id");
    let page = q
        .simple_paginate(5, &PageContext::new("/notes"), "page")
        .await?;
    assert_eq!(page.total_rows, 10);
    assert_eq!(page.per_page, 5);
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.next_page_url.as_deref(), Some("/notes?page=2"));

    // Dollar placeholders through the raw passthrough.
    let mut q = factory.query();
    let row = q
        .row_pg(
            "SELECT COUNT(*) AS n FROM fluent_users WHERE logins >= $1 AND username <> $2",
            [json!(1), json!("carol")],
        )
        .await?
        .ok_or_else(|| QueryError::usage("count returned no row"))?;
    assert_eq!(row.get("n"), Some(&json!(3)));

    Ok(())
}

#[tokio::test]
async fn transaction_rolls_back_on_error() -> QueryResult<()> {
    let Some(factory) = connect().await? else {
        eprintln!("DATABASE_URL is not set; skipping transaction_rolls_back_on_error");
        return Ok(());
    };

    let result: QueryResult<()> = fluentsql::transaction!(factory, {
        factory.query().insert("fluent_notes", json!({"body": "kept?"})).await?;
        factory.query().insert("fluent_notes", json!({"id": null, "body": null})).await?;
        Ok::<_, QueryError>(())
    });
    assert!(result.unwrap_err().is_driver());

    let mut q = factory.query();
    q.select("id").from("fluent_notes");
    assert!(q.fetch_result().await?.is_empty());
    Ok(())
}
