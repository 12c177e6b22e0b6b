use pgquery::prelude::*;
use std::time::Duration;
use tokio_postgres::NoTls;

async fn try_connect() -> QueryResult<Option<tokio_postgres::Client>> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    let (client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;
    tokio::spawn(async move {
        let _ = connection.await;
    });
    Ok(Some(client))
}

async fn setup(client: &tokio_postgres::Client) -> QueryResult<()> {
    client
        .batch_execute(
            "CREATE TEMP TABLE users (
                 id BIGINT PRIMARY KEY,
                 name TEXT NOT NULL,
                 status TEXT NOT NULL,
                 age INT
             );
             CREATE TEMP TABLE posts (
                 id BIGINT PRIMARY KEY,
                 author_id BIGINT NOT NULL,
                 title TEXT NOT NULL
             );
             INSERT INTO users VALUES
                 (1, 'alice', 'active', 30),
                 (2, 'bob', 'pending', 17),
                 (3, 'carol', 'pending', 41);
             INSERT INTO posts VALUES
                 (10, 1, 'hello'),
                 (11, 1, 'again'),
                 (12, 3, 'first');",
        )
        .await?;
    Ok(())
}

fn db() -> Database {
    let schema = Schema::new()
        .table(
            TableSchema::new("users")
                .column(ColumnDescriptor::new("id", ScalarKind::Numeric).primary_key())
                .column(ColumnDescriptor::new("name", ScalarKind::Text))
                .column(ColumnDescriptor::new("status", ScalarKind::Text))
                .column(ColumnDescriptor::new("age", ScalarKind::Numeric).nullable()),
        )
        .table(
            TableSchema::new("posts")
                .column(ColumnDescriptor::new("id", ScalarKind::Numeric).primary_key())
                .column(ColumnDescriptor::new("author_id", ScalarKind::Numeric))
                .column(ColumnDescriptor::new("title", ScalarKind::Text)),
        );
    Database::with_config(
        schema,
        [Relation::new("posts", "author_id", "users", "id", Cardinality::OneToMany)],
        DatabaseConfig::new().timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

#[tokio::test]
async fn compiled_queries_run_against_postgres() -> QueryResult<()> {
    let Some(client) = try_connect().await? else {
        eprintln!("DATABASE_URL is not set; skipping compiled_queries_run_against_postgres");
        return Ok(());
    };
    setup(&client).await?;
    let db = db();

    let (mut q, c) = db.table("users")?;
    q.select(["name"])
        .and_where(c.or([
            c.eq("status", "active")?,
            c.and([c.eq("status", "pending")?, c.gt("age", 18)?]),
        ]))
        .order_by_asc("name");
    let rows = q.fetch_all(&client).await?;
    let names: Vec<String> = rows.iter().map(|r| r.get(0)).collect();
    assert_eq!(names, vec!["alice", "carol"]);

    assert_eq!(q.count(&client).await?, 2);

    let (mut joined, _) = db.table("users")?;
    joined
        .select(["users.name", "posts.title"])
        .inner_join("posts")?
        .order_by_asc("posts.id");
    let first = joined.fetch_one(&client).await?;
    assert_eq!(first.get::<_, String>(1), "hello");

    Ok(())
}

#[tokio::test]
async fn sub_query_parameters_bind_in_order() -> QueryResult<()> {
    let Some(client) = try_connect().await? else {
        eprintln!("DATABASE_URL is not set; skipping sub_query_parameters_bind_in_order");
        return Ok(());
    };
    setup(&client).await?;
    let db = db();

    let (mut pending, uc) = db.table("users")?;
    pending.select(["id"]).and_where(uc.eq("status", "pending")?);

    let (mut q, pc) = db.table("posts")?;
    q.with("pending_users", &pending)?
        .select(["title"])
        .and_where(pc.in_list("author_id", [1, 3])?)
        .order_by_asc("id");

    let rows = q.fetch_all(&client).await?;
    assert_eq!(rows.len(), 3);

    let (mut none, c) = db.table("users")?;
    none.and_where(c.in_list("id", Vec::<i64>::new())?);
    assert!(none.fetch_opt(&client).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn runs_inside_transaction() -> QueryResult<()> {
    let Some(mut client) = try_connect().await? else {
        eprintln!("DATABASE_URL is not set; skipping runs_inside_transaction");
        return Ok(());
    };
    setup(&client).await?;
    let db = db();

    let tx = client.transaction().await?;
    let (mut q, c) = db.table("users")?;
    q.and_where(c.eq("id", 2)?);
    let row = q.fetch_one(&tx).await?;
    assert_eq!(row.get::<_, String>("name"), "bob");
    tx.rollback().await?;

    Ok(())
}
