use diesel::sql_query;
use diesel_async::pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager};
use diesel_async::RunQueryDsl;
use diesel_async::{AsyncConnection, AsyncPgConnection};

pub type PgPool = Pool<AsyncPgConnection>;

/******************************************/
// Establishing Db Connection
/******************************************/
pub async fn establish_connection(database_url: &str) -> PgPool {
    let manager =
        AsyncDieselConnectionManager::<diesel_async::AsyncPgConnection>::new(database_url);

    Pool::builder(manager)
        .max_size(16)
        .build()
        .expect("Failed to create pool")
}

/******************************************/
// Creating a fresh db for tests
/******************************************/
pub async fn create_database(database_name: &str, maintenance_db_url: &str) {
    let mut connection = AsyncPgConnection::establish(maintenance_db_url)
        .await
        .expect("Failed to connect to Postgres");

    let create_db_query = format!(r#"CREATE DATABASE "{}";"#, database_name);
    sql_query(&create_db_query)
        .execute(&mut connection)
        .await
        .expect("Failed to create database");
}

/******************************************/
// Dropping test dbs
/******************************************/
pub async fn drop_database(database_name: &str, maintenance_db_url: &str) {
    let mut connection = AsyncPgConnection::establish(maintenance_db_url)
        .await
        .expect("Failed to connect to the maintenance database");

    // Lingering pool connections block the drop, terminate them first
    let terminate_query = format!(
        r#"
        SELECT pg_terminate_backend(pid)
        FROM pg_stat_activity
        WHERE datname = '{}';
    "#,
        database_name
    );

    if let Err(e) = sql_query(&terminate_query).execute(&mut connection).await {
        eprintln!("Failed to terminate connections: {}", e);
        return;
    }

    let drop_query = format!(r#"DROP DATABASE IF EXISTS "{}";"#, database_name);

    if let Err(e) = sql_query(&drop_query).execute(&mut connection).await {
        eprintln!("Failed to drop database: {}", e);
    }
}
