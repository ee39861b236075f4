use config::shared::PgConnectionConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Connects to the destination database with a bounded connection pool.
pub async fn connect_to_database(
    config: &PgConnectionConfig,
    min_connections: u32,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let options = config.with_db();

    let pool = PgPoolOptions::new()
        .min_connections(min_connections)
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}
