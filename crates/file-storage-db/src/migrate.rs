use sqlx::PgPool;
use tracing::info;

/// Create or upgrade the `db_files` table.
///
/// Migrations are embedded from `migrations/` and tracked in `_sqlx_migrations`,
/// so running this against an up-to-date database is a no-op.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Applying db_files migrations");
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
    info!("db_files schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_embedded_migrations_define_db_files() {
        let migrator = sqlx::migrate!();
        assert!(migrator
            .iter()
            .any(|m| m.sql.contains("CREATE TABLE IF NOT EXISTS db_files")));
    }
}
