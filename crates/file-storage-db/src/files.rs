use crate::types::{CreateDbFileParams, DbFileRow, UpdateDbFileParams};

/// Get a stored file by its logical name
pub async fn get_by_name(
    executor: impl sqlx::PgExecutor<'_>,
    name: &str,
) -> Result<Option<DbFileRow>, sqlx::Error> {
    sqlx::query_as::<_, DbFileRow>(
        r#"
        SELECT uuid, name, owner, data, size, created, modified
        FROM db_files
        WHERE name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await
}

/// Insert a new stored file, returning the persisted row.
///
/// `created` doubles as the initial modification time. Fails with a unique
/// violation if the name is already taken.
pub async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    p: &CreateDbFileParams<'_>,
) -> Result<DbFileRow, sqlx::Error> {
    sqlx::query_as::<_, DbFileRow>(
        r#"
        INSERT INTO db_files (uuid, name, owner, data, size, created, modified)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING uuid, name, owner, data, size, created, modified
        "#,
    )
    .bind(p.uuid)
    .bind(p.name)
    .bind(p.owner)
    .bind(p.data)
    .bind(p.data.len() as i64)
    .bind(p.created)
    .fetch_one(executor)
    .await
}

/// Rewrite content, size and modification time. Returns the number of rows touched.
pub async fn update_content(
    executor: impl sqlx::PgExecutor<'_>,
    p: &UpdateDbFileParams<'_>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE db_files
        SET data = $2, size = $3, modified = $4
        WHERE uuid = $1
        "#,
    )
    .bind(p.uuid)
    .bind(p.data)
    .bind(p.data.len() as i64)
    .bind(p.modified)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Delete a stored file by UUID. Returns the number of rows touched.
pub async fn delete(executor: impl sqlx::PgExecutor<'_>, uuid: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM db_files WHERE uuid = $1")
        .bind(uuid)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
