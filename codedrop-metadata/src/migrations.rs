use sqlx::PgPool;

/// Run database migrations, creating required tables if they do not exist.
///
/// Chunk rows carry a foreign key to their drop with `ON DELETE CASCADE`:
/// deleting a drop atomically removes its claims on every blob it
/// references. The unique constraint on `(drop_id, chunk_index)` enforces
/// chunk idempotence at the database layer, and the `chunk_hash` index
/// keeps reference-count queries off sequential scans.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    let create_drops = "CREATE TABLE IF NOT EXISTS drops (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            file_name TEXT NOT NULL,
            file_size BIGINT NOT NULL,
            encryption_salt TEXT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            max_downloads INTEGER NOT NULL
        )";

    let create_chunks = "CREATE TABLE IF NOT EXISTS chunks (
            id BIGSERIAL PRIMARY KEY,
            drop_id UUID NOT NULL REFERENCES drops(id) ON DELETE CASCADE,
            chunk_index INTEGER NOT NULL,
            chunk_hash TEXT NOT NULL,
            size BIGINT NOT NULL,
            UNIQUE (drop_id, chunk_index)
        )";

    let create_hash_index =
        "CREATE INDEX IF NOT EXISTS idx_chunks_chunk_hash ON chunks (chunk_hash)";

    let create_expiry_index =
        "CREATE INDEX IF NOT EXISTS idx_drops_expires_at ON drops (expires_at)";

    sqlx::query(create_drops).execute(pool).await?;
    sqlx::query(create_chunks).execute(pool).await?;
    sqlx::query(create_hash_index).execute(pool).await?;
    sqlx::query(create_expiry_index).execute(pool).await?;

    Ok(())
}
