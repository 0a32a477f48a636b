use sqlx::PgPool;

/// Every `id` column is a BIGINT.
#[sqlx::test(migrations = "../../db/migrations")]
async fn all_primary_keys_are_bigint(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        assert_eq!(data_type, "bigint", "{table}.id should be bigint");
    }
}

/// Unique constraints carry the `uq_` prefix the API maps to 409.
#[sqlx::test(migrations = "../../db/migrations")]
async fn unique_constraints_use_the_uq_prefix(pool: PgPool) {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT conname::TEXT FROM pg_constraint
         WHERE contype = 'u' AND connamespace = 'public'::regnamespace",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (name,) in &names {
        assert!(name.starts_with("uq_"), "constraint {name} should start with uq_");
    }
}
