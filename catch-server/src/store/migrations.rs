//! Database Migrations - PostgreSQL schema for the document store
//!
//! Player documents are stored whole as JSONB, one row per (collection, key).
//! Field names inside `body` are the camelCase player document fields.

/// SQL migration for the document table
pub const MIGRATION_V1: &str = r#"
-- ============================================================================
-- Catch Server Document Schema v1
-- ============================================================================

CREATE TABLE IF NOT EXISTS documents (
    collection  VARCHAR(64)  NOT NULL,
    key         VARCHAR(128) NOT NULL,
    body        JSONB        NOT NULL DEFAULT '{}'::jsonb,
    updated_at  TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
    PRIMARY KEY (collection, key)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents (collection);
"#;

/// Returns all migrations in order
pub fn get_migrations() -> Vec<(&'static str, &'static str)> {
    vec![("v1_documents", MIGRATION_V1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_named_and_ordered() {
        let migrations = get_migrations();
        assert_eq!(migrations[0].0, "v1_documents");
        assert!(migrations[0].1.contains("PRIMARY KEY (collection, key)"));
    }
}
