//! Database schema definitions

/// SQL to create the records table.
///
/// `identifier` is the primary key; inserts that collide with an existing
/// row are skipped with `ON CONFLICT DO NOTHING` so a re-import never
/// touches an existing label.
pub const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    identifier TEXT PRIMARY KEY,
    label TEXT,
    last_modified TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_records_last_modified ON records(last_modified)",
];

/// Milliseconds a writer waits on a locked database before failing
pub const BUSY_TIMEOUT_MS: u64 = 5_000;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_RECORDS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
