use rusqlite::Connection;

use crate::error::Result;

/// Ordered schema migrations. Each entry is applied once, in order, and
/// recorded in `schema_version`.
pub const MIGRATIONS: &[(i64, &str)] = &[(1, V1_BASE), (2, V2_USER_ACTIVITY), (3, V3_SESSIONS)];

pub const LATEST_VERSION: i64 = 3;

const V1_BASE: &str = r#"
CREATE TABLE IF NOT EXISTS activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    max_score INTEGER NOT NULL DEFAULT 100,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2id hash with embedded salt
    role TEXT NOT NULL DEFAULT 'user', -- 'admin' or 'user'
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    image_filename TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Scores go away with their team or activity; they outlive their author.
CREATE TABLE IF NOT EXISTS scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    activity_id INTEGER NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
    score INTEGER NOT NULL,
    notes TEXT,
    created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_scores_team ON scores(team_id);
CREATE INDEX IF NOT EXISTS idx_scores_activity ON scores(activity_id);
CREATE INDEX IF NOT EXISTS idx_scores_created_by ON scores(created_by);
"#;

// Binds a user to one activity (the activity lock).
const V2_USER_ACTIVITY: &str = r#"
ALTER TABLE users ADD COLUMN activity_id INTEGER REFERENCES activities(id) ON DELETE SET NULL;
CREATE INDEX IF NOT EXISTS idx_users_activity ON users(activity_id);
"#;

const V3_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL UNIQUE,   -- sha256 of the cookie value
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT                    -- NULL = until logout
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
"#;

pub fn current_version(conn: &Connection) -> Result<i64> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;
    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}

/// Applies every migration newer than the recorded version, up to `target`.
/// Returns the version the database is at afterwards.
pub fn migrate_to(conn: &mut Connection, target: i64) -> Result<i64> {
    let mut version = current_version(conn)?;

    for (migration_version, sql) in MIGRATIONS {
        if *migration_version <= version || *migration_version > target {
            continue;
        }

        tracing::info!("Running schema migration v{migration_version}");
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration_version],
        )?;
        tx.commit()?;
        version = *migration_version;
    }

    Ok(version)
}
