use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::{self, LATEST_VERSION};
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, activity_id, created_at";
const TEAM_COLUMNS: &str = "id, name, image_filename, created_at";
const ACTIVITY_COLUMNS: &str = "id, name, description, max_score, created_at";
const SCORE_COLUMNS: &str = "id, team_id, activity_id, score, notes, created_by, created_at";
const SESSION_COLUMNS: &str = "id, token_hash, user_id, created_at, expires_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    /// Migrates up to (and including) `target`. Used to build databases at
    /// older schema versions and to upgrade them explicitly.
    pub fn migrate_to(&self, target: i64) -> Result<i64> {
        let mut conn = self.conn();
        schema::migrate_to(&mut conn, target)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_role(s: &str) -> Role {
    s.parse().unwrap_or_else(|e| {
        tracing::error!("Invalid role in database: {e}");
        Role::User
    })
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: parse_role(&row.get::<_, String>(4)?),
        activity_id: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        image_filename: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        max_score: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<Score> {
    Ok(Score {
        id: row.get(0)?,
        team_id: row.get(1)?,
        activity_id: row.get(2)?,
        score: row.get(3)?,
        notes: row.get(4)?,
        created_by: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        user_id: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        expires_at: row.get::<_, Option<String>>(4)?.map(|s| parse_datetime(&s)),
    })
}

impl SqliteStore {
    fn query_one<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        let conn = self.conn();
        conn.query_row(sql, params, map)
            .optional()
            .map_err(Error::from)
    }

    fn query_all<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let version = self.migrate_to(LATEST_VERSION)?;
        tracing::debug!("Database schema at version {version}");
        Ok(())
    }

    fn schema_version(&self) -> Result<i64> {
        schema::current_version(&self.conn())
    }

    // User operations

    fn create_user(&self, user: &NewUser) -> Result<User> {
        let now = Utc::now();
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO users (username, email, password_hash, role, activity_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.activity_id,
                format_datetime(&now),
            ],
        );

        match result {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                username: user.username.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role,
                activity_id: user.activity_id,
                created_at: now,
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::Conflict(
                "username or email already exists".to_string(),
            )),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.query_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.query_all(
            &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"),
            [],
            user_from_row,
        )
    }

    fn update_user_role(&self, id: i64, role: Role) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn has_admin(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (id, token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id,
                session.token_hash,
                session.user_id,
                format_datetime(&session.created_at),
                session.expires_at.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn get_session_by_hash(&self, token_hash: &str) -> Result<Option<Session>> {
        self.query_one(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE token_hash = ?1"),
            params![token_hash],
            session_from_row,
        )
    }

    fn delete_session_by_hash(&self, token_hash: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![token_hash],
        )?;
        Ok(rows > 0)
    }

    fn delete_expired_sessions(&self) -> Result<usize> {
        let expired: Vec<String> = self
            .query_all(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE expires_at IS NOT NULL"),
                [],
                session_from_row,
            )?
            .into_iter()
            .filter(|s| s.expires_at.is_some_and(|at| at < Utc::now()))
            .map(|s| s.id)
            .collect();

        let conn = self.conn();
        let mut removed = 0;
        for id in expired {
            removed += conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        }
        Ok(removed)
    }

    // Team operations

    fn create_team(&self, name: &str, image_filename: Option<&str>) -> Result<Team> {
        let now = Utc::now();
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO teams (name, image_filename, created_at) VALUES (?1, ?2, ?3)",
            params![name, image_filename, format_datetime(&now)],
        );

        match result {
            Ok(_) => Ok(Team {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                image_filename: image_filename.map(str::to_string),
                created_at: now,
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateTeam(name.to_string())),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_team(&self, id: i64) -> Result<Option<Team>> {
        self.query_one(
            &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
            params![id],
            team_from_row,
        )
    }

    fn get_team_by_name(&self, name: &str) -> Result<Option<Team>> {
        self.query_one(
            &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE name = ?1"),
            params![name],
            team_from_row,
        )
    }

    fn list_teams(&self) -> Result<Vec<Team>> {
        self.query_all(
            &format!("SELECT {TEAM_COLUMNS} FROM teams ORDER BY id"),
            [],
            team_from_row,
        )
    }

    fn update_team(&self, team: &Team) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE teams SET name = ?1, image_filename = ?2 WHERE id = ?3",
            params![team.name, team.image_filename, team.id],
        );

        match result {
            Ok(0) => Err(Error::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateTeam(team.name.clone())),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_team(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM teams WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn import_teams(&self, names: &[String]) -> Result<ImportSummary> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut summary = ImportSummary::default();
        let now = format_datetime(&Utc::now());

        for name in names {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM teams WHERE name = ?1)",
                params![name],
                |row| row.get(0),
            )?;

            if exists {
                summary.skipped += 1;
                continue;
            }

            tx.execute(
                "INSERT INTO teams (name, created_at) VALUES (?1, ?2)",
                params![name, now],
            )?;
            summary.created += 1;
        }

        tx.commit()?;
        Ok(summary)
    }

    // Activity operations

    fn create_activity(&self, activity: &NewActivity) -> Result<Activity> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO activities (name, description, max_score, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                activity.name,
                activity.description,
                activity.max_score,
                format_datetime(&now),
            ],
        )?;

        Ok(Activity {
            id: conn.last_insert_rowid(),
            name: activity.name.clone(),
            description: activity.description.clone(),
            max_score: activity.max_score,
            created_at: now,
        })
    }

    fn get_activity(&self, id: i64) -> Result<Option<Activity>> {
        self.query_one(
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1"),
            params![id],
            activity_from_row,
        )
    }

    fn list_activities(&self) -> Result<Vec<Activity>> {
        self.query_all(
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities ORDER BY id"),
            [],
            activity_from_row,
        )
    }

    fn update_activity(&self, activity: &Activity) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE activities SET name = ?1, description = ?2, max_score = ?3 WHERE id = ?4",
            params![
                activity.name,
                activity.description,
                activity.max_score,
                activity.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_activity(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM activities WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Score operations

    fn create_score(&self, score: &NewScore) -> Result<Score> {
        let now = Utc::now();
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO scores (team_id, activity_id, score, notes, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                score.team_id,
                score.activity_id,
                score.score,
                score.notes,
                score.created_by,
                format_datetime(&now),
            ],
        );

        match result {
            Ok(_) => Ok(Score {
                id: conn.last_insert_rowid(),
                team_id: score.team_id,
                activity_id: score.activity_id,
                score: score.score,
                notes: score.notes.clone(),
                created_by: Some(score.created_by),
                created_at: now,
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::Validation(
                "Score must reference an existing team and activity".to_string(),
            )),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_score(&self, id: i64) -> Result<Option<Score>> {
        self.query_one(
            &format!("SELECT {SCORE_COLUMNS} FROM scores WHERE id = ?1"),
            params![id],
            score_from_row,
        )
    }

    fn list_scores(&self) -> Result<Vec<Score>> {
        self.query_all(
            &format!("SELECT {SCORE_COLUMNS} FROM scores ORDER BY id DESC"),
            [],
            score_from_row,
        )
    }

    fn list_user_scores(&self, user_id: i64) -> Result<Vec<Score>> {
        self.query_all(
            &format!("SELECT {SCORE_COLUMNS} FROM scores WHERE created_by = ?1 ORDER BY id DESC"),
            params![user_id],
            score_from_row,
        )
    }

    fn update_score(&self, score: &Score) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE scores SET team_id = ?1, activity_id = ?2, score = ?3, notes = ?4 WHERE id = ?5",
            params![
                score.team_id,
                score.activity_id,
                score.score,
                score.notes,
                score.id
            ],
        );

        match result {
            Ok(0) => Err(Error::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::Validation(
                "Score must reference an existing team and activity".to_string(),
            )),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_score(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM scores WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_all_scores(&self) -> Result<usize> {
        let rows = self.conn().execute("DELETE FROM scores", [])?;
        Ok(rows)
    }
}
