mod schema;
mod sqlite;

pub use schema::LATEST_VERSION;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    /// Creates or upgrades the schema to the latest version.
    fn initialize(&self) -> Result<()>;
    fn schema_version(&self) -> Result<i64>;

    // User operations
    fn create_user(&self, user: &NewUser) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn update_user_role(&self, id: i64, role: Role) -> Result<()>;
    fn delete_user(&self, id: i64) -> Result<bool>;
    fn has_admin(&self) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_hash(&self, token_hash: &str) -> Result<Option<Session>>;
    fn delete_session_by_hash(&self, token_hash: &str) -> Result<bool>;
    fn delete_expired_sessions(&self) -> Result<usize>;

    // Team operations
    fn create_team(&self, name: &str, image_filename: Option<&str>) -> Result<Team>;
    fn get_team(&self, id: i64) -> Result<Option<Team>>;
    fn get_team_by_name(&self, name: &str) -> Result<Option<Team>>;
    fn list_teams(&self) -> Result<Vec<Team>>;
    fn update_team(&self, team: &Team) -> Result<()>;
    fn delete_team(&self, id: i64) -> Result<bool>;
    /// Inserts every name that does not already exist, in one transaction.
    fn import_teams(&self, names: &[String]) -> Result<ImportSummary>;

    // Activity operations
    fn create_activity(&self, activity: &NewActivity) -> Result<Activity>;
    fn get_activity(&self, id: i64) -> Result<Option<Activity>>;
    fn list_activities(&self) -> Result<Vec<Activity>>;
    fn update_activity(&self, activity: &Activity) -> Result<()>;
    fn delete_activity(&self, id: i64) -> Result<bool>;

    // Score operations
    fn create_score(&self, score: &NewScore) -> Result<Score>;
    fn get_score(&self, id: i64) -> Result<Option<Score>>;
    /// All scores, newest first.
    fn list_scores(&self) -> Result<Vec<Score>>;
    /// Scores created by one user, newest first.
    fn list_user_scores(&self, user_id: i64) -> Result<Vec<Score>>;
    fn update_score(&self, score: &Score) -> Result<()>;
    fn delete_score(&self, id: i64) -> Result<bool>;
    fn delete_all_scores(&self) -> Result<usize>;
}
