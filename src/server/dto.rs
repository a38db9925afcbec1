use serde::{Deserialize, Serialize};

use crate::service::activities::DEFAULT_MAX_SCORE;
use crate::service::scores::ScoreInput;
use crate::service::standings::{Standing, TeamStatistics};
use crate::types::{Activity, ImportSummary, NewActivity, Score, Team, User};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextParams {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub redirect: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

fn default_max_score() -> i64 {
    DEFAULT_MAX_SCORE
}

#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_max_score")]
    pub max_score: i64,
}

impl From<ActivityRequest> for NewActivity {
    fn from(req: ActivityRequest) -> Self {
        NewActivity {
            name: req.name,
            description: req.description,
            max_score: req.max_score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuickUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub activity_id: i64,
}

/// The activities page hosts two forms, told apart by `"form"`.
#[derive(Debug, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum ActivitiesForm {
    Activity(ActivityRequest),
    User(QuickUserRequest),
}

#[derive(Debug, Serialize)]
#[serde(tag = "created", rename_all = "lowercase")]
pub enum ActivitiesFormResponse {
    Activity(Activity),
    User(User),
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub team_id: i64,
    #[serde(default)]
    pub activity_id: Option<i64>,
    pub score: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<ScoreRequest> for ScoreInput {
    fn from(req: ScoreRequest) -> Self {
        ScoreInput {
            team_id: req.team_id,
            activity_id: req.activity_id,
            score: req.score,
            notes: req.notes,
        }
    }
}

/// Result of POST /teams: either a single team or an import summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamsFormResponse {
    Team(Team),
    Import(ImportSummary),
}

#[derive(Debug, Serialize)]
pub struct ResetScoresResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct IndexView {
    pub standings: Vec<Standing>,
    pub activities: Vec<Activity>,
    pub scores: Vec<Score>,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboardView {
    pub team_stats: Vec<TeamStatistics>,
    pub activities: Vec<Activity>,
    pub users: Vec<User>,
    pub teams: Vec<Team>,
}

#[derive(Debug, Serialize)]
pub struct UserDashboardView {
    pub standings: Vec<Standing>,
    pub activities: Vec<Activity>,
    pub my_scores: Vec<Score>,
}

#[derive(Debug, Serialize)]
pub struct ScoresView {
    pub scores: Vec<Score>,
    pub standings: Vec<Standing>,
    pub teams: Vec<Team>,
    /// Only the bound activity for locked users.
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize)]
pub struct EditScoreView {
    pub score: Score,
    pub teams: Vec<Team>,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize)]
pub struct ActivitiesView {
    pub activities: Vec<Activity>,
    pub users: Vec<User>,
}
