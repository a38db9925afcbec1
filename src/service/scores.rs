use super::validation::{optional_text, validate_score_value};
use crate::auth::policy;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{NewScore, Score, User};

/// A score as submitted. `activity_id` is ignored for locked users.
#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub team_id: i64,
    pub activity_id: Option<i64>,
    pub score: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreRules {
    /// Reject values above the activity's `max_score`.
    pub enforce_max_score: bool,
}

struct CheckedScore {
    team_id: i64,
    activity_id: i64,
    score: i64,
    notes: Option<String>,
}

fn check(store: &dyn Store, actor: &User, input: &ScoreInput, rules: ScoreRules) -> Result<CheckedScore> {
    let activity_id = policy::effective_activity(actor, input.activity_id)
        .ok_or_else(|| Error::Validation("Activity is required".to_string()))?;
    let score = validate_score_value(input.score)?;

    if store.get_team(input.team_id)?.is_none() {
        return Err(Error::Validation("Not a valid team".to_string()));
    }
    let activity = store
        .get_activity(activity_id)?
        .ok_or_else(|| Error::Validation("Not a valid activity".to_string()))?;

    if rules.enforce_max_score && score > activity.max_score {
        return Err(Error::Validation(format!(
            "Score cannot exceed {} for {}",
            activity.max_score, activity.name
        )));
    }

    Ok(CheckedScore {
        team_id: input.team_id,
        activity_id,
        score,
        notes: optional_text(input.notes.as_deref()),
    })
}

pub fn submit_score(
    store: &dyn Store,
    actor: &User,
    input: &ScoreInput,
    rules: ScoreRules,
) -> Result<Score> {
    let checked = check(store, actor, input, rules)?;

    let score = store.create_score(&NewScore {
        team_id: checked.team_id,
        activity_id: checked.activity_id,
        score: checked.score,
        notes: checked.notes,
        created_by: actor.id,
    })?;

    tracing::info!(
        "User '{}' scored {} for team {} in activity {}",
        actor.username,
        score.score,
        score.team_id,
        score.activity_id
    );
    Ok(score)
}

/// Fetches a score the actor is allowed to change.
pub fn owned_score(store: &dyn Store, actor: &User, id: i64) -> Result<Score> {
    let score = store.get_score(id)?.ok_or(Error::NotFound)?;
    policy::require_owner_or_admin(actor, &score)?;
    Ok(score)
}

pub fn edit_score(
    store: &dyn Store,
    actor: &User,
    id: i64,
    input: &ScoreInput,
    rules: ScoreRules,
) -> Result<Score> {
    let mut score = owned_score(store, actor, id)?;
    let checked = check(store, actor, input, rules)?;

    score.team_id = checked.team_id;
    score.activity_id = checked.activity_id;
    score.score = checked.score;
    score.notes = checked.notes;
    store.update_score(&score)?;

    Ok(score)
}

pub fn delete_score(store: &dyn Store, actor: &User, id: i64) -> Result<Score> {
    let score = owned_score(store, actor, id)?;
    store.delete_score(score.id)?;
    Ok(score)
}

/// Wipes every score. Teams, activities and users are untouched.
pub fn reset_scores(store: &dyn Store) -> Result<usize> {
    let deleted = store.delete_all_scores()?;
    tracing::info!("Reset scores: {deleted} deleted");
    Ok(deleted)
}
