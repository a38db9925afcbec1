use super::validation::{optional_text, validate_activity_name, validate_max_score};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Activity, NewActivity};

pub const DEFAULT_MAX_SCORE: i64 = 100;

fn normalize(input: &NewActivity) -> Result<NewActivity> {
    Ok(NewActivity {
        name: validate_activity_name(&input.name)?,
        description: optional_text(input.description.as_deref()),
        max_score: validate_max_score(input.max_score)?,
    })
}

pub fn create_activity(store: &dyn Store, input: &NewActivity) -> Result<Activity> {
    let activity = store.create_activity(&normalize(input)?)?;
    tracing::info!("Created activity '{}'", activity.name);
    Ok(activity)
}

pub fn edit_activity(store: &dyn Store, id: i64, input: &NewActivity) -> Result<Activity> {
    let mut activity = store.get_activity(id)?.ok_or(Error::NotFound)?;
    let input = normalize(input)?;

    activity.name = input.name;
    activity.description = input.description;
    activity.max_score = input.max_score;
    store.update_activity(&activity)?;

    Ok(activity)
}

/// Deletes an activity. Its scores go with it and users locked to it become
/// unlocked.
pub fn delete_activity(store: &dyn Store, id: i64) -> Result<Activity> {
    let activity = store.get_activity(id)?.ok_or(Error::NotFound)?;
    store.delete_activity(id)?;
    tracing::info!("Deleted activity '{}'", activity.name);
    Ok(activity)
}
