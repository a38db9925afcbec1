use bytes::Bytes;

use super::import::{check_csv_filename, parse_team_names};
use super::validation::validate_team_name;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{ImportSummary, Team};
use crate::uploads::{ImageStorage, check_image};

/// An image file taken from a multipart upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Bytes,
}

fn ensure_name_free(store: &dyn Store, name: &str, except: Option<i64>) -> Result<()> {
    match store.get_team_by_name(name)? {
        Some(existing) if Some(existing.id) != except => {
            Err(Error::DuplicateTeam(name.to_string()))
        }
        _ => Ok(()),
    }
}

async fn save_image(images: &ImageStorage, image: Option<&ImageUpload>) -> Result<Option<String>> {
    let Some(image) = image else {
        return Ok(None);
    };
    check_image(&image.filename, image.data.len())?;
    Ok(Some(images.save(&image.filename, &image.data).await?))
}

/// The image is written before the row; a failed insert removes it again.
pub async fn create_team(
    store: &dyn Store,
    images: &ImageStorage,
    name: &str,
    image: Option<&ImageUpload>,
) -> Result<Team> {
    let name = validate_team_name(name)?;
    ensure_name_free(store, &name, None)?;

    let filename = save_image(images, image).await?;

    match store.create_team(&name, filename.as_deref()) {
        Ok(team) => {
            tracing::info!("Created team '{}'", team.name);
            Ok(team)
        }
        Err(e) => {
            if let Some(filename) = &filename {
                images.discard(filename).await;
            }
            Err(e)
        }
    }
}

/// Renames a team and optionally replaces its image. The old image is only
/// removed once the row points at the new one.
pub async fn edit_team(
    store: &dyn Store,
    images: &ImageStorage,
    id: i64,
    name: &str,
    image: Option<&ImageUpload>,
) -> Result<Team> {
    let mut team = store.get_team(id)?.ok_or(Error::NotFound)?;
    let name = validate_team_name(name)?;
    ensure_name_free(store, &name, Some(team.id))?;

    let new_filename = save_image(images, image).await?;
    let old_filename = team.image_filename.clone();

    team.name = name;
    if new_filename.is_some() {
        team.image_filename.clone_from(&new_filename);
    }

    if let Err(e) = store.update_team(&team) {
        if let Some(filename) = &new_filename {
            images.discard(filename).await;
        }
        return Err(e);
    }

    if let (Some(_), Some(old)) = (&new_filename, &old_filename) {
        images.discard(old).await;
    }

    Ok(team)
}

/// Deletes the team and its scores, then its image file if it had one.
pub async fn delete_team(store: &dyn Store, images: &ImageStorage, id: i64) -> Result<Team> {
    let team = store.get_team(id)?.ok_or(Error::NotFound)?;
    store.delete_team(team.id)?;

    if let Some(filename) = &team.image_filename {
        images.discard(filename).await;
    }

    tracing::info!("Deleted team '{}'", team.name);
    Ok(team)
}

/// Imports a roster CSV. Nothing is written unless the whole file parses.
pub fn bulk_import_teams(store: &dyn Store, filename: &str, data: &[u8]) -> Result<ImportSummary> {
    check_csv_filename(filename)?;

    let names = parse_team_names(data)?
        .iter()
        .map(|name| validate_team_name(name))
        .collect::<Result<Vec<_>>>()?;

    let summary = store.import_teams(&names)?;
    tracing::info!(
        "Imported teams from {filename}: {} created, {} skipped",
        summary.created,
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::TestEnv;

    fn png(name: &str) -> ImageUpload {
        ImageUpload {
            filename: name.to_string(),
            data: Bytes::from_static(b"\x89PNG fake"),
        }
    }

    #[tokio::test]
    async fn test_create_team_with_image() {
        let env = TestEnv::new();
        let team = create_team(env.store(), &env.images, "Alpha", Some(&png("logo.png")))
            .await
            .unwrap();

        let filename = team.image_filename.clone().unwrap();
        assert!(filename.starts_with("logo_"));
        assert!(env.images.exists(&filename).await.unwrap());
        assert_eq!(env.store().get_team(team.id).unwrap().unwrap(), team);
    }

    #[tokio::test]
    async fn test_create_team_rejects_blank_and_duplicate() {
        let env = TestEnv::new();
        create_team(env.store(), &env.images, "Alpha", None).await.unwrap();

        assert!(matches!(
            create_team(env.store(), &env.images, "   ", None).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            create_team(env.store(), &env.images, " Alpha ", Some(&png("a.png"))).await,
            Err(Error::DuplicateTeam(_))
        ));

        // The duplicate was caught before the image was written.
        assert!(!env.images.base_path().exists());
    }

    #[tokio::test]
    async fn test_create_team_rejects_bad_extension() {
        let env = TestEnv::new();
        assert!(matches!(
            create_team(env.store(), &env.images, "Alpha", Some(&png("logo.svg"))).await,
            Err(Error::Validation(_))
        ));
        assert!(env.store().list_teams().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_team_replaces_image() {
        let env = TestEnv::new();
        let team = create_team(env.store(), &env.images, "Alpha", Some(&png("old.png")))
            .await
            .unwrap();
        let old = team.image_filename.clone().unwrap();

        let edited = edit_team(env.store(), &env.images, team.id, "Alpha Prime", Some(&png("new.png")))
            .await
            .unwrap();
        let new = edited.image_filename.clone().unwrap();

        assert_eq!(edited.name, "Alpha Prime");
        assert_ne!(old, new);
        assert!(!env.images.exists(&old).await.unwrap());
        assert!(env.images.exists(&new).await.unwrap());
    }

    #[tokio::test]
    async fn test_edit_team_keeps_image_without_upload() {
        let env = TestEnv::new();
        let team = create_team(env.store(), &env.images, "Alpha", Some(&png("logo.png")))
            .await
            .unwrap();

        let edited = edit_team(env.store(), &env.images, team.id, "Alpha", None)
            .await
            .unwrap();
        assert_eq!(edited.image_filename, team.image_filename);
    }

    #[tokio::test]
    async fn test_edit_team_name_conflict() {
        let env = TestEnv::new();
        create_team(env.store(), &env.images, "Alpha", None).await.unwrap();
        let beta = create_team(env.store(), &env.images, "Beta", None).await.unwrap();

        assert!(matches!(
            edit_team(env.store(), &env.images, beta.id, "Alpha", None).await,
            Err(Error::DuplicateTeam(_))
        ));
        assert!(matches!(
            edit_team(env.store(), &env.images, 999, "Gamma", None).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_team_removes_image() {
        let env = TestEnv::new();
        let team = create_team(env.store(), &env.images, "Alpha", Some(&png("logo.png")))
            .await
            .unwrap();
        let filename = team.image_filename.clone().unwrap();

        delete_team(env.store(), &env.images, team.id).await.unwrap();

        assert!(env.store().get_team(team.id).unwrap().is_none());
        assert!(!env.images.exists(&filename).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_team_without_image_touches_no_files() {
        let env = TestEnv::new();
        let team = create_team(env.store(), &env.images, "Alpha", None).await.unwrap();

        delete_team(env.store(), &env.images, team.id).await.unwrap();

        assert!(!env.images.base_path().exists());
    }

    #[tokio::test]
    async fn test_bulk_import_counts_created_and_skipped() {
        let env = TestEnv::new();
        create_team(env.store(), &env.images, "Alpha", None).await.unwrap();

        let summary =
            bulk_import_teams(env.store(), "teams.csv", b"Team Name\nAlpha\nBeta\n\nGamma\n").unwrap();
        assert_eq!(summary, ImportSummary { created: 2, skipped: 1 });

        let names: Vec<String> = env
            .store()
            .list_teams()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_bulk_import_is_all_or_nothing() {
        let env = TestEnv::new();

        let result = bulk_import_teams(
            env.store(),
            "teams.csv",
            b"Team Name,Captain\nAlpha,Ann\nBeta,Bo\nGamma\n",
        );
        assert!(matches!(result, Err(Error::Csv(_))));
        assert!(env.store().list_teams().unwrap().is_empty());
    }

    #[test]
    fn test_bulk_import_requires_csv_extension() {
        let env = TestEnv::new();
        assert!(matches!(
            bulk_import_teams(env.store(), "teams.xlsx", b"Team Name\nAlpha\n"),
            Err(Error::Validation(_))
        ));
    }
}
