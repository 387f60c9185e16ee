//! Mod submission: turns one JSON payload naming everything by
//! human-readable reference names into a fully-resolved creation and
//! persists it in a single transaction.

use axum::Json;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::db::{
    DifficultyWithChildren, MapCreation, MapDetailsCreation, MapLength, MapTechCreation,
    ModCreation, ModId, ModType, TechWithDifficulty, User,
};
use crate::difficulty_tree::{build_difficulty_tree, DifficultyInput, ParentDifficultyCreation};
use crate::error::AppError;
use crate::resolve::{
    resolve_canonical_difficulty, resolve_length, resolve_mod_difficulty, ModDifficultyClaim,
    ModDifficultyContext,
};
use crate::traits::Linkable;
use crate::{AppState, RequestBody};

#[derive(Deserialize)]
pub struct SubmitMod {
    #[serde(rename = "type")]
    pub mod_type: ModType,
    pub name: String,
    #[serde(flatten)]
    pub publisher: crate::db::PublisherQuery,
    #[serde(default)]
    pub content_warning: bool,
    pub notes: Option<String>,
    pub short_description: String,
    pub long_description: Option<String>,
    pub platform_mod_id: Option<i64>,
    /// Custom difficulty list in its nested wire shape. Absent means the mod
    /// uses the default set.
    pub difficulties: Option<Vec<DifficultyInput>>,
    pub maps: Vec<SubmitMap>,
}

/// One map inside a mod submission, or the payload of a standalone map
/// submission to an existing mod.
#[derive(Deserialize)]
pub struct SubmitMap {
    pub name: String,
    pub length: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Explicit canonical difficulty name; when absent the map's techs (or
    /// the easiest default) decide.
    pub canonical_difficulty: Option<String>,
    #[serde(default)]
    pub tech_any: Vec<String>,
    #[serde(default)]
    pub tech_full_clear: Vec<String>,
    pub mapper_user_id: Option<i32>,
    pub mapper_name: Option<String>,
    pub minimum_mod_revision: Option<i32>,
    #[serde(default)]
    pub removed_from_mod: bool,
    pub chapter: Option<i16>,
    pub side: Option<String>,
    pub mod_difficulty: Option<ModDifficultyClaim>,
    pub overall_rank: Option<i16>,
}

#[derive(Serialize)]
pub struct SubmitModResponse {
    pub id: ModId,
    pub url: String,
}

/// Reference sets needed to resolve a submission, fetched once per request.
pub(crate) struct SubmissionReferenceData {
    pub lengths: Vec<MapLength>,
    pub default_parents: Vec<crate::db::Difficulty>,
    pub default_tree: Vec<DifficultyWithChildren>,
    pub techs: Vec<TechWithDifficulty>,
}

impl SubmissionReferenceData {
    pub(crate) async fn fetch(state: &AppState) -> Result<Self, AppError> {
        Ok(Self {
            lengths: state.get_map_lengths().await?,
            default_parents: state.get_default_parent_difficulties().await?,
            default_tree: state.get_default_difficulty_tree().await?,
            techs: state.get_techs_with_difficulty().await?,
        })
    }
}

/// Resolves one submitted map into a creation-ready object.
///
/// `current_mod_revision` is `None` for a brand-new mod, where the map always
/// requires revision 1, and `Some` of the latest revision when adding to an
/// existing mod, where the submission may name an older one.
pub(crate) async fn map_creation_object(
    state: &AppState,
    map: SubmitMap,
    current_mod_revision: Option<i32>,
    mod_type: ModType,
    reference: &SubmissionReferenceData,
    custom_difficulties: &[ParentDifficultyCreation],
) -> Result<MapCreation, AppError> {
    let mapper_user_id = match map.mapper_user_id {
        Some(id) => {
            let user = state
                .get_user(crate::db::UserId(id))
                .await?
                .ok_or(AppError::UnknownMapperUserId(id))?;
            Some(user.id)
        }
        None => None,
    };

    resolve_map_creation(
        map,
        current_mod_revision,
        mod_type,
        reference,
        custom_difficulties,
        mapper_user_id,
    )
}

/// The lookup-free half of [`map_creation_object`].
fn resolve_map_creation(
    map: SubmitMap,
    current_mod_revision: Option<i32>,
    mod_type: ModType,
    reference: &SubmissionReferenceData,
    custom_difficulties: &[ParentDifficultyCreation],
    mapper_user_id: Option<crate::db::UserId>,
) -> Result<MapCreation, AppError> {
    // Full-clear-only techs are linked to the map but never raise its
    // canonical difficulty.
    let canonical_difficulty_id = resolve_canonical_difficulty(
        map.canonical_difficulty.as_deref(),
        &map.tech_any,
        &reference.default_parents,
        &reference.techs,
    )?;
    let length_id = resolve_length(&map.length, &reference.lengths)?;

    let mut chapter = None;
    let mut side = None;
    let mut mod_difficulty_id = None;
    let mut overall_rank = None;
    match mod_type {
        ModType::Normal => {
            if map.chapter.is_none() || map.side.is_none() {
                return Err(AppError::IncompleteNormalMap(map.name));
            }
            chapter = map.chapter;
            side = map.side;
        }
        ModType::Collab | ModType::Contest | ModType::Lobby => {
            let claim = map
                .mod_difficulty
                .as_ref()
                .ok_or(AppError::InvalidModDifficulty)?;
            let context = if custom_difficulties.is_empty() {
                ModDifficultyContext::Default(&reference.default_tree)
            } else {
                ModDifficultyContext::Custom(custom_difficulties)
            };
            mod_difficulty_id = Some(resolve_mod_difficulty(claim, &context)?);
            if mod_type == ModType::Contest {
                overall_rank = map.overall_rank;
            }
        }
    }

    let tech_id = |name: &String| {
        reference
            .techs
            .iter()
            .find(|tech| &tech.name == name)
            .map(|tech| tech.id)
            .ok_or_else(|| AppError::UnknownTechName(name.clone()))
    };
    let mut techs = Vec::with_capacity(map.tech_any.len() + map.tech_full_clear.len());
    for name in &map.tech_any {
        techs.push(MapTechCreation {
            tech_id: tech_id(name)?,
            full_clear_only: false,
        });
    }
    for name in &map.tech_full_clear {
        techs.push(MapTechCreation {
            tech_id: tech_id(name)?,
            full_clear_only: true,
        });
    }

    Ok(MapCreation {
        minimum_mod_revision: match current_mod_revision {
            None => 1,
            Some(revision) => map.minimum_mod_revision.unwrap_or(revision),
        },
        details: MapDetailsCreation {
            name: map.name,
            canonical_difficulty_id,
            length_id,
            description: map.description,
            notes: map.notes,
            removed_from_mod: map.removed_from_mod,
            chapter,
            side,
            mod_difficulty_id,
            overall_rank,
            mapper_user_id,
            mapper_name: map.mapper_name,
            techs,
        },
    })
}

impl RequestBody for SubmitMod {
    type Response = Json<SubmitModResponse>;

    async fn request(
        self,
        state: AppState,
        user: Option<User>,
    ) -> Result<Self::Response, AppError> {
        let user = user.ok_or(AppError::NotLoggedIn)?;

        let Self {
            mod_type,
            name,
            publisher,
            content_warning,
            notes,
            short_description,
            long_description,
            platform_mod_id,
            difficulties,
            maps,
        } = self;

        let publisher = state.resolve_publisher(&publisher).await?;
        let reference = SubmissionReferenceData::fetch(&state).await?;

        let difficulty_creations = match difficulties {
            Some(entries) => {
                let highest = state.get_highest_difficulty_id().await?;
                let build = build_difficulty_tree(&entries, highest);
                tracing::debug!(
                    names = build.names.len(),
                    ids = ?build.ids,
                    nested = build.has_sub_difficulties,
                    "Built custom difficulty tree.",
                );
                build.creations
            }
            None => Vec::new(),
        };

        let maps = try_join_all(maps.into_iter().map(|map| {
            map_creation_object(&state, map, None, mod_type, &reference, &difficulty_creations)
        }))
        .await?;

        let approve = user.is_privileged();
        let mod_id = state
            .create_mod(ModCreation {
                mod_type,
                name,
                publisher,
                content_warning,
                notes,
                short_description,
                long_description,
                platform_mod_id,
                difficulties: difficulty_creations,
                maps,
                submitted_by: user.id,
                approve,
            })
            .await?;

        Ok(Json(SubmitModResponse {
            id: mod_id,
            url: mod_id.absolute_url(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Difficulty, DifficultyId, LengthId, TechId};

    fn default_parent(id: i32, order: i16, name: &str) -> Difficulty {
        Difficulty {
            id: DifficultyId(id),
            name: name.to_string(),
            parent_mod_id: None,
            parent_difficulty_id: None,
            order,
        }
    }

    fn reference() -> SubmissionReferenceData {
        SubmissionReferenceData {
            lengths: vec![MapLength {
                id: LengthId(1),
                name: "Short".to_string(),
                description: "Less than 10 minutes".to_string(),
                order: 1,
            }],
            default_parents: vec![
                default_parent(1, 1, "Beginner"),
                default_parent(2, 2, "Expert"),
            ],
            default_tree: Vec::new(),
            techs: vec![
                TechWithDifficulty {
                    id: TechId(30),
                    name: "Wavedash".to_string(),
                    difficulty_id: DifficultyId(1),
                    difficulty_order: 1,
                },
                TechWithDifficulty {
                    id: TechId(31),
                    name: "Demodash".to_string(),
                    difficulty_id: DifficultyId(2),
                    difficulty_order: 2,
                },
            ],
        }
    }

    fn submission(name: &str) -> SubmitMap {
        SubmitMap {
            name: name.to_string(),
            length: "Short".to_string(),
            description: None,
            notes: None,
            canonical_difficulty: None,
            tech_any: Vec::new(),
            tech_full_clear: Vec::new(),
            mapper_user_id: None,
            mapper_name: None,
            minimum_mod_revision: None,
            removed_from_mod: false,
            chapter: Some(1),
            side: Some("A".to_string()),
            mod_difficulty: None,
            overall_rank: None,
        }
    }

    #[test]
    fn full_clear_techs_are_linked_but_do_not_set_canonical_difficulty() {
        let reference = reference();
        let mut map = submission("Summit");
        map.tech_full_clear = vec!["Demodash".to_string()];

        let creation =
            resolve_map_creation(map, None, ModType::Normal, &reference, &[], None).unwrap();

        assert_eq!(creation.details.canonical_difficulty_id, DifficultyId(1));
        assert_eq!(
            creation.details.techs,
            vec![MapTechCreation {
                tech_id: TechId(31),
                full_clear_only: true,
            }]
        );
    }

    #[test]
    fn harder_full_clear_tech_does_not_outrank_tech_any() {
        let reference = reference();
        let mut map = submission("Summit");
        map.tech_any = vec!["Wavedash".to_string()];
        map.tech_full_clear = vec!["Demodash".to_string()];

        let creation =
            resolve_map_creation(map, None, ModType::Normal, &reference, &[], None).unwrap();

        assert_eq!(creation.details.canonical_difficulty_id, DifficultyId(1));
        assert_eq!(creation.details.techs.len(), 2);
    }

    #[test]
    fn unknown_full_clear_tech_is_rejected() {
        let reference = reference();
        let mut map = submission("Summit");
        map.tech_full_clear = vec!["Moonwalk".to_string()];

        let err = resolve_map_creation(map, None, ModType::Normal, &reference, &[], None)
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownTechName(name) if name == "Moonwalk"));
    }

    #[test]
    fn new_mod_maps_always_require_revision_one() {
        let reference = reference();
        let mut map = submission("Summit");
        map.minimum_mod_revision = Some(5);

        let creation =
            resolve_map_creation(map, None, ModType::Normal, &reference, &[], None).unwrap();
        assert_eq!(creation.minimum_mod_revision, 1);
    }

    #[test]
    fn added_map_defaults_to_the_current_revision() {
        let reference = reference();
        let map = submission("Summit");

        let creation =
            resolve_map_creation(map, Some(4), ModType::Normal, &reference, &[], None).unwrap();
        assert_eq!(creation.minimum_mod_revision, 4);
    }

    #[test]
    fn added_map_may_require_an_older_revision() {
        let reference = reference();
        let mut map = submission("Summit");
        map.minimum_mod_revision = Some(2);

        let creation =
            resolve_map_creation(map, Some(4), ModType::Normal, &reference, &[], None).unwrap();
        assert_eq!(creation.minimum_mod_revision, 2);
    }
}
