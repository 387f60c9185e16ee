//! Assembly of raw mod and map rows into the public API shape.
//!
//! The raw views carry every column the database knows; the formatted types
//! carry what each mod type exposes. Which positional fields are mandatory
//! depends on the mod type, and a row that violates that is reported as
//! corrupt rather than papered over.

use serde::Serialize;

use crate::db::{MapId, ModId, ModType, PublisherId, RawMap, RawMapDetails, RawMod, UserId};
use crate::difficulty_tree::{nested_difficulty_names, DifficultyInput};
use crate::error::{AppError, AppResult};

/// One formatted detail revision of a mod, maps included.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FormattedMod {
    pub id: ModId,
    pub revision: i32,
    #[serde(rename = "type")]
    pub mod_type: ModType,
    pub name: String,
    pub publisher_id: PublisherId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_platform_id: Option<i64>,
    pub content_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub short_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_mod_id: Option<i64>,
    pub maps: Vec<FormattedMap>,
    /// The mod's custom difficulty list in its nested wire shape, absent for
    /// mods that use the default set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulties: Option<Vec<DifficultyInput>>,
}

/// One formatted detail revision of a map.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FormattedMap {
    pub id: MapId,
    pub revision: i32,
    pub mod_id: ModId,
    pub minimum_mod_revision: i32,
    pub name: String,
    pub canonical_difficulty: String,
    pub length: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapper_user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapper_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapper_name: Option<String>,
    pub removed_from_mod: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_any: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_full_clear: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_rank: Option<i16>,
}

/// Formats every detail revision of a mod, its maps flattened in.
///
/// A mod with no detail revisions in the raw view is corrupt (or was read
/// without any approved revision when one was required).
pub fn format_mod(raw: &RawMod) -> AppResult<Vec<FormattedMod>> {
    if raw.details.is_empty() {
        return Err(AppError::NoModDetails(raw.id.0));
    }

    let difficulties = raw
        .difficulties
        .as_deref()
        .map(|rows| nested_difficulty_names(rows, raw.id))
        .transpose()?;

    let mut out = Vec::with_capacity(raw.details.len());
    for detail in &raw.details {
        let mut maps = Vec::new();
        for map in &raw.maps {
            maps.extend(format_map(map, detail.mod_type)?);
        }

        out.push(FormattedMod {
            id: raw.id,
            revision: detail.revision,
            mod_type: detail.mod_type,
            name: detail.name.clone(),
            publisher_id: detail.publisher_id,
            publisher_platform_id: detail.publisher_platform_id,
            content_warning: detail.content_warning,
            notes: detail.notes.clone(),
            short_description: detail.short_description.clone(),
            long_description: detail.long_description.clone(),
            platform_mod_id: detail.platform_mod_id,
            maps,
            difficulties: difficulties.clone(),
        });
    }

    Ok(out)
}

/// Formats every detail revision of a map under the given mod type.
pub fn format_map(raw: &RawMap, mod_type: ModType) -> AppResult<Vec<FormattedMap>> {
    raw.details
        .iter()
        .map(|detail| format_map_details(raw, detail, mod_type))
        .collect()
}

fn format_map_details(
    raw: &RawMap,
    detail: &RawMapDetails,
    mod_type: ModType,
) -> AppResult<FormattedMap> {
    let mut tech_any = Vec::new();
    let mut tech_full_clear = Vec::new();
    for tech in &detail.techs {
        if tech.full_clear_only {
            tech_full_clear.push(tech.name.clone());
        } else {
            tech_any.push(tech.name.clone());
        }
    }

    let mut formatted = FormattedMap {
        id: raw.id,
        revision: detail.revision,
        mod_id: raw.mod_id,
        minimum_mod_revision: raw.minimum_mod_revision,
        name: detail.name.clone(),
        canonical_difficulty: detail.canonical_difficulty.clone(),
        length: detail.length.clone(),
        description: detail.description.clone(),
        notes: detail.notes.clone(),
        mapper_user_id: None,
        mapper_user_name: None,
        mapper_name: None,
        removed_from_mod: detail.removed_from_mod,
        tech_any: (!tech_any.is_empty()).then_some(tech_any),
        tech_full_clear: (!tech_full_clear.is_empty()).then_some(tech_full_clear),
        chapter: None,
        side: None,
        mod_difficulty: None,
        overall_rank: None,
    };

    if detail.mapper_user_id.is_some() {
        formatted.mapper_user_id = detail.mapper_user_id;
        formatted.mapper_user_name = detail.mapper_user_name.clone();
    } else {
        formatted.mapper_name = detail.mapper_name.clone();
    }

    match mod_type {
        ModType::Normal => {
            if detail.chapter.is_none() || detail.side.is_none() {
                return Err(AppError::MissingChapterOrSide(raw.id.0));
            }
            formatted.chapter = detail.chapter;
            formatted.side = detail.side.clone();
        }
        ModType::Collab | ModType::Contest | ModType::Lobby => {
            if detail.mod_difficulty.is_none() {
                return Err(AppError::MissingModDifficulty(raw.id.0));
            }
            formatted.mod_difficulty = detail.mod_difficulty.clone();
            if mod_type == ModType::Contest {
                formatted.overall_rank = detail.overall_rank;
            }
        }
    }

    Ok(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Difficulty, MapTechRef, RawModDetails};
    use crate::difficulty_tree::build_difficulty_tree;

    fn map_details(revision: i32) -> RawMapDetails {
        RawMapDetails {
            details_id: 50,
            revision,
            name: "Summit".to_string(),
            canonical_difficulty: "Expert".to_string(),
            length: "Long".to_string(),
            description: None,
            notes: None,
            removed_from_mod: false,
            chapter: None,
            side: None,
            mod_difficulty: None,
            overall_rank: None,
            mapper_user_id: None,
            mapper_user_name: None,
            mapper_name: Some("someone".to_string()),
            techs: vec![],
        }
    }

    fn raw_map(details: Vec<RawMapDetails>) -> RawMap {
        RawMap {
            id: MapId(5),
            mod_id: ModId(2),
            minimum_mod_revision: 1,
            details,
        }
    }

    #[test]
    fn normal_mod_requires_chapter_and_side() {
        let mut detail = map_details(1);
        detail.chapter = Some(7);
        // side missing
        let err = format_map(&raw_map(vec![detail]), ModType::Normal).unwrap_err();
        assert!(matches!(err, AppError::MissingChapterOrSide(5)));

        let mut detail = map_details(1);
        detail.chapter = Some(7);
        detail.side = Some("A".to_string());
        let formatted = format_map(&raw_map(vec![detail]), ModType::Normal).unwrap();
        assert_eq!(formatted[0].chapter, Some(7));
        assert_eq!(formatted[0].side.as_deref(), Some("A"));
        assert_eq!(formatted[0].mod_difficulty, None);
    }

    #[test]
    fn non_normal_mod_requires_mod_difficulty() {
        let detail = map_details(1);
        let err = format_map(&raw_map(vec![detail]), ModType::Contest).unwrap_err();
        assert!(matches!(err, AppError::MissingModDifficulty(5)));
    }

    #[test]
    fn overall_rank_is_contest_only() {
        let mut detail = map_details(1);
        detail.mod_difficulty = Some("Hard - High".to_string());
        detail.overall_rank = Some(3);

        let contest = format_map(&raw_map(vec![detail.clone()]), ModType::Contest).unwrap();
        assert_eq!(contest[0].overall_rank, Some(3));

        let collab = format_map(&raw_map(vec![detail]), ModType::Collab).unwrap();
        assert_eq!(collab[0].overall_rank, None);
    }

    #[test]
    fn techs_split_by_full_clear_and_empty_lists_are_omitted() {
        let mut detail = map_details(1);
        detail.chapter = Some(1);
        detail.side = Some("A".to_string());
        detail.techs = vec![
            MapTechRef {
                name: "Wavedash".to_string(),
                full_clear_only: false,
            },
            MapTechRef {
                name: "Demodash".to_string(),
                full_clear_only: true,
            },
        ];

        let formatted = format_map(&raw_map(vec![detail]), ModType::Normal).unwrap();
        assert_eq!(formatted[0].tech_any.as_deref(), Some(&["Wavedash".to_string()][..]));
        assert_eq!(
            formatted[0].tech_full_clear.as_deref(),
            Some(&["Demodash".to_string()][..]),
        );

        let bare = format_map(&raw_map(vec![map_details(1)]), ModType::Lobby);
        // Lobby map with no mod difficulty is invalid anyway; use Normal.
        assert!(bare.is_err());
        let mut plain = map_details(1);
        plain.chapter = Some(1);
        plain.side = Some("B".to_string());
        let formatted = format_map(&raw_map(vec![plain]), ModType::Normal).unwrap();
        assert_eq!(formatted[0].tech_any, None);
        assert_eq!(formatted[0].tech_full_clear, None);
    }

    #[test]
    fn mapper_account_wins_over_free_text_name() {
        let mut detail = map_details(1);
        detail.chapter = Some(1);
        detail.side = Some("A".to_string());
        detail.mapper_user_id = Some(UserId(9));
        detail.mapper_user_name = Some("account name".to_string());
        detail.mapper_name = Some("stale".to_string());

        let formatted = format_map(&raw_map(vec![detail]), ModType::Normal).unwrap();
        assert_eq!(formatted[0].mapper_user_id, Some(UserId(9)));
        assert_eq!(formatted[0].mapper_user_name.as_deref(), Some("account name"));
        assert_eq!(formatted[0].mapper_name, None);
    }

    fn mod_details(revision: i32, mod_type: ModType) -> RawModDetails {
        RawModDetails {
            revision,
            mod_type,
            name: "Winter Collab".to_string(),
            publisher_id: PublisherId(4),
            publisher_platform_id: Some(12345),
            content_warning: false,
            notes: None,
            short_description: "A mod".to_string(),
            long_description: None,
            platform_mod_id: Some(777),
        }
    }

    #[test]
    fn mod_without_details_is_corrupt() {
        let raw = RawMod {
            id: ModId(2),
            difficulties: None,
            details: vec![],
            maps: vec![],
        };
        let err = format_mod(&raw).unwrap_err();
        assert!(matches!(err, AppError::NoModDetails(2)));
    }

    #[test]
    fn each_revision_formats_maps_under_its_own_type() {
        let mut map_detail = map_details(1);
        map_detail.chapter = Some(1);
        map_detail.side = Some("A".to_string());
        map_detail.mod_difficulty = Some("Hard".to_string());

        let raw = RawMod {
            id: ModId(2),
            difficulties: None,
            details: vec![
                mod_details(1, ModType::Normal),
                mod_details(2, ModType::Collab),
            ],
            maps: vec![raw_map(vec![map_detail])],
        };

        let formatted = format_mod(&raw).unwrap();
        assert_eq!(formatted.len(), 2);
        assert_eq!(formatted[0].maps[0].chapter, Some(1));
        assert_eq!(formatted[0].maps[0].mod_difficulty, None);
        assert_eq!(formatted[1].maps[0].chapter, None);
        assert_eq!(formatted[1].maps[0].mod_difficulty.as_deref(), Some("Hard"));
    }

    #[test]
    fn custom_difficulties_come_back_in_wire_shape() {
        let entries = vec![
            DifficultyInput::Named("Standard".to_string()),
            DifficultyInput::Grouped {
                parent: "Hard".to_string(),
                children: vec!["Low".to_string(), "High".to_string()],
            },
        ];
        let build = build_difficulty_tree(&entries, 20);
        let mut rows = Vec::new();
        for parent in &build.creations {
            rows.push(Difficulty {
                id: parent.id,
                name: parent.name.clone(),
                parent_mod_id: Some(ModId(2)),
                parent_difficulty_id: None,
                order: parent.order,
            });
            for child in &parent.children {
                rows.push(Difficulty {
                    id: child.id,
                    name: child.name.clone(),
                    parent_mod_id: Some(ModId(2)),
                    parent_difficulty_id: Some(parent.id),
                    order: child.order,
                });
            }
        }

        let raw = RawMod {
            id: ModId(2),
            difficulties: Some(rows),
            details: vec![mod_details(1, ModType::Collab)],
            maps: vec![],
        };

        let formatted = format_mod(&raw).unwrap();
        assert_eq!(formatted[0].difficulties.as_deref(), Some(&entries[..]));
    }
}
