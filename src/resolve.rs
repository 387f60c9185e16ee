//! Resolution of submitted reference names into database ids.
//!
//! Canonical difficulties, lengths, and techs arrive in submissions as
//! human-readable names; mod difficulties arrive as a name or a
//! parent/child pair. Everything here turns those into ids against the
//! reference sets, or fails with a specific error naming what was wrong.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::db::{
    Difficulty, DifficultyId, DifficultyWithChildren, LengthId, MapLength, TechWithDifficulty,
};
use crate::difficulty_tree::ParentDifficultyCreation;
use crate::error::{AppError, AppResult};

/// Picks the canonical difficulty of a map.
///
/// An explicit name wins and must match a top-level default difficulty.
/// Otherwise the map's techs decide: the hardest tech's difficulty is used,
/// and a tie between two techs of equal order is rejected rather than
/// resolved arbitrarily. A map with no techs at all falls back to the
/// easiest default difficulty, again rejecting ties.
pub fn resolve_canonical_difficulty(
    explicit_name: Option<&str>,
    tech_names: &[String],
    defaults: &[Difficulty],
    techs: &[TechWithDifficulty],
) -> AppResult<DifficultyId> {
    if let Some(name) = explicit_name {
        return defaults
            .iter()
            .find(|difficulty| difficulty.name == name)
            .map(|difficulty| difficulty.id)
            .ok_or_else(|| AppError::UnknownDifficultyName(name.to_string()));
    }

    if tech_names.is_empty() {
        let mut easiest: Option<&Difficulty> = None;
        for difficulty in defaults {
            match easiest {
                None => easiest = Some(difficulty),
                Some(current) if difficulty.order < current.order => easiest = Some(difficulty),
                Some(current) if difficulty.order == current.order => {
                    return Err(AppError::AmbiguousDefaultOrdering);
                }
                Some(_) => (),
            }
        }
        return easiest
            .map(|difficulty| difficulty.id)
            .ok_or(AppError::NoDefaultDifficulty);
    }

    let lookup = |name: &String| {
        techs
            .iter()
            .find(|tech| &tech.name == name)
            .ok_or_else(|| AppError::UnknownTechName(name.clone()))
    };

    let mut hardest = lookup(&tech_names[0])?;
    for name in &tech_names[1..] {
        let tech = lookup(name)?;
        if tech.difficulty_order == hardest.difficulty_order && tech.name != hardest.name {
            return Err(AppError::AmbiguousTechOrdering);
        }
        if tech.difficulty_order > hardest.difficulty_order {
            hardest = tech;
        }
    }
    Ok(hardest.difficulty_id)
}

pub fn resolve_length(name: &str, lengths: &[MapLength]) -> AppResult<LengthId> {
    lengths
        .iter()
        .find(|length| length.name == name)
        .map(|length| length.id)
        .ok_or_else(|| AppError::UnknownLengthName(name.to_string()))
}

/// A submitted claim of where a map sits in a mod's difficulty listing.
///
/// On the wire this is either a bare string naming a top-level difficulty,
/// or a two-element array naming a parent and one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModDifficultyClaim {
    Flat(String),
    Pair { parent: String, child: String },
}

impl Serialize for ModDifficultyClaim {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Flat(name) => serializer.serialize_str(name),
            Self::Pair { parent, child } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(parent)?;
                seq.serialize_element(child)?;
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ModDifficultyClaim {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ClaimVisitor;

        impl<'de> Visitor<'de> for ClaimVisitor {
            type Value = ModDifficultyClaim;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a difficulty name or a [parent, child] pair")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ModDifficultyClaim::Flat(v.to_string()))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let parent: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let child: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                if seq.next_element::<String>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }
                Ok(ModDifficultyClaim::Pair { parent, child })
            }
        }

        deserializer.deserialize_any(ClaimVisitor)
    }
}

/// The difficulty set a mod-difficulty claim is checked against: the mod's
/// own custom tree when it has one, the default tree otherwise.
pub enum ModDifficultyContext<'a> {
    Custom(&'a [ParentDifficultyCreation]),
    Default(&'a [DifficultyWithChildren]),
}

/// Resolves a mod-difficulty claim to a difficulty id, or rejects it.
///
/// A flat claim matches any custom top-level name and resolves to the
/// parent's id, children or not. Against the default tree the claim must
/// name a [parent, child] pair; flat claims are rejected outright.
pub fn resolve_mod_difficulty(
    claim: &ModDifficultyClaim,
    context: &ModDifficultyContext<'_>,
) -> AppResult<DifficultyId> {
    match (claim, context) {
        (ModDifficultyClaim::Flat(name), ModDifficultyContext::Custom(parents)) => parents
            .iter()
            .find(|parent| &parent.name == name)
            .map(|parent| parent.id)
            .ok_or(AppError::InvalidModDifficulty),
        (ModDifficultyClaim::Pair { parent, child }, ModDifficultyContext::Custom(parents)) => {
            parents
                .iter()
                .filter(|candidate| !candidate.children.is_empty())
                .find(|candidate| &candidate.name == parent)
                .and_then(|candidate| {
                    candidate
                        .children
                        .iter()
                        .find(|candidate_child| &candidate_child.name == child)
                })
                .map(|matched| matched.id)
                .ok_or(AppError::InvalidModDifficulty)
        }
        (ModDifficultyClaim::Flat(_), ModDifficultyContext::Default(_)) => {
            Err(AppError::InvalidModDifficulty)
        }
        (ModDifficultyClaim::Pair { parent, child }, ModDifficultyContext::Default(tree)) => tree
            .iter()
            .filter(|candidate| !candidate.children.is_empty())
            .find(|candidate| &candidate.difficulty.name == parent)
            .and_then(|candidate| {
                candidate
                    .children
                    .iter()
                    .find(|candidate_child| &candidate_child.name == child)
            })
            .map(|matched| matched.id)
            .ok_or(AppError::InvalidModDifficulty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty_tree::ChildDifficultyCreation;

    fn default_difficulty(id: i32, order: i16, name: &str) -> Difficulty {
        Difficulty {
            id: DifficultyId(id),
            name: name.to_string(),
            parent_mod_id: None,
            parent_difficulty_id: None,
            order,
        }
    }

    fn tech(name: &str, difficulty_id: i32, difficulty_order: i16) -> TechWithDifficulty {
        TechWithDifficulty {
            id: crate::db::TechId(difficulty_id * 100),
            name: name.to_string(),
            difficulty_id: DifficultyId(difficulty_id),
            difficulty_order,
        }
    }

    #[test]
    fn explicit_name_wins_over_techs() {
        let defaults = vec![
            default_difficulty(1, 1, "Beginner"),
            default_difficulty(2, 2, "Expert"),
        ];
        let techs = vec![tech("Wavedash", 2, 2)];
        let id = resolve_canonical_difficulty(
            Some("Beginner"),
            &["Wavedash".to_string()],
            &defaults,
            &techs,
        )
        .unwrap();
        assert_eq!(id, DifficultyId(1));
    }

    #[test]
    fn unknown_explicit_name_fails() {
        let defaults = vec![default_difficulty(1, 1, "Beginner")];
        let err = resolve_canonical_difficulty(Some("Mythical"), &[], &defaults, &[]).unwrap_err();
        assert!(matches!(err, AppError::UnknownDifficultyName(name) if name == "Mythical"));
    }

    #[test]
    fn no_techs_falls_back_to_lowest_order_not_lowest_id() {
        let defaults = vec![
            default_difficulty(1, 2, "Easy"),
            default_difficulty(2, 1, "Hard"),
        ];
        let id = resolve_canonical_difficulty(None, &[], &defaults, &[]).unwrap();
        assert_eq!(id, DifficultyId(2));
    }

    #[test]
    fn equal_default_orders_are_ambiguous() {
        let defaults = vec![
            default_difficulty(1, 1, "Easy"),
            default_difficulty(2, 1, "Also Easy"),
        ];
        let err = resolve_canonical_difficulty(None, &[], &defaults, &[]).unwrap_err();
        assert!(matches!(err, AppError::AmbiguousDefaultOrdering));
    }

    #[test]
    fn empty_default_set_fails() {
        let err = resolve_canonical_difficulty(None, &[], &[], &[]).unwrap_err();
        assert!(matches!(err, AppError::NoDefaultDifficulty));
    }

    #[test]
    fn hardest_tech_decides() {
        let techs = vec![
            tech("Wavedash", 2, 2),
            tech("Demodash", 4, 5),
            tech("Hyperdash", 2, 2),
        ];
        let names = vec![
            "Wavedash".to_string(),
            "Demodash".to_string(),
            "Hyperdash".to_string(),
        ];
        let id = resolve_canonical_difficulty(None, &names, &[], &techs).unwrap();
        assert_eq!(id, DifficultyId(4));
    }

    #[test]
    fn tie_between_distinct_hardest_techs_is_ambiguous() {
        let techs = vec![tech("Wavedash", 2, 3), tech("Wallbounce", 3, 3)];
        let names = vec!["Wavedash".to_string(), "Wallbounce".to_string()];
        let err = resolve_canonical_difficulty(None, &names, &[], &techs).unwrap_err();
        assert!(matches!(err, AppError::AmbiguousTechOrdering));
    }

    #[test]
    fn unknown_tech_name_fails() {
        let techs = vec![tech("Wavedash", 2, 2)];
        let names = vec!["Wavedash".to_string(), "Moonwalk".to_string()];
        let err = resolve_canonical_difficulty(None, &names, &[], &techs).unwrap_err();
        assert!(matches!(err, AppError::UnknownTechName(name) if name == "Moonwalk"));
    }

    #[test]
    fn length_resolution() {
        let lengths = vec![MapLength {
            id: LengthId(7),
            name: "Short".to_string(),
            description: "Less than 10 minutes".to_string(),
            order: 1,
        }];
        assert_eq!(resolve_length("Short", &lengths).unwrap(), LengthId(7));
        let err = resolve_length("Epic", &lengths).unwrap_err();
        assert!(matches!(err, AppError::UnknownLengthName(name) if name == "Epic"));
    }

    fn custom_parents() -> Vec<ParentDifficultyCreation> {
        vec![
            ParentDifficultyCreation {
                id: DifficultyId(10),
                name: "Standard".to_string(),
                order: 1,
                children: vec![],
            },
            ParentDifficultyCreation {
                id: DifficultyId(13),
                name: "Hard".to_string(),
                order: 2,
                children: vec![
                    ChildDifficultyCreation {
                        id: DifficultyId(11),
                        name: "Low".to_string(),
                        order: 1,
                    },
                    ChildDifficultyCreation {
                        id: DifficultyId(12),
                        name: "High".to_string(),
                        order: 2,
                    },
                ],
            },
        ]
    }

    #[test]
    fn flat_claim_matches_childless_custom_parent() {
        let parents = custom_parents();
        let id = resolve_mod_difficulty(
            &ModDifficultyClaim::Flat("Standard".to_string()),
            &ModDifficultyContext::Custom(&parents),
        )
        .unwrap();
        assert_eq!(id, DifficultyId(10));
    }

    #[test]
    fn flat_claim_matches_grouped_custom_parent() {
        let parents = custom_parents();
        let id = resolve_mod_difficulty(
            &ModDifficultyClaim::Flat("Hard".to_string()),
            &ModDifficultyContext::Custom(&parents),
        )
        .unwrap();
        assert_eq!(id, DifficultyId(13));
    }

    #[test]
    fn flat_claim_on_built_tree_resolves_to_the_group_parent() {
        let inputs = vec![crate::difficulty_tree::DifficultyInput::Grouped {
            parent: "Hard".to_string(),
            children: vec!["Low".to_string(), "High".to_string()],
        }];
        let build = crate::difficulty_tree::build_difficulty_tree(&inputs, 100);
        let id = resolve_mod_difficulty(
            &ModDifficultyClaim::Flat("Hard".to_string()),
            &ModDifficultyContext::Custom(&build.creations),
        )
        .unwrap();
        let parent = build
            .creations
            .iter()
            .find(|parent| parent.name == "Hard")
            .unwrap();
        assert_eq!(id, parent.id);
        assert!(!parent.children.is_empty());
    }

    #[test]
    fn flat_claim_with_unknown_name_is_rejected() {
        let parents = custom_parents();
        let err = resolve_mod_difficulty(
            &ModDifficultyClaim::Flat("Mythical".to_string()),
            &ModDifficultyContext::Custom(&parents),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidModDifficulty));
    }

    #[test]
    fn pair_claim_resolves_to_the_child() {
        let parents = custom_parents();
        let id = resolve_mod_difficulty(
            &ModDifficultyClaim::Pair {
                parent: "Hard".to_string(),
                child: "High".to_string(),
            },
            &ModDifficultyContext::Custom(&parents),
        )
        .unwrap();
        assert_eq!(id, DifficultyId(12));
    }

    #[test]
    fn flat_claim_against_default_tree_is_rejected() {
        let tree: Vec<DifficultyWithChildren> = vec![DifficultyWithChildren {
            difficulty: default_difficulty(1, 1, "Hard"),
            children: vec![default_difficulty(2, 1, "Low")],
        }];
        let err = resolve_mod_difficulty(
            &ModDifficultyClaim::Flat("Hard".to_string()),
            &ModDifficultyContext::Default(&tree),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidModDifficulty));
    }

    #[test]
    fn pair_claim_against_default_tree() {
        let mut child = default_difficulty(2, 1, "Low");
        child.parent_difficulty_id = Some(DifficultyId(1));
        let tree = vec![DifficultyWithChildren {
            difficulty: default_difficulty(1, 1, "Hard"),
            children: vec![child],
        }];
        let id = resolve_mod_difficulty(
            &ModDifficultyClaim::Pair {
                parent: "Hard".to_string(),
                child: "Low".to_string(),
            },
            &ModDifficultyContext::Default(&tree),
        )
        .unwrap();
        assert_eq!(id, DifficultyId(2));
    }

    #[test]
    fn claim_wire_format() {
        let flat: ModDifficultyClaim = serde_json::from_str("\"Standard\"").unwrap();
        assert_eq!(flat, ModDifficultyClaim::Flat("Standard".to_string()));

        let pair: ModDifficultyClaim = serde_json::from_str("[\"Hard\", \"High\"]").unwrap();
        assert_eq!(
            pair,
            ModDifficultyClaim::Pair {
                parent: "Hard".to_string(),
                child: "High".to_string(),
            }
        );

        assert!(serde_json::from_str::<ModDifficultyClaim>("[\"Hard\"]").is_err());
        assert!(serde_json::from_str::<ModDifficultyClaim>("[\"A\", \"B\", \"C\"]").is_err());
    }
}
