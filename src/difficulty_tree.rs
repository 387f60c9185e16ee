//! Conversion between the human-authored nested difficulty list and flat
//! difficulty rows.
//!
//! A mod submission describes its difficulty set as an ordered list where each
//! entry is either a bare name or a `[parent, child, ...]` group. The builder
//! turns that list into creation records with freshly allocated ids; the
//! inverse walks flat rows back into the same nested shape for display.

use std::collections::HashMap;

use itertools::Itertools;
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::{Difficulty, DifficultyId, ModId};
use crate::error::{AppError, AppResult};

/// One entry in a human-authored difficulty list.
///
/// On the wire this is either a plain string or an array whose first element
/// is the parent name and whose remaining elements are the ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DifficultyInput {
    Named(String),
    Grouped { parent: String, children: Vec<String> },
}

impl Serialize for DifficultyInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Named(name) => serializer.serialize_str(name),
            Self::Grouped { parent, children } => {
                let mut seq = serializer.serialize_seq(Some(children.len() + 1))?;
                seq.serialize_element(parent)?;
                for child in children {
                    seq.serialize_element(child)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for DifficultyInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Group(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Name(name) => Ok(Self::Named(name)),
            Repr::Group(mut names) => {
                if names.len() < 2 {
                    return Err(D::Error::invalid_length(
                        names.len(),
                        &"a parent name followed by at least one child name",
                    ));
                }
                let parent = names.remove(0);
                Ok(Self::Grouped {
                    parent,
                    children: names,
                })
            }
        }
    }
}

/// Name-only record for a difficulty about to be created.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DifficultyNameRecord {
    pub name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChildDifficultyCreation {
    pub id: DifficultyId,
    pub name: String,
    pub order: i16,
}

/// Creation record for one top-level difficulty, with its children nested.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ParentDifficultyCreation {
    pub id: DifficultyId,
    pub name: String,
    pub order: i16,
    pub children: Vec<ChildDifficultyCreation>,
}

/// Output of [`build_difficulty_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyTreeBuild {
    /// Name records for every parent and child, in allocation order.
    pub names: Vec<DifficultyNameRecord>,
    /// One creation record per top-level entry, in input order.
    pub creations: Vec<ParentDifficultyCreation>,
    /// Whether any entry had children.
    pub has_sub_difficulties: bool,
    /// Every freshly allocated id, in allocation order.
    pub ids: Vec<DifficultyId>,
}

/// Assigns ids and orders to every difficulty in `entries`.
///
/// Ids count up from `highest_current_difficulty_id`; within a group the
/// children are allocated before their parent. Orders are derived purely from
/// position, so they are continuous by construction. Name uniqueness is a
/// schema concern and is not checked here.
pub fn build_difficulty_tree(
    entries: &[DifficultyInput],
    highest_current_difficulty_id: i32,
) -> DifficultyTreeBuild {
    let mut next_id = highest_current_difficulty_id;
    let mut names = Vec::new();
    let mut creations = Vec::with_capacity(entries.len());
    let mut has_sub_difficulties = false;
    let mut ids = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let order = index as i16 + 1;

        match entry {
            DifficultyInput::Named(name) => {
                next_id += 1;
                ids.push(DifficultyId(next_id));
                names.push(DifficultyNameRecord { name: name.clone() });
                creations.push(ParentDifficultyCreation {
                    id: DifficultyId(next_id),
                    name: name.clone(),
                    order,
                    children: Vec::new(),
                });
            }

            DifficultyInput::Grouped { parent, children } => {
                has_sub_difficulties = true;

                let mut child_creations = Vec::with_capacity(children.len());
                for (child_index, child) in children.iter().enumerate() {
                    next_id += 1;
                    ids.push(DifficultyId(next_id));
                    names.push(DifficultyNameRecord {
                        name: child.clone(),
                    });
                    child_creations.push(ChildDifficultyCreation {
                        id: DifficultyId(next_id),
                        name: child.clone(),
                        order: child_index as i16 + 1,
                    });
                }

                next_id += 1;
                ids.push(DifficultyId(next_id));
                names.push(DifficultyNameRecord {
                    name: parent.clone(),
                });
                creations.push(ParentDifficultyCreation {
                    id: DifficultyId(next_id),
                    name: parent.clone(),
                    order,
                    children: child_creations,
                });
            }
        }
    }

    DifficultyTreeBuild {
        names,
        creations,
        has_sub_difficulties,
        ids,
    }
}

/// Reconstructs the nested difficulty-name list from flat rows.
///
/// Inverse of [`build_difficulty_tree`] for persisted rows: top-level
/// difficulties are emitted by ascending order, childless ones as bare names
/// and the rest as groups with children by ascending order. Any unfilled order
/// slot while walking 1..=N is a hard error.
pub fn nested_difficulty_names(
    difficulties: &[Difficulty],
    mod_id: ModId,
) -> AppResult<Vec<DifficultyInput>> {
    let (parents, children): (Vec<&Difficulty>, Vec<&Difficulty>) = difficulties
        .iter()
        .partition(|d| d.parent_difficulty_id.is_none());

    let children_by_parent: HashMap<DifficultyId, Vec<&Difficulty>> = children
        .into_iter()
        .flat_map(|d| d.parent_difficulty_id.map(|parent_id| (parent_id, d)))
        .into_group_map();

    let mut out = Vec::with_capacity(parents.len());

    for order in 1..=parents.len() as i16 {
        let parent = parents
            .iter()
            .find(|d| d.order == order)
            .ok_or(AppError::NonContinuousParentOrder(mod_id.0))?;

        match children_by_parent.get(&parent.id) {
            None => out.push(DifficultyInput::Named(parent.name.clone())),
            Some(siblings) => {
                let mut child_names = Vec::with_capacity(siblings.len());
                for child_order in 1..=siblings.len() as i16 {
                    let child = siblings
                        .iter()
                        .find(|d| d.order == child_order)
                        .ok_or_else(|| AppError::NonContinuousChildOrder {
                            mod_id: mod_id.0,
                            parent: parent.name.clone(),
                        })?;
                    child_names.push(child.name.clone());
                }
                out.push(DifficultyInput::Grouped {
                    parent: parent.name.clone(),
                    children: child_names,
                });
            }
        }
    }

    Ok(out)
}

/// Regroups persisted difficulty rows into creation-shaped records, parents
/// and children each by ascending order. Used to check a submitted
/// mod-difficulty claim against an existing mod's own set; continuity is not
/// re-validated here.
pub fn creations_from_rows(difficulties: &[Difficulty]) -> Vec<ParentDifficultyCreation> {
    let (parents, children): (Vec<&Difficulty>, Vec<&Difficulty>) = difficulties
        .iter()
        .partition(|d| d.parent_difficulty_id.is_none());

    let children_by_parent: HashMap<DifficultyId, Vec<&Difficulty>> = children
        .into_iter()
        .flat_map(|d| d.parent_difficulty_id.map(|parent_id| (parent_id, d)))
        .into_group_map();

    parents
        .into_iter()
        .sorted_by_key(|parent| parent.order)
        .map(|parent| ParentDifficultyCreation {
            id: parent.id,
            name: parent.name.clone(),
            order: parent.order,
            children: children_by_parent
                .get(&parent.id)
                .into_iter()
                .flatten()
                .sorted_by_key(|child| child.order)
                .map(|child| ChildDifficultyCreation {
                    id: child.id,
                    name: child.name.clone(),
                    order: child.order,
                })
                .collect(),
        })
        .collect()
}
