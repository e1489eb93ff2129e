use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::attempt::{AttemptRecord, ProgressKey};

/// Question types the trainer knows about. The string forms are stable and
/// used both in progress keys and in the persisted settings file.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
pub enum Category {
    #[strum(serialize = "distinction")]
    #[serde(rename = "distinction")]
    Distinction,
    #[strum(serialize = "comparison")]
    #[serde(rename = "comparison")]
    Comparison,
    #[strum(serialize = "temporal")]
    #[serde(rename = "temporal")]
    Temporal,
    #[strum(serialize = "syllogism")]
    #[serde(rename = "syllogism")]
    Syllogism,
    #[strum(serialize = "binary")]
    #[serde(rename = "binary")]
    Binary,
    #[strum(serialize = "space-two-d")]
    #[serde(rename = "space-two-d")]
    SpaceTwoD,
    #[strum(serialize = "space-three-d")]
    #[serde(rename = "space-three-d")]
    SpaceThreeD,
    #[strum(serialize = "space-time")]
    #[serde(rename = "space-time")]
    SpaceTime,
}

impl Category {
    /// Parses the stable string form, rejecting anything outside the
    /// configured enumeration. No default category is ever substituted.
    pub fn parse(s: &str) -> crate::error::Result<Category> {
        use std::str::FromStr;
        Category::from_str(s)
            .map_err(|_| crate::error::ProgressError::UnknownCategory(s.to_string()))
    }
}

/// Statically configured sets of categories assumed to exercise the same
/// underlying skill. A decision triggered by one member propagates to all of
/// them. The relation is symmetric, and every category is in its own group
/// (ungrouped categories are singletons).
#[derive(Debug, Clone)]
pub struct CommonGroups {
    table: HashMap<Category, Vec<Category>>,
}

impl CommonGroups {
    pub fn new(groups: &[&[Category]]) -> Self {
        let mut table: HashMap<Category, Vec<Category>> = HashMap::new();
        for group in groups {
            for &member in *group {
                let entry = table.entry(member).or_insert_with(|| vec![member]);
                for &other in *group {
                    if other != member && !entry.contains(&other) {
                        entry.push(other);
                    }
                }
            }
        }
        for members in table.values_mut() {
            members.sort();
        }
        Self { table }
    }

    /// The category's group, sorted, always including the category itself.
    pub fn group_of(&self, category: Category) -> Vec<Category> {
        self.table
            .get(&category)
            .cloned()
            .unwrap_or_else(|| vec![category])
    }

    /// One progress key per group member, substituting the category and
    /// keeping the record's premises, time budget and modifiers. Used to pool
    /// trailing windows across categories that share a skill.
    pub fn group_keys(&self, record: &AttemptRecord) -> Vec<ProgressKey> {
        self.group_of(record.category)
            .into_iter()
            .map(|c| record.key_for(c))
            .collect()
    }
}

impl Default for CommonGroups {
    fn default() -> Self {
        // The four verbal-reasoning types transfer between each other; the
        // binary and spatial types progress on their own.
        Self::new(&[&[
            Category::Comparison,
            Category::Temporal,
            Category::Distinction,
            Category::Syllogism,
        ]])
    }
}
