// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::{EntityKind, Skill, SkillId};

/// Ordered, duplicate-free list of skill ids linked to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillIds(Vec<SkillId>);

impl SkillIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-joined list. Blank parts are dropped and parts that
    /// are not integers are skipped with a warning.
    pub fn from_joined(raw: &str) -> Self {
        let mut ids = Self::new();
        for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.parse::<i64>() {
                Ok(value) => {
                    ids.push(SkillId::new(value));
                }
                Err(_) => tracing::warn!(part, "ignoring non-numeric skill id"),
            }
        }
        ids
    }

    /// Appends `id` unless already present. Returns whether it was added.
    pub fn push(&mut self, id: SkillId) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    pub fn remove(&mut self, id: SkillId) -> bool {
        let Some(index) = self.0.iter().position(|existing| *existing == id) else {
            return false;
        };
        self.0.remove(index);
        true
    }

    pub fn contains(&self, id: SkillId) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SkillIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, id) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

impl FromIterator<SkillId> for SkillIds {
    fn from_iter<T: IntoIterator<Item = SkillId>>(iter: T) -> Self {
        let mut ids = Self::new();
        for id in iter {
            ids.push(id);
        }
        ids
    }
}

impl Serialize for SkillIds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSkillIds {
    Joined(String),
    List(Vec<RawSkillId>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSkillId {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for SkillIds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ids = match Option::<RawSkillIds>::deserialize(deserializer)? {
            None => Self::new(),
            Some(RawSkillIds::Joined(raw)) => Self::from_joined(&raw),
            Some(RawSkillIds::List(items)) => {
                let mut ids = Self::new();
                for item in items {
                    match item {
                        RawSkillId::Number(value) => {
                            ids.push(SkillId::new(value));
                        }
                        RawSkillId::Text(raw) => {
                            for id in Self::from_joined(&raw).iter() {
                                ids.push(id);
                            }
                        }
                    }
                }
                ids
            }
        };
        Ok(ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillBadge {
    pub id: SkillId,
    pub name: String,
}

/// Resolves linked ids against the profile's skill list, in link order.
/// Ids with no matching skill are logged and left out.
pub fn skill_badges(ids: &SkillIds, skills: &[Skill]) -> Vec<SkillBadge> {
    ids.iter()
        .filter_map(|id| match skills.iter().find(|skill| skill.id == id) {
            Some(skill) => Some(SkillBadge {
                id,
                name: skill.name.clone(),
            }),
            None => {
                tracing::warn!(skill_id = id.get(), "skill not found in profile skills");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerFocus {
    Category,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillOption {
    pub id: SkillId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryGroup {
    category: String,
    options: Vec<SkillOption>,
}

/// Sub-dialog that picks one existing skill by category, then by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillPicker {
    parent: EntityKind,
    groups: Vec<CategoryGroup>,
    pub focus: PickerFocus,
    category: Option<usize>,
    name: Option<usize>,
}

impl SkillPicker {
    pub fn new(parent: EntityKind, skills: &[Skill]) -> Self {
        let mut groups: Vec<CategoryGroup> = Vec::new();
        for skill in skills {
            let option = SkillOption {
                id: skill.id,
                name: skill.name.clone(),
            };
            match groups
                .iter_mut()
                .find(|group| group.category == skill.category)
            {
                Some(group) => group.options.push(option),
                None => groups.push(CategoryGroup {
                    category: skill.category.clone(),
                    options: vec![option],
                }),
            }
        }

        Self {
            parent,
            groups,
            focus: PickerFocus::Category,
            category: None,
            name: None,
        }
    }

    pub fn parent(&self) -> EntityKind {
        self.parent
    }

    pub fn categories(&self) -> Vec<&str> {
        self.groups
            .iter()
            .map(|group| group.category.as_str())
            .collect()
    }

    /// Names offered for the selected category; empty until one is chosen.
    pub fn names(&self) -> &[SkillOption] {
        self.category
            .and_then(|index| self.groups.get(index))
            .map(|group| group.options.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.category
            .and_then(|index| self.groups.get(index))
            .map(|group| group.category.as_str())
    }

    pub fn selected_name(&self) -> Option<&SkillOption> {
        self.name.and_then(|index| self.names().get(index))
    }

    /// Choosing a category always resets the name selection.
    pub fn select_category(&mut self, category: &str) -> bool {
        self.name = None;
        self.category = self
            .groups
            .iter()
            .position(|group| group.category == category);
        self.category.is_some()
    }

    pub fn clear_category(&mut self) {
        self.category = None;
        self.name = None;
    }

    pub fn select_name(&mut self, name: &str) -> bool {
        self.name = self.names().iter().position(|option| option.name == name);
        self.name.is_some()
    }

    pub fn cycle_category(&mut self, delta: isize) {
        self.name = None;
        self.category = cycle_index(self.category, self.groups.len(), delta);
    }

    pub fn cycle_name(&mut self, delta: isize) {
        self.name = cycle_index(self.name, self.names().len(), delta);
    }

    pub fn confirm(&self) -> Result<SkillId> {
        match (self.selected_category(), self.selected_name()) {
            (Some(_), Some(option)) => Ok(option.id),
            _ => bail!("skill category and name are required -- choose both and retry"),
        }
    }
}

fn cycle_index(current: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let Some(current) = current else {
        return Some(if delta < 0 { len - 1 } else { 0 });
    };
    let len = len as isize;
    Some((current as isize + delta).rem_euclid(len) as usize)
}
