// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{EntityKind, Profile, SkillIds};

pub const MAX_SKILL_LEVEL: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldTag {
    Identifiant,
    Name,
    Title,
    Category,
    Level,
    Content,
    Dates,
    Company,
    Position,
    Location,
    Description,
    Details,
    Url,
    Institution,
    Field,
    ImageUrl,
    Red,
    Green,
    Blue,
    Transparency,
    Skills,
}

impl FieldTag {
    /// JSON key of the field, shared by row attributes and request payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identifiant => "identifiant",
            Self::Name => "name",
            Self::Title => "title",
            Self::Category => "category",
            Self::Level => "level",
            Self::Content => "content",
            Self::Dates => "dates",
            Self::Company => "company",
            Self::Position => "position",
            Self::Location => "location",
            Self::Description => "description",
            Self::Details => "details",
            Self::Url => "url",
            Self::Institution => "institution",
            Self::Field => "field",
            Self::ImageUrl => "image_url",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Transparency => "transparency",
            Self::Skills => "skills",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput {
    Line,
    Text,
    Level,
    SkillList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub tag: FieldTag,
    pub label: &'static str,
    pub input: FieldInput,
}

const fn line(tag: FieldTag, label: &'static str) -> FieldSpec {
    FieldSpec {
        tag,
        label,
        input: FieldInput::Line,
    }
}

const fn text(tag: FieldTag, label: &'static str) -> FieldSpec {
    FieldSpec {
        tag,
        label,
        input: FieldInput::Text,
    }
}

const SKILLS_FIELD: FieldSpec = FieldSpec {
    tag: FieldTag::Skills,
    label: "skills",
    input: FieldInput::SkillList,
};

const PROFILE_FIELDS: [FieldSpec; 3] = [
    line(FieldTag::Identifiant, "identifiant"),
    line(FieldTag::Name, "name"),
    line(FieldTag::Title, "title"),
];

const SKILL_FIELDS: [FieldSpec; 3] = [
    line(FieldTag::Category, "category"),
    line(FieldTag::Name, "name"),
    FieldSpec {
        tag: FieldTag::Level,
        label: "level",
        input: FieldInput::Level,
    },
];

const ABOUT_FIELDS: [FieldSpec; 1] = [text(FieldTag::Content, "content")];

const EXPERIENCE_FIELDS: [FieldSpec; 8] = [
    line(FieldTag::Dates, "period"),
    line(FieldTag::Position, "position"),
    line(FieldTag::Company, "company"),
    line(FieldTag::Location, "location"),
    line(FieldTag::Url, "url"),
    SKILLS_FIELD,
    text(FieldTag::Description, "description"),
    text(FieldTag::Details, "details"),
];

const EDUCATION_FIELDS: [FieldSpec; 9] = [
    line(FieldTag::Dates, "period"),
    line(FieldTag::Title, "degree"),
    line(FieldTag::Institution, "institution"),
    line(FieldTag::Field, "field"),
    line(FieldTag::Location, "location"),
    line(FieldTag::Url, "url"),
    SKILLS_FIELD,
    text(FieldTag::Description, "description"),
    text(FieldTag::Details, "details"),
];

const PROJECT_FIELDS: [FieldSpec; 6] = [
    line(FieldTag::Title, "title"),
    line(FieldTag::ImageUrl, "image url"),
    line(FieldTag::Url, "url"),
    SKILLS_FIELD,
    text(FieldTag::Description, "description"),
    text(FieldTag::Details, "details"),
];

const COLOR_FIELDS: [FieldSpec; 4] = [
    line(FieldTag::Red, "red"),
    line(FieldTag::Green, "green"),
    line(FieldTag::Blue, "blue"),
    line(FieldTag::Transparency, "transparency"),
];

pub fn field_specs(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Profile => &PROFILE_FIELDS,
        EntityKind::Skill => &SKILL_FIELDS,
        EntityKind::About => &ABOUT_FIELDS,
        EntityKind::Experience => &EXPERIENCE_FIELDS,
        EntityKind::Education => &EDUCATION_FIELDS,
        EntityKind::Project => &PROJECT_FIELDS,
        EntityKind::Color => &COLOR_FIELDS,
    }
}

/// Editable field values a table row carries, keyed like the JSON payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowAttrs(BTreeMap<FieldTag, String>);

impl RowAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: FieldTag, value: impl Into<String>) -> Self {
        self.0.insert(tag, value.into());
        self
    }

    pub fn get(&self, tag: FieldTag) -> Option<&str> {
        self.0.get(&tag).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogForm {
    kind: EntityKind,
    values: BTreeMap<FieldTag, String>,
    skills: SkillIds,
}

impl DialogForm {
    pub fn blank(kind: EntityKind) -> Self {
        let mut values = BTreeMap::new();
        for spec in field_specs(kind) {
            match spec.input {
                FieldInput::SkillList => {}
                FieldInput::Level => {
                    values.insert(spec.tag, "0".to_owned());
                }
                FieldInput::Line | FieldInput::Text => {
                    values.insert(spec.tag, String::new());
                }
            }
        }
        Self {
            kind,
            values,
            skills: SkillIds::new(),
        }
    }

    pub fn from_attrs(kind: EntityKind, attrs: &RowAttrs) -> Self {
        let mut form = Self::blank(kind);
        for spec in field_specs(kind) {
            let raw = attrs.get(spec.tag).unwrap_or_default();
            match spec.input {
                FieldInput::SkillList => form.skills = SkillIds::from_joined(raw),
                FieldInput::Level => {
                    let level = raw.trim().parse::<i64>().unwrap_or(0);
                    form.values.insert(spec.tag, level.to_string());
                }
                FieldInput::Line | FieldInput::Text => {
                    form.values.insert(spec.tag, raw.to_owned());
                }
            }
        }
        form
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn value(&self, tag: FieldTag) -> Option<&str> {
        self.values.get(&tag).map(String::as_str)
    }

    pub fn value_mut(&mut self, tag: FieldTag) -> Option<&mut String> {
        self.values.get_mut(&tag)
    }

    pub fn set_value(&mut self, tag: FieldTag, value: impl Into<String>) -> bool {
        match self.values.get_mut(&tag) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn skills(&self) -> &SkillIds {
        &self.skills
    }

    pub fn skills_mut(&mut self) -> &mut SkillIds {
        &mut self.skills
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
            && self.values.iter().all(|(tag, value)| {
                value.is_empty() || (*tag == FieldTag::Level && value.as_str() == "0")
            })
    }

    /// The form rendered back into row attributes.
    pub fn attrs(&self) -> RowAttrs {
        let mut attrs = RowAttrs::new();
        for spec in field_specs(self.kind) {
            attrs = match spec.input {
                FieldInput::SkillList => attrs.with(spec.tag, self.skills.to_string()),
                _ => attrs.with(spec.tag, self.value(spec.tag).unwrap_or_default()),
            };
        }
        attrs
    }

    pub fn adjust_level(&mut self, delta: i64) {
        if let Some(level) = self.values.get_mut(&FieldTag::Level) {
            let current = level.trim().parse::<i64>().unwrap_or(0);
            *level = (current + delta).clamp(0, MAX_SKILL_LEVEL).to_string();
        }
    }

    fn trimmed(&self, tag: FieldTag) -> &str {
        self.value(tag).unwrap_or_default().trim()
    }

    pub fn validate(&self) -> Result<()> {
        match self.kind {
            EntityKind::Profile => {
                let identifiant = self.trimmed(FieldTag::Identifiant);
                if identifiant.is_empty() {
                    bail!("profile identifiant is required -- enter an identifiant and retry");
                }
                if identifiant.contains(['/', '?', '&', '#'])
                    || identifiant.contains(char::is_whitespace)
                {
                    bail!("profile identifiant cannot contain spaces, '/', '?', '&' or '#'");
                }
                if self.trimmed(FieldTag::Name).is_empty() {
                    bail!("profile name is required -- enter a name and retry");
                }
            }
            EntityKind::Skill => {
                if self.trimmed(FieldTag::Category).is_empty() {
                    bail!("skill category is required -- enter a category and retry");
                }
                if self.trimmed(FieldTag::Name).is_empty() {
                    bail!("skill name is required -- enter a name and retry");
                }
                let level = self.trimmed(FieldTag::Level);
                match level.parse::<i64>() {
                    Ok(value) if (0..=MAX_SKILL_LEVEL).contains(&value) => {}
                    _ => bail!("skill level must be a whole number from 0 to 10, got {level:?}"),
                }
            }
            EntityKind::About => {
                if self.trimmed(FieldTag::Content).is_empty() {
                    bail!("about content is required -- enter some text and retry");
                }
            }
            EntityKind::Experience => {
                if self.trimmed(FieldTag::Company).is_empty() {
                    bail!("experience company is required -- enter a company and retry");
                }
            }
            EntityKind::Education => {
                if self.trimmed(FieldTag::Institution).is_empty() {
                    bail!("education institution is required -- enter an institution and retry");
                }
            }
            EntityKind::Project => {
                if self.trimmed(FieldTag::Title).is_empty() {
                    bail!("project title is required -- enter a title and retry");
                }
            }
            EntityKind::Color => {
                for (tag, max) in [
                    (FieldTag::Red, 255),
                    (FieldTag::Green, 255),
                    (FieldTag::Blue, 255),
                    (FieldTag::Transparency, 100),
                ] {
                    let raw = self.trimmed(tag);
                    if raw.is_empty() {
                        continue;
                    }
                    match raw.parse::<i64>() {
                        Ok(value) if (0..=max).contains(&value) => {}
                        _ => bail!(
                            "color {} must be a whole number from 0 to {max}, got {raw:?}",
                            tag.as_str()
                        ),
                    }
                }
            }
        }
        Ok(())
    }

    /// Field values as sent to `/save_data/`: strings trimmed, skills as a list.
    pub fn request_fields(&self) -> Map<String, Value> {
        let mut data = Map::new();
        for spec in field_specs(self.kind) {
            let value = match spec.input {
                FieldInput::SkillList => match serde_json::to_value(&self.skills) {
                    Ok(value) => value,
                    Err(_) => Value::Array(Vec::new()),
                },
                _ => Value::String(self.trimmed(spec.tag).to_owned()),
            };
            data.insert(spec.tag.as_str().to_owned(), value);
        }
        data
    }
}

/// Body of `POST /save_data/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveRequest {
    #[serde(rename = "modalId")]
    pub modal_id: String,
    #[serde(rename = "isNew")]
    pub is_new: bool,
    pub data: Map<String, Value>,
}

impl SaveRequest {
    pub fn kind(&self) -> Option<EntityKind> {
        EntityKind::parse_modal_id(&self.modal_id)
    }

    pub fn row_id(&self) -> Option<i64> {
        self.data.get("id").and_then(Value::as_i64)
    }
}

/// Successful `/save_data/` envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaveOutcome {
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub data: Value,
}

impl SaveOutcome {
    pub fn kind(&self) -> Option<EntityKind> {
        EntityKind::parse(&self.entity_type)
    }

    pub fn saved_id(&self) -> Option<i64> {
        self.data.get("id").and_then(Value::as_i64)
    }

    pub fn identifiant(&self) -> Option<&str> {
        self.data.get("identifiant").and_then(Value::as_str)
    }

    /// The saved profile, when the envelope carries a full profile row.
    pub fn profile(&self) -> Option<Profile> {
        if self.kind() != Some(EntityKind::Profile) {
            return None;
        }
        serde_json::from_value(self.data.clone()).ok()
    }
}
