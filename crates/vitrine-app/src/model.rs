// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::*;
use crate::skills::SkillIds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Profile,
    Skill,
    About,
    Experience,
    Education,
    Project,
    Color,
}

impl EntityKind {
    pub const ALL: [Self; 7] = [
        Self::Profile,
        Self::Skill,
        Self::About,
        Self::Experience,
        Self::Education,
        Self::Project,
        Self::Color,
    ];

    /// Order of the sections in the detail pane of a selected profile.
    pub const DETAIL_SECTIONS: [Self; 6] = [
        Self::Color,
        Self::Skill,
        Self::About,
        Self::Experience,
        Self::Education,
        Self::Project,
    ];

    pub const fn modal_id(self) -> &'static str {
        match self {
            Self::Profile => "profileModal",
            Self::Skill => "skillModal",
            Self::About => "aboutModal",
            Self::Experience => "experienceModal",
            Self::Education => "educationModal",
            Self::Project => "projectModal",
            Self::Color => "colorModal",
        }
    }

    pub fn parse_modal_id(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.modal_id() == value)
    }

    /// Lower-case name used in delete URLs, row classes and envelope `type`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Skill => "skill",
            Self::About => "about",
            Self::Experience => "experience",
            Self::Education => "education",
            Self::Project => "project",
            Self::Color => "color",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Profile => "Profile",
            Self::Skill => "Skill",
            Self::About => "About",
            Self::Experience => "Experience",
            Self::Education => "Education",
            Self::Project => "Project",
            Self::Color => "Color",
        }
    }

    pub const fn section_title(self) -> &'static str {
        match self {
            Self::Profile => "profiles",
            Self::Skill => "skills",
            Self::About => "about",
            Self::Experience => "experience",
            Self::Education => "education",
            Self::Project => "projects",
            Self::Color => "colors",
        }
    }

    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Profile => "no profile found",
            Self::Skill => "no skill found",
            Self::About => "no about section found",
            Self::Experience => "no experience found",
            Self::Education => "no education found",
            Self::Project => "no project found",
            Self::Color => "no color found",
        }
    }

    pub const fn has_skills(self) -> bool {
        matches!(self, Self::Experience | Self::Education | Self::Project)
    }

    pub const fn scoped_by_profile(self) -> bool {
        !matches!(self, Self::Profile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub identifiant: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub level: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct About {
    pub id: AboutId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: ExperienceId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dates: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub position: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub skills: SkillIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub id: EducationId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dates: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub institution: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub skills: SkillIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub skills: SkillIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub id: ColorId,
    #[serde(default)]
    pub red: i64,
    #[serde(default)]
    pub green: i64,
    #[serde(default)]
    pub blue: i64,
    #[serde(default)]
    pub transparency: i64,
    #[serde(default)]
    pub order: i64,
}

/// Everything `/load_data/` returns for one profile.
///
/// `education` and `colors` only exist on backends that serve the extended
/// variant; `None` means the section is not rendered at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub profile: Profile,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub about: Vec<About>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Option<Vec<Education>>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub colors: Option<Vec<Color>>,
}

impl ProfilePayload {
    pub fn skill(&self, id: SkillId) -> Option<&Skill> {
        self.skills.iter().find(|skill| skill.id == id)
    }

    pub fn row_count(&self, kind: EntityKind) -> Option<usize> {
        match kind {
            EntityKind::Profile => Some(1),
            EntityKind::Skill => Some(self.skills.len()),
            EntityKind::About => Some(self.about.len()),
            EntityKind::Experience => Some(self.experience.len()),
            EntityKind::Education => self.education.as_ref().map(Vec::len),
            EntityKind::Project => Some(self.projects.len()),
            EntityKind::Color => self.colors.as_ref().map(Vec::len),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
