// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::{
    About, Color, Education, EntityKind, Experience, FieldTag, Profile, ProfilePayload, Project,
    RowAttrs, Skill,
};

/// One rendered table row. `attrs` holds what an edit dialog is filled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub kind: EntityKind,
    pub id: i64,
    pub cells: Vec<String>,
    pub attrs: RowAttrs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub kind: EntityKind,
    pub rows: Vec<RowView>,
}

impl SectionView {
    pub fn new(kind: EntityKind, rows: Vec<RowView>) -> Self {
        Self { kind, rows }
    }

    pub fn empty(kind: EntityKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn header(&self) -> &'static [&'static str] {
        header_for(self.kind)
    }

    pub fn row(&self, id: i64) -> Option<&RowView> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn remove_row(&mut self, id: i64) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        self.rows.len() != before
    }

    /// Replaces the row with the same id, or appends it.
    /// Replaces the row with the same id where it stands, or appends it.
    pub fn upsert_row(&mut self, row: RowView) {
        match self.rows.iter_mut().find(|existing| existing.id == row.id) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }
}

/// Every section shown for the selected profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub identifiant: String,
    pub sections: Vec<SectionView>,
    pub skills: Vec<Skill>,
}

impl DetailView {
    /// Builds every section from scratch. Collections the backend did not
    /// send are left out; empty ones render their placeholder.
    pub fn from_payload(payload: &ProfilePayload) -> Self {
        let sections = EntityKind::DETAIL_SECTIONS
            .into_iter()
            .filter_map(|kind| section_rows(kind, payload).map(|rows| SectionView::new(kind, rows)))
            .collect();
        Self {
            identifiant: payload.profile.identifiant.clone(),
            sections,
            skills: payload.skills.clone(),
        }
    }

    /// Refresh after a mutation. Non-empty collections replace the rows of
    /// their section, creating it if needed; calling it twice with the same
    /// payload leaves the view unchanged.
    pub fn render_profile_data(&mut self, payload: &ProfilePayload) {
        self.identifiant = payload.profile.identifiant.clone();
        self.skills = payload.skills.clone();
        for kind in EntityKind::DETAIL_SECTIONS {
            let Some(rows) = section_rows(kind, payload) else {
                continue;
            };
            if rows.is_empty() {
                continue;
            }
            match self.section_mut(kind) {
                Some(section) => section.rows = rows,
                None => self.insert_section(SectionView::new(kind, rows)),
            }
        }
    }

    pub fn section(&self, kind: EntityKind) -> Option<&SectionView> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    pub fn section_mut(&mut self, kind: EntityKind) -> Option<&mut SectionView> {
        self.sections.iter_mut().find(|section| section.kind == kind)
    }

    pub fn row(&self, kind: EntityKind, id: i64) -> Option<&RowView> {
        self.section(kind).and_then(|section| section.row(id))
    }

    pub fn remove_row(&mut self, kind: EntityKind, id: i64) -> bool {
        if kind == EntityKind::Skill {
            self.skills.retain(|skill| skill.id.get() != id);
        }
        self.section_mut(kind)
            .is_some_and(|section| section.remove_row(id))
    }

    fn insert_section(&mut self, section: SectionView) {
        let rank = |kind: EntityKind| {
            EntityKind::DETAIL_SECTIONS
                .iter()
                .position(|candidate| *candidate == kind)
                .unwrap_or(usize::MAX)
        };
        let index = self
            .sections
            .iter()
            .position(|existing| rank(existing.kind) > rank(section.kind))
            .unwrap_or(self.sections.len());
        self.sections.insert(index, section);
    }
}

pub fn header_for(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Profile => &["identifiant", "name", "title", "created", "updated"],
        EntityKind::Skill => &["category", "name", "level"],
        EntityKind::About => &["content"],
        EntityKind::Experience => &[
            "period",
            "position",
            "company",
            "location",
            "description",
            "url",
        ],
        EntityKind::Education => &[
            "period",
            "degree",
            "institution",
            "field",
            "location",
            "description",
            "url",
        ],
        EntityKind::Project => &["title", "description", "image url", "url"],
        EntityKind::Color => &["name", "red", "green", "blue", "transparency"],
    }
}

/// Rows for one collection of the payload, `None` when it was not sent.
pub fn section_rows(kind: EntityKind, payload: &ProfilePayload) -> Option<Vec<RowView>> {
    let rows = match kind {
        EntityKind::Profile => vec![profile_row(&payload.profile)],
        EntityKind::Skill => payload.skills.iter().map(skill_row).collect(),
        EntityKind::About => payload.about.iter().map(about_row).collect(),
        EntityKind::Experience => payload.experience.iter().map(experience_row).collect(),
        EntityKind::Education => payload.education.as_ref()?.iter().map(education_row).collect(),
        EntityKind::Project => payload.projects.iter().map(project_row).collect(),
        EntityKind::Color => payload.colors.as_ref()?.iter().map(color_row).collect(),
    };
    Some(rows)
}

pub fn profile_row(profile: &Profile) -> RowView {
    RowView {
        kind: EntityKind::Profile,
        id: profile.id.get(),
        cells: vec![
            profile.identifiant.clone(),
            profile.name.clone(),
            profile.title.clone(),
            format_timestamp(&profile.created_at),
            format_timestamp(&profile.updated_at),
        ],
        attrs: RowAttrs::new()
            .with(FieldTag::Identifiant, &profile.identifiant)
            .with(FieldTag::Name, &profile.name)
            .with(FieldTag::Title, &profile.title),
    }
}

pub fn skill_row(skill: &Skill) -> RowView {
    RowView {
        kind: EntityKind::Skill,
        id: skill.id.get(),
        cells: vec![
            skill.category.clone(),
            skill.name.clone(),
            skill.level.to_string(),
        ],
        attrs: RowAttrs::new()
            .with(FieldTag::Category, &skill.category)
            .with(FieldTag::Name, &skill.name)
            .with(FieldTag::Level, skill.level.to_string()),
    }
}

pub fn about_row(about: &About) -> RowView {
    RowView {
        kind: EntityKind::About,
        id: about.id.get(),
        cells: vec![about.content.clone()],
        attrs: RowAttrs::new().with(FieldTag::Content, &about.content),
    }
}

pub fn experience_row(experience: &Experience) -> RowView {
    RowView {
        kind: EntityKind::Experience,
        id: experience.id.get(),
        cells: vec![
            experience.dates.clone(),
            experience.position.clone(),
            experience.company.clone(),
            experience.location.clone(),
            experience.description.clone(),
            experience.url.clone(),
        ],
        attrs: RowAttrs::new()
            .with(FieldTag::Dates, &experience.dates)
            .with(FieldTag::Company, &experience.company)
            .with(FieldTag::Position, &experience.position)
            .with(FieldTag::Location, &experience.location)
            .with(FieldTag::Description, &experience.description)
            .with(
                FieldTag::Details,
                experience.details.clone().unwrap_or_default(),
            )
            .with(FieldTag::Url, &experience.url)
            .with(FieldTag::Skills, experience.skills.to_string()),
    }
}

pub fn education_row(education: &Education) -> RowView {
    RowView {
        kind: EntityKind::Education,
        id: education.id.get(),
        cells: vec![
            education.dates.clone(),
            education.title.clone(),
            education.institution.clone(),
            education.field.clone(),
            education.location.clone(),
            education.description.clone(),
            education.url.clone(),
        ],
        attrs: RowAttrs::new()
            .with(FieldTag::Dates, &education.dates)
            .with(FieldTag::Institution, &education.institution)
            .with(FieldTag::Field, &education.field)
            .with(FieldTag::Title, &education.title)
            .with(FieldTag::Location, &education.location)
            .with(FieldTag::Description, &education.description)
            .with(
                FieldTag::Details,
                education.details.clone().unwrap_or_default(),
            )
            .with(FieldTag::Url, &education.url)
            .with(FieldTag::Skills, education.skills.to_string()),
    }
}

pub fn project_row(project: &Project) -> RowView {
    RowView {
        kind: EntityKind::Project,
        id: project.id.get(),
        cells: vec![
            project.title.clone(),
            project.description.clone(),
            project.image_url.clone(),
            project.url.clone(),
        ],
        attrs: RowAttrs::new()
            .with(FieldTag::Title, &project.title)
            .with(FieldTag::Description, &project.description)
            .with(FieldTag::Details, project.details.clone().unwrap_or_default())
            .with(FieldTag::ImageUrl, &project.image_url)
            .with(FieldTag::Url, &project.url)
            .with(FieldTag::Skills, project.skills.to_string()),
    }
}

pub fn color_row(color: &Color) -> RowView {
    RowView {
        kind: EntityKind::Color,
        id: color.id.get(),
        cells: vec![
            format!("color {}", color.order + 1),
            color.red.to_string(),
            color.green.to_string(),
            color.blue.to_string(),
            format!("{}%", color.transparency),
        ],
        attrs: RowAttrs::new()
            .with(FieldTag::Red, color.red.to_string())
            .with(FieldTag::Green, color.green.to_string())
            .with(FieldTag::Blue, color.blue.to_string())
            .with(FieldTag::Transparency, color.transparency.to_string()),
    }
}

/// Renders backend timestamps like "February 19, 2026, 12:34 PM". Values
/// that are not RFC 3339 are shown as received.
pub fn format_timestamp(raw: &str) -> String {
    let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) else {
        return raw.to_owned();
    };
    parsed
        .format(&time::macros::format_description!(
            "[month repr:long] [day padding:none], [year], [hour repr:12 padding:none]:[minute] [period]"
        ))
        .unwrap_or_else(|_| raw.to_owned())
}
