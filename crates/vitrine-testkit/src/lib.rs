// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, Month, OffsetDateTime, Time};
use vitrine_app::{
    About, AboutId, Color, ColorId, Education, EducationId, Experience, ExperienceId, Profile,
    ProfileId, ProfilePayload, Project, ProjectId, Skill, SkillId, SkillIds,
};

const REFERENCE_YEAR: i32 = 2026;

const SKILL_CATEGORIES: [&str; 5] = ["Languages", "Frameworks", "Databases", "Tooling", "Cloud"];

const FIRST_NAMES: [&str; 12] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Camille", "Rowan",
];
const LAST_NAMES: [&str; 12] = [
    "Walker", "Martin", "Durand", "Evans", "Lopez", "Moreau", "Ward", "Young", "Diaz", "Reed",
    "Bernard", "Brooks",
];

const TITLES: [&str; 6] = [
    "Backend Engineer",
    "Data Engineer",
    "Full-stack Developer",
    "Site Reliability Engineer",
    "Product Designer",
    "Engineering Manager",
];

const COMPANIES: [&str; 8] = [
    "Northwind",
    "Globex",
    "Initech",
    "Umbrella Labs",
    "Hooli",
    "Vandelay Industries",
    "Stark Systems",
    "Acme Cloud",
];

const CITIES: [&str; 8] = [
    "Paris", "Lyon", "Nantes", "Bordeaux", "Lille", "Montreal", "Geneva", "Brussels",
];

const INSTITUTIONS: [&str; 5] = [
    "Université de Lyon",
    "École Polytechnique",
    "Sorbonne Université",
    "INSA Toulouse",
    "Université de Nantes",
];
const DEGREES: [&str; 4] = ["Master", "Licence", "Engineering degree", "Doctorate"];
const FIELDS: [&str; 5] = [
    "Computer Science",
    "Applied Mathematics",
    "Software Engineering",
    "Data Science",
    "Networks",
];

const PROJECT_TITLES: [&str; 6] = [
    "Portfolio site",
    "Recipe planner",
    "Home telemetry",
    "Chess engine",
    "Invoice scanner",
    "Trail map",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for profile payloads and admin pages. Ids are unique
/// across every entity a faker produces.
#[derive(Debug, Clone)]
pub struct PortfolioFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl PortfolioFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn profile(&mut self, identifiant: &str) -> Profile {
        let created = reference_now() + Duration::days(self.int_range(0, 300));
        let updated = created + Duration::hours(self.int_range(1, 2_000));
        Profile {
            id: ProfileId::new(self.take_id()),
            identifiant: identifiant.to_owned(),
            name: format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES)),
            title: self.pick(&TITLES).to_owned(),
            created_at: rfc3339(created),
            updated_at: rfc3339(updated),
        }
    }

    pub fn skill(&mut self) -> Skill {
        let category = self.pick(&SKILL_CATEGORIES);
        let name = self.pick(skill_names(category));
        Skill {
            id: SkillId::new(self.take_id()),
            category: category.to_owned(),
            name: name.to_owned(),
            level: self.int_range(3, 10),
        }
    }

    pub fn about(&mut self) -> About {
        About {
            id: AboutId::new(self.take_id()),
            content: self.sentence(8, 20),
        }
    }

    pub fn experience(&mut self, skills: &[Skill]) -> Experience {
        let start = self.int_range(2010, 2022);
        Experience {
            id: ExperienceId::new(self.take_id()),
            dates: format!("{start} - {}", start + self.int_range(1, 4)),
            company: self.pick(&COMPANIES).to_owned(),
            position: self.pick(&TITLES).to_owned(),
            location: self.pick(&CITIES).to_owned(),
            description: self.sentence(6, 14),
            details: self.maybe_sentence(),
            url: String::new(),
            skills: self.linked_skills(skills),
        }
    }

    pub fn education(&mut self, skills: &[Skill]) -> Education {
        let start = self.int_range(2005, 2018);
        Education {
            id: EducationId::new(self.take_id()),
            dates: format!("{start} - {}", start + self.int_range(2, 5)),
            institution: self.pick(&INSTITUTIONS).to_owned(),
            field: self.pick(&FIELDS).to_owned(),
            title: self.pick(&DEGREES).to_owned(),
            location: self.pick(&CITIES).to_owned(),
            description: self.sentence(5, 10),
            details: self.maybe_sentence(),
            url: String::new(),
            skills: self.linked_skills(skills),
        }
    }

    pub fn project(&mut self, skills: &[Skill]) -> Project {
        let title = self.pick(&PROJECT_TITLES);
        let slug = title.to_ascii_lowercase().replace(' ', "-");
        Project {
            id: ProjectId::new(self.take_id()),
            title: title.to_owned(),
            description: self.sentence(6, 12),
            details: self.maybe_sentence(),
            image_url: format!("https://img.example.test/{slug}.png"),
            url: format!("https://example.test/{slug}"),
            skills: self.linked_skills(skills),
        }
    }

    pub fn colors(&mut self, count: usize) -> Vec<Color> {
        (0..count)
            .map(|order| Color {
                id: ColorId::new(self.take_id()),
                red: self.int_range(0, 255),
                green: self.int_range(0, 255),
                blue: self.int_range(0, 255),
                transparency: self.int_range(0, 100),
                order: order as i64,
            })
            .collect()
    }

    /// A full extended payload: every section present and non-empty.
    pub fn payload(&mut self, identifiant: &str) -> ProfilePayload {
        let profile = self.profile(identifiant);
        let skill_count = self.int_range(4, 8) as usize;
        let skills = (0..skill_count).map(|_| self.skill()).collect::<Vec<_>>();
        let about = (0..self.int_range(1, 2)).map(|_| self.about()).collect();
        let experience = (0..self.int_range(2, 3))
            .map(|_| self.experience(&skills))
            .collect();
        let education = (0..self.int_range(1, 2))
            .map(|_| self.education(&skills))
            .collect();
        let projects = (0..self.int_range(1, 3))
            .map(|_| self.project(&skills))
            .collect();
        let colors = self.colors(3);

        ProfilePayload {
            profile,
            skills,
            about,
            experience,
            education: Some(education),
            projects,
            colors: Some(colors),
        }
    }

    /// Payload of a backend serving only profile, skills, about,
    /// experience and projects, with every list empty.
    pub fn bare_payload(&mut self, identifiant: &str) -> ProfilePayload {
        ProfilePayload {
            profile: self.profile(identifiant),
            skills: Vec::new(),
            about: Vec::new(),
            experience: Vec::new(),
            education: None,
            projects: Vec::new(),
            colors: None,
        }
    }

    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn linked_skills(&mut self, skills: &[Skill]) -> SkillIds {
        if skills.is_empty() {
            return SkillIds::new();
        }
        let count = self.int_range(1, 3) as usize;
        (0..count)
            .map(|_| skills[self.rng.int_n(skills.len())].id)
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn maybe_sentence(&mut self) -> Option<String> {
        if self.rng.int_n(2) == 0 {
            None
        } else {
            Some(self.sentence(4, 10))
        }
    }

    fn sentence(&mut self, min_words: i64, max_words: i64) -> String {
        const WORDS: [&str; 24] = [
            "built",
            "designed",
            "shipped",
            "migrated",
            "scaled",
            "automated",
            "reviewed",
            "mentored",
            "service",
            "platform",
            "pipeline",
            "dashboard",
            "api",
            "storage",
            "latency",
            "release",
            "team",
            "customers",
            "reliable",
            "internal",
            "public",
            "search",
            "billing",
            "mobile",
        ];

        let count = self.int_range(min_words, max_words) as usize;
        let parts = (0..count).map(|_| self.pick(&WORDS)).collect::<Vec<_>>();
        let mut sentence = parts.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }
}

/// Server-rendered admin page with one `tr.profile-row` per profile and the
/// hidden anti-forgery field. Attribute values are HTML-escaped.
pub fn admin_page_html(profiles: &[Profile], csrf_token: &str) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html><body>\n");
    html.push_str(&format!(
        "<form><input type=\"hidden\" name=\"csrfmiddlewaretoken\" value=\"{}\"></form>\n",
        escape_attr(csrf_token)
    ));
    html.push_str("<table id=\"profileTable\"><tbody>\n");
    for profile in profiles {
        html.push_str(&format!(
            "<tr class=\"profile-row\" data-id=\"{}\" data-identifiant=\"{}\" data-name=\"{}\" \
             data-title=\"{}\" data-created=\"{}\" data-updated=\"{}\">\
             <td>{}</td></tr>\n",
            profile.id,
            escape_attr(&profile.identifiant),
            escape_attr(&profile.name),
            escape_attr(&profile.title),
            escape_attr(&profile.created_at),
            escape_attr(&profile.updated_at),
            escape_attr(&profile.identifiant),
        ));
    }
    html.push_str("</tbody></table>\n</body></html>\n");
    html
}

pub fn payload_json(payload: &ProfilePayload) -> Result<String> {
    serde_json::to_string(payload).context("encode profile payload")
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn skill_categories() -> &'static [&'static str] {
    &SKILL_CATEGORIES
}

fn skill_names(category: &str) -> &'static [&'static str] {
    match category {
        "Languages" => &["Rust", "Python", "TypeScript", "Go", "SQL"],
        "Frameworks" => &["Django", "Axum", "React", "Vue"],
        "Databases" => &["PostgreSQL", "SQLite", "Redis"],
        "Tooling" => &["Git", "Docker", "Terraform", "Grafana"],
        "Cloud" => &["AWS", "GCP", "Scaleway"],
        _ => &["General"],
    }
}

fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn reference_now() -> OffsetDateTime {
    let date = Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1).unwrap_or(Date::MIN);
    date.with_time(Time::MIDNIGHT).assume_utc()
}

fn rfc3339(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| fixture_datetime().to_owned())
}

#[cfg(test)]
mod tests {
    use super::{PortfolioFaker, admin_page_html, payload_json, skill_categories};
    use std::collections::BTreeSet;
    use vitrine_app::{EntityKind, ProfilePayload};

    #[test]
    fn new_deterministic_seed() {
        let left = PortfolioFaker::new(42).payload("acme");
        let right = PortfolioFaker::new(42).payload("acme");
        assert_eq!(left, right);
    }

    #[test]
    fn payload_fills_every_section() {
        let payload = PortfolioFaker::new(7).payload("acme");
        for kind in EntityKind::DETAIL_SECTIONS {
            assert!(
                payload.row_count(kind).is_some_and(|count| count > 0),
                "{kind:?}"
            );
        }
        for skill in &payload.skills {
            assert!(skill_categories().contains(&skill.category.as_str()));
            assert!((3..=10).contains(&skill.level));
        }
    }

    #[test]
    fn ids_are_unique_and_links_resolve() {
        let payload = PortfolioFaker::new(9).payload("acme");
        let mut ids = BTreeSet::new();
        assert!(ids.insert(payload.profile.id.get()));
        for skill in &payload.skills {
            assert!(ids.insert(skill.id.get()));
        }
        for experience in &payload.experience {
            assert!(ids.insert(experience.id.get()));
            for id in experience.skills.iter() {
                assert!(payload.skill(id).is_some());
            }
        }
    }

    #[test]
    fn colors_are_ordered_and_in_range() {
        let colors = PortfolioFaker::new(3).colors(4);
        let orders = colors.iter().map(|color| color.order).collect::<Vec<_>>();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        for color in colors {
            assert!((0..=255).contains(&color.red));
            assert!((0..=100).contains(&color.transparency));
        }
    }

    #[test]
    fn payload_json_decodes_back() -> anyhow::Result<()> {
        let payload = PortfolioFaker::new(11).payload("acme");
        let decoded: ProfilePayload = serde_json::from_str(&payload_json(&payload)?)?;
        assert_eq!(decoded, payload);
        Ok(())
    }

    #[test]
    fn admin_page_escapes_attribute_values() {
        let mut faker = PortfolioFaker::new(5);
        let mut profile = faker.profile("acme");
        profile.name = "Ada \"The\" <Countess>".to_owned();
        let html = admin_page_html(&[profile], "tok");

        assert!(html.contains("data-name=\"Ada &quot;The&quot; &lt;Countess&gt;\""));
        assert!(html.contains("name=\"csrfmiddlewaretoken\" value=\"tok\""));
        assert!(html.contains("class=\"profile-row\""));
    }
}
