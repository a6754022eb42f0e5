// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use serde_json::Value;

use crate::{
    DialogForm, EntityKind, FieldSpec, RowAttrs, SaveRequest, Skill, SkillBadge, SkillId,
    SkillPicker, field_specs, skill_badges,
};

/// An open edit dialog. `bound_id` is set when editing an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    kind: EntityKind,
    bound_id: Option<i64>,
    pub form: DialogForm,
    pub cursor: usize,
    pub picker: Option<SkillPicker>,
}

impl Dialog {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            bound_id: None,
            form: DialogForm::blank(kind),
            cursor: 0,
            picker: None,
        }
    }

    fn bound(kind: EntityKind, id: i64, attrs: &RowAttrs) -> Self {
        Self {
            kind,
            bound_id: Some(id),
            form: DialogForm::from_attrs(kind, attrs),
            cursor: 0,
            picker: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn bound_id(&self) -> Option<i64> {
        self.bound_id
    }

    pub fn is_new(&self) -> bool {
        self.bound_id.is_none()
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        field_specs(self.kind)
    }

    pub fn focused_field(&self) -> Option<&'static FieldSpec> {
        self.fields().get(self.cursor)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.fields().len() as isize;
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    pub fn badges(&self, skills: &[Skill]) -> Vec<SkillBadge> {
        skill_badges(self.form.skills(), skills)
    }

    /// Validates the form and builds the `/save_data/` body. The selected
    /// profile travels as `profile` (null when none); `id` only when bound.
    pub fn save_request(&self, selected_profile: Option<&str>) -> Result<SaveRequest> {
        self.form.validate()?;
        if self.kind.scoped_by_profile() && selected_profile.is_none() {
            bail!(
                "no profile selected -- select a profile before saving a {}",
                self.kind.as_str()
            );
        }

        let mut data = self.form.request_fields();
        data.insert(
            "profile".to_owned(),
            selected_profile.map_or(Value::Null, |identifiant| {
                Value::String(identifiant.to_owned())
            }),
        );
        if let Some(id) = self.bound_id {
            data.insert("id".to_owned(), Value::from(id));
        }

        Ok(SaveRequest {
            modal_id: self.kind.modal_id().to_owned(),
            is_new: self.is_new(),
            data,
        })
    }
}

/// Open dialogs, most recently opened last. Each kind appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogSet {
    stack: Vec<Dialog>,
    backdrop: bool,
}

impl DialogSet {
    pub fn open_new(&mut self, kind: EntityKind) -> &mut Dialog {
        self.place(Dialog::new(kind))
    }

    /// Opens the dialog for an existing row, reusing the kind's slot if it
    /// is already open.
    pub fn open_bound(&mut self, kind: EntityKind, id: i64, attrs: &RowAttrs) -> &mut Dialog {
        self.place(Dialog::bound(kind, id, attrs))
    }

    fn place(&mut self, dialog: Dialog) -> &mut Dialog {
        self.stack.retain(|open| open.kind != dialog.kind);
        self.stack.push(dialog);
        self.backdrop = true;
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Discards the dialog and its edits. The backdrop goes away on any close.
    pub fn close(&mut self, kind: EntityKind) -> Option<Dialog> {
        let index = self.stack.iter().position(|open| open.kind == kind)?;
        self.backdrop = false;
        Some(self.stack.remove(index))
    }

    pub fn active(&self) -> Option<&Dialog> {
        self.stack.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut Dialog> {
        self.stack.last_mut()
    }

    pub fn get(&self, kind: EntityKind) -> Option<&Dialog> {
        self.stack.iter().find(|open| open.kind == kind)
    }

    pub fn get_mut(&mut self, kind: EntityKind) -> Option<&mut Dialog> {
        self.stack.iter_mut().find(|open| open.kind == kind)
    }

    pub fn is_open(&self, kind: EntityKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dialog> {
        self.stack.iter()
    }

    pub fn backdrop(&self) -> bool {
        self.backdrop
    }

    /// The page underneath scrolls only when no dialog is open.
    pub fn scroll_locked(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn open_picker(&mut self, parent: EntityKind, skills: &[Skill]) -> Result<&mut SkillPicker> {
        if !parent.has_skills() {
            bail!("{} entries do not link skills", parent.as_str());
        }
        let dialog = self
            .get_mut(parent)
            .ok_or_else(|| anyhow!("{} dialog is not open", parent.as_str()))?;
        Ok(dialog.picker.insert(SkillPicker::new(parent, skills)))
    }

    pub fn close_picker(&mut self, parent: EntityKind) -> bool {
        self.get_mut(parent)
            .and_then(|dialog| dialog.picker.take())
            .is_some()
    }

    /// Links the picked skill to the parent dialog and closes the picker.
    /// A failed confirmation leaves the picker open.
    pub fn confirm_picker(&mut self, parent: EntityKind) -> Result<SkillId> {
        let dialog = self
            .get_mut(parent)
            .ok_or_else(|| anyhow!("{} dialog is not open", parent.as_str()))?;
        let picker = dialog
            .picker
            .as_ref()
            .ok_or_else(|| anyhow!("skill picker is not open"))?;
        let id = picker.confirm()?;
        dialog.form.skills_mut().push(id);
        dialog.picker = None;
        Ok(id)
    }

    /// Unlinks a skill badge from the given dialog only.
    pub fn remove_skill(&mut self, parent: EntityKind, id: SkillId) -> bool {
        self.get_mut(parent)
            .is_some_and(|dialog| dialog.form.skills_mut().remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::DialogSet;
    use crate::{EntityKind, FieldInput, FieldTag, RowAttrs, Skill, SkillId};
    use anyhow::Result;
    use serde_json::json;

    fn skills() -> Vec<Skill> {
        vec![
            Skill {
                id: SkillId::new(3),
                category: "Lang".to_owned(),
                name: "Rust".to_owned(),
                level: 9,
            },
            Skill {
                id: SkillId::new(7),
                category: "Lang".to_owned(),
                name: "Go".to_owned(),
                level: 6,
            },
        ]
    }

    #[test]
    fn new_dialogs_have_no_bound_id_and_empty_fields() {
        let mut dialogs = DialogSet::default();
        for kind in EntityKind::ALL {
            let dialog = dialogs.open_new(kind);
            assert!(dialog.is_new(), "{kind:?}");
            assert!(dialog.form.is_empty(), "{kind:?}");
        }
        assert_eq!(dialogs.len(), EntityKind::ALL.len());
    }

    #[test]
    fn bound_dialogs_mirror_row_attrs() {
        let attrs = RowAttrs::new()
            .with(FieldTag::Category, "Lang")
            .with(FieldTag::Name, "Rust")
            .with(FieldTag::Level, "9");
        let mut dialogs = DialogSet::default();
        let dialog = dialogs.open_bound(EntityKind::Skill, 42, &attrs);

        assert_eq!(dialog.bound_id(), Some(42));
        for spec in dialog.fields() {
            if spec.input != FieldInput::SkillList {
                assert_eq!(dialog.form.value(spec.tag), attrs.get(spec.tag));
            }
        }
    }

    #[test]
    fn reopening_a_kind_reuses_its_slot() {
        let mut dialogs = DialogSet::default();
        dialogs.open_new(EntityKind::About);
        dialogs.open_new(EntityKind::Skill);
        let attrs = RowAttrs::new().with(FieldTag::Content, "Hello");
        dialogs.open_bound(EntityKind::About, 8, &attrs);

        assert_eq!(dialogs.len(), 2);
        assert_eq!(
            dialogs.active().map(|dialog| dialog.kind()),
            Some(EntityKind::About)
        );
        assert_eq!(
            dialogs
                .get(EntityKind::About)
                .and_then(|dialog| dialog.form.value(FieldTag::Content)),
            Some("Hello")
        );
    }

    #[test]
    fn closing_clears_backdrop_and_unlocks_scroll_only_when_empty() {
        let mut dialogs = DialogSet::default();
        dialogs.open_new(EntityKind::Project);
        dialogs.open_new(EntityKind::Skill);
        assert!(dialogs.backdrop());

        assert!(dialogs.close(EntityKind::Skill).is_some());
        assert!(!dialogs.backdrop());
        assert!(dialogs.scroll_locked());

        dialogs.close(EntityKind::Project);
        assert!(!dialogs.scroll_locked());
        assert!(dialogs.close(EntityKind::Project).is_none());
    }

    #[test]
    fn new_saves_omit_id_and_bound_saves_carry_it() -> Result<()> {
        let mut dialogs = DialogSet::default();
        dialogs
            .open_new(EntityKind::About)
            .form
            .set_value(FieldTag::Content, "Hi");
        let created = dialogs
            .get(EntityKind::About)
            .map(|dialog| dialog.save_request(Some("acme")))
            .transpose()?;
        let created = created.ok_or_else(|| anyhow::anyhow!("dialog missing"))?;
        assert!(created.is_new);
        assert_eq!(created.row_id(), None);
        assert_eq!(created.data.get("profile"), Some(&json!("acme")));

        let attrs = RowAttrs::new().with(FieldTag::Content, "Hi");
        let updated = dialogs
            .open_bound(EntityKind::About, 8, &attrs)
            .save_request(Some("acme"))?;
        assert!(!updated.is_new);
        assert_eq!(updated.row_id(), Some(8));
        assert_eq!(updated.modal_id, "aboutModal");
        Ok(())
    }

    #[test]
    fn profile_saves_send_null_profile_without_selection() -> Result<()> {
        let mut dialogs = DialogSet::default();
        let dialog = dialogs.open_new(EntityKind::Profile);
        dialog.form.set_value(FieldTag::Identifiant, "acme");
        dialog.form.set_value(FieldTag::Name, "Ada");
        let request = dialog.save_request(None)?;
        assert_eq!(request.data.get("profile"), Some(&json!(null)));

        let about = dialogs.open_new(EntityKind::About);
        about.form.set_value(FieldTag::Content, "Hi");
        assert!(about.save_request(None).is_err());
        Ok(())
    }

    #[test]
    fn picker_appends_once_and_badges_are_scoped_to_their_dialog() -> Result<()> {
        let catalog = skills();
        let mut dialogs = DialogSet::default();
        dialogs.open_new(EntityKind::Experience);
        dialogs.open_new(EntityKind::Project);

        for _ in 0..2 {
            let picker = dialogs.open_picker(EntityKind::Experience, &catalog)?;
            picker.select_category("Lang");
            picker.select_name("Go");
            assert_eq!(dialogs.confirm_picker(EntityKind::Experience)?, SkillId::new(7));
        }

        let experience = dialogs
            .get(EntityKind::Experience)
            .ok_or_else(|| anyhow::anyhow!("dialog missing"))?;
        assert_eq!(experience.form.skills().to_string(), "7");
        assert!(experience.picker.is_none());
        assert_eq!(experience.badges(&catalog)[0].name, "Go");

        assert!(!dialogs.remove_skill(EntityKind::Project, SkillId::new(7)));
        assert!(dialogs.remove_skill(EntityKind::Experience, SkillId::new(7)));
        Ok(())
    }

    #[test]
    fn picker_requires_both_selections_and_a_linking_kind() -> Result<()> {
        let catalog = skills();
        let mut dialogs = DialogSet::default();
        dialogs.open_new(EntityKind::Education);
        dialogs.open_new(EntityKind::About);

        assert!(dialogs.open_picker(EntityKind::About, &catalog).is_err());
        assert!(dialogs.open_picker(EntityKind::Project, &catalog).is_err());

        dialogs
            .open_picker(EntityKind::Education, &catalog)?
            .select_category("Lang");
        assert!(dialogs.confirm_picker(EntityKind::Education).is_err());
        assert!(
            dialogs
                .get(EntityKind::Education)
                .is_some_and(|dialog| dialog.picker.is_some())
        );
        assert!(dialogs.close_picker(EntityKind::Education));
        Ok(())
    }
}
