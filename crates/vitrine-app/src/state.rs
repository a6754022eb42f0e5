// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};

use crate::{
    DetailView, DialogSet, EntityKind, FieldTag, Profile, ProfilePayload, RowAttrs, SaveOutcome,
    SaveRequest, SectionView, SkillId, profile_row,
};

/// What the area under the profile table shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPane {
    Placeholder,
    Loaded(DetailView),
    Failed(String),
}

impl DetailPane {
    pub const PLACEHOLDER: &'static str = "select a profile to see its details";

    pub fn view(&self) -> Option<&DetailView> {
        match self {
            Self::Loaded(view) => Some(view),
            Self::Placeholder | Self::Failed(_) => None,
        }
    }

    pub fn view_mut(&mut self) -> Option<&mut DetailView> {
        match self {
            Self::Loaded(view) => Some(view),
            Self::Placeholder | Self::Failed(_) => None,
        }
    }
}

/// A row waiting for delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub kind: EntityKind,
    pub id: i64,
    pub profile: Option<String>,
}

impl DeleteTarget {
    /// Endpoint path relative to the server root. Skill deletes are scoped
    /// by the owning profile.
    pub fn path(&self) -> Result<String> {
        match self.kind {
            EntityKind::Skill => {
                let Some(profile) = self.profile.as_deref() else {
                    bail!("skill delete needs a profile -- select a profile and retry");
                };
                Ok(format!("/delete_skill/{profile}/{}/", self.id))
            }
            kind => Ok(format!("/delete_{}/{}/", kind.as_str(), self.id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub selected_profile: Option<String>,
    pub profiles: SectionView,
    pub detail: DetailPane,
    pub dialogs: DialogSet,
    pub pending_delete: Option<DeleteTarget>,
    pub alert: Option<String>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            selected_profile: None,
            profiles: SectionView::empty(EntityKind::Profile),
            detail: DetailPane::Placeholder,
            dialogs: DialogSet::default(),
            pending_delete: None,
            alert: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ToggleProfile(i64),
    ClearSelection,
    OpenNew(EntityKind),
    OpenRow(EntityKind, i64),
    CloseDialog(EntityKind),
    OpenPicker(EntityKind),
    ClosePicker(EntityKind),
    ConfirmPicker(EntityKind),
    RemoveSkill(EntityKind, SkillId),
    RequestDelete(EntityKind, i64),
    CancelDelete,
    ShowAlert(String),
    DismissAlert,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SelectionChanged(String),
    SelectionCleared,
    LoadRequested(String),
    DetailRendered,
    DialogOpened(EntityKind),
    DialogClosed(EntityKind),
    PickerOpened(EntityKind),
    PickerClosed(EntityKind),
    SkillLinked(EntityKind, SkillId),
    SkillUnlinked(EntityKind, SkillId),
    DeleteRequested(DeleteTarget),
    DeleteCancelled,
    RowRemoved(EntityKind, i64),
    AlertShown(String),
    AlertDismissed,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ToggleProfile(id) => self.toggle_profile(id),
            AppCommand::ClearSelection => self.clear_selection(),
            AppCommand::OpenNew(kind) => {
                if let Some(refused) = self.require_selection(kind) {
                    return vec![refused];
                }
                self.dialogs.open_new(kind);
                vec![AppEvent::DialogOpened(kind)]
            }
            AppCommand::OpenRow(kind, id) => {
                let Some(attrs) = self.row_attrs(kind, id) else {
                    return vec![self.set_status(&format!("no {} row {id}", kind.as_str()))];
                };
                self.dialogs.open_bound(kind, id, &attrs);
                vec![AppEvent::DialogOpened(kind)]
            }
            AppCommand::CloseDialog(kind) => match self.dialogs.close(kind) {
                Some(_) => vec![AppEvent::DialogClosed(kind)],
                None => Vec::new(),
            },
            AppCommand::OpenPicker(parent) => self.open_picker(parent),
            AppCommand::ClosePicker(parent) => {
                if self.dialogs.close_picker(parent) {
                    vec![AppEvent::PickerClosed(parent)]
                } else {
                    Vec::new()
                }
            }
            AppCommand::ConfirmPicker(parent) => match self.dialogs.confirm_picker(parent) {
                Ok(id) => vec![
                    AppEvent::SkillLinked(parent, id),
                    AppEvent::PickerClosed(parent),
                ],
                Err(error) => vec![self.show_alert(error.to_string())],
            },
            AppCommand::RemoveSkill(parent, id) => {
                if self.dialogs.remove_skill(parent, id) {
                    vec![AppEvent::SkillUnlinked(parent, id)]
                } else {
                    Vec::new()
                }
            }
            AppCommand::RequestDelete(kind, id) => {
                if let Some(refused) = self.require_selection(kind) {
                    return vec![refused];
                }
                let target = DeleteTarget {
                    kind,
                    id,
                    profile: self.selected_profile.clone(),
                };
                self.pending_delete = Some(target.clone());
                vec![AppEvent::DeleteRequested(target)]
            }
            AppCommand::CancelDelete => {
                self.pending_delete = None;
                vec![AppEvent::DeleteCancelled]
            }
            AppCommand::ShowAlert(message) => vec![self.show_alert(message)],
            AppCommand::DismissAlert => {
                self.alert = None;
                vec![AppEvent::AlertDismissed]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// Fills the profile table, replacing whatever it held.
    pub fn load_profiles(&mut self, profiles: &[Profile]) {
        self.profiles = SectionView::new(
            EntityKind::Profile,
            profiles.iter().map(profile_row).collect(),
        );
    }

    /// Full render after a selection change.
    pub fn load_profile_view(&mut self, payload: &ProfilePayload) -> Vec<AppEvent> {
        self.detail = DetailPane::Loaded(DetailView::from_payload(payload));
        vec![AppEvent::DetailRendered]
    }

    /// Incremental refresh after a mutation. A payload for another profile
    /// than the one on screen gets a full render.
    pub fn render_profile_data(&mut self, payload: &ProfilePayload) -> Vec<AppEvent> {
        self.profiles.upsert_row(profile_row(&payload.profile));
        match self.detail.view_mut() {
            Some(view) if view.identifiant == payload.profile.identifiant => {
                view.render_profile_data(payload)
            }
            _ => self.detail = DetailPane::Loaded(DetailView::from_payload(payload)),
        }
        vec![AppEvent::DetailRendered]
    }

    pub fn load_failed(&mut self, message: impl Into<String>) {
        self.detail = DetailPane::Failed(message.into());
    }

    pub fn save_request(&self, kind: EntityKind) -> Result<SaveRequest> {
        self.dialogs
            .get(kind)
            .ok_or_else(|| anyhow!("{} dialog is not open", kind.as_str()))?
            .save_request(self.selected_profile.as_deref())
    }

    /// Closes the saved dialog. A profile save moves the selection to the
    /// returned identifiant. The trailing `LoadRequested` names the profile
    /// to refresh.
    pub fn apply_saved(&mut self, kind: EntityKind, outcome: &SaveOutcome) -> Vec<AppEvent> {
        let mut events = Vec::new();
        if self.dialogs.close(kind).is_some() {
            events.push(AppEvent::DialogClosed(kind));
        }
        if kind == EntityKind::Profile {
            if let Some(profile) = outcome.profile() {
                self.profiles.upsert_row(profile_row(&profile));
            }
            if let Some(identifiant) = outcome.identifiant() {
                self.selected_profile = Some(identifiant.to_owned());
                events.push(AppEvent::SelectionChanged(identifiant.to_owned()));
            }
        }
        if let Some(identifiant) = self.selected_profile.clone() {
            events.push(AppEvent::LoadRequested(identifiant));
        }
        events.push(self.set_status(&format!("{} saved", kind.as_str())));
        events
    }

    /// Drops the deleted row from the rendered tables without a re-fetch.
    pub fn apply_deleted(&mut self, target: &DeleteTarget) -> Vec<AppEvent> {
        self.pending_delete = None;
        let mut events = Vec::new();
        if target.kind == EntityKind::Profile {
            self.profiles.remove_row(target.id);
            self.selected_profile = None;
            self.detail = DetailPane::Placeholder;
            events.push(AppEvent::RowRemoved(target.kind, target.id));
            events.push(AppEvent::SelectionCleared);
        } else if self
            .detail
            .view_mut()
            .is_some_and(|view| view.remove_row(target.kind, target.id))
        {
            events.push(AppEvent::RowRemoved(target.kind, target.id));
        }
        events.push(self.set_status(&format!("{} deleted", target.kind.as_str())));
        events
    }

    pub fn row_attrs(&self, kind: EntityKind, id: i64) -> Option<RowAttrs> {
        let row = match kind {
            EntityKind::Profile => self.profiles.row(id),
            kind => self.detail.view().and_then(|view| view.row(kind, id)),
        };
        row.map(|row| row.attrs.clone())
    }

    fn toggle_profile(&mut self, id: i64) -> Vec<AppEvent> {
        let Some(identifiant) = self
            .profiles
            .row(id)
            .and_then(|row| row.attrs.get(FieldTag::Identifiant))
            .map(str::to_owned)
        else {
            return vec![self.set_status(&format!("no profile row {id}"))];
        };

        if self.selected_profile.as_deref() == Some(identifiant.as_str()) {
            return self.clear_selection();
        }
        self.selected_profile = Some(identifiant.clone());
        vec![
            AppEvent::SelectionChanged(identifiant.clone()),
            AppEvent::LoadRequested(identifiant),
        ]
    }

    fn clear_selection(&mut self) -> Vec<AppEvent> {
        self.selected_profile = None;
        self.detail = DetailPane::Placeholder;
        vec![AppEvent::SelectionCleared]
    }

    fn open_picker(&mut self, parent: EntityKind) -> Vec<AppEvent> {
        if self.selected_profile.is_none() {
            return vec![self.set_status("select a profile before picking skills")];
        }
        let skills = self
            .detail
            .view()
            .map(|view| view.skills.clone())
            .unwrap_or_default();
        match self.dialogs.open_picker(parent, &skills) {
            Ok(_) => vec![AppEvent::PickerOpened(parent)],
            Err(error) => vec![self.set_status(&error.to_string())],
        }
    }

    fn require_selection(&mut self, kind: EntityKind) -> Option<AppEvent> {
        if kind.scoped_by_profile() && self.selected_profile.is_none() {
            return Some(self.set_status(&format!(
                "select a profile before editing {}",
                kind.section_title()
            )));
        }
        None
    }

    fn show_alert(&mut self, message: String) -> AppEvent {
        self.alert = Some(message.clone());
        AppEvent::AlertShown(message)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
