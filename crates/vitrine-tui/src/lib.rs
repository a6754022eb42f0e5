// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod render;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use vitrine_app::{
    AppCommand, AppEvent, AppState, DeleteTarget, EntityKind, FieldInput, FieldTag, PickerFocus,
    Profile, ProfilePayload, SaveOutcome, SaveRequest, SectionView,
};
use vitrine_client::BridgeError;

use crate::render::render;

const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);
const POLL_INTERVAL: Duration = Duration::from_millis(120);

/// Backend seam of the UI loop. Errors from the mutating calls carry the
/// text the alert overlay shows.
pub trait AppRuntime {
    fn load_profiles(&mut self) -> Result<Vec<Profile>>;
    fn load_profile(&mut self, identifiant: &str) -> Result<ProfilePayload, BridgeError>;
    fn save(&mut self, request: &SaveRequest) -> Result<SaveOutcome, BridgeError>;
    fn delete(&mut self, target: &DeleteTarget) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Focus {
    #[default]
    Profiles,
    Detail,
}

/// Which render follows a profile fetch: a selection change rebuilds the
/// pane, a mutation refreshes it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    Full,
    Refresh,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ViewData {
    focus: Focus,
    profile_cursor: usize,
    section_index: usize,
    row_cursor: usize,
    badge_cursor: usize,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    preselect: Option<&str>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    match runtime.load_profiles() {
        Ok(profiles) => state.load_profiles(&profiles),
        Err(error) => {
            tracing::error!(error = %error, "profile list failed to load");
            emit_status(
                state,
                &mut view_data,
                &internal_tx,
                format!("load failed: {error:#}"),
            );
        }
    }
    if let Some(identifiant) = preselect {
        select_profile(state, runtime, &mut view_data, &internal_tx, identifiant);
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(POLL_INTERVAL).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn arm_status_clear(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    arm_status_clear(view_data, internal_tx);
}

fn track_status(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>, events: &[AppEvent]) {
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        arm_status_clear(view_data, internal_tx);
    }
}

/// Acts on what a state transition asked for. `LoadRequested` is the only
/// event that reaches the backend.
fn follow_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
    mode: LoadMode,
) {
    track_status(view_data, internal_tx, &events);
    for event in events {
        match event {
            AppEvent::SelectionChanged(identifiant) => {
                if let Some(index) = profile_index(state, &identifiant) {
                    view_data.profile_cursor = index;
                }
                if mode == LoadMode::Full {
                    view_data.section_index = 0;
                    view_data.row_cursor = 0;
                }
            }
            AppEvent::LoadRequested(identifiant) => {
                load_profile(state, runtime, view_data, internal_tx, &identifiant, mode);
            }
            AppEvent::SelectionCleared => {
                view_data.focus = Focus::Profiles;
                view_data.section_index = 0;
                view_data.row_cursor = 0;
            }
            _ => {}
        }
    }
    clamp_cursors(state, view_data);
}

fn load_profile<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    identifiant: &str,
    mode: LoadMode,
) {
    match runtime.load_profile(identifiant) {
        Ok(payload) => {
            match mode {
                LoadMode::Full => state.load_profile_view(&payload),
                LoadMode::Refresh => state.render_profile_data(&payload),
            };
        }
        Err(error) => {
            tracing::error!(identifiant, error = %error, "profile load failed");
            state.load_failed(format!(
                "could not load profile {identifiant}: {}",
                error.alert()
            ));
            let status = if error.is_transport() {
                "server unreachable"
            } else {
                "profile load failed"
            };
            emit_status(state, view_data, internal_tx, status);
        }
    }
}

fn profile_index(state: &AppState, identifiant: &str) -> Option<usize> {
    state
        .profiles
        .rows
        .iter()
        .position(|row| row.attrs.get(FieldTag::Identifiant) == Some(identifiant))
}

fn select_profile<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    identifiant: &str,
) {
    let Some(index) = profile_index(state, identifiant) else {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("no profile {identifiant}"),
        );
        return;
    };
    view_data.profile_cursor = index;
    if state.selected_profile.as_deref() != Some(identifiant) {
        toggle_profile_under_cursor(state, runtime, view_data, internal_tx);
    }
}

fn current_section<'a>(state: &'a AppState, view_data: &ViewData) -> Option<&'a SectionView> {
    state.detail.view()?.sections.get(view_data.section_index)
}

fn focused_kind(state: &AppState, view_data: &ViewData) -> Option<EntityKind> {
    match view_data.focus {
        Focus::Profiles => Some(EntityKind::Profile),
        Focus::Detail => current_section(state, view_data).map(|section| section.kind),
    }
}

fn row_under_cursor(state: &AppState, view_data: &ViewData) -> Option<(EntityKind, i64)> {
    match view_data.focus {
        Focus::Profiles => state
            .profiles
            .rows
            .get(view_data.profile_cursor)
            .map(|row| (EntityKind::Profile, row.id)),
        Focus::Detail => {
            let section = current_section(state, view_data)?;
            section
                .rows
                .get(view_data.row_cursor)
                .map(|row| (section.kind, row.id))
        }
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

fn clamp_cursors(state: &AppState, view_data: &mut ViewData) {
    view_data.profile_cursor = clamp_index(view_data.profile_cursor, state.profiles.rows.len());
    let sections = state.detail.view().map_or(0, |view| view.sections.len());
    view_data.section_index = clamp_index(view_data.section_index, sections);
    let rows = current_section(state, view_data).map_or(0, |section| section.rows.len());
    view_data.row_cursor = clamp_index(view_data.row_cursor, rows);
    if sections == 0 {
        view_data.focus = Focus::Profiles;
    }
}

fn move_cursor(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let len = match view_data.focus {
        Focus::Profiles => state.profiles.rows.len(),
        Focus::Detail => current_section(state, view_data).map_or(0, |section| section.rows.len()),
    };
    if len == 0 || state.dialogs.scroll_locked() {
        return;
    }
    let cursor = match view_data.focus {
        Focus::Profiles => &mut view_data.profile_cursor,
        Focus::Detail => &mut view_data.row_cursor,
    };
    *cursor = (*cursor as isize + delta).clamp(0, len as isize - 1) as usize;
}

fn cycle_section(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let sections = state.detail.view().map_or(0, |view| view.sections.len());
    if sections == 0 {
        return;
    }
    view_data.section_index =
        (view_data.section_index as isize + delta).rem_euclid(sections as isize) as usize;
    view_data.row_cursor = 0;
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
        return true;
    }

    if state.alert.is_some() {
        state.dispatch(AppCommand::DismissAlert);
        return false;
    }

    if state.pending_delete.is_some() {
        handle_delete_confirm_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if let Some((kind, picking)) = state
        .dialogs
        .active()
        .map(|dialog| (dialog.kind(), dialog.picker.is_some()))
    {
        if picking {
            handle_picker_key(state, view_data, internal_tx, kind, key);
        } else {
            handle_dialog_key(state, runtime, view_data, internal_tx, kind, key);
        }
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    handle_browse_key(state, runtime, view_data, internal_tx, key)
}

fn handle_browse_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Tab | KeyCode::BackTab => switch_focus(state, view_data, internal_tx),
        KeyCode::Char('j') | KeyCode::Down => move_cursor(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(state, view_data, -1),
        KeyCode::Char('l') | KeyCode::Right => cycle_section(state, view_data, 1),
        KeyCode::Char('h') | KeyCode::Left => cycle_section(state, view_data, -1),
        KeyCode::Enter | KeyCode::Char(' ') => match view_data.focus {
            Focus::Profiles => toggle_profile_under_cursor(state, runtime, view_data, internal_tx),
            Focus::Detail => open_row_under_cursor(state, view_data, internal_tx),
        },
        KeyCode::Char('e') => open_row_under_cursor(state, view_data, internal_tx),
        KeyCode::Char('a') => open_new(state, view_data, internal_tx),
        KeyCode::Char('d') => request_delete(state, view_data, internal_tx),
        KeyCode::Char('r') => reload_selected(state, runtime, view_data, internal_tx),
        KeyCode::Esc if state.selected_profile.is_some() => {
            let events = state.dispatch(AppCommand::ClearSelection);
            follow_events(
                state,
                runtime,
                view_data,
                internal_tx,
                events,
                LoadMode::Full,
            );
        }
        _ => {}
    }
    false
}

fn switch_focus(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match view_data.focus {
        Focus::Detail => view_data.focus = Focus::Profiles,
        Focus::Profiles => {
            if state
                .detail
                .view()
                .is_some_and(|view| !view.sections.is_empty())
            {
                view_data.focus = Focus::Detail;
                clamp_cursors(state, view_data);
            } else {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    "select a profile to browse its sections",
                );
            }
        }
    }
}

fn toggle_profile_under_cursor<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = state
        .profiles
        .rows
        .get(view_data.profile_cursor)
        .map(|row| row.id)
    else {
        emit_status(state, view_data, internal_tx, "no profile to select");
        return;
    };
    let events = state.dispatch(AppCommand::ToggleProfile(id));
    follow_events(
        state,
        runtime,
        view_data,
        internal_tx,
        events,
        LoadMode::Full,
    );
}

fn reload_selected<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(identifiant) = state.selected_profile.clone() else {
        emit_status(state, view_data, internal_tx, "no profile selected");
        return;
    };
    load_profile(
        state,
        runtime,
        view_data,
        internal_tx,
        &identifiant,
        LoadMode::Full,
    );
    clamp_cursors(state, view_data);
}

fn open_row_under_cursor(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some((kind, id)) = row_under_cursor(state, view_data) else {
        emit_status(state, view_data, internal_tx, "no row under the cursor");
        return;
    };
    view_data.badge_cursor = 0;
    let events = state.dispatch(AppCommand::OpenRow(kind, id));
    track_status(view_data, internal_tx, &events);
}

fn open_new(state: &mut AppState, view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    let Some(kind) = focused_kind(state, view_data) else {
        emit_status(state, view_data, internal_tx, "no section to add to");
        return;
    };
    view_data.badge_cursor = 0;
    let events = state.dispatch(AppCommand::OpenNew(kind));
    track_status(view_data, internal_tx, &events);
}

fn request_delete(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some((kind, id)) = row_under_cursor(state, view_data) else {
        emit_status(state, view_data, internal_tx, "no row under the cursor");
        return;
    };
    let events = state.dispatch(AppCommand::RequestDelete(kind, id));
    track_status(view_data, internal_tx, &events);
}

fn handle_delete_confirm_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            confirm_delete(state, runtime, view_data, internal_tx);
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            state.dispatch(AppCommand::CancelDelete);
        }
        _ => {}
    }
}

/// Deletes the pending row and drops it from the tables. A successful
/// delete never triggers a reload.
fn confirm_delete<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(target) = state.pending_delete.clone() else {
        return;
    };
    match runtime.delete(&target) {
        Ok(()) => {
            tracing::info!(kind = target.kind.as_str(), id = target.id, "row deleted");
            let events = state.apply_deleted(&target);
            follow_events(
                state,
                runtime,
                view_data,
                internal_tx,
                events,
                LoadMode::Refresh,
            );
        }
        Err(error) => {
            tracing::error!(
                kind = target.kind.as_str(),
                id = target.id,
                error = %error,
                "delete failed"
            );
            state.dispatch(AppCommand::CancelDelete);
            state.dispatch(AppCommand::ShowAlert(format!(
                "delete failed: {}",
                error.alert()
            )));
        }
    }
}

fn handle_dialog_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: EntityKind,
    key: KeyEvent,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('s') {
            save_dialog(state, runtime, view_data, internal_tx, kind);
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            state.dispatch(AppCommand::CloseDialog(kind));
        }
        KeyCode::Tab | KeyCode::Down => move_dialog_cursor(state, view_data, kind, 1),
        KeyCode::BackTab | KeyCode::Up => move_dialog_cursor(state, view_data, kind, -1),
        _ => edit_focused_field(state, view_data, internal_tx, kind, key),
    }
}

fn move_dialog_cursor(state: &mut AppState, view_data: &mut ViewData, kind: EntityKind, delta: isize) {
    if let Some(dialog) = state.dialogs.get_mut(kind) {
        dialog.move_cursor(delta);
        view_data.badge_cursor = 0;
    }
}

fn edit_focused_field(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: EntityKind,
    key: KeyEvent,
) {
    let Some((tag, input)) = state
        .dialogs
        .get(kind)
        .and_then(|dialog| dialog.focused_field())
        .map(|spec| (spec.tag, spec.input))
    else {
        return;
    };

    match input {
        FieldInput::Line | FieldInput::Text => {
            let Some(dialog) = state.dialogs.get_mut(kind) else {
                return;
            };
            if key.code == KeyCode::Enter && input == FieldInput::Line {
                dialog.move_cursor(1);
                return;
            }
            let Some(value) = dialog.form.value_mut(tag) else {
                return;
            };
            match key.code {
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::ALT) => value.push(ch),
                KeyCode::Enter => value.push('\n'),
                KeyCode::Backspace => {
                    value.pop();
                }
                _ => {}
            }
        }
        FieldInput::Level => {
            let delta = match key.code {
                KeyCode::Left | KeyCode::Char('<') | KeyCode::Char('-') | KeyCode::Char('h') => -1,
                KeyCode::Right | KeyCode::Char('>') | KeyCode::Char('+') | KeyCode::Char('l') => 1,
                _ => return,
            };
            if let Some(dialog) = state.dialogs.get_mut(kind) {
                dialog.form.adjust_level(delta);
            }
        }
        FieldInput::SkillList => edit_skill_list(state, view_data, internal_tx, kind, key),
    }
}

fn edit_skill_list(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: EntityKind,
    key: KeyEvent,
) {
    let badges = {
        let skills = state
            .detail
            .view()
            .map(|view| view.skills.as_slice())
            .unwrap_or(&[]);
        state
            .dialogs
            .get(kind)
            .map(|dialog| dialog.badges(skills))
            .unwrap_or_default()
    };

    match key.code {
        KeyCode::Enter | KeyCode::Char('+') => {
            let events = state.dispatch(AppCommand::OpenPicker(kind));
            track_status(view_data, internal_tx, &events);
        }
        KeyCode::Left | KeyCode::Char('h') => {
            view_data.badge_cursor = view_data.badge_cursor.saturating_sub(1);
        }
        KeyCode::Right | KeyCode::Char('l') => {
            view_data.badge_cursor = clamp_index(view_data.badge_cursor + 1, badges.len());
        }
        KeyCode::Backspace | KeyCode::Delete | KeyCode::Char('x') => {
            let Some(badge) = badges.get(view_data.badge_cursor) else {
                return;
            };
            let events = state.dispatch(AppCommand::RemoveSkill(kind, badge.id));
            if !events.is_empty() {
                view_data.badge_cursor =
                    clamp_index(view_data.badge_cursor, badges.len().saturating_sub(1));
            }
        }
        _ => {}
    }
}

fn handle_picker_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    parent: EntityKind,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            state.dispatch(AppCommand::ClosePicker(parent));
        }
        KeyCode::Enter => {
            let events = state.dispatch(AppCommand::ConfirmPicker(parent));
            let linked = events.iter().find_map(|event| match event {
                AppEvent::SkillLinked(_, id) => Some(*id),
                _ => None,
            });
            if let Some(id) = linked {
                let name = state
                    .detail
                    .view()
                    .and_then(|view| view.skills.iter().find(|skill| skill.id == id))
                    .map_or_else(|| id.to_string(), |skill| skill.name.clone());
                emit_status(state, view_data, internal_tx, format!("linked {name}"));
            }
        }
        code => {
            let Some(picker) = state
                .dialogs
                .get_mut(parent)
                .and_then(|dialog| dialog.picker.as_mut())
            else {
                return;
            };
            match code {
                KeyCode::Tab | KeyCode::BackTab => {
                    picker.focus = match picker.focus {
                        PickerFocus::Category => PickerFocus::Name,
                        PickerFocus::Name => PickerFocus::Category,
                    };
                }
                KeyCode::Left | KeyCode::Char('h') => picker.focus = PickerFocus::Category,
                KeyCode::Right | KeyCode::Char('l') => picker.focus = PickerFocus::Name,
                KeyCode::Down | KeyCode::Char('j') => cycle_picker(picker, 1),
                KeyCode::Up | KeyCode::Char('k') => cycle_picker(picker, -1),
                _ => {}
            }
        }
    }
}

fn cycle_picker(picker: &mut vitrine_app::SkillPicker, delta: isize) {
    match picker.focus {
        PickerFocus::Category => picker.cycle_category(delta),
        PickerFocus::Name => picker.cycle_name(delta),
    }
}

/// Validates, posts the dialog and refreshes the selected profile. The
/// dialog stays open when either step fails.
fn save_dialog<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: EntityKind,
) {
    let request = match state.save_request(kind) {
        Ok(request) => request,
        Err(error) => {
            state.dispatch(AppCommand::ShowAlert(error.to_string()));
            return;
        }
    };

    match runtime.save(&request) {
        Ok(outcome) => {
            tracing::info!(
                kind = kind.as_str(),
                id = ?outcome.saved_id(),
                is_new = request.is_new,
                "dialog saved"
            );
            let events = state.apply_saved(kind, &outcome);
            follow_events(
                state,
                runtime,
                view_data,
                internal_tx,
                events,
                LoadMode::Refresh,
            );
        }
        Err(error) => {
            tracing::error!(kind = kind.as_str(), error = %error, "save failed");
            state.dispatch(AppCommand::ShowAlert(error.alert()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, Focus, InternalEvent, ViewData, handle_key_event, process_internal_events,
        select_profile,
    };
    use crate::render::{render, status_text};
    use anyhow::Result;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::json;
    use std::sync::mpsc::{self, Receiver, Sender};
    use vitrine_app::{
        AppState, DeleteTarget, DetailPane, EntityKind, FieldTag, Profile, ProfilePayload,
        SaveOutcome, SaveRequest, Skill, SkillId,
    };
    use vitrine_client::BridgeError;
    use vitrine_testkit::PortfolioFaker;

    #[derive(Debug, Default)]
    struct TestRuntime {
        profiles: Vec<Profile>,
        payloads: Vec<ProfilePayload>,
        outcome: Option<SaveOutcome>,
        save_error: Option<String>,
        delete_error: Option<String>,
        load_status: Option<u16>,
        loads: Vec<String>,
        saves: Vec<SaveRequest>,
        deletes: Vec<DeleteTarget>,
    }

    impl AppRuntime for TestRuntime {
        fn load_profiles(&mut self) -> Result<Vec<Profile>> {
            Ok(self.profiles.clone())
        }

        fn load_profile(&mut self, identifiant: &str) -> Result<ProfilePayload, BridgeError> {
            self.loads.push(identifiant.to_owned());
            if let Some(status) = self.load_status {
                return Err(BridgeError::Status {
                    status,
                    path: "/load_data/".to_owned(),
                });
            }
            self.payloads
                .iter()
                .find(|payload| payload.profile.identifiant == identifiant)
                .cloned()
                .ok_or_else(|| BridgeError::Server(format!("profile {identifiant} not found")))
        }

        fn save(&mut self, request: &SaveRequest) -> Result<SaveOutcome, BridgeError> {
            self.saves.push(request.clone());
            if let Some(message) = &self.save_error {
                return Err(BridgeError::Server(message.clone()));
            }
            Ok(self.outcome.clone().unwrap_or_else(|| SaveOutcome {
                entity_type: request.kind().map_or("", |kind| kind.as_str()).to_owned(),
                data: json!({"id": 900}),
            }))
        }

        fn delete(&mut self, target: &DeleteTarget) -> Result<(), BridgeError> {
            self.deletes.push(target.clone());
            match &self.delete_error {
                Some(message) => Err(BridgeError::Server(message.clone())),
                None => Ok(()),
            }
        }
    }

    fn internal_channel() -> (Sender<InternalEvent>, Receiver<InternalEvent>) {
        mpsc::channel()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn run_keys(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        keys: &[KeyEvent],
    ) -> bool {
        keys.iter()
            .any(|key| handle_key_event(state, runtime, view_data, tx, *key))
    }

    fn type_text(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &Sender<InternalEvent>,
        text: &str,
    ) {
        for ch in text.chars() {
            handle_key_event(state, runtime, view_data, tx, key(KeyCode::Char(ch)));
        }
    }

    fn skill(id: i64, category: &str, name: &str) -> Skill {
        Skill {
            id: SkillId::new(id),
            category: category.to_owned(),
            name: name.to_owned(),
            level: 7,
        }
    }

    /// Two profiles; "acme" has skills 42 (Rust) and 43 (Go) and nothing else.
    fn fixture() -> (AppState, TestRuntime) {
        let mut faker = PortfolioFaker::new(9);
        let acme = faker.profile("acme");
        let globex = faker.profile("globex");
        let mut payload = faker.bare_payload("acme");
        payload.profile = acme.clone();
        payload.skills = vec![skill(42, "Languages", "Rust"), skill(43, "Languages", "Go")];
        payload.education = Some(Vec::new());

        let runtime = TestRuntime {
            profiles: vec![acme.clone(), globex.clone()],
            payloads: vec![payload, faker.payload("globex")],
            ..TestRuntime::default()
        };
        let mut state = AppState::default();
        state.load_profiles(&runtime.profiles);
        (state, runtime)
    }

    fn selected_fixture() -> (AppState, TestRuntime, ViewData) {
        let (mut state, mut runtime) = fixture();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();
        select_profile(&mut state, &mut runtime, &mut view_data, &tx, "acme");
        (state, runtime, view_data)
    }

    fn section_kinds(state: &AppState) -> Vec<EntityKind> {
        state
            .detail
            .view()
            .map(|view| view.sections.iter().map(|section| section.kind).collect())
            .unwrap_or_default()
    }

    #[test]
    fn selecting_a_profile_loads_it_once_and_deselecting_makes_no_call() {
        let (mut state, mut runtime) = fixture();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Enter)]);
        assert_eq!(state.selected_profile.as_deref(), Some("acme"));
        assert_eq!(runtime.loads, vec!["acme".to_owned()]);
        assert_eq!(
            section_kinds(&state),
            vec![
                EntityKind::Skill,
                EntityKind::About,
                EntityKind::Experience,
                EntityKind::Education,
                EntityKind::Project,
            ]
        );

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Enter)]);
        assert_eq!(state.selected_profile, None);
        assert_eq!(state.detail, DetailPane::Placeholder);
        assert_eq!(runtime.loads.len(), 1);
    }

    #[test]
    fn switching_profiles_rebuilds_the_detail_pane() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Char('j')), key(KeyCode::Enter)],
        );
        assert_eq!(state.selected_profile.as_deref(), Some("globex"));
        assert_eq!(runtime.loads, vec!["acme".to_owned(), "globex".to_owned()]);
        assert_eq!(
            state.detail.view().map(|view| view.identifiant.as_str()),
            Some("globex")
        );
        assert_eq!(section_kinds(&state).first(), Some(&EntityKind::Color));
    }

    #[test]
    fn failed_loads_show_a_banner_instead_of_the_sections() {
        let (mut state, mut runtime) = fixture();
        runtime.payloads.clear();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Enter)]);
        match &state.detail {
            DetailPane::Failed(message) => assert!(message.contains("profile acme not found")),
            other => panic!("expected a failure banner, got {other:?}"),
        }
        assert_eq!(state.status_line.as_deref(), Some("profile load failed"));
    }

    #[test]
    fn unreachable_server_on_load_is_reported_as_such() {
        let (mut state, mut runtime) = fixture();
        runtime.load_status = Some(502);
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Enter)]);
        match &state.detail {
            DetailPane::Failed(message) => {
                assert!(message.contains("server returned 502 for /load_data/"));
            }
            other => panic!("expected a failure banner, got {other:?}"),
        }
        assert_eq!(state.status_line.as_deref(), Some("server unreachable"));
    }

    #[test]
    fn deleting_skill_42_sends_one_request_and_never_reloads() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Char('d'))],
        );
        assert_eq!(
            state.pending_delete,
            Some(DeleteTarget {
                kind: EntityKind::Skill,
                id: 42,
                profile: Some("acme".to_owned()),
            })
        );
        assert!(runtime.deletes.is_empty());

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Char('y'))]);
        assert_eq!(runtime.deletes.len(), 1);
        assert_eq!(
            runtime.deletes[0].path().ok().as_deref(),
            Some("/delete_skill/acme/42/")
        );
        assert_eq!(runtime.loads, vec!["acme".to_owned()]);
        assert_eq!(state.pending_delete, None);

        let view = state.detail.view().expect("detail stays loaded");
        assert!(view.row(EntityKind::Skill, 42).is_none());
        assert!(view.row(EntityKind::Skill, 43).is_some());
        assert_eq!(state.status_line.as_deref(), Some("skill deleted"));
    }

    #[test]
    fn cancelled_deletes_make_no_request() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Char('d')), key(KeyCode::Esc)],
        );
        assert_eq!(state.pending_delete, None);
        assert!(runtime.deletes.is_empty());
        assert!(state
            .detail
            .view()
            .is_some_and(|view| view.row(EntityKind::Skill, 42).is_some()));
    }

    #[test]
    fn failed_deletes_alert_and_keep_the_row() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        runtime.delete_error = Some("skill is still linked".to_owned());
        let (tx, _rx) = internal_channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Char('d')), key(KeyCode::Char('y'))],
        );
        assert_eq!(
            state.alert.as_deref(),
            Some("delete failed: skill is still linked")
        );
        assert!(state
            .detail
            .view()
            .is_some_and(|view| view.row(EntityKind::Skill, 42).is_some()));

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Enter)]);
        assert_eq!(state.alert, None);
    }

    #[test]
    fn duplicate_identifiant_alerts_and_keeps_the_dialog_open() {
        let (mut state, mut runtime) = fixture();
        runtime.save_error = Some("duplicate identifiant".to_owned());
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Char('a'))]);
        assert!(state.dialogs.is_open(EntityKind::Profile));
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "acme");
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "Ada");
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[ctrl('s')]);

        assert_eq!(runtime.saves.len(), 1);
        assert_eq!(runtime.saves[0].data["identifiant"], json!("acme"));
        assert_eq!(runtime.saves[0].data["profile"], json!(null));
        assert_eq!(state.alert.as_deref(), Some("duplicate identifiant"));
        assert!(state.dialogs.is_open(EntityKind::Profile));
        assert!(runtime.loads.is_empty());
        assert_eq!(state.profiles.rows.len(), 2);
    }

    #[test]
    fn invalid_dialogs_alert_without_a_request() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Char('a')), ctrl('s')],
        );
        assert!(state.dialogs.is_open(EntityKind::Skill));
        assert!(runtime.saves.is_empty());
        assert!(state
            .alert
            .as_deref()
            .is_some_and(|message| message.contains("category is required")));
    }

    #[test]
    fn saving_a_skill_posts_it_and_refreshes_once() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Char('a'))],
        );
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "Databases");
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "Postgres");
        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[
                key(KeyCode::Tab),
                key(KeyCode::Right),
                key(KeyCode::Right),
                key(KeyCode::Right),
                ctrl('s'),
            ],
        );

        assert_eq!(runtime.saves.len(), 1);
        let request = &runtime.saves[0];
        assert_eq!(request.modal_id, "skillModal");
        assert!(request.is_new);
        assert_eq!(request.data["category"], json!("Databases"));
        assert_eq!(request.data["name"], json!("Postgres"));
        assert_eq!(request.data["level"], json!("3"));
        assert_eq!(request.data["profile"], json!("acme"));
        assert!(request.data.get("id").is_none());

        assert!(!state.dialogs.is_open(EntityKind::Skill));
        assert_eq!(runtime.loads, vec!["acme".to_owned(), "acme".to_owned()]);
        assert_eq!(state.status_line.as_deref(), Some("skill saved"));
        assert_eq!(view_data.focus, Focus::Detail);
    }

    #[test]
    fn profile_cursor_stays_on_the_selected_profile_after_a_section_save() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Char('a'))],
        );
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "Databases");
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, &tx, "Postgres");
        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Right), ctrl('s')],
        );
        assert_eq!(runtime.saves.len(), 1);

        let order = state
            .profiles
            .rows
            .iter()
            .filter_map(|row| row.attrs.get(FieldTag::Identifiant))
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["acme", "globex"]);

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Enter)],
        );
        assert_eq!(state.selected_profile, None);
        assert_eq!(state.detail, DetailPane::Placeholder);
        assert_eq!(runtime.loads, vec!["acme".to_owned(), "acme".to_owned()]);
    }

    #[test]
    fn picker_links_and_badges_unlink_within_the_dialog() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();

        // Sections: skill, about, experience, ...
        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[
                key(KeyCode::Tab),
                key(KeyCode::Char('l')),
                key(KeyCode::Char('l')),
                key(KeyCode::Char('a')),
            ],
        );
        assert!(state.dialogs.is_open(EntityKind::Experience));
        let skills_index = state
            .dialogs
            .get(EntityKind::Experience)
            .and_then(|dialog| {
                dialog
                    .fields()
                    .iter()
                    .position(|spec| spec.tag == FieldTag::Skills)
            })
            .expect("experience dialogs list skills");
        for _ in 0..skills_index {
            handle_key_event(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Tab));
        }

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[
                key(KeyCode::Enter),
                key(KeyCode::Down),
                key(KeyCode::Tab),
                key(KeyCode::Down),
                key(KeyCode::Down),
                key(KeyCode::Enter),
            ],
        );
        let linked = |state: &AppState| {
            state
                .dialogs
                .get(EntityKind::Experience)
                .map(|dialog| dialog.form.skills().iter().map(|id| id.get()).collect::<Vec<_>>())
                .unwrap_or_default()
        };
        assert_eq!(linked(&state), vec![43]);
        assert_eq!(state.status_line.as_deref(), Some("linked Go"));
        assert!(state
            .dialogs
            .get(EntityKind::Experience)
            .is_some_and(|dialog| dialog.picker.is_none()));

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Char('x'))]);
        assert!(linked(&state).is_empty());
        assert!(runtime.saves.is_empty());
    }

    #[test]
    fn picker_without_a_name_alerts_and_stays_open() {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[
                key(KeyCode::Tab),
                key(KeyCode::Char('h')),
                key(KeyCode::Char('a')),
            ],
        );
        assert!(state.dialogs.is_open(EntityKind::Project));
        let skills_index = state
            .dialogs
            .get(EntityKind::Project)
            .and_then(|dialog| {
                dialog
                    .fields()
                    .iter()
                    .position(|spec| spec.tag == FieldTag::Skills)
            })
            .expect("project dialogs list skills");
        for _ in 0..skills_index {
            handle_key_event(&mut state, &mut runtime, &mut view_data, &tx, key(KeyCode::Tab));
        }

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Enter), key(KeyCode::Down), key(KeyCode::Enter)],
        );
        assert!(state.alert.is_some());
        assert!(state
            .dialogs
            .get(EntityKind::Project)
            .is_some_and(|dialog| dialog.picker.is_some()));
    }

    #[test]
    fn editing_rows_requires_a_selected_profile_for_sections() {
        let (mut state, mut runtime) = fixture();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Tab)]);
        assert_eq!(view_data.focus, Focus::Profiles);
        assert_eq!(
            state.status_line.as_deref(),
            Some("select a profile to browse its sections")
        );

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Char('e'))]);
        assert!(state.dialogs.is_open(EntityKind::Profile));
        let identifiant = state
            .dialogs
            .get(EntityKind::Profile)
            .and_then(|dialog| dialog.form.value(FieldTag::Identifiant).map(str::to_owned));
        assert_eq!(identifiant.as_deref(), Some("acme"));
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Esc)]);
        assert!(state.dialogs.is_empty());
    }

    #[test]
    fn status_clears_only_for_the_latest_token() {
        let mut state = AppState::default();
        let view_data = ViewData {
            status_token: 2,
            ..ViewData::default()
        };
        let (tx, rx) = internal_channel();
        state.status_line = Some("saved".to_owned());

        tx.send(InternalEvent::ClearStatus { token: 1 })
            .expect("channel open");
        process_internal_events(&mut state, &view_data, &rx);
        assert_eq!(state.status_line.as_deref(), Some("saved"));

        tx.send(InternalEvent::ClearStatus { token: 2 })
            .expect("channel open");
        process_internal_events(&mut state, &view_data, &rx);
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn quit_keys_end_the_loop_only_when_browsing() {
        let (mut state, mut runtime) = fixture();
        let mut view_data = ViewData::default();
        let (tx, _rx) = internal_channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Char('a'))]);
        assert!(!run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Char('q'))]
        ));
        assert!(run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[ctrl('q')]));
    }

    #[test]
    fn every_pane_renders_without_panicking() -> Result<()> {
        let (mut state, mut runtime, mut view_data) = selected_fixture();
        let (tx, _rx) = internal_channel();
        let mut terminal = Terminal::new(TestBackend::new(120, 40))?;

        terminal.draw(|frame| render(frame, &state, &view_data))?;
        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Tab), key(KeyCode::Char('e'))],
        );
        terminal.draw(|frame| render(frame, &state, &view_data))?;
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Esc)]);
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[key(KeyCode::Char('d'))]);
        terminal.draw(|frame| render(frame, &state, &view_data))?;
        assert!(status_text(&state, &view_data).contains("confirm"));

        state.pending_delete = None;
        state.alert = Some("boom".to_owned());
        terminal.draw(|frame| render(frame, &state, &view_data))?;
        Ok(())
    }
}
