// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use vitrine_app::{
    AppState, DeleteTarget, DetailPane, DetailView, Dialog, EntityKind, FieldInput, FieldTag,
    MAX_SKILL_LEVEL, PickerFocus, SectionView, Skill, SkillPicker,
};

use crate::{Focus, ViewData};

pub(crate) fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(35),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().title("vitrine").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    render_profiles(frame, layout[1], state, view_data);
    render_detail(frame, layout[2], state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[3]);

    if state.dialogs.backdrop() {
        frame.render_widget(
            Block::default().style(Style::default().add_modifier(Modifier::DIM)),
            frame.area(),
        );
    }

    if let Some(dialog) = state.dialogs.active() {
        let skills = state
            .detail
            .view()
            .map(|view| view.skills.as_slice())
            .unwrap_or(&[]);
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(dialog_text(dialog, skills, view_data.badge_cursor))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(dialog_title(dialog, state.dialogs.len()))
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(body, area);

        if let Some(picker) = &dialog.picker {
            let area = centered_rect(44, 50, frame.area());
            frame.render_widget(Clear, area);
            let body = Paragraph::new(picker_text(picker)).block(
                Block::default()
                    .title("link a skill")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Magenta)),
            );
            frame.render_widget(body, area);
        }
    }

    if let Some(target) = &state.pending_delete {
        let area = centered_rect(50, 22, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(delete_prompt_text(target))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("confirm delete")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Yellow)),
            );
        frame.render_widget(body, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }

    if let Some(message) = &state.alert {
        let area = centered_rect(50, 25, frame.area());
        frame.render_widget(Clear, area);
        let alert = Paragraph::new(format!("{message}\n\npress any key"))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("alert")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(alert, area);
    }
}

fn header_text(state: &AppState) -> String {
    match &state.selected_profile {
        Some(identifiant) => format!("profile: {identifiant}"),
        None => "no profile selected".to_owned(),
    }
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn render_profiles(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let focused = view_data.focus == Focus::Profiles;
    let title = format!("profiles ({})", state.profiles.rows.len());
    if state.profiles.rows.is_empty() {
        let empty = Paragraph::new(EntityKind::Profile.empty_message()).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style(focused)),
        );
        frame.render_widget(empty, area);
        return;
    }

    render_section_table(
        frame,
        area,
        &state.profiles,
        title,
        focused.then_some(view_data.profile_cursor),
        state.selected_profile.as_deref(),
    );
}

fn render_detail(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let view = match &state.detail {
        DetailPane::Placeholder => {
            let placeholder = Paragraph::new(DetailPane::PLACEHOLDER)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title("details").borders(Borders::ALL));
            frame.render_widget(placeholder, area);
            return;
        }
        DetailPane::Failed(message) => {
            let banner = Paragraph::new(message.as_str())
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(Color::Red))
                .block(
                    Block::default()
                        .title("details")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                );
            frame.render_widget(banner, area);
            return;
        }
        DetailPane::Loaded(view) => view,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let tabs = Tabs::new(section_titles(view))
        .block(
            Block::default()
                .title(format!("details: {}", view.identifiant))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(view_data.section_index);
    frame.render_widget(tabs, chunks[0]);

    let focused = view_data.focus == Focus::Detail;
    let Some(section) = view.sections.get(view_data.section_index) else {
        let empty = Paragraph::new("no sections for this profile")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, chunks[1]);
        return;
    };
    let title = section.kind.section_title().to_owned();
    if section.rows.is_empty() {
        let empty = Paragraph::new(section.kind.empty_message()).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style(focused)),
        );
        frame.render_widget(empty, chunks[1]);
        return;
    }

    render_section_table(
        frame,
        chunks[1],
        section,
        title,
        focused.then_some(view_data.row_cursor),
        None,
    );
}

fn section_titles(view: &DetailView) -> Vec<String> {
    view.sections
        .iter()
        .map(|section| format!("{} ({})", section.kind.section_title(), section.rows.len()))
        .collect()
}

/// `marked` names the selected profile; its row is drawn highlighted.
fn render_section_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    section: &SectionView,
    title: String,
    cursor: Option<usize>,
    marked: Option<&str>,
) {
    let header_cells = section.header().iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells);

    let rows = section.rows.iter().enumerate().map(|(index, row)| {
        let mut style = Style::default();
        if marked.is_some() && row.attrs.get(FieldTag::Identifiant) == marked {
            style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
        }
        if cursor == Some(index) {
            style = style.bg(Color::DarkGray);
        }
        let cells = row
            .cells
            .iter()
            .map(|cell| Cell::from(first_line(cell)))
            .collect::<Vec<_>>();
        Row::new(cells).style(style)
    });

    let widths = vec![Constraint::Min(8); section.header().len().max(1)];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style(cursor.is_some())),
        );
    let mut table_state = TableState::default().with_selected(cursor);
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn dialog_title(dialog: &Dialog, open: usize) -> String {
    let target = match dialog.bound_id() {
        Some(id) => format!("#{id}"),
        None => "(new)".to_owned(),
    };
    if open > 1 {
        format!("{} {target} [{open} open]", dialog.kind().title())
    } else {
        format!("{} {target}", dialog.kind().title())
    }
}

pub(crate) fn dialog_text(dialog: &Dialog, skills: &[Skill], badge_cursor: usize) -> String {
    let mut lines = Vec::new();
    for (index, spec) in dialog.fields().iter().enumerate() {
        let focused = index == dialog.cursor;
        let marker = if focused { ">" } else { " " };
        let raw = dialog.form.value(spec.tag).unwrap_or_default();
        match spec.input {
            FieldInput::Line => {
                let caret = if focused { "_" } else { "" };
                lines.push(format!("{marker} {}: {raw}{caret}", spec.label));
            }
            FieldInput::Text => {
                let caret = if focused { "_" } else { "" };
                let mut text_lines = raw.split('\n');
                let first = text_lines.next().unwrap_or_default();
                lines.push(format!("{marker} {}: {first}", spec.label));
                lines.extend(text_lines.map(|line| format!("    {line}")));
                if let Some(last) = lines.last_mut() {
                    last.push_str(caret);
                }
            }
            FieldInput::Level => {
                lines.push(format!("{marker} {}: {}", spec.label, level_gauge(raw)));
            }
            FieldInput::SkillList => {
                let badges = dialog.badges(skills);
                let rendered = if badges.is_empty() {
                    "(none)".to_owned()
                } else {
                    badges
                        .iter()
                        .enumerate()
                        .map(|(badge_index, badge)| {
                            if focused && badge_index == badge_cursor {
                                format!("<{}>", badge.name)
                            } else {
                                format!("[{}]", badge.name)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                };
                lines.push(format!("{marker} {}: {rendered}", spec.label));
            }
        }
    }

    lines.push(String::new());
    let hint = match dialog.focused_field().map(|spec| spec.input) {
        Some(FieldInput::Level) => "h/l or </> level",
        Some(FieldInput::SkillList) => "enter link skill | h/l badge | x unlink",
        Some(FieldInput::Text) => "type to edit | enter newline",
        Some(FieldInput::Line) | None => "type to edit",
    };
    lines.push(format!("{hint} | tab field | ctrl+s save | esc cancel"));
    lines.join("\n")
}

fn level_gauge(raw: &str) -> String {
    let level = raw.trim().parse::<i64>().unwrap_or(0).clamp(0, MAX_SKILL_LEVEL);
    format!(
        "[{}{}] {level}/{MAX_SKILL_LEVEL}",
        "#".repeat(level as usize),
        "-".repeat((MAX_SKILL_LEVEL - level) as usize)
    )
}

pub(crate) fn picker_text(picker: &SkillPicker) -> String {
    let mark = |focus: PickerFocus| if picker.focus == focus { ">" } else { " " };
    let mut lines = vec![
        format!(
            "{} category: {}",
            mark(PickerFocus::Category),
            picker.selected_category().unwrap_or("choose")
        ),
        format!(
            "{} name: {}",
            mark(PickerFocus::Name),
            picker
                .selected_name()
                .map_or("choose", |option| option.name.as_str())
        ),
        String::new(),
    ];

    let categories = picker.categories();
    if categories.is_empty() {
        lines.push("this profile has no skills yet".to_owned());
    } else {
        match picker.focus {
            PickerFocus::Category => {
                let selected = picker.selected_category();
                lines.extend(categories.iter().map(|category| {
                    let bullet = if selected == Some(*category) { "*" } else { "-" };
                    format!("  {bullet} {category}")
                }));
            }
            PickerFocus::Name if picker.names().is_empty() => {
                lines.push("choose a category first".to_owned());
            }
            PickerFocus::Name => {
                let selected = picker.selected_name().map(|option| option.id);
                lines.extend(picker.names().iter().map(|option| {
                    let bullet = if selected == Some(option.id) { "*" } else { "-" };
                    format!("  {bullet} {}", option.name)
                }));
            }
        }
    }

    lines.push(String::new());
    lines.push("j/k choose | tab switch | enter link | esc cancel".to_owned());
    lines.join("\n")
}

fn delete_prompt_text(target: &DeleteTarget) -> String {
    let scope = match (target.kind, target.profile.as_deref()) {
        (EntityKind::Profile, _) => " and everything it owns".to_owned(),
        (_, Some(profile)) => format!(" from {profile}"),
        (_, None) => String::new(),
    };
    format!(
        "delete {} {}{scope}?\n\ny/enter confirm | n/esc cancel",
        target.kind.as_str(),
        target.id
    )
}

fn help_overlay_text() -> &'static str {
    "browse\n\
     \x20 j/k      move\n\
     \x20 enter    select profile / edit row\n\
     \x20 tab      profiles <-> sections\n\
     \x20 h/l      previous / next section\n\
     \x20 a        add a row\n\
     \x20 e        edit the row under the cursor\n\
     \x20 d        delete the row under the cursor\n\
     \x20 r        reload the selected profile\n\
     \x20 esc      clear the selection\n\
     \x20 q        quit\n\
     \n\
     dialog\n\
     \x20 tab      next field\n\
     \x20 </>      adjust level\n\
     \x20 enter    link a skill (skills field)\n\
     \x20 x        unlink the badge under the cursor\n\
     \x20 ctrl+s   save\n\
     \x20 esc      cancel\n\
     \n\
     ctrl+q quits from anywhere"
}

pub(crate) fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let picking = state
        .dialogs
        .active()
        .is_some_and(|dialog| dialog.picker.is_some());
    let (mode, hints) = if state.alert.is_some() {
        ("ALERT", "any key dismiss")
    } else if state.pending_delete.is_some() {
        ("DELETE", "y/enter confirm | n/esc cancel")
    } else if picking {
        ("PICK", "j/k choose | tab switch | enter link | esc cancel")
    } else if !state.dialogs.is_empty() {
        ("EDIT", "tab field | ctrl+s save | esc cancel")
    } else if view_data.help_visible {
        ("HELP", "esc close")
    } else {
        (
            "NAV",
            "j/k move | enter select | tab focus | a add | e edit | d delete | ? help | q quit",
        )
    };

    match &state.status_line {
        Some(message) => format!("{mode} {message} | {hints}"),
        None => format!("{mode} {hints}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
