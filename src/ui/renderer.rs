use crate::core::app::{App, Focus, SettingsItem, SidebarEntry, SETTINGS_ITEMS, SUGGESTIONS};
use crate::core::conversation::truncate_prompt;
use crate::core::message::{Message, Role};
use crate::ui::chat_loop::keybindings::HELP_ENTRIES;
use crate::ui::layout::{input_cursor_position, wrap_input, wrap_lines};
use crate::ui::markup::{markup_to_lines, plain_lines};
use crate::ui::theme::Theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 32;
const MAX_COMPOSER_ROWS: u16 = 4;
const RECENT_LABEL_CHARS: usize = 40;
const PLACEHOLDER: &str = "Enter a prompt here\u{2026}";
const DISCLAIMER: &str = "Responses may be inaccurate. Double-check anything important.";

pub fn ui(f: &mut Frame, app: &mut App, theme: &Theme) {
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background_color)),
        area,
    );

    let main_area = if app.ui.sidebar_open {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(SIDEBAR_WIDTH.min(area.width / 2)),
                Constraint::Min(0),
            ])
            .split(area);
        render_sidebar(f, app, theme, chunks[0]);
        chunks[1]
    } else {
        area
    };

    let composer_inner_width = main_area.width.saturating_sub(2) as usize;
    let composer_rows = composer_row_count(app, composer_inner_width);
    let banner_height = if app.store.error().is_some() { 4 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(banner_height),
            Constraint::Length(composer_rows + 2), // +2 for borders
            Constraint::Length(1),
        ])
        .split(main_area);

    render_header(f, app, theme, chunks[0]);
    if app.shows_welcome() {
        render_welcome(f, app, theme, chunks[1]);
    } else {
        render_conversation(f, app, theme, chunks[1]);
    }
    if banner_height > 0 {
        render_error_banner(f, app, theme, chunks[2]);
    }
    render_composer(f, app, theme, chunks[3]);
    render_footer(f, app, theme, chunks[4]);

    match app.ui.focus() {
        Focus::Help => render_help(f, theme, area),
        Focus::Settings => render_settings(f, app, theme, area),
        Focus::ConfirmClear => {
            if app.ui.settings_open {
                render_settings(f, app, theme, area);
            }
            render_confirm_clear(f, theme, area);
        }
        Focus::Notice => {
            if app.ui.settings_open {
                render_settings(f, app, theme, area);
            }
            render_notice(f, app, theme, area);
        }
        Focus::Sidebar | Focus::Composer => {}
    }
}

fn render_header(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled("Parlance", theme.title_style),
    ]));
    f.render_widget(title, area);

    let info = format!(
        "{} \u{2022} {} theme \u{2022} v{} ",
        app.model,
        app.store.theme().display_name(),
        env!("CARGO_PKG_VERSION")
    );
    let info = Paragraph::new(Line::from(Span::styled(info, theme.muted_style)))
        .alignment(Alignment::Right);
    f.render_widget(info, area);
}

fn render_welcome(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let greeting = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled("Hello there.", theme.accent_style)),
        Line::from(Span::styled("How can I help you today?", theme.muted_style)),
    ])
    .alignment(Alignment::Center);
    f.render_widget(greeting, chunks[0]);

    let card_rects = card_layout(chunks[1]);
    for (index, (prompt, rect)) in SUGGESTIONS.iter().zip(card_rects).enumerate() {
        let selected = index == app.ui.card_selected && app.ui.focus() == Focus::Composer;
        let border_style = if selected {
            theme.accent_style
        } else {
            theme.border_style
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(theme.surface_color));
        if selected {
            block = block.title(Span::styled(" Tab to use ", theme.muted_style));
        }
        let card = Paragraph::new(*prompt)
            .style(theme.card_style)
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(card, rect);
    }

    let disclaimer =
        Paragraph::new(Span::styled(DISCLAIMER, theme.muted_style)).alignment(Alignment::Center);
    f.render_widget(disclaimer, chunks[2]);
}

/// Four cards in a row when there is room, otherwise a two-by-two grid.
fn card_layout(area: Rect) -> Vec<Rect> {
    if area.width >= 100 {
        let row = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(0)])
            .split(area)[0];
        return Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(row)
            .to_vec();
    }
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(area);
    rows[..2]
        .iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 2); 2])
                .split(*row)
                .to_vec()
        })
        .collect()
}

/// Build the wrapped conversation rows for a body of the given width.
///
/// Message rows come from the prewrap cache; only the loading skeleton is
/// built fresh.
pub fn build_conversation_lines(app: &mut App, theme: &Theme, width: u16) -> Vec<Line<'static>> {
    let content_width = content_width(width);
    let theme_mode = app.store.theme();
    app.ui
        .prewrap_cache
        .sync(app.store.messages(), content_width, theme_mode, |message| {
            message_rows(message, theme, content_width)
        });
    let mut lines: Vec<Line<'static>> = app.ui.prewrap_cache.rows().cloned().collect();

    if app.store.is_loading() {
        lines.push(Line::from(Span::styled("Assistant", theme.accent_style)));
        for fraction in [90, 75, 50] {
            let bar_width = (content_width * fraction / 100).max(1);
            lines.push(indent(Line::from(Span::styled(
                "\u{2501}".repeat(bar_width),
                theme.muted_style,
            ))));
        }
    }

    lines
}

fn content_width(width: u16) -> usize {
    width.saturating_sub(2).max(1) as usize
}

/// Label, wrapped body and trailing blank row for one message.
pub fn message_rows(message: &Message, theme: &Theme, content_width: usize) -> Vec<Line<'static>> {
    let (label, label_style, body) = match message.role {
        Role::User => (
            "You",
            theme.user_text_style,
            plain_lines(&message.content, theme.text_style),
        ),
        Role::Assistant => (
            "Assistant",
            theme.accent_style,
            markup_to_lines(
                &message.content,
                theme.assistant_text_style,
                theme.emphasis_style,
            ),
        ),
    };

    let mut rows = vec![Line::from(Span::styled(label, label_style))];
    rows.extend(wrap_lines(&body, content_width).into_iter().map(indent));
    rows.push(Line::default());
    rows
}

fn indent(line: Line<'static>) -> Line<'static> {
    let mut spans = Vec::with_capacity(line.spans.len() + 1);
    spans.push(Span::raw("  "));
    spans.extend(line.spans);
    Line::from(spans)
}

fn render_conversation(f: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    let inner = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };
    let lines = build_conversation_lines(app, theme, inner.width);
    let total_rows = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let top_row = app.ui.clamp_scroll(total_rows, inner.height);

    let paragraph = Paragraph::new(lines).scroll((top_row, 0));
    f.render_widget(paragraph, inner);
}

fn render_error_banner(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let message = app.store.error().unwrap_or_default().to_string();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.error_style)
        .title(Span::styled(" Server error ", theme.error_style));
    let banner = Paragraph::new(vec![
        Line::from(Span::styled(message, theme.text_style)),
        Line::from(Span::styled(
            "Ctrl+R retry \u{2022} Ctrl+N start a new chat",
            theme.muted_style,
        )),
    ])
    .block(block);
    f.render_widget(banner, area);
}

fn composer_row_count(app: &App, inner_width: usize) -> u16 {
    let input = app.store.input();
    let wrapped = wrap_input(input, inner_width).len() as u16;
    let (cursor_row, _) = input_cursor_position(input, app.ui.cursor, inner_width);
    wrapped.max(cursor_row + 1).clamp(1, MAX_COMPOSER_ROWS)
}

fn render_composer(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let loading = app.store.is_loading();
    let title = if loading {
        " Waiting for a reply\u{2026} "
    } else if app.can_submit() {
        " Message \u{2022} Enter to send "
    } else {
        " Message "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style)
        .title(Span::styled(title, theme.muted_style))
        .style(Style::default().bg(theme.surface_color));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let input = app.store.input();
    let width = inner.width as usize;
    let (cursor_row, cursor_col) = input_cursor_position(input, app.ui.cursor, width);
    let scroll = cursor_row.saturating_sub(inner.height.saturating_sub(1));

    let text: Vec<Line> = if input.is_empty() {
        vec![Line::from(Span::styled(
            PLACEHOLDER,
            theme.input_placeholder_style,
        ))]
    } else {
        wrap_input(input, width)
            .into_iter()
            .map(|row| Line::from(Span::styled(row, theme.input_text_style)))
            .collect()
    };
    f.render_widget(Paragraph::new(text).scroll((scroll, 0)), inner);

    if app.ui.focus() == Focus::Composer && inner.width > 0 && inner.height > 0 {
        f.set_cursor_position((
            inner.x + cursor_col.min(inner.width - 1),
            inner.y + (cursor_row - scroll).min(inner.height - 1),
        ));
    }
}

fn render_footer(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let hint = match app.ui.focus() {
        Focus::Sidebar => "\u{2191}\u{2193} move \u{2022} Enter open \u{2022} Esc close",
        Focus::Settings => "\u{2191}\u{2193} move \u{2022} Enter select \u{2022} Esc close",
        Focus::ConfirmClear => "Enter confirm \u{2022} Esc cancel",
        Focus::Help | Focus::Notice => "Esc close",
        Focus::Composer => {
            "Enter send \u{2022} Ctrl+B menu \u{2022} Ctrl+N new chat \u{2022} F1 help \u{2022} Ctrl+C quit"
        }
    };
    f.render_widget(
        Paragraph::new(Span::styled(hint, theme.muted_style)).alignment(Alignment::Center),
        area,
    );
}

fn sidebar_item(entry: &SidebarEntry, max_chars: usize) -> String {
    match entry {
        SidebarEntry::NewChat => "+ New chat".to_string(),
        SidebarEntry::Recent(prompt) => {
            format!("\u{203a} {}", truncate_prompt(prompt, max_chars))
        }
        SidebarEntry::Help => "? Help".to_string(),
        SidebarEntry::Activity => "\u{21ba} Activity".to_string(),
        SidebarEntry::Settings => "\u{2699} Settings".to_string(),
    }
}

fn render_sidebar(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(theme.border_style)
        .title(Span::styled(" Menu ", theme.title_style))
        .style(Style::default().bg(theme.surface_color));
    let inner_width = area.width.saturating_sub(1) as usize;
    let max_chars = RECENT_LABEL_CHARS.min(inner_width.saturating_sub(4)).max(1);

    let entries = app.sidebar_entries();
    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let style = match entry {
                SidebarEntry::Recent(_) => theme.text_style,
                _ => theme.accent_style,
            };
            ListItem::new(Line::from(Span::styled(sidebar_item(entry, max_chars), style)))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.selection_style);
    let mut state = ListState::default();
    if app.ui.focus() == Focus::Sidebar {
        state.select(Some(app.ui.sidebar_selected.min(entries.len().saturating_sub(1))));
    }
    f.render_stateful_widget(list, area, &mut state);
}

/// A rectangle of at most `width` x `height` centered in `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn popup_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.accent_style)
        .title(Span::styled(title, theme.title_style))
        .style(Style::default().bg(theme.surface_color))
}

fn render_help(f: &mut Frame, theme: &Theme, area: Rect) {
    let key_width = HELP_ENTRIES.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let lines: Vec<Line> = HELP_ENTRIES
        .iter()
        .map(|(key, description)| {
            Line::from(vec![
                Span::styled(
                    format!(" {key:<key_width$}  "),
                    theme.accent_style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(*description, theme.text_style),
            ])
        })
        .collect();
    let rect = centered_rect(56, HELP_ENTRIES.len() as u16 + 2, area);
    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(lines).block(popup_block(" Help ", theme)), rect);
}

fn render_settings(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let selected = app.ui.selected_settings_item();
    let mut lines: Vec<Line> = SETTINGS_ITEMS
        .iter()
        .map(|item| {
            let label = match item {
                SettingsItem::ToggleTheme => format!(
                    "Theme: {} (Enter to switch)",
                    app.store.theme().display_name()
                ),
                SettingsItem::ClearHistory => "Clear conversation history".to_string(),
                SettingsItem::Close => "Close".to_string(),
            };
            let style = if *item == selected {
                theme.text_style.patch(theme.selection_style)
            } else {
                theme.text_style
            };
            Line::from(Span::styled(format!(" {label} "), style))
        })
        .collect();

    let storage = app
        .store
        .storage()
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "not saved".to_string());
    lines.extend([
        Line::default(),
        Line::from(Span::styled(" About", theme.title_style)),
        Line::from(Span::styled(
            format!(" App version: {}", env!("CARGO_PKG_VERSION")),
            theme.muted_style,
        )),
        Line::from(Span::styled(
            format!(" Build: {}", option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")),
            theme.muted_style,
        )),
        Line::from(Span::styled(format!(" Model: {}", app.model), theme.muted_style)),
        Line::from(Span::styled(format!(" Storage: {storage}"), theme.muted_style)),
    ]);

    let rect = centered_rect(60, lines.len() as u16 + 2, area);
    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(lines).block(popup_block(" Settings ", theme)), rect);
}

fn render_confirm_clear(f: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(" Clear conversation history?", theme.text_style)),
        Line::from(Span::styled(
            " The saved conversation is removed from this device.",
            theme.muted_style,
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(" Enter/y ", theme.error_style),
            Span::styled("clear   ", theme.text_style),
            Span::styled("Esc/n ", theme.accent_style),
            Span::styled("cancel", theme.text_style),
        ]),
    ];
    let rect = centered_rect(58, lines.len() as u16 + 2, area);
    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(lines).block(popup_block(" Confirm ", theme)), rect);
}

fn render_notice(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let Some(notice) = app.ui.notice.as_deref() else {
        return;
    };
    let width = 56u16.min(area.width);
    let inner_width = width.saturating_sub(2).max(1) as usize;
    let body = wrap_lines(&plain_lines(notice, theme.text_style), inner_width);
    let height = body.len() as u16 + 4;
    let mut lines = body;
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Press Enter to dismiss", theme.muted_style)));

    let rect = centered_rect(width, height, area);
    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(lines).block(popup_block(" Notice ", theme)), rect);
}
