use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use zooloo_core::Route;

use crate::app::{App, AppState, LoginFocus, QuickAction, Screen};

use super::screens;
use super::styles;

const LOGO: [&str; 3] = [
    "   ╔═╗╔═╗╔═╗╦  ╔═╗╔═╗",
    "   ╔═╝║ ║║ ║║  ║ ║║ ║",
    "   ╚═╝╚═╝╚═╝╩═╝╚═╝╚═╝",
];

const DRAWER_WIDTH: u16 = 34;

pub fn render(frame: &mut Frame, app: &App) {
    match app.route {
        Route::Splash => render_splash(frame),
        Route::Login => render_login(frame, app),
        Route::Home => render_shell(frame, app),
    }

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_confirm_overlay(frame, "Are you sure you want to quit?", "quit"),
        AppState::ConfirmingLogout => {
            render_confirm_overlay(frame, "Are you sure you want to log out?", "log out")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect()
}

// ============================================================================
// Splash
// ============================================================================

fn render_splash(frame: &mut Frame) {
    let area = centered_rect_fixed(30, 7, frame.area());

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Checking session...",
        styles::muted_style(),
    )));

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Login
// ============================================================================

fn render_login(frame: &mut Frame, app: &App) {
    // Fixed size dialog - compact
    let height = if app.login_error.is_some() { 15 } else { 13 };
    let area = centered_rect_fixed(46, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("      Welcome", styles::highlight_style())));
    lines.push(Line::from(Span::styled(
        "      Log in to continue",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    let login_focused = app.login_focus == LoginFocus::Login;
    lines.push(field_line(
        "Login:    [",
        &format!("{:<16}", truncate_tail(&app.login_input, 16)),
        login_focused,
    ));

    let password_focused = app.login_focus == LoginFocus::Password;
    let password_masked = "*".repeat(app.login_password.chars().count().min(16));
    lines.push(field_line(
        "Password: [",
        &format!("{:<16}", password_masked),
        password_focused,
    ));

    // Login button, disabled while a request is outstanding
    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let (label, style) = if app.login_in_flight {
        ("Logging in...", styles::muted_style())
    } else if button_focused {
        (" ▶ Login ◀ ", styles::selected_style())
    } else {
        ("   Login   ", styles::list_item_style())
    };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(label, style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("      "),
        Span::styled(label, styles::muted_style()),
        Span::styled(format!("{}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Keep the last `max` characters so the cursor end stays visible.
fn truncate_tail(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    let skip = count - max;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

// ============================================================================
// Authenticated shell
// ============================================================================

fn render_shell(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    screens::render(frame, app, chunks[1]);
    render_tab_bar(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if app.drawer_open {
        let drawer_area = Rect::new(
            chunks[1].x,
            chunks[1].y,
            DRAWER_WIDTH.min(chunks[1].width),
            chunks[1].height + chunks[2].height,
        );
        render_drawer(frame, app, drawer_area);
    }

    if app.actions_open {
        render_action_menu(frame, app, chunks[2]);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  zooloo · {}", app.screen.title());
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + help_hint.len() + 4),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(40),
        ])
        .split(area);

    let block = || {
        Block::default()
            .borders(Borders::TOP)
            .border_style(styles::muted_style())
    };

    let menu = Paragraph::new(Line::from(Span::styled(
        "☰ [m] Menu",
        styles::tab_style(app.drawer_open),
    )))
    .alignment(Alignment::Center)
    .block(block());
    frame.render_widget(menu, chunks[0]);

    let label = if app.actions_open { " ✕ " } else { " + " };
    let button = Paragraph::new(Line::from(Span::styled(
        label,
        styles::action_button_style(app.actions_open),
    )))
    .alignment(Alignment::Center)
    .block(block());
    frame.render_widget(button, chunks[1]);

    let home_selected = app.screen == Screen::Home && !app.drawer_open;
    let home = Paragraph::new(Line::from(Span::styled(
        "⌂ [h] Home",
        styles::tab_style(home_selected),
    )))
    .alignment(Alignment::Center)
    .block(block());
    frame.render_widget(home, chunks[2]);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[r]enew | [l]ogout | [q]uit";

    let left_text = match (&app.status_message, app.session_state.user()) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, Some(user)) => format!(" Logged in as {} ", user.login),
        (None, None) => String::new(),
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(styles::status_bar_style()), area);
}

fn render_drawer(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(Clear, area);

    let mut lines = vec![];

    // Header: who is logged in
    let user = app.session_state.user();
    lines.push(Line::from(Span::styled(
        format!(" {}", user.map(|u| u.display_name()).unwrap_or("User")),
        styles::title_style(),
    )));
    lines.push(Line::from(Span::styled(
        format!(" {}", user.map(|u| u.email.as_str()).unwrap_or("")),
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    for (i, screen) in Screen::ALL.iter().enumerate() {
        let selected = i == app.drawer_selection;
        let marker = if *screen == app.screen { "•" } else { " " };
        let style = if selected {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(Span::styled(
            format!(" {} {:<28}", marker, screen.title()),
            style,
        )));
    }

    lines.push(Line::from(""));
    let logout_style = if app.is_logout_selected() {
        styles::error_style().patch(styles::selected_style())
    } else {
        styles::error_style()
    };
    lines.push(Line::from(Span::styled(
        format!("   {:<28}", "Logout"),
        logout_style,
    )));

    let block = Block::default()
        .title(" Menu ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_action_menu(frame: &mut Frame, app: &App, tab_bar: Rect) {
    let width = 36u16.min(tab_bar.width);
    let height = 3u16;
    let x = tab_bar.x + tab_bar.width.saturating_sub(width) / 2;
    let y = tab_bar.y.saturating_sub(height);
    let area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, area);

    let mut spans = vec![];
    for (i, action) in QuickAction::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = if i == app.action_selection {
            styles::selected_style().fg(styles::PRIMARY)
        } else {
            styles::list_item_style()
        };
        spans.push(Span::styled(format!(" {} ", action.label()), style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Overlays
// ============================================================================

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 18, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(Span::styled(
        format!("         version {}", env!("CARGO_PKG_VERSION")),
        styles::muted_style(),
    )));
    lines.push(Line::from(""));
    lines.extend(screens::pages::key_help_lines());
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("      Press ", styles::muted_style()),
        Span::styled("?", styles::help_key_style()),
        Span::styled(" or ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" to close", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, verb: &str) {
    let area = centered_rect_fixed(46, 9, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("   {}", question),
        styles::highlight_style(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::help_key_style()),
        Span::styled(format!(" to {}, ", verb), styles::muted_style()),
        Span::styled("[N]", styles::help_key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
