//! Secondary pages reachable from the drawer.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

fn page_block(title: &str) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false))
}

fn row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<16}", label), styles::label_style()),
        Span::styled(value, styles::value_style()),
    ])
}

pub fn render_profile(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.session_state.user() {
        Some(user) => vec![
            row("Name", user.display_name().to_string()),
            row("Login", user.login.clone()),
            row("Email", user.email.clone()),
            row("ID", user.id.clone()),
            row("Status", user.status_display().to_string()),
        ],
        None => vec![Line::from(Span::styled(
            " No user information",
            styles::muted_style(),
        ))],
    };

    frame.render_widget(Paragraph::new(lines).block(page_block("Profile")), area);
}

pub fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
    let config = &app.config;
    let lines = vec![
        row("Endpoint", config.endpoint_url()),
        row("Credential store", config.storage.display_name().to_string()),
        row(
            "Request timeout",
            format!("{}s", config.request_timeout().as_secs()),
        ),
        row(
            "Last login",
            config.last_login.clone().unwrap_or_else(|| "-".to_string()),
        ),
        Line::from(""),
        Line::from(Span::styled(
            " Edit config.json in the zooloo config directory to change these",
            styles::muted_style(),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(page_block("Settings"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

pub fn render_notifications(frame: &mut Frame, area: Rect) {
    let lines = vec![Line::from(Span::styled(
        " No notifications",
        styles::muted_style(),
    ))];
    frame.render_widget(Paragraph::new(lines).block(page_block("Notifications")), area);
}

pub fn render_help(frame: &mut Frame, area: Rect) {
    let lines = key_help_lines();
    frame.render_widget(Paragraph::new(lines).block(page_block("Help")), area);
}

pub fn render_about(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(" zooloo", styles::title_style())),
        Line::from(Span::styled(
            format!(" version {}", env!("CARGO_PKG_VERSION")),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Terminal client for the application authentication service.",
            styles::value_style(),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(page_block("About"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Key bindings of the authenticated shell, shared with the help overlay.
pub fn key_help_lines() -> Vec<Line<'static>> {
    let bindings = [
        ("m", "Open / close the menu"),
        ("+", "Quick actions"),
        ("h", "Go to Home"),
        ("↑/↓", "Navigate menu"),
        ("Enter", "Select"),
        ("Esc", "Close menu"),
        ("r", "Renew session token"),
        ("l", "Log out"),
        ("?", "Toggle help"),
        ("q", "Quit"),
    ];

    bindings
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("  {:<10}", key), styles::help_key_style()),
                Span::styled(*desc, styles::help_desc_style()),
            ])
        })
        .collect()
}
