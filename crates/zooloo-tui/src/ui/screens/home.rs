use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use zooloo_core::User;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Greeting
            Constraint::Length(8), // User card
            Constraint::Min(6),    // App info
        ])
        .split(area);

    let user = app.session_state.user();
    render_greeting(frame, user, chunks[0]);
    render_user_card(frame, app, user, chunks[1]);
    render_app_info(frame, chunks[2]);
}

fn render_greeting(frame: &mut Frame, user: Option<&User>, area: Rect) {
    let name = user.map(User::display_name).unwrap_or("User");
    let lines = vec![
        Line::from(Span::styled(format!(" Hello, {}!", name), styles::title_style())),
        Line::from(Span::styled(
            " Welcome to your dashboard",
            styles::muted_style(),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_user_card(frame: &mut Frame, app: &App, user: Option<&User>, area: Rect) {
    let mut lines = vec![];

    if let Some(user) = user {
        lines.push(field_line("Email", &user.email));
        lines.push(field_line("Login", &user.login));

        let status_style = if user.is_active() {
            styles::success_style()
        } else {
            styles::error_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<10}", "Status"), styles::label_style()),
            Span::styled(user.status_display(), status_style),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            " No user information",
            styles::muted_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(format!(" {:<10}", "Session"), styles::label_style()),
        Span::styled(
            format_expiry(app.session_state.expires_at(), Utc::now()),
            styles::value_style(),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        " ✓ Login successful",
        styles::success_style(),
    )));

    let block = Block::default()
        .title(" Account ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_app_info(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(" • Secure token authentication", styles::value_style())),
        Line::from(Span::styled(" • 24 hour sessions", styles::value_style())),
        Line::from(Span::styled(" • Token renewal with [r]", styles::value_style())),
        Line::from(""),
        Line::from(Span::styled(
            " Open the menu with [m] or quick actions with [+]",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .title(" App Information ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn field_line<'a>(label: &'a str, value: &'a str) -> Line<'a> {
    let value = if value.is_empty() { "-" } else { value };
    Line::from(vec![
        Span::styled(format!(" {:<10}", label), styles::label_style()),
        Span::styled(value, styles::value_style()),
    ])
}

/// Human readable remaining session lifetime.
pub fn format_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(expires_at) = expires_at else {
        return "Active".to_string();
    };

    let remaining = expires_at.signed_duration_since(now);
    if remaining.num_seconds() <= 0 {
        return "Expired".to_string();
    }

    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("Expires in {}h {}m", hours, minutes)
    } else {
        format!("Expires in {}m", minutes.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_expiry_without_deadline() {
        assert_eq!(format_expiry(None, now()), "Active");
    }

    #[test]
    fn test_format_expiry_hours_and_minutes() {
        let at = now() + Duration::hours(23) + Duration::minutes(59);
        assert_eq!(format_expiry(Some(at), now()), "Expires in 23h 59m");
    }

    #[test]
    fn test_format_expiry_under_a_minute() {
        let at = now() + Duration::seconds(20);
        assert_eq!(format_expiry(Some(at), now()), "Expires in 1m");
    }

    #[test]
    fn test_format_expiry_past() {
        let at = now() - Duration::minutes(5);
        assert_eq!(format_expiry(Some(at), now()), "Expired");
    }
}
