//! Page content for the authenticated shell.

pub mod home;
pub mod pages;

use ratatui::{layout::Rect, Frame};

use crate::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.screen {
        Screen::Home => home::render(frame, app, area),
        Screen::Profile => pages::render_profile(frame, app, area),
        Screen::Settings => pages::render_settings(frame, app, area),
        Screen::Notifications => pages::render_notifications(frame, area),
        Screen::Help => pages::render_help(frame, area),
        Screen::About => pages::render_about(frame, area),
    }
}
