//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Returns `true` when the app should exit.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use zooloo_core::Route;

use crate::app::{can_add_login_char, can_add_password_char, App, AppState, LoginFocus};

pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle logout confirmation
    if matches!(app.state, AppState::ConfirmingLogout) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_logout(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.route {
        // Nothing to interact with until the startup check settles
        Route::Splash => Ok(false),
        Route::Login => handle_login_input(app, key),
        Route::Home => handle_shell_input(app, key),
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Login => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password | LoginFocus::Button => {
                app.login_focus = LoginFocus::Button;
                app.submit_login();
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Login => {
                app.login_input.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Login => {
                if can_add_login_char(app.login_input.chars().count(), c) {
                    app.login_input.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            // Ignore character input on button
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_shell_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if app.drawer_open {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.drawer_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.drawer_next(),
            KeyCode::Enter => app.activate_drawer_selection(),
            KeyCode::Esc | KeyCode::Char('m') => app.toggle_drawer(),
            _ => {}
        }
        return Ok(false);
    }

    if app.actions_open {
        match key.code {
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') => app.action_prev(),
            KeyCode::Right | KeyCode::Down | KeyCode::Char('l') => app.action_next(),
            KeyCode::Enter => app.activate_action(),
            KeyCode::Esc | KeyCode::Char('+') => app.toggle_actions(),
            _ => {}
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('m') => app.toggle_drawer(),
        KeyCode::Char('+') | KeyCode::Char('a') => app.toggle_actions(),
        KeyCode::Char('h') | KeyCode::Esc => app.go_home(),
        KeyCode::Char('r') => app.renew_session(),
        KeyCode::Char('l') => app.request_logout(),
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use zooloo_core::{AuthClient, Config, CredentialStore, SessionManager};

    use crate::app::Screen;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(route: Route) -> App {
        let client = AuthClient::new("http://127.0.0.1:9/rest.php", CredentialStore::in_memory())
            .expect("client should build");
        let mut app = App::new(Config::default(), Arc::new(SessionManager::new(client)));
        app.route = route;
        app.login_input.clear();
        app.login_password.clear();
        app.login_focus = LoginFocus::Login;
        app
    }

    #[test]
    fn test_splash_ignores_keys() {
        let mut app = test_app(Route::Splash);
        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))).unwrap());
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_login_typing_and_focus() {
        let mut app = test_app(Route::Login);
        for c in "admin".chars() {
            handle_input(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_input(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.login_focus, LoginFocus::Password);

        handle_input(&mut app, key(KeyCode::Char('x'))).unwrap();
        handle_input(&mut app, key(KeyCode::Backspace)).unwrap();

        assert_eq!(app.login_input, "admin");
        assert!(app.login_password.is_empty());
    }

    #[test]
    fn test_login_submit_with_empty_password_shows_error() {
        let mut app = test_app(Route::Login);
        app.login_input = "admin".to_string();
        app.login_focus = LoginFocus::Button;

        handle_input(&mut app, key(KeyCode::Enter)).unwrap();

        assert_eq!(app.login_error.as_deref(), Some("Please fill in all fields"));
    }

    #[test]
    fn test_quit_requires_confirmation() {
        let mut app = test_app(Route::Home);
        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))).unwrap());
        assert_eq!(app.state, AppState::ConfirmingQuit);

        assert!(!handle_input(&mut app, key(KeyCode::Char('n'))).unwrap());
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))).unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }

    #[test]
    fn test_drawer_keys() {
        let mut app = test_app(Route::Home);
        handle_input(&mut app, key(KeyCode::Char('m'))).unwrap();
        assert!(app.drawer_open);

        handle_input(&mut app, key(KeyCode::Down)).unwrap();
        handle_input(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.screen, Screen::Profile);
        assert!(!app.drawer_open);

        handle_input(&mut app, key(KeyCode::Char('h'))).unwrap();
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn test_logout_cancel_keeps_session_view() {
        let mut app = test_app(Route::Home);
        handle_input(&mut app, key(KeyCode::Char('l'))).unwrap();
        assert_eq!(app.state, AppState::ConfirmingLogout);

        handle_input(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.route, Route::Home);
    }

    #[test]
    fn test_action_menu_keys() {
        let mut app = test_app(Route::Home);
        handle_input(&mut app, key(KeyCode::Char('+'))).unwrap();
        assert!(app.actions_open);

        handle_input(&mut app, key(KeyCode::Right)).unwrap();
        handle_input(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(!app.actions_open);
        assert_eq!(app.status_message.as_deref(), Some("Add selected"));
    }
}
