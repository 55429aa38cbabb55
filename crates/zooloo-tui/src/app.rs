//! Application state management for the zooloo TUI.
//!
//! This module contains the `App` struct that owns all UI state: the current
//! route derived from the session, the login form, the drawer and quick
//! action menus, and the channel background auth tasks report back on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use zooloo_core::{Config, Credentials, Route, SessionManager, SessionState};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Auth operations are serialized by the UI, a handful of slots is plenty.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for login input.
const MAX_LOGIN_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

pub const ENV_LOGIN: &str = "ZOOLOO_LOGIN";
pub const ENV_PASSWORD: &str = "ZOOLOO_PASSWORD";

// ============================================================================
// UI State Types
// ============================================================================

/// Pages reachable from the drawer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Profile,
    Settings,
    Notifications,
    Help,
    About,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Home,
        Screen::Profile,
        Screen::Settings,
        Screen::Notifications,
        Screen::Help,
        Screen::About,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Profile => "Profile",
            Screen::Settings => "Settings",
            Screen::Notifications => "Notifications",
            Screen::Help => "Help",
            Screen::About => "About",
        }
    }
}

/// Entries of the floating action menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Camera,
    Add,
    Search,
}

impl QuickAction {
    pub const ALL: [QuickAction; 3] = [QuickAction::Camera, QuickAction::Add, QuickAction::Search];

    pub fn label(&self) -> &'static str {
        match self {
            QuickAction::Camera => "Camera",
            QuickAction::Add => "Add",
            QuickAction::Search => "Search",
        }
    }
}

/// Modal state layered over the current route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingLogout,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Login,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Login => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Login,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Login => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Login,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Completion reports from spawned auth operations. State changes themselves
/// arrive through the session watch channel; these only drive UI feedback.
#[derive(Debug)]
enum TaskResult {
    Login {
        login: String,
        result: Result<(), String>,
    },
    LoggedOut,
    TokenRefreshed(Result<(), String>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: Arc<SessionManager>,
    session_rx: watch::Receiver<SessionState>,

    // Navigation
    pub session_state: SessionState,
    pub route: Route,
    pub state: AppState,
    pub screen: Screen,
    pub drawer_open: bool,
    pub drawer_selection: usize,
    pub actions_open: bool,
    pub action_selection: usize,

    // Login form state
    pub login_input: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_in_flight: bool,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
    pending_tasks: JoinSet<()>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Config, session: Arc<SessionManager>) -> Self {
        let session_rx = session.subscribe();
        let session_state = session_rx.borrow().clone();
        let route = Route::for_state(&session_state);

        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Get credentials from env vars or config
        let login_input = std::env::var(ENV_LOGIN)
            .ok()
            .or_else(|| config.last_login.clone())
            .unwrap_or_default();
        let login_password = std::env::var(ENV_PASSWORD).unwrap_or_default();
        let login_focus = if login_input.is_empty() {
            LoginFocus::Login
        } else {
            LoginFocus::Password
        };

        Self {
            config,
            session,
            session_rx,

            session_state,
            route,
            state: AppState::Normal,
            screen: Screen::Home,
            drawer_open: false,
            drawer_selection: 0,
            actions_open: false,
            action_selection: 0,

            login_input,
            login_password,
            login_focus,
            login_error: None,
            login_in_flight: false,

            task_rx,
            task_tx,
            pending_tasks: JoinSet::new(),

            status_message: None,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Run the startup authentication check in the background.
    pub fn start_session_check(&mut self) {
        let session = Arc::clone(&self.session);
        self.pending_tasks.spawn(async move {
            session.init().await;
        });
    }

    /// Pick up the latest session state, re-routing if it changed.
    pub fn sync_session(&mut self) {
        if !self.session_rx.has_changed().unwrap_or(false) {
            return;
        }
        let state = self.session_rx.borrow_and_update().clone();
        self.apply_session_state(state);
    }

    fn apply_session_state(&mut self, state: SessionState) {
        let route = Route::for_state(&state);
        self.session_state = state;

        if route == self.route {
            return;
        }
        debug!(from = ?self.route, to = ?route, "Route changed");
        self.route = route;

        // Shell overlays never outlive the session that opened them
        if !route.requires_auth() {
            self.close_overlays();
            self.screen = Screen::Home;
            if matches!(self.state, AppState::ConfirmingLogout) {
                self.state = AppState::Normal;
            }
        }

        match route {
            Route::Splash => {}
            Route::Login => {
                self.login_focus = if self.login_input.is_empty() {
                    LoginFocus::Login
                } else {
                    LoginFocus::Password
                };
            }
            Route::Home => {
                self.screen = Screen::Home;
                self.login_password.clear();
                self.login_error = None;
            }
        }
    }

    /// Drain completed background tasks.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }
        while let Some(joined) = self.pending_tasks.try_join_next() {
            if let Err(e) = joined {
                warn!(error = %e, "Background task failed");
            }
        }
    }

    /// Wait for outstanding auth tasks before exit, so a confirmed logout
    /// finishes clearing local state. Tasks still running after `limit` are
    /// aborted.
    pub async fn finish_pending_tasks(&mut self, limit: Duration) {
        if self.pending_tasks.is_empty() {
            return;
        }
        info!(count = self.pending_tasks.len(), "Waiting for background tasks");

        // Results are no longer displayed; don't let senders block on a full channel
        self.task_rx.close();

        let pending = &mut self.pending_tasks;
        let drained = tokio::time::timeout(limit, async {
            while pending.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                count = self.pending_tasks.len(),
                "Background tasks still running at exit, aborting"
            );
            self.pending_tasks.shutdown().await;
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Login { login, result } => {
                self.login_in_flight = false;
                match result {
                    Ok(()) => {
                        self.config.last_login = Some(login);
                        if let Err(e) = self.config.save() {
                            warn!(error = %e, "Failed to save config");
                        }
                        self.status_message = None;
                    }
                    Err(message) => {
                        self.login_error = Some(message);
                        self.login_focus = LoginFocus::Password;
                    }
                }
            }
            TaskResult::LoggedOut => {
                self.status_message = Some("Logged out".to_string());
            }
            TaskResult::TokenRefreshed(Ok(())) => {
                self.status_message = Some("Session renewed".to_string());
            }
            TaskResult::TokenRefreshed(Err(message)) => {
                self.status_message = Some(format!("Session renewal failed: {}", message));
            }
        }
    }

    fn spawn_task<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = TaskResult> + Send + 'static,
    {
        let tx = self.task_tx.clone();
        self.pending_tasks.spawn(async move {
            let result = task.await;
            if tx.send(result).await.is_err() {
                debug!("App dropped before task finished");
            }
        });
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Submit the login form. Ignored while a request is already in flight.
    pub fn submit_login(&mut self) {
        if self.login_in_flight {
            return;
        }

        let Some(credentials) = Credentials::new(&self.login_input, &self.login_password).normalized()
        else {
            self.login_error = Some("Please fill in all fields".to_string());
            return;
        };

        self.login_error = None;
        self.login_in_flight = true;
        info!(login = %credentials.login, "Submitting login");

        let session = Arc::clone(&self.session);
        self.spawn_task(async move {
            let result = session
                .login(&credentials)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());
            TaskResult::Login {
                login: credentials.login,
                result,
            }
        });
    }

    pub fn request_logout(&mut self) {
        self.close_overlays();
        self.state = AppState::ConfirmingLogout;
    }

    pub fn confirm_logout(&mut self) {
        self.state = AppState::Normal;
        let session = Arc::clone(&self.session);
        self.spawn_task(async move {
            session.logout().await;
            TaskResult::LoggedOut
        });
    }

    /// Manually renew the session token.
    pub fn renew_session(&mut self) {
        self.status_message = Some("Renewing session...".to_string());
        let session = Arc::clone(&self.session);
        self.spawn_task(async move {
            let result = session
                .refresh_token()
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());
            TaskResult::TokenRefreshed(result)
        });
    }

    // =========================================================================
    // Navigation shell
    // =========================================================================

    /// Number of drawer rows: every screen plus the logout entry.
    pub fn drawer_len(&self) -> usize {
        Screen::ALL.len() + 1
    }

    pub fn is_logout_selected(&self) -> bool {
        self.drawer_selection == Screen::ALL.len()
    }

    pub fn toggle_drawer(&mut self) {
        self.actions_open = false;
        self.drawer_open = !self.drawer_open;
        if self.drawer_open {
            self.drawer_selection = Screen::ALL
                .iter()
                .position(|s| *s == self.screen)
                .unwrap_or(0);
        }
    }

    pub fn drawer_next(&mut self) {
        self.drawer_selection = (self.drawer_selection + 1) % self.drawer_len();
    }

    pub fn drawer_prev(&mut self) {
        let len = self.drawer_len();
        self.drawer_selection = (self.drawer_selection + len - 1) % len;
    }

    pub fn activate_drawer_selection(&mut self) {
        match Screen::ALL.get(self.drawer_selection) {
            Some(screen) => {
                self.screen = *screen;
                self.drawer_open = false;
            }
            None => self.request_logout(),
        }
    }

    pub fn toggle_actions(&mut self) {
        self.drawer_open = false;
        self.actions_open = !self.actions_open;
        self.action_selection = 0;
    }

    pub fn action_next(&mut self) {
        self.action_selection = (self.action_selection + 1) % QuickAction::ALL.len();
    }

    pub fn action_prev(&mut self) {
        let len = QuickAction::ALL.len();
        self.action_selection = (self.action_selection + len - 1) % len;
    }

    pub fn activate_action(&mut self) {
        let action = QuickAction::ALL[self.action_selection % QuickAction::ALL.len()];
        info!(action = action.label(), "Quick action selected");
        self.status_message = Some(format!("{} selected", action.label()));
        self.actions_open = false;
    }

    pub fn go_home(&mut self) {
        self.close_overlays();
        self.screen = Screen::Home;
    }

    pub fn close_overlays(&mut self) {
        self.drawer_open = false;
        self.actions_open = false;
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a login character should be accepted
pub fn can_add_login_char(current_len: usize, c: char) -> bool {
    current_len < MAX_LOGIN_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use zooloo_core::{AuthClient, CredentialStore};

    fn app_with(endpoint: &str, store: CredentialStore) -> App {
        let client = AuthClient::with_timeout(endpoint, store, Duration::from_secs(10))
            .expect("client should build");
        let session = Arc::new(SessionManager::new(client));
        let mut app = App::new(Config::default(), session);
        app.login_input.clear();
        app.login_password.clear();
        app
    }

    fn test_app() -> App {
        app_with("http://127.0.0.1:9/rest.php", CredentialStore::in_memory())
    }

    // -------------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_starts_on_splash_then_routes_to_login() {
        let mut app = test_app();
        assert_eq!(app.route, Route::Splash);

        app.session.init().await;
        app.sync_session();

        assert_eq!(app.route, Route::Login);
        assert_eq!(app.session_state, SessionState::Unauthenticated);
    }

    #[test]
    fn test_sync_without_change_keeps_route() {
        let mut app = test_app();
        app.sync_session();
        assert_eq!(app.route, Route::Splash);
    }

    #[tokio::test]
    async fn test_leaving_shell_closes_overlays() {
        let mut app = test_app();
        app.route = Route::Home;
        app.screen = Screen::Settings;
        app.toggle_drawer();
        app.state = AppState::ConfirmingLogout;

        app.session.init().await;
        app.sync_session();

        assert_eq!(app.route, Route::Login);
        assert!(!app.drawer_open);
        assert_eq!(app.screen, Screen::Home);
        assert_eq!(app.state, AppState::Normal);
    }

    // -------------------------------------------------------------------------
    // Background tasks at exit
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_confirmed_logout_finishes_before_exit() {
        let store = CredentialStore::in_memory();
        store.set_token("abc123").unwrap();
        let mut app = app_with("http://127.0.0.1:9/rest.php", store.clone());

        app.confirm_logout();
        app.finish_pending_tasks(Duration::from_secs(5)).await;

        assert!(app.pending_tasks.is_empty());
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(Arc::strong_count(&app.session), 1);
    }

    #[tokio::test]
    async fn test_exit_during_hung_logout_still_clears_store() {
        // Accepts connections into the backlog but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/rest.php", listener.local_addr().unwrap());

        let store = CredentialStore::in_memory();
        store.set_token("abc123").unwrap();
        let mut app = app_with(&endpoint, store.clone());

        app.confirm_logout();
        app.finish_pending_tasks(Duration::from_millis(200)).await;

        assert!(app.pending_tasks.is_empty());
        assert_eq!(store.token().unwrap(), None);
        drop(listener);
    }

    #[tokio::test]
    async fn test_finish_without_pending_tasks_returns_immediately() {
        let mut app = test_app();
        app.finish_pending_tasks(Duration::from_millis(1)).await;
        assert!(app.pending_tasks.is_empty());
    }

    // -------------------------------------------------------------------------
    // Login form
    // -------------------------------------------------------------------------

    #[test]
    fn test_submit_login_requires_both_fields() {
        let mut app = test_app();
        app.login_input = "admin".to_string();
        app.login_password = "   ".to_string();

        app.submit_login();

        assert_eq!(app.login_error.as_deref(), Some("Please fill in all fields"));
        assert!(!app.login_in_flight);
    }

    #[test]
    fn test_login_focus_cycles() {
        assert_eq!(LoginFocus::Login.next(), LoginFocus::Password);
        assert_eq!(LoginFocus::Password.next(), LoginFocus::Button);
        assert_eq!(LoginFocus::Button.next(), LoginFocus::Login);
        assert_eq!(LoginFocus::Login.prev(), LoginFocus::Button);
        assert_eq!(LoginFocus::Button.prev(), LoginFocus::Password);
    }

    #[test]
    fn test_failed_login_result_shows_message() {
        let mut app = test_app();
        app.login_in_flight = true;

        app.process_task_result(TaskResult::Login {
            login: "admin".to_string(),
            result: Err("Invalid login or password".to_string()),
        });

        assert!(!app.login_in_flight);
        assert_eq!(app.login_error.as_deref(), Some("Invalid login or password"));
        assert_eq!(app.login_focus, LoginFocus::Password);
    }

    // -------------------------------------------------------------------------
    // Drawer and quick actions
    // -------------------------------------------------------------------------

    #[test]
    fn test_drawer_navigation_wraps() {
        let mut app = test_app();
        app.toggle_drawer();
        assert!(app.drawer_open);
        assert_eq!(app.drawer_selection, 0);

        app.drawer_prev();
        assert!(app.is_logout_selected());

        app.drawer_next();
        assert_eq!(app.drawer_selection, 0);
    }

    #[test]
    fn test_drawer_selects_screen() {
        let mut app = test_app();
        app.toggle_drawer();
        app.drawer_next();
        app.drawer_next();
        app.activate_drawer_selection();

        assert_eq!(app.screen, Screen::Settings);
        assert!(!app.drawer_open);

        // Reopening highlights the current screen
        app.toggle_drawer();
        assert_eq!(app.drawer_selection, 2);
    }

    #[test]
    fn test_drawer_logout_asks_for_confirmation() {
        let mut app = test_app();
        app.toggle_drawer();
        app.drawer_selection = Screen::ALL.len();
        app.activate_drawer_selection();

        assert_eq!(app.state, AppState::ConfirmingLogout);
        assert!(!app.drawer_open);
    }

    #[test]
    fn test_overlays_are_exclusive() {
        let mut app = test_app();
        app.toggle_drawer();
        app.toggle_actions();
        assert!(app.actions_open);
        assert!(!app.drawer_open);

        app.toggle_drawer();
        assert!(app.drawer_open);
        assert!(!app.actions_open);
    }

    #[test]
    fn test_quick_action_activation() {
        let mut app = test_app();
        app.toggle_actions();
        app.action_prev();
        assert_eq!(app.action_selection, 2);

        app.activate_action();
        assert!(!app.actions_open);
        assert_eq!(app.status_message.as_deref(), Some("Search selected"));
    }

    #[test]
    fn test_go_home_closes_overlays() {
        let mut app = test_app();
        app.screen = Screen::About;
        app.toggle_actions();
        app.go_home();
        assert_eq!(app.screen, Screen::Home);
        assert!(!app.actions_open);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_login_char() {
        assert!(can_add_login_char(0, 'a'));
        assert!(can_add_login_char(63, 'z'));
        assert!(!can_add_login_char(64, 'a'));
        assert!(!can_add_login_char(0, '\x00'));
        assert!(!can_add_login_char(0, '\n'));
        assert!(!can_add_login_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }
}
