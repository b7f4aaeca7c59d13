//! Page shell.
//!
//! The shell shows at most one page at a time. Every page is a variant of
//! [`Page`] that owns its host, so switching pages is one assignment and the
//! outgoing page is always torn down first. Pages other than the chat box
//! require a signed-in user.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::auth::{AuthError, AuthState, Authenticator, User};
use super::meditation::MeditationHost;
use super::music::MusicHost;
use super::walk::WalkHost;
use crate::session::{ClockSource, KeyValueStore};
use crate::types::ActivePage;

/// Errors from the shell.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// Pages can only be opened after signing in.
    #[error("sign in to open the {0} page")]
    NotAuthenticated(&'static str),

    /// The credentials were rejected.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// The page on screen, owning whatever host it runs.
pub enum Page<C: ClockSource> {
    None,
    Music(MusicHost),
    Meditation(MeditationHost<C>),
    Journal,
    Walk(WalkHost<C>),
}

impl<C: ClockSource> Page<C> {
    pub fn kind(&self) -> ActivePage {
        match self {
            Page::None => ActivePage::None,
            Page::Music(_) => ActivePage::Music,
            Page::Meditation(_) => ActivePage::Meditation,
            Page::Journal => ActivePage::Journal,
            Page::Walk(_) => ActivePage::Walk,
        }
    }

    /// Releases the page's clock subscription, audio and pending fades.
    pub fn teardown(&mut self) {
        match self {
            Page::Music(host) => host.teardown(),
            Page::Meditation(host) => host.teardown(),
            Page::Walk(host) => host.teardown(),
            Page::None | Page::Journal => {}
        }
    }
}

impl<C: ClockSource> Default for Page<C> {
    fn default() -> Self {
        Page::None
    }
}

/// Authentication gate plus the single active page.
pub struct Shell<C: ClockSource> {
    auth: AuthState,
    page: Page<C>,
}

impl<C: ClockSource> Default for Shell<C> {
    fn default() -> Self {
        Self {
            auth: AuthState::default(),
            page: Page::None,
        }
    }
}

impl<C: ClockSource> Shell<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Signs in through `authenticator`.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::Auth` if the credentials are rejected.
    pub fn login(
        &mut self,
        authenticator: &dyn Authenticator,
        email: &str,
        password: &str,
    ) -> Result<User, ShellError> {
        let user = authenticator.login(email, password)?;
        self.sign_in(user.clone());
        Ok(user)
    }

    /// Creates an account through `authenticator` and signs it in.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::Auth` if the signup is rejected.
    pub fn signup(
        &mut self,
        authenticator: &dyn Authenticator,
        email: &str,
        password: &str,
    ) -> Result<User, ShellError> {
        let user = authenticator.signup(email, password)?;
        self.sign_in(user.clone());
        Ok(user)
    }

    /// Signs out, closing the active page.
    pub fn logout(&mut self) {
        self.close();
        if let AuthState::Authenticated(user) = std::mem::take(&mut self.auth) {
            info!(email = %user.email, "Signed out");
        }
    }

    /// Replaces the active page, tearing down the previous one.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in; the current
    /// page is left untouched.
    pub fn open(&mut self, page: Page<C>) -> Result<ActivePage, ShellError> {
        let kind = page.kind();
        if kind != ActivePage::None && !self.auth.is_authenticated() {
            warn!(page = kind.as_str(), "Refused to open page while signed out");
            return Err(ShellError::NotAuthenticated(kind.as_str()));
        }

        self.page.teardown();
        self.page = page;
        debug!(page = kind.as_str(), "Page opened");
        Ok(kind)
    }

    /// Closes the active page, returning to the chat box.
    pub fn close(&mut self) {
        self.page.teardown();
        self.page = Page::None;
    }

    pub fn active_page(&self) -> ActivePage {
        self.page.kind()
    }

    pub fn page(&self) -> &Page<C> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page<C> {
        &mut self.page
    }

    fn sign_in(&mut self, user: User) {
        info!(email = %user.email, "Signed in");
        self.auth = AuthState::Authenticated(user);
    }
}

impl<C: ClockSource> Drop for Shell<C> {
    fn drop(&mut self) {
        self.page.teardown();
    }
}

// ============================================================================
// ThemePreference
// ============================================================================

/// Storage key of the theme preference.
pub const THEME_KEY: &str = "theme";

/// Persisted dark-mode flag.
pub struct ThemePreference {
    store: Box<dyn KeyValueStore>,
    dark: bool,
}

impl ThemePreference {
    /// Reads the stored theme. Anything but `"dark"` means light.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let dark = match store.load(THEME_KEY) {
            Ok(value) => value.as_deref() == Some("dark"),
            Err(e) => {
                warn!("Could not read theme: {}", e);
                false
            }
        };
        Self { store, dark }
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    /// Flips and persists the theme. Returns true if now dark.
    pub fn toggle(&mut self) -> bool {
        self.dark = !self.dark;
        let value = if self.dark { "dark" } else { "light" };
        if let Err(e) = self.store.save(THEME_KEY, value) {
            warn!("Could not save theme: {}", e);
        }
        self.dark
    }
}

impl std::fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreference")
            .field("dark", &self.dark)
            .finish_non_exhaustive()
    }
}
