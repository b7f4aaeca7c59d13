//! Pages of the companion app.
//!
//! - `auth`: sign-in state and the credential checker
//! - `shell`: the single active page and the theme preference
//! - `meditation`: countdown with looping audio
//! - `walk`: stopwatch with a persisted total and tips
//! - `music`: calm music playlist

pub mod auth;
pub mod meditation;
pub mod music;
pub mod shell;
pub mod walk;

pub use auth::{AuthError, AuthState, Authenticator, MockAuthenticator, User};
pub use meditation::MeditationHost;
pub use music::{AudioFactory, MusicHost, MusicPlaylist, CALM_TRACKS};
pub use shell::{Page, Shell, ShellError, ThemePreference, THEME_KEY};
pub use walk::{WalkHost, WALK_TOTAL_KEY};
