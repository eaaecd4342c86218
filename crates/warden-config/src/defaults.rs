//! Environment key names and default values.
//!
//! # Design
//! - Keep every key name in one place so validation and logging agree.
//! - Grouped keys are declared in the order they are reported when missing.

/// Account identity for the worker.
pub const KEY_USER: &str = "USER";
/// Account secret for the worker.
pub const KEY_PASSWORD: &str = "PASSWORD";
/// Notification webhook target.
pub const KEY_WEBHOOK: &str = "WEBHOOK";
/// Chat identifier for notifications.
pub const KEY_CHAT_ID: &str = "CHATID";
/// Bot token for chat notifications.
pub const KEY_TELEGRAM_TOKEN: &str = "TELEGRAMTOKEN";
/// Access token for the remote asset store.
pub const KEY_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Owner of the repository holding the credential bundle.
pub const KEY_ASSET_OWNER: &str = "CJ_OWNER";
/// Repository holding the credential bundle.
pub const KEY_ASSET_REPO: &str = "CJ_REPO";
/// Path of the credential bundle inside the repository.
pub const KEY_ASSET_FILE: &str = "CJ_FILE";
/// Bind host for the health service.
pub const KEY_HOST: &str = "HOST";
/// Bind port for the health service.
pub const KEY_PORT: &str = "PORT";
/// Informational hosting provider label.
pub const KEY_HOSTING_PROVIDER: &str = "HOSTING_PROVIDER";
/// Toggle for the health service.
pub const KEY_KEEP_ALIVE: &str = "KEEP_ALIVE";
/// Directory holding the credential bundle.
pub const KEY_COOKIES_DIR: &str = "COOKIES_DIR";
/// Interpreter used to run the worker entrypoint.
pub const KEY_WORKER_INTERPRETER: &str = "WORKER_INTERPRETER";
/// Worker entrypoint script.
pub const KEY_WORKER_ENTRYPOINT: &str = "WORKER_ENTRYPOINT";
/// Policy applied when the remote fetch fails.
pub const KEY_ON_FETCH_FAILURE: &str = "ON_FETCH_FAILURE";
/// Optional path to the declarative worker profile.
pub const KEY_WORKER_PROFILE: &str = "WORKER_PROFILE";
/// Base URL of the remote asset store API.
pub const KEY_ASSET_API_URL: &str = "GITHUB_API_URL";

/// Keys that are required for every run.
pub const REQUIRED_KEYS: [&str; 2] = [KEY_USER, KEY_PASSWORD];
/// Optional keys that are independent of each other.
pub const OPTIONAL_KEYS: [&str; 3] = [KEY_WEBHOOK, KEY_CHAT_ID, KEY_TELEGRAM_TOKEN];
/// Remote asset keys that must be set together or not at all.
pub const REMOTE_ASSET_KEYS: [&str; 4] = [
    KEY_GITHUB_TOKEN,
    KEY_ASSET_OWNER,
    KEY_ASSET_REPO,
    KEY_ASSET_FILE,
];

/// Default health service bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default health service bind port.
pub const DEFAULT_PORT: u16 = 6060;
/// Default credential directory, relative to the working directory.
pub const DEFAULT_COOKIES_DIR: &str = "cookies";
/// Default worker interpreter.
pub const DEFAULT_WORKER_INTERPRETER: &str = "python";
/// Default worker entrypoint.
pub const DEFAULT_WORKER_ENTRYPOINT: &str = "run.py";
/// Default remote asset store API.
pub const DEFAULT_ASSET_API_URL: &str = "https://api.github.com";
