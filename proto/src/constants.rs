//! Because consistency is great!
//!
pub mod uri;

use std::time::Duration;

/// The default USOS API instance the bot talks to.
pub const DEFAULT_USOS_ADDRESS: &str = "https://apps.usos.pw.edu.pl/";

/// The location of the bot configuration if none is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/usos-auth/bot.toml";
/// The user-owned path for the client config used by the cli tool.
pub const DEFAULT_CLIENT_CONFIG_PATH_HOME: &str = "~/.config/usos-auth";

/// USOS only ever issues pin based verifiers to us.
pub const OAUTH_CALLBACK_OOB: &str = "oob";
pub const OAUTH_SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// `studies` is required to read `student_programmes` and course editions.
pub const DEFAULT_SCOPES: [&str; 1] = ["studies"];

pub const USER_FIELDS: &str = "id|first_name|last_name|student_programmes";
pub const COURSE_FIELDS: &str = "course_editions";

pub const DEFAULT_AUTH_PROMPT: &str = "React to this message to get authorized!";
pub const DEFAULT_AUTH_REACTION: &str = "✅";

/// How often expired pending sessions are purged.
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(60);
