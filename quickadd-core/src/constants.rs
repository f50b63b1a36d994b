use std::time::Duration;

/// Redirect target used by the interceptor when no redirect origin is stored.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000/event/add-to";

/// Handler origin used by the chooser when no redirect origin is stored.
pub const DEFAULT_HANDLER_ORIGIN: &str = "http://localhost:3000";

/// Host and path every intercepted quick-add link contains.
pub const QUICK_ADD_HOST_PATH: &str = "calendar.google.com/calendar/render";
pub const QUICK_ADD_ACTION: &str = "action=TEMPLATE";

/// Query parameter carrying the intercepted URL on handler, bounce and chooser URLs.
pub const ORIGINAL_PARAM: &str = "original";

pub const HANDLER_PATH: &str = "/event/add-to";
pub const BOUNCE_PATH: &str = "/event/add-to-bounce";

// Handoff channel keys
pub const PENDING_KEY: &str = "pending_orig";
pub const TAB_KEY_PREFIX: &str = "orig_";

pub const SETTINGS_PAGE: &str = "settings.html";
pub const CHOOSER_PAGE: &str = "chooser.html";

pub const SETTINGS_MENU_ID: &str = "open-settings";
pub const SETTINGS_MENU_TITLE: &str = "Open Settings";

/// Delays after tab creation at which the bounce handoff is written again.
pub const HANDOFF_REWRITE_DELAYS: [Duration; 2] =
    [Duration::from_millis(100), Duration::from_millis(300)];

/// How long a settings status message stays visible.
pub const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(3);
