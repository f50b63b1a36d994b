pub mod choose;
pub mod parse;
pub mod rewrite;
pub mod settings;

/// Base URL the in-process browser serves extension pages from.
pub const EXTENSION_BASE: &str = "chrome-extension://quickadd";
