//! Core logic for quickadd.
//!
//! quickadd redirects Google Calendar quick-add links to a configurable
//! event-creation endpoint, optionally letting the user pick between Google and
//! the custom handler. This crate holds everything that does not depend on a
//! particular host browser:
//! - `intercept` and `background` for the navigation interceptor
//! - `handoff` for passing intercepted URLs between browser contexts
//! - `chooser` and `settings_form` for the two extension pages
//! - `quick_add` for reading quick-add parameters on the endpoint side
//! - `platform` for the browser contract, with `memory` implementing it in-process

pub mod background;
pub mod chooser;
pub mod constants;
pub mod error;
pub mod handoff;
pub mod intercept;
pub mod memory;
pub mod platform;
pub mod quick_add;
pub mod settings;
pub mod settings_form;

pub use error::{QuickAddError, QuickAddResult};
pub use settings::Settings;
