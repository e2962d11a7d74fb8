//! Bundler manifest loading.
//!
//! The manifest is the JSON file the bundler writes next to its output,
//! mapping logical keys (source paths such as `app.js` or `../assets/logo.png`)
//! to the content-hashed files it produced.

mod store;
mod types;

pub use store::*;
pub use types::*;
