//! # Store crate: client-side persisted state and internationalisation
//!
//! Everything the browser side of Atlantis keeps between page loads lives here:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`kv`] | The [`KeyValueStore`] trait (a local-storage analogue) |
//! | [`config`] | The `atlantis.toml` site configuration |
//! | [`i18n`] | Translation tables, the [`I18n`] manager and the [`Page`] it repaints |
//!
//! Two key/value stores are provided: [`MemoryStore`] for tests and ephemeral
//! sessions, and [`FileStore`] for native hosts that persist to disk.

pub mod config;
pub mod i18n;
pub mod kv;

mod error;
mod file_store;
mod memory;

pub use config::SiteConfig;
pub use error::StoreError;
pub use file_store::FileStore;
pub use i18n::{Catalog, Direction, I18n, Page, Translate};
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
