//! Spegil - lazy-loading caching reverse proxy
//!
//! Spegil sits in front of a single upstream origin and serves GET
//! requests from an on-disk cache, filling the cache on first access.
//! POST requests pass straight through to the origin and are never
//! cached. Presence on disk is the only cache signal: there is no TTL,
//! no index, and no eviction. Removal is an operator action.
//!
//! The interesting part is the miss path: concurrent requests for the
//! same uncached path are coalesced onto a single origin fetch
//! (single-flight), and the fetched bytes are published to disk with a
//! write-to-temp-then-rename so readers never observe a partial file.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use spegil::{CacheResolver, LocalStore, OriginClient};
//!
//! #[tokio::main]
//! async fn main() -> spegil::Result<()> {
//!     let store = Arc::new(LocalStore::open("./cache")?);
//!     let origin = OriginClient::new(
//!         "https://upstream.example.com",
//!         std::time::Duration::from_secs(30),
//!     )?;
//!     let resolver = CacheResolver::new(store, Arc::new(origin));
//!
//!     // First call fetches from the origin and persists; later calls
//!     // are served from disk without touching the network.
//!     let bytes = resolver.resolve("/assets/logo.png").await?;
//!     println!("{} bytes", bytes.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod origin;
pub mod server;
pub mod telemetry;

// Re-export main types at crate root
pub use cache::{CachePath, CacheResolver, LocalStore};
pub use error::{Error, Result};
pub use origin::{Origin, OriginClient};
