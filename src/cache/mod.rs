//! Caching subsystem.
//!
//! Three pieces, leaves first:
//!
//! - [`CachePath`] — a validated, normalized relative path. The identity
//!   key for caching; construction rejects traversal so every mapped
//!   location is strictly inside the cache root.
//!
//! - [`LocalStore`] — maps a [`CachePath`] to a file on disk. Reads and
//!   atomic temp-then-rename writes; presence of the file is the only
//!   cache signal.
//!
//! - [`CacheResolver`] — the core. Orchestrates "check store → on miss,
//!   fetch from origin → persist → serve", coalescing concurrent misses
//!   for the same path onto a single in-flight fetch. See [`resolver`]
//!   module docs for the single-flight and cancellation guarantees.

pub mod path;
pub mod resolver;
pub mod store;

pub use path::CachePath;
pub use resolver::CacheResolver;
pub use store::LocalStore;
