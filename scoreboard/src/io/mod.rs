//! I/O helpers: configuration, the durable journal and its store lock.

pub mod config;
pub mod journal;
pub mod store_lock;
