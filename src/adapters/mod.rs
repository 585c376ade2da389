// Adapters layer: concrete implementations for the filesystem and the relational store.

pub mod sqlite;
pub mod storage;

pub use storage::LocalStorage;
