//! Persistence adapters over the SQLite pool.

pub mod session_repository;
pub mod user_repository;
