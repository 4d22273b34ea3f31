//! University records dashboard.
//!
//! Entity pages (list, add, update, delete) are described as data in
//! [`entities`] and composed generically by [`crud`]. The `unidashd` binary
//! serves them to a host UI over newline-delimited JSON on stdin/stdout.

pub mod config;
pub mod crud;
pub mod dashboard;
pub mod db;
pub mod dependent;
pub mod entities;
pub mod error;
pub mod executor;
pub mod forms;
pub mod ipc;
pub mod notice;

pub use config::AppConfig;
pub use executor::Executor;
