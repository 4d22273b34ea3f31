pub mod core;
pub mod dashboard;
pub mod entities;
