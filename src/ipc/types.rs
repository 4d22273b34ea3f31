use crate::config::DatabaseConfig;
use crate::crud::EntitySpec;
use crate::entities;
use crate::executor::Executor;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub executor: Executor,
    pub catalog: Vec<EntitySpec>,
}

impl AppState {
    pub fn new(database: DatabaseConfig) -> Self {
        Self {
            executor: Executor::new(database),
            catalog: entities::catalog(),
        }
    }
}
