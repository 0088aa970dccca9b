pub mod config;
pub mod deserializers;
pub mod error;
pub mod headers;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod repo;
pub mod routes;
pub mod seed;

// Re-export commonly used items for tests / external users
pub use config::AppConfig;
pub use headers::{api_cors, ApiHeaders};
pub use routes::{config, AppState};
