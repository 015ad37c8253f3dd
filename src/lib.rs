pub mod config;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::create_routes;
pub use state::AppState;
