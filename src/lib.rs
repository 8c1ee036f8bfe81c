//! PetMatch backend: REST API for pets, favorites, adoption requests and tags.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, ConfigError, StoreError};
pub use routes::{build_router, build_router_with_limit};
pub use service::CrudService;
pub use settings::{DatabaseSettings, Settings};
pub use state::AppState;
pub use store::{Datastore, MemoryDatastore, PgDatastore};
