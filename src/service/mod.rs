//! CrudService and request validation shared by all handlers.

mod crud;
mod validation;
pub use crud::CrudService;
pub use validation::{is_present, RequestValidator};
