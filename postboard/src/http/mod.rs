//! HTTP layer: Axum router, handlers, and responses.
//!
//! Exposes `/users` and `/posts` CRUD endpoints plus `/health`. Every
//! handler makes one or two store calls and maps [`crate::store::StoreError`]
//! to a status code through [`error::ApiError`].

mod error;
mod extract;
mod handlers;
mod responses;
mod state;


pub use handlers::router;
pub use state::AppState;
