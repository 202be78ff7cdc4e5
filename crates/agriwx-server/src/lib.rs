//! HTTP surface and lookup orchestration for AgriWx.

pub mod lookup;
pub mod routes;

pub use lookup::{LookupResult, LookupService};
pub use routes::routes;
