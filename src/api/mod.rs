//! Request-shape plumbing shared by the route handlers

pub mod extract;
pub mod pagination;
pub mod validation;

pub use extract::{JsonBody, PathParams, QueryParams};
pub use pagination::PaginationParams;
