//! Acting identity of a request
//!
//! The caller names itself with `?username=`; there is no credential check.

pub mod middleware;

pub use middleware::{OptionalUser, RequireUser};
