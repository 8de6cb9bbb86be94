//! Tender and bid procurement service
//!
//! Organizations publish tenders; users and organizations answer them with
//! bids. Both carry a versioned history that can be rolled back.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;
pub mod store;
