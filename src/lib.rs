//! # Social Metadata Library
//!
//! Renders public Facebook page data (opening hours, about text, latest
//! posts, events) as HTML fragments, and provides the admin flows that
//! authorize pages and register the site's domain on the Facebook app.

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod content;
pub mod credentials;
pub mod db;
pub mod error;
pub mod graph;
pub mod handlers;
pub mod models;
pub mod render;
pub mod repositories;
pub mod sanitize;
pub mod server;
pub mod service;
pub mod surfaces;
pub mod telemetry;
pub use migration;
