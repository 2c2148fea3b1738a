//! Newsroom - a small news site with moderated reader comments
//!
//! This library provides the core functionality of the site: storage,
//! business rules, templates and the HTTP routes.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
