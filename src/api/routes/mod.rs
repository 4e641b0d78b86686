pub mod auth;
pub mod collections;
pub mod galleries;
pub mod models;
pub mod webhooks;
