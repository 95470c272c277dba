pub mod admin;
pub mod auth;
pub mod claims;
pub mod tasks;
pub mod webhook;
