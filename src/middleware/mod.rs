//! Request/response interceptors.

pub mod auth;
