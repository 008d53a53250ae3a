//! Middleware module for the Precinct HTTP server
//!
//! Provides the authentication extractor (Bearer token / API key).

pub mod auth;
