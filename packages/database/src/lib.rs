#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Database connection for the incident dashboard.
//!
//! The dashboard only reads from Postgres, so connections are opened in
//! read-only mode with a bounded statement timeout.

pub mod db;

/// Errors that can occur while setting up the database connection.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The connection URL could not be parsed.
    #[error("Invalid DATABASE_URL: {message}")]
    Credentials {
        /// Description of what went wrong.
        message: String,
    },

    /// The connection could not be established.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of what went wrong.
        message: String,
    },
}
