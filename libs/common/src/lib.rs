//! Common library for the Tubestream application
//!
//! This crate provides the infrastructure shared by Tubestream services:
//! PostgreSQL connection pooling, schema migrations, and the database
//! error type.

pub mod database;
pub mod error;
