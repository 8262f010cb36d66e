//! Store directory web library.
//!
//! This crate provides the directory's HTTP surface as a library,
//! allowing it to be tested and reused by the server binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod uploads;
