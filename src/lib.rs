pub mod activities;
pub mod auth;
pub mod config;
pub mod error;
pub mod markdown;
pub mod models;
pub mod reconcile;
pub mod routes;
pub mod s3;
pub mod session;
pub mod state;
pub mod storage;
pub mod sync;
pub mod tables;
pub mod upload;
pub mod utils;
