//! Notes API: create, read, list, update and delete notes in DynamoDB from a
//! single Lambda function behind API Gateway.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod id;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod store;
pub mod trace;
pub mod util;
