pub mod accounts;
pub mod board;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod integrations;
pub mod lifecycle;
pub mod markdown;
pub mod payments;
pub mod storage;
pub mod telemetry;
pub mod tenancy;

pub use board::{Feedback, Integrations, JobBoard};
