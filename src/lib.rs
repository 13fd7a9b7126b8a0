pub mod alerts;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod service;
pub mod store;
