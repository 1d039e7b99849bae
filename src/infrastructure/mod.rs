pub mod config;
pub mod journal;
pub mod paths;
pub mod remote;
pub mod render;
pub mod service;
pub mod tracing;
pub mod validator;
