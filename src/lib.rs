// Library entry point for the mdt-eval CLI
pub mod ai;
pub mod config;
pub mod error;
pub mod files;
pub mod pipeline;
pub mod report;
pub mod session;

pub use error::EvalError;
