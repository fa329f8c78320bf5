pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod plan;
pub mod process;
pub mod schema;
pub mod staging;
pub mod transform;
