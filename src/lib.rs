pub mod analysis;
pub mod data;
pub mod engine;
pub mod error;
pub mod query;
pub mod report;

pub use error::EngineError;
