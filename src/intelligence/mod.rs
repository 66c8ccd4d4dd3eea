pub mod advice;
pub mod advisor;
pub mod client;
pub mod error;
pub mod types;

pub use client::{ContentGenerator, GeminiClient, RetryPolicy};
pub use error::IntelligenceError;
