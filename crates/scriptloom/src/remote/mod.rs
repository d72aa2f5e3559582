//! One-attempt remote calls against the generative API.
//!
//! Nothing here retries or rotates credentials; that is the driver's job.

pub mod adapter;
pub mod error;
pub mod gemini;
pub mod retry_info;

pub use adapter::{Operation, Payload, RemoteCall};
pub use error::CallError;
pub use gemini::GeminiClient;
