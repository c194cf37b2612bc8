//! Grounded generation client: request types, retry policy, and the client
//! itself.

pub mod core;
pub mod request;
pub mod retry;

pub use self::core::GroundedClient;
pub use request::{
    GenerationPayload, GenerationRequest, GenerationResult, GroundingSource, OutputMode,
};
pub use retry::RetryConfig;
