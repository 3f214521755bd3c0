pub mod endpoint;
pub mod error;
pub mod request;
pub mod workflow;
