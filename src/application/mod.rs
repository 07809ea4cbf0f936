// Application layer - use cases shared by the HTTP API and the CLI.

pub mod error;
pub mod seed;
pub mod service;

pub use error::*;
pub use seed::*;
pub use service::*;
