// Core dispatch machinery for the Fathom tool servers

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod schema;
pub mod validate;

pub use config::Credentials;
pub use dispatch::Dispatcher;
pub use envelope::{Envelope, EnvelopeError};
pub use error::{ErrorKind, HandlerError, HttpFailure, RegistryError, ValidationError};
pub use registry::ToolRegistry;
pub use schema::{Handler, ParamSpec, ParamType, ToolDefinition, ToolSpec};
pub use validate::{validate, ValidatedArgs};
