mod ca_bundle;
mod tls_context_builder;
mod tls_context_handle;

pub use ca_bundle::*;
pub use tls_context_builder::*;
pub use tls_context_handle::*;
