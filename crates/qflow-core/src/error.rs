//! Errors raised while building or inspecting a [`QuantumNetwork`](crate::QuantumNetwork)
//!
//! Reader and solver failures have their own types in the io and algo crates;
//! this one only covers what the network model itself can reject.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// A node `type` attribute that is none of generator, repeater or client.
    #[error("unknown node type '{0}'")]
    UnknownNodeKind(String),

    #[error("unsupported graph export format '{0}'")]
    UnsupportedExportFormat(String),
}
