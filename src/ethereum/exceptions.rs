//! Error types common across all Ethereum forks.
//!
//!

use thiserror::Error;

use super::cancun::state::StateError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Exception {
    /// Base class for all exceptions _expected_ to be thrown during normal
    /// operation.
    #[error("{0}")]
    EthereumException(&'static str),

    /// A word did not fit the narrower integer it was converted to.
    #[error("numeric overflow")]
    NumericOverflow,

    /// The storage backend failed underneath a message call.
    #[error("state backend failure: {0}")]
    State(#[from] StateError),
}
