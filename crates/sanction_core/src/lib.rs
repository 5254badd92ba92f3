//! SANCTION Core Types
//!
//! Pure types shared by the policy engine. Nothing in this crate performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod ident;
pub mod options;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use ident::{rule_name, validate_ident};
pub use options::Options;
