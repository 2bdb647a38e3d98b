//! Operator-facing messaging: port trait + cross-messenger types.

pub mod port;
pub mod types;
