//! Actor services owning the store's collections. One mailbox per service:
//! a handler runs to completion before the next message is admitted, so every
//! read-check-write is a single atomic unit.

pub mod catalog;
pub mod ledger;
pub mod registry;

pub use catalog::*;
pub use ledger::*;
pub use registry::*;

/// Macro for clean error response handling
macro_rules! send_error {
    ($respond_to:expr, $error:expr) => {{
        let _ = $respond_to.send(Err($error));
        return;
    }};
}

pub(crate) use send_error;
