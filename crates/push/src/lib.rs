//! Chime's dispatch engine: the periodic cycle, per-definition dispatch
//! aggregation, and the push gateway transport.
//!
//! - [`CycleRunner`] — background loop that captures one reference instant
//!   per pass and walks definition kinds in a fixed order.
//! - [`dispatcher`] — target resolution, eligibility filtering, outcome
//!   folding, and unconditional persistence for one definition.
//! - [`PushTransport`] — the gateway seam; [`FcmTransport`] is the FCM
//!   legacy HTTP implementation.

pub mod cycle;
pub mod dispatcher;
pub mod transport;

pub use cycle::{CycleRunner, CycleSummary, DEFAULT_CYCLE_INTERVAL};
pub use dispatcher::DispatchOutcome;
pub use transport::{BatchOutcome, FcmConfig, FcmTransport, PushTransport, TransportError};
