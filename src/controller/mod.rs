//! Controller subsystem for phone gamepad input
//!
//! 1. [`registry`] - Session to player slot binding
//! 2. [`debouncer`] - Analog stick to digital edge conversion
//! 3. [`router`] - Event dispatch to the key sink
//! 4. [`router_handle`] - Shared async access for connection tasks
//!
//! # Architecture
//!
//! ```text
//! Connection task ──► RouterHandle ──► InputRouter ──► KeySink
//!                                          │
//!                                          └──► ClientHub (outbound)
//! ```

pub mod debouncer;
pub mod registry;
pub mod router;
pub mod router_handle;

pub use registry::{PlayerSlot, SessionId, MAX_PLAYERS};
pub use router::{ConnectOutcome, InputRouter};
pub use router_handle::RouterHandle;
