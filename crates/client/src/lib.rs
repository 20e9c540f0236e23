//! Client side of TorDemand.
//!
//! [`SearchController`] runs user searches against the server and exposes the
//! resulting [`SearchSession`] for rendering; [`LinkDispatcher`] acts on the
//! download links of a result.

pub mod backend;
pub mod controller;
pub mod dispatch;
pub mod session;

pub use backend::{HttpSearchBackend, SearchBackend, TransportError};
pub use controller::{IgnoreReason, SearchController, SubmitOutcome, TransitionTimings};
pub use dispatch::{Activation, DispatchError, LinkDispatcher, Navigator, SystemNavigator};
pub use session::{DisplayResult, SearchSession, SessionStatus, SessionToken, Transition};
