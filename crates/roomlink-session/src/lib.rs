//! Client-side lobby session for roomlink.
//!
//! This crate owns the one piece of mutable state a lobby client has:
//! which room this device is in, under which name, and whether it has
//! (optimistically) declared itself ready.
//!
//! 1. **State cell**: [`LobbyState`] lives in a `tokio::sync::watch`
//!    channel owned by the [`SessionController`]. Everything else reads
//!    it through [`SessionController::subscribe`].
//! 2. **Session control**: create / join / leave ([`SessionController`]).
//! 3. **Ready-check**: optimistic toggle with exact rollback
//!    ([`ReadySnapshot`], [`ReadyOutcome`]).
//! 4. **Reconciliation**: the pure [`reconcile`] function that lets the
//!    server snapshot win.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby facade (above)  ← polling, directory, game launch
//!     ↕
//! Session Layer (this crate)  ← current room, ready flag, reconciliation
//!     ↕
//! Transport Layer (below)  ← RoomService over HTTP or in-process
//! ```

mod controller;
mod error;
mod ready;
mod reconcile;
mod state;

pub use controller::SessionController;
pub use error::SessionError;
pub use ready::{ReadyOutcome, ReadySnapshot};
pub use reconcile::{ReconcileOutcome, reconcile};
pub use state::{ClientPhase, LobbyState};
