//! # ciscoauth
//!
//! Authentication handshake handling for Cisco video conferencing codecs.
//!
//! Cisco codecs announce pin-protected calls over their line-oriented text
//! protocol. This crate mediates the handshake between a human operator and
//! the codec: it reassembles the fragmented byte stream into protocol
//! lines, tracks which call is awaiting authentication, presents the
//! offered role/pin schemes, collects a pin through a virtual keypad,
//! submits the response command, and recovers when the codec rejects it,
//! the call ends, or no resolution arrives in time.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): a delimiter framing buffer with no
//!   protocol knowledge, plus classification of the known response shapes.
//! - **Methods** ([`methods`]): the closed catalog of authentication
//!   methods (guest, host, panelist, generic pin) and the registry mapping
//!   each request kind to the methods it offers.
//! - **Handler** ([`handler`]): the state machine owning the single active
//!   call, keypad entry, and the retry timer that infers an incorrect pin
//!   from silence.
//!
//! The transport and the UI are external collaborators, reached through
//! the [`sink`] seams injected at construction.
//!
//! ## Example
//!
//! ```ignore
//! use ciscoauth::{AuthHandler, Notification};
//!
//! #[tokio::main]
//! async fn main() -> ciscoauth::Result<()> {
//!     let handler = AuthHandler::builder()
//!         .command_sink(|cmd: &str| transport.send(cmd))
//!         .notification_sink(|n: Notification| panel.apply(n))
//!         .build()?;
//!
//!     handler.send_subscribe();
//!
//!     // Pump received transport data in; operator input drives the rest.
//!     handler.feed("*s Conference Call 7 AuthenticationRequest:HostPinOrGuestPin\r");
//!     handler.press_key('1')?;
//!     handler.submit()?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handler;
pub mod methods;
pub mod protocol;
pub mod sink;

pub use error::{AuthError, Result};
pub use handler::{AuthHandler, AuthHandlerBuilder, HandlerConfig};
pub use methods::{AuthMethod, PasswordRequirement};
pub use protocol::RequestKind;
pub use sink::{CommandSink, Notification, NotificationSink};
