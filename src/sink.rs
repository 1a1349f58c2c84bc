//! Collaborator seams for outbound traffic.
//!
//! The handler never talks to a transport or a UI directly. It is wired at
//! construction time with two fire-and-forget sinks:
//!
//! - [`CommandSink`] - receives complete, CR-terminated command strings to
//!   send to the codec verbatim.
//! - [`NotificationSink`] - receives [`Notification`] values describing the
//!   UI-facing session state (keypad text, enable flags, option list).
//!
//! Both traits have blanket implementations for closures, so tests and small
//! hosts can wire a channel or a `Vec` without a named type:
//!
//! ```ignore
//! let handler = AuthHandler::builder()
//!     .command_sink(|cmd: &str| tx.send(cmd.to_string()).unwrap())
//!     .notification_sink(|n: Notification| println!("{:?}", n))
//!     .build()?;
//! ```
//!
//! Sinks are called synchronously, sometimes while the handler holds its
//! session lock. They must return quickly and must not call back into the
//! handler.

use serde::Serialize;

/// Receives outbound command strings for the codec.
///
/// Commands arrive complete and CR-terminated; the sink sends them verbatim.
pub trait CommandSink: Send + Sync {
    /// Send a command string to the codec.
    fn send(&self, command: &str);
}

impl<F> CommandSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn send(&self, command: &str) {
        self(command)
    }
}

/// Receives UI-facing state notifications.
///
/// Notifications are fire-and-forget; no acknowledgment is expected.
pub trait NotificationSink: Send + Sync {
    /// Deliver a single notification.
    fn notify(&self, notification: Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// A single UI-facing state signal.
///
/// Mirrors the signal set a conferencing touch panel needs to render the
/// authentication dialog: a required flag, keypad display state, enablement
/// flags, and the method option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notification {
    /// The active call requires (or no longer requires) authentication.
    AuthenticationRequired(bool),
    /// Text to show in the keypad display (pin digits, a prompt, or empty).
    KeypadText(String),
    /// Whether the keypad buffer holds any characters.
    ///
    /// Drives backspace/clear button enablement on the UI.
    KeypadHasValue(bool),
    /// Whether keypad input should be accepted.
    KeypadEnabled(bool),
    /// Whether the submit/join action should be accepted.
    SubmitEnabled(bool),
    /// Whether the method option list should be shown (more than one option).
    OptionListVisible(bool),
    /// Number of offered method options.
    OptionCount(usize),
    /// Display name for one option slot, 0-based.
    OptionName {
        /// 0-based option index.
        index: usize,
        /// Display name for the option.
        name: &'static str,
    },
    /// Currently selected option, 0-based.
    OptionSelected(usize),
}

/// No-op command sink, used when no transport is wired (testing mode).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCommandSink;

impl CommandSink for NullCommandSink {
    fn send(&self, _command: &str) {}
}

/// No-op notification sink, used when no UI is wired (testing mode).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotificationSink;

impl NotificationSink for NullNotificationSink {
    fn notify(&self, _notification: Notification) {}
}
