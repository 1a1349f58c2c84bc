//! Authentication methods and the request-kind registry.
//!
//! Each [`AuthMethod`] is one scheme for satisfying an authentication
//! request: a display name, an operator prompt, a pin requirement tier, and
//! a command-construction rule. Methods are stateless; the closed variant
//! set replaces the per-scheme singletons a codec driver would otherwise
//! carry.
//!
//! [`methods_for`] maps a [`RequestKind`] to the methods it offers. Order
//! is presentation order, and the first entry is the default selection.

use serde::Serialize;

use crate::error::{AuthError, Result};
use crate::protocol::RequestKind;

/// Whether a method needs a pin before it can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PasswordRequirement {
    /// Submitting without a pin is the normal path.
    NotRequired,
    /// A pin may be supplied but is not necessary.
    Optional,
    /// Submission without a pin is invalid.
    Required,
}

/// One authentication scheme offered to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthMethod {
    /// Join as guest, no pin.
    GuestNoPin,
    /// Guest role with a pin.
    GuestPin,
    /// Host role with a pin.
    HostPin,
    /// Webinar panelist role with a pin.
    PanelistPin,
    /// Pin without a participant role (codec resolves the role itself).
    AnyPinNoRole,
}

impl AuthMethod {
    /// Pin requirement tier for this method.
    pub fn password_requirement(self) -> PasswordRequirement {
        match self {
            Self::GuestNoPin => PasswordRequirement::NotRequired,
            Self::GuestPin | Self::HostPin | Self::PanelistPin | Self::AnyPinNoRole => {
                PasswordRequirement::Required
            }
        }
    }

    /// Name shown on the method's option button.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GuestNoPin | Self::GuestPin => "Guest",
            Self::HostPin => "Host",
            Self::PanelistPin => "Panelist",
            Self::AnyPinNoRole => "Pin",
        }
    }

    /// Prompt shown in the keypad display while this method is selected.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::GuestNoPin => "No Pin Needed for Guest",
            Self::GuestPin => "Enter Guest Pin",
            Self::HostPin => "Enter Host Pin",
            Self::PanelistPin => "Enter Panelist Pin",
            Self::AnyPinNoRole => "Enter Pin",
        }
    }

    /// Participant role token embedded in the response command, if any.
    fn role(self) -> Option<&'static str> {
        match self {
            Self::GuestNoPin | Self::GuestPin => Some("Guest"),
            Self::HostPin => Some("Host"),
            Self::PanelistPin => Some("Panelist"),
            Self::AnyPinNoRole => None,
        }
    }

    /// Build the authentication response command for this method.
    ///
    /// An empty pin counts as absent. [`AuthMethod::GuestNoPin`] never
    /// embeds a pin, even if one is supplied; pin-requiring methods fail
    /// with [`AuthError::PinRequired`] when the pin is missing.
    pub fn build_command(self, call_id: u32, pin: Option<&str>) -> Result<String> {
        let pin = pin.filter(|p| !p.is_empty());

        let pin = match (self.password_requirement(), self) {
            (_, Self::GuestNoPin) => None,
            (PasswordRequirement::Required, _) if pin.is_none() => {
                return Err(AuthError::PinRequired(self.display_name()));
            }
            _ => pin,
        };

        let mut command = format!(
            "xCommand Conference Call AuthenticationResponse CallId: {}",
            call_id
        );

        if let Some(role) = self.role() {
            command.push_str(&format!(" ParticipantRole: {}", role));
        }

        if let Some(pin) = pin {
            // The codec expects the pin entry terminated with '#'.
            command.push_str(&format!(" Pin: {}", pin));
            if !pin.ends_with('#') {
                command.push('#');
            }
        }

        Ok(command)
    }
}

/// Methods offered for a request kind, in presentation order.
///
/// The first entry is the default selection. [`RequestKind::None`] offers
/// nothing.
pub fn methods_for(kind: RequestKind) -> &'static [AuthMethod] {
    match kind {
        RequestKind::None => &[],
        RequestKind::HostPinOrGuest => &[AuthMethod::HostPin, AuthMethod::GuestNoPin],
        RequestKind::HostPinOrGuestPin => &[AuthMethod::HostPin, AuthMethod::GuestPin],
        RequestKind::AnyHostPinOrGuestPin => &[AuthMethod::AnyPinNoRole],
        RequestKind::PanelistPin => &[AuthMethod::PanelistPin],
        RequestKind::PanelistPinOrAttendeePin => {
            &[AuthMethod::PanelistPin, AuthMethod::GuestPin]
        }
        RequestKind::GuestPin => &[AuthMethod::GuestPin],
    }
}
