//! Classification of codec response lines.
//!
//! The codec's feedback lines are matched by prefix against a small set of
//! known shapes. Classification is shape-only: whether a ghost or status
//! line refers to the call currently awaiting authentication is the
//! handler's decision, not the parser's.
//!
//! Precedence matters because several shapes share prefixes: ghost lines
//! (`*s Call 7 (ghost=True)`) must be tried before generic status lines for
//! the same call, and conference ghost lines before authentication
//! requests. [`ResponseLine::classify`] checks shapes in that fixed order.

use serde::Serialize;

use crate::error::AuthError;

/// Literal error result line from a failed authentication response.
pub const RESPONSE_RESULT_ERROR: &str = "*r CallAuthenticationResponseResult (status=Error)";

/// Prefix shared by call-scoped status lines.
const CALL_PREFIX: &str = "*s Call ";

/// Prefix shared by conference-call-scoped lines.
const CONFERENCE_CALL_PREFIX: &str = "*s Conference Call ";

/// Marker suffix for calls that vanished without a terminal status.
const GHOST_MARKER: &str = "(ghost=True)";

/// One classified codec response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine<'a> {
    /// The call disappeared from status reporting without a terminal state.
    Ghost {
        /// Call the ghost line refers to.
        call_id: u32,
    },
    /// The codec rejected an authentication response outright.
    ResponseError,
    /// A call status update.
    CallStatus {
        /// Call the status refers to.
        call_id: u32,
        /// Status text, whitespace-trimmed (e.g. `Connected`, `Idle`).
        status: &'a str,
    },
    /// The call requires (or no longer requires) authentication.
    AuthenticationRequest {
        /// Call awaiting an authentication decision.
        call_id: u32,
        /// Raw request-kind token, whitespace-trimmed but not yet decoded.
        kind: &'a str,
    },
}

impl<'a> ResponseLine<'a> {
    /// Classify a delimiter-stripped line against the known shapes.
    ///
    /// Returns `None` for anything unrecognized; unmatched lines are
    /// ignored, never an error.
    pub fn classify(line: &'a str) -> Option<Self> {
        // Ghost shapes first: they are prefix-compatible with the status
        // and authentication-request shapes below.
        if let Some(call_id) = parse_ghost(line, CALL_PREFIX) {
            return Some(Self::Ghost { call_id });
        }
        if let Some(call_id) = parse_ghost(line, CONFERENCE_CALL_PREFIX) {
            return Some(Self::Ghost { call_id });
        }

        if line.starts_with(RESPONSE_RESULT_ERROR) {
            return Some(Self::ResponseError);
        }

        if let Some((call_id, status)) = parse_tagged(line, CALL_PREFIX, "Status:") {
            return Some(Self::CallStatus { call_id, status });
        }

        if let Some((call_id, kind)) =
            parse_tagged(line, CONFERENCE_CALL_PREFIX, "AuthenticationRequest:")
        {
            return Some(Self::AuthenticationRequest { call_id, kind });
        }

        None
    }
}

/// Match `<prefix><digits> (ghost=True)` and extract the call id.
fn parse_ghost(line: &str, prefix: &str) -> Option<u32> {
    let (call_id, rest) = parse_call_id(line.strip_prefix(prefix)?)?;
    rest.strip_prefix(' ')?
        .starts_with(GHOST_MARKER)
        .then_some(call_id)
}

/// Match `<prefix><digits> <tag><value>` and extract (call id, trimmed value).
fn parse_tagged<'a>(line: &'a str, prefix: &str, tag: &str) -> Option<(u32, &'a str)> {
    let (call_id, rest) = parse_call_id(line.strip_prefix(prefix)?)?;
    let value = rest.strip_prefix(' ')?.strip_prefix(tag)?;
    Some((call_id, value.trim()))
}

/// Split a leading decimal call id off the remainder of a line.
fn parse_call_id(rest: &str) -> Option<(u32, &str)> {
    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);

    let call_id = rest[..digits_end].parse().ok()?;
    Some((call_id, &rest[digits_end..]))
}

/// Authentication request kind announced by the codec.
///
/// Token comparison is case-insensitive; the codec's own casing is the
/// canonical spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestKind {
    /// No authentication required (also clears a pending request).
    None,
    /// Host pin, or join as guest without a pin.
    HostPinOrGuest,
    /// Host pin or guest pin.
    HostPinOrGuestPin,
    /// A single pin field accepting either role's pin.
    AnyHostPinOrGuestPin,
    /// Webinar panelist pin.
    PanelistPin,
    /// Webinar panelist pin or attendee pin.
    PanelistPinOrAttendeePin,
    /// Guest pin only.
    GuestPin,
}

impl RequestKind {
    /// Decode a request-kind token from an authentication request line.
    pub fn parse(token: &str) -> Result<Self, AuthError> {
        const TABLE: [(&str, RequestKind); 7] = [
            ("None", RequestKind::None),
            ("HostPinOrGuest", RequestKind::HostPinOrGuest),
            ("HostPinOrGuestPin", RequestKind::HostPinOrGuestPin),
            ("AnyHostPinOrGuestPin", RequestKind::AnyHostPinOrGuestPin),
            ("PanelistPin", RequestKind::PanelistPin),
            ("PanelistPinOrAttendeePin", RequestKind::PanelistPinOrAttendeePin),
            ("GuestPin", RequestKind::GuestPin),
        ];

        TABLE
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
            .map(|&(_, kind)| kind)
            .ok_or_else(|| AuthError::UnknownRequestKind(token.to_string()))
    }
}
