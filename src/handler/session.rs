//! Session state for the authentication handler.
//!
//! A single mutable [`Session`] tracks the one call (at most) that is
//! awaiting authentication, the methods offered for it, and the keypad
//! entry in progress. All access goes through the handler's session lock.

use tokio::task::JoinHandle;

use crate::methods::{AuthMethod, PasswordRequirement};

/// Mutable per-cycle authentication state.
///
/// Created empty, populated when the codec announces an authentication
/// request, and reset to empty when the call ends, the request kind
/// becomes `None`, or an error response arrives.
pub(crate) struct Session {
    /// Call awaiting authentication; `None` when idle.
    pub active_call_id: Option<u32>,
    /// Methods offered for the active call, in presentation order.
    pub offered: Vec<AuthMethod>,
    /// Index into `offered`; always `Some` while `offered` is non-empty.
    pub selected: Option<usize>,
    /// Pin text composed so far (digits, '*', '#').
    pub keypad: String,
    /// True between command submission and resolution.
    pub checking: bool,
    /// Monotonic guard against stale retry-timer firings.
    pub timer_epoch: u64,
    /// Armed retry timer, if any. Set and cleared together with `checking`.
    pub timer: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            active_call_id: None,
            offered: Vec::new(),
            selected: None,
            keypad: String::new(),
            checking: false,
            timer_epoch: 0,
            timer: None,
        }
    }

    /// The currently selected method, if any.
    pub fn selected_method(&self) -> Option<AuthMethod> {
        self.selected.and_then(|index| self.offered.get(index).copied())
    }

    /// Keypad input is useful only for a selected method that takes a pin.
    pub fn keypad_enabled(&self) -> bool {
        !self.checking
            && self
                .selected_method()
                .is_some_and(|m| m.password_requirement() != PasswordRequirement::NotRequired)
    }

    /// Submission is valid unless the selected method demands a pin the
    /// operator has not entered yet.
    pub fn submit_enabled(&self) -> bool {
        !self.checking
            && self.selected_method().is_some_and(|m| {
                m.password_requirement() != PasswordRequirement::Required
                    || !self.keypad.is_empty()
            })
    }

    /// Cancel any armed retry timer and invalidate in-flight firings.
    pub fn disarm_timer(&mut self) {
        self.timer_epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new();

        assert!(session.active_call_id.is_none());
        assert!(session.offered.is_empty());
        assert!(session.selected_method().is_none());
        assert!(!session.checking);
        assert!(!session.keypad_enabled());
        assert!(!session.submit_enabled());
    }

    #[test]
    fn test_enablement_for_required_method() {
        let mut session = Session::new();
        session.offered = vec![AuthMethod::HostPin];
        session.selected = Some(0);

        // Pin missing: keypad yes, submit no.
        assert!(session.keypad_enabled());
        assert!(!session.submit_enabled());

        session.keypad.push('1');
        assert!(session.submit_enabled());
    }

    #[test]
    fn test_enablement_for_no_pin_method() {
        let mut session = Session::new();
        session.offered = vec![AuthMethod::GuestNoPin];
        session.selected = Some(0);

        assert!(!session.keypad_enabled());
        assert!(session.submit_enabled());
    }

    #[test]
    fn test_checking_disables_everything() {
        let mut session = Session::new();
        session.offered = vec![AuthMethod::HostPin];
        session.selected = Some(0);
        session.keypad.push_str("1234");
        session.checking = true;

        assert!(!session.keypad_enabled());
        assert!(!session.submit_enabled());
    }

    #[test]
    fn test_selected_method_bounds() {
        let mut session = Session::new();
        session.offered = vec![AuthMethod::HostPin, AuthMethod::GuestPin];

        session.selected = Some(1);
        assert_eq!(session.selected_method(), Some(AuthMethod::GuestPin));

        session.selected = Some(5);
        assert_eq!(session.selected_method(), None);
    }
}
