//! Integration tests for ciscoauth.
//!
//! These exercise the full path through the public API: fragmented
//! transport input through the framing buffer, line classification, the
//! authentication cycle, and outbound command emission.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ciscoauth::handler::{PROMPT_PIN_INCORRECT, PROMPT_SUBMITTING};
use ciscoauth::{AuthHandler, AuthMethod, Notification};

/// Captures everything the handler emits to its collaborators.
#[derive(Default)]
struct Harness {
    commands: Mutex<Vec<String>>,
    notifications: Mutex<Vec<Notification>>,
}

impl Harness {
    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn last_keypad_text(&self) -> Option<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|n| match n {
                Notification::KeypadText(text) => Some(text.clone()),
                _ => None,
            })
    }

    fn last_authentication_required(&self) -> Option<bool> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|n| match n {
                Notification::AuthenticationRequired(v) => Some(*v),
                _ => None,
            })
    }
}

fn build_handler(timeout: Duration) -> (AuthHandler, Arc<Harness>) {
    let harness = Arc::new(Harness::default());
    let commands = harness.clone();
    let notifications = harness.clone();

    let handler = AuthHandler::builder()
        .command_sink(move |cmd: &str| {
            commands.commands.lock().unwrap().push(cmd.to_string());
        })
        .notification_sink(move |n: Notification| {
            notifications.notifications.lock().unwrap().push(n);
        })
        .incorrect_pin_timeout(timeout)
        .build()
        .expect("built inside tokio runtime");

    (handler, harness)
}

/// Full cycle: subscribe, request, pin entry, submission, inferred
/// rejection, retry, and call end.
#[tokio::test]
async fn test_full_authentication_cycle() {
    let (handler, harness) = build_handler(Duration::from_millis(20));

    handler.send_subscribe();
    assert_eq!(
        harness.commands(),
        ["xFeedback Register Status/Conference/Call/AuthenticationRequest\r"]
    );

    // The request arrives fragmented, mixed with unrelated feedback lines.
    handler.feed("*s Audio Volume: 70\r*s Conference Call 7 Authenticatio");
    handler.feed("nRequest:HostPinOrGuestPin\r");

    assert_eq!(handler.active_call_id(), Some(7));
    assert_eq!(
        handler.offered_methods(),
        [AuthMethod::HostPin, AuthMethod::GuestPin]
    );
    assert_eq!(handler.selected_method(), Some(AuthMethod::HostPin));
    assert_eq!(harness.last_authentication_required(), Some(true));

    // Operator keys in a pin and submits.
    for key in ['1', '2', '3', '4'] {
        handler.press_key(key).unwrap();
    }
    handler.submit().unwrap();

    assert!(handler.is_checking());
    assert_eq!(harness.last_keypad_text().as_deref(), Some(PROMPT_SUBMITTING));
    assert_eq!(
        harness.commands()[1],
        "xCommand Conference Call AuthenticationResponse CallId: 7 \
         ParticipantRole: Host Pin: 1234#\r"
    );

    // No resolving line arrives: the pin is inferred incorrect.
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(!handler.is_checking());
    assert_eq!(
        harness.last_keypad_text().as_deref(),
        Some(PROMPT_PIN_INCORRECT)
    );
    assert_eq!(handler.selected_method(), Some(AuthMethod::HostPin));

    // Retry with the correct pin; the codec accepts and the call clears.
    for key in ['5', '6', '7', '8'] {
        handler.press_key(key).unwrap();
    }
    handler.submit().unwrap();
    handler.feed("*s Conference Call 7 AuthenticationRequest:None\r");

    assert!(!handler.is_checking());
    assert_eq!(handler.active_call_id(), None);
    assert_eq!(harness.last_authentication_required(), Some(false));
}

/// Switching to the pinless guest option submits without a pin field.
#[tokio::test]
async fn test_guest_join_without_pin() {
    let (handler, harness) = build_handler(Duration::from_secs(6));

    handler.feed("*s Conference Call 3 AuthenticationRequest:HostPinOrGuest\r");
    assert_eq!(
        handler.offered_methods(),
        [AuthMethod::HostPin, AuthMethod::GuestNoPin]
    );

    handler.select_method(1);
    assert_eq!(harness.last_keypad_text().as_deref(), Some("No Pin Needed for Guest"));

    handler.submit().unwrap();

    assert_eq!(
        harness.commands(),
        ["xCommand Conference Call AuthenticationResponse CallId: 3 \
          ParticipantRole: Guest\r"]
    );
}

/// The submission resolves by the call ending rather than a new request.
#[tokio::test]
async fn test_call_end_during_checking() {
    let (handler, harness) = build_handler(Duration::from_millis(50));

    handler.feed("*s Conference Call 5 AuthenticationRequest:AnyHostPinOrGuestPin\r");
    assert_eq!(handler.offered_methods(), [AuthMethod::AnyPinNoRole]);

    handler.press_key('4').unwrap();
    handler.press_key('2').unwrap();
    handler.submit().unwrap();
    assert!(handler.is_checking());

    handler.feed("*s Call 5 Status:Disconnecting\r");

    assert!(!handler.is_checking());
    assert_eq!(handler.active_call_id(), None);
    assert_eq!(harness.last_authentication_required(), Some(false));

    // The disarmed timer never fires the incorrect-pin prompt.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_ne!(
        harness.last_keypad_text().as_deref(),
        Some(PROMPT_PIN_INCORRECT)
    );
}

/// Chunking of the input stream does not change the emitted behavior.
#[tokio::test]
async fn test_framing_is_chunking_independent() {
    let stream =
        "*s Conference Call 11 AuthenticationRequest:PanelistPin\r*s Call 11 Status:Idle\r";

    for chunk_size in [1, 3, 7, stream.len()] {
        let (handler, harness) = build_handler(Duration::from_secs(6));

        let chars: Vec<char> = stream.chars().collect();
        for chunk in chars.chunks(chunk_size) {
            handler.feed(&chunk.iter().collect::<String>());
        }

        // Offer then immediate end: idle, with the required flag lowered.
        assert_eq!(handler.active_call_id(), None);
        assert!(handler.offered_methods().is_empty());
        assert_eq!(harness.last_authentication_required(), Some(false));
    }
}
