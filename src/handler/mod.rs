//! Authentication handler - the protocol-driven state machine.
//!
//! [`AuthHandler`] owns the framing buffer, classifies each completed line,
//! and walks one call at a time through the authentication cycle:
//!
//! ```text
//! Idle ──auth request──► Offered ──submit──► Checking
//!   ▲                       ▲                   │
//!   │                       └──retry timeout────┘
//!   └──call end / None / error──────────────────┘
//! ```
//!
//! The codec never confirms a wrong pin explicitly. Wrongness is inferred:
//! a retry timer is armed on submission, and if no resolving line arrives
//! before it fires, the handler clears the checking flag and prompts the
//! operator to try again. The timeout is configurable so an explicit
//! rejection line can be adopted later without restructuring the machine.
//!
//! # Example
//!
//! ```ignore
//! use ciscoauth::{AuthHandler, Notification};
//!
//! let handler = AuthHandler::builder()
//!     .command_sink(|cmd: &str| transport.send(cmd))
//!     .notification_sink(|n: Notification| ui.apply(n))
//!     .build()?;
//!
//! handler.send_subscribe();
//! handler.feed(&bytes_from_codec);   // fragments, any chunking
//! handler.press_key('1')?;
//! handler.submit()?;
//! ```

mod session;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{AuthError, Result};
use crate::methods::{methods_for, AuthMethod, PasswordRequirement};
use crate::protocol::{
    DelimiterBuffer, LineSink, RequestKind, ResponseLine, DELIMITER, SUBSCRIBE_COMMAND,
};
use crate::sink::{
    CommandSink, Notification, NotificationSink, NullCommandSink, NullNotificationSink,
};

use session::Session;

/// Default wait after submission before assuming the pin was incorrect.
pub const DEFAULT_INCORRECT_PIN_TIMEOUT: Duration = Duration::from_secs(6);

/// Keypad display text while a submission is being checked.
pub const PROMPT_SUBMITTING: &str = "Submitting Pin";

/// Keypad display text after an inferred incorrect pin.
pub const PROMPT_PIN_INCORRECT: &str = "Pin Incorrect, Please Try Again";

/// Terminal call statuses that end a pending authentication.
const ENDED_STATUSES: [&str; 2] = ["Disconnecting", "Idle"];

/// Configuration for an [`AuthHandler`].
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// How long to wait after submission before inferring an incorrect pin.
    pub incorrect_pin_timeout: Duration,
    /// Whether the framing buffer passes zero-length lines through.
    pub pass_empty_lines: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            incorrect_pin_timeout: DEFAULT_INCORRECT_PIN_TIMEOUT,
            pass_empty_lines: false,
        }
    }
}

/// Builder for configuring and creating an [`AuthHandler`].
///
/// Both sinks default to no-ops, so a handler can be built without a live
/// transport or UI (testing mode).
pub struct AuthHandlerBuilder {
    config: HandlerConfig,
    commands: Arc<dyn CommandSink>,
    ui: Arc<dyn NotificationSink>,
}

impl AuthHandlerBuilder {
    /// Create a builder with default configuration and no-op sinks.
    pub fn new() -> Self {
        Self {
            config: HandlerConfig::default(),
            commands: Arc::new(NullCommandSink),
            ui: Arc::new(NullNotificationSink),
        }
    }

    /// Set the sink that receives outbound codec commands.
    pub fn command_sink(mut self, sink: impl CommandSink + 'static) -> Self {
        self.commands = Arc::new(sink);
        self
    }

    /// Set the sink that receives UI-facing notifications.
    pub fn notification_sink(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.ui = Arc::new(sink);
        self
    }

    /// Set the incorrect-pin inference timeout.
    ///
    /// Default: 6 seconds.
    pub fn incorrect_pin_timeout(mut self, timeout: Duration) -> Self {
        self.config.incorrect_pin_timeout = timeout;
        self
    }

    /// Pass zero-length lines from the framing buffer through to
    /// classification. Default: suppressed.
    pub fn pass_empty_lines(mut self, pass: bool) -> Self {
        self.config.pass_empty_lines = pass;
        self
    }

    /// Build the handler.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoRuntime`] when called outside a Tokio
    /// runtime; the retry timer needs one to run on.
    pub fn build(self) -> Result<AuthHandler> {
        let runtime = Handle::try_current().map_err(|_| AuthError::NoRuntime)?;
        let pass_empty = self.config.pass_empty_lines;

        let core = Arc::new(Core {
            config: self.config,
            commands: self.commands,
            ui: self.ui,
            runtime,
            session: Mutex::new(Session::new()),
        });

        let sink: Arc<dyn LineSink> = core.clone();
        let buffer = DelimiterBuffer::with_options(DELIMITER, pass_empty, sink);

        Ok(AuthHandler { core, buffer })
    }
}

impl Default for AuthHandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mediates the authentication handshake between an operator and a codec.
///
/// Feed raw transport text in with [`feed`](Self::feed); operator actions
/// go through the keypad and selection methods. Outbound commands and UI
/// state flow out through the sinks wired at construction.
///
/// Line classification runs synchronously on the thread calling `feed`.
/// The retry timer is the one asynchronous entry point; it serializes
/// against everything else through the internal session lock.
pub struct AuthHandler {
    core: Arc<Core>,
    buffer: DelimiterBuffer,
}

impl AuthHandler {
    /// Create a new handler builder.
    pub fn builder() -> AuthHandlerBuilder {
        AuthHandlerBuilder::new()
    }

    /// Feed raw text received from the codec.
    ///
    /// Fragments may split or coalesce lines arbitrarily; completed lines
    /// are classified in arrival order before this call returns (unless a
    /// drain on another thread is already running and picks them up).
    pub fn feed(&self, fragment: &str) {
        self.buffer.enqueue(fragment);
    }

    /// Discard any buffered, not-yet-classified input.
    ///
    /// Call on transport disconnect so a stale partial line cannot be
    /// glued to data from a new connection. Blocks until an in-flight
    /// drain stops.
    pub fn clear_buffer(&self) {
        self.buffer.clear();
    }

    /// Send the feedback registration command to the codec.
    ///
    /// Call once after the transport connects; without it the codec never
    /// reports authentication requests.
    pub fn send_subscribe(&self) {
        self.core.send_command(SUBSCRIBE_COMMAND);
    }

    /// Append a key to the keypad buffer.
    ///
    /// Accepts digits, `'*'` and `'#'`. Rejected with
    /// [`AuthError::SubmissionPending`] while a submission is being
    /// checked.
    pub fn press_key(&self, key: char) -> Result<()> {
        if !matches!(key, '0'..='9' | '*' | '#') {
            return Err(AuthError::InvalidKey(key));
        }

        let mut session = self.core.session();
        if session.checking {
            return Err(AuthError::SubmissionPending);
        }

        session.keypad.push(key);
        self.core.update_keypad_text(&mut session);
        Ok(())
    }

    /// Append a key by 0-based keypad index: `0..=9` are the digits,
    /// `10` is `'*'`, `11` is `'#'`.
    pub fn press_key_index(&self, index: usize) -> Result<()> {
        let key = match index {
            0..=9 => (b'0' + index as u8) as char,
            10 => '*',
            11 => '#',
            _ => return Err(AuthError::InvalidKeyIndex(index)),
        };
        self.press_key(key)
    }

    /// Remove the most recent keypad character; no-op when empty.
    pub fn backspace(&self) {
        let mut session = self.core.session();
        if session.keypad.pop().is_some() {
            self.core.update_keypad_text(&mut session);
        }
    }

    /// Empty the keypad buffer.
    pub fn clear_keypad(&self) {
        let mut session = self.core.session();
        self.core.clear_keypad(&mut session);
    }

    /// Select an offered method by 0-based index; out of range is a no-op.
    pub fn select_method(&self, index: usize) {
        let mut session = self.core.session();
        self.core.select_method(&mut session, index);
    }

    /// Submit the current keypad text for the selected method.
    ///
    /// No-op when nothing is selected or a submission is already being
    /// checked. Builds the response command, sends it, enters the checking
    /// state, and arms the retry timer.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PinRequired`] when the selected method demands
    /// a pin and the keypad is empty; session state is left untouched.
    pub fn submit(&self) -> Result<()> {
        Core::submit(&self.core)
    }

    /// Call currently awaiting authentication, if any.
    pub fn active_call_id(&self) -> Option<u32> {
        self.core.session().active_call_id
    }

    /// Whether a submission is awaiting resolution.
    pub fn is_checking(&self) -> bool {
        self.core.session().checking
    }

    /// Methods currently offered, in presentation order.
    pub fn offered_methods(&self) -> Vec<AuthMethod> {
        self.core.session().offered.clone()
    }

    /// The currently selected method, if any.
    pub fn selected_method(&self) -> Option<AuthMethod> {
        self.core.session().selected_method()
    }

    /// Current keypad buffer contents.
    pub fn keypad_text(&self) -> String {
        self.core.session().keypad.clone()
    }
}

impl Drop for AuthHandler {
    fn drop(&mut self) {
        self.core.session().disarm_timer();
    }
}

/// Shared handler core: configuration, sinks, and the session lock.
///
/// Referenced by the [`AuthHandler`] facade, by the framing buffer (as its
/// line sink), and by any armed retry-timer task.
struct Core {
    config: HandlerConfig,
    commands: Arc<dyn CommandSink>,
    ui: Arc<dyn NotificationSink>,
    runtime: Handle,
    session: Mutex<Session>,
}

impl LineSink for Core {
    fn on_line(&self, line: &str) {
        self.handle_line(line.trim());
    }
}

impl Core {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Classify one completed line and apply its transition.
    ///
    /// Total over its input: unmatched or malformed lines are ignored,
    /// never an error.
    fn handle_line(&self, line: &str) {
        let Some(response) = ResponseLine::classify(line) else {
            return;
        };

        let mut session = self.session();
        match response {
            ResponseLine::Ghost { call_id } if Some(call_id) == session.active_call_id => {
                // Some calls end by vanishing from status reporting
                // without a terminal status update.
                tracing::debug!(call_id, "active call reported as ghost");
                self.call_ended(&mut session);
            }
            ResponseLine::ResponseError => {
                // An error result means the attempt cannot proceed; treat
                // it like the call ending.
                tracing::debug!("authentication response rejected by codec");
                self.call_ended(&mut session);
            }
            ResponseLine::CallStatus { call_id, status }
                if Some(call_id) == session.active_call_id
                    && ENDED_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(status)) =>
            {
                tracing::debug!(call_id, status, "active call ended");
                self.call_ended(&mut session);
            }
            ResponseLine::AuthenticationRequest { call_id, kind } => {
                self.handle_authentication_request(&mut session, call_id, kind);
            }
            _ => {}
        }
    }

    fn handle_authentication_request(&self, session: &mut Session, call_id: u32, token: &str) {
        let kind = match RequestKind::parse(token) {
            Ok(kind) => kind,
            Err(error) => {
                // Unknown token: log and drop the line, no transition.
                tracing::error!(%error, call_id, "dropping authentication request line");
                return;
            }
        };

        session.checking = false;

        if kind == RequestKind::None {
            self.call_ended(session);
            return;
        }

        tracing::debug!(call_id, ?kind, "authentication required");
        session.disarm_timer();
        session.active_call_id = Some(call_id);
        self.offer_methods(session, methods_for(kind));
    }

    /// Present a fresh method list, replacing any previous offer.
    fn offer_methods(&self, session: &mut Session, methods: &'static [AuthMethod]) {
        session.selected = None;
        session.offered.clear();
        self.clear_keypad(session);

        if methods.is_empty() {
            self.call_ended(session);
            return;
        }

        session.offered.extend_from_slice(methods);

        for (index, method) in methods.iter().enumerate() {
            self.ui.notify(Notification::OptionName {
                index,
                name: method.display_name(),
            });
        }

        // First method is the default selection.
        self.select_method(session, 0);

        self.ui.notify(Notification::OptionCount(methods.len()));
        self.ui
            .notify(Notification::OptionListVisible(methods.len() > 1));
        self.ui.notify(Notification::AuthenticationRequired(true));
    }

    fn select_method(&self, session: &mut Session, index: usize) {
        if index >= session.offered.len() {
            return;
        }

        session.selected = Some(index);
        self.ui.notify(Notification::OptionSelected(index));

        let method = session.offered[index];

        // A method that takes no pin has no use for buffered digits; an
        // empty buffer gets re-cleared so the display shows the new prompt.
        if method.password_requirement() == PasswordRequirement::NotRequired
            || session.keypad.is_empty()
        {
            self.clear_keypad(session);
        } else {
            self.update_enable_states(session);
        }
    }

    fn submit(core: &Arc<Self>) -> Result<()> {
        let mut session = core.session();

        if session.checking {
            tracing::warn!("submit ignored: a submission is already being checked");
            return Ok(());
        }
        let Some(method) = session.selected_method() else {
            return Ok(());
        };
        let Some(call_id) = session.active_call_id else {
            return Ok(());
        };

        let pin = (!session.keypad.is_empty()).then(|| session.keypad.clone());

        // Build before mutating: a contract violation (required pin
        // missing) must not corrupt the session.
        let command = method.build_command(call_id, pin.as_deref())?;

        session.checking = true;
        core.clear_keypad_with_prompt(&mut session, PROMPT_SUBMITTING);
        core.send_command(&command);
        Self::arm_timer(core, &mut session);

        Ok(())
    }

    /// Arm the incorrect-pin inference timer.
    fn arm_timer(core: &Arc<Self>, session: &mut Session) {
        session.disarm_timer();
        let epoch = session.timer_epoch;
        let timeout = core.config.incorrect_pin_timeout;
        let this = Arc::clone(core);

        session.timer = Some(core.runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            this.on_retry_timeout(epoch);
        }));
    }

    /// Timer fired with no resolving line: infer an incorrect pin.
    ///
    /// The offer and selection are kept so the operator can retry without
    /// re-selecting a method.
    fn on_retry_timeout(&self, epoch: u64) {
        let mut session = self.session();

        // A resolving line may have disarmed the timer while this firing
        // was waiting on the lock.
        if session.timer_epoch != epoch || !session.checking {
            return;
        }

        tracing::debug!("no resolution within timeout, assuming incorrect pin");
        session.timer = None;
        session.checking = false;
        self.clear_keypad_with_prompt(&mut session, PROMPT_PIN_INCORRECT);
    }

    /// The active call ended (status, ghost, error, or request `None`).
    fn call_ended(&self, session: &mut Session) {
        session.disarm_timer();
        session.checking = false;
        self.clear_offer(session);
        session.active_call_id = None;
    }

    fn clear_offer(&self, session: &mut Session) {
        session.offered.clear();
        session.selected = None;
        session.checking = false;
        self.clear_keypad(session);
        self.ui.notify(Notification::AuthenticationRequired(false));
    }

    fn clear_keypad(&self, session: &mut Session) {
        session.keypad.clear();
        self.update_keypad_text(session);
    }

    fn clear_keypad_with_prompt(&self, session: &mut Session, prompt: &str) {
        session.keypad.clear();
        self.emit_keypad(session, prompt.to_string());
    }

    /// Best display text: keypad content, else the selected method's
    /// prompt, else empty.
    fn update_keypad_text(&self, session: &mut Session) {
        let text = if !session.keypad.is_empty() {
            session.keypad.clone()
        } else if let Some(method) = session.selected_method() {
            method.prompt().to_string()
        } else {
            String::new()
        };
        self.emit_keypad(session, text);
    }

    fn emit_keypad(&self, session: &mut Session, text: String) {
        self.ui.notify(Notification::KeypadText(text));
        self.ui
            .notify(Notification::KeypadHasValue(!session.keypad.is_empty()));
        self.update_enable_states(session);
    }

    /// Recompute keypad/submit enablement after any state change.
    fn update_enable_states(&self, session: &Session) {
        self.ui
            .notify(Notification::KeypadEnabled(session.keypad_enabled()));
        self.ui
            .notify(Notification::SubmitEnabled(session.submit_enabled()));
    }

    /// Emit a command, CR-terminated, to the transport sink.
    fn send_command(&self, command: &str) {
        tracing::debug!(command, "sending codec command");
        self.commands.send(&format!("{}{}", command, DELIMITER));
    }
}
