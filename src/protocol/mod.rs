//! Protocol layer - line framing and response classification.
//!
//! The codec speaks a line-oriented text protocol; lines are terminated by
//! a carriage return. [`DelimiterBuffer`] turns the fragmented byte stream
//! into discrete lines, and [`ResponseLine`] classifies each line against
//! the known response shapes.

mod line_buffer;
mod response;

pub use line_buffer::{DelimiterBuffer, LineSink};
pub use response::{RequestKind, ResponseLine, RESPONSE_RESULT_ERROR};

/// Line delimiter used by the codec protocol (carriage return).
pub const DELIMITER: char = '\r';

/// Feedback registration command, sent once after the transport connects.
pub const SUBSCRIBE_COMMAND: &str =
    "xFeedback Register Status/Conference/Call/AuthenticationRequest";
