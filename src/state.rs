/// Where a parser stands in the multipart stream.
///
/// Stages only move forward. Any stage can drop into [`State::Errored`];
/// [`State::Complete`] and [`State::Errored`] are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Looking for the first delimiter, discarding any preamble.
    AwaitingFirstDelimiter,
    /// Collecting the header block of the current part.
    InHeaders,
    /// Forwarding body bytes of the current part to its sink.
    InBody,
    /// The terminating boundary was seen. Epilogue bytes are ignored.
    Complete,
    /// A failure was reported; the parser is unusable.
    Errored,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Complete | State::Errored)
    }
}
