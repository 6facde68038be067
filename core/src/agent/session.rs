use crate::traits::ChatMessage;

/// The literal input that ends an interactive session.
pub const EXIT_COMMAND: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Processing,
    Terminated,
}

/// What the driver should do with a line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Send this message to the backend.
    Submit(String),
    /// Nothing to do (blank input, or input while not awaiting).
    Ignored,
    /// The sentinel was entered; the session is over.
    Terminated,
}

/// Interactive chat session as an explicit state machine. The history is
/// append-only; every accepted input pushes a user turn and every recorded
/// reply pushes an assistant turn.
pub struct ChatSession {
    history: Vec<ChatMessage>,
    state: SessionState,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            state: SessionState::AwaitingInput,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Feeds one line of user input through the state machine.
    pub fn accept_input(&mut self, line: &str) -> SessionEvent {
        if self.state != SessionState::AwaitingInput {
            return SessionEvent::Ignored;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return SessionEvent::Ignored;
        }

        if trimmed == EXIT_COMMAND {
            self.state = SessionState::Terminated;
            return SessionEvent::Terminated;
        }

        self.history.push(ChatMessage::user(trimmed));
        self.state = SessionState::Processing;
        SessionEvent::Submit(trimmed.to_string())
    }

    /// Records the assistant's reply for the in-flight turn.
    pub fn record_reply(&mut self, reply: impl Into<String>) {
        if self.state != SessionState::Processing {
            return;
        }
        self.history.push(ChatMessage::assistant(reply.into()));
        self.state = SessionState::AwaitingInput;
    }

    /// Abandons the in-flight turn after a backend failure. The user turn
    /// stays in the history; the session returns to awaiting input.
    pub fn record_failure(&mut self) {
        if self.state == SessionState::Processing {
            self.state = SessionState::AwaitingInput;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_awaiting_input() {
        let session = ChatSession::new();
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert!(session.history().is_empty());
    }

    #[test]
    fn exit_sentinel_terminates() {
        let mut session = ChatSession::new();
        assert_eq!(session.accept_input("exit"), SessionEvent::Terminated);
        assert!(session.is_terminated());
        assert!(session.history().is_empty());
    }

    #[test]
    fn exit_with_surrounding_whitespace_terminates() {
        let mut session = ChatSession::new();
        assert_eq!(session.accept_input("  exit  "), SessionEvent::Terminated);
        assert!(session.is_terminated());
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut session = ChatSession::new();
        assert_eq!(session.accept_input("   "), SessionEvent::Ignored);
        assert_eq!(session.state(), SessionState::AwaitingInput);
    }

    #[test]
    fn input_moves_to_processing_and_reply_returns() {
        let mut session = ChatSession::new();
        assert_eq!(
            session.accept_input("hello"),
            SessionEvent::Submit("hello".into())
        );
        assert_eq!(session.state(), SessionState::Processing);

        session.record_reply("hi there");
        assert_eq!(session.state(), SessionState::AwaitingInput);

        let roles: Vec<&str> = session.history().iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant"]);
    }

    #[test]
    fn history_is_append_only_and_ordered() {
        let mut session = ChatSession::new();
        for (q, a) in [("one", "1"), ("two", "2")] {
            session.accept_input(q);
            session.record_reply(a);
        }

        let contents: Vec<&str> = session
            .history()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "1", "two", "2"]);
    }

    #[test]
    fn input_while_processing_is_ignored() {
        let mut session = ChatSession::new();
        session.accept_input("hello");
        assert_eq!(session.accept_input("impatient"), SessionEvent::Ignored);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn input_after_termination_is_ignored() {
        let mut session = ChatSession::new();
        session.accept_input("exit");
        assert_eq!(session.accept_input("hello?"), SessionEvent::Ignored);
        assert!(session.is_terminated());
    }

    #[test]
    fn failure_returns_to_awaiting_without_reply() {
        let mut session = ChatSession::new();
        session.accept_input("hello");
        session.record_failure();
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.history().len(), 1);
    }
}
