//! State machine behind the "add an album" panel.
//!
//! The panel is pure: events go in through [`AcquisitionPanel::dispatch`],
//! and the side effects the caller has to perform come back as
//! [`PanelCommand`]s. Every command that leads to a completion event carries a
//! [`RequestTicket`]; completions whose ticket is no longer the pending one
//! (closed panel, reopened panel, edited query) are dropped.

use kissa_common::SearchCandidate;
use tracing::debug;

/// Identifies one outstanding collaborator call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    session: u64,
    request: u64,
}

impl RequestTicket {
    pub fn session(&self) -> u64 {
        self.session
    }
}

/// Where an open panel is in its search/commit cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    #[default]
    Idle,
    Typing,
    Searching,
    Results,
    NoResults,
    Committing,
}

/// What the panel body shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMessage {
    /// Ask the user to type something
    Prompt,
    /// The submitted query matched nothing
    NoResults,
    /// The candidate list (possibly still loading)
    Results,
}

/// One opening of the panel
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSession {
    pub id: u64,
    pub query: String,
    pub phase: SearchPhase,
    pub results: Vec<SearchCandidate>,
    /// Set by submit, cleared by any edit of the query
    pub has_submitted: bool,
    /// Last failure reported to the user
    pub error_message: Option<String>,
    pending: Option<RequestTicket>,
}

impl SearchSession {
    fn new(id: u64) -> Self {
        Self {
            id,
            query: String::new(),
            phase: SearchPhase::Idle,
            results: Vec::new(),
            has_submitted: false,
            error_message: None,
            pending: None,
        }
    }

    pub fn is_searching(&self) -> bool {
        self.phase == SearchPhase::Searching
    }

    pub fn is_committing(&self) -> bool {
        self.phase == SearchPhase::Committing
    }

    pub fn message(&self) -> PanelMessage {
        let searching = self.is_searching();
        if !self.has_submitted && self.results.is_empty() && !searching {
            PanelMessage::Prompt
        } else if self.has_submitted && self.results.is_empty() && !searching {
            PanelMessage::NoResults
        } else {
            PanelMessage::Results
        }
    }

    fn is_pending(&self, ticket: RequestTicket) -> bool {
        self.pending == Some(ticket)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open(SearchSession),
}

/// Inputs to the panel: user actions and collaborator completions
#[derive(Debug, Clone)]
pub enum PanelEvent {
    Open,
    EditQuery(String),
    Submit,
    /// `Err` carries the message to show the user
    SearchComplete {
        ticket: RequestTicket,
        result: Result<Vec<SearchCandidate>, String>,
    },
    SelectCandidate(u64),
    CommitComplete {
        ticket: RequestTicket,
        result: Result<(), String>,
    },
    /// The library refresh that follows a commit has finished
    LibraryRefreshed { ticket: RequestTicket },
    Close,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    Search {
        ticket: RequestTicket,
        query: String,
    },
    Commit {
        ticket: RequestTicket,
        catalog_id: u64,
    },
    /// A commit reached the server; reload the library
    RefreshLibrary { ticket: RequestTicket },
}

/// Issues session ids and request tickets
#[derive(Debug, Default)]
struct TicketCounter {
    last_session: u64,
    last_request: u64,
}

impl TicketCounter {
    fn next_session(&mut self) -> u64 {
        self.last_session += 1;
        self.last_session
    }

    fn next_ticket(&mut self, session: u64) -> RequestTicket {
        self.last_request += 1;
        RequestTicket {
            session,
            request: self.last_request,
        }
    }
}

impl PanelState {
    fn transition(
        self,
        event: PanelEvent,
        tickets: &mut TicketCounter,
    ) -> (PanelState, Option<PanelCommand>) {
        match (self, event) {
            (_, PanelEvent::Open) => {
                let session = SearchSession::new(tickets.next_session());
                (PanelState::Open(session), None)
            }
            (_, PanelEvent::Close) => (PanelState::Closed, None),
            // A commit that landed still changed the server, even if nobody
            // is waiting for it any more.
            (state, PanelEvent::CommitComplete { ticket, result: Ok(()) }) => match state {
                PanelState::Open(mut s) if s.is_pending(ticket) => {
                    s.error_message = None;
                    (
                        PanelState::Open(s),
                        Some(PanelCommand::RefreshLibrary { ticket }),
                    )
                }
                other => {
                    debug!("Commit completed for a closed session, refreshing anyway");
                    (other, Some(PanelCommand::RefreshLibrary { ticket }))
                }
            },
            (PanelState::Open(s), event) => s.on_event(event, tickets),
            (PanelState::Closed, event) => {
                debug!("Panel closed, ignoring {:?}", event);
                (PanelState::Closed, None)
            }
        }
    }
}

impl SearchSession {
    fn on_event(
        mut self,
        event: PanelEvent,
        tickets: &mut TicketCounter,
    ) -> (PanelState, Option<PanelCommand>) {
        match event {
            PanelEvent::EditQuery(text) => {
                if self.is_committing() {
                    return (PanelState::Open(self), None);
                }
                if text.trim().is_empty() {
                    self.results.clear();
                }
                self.query = text;
                self.has_submitted = false;
                self.phase = SearchPhase::Typing;
                // An in-flight search was for the old text.
                self.pending = None;
                (PanelState::Open(self), None)
            }
            PanelEvent::Submit => {
                let query = self.query.trim().to_string();
                if query.is_empty() || self.is_searching() || self.is_committing() {
                    return (PanelState::Open(self), None);
                }
                let ticket = tickets.next_ticket(self.id);
                self.phase = SearchPhase::Searching;
                self.has_submitted = true;
                self.results.clear();
                self.error_message = None;
                self.pending = Some(ticket);
                (
                    PanelState::Open(self),
                    Some(PanelCommand::Search { ticket, query }),
                )
            }
            PanelEvent::SearchComplete { ticket, result } => {
                if !self.is_pending(ticket) || !self.is_searching() {
                    debug!("Discarding stale search result for session {}", ticket.session);
                    return (PanelState::Open(self), None);
                }
                self.pending = None;
                match result {
                    Ok(results) => {
                        self.phase = if results.is_empty() {
                            SearchPhase::NoResults
                        } else {
                            SearchPhase::Results
                        };
                        self.results = results;
                    }
                    Err(message) => {
                        self.phase = SearchPhase::Idle;
                        self.results.clear();
                        self.error_message = Some(message);
                    }
                }
                (PanelState::Open(self), None)
            }
            PanelEvent::SelectCandidate(catalog_id) => {
                let known = self.results.iter().any(|c| c.catalog_id == catalog_id);
                if self.phase != SearchPhase::Results || !known {
                    return (PanelState::Open(self), None);
                }
                let ticket = tickets.next_ticket(self.id);
                self.phase = SearchPhase::Committing;
                self.error_message = None;
                self.pending = Some(ticket);
                (
                    PanelState::Open(self),
                    Some(PanelCommand::Commit { ticket, catalog_id }),
                )
            }
            PanelEvent::CommitComplete {
                ticket,
                result: Err(message),
            } => {
                if !self.is_pending(ticket) || !self.is_committing() {
                    debug!("Discarding stale commit failure for session {}", ticket.session);
                    return (PanelState::Open(self), None);
                }
                self.pending = None;
                self.phase = SearchPhase::Results;
                self.error_message = Some(message);
                (PanelState::Open(self), None)
            }
            PanelEvent::LibraryRefreshed { ticket } => {
                if self.is_pending(ticket) && self.is_committing() {
                    (PanelState::Closed, None)
                } else {
                    (PanelState::Open(self), None)
                }
            }
            // Handled in PanelState::transition
            PanelEvent::Open | PanelEvent::Close | PanelEvent::CommitComplete { .. } => {
                (PanelState::Open(self), None)
            }
        }
    }
}

/// Read-only snapshot for rendering an open panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub query: String,
    pub phase: SearchPhase,
    pub results: Vec<SearchCandidate>,
    pub has_submitted: bool,
    pub searching: bool,
    pub committing: bool,
    pub message: PanelMessage,
    pub error_message: Option<String>,
}

impl From<&SearchSession> for PanelView {
    fn from(session: &SearchSession) -> Self {
        Self {
            query: session.query.clone(),
            phase: session.phase,
            results: session.results.clone(),
            has_submitted: session.has_submitted,
            searching: session.is_searching(),
            committing: session.is_committing(),
            message: session.message(),
            error_message: session.error_message.clone(),
        }
    }
}

/// Holder of the panel state machine
#[derive(Debug, Default)]
pub struct AcquisitionPanel {
    state: PanelState,
    tickets: TicketCounter,
}

impl AcquisitionPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event, returning the side effect to perform, if any
    pub fn dispatch(&mut self, event: PanelEvent) -> Option<PanelCommand> {
        let state = std::mem::take(&mut self.state);
        let (next, command) = state.transition(event, &mut self.tickets);
        self.state = next;
        command
    }

    /// Whether `ticket` is the request the open session is waiting on
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.session().is_some_and(|s| s.is_pending(ticket))
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PanelState::Open(_))
    }

    pub fn session(&self) -> Option<&SearchSession> {
        match &self.state {
            PanelState::Open(session) => Some(session),
            PanelState::Closed => None,
        }
    }

    pub fn view(&self) -> Option<PanelView> {
        self.session().map(PanelView::from)
    }
}
