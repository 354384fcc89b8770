//! State machine — an agent lifecycle driven by an explicit transition table.
//!
//! States and events are enums; the table is the single source of truth for
//! what may follow what. Invalid transitions are rejected (and logged), not
//! silently absorbed. Each state has an action; the processing action is the
//! only one that calls the model.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::{debug, warn};

/// Agent lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Listening,
    Processing,
    Responding,
    Error,
    Sleeping,
}

/// Events that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    WakeUp,
    InputReceived,
    ProcessingDone,
    ResponseSent,
    Failure,
    Recover,
    Sleep,
}

/// The allowed transitions.
const TRANSITIONS: [(AgentState, Event, AgentState); 9] = [
    (AgentState::Idle, Event::WakeUp, AgentState::Listening),
    (AgentState::Listening, Event::InputReceived, AgentState::Processing),
    (AgentState::Processing, Event::ProcessingDone, AgentState::Responding),
    (AgentState::Processing, Event::Failure, AgentState::Error),
    (AgentState::Responding, Event::ResponseSent, AgentState::Listening),
    (AgentState::Responding, Event::Failure, AgentState::Error),
    (AgentState::Error, Event::Recover, AgentState::Idle),
    (AgentState::Listening, Event::Sleep, AgentState::Sleeping),
    (AgentState::Sleeping, Event::WakeUp, AgentState::Listening),
];

/// One recorded transition attempt.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub from: AgentState,
    pub event: Event,
    pub to: Option<AgentState>,
    pub action_output: Option<String>,
}

/// The state machine.
pub struct StateMachine {
    llm: LlmClient,
    state: AgentState,
    history: Vec<TransitionRecord>,
    /// Pending input carried from Listening into Processing.
    pending_input: Option<String>,
}

impl StateMachine {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            state: AgentState::Idle,
            history: Vec::new(),
            pending_input: None,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Queue input for the next Processing state.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.pending_input = Some(input.into());
    }

    /// Look up the target state for (current, event).
    fn target(&self, event: Event) -> Option<AgentState> {
        TRANSITIONS
            .iter()
            .find(|(from, e, _)| *from == self.state && *e == event)
            .map(|(_, _, to)| *to)
    }

    /// Attempt a transition; returns whether it was accepted.
    pub async fn dispatch(&mut self, event: Event) -> Result<bool> {
        let Some(next) = self.target(event) else {
            warn!(state = ?self.state, ?event, "invalid transition rejected");
            self.history.push(TransitionRecord {
                from: self.state,
                event,
                to: None,
                action_output: None,
            });
            return Ok(false);
        };

        debug!(from = ?self.state, to = ?next, ?event, "transition");
        let from = self.state;
        self.state = next;
        let action_output = self.run_state_action().await?;
        self.history.push(TransitionRecord {
            from,
            event,
            to: Some(next),
            action_output,
        });
        Ok(true)
    }

    /// Per-state entry action. Only Processing touches the model.
    async fn run_state_action(&mut self) -> Result<Option<String>> {
        let output = match self.state {
            AgentState::Processing => {
                let input = self.pending_input.take().unwrap_or_default();
                let answer = self
                    .llm
                    .generate(&format!("Process this user input and reply briefly: {input}"))
                    .await?;
                Some(answer)
            }
            AgentState::Error => Some("entered error state; awaiting recovery".into()),
            _ => None,
        };
        Ok(output)
    }
}

/// Demo: a full wake → process → respond → sleep cycle, with one invalid
/// event along the way.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut machine = StateMachine::new(llm.clone());
    let mut report = DemoReport::new("state-machine");

    machine.dispatch(Event::WakeUp).await?;
    // ProcessingDone is not valid from Listening; the table rejects it.
    let accepted = machine.dispatch(Event::ProcessingDone).await?;
    report.push(
        "Out-of-order event",
        format!("ProcessingDone while Listening accepted: {accepted}"),
    );

    machine.set_input("What's the weather like today?");
    machine.dispatch(Event::InputReceived).await?;
    machine.dispatch(Event::ProcessingDone).await?;
    machine.dispatch(Event::ResponseSent).await?;
    machine.dispatch(Event::Sleep).await?;

    let history = machine
        .history()
        .iter()
        .map(|r| match r.to {
            Some(to) => format!(
                "{:?} --{:?}--> {:?}{}",
                r.from,
                r.event,
                to,
                r.action_output
                    .as_ref()
                    .map(|o| format!("  [{o}]"))
                    .unwrap_or_default()
            ),
            None => format!("{:?} --{:?}--> REJECTED", r.from, r.event),
        })
        .collect::<Vec<_>>()
        .join("\n");
    report.push("Transition history", history);
    report.push("Final state", format!("{:?}", machine.state()));
    Ok(report)
}
