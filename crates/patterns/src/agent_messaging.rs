//! Inter-agent communication — directed and broadcast messages via a hub.
//!
//! Agents register with a hub that owns delivery: directed messages land in
//! one inbox, broadcasts in everyone else's. Draining an inbox makes the
//! agent answer each request with its role in the prompt; every delivery is
//! recorded in the hub's log.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Message kinds the hub understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
    Broadcast,
}

/// One message between agents.
#[derive(Debug, Clone)]
pub struct AgentMessage {
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub kind: MessageKind,
}

/// A hub-registered agent: a role plus an inbox.
#[derive(Debug)]
pub struct HubAgent {
    pub name: String,
    pub role: String,
    inbox: Vec<AgentMessage>,
}

impl HubAgent {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            inbox: Vec::new(),
        }
    }

    pub fn inbox_len(&self) -> usize {
        self.inbox.len()
    }
}

/// The communication hub.
pub struct CommunicationHub {
    llm: LlmClient,
    agents: BTreeMap<String, HubAgent>,
    log: Vec<AgentMessage>,
}

impl CommunicationHub {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            agents: BTreeMap::new(),
            log: Vec::new(),
        }
    }

    /// Register an agent.
    pub fn register(&mut self, agent: HubAgent) {
        self.agents.insert(agent.name.clone(), agent);
    }

    /// Send a directed message. Fails for unknown recipients.
    pub fn send(
        &mut self,
        sender: &str,
        recipient: &str,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> std::result::Result<(), String> {
        if !self.agents.contains_key(recipient) {
            return Err(format!("unknown recipient: {recipient}"));
        }
        let message = AgentMessage {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            content: content.into(),
            kind,
        };
        self.log.push(message.clone());
        if let Some(agent) = self.agents.get_mut(recipient) {
            agent.inbox.push(message);
        }
        Ok(())
    }

    /// Broadcast to every agent except the sender.
    pub fn broadcast(&mut self, sender: &str, content: impl Into<String>) {
        let content = content.into();
        let recipients: Vec<String> = self
            .agents
            .keys()
            .filter(|name| name.as_str() != sender)
            .cloned()
            .collect();
        for recipient in recipients {
            // Delivery to known agents cannot fail here.
            let _ = self.send(sender, &recipient, content.clone(), MessageKind::Broadcast);
        }
    }

    /// Drain one agent's inbox, answering each request via the LLM.
    /// Responses are sent back to the original sender when that sender is
    /// a registered agent.
    pub async fn process_inbox(&mut self, name: &str) -> Result<Vec<AgentMessage>> {
        let (role, pending) = match self.agents.get_mut(name) {
            Some(agent) => (agent.role.clone(), std::mem::take(&mut agent.inbox)),
            None => return Ok(Vec::new()),
        };

        let mut responses = Vec::new();
        for message in pending {
            if message.kind != MessageKind::Request {
                continue;
            }
            debug!(agent = name, from = %message.sender, "answering request");
            let prompt = format!(
                "You are {name}, whose role is: {role}.\n\
                 Another agent ({}) asks:\n{}\n\n\
                 Reply concisely in your role.",
                message.sender, message.content
            );
            let reply = self.llm.generate(&prompt).await?;
            let response = AgentMessage {
                sender: name.to_string(),
                recipient: message.sender.clone(),
                content: reply,
                kind: MessageKind::Response,
            };
            responses.push(response.clone());
            if self.agents.contains_key(&message.sender) {
                let _ = self.send(name, &message.sender, response.content, MessageKind::Response);
            } else {
                self.log.push(response);
            }
        }
        Ok(responses)
    }

    /// The full delivery log.
    pub fn log(&self) -> &[AgentMessage] {
        &self.log
    }

    /// (name, role, queued messages) per agent.
    pub fn agent_status(&self) -> Vec<(String, String, usize)> {
        self.agents
            .values()
            .map(|a| (a.name.clone(), a.role.clone(), a.inbox.len()))
            .collect()
    }
}

/// Demo: a planner asks two specialists, then broadcasts a wrap-up.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut hub = CommunicationHub::new(llm.clone());
    hub.register(HubAgent::new("planner", "coordinates the project"));
    hub.register(HubAgent::new("researcher", "digs up facts and prior art"));
    hub.register(HubAgent::new("writer", "turns findings into prose"));

    hub.send(
        "planner",
        "researcher",
        "What are the key benefits of static typing?",
        MessageKind::Request,
    )
    .map_err(agentry_core::Error::Internal)?;
    hub.send(
        "planner",
        "writer",
        "Draft an outline for a typing article.",
        MessageKind::Request,
    )
    .map_err(agentry_core::Error::Internal)?;

    let research_replies = hub.process_inbox("researcher").await?;
    let writer_replies = hub.process_inbox("writer").await?;

    hub.broadcast("planner", "Thanks all — drafts due tomorrow.");

    let mut report = DemoReport::new("agent-messaging");
    for reply in research_replies.iter().chain(writer_replies.iter()) {
        report.push(
            format!("{} → {}", reply.sender, reply.recipient),
            &reply.content,
        );
    }
    report.push(
        "Delivery log",
        hub.log()
            .iter()
            .map(|m| format!("{} → {} [{:?}]", m.sender, m.recipient, m.kind))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    report.push(
        "Agent status",
        hub.agent_status()
            .iter()
            .map(|(name, role, queued)| format!("{name} ({role}): {queued} queued"))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[tokio::test]
    async fn directed_message_lands_in_inbox() {
        let llm = scripted(&[]);
        let mut hub = CommunicationHub::new(llm);
        hub.register(HubAgent::new("a", "role a"));
        hub.register(HubAgent::new("b", "role b"));

        hub.send("a", "b", "hello", MessageKind::Request).unwrap();
        assert_eq!(hub.agent_status()[1].2, 1); // b has one queued
        assert_eq!(hub.log().len(), 1);
    }

    #[tokio::test]
    async fn unknown_recipient_rejected() {
        let llm = scripted(&[]);
        let mut hub = CommunicationHub::new(llm);
        hub.register(HubAgent::new("a", "role"));
        assert!(hub.send("a", "ghost", "hi", MessageKind::Request).is_err());
    }

    #[tokio::test]
    async fn broadcast_skips_sender() {
        let llm = scripted(&[]);
        let mut hub = CommunicationHub::new(llm);
        hub.register(HubAgent::new("a", "r"));
        hub.register(HubAgent::new("b", "r"));
        hub.register(HubAgent::new("c", "r"));

        hub.broadcast("a", "news");
        let status = hub.agent_status();
        let a = status.iter().find(|(n, _, _)| n == "a").unwrap();
        let b = status.iter().find(|(n, _, _)| n == "b").unwrap();
        assert_eq!(a.2, 0);
        assert_eq!(b.2, 1);
    }

    #[tokio::test]
    async fn inbox_processing_answers_and_routes_response() {
        let llm = scripted(&["Static typing catches bugs early."]);
        let mut hub = CommunicationHub::new(llm);
        hub.register(HubAgent::new("planner", "coordinates"));
        hub.register(HubAgent::new("researcher", "researches"));

        hub.send(
            "planner",
            "researcher",
            "Benefits of static typing?",
            MessageKind::Request,
        )
        .unwrap();

        let responses = hub.process_inbox("researcher").await.unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].kind, MessageKind::Response);
        assert_eq!(responses[0].recipient, "planner");

        // Planner's inbox now has the response.
        let status = hub.agent_status();
        let planner = status.iter().find(|(n, _, _)| n == "planner").unwrap();
        assert_eq!(planner.2, 1);
    }

    #[tokio::test]
    async fn non_request_messages_are_not_answered() {
        let llm = scripted(&[]);
        let mut hub = CommunicationHub::new(llm);
        hub.register(HubAgent::new("a", "r"));
        hub.register(HubAgent::new("b", "r"));
        hub.broadcast("a", "info only");

        let responses = hub.process_inbox("b").await.unwrap();
        assert!(responses.is_empty());
    }
}
