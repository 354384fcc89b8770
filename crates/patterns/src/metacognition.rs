//! Reflexive metacognition — reason about one's own capabilities first.
//!
//! The agent holds a self-model: named capabilities with confidence levels.
//! Each request is assessed against the self-model before anything else
//! happens, and the assessment decides the route: answer directly, use a
//! tool, escalate to a human, or refuse. Every decision is logged with its
//! reasoning.

use crate::report::DemoReport;
use agentry_core::tool::ToolRegistry;
use agentry_core::{LlmClient, Result};
use tracing::{debug, info};

/// Confidence the agent has in one of its capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

/// One capability in the self-model.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub confidence: Confidence,
    /// Tool that covers this capability, when one exists.
    pub tool: Option<String>,
}

/// The agent's model of itself.
#[derive(Debug, Clone)]
pub struct SelfModel {
    pub capabilities: Vec<Capability>,
    /// Topics the agent must not advise on directly.
    pub restricted_topics: Vec<String>,
}

impl SelfModel {
    /// The demo's default self-model.
    pub fn default_model() -> Self {
        Self {
            capabilities: vec![
                Capability {
                    name: "general knowledge".into(),
                    confidence: Confidence::High,
                    tool: None,
                },
                Capability {
                    name: "arithmetic".into(),
                    confidence: Confidence::Medium,
                    tool: Some("calculator".into()),
                },
                Capability {
                    name: "current events".into(),
                    confidence: Confidence::Low,
                    tool: Some("search".into()),
                },
                Capability {
                    name: "weather".into(),
                    confidence: Confidence::None,
                    tool: Some("weather".into()),
                },
            ],
            restricted_topics: vec!["medical".into(), "legal".into(), "financial advice".into()],
        }
    }

    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.capabilities
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn is_restricted(&self, assessment: &str) -> bool {
        let lower = assessment.to_lowercase();
        self.restricted_topics.iter().any(|t| lower.contains(t))
    }
}

/// Routes a request can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    AnswerDirectly,
    UseTool(String),
    Escalate,
    Refuse,
}

/// One logged decision.
#[derive(Debug, Clone)]
pub struct Decision {
    pub request: String,
    pub required_capability: String,
    pub route: Route,
    pub reasoning: String,
    pub response: String,
}

/// The metacognitive agent.
pub struct MetacognitiveAgent {
    llm: LlmClient,
    tools: ToolRegistry,
    self_model: SelfModel,
    log: Vec<Decision>,
}

impl MetacognitiveAgent {
    pub fn new(llm: LlmClient, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools,
            self_model: SelfModel::default_model(),
            log: Vec::new(),
        }
    }

    pub fn with_self_model(mut self, model: SelfModel) -> Self {
        self.self_model = model;
        self
    }

    pub fn decision_log(&self) -> &[Decision] {
        &self.log
    }

    /// Ask which capability (and topic sensitivity) a request demands.
    async fn assess(&self, request: &str) -> Result<String> {
        Ok(self
            .llm
            .generate(&format!(
                "What capability does answering this request mainly require? \
                 Choose from: {}. Also note if the topic is medical, legal or \
                 financial advice.\n\
                 Request: {request}\n\
                 Reply with the capability name and any sensitive-topic note.",
                self.self_model
                    .capabilities
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .await?)
    }

    /// Map an assessment onto a route via the self-model.
    pub fn decide(&self, assessment: &str) -> (String, Route, String) {
        if self.self_model.is_restricted(assessment) {
            return (
                "restricted topic".into(),
                Route::Refuse,
                "the topic falls under restricted advice areas".into(),
            );
        }

        let matched = self
            .self_model
            .capabilities
            .iter()
            .find(|c| assessment.to_lowercase().contains(&c.name.to_lowercase()));

        match matched {
            Some(capability) => {
                let route = match (capability.confidence, &capability.tool) {
                    (Confidence::High, _) => Route::AnswerDirectly,
                    (Confidence::Medium | Confidence::Low, Some(tool)) => {
                        Route::UseTool(tool.clone())
                    }
                    (Confidence::None, Some(tool)) => Route::UseTool(tool.clone()),
                    (Confidence::Medium, None) => Route::AnswerDirectly,
                    (Confidence::Low | Confidence::None, None) => Route::Escalate,
                };
                let reasoning = format!(
                    "capability '{}' held at {:?} confidence{}",
                    capability.name,
                    capability.confidence,
                    capability
                        .tool
                        .as_ref()
                        .map(|t| format!(", tool '{t}' available"))
                        .unwrap_or_default()
                );
                (capability.name.clone(), route, reasoning)
            }
            None => (
                "unrecognized".into(),
                Route::Escalate,
                "no matching capability in the self-model".into(),
            ),
        }
    }

    fn argument_key(tool: &str) -> &'static str {
        match tool {
            "calculator" => "expression",
            "weather" => "city",
            "search" => "query",
            "knowledge_base" => "topic",
            _ => "input",
        }
    }

    /// Ask the model what argument to pass the chosen tool.
    async fn tool_argument(&self, request: &str, tool: &str) -> Result<String> {
        Ok(self
            .llm
            .generate(&format!(
                "Extract the single argument to pass to the '{tool}' tool for \
                 this request. Reply with the argument only.\nRequest: {request}"
            ))
            .await?
            .trim()
            .trim_matches('"')
            .to_string())
    }

    /// Process one request through assess → decide → act.
    pub async fn process(&mut self, request: &str) -> Result<Decision> {
        let assessment = self.assess(request).await?;
        let (required_capability, route, reasoning) = self.decide(&assessment);
        debug!(%required_capability, ?route, "decision made");

        let response = match &route {
            Route::AnswerDirectly => self.llm.generate(request).await?,
            Route::UseTool(tool) => {
                let argument = self.tool_argument(request, tool).await?;
                let arguments = serde_json::json!({ Self::argument_key(tool): argument });
                let observation = match self.tools.execute(tool, arguments).await {
                    Ok(outcome) => outcome.output,
                    Err(e) => format!("Error: {e}"),
                };
                self.llm
                    .generate(&format!(
                        "Request: {request}\nTool result: {observation}\n\
                         Answer the request using the tool result."
                    ))
                    .await?
            }
            Route::Escalate => format!(
                "This request is outside my reliable capabilities ({reasoning}); \
                 routing it to a human."
            ),
            Route::Refuse => format!(
                "I can't advise on this directly ({reasoning}). Please consult a \
                 qualified professional."
            ),
        };

        info!(?route, "request handled");
        let decision = Decision {
            request: request.to_string(),
            required_capability,
            route,
            reasoning,
            response,
        };
        self.log.push(decision.clone());
        Ok(decision)
    }
}

/// Demo: four requests taking the four routes.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let mut agent = MetacognitiveAgent::new(llm.clone(), agentry_tools::default_registry());

    let requests = [
        "What year did the French Revolution begin?",
        "What is 37 * 89?",
        "Should I take ibuprofen or aspirin for chest pain?",
        "Predict next quarter's exact GDP figure for Japan.",
    ];

    let mut report = DemoReport::new("metacognition");
    for request in requests {
        let decision = agent.process(request).await?;
        report.push(
            format!("Request: {request}"),
            format!(
                "capability: {}\nroute: {:?}\nreasoning: {}\nresponse: {}",
                decision.required_capability, decision.route, decision.reasoning, decision.response
            ),
        );
    }

    report.push(
        "Decision log",
        agent
            .decision_log()
            .iter()
            .map(|d| format!("{:?} ← {}", d.route, d.required_capability))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    fn agent(llm: agentry_core::LlmClient) -> MetacognitiveAgent {
        MetacognitiveAgent::new(llm, agentry_tools::default_registry())
    }

    #[test]
    fn restricted_topics_refuse() {
        let model = SelfModel::default_model();
        let a = agent(scripted(&[]));
        let (_, route, _) = a.decide("this is medical advice about dosage");
        assert_eq!(route, Route::Refuse);
        assert!(model.is_restricted("a legal question"));
    }

    #[test]
    fn routes_follow_confidence() {
        let a = agent(scripted(&[]));
        assert_eq!(a.decide("general knowledge").1, Route::AnswerDirectly);
        assert_eq!(
            a.decide("arithmetic").1,
            Route::UseTool("calculator".into())
        );
        assert_eq!(a.decide("weather").1, Route::UseTool("weather".into()));
        assert_eq!(a.decide("quantum chromodynamics").1, Route::Escalate);
    }

    #[tokio::test]
    async fn direct_answer_route() {
        let llm = scripted(&["general knowledge", "1789."]);
        let mut a = agent(llm);
        let decision = a.process("When did the French Revolution begin?").await.unwrap();
        assert_eq!(decision.route, Route::AnswerDirectly);
        assert_eq!(decision.response, "1789.");
    }

    #[tokio::test]
    async fn tool_route_executes_tool() {
        let llm = scripted(&["arithmetic", "37 * 89", "37 * 89 is 3293."]);
        let mut a = agent(llm);
        let decision = a.process("What is 37 * 89?").await.unwrap();
        assert_eq!(decision.route, Route::UseTool("calculator".into()));
        assert!(decision.response.contains("3293"));
    }

    #[tokio::test]
    async fn refusal_never_calls_model_again() {
        // One scripted response: only the assessment call happens.
        let llm = scripted(&["this is medical advice"]);
        let mut a = agent(llm);
        let decision = a.process("Which painkiller for chest pain?").await.unwrap();
        assert_eq!(decision.route, Route::Refuse);
        assert!(decision.response.contains("qualified professional"));
    }

    #[tokio::test]
    async fn decision_log_accumulates() {
        let llm = scripted(&["general knowledge", "answer one", "unmatched thing here"]);
        let mut a = agent(llm);
        a.process("q1").await.unwrap();
        a.process("q2").await.unwrap();
        assert_eq!(a.decision_log().len(), 2);
        assert_eq!(a.decision_log()[1].route, Route::Escalate);
    }
}
