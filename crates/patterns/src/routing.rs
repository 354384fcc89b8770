//! Routing — classify a request, dispatch it to a specialized handler.
//!
//! A classifier prompt maps each request onto a lane; every lane has its own
//! handler prompt. Unrecognized classifications land in the help lane, which
//! answers without calling the model at all.

use crate::report::DemoReport;
use agentry_core::{LlmClient, Result};
use tracing::debug;

/// Where a request was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Booking,
    Information,
    Help,
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lane::Booking => write!(f, "booking"),
            Lane::Information => write!(f, "information"),
            Lane::Help => write!(f, "help"),
        }
    }
}

/// Outcome of routing one request.
#[derive(Debug, Clone)]
pub struct Routed {
    pub request: String,
    pub lane: Lane,
    pub response: String,
}

/// The router: one classifier, one handler per lane.
pub struct Router {
    llm: LlmClient,
}

impl Router {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Classify a request into a lane.
    pub async fn classify(&self, request: &str) -> Result<Lane> {
        let prompt = format!(
            "Analyze this request and respond with just one word:\n\
             - \"book\" for travel/hotel/restaurant bookings\n\
             - \"info\" for general questions\n\
             - \"help\" for unclear requests\n\n\
             Request: {request}"
        );
        let response = self.llm.generate(&prompt).await?;
        let normalized = response.trim().to_lowercase();

        let lane = if normalized.contains("book") {
            Lane::Booking
        } else if normalized.contains("info") {
            Lane::Information
        } else {
            Lane::Help
        };
        debug!(%lane, "classified request");
        Ok(lane)
    }

    /// Route a request and produce the lane's response.
    pub async fn route(&self, request: &str) -> Result<Routed> {
        let lane = self.classify(request).await?;
        let response = match lane {
            Lane::Booking => {
                self.llm
                    .generate(&format!("You are a booking assistant. Help with: {request}"))
                    .await?
            }
            Lane::Information => {
                self.llm
                    .generate(&format!("You are a helpful assistant. Answer: {request}"))
                    .await?
            }
            Lane::Help => format!(
                "I'm not sure how to help with '{request}'. Can you be more specific?"
            ),
        };

        Ok(Routed {
            request: request.to_string(),
            lane,
            response,
        })
    }
}

/// Demo: route the catalogue's three sample requests.
pub async fn demo(llm: &LlmClient) -> Result<DemoReport> {
    let router = Router::new(llm.clone());
    let requests = [
        "Book me a hotel in Paris",
        "What's the capital of France?",
        "Help me with something",
    ];

    let mut report = DemoReport::new("routing");
    for request in requests {
        let routed = router.route(request).await?;
        report.push(
            format!("Request: {request}"),
            format!("→ routed to: {}\n{}", routed.lane, routed.response),
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::scripted;

    #[tokio::test]
    async fn booking_lane_calls_handler() {
        let llm = scripted(&["book", "Your hotel in Paris is booked."]);
        let router = Router::new(llm);
        let routed = router.route("Book me a hotel in Paris").await.unwrap();
        assert_eq!(routed.lane, Lane::Booking);
        assert!(routed.response.contains("booked"));
    }

    #[tokio::test]
    async fn info_lane_calls_handler() {
        let llm = scripted(&["info", "Paris is the capital of France."]);
        let router = Router::new(llm);
        let routed = router.route("What's the capital of France?").await.unwrap();
        assert_eq!(routed.lane, Lane::Information);
    }

    #[tokio::test]
    async fn unknown_classification_falls_back_to_help() {
        // Help lane answers locally; only the classifier call is scripted.
        let llm = scripted(&["gibberish classification"]);
        let router = Router::new(llm);
        let routed = router.route("???").await.unwrap();
        assert_eq!(routed.lane, Lane::Help);
        assert!(routed.response.contains("more specific"));
    }

    #[tokio::test]
    async fn demo_routes_all_samples() {
        let llm = scripted(&[
            "book",
            "Booked!",
            "info",
            "Paris.",
            "help",
        ]);
        let report = demo(&llm).await.unwrap();
        let rendered = report.render();
        assert!(rendered.contains("→ routed to: booking"));
        assert!(rendered.contains("→ routed to: information"));
        assert!(rendered.contains("→ routed to: help"));
    }
}
