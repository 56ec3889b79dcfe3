//! Slack adapter module. Implements SlackGateway over the Web API, plus an
//! in-memory mock for dry runs.

pub mod client;
pub mod mapper;
pub mod mock_gateway;

pub use client::SlackApiGateway;
pub use mock_gateway::MockSlackGateway;
