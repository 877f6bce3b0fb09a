//! Session orchestration and the SQL assistant boundary behind the `insight` binary

pub mod assistant;
pub mod session;

pub use assistant::{AssistantRequest, AssistantResponse, CommandAssistant, SqlAssistant};
pub use session::Session;
