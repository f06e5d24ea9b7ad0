//! Copilot Studio agent client.
//!
//! Starts a conversation with an agent and asks questions over the agent's
//! server-sent event API. Requests are sent through a
//! [`copilot_auth::Transport`], by default the bearer-token pipeline built
//! from the connection settings.
//!
//! # Example
//!
//! ```no_run
//! use copilot_client::{CopilotClient, collect_answer};
//! use copilot_config::{ConfigResolver, ConnectionSettings};
//!
//! # async fn example() -> copilot_client::Result<()> {
//! let settings = ConnectionSettings::from_resolver(&ConfigResolver::from_process())?;
//! let client = CopilotClient::connect(settings)?;
//! let answer = client.ask("How much is the Adventure Dining Table?").await?;
//! assert!(answer.contains("$90"));
//! # Ok(())
//! # }
//! ```

mod client;
mod conversation;
pub mod error;
pub mod types;

pub use client::{CONVERSATION_ID_HEADER, ClientBuilder, CopilotClient};
pub use conversation::collect_answer;
pub use error::{Error, Result};
pub use types::{Activity, ConversationAccount};
