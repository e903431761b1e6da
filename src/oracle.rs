//! Drafting oracle: turns instructions plus context into text.
//!
//! With a configured API key the oracle asks an OpenAI-compatible chat
//! endpoint. Without one, or whenever the remote call fails, it drafts
//! from local templates, so the workflow runs fully offline.
//! Oracle faults never reach the caller.

mod fallback;
mod remote;

use tracing::warn;

use crate::config::OracleConfig;

use remote::RemoteClient;

/// Anything that can draft text for a role.
///
/// A team holds a boxed `Drafter`, so tests can inject canned replies.
pub trait Drafter {
    fn draft(&self, system: &str, user: &str, max_tokens: u32) -> String;
}

/// The production drafter: remote when configured, local otherwise.
pub struct Oracle {
    remote: Option<RemoteClient>,
}

impl Oracle {
    /// Builds an oracle from config. A missing key means offline mode.
    pub fn new(config: &OracleConfig) -> Self {
        let remote = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => match RemoteClient::new(config, key) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "could not build oracle client; drafting offline");
                    None
                }
            },
            _ => None,
        };
        Self { remote }
    }

    /// An oracle that never touches the network.
    pub fn offline() -> Self {
        Self { remote: None }
    }

    pub fn is_offline(&self) -> bool {
        self.remote.is_none()
    }
}

impl Drafter for Oracle {
    fn draft(&self, system: &str, user: &str, max_tokens: u32) -> String {
        if let Some(remote) = &self.remote {
            match remote.complete(system, user, max_tokens) {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => warn!("oracle returned an empty reply; drafting offline"),
                Err(e) => warn!(error = %e, "oracle call failed; drafting offline"),
            }
        }
        fallback::reply(system, user)
    }
}
