//! Chooses where a search executes: the embedded indexes, or the hosted
//! search API (with a development endpoint in front of production).

pub mod client;

pub use client::{RemoteError, RemoteSearchClient};

use serde::{Deserialize, Serialize};

/// Where this process runs relative to the indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Indexes live in this process.
    #[default]
    Embedded,
    /// Queries go to the hosted search API.
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    Local,
    /// Development API; falls back to production when unreachable.
    RemoteDev,
    RemoteProd,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryRouter {
    context: ExecutionContext,
    use_dev_api: bool,
}

impl QueryRouter {
    pub fn new(context: ExecutionContext, use_dev_api: bool) -> Self {
        Self {
            context,
            use_dev_api,
        }
    }

    pub fn route(&self) -> ExecutionPath {
        match (self.context, self.use_dev_api) {
            (ExecutionContext::Embedded, _) => ExecutionPath::Local,
            (ExecutionContext::Remote, true) => ExecutionPath::RemoteDev,
            (ExecutionContext::Remote, false) => ExecutionPath::RemoteProd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_always_routes_local() {
        assert_eq!(
            QueryRouter::new(ExecutionContext::Embedded, true).route(),
            ExecutionPath::Local
        );
        assert_eq!(
            QueryRouter::new(ExecutionContext::Embedded, false).route(),
            ExecutionPath::Local
        );
    }

    #[test]
    fn remote_honors_dev_flag() {
        assert_eq!(
            QueryRouter::new(ExecutionContext::Remote, true).route(),
            ExecutionPath::RemoteDev
        );
        assert_eq!(
            QueryRouter::new(ExecutionContext::Remote, false).route(),
            ExecutionPath::RemoteProd
        );
    }
}
