//! Resolution of the symbolic `latest` revision
//!
//! Commands that address a revision need a concrete sha. A descriptor pinned
//! to [`LATEST`](crate::descriptor::LATEST) is resolved by asking for the most
//! recent commit in its scope (branch, narrowed to file and layer when the
//! descriptor has them). Resolution happens once and is never retried.

use crate::args::{self, CommitListOptions};
use crate::descriptor::Revisioned;
use crate::error::{BridgeError, BridgeResult};
use crate::process::{Invoke, InvokeOptions};
use serde::Deserialize;
use std::fmt::Display;
use tracing::debug;

#[derive(Deserialize)]
struct CommitEnvelope {
    commits: Vec<CommitSha>,
}

#[derive(Deserialize)]
struct CommitSha {
    sha: String,
}

pub async fn resolve<I, D>(invoker: &I, descriptor: &D, options: &InvokeOptions) -> BridgeResult<D>
where
    I: Invoke + ?Sized,
    D: Revisioned + Display,
{
    if !descriptor.is_latest() {
        return Ok(descriptor.clone());
    }

    let query = args::commits_for(descriptor, &CommitListOptions::new().with_limit(1));
    let response = invoker.invoke(query, options).await?;

    let envelope: CommitEnvelope =
        serde_json::from_value(response).map_err(|err| BridgeError::Resolution {
            descriptor: descriptor.to_string(),
            reason: format!("malformed commit list: {}", err),
        })?;

    let latest = envelope
        .commits
        .into_iter()
        .next()
        .ok_or_else(|| BridgeError::Resolution {
            descriptor: descriptor.to_string(),
            reason: "no commits found".to_string(),
        })?;

    debug!(sha = %latest.sha, "resolved latest revision for {}", descriptor);
    Ok(descriptor.with_sha(latest.sha))
}
