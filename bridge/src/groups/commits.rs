use crate::args::{self, CommitListOptions};
use crate::client::AbstractClient;
use crate::descriptor::{CommitScope, CommitTarget};
use crate::error::BridgeResult;
use crate::process::Invoke;
use crate::records::Commit;
use serde_json::Value;

pub struct Commits<'a, I: Invoke> {
    client: &'a AbstractClient<I>,
}

impl<'a, I: Invoke> Commits<'a, I> {
    pub(crate) fn new(client: &'a AbstractClient<I>) -> Self {
        Self { client }
    }

    /// History of a branch, optionally narrowed to a file or layer.
    pub async fn list(
        &self,
        scope: impl Into<CommitScope>,
        options: CommitListOptions,
    ) -> BridgeResult<Vec<Commit>> {
        let scope = scope.into();
        self.client
            .invoke_field(args::commits_list(&scope, &options), "commits")
            .await
    }

    /// One commit. A branch target yields its head commit; pinned targets
    /// are resolved first when they say `latest`.
    pub async fn info(&self, target: impl Into<CommitTarget>) -> BridgeResult<Value> {
        let target = match target.into() {
            CommitTarget::Branch(branch) => CommitTarget::Branch(branch),
            CommitTarget::Commit(commit) => self.client.resolve(&commit).await?.into(),
            CommitTarget::File(file) => self.client.resolve(&file).await?.into(),
            CommitTarget::Layer(layer) => self.client.resolve(&layer).await?.into(),
        };
        self.client
            .invoke_field(args::commit_info(&target), "commit")
            .await
    }
}
