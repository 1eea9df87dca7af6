use crate::args;
use crate::client::AbstractClient;
use crate::descriptor::CommitDescriptor;
use crate::error::BridgeResult;
use crate::process::Invoke;
use serde_json::Value;

pub struct Changesets<'a, I: Invoke> {
    client: &'a AbstractClient<I>,
}

impl<'a, I: Invoke> Changesets<'a, I> {
    pub(crate) fn new(client: &'a AbstractClient<I>) -> Self {
        Self { client }
    }

    /// Changes introduced by a single commit.
    pub async fn info(&self, commit: &CommitDescriptor) -> BridgeResult<Value> {
        let commit = self.client.resolve(commit).await?;
        self.client
            .invoke_field(args::changeset_info(&commit), "changeset")
            .await
    }
}
