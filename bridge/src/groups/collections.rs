use crate::args;
use crate::client::AbstractClient;
use crate::descriptor::{CollectionDescriptor, CollectionScope};
use crate::error::BridgeResult;
use crate::process::Invoke;
use serde_json::Value;

pub struct Collections<'a, I: Invoke> {
    client: &'a AbstractClient<I>,
}

impl<'a, I: Invoke> Collections<'a, I> {
    pub(crate) fn new(client: &'a AbstractClient<I>) -> Self {
        Self { client }
    }

    /// Collections of a project, or only those on one branch.
    pub async fn list(&self, scope: impl Into<CollectionScope>) -> BridgeResult<Vec<Value>> {
        let scope = scope.into();
        self.client
            .invoke_field(args::collections_list(&scope), "collections")
            .await
    }

    pub async fn info(&self, collection: &CollectionDescriptor) -> BridgeResult<Value> {
        self.client
            .invoke_field(args::collection_info(collection), "collection")
            .await
    }
}
