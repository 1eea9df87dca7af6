use crate::args;
use crate::client::AbstractClient;
use crate::descriptor::{FileDescriptor, LayerDescriptor};
use crate::error::BridgeResult;
use crate::process::Invoke;
use serde_json::Value;

pub struct Layers<'a, I: Invoke> {
    client: &'a AbstractClient<I>,
}

impl<'a, I: Invoke> Layers<'a, I> {
    pub(crate) fn new(client: &'a AbstractClient<I>) -> Self {
        Self { client }
    }

    pub async fn list(&self, file: &FileDescriptor) -> BridgeResult<Vec<Value>> {
        let file = self.client.resolve(file).await?;
        self.client
            .invoke_field(args::layers_list(&file), "layers")
            .await
    }

    /// Layer metadata (name, type, dimensions) without its rendered data.
    pub async fn info(&self, layer: &LayerDescriptor) -> BridgeResult<Value> {
        let layer = self.client.resolve(layer).await?;
        self.client
            .invoke_field(args::layer_info(&layer), "layer")
            .await
    }
}
