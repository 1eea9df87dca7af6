use crate::args;
use crate::client::AbstractClient;
use crate::descriptor::LayerDescriptor;
use crate::error::BridgeResult;
use crate::process::Invoke;
use serde_json::Value;

pub struct Data<'a, I: Invoke> {
    client: &'a AbstractClient<I>,
}

impl<'a, I: Invoke> Data<'a, I> {
    pub(crate) fn new(client: &'a AbstractClient<I>) -> Self {
        Self { client }
    }

    /// Full layer data document, returned as produced by the tool.
    pub async fn info(&self, layer: &LayerDescriptor) -> BridgeResult<Value> {
        let layer = self.client.resolve(layer).await?;
        self.client.invoke(args::layer_data(&layer)).await
    }
}
