use crate::args;
use crate::client::{take_field, AbstractClient};
use crate::descriptor::{BranchDescriptor, FileDescriptor};
use crate::error::BridgeResult;
use crate::process::Invoke;
use crate::records::FileWithPages;
use serde_json::Value;

pub struct Files<'a, I: Invoke> {
    client: &'a AbstractClient<I>,
}

impl<'a, I: Invoke> Files<'a, I> {
    pub(crate) fn new(client: &'a AbstractClient<I>) -> Self {
        Self { client }
    }

    pub async fn list(&self, branch: &BranchDescriptor) -> BridgeResult<Vec<Value>> {
        self.client
            .invoke_field(args::files_list(branch), "files")
            .await
    }

    /// File record merged with its page list.
    pub async fn info(&self, file: &FileDescriptor) -> BridgeResult<FileWithPages> {
        let file = self.client.resolve(file).await?;
        let mut response = self.client.invoke(args::file_info(&file)).await?;
        let pages = match response.as_object_mut() {
            Some(envelope) => envelope.remove("pages").unwrap_or(Value::Array(Vec::new())),
            None => Value::Array(Vec::new()),
        };
        Ok(FileWithPages {
            file: take_field(response, "file")?,
            pages: serde_json::from_value(pages)?,
        })
    }
}
