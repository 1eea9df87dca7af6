use crate::args;
use crate::client::AbstractClient;
use crate::descriptor::{BranchDescriptor, FileDescriptor, PageDescriptor};
use crate::error::BridgeResult;
use crate::process::Invoke;
use crate::records::Page;

pub struct Pages<'a, I: Invoke> {
    client: &'a AbstractClient<I>,
}

impl<'a, I: Invoke> Pages<'a, I> {
    pub(crate) fn new(client: &'a AbstractClient<I>) -> Self {
        Self { client }
    }

    pub async fn list(&self, file: &FileDescriptor) -> BridgeResult<Vec<Page>> {
        Ok(self.client.files().info(file).await?.pages)
    }

    /// Every page of every file on the branch head.
    pub async fn list_for_branch(&self, branch: &BranchDescriptor) -> BridgeResult<Vec<Page>> {
        self.client
            .invoke_field(args::files_list(branch), "pages")
            .await
    }

    /// Looks the page up in its file. A page that does not exist is `None`,
    /// not an error.
    pub async fn info(&self, page: &PageDescriptor) -> BridgeResult<Option<Page>> {
        let pages = self.list(&page.file()).await?;
        Ok(pages.into_iter().find(|candidate| candidate.id == page.page_id))
    }
}
