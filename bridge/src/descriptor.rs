//! Identity records addressing resources known to abstract-cli
//!
//! Descriptors are plain values composed by containment: a layer lives in a
//! file, a file on a branch, a branch in a project. Every descriptor carries
//! the full chain of ancestor ids, so any of them can address its resource on
//! its own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic revision standing in for the most recent commit on a branch.
pub const LATEST: &str = "latest";

/// Common view over every descriptor that lives inside a branch.
pub trait Descriptor {
    fn project_id(&self) -> &str;

    fn branch_id(&self) -> &str;

    fn sha(&self) -> Option<&str> {
        None
    }

    fn file_id(&self) -> Option<&str> {
        None
    }

    fn layer_id(&self) -> Option<&str> {
        None
    }

    /// Revision reference passed to the tool: the sha when the descriptor
    /// pins one, otherwise the branch id (the branch head).
    fn reference(&self) -> &str {
        self.sha().unwrap_or_else(|| self.branch_id())
    }
}

/// Descriptors pinned to a revision that may still be symbolic.
pub trait Revisioned: Descriptor + Clone {
    fn revision(&self) -> &str;

    /// Copy of this descriptor with the revision replaced.
    fn with_sha(&self, sha: impl Into<String>) -> Self;

    fn is_latest(&self) -> bool {
        self.revision() == LATEST
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    pub project_id: String,
}

impl ProjectDescriptor {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }

    pub fn branch(&self, branch_id: impl Into<String>) -> BranchDescriptor {
        BranchDescriptor {
            project_id: self.project_id.clone(),
            branch_id: branch_id.into(),
        }
    }

    pub fn collection(&self, collection_id: impl Into<String>) -> CollectionDescriptor {
        CollectionDescriptor {
            project_id: self.project_id.clone(),
            collection_id: collection_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDescriptor {
    pub project_id: String,
    pub branch_id: String,
}

impl BranchDescriptor {
    pub fn new(project_id: impl Into<String>, branch_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            branch_id: branch_id.into(),
        }
    }

    pub fn project(&self) -> ProjectDescriptor {
        ProjectDescriptor::new(self.project_id.clone())
    }

    pub fn commit(&self, sha: impl Into<String>) -> CommitDescriptor {
        CommitDescriptor {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            sha: sha.into(),
        }
    }

    pub fn file(&self, sha: impl Into<String>, file_id: impl Into<String>) -> FileDescriptor {
        FileDescriptor {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            sha: sha.into(),
            file_id: file_id.into(),
        }
    }
}

impl Descriptor for BranchDescriptor {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn branch_id(&self) -> &str {
        &self.branch_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitDescriptor {
    pub project_id: String,
    pub branch_id: String,
    pub sha: String,
}

impl CommitDescriptor {
    pub fn new(
        project_id: impl Into<String>,
        branch_id: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            branch_id: branch_id.into(),
            sha: sha.into(),
        }
    }

    pub fn branch(&self) -> BranchDescriptor {
        BranchDescriptor::new(self.project_id.clone(), self.branch_id.clone())
    }
}

impl Descriptor for CommitDescriptor {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn branch_id(&self) -> &str {
        &self.branch_id
    }

    fn sha(&self) -> Option<&str> {
        Some(&self.sha)
    }
}

impl Revisioned for CommitDescriptor {
    fn revision(&self) -> &str {
        &self.sha
    }

    fn with_sha(&self, sha: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub project_id: String,
    pub branch_id: String,
    pub sha: String,
    pub file_id: String,
}

impl FileDescriptor {
    pub fn new(
        project_id: impl Into<String>,
        branch_id: impl Into<String>,
        sha: impl Into<String>,
        file_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            branch_id: branch_id.into(),
            sha: sha.into(),
            file_id: file_id.into(),
        }
    }

    pub fn branch(&self) -> BranchDescriptor {
        BranchDescriptor::new(self.project_id.clone(), self.branch_id.clone())
    }

    pub fn layer(&self, layer_id: impl Into<String>) -> LayerDescriptor {
        LayerDescriptor {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            sha: self.sha.clone(),
            file_id: self.file_id.clone(),
            layer_id: layer_id.into(),
        }
    }

    pub fn page(&self, page_id: impl Into<String>) -> PageDescriptor {
        PageDescriptor {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            sha: self.sha.clone(),
            file_id: self.file_id.clone(),
            page_id: page_id.into(),
        }
    }
}

impl Descriptor for FileDescriptor {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn branch_id(&self) -> &str {
        &self.branch_id
    }

    fn sha(&self) -> Option<&str> {
        Some(&self.sha)
    }

    fn file_id(&self) -> Option<&str> {
        Some(&self.file_id)
    }
}

impl Revisioned for FileDescriptor {
    fn revision(&self) -> &str {
        &self.sha
    }

    fn with_sha(&self, sha: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    pub project_id: String,
    pub branch_id: String,
    pub sha: String,
    pub file_id: String,
    pub layer_id: String,
}

impl LayerDescriptor {
    pub fn file(&self) -> FileDescriptor {
        FileDescriptor::new(
            self.project_id.clone(),
            self.branch_id.clone(),
            self.sha.clone(),
            self.file_id.clone(),
        )
    }
}

impl Descriptor for LayerDescriptor {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn branch_id(&self) -> &str {
        &self.branch_id
    }

    fn sha(&self) -> Option<&str> {
        Some(&self.sha)
    }

    fn file_id(&self) -> Option<&str> {
        Some(&self.file_id)
    }

    fn layer_id(&self) -> Option<&str> {
        Some(&self.layer_id)
    }
}

impl Revisioned for LayerDescriptor {
    fn revision(&self) -> &str {
        &self.sha
    }

    fn with_sha(&self, sha: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub project_id: String,
    pub branch_id: String,
    pub sha: String,
    pub file_id: String,
    pub page_id: String,
}

impl PageDescriptor {
    /// The file that owns this page.
    pub fn file(&self) -> FileDescriptor {
        FileDescriptor::new(
            self.project_id.clone(),
            self.branch_id.clone(),
            self.sha.clone(),
            self.file_id.clone(),
        )
    }
}

impl Descriptor for PageDescriptor {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn branch_id(&self) -> &str {
        &self.branch_id
    }

    fn sha(&self) -> Option<&str> {
        Some(&self.sha)
    }

    fn file_id(&self) -> Option<&str> {
        Some(&self.file_id)
    }
}

impl Revisioned for PageDescriptor {
    fn revision(&self) -> &str {
        &self.sha
    }

    fn with_sha(&self, sha: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDescriptor {
    pub project_id: String,
    pub collection_id: String,
}

impl CollectionDescriptor {
    pub fn new(project_id: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            collection_id: collection_id.into(),
        }
    }
}

/// Target of a commit history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitScope {
    Branch(BranchDescriptor),
    File(FileDescriptor),
    Layer(LayerDescriptor),
}

impl CommitScope {
    pub(crate) fn as_descriptor(&self) -> &dyn Descriptor {
        match self {
            CommitScope::Branch(branch) => branch,
            CommitScope::File(file) => file,
            CommitScope::Layer(layer) => layer,
        }
    }
}

impl From<BranchDescriptor> for CommitScope {
    fn from(branch: BranchDescriptor) -> Self {
        CommitScope::Branch(branch)
    }
}

impl From<FileDescriptor> for CommitScope {
    fn from(file: FileDescriptor) -> Self {
        CommitScope::File(file)
    }
}

impl From<LayerDescriptor> for CommitScope {
    fn from(layer: LayerDescriptor) -> Self {
        CommitScope::Layer(layer)
    }
}

/// Target of a single-commit query. A branch addresses its head commit;
/// the other variants pin a revision that may still be `latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitTarget {
    Branch(BranchDescriptor),
    Commit(CommitDescriptor),
    File(FileDescriptor),
    Layer(LayerDescriptor),
}

impl CommitTarget {
    pub(crate) fn as_descriptor(&self) -> &dyn Descriptor {
        match self {
            CommitTarget::Branch(branch) => branch,
            CommitTarget::Commit(commit) => commit,
            CommitTarget::File(file) => file,
            CommitTarget::Layer(layer) => layer,
        }
    }
}

impl From<BranchDescriptor> for CommitTarget {
    fn from(branch: BranchDescriptor) -> Self {
        CommitTarget::Branch(branch)
    }
}

impl From<CommitDescriptor> for CommitTarget {
    fn from(commit: CommitDescriptor) -> Self {
        CommitTarget::Commit(commit)
    }
}

impl From<FileDescriptor> for CommitTarget {
    fn from(file: FileDescriptor) -> Self {
        CommitTarget::File(file)
    }
}

impl From<LayerDescriptor> for CommitTarget {
    fn from(layer: LayerDescriptor) -> Self {
        CommitTarget::Layer(layer)
    }
}

/// Target of a collection listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionScope {
    Project(ProjectDescriptor),
    Branch(BranchDescriptor),
}

impl CollectionScope {
    pub fn project_id(&self) -> &str {
        match self {
            CollectionScope::Project(project) => &project.project_id,
            CollectionScope::Branch(branch) => &branch.project_id,
        }
    }

    pub fn branch_id(&self) -> Option<&str> {
        match self {
            CollectionScope::Project(_) => None,
            CollectionScope::Branch(branch) => Some(&branch.branch_id),
        }
    }
}

impl From<ProjectDescriptor> for CollectionScope {
    fn from(project: ProjectDescriptor) -> Self {
        CollectionScope::Project(project)
    }
}

impl From<BranchDescriptor> for CollectionScope {
    fn from(branch: BranchDescriptor) -> Self {
        CollectionScope::Branch(branch)
    }
}

impl fmt::Display for CommitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "commit {}/{}@{}", self.project_id, self.branch_id, self.sha)
    }
}

impl fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file {}/{}@{}/{}",
            self.project_id, self.branch_id, self.sha, self.file_id
        )
    }
}

impl fmt::Display for LayerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layer {}/{}@{}/{}/{}",
            self.project_id, self.branch_id, self.sha, self.file_id, self.layer_id
        )
    }
}

impl fmt::Display for PageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {}/{}@{}/{}/{}",
            self.project_id, self.branch_id, self.sha, self.file_id, self.page_id
        )
    }
}
