pub mod args;
pub mod client;
pub mod config;
pub mod decoder;
pub mod descriptor;
pub mod error;
pub mod groups;
pub mod process;
pub mod records;
pub mod resolver;

pub use args::CommitListOptions;
pub use client::AbstractClient;
pub use config::{BridgeConfig, EmptyOutputPolicy, DEFAULT_API_URL};
pub use decoder::JsonStreamDecoder;
pub use descriptor::{
    BranchDescriptor, CollectionDescriptor, CollectionScope, CommitDescriptor, CommitScope,
    CommitTarget, Descriptor, FileDescriptor, LayerDescriptor, PageDescriptor, ProjectDescriptor,
    Revisioned, LATEST,
};
pub use error::{BridgeError, BridgeResult};
pub use process::{CancellationToken, CommandBridge, Invoke, InvokeOptions};
pub use records::{Commit, FileWithPages, Page};

pub mod prelude {
    pub use crate::args::CommitListOptions;
    pub use crate::client::*;
    pub use crate::config::*;
    pub use crate::descriptor::*;
    pub use crate::error::*;
    pub use crate::process::*;
    pub use crate::records::*;
}
