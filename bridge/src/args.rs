//! Argument vectors for abstract-cli subcommands
//!
//! Identity fields are emitted outermost first. Optional selectors only appear
//! when their value is present. Credential and endpoint flags are not part of
//! these vectors; the bridge prepends them.

use crate::descriptor::{
    BranchDescriptor, CollectionDescriptor, CollectionScope, CommitDescriptor, CommitScope,
    CommitTarget, Descriptor, FileDescriptor, LayerDescriptor,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitListOptions {
    pub limit: Option<u32>,
}

impl CommitListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

fn push_selector(args: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

pub(crate) fn commits_for(target: &dyn Descriptor, options: &CommitListOptions) -> Vec<String> {
    let mut args = vec![
        "commits".to_string(),
        target.project_id().to_string(),
        target.branch_id().to_string(),
    ];
    // A layer id already pins the file, so the tool takes one selector or the other.
    match target.layer_id() {
        Some(layer_id) => push_selector(&mut args, "--layer-id", Some(layer_id)),
        None => push_selector(&mut args, "--file-id", target.file_id()),
    }
    let limit = options.limit.map(|limit| limit.to_string());
    push_selector(&mut args, "--limit", limit.as_deref());
    args
}

pub fn commits_list(scope: &CommitScope, options: &CommitListOptions) -> Vec<String> {
    commits_for(scope.as_descriptor(), options)
}

pub fn commit_info(target: &CommitTarget) -> Vec<String> {
    let target = target.as_descriptor();
    vec![
        "commit".to_string(),
        target.project_id().to_string(),
        target.reference().to_string(),
    ]
}

pub fn changeset_info(commit: &CommitDescriptor) -> Vec<String> {
    let mut args = vec![
        "changeset".to_string(),
        commit.project_id.clone(),
        commit.branch_id.clone(),
    ];
    push_selector(&mut args, "--commit", Some(&commit.sha));
    args
}

pub fn files_list(branch: &BranchDescriptor) -> Vec<String> {
    vec![
        "files".to_string(),
        branch.project_id.clone(),
        branch.reference().to_string(),
    ]
}

pub fn file_info(file: &FileDescriptor) -> Vec<String> {
    vec![
        "file".to_string(),
        file.project_id.clone(),
        file.reference().to_string(),
        file.file_id.clone(),
    ]
}

pub fn layers_list(file: &FileDescriptor) -> Vec<String> {
    vec![
        "layers".to_string(),
        file.project_id.clone(),
        file.reference().to_string(),
        file.file_id.clone(),
    ]
}

fn layer_subcommand(kind: &str, layer: &LayerDescriptor) -> Vec<String> {
    vec![
        "layer".to_string(),
        kind.to_string(),
        layer.project_id.clone(),
        layer.reference().to_string(),
        layer.file_id.clone(),
        layer.layer_id.clone(),
    ]
}

pub fn layer_info(layer: &LayerDescriptor) -> Vec<String> {
    layer_subcommand("meta", layer)
}

pub fn layer_data(layer: &LayerDescriptor) -> Vec<String> {
    layer_subcommand("data", layer)
}

pub fn collections_list(scope: &CollectionScope) -> Vec<String> {
    let mut args = vec!["collections".to_string(), scope.project_id().to_string()];
    push_selector(&mut args, "--branch", scope.branch_id());
    args
}

pub fn collection_info(collection: &CollectionDescriptor) -> Vec<String> {
    vec![
        "collection".to_string(),
        collection.project_id.clone(),
        collection.collection_id.clone(),
    ]
}
