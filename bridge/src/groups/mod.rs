//! Named operations over the command bridge, one group per resource kind.

mod changesets;
mod collections;
mod commits;
mod data;
mod files;
mod layers;
mod pages;

pub use changesets::Changesets;
pub use collections::Collections;
pub use commits::Commits;
pub use data::Data;
pub use files::Files;
pub use layers::Layers;
pub use pages::Pages;
