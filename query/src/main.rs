mod settings;

use bridge::prelude::*;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use settings::Overrides;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "abstract-query")]
#[command(about = "Query Abstract projects through the abstract-cli tool")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Working directory for abstract-cli
    #[arg(long)]
    cwd: Option<PathBuf>,
    /// Access token (overrides ABSTRACT_TOKEN)
    #[arg(long)]
    token: Option<String>,
    /// API endpoint (overrides ABSTRACT_API_URL)
    #[arg(long)]
    api_url: Option<String>,
    /// Executable search path (overrides ABSTRACT_CLI_PATH)
    #[arg(long)]
    cli_path: Option<String>,
    /// Abort each invocation after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Behavior when the tool exits without printing JSON
    #[arg(long, value_enum)]
    empty_output: Option<EmptyOutput>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmptyOutput {
    Fail,
    Null,
    Wait,
}

impl From<EmptyOutput> for EmptyOutputPolicy {
    fn from(value: EmptyOutput) -> Self {
        match value {
            EmptyOutput::Fail => EmptyOutputPolicy::Fail,
            EmptyOutput::Null => EmptyOutputPolicy::Null,
            EmptyOutput::Wait => EmptyOutputPolicy::Wait,
        }
    }
}

#[derive(Args)]
struct BranchArgs {
    /// Project id
    project: String,
    /// Branch id
    branch: String,
}

#[derive(Args)]
struct FileArgs {
    #[command(flatten)]
    branch: BranchArgs,
    /// File id
    file: String,
    /// Commit sha, or "latest"
    #[arg(long, default_value = LATEST)]
    sha: String,
}

impl BranchArgs {
    fn descriptor(&self) -> BranchDescriptor {
        BranchDescriptor::new(self.project.clone(), self.branch.clone())
    }
}

impl FileArgs {
    fn descriptor(&self) -> FileDescriptor {
        self.branch.descriptor().file(self.sha.clone(), self.file.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List commits on a branch, optionally narrowed to a file or layer
    Commits {
        #[command(flatten)]
        branch: BranchArgs,
        #[arg(long)]
        file_id: Option<String>,
        #[arg(long, requires = "file_id")]
        layer_id: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one commit
    Commit {
        #[command(flatten)]
        branch: BranchArgs,
        /// Commit sha, or "latest"
        #[arg(default_value = LATEST)]
        sha: String,
    },
    /// Show the changeset of a commit
    Changeset {
        #[command(flatten)]
        branch: BranchArgs,
        /// Commit sha, or "latest"
        #[arg(default_value = LATEST)]
        sha: String,
    },
    /// List files on a branch
    Files {
        #[command(flatten)]
        branch: BranchArgs,
    },
    /// Show one file with its pages
    File {
        #[command(flatten)]
        file: FileArgs,
    },
    /// List the pages of a file, or of every file on a branch
    Pages {
        #[command(flatten)]
        branch: BranchArgs,
        /// File id; omit for the whole branch
        #[arg(long)]
        file: Option<String>,
        /// Commit sha, or "latest"
        #[arg(long, default_value = LATEST)]
        sha: String,
    },
    /// Show one page of a file
    Page {
        #[command(flatten)]
        file: FileArgs,
        /// Page id
        page: String,
    },
    /// List the layers of a file
    Layers {
        #[command(flatten)]
        file: FileArgs,
    },
    /// Show layer metadata
    Layer {
        #[command(flatten)]
        file: FileArgs,
        /// Layer id
        layer: String,
    },
    /// Show the rendered data of a layer
    Data {
        #[command(flatten)]
        file: FileArgs,
        /// Layer id
        layer: String,
    },
    /// List collections in a project
    Collections {
        /// Project id
        project: String,
        /// Only collections on this branch
        #[arg(long)]
        branch: Option<String>,
    },
    /// Show one collection
    Collection {
        /// Project id
        project: String,
        /// Collection id
        collection: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => settings::load_file(path)?,
        None => settings::FileSettings::default(),
    };
    let overrides = Overrides {
        cwd: cli.cwd.clone(),
        token: cli.token.clone(),
        api_url: cli.api_url.clone(),
        cli_path: cli.cli_path.clone(),
        timeout_ms: cli.timeout_ms,
        empty_output: cli.empty_output.map(Into::into),
    };
    let config = settings::build_config(file, |key| std::env::var(key).ok(), &overrides)?;
    debug!("Using configuration: {:?}", config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping abstract-cli");
            on_interrupt.cancel();
        }
    });

    let client = AbstractClient::new(config)?.with_cancellation(cancel);
    info!(
        "Using abstract-cli at {}",
        client.invoker().executable().display()
    );

    run(&client, cli.command).await
}

async fn run(
    client: &AbstractClient,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Commits {
            branch,
            file_id,
            layer_id,
            limit,
        } => {
            let branch = branch.descriptor();
            let options = CommitListOptions { limit };
            let commits = match (file_id, layer_id) {
                (Some(file_id), Some(layer_id)) => {
                    let layer = branch.file(LATEST, file_id).layer(layer_id);
                    client.commits().list(layer, options).await?
                }
                (Some(file_id), None) => {
                    client
                        .commits()
                        .list(branch.file(LATEST, file_id), options)
                        .await?
                }
                _ => client.commits().list(branch, options).await?,
            };
            print_json(&commits)
        }
        Commands::Commit { branch, sha } => {
            let commit = CommitDescriptor::new(branch.project, branch.branch, sha);
            print_json(&client.commits().info(commit).await?)
        }
        Commands::Changeset { branch, sha } => {
            let commit = CommitDescriptor::new(branch.project, branch.branch, sha);
            print_json(&client.changesets().info(&commit).await?)
        }
        Commands::Files { branch } => print_json(&client.files().list(&branch.descriptor()).await?),
        Commands::File { file } => print_json(&client.files().info(&file.descriptor()).await?),
        Commands::Pages { branch, file, sha } => {
            let branch = branch.descriptor();
            let pages = match file {
                Some(file_id) => client.pages().list(&branch.file(sha, file_id)).await?,
                None => client.pages().list_for_branch(&branch).await?,
            };
            print_json(&pages)
        }
        Commands::Page { file, page } => {
            let page = file.descriptor().page(page);
            match client.pages().info(&page).await? {
                Some(found) => print_json(&found),
                None => {
                    warn!("Page {} not found", page);
                    print_json(&serde_json::Value::Null)
                }
            }
        }
        Commands::Layers { file } => print_json(&client.layers().list(&file.descriptor()).await?),
        Commands::Layer { file, layer } => {
            let layer = file.descriptor().layer(layer);
            print_json(&client.layers().info(&layer).await?)
        }
        Commands::Data { file, layer } => {
            let layer = file.descriptor().layer(layer);
            print_json(&client.data().info(&layer).await?)
        }
        Commands::Collections { project, branch } => {
            let collections = match branch {
                Some(branch) => {
                    client
                        .collections()
                        .list(BranchDescriptor::new(project, branch))
                        .await?
                }
                None => {
                    client
                        .collections()
                        .list(ProjectDescriptor::new(project))
                        .await?
                }
            };
            print_json(&collections)
        }
        Commands::Collection {
            project,
            collection,
        } => {
            let collection = CollectionDescriptor::new(project, collection);
            print_json(&client.collections().info(&collection).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
