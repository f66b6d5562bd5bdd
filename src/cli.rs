use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "legicode",
    version,
    about = "Article and outline extraction for French legal-code PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Ingest(IngestArgs),
    Validate(ValidateArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/legicode")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub mapping_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/legicode")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    /// JSON table of LEGITEXT id -> {name, url}
    #[arg(long)]
    pub mapping_path: Option<PathBuf>,

    #[arg(long)]
    pub markdown_dir: Option<PathBuf>,

    #[arg(long)]
    pub structured_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    #[arg(long, default_value_t = false)]
    pub seed_page_chunks: bool,

    #[arg(long, default_value_t = false)]
    pub strip_repeated_edges: bool,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,

    #[arg(long, default_value_t = 1000)]
    pub max_chars: usize,

    #[arg(long, default_value_t = 150)]
    pub overlap: usize,

    #[arg(long, default_value_t = 14)]
    pub max_workers: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = ".cache/legicode")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub structured_dir: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub fail_on_issues: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/legicode")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub structured_dir: Option<PathBuf>,
}
