use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Align GC-MS feature lists by retention index", long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Feature list JSON file, repeat for every run (will over-write the config file)
    #[arg(short, long = "feature-list")]
    pub feature_lists: Vec<PathBuf>,

    /// Spectral library JSON file used to annotate the consensus rows
    #[arg(short, long)]
    pub library: Option<PathBuf>,

    /// Path to the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Write a template configuration to this path and exit
    #[arg(long)]
    pub write_template: Option<PathBuf>,
}
