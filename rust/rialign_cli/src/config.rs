use rialign::AlignmentParameters;
use rialign::library::LibrarySearchParameters;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::{
    Path,
    PathBuf,
};

use crate::cli::Cli;
use crate::errors::CliError;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub alignment: AlignmentParameters,
    #[serde(default)]
    pub library: Option<LibraryConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct InputConfig {
    /// One JSON file per run.
    pub feature_lists: Vec<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LibraryConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub search: LibrarySearchParameters,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

pub const CONFIG_TEMPLATE: &str = r#"{
  "input": {
    "feature_lists": ["run_a.json", "run_b.json"]
  },
  "alignment": {
    "mz_tolerance": { "da": [0.5, 0.5] },
    "ri_tolerance": { "window": 10.0, "column": "default", "ignore_missing": true },
    "ri_weight": 0.5,
    "similarity": {
      "type": "composite_cosine",
      "mz_weight": 1.3,
      "intensity_weight": 0.53,
      "min_matched_signals": 4
    }
  },
  "output": { "directory": "rialign_results" }
}"#;

impl Config {
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let file = std::fs::File::open(path).map_err(CliError::io(path))?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(CliError::json(path))
    }

    /// Flags given on the command line replace the matching config entries.
    pub fn with_cli_args(mut self, args: &Cli) -> Self {
        if !args.feature_lists.is_empty() {
            self.input.feature_lists = args.feature_lists.clone();
        }
        if let Some(path) = &args.library {
            match &mut self.library {
                Some(library) => library.path = path.clone(),
                None => {
                    self.library = Some(LibraryConfig {
                        path: path.clone(),
                        search: LibrarySearchParameters::default(),
                    })
                }
            }
        }
        if let Some(directory) = &args.output_dir {
            self.output = Some(OutputConfig {
                directory: directory.clone(),
            });
        }
        self
    }

    pub fn validate(&self) -> Result<(), CliError> {
        if self.input.feature_lists.is_empty() {
            return Err(CliError::Config(
                "No feature lists provided, please provide them in either the config file or with --feature-list".to_string(),
            ));
        }
        if self.output.is_none() {
            return Err(CliError::Config(
                "No output directory provided, please provide one in either the config file or with --output-dir".to_string(),
            ));
        }
        self.alignment.validate()?;
        Ok(())
    }
}
