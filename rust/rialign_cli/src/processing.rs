use indicatif::{
    ProgressIterator,
    ProgressStyle,
};
use rialign::alignment::{
    AlignedRowSummary,
    MergeReport,
};
use rialign::library::LibraryMatch;
use rialign::models::{
    FeatureListInput,
    ListId,
};
use rialign::{
    AlignedFeatureList,
    AlignmentParameters,
    FeatureList,
    FeatureRow,
    LibraryEntry,
    LibrarySearch,
    ListAligner,
};
use serde::Serialize;
use std::fs::File;
use std::io::{
    BufReader,
    BufWriter,
};
use std::path::{
    Path,
    PathBuf,
};
use std::time::Instant;
use tracing::{
    info,
    instrument,
};

use crate::config::{
    Config,
    LibraryConfig,
    OutputConfig,
};
use crate::errors::CliError;

#[derive(Debug, Serialize)]
struct LibraryHit {
    name: String,
    score: f32,
    overlap: usize,
}

impl From<&LibraryMatch<'_>> for LibraryHit {
    fn from(x: &LibraryMatch<'_>) -> Self {
        Self {
            name: x.entry.name.clone(),
            score: x.similarity.score,
            overlap: x.similarity.overlap,
        }
    }
}

#[derive(Debug, Serialize)]
struct OutputRow {
    #[serde(flatten)]
    summary: AlignedRowSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    library_matches: Option<Vec<LibraryHit>>,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    parameters: &'a AlignmentParameters,
    merges: &'a [MergeReport],
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(CliError::io(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(CliError::json(path))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CliError> {
    let file = File::create(path).map_err(CliError::io(path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(CliError::json(path))
}

/// Reads one feature list per path. Ids follow the order of `paths`.
pub fn read_feature_lists(paths: &[PathBuf]) -> Result<Vec<FeatureList>, CliError> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let input: FeatureListInput = read_json(path)?;
            let list = FeatureList::from_input(ListId(i as u32), input);
            info!(
                "Loaded feature list {} with {} rows from {}",
                list.name(),
                list.len(),
                path.display()
            );
            Ok(list)
        })
        .collect()
}

/// Merges all lists in name order, one progress step per list.
#[instrument(skip_all)]
pub fn align_lists(
    mut lists: Vec<FeatureList>,
    parameters: &AlignmentParameters,
) -> Result<(AlignedFeatureList, Vec<MergeReport>), CliError> {
    lists.sort_by(|a, b| a.name().cmp(b.name()));
    let mut aligner = ListAligner::new(parameters)?;
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} lists ({eta})",
    )?;

    let reports = lists
        .iter()
        .progress_with_style(style)
        .map(|list| aligner.merge_list(list))
        .collect::<Result<Vec<MergeReport>, _>>()?;
    Ok((aligner.finish(), reports))
}

fn annotate(
    aligned: &AlignedFeatureList,
    library: &LibraryConfig,
) -> Result<Vec<Vec<LibraryHit>>, CliError> {
    let entries: Vec<LibraryEntry> = read_json(&library.path)?;
    info!(
        "Loaded {} library entries from {}",
        entries.len(),
        library.path.display()
    );
    let search = LibrarySearch::new(&entries, library.search.clone())?;
    let representatives: Vec<&FeatureRow> =
        aligned.rows().iter().map(|x| x.representative()).collect();
    let hits: Vec<Vec<LibraryHit>> = search
        .search_all(&representatives)
        .iter()
        .map(|matches| matches.iter().map(LibraryHit::from).collect())
        .collect();
    Ok(hits)
}

fn write_results(
    aligned: &AlignedFeatureList,
    reports: &[MergeReport],
    annotations: Option<Vec<Vec<LibraryHit>>>,
    parameters: &AlignmentParameters,
    output: &OutputConfig,
) -> Result<(), CliError> {
    let mut annotations = annotations.map(|x| x.into_iter());
    let rows: Vec<OutputRow> = aligned
        .summaries()
        .into_iter()
        .map(|summary| OutputRow {
            summary,
            library_matches: annotations.as_mut().and_then(|x| x.next()),
        })
        .collect();

    let rows_path = output.directory.join("aligned_rows.json");
    write_json(&rows_path, &rows)?;
    let report_path = output.directory.join("alignment_report.json");
    write_json(
        &report_path,
        &RunReport {
            parameters,
            merges: reports,
        },
    )?;
    info!(
        "Wrote {} consensus rows to {} and the run report to {}",
        rows.len(),
        rows_path.display(),
        report_path.display()
    );
    Ok(())
}

pub fn run(config: &Config, output: &OutputConfig) -> Result<(), CliError> {
    let start = Instant::now();
    let lists = read_feature_lists(&config.input.feature_lists)?;
    let n_rows: usize = lists.iter().map(|x| x.len()).sum();
    let (aligned, reports) = align_lists(lists, &config.alignment)?;

    let annotations = config
        .library
        .as_ref()
        .map(|library| annotate(&aligned, library))
        .transpose()?;

    write_results(&aligned, &reports, annotations, &config.alignment, output)?;
    println!(
        "Aligned {} rows from {} lists into {} consensus rows in {:?}",
        n_rows,
        aligned.lists().len(),
        aligned.len(),
        start.elapsed()
    );
    Ok(())
}
