use rialign::models::{
    DataPoint,
    FeatureListInput,
    FeatureRowInput,
    FragmentScan,
    ListId,
    RetentionIndexColumn,
};
use rialign::similarity::{
    CosineParameters,
    SimilarityFunction,
};
use rialign::{
    AlignmentParameters,
    FeatureList,
    LibraryEntry,
    LibrarySearch,
    ListAligner,
    RetentionIndexRecord,
    RetentionIndexTolerance,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const N_COMPOUNDS: usize = 30;
const N_RUNS: u32 = 4;

fn compound_ri(k: usize) -> f32 {
    // Pairs of co-eluting compounds, pairs 37 RI units apart
    1000.0 + 37.0 * (k / 2) as f32
}

fn compound_spectrum(k: usize, run: u32) -> Vec<DataPoint> {
    let offset = if k % 2 == 0 { 40.0 } else { 500.0 };
    (0..6)
        .map(|j| DataPoint {
            mz: offset + ((k * 3 + j * 11) % 400) as f64,
            intensity: 1000.0 / (j as f32 + 1.0) * (1.0 + 0.05 * ((run as usize + j) % 3) as f32),
        })
        .collect()
}

fn simulated_run(run: u32) -> FeatureList {
    let rows = (0..N_COMPOUNDS)
        .filter(|k| (k + run as usize) % 5 != 0)
        .map(|k| {
            let jitter = ((k * 13 + run as usize * 7) % 7) as f32 - 3.0;
            FeatureRowInput {
                // m/z doubles as the compound label
                average_mz: 100.0 + k as f64,
                average_ri: Some(compound_ri(k) + jitter),
                height: 1000.0 + run as f32,
                most_intense_fragment_scan: Some(FragmentScan {
                    ms_level: 1,
                    mass_list: Some(compound_spectrum(k, run)),
                }),
            }
        })
        .collect();
    FeatureList::new(ListId(run), format!("run_{run}"), rows)
}

fn parameters() -> AlignmentParameters {
    AlignmentParameters {
        ri_tolerance: RetentionIndexTolerance::try_new(10.0, RetentionIndexColumn::Default, true)
            .unwrap(),
        similarity: SimilarityFunction::CompositeCosine(CosineParameters {
            min_matched_signals: 3,
            ..CosineParameters::nist_gc()
        }),
        ..AlignmentParameters::default()
    }
}

#[test]
fn test_simulated_runs_align_by_compound() {
    let lists: Vec<FeatureList> = (0..N_RUNS).rev().map(simulated_run).collect();
    let n_rows: usize = lists.iter().map(|x| x.len()).sum();

    let aligned =
        ListAligner::align(lists, &parameters(), Arc::new(AtomicBool::new(false))).unwrap();

    assert!(!aligned.is_cancelled());
    assert_eq!(aligned.lists().len(), N_RUNS as usize);
    assert_eq!(aligned.lists()[0].name, "run_0");
    assert_eq!(aligned.len(), N_COMPOUNDS);

    let mut seen = HashSet::new();
    for row in aligned.rows() {
        let label = row.members()[0].average_mz;
        assert!(row.members().iter().all(|x| x.average_mz == label));

        let lists: HashSet<ListId> = row.members().iter().map(|x| x.id.list).collect();
        assert_eq!(lists.len(), row.members().len());
        for member in row.members() {
            assert!(seen.insert(member.id), "Row {} aligned twice", member.id);
        }
    }
    assert_eq!(seen.len(), n_rows);

    let full = aligned
        .alignment_scores()
        .iter()
        .filter(|x| x.rate == 1.0)
        .count();
    // Compounds that no run dropped
    let expected_full = (0..N_COMPOUNDS)
        .filter(|k| (0..N_RUNS).all(|r| (k + r as usize) % 5 != 0))
        .count();
    assert_eq!(full, expected_full);
    assert!(aligned.alignment_scores().iter().all(|x| x.max_ri_delta.unwrap() <= 6.0));
}

#[test]
fn test_alignment_is_repeatable() {
    let run = || {
        let lists: Vec<FeatureList> = (0..N_RUNS).map(simulated_run).collect();
        let aligned =
            ListAligner::align(lists, &parameters(), Arc::new(AtomicBool::new(false))).unwrap();
        aligned
            .summaries()
            .into_iter()
            .map(|x| x.members)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_feature_lists_from_json() {
    let inputs: Vec<FeatureListInput> = serde_json::from_str(
        r#"[
            {"name": "b", "rows": [
                {"average_mz": 73.0, "average_ri": 1204.0, "height": 10.0,
                 "most_intense_fragment_scan": {"ms_level": 1, "mass_list": [
                    {"mz": 73.0, "intensity": 100.0}, {"mz": 147.0, "intensity": 40.0},
                    {"mz": 221.0, "intensity": 12.0}, {"mz": 295.0, "intensity": 3.0}]}}
            ]},
            {"name": "a", "rows": [
                {"average_mz": 73.0, "average_ri": 1200.0, "height": 20.0,
                 "most_intense_fragment_scan": {"ms_level": 1, "mass_list": [
                    {"mz": 73.0, "intensity": 100.0}, {"mz": 147.0, "intensity": 42.0},
                    {"mz": 221.0, "intensity": 10.0}, {"mz": 295.0, "intensity": 4.0}]}},
                {"average_mz": 91.0}
            ]}
        ]"#,
    )
    .unwrap();
    let lists: Vec<FeatureList> = inputs
        .into_iter()
        .enumerate()
        .map(|(i, x)| FeatureList::from_input(ListId(i as u32), x))
        .collect();

    let aligned = ListAligner::align(
        lists,
        &AlignmentParameters::default(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert_eq!(aligned.len(), 2);
    let first = &aligned.rows()[0];
    assert_eq!(first.members().len(), 2);
    assert_eq!(first.average_ri(), Some(1202.0));
    // Most intense member stands in for the consensus row
    assert_eq!(first.representative().id.list, ListId(1));
}

#[test]
fn test_library_annotation_of_consensus_rows() {
    let lists: Vec<FeatureList> = (0..2).map(simulated_run).collect();
    let aligned =
        ListAligner::align(lists, &parameters(), Arc::new(AtomicBool::new(false))).unwrap();

    let library: Vec<LibraryEntry> = (0..N_COMPOUNDS)
        .map(|k| LibraryEntry {
            name: format!("compound_{k}"),
            ri: Some(RetentionIndexRecord::parse(&format!("s={} n=1", compound_ri(k)))),
            spectrum: compound_spectrum(k, 0),
        })
        .collect();
    let search_params = rialign::library::LibrarySearchParameters {
        ri_tolerance: RetentionIndexTolerance::try_new(10.0, RetentionIndexColumn::Semipolar, true)
            .unwrap(),
        ..Default::default()
    };
    let search = LibrarySearch::new(&library, search_params).unwrap();

    for row in aligned.rows() {
        let hits = search.search(row.representative());
        let k = (row.average_mz() - 100.0).round() as usize;
        assert_eq!(hits[0].entry.name, format!("compound_{k}"));
    }
}
