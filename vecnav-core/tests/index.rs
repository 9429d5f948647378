//! End-to-end behaviour of the public index API.

use std::thread;

use rstest::{fixture, rstest};
use vecnav_core::{DistanceMetric, HnswError, HnswIndex, HnswParams};

const POINTS: [[f32; 2]; 10] = [
    [1.2, 3.4],
    [2.1, 4.5],
    [0.5, 1.7],
    [3.3, 2.2],
    [4.8, 5.6],
    [7.1, 8.2],
    [9.0, 0.4],
    [6.3, 3.5],
    [2.9, 7.8],
    [5.0, 1.1],
];

fn open(metric: &str, capacity: usize) -> Result<HnswIndex, HnswError> {
    let metric: DistanceMetric = metric.parse()?;
    let params = HnswParams::new(2, 5, 100)?
        .with_rng_seed(100)
        .with_metric(metric);
    HnswIndex::with_capacity(params, capacity)
}

#[fixture]
fn populated() -> HnswIndex {
    let index = open("l2", 100).expect("index must open");
    for (label, point) in POINTS.iter().enumerate() {
        index.insert(point, label as u64).expect("insert must succeed");
    }
    index
}

#[rstest]
fn nearest_five_to_first_point(populated: HnswIndex) {
    populated
        .set_ef_construction(POINTS.len() as i64)
        .expect("valid breadth");
    let hits = populated.search(&POINTS[0], 5).expect("search must succeed");
    let mut found: Vec<u64> = hits.iter().map(|hit| hit.label).collect();
    found.sort_unstable();
    assert_eq!(found, vec![0, 1, 2, 3, 4]);
    assert_eq!(hits[0].label, 0);
    assert!(hits.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
}

#[rstest]
fn distances_use_squared_euclidean(populated: HnswIndex) {
    populated.set_ef(POINTS.len());
    let hits = populated.search(&[1.2, 3.4], 2).expect("search must succeed");
    assert_eq!(hits[1].label, 1);
    assert!((hits[1].distance - 2.02).abs() < 1e-4);
}

#[rstest]
fn unknown_metric_is_rejected() {
    let err = open("chebyshev", 10).expect_err("unknown metric");
    assert!(matches!(err, HnswError::InvalidParameters { .. }));
}

#[rstest]
fn cosine_search_ignores_magnitude() {
    let index = open("cosine", 4).expect("index must open");
    index.insert(&[10.0, 0.0], 1).expect("insert");
    index.insert(&[0.0, 0.5], 2).expect("insert");
    index.insert(&[-3.0, -3.0], 3).expect("insert");
    let hits = index.search(&[0.01, 0.0], 3).expect("search");
    let labels: Vec<u64> = hits.iter().map(|hit| hit.label).collect();
    assert_eq!(labels, vec![1, 2, 3]);
    assert!(hits[0].distance.abs() < 1e-6);
}

#[rstest]
fn parallel_batch_then_threaded_searches() {
    let items: Vec<(u64, Vec<f32>)> = (0..256_u16)
        .map(|i| {
            let x = f32::from(i % 16);
            let y = f32::from(i / 16);
            (u64::from(i), vec![x, y])
        })
        .collect();
    let params = HnswParams::new(2, 16, 100).expect("params must be valid");
    let index = HnswIndex::with_capacity(params, items.len()).expect("capacity");
    index.insert_batch(&items).expect("batch insert must succeed");
    assert_eq!(index.len(), items.len());
    index.set_ef(64);

    thread::scope(|scope| {
        for worker in 0..4_u16 {
            let index = &index;
            scope.spawn(move || {
                let x = f32::from(worker * 3);
                let hits = index.search(&[x, 7.0], 1).expect("search must succeed");
                assert_eq!(hits[0].distance, 0.0);
            });
        }
    });
}

#[rstest]
fn index_drops_cleanly_after_use(populated: HnswIndex) {
    assert_eq!(populated.len(), POINTS.len());
    drop(populated);
}
