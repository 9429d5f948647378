//! Index construction and structural invariants.

use rstest::rstest;

use super::fixtures::{PLANE_POINTS, build_index, plane_index, uniform_vectors};
use crate::{
    DistanceMetric, l2_norm,
    hnsw::{HnswIndex, HnswInvariant, HnswParams},
};

#[rstest]
fn plane_build_satisfies_all_invariants(plane_index: HnswIndex) {
    assert_eq!(plane_index.len(), PLANE_POINTS.len());
    plane_index
        .invariants()
        .check_all()
        .expect("graph must be valid");
    assert!(plane_index.invariants().collect_all().is_empty());
}

#[rstest]
#[case(2, 0)]
#[case(4, 16)]
#[case(8, 64)]
fn degree_bounds_and_layering_hold_under_pruning(
    #[case] max_connections: usize,
    #[case] ef_construction: usize,
) {
    let vectors = uniform_vectors(200, 4, 11);
    let index = build_index(
        &vectors,
        max_connections,
        ef_construction,
        DistanceMetric::L2,
        5,
    );
    index
        .invariants()
        .check_many([HnswInvariant::LayerConsistency, HnswInvariant::DegreeBounds])
        .expect("degree bounds and layering must hold");
}

#[rstest]
fn ids_are_dense_and_labels_round_trip() {
    let params = HnswParams::new(2, 4, 8).expect("params");
    let index = HnswIndex::with_capacity(params, 3).expect("capacity");
    assert!(index.is_empty());
    assert_eq!(index.insert(&[0.0, 0.0], 70).expect("insert"), 0);
    assert_eq!(index.insert(&[1.0, 0.0], 71).expect("insert"), 1);
    assert_eq!(index.insert(&[2.0, 0.0], 70).expect("insert"), 2);
    assert_eq!(index.len(), 3);
    assert_eq!(index.label(1), Some(71));
    assert_eq!(index.vector(2), Some(&[2.0, 0.0][..]));
    assert_eq!(index.ids_for_label(70), vec![0, 2]);
    assert!(index.ids_for_label(99).is_empty());
}

#[rstest]
fn cosine_index_stores_unit_vectors() {
    let index = build_index(
        &[vec![3.0, 4.0], vec![0.0, 2.0]],
        4,
        8,
        DistanceMetric::Cosine,
        1,
    );
    for id in 0..2 {
        let stored = index.vector(id).expect("stored vector");
        assert!((l2_norm(stored) - 1.0).abs() < 1e-6);
    }
    let first = index.vector(0).expect("stored vector");
    assert!((first[0] - 0.6).abs() < 1e-6);
    assert!((first[1] - 0.8).abs() < 1e-6);
}

#[rstest]
fn equal_seeds_build_identical_graphs() {
    let vectors = uniform_vectors(150, 6, 3);
    let queries = uniform_vectors(10, 6, 4);
    let left = build_index(&vectors, 6, 32, DistanceMetric::L2, 77);
    let right = build_index(&vectors, 6, 32, DistanceMetric::L2, 77);
    for query in &queries {
        let a = left.search(query, 5).expect("search");
        let b = right.search(query, 5).expect("search");
        assert_eq!(a, b);
    }
}

#[rstest]
fn max_level_zero_keeps_a_flat_graph() {
    let params = HnswParams::new(1, 4, 16)
        .expect("params")
        .with_max_level(0);
    let index = HnswIndex::with_capacity(params, 32).expect("capacity");
    for value in 0..32_u16 {
        index.insert(&[f32::from(value)], u64::from(value)).expect("insert");
    }
    let entry = index.graph().entry().expect("entry").expect("populated");
    assert_eq!(entry.level, 0);
    assert_eq!(entry.node, 0);
}
