//! Public distance helpers.

use proptest::prelude::*;
use rstest::rstest;
use vecnav_core::{
    DistanceError, DistanceMetric, inner_product_distance, l2_norm, normalise,
    squared_euclidean, validate_components,
};

#[rstest]
#[case(&[0.0, 0.0], &[3.0, 4.0], 25.0)]
#[case(&[1.0, -1.0, 2.0], &[1.0, -1.0, 2.0], 0.0)]
#[case(&[-2.0], &[2.0], 16.0)]
fn squared_euclidean_matches_hand_computed_values(
    #[case] left: &[f32],
    #[case] right: &[f32],
    #[case] expected: f32,
) {
    assert_eq!(squared_euclidean(left, right), expected);
    assert_eq!(DistanceMetric::L2.distance(left, right), expected);
}

#[rstest]
fn inner_product_is_one_minus_dot() {
    assert_eq!(inner_product_distance(&[1.0, 2.0], &[3.0, 4.0]), -10.0);
    assert_eq!(inner_product_distance(&[1.0, 0.0], &[0.0, 1.0]), 1.0);
    assert_eq!(
        DistanceMetric::Cosine.distance(&[0.6, 0.8], &[0.6, 0.8]),
        DistanceMetric::InnerProduct.distance(&[0.6, 0.8], &[0.6, 0.8]),
    );
}

#[rstest]
#[case("l2", DistanceMetric::L2)]
#[case("IP", DistanceMetric::InnerProduct)]
#[case(" cosine ", DistanceMetric::Cosine)]
fn metrics_parse_from_names(#[case] raw: &str, #[case] expected: DistanceMetric) {
    let parsed: DistanceMetric = raw.parse().expect("known metric");
    assert_eq!(parsed, expected);
    assert_eq!(parsed.to_string().parse::<DistanceMetric>(), Ok(expected));
}

#[rstest]
fn unknown_metric_names_fail_explicitly() {
    let err = "hamming".parse::<DistanceMetric>().expect_err("unknown metric");
    assert_eq!(
        err,
        DistanceError::UnknownMetric {
            provided: "hamming".into()
        }
    );
}

#[rstest]
fn only_cosine_requires_normalisation() {
    assert!(DistanceMetric::Cosine.requires_normalisation());
    assert!(!DistanceMetric::L2.requires_normalisation());
    assert!(!DistanceMetric::InnerProduct.requires_normalisation());
    assert_eq!(DistanceMetric::default(), DistanceMetric::L2);
}

#[rstest]
fn validate_components_reports_first_bad_index() {
    assert_eq!(validate_components(&[1.0, 2.0]), Ok(()));
    let err = validate_components(&[1.0, f32::NEG_INFINITY, f32::NAN]).expect_err("non-finite");
    assert!(matches!(err, DistanceError::NonFinite { index: 1, .. }));
}

#[rstest]
fn normalise_rejects_zero_vectors_untouched() {
    let mut zero = [0.0_f32; 4];
    assert_eq!(normalise(&mut zero), Err(DistanceError::ZeroMagnitude));
    assert_eq!(zero, [0.0; 4]);
}

proptest! {
    #[test]
    fn normalised_vectors_have_unit_length(
        mut vector in prop::collection::vec(-1.0e3_f32..1.0e3, 1..32)
            .prop_filter("needs a non-zero magnitude", |v| l2_norm(v) > 1.0e-3),
    ) {
        normalise(&mut vector).expect("non-zero vector");
        prop_assert!((l2_norm(&vector) - 1.0).abs() < 1.0e-4);
        let self_distance = inner_product_distance(&vector, &vector);
        prop_assert!(self_distance.abs() < 1.0e-4);
    }

    #[test]
    fn squared_euclidean_is_symmetric_and_non_negative(
        pair in (1_usize..16).prop_flat_map(|dim| (
            prop::collection::vec(-1.0e3_f32..1.0e3, dim),
            prop::collection::vec(-1.0e3_f32..1.0e3, dim),
        )),
    ) {
        let (left, right) = pair;
        let forward = squared_euclidean(&left, &right);
        prop_assert!(forward >= 0.0);
        prop_assert_eq!(forward, squared_euclidean(&right, &left));
    }
}
