use growth_core::{Gender, GrowthConfig, Metric, Percentile, ReferenceRange, VitalsEntry};
use growth_percentile::{
    age_in_days, build_growth_curves, classify_value, derive_band, evaluate_vitals,
    extrapolate_range, format_age, interpolate_range, reference_series,
};
use proptest::prelude::*;

const ALL_METRICS: [Metric; 3] = [Metric::Weight, Metric::Height, Metric::HeadCircumference];
const ALL_GENDERS: [Gender; 2] = [Gender::Male, Gender::Female];

#[test]
fn newborn_boy_weight_band_matches_reference_row() {
    let band = derive_band(ReferenceRange { min: 2.5, max: 4.3 });

    assert_eq!(band.p3, 2.5);
    assert_eq!(band.p15, 2.77);
    assert_eq!(band.p50, 3.4);
    assert_eq!(band.p85, 3.67);
    assert_eq!(band.p97, 4.3);
}

#[test]
fn band_values_are_ordered_for_every_table_row() {
    for gender in ALL_GENDERS {
        for metric in ALL_METRICS {
            for point in reference_series(gender, metric) {
                let band = derive_band(ReferenceRange {
                    min: point.min,
                    max: point.max,
                });
                assert!(band.p3 <= band.p15);
                assert!(band.p15 <= band.p50);
                assert!(band.p50 <= band.p85);
                assert!(band.p85 <= band.p97);
            }
        }
    }
}

#[test]
fn interpolation_stays_inside_bracketing_points() {
    let series = reference_series(Gender::Male, Metric::Weight);

    for window in series.windows(2) {
        let (lower, upper) = (window[0], window[1]);
        let midpoint = (f64::from(lower.age_months) + f64::from(upper.age_months)) / 2.0;

        let range = interpolate_range(midpoint, series).expect("series is not empty");
        assert!(range.min >= lower.min && range.min <= upper.min);
        assert!(range.max >= lower.max && range.max <= upper.max);
    }
}

#[test]
fn interpolation_clamps_at_domain_boundaries() {
    let series = reference_series(Gender::Female, Metric::Height);
    let first = series[0];
    let last = series[series.len() - 1];

    let at_zero = interpolate_range(0.0, series).unwrap();
    assert_eq!(at_zero.min, first.min);
    assert_eq!(at_zero.max, first.max);

    let at_last = interpolate_range(f64::from(last.age_months), series).unwrap();
    assert_eq!(at_last.min, last.min);
    assert_eq!(at_last.max, last.max);
}

#[test]
fn extrapolation_is_continuous_at_the_table_seam() {
    for gender in ALL_GENDERS {
        for metric in ALL_METRICS {
            let series = reference_series(gender, metric);
            let last = series[series.len() - 1];

            let just_past = extrapolate_range(f64::from(last.age_months) + 1e-6, series);
            assert!((just_past.min - last.min).abs() < 1e-4);
            assert!((just_past.max - last.max).abs() < 1e-4);
        }
    }
}

#[test]
fn single_point_series_projects_flat() {
    let series = [growth_core::ReferenceDataPoint {
        age_months: 0,
        min: 2.5,
        max: 4.3,
    }];

    let interpolated = interpolate_range(1.0, &series).expect("series is not empty");
    assert_eq!(interpolated.min, 2.5);
    assert_eq!(interpolated.max, 4.3);

    let projected = extrapolate_range(18.0, &series);
    assert_eq!(projected.min, 2.5);
    assert_eq!(projected.max, 4.3);
}

#[test]
fn curves_cover_the_full_chart_domain() {
    let config = GrowthConfig::default();
    let curves = build_growth_curves(Gender::Male, &config);

    for metric_curves in [&curves.weight, &curves.height, &curves.head_circumference] {
        assert_eq!(metric_curves.p3.len(), 25);
        assert_eq!(metric_curves.p15.len(), 25);
        assert_eq!(metric_curves.p50.len(), 25);
        assert_eq!(metric_curves.p85.len(), 25);
        assert_eq!(metric_curves.p97.len(), 25);
    }
}

#[test]
fn newborn_boy_weight_three_kilograms_sits_in_the_median_band() {
    let percentile = classify_value(3.0, 0, Metric::Weight, Gender::Male);
    assert_eq!(percentile, Some(Percentile::P50));
}

#[test]
fn values_above_the_envelope_clamp_to_p97() {
    let percentile = classify_value(10.0, 0, Metric::Weight, Gender::Male);
    assert_eq!(percentile, Some(Percentile::P97));
}

#[test]
fn non_finite_values_are_not_classified() {
    assert_eq!(classify_value(f64::NAN, 0, Metric::Weight, Gender::Male), None);
    assert_eq!(
        classify_value(f64::INFINITY, 30, Metric::Height, Gender::Female),
        None
    );
}

#[test]
fn age_unit_is_inferred_from_magnitude() {
    assert_eq!(age_in_days("2"), Some(730));
    assert_eq!(age_in_days("10"), Some(300));
    assert_eq!(age_in_days("300"), Some(300));
    assert_eq!(age_in_days("0.5"), Some(183));
    assert_eq!(age_in_days("không rõ"), None);
    assert_eq!(age_in_days("-1"), None);
}

#[test]
fn ages_render_as_compact_labels() {
    assert_eq!(format_age(8), "8d");
    assert_eq!(format_age(45), "1m 15d");
    assert_eq!(format_age(60), "2m");
    assert_eq!(format_age(400), "1y 1m");
    assert_eq!(format_age(730), "2y");
}

#[test]
fn vitals_entry_becomes_a_classified_record() {
    let entry = VitalsEntry {
        date: chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        gender: Gender::Male,
        raw_age: "2".to_string(),
        weight: Some(12.5),
        height: Some(87.0),
        head_circumference: None,
        notes: "khám định kỳ".to_string(),
    };

    let record = evaluate_vitals(&entry).expect("entry is complete");
    assert_eq!(record.age_in_days, 730);
    assert_eq!(record.age_formatted, "2y");
    assert!(record.weight_percentile.is_some());
    assert!(record.height_percentile.is_some());
    assert_eq!(record.head_circumference_percentile, None);
}

#[test]
fn incomplete_vitals_entries_are_skipped() {
    let entry = VitalsEntry {
        date: chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        gender: Gender::Female,
        raw_age: "6".to_string(),
        weight: Some(7.2),
        height: None,
        head_circumference: None,
        notes: String::new(),
    };

    assert_eq!(evaluate_vitals(&entry), None);
}

proptest! {
    #[test]
    fn classification_is_monotone_in_value(
        v1 in 0.1f64..25.0,
        v2 in 0.1f64..25.0,
        age in 0u32..1500,
    ) {
        let (low, high) = if v1 <= v2 { (v1, v2) } else { (v2, v1) };

        let low_label = classify_value(low, age, Metric::Weight, Gender::Female).unwrap();
        let high_label = classify_value(high, age, Metric::Weight, Gender::Female).unwrap();
        prop_assert!(low_label <= high_label);
    }

    #[test]
    fn interpolated_ranges_keep_min_below_max(
        age in 0.0f64..36.0,
    ) {
        for gender in ALL_GENDERS {
            for metric in ALL_METRICS {
                let series = reference_series(gender, metric);
                let range = interpolate_range(age, series).unwrap();
                prop_assert!(range.min < range.max);
            }
        }
    }
}
