//! Tests for mapping table derivation.

use equalizer::{
    Channel, EqualizationMapper, HistogramBuilder, HistogramSnapshot, MappingMode, Rounding,
};
use test_utils::{assert_non_decreasing, fixtures, gradient_image, low_contrast_image, noise_image};

const MODES: [(MappingMode, Rounding); 4] = [
    (MappingMode::Normalized, Rounding::HalfUp),
    (MappingMode::Normalized, Rounding::HalfEven),
    (MappingMode::Cumulative, Rounding::HalfUp),
    (MappingMode::Cumulative, Rounding::HalfEven),
];

fn histogram_of(image: &equalizer::Image) -> HistogramSnapshot {
    HistogramBuilder::default().build(&image.view()).unwrap()
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_tables_are_non_decreasing() {
    let images = [
        noise_image(64, 64, 1),
        gradient_image(100, 30),
        low_contrast_image(50, 50, 90, 110),
        fixtures::two_levels_4x1().image,
    ];
    for image in &images {
        let histogram = histogram_of(image);
        for (mode, rounding) in MODES {
            let table = EqualizationMapper::new(mode, rounding).map(&histogram);
            for channel in Channel::ALL {
                assert_non_decreasing!(table.channel(channel));
            }
        }
    }
}

#[test]
fn test_brightest_occupied_level_maps_to_max() {
    let image = low_contrast_image(40, 40, 60, 90);
    let histogram = histogram_of(&image);
    for (mode, rounding) in MODES {
        let table = EqualizationMapper::new(mode, rounding).map(&histogram);
        for channel in Channel::ALL {
            let max = histogram.max_intensity(channel).unwrap();
            assert_eq!(table.get(channel, max), 255, "{:?} {}", mode, channel);
        }
    }
}

#[test]
fn test_normalized_darkest_level_maps_to_zero() {
    let image = low_contrast_image(40, 40, 60, 90);
    let histogram = histogram_of(&image);
    let table = EqualizationMapper::default().map(&histogram);
    for channel in Channel::ALL {
        let min = histogram.min_intensity(channel).unwrap();
        assert_eq!(table.get(channel, min), 0);
    }
}

#[test]
fn test_mapping_is_deterministic() {
    let histogram = histogram_of(&noise_image(80, 60, 77));
    let mapper = EqualizationMapper::default();
    assert_eq!(mapper.map(&histogram), mapper.map(&histogram));
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_extremes_scenario_table() {
    let scenario = fixtures::extremes_2x2();
    let histogram = histogram_of(&scenario.image);

    assert_eq!(histogram.count(Channel::Red, 0), 2);
    assert_eq!(histogram.count(Channel::Red, 255), 2);
    assert_eq!(histogram.cdf(Channel::Red)[0], 2);
    assert_eq!(histogram.cdf(Channel::Red)[255], 4);
    assert_eq!(histogram.cdf_min(Channel::Red), Some(2));

    let table = EqualizationMapper::default().map(&histogram);
    assert_eq!(table.get(Channel::Red, 0), 0);
    assert_eq!(table.get(Channel::Red, 255), 255);
    // Blue is constant 50
    assert!(table.is_degenerate(Channel::Blue));
    assert!(table.is_identity(Channel::Blue));
}

#[test]
fn test_two_levels_scenario_table() {
    let scenario = fixtures::two_levels_4x1();
    let histogram = histogram_of(&scenario.image);

    assert_eq!(histogram.cdf(Channel::Red)[10], 3);
    assert_eq!(histogram.cdf(Channel::Red)[200], 4);
    assert_eq!(histogram.cdf_min(Channel::Red), Some(3));

    let table = EqualizationMapper::default().map(&histogram);
    assert_eq!(table.get(Channel::Red, 10), 0);
    assert_eq!(table.get(Channel::Red, 200), 255);
}

#[test]
fn test_single_pixel_is_identity() {
    let scenario = fixtures::single_pixel();
    let histogram = histogram_of(&scenario.image);
    assert_eq!(histogram.cdf_min(Channel::Red), Some(histogram.total()));

    let table = EqualizationMapper::default().map(&histogram);
    for channel in Channel::ALL {
        assert!(table.is_identity(channel));
    }
}

#[test]
fn test_cumulative_mode_on_two_levels() {
    let histogram = histogram_of(&fixtures::two_levels_4x1().image);
    let table = EqualizationMapper::new(MappingMode::Cumulative, Rounding::HalfUp).map(&histogram);
    assert_eq!(table.get(Channel::Red, 9), 0);
    assert_eq!(table.get(Channel::Red, 10), 191);
    assert_eq!(table.get(Channel::Red, 199), 191);
    assert_eq!(table.get(Channel::Red, 200), 255);
}
