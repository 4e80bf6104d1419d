//! Fixed scenarios with hand-computed histograms and outputs.

use equalize_common::Image;

/// An input image and the red channel the default pipeline must produce.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub image: Image,
    pub expected_red: Vec<u8>,
}

/// 2x2, red `{0, 0, 255, 255}`: already spans the range, so it is unchanged.
pub fn extremes_2x2() -> Scenario {
    let image = Image::from_rgb_pixels(
        2,
        2,
        &[[0, 50, 50], [0, 60, 50], [255, 70, 50], [255, 80, 50]],
    )
    .expect("valid fixture");
    Scenario {
        name: "extremes_2x2",
        image,
        expected_red: vec![0, 0, 255, 255],
    }
}

/// 4x1, red `{10, 10, 10, 200}`: `cdf_min = 3`, so 10 -> 0 and 200 -> 255.
pub fn two_levels_4x1() -> Scenario {
    let image = Image::from_rgb_pixels(
        4,
        1,
        &[[10, 1, 2], [10, 1, 2], [10, 1, 2], [200, 1, 2]],
    )
    .expect("valid fixture");
    Scenario {
        name: "two_levels_4x1",
        image,
        expected_red: vec![0, 0, 0, 255],
    }
}

/// 1x1: `cdf_min == total`, identity path, output equals input.
pub fn single_pixel() -> Scenario {
    let image = Image::from_rgb_pixels(1, 1, &[[123, 45, 67]]).expect("valid fixture");
    Scenario {
        name: "single_pixel",
        image,
        expected_red: vec![123],
    }
}

/// Every fixed scenario.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![extremes_2x2(), two_levels_4x1(), single_pixel()]
}
