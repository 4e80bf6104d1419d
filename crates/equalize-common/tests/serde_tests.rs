//! Serialized names of the shared enums, as they appear in reports and config.

use equalize_common::{Channel, FrameStage, PixelLayout};

#[test]
fn test_channel_names() {
    assert_eq!(serde_json::to_string(&Channel::Red).unwrap(), r#""red""#);
    assert_eq!(serde_json::to_string(&Channel::Blue).unwrap(), r#""blue""#);
    let parsed: Channel = serde_json::from_str(r#""green""#).unwrap();
    assert_eq!(parsed, Channel::Green);
}

#[test]
fn test_layout_names() {
    assert_eq!(serde_json::to_string(&PixelLayout::Rgba8).unwrap(), r#""rgba8""#);
    let parsed: PixelLayout = serde_json::from_str(r#""rgb8""#).unwrap();
    assert_eq!(parsed, PixelLayout::Rgb8);
    assert!(serde_json::from_str::<PixelLayout>(r#""bgr8""#).is_err());
}

#[test]
fn test_stage_names_match_display() {
    for stage in [FrameStage::Building, FrameStage::Mapping, FrameStage::Remapping] {
        let json = serde_json::to_string(&stage).unwrap();
        assert_eq!(json, format!("\"{}\"", stage.as_str()));
    }
}
