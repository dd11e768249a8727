mod common;

use common::*;
use nfc_locator::config::ValidationConfig;
use nfc_locator::dataset::RawGeometry;
use nfc_locator::{check_geometries, mark_record, read_geometries};

#[test]
fn marked_frame_becomes_a_record() -> anyhow::Result<()> {
    let config = DetectorConfig::default();
    let record = mark_record("Google", "Pixel 8", (360, 780), &Rect::new(120, 200, 80, 60), &config)
        .expect("marker should be accepted");

    assert_eq!(record.device.brand, "GOOGLE");
    assert_eq!(record.device.model, "PIXEL 8");
    assert_eq!(record.device.ratio, 2.1667);
    assert_eq!(record.nfc_location.top, 0.2564);
    assert_eq!(record.nfc_location.left, 0.3333);
    assert_eq!(record.nfc_location.width, 0.2222);
    assert_eq!(record.nfc_location.height, 0.0769);

    let value = serde_json::to_value(&record)?;
    assert_eq!(value["device"]["ratio"], 2.1667);
    assert_eq!(value["nfcLocation"]["top"], 0.2564);
    Ok(())
}

#[test]
fn marking_on_a_square_frame_is_rejected() {
    let result = mark_record("A", "B", (800, 800), &Rect::new(10, 10, 50, 50), &DetectorConfig::default());
    assert_eq!(result, Err(AnomalyReason::AbnormalDeviceAspectRatio));
}

#[test]
fn marking_outside_the_frame_is_rejected() {
    let result = mark_record("A", "B", (360, 780), &Rect::new(300, 10, 61, 50), &DetectorConfig::default());
    assert_eq!(result, Err(AnomalyReason::MarkerOutOfBounds));
}

#[test]
fn single_geometry_object_is_accepted() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("one.json");
    std::fs::write(
        &path,
        r#"{ "top": 1, "left": 1, "width": 10, "height": 10, "deviceWidth": 400, "deviceHeight": 800 }"#,
    )?;

    let geometries = read_geometries(&path)?;
    assert_eq!(geometries.len(), 1);
    let verdicts = check_geometries(&geometries, &ValidationConfig::default());
    let accepted = verdicts[0].expect("geometry should pass");
    assert_eq!(accepted.device_aspect, 0.5);
    Ok(())
}

#[test]
fn geometry_array_keeps_order_and_flags_missing_fields() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("many.json");
    std::fs::write(
        &path,
        r#"[
            { "top": 1, "left": 1, "width": 10, "height": 10, "deviceWidth": 400, "deviceHeight": 800 },
            { "top": 1, "left": 1, "width": 10, "deviceWidth": 400, "deviceHeight": 800 },
            { "top": 1, "left": 1, "width": 320, "height": 320, "deviceWidth": 400, "deviceHeight": 800 }
        ]"#,
    )?;

    let geometries = read_geometries(&path)?;
    assert_eq!(geometries.len(), 3);
    assert_eq!(geometries[1].height, None);

    let verdicts = check_geometries(&geometries, &ValidationConfig::default());
    assert!(verdicts[0].is_ok());
    assert_eq!(verdicts[1], Err(AnomalyReason::IncompleteData));
    assert_eq!(verdicts[2], Err(AnomalyReason::MarkerAreaTooLarge));
    Ok(())
}

#[test]
fn empty_object_is_incomplete() {
    let verdicts = check_geometries(&[RawGeometry::default()], &ValidationConfig::default());
    assert_eq!(verdicts, vec![Err(AnomalyReason::IncompleteData)]);
}
