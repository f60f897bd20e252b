mod common;
use common::*;

use coincount::dataset::{
    self, GroundTruth, load_ground_truth, parse_ground_truth_json, read_image_list,
    select_ground_truth,
};

#[test]
fn test_image_list_deduplicates_in_order() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_file(dir.path(), "list.txt", "b.jpg a.jpg\n\nb.jpg\tc/d.jpg\n a.jpg");

    let names = read_image_list(&path)?;
    assert_eq!(names, vec!["b.jpg", "a.jpg", "c/d.jpg"]);
    Ok(())
}

#[test]
fn test_blank_image_list_is_empty_input() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_file(dir.path(), "list.txt", "  \n\t\n");

    assert!(matches!(read_image_list(&path), Err(CoinError::EmptyInput(_))));
    Ok(())
}

#[test]
fn test_missing_image_list_is_not_found() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let result = read_image_list(&dir.path().join("nope.txt"));
    assert!(matches!(result, Err(CoinError::NotFound(_))));
    Ok(())
}

#[test]
fn test_ground_truth_json_with_unknown_values() -> anyhow::Result<()> {
    let text = r#"{
        "a.jpg": {"nbCoins": 4, "totalValue": 2.35},
        "b.jpg": {"nbCoins": 1, "totalValue": NaN},
        "c.jpg": {"nbCoins": 0, "totalValue": "NaN"},
        "d.jpg": {"nbCoins": 2, "totalValue": null}
    }"#;
    let truth = parse_ground_truth_json(text)?;

    assert_eq!(truth.len(), 4);
    assert_eq!(truth["a.jpg"], GroundTruth { coin_count: 4, total_value: Some(2.35) });
    assert_eq!(truth["b.jpg"].total_value, None);
    assert_eq!(truth["c.jpg"].total_value, None);
    assert_eq!(truth["d.jpg"].coin_count, 2);
    assert_eq!(truth["d.jpg"].total_value, None);
    Ok(())
}

#[test]
fn test_malformed_ground_truth_is_parse_error() {
    for text in [
        "not json at all",
        r#"{"a.jpg": {"totalValue": 1.0}}"#,
        r#"{"a.jpg": {"nbCoins": -1, "totalValue": 1.0}}"#,
        r#"["a.jpg"]"#,
    ] {
        assert!(
            matches!(parse_ground_truth_json(text), Err(CoinError::Parse(_))),
            "expected a parse error for {text}"
        );
    }
}

#[test]
fn test_missing_spreadsheet_is_not_found() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let result = load_ground_truth(&dir.path().join("truth.xlsx"));
    assert!(matches!(result, Err(CoinError::NotFound(_))));
    Ok(())
}

#[test]
fn test_spreadsheet_ground_truth_keys_and_values() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_spreadsheet(
        dir.path(),
        "truth.xlsx",
        &[
            ("IMG_1.jpg", 4.0, Some(2.5), "group1"),
            ("IMG_2.jpg", 2.0, None, "group2"),
            ("IMG_3.jpg", 0.0, Some(0.0), ""),
        ],
    );

    let truth = load_ground_truth(&path)?;
    assert_eq!(truth.len(), 3, "header row must not become an entry: {truth:?}");
    assert_eq!(truth["group1/IMG_1.jpg"], GroundTruth { coin_count: 4, total_value: Some(2.5) });
    assert_eq!(truth["group2/IMG_2.jpg"], GroundTruth { coin_count: 2, total_value: None });
    assert_eq!(truth["IMG_3.jpg"], GroundTruth { coin_count: 0, total_value: Some(0.0) });
    assert!(!truth.contains_key("Image"));
    Ok(())
}

#[test]
fn test_spreadsheet_fractional_count_is_parse_error() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_spreadsheet(
        dir.path(),
        "truth.xlsx",
        &[("IMG_1.jpg", 4.0, Some(1.0), ""), ("IMG_2.jpg", 2.5, Some(1.0), "")],
    );

    match load_ground_truth(&path) {
        Err(CoinError::Parse(msg)) => assert!(msg.contains("row 3"), "{msg}"),
        other => panic!("expected a parse error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_select_ground_truth_requires_every_image() -> anyhow::Result<()> {
    let truth = parse_ground_truth_json(
        r#"{"a.jpg": {"nbCoins": 1, "totalValue": 1.0}, "extra.jpg": {"nbCoins": 9, "totalValue": 9.0}}"#,
    )?;
    let names = vec!["a.jpg".to_string(), "b.jpg".to_string()];

    match select_ground_truth(truth.clone(), &names) {
        Err(CoinError::MissingGroundTruth(name)) => assert_eq!(name, "b.jpg"),
        other => panic!("expected missing ground truth, got {other:?}"),
    }

    let selected = select_ground_truth(truth, &names[..1])?;
    assert_eq!(selected, vec![GroundTruth { coin_count: 1, total_value: Some(1.0) }]);
    Ok(())
}

#[test]
fn test_missing_ground_truth_fails_before_images_are_touched() -> anyhow::Result<()> {
    // No image file is written: the ground truth check must come first
    let files = write_dataset(&[Entry { name: "a.jpg", image: None, coins: 1, value: Some(1.0) }]);
    let list = write_file(files.dir.path(), "list.txt", "a.jpg\nunlabelled.jpg");

    let result = dataset::load_dataset(&list, &files.image_dir, &files.ground_truth);
    assert!(matches!(result, Err(CoinError::MissingGroundTruth(name)) if name == "unlabelled.jpg"));
    Ok(())
}

#[test]
fn test_unresolved_image_is_not_found() {
    let files = write_dataset(&[Entry { name: "ghost.png", image: None, coins: 2, value: None }]);
    let result = dataset::load_dataset(&files.image_list, &files.image_dir, &files.ground_truth);
    assert!(matches!(result, Err(CoinError::NotFound(msg)) if msg.contains("ghost.png")));
}

#[test]
fn test_missing_image_directory_is_not_found() {
    let files = write_dataset(&[Entry { name: "a.png", image: None, coins: 2, value: None }]);
    let missing_dir = files.dir.path().join("no_such_dir");
    let result = dataset::load_dataset(&files.image_list, &missing_dir, &files.ground_truth);
    assert!(matches!(result, Err(CoinError::NotFound(msg)) if msg.contains("no_such_dir")));
}

#[test]
fn test_load_dataset_builds_records() -> anyhow::Result<()> {
    let files = write_dataset(&[
        Entry { name: "one.png", image: Some(blank_image(20, 20)), coins: 0, value: Some(0.0) },
        Entry { name: "group1/two.png", image: Some(blank_image(20, 20)), coins: 3, value: None },
    ]);

    let records = dataset::load_dataset(&files.image_list, &files.image_dir, &files.ground_truth)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "one.png");
    assert_eq!(records[0].total_value_truth, Some(0.0));
    assert_eq!(records[1].name, "group1/two.png");
    assert_eq!(records[1].coin_count_truth, 3);
    assert_eq!(records[1].total_value_truth, None);
    assert_eq!(records[1].path, files.image_dir.join("group1/two.png"));
    Ok(())
}
