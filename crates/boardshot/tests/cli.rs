mod common;

use assert_cmd::Command;
use boardshot::fen::Position;
use boardshot::io::DetectReport;
use boardshot::ErrorKind;
use common::*;
use image::{Rgb, RgbImage};
use predicates::prelude::*;

fn fixture(dir: &std::path::Path, shot: &RgbImage) -> (std::path::PathBuf, std::path::PathBuf) {
    let image = dir.join("shot.png");
    shot.save(&image).unwrap();
    let models = dir.join("models.json");
    prototype_weights().write_json(&models).unwrap();
    (image, models)
}

#[test]
fn prints_fen_and_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let (image, models) = fixture(dir.path(), &screenshot(&Position::starting()));
    let report = dir.path().join("report.json");
    let annotated = dir.path().join("annotated.png");
    let stages = dir.path().join("stages");

    Command::cargo_bin("boardshot")
        .unwrap()
        .arg(&image)
        .arg("--models")
        .arg(&models)
        .args(["--black-to-move", "--castling", "kq"])
        .arg("--report")
        .arg(&report)
        .arg("--annotated")
        .arg(&annotated)
        .arg("--stages")
        .arg(&stages)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "fen: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b kq - 0 1",
        ))
        .stdout(predicate::str::contains(
            "simplified: rnbqkbnr-pppppppp-8-8-8-8-PPPPPPPP-RNBQKBNR",
        ))
        .stdout(predicate::str::contains("lichess.org/analysis/"));

    let parsed = DetectReport::load_json(&report).unwrap();
    let response = parsed.response.unwrap();
    assert_eq!(response.fen_standard, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b kq - 0 1");
    assert!(response.high_confidence);
    assert_eq!(parsed.models, ["proto-8", "proto-12", "proto-16"]);
    assert!(parsed.error.is_none());

    let overlay = image::open(&annotated).unwrap();
    assert_eq!((overlay.width(), overlay.height()), (SHOT_W, SHOT_H));
    assert!(stages.join("00_rough_crop.png").exists());
    assert!(stages.join("04_grid_lines.png").exists());
    assert!(!stages.join("05_classification.png").exists());
    let listing = std::fs::read_to_string(stages.join("stages.json")).unwrap();
    assert!(listing.contains("\"classification\""));
}

#[test]
fn json_output_is_the_prediction_response() {
    let dir = tempfile::tempdir().unwrap();
    let (image, models) = fixture(dir.path(), &screenshot(&Position::starting()));

    let out = Command::cargo_bin("boardshot")
        .unwrap()
        .arg(&image)
        .arg("--models")
        .arg(&models)
        .arg("--json")
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["fen"], "rnbqkbnr-pppppppp-8-8-8-8-PPPPPPPP-RNBQKBNR");
    assert_eq!(value["low_confidence_squares"].as_array().unwrap().len(), 0);
    assert!(value["links"]["chesscom"]
        .as_str()
        .unwrap()
        .contains("fen=rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR%20w%20KQkq%20-%200%201"));
}

#[test]
fn unreadable_boards_exit_with_input_quality_status() {
    let dir = tempfile::tempdir().unwrap();
    let blank = RgbImage::from_pixel(300, 300, Rgb([90, 90, 90]));
    let (image, models) = fixture(dir.path(), &blank);
    let report = dir.path().join("report.json");

    Command::cargo_bin("boardshot")
        .unwrap()
        .arg(&image)
        .arg("--models")
        .arg(&models)
        .arg("--report")
        .arg(&report)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no grid found"));

    let parsed = DetectReport::load_json(&report).unwrap();
    assert!(parsed.response.is_none());
    assert_eq!(parsed.error_kind, Some(ErrorKind::InputQuality));
    assert!(!parsed.retryable);
    assert_eq!(parsed.region.map(|r| (r.width, r.height)), Some((300, 300)));
}

#[test]
fn bad_arguments_fail() {
    let dir = tempfile::tempdir().unwrap();
    let (image, _) = fixture(dir.path(), &screenshot(&Position::starting()));

    Command::cargo_bin("boardshot")
        .unwrap()
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("models file are required"));

    Command::cargo_bin("boardshot")
        .unwrap()
        .arg(&image)
        .args(["--models", "missing.json"])
        .assert()
        .code(1);

    Command::cargo_bin("boardshot")
        .unwrap()
        .arg(&image)
        .args(["--models", "m.json", "--castling", "qK"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--castling"));
}
