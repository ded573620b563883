use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../docs/fixtures")
        .join(name)
        .canonicalize()
        .expect("fixture present")
}

fn cli() -> Command {
    cargo_bin_cmd!("borderpath-cli")
}

/// Command wired to the fixture network with its output inside a temp dir.
fn prepare_command() -> (Command, TempDir) {
    let temp_dir = tempdir().expect("create temp dir");
    let mut cmd = cli();
    cmd.env("RUST_LOG", "error")
        .env("BORDERPATH_CACHE_DIR", temp_dir.path().join("cache"))
        .arg("--network")
        .arg(fixture("sample_network.json"));
    (cmd, temp_dir)
}

fn map_path(temp: &TempDir) -> PathBuf {
    temp.path().join("maps").join("route_map.html")
}

#[test]
fn stealth_route_is_planned_and_rendered() {
    let (mut cmd, temp) = prepare_command();
    let output = map_path(&temp);
    cmd.arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--output")
        .arg(&output);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "(2 hops, mission: stealth, algorithm: dijkstra)",
        ))
        .stdout(predicate::str::contains("(node 3)"))
        .stdout(predicate::str::contains("Map saved to"));

    let html = fs::read_to_string(&output).expect("map written");
    assert!(html.contains("L.polyline"));
}

#[test]
fn speed_mission_with_a_star_prefers_fast_roads() {
    let (mut cmd, temp) = prepare_command();
    cmd.arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--mission")
        .arg("speed")
        .arg("--algorithm")
        .arg("a-star")
        .arg("--output")
        .arg(map_path(&temp));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "(3 hops, mission: speed, algorithm: a-star)",
        ))
        .stdout(predicate::str::contains("travel time:"));
}

#[test]
fn basic_format_outputs_coordinates_only() {
    let (mut cmd, temp) = prepare_command();
    cmd.arg("--format")
        .arg("basic")
        .arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--output")
        .arg(map_path(&temp));

    cmd.assert().success().stdout(predicate::eq(
        "26.900000, 70.000000\n26.925000, 70.025000\n26.950000, 70.050000\n",
    ));
}

#[test]
fn json_format_and_geojson_artifact() {
    let (mut cmd, temp) = prepare_command();
    let geojson = temp.path().join("route.geojson");
    cmd.arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--output")
        .arg(map_path(&temp))
        .arg("--geojson")
        .arg(&geojson)
        .arg("--format")
        .arg("json");

    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("json summary");
    assert_eq!(summary["mission"], "stealth");
    assert_eq!(summary["hops"], 2);

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&geojson).expect("geojson written"))
            .expect("valid geojson");
    assert_eq!(document["type"], "FeatureCollection");
}

#[test]
fn failed_geojson_write_leaves_no_map() {
    let (mut cmd, temp) = prepare_command();
    let occupied = temp.path().join("occupied");
    fs::create_dir(&occupied).expect("create directory");
    cmd.arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--output")
        .arg(map_path(&temp))
        .arg("--geojson")
        .arg(&occupied);

    cmd.assert().failure();
    assert!(!map_path(&temp).exists());
    assert!(occupied.is_dir());
}

#[test]
fn zone_start_resolves_from_catalog() {
    let (mut cmd, temp) = prepare_command();
    cmd.arg("route")
        .arg("--zone")
        .arg("sadewala post")
        .arg("--zones")
        .arg(fixture("border_zones.csv"))
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--output")
        .arg(map_path(&temp));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("(node 1)"));
}

#[test]
fn unknown_zone_suggests_alternatives() {
    let (mut cmd, temp) = prepare_command();
    cmd.arg("route")
        .arg("--zone")
        .arg("Tanott")
        .arg("--zones")
        .arg(fixture("border_zones.csv"))
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--output")
        .arg(map_path(&temp));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean 'Tanot'?"));
    assert!(!map_path(&temp).exists());
}

#[test]
fn malformed_coordinate_is_reported() {
    let (mut cmd, temp) = prepare_command();
    cmd.arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.9, ")
        .arg("--output")
        .arg(map_path(&temp));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid --to coordinate"))
        .stderr(predicate::str::contains("longitude is missing"));
    assert!(!map_path(&temp).exists());
}

#[test]
fn unreachable_destination_exits_without_artifact() {
    let (mut cmd, temp) = prepare_command();
    cmd.arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.965, 70.005")
        .arg("--output")
        .arg(map_path(&temp));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No route found between"))
        .stderr(predicate::str::contains("Try a larger --buffer"));
    assert!(!map_path(&temp).exists());
}

#[test]
fn region_without_network_data_is_friendly() {
    let (mut cmd, temp) = prepare_command();
    cmd.arg("route")
        .arg("--from")
        .arg("10.0, 10.0")
        .arg("--to")
        .arg("10.01, 10.01")
        .arg("--output")
        .arg(map_path(&temp));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No road network data available"));
}

#[test]
fn cached_network_is_written_and_reused() {
    let (mut cmd, temp) = prepare_command();
    cmd.arg("--cache")
        .arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--output")
        .arg(map_path(&temp));
    cmd.assert().success();

    let snapshots: Vec<_> = fs::read_dir(temp.path().join("cache"))
        .expect("cache dir created")
        .collect();
    assert_eq!(snapshots.len(), 1);

    cli()
        .env("RUST_LOG", "error")
        .env("BORDERPATH_CACHE_DIR", temp.path().join("cache"))
        .arg("--network")
        .arg(fixture("sample_network.json"))
        .arg("--cache")
        .arg("route")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--output")
        .arg(map_path(&temp))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 hops"));
}

#[test]
fn zones_are_listed_alphabetically() {
    cli()
        .env("RUST_LOG", "error")
        .arg("zones")
        .arg("--zones")
        .arg(fixture("border_zones.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Zones (6):"))
        .stdout(predicate::str::contains("Sadewala Post"))
        .stdout(predicate::str::is_match("(?s)Island Outpost.*Tanot").expect("regex"));
}

#[test]
fn region_prints_bounds() {
    cli()
        .env("RUST_LOG", "error")
        .arg("region")
        .arg("--from")
        .arg("26.90, 70.00")
        .arg("--to")
        .arg("26.95, 70.05")
        .arg("--buffer")
        .arg("0")
        .arg("--format")
        .arg("basic")
        .assert()
        .success()
        .stdout(predicate::eq("26.900000,70.000000,26.950000,70.050000\n"));
}
