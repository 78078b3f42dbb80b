//! Region assignment, reference-file faults and retention.

mod harness;

use filetime::{set_file_mtime, FileTime};
use harness::{run_time, Fixture, CMD_A, CMD_B};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

const DAY: u64 = 24 * 60 * 60;

fn placed(fx: &Fixture, region: &str, country: &str, name: &str) -> PathBuf {
    fx.config
        .paths
        .graphbase_dir
        .join(region)
        .join(country)
        .join("2023")
        .join("03")
        .join(name)
}

#[test]
fn first_listed_country_claims_shared_identifier() {
    for _ in 0..3 {
        let fx = Fixture::new();
        fx.set_countries("RegionA", &["CountryX", "CountryY"]);
        fx.set_benums("CountryX", &["L12345"]);
        fx.set_benums("CountryY", &["L12345"]);
        fx.drop_file(CMD_A, "20230310_0800Z_L12345_XY_ABC.gif", b"1");

        let (summary, _, _) = fx.run();

        assert_eq!(summary.processed, 1);
        assert!(placed(&fx, "RegionA", "CountryX", "20230310_0800Z_L12345_XY_ABC_proc.gif").is_file());
        assert!(!fx.config.paths.graphbase_dir.join("RegionA").join("CountryY").exists());
    }
}

#[test]
fn broken_reference_files_skip_only_their_scope() {
    let mut fx = Fixture::new();
    fx.config.regions = vec!["Missing".to_string(), "RegionA".to_string()];
    fx.set_countries("RegionA", &["Ghost", "CountryY"]);
    fx.set_benums("CountryY", &["B22222"]);
    fx.drop_file(CMD_B, "20230301_0000Z_B22222_XY_ABC.tif", b"1");

    let (summary, _, _) = fx.run();

    assert_eq!(summary.processed, 1);
    assert!(placed(&fx, "RegionA", "CountryY", "20230301_0000Z_B22222_XY_ABC_proc.tif").is_file());
    let log = fx.error_log();
    assert!(log.contains("Region Missing skipped"));
    assert!(log.contains("Country Ghost in region RegionA skipped"));
}

#[test]
fn retention_purges_by_age() {
    let fx = Fixture::new();
    let now = SystemTime::from(run_time());
    let stale_input = fx.drop_file(CMD_A, "stale.txt", b"1");
    set_file_mtime(&stale_input, FileTime::from_system_time(now - Duration::from_secs(10 * DAY))).unwrap();

    std::fs::create_dir_all(&fx.config.paths.rejected_dir).unwrap();
    let old_reject = fx.config.paths.rejected_dir.join("old.tif");
    let recent_reject = fx.config.paths.rejected_dir.join("recent.tif");
    std::fs::write(&old_reject, b"1").unwrap();
    std::fs::write(&recent_reject, b"1").unwrap();
    set_file_mtime(&old_reject, FileTime::from_system_time(now - Duration::from_secs(61 * DAY))).unwrap();
    set_file_mtime(&recent_reject, FileTime::from_system_time(now - Duration::from_secs(30 * DAY))).unwrap();

    let (summary, _, _) = fx.run();

    assert_eq!(summary.purged, 2);
    assert!(!stale_input.exists());
    assert!(!old_reject.exists());
    assert!(recent_reject.exists());
}
