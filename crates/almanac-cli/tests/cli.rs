use assert_cmd::Command;
use predicates::prelude::*;

fn almanac() -> Command {
    let mut cmd = Command::cargo_bin("almanac").unwrap();
    cmd.env_remove("TZ").env_remove("ALMANAC_TIMEZONE");
    cmd
}

// ── resolve ─────────────────────────────────────────────────────────────────

#[test]
fn test_resolve_space_for_plus() {
    almanac()
        .args(["resolve", "2019-04-05T10:14:47 02:00", "--keep-foreign-timezone"])
        .assert()
        .success()
        .stdout("2019-04-05T10:14:47+02:00\n");
}

#[test]
fn test_resolve_into_default_timezone() {
    almanac()
        .args(["resolve", "2019-04-05T10:14:47+02:00"])
        .assert()
        .success()
        .stdout("2019-04-05T08:14:47Z\n");
}

#[test]
fn test_resolve_epoch_with_timezone_flag() {
    almanac()
        .args(["--timezone", "Europe/Berlin", "resolve", "@0"])
        .assert()
        .success()
        .stdout("1970-01-01T01:00:00+01:00\n");
}

#[test]
fn test_resolve_timezone_from_env() {
    almanac()
        .env("ALMANAC_TIMEZONE", "Asia/Tokyo")
        .args(["resolve", "@0", "--format", "local"])
        .assert()
        .success()
        .stdout("1970-01-01 09:00:00\n");
}

#[test]
fn test_resolve_json() {
    let output = almanac()
        .args(["--json", "resolve", "@-1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["iso8601"], "1969-12-31T23:59:59Z");
    assert_eq!(json["timestamp"], -1);
    assert_eq!(json["timezone"], "UTC");
}

#[test]
fn test_resolve_invalid_input_fails() {
    almanac()
        .args(["resolve", "next tuesday-ish"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid datetime"));
}

#[test]
fn test_invalid_timezone_flag_fails() {
    almanac()
        .args(["--timezone", "Mars/Olympus", "resolve", "@0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}

// ── shift ───────────────────────────────────────────────────────────────────

#[test]
fn test_shift_months_clamps_to_leap_day() {
    almanac()
        .args(["shift", "2018-01-31", "--months", "25", "--format", "date"])
        .assert()
        .success()
        .stdout("2020-02-29\n");
}

#[test]
fn test_shift_negative_hour_rolls_back_date() {
    almanac()
        .args(["shift", "2018-01-01T00:10:00Z", "--hours", "-1"])
        .assert()
        .success()
        .stdout("2017-12-31T23:10:00Z\n");
}

#[test]
fn test_shift_date_and_time() {
    almanac()
        .args([
            "shift",
            "2018-01-01 15:37:13",
            "--days",
            "50",
            "--hours",
            "25",
            "--minutes",
            "1",
            "--seconds",
            "1",
            "--format",
            "local",
        ])
        .assert()
        .success()
        .stdout("2018-02-21 16:38:14\n");
}

#[test]
fn test_shift_out_of_range_reports_context() {
    for delta in [["--years", "300000"], ["--hours", "3000000000"]] {
        almanac()
            .args(["shift", "2018-01-01"])
            .args(delta)
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to shift '2018-01-01'"))
            .stderr(predicate::str::contains("Out of range"));
    }
}

// ── diff ────────────────────────────────────────────────────────────────────

#[test]
fn test_diff_one_month_in_non_utc_default() {
    almanac()
        .args(["--timezone", "America/New_York", "diff", "2019-02-01", "2019-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("months: 1\n"))
        .stdout(predicate::str::contains("human: 1 month\n"));
}

#[test]
fn test_diff_backwards() {
    almanac()
        .args(["diff", "2019-03-01", "2019-02-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("months: -1\n"))
        .stdout(predicate::str::contains("human: 1 month ago\n"));
}

#[test]
fn test_diff_unequal_offsets_fail_without_flag() {
    almanac()
        .args(["diff", "2019-02-01T00:00:00Z", "2019-03-01T00:00:00+01:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Timezone mismatch"));
}

#[test]
fn test_diff_unequal_offsets_json() {
    let output = almanac()
        .args([
            "--json",
            "diff",
            "2019-02-01T00:00:00Z",
            "2019-03-01T00:00:00+01:00",
            "--allow-unequal-timezones",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["months"], 0);
    assert_eq!(json["days"], 27);
    assert_eq!(json["hours"], 23);
    assert_eq!(json["from"], "2019-02-01T00:00:00Z");
    assert_eq!(json["human_readable"], "27 days, 23 hours");
}

// ── check-timezone ──────────────────────────────────────────────────────────

#[test]
fn test_check_timezone_match() {
    almanac()
        .args(["--timezone", "Europe/Berlin", "check-timezone", "Europe/Berlin"])
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
fn test_check_timezone_soft_mismatch() {
    almanac()
        .args(["check-timezone", "Europe/Berlin"])
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn test_check_timezone_strict_mismatch() {
    almanac()
        .args(["check-timezone", "Europe/Berlin", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration mismatch"));
}
