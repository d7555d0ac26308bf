//! CLI guards that must trip before any database connection is attempted.
//! None of these need STALLQ_DATABASE_URL; it is removed from the child env.

use predicates::prelude::*;

#[allow(deprecated)]
fn stallq() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("stallq").expect("stallq binary");
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove(stallq_db::ENV_DB_URL)
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn config_hash_is_stable_for_same_layers() {
    let base = "../../config/base.yaml";
    let overlay = "../../config/rush_hour.yaml";

    let first = stallq()
        .args(["config-hash", base, overlay])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_hash="))
        .stdout(predicate::str::contains("\"max_quantity_per_order\":10"))
        .get_output()
        .stdout
        .clone();

    let second = stallq()
        .args(["config-hash", base, overlay])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(first, second);
}

#[test]
fn non_positive_customer_id_is_rejected() {
    stallq()
        .args(["order", "place", "--customer-id", "0", "--product-id", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --customer-id"));
}

#[test]
fn unknown_target_status_is_rejected() {
    stallq()
        .args([
            "order", "status", "--owner-id", "1", "--order-id", "1", "--status", "cooking",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected one of"));
}

#[test]
fn invalid_product_is_rejected_before_connecting() {
    stallq()
        .args([
            "seed", "owner", "--username", "ana", "--stall", "tacos", "--product", "taco",
            "--price", "0", "--prep-minutes", "5", "--available", "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("price must be > 0"));
}

#[test]
fn missing_database_url_is_reported() {
    stallq()
        .args(["db", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing env var STALLQ_DATABASE_URL"));
}

#[test]
fn secret_literal_in_config_is_refused() {
    let dir = std::env::temp_dir().join(format!("stallq-cli-secret-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("bad.yaml");
    std::fs::write(&path, "db:\n  url: postgres://stall:pw@localhost/stallq\n").expect("write yaml");

    stallq()
        .args(["config-hash", path.to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"));
}
