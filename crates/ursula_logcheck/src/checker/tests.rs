use std::path::PathBuf;

use tempfile::TempDir;

use super::*;

const SECRET: &str = "s3cret";

const WOLF_TASK: &str = "\
obj(base):type:class:position:hp:damage:
base:mob:wolf:\"0,0\":10:0:
obj(req):type:class:minimum:limit::
req:mob:wolf:1:2::
id:condition:primary type:primary class:secondary type:secondary class:argument
1:proxy:player::mob:wolf:5
2:attack:player::mob:wolf:20
3:destroy:mob:wolf::::
4:win::::::
";

const CHAINED_TASK: &str = "\
id:condition:primary type:primary class:secondary type:secondary class:argument
1:proxy:player::mob:wolf:5
1:attack:player::mob:wolf:100
2:win::::::
";

const PROLOGUE: &str = "\
Session started
Player Start Position: (20.00, 0.00)
ID | Name | Object ID | Type | Position | HP | Damage
1 | wolf | 1001 | mob | (0.00, 0.00) | 10 | 3
2 | rock | 1002 | static | (5.00, 5.00) | 0 | 0
---
";

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    store: CheckerStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path().to_path_buf();
        fs::write(root.join("wolf.cfg"), WOLF_TASK).expect("write wolf task");
        fs::write(root.join("chained.cfg"), CHAINED_TASK).expect("write chained task");
        fs::write(
            root.join("checker.cfg"),
            format!("secret:{SECRET}\nwolf_hunt:wolf.cfg\nchained:chained.cfg\n"),
        )
        .expect("write manifest");
        let store = CheckerStore::init(&root.join("checker.cfg")).expect("store");
        Self {
            _dir: dir,
            root,
            store,
        }
    }

    fn write_log(&self, name: &str, events: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, format!("{PROLOGUE}{events}")).expect("write log");
        path
    }

    fn check(&self, task: &str, salt: i32, log: &Path) -> Result<CheckOutcome, CheckError> {
        check_log(&self.store, task, salt, log, &CheckOptions::default())
    }
}

#[test]
fn wolf_proximity_sets_first_bit() {
    let fixture = Fixture::new();
    let log = fixture.write_log(
        "near.log",
        "[10] 1 wolf position: (0.00, 0.00); Player (3.00, 4.00);\n[20] Session ended\n",
    );
    let outcome = fixture.check("wolf_hunt", 42, &log).expect("check");
    assert_eq!(outcome.verdict.bits(), 0b0001);
    assert_eq!(outcome.condition_count, 4);
    assert_eq!(
        outcome.verification_code,
        verification_code(SECRET, "wolf_hunt", 42, outcome.verdict)
    );
}

#[test]
fn full_session_satisfies_every_condition() {
    let fixture = Fixture::new();
    let log = fixture.write_log(
        "full.log",
        "\
[10] Player (3.00, 4.00);  1 wolf position: (0.00, 0.00)
[20] attack Player with 15 damage to 1
[30] 1 died
[40] Game Over: Win
[50] Session ended
",
    );
    let outcome = fixture.check("wolf_hunt", 7, &log).expect("check");
    assert_eq!(outcome.verdict.bits(), 0b1111);
}

#[test]
fn far_player_satisfies_nothing() {
    let fixture = Fixture::new();
    let log = fixture.write_log(
        "far.log",
        "[10] 1 wolf position: (0.00, 0.00); Player (30.00, 0.00);\n[40] Game Over: Lose\n",
    );
    let outcome = fixture.check("wolf_hunt", 1, &log).expect("check");
    assert_eq!(outcome.verdict.bits(), 0);
}

#[test]
fn three_wolves_exceed_requirement_limit() {
    let fixture = Fixture::new();
    let path = fixture.root.join("pack.log");
    fs::write(
        &path,
        "\
Player Start Position: (20.00, 0.00)
ID | Name | Object ID | Type | Position | HP | Damage
1 | wolf | 1001 | mob | (0.00, 0.00) | 10 | 3
2 | wolf | 1002 | mob | (1.00, 0.00) | 10 | 3
3 | wolf | 1003 | mob | (2.00, 0.00) | 10 | 3
---
[1] Session ended
",
    )
    .expect("write log");
    let err = fixture.check("wolf_hunt", 1, &path).expect_err("three wolves");
    assert!(matches!(
        err,
        CheckError::RequirementOutOfRange {
            found: 3,
            limit: 2,
            ..
        }
    ));
    assert_eq!(err.library_code(), crate::session::FORMAT_ERROR_CODE);
}

#[test]
fn identical_runs_are_deterministic() {
    let fixture = Fixture::new();
    let log = fixture.write_log(
        "near.log",
        "[10] 1 wolf position: (0.00, 0.00); Player (1.00, 1.00);\n",
    );
    let first = fixture.check("wolf_hunt", 99, &log).expect("first");
    let second = fixture.check("wolf_hunt", 99, &log).expect("second");
    assert_eq!(first, second);
}

#[test]
fn salt_changes_code_but_not_verdict() {
    let fixture = Fixture::new();
    let log = fixture.write_log(
        "near.log",
        "[10] 1 wolf position: (0.00, 0.00); Player (1.00, 1.00);\n",
    );
    let salted = fixture.check("wolf_hunt", 1, &log).expect("salt 1");
    let resalted = fixture.check("wolf_hunt", -1, &log).expect("salt -1");
    assert_eq!(salted.verdict, resalted.verdict);
    assert_ne!(salted.verification_code, resalted.verification_code);
}

#[test]
fn game_won_marks_whole_row() {
    let fixture = Fixture::new();
    let log = fixture.write_log("won.log", "[40] Game Over: Win\n");
    let outcome = fixture.check("wolf_hunt", 5, &log).expect("check");
    assert_eq!(outcome.verdict.bits(), 0b1000);
}

#[test]
fn actor_partner_never_satisfies_chained_condition() {
    let fixture = Fixture::new();
    let log = fixture.write_log(
        "chained.log",
        "\
[10] 1 wolf position: (0.00, 0.00); Player (1.00, 0.00);
[20] attack Player with 1 damage to 1
[30] Game Over: Win
",
    );
    let outcome = fixture.check("chained", 3, &log).expect("check");
    assert!(!outcome.verdict.condition_satisfied(0));
    assert!(outcome.verdict.condition_satisfied(1));
}

#[test]
fn verdict_only_uses_low_condition_bits() {
    let fixture = Fixture::new();
    let log = fixture.write_log(
        "bits.log",
        "[10] 1 wolf position: (0.00, 0.00); Player (1.00, 0.00);\n[30] 1 died\n[40] Game Over: Win\n",
    );
    let outcome = fixture.check("chained", 3, &log).expect("check");
    assert!(outcome.verdict.bits() <= 127);
    assert_eq!(outcome.verdict.bits() >> outcome.condition_count, 0);
}

#[test]
fn parameter_errors_map_to_bad_parameters() {
    let fixture = Fixture::new();
    let log = fixture.write_log("near.log", "");

    let err = fixture.check("", 1, &log).expect_err("empty task");
    assert!(matches!(err, CheckError::EmptyTaskName));
    let err = fixture.check("wolf_hunt", 1, Path::new("")).expect_err("empty path");
    assert!(matches!(err, CheckError::EmptyLogPath));
    let err = fixture.check("bear_hunt", 1, &log).expect_err("unknown task");
    assert!(matches!(err, CheckError::UnknownTask { ref name } if name == "bear_hunt"));
    assert_eq!(err.library_code(), crate::session::BAD_PARAMETERS_CODE);

    let missing = fixture.root.join("missing.log");
    let err = fixture.check("wolf_hunt", 1, &missing).expect_err("missing log");
    assert!(matches!(err, CheckError::ReadLog { .. }));
    assert_eq!(err.library_code(), crate::session::BAD_PARAMETERS_CODE);
}

#[test]
fn in_memory_check_matches_file_check() {
    let fixture = Fixture::new();
    let events = "[10] 1 wolf position: (0.00, 0.00); Player (3.00, 4.00);\n[20] Session ended\n";
    let log = fixture.write_log("near.log", events);
    let from_file = fixture.check("wolf_hunt", 11, &log).expect("file");
    let from_text = check_log_text(
        &fixture.store,
        "wolf_hunt",
        11,
        &format!("{PROLOGUE}{events}"),
        &CheckOptions { dump_matrix: true },
    )
    .expect("text");
    assert_eq!(from_file, from_text);
}

#[test]
fn outcome_serializes_verdict_as_integer() {
    let fixture = Fixture::new();
    let log = fixture.write_log("near.log", "[10] 1 wolf position: (0.00, 0.00); Player (3.00, 4.00);\n");
    let outcome = fixture.check("wolf_hunt", 2, &log).expect("check");
    let value = serde_json::to_value(&outcome).expect("json");
    assert_eq!(value["verdict"], serde_json::json!(1));
    assert_eq!(value["task"], serde_json::json!("wolf_hunt"));
    assert_eq!(value["salt"], serde_json::json!(2));
    assert_eq!(
        value["verification_code"].as_str().map(str::len),
        Some(64)
    );
}

#[test]
fn store_is_reusable_across_tasks() {
    let fixture = Fixture::new();
    let log = fixture.write_log("won.log", "[40] Game Over: Win\n");
    let wolf = fixture.check("wolf_hunt", 1, &log).expect("wolf");
    let chained = fixture.check("chained", 1, &log).expect("chained");
    assert_eq!(wolf.verdict.bits(), 0b1000);
    assert_eq!(chained.verdict.bits(), 0b10);
}
