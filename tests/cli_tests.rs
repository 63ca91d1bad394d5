use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::{NamedTempFile, TempDir};

#[allow(deprecated)]
fn critter() -> Command {
    let mut cmd = Command::cargo_bin("critter").expect("critter binary");
    cmd.env_remove("CRITTER_DB")
        .env_remove("CRITTER_HTTP_ADDR")
        .env("CRITTER_LOG", "off");
    cmd
}

fn run_shell(script: &str) -> assert_cmd::assert::Assert {
    critter().arg("shell").write_stdin(script.to_string()).assert()
}

const BOOKING: &str = "customer add 555-0100 Ada Lovelace
pet add 1 cat Whiskers
pet add 1 dog Rex
employee add Sam walking,feeding mon,tue,wed
schedule add 2024-01-08 2,1 1 walking
";

#[test]
fn shell_is_the_default_command() {
    critter()
        .write_stdin("help\nquit\n")
        .assert()
        .success()
        .stdout(str_contains("schedule add <YYYY-MM-DD>"));
}

#[test]
fn shell_books_a_schedule_and_lists_it_per_customer() {
    let script = format!("{BOOKING}schedules customer 1\nquit\n");
    run_shell(&script)
        .success()
        .stdout(str_contains("Customer 1 saved."))
        .stdout(str_contains("Pet 2 saved for customer 1."))
        .stdout(str_contains("Schedule 1 created for 2024-01-08."))
        .stdout(str_contains("| 1  | 2024-01-08 | 2,1  | 1         | WALKING    |"));
}

#[test]
fn shell_finds_only_available_employees() {
    let script = "employee add Sam walking mon
employee add Kim walking,shaving sat
find walking 2024-01-08
find - 2024-01-13
quit
";
    let assert = run_shell(script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let replies: Vec<&str> = output.split("> ").collect();
    let (monday, saturday) = (replies[3], replies[4]);
    assert!(monday.contains("| 1  | Sam  | WALKING | MONDAY |"));
    assert!(!monday.contains("Kim"));
    assert!(saturday.contains("| 2  | Kim  | WALKING,SHAVING | SATURDAY |"));
    assert!(!saturday.contains("Sam"));
}

#[test]
fn shell_reports_unknown_references() {
    run_shell("schedule add 2024-01-08 9 1 walking\nschedules pet 3\nquit\n")
        .success()
        .stdout(str_contains("Error: pet 9 not found"))
        .stdout(str_contains("Error: pet 3 not found"));
}

#[test]
fn shell_rejects_unknown_skills_and_commands() {
    run_shell("employee add Sam juggling\nteleport\nquit\n")
        .success()
        .stdout(str_contains("Error: unknown skill 'juggling'"))
        .stdout(str_contains("Unknown command. Type 'help'."));
}

#[test]
fn shell_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "{BOOKING}save json {path}\ncustomer add 555-0199 Temp Person\nload json {path}\ncustomers\nquit\n"
    );
    let assert = run_shell(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let after_reload = output
        .split("Loaded snapshot from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Ada Lovelace"));
    assert!(
        !after_reload.contains("Temp Person"),
        "customer added after the save should be gone:\n{after_reload}"
    );
}

#[test]
fn shell_exports_schedules_as_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schedules.csv");
    let script = format!("{BOOKING}export csv {}\nquit\n", path.display());
    run_shell(&script)
        .success()
        .stdout(str_contains("Exported 1 schedules"));
    let csv = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        csv.lines().collect::<Vec<_>>(),
        vec!["id,date,employee_ids,pet_ids,activities", "1,2024-01-08,1,2;1,WALKING"]
    );
}

#[test]
fn sqlite_database_survives_restarts() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("critter.db");
    let db = db.to_string_lossy().to_string();

    critter()
        .args(["--db", db.as_str(), "shell"])
        .write_stdin(format!("{BOOKING}quit\n"))
        .assert()
        .success();

    critter()
        .args(["--db", db.as_str(), "shell"])
        .write_stdin("schedules employee 1\nsave json snapshot.json\nquit\n")
        .assert()
        .success()
        .stdout(str_contains("| 1  | 2024-01-08 | 2,1  | 1         | WALKING    |"))
        .stdout(str_contains(
            "Error: snapshots are only available with the in-memory store",
        ));
}

#[test]
fn bad_listen_address_fails_fast() {
    critter()
        .args(["serve", "--addr", "not-an-address"])
        .assert()
        .failure()
        .stderr(str_contains("invalid listen address 'not-an-address'"));
}
