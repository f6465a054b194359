use std::{env, fs, path::PathBuf, process::Command};

fn run_bin(args: &[&str]) {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_gridfleet"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

fn fresh_dir(name: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    test_dir
}

#[test]
fn basic_workflow() {
    let test_dir = fresh_dir("basic_workflow");

    let config_contents = String::new()
        + "seed = 12\n"
        + "max_ticks = 200\n"
        + "mode = \"search\"\n"
        + "\n"
        + "[output]\n"
        + "save_trajectory = true\n";
    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&[
        "--sim-dir",
        test_dir_str,
        "generate",
        "--rows",
        "6",
        "--cols",
        "8",
        "--obstacles",
        "6",
        "--agents",
        "4",
        "--seed",
        "3",
    ]);
    assert!(test_dir.join("grid.txt").is_file());

    run_bin(&["--sim-dir", test_dir_str, "run"]);
    run_bin(&["--sim-dir", test_dir_str, "run"]);
    for run_dir in ["run-0000", "run-0001"] {
        for file in ["trajectory.msgpack", "events.log", "summary.toml"] {
            assert!(test_dir.join(run_dir).join(file).is_file(), "{run_dir}/{file}");
        }
    }
    let first = fs::read_to_string(test_dir.join("run-0000/summary.toml")).expect("summary");
    let second = fs::read_to_string(test_dir.join("run-0001/summary.toml")).expect("summary");
    assert_eq!(first, second);

    run_bin(&["--sim-dir", test_dir_str, "analyze"]);
    let analysis = fs::read_to_string(test_dir.join("analysis.toml")).expect("analysis");
    let analysis: toml::Table = toml::from_str(&analysis).expect("valid analysis");
    assert_eq!(analysis["n_runs"].as_integer(), Some(2));

    run_bin(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("run-0000").exists());
    assert!(!test_dir.join("analysis.toml").exists());
    assert!(test_dir.join("grid.txt").is_file());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn hand_written_grid_completes() {
    let test_dir = fresh_dir("hand_written_grid");

    fs::write(test_dir.join("config.toml"), "seed = 5\nwait_threshold = 2\n")
        .expect("failed to write config file");
    let grid = String::new() + "A1 . B2 . A2\n" + "X  X .  X X\n" + "B1 . .  . . \n";
    fs::write(test_dir.join("grid.txt"), grid).expect("failed to write grid file");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");
    run_bin(&["--sim-dir", test_dir_str, "run"]);

    let summary = fs::read_to_string(test_dir.join("run-0000/summary.toml")).expect("summary");
    let summary: toml::Table = toml::from_str(&summary).expect("valid summary");
    assert_eq!(summary["seed"].as_integer(), Some(5));
    assert_eq!(summary["outcome"].as_str(), Some("Completed"));
    let agents = summary["agents"].as_array().expect("agents");
    assert_eq!(agents.len(), 2);
    for agt in agents {
        assert_eq!(agt["final_status"].as_str(), Some("Reached"));
    }

    let events = fs::read_to_string(test_dir.join("run-0000/events.log")).expect("events");
    assert!(events.contains("A1: reached its destination"));

    fs::remove_dir_all(&test_dir).ok();
}
