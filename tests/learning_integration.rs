//! End-to-end checks of the train/persist/evaluate pipeline

use std::collections::BTreeMap;
use std::path::Path;

use tempfile::TempDir;

use gridlearn::grid::{MapSpec, Position, SensorMode};
use gridlearn::modes::{
    EvaluateConfig, EvaluateMode, PolicyKind, Task, TrainEvoConfig, TrainEvoMode, TrainQConfig,
    TrainQMode,
};

fn open_room_spec() -> MapSpec {
    MapSpec {
        height: 5,
        width: 5,
        goals: vec![Position::new(0, 4)],
        obstacles: vec![Position::new(2, 2), Position::new(1, 2)],
        start_positions: BTreeMap::from([("A".to_string(), Position::new(4, 0))]),
    }
}

#[test]
fn bundled_maps_are_valid_scenarios() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));

    for (file, mode) in [
        ("maps/beacon_10x10.json", SensorMode::Beacon),
        ("maps/maze_7x7.json", SensorMode::Maze),
    ] {
        let spec = MapSpec::load(&root.join(file)).expect("bundled map loads");
        let world = spec.build_world(mode);
        let start = spec.first_start().expect("bundled map has a start");
        assert!(world.is_valid_position(start));
        assert!(!spec.goals.is_empty());
    }
}

#[test]
fn qlearning_learns_the_maze_end_to_end() {
    let dir = TempDir::new().unwrap();
    let map_path = dir.path().join("map.json");
    let policy_path = dir.path().join("policy.json");
    open_room_spec().save(&map_path).unwrap();

    let mut train = TrainQConfig::new(Task::Maze, map_path.clone(), policy_path.clone());
    train.episodes = 400;
    train.max_steps = 100;
    TrainQMode::new(train).run().unwrap();

    let mut eval = EvaluateConfig::new(Task::Maze, map_path, PolicyKind::QTable, policy_path);
    eval.runs = 10;
    eval.max_steps = 100;
    let report = EvaluateMode::new(eval).run().unwrap();

    assert!(
        report.reached_goal >= report.runs / 2,
        "greedy policy should solve the room most of the time, got {}/{}",
        report.reached_goal,
        report.runs
    );
}

#[test]
fn qlearning_learns_the_beacon_end_to_end() {
    let dir = TempDir::new().unwrap();
    let map_path = dir.path().join("map.json");
    let policy_path = dir.path().join("policy.json");
    open_room_spec().save(&map_path).unwrap();

    let mut train = TrainQConfig::new(Task::Beacon, map_path.clone(), policy_path.clone());
    train.episodes = 400;
    train.max_steps = 100;
    TrainQMode::new(train).run().unwrap();

    let mut eval = EvaluateConfig::new(Task::Beacon, map_path, PolicyKind::QTable, policy_path);
    eval.runs = 10;
    eval.max_steps = 100;
    let report = EvaluateMode::new(eval).run().unwrap();

    assert!(
        report.reached_goal >= report.runs / 2,
        "greedy policy should reach the beacon most of the time, got {}/{}",
        report.reached_goal,
        report.runs
    );
}

#[test]
fn evolution_pipeline_saves_and_evaluates_a_genome() {
    let dir = TempDir::new().unwrap();
    let map_path = dir.path().join("map.json");
    let genome_path = dir.path().join("genome.txt");
    open_room_spec().save(&map_path).unwrap();

    let mut train = TrainEvoConfig::new(Task::Maze, map_path.clone(), genome_path.clone());
    train.evolution.population = 8;
    train.evolution.generations = 3;
    train.evolution.steps_per_agent = 40;
    train.evolution.hidden = 4;
    train.evolution.elite = 2;
    train.evolution.parents = 3;
    train.evolution.k_neighbors = 3;
    train.evolution.archive_add_top = 2;
    TrainEvoMode::new(train).run().unwrap();

    let mut eval = EvaluateConfig::new(Task::Maze, map_path, PolicyKind::Genome, genome_path);
    eval.runs = 5;
    eval.max_steps = 40;
    eval.hidden = 4;
    let report = EvaluateMode::new(eval).run().unwrap();

    // a 3-generation run makes no promises about solving the task, but the
    // artifact must load and drive a full evaluation batch
    assert_eq!(report.runs, 5);
    assert!(report.mean_steps > 0.0);
}
