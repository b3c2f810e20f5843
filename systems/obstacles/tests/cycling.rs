use warehouse_core::{CellCoord, Command, Direction, Event, ObstacleTuning, SimConfig};
use warehouse_system_obstacles::Obstacles;
use warehouse_world::{self as world, query, Grid, World};

fn tuning() -> ObstacleTuning {
    ObstacleTuning {
        count: 3,
        interval: 4,
        max_attempts: 64,
    }
}

fn world_with_robots() -> World {
    let grid = Grid::parse(
        "1 1 1 1 1\n1 2 1 2 1\n1 1 1 1 1\n6 1 1 1 8",
        5,
        4,
    )
    .expect("valid map");
    let mut world = World::new(grid, SimConfig::default());
    let mut events = Vec::new();
    for (column, row) in [(0, 0), (2, 2), (4, 0)] {
        world::apply(
            &mut world,
            Command::SpawnRobot {
                cell: CellCoord::new(column, row),
                facing: Direction::South,
            },
            &mut events,
        );
    }
    world
}

fn advance(world: &mut World, obstacles: &mut Obstacles) -> (Vec<Command>, Vec<Event>) {
    let mut events = Vec::new();
    world::apply(world, Command::Tick, &mut events);

    let mut commands = Vec::new();
    obstacles.handle(
        &events,
        query::grid(world),
        query::roster(world),
        query::dynamic_obstacles(world),
        &mut commands,
    );

    let mut outcomes = Vec::new();
    for command in commands.clone() {
        world::apply(world, command, &mut outcomes);
    }
    (commands, outcomes)
}

#[test]
fn obstacles_appear_only_on_cycle_ticks() {
    let mut world = world_with_robots();
    let mut obstacles = Obstacles::new(tuning(), 99);

    for _ in 0..3 {
        let (commands, _) = advance(&mut world, &mut obstacles);
        assert!(commands.is_empty(), "no cycle before the interval elapses");
    }

    let (commands, outcomes) = advance(&mut world, &mut obstacles);
    assert_eq!(commands.len(), 3);
    assert_eq!(
        outcomes
            .iter()
            .filter(|event| matches!(event, Event::ObstaclePlaced { .. }))
            .count(),
        3
    );
    assert_eq!(query::dynamic_obstacles(&world).len(), 3);
}

#[test]
fn obstacles_never_land_under_robots() {
    let mut world = world_with_robots();
    let mut obstacles = Obstacles::new(tuning(), 1234);

    for _ in 0..40 {
        let _ = advance(&mut world, &mut obstacles);
        for cell in query::dynamic_obstacles(&world) {
            assert!(!query::roster(&world).is_occupied(*cell));
        }
    }
}

#[test]
fn each_cycle_clears_the_previous_set() {
    let mut world = world_with_robots();
    let mut obstacles = Obstacles::new(tuning(), 7);

    for _ in 0..4 {
        let _ = advance(&mut world, &mut obstacles);
    }
    let first: Vec<CellCoord> = query::dynamic_obstacles(&world).iter().copied().collect();

    for _ in 0..3 {
        let _ = advance(&mut world, &mut obstacles);
    }
    let (commands, outcomes) = advance(&mut world, &mut obstacles);

    let cleared: Vec<CellCoord> = commands
        .iter()
        .filter_map(|command| match command {
            Command::ClearObstacle { cell } => Some(*cell),
            _ => None,
        })
        .collect();
    assert_eq!(cleared, first);
    assert!(!outcomes
        .iter()
        .any(|event| matches!(event, Event::ObstacleRejected { .. })));
    assert_eq!(query::dynamic_obstacles(&world).len(), 3);
}

#[test]
fn deterministic_replay_produces_identical_layouts() {
    let replay = |seed: u64| {
        let mut world = world_with_robots();
        let mut obstacles = Obstacles::new(tuning(), seed);
        let mut log = Vec::new();
        for _ in 0..20 {
            let (commands, _) = advance(&mut world, &mut obstacles);
            log.extend(commands);
        }
        log
    };

    assert_eq!(replay(42), replay(42));
}
