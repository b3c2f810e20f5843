use warehouse_core::{
    CellCoord, Command, Direction, Event, ItemId, RobotAction, RobotId, RobotMode, SimConfig,
    Vertical,
};
use warehouse_system_decision::Decision;
use warehouse_world::{apply, query, Grid, World};

fn scenario() -> World {
    let grid = Grid::parse("4:5 8\n1 1", 2, 2).expect("valid map");
    let mut world = World::new(grid, Default::default());
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::SpawnRobot {
            cell: CellCoord::new(0, 1),
            facing: Direction::North,
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::AssignLedger {
            items: vec![ItemId::new(5)],
        },
        &mut events,
    );
    world
}

fn spawn(world: &mut World, column: u32, row: u32, facing: Direction) {
    let mut events = Vec::new();
    apply(
        world,
        Command::SpawnRobot {
            cell: CellCoord::new(column, row),
            facing,
        },
        &mut events,
    );
    assert!(matches!(events.as_slice(), [Event::RobotSpawned { .. }]));
}

fn act(world: &mut World, robot: u32, action: RobotAction) {
    let mut events = Vec::new();
    apply(
        world,
        Command::Act {
            robot: RobotId::new(robot),
            mode: RobotMode::Explore,
            action,
        },
        &mut events,
    );
    assert!(
        matches!(events.first(), Some(Event::ActionResolved { success: true, .. })),
        "{action:?} failed: {events:?}"
    );
}

/// Runs the decision loop until the ledger clears, returning every action taken.
fn drive(world: &mut World, max_ticks: u32) -> Vec<RobotAction> {
    let decision = Decision::new();
    let mut actions = Vec::new();
    for _ in 0..max_ticks {
        let mut events = Vec::new();
        apply(world, Command::Tick, &mut events);

        let robots: Vec<RobotId> = query::roster(world).alive().collect();
        for robot in robots {
            let mut commands = Vec::new();
            if let Some(view) = query::robot_view(world, robot) {
                decision.handle(&view, &mut commands);
            }
            for command in commands {
                if let Command::Act { action, .. } = &command {
                    actions.push(*action);
                }
                apply(world, command, &mut events);
            }
        }

        if events.contains(&Event::LedgerCleared) {
            return actions;
        }
    }
    panic!("ledger not cleared after {max_ticks} ticks: {actions:?}");
}

#[test]
fn lone_robot_finds_the_exit_and_delivers() {
    let mut world = scenario();

    let actions = drive(&mut world, 20);

    assert_eq!(
        actions,
        vec![
            RobotAction::TakeShelfItem,
            RobotAction::Turn(Direction::East),
            RobotAction::Move,
            RobotAction::Turn(Direction::North),
            RobotAction::Move,
            RobotAction::SubmitItems,
        ]
    );
    assert!(query::ledger(&world).is_cleared());
}

#[test]
fn decisions_replay_identically() {
    let mut first = scenario();
    let mut second = scenario();

    assert_eq!(drive(&mut first, 20), drive(&mut second, 20));
}

/// Two couriers in one corridor, each loaded and facing the exit behind the other.
fn facing_couriers() -> World {
    let grid = Grid::parse("0 4:1 4:2 0 0\n8 1 1 1 8", 5, 2).expect("valid map");
    let mut world = World::new(grid, SimConfig::default());
    spawn(&mut world, 1, 1, Direction::North);
    spawn(&mut world, 2, 1, Direction::North);
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::AssignLedger {
            items: vec![ItemId::new(1), ItemId::new(2)],
        },
        &mut events,
    );
    act(&mut world, 0, RobotAction::TakeShelfItem);
    act(&mut world, 1, RobotAction::TakeShelfItem);
    act(&mut world, 0, RobotAction::Turn(Direction::East));
    act(&mut world, 1, RobotAction::Turn(Direction::West));
    world
}

#[test]
fn loaded_couriers_do_not_trade_items() {
    let mut world = facing_couriers();
    let decision = Decision::new();
    for robot in [0, 1] {
        let view = query::robot_view(&world, RobotId::new(robot)).expect("robot");
        let choice = decision.choose(&view).expect("live robot");
        assert!(
            !matches!(choice.action, RobotAction::PassItem { .. }),
            "robot {robot} chose {choice:?}"
        );
    }

    let actions = drive(&mut world, 40);

    let passes = actions
        .iter()
        .filter(|action| matches!(action, RobotAction::PassItem { .. }))
        .count();
    assert!(passes <= 1, "{actions:?}");
    assert_eq!(query::roster(&world).dead_count(), 0);
}

#[test]
fn rescuer_rides_the_free_elevator_when_the_nearest_is_blocked() {
    let grid = Grid::parse("7 1 7\n0 0 0\n1 8 1\n2:9 0 0", 3, 4)
        .and_then(|grid| grid.with_rows_per_floor(Some(2)))
        .expect("valid map");
    let mut world = World::new(grid, SimConfig::default());
    spawn(&mut world, 0, 2, Direction::South);
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::AssignLedger {
            items: vec![ItemId::new(9)],
        },
        &mut events,
    );
    act(&mut world, 0, RobotAction::TakeShelfItem);
    let mut facing = Direction::East;
    while query::roster(&world)
        .get(RobotId::new(0))
        .is_some_and(|robot| robot.is_alive())
    {
        act(&mut world, 0, RobotAction::Turn(facing));
        facing = facing.opposite();
    }
    spawn(&mut world, 0, 0, Direction::East);

    let actions = drive(&mut world, 40);

    assert_eq!(
        actions,
        vec![
            RobotAction::Move,
            RobotAction::Move,
            RobotAction::UseElevator(Vertical::Down),
            RobotAction::Turn(Direction::West),
            RobotAction::Move,
            RobotAction::TakeRobotItems(Direction::West),
            RobotAction::SubmitItems,
        ]
    );
}
