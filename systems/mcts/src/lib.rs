#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Monte-Carlo tree search planner that picks a single robot action per tick.
//!
//! Every search runs against a detached [`PlanningState`]: expansions and
//! rollouts mutate clones only, so the live world is never touched. The tree
//! is an index arena dropped as soon as the decision has been made.

use std::collections::BTreeSet;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use warehouse_core::{CellCoord, Command, MctsTuning, RobotAction, RobotMode};
use warehouse_world::{ActionOutcome, PlanningState};

/// Offset applied to the fleet seed so tree search draws its own random stream.
pub const MCTS_STREAM: u64 = 3;

/// Tree search planner. The random stream persists across decisions.
#[derive(Debug)]
pub struct Mcts {
    rng: ChaCha8Rng,
}

impl Mcts {
    /// Creates a planner drawing from the run seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(MCTS_STREAM)),
        }
    }

    /// Plans for the robot the snapshot belongs to and emits its action.
    ///
    /// Returns `false` without emitting anything when the search finds no
    /// successful action, leaving the caller to fall back to another planner.
    pub fn handle(&mut self, state: PlanningState, out: &mut Vec<Command>) -> bool {
        let Some(robot) = state.robot() else {
            return false;
        };
        let (id, mode) = (robot.id(), robot.mode());
        match self.plan(state) {
            Some(action) => {
                out.push(Command::Act {
                    robot: id,
                    mode: mode_for(action, mode),
                    action,
                });
                true
            }
            None => false,
        }
    }

    /// Runs the configured number of search iterations and returns the root
    /// action with the highest average reward.
    #[must_use]
    pub fn plan(&mut self, root: PlanningState) -> Option<RobotAction> {
        self.search(root).best_action()
    }

    fn search(&mut self, root: PlanningState) -> Tree {
        let rewards = Rewards::from_state(&root);
        let iterations = root.config().mcts.iterations;
        let mut tree = Tree::new(root, rewards.tuning.max_nodes);

        for _ in 0..iterations {
            let leaf = tree.select(rewards.tuning.exploration);
            let expanded = tree.expand(leaf, &rewards);
            if expanded == 0 && leaf == Tree::ROOT {
                break;
            }
            let node = match tree.children(leaf).choose(&mut self.rng) {
                Some(child) => *child,
                None => leaf,
            };
            let value = tree.path_reward(node) + self.rollout(tree.state(node).clone(), &rewards);
            tree.backpropagate(node, value);
        }
        tree
    }

    /// Plays uniformly random actions until one fails, the ledger clears, or
    /// the depth runs out.
    fn rollout(&mut self, mut state: PlanningState, rewards: &Rewards) -> f64 {
        let mut sighted = BTreeSet::new();
        let mut total = 0.0;
        for _ in 0..rewards.tuning.rollout_depth {
            if state.ledger().is_cleared() {
                break;
            }
            let Some(action) = RobotAction::PLANNING_SET.choose(&mut self.rng).copied() else {
                break;
            };
            match rewards.step(&mut state, action, &mut sighted) {
                Some(reward) => total += reward,
                None => break,
            }
        }
        total
    }
}

/// Mode reported for an action picked by tree search.
fn mode_for(action: RobotAction, current: RobotMode) -> RobotMode {
    match action {
        RobotAction::TakeShelfItem | RobotAction::TakeShelfItemFrom(_) => RobotMode::Fetch,
        RobotAction::TakeRobotItems(_) => RobotMode::Rescue,
        RobotAction::Charge => RobotMode::Charge,
        RobotAction::SubmitItems => RobotMode::Submit,
        RobotAction::PassItem { .. } => RobotMode::Pass,
        RobotAction::Turn(_)
        | RobotAction::Move
        | RobotAction::UseElevator(_)
        | RobotAction::Wait => current,
    }
}

#[derive(Debug)]
struct Rewards {
    tuning: MctsTuning,
    discovery_bonus: f64,
}

impl Rewards {
    fn from_state(state: &PlanningState) -> Self {
        let config = state.config();
        Self {
            tuning: config.mcts.clone(),
            discovery_bonus: f64::from(config.sight.discovery_bonus),
        }
    }

    /// Applies one action and scores it. `None` when the action failed.
    fn step(
        &self,
        state: &mut PlanningState,
        action: RobotAction,
        sighted: &mut BTreeSet<CellCoord>,
    ) -> Option<f64> {
        let before = state.nearest_exit_distance();
        let step = state.apply(action);
        let mut reward = match step.outcome {
            ActionOutcome::Rejected => return None,
            ActionOutcome::Moved { .. } => self.tuning.move_reward,
            ActionOutcome::Submitted { count } => self.tuning.submit_reward * f64::from(count),
            _ => 0.0,
        };
        if let (Some(before), Some(after)) = (before, state.nearest_exit_distance()) {
            let growth = f64::from(after - before);
            if growth > 0.0 {
                reward -= self.tuning.distance_penalty * growth;
            }
        }
        if let Some(cell) = step.sighted {
            if sighted.insert(cell) {
                reward += self.discovery_bonus;
            }
        }
        Some(reward)
    }
}

#[derive(Debug)]
struct Node {
    action: Option<RobotAction>,
    parent: Option<usize>,
    children: Vec<usize>,
    expanded: bool,
    visits: u32,
    total_reward: f64,
    reward: f64,
    state: PlanningState,
}

impl Node {
    fn new(state: PlanningState, action: Option<RobotAction>, parent: Option<usize>) -> Self {
        Self {
            action,
            parent,
            children: Vec::new(),
            expanded: false,
            visits: 0,
            total_reward: 0.0,
            reward: 0.0,
            state,
        }
    }

    fn average(&self) -> f64 {
        if self.visits == 0 {
            return 0.0;
        }
        self.total_reward / f64::from(self.visits)
    }
}

/// Arena of search nodes; index zero is the root.
#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
    capacity: usize,
}

impl Tree {
    const ROOT: usize = 0;

    fn new(root: PlanningState, capacity: usize) -> Self {
        Self {
            nodes: vec![Node::new(root, None, None)],
            capacity: capacity.max(1),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn children(&self, index: usize) -> &[usize] {
        &self.nodes[index].children
    }

    fn state(&self, index: usize) -> &PlanningState {
        &self.nodes[index].state
    }

    /// Immediate rewards collected on the way from the root to `index`.
    fn path_reward(&self, index: usize) -> f64 {
        let mut total = 0.0;
        let mut current = Some(index);
        while let Some(node) = current.and_then(|at| self.nodes.get(at)) {
            total += node.reward;
            current = node.parent;
        }
        total
    }

    fn ucb(&self, index: usize, parent_visits: u32, exploration: f64) -> f64 {
        let node = &self.nodes[index];
        if node.visits == 0 {
            return f64::INFINITY;
        }
        let visits = f64::from(node.visits);
        node.average() + exploration * (f64::from(parent_visits).ln() / visits).sqrt()
    }

    /// Descends by UCB1 until a node without children. Ties keep the first child.
    fn select(&self, exploration: f64) -> usize {
        let mut current = Self::ROOT;
        loop {
            let node = &self.nodes[current];
            let mut best: Option<(f64, usize)> = None;
            for &child in &node.children {
                let score = self.ucb(child, node.visits, exploration);
                if best.map_or(true, |(top, _)| score > top) {
                    best = Some((score, child));
                }
            }
            match best {
                Some((_, child)) => current = child,
                None => return current,
            }
        }
    }

    /// Tries every planning action on a clone of the node's state and keeps a
    /// child for each success. Returns the number of children created.
    fn expand(&mut self, index: usize, rewards: &Rewards) -> usize {
        if self.nodes[index].expanded {
            return 0;
        }
        self.nodes[index].expanded = true;

        let mut created = 0;
        for action in RobotAction::PLANNING_SET {
            if self.nodes.len() >= self.capacity {
                break;
            }
            let mut state = self.nodes[index].state.clone();
            let mut sighted = BTreeSet::new();
            let Some(reward) = rewards.step(&mut state, action, &mut sighted) else {
                continue;
            };
            let child = self.nodes.len();
            let mut node = Node::new(state, Some(action), Some(index));
            node.reward = reward;
            self.nodes.push(node);
            self.nodes[index].children.push(child);
            created += 1;
        }
        created
    }

    fn backpropagate(&mut self, from: usize, value: f64) {
        let mut current = Some(from);
        while let Some(index) = current {
            let node = &mut self.nodes[index];
            node.visits += 1;
            node.total_reward += value;
            current = node.parent;
        }
    }

    /// Root child with the highest average reward; ties go to the most visited.
    fn best_action(&self) -> Option<RobotAction> {
        let mut best: Option<(f64, u32, usize)> = None;
        for &child in self.children(Self::ROOT) {
            let node = &self.nodes[child];
            if node.visits == 0 {
                continue;
            }
            let average = node.average();
            let better = best.map_or(true, |(top, visits, _)| {
                average > top || (average == top && node.visits > visits)
            });
            if better {
                best = Some((average, node.visits, child));
            }
        }
        best.and_then(|(_, _, child)| self.nodes[child].action)
    }
}
