//! Tuning knobs consumed by the world, the planners, and the run driver.
//!
//! Every group implements [`Default`] and deserialises with `#[serde(default)]`
//! so configuration files only need to mention the values they override.

use serde::{Deserialize, Serialize};

/// Aggregated tuning for a single simulation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Battery costs, gains, and decision thresholds.
    pub battery: BatteryTuning,
    /// Carrying capacity limits.
    pub cargo: CargoTuning,
    /// Sensor range and discovery reward.
    pub sight: SightTuning,
    /// Heuristic planner weights.
    pub heuristic: HeuristicTuning,
    /// Monte-Carlo tree search budget and reward shaping.
    pub mcts: MctsTuning,
    /// Dynamic obstacle cycling cadence.
    pub obstacles: ObstacleTuning,
    /// Fleet size, knowledge sharing, and the run seed.
    pub fleet: FleetTuning,
    /// Multi-floor layout description.
    pub floors: FloorTuning,
    /// Ledger sizing used when the caller does not supply explicit items.
    pub ledger: LedgerTuning,
    /// Run-level termination limits.
    pub run: RunLimits,
    /// Planner used to pick robot actions.
    pub planner: PlannerKind,
}

/// Battery economy applied to every robot action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryTuning {
    /// Charge consumed by a successful move or turn.
    pub move_cost: f32,
    /// Charge consumed by taking items from a shelf or a stranded robot.
    pub take_cost: f32,
    /// Charge consumed by handing an item to a neighbour.
    pub pass_cost: f32,
    /// Charge consumed per item accepted at an exit.
    pub submit_cost_per_item: f32,
    /// Charge consumed by an elevator ride.
    pub elevator_cost: f32,
    /// Charge restored by a single `charge` action.
    pub charge_gain: f32,
    /// Robots below this level drop everything and head for a charger.
    pub low_threshold: f32,
    /// Robots that know no charger stop fetching below this level and explore instead.
    pub charger_search_threshold: f32,
    /// Minimum charge a robot needs before it volunteers for a rescue.
    pub rescue_threshold: f32,
}

impl Default for BatteryTuning {
    fn default() -> Self {
        Self {
            move_cost: 0.5,
            take_cost: 0.5,
            pass_cost: 0.5,
            submit_cost_per_item: 0.5,
            elevator_cost: 1.0,
            charge_gain: 10.0,
            low_threshold: 25.0,
            charger_search_threshold: 50.0,
            rescue_threshold: 50.0,
        }
    }
}

/// Carrying capacity shared by every robot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CargoTuning {
    /// Maximum summed weight a robot may carry.
    pub weight_capacity: u32,
}

impl Default for CargoTuning {
    fn default() -> Self {
        Self { weight_capacity: 6 }
    }
}

/// Line-of-sight sensor parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SightTuning {
    /// Number of cells scanned ahead of the robot.
    pub range: u32,
    /// Reward granted per newly discovered cell.
    pub discovery_bonus: f32,
}

impl Default for SightTuning {
    fn default() -> Self {
        Self {
            range: 6,
            discovery_bonus: 1.0,
        }
    }
}

/// Weights of the single-step cost function `f(n)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicTuning {
    /// Multiplier applied to the visit counter of a candidate cell.
    pub history_weight: f32,
}

impl Default for HeuristicTuning {
    fn default() -> Self {
        Self {
            history_weight: 1.0,
        }
    }
}

/// Search budget and reward shaping for the tree search planner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsTuning {
    /// Number of select/expand/simulate/backpropagate passes per decision.
    pub iterations: u32,
    /// Maximum number of random actions taken by one rollout.
    pub rollout_depth: u32,
    /// UCB1 exploration constant.
    pub exploration: f64,
    /// Upper bound on nodes stored in one tree.
    pub max_nodes: usize,
    /// Reward for every successful move during a rollout.
    pub move_reward: f64,
    /// Penalty per cell of growth in distance to the nearest known exit.
    pub distance_penalty: f64,
    /// Reward per item submitted during a rollout.
    pub submit_reward: f64,
}

impl Default for MctsTuning {
    fn default() -> Self {
        Self {
            iterations: 128,
            rollout_depth: 16,
            exploration: std::f64::consts::SQRT_2,
            max_nodes: 2_048,
            move_reward: 0.1,
            distance_penalty: 0.5,
            submit_reward: 100.0,
        }
    }
}

/// Cadence of the obstacle cycling routine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    /// Number of obstacles generated per cycle. Zero disables cycling.
    pub count: u32,
    /// Ticks between two cycles.
    pub interval: u64,
    /// Re-roll budget per obstacle before the placement is abandoned.
    pub max_attempts: u32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            count: 0,
            interval: 50,
            max_attempts: 32,
        }
    }
}

/// Fleet composition and run seed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetTuning {
    /// Number of robots spawned when no explicit spawns are given.
    pub robots: u32,
    /// Whether all robots write into a single knowledge map.
    pub shared_knowledge: bool,
    /// Seed for every random stream of the run.
    pub seed: u64,
}

impl Default for FleetTuning {
    fn default() -> Self {
        Self {
            robots: 4,
            shared_knowledge: false,
            seed: 0x5eed_0f_ab1e,
        }
    }
}

/// Multi-floor layout: the map stacks floors of equal height vertically.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorTuning {
    /// Rows occupied by one floor. `None` describes a single-floor map.
    pub rows_per_floor: Option<u32>,
}

/// Ledger sizing when items are drawn from the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerTuning {
    /// Number of shelf items drawn into the ledger.
    pub entries: u32,
}

impl Default for LedgerTuning {
    fn default() -> Self {
        Self { entries: 8 }
    }
}

/// Run termination limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    /// Ticks after which the run is declared failed.
    pub tick_budget: u64,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self { tick_budget: 5_000 }
    }
}

/// Planner that picks robot actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerKind {
    /// Goal selection plus the visit-history cost function for every robot.
    #[default]
    Heuristic,
    /// Tree search for every robot, heuristic fallback when the search finds nothing.
    Mcts,
    /// Tree search for the lowest-id live robot, heuristic for the rest.
    Mixed,
}
