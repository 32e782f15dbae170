//! lanes-sim: seeded gesture simulation against a [`Board`].
//!
//! Each seed builds a board, then fires a stream of random gestures at it:
//! drops onto items, columns and nothing, direct moves with overshooting
//! indices, invalid requests, creations and removals. After every step the
//! [`InvariantOracle`] checks the board. A failing seed replays exactly.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` for return types.
//! - **Logging**: `tracing` macros; nothing here installs a subscriber.

pub mod campaign;
pub mod gesture;
pub mod oracle;
pub mod rng;

use anyhow::{Context, Result};
use lanes_core::{
    Board, DropTarget, ItemId, MoveInstruction, NewItem, StatusKey, StatusSet, WorkItem,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use gesture::{Gesture, Outcome};
pub use oracle::{InvariantOracle, InvariantViolation, OracleResult, StepView};
pub use rng::DeterministicRng;

/// Status name that is never configured; used to provoke rejections.
const UNKNOWN_STATUS: &str = "ARCHIVE";

/// Per-seed simulation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Gestures to fire.
    pub steps: usize,
    /// Items on the board before the first gesture.
    pub initial_items: usize,
    pub create_percent: u8,
    pub remove_percent: u8,
    pub miss_percent: u8,
    /// Gestures naming an unknown status or item.
    pub invalid_percent: u8,
    /// How far past a column's end a direct move may aim.
    pub overshoot: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            steps: 200,
            initial_items: 12,
            create_percent: 10,
            remove_percent: 8,
            miss_percent: 10,
            invalid_percent: 5,
            overshoot: 3,
        }
    }
}

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub step: usize,
    #[serde(flatten)]
    pub gesture: Gesture,
    pub result: Outcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub applied: usize,
    pub noops: usize,
    pub discarded: usize,
    pub rejected: usize,
}

impl SimStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied { changes } => {
                self.applied += 1;
                if *changes == 0 {
                    self.noops += 1;
                }
            }
            Outcome::Discarded => self.discarded += 1,
            Outcome::Rejected { .. } => self.rejected += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub seed: u64,
    pub trace: Vec<TraceEvent>,
    pub final_items: Vec<WorkItem>,
    pub stats: SimStats,
    pub oracle: OracleResult,
}

impl SimulationResult {
    /// FNV-1a over the serialized trace; equal fingerprints mean the same run.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the trace cannot be encoded as JSON.
    pub fn trace_fingerprint(&self) -> serde_json::Result<u64> {
        let bytes = serde_json::to_vec(&self.trace)?;
        Ok(fnv1a(&bytes))
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Drives one board through a seeded gesture stream.
#[derive(Debug)]
pub struct Simulator {
    config: SimulationConfig,
    rng: DeterministicRng,
    board: Board,
    next_id: usize,
}

impl Simulator {
    /// Build the simulator and seed the board with `initial_items` items.
    ///
    /// # Errors
    ///
    /// Fails if the seeded board does not restore.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let mut rng = DeterministicRng::new(config.seed);
        let statuses = StatusSet::default();
        let mut items: Vec<WorkItem> = Vec::with_capacity(config.initial_items);
        for n in 0..config.initial_items {
            let status = rng.pick(statuses.as_slice()).unwrap_or(statuses.first()).clone();
            let tail = items.iter().filter(|i| i.status == status).count();
            items.push(WorkItem::new(format!("s-{n}"), format!("Sim item {n}"), status, tail));
        }

        let board = Board::new(statuses);
        board.restore(items).context("seeding simulation board")?;

        Ok(Self {
            next_id: config.initial_items,
            config,
            rng,
            board,
        })
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Fire every configured gesture, checking invariants after each.
    ///
    /// # Errors
    ///
    /// Reserved for harness failures; invariant breaks are reported in the
    /// result instead.
    pub fn run(&mut self) -> Result<SimulationResult> {
        let mut trace = Vec::with_capacity(self.config.steps);
        let mut stats = SimStats::default();
        let mut oracle = InvariantOracle::check_board(0, &self.board.items());

        for step in 1..=self.config.steps {
            let before = self.board.items();
            let gesture = self.next_gesture(&before);
            let outcome = self.apply(&gesture);
            let after = self.board.items();
            debug!(step, %gesture, ?outcome, "sim step");

            let view = StepView {
                step,
                gesture: &gesture,
                outcome: &outcome,
                before: &before,
                after: &after,
            };
            oracle = oracle.merge(InvariantOracle::check_step(&view));
            stats.record(&outcome);
            trace.push(TraceEvent {
                step,
                gesture,
                result: outcome,
            });
        }

        info!(
            seed = self.config.seed,
            steps = self.config.steps,
            applied = stats.applied,
            rejected = stats.rejected,
            passed = oracle.passed,
            "simulation finished"
        );

        Ok(SimulationResult {
            seed: self.config.seed,
            trace,
            final_items: self.board.items(),
            stats,
            oracle,
        })
    }

    fn next_gesture(&mut self, items: &[WorkItem]) -> Gesture {
        let statuses = self.board.statuses().as_slice().to_vec();
        let random_status = |rng: &mut DeterministicRng| {
            rng.pick(&statuses)
                .cloned()
                .unwrap_or_else(|| StatusKey::from(UNKNOWN_STATUS))
        };

        let picked = self.rng.pick(items).map(|i| i.id.clone());
        let Some(subject) = picked else {
            let status = random_status(&mut self.rng);
            return self.create(status);
        };

        if self.rng.chance(self.config.create_percent) {
            let status = random_status(&mut self.rng);
            return self.create(status);
        }
        if self.rng.chance(self.config.remove_percent) {
            return Gesture::Remove { id: subject };
        }
        if self.rng.chance(self.config.miss_percent) {
            return Gesture::Miss { dragged: subject };
        }
        if self.rng.chance(self.config.invalid_percent) {
            return match self.rng.below(3) {
                0 => Gesture::Move {
                    item: subject,
                    status: UNKNOWN_STATUS.into(),
                    index: 0,
                },
                1 => Gesture::Move {
                    item: ItemId::from(format!("ghost-{}", self.rng.below(100))),
                    status: random_status(&mut self.rng),
                    index: 0,
                },
                _ => Gesture::DropOnItem {
                    dragged: subject,
                    target: "ghost".into(),
                },
            };
        }

        match self.rng.below(3) {
            0 => {
                let target = self
                    .rng
                    .pick(items)
                    .map_or_else(|| subject.clone(), |i| i.id.clone());
                Gesture::DropOnItem {
                    dragged: subject,
                    target,
                }
            }
            1 => Gesture::DropOnColumn {
                dragged: subject,
                status: random_status(&mut self.rng),
            },
            _ => {
                let status = random_status(&mut self.rng);
                let len = items.iter().filter(|i| i.status == status).count();
                let index = self.rng.below(len + 1 + self.config.overshoot);
                Gesture::Move {
                    item: subject,
                    status,
                    index,
                }
            }
        }
    }

    fn create(&mut self, status: StatusKey) -> Gesture {
        let id = ItemId::from(format!("s-{}", self.next_id));
        self.next_id += 1;
        Gesture::Create { id, status }
    }

    fn apply(&self, gesture: &Gesture) -> Outcome {
        match gesture {
            Gesture::DropOnItem { dragged, target } => {
                self.drop(dragged, &DropTarget::Item(target.clone()))
            }
            Gesture::DropOnColumn { dragged, status } => {
                self.drop(dragged, &DropTarget::EmptyColumn(status.clone()))
            }
            Gesture::Miss { dragged } => self.drop(dragged, &DropTarget::Miss),
            Gesture::Move {
                item,
                status,
                index,
            } => Outcome::from_report(self.board.move_item(&MoveInstruction::new(
                item.clone(),
                status.clone(),
                *index,
            ))),
            Gesture::Create { id, status } => {
                let new = NewItem::new(id.clone(), format!("Sim item {id}"), status.clone());
                match self.board.add_item(new) {
                    Ok(_) => Outcome::Applied { changes: 1 },
                    Err(err) => Outcome::rejected(&err),
                }
            }
            Gesture::Remove { id } => match self.board.remove_item(id) {
                Ok(_) => Outcome::Applied { changes: 1 },
                Err(err) => Outcome::rejected(&err),
            },
        }
    }

    fn drop(&self, dragged: &ItemId, target: &DropTarget) -> Outcome {
        match self.board.drop_item(dragged, target) {
            Ok(Some(report)) => Outcome::from_report(Ok(report)),
            Ok(None) => Outcome::Discarded,
            Err(err) => Outcome::rejected(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_board_is_dense() {
        let sim = Simulator::new(SimulationConfig {
            initial_items: 20,
            ..SimulationConfig::default()
        })
        .unwrap();
        let items = sim.board().items();
        assert_eq!(items.len(), 20);
        assert!(InvariantOracle::check_board(0, &items).passed);
    }

    #[test]
    fn empty_board_starts_with_a_create() {
        let mut sim = Simulator::new(SimulationConfig {
            initial_items: 0,
            steps: 1,
            ..SimulationConfig::default()
        })
        .unwrap();
        let result = sim.run().unwrap();
        assert!(matches!(result.trace[0].gesture, Gesture::Create { .. }));
        assert_eq!(result.final_items.len(), 1);
    }

    #[test]
    fn run_is_deterministic_per_seed() {
        let config = SimulationConfig {
            seed: 11,
            ..SimulationConfig::default()
        };
        let a = Simulator::new(config.clone()).unwrap().run().unwrap();
        let b = Simulator::new(config).unwrap().run().unwrap();
        assert_eq!(a.trace, b.trace);
        assert_eq!(a.final_items, b.final_items);
        assert_eq!(a.trace_fingerprint().unwrap(), b.trace_fingerprint().unwrap());
    }

    #[test]
    fn fingerprint_covers_the_whole_trace() {
        let result = Simulator::new(SimulationConfig::default())
            .unwrap()
            .run()
            .unwrap();
        let full = result.trace_fingerprint().unwrap();
        assert_eq!(full, fnv1a(&serde_json::to_vec(&result.trace).unwrap()));

        let mut shorter = result.clone();
        shorter.trace.pop();
        assert_ne!(shorter.trace_fingerprint().unwrap(), full);

        let empty = SimulationResult {
            trace: Vec::new(),
            ..result
        };
        assert_eq!(empty.trace_fingerprint().unwrap(), fnv1a(b"[]"));
    }

    #[test]
    fn default_run_passes_the_oracle() {
        let result = Simulator::new(SimulationConfig::default())
            .unwrap()
            .run()
            .unwrap();
        assert!(result.oracle.passed, "{:?}", result.oracle.violations);
        assert_eq!(result.trace.len(), 200);
        let stats = result.stats;
        assert_eq!(
            stats.applied + stats.discarded + stats.rejected,
            result.trace.len()
        );
    }

    #[test]
    fn trace_serializes_with_flat_gesture_tags() {
        let event = TraceEvent {
            step: 1,
            gesture: Gesture::Miss { dragged: "s-0".into() },
            result: Outcome::Discarded,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["gesture"], "miss");
        assert_eq!(json["result"]["outcome"], "discarded");
    }
}
