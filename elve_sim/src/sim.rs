// Simulation state and tick loop.
//
// `SimState` owns the world, the Elves, their tasks, and the config. The sim
// is a function `(state, commands) -> (new_state, events)`: `step` advances
// tick by tick up to a target, and on each tick
//
//   1. applies the commands scheduled for that tick, in slice order;
//   2. ticks every Elve, in id order;
//   3. feeds the Elve outcomes to their tasks (start planting, plant).
//
// Every grid edit goes through `apply_edit`, which runs after connectivity
// has been recomputed (`World::set_voxel` does that synchronously). It
// cancels tasks whose cell is no longer plantable and, when solidity
// changed, replans every Elve whose remaining path runs within one cell of
// the edit. A replan that finds no route fails the Elve's task.
//
// A locomotion fault halts that Elve only; its task fails and the rest of
// the sim carries on.
//
// See also: `command.rs`, `event.rs`, `task.rs`, `elve.rs`.
//
// **Critical constraint: determinism.** Elves and tasks live in `BTreeMap`s,
// ids are sequential, and nothing reads the clock or a random source.

use crate::command::{SimAction, SimCommand};
use crate::config::{ConfigError, GameConfig, MotionParams};
use crate::elve::{AgentEvent, Elve};
use crate::event::{SimEvent, SimEventKind};
use crate::task::{self, Task, TaskState};
use crate::types::{CellPos, ElveId, Surface, VoxelType};
use crate::world::{VoxelChange, World};
use std::collections::BTreeMap;

/// The result of processing commands and advancing the simulation.
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    pub events: Vec<SimEvent>,
}

pub struct SimState {
    /// Last tick processed.
    pub tick: u64,
    /// Immutable after construction.
    pub config: GameConfig,
    motion: MotionParams,
    pub world: World,
    pub elves: BTreeMap<ElveId, Elve>,
    pub tasks: BTreeMap<ElveId, Task>,
    next_elve_id: u32,
}

impl SimState {
    pub fn new(world: World, config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let motion = config.motion();
        tracing::info!(
            width = world.grid().width(),
            height = world.grid().height(),
            tick_ms = config.tick_duration_ms,
            "simulation created"
        );
        Ok(Self {
            tick: 0,
            config,
            motion,
            world,
            elves: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_elve_id: 0,
        })
    }

    pub fn motion(&self) -> &MotionParams {
        &self.motion
    }

    pub fn elve(&self, id: ElveId) -> Option<&Elve> {
        self.elves.get(&id)
    }

    /// Apply `commands` and advance to `target_tick`.
    ///
    /// Commands must be sorted by tick. A command whose tick has already
    /// passed is applied on the first tick processed. Commands with tick >
    /// `target_tick` are ignored (caller error).
    pub fn step(&mut self, commands: &[SimCommand], target_tick: u64) -> StepResult {
        let mut events = Vec::new();
        let mut cmd_idx = 0;

        while self.tick < target_tick {
            self.tick += 1;

            while let Some(cmd) = commands.get(cmd_idx).filter(|c| c.tick <= self.tick) {
                cmd_idx += 1;
                self.apply_command(cmd, &mut events);
            }

            let outcomes: Vec<(ElveId, bool, AgentEvent)> = self
                .elves
                .iter_mut()
                .map(|(&id, elve)| {
                    let was_halted = elve.is_halted();
                    (id, was_halted, elve.tick(&self.world, &self.motion))
                })
                .collect();

            for (id, was_halted, outcome) in outcomes {
                self.handle_outcome(id, was_halted, outcome, &mut events);
            }
        }

        StepResult { events }
    }

    fn emit(&self, events: &mut Vec<SimEvent>, kind: SimEventKind) {
        events.push(SimEvent {
            tick: self.tick,
            kind,
        });
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn apply_command(&mut self, cmd: &SimCommand, events: &mut Vec<SimEvent>) {
        match cmd.action {
            SimAction::SetVoxel { pos, voxel } => self.set_voxel(pos, voxel, events),
            SimAction::SpawnElve { cell, surface } => self.spawn_elve(cell, surface, events),
            SimAction::MoveElve { elve, target } => self.move_elve(elve, target, events),
            SimAction::CancelMove { elve } => self.cancel_move(elve, events),
            SimAction::PlantSeed { elve, pos } => self.plant_seed(elve, pos, events),
        }
    }

    fn set_voxel(&mut self, pos: CellPos, voxel: VoxelType, events: &mut Vec<SimEvent>) {
        match self.world.set_voxel(pos, voxel) {
            Ok(change) => self.apply_edit(change, events),
            Err(err) => tracing::warn!(%err, "ignoring voxel edit"),
        }
    }

    fn spawn_elve(&mut self, cell: CellPos, surface: Surface, events: &mut Vec<SimEvent>) {
        match self.world.grid().try_get(cell) {
            Ok(voxel) if !voxel.is_solid() => {}
            Ok(_) => {
                tracing::warn!(%cell, "cannot spawn an Elve inside a solid cell");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "cannot spawn an Elve outside the grid");
                return;
            }
        }
        let id = ElveId(self.next_elve_id);
        self.next_elve_id += 1;
        self.elves.insert(id, Elve::new(id, cell, surface));
        tracing::info!(elve = %id, %cell, %surface, "Elve spawned");
        self.emit(
            events,
            SimEventKind::ElveSpawned {
                elve: id,
                cell,
                surface,
            },
        );
    }

    fn move_elve(&mut self, id: ElveId, target: CellPos, events: &mut Vec<SimEvent>) {
        if !self.elves.contains_key(&id) {
            tracing::warn!(elve = %id, "move for unknown Elve");
            return;
        }
        self.cancel_task(id, events);
        self.request_path(id, target, events);
    }

    fn cancel_move(&mut self, id: ElveId, events: &mut Vec<SimEvent>) {
        let Some(elve) = self.elves.get_mut(&id) else {
            tracing::warn!(elve = %id, "cancel for unknown Elve");
            return;
        };
        elve.cancel_path();
        self.cancel_task(id, events);
    }

    fn plant_seed(&mut self, id: ElveId, pos: CellPos, events: &mut Vec<SimEvent>) {
        if !self.elves.contains_key(&id) {
            tracing::warn!(elve = %id, "plant order for unknown Elve");
            return;
        }
        self.cancel_task(id, events);
        if !task::is_plantable(&self.world, pos) {
            self.fail_task_event(id, pos, task::REASON_CANNOT_PLANT, events);
            return;
        }
        if self.request_path(id, pos, events) {
            self.tasks.insert(id, Task::plant_seed(id, pos));
        } else {
            self.fail_task_event(id, pos, task::REASON_PATH_BLOCKED, events);
        }
    }

    /// Start `id` on a path to `target`. Returns false (and emits
    /// `PathFailed`) when no path is found.
    fn request_path(&mut self, id: ElveId, target: CellPos, events: &mut Vec<SimEvent>) -> bool {
        let Some(elve) = self.elves.get_mut(&id) else {
            return false;
        };
        match elve.start_path(&self.world, &self.config.pathing, &self.motion, target) {
            Ok(()) => true,
            Err(err) => {
                let halted = elve.is_halted();
                self.emit(
                    events,
                    SimEventKind::PathFailed {
                        elve: id,
                        target,
                        reason: err.to_string(),
                    },
                );
                if halted {
                    self.emit(
                        events,
                        SimEventKind::ElveHalted {
                            elve: id,
                            reason: err.to_string(),
                        },
                    );
                }
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// React to one grid edit whose connectivity is already up to date.
    fn apply_edit(&mut self, change: VoxelChange, events: &mut Vec<SimEvent>) {
        self.emit(
            events,
            SimEventKind::VoxelChanged {
                pos: change.pos,
                old: change.old,
                new: change.new,
            },
        );

        let doomed: Vec<ElveId> = self
            .tasks
            .values()
            .filter(|t| !t.still_possible(&self.world))
            .map(|t| t.elve)
            .collect();
        for id in doomed {
            if let Some(elve) = self.elves.get_mut(&id) {
                elve.cancel_path();
            }
            self.cancel_task(id, events);
        }

        if !change.changed_solidity() {
            return;
        }
        let affected: Vec<(ElveId, CellPos)> = self
            .elves
            .iter()
            .filter(|(_, e)| !e.is_halted())
            .filter(|(_, e)| e.follower().path_affected_by(e.cell(), change.pos))
            .filter_map(|(&id, e)| e.follower().target().map(|t| (id, t)))
            .collect();
        for (id, target) in affected {
            tracing::debug!(elve = %id, %target, edit = %change.pos, "replanning");
            if self.request_path(id, target, events) {
                self.emit(events, SimEventKind::PathReplanned { elve: id, target });
            } else if let Some(task) = self.tasks.remove(&id) {
                self.fail_task_event(id, task.kind.location(), task::REASON_PATH_BECAME_BLOCKED, events);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Elve outcomes and tasks
    // -----------------------------------------------------------------------

    fn handle_outcome(
        &mut self,
        id: ElveId,
        was_halted: bool,
        outcome: AgentEvent,
        events: &mut Vec<SimEvent>,
    ) {
        match outcome {
            AgentEvent::Idle | AgentEvent::Moving => {}
            AgentEvent::PathCompleted => {
                let Some(cell) = self.elves.get(&id).map(Elve::cell) else {
                    return;
                };
                self.emit(events, SimEventKind::PathCompleted { elve: id, cell });
                self.start_task_work(id, events);
            }
            AgentEvent::ActionFinished => self.finish_task_work(id, events),
            AgentEvent::Halted => {
                if was_halted {
                    return;
                }
                let reason = self
                    .elves
                    .get(&id)
                    .and_then(|e| e.fault())
                    .map(|f| f.to_string())
                    .unwrap_or_default();
                self.emit(events, SimEventKind::ElveHalted { elve: id, reason });
                if let Some(task) = self.tasks.remove(&id) {
                    self.fail_task_event(id, task.kind.location(), task::REASON_ELVE_HALTED, events);
                }
            }
        }
    }

    fn start_task_work(&mut self, id: ElveId, events: &mut Vec<SimEvent>) {
        let Some(task) = self.tasks.get_mut(&id) else {
            return;
        };
        if task.state != TaskState::MovingTo {
            return;
        }
        let Some(elve) = self.elves.get_mut(&id) else {
            return;
        };
        let ticks = self.motion.ticks_for_ms(self.config.plant_seed_ms);
        match elve.start_action(ticks, task.kind.work_surface(), &self.world, &self.motion) {
            Ok(()) => {
                task.state = TaskState::Planting;
                tracing::debug!(elve = %id, ticks, "planting started");
            }
            Err(err) => {
                let pos = task.kind.location();
                self.tasks.remove(&id);
                self.fail_task_event(id, pos, &err.to_string(), events);
            }
        }
    }

    fn finish_task_work(&mut self, id: ElveId, events: &mut Vec<SimEvent>) {
        let Some(task) = self.tasks.get(&id) else {
            return;
        };
        if task.state != TaskState::Planting {
            return;
        }
        let pos = task.kind.location();
        self.tasks.remove(&id);
        if !task::is_plantable(&self.world, pos) {
            self.fail_task_event(id, pos, task::REASON_CANNOT_PLANT, events);
            return;
        }
        match self.world.set_voxel(pos, VoxelType::WoodSeed) {
            Ok(change) => {
                tracing::info!(elve = %id, %pos, "seed planted");
                self.emit(events, SimEventKind::SeedPlanted { elve: id, pos });
                self.apply_edit(change, events);
            }
            Err(err) => self.fail_task_event(id, pos, &err.to_string(), events),
        }
    }

    /// Remove `id`'s task, if any, and report it cancelled.
    fn cancel_task(&mut self, id: ElveId, events: &mut Vec<SimEvent>) {
        if let Some(task) = self.tasks.remove(&id) {
            let pos = task.kind.location();
            tracing::info!(elve = %id, %pos, "task cancelled");
            self.emit(events, SimEventKind::TaskCancelled { elve: id, pos });
        }
    }

    fn fail_task_event(&self, id: ElveId, pos: CellPos, reason: &str, events: &mut Vec<SimEvent>) {
        tracing::warn!(elve = %id, %pos, reason, "task failed");
        self.emit(
            events,
            SimEventKind::TaskFailed {
                elve: id,
                pos,
                reason: reason.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(ascii: &str) -> SimState {
        SimState::new(World::from_ascii(ascii).unwrap(), GameConfig::default()).unwrap()
    }

    fn kinds(result: &StepResult) -> Vec<&SimEventKind> {
        result.events.iter().map(|e| &e.kind).collect()
    }

    #[test]
    fn spawn_assigns_sequential_ids() {
        let mut sim = sim("....\n####\n");
        let cmds = [
            SimCommand::at(
                1,
                SimAction::SpawnElve {
                    cell: CellPos::new(0, 1),
                    surface: Surface::Floor,
                },
            ),
            SimCommand::at(
                1,
                SimAction::SpawnElve {
                    cell: CellPos::new(3, 1),
                    surface: Surface::Floor,
                },
            ),
            // Solid cell: ignored.
            SimCommand::at(
                1,
                SimAction::SpawnElve {
                    cell: CellPos::new(0, 0),
                    surface: Surface::Floor,
                },
            ),
        ];
        let result = sim.step(&cmds, 1);
        assert_eq!(result.events.len(), 2);
        assert_eq!(sim.elves.len(), 2);
        assert_eq!(sim.elve(ElveId(1)).unwrap().cell(), CellPos::new(3, 1));
        assert_eq!(sim.tick, 1);
    }

    #[test]
    fn move_reports_completion_once() {
        let mut sim = sim("....\n####\n");
        let cmds = [
            SimCommand::at(
                1,
                SimAction::SpawnElve {
                    cell: CellPos::new(0, 1),
                    surface: Surface::Floor,
                },
            ),
            SimCommand::at(
                2,
                SimAction::MoveElve {
                    elve: ElveId(0),
                    target: CellPos::new(3, 1),
                },
            ),
        ];
        let result = sim.step(&cmds, 200);
        let completions = kinds(&result)
            .into_iter()
            .filter(|k| matches!(k, SimEventKind::PathCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(sim.elve(ElveId(0)).unwrap().cell(), CellPos::new(3, 1));
    }

    #[test]
    fn unreachable_move_fails() {
        let mut sim = sim("..#..\n..#..\n#####\n");
        let cmds = [
            SimCommand::at(
                1,
                SimAction::SpawnElve {
                    cell: CellPos::new(0, 1),
                    surface: Surface::Floor,
                },
            ),
            SimCommand::at(
                1,
                SimAction::MoveElve {
                    elve: ElveId(0),
                    target: CellPos::new(4, 1),
                },
            ),
        ];
        let result = sim.step(&cmds, 3);
        assert!(
            kinds(&result)
                .iter()
                .any(|k| matches!(k, SimEventKind::PathFailed { .. }))
        );
        assert!(sim.elve(ElveId(0)).unwrap().is_idle());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = GameConfig {
            tick_duration_ms: 0,
            ..GameConfig::default()
        };
        let world = World::from_ascii("..\n##\n").unwrap();
        assert!(SimState::new(world, config).is_err());
    }
}
