// Path follower: turns a `MovePath` into a sequence of locomotion states.
//
// `start_path` runs the search from the agent's current cell and, on
// success, immediately starts the state for the first edge. Each edge's
// delta selects the state: horizontal -> Walk, vertical -> Climb, diagonal
// -> CrossLedge. When the locomotion machine reports that a requested move
// has finished, the follower checks that the body landed in the cell the
// edge pointed at and starts the next edge. Exhausting the path is reported
// from `tick` as `FollowOutcome::PathCompleted`, exactly once per path.
//
// The follower never re-validates its path on its own. The owner calls
// `path_affected_by` after a grid edit and decides whether to replan.
//
// See also: `locomotion.rs` for the states, `pathfinding.rs` for the
// search, `elve.rs` which owns one follower per agent.

use crate::config::{MotionParams, PathingConfig};
use crate::locomotion::{Locomotion, LocomotionError, MoveState, TickOutcome};
use crate::pathfinding::{MovePath, PathError, Pathing};
use crate::types::CellPos;
use crate::world::World;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FollowError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Locomotion(#[from] LocomotionError),
}

/// What one follower tick amounted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    Idle,
    Moving,
    /// The last edge of the current path finished this tick.
    PathCompleted,
    /// A standalone state (not part of a path) finished this tick.
    ActionFinished,
}

#[derive(Clone, Debug, Default)]
pub struct PathFollower {
    path: Option<MovePath>,
    /// Cell the running edge should end in.
    expected: Option<CellPos>,
    /// Set for a zero-length path; reported on the next tick.
    completion_pending: bool,
    completed: bool,
}

impl PathFollower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&MovePath> {
        self.path.as_ref()
    }

    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    /// True once the most recent path has been walked to its end, until the
    /// next `start_path` or `cancel_path`.
    pub fn is_path_completed(&self) -> bool {
        self.completed
    }

    pub fn target(&self) -> Option<CellPos> {
        self.path.as_ref().map(|p| p.destination())
    }

    /// Find a route to `target` and start walking it. On failure the agent
    /// is left idle and nothing is stored.
    pub fn start_path(
        &mut self,
        loco: &mut Locomotion,
        world: &World,
        pathing: &PathingConfig,
        motion: &MotionParams,
        target: CellPos,
    ) -> Result<(), FollowError> {
        self.cancel_path(loco);
        let start = loco.body().cell;
        let path = Pathing::new(world, pathing).find_path(start, target)?;
        self.path = Some(path);
        if let Err(err) = self.begin_next_step(loco, world, motion) {
            self.cancel_path(loco);
            return Err(err.into());
        }
        Ok(())
    }

    /// Drop the remaining path and stop the agent where it stands.
    pub fn cancel_path(&mut self, loco: &mut Locomotion) {
        self.path = None;
        self.expected = None;
        self.completion_pending = false;
        self.completed = false;
        loco.stop();
    }

    /// Advance locomotion by one tick and feed it the next edge when the
    /// current one finishes.
    pub fn tick(
        &mut self,
        loco: &mut Locomotion,
        world: &World,
        motion: &MotionParams,
    ) -> Result<FollowOutcome, LocomotionError> {
        if self.completion_pending {
            self.finish();
            return Ok(FollowOutcome::PathCompleted);
        }
        let outcome = match loco.tick(world, motion) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.cancel_path(loco);
                return Err(err);
            }
        };
        match outcome {
            TickOutcome::Idle => Ok(FollowOutcome::Idle),
            TickOutcome::Running(_) => Ok(FollowOutcome::Moving),
            TickOutcome::Finished(_) => {
                let Some(expected) = self.expected.take() else {
                    return Ok(FollowOutcome::ActionFinished);
                };
                let actual = loco.body().cell;
                if actual != expected {
                    self.cancel_path(loco);
                    return Err(LocomotionError::Desync { expected, actual });
                }
                if let Err(err) = self.begin_next_step(loco, world, motion) {
                    self.cancel_path(loco);
                    return Err(err);
                }
                if self.completion_pending {
                    self.finish();
                    Ok(FollowOutcome::PathCompleted)
                } else {
                    Ok(FollowOutcome::Moving)
                }
            }
        }
    }

    /// Cells still to be visited, starting with the one the agent is in or
    /// heading out of.
    pub fn remaining_nodes(&self) -> Vec<CellPos> {
        self.path
            .as_ref()
            .map(|p| p.remaining_nodes().collect())
            .unwrap_or_default()
    }

    /// Whether an edit at `cell` may have broken the rest of the path: any
    /// remaining node, or the agent's own cell, within one cell of it.
    pub fn path_affected_by(&self, body_cell: CellPos, cell: CellPos) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        std::iter::once(body_cell)
            .chain(path.remaining_nodes())
            .any(|node| node.chebyshev_distance(cell) <= 1)
    }

    fn finish(&mut self) {
        self.completion_pending = false;
        self.path = None;
        self.expected = None;
        self.completed = true;
        tracing::trace!("path completed");
    }

    fn begin_next_step(
        &mut self,
        loco: &mut Locomotion,
        world: &World,
        motion: &MotionParams,
    ) -> Result<(), LocomotionError> {
        let Some(path) = self.path.as_mut() else {
            return Ok(());
        };
        let Some(step) = path.advance() else {
            self.completion_pending = true;
            return Ok(());
        };
        let here = loco.body().cell;
        if here != step.edge.from {
            return Err(LocomotionError::Desync {
                expected: step.edge.from,
                actual: here,
            });
        }
        let (dx, dy) = step.edge.delta();
        let state = MoveState::for_step(here, dx, dy)?;
        tracing::trace!(from = %here, to = %step.node, kind = %step.edge.kind, "next path edge");
        self.expected = Some(step.node);
        loco.start(state, world, motion)
    }
}
