// An Elve agent: one body, one locomotion machine, one path follower.
//
// `Elve` is the unit the simulation ticks. It forwards path requests to its
// `PathFollower`, runs timed actions (planting) directly on its locomotion
// machine, and converts each tick into an `AgentEvent` for the owner.
//
// A `LocomotionError` during a tick is a broken invariant for this agent
// only. The Elve records it as its fault, logs it, drops its path and stops
// moving. Further ticks report `Halted` until `clear_fault` is called; other
// agents are unaffected.
//
// See also: `follower.rs`, `locomotion.rs`, `sim.rs` which owns the Elves.

use crate::body::{AgentBody, AnimClip};
use crate::config::{MotionParams, PathingConfig};
use crate::follower::{FollowError, FollowOutcome, PathFollower};
use crate::locomotion::{Locomotion, LocomotionError, LocomotionEvent, MoveState, StateKind};
use crate::pathfinding::PathError;
use crate::types::{CellPos, ElveId, Surface};
use crate::world::World;

/// What happened to an Elve during one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentEvent {
    Idle,
    Moving,
    PathCompleted,
    ActionFinished,
    /// Faulted this tick or earlier and is not moving.
    Halted,
}

#[derive(Clone, Debug)]
pub struct Elve {
    pub id: ElveId,
    locomotion: Locomotion,
    follower: PathFollower,
    fault: Option<LocomotionError>,
}

impl Elve {
    pub fn new(id: ElveId, cell: CellPos, surface: Surface) -> Self {
        Self {
            id,
            locomotion: Locomotion::new(AgentBody::new(cell, surface)),
            follower: PathFollower::new(),
            fault: None,
        }
    }

    pub fn body(&self) -> &AgentBody {
        self.locomotion.body()
    }

    pub fn cell(&self) -> CellPos {
        self.locomotion.body().cell
    }

    pub fn surface(&self) -> Surface {
        self.locomotion.body().surface
    }

    pub fn clip(&self) -> AnimClip {
        self.locomotion.body().clip
    }

    pub fn state_kind(&self) -> StateKind {
        self.locomotion.state_kind()
    }

    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }

    pub fn fault(&self) -> Option<&LocomotionError> {
        self.fault.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.locomotion.is_idle() && !self.follower.has_path()
    }

    pub fn drain_locomotion_events(&mut self) -> Vec<LocomotionEvent> {
        self.locomotion.drain_events()
    }

    pub fn start_path(
        &mut self,
        world: &World,
        pathing: &PathingConfig,
        motion: &MotionParams,
        target: CellPos,
    ) -> Result<(), FollowError> {
        if self.is_halted() {
            return Err(PathError::AgentHalted.into());
        }
        let result = self
            .follower
            .start_path(&mut self.locomotion, world, pathing, motion, target);
        match &result {
            Ok(()) => tracing::debug!(elve = %self.id, %target, "path started"),
            Err(FollowError::Locomotion(err)) => self.halt(err.clone()),
            Err(FollowError::Path(err)) => {
                tracing::warn!(elve = %self.id, %target, %err, "path request failed");
            }
        }
        result
    }

    pub fn cancel_path(&mut self) {
        self.follower.cancel_path(&mut self.locomotion);
    }

    /// Stand still on `surface` for `ticks` ticks. Only an idle Elve can
    /// start an action.
    pub fn start_action(
        &mut self,
        ticks: u32,
        surface: Surface,
        world: &World,
        motion: &MotionParams,
    ) -> Result<(), LocomotionError> {
        if !self.is_idle() || self.is_halted() {
            return Err(LocomotionError::Busy);
        }
        self.locomotion
            .start(MoveState::timed_action(ticks, surface), world, motion)
    }

    pub fn tick(&mut self, world: &World, motion: &MotionParams) -> AgentEvent {
        if self.is_halted() {
            return AgentEvent::Halted;
        }
        match self.follower.tick(&mut self.locomotion, world, motion) {
            Ok(FollowOutcome::Idle) => AgentEvent::Idle,
            Ok(FollowOutcome::Moving) => AgentEvent::Moving,
            Ok(FollowOutcome::PathCompleted) => AgentEvent::PathCompleted,
            Ok(FollowOutcome::ActionFinished) => AgentEvent::ActionFinished,
            Err(err) => {
                self.halt(err);
                AgentEvent::Halted
            }
        }
    }

    fn halt(&mut self, err: LocomotionError) {
        tracing::error!(
            elve = %self.id,
            cell = %self.cell(),
            surface = %self.surface(),
            error = %err,
            "locomotion fault, halting agent"
        );
        self.follower.cancel_path(&mut self.locomotion);
        self.fault = Some(err);
    }

    /// Resume after a fault. The Elve stays where it stopped.
    pub fn clear_fault(&mut self) -> Option<LocomotionError> {
        self.fault.take()
    }
}
