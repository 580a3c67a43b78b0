// Per-agent locomotion state machine.
//
// One `MoveState` is active at a time (or none, meaning idle). A state is
// first *entered*: entry inspects the world and the body and either accepts
// (the state becomes active) or redirects to a prerequisite state that wraps
// the requested state as its follow-up. That is how a requested move gets the agent
// into position first: a ledge crossing requested while standing mid-cell
// becomes MoveToEdge -> CrossLedge, a walk onto a floorless cell becomes
// ChangeSurface(floor -> ceiling) -> Walk, and so on. Prerequisites nest
// (MoveToEdge -> ChangeSurface -> Climb) and collapse when already satisfied.
//
// Once active, a state is polled with `update` once per tick and reports
// `Continue` or `Done(follow_up)`. The machine enters the follow-up right
// away; only when a state finishes with no follow-up does `tick` report
// `Finished`, which is the signal the path follower waits for.
//
// States:
// - Walk:          slide one cell along a floor or ceiling.
// - Climb:         slide one cell along a wall.
// - ChangeSurface: timed rotation onto another face of the same cell.
// - MoveToEdge:    slide within the cell until flush with one boundary.
// - CrossLedge:    timed diagonal move around a corner into the next cell.
// - TimedAction:   stand still for a fixed number of ticks.
//
// Walk and Climb finish the moment the body enters the target cell. Ledge
// crossings finish by placing the body inside the new cell, a small standoff
// away from the corner it came around. All of it is integer arithmetic on
// `AgentBody`, so cell arrival is exact.
//
// A geometric contradiction (a rotation onto the same surface, a ledge that
// is not there, no wall to climb) is a `LocomotionError`. Errors are returned
// to the owner, which halts this agent only.
//
// See also: `body.rs` for the position model and clip ids, `follower.rs`
// which feeds path edges in, `config.rs` for `MotionParams`.

use crate::body::{AgentBody, AnimClip, Axis, SUBCELL};
use crate::config::MotionParams;
use crate::types::{CellPos, Facing, Surface};
use crate::world::World;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bound on consecutive redirects while entering one requested state.
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocomotionError {
    #[error("cannot change surface from {from} to {to}")]
    InvalidSurfaceTransition { from: Surface, to: Surface },
    #[error("expected to be on the {expected}, but clinging to the {actual}")]
    SurfaceMismatch { expected: Surface, actual: Surface },
    #[error("no surface to walk on between {from} and {to}")]
    SurfaceLost { from: CellPos, to: CellPos },
    #[error("no wall to climb from {cell} toward dy={dy}")]
    NoClimbWall { cell: CellPos, dy: i32 },
    #[error("no ledge at {cell} toward ({dx}, {dy})")]
    NoLedge { cell: CellPos, dx: i32, dy: i32 },
    #[error("({dx}, {dy}) is not a valid move direction")]
    InvalidDirection { dx: i32, dy: i32 },
    #[error("state entry kept redirecting")]
    TransitionLoop,
    #[error("expected to arrive at {expected}, but body is at {actual}")]
    Desync { expected: CellPos, actual: CellPos },
    #[error("agent is busy moving")]
    Busy,
}

/// Identity of the active state, for the renderer and for logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    Idle,
    Walk,
    Climb,
    ChangeSurface,
    MoveToEdge,
    CrossLedge,
    TimedAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocomotionEvent {
    Started(StateKind),
    Finished(StateKind),
    /// Abandoned by `stop` or replaced by `start` before finishing.
    Interrupted(StateKind),
}

/// Values fixed when a ledge crossing is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgeCrossing {
    pub ticks_left: u32,
    pub final_surface: Surface,
    pub clip: AnimClip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveState {
    Walk {
        dx: i32,
        target: CellPos,
    },
    Climb {
        dy: i32,
        target: CellPos,
    },
    ChangeSurface {
        from: Surface,
        to: Surface,
        ticks_left: u32,
        then: Option<Box<MoveState>>,
    },
    MoveToEdge {
        axis: Axis,
        edge: i32,
        then: Box<MoveState>,
    },
    CrossLedge {
        dx: i32,
        dy: i32,
        crossing: Option<LedgeCrossing>,
    },
    TimedAction {
        ticks_left: u32,
        surface: Surface,
    },
}

enum Entry {
    Run(MoveState),
    Redirect(MoveState),
}

enum Update {
    Continue,
    Done(Option<MoveState>),
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Something to stand on: solid below, or the bottom row of the grid.
fn floor_supported(world: &World, pos: CellPos) -> bool {
    pos.y == 0 || world.is_solid(pos.down())
}

fn ceiling_supported(world: &World, pos: CellPos) -> bool {
    world.is_solid(pos.up())
}

fn wall_supported(world: &World, pos: CellPos, wall: Surface) -> bool {
    match wall {
        Surface::LeftWall => world.is_solid(pos.left()),
        Surface::RightWall => world.is_solid(pos.right()),
        Surface::Floor | Surface::Ceiling => false,
    }
}

/// Boundary value a wall or horizontal surface sits flush against.
fn wall_edge(wall: Surface) -> i32 {
    if wall == Surface::LeftWall { 0 } else { SUBCELL }
}

fn toward(sign: i32) -> i32 {
    if sign > 0 { SUBCELL } else { 0 }
}

struct LedgeLayout {
    required: Surface,
    final_surface: Surface,
    clip: AnimClip,
}

/// Work out which kind of corner the diagonal move `(dx, dy)` out of `cell`
/// goes around.
fn ledge_layout(world: &World, cell: CellPos, dx: i32, dy: i32) -> Result<LedgeLayout, LocomotionError> {
    let side_solid = world.is_solid(cell.offset(dx, 0));
    let vert_solid = world.is_solid(cell.offset(0, dy));
    let corner = cell.offset(dx, dy);
    if world.is_solid(corner) || world.get(corner).is_none() {
        return Err(LocomotionError::NoLedge { cell, dx, dy });
    }

    let layout = match (dy, side_solid, vert_solid) {
        // Up over the top of the block beside us, ending on its top.
        (1, true, false) => LedgeLayout {
            required: Surface::wall_toward(dx),
            final_surface: Surface::Floor,
            clip: AnimClip::MountingLedge,
        },
        // Up around the end of the ceiling, ending on its side face.
        (1, false, true) => LedgeLayout {
            required: Surface::Ceiling,
            final_surface: Surface::wall_toward(-dx),
            clip: AnimClip::DroppingToLedgeUpsideDown,
        },
        // Off the end of the floor, down its side face.
        (-1, false, true) => {
            let final_surface = if floor_supported(world, corner) {
                Surface::Floor
            } else {
                Surface::wall_toward(-dx)
            };
            LedgeLayout {
                required: Surface::Floor,
                final_surface,
                clip: AnimClip::DroppingToLedge,
            }
        }
        // Down past the bottom of the wall beside us, onto its underside.
        (-1, true, false) => LedgeLayout {
            required: Surface::wall_toward(dx),
            final_surface: Surface::Ceiling,
            clip: AnimClip::MountingLedgeUpsideDown,
        },
        _ => return Err(LocomotionError::NoLedge { cell, dx, dy }),
    };
    Ok(layout)
}

/// Offsets after rotating from `from` to `to` within the same cell.
fn snap_after_turn(body: &mut AgentBody, from: Surface, to: Surface, motion: &MotionParams) {
    let lift = motion.corner_lift;
    let standoff = motion.wall_standoff;
    let oy = body.offset.y;
    match (from, to) {
        (Surface::Floor, Surface::Ceiling) => body.set_offset(Axis::Y, SUBCELL),
        (Surface::Ceiling, Surface::Floor) => body.set_offset(Axis::Y, 0),
        (Surface::Floor, wall) => {
            body.set_offset(Axis::X, wall_edge(wall));
            body.set_offset(Axis::Y, oy + lift);
        }
        (Surface::Ceiling, wall) => {
            body.set_offset(Axis::X, wall_edge(wall));
            body.set_offset(Axis::Y, oy - lift);
        }
        (wall, Surface::Floor | Surface::Ceiling) => {
            let x = if wall == Surface::LeftWall {
                standoff
            } else {
                SUBCELL - standoff
            };
            body.set_offset(Axis::X, x);
            body.set_offset(Axis::Y, if to == Surface::Floor { 0 } else { SUBCELL });
        }
        (_, wall) => body.set_offset(Axis::X, wall_edge(wall)),
    }
}

/// Offsets just inside the new cell after a ledge crossing.
fn place_after_crossing(body: &mut AgentBody, dx: i32, dy: i32, motion: &MotionParams) {
    let standoff = motion.wall_standoff;
    let lift = motion.corner_lift;
    let along_x = if dx > 0 { standoff } else { SUBCELL - standoff };
    let along_y = if dy > 0 { lift } else { SUBCELL - lift };
    match body.surface {
        Surface::Floor => {
            body.set_offset(Axis::X, along_x);
            body.set_offset(Axis::Y, 0);
        }
        Surface::Ceiling => {
            body.set_offset(Axis::X, along_x);
            body.set_offset(Axis::Y, SUBCELL);
        }
        wall => {
            body.set_offset(Axis::X, wall_edge(wall));
            body.set_offset(Axis::Y, along_y);
        }
    }
}

// ---------------------------------------------------------------------------
// MoveState
// ---------------------------------------------------------------------------

impl MoveState {
    /// The state that performs the unit move `(dx, dy)` from `from`.
    pub fn for_step(from: CellPos, dx: i32, dy: i32) -> Result<MoveState, LocomotionError> {
        if dx.abs() > 1 || dy.abs() > 1 || (dx == 0 && dy == 0) {
            return Err(LocomotionError::InvalidDirection { dx, dy });
        }
        Ok(match (dx, dy) {
            (_, 0) => MoveState::Walk {
                dx,
                target: from.offset(dx, 0),
            },
            (0, _) => MoveState::Climb {
                dy,
                target: from.offset(0, dy),
            },
            _ => MoveState::CrossLedge {
                dx,
                dy,
                crossing: None,
            },
        })
    }

    pub fn timed_action(ticks: u32, surface: Surface) -> MoveState {
        MoveState::TimedAction {
            ticks_left: ticks,
            surface,
        }
    }

    pub fn kind(&self) -> StateKind {
        match self {
            MoveState::Walk { .. } => StateKind::Walk,
            MoveState::Climb { .. } => StateKind::Climb,
            MoveState::ChangeSurface { .. } => StateKind::ChangeSurface,
            MoveState::MoveToEdge { .. } => StateKind::MoveToEdge,
            MoveState::CrossLedge { .. } => StateKind::CrossLedge,
            MoveState::TimedAction { .. } => StateKind::TimedAction,
        }
    }

    fn change_surface(from: Surface, to: Surface, then: MoveState) -> MoveState {
        MoveState::ChangeSurface {
            from,
            to,
            ticks_left: 0,
            then: Some(Box::new(then)),
        }
    }

    fn move_to_edge(axis: Axis, edge: i32, then: MoveState) -> MoveState {
        MoveState::MoveToEdge {
            axis,
            edge,
            then: Box::new(then),
        }
    }

    /// Rotate from `from` onto `to`, first sliding flush with the cell
    /// boundary the two surfaces meet at.
    fn turn_onto(from: Surface, to: Surface, then: MoveState) -> MoveState {
        let turn = MoveState::change_surface(from, to, then);
        match (from.is_wall(), to) {
            (false, Surface::LeftWall | Surface::RightWall) => {
                MoveState::move_to_edge(Axis::X, wall_edge(to), turn)
            }
            (true, Surface::Floor) => MoveState::move_to_edge(Axis::Y, 0, turn),
            (true, Surface::Ceiling) => MoveState::move_to_edge(Axis::Y, SUBCELL, turn),
            _ => turn,
        }
    }

    fn enter(
        self,
        body: &mut AgentBody,
        world: &World,
        motion: &MotionParams,
    ) -> Result<Entry, LocomotionError> {
        match self {
            MoveState::Walk { dx, target } => {
                let cell = body.cell;
                match body.surface {
                    Surface::Floor if !floor_supported(world, target) => {
                        if ceiling_supported(world, cell) && ceiling_supported(world, target) {
                            let walk = MoveState::Walk { dx, target };
                            Ok(Entry::Redirect(MoveState::change_surface(
                                Surface::Floor,
                                Surface::Ceiling,
                                walk,
                            )))
                        } else {
                            Err(LocomotionError::SurfaceLost { from: cell, to: target })
                        }
                    }
                    Surface::Ceiling if !ceiling_supported(world, target) => {
                        if floor_supported(world, cell) && floor_supported(world, target) {
                            let walk = MoveState::Walk { dx, target };
                            Ok(Entry::Redirect(MoveState::change_surface(
                                Surface::Ceiling,
                                Surface::Floor,
                                walk,
                            )))
                        } else {
                            Err(LocomotionError::SurfaceLost { from: cell, to: target })
                        }
                    }
                    wall if wall.is_wall() => {
                        // Step off the wall onto whichever horizontal
                        // surface carries the walk.
                        let onto = if floor_supported(world, cell) && floor_supported(world, target)
                        {
                            Surface::Floor
                        } else if ceiling_supported(world, cell) && ceiling_supported(world, target)
                        {
                            Surface::Ceiling
                        } else {
                            return Err(LocomotionError::SurfaceLost { from: cell, to: target });
                        };
                        let walk = MoveState::Walk { dx, target };
                        Ok(Entry::Redirect(MoveState::turn_onto(wall, onto, walk)))
                    }
                    surface => {
                        let edge = if surface == Surface::Floor { 0 } else { SUBCELL };
                        body.set_offset(Axis::Y, edge);
                        body.facing = Facing::from_dx(dx).unwrap_or(body.facing);
                        body.clip = AnimClip::travel(surface);
                        Ok(Entry::Run(MoveState::Walk { dx, target }))
                    }
                }
            }

            MoveState::Climb { dy, target } => {
                let cell = body.cell;
                let usable =
                    |wall: Surface| wall_supported(world, cell, wall) && wall_supported(world, target, wall);
                let surface = body.surface;
                if surface.is_wall() {
                    if usable(surface) {
                        body.set_offset(Axis::X, wall_edge(surface));
                        body.clip = AnimClip::ClimbingWall;
                        return Ok(Entry::Run(MoveState::Climb { dy, target }));
                    }
                    let other = surface.opposite();
                    if usable(other) {
                        let climb = MoveState::Climb { dy, target };
                        return Ok(Entry::Redirect(MoveState::change_surface(
                            surface, other, climb,
                        )));
                    }
                    return Err(LocomotionError::NoClimbWall { cell, dy });
                }
                let wall = [Surface::LeftWall, Surface::RightWall]
                    .into_iter()
                    .find(|&w| usable(w))
                    .ok_or(LocomotionError::NoClimbWall { cell, dy })?;
                let climb = MoveState::Climb { dy, target };
                Ok(Entry::Redirect(MoveState::turn_onto(surface, wall, climb)))
            }

            MoveState::ChangeSurface { from, to, then, .. } => {
                if from == to {
                    return Err(LocomotionError::InvalidSurfaceTransition { from, to });
                }
                if body.surface != from {
                    return Err(LocomotionError::SurfaceMismatch {
                        expected: from,
                        actual: body.surface,
                    });
                }
                body.clip = AnimClip::turn(from, to);
                Ok(Entry::Run(MoveState::ChangeSurface {
                    from,
                    to,
                    ticks_left: motion.change_surface_ticks,
                    then,
                }))
            }

            MoveState::MoveToEdge { axis, edge, then } => {
                if body.is_flush(axis, edge) {
                    return Ok(Entry::Redirect(*then));
                }
                if axis == Axis::X {
                    let dir = if edge > body.offset.x { 1 } else { -1 };
                    body.facing = Facing::from_dx(dir).unwrap_or(body.facing);
                }
                body.clip = AnimClip::travel(body.surface);
                Ok(Entry::Run(MoveState::MoveToEdge { axis, edge, then }))
            }

            MoveState::CrossLedge { dx, dy, .. } => {
                if dx.abs() != 1 || dy.abs() != 1 {
                    return Err(LocomotionError::InvalidDirection { dx, dy });
                }
                let layout = ledge_layout(world, body.cell, dx, dy)?;
                let pending = MoveState::CrossLedge {
                    dx,
                    dy,
                    crossing: None,
                };
                if body.surface != layout.required {
                    return Ok(Entry::Redirect(MoveState::turn_onto(
                        body.surface,
                        layout.required,
                        pending,
                    )));
                }
                let (axis, edge) = if layout.required.is_wall() {
                    (Axis::Y, toward(dy))
                } else {
                    (Axis::X, toward(dx))
                };
                if !body.is_flush(axis, edge) {
                    return Ok(Entry::Redirect(MoveState::move_to_edge(axis, edge, pending)));
                }
                body.facing = Facing::from_dx(dx).unwrap_or(body.facing);
                body.clip = layout.clip;
                Ok(Entry::Run(MoveState::CrossLedge {
                    dx,
                    dy,
                    crossing: Some(LedgeCrossing {
                        ticks_left: motion.cross_ledge_ticks,
                        final_surface: layout.final_surface,
                        clip: layout.clip,
                    }),
                }))
            }

            MoveState::TimedAction {
                ticks_left,
                surface,
            } => {
                if body.surface != surface {
                    let action = MoveState::TimedAction {
                        ticks_left,
                        surface,
                    };
                    return Ok(Entry::Redirect(MoveState::turn_onto(
                        body.surface,
                        surface,
                        action,
                    )));
                }
                body.clip = AnimClip::UseMagic(surface);
                Ok(Entry::Run(MoveState::TimedAction {
                    ticks_left,
                    surface,
                }))
            }
        }
    }

    fn update(&mut self, body: &mut AgentBody, motion: &MotionParams) -> Update {
        match self {
            MoveState::Walk { dx, target } => {
                body.slide(Axis::X, *dx, motion.walk_step);
                if body.cell == *target {
                    Update::Done(None)
                } else {
                    Update::Continue
                }
            }
            MoveState::Climb { dy, target } => {
                body.slide(Axis::Y, *dy, motion.climb_step);
                if body.cell == *target {
                    Update::Done(None)
                } else {
                    Update::Continue
                }
            }
            MoveState::ChangeSurface {
                from,
                to,
                ticks_left,
                then,
            } => {
                *ticks_left = ticks_left.saturating_sub(1);
                if *ticks_left > 0 {
                    return Update::Continue;
                }
                snap_after_turn(body, *from, *to, motion);
                body.surface = *to;
                body.clip = AnimClip::idle(*to);
                Update::Done(then.take().map(|b| *b))
            }
            MoveState::MoveToEdge { axis, edge, then } => {
                let step = if *axis == Axis::X {
                    motion.walk_step
                } else {
                    motion.climb_step
                };
                if body.slide_toward(*axis, *edge, step) {
                    let next = std::mem::replace(
                        then.as_mut(),
                        MoveState::timed_action(0, body.surface),
                    );
                    Update::Done(Some(next))
                } else {
                    Update::Continue
                }
            }
            MoveState::CrossLedge { dx, dy, crossing } => {
                let Some(crossing) = crossing else {
                    // Never accepted without a crossing; treat as finished.
                    return Update::Done(None);
                };
                crossing.ticks_left = crossing.ticks_left.saturating_sub(1);
                if crossing.ticks_left > 0 {
                    return Update::Continue;
                }
                body.cell = body.cell.offset(*dx, *dy);
                body.surface = crossing.final_surface;
                place_after_crossing(body, *dx, *dy, motion);
                body.clip = AnimClip::idle(body.surface);
                Update::Done(None)
            }
            MoveState::TimedAction { ticks_left, .. } => {
                *ticks_left = ticks_left.saturating_sub(1);
                if *ticks_left > 0 {
                    Update::Continue
                } else {
                    body.clip = AnimClip::idle(body.surface);
                    Update::Done(None)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Locomotion
// ---------------------------------------------------------------------------

/// What a tick of the state machine did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Running(StateKind),
    /// The requested movement (and every prerequisite it pulled in) is done.
    Finished(StateKind),
}

/// The state machine plus the body it moves.
#[derive(Clone, Debug)]
pub struct Locomotion {
    body: AgentBody,
    state: Option<MoveState>,
    events: Vec<LocomotionEvent>,
}

impl Locomotion {
    pub fn new(body: AgentBody) -> Self {
        Self {
            body,
            state: None,
            events: Vec::new(),
        }
    }

    pub fn body(&self) -> &AgentBody {
        &self.body
    }

    pub fn state(&self) -> Option<&MoveState> {
        self.state.as_ref()
    }

    pub fn state_kind(&self) -> StateKind {
        self.state.as_ref().map_or(StateKind::Idle, MoveState::kind)
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_none()
    }

    /// Take the transition log accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<LocomotionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Make `request` the active state, entering any prerequisites first.
    /// Requesting the state that is already active does nothing.
    pub fn start(
        &mut self,
        request: MoveState,
        world: &World,
        motion: &MotionParams,
    ) -> Result<(), LocomotionError> {
        if self.state.as_ref() == Some(&request) {
            return Ok(());
        }
        if let Some(current) = self.state.take() {
            self.events.push(LocomotionEvent::Interrupted(current.kind()));
        }
        self.activate(request, world, motion)
    }

    /// Abandon whatever is running. The body stays exactly where it is.
    pub fn stop(&mut self) {
        if let Some(current) = self.state.take() {
            tracing::trace!(state = ?current.kind(), cell = %self.body.cell, "locomotion stopped");
            self.events.push(LocomotionEvent::Interrupted(current.kind()));
        }
        self.body.clip = AnimClip::idle(self.body.surface);
    }

    fn activate(
        &mut self,
        request: MoveState,
        world: &World,
        motion: &MotionParams,
    ) -> Result<(), LocomotionError> {
        let mut next = request;
        for _ in 0..MAX_REDIRECTS {
            match next.enter(&mut self.body, world, motion)? {
                Entry::Run(state) => {
                    let kind = state.kind();
                    tracing::trace!(
                        state = ?kind,
                        cell = %self.body.cell,
                        surface = %self.body.surface,
                        "locomotion state started"
                    );
                    self.events.push(LocomotionEvent::Started(kind));
                    self.state = Some(state);
                    return Ok(());
                }
                Entry::Redirect(state) => next = state,
            }
        }
        Err(LocomotionError::TransitionLoop)
    }

    /// Advance the active state by one tick.
    pub fn tick(&mut self, world: &World, motion: &MotionParams) -> Result<TickOutcome, LocomotionError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(TickOutcome::Idle);
        };
        let kind = state.kind();
        match state.update(&mut self.body, motion) {
            Update::Continue => Ok(TickOutcome::Running(kind)),
            Update::Done(follow_up) => {
                self.state = None;
                self.events.push(LocomotionEvent::Finished(kind));
                match follow_up {
                    Some(next) => {
                        self.activate(next, world, motion)?;
                        Ok(TickOutcome::Running(self.state_kind()))
                    }
                    None => {
                        if !matches!(self.body.clip, AnimClip::UseMagic(_)) {
                            self.body.clip = AnimClip::idle(self.body.surface);
                        }
                        Ok(TickOutcome::Finished(kind))
                    }
                }
            }
        }
    }
}
