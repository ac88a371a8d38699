use sable_code::{Body, JoinPcs, LiveSlots, Pc, SubroutineMembership};
use smallvec::SmallVec;

use crate::domain::Domain;
use crate::entry::Entry;
use crate::error::{AiError, FailureContext, FatalKind};
use crate::result::{AiResult, Continuation, Snapshot};
use crate::state::{Locals, Operands};
use crate::tracer::{JoinOutcome, Tracer};
use crate::update::Update;

/// The abstract-interpretation engine.
///
/// An `Engine` holds only run-independent configuration, so one instance
/// may interpret many methods, including concurrently; every run's
/// mutable state is private to that run. Sharing one `Domain` instance
/// across concurrent runs is the domain implementor's responsibility.
#[derive(Clone, Copy, Debug, Default)]
pub struct Engine {
    dead_variables: bool,
}

impl Engine {
    pub fn new() -> Engine {
        Engine {
            dead_variables: false,
        }
    }

    /// Enable the dead-variables pass: at join points, local slots outside
    /// the precomputed live set are replaced with the dead marker before
    /// the state is stored. Purely an optimization, it never changes
    /// which PCs are evaluated.
    pub fn with_dead_variables(mut self, enabled: bool) -> Self {
        self.dead_variables = enabled;
        self
    }

    /// Interpret `body` with the locals initialized from `params`.
    pub fn interpret<D: Domain>(
        &self,
        body: &Body,
        params: Vec<D::Value>,
        domain: &mut D,
    ) -> Result<AiResult<D::Value>, AiError> {
        self.interpret_with(body, params, domain, &mut (), || false)
    }

    /// Interpret `body` with a tracer and an interruption predicate.
    ///
    /// The predicate is polled once per worklist iteration, before the
    /// next instruction is dispatched; when it returns `true` the run is
    /// checkpointed into [`AiResult::Aborted`] and can be continued with
    /// [`Engine::resume`].
    pub fn interpret_with<D: Domain, T: Tracer>(
        &self,
        body: &Body,
        params: Vec<D::Value>,
        domain: &mut D,
        tracer: &mut T,
        interrupt: impl FnMut() -> bool,
    ) -> Result<AiResult<D::Value>, AiError> {
        let mut run = Run::new(self, body, domain, tracer, interrupt);
        let locals = Locals::from_parameters(params, body.max_locals());
        if !body.is_empty() {
            run.operands[0] = Some(Operands::empty());
            run.locals[0] = Some(locals);
            run.worklist.push(Entry::Pc(Pc(0)));
        }
        run.run()
    }

    /// Continue an interrupted run from its saved continuation.
    ///
    /// `body` and `domain` must be the ones the aborted run was using;
    /// the result is then identical to an uninterrupted run.
    pub fn resume<D: Domain, T: Tracer>(
        &self,
        body: &Body,
        domain: &mut D,
        tracer: &mut T,
        interrupt: impl FnMut() -> bool,
        continuation: Continuation<D::Value>,
    ) -> Result<AiResult<D::Value>, AiError> {
        let mut run = Run::new(self, body, domain, tracer, interrupt);
        run.worklist = continuation.worklist;
        run.evaluated = continuation.evaluated;
        run.operands = continuation.operands;
        run.locals = continuation.locals;
        run.sub_operands = continuation.sub_operands;
        run.sub_locals = continuation.sub_locals;
        run.snapshots = continuation.snapshots;
        run.pending_returns = continuation.pending_returns;
        run.active_subroutines = continuation.active_subroutines;
        run.run()
    }
}

/// All mutable state of one interpretation run.
///
/// Owned arrays are indexed by PC and hold the snapshot taken *before*
/// that instruction executes; an absent entry means "not yet reached".
pub(crate) struct Run<'a, D: Domain, T, F> {
    pub(crate) body: &'a Body,
    pub(crate) domain: &'a mut D,
    pub(crate) tracer: &'a mut T,
    interrupt: F,
    dead_variables: bool,

    pub(crate) membership: SubroutineMembership,
    joins: JoinPcs,
    live: Option<LiveSlots>,

    pub(crate) worklist: Vec<Entry>,
    pub(crate) evaluated: Vec<Entry>,
    pub(crate) operands: Vec<Option<Operands<D::Value>>>,
    pub(crate) locals: Vec<Option<Locals<D::Value>>>,
    /// Accumulated per-PC states of completed subroutine bodies, joined
    /// across repeated entries; folded into the main arrays at loop exit.
    pub(crate) sub_operands: Vec<Option<Operands<D::Value>>>,
    pub(crate) sub_locals: Vec<Option<Locals<D::Value>>>,
    /// One caller-context snapshot per currently open subroutine call.
    pub(crate) snapshots: Vec<Snapshot<D::Value>>,
    /// Pending dynamic-return PCs, one set per open subroutine level.
    pub(crate) pending_returns: Vec<SmallVec<[Pc; 2]>>,
    /// Entry PCs of the currently open subroutines, outermost first.
    pub(crate) active_subroutines: Vec<Pc>,
}

impl<'a, D, T, F> Run<'a, D, T, F>
where
    D: Domain,
    T: Tracer,
    F: FnMut() -> bool,
{
    fn new(engine: &Engine, body: &'a Body, domain: &'a mut D, tracer: &'a mut T, interrupt: F) -> Self {
        let membership = SubroutineMembership::compute(body);
        let joins = JoinPcs::compute(body, &membership);
        let live = engine
            .dead_variables
            .then(|| LiveSlots::compute(body, &membership));
        let len = body.len();
        Run {
            body,
            domain,
            tracer,
            interrupt,
            dead_variables: engine.dead_variables,
            membership,
            joins,
            live,
            worklist: Vec::new(),
            evaluated: Vec::new(),
            operands: vec![None; len],
            locals: vec![None; len],
            sub_operands: vec![None; len],
            sub_locals: vec![None; len],
            snapshots: Vec::new(),
            pending_returns: Vec::new(),
            active_subroutines: Vec::new(),
        }
    }

    // -- Main loop ----------------------------------------------------------

    fn run(&mut self) -> Result<AiResult<D::Value>, AiError> {
        loop {
            if (self.interrupt)() {
                let continuation = self.checkpoint();
                self.tracer.result(false);
                return Ok(AiResult::Aborted(continuation));
            }
            let Some(&head) = self.worklist.first() else {
                break;
            };
            self.worklist.remove(0);
            match head {
                Entry::Pc(pc) => {
                    self.evaluated.push(Entry::Pc(pc));
                    self.tracer.instruction_evaluated(pc);
                    self.evaluate(pc)?;
                }
                Entry::SubroutineStart => self.resolve_subroutine()?,
                _ => return Err(self.fatal(None, FatalKind::UnexpectedSentinel)),
            }
        }
        self.finish()
    }

    /// Fold outstanding subroutine-only state into the main arrays and
    /// build the completed result.
    fn finish(&mut self) -> Result<AiResult<D::Value>, AiError> {
        for pc in self.body.pcs() {
            let i = pc.index();
            let (Some(sub_ops), Some(sub_locs)) =
                (self.sub_operands[i].take(), self.sub_locals[i].take())
            else {
                continue;
            };
            match (self.operands[i].take(), self.locals[i].take()) {
                (Some(ops), Some(locs)) => {
                    let merged = self
                        .domain
                        .join(pc, &ops, &locs, sub_ops, sub_locs)
                        .into_merged()
                        .unwrap_or((ops, locs));
                    self.operands[i] = Some(merged.0);
                    self.locals[i] = Some(merged.1);
                }
                _ => {
                    self.operands[i] = Some(sub_ops);
                    self.locals[i] = Some(sub_locs);
                }
            }
        }
        self.domain.at_end();
        self.tracer.result(true);
        Ok(AiResult::Completed {
            evaluated: std::mem::take(&mut self.evaluated),
            operands: std::mem::take(&mut self.operands),
            locals: std::mem::take(&mut self.locals),
        })
    }

    fn checkpoint(&self) -> Continuation<D::Value> {
        Continuation {
            worklist: self.worklist.clone(),
            evaluated: self.evaluated.clone(),
            operands: self.operands.clone(),
            locals: self.locals.clone(),
            sub_operands: self.sub_operands.clone(),
            sub_locals: self.sub_locals.clone(),
            snapshots: self.snapshots.clone(),
            pending_returns: self.pending_returns.clone(),
            active_subroutines: self.active_subroutines.clone(),
        }
    }

    // -- Successor scheduling (`goto_target`) -------------------------------

    /// The single successor-scheduling primitive: store (or join) the
    /// proposed state for `target` and update the worklist.
    pub(crate) fn goto_target(
        &mut self,
        pc: Pc,
        target: Pc,
        is_exceptional: bool,
        operands: Operands<D::Value>,
        locals: Locals<D::Value>,
    ) -> Result<(), AiError> {
        if target.index() >= self.body.len() {
            return Err(self.fatal(Some(pc), FatalKind::PcOutOfRange));
        }
        let (operands, mut locals) =
            self.domain
                .after_evaluation(pc, target, is_exceptional, operands, locals);

        let is_join = self.joins.is_join(target);
        if is_join && self.dead_variables {
            if let Some(live) = &self.live {
                let set = live.live_before(target);
                for (slot, v) in locals.slots_mut().iter_mut().enumerate() {
                    if v.is_some() && !set.contains(slot as u16) {
                        *v = None;
                    }
                }
            }
        }

        // An exceptional edge may leave the current subroutine nesting;
        // its state then belongs to the enclosing context's arrays (the
        // snapshot that will become current when the inner levels resolve).
        let unwind = if is_exceptional {
            self.unwind_count(target)
        } else {
            0
        };
        if unwind > 0 {
            self.tracer.abrupt_subroutine_termination(pc, target, unwind);
        }

        let Run {
            operands: main_ops,
            locals: main_locals,
            snapshots,
            active_subroutines,
            domain,
            worklist,
            tracer,
            ..
        } = self;
        let (ops_arr, locals_arr) = if unwind == 0 {
            (&mut **main_ops, &mut **main_locals)
        } else {
            let level = active_subroutines.len() - unwind;
            let snap = &mut snapshots[level];
            (&mut *snap.operands, &mut *snap.locals)
        };

        let i = target.index();
        if ops_arr[i].is_none() {
            ops_arr[i] = Some(operands);
            locals_arr[i] = Some(locals);
            schedule(worklist, target, is_join, unwind);
        } else if !is_join {
            // Re-reached via an alternate depth-first path: overwrite and
            // reschedule only if not already pending.
            ops_arr[i] = Some(operands);
            locals_arr[i] = Some(locals);
            if !is_pending(worklist, target, unwind) {
                schedule(worklist, target, false, unwind);
                tracer.rescheduled(pc, target);
            }
        } else {
            let old_ops = ops_arr[i].as_ref().expect("visited");
            let old_locals = locals_arr[i].as_ref().expect("visited");
            match domain.join(target, old_ops, old_locals, operands, locals) {
                Update::NoUpdate => {
                    tracer.join_outcome(target, JoinOutcome::NoUpdate);
                }
                Update::MetaInformation((o, l)) => {
                    // The merged state is stored but needs no fresh
                    // scheduling: if the target is still pending in the
                    // active context it will pick the state up there.
                    ops_arr[i] = Some(o);
                    locals_arr[i] = Some(l);
                    tracer.join_outcome(target, JoinOutcome::MetaInformation);
                }
                Update::Structural((o, l)) => {
                    ops_arr[i] = Some(o);
                    locals_arr[i] = Some(l);
                    tracer.join_outcome(target, JoinOutcome::Structural);
                    if !is_pending(worklist, target, unwind) {
                        schedule(worklist, target, true, unwind);
                        tracer.rescheduled(pc, target);
                    }
                }
            }
        }

        self.tracer.flow(pc, target, is_exceptional);
        self.domain.flow(pc, target, is_exceptional);
        Ok(())
    }

    /// How many subroutine levels an exceptional edge to `target` leaves.
    fn unwind_count(&self, target: Pc) -> usize {
        if self.active_subroutines.is_empty() {
            return 0;
        }
        match self.membership.entry_of(target) {
            None => self.active_subroutines.len(),
            Some(entry) => match self
                .active_subroutines
                .iter()
                .rposition(|&a| a == entry)
            {
                Some(i) => self.active_subroutines.len() - 1 - i,
                None => self.active_subroutines.len(),
            },
        }
    }

    // -- Failure wrapping ---------------------------------------------------

    pub(crate) fn fatal(&self, pc: Option<Pc>, kind: FatalKind) -> AiError {
        AiError::new(
            kind,
            FailureContext {
                pc,
                worklist: self.worklist.clone(),
                evaluated: self.evaluated.clone(),
            },
        )
    }
}

// -- Worklist manipulation --------------------------------------------------

/// Insert `target` into the scheduling region selected by `unwind` (the
/// number of `SubroutineMarker`s to skip first).
///
/// Within a region, non-join targets go to the front (depth-first bias)
/// while join targets are deferred to the region's end, just before the
/// enclosing `SubroutineStart`; joining late minimizes repeated
/// evaluations. This placement is a performance heuristic, not a
/// correctness invariant.
fn schedule(worklist: &mut Vec<Entry>, target: Pc, deferred: bool, unwind: usize) {
    let base = region_start(worklist, unwind);
    let pos = if deferred {
        worklist[base..]
            .iter()
            .position(|e| matches!(e, Entry::SubroutineStart))
            .map(|p| base + p)
            .unwrap_or(worklist.len())
    } else {
        base
    };
    worklist.insert(pos, Entry::Pc(target));
}

/// Whether `target` is already scheduled within the region selected by
/// `unwind` (up to the region's closing `SubroutineStart`).
fn is_pending(worklist: &[Entry], target: Pc, unwind: usize) -> bool {
    let base = region_start(worklist, unwind);
    worklist[base..]
        .iter()
        .take_while(|e| !matches!(e, Entry::SubroutineStart))
        .any(|e| *e == Entry::Pc(target))
}

/// Index of the first worklist slot after `unwind` `SubroutineMarker`s.
fn region_start(worklist: &[Entry], unwind: usize) -> usize {
    if unwind == 0 {
        return 0;
    }
    let mut seen = 0;
    for (i, e) in worklist.iter().enumerate() {
        if matches!(e, Entry::SubroutineMarker) {
            seen += 1;
            if seen == unwind {
                return i + 1;
            }
        }
    }
    worklist.len()
}
