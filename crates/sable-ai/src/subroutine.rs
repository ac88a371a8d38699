//! Call/return-within-a-method bookkeeping.
//!
//! A subroutine call pushes a return-address value, snapshots the
//! caller's arrays, and brackets the worklist with a sentinel block:
//! `SubroutineStart, [SubroutineReturnAddressLocal], SubroutineReturnTo,
//! SubroutineMarker`. PCs of the body are always scheduled before the
//! `SubroutineStart`, so the sentinel surfacing as the worklist head
//! means every path through the body has been explored; only then are
//! pending dynamic returns resolved, because the subroutine's end state
//! is a join over all paths and its return address may be returned to
//! only once per call.

use rustc_hash::FxHashSet;
use sable_code::{Instruction, Pc};
use smallvec::SmallVec;

use crate::domain::Domain;
use crate::entry::Entry;
use crate::error::{AiError, FatalKind};
use crate::interpreter::Run;
use crate::result::Snapshot;
use crate::state::{Locals, Operands};
use crate::tracer::Tracer;

impl<'a, D, T, F> Run<'a, D, T, F>
where
    D: Domain,
    T: Tracer,
    F: FnMut() -> bool,
{
    /// A `Jsr` at `pc`: open a new subroutine level and branch into the
    /// body with the return address on top of the stack.
    pub(crate) fn jsr(
        &mut self,
        pc: Pc,
        target: Pc,
        mut operands: Operands<D::Value>,
        locals: Locals<D::Value>,
    ) -> Result<(), AiError> {
        let return_to = pc.next();
        operands.push(self.domain.return_address(pc, return_to));

        self.snapshots
            .push(Snapshot::new(self.operands.clone(), self.locals.clone()));
        self.active_subroutines.push(target);
        self.pending_returns.push(SmallVec::new());

        let mut block: SmallVec<[Entry; 4]> = SmallVec::new();
        block.push(Entry::SubroutineStart);
        // If the body immediately stores the return address, the slot is
        // known now; otherwise it is recorded lazily at the first Ret.
        if let Some(Instruction::Store(slot)) = self.body.instruction(target) {
            block.push(Entry::SubroutineReturnAddressLocal(*slot));
        }
        block.push(Entry::SubroutineReturnTo(return_to));
        block.push(Entry::SubroutineMarker);
        self.worklist.splice(0..0, block);

        self.evaluated.push(Entry::SubroutineStart);
        self.tracer.subroutine_call(pc, target);
        self.goto_target(pc, target, false, operands, locals)
    }

    /// A `Ret` at `pc`: record the pending return and continue exploring
    /// the rest of the subroutine body. Resolution is deferred until the
    /// level's `SubroutineStart` surfaces.
    pub(crate) fn ret(
        &mut self,
        pc: Pc,
        slot: u16,
        locals: &Locals<D::Value>,
    ) -> Result<(), AiError> {
        if self.active_subroutines.is_empty() {
            return Err(self.fatal(Some(pc), FatalKind::RetOutsideSubroutine));
        }
        let value = locals
            .get(slot)
            .ok_or_else(|| self.fatal(Some(pc), FatalKind::DeadLocal { slot }))?;
        if self.domain.ret_address_of(value).is_none() {
            return Err(self.fatal(Some(pc), FatalKind::NotAReturnAddress { slot }));
        }

        let start = self
            .worklist
            .iter()
            .position(|e| matches!(e, Entry::SubroutineStart))
            .ok_or_else(|| self.fatal(Some(pc), FatalKind::MalformedSentinels))?;
        if !matches!(
            self.worklist.get(start + 1),
            Some(Entry::SubroutineReturnAddressLocal(_))
        ) {
            self.worklist
                .insert(start + 1, Entry::SubroutineReturnAddressLocal(slot));
        }

        let pending = self
            .pending_returns
            .last_mut()
            .expect("active subroutine has a pending set");
        if !pending.contains(&pc) {
            pending.push(pc);
        }
        Ok(())
    }

    /// The worklist head was this level's `SubroutineStart`: every path
    /// through the body has been explored. Fold the body's states into
    /// the accumulated subroutine tables, restore the caller context, and
    /// schedule the resolved returns.
    pub(crate) fn resolve_subroutine(&mut self) -> Result<(), AiError> {
        let mut ret_slot = None;
        if let Some(Entry::SubroutineReturnAddressLocal(slot)) = self.worklist.first() {
            ret_slot = Some(*slot);
            self.worklist.remove(0);
        }
        let Some(&Entry::SubroutineReturnTo(return_to)) = self.worklist.first() else {
            return Err(self.fatal(None, FatalKind::MalformedSentinels));
        };
        self.worklist.remove(0);
        if !matches!(self.worklist.first(), Some(Entry::SubroutineMarker)) {
            return Err(self.fatal(None, FatalKind::MalformedSentinels));
        }
        self.worklist.remove(0);
        self.evaluated.push(Entry::SubroutineEnd);

        let pending = self
            .pending_returns
            .pop()
            .ok_or_else(|| self.fatal(None, FatalKind::MalformedSentinels))?;
        let snapshot = self
            .snapshots
            .pop()
            .ok_or_else(|| self.fatal(None, FatalKind::MalformedSentinels))?;
        self.active_subroutines.pop();

        self.memorize_body_states();

        // Capture the per-return states before the caller context is
        // restored; clear the return-address slot so re-entries do not
        // merge stale addresses.
        let mut returns: Vec<(Pc, Operands<D::Value>, Locals<D::Value>)> = Vec::new();
        for &ret_pc in &pending {
            let operands = self.operands[ret_pc.index()]
                .clone()
                .ok_or_else(|| self.fatal(Some(ret_pc), FatalKind::MissingState))?;
            let mut locals = self.locals[ret_pc.index()]
                .clone()
                .ok_or_else(|| self.fatal(Some(ret_pc), FatalKind::MissingState))?;
            if let Some(slot) = ret_slot {
                locals.kill(slot);
            }
            returns.push((ret_pc, operands, locals));
        }

        self.operands = snapshot.operands;
        self.locals = snapshot.locals;

        // A body none of whose paths reached a Ret (every path throws) is
        // still folded back exactly once; nothing gets scheduled here.
        for (ret_pc, operands, locals) in returns {
            self.tracer.subroutine_return(ret_pc, return_to);
            self.goto_target(ret_pc, return_to, false, operands, locals)?;
        }
        Ok(())
    }

    /// Join the current main-array states of this level's own body PCs
    /// into the accumulated subroutine tables. Re-entries (e.g. a call
    /// inside a loop) join over the previous accumulation.
    fn memorize_body_states(&mut self) {
        let mut seen = FxHashSet::default();
        for pc in self.own_level_pcs() {
            if !seen.insert(pc) {
                continue;
            }
            let i = pc.index();
            let (Some(ops), Some(locs)) = (self.operands[i].clone(), self.locals[i].clone())
            else {
                continue;
            };
            match (self.sub_operands[i].take(), self.sub_locals[i].take()) {
                (Some(old_ops), Some(old_locs)) => {
                    let merged = self
                        .domain
                        .join(pc, &old_ops, &old_locs, ops, locs)
                        .into_merged()
                        .unwrap_or((old_ops, old_locs));
                    self.sub_operands[i] = Some(merged.0);
                    self.sub_locals[i] = Some(merged.1);
                }
                _ => {
                    self.sub_operands[i] = Some(ops);
                    self.sub_locals[i] = Some(locs);
                }
            }
        }
    }

    /// PCs dispatched within the level whose `SubroutineEnd` was just
    /// pushed, excluding nested (already closed) levels. Reconstructed
    /// from the evaluated history by matching start/end markers.
    fn own_level_pcs(&self) -> Vec<Pc> {
        let mut pcs = Vec::new();
        let mut depth = 0usize;
        // Skip the SubroutineEnd pushed by the caller.
        for entry in self.evaluated.iter().rev().skip(1) {
            match entry {
                Entry::SubroutineEnd => depth += 1,
                Entry::SubroutineStart => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Entry::Pc(pc) if depth == 0 => pcs.push(*pc),
                _ => {}
            }
        }
        pcs
    }
}
