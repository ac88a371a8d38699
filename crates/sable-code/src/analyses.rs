//! Per-method precomputations: join-point detection, subroutine
//! membership, and backward local-slot liveness.
//!
//! All three are computed once from the instruction sequence and the
//! exception-handler table, before interpretation starts.

use smallvec::SmallVec;

use crate::body::Body;
use crate::instr::{Instruction, Pc};

/// Dense bitset over local-variable slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotSet {
    words: SmallVec<[u64; 2]>,
}

impl SlotSet {
    pub fn empty(slots: u16) -> Self {
        let words = (slots as usize).div_ceil(64).max(1);
        SlotSet {
            words: SmallVec::from_elem(0, words),
        }
    }

    pub fn insert(&mut self, slot: u16) {
        self.words[slot as usize / 64] |= 1 << (slot % 64);
    }

    pub fn remove(&mut self, slot: u16) {
        self.words[slot as usize / 64] &= !(1 << (slot % 64));
    }

    pub fn contains(&self, slot: u16) -> bool {
        self.words
            .get(slot as usize / 64)
            .is_some_and(|w| w & (1 << (slot % 64)) != 0)
    }

    /// Add all slots of `other`; returns whether anything changed.
    pub fn union_with(&mut self, other: &SlotSet) -> bool {
        let mut changed = false;
        for (w, o) in self.words.iter_mut().zip(other.words.iter()) {
            let merged = *w | *o;
            changed |= merged != *w;
            *w = merged;
        }
        changed
    }
}

/// Maps every PC to the entry PC of the innermost subroutine whose body
/// it belongs to; `None` means the method body proper.
///
/// Membership is claimed by a forward walk from each `Jsr` target. A
/// nested `Jsr` inside a subroutine body contributes its return target to
/// the current subroutine but not the nested body. A handler is claimed
/// by a subroutine only once its entire covered range belongs to it.
#[derive(Clone, Debug)]
pub struct SubroutineMembership {
    entry_of: Vec<Option<Pc>>,
}

impl SubroutineMembership {
    pub fn compute(body: &Body) -> Self {
        let mut entry_of: Vec<Option<Pc>> = vec![None; body.len()];

        let jsr_targets: Vec<Pc> = body
            .instructions()
            .iter()
            .filter_map(|i| match i {
                Instruction::Jsr(t) => Some(*t),
                _ => None,
            })
            .collect();

        for &entry in &jsr_targets {
            claim(body, &mut entry_of, entry, entry);
        }

        // Handlers fully covered by a subroutine body belong to it, and
        // claiming one may make further handlers claimable.
        loop {
            let mut changed = false;
            for h in body.handlers() {
                if entry_of
                    .get(h.handler.index())
                    .is_some_and(|m| m.is_none())
                {
                    let range = h.start.0..h.end.0;
                    let owner = range
                        .clone()
                        .map(|pc| entry_of[pc as usize])
                        .reduce(|a, b| if a == b { a } else { None })
                        .flatten();
                    if let Some(owner) = owner {
                        claim(body, &mut entry_of, h.handler, owner);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        SubroutineMembership { entry_of }
    }

    /// The innermost subroutine entry `pc` belongs to, or `None` for the
    /// method body proper.
    pub fn entry_of(&self, pc: Pc) -> Option<Pc> {
        self.entry_of.get(pc.index()).copied().flatten()
    }
}

/// Forward walk claiming unowned PCs for `owner`, not descending into
/// nested subroutine bodies.
fn claim(body: &Body, entry_of: &mut [Option<Pc>], start: Pc, owner: Pc) {
    let mut stack = vec![start];
    while let Some(pc) = stack.pop() {
        let Some(slot) = entry_of.get_mut(pc.index()) else {
            continue;
        };
        if slot.is_some() {
            continue;
        }
        *slot = Some(owner);
        let Some(instr) = body.instruction(pc) else {
            continue;
        };
        match instr {
            // The nested body is owned by the nested subroutine; only the
            // return target stays with the current one.
            Instruction::Jsr(_) => stack.push(pc.next()),
            Instruction::Ret(_) => {}
            _ => {
                if instr.falls_through() {
                    stack.push(pc.next());
                }
                stack.extend(instr.branch_targets());
            }
        }
    }
}

/// PCs with more than one incoming control-flow edge. `join` is invoked
/// only for these.
#[derive(Clone, Debug)]
pub struct JoinPcs {
    joins: Vec<bool>,
}

impl JoinPcs {
    pub fn compute(body: &Body, membership: &SubroutineMembership) -> Self {
        let mut preds = vec![0u32; body.len()];
        let mut bump = |pc: Pc| {
            if let Some(p) = preds.get_mut(pc.index()) {
                *p += 1;
            }
        };

        for pc in body.pcs() {
            let instr = body.instruction(pc).expect("pc in range");
            match instr {
                // The edge into the instruction after a Jsr comes from the
                // subroutine's dynamic return, not from the Jsr itself.
                Instruction::Jsr(t) => bump(*t),
                Instruction::Ret(_) => {
                    let owner = membership.entry_of(pc);
                    for caller in body.pcs() {
                        if let Some(Instruction::Jsr(t)) = body.instruction(caller) {
                            if Some(*t) == owner {
                                bump(caller.next());
                            }
                        }
                    }
                }
                _ => {
                    if instr.falls_through() {
                        bump(pc.next());
                    }
                    for t in instr.branch_targets() {
                        bump(t);
                    }
                }
            }
            if instr.may_throw() {
                for h in body.handlers_for(pc) {
                    // One throwing instruction can route several abstract
                    // exception values into the same handler (a thrown
                    // result plus an implicit fault, or the receiver
                    // nullness split), so a reachable handler entry
                    // always counts as a join.
                    bump(h.handler);
                    bump(h.handler);
                }
            }
        }

        let joins = preds
            .iter()
            .enumerate()
            .map(|(pc, &p)| if pc == 0 { p >= 1 } else { p >= 2 })
            .collect();
        JoinPcs { joins }
    }

    pub fn is_join(&self, pc: Pc) -> bool {
        self.joins.get(pc.index()).copied().unwrap_or(false)
    }
}

/// Backward live-variables fixpoint over local slots.
///
/// `live_before(pc)` is the set of slots that may be read on some path
/// starting at `pc` before being overwritten. Used by the engine's
/// optional dead-variables pass at join points; it never affects which
/// PCs are reachable.
///
/// Transfer and meet follow the backward dataflow pass shape: gen the
/// read slot, kill the written slot, union over all successors including
/// exception edges.
#[derive(Clone, Debug)]
pub struct LiveSlots {
    live: Vec<SlotSet>,
}

impl LiveSlots {
    pub fn compute(body: &Body, membership: &SubroutineMembership) -> Self {
        let slots = body.max_locals();
        let mut live = vec![SlotSet::empty(slots); body.len()];
        if body.is_empty() {
            return LiveSlots { live };
        }

        loop {
            let mut changed = false;
            for pc in body.pcs().rev() {
                let instr = body.instruction(pc).expect("pc in range");
                let mut out = SlotSet::empty(slots);
                for succ in successors(body, membership, pc) {
                    if let Some(s) = live.get(succ.index()) {
                        out.union_with(s);
                    }
                }
                if let Some(k) = instr.writes_slot() {
                    out.remove(k);
                }
                if let Some(g) = instr.reads_slot() {
                    out.insert(g);
                }
                changed |= live[pc.index()].union_with(&out);
            }
            if !changed {
                break;
            }
        }

        LiveSlots { live }
    }

    pub fn live_before(&self, pc: Pc) -> &SlotSet {
        &self.live[pc.index()]
    }
}

/// All successors of `pc` for liveness: fall-through, branch targets,
/// handler entries, and resolved subroutine-return edges. A `Jsr`
/// additionally flows into its own return target so that slots live
/// after the call stay live across the subroutine body.
fn successors(body: &Body, membership: &SubroutineMembership, pc: Pc) -> SmallVec<[Pc; 4]> {
    let mut out: SmallVec<[Pc; 4]> = SmallVec::new();
    let Some(instr) = body.instruction(pc) else {
        return out;
    };
    match instr {
        Instruction::Jsr(t) => {
            out.push(*t);
            out.push(pc.next());
        }
        Instruction::Ret(_) => {
            let owner = membership.entry_of(pc);
            for caller in body.pcs() {
                if let Some(Instruction::Jsr(t)) = body.instruction(caller) {
                    if Some(*t) == owner {
                        out.push(caller.next());
                    }
                }
            }
        }
        _ => {
            if instr.falls_through() {
                out.push(pc.next());
            }
            out.extend(instr.branch_targets());
        }
    }
    if instr.may_throw() {
        out.extend(body.handlers_for(pc).map(|h| h.handler));
    }
    out
}
