#![allow(dead_code)]

use sable_ai::{JoinOutcome, Tracer};
use sable_code::{Body, Handler, Instruction, Pc};

pub fn body(instructions: Vec<Instruction>, handlers: Vec<Handler>, max_locals: u16) -> Body {
    Body::new(instructions, handlers, max_locals)
}

pub fn handler(start: u32, end: u32, target: u32, catch_type: Option<sable_code::TypeRef>) -> Handler {
    Handler {
        start: Pc(start),
        end: Pc(end),
        handler: Pc(target),
        catch_type,
    }
}

/// Records every observable engine event for assertions.
#[derive(Default)]
pub struct Recording {
    pub evaluated: Vec<Pc>,
    pub flows: Vec<(Pc, Pc, bool)>,
    pub joins: Vec<(Pc, JoinOutcome)>,
    pub rescheduled: Vec<(Pc, Pc)>,
    pub subroutine_calls: Vec<(Pc, Pc)>,
    pub unwinds: Vec<(Pc, Pc, usize)>,
    pub abrupt_terminations: Vec<Pc>,
}

impl Recording {
    pub fn new() -> Recording {
        Recording::default()
    }

    pub fn evaluated(&self) -> Vec<u32> {
        self.evaluated.iter().map(|pc| pc.0).collect()
    }

    pub fn flows_from(&self, pc: u32) -> Vec<(u32, bool)> {
        self.flows
            .iter()
            .filter(|(from, _, _)| from.0 == pc)
            .map(|(_, to, exceptional)| (to.0, *exceptional))
            .collect()
    }

    pub fn joins_at(&self, pc: u32) -> Vec<JoinOutcome> {
        self.joins
            .iter()
            .filter(|(at, _)| at.0 == pc)
            .map(|(_, outcome)| *outcome)
            .collect()
    }
}

impl Tracer for Recording {
    fn instruction_evaluated(&mut self, pc: Pc) {
        self.evaluated.push(pc);
    }

    fn flow(&mut self, pc: Pc, target: Pc, is_exceptional: bool) {
        self.flows.push((pc, target, is_exceptional));
    }

    fn join_outcome(&mut self, pc: Pc, outcome: JoinOutcome) {
        self.joins.push((pc, outcome));
    }

    fn rescheduled(&mut self, pc: Pc, target: Pc) {
        self.rescheduled.push((pc, target));
    }

    fn subroutine_call(&mut self, pc: Pc, entry: Pc) {
        self.subroutine_calls.push((pc, entry));
    }

    fn abrupt_subroutine_termination(&mut self, pc: Pc, target: Pc, unwound: usize) {
        self.unwinds.push((pc, target, unwound));
    }

    fn abrupt_method_termination(&mut self, pc: Pc) {
        self.abrupt_terminations.push(pc);
    }
}
