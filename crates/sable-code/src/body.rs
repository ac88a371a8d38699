use crate::instr::{Instruction, Pc, TypeRef};

/// One entry of the exception-handler table.
///
/// Covers the half-open PC range `[start, end)`. A `catch_type` of `None`
/// is a catch-all (finally-style) handler that matches every exception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handler {
    pub start: Pc,
    pub end: Pc,
    pub handler: Pc,
    pub catch_type: Option<TypeRef>,
}

impl Handler {
    pub fn covers(&self, pc: Pc) -> bool {
        self.start <= pc && pc < self.end
    }
}

/// A method body: dense instruction sequence, exception-handler table in
/// declaration order, and the declared number of local-variable slots.
#[derive(Clone, Debug)]
pub struct Body {
    instructions: Vec<Instruction>,
    handlers: Vec<Handler>,
    max_locals: u16,
}

impl Body {
    pub fn new(instructions: Vec<Instruction>, handlers: Vec<Handler>, max_locals: u16) -> Self {
        Body {
            instructions,
            handlers,
            max_locals,
        }
    }

    pub fn instruction(&self, pc: Pc) -> Option<&Instruction> {
        self.instructions.get(pc.index())
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Handlers covering `pc`, in declaration order. The first definitive
    /// match wins; scanning order is therefore semantically relevant.
    pub fn handlers_for(&self, pc: Pc) -> impl Iterator<Item = &Handler> {
        self.handlers.iter().filter(move |h| h.covers(pc))
    }

    pub fn pcs(&self) -> impl DoubleEndedIterator<Item = Pc> {
        (0..self.instructions.len() as u32).map(Pc)
    }
}
