use std::fmt;

use smallvec::SmallVec;

/// Index of an instruction within a method body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pc(pub u32);

impl Pc {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The program counter of the directly following instruction.
    pub fn next(self) -> Pc {
        Pc(self.0 + 1)
    }
}

impl fmt::Display for Pc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pc={}", self.0)
    }
}

/// Opaque handle to a reference type. Interpretation (names, hierarchy)
/// belongs to the abstract domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRef(pub u32);

/// Opaque handle to a field. The engine only threads it through to the
/// domain's field operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: TypeRef,
    pub id: u32,
}

/// Opaque handle to a method. `argc` excludes the receiver; the engine
/// uses it and `returns_value` to compute the stack effect of a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: TypeRef,
    pub id: u32,
    pub argc: u8,
    pub returns_value: bool,
}

/// Binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// May raise the domain's arithmetic fault (division by zero).
    Div,
    /// May raise the domain's arithmetic fault (division by zero).
    Rem,
}

/// Conditions for `If` (top of stack vs zero) and `IfCmp` (top two).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IfCond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// The closed instruction set.
///
/// One variant per opcode family; dispatch in the engine is an exhaustive
/// `match`, so adding a variant is a compile error until every consumer
/// handles it.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Nop,

    // -- Constants ----------------------------------------------------------
    /// Push a single-slot integer constant.
    IConst(i64),
    /// Push a double-slot integer constant.
    LConst(i64),
    /// Push the null reference.
    AConstNull,

    // -- Locals -------------------------------------------------------------
    Load(u16),
    Store(u16),

    // -- Arithmetic ---------------------------------------------------------
    Binary(BinOp),
    Neg,

    // -- Stack shuffles -----------------------------------------------------
    Pop,
    Pop2,
    Dup,
    DupX1,
    Dup2,
    Swap,

    // -- Control flow -------------------------------------------------------
    Goto(Pc),
    If(IfCond, Pc),
    IfCmp(IfCond, Pc),
    /// Dense jump table: case `low + i` jumps to `targets[i]`.
    TableSwitch {
        default: Pc,
        low: i64,
        targets: Vec<Pc>,
    },
    /// Sparse jump table with explicit keys.
    LookupSwitch {
        default: Pc,
        cases: Vec<(i64, Pc)>,
    },

    // -- Subroutines --------------------------------------------------------
    /// Call a subroutine within the current method: pushes the return
    /// address and branches to the target.
    Jsr(Pc),
    /// Return from a subroutine via the return address stored in a local.
    Ret(u16),

    // -- Method exit --------------------------------------------------------
    Return,
    ReturnValue,
    Throw,

    // -- Objects and arrays -------------------------------------------------
    New(TypeRef),
    NewArray(TypeRef),
    ArrayLoad,
    ArrayStore,
    ArrayLength,

    // -- Fields -------------------------------------------------------------
    GetField(FieldRef),
    PutField(FieldRef),
    GetStatic(FieldRef),
    PutStatic(FieldRef),

    // -- Calls --------------------------------------------------------------
    /// Instance call; pops `argc` arguments and a receiver.
    Invoke(MethodRef),
    /// Static call; pops `argc` arguments.
    InvokeStatic(MethodRef),

    // -- Type tests ---------------------------------------------------------
    CheckCast(TypeRef),
    InstanceOf(TypeRef),

    // -- Monitors -----------------------------------------------------------
    MonitorEnter,
    MonitorExit,
}

impl Instruction {
    /// Whether control can continue at the directly following instruction.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self,
            Instruction::Goto(_)
                | Instruction::TableSwitch { .. }
                | Instruction::LookupSwitch { .. }
                | Instruction::Ret(_)
                | Instruction::Return
                | Instruction::ReturnValue
                | Instruction::Throw
        )
    }

    /// All explicit (non-fall-through) branch targets.
    ///
    /// `Jsr` targets are included; `Ret` has none statically; its edges
    /// are resolved via subroutine membership.
    pub fn branch_targets(&self) -> SmallVec<[Pc; 2]> {
        match self {
            Instruction::Goto(t) | Instruction::If(_, t) | Instruction::IfCmp(_, t) => {
                SmallVec::from_slice(&[*t])
            }
            Instruction::Jsr(t) => SmallVec::from_slice(&[*t]),
            Instruction::TableSwitch {
                default, targets, ..
            } => {
                let mut out = SmallVec::new();
                out.push(*default);
                out.extend(targets.iter().copied());
                out
            }
            Instruction::LookupSwitch { default, cases } => {
                let mut out = SmallVec::new();
                out.push(*default);
                out.extend(cases.iter().map(|(_, t)| *t));
                out
            }
            _ => SmallVec::new(),
        }
    }

    /// Whether evaluating this instruction may raise an abstract exception
    /// (explicitly or implicitly), making it a potential handler predecessor.
    pub fn may_throw(&self) -> bool {
        matches!(
            self,
            Instruction::Binary(BinOp::Div | BinOp::Rem)
                | Instruction::Throw
                | Instruction::NewArray(_)
                | Instruction::ArrayLoad
                | Instruction::ArrayStore
                | Instruction::ArrayLength
                | Instruction::GetField(_)
                | Instruction::PutField(_)
                | Instruction::GetStatic(_)
                | Instruction::PutStatic(_)
                | Instruction::Invoke(_)
                | Instruction::InvokeStatic(_)
                | Instruction::CheckCast(_)
                | Instruction::MonitorEnter
                | Instruction::MonitorExit
                | Instruction::Return
                | Instruction::ReturnValue
        )
    }

    /// The local slot read by this instruction, if any.
    pub fn reads_slot(&self) -> Option<u16> {
        match self {
            Instruction::Load(i) | Instruction::Ret(i) => Some(*i),
            _ => None,
        }
    }

    /// The local slot written by this instruction, if any.
    pub fn writes_slot(&self) -> Option<u16> {
        match self {
            Instruction::Store(i) => Some(*i),
            _ => None,
        }
    }
}
