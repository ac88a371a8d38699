//! The instruction dispatcher: one exhaustive `match` translating each
//! instruction's stack and control-flow effect into domain operations
//! and `goto_target` calls.

use sable_code::{Instruction, Pc};
use smallvec::SmallVec;

use crate::domain::{Category, Domain, ImplicitException};
use crate::error::{AiError, FatalKind};
use crate::interpreter::Run;
use crate::outcome::Computation;
use crate::state::{Locals, Operands};
use crate::tracer::Tracer;

impl<'a, D, T, F> Run<'a, D, T, F>
where
    D: Domain,
    T: Tracer,
    F: FnMut() -> bool,
{
    /// Evaluate the instruction at `pc` against its stored entry state.
    pub(crate) fn evaluate(&mut self, pc: Pc) -> Result<(), AiError> {
        let instruction = self
            .body
            .instruction(pc)
            .ok_or_else(|| self.fatal(Some(pc), FatalKind::PcOutOfRange))?
            .clone();
        let mut operands = self.operands[pc.index()]
            .clone()
            .ok_or_else(|| self.fatal(Some(pc), FatalKind::MissingState))?;
        let mut locals = self.locals[pc.index()]
            .clone()
            .ok_or_else(|| self.fatal(Some(pc), FatalKind::MissingState))?;

        match instruction {
            Instruction::Nop => self.fall_through(pc, operands, locals),

            // -- Constants ----------------------------------------------------
            Instruction::IConst(v) => {
                let value = self.domain.int_const(pc, v);
                operands.push(value);
                self.fall_through(pc, operands, locals)
            }
            Instruction::LConst(v) => {
                let value = self.domain.long_const(pc, v);
                operands.push(value);
                self.fall_through(pc, operands, locals)
            }
            Instruction::AConstNull => {
                let value = self.domain.null_const(pc);
                operands.push(value);
                self.fall_through(pc, operands, locals)
            }

            // -- Locals -------------------------------------------------------
            Instruction::Load(slot) => {
                let value = self.load_slot(pc, &locals, slot)?;
                operands.push(value);
                self.fall_through(pc, operands, locals)
            }
            Instruction::Store(slot) => {
                let value = self.pop_value(pc, &mut operands)?;
                if slot as usize >= locals.len() {
                    return Err(self.fatal(Some(pc), FatalKind::LocalOutOfRange { slot }));
                }
                let category = self.domain.category(&value);
                locals.set(slot, value);
                // A double-slot value also occupies (and invalidates) the
                // following slot.
                if category == Category::Double && (slot as usize) + 1 < locals.len() {
                    locals.kill(slot + 1);
                }
                self.fall_through(pc, operands, locals)
            }

            // -- Arithmetic ---------------------------------------------------
            Instruction::Binary(op) => {
                let right = self.pop_value(pc, &mut operands)?;
                let left = self.pop_value(pc, &mut operands)?;
                let computation = self.domain.binary_op(pc, op, left, right);
                self.with_value(pc, computation, operands, locals)
            }
            Instruction::Neg => {
                let value = self.pop_value(pc, &mut operands)?;
                let negated = self.domain.neg(pc, value);
                operands.push(negated);
                self.fall_through(pc, operands, locals)
            }

            // -- Stack shuffles -----------------------------------------------
            Instruction::Pop => {
                self.pop_value(pc, &mut operands)?;
                self.fall_through(pc, operands, locals)
            }
            Instruction::Pop2 => {
                let top = self.pop_value(pc, &mut operands)?;
                if self.domain.category(&top) == Category::Single {
                    self.pop_value(pc, &mut operands)?;
                }
                self.fall_through(pc, operands, locals)
            }
            Instruction::Dup => {
                let top = operands
                    .peek(0)
                    .cloned()
                    .ok_or_else(|| self.fatal(Some(pc), FatalKind::StackUnderflow))?;
                operands.push(top);
                self.fall_through(pc, operands, locals)
            }
            Instruction::DupX1 => {
                let v1 = self.pop_value(pc, &mut operands)?;
                let v2 = self.pop_value(pc, &mut operands)?;
                operands.push(v1.clone());
                operands.push(v2);
                operands.push(v1);
                self.fall_through(pc, operands, locals)
            }
            Instruction::Dup2 => {
                let v1 = self.pop_value(pc, &mut operands)?;
                if self.domain.category(&v1) == Category::Double {
                    operands.push(v1.clone());
                    operands.push(v1);
                } else {
                    let v2 = self.pop_value(pc, &mut operands)?;
                    operands.push(v2.clone());
                    operands.push(v1.clone());
                    operands.push(v2);
                    operands.push(v1);
                }
                self.fall_through(pc, operands, locals)
            }
            Instruction::Swap => {
                let v1 = self.pop_value(pc, &mut operands)?;
                let v2 = self.pop_value(pc, &mut operands)?;
                operands.push(v1);
                operands.push(v2);
                self.fall_through(pc, operands, locals)
            }

            // -- Control flow -------------------------------------------------
            Instruction::Goto(target) => self.goto_target(pc, target, false, operands, locals),
            Instruction::If(cond, target) => {
                let value = self.pop_value(pc, &mut operands)?;
                let verdict = self.domain.test_if(pc, cond, &value);
                self.branch(pc, target, verdict.may_be_yes(), verdict.may_be_no(), operands, locals)
            }
            Instruction::IfCmp(cond, target) => {
                let right = self.pop_value(pc, &mut operands)?;
                let left = self.pop_value(pc, &mut operands)?;
                let verdict = self.domain.test_if_cmp(pc, cond, &left, &right);
                self.branch(pc, target, verdict.may_be_yes(), verdict.may_be_no(), operands, locals)
            }
            Instruction::TableSwitch {
                default,
                low,
                targets,
            } => {
                let value = self.pop_value(pc, &mut operands)?;
                let cases = targets
                    .iter()
                    .enumerate()
                    .map(|(i, &t)| (low + i as i64, t));
                self.switch(pc, value, cases, default, operands, locals)
            }
            Instruction::LookupSwitch { default, cases } => {
                let value = self.pop_value(pc, &mut operands)?;
                self.switch(pc, value, cases.iter().copied(), default, operands, locals)
            }

            // -- Subroutines --------------------------------------------------
            Instruction::Jsr(target) => self.jsr(pc, target, operands, locals),
            Instruction::Ret(slot) => self.ret(pc, slot, &locals),

            // -- Method exit --------------------------------------------------
            Instruction::Return => {
                let computation = self.domain.normal_return(pc, None);
                self.with_return(pc, computation, &locals)
            }
            Instruction::ReturnValue => {
                let value = self.pop_value(pc, &mut operands)?;
                let computation = self.domain.normal_return(pc, Some(value));
                self.with_return(pc, computation, &locals)
            }
            Instruction::Throw => {
                let exception = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_throw();
                self.with_receiver(pc, exception, npe, &locals, |run, exception| {
                    run.handle_exception(pc, exception, &locals)
                })
            }

            // -- Objects and arrays -------------------------------------------
            Instruction::New(tpe) => {
                let value = self.domain.new_object(pc, tpe);
                operands.push(value);
                self.fall_through(pc, operands, locals)
            }
            Instruction::NewArray(tpe) => {
                let count = self.pop_value(pc, &mut operands)?;
                let computation = self.domain.new_array(pc, count, tpe);
                self.with_value(pc, computation, operands, locals)
            }
            Instruction::ArrayLoad => {
                let index = self.pop_value(pc, &mut operands)?;
                let array = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_array_access();
                let state = (operands, locals.clone());
                self.with_receiver(pc, array, npe, &locals, move |run, array| {
                    let computation = run.domain.array_load(pc, index, array);
                    run.with_value(pc, computation, state.0, state.1)
                })
            }
            Instruction::ArrayStore => {
                let value = self.pop_value(pc, &mut operands)?;
                let index = self.pop_value(pc, &mut operands)?;
                let array = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_array_access();
                let state = (operands, locals.clone());
                self.with_receiver(pc, array, npe, &locals, move |run, array| {
                    let computation = run.domain.array_store(pc, value, index, array);
                    run.with_effect(pc, computation, state.0, state.1)
                })
            }
            Instruction::ArrayLength => {
                let array = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_array_access();
                let state = (operands, locals.clone());
                self.with_receiver(pc, array, npe, &locals, move |run, array| {
                    let computation = run.domain.array_length(pc, array);
                    run.with_value(pc, computation, state.0, state.1)
                })
            }

            // -- Fields -------------------------------------------------------
            Instruction::GetField(field) => {
                let receiver = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_field_access();
                let state = (operands, locals.clone());
                self.with_receiver(pc, receiver, npe, &locals, move |run, receiver| {
                    let computation = run.domain.get_field(pc, receiver, field);
                    run.with_value(pc, computation, state.0, state.1)
                })
            }
            Instruction::PutField(field) => {
                let value = self.pop_value(pc, &mut operands)?;
                let receiver = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_field_access();
                let state = (operands, locals.clone());
                self.with_receiver(pc, receiver, npe, &locals, move |run, receiver| {
                    let computation = run.domain.put_field(pc, value, receiver, field);
                    run.with_effect(pc, computation, state.0, state.1)
                })
            }
            Instruction::GetStatic(field) => {
                let computation = self.domain.get_static(pc, field);
                self.with_value(pc, computation, operands, locals)
            }
            Instruction::PutStatic(field) => {
                let value = self.pop_value(pc, &mut operands)?;
                let computation = self.domain.put_static(pc, value, field);
                self.with_effect(pc, computation, operands, locals)
            }

            // -- Calls --------------------------------------------------------
            Instruction::Invoke(method) => {
                let args = self.pop_arguments(pc, &mut operands, method.argc)?;
                let receiver = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_method_call();
                let state = (operands, locals.clone());
                self.with_receiver(pc, receiver, npe, &locals, move |run, receiver| {
                    let computation = run.domain.invoke(pc, method, Some(receiver), args);
                    run.with_optional_value(pc, computation, state.0, state.1)
                })
            }
            Instruction::InvokeStatic(method) => {
                let args = self.pop_arguments(pc, &mut operands, method.argc)?;
                let computation = self.domain.invoke(pc, method, None, args);
                self.with_optional_value(pc, computation, operands, locals)
            }

            // -- Type tests ---------------------------------------------------
            Instruction::CheckCast(tpe) => {
                let value = self.pop_value(pc, &mut operands)?;
                let subtype = self.domain.is_subtype_of(&value, tpe);
                let null = self.domain.is_null(&value);
                let cce = self.domain.throw_class_cast_exception();
                if cce && null.may_be_no() && !subtype.is_yes() {
                    self.raise_implicit(pc, ImplicitException::ClassCast, &locals)?;
                }
                // Null always passes; with the cast exception disabled the
                // success path is explored unconditionally.
                if subtype.may_be_yes() || null.may_be_yes() || !cce {
                    let refined = self.domain.refine_upper_bound(pc, value, tpe);
                    operands.push(refined);
                    self.fall_through(pc, operands, locals)?;
                }
                Ok(())
            }
            Instruction::InstanceOf(tpe) => {
                let value = self.pop_value(pc, &mut operands)?;
                let subtype = self.domain.is_subtype_of(&value, tpe);
                let null = self.domain.is_null(&value);
                let result = if null.is_yes() || subtype.is_no() {
                    self.domain.int_const(pc, 0)
                } else if subtype.is_yes() && null.is_no() {
                    self.domain.int_const(pc, 1)
                } else {
                    self.domain.int_between(pc, 0, 1)
                };
                operands.push(result);
                self.fall_through(pc, operands, locals)
            }

            // -- Monitors -----------------------------------------------------
            Instruction::MonitorEnter => {
                let value = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_monitor_access();
                let state = (operands, locals.clone());
                self.with_receiver(pc, value, npe, &locals, move |run, value| {
                    let computation = run.domain.monitor_enter(pc, value);
                    run.with_effect(pc, computation, state.0, state.1)
                })
            }
            Instruction::MonitorExit => {
                let value = self.pop_value(pc, &mut operands)?;
                let npe = self.domain.throw_null_pointer_exception_on_monitor_access();
                let state = (operands, locals.clone());
                self.with_receiver(pc, value, npe, &locals, move |run, value| {
                    let computation = run.domain.monitor_exit(pc, value);
                    run.with_effect(pc, computation, state.0, state.1)
                })
            }
        }
    }

    // -- Stack and locals access --------------------------------------------

    fn pop_value(
        &self,
        pc: Pc,
        operands: &mut Operands<D::Value>,
    ) -> Result<D::Value, AiError> {
        operands
            .pop()
            .ok_or_else(|| self.fatal(Some(pc), FatalKind::StackUnderflow))
    }

    /// Pop `argc` call arguments, restoring declaration order.
    fn pop_arguments(
        &self,
        pc: Pc,
        operands: &mut Operands<D::Value>,
        argc: u8,
    ) -> Result<Vec<D::Value>, AiError> {
        let mut args = Vec::with_capacity(argc as usize);
        for _ in 0..argc {
            args.push(self.pop_value(pc, operands)?);
        }
        args.reverse();
        Ok(args)
    }

    fn load_slot(
        &self,
        pc: Pc,
        locals: &Locals<D::Value>,
        slot: u16,
    ) -> Result<D::Value, AiError> {
        if slot as usize >= locals.len() {
            return Err(self.fatal(Some(pc), FatalKind::LocalOutOfRange { slot }));
        }
        locals
            .get(slot)
            .cloned()
            .ok_or_else(|| self.fatal(Some(pc), FatalKind::DeadLocal { slot }))
    }

    // -- Successor helpers ---------------------------------------------------

    fn fall_through(
        &mut self,
        pc: Pc,
        operands: Operands<D::Value>,
        locals: Locals<D::Value>,
    ) -> Result<(), AiError> {
        self.goto_target(pc, pc.next(), false, operands, locals)
    }

    /// Schedule a two-way branch. When both paths are feasible the
    /// numerically smaller successor is evaluated first; front insertion
    /// reverses scheduling order, so the larger one is scheduled first.
    fn branch(
        &mut self,
        pc: Pc,
        target: Pc,
        take_branch: bool,
        take_fall: bool,
        operands: Operands<D::Value>,
        locals: Locals<D::Value>,
    ) -> Result<(), AiError> {
        match (take_branch, take_fall) {
            (true, true) => {
                if target < pc.next() {
                    self.fall_through(pc, operands.clone(), locals.clone())?;
                    self.goto_target(pc, target, false, operands, locals)
                } else {
                    self.goto_target(pc, target, false, operands.clone(), locals.clone())?;
                    self.fall_through(pc, operands, locals)
                }
            }
            (true, false) => self.goto_target(pc, target, false, operands, locals),
            (false, true) => self.fall_through(pc, operands, locals),
            (false, false) => Ok(()),
        }
    }

    /// Schedule the feasible targets of a switch. A definite case match
    /// short-circuits the scan and suppresses the default edge; `Unknown`
    /// cases accumulate. Duplicate targets are scheduled once.
    fn switch(
        &mut self,
        pc: Pc,
        value: D::Value,
        cases: impl Iterator<Item = (i64, Pc)>,
        default: Pc,
        operands: Operands<D::Value>,
        locals: Locals<D::Value>,
    ) -> Result<(), AiError> {
        let mut targets: SmallVec<[Pc; 4]> = SmallVec::new();
        let mut matched = false;
        for (case, target) in cases {
            let verdict = self.domain.switch_case_match(pc, &value, case);
            if verdict.is_yes() {
                if !targets.contains(&target) {
                    targets.push(target);
                }
                matched = true;
                break;
            }
            if verdict.is_unknown() && !targets.contains(&target) {
                targets.push(target);
            }
        }
        if !matched && !targets.contains(&default) {
            targets.push(default);
        }
        for target in targets {
            self.goto_target(pc, target, false, operands.clone(), locals.clone())?;
        }
        Ok(())
    }

    // -- Computation routing -------------------------------------------------

    /// Route a computation producing one stack value: exceptions go to the
    /// handler scan, the normal result is pushed and control falls through.
    fn with_value(
        &mut self,
        pc: Pc,
        computation: Computation<D::Value, D::Value>,
        mut operands: Operands<D::Value>,
        locals: Locals<D::Value>,
    ) -> Result<(), AiError> {
        let (result, exceptions) = computation.into_parts();
        for exception in exceptions {
            self.handle_exception(pc, exception, &locals)?;
        }
        if let Some(value) = result {
            operands.push(value);
            self.fall_through(pc, operands, locals)?;
        }
        Ok(())
    }

    /// Route a pure side-effect computation.
    fn with_effect(
        &mut self,
        pc: Pc,
        computation: Computation<(), D::Value>,
        operands: Operands<D::Value>,
        locals: Locals<D::Value>,
    ) -> Result<(), AiError> {
        let (result, exceptions) = computation.into_parts();
        for exception in exceptions {
            self.handle_exception(pc, exception, &locals)?;
        }
        if result.is_some() {
            self.fall_through(pc, operands, locals)?;
        }
        Ok(())
    }

    /// Route an invocation: void calls push nothing.
    fn with_optional_value(
        &mut self,
        pc: Pc,
        computation: Computation<Option<D::Value>, D::Value>,
        mut operands: Operands<D::Value>,
        locals: Locals<D::Value>,
    ) -> Result<(), AiError> {
        let (result, exceptions) = computation.into_parts();
        for exception in exceptions {
            self.handle_exception(pc, exception, &locals)?;
        }
        if let Some(result) = result {
            if let Some(value) = result {
                operands.push(value);
            }
            self.fall_through(pc, operands, locals)?;
        }
        Ok(())
    }

    /// Route a method-exit computation: a normal result ends the path,
    /// exceptions (e.g. an unreleased monitor) go to the handler scan.
    fn with_return(
        &mut self,
        pc: Pc,
        computation: Computation<(), D::Value>,
        locals: &Locals<D::Value>,
    ) -> Result<(), AiError> {
        let (_, exceptions) = computation.into_parts();
        for exception in exceptions {
            self.handle_exception(pc, exception, locals)?;
        }
        Ok(())
    }
}
