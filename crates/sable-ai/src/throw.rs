//! Abstract exception flow: matching raised values against the method's
//! handler table and threading the results back through `goto_target`.

use sable_code::Pc;

use crate::answer::Answer;
use crate::domain::{Domain, ImplicitException};
use crate::error::AiError;
use crate::interpreter::Run;
use crate::state::{Locals, Operands};
use crate::tracer::Tracer;

impl<'a, D, T, F> Run<'a, D, T, F>
where
    D: Domain,
    T: Tracer,
    F: FnMut() -> bool,
{
    /// Route a raised abstract exception from `pc` to its handlers.
    ///
    /// Handlers are scanned in declaration order. A catch-all or a
    /// definite subtype match ends the scan; an `Unknown` verdict
    /// schedules the handler speculatively (with the value's upper bound
    /// narrowed to the filter type) but keeps scanning, since the real
    /// runtime type may match a later handler or escape entirely. With no
    /// definitive match the method terminates abruptly.
    pub(crate) fn handle_exception(
        &mut self,
        pc: Pc,
        exception: D::Value,
        locals: &Locals<D::Value>,
    ) -> Result<(), AiError> {
        let handlers: Vec<_> = self.body.handlers_for(pc).cloned().collect();
        let mut definitive = false;
        for handler in handlers {
            match handler.catch_type {
                None => {
                    self.goto_target(
                        pc,
                        handler.handler,
                        true,
                        Operands::single(exception.clone()),
                        locals.clone(),
                    )?;
                    definitive = true;
                    break;
                }
                Some(catch_type) => match self.domain.is_subtype_of(&exception, catch_type) {
                    Answer::Yes => {
                        self.goto_target(
                            pc,
                            handler.handler,
                            true,
                            Operands::single(exception.clone()),
                            locals.clone(),
                        )?;
                        definitive = true;
                        break;
                    }
                    Answer::No => {}
                    Answer::Unknown => {
                        let narrowed = self.domain.refine_upper_bound(
                            pc,
                            exception.clone(),
                            catch_type,
                        );
                        self.goto_target(
                            pc,
                            handler.handler,
                            true,
                            Operands::single(narrowed),
                            locals.clone(),
                        )?;
                    }
                },
            }
        }
        if !definitive {
            self.domain.abrupt_termination(pc, &exception);
            self.tracer.abrupt_method_termination(pc);
        }
        Ok(())
    }

    /// Raise one of the engine-synthesized implicit faults from `pc`.
    pub(crate) fn raise_implicit(
        &mut self,
        pc: Pc,
        kind: ImplicitException,
        locals: &Locals<D::Value>,
    ) -> Result<(), AiError> {
        let exception = self.domain.implicit_exception(pc, kind);
        self.handle_exception(pc, exception, locals)
    }

    /// Split an instruction with a reference receiver on the receiver's
    /// nullness: definitely null explores only the synthesized
    /// NullPointerException path, definitely non-null only the ordinary
    /// path, and `Unknown` explores both: the ordinary path with a
    /// non-null-refined receiver.
    pub(crate) fn with_receiver(
        &mut self,
        pc: Pc,
        receiver: D::Value,
        npe_enabled: bool,
        locals: &Locals<D::Value>,
        normal: impl FnOnce(&mut Self, D::Value) -> Result<(), AiError>,
    ) -> Result<(), AiError> {
        if !npe_enabled {
            return normal(self, receiver);
        }
        match self.domain.is_null(&receiver) {
            Answer::Yes => self.raise_implicit(pc, ImplicitException::NullPointer, locals),
            Answer::No => normal(self, receiver),
            Answer::Unknown => {
                self.raise_implicit(pc, ImplicitException::NullPointer, locals)?;
                let refined = self.domain.refine_non_null(pc, receiver);
                normal(self, refined)
            }
        }
    }
}
