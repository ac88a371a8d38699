mod common;

use common::{body, handler, Recording};
use sable_ai::{AiResult, Engine};
use sable_code::Instruction as I;
use sable_code::{BinOp, IfCond, Pc};
use sable_domain::{hierarchy, TypeDomain, Val};

/// A program touching every scheduling feature: a loop, a subroutine
/// called from it, and an exception edge into a handler.
///
/// 0: i = 0   2: jsr 10 (loop header)   3: load i   4: push 5
/// 5: if i < 5 goto 2   6: load i   7: load divisor   8: div   9: return it
/// 10: store ret-addr   11..14: i = i + 1   15: ret 2
/// 16: pop   17: return (arithmetic handler)
fn workload() -> sable_code::Body {
    body(
        vec![
            I::IConst(0),
            I::Store(1),
            I::Jsr(Pc(10)),
            I::Load(1),
            I::IConst(5),
            I::IfCmp(IfCond::Lt, Pc(2)),
            I::Load(1),
            I::Load(0),
            I::Binary(BinOp::Div),
            I::ReturnValue,
            I::Store(2),
            I::Load(1),
            I::IConst(1),
            I::Binary(BinOp::Add),
            I::Store(1),
            I::Ret(2),
            I::Pop,
            I::Return,
        ],
        vec![handler(6, 10, 16, Some(hierarchy::ARITHMETIC_EXCEPTION))],
        3,
    )
}

fn baseline() -> (AiResult<Val>, usize) {
    let b = workload();
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let result = Engine::new()
        .interpret_with(&b, vec![Val::int(0, 2)], &mut domain, &mut trace, || false)
        .unwrap();
    assert!(result.is_completed());
    (result, trace.evaluated.len())
}

#[test]
fn immediate_interruption_aborts_before_any_instruction() {
    let b = workload();
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let result = Engine::new()
        .interpret_with(&b, vec![Val::int(0, 2)], &mut domain, &mut trace, || true)
        .unwrap();

    assert!(!result.is_completed());
    assert!(trace.evaluated.is_empty());
    let continuation = result.into_continuation().unwrap();
    let resumed = Engine::new()
        .resume(&b, &mut domain, &mut trace, || false, continuation)
        .unwrap();
    assert!(resumed.is_completed());
}

#[test]
fn resuming_after_an_interruption_is_equivalent_to_running_through() {
    let (expected, steps) = baseline();
    let b = workload();

    // Interrupt after every possible number of evaluations; resuming must
    // always reconstruct the identical result.
    for cutoff in 0..steps {
        let mut domain = TypeDomain::new();
        let mut trace = Recording::new();
        let mut polls = 0usize;
        let first = Engine::new()
            .interpret_with(&b, vec![Val::int(0, 2)], &mut domain, &mut trace, move || {
                polls += 1;
                polls > cutoff
            })
            .unwrap();
        let continuation = first
            .into_continuation()
            .expect("interrupted before completion");

        let resumed = Engine::new()
            .resume(&b, &mut domain, &mut trace, || false, continuation)
            .unwrap();
        assert_eq!(resumed, expected, "cutoff {cutoff}");
    }
}

#[test]
fn interruption_preserves_open_subroutine_state() {
    let b = workload();
    let (expected, _) = baseline();

    // Cut off inside the first subroutine call, with one level open.
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let mut polls = 0usize;
    let first = Engine::new()
        .interpret_with(&b, vec![Val::int(0, 2)], &mut domain, &mut trace, move || {
            polls += 1;
            polls > 4
        })
        .unwrap();
    assert!(!first.is_completed());
    assert_eq!(trace.subroutine_calls, vec![(Pc(2), Pc(10))]);

    let continuation = first.into_continuation().unwrap();
    let resumed = Engine::new()
        .resume(&b, &mut domain, &mut trace, || false, continuation)
        .unwrap();
    assert_eq!(resumed, expected);
}
