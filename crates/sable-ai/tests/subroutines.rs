mod common;

use common::{body, handler, Recording};
use sable_ai::Engine;
use sable_code::Instruction as I;
use sable_code::{IfCond, Pc};
use sable_domain::{hierarchy, TypeDomain, Val};

// ---------------------------------------------------------------------------
// Plain call and return
// ---------------------------------------------------------------------------

/// 0: jsr 3   1: nop   2: return
/// 3: store ret-addr in slot 0   4: nop   5: ret 0
#[test]
fn subroutine_body_runs_before_the_return_point()
{
    let b = body(
        vec![
            I::Jsr(Pc(3)),
            I::Nop,
            I::Return,
            I::Store(0),
            I::Nop,
            I::Ret(0),
        ],
        vec![],
        1,
    );
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let result = Engine::new()
        .interpret_with(&b, vec![], &mut domain, &mut trace, || false)
        .unwrap();

    assert!(result.is_completed());
    assert_eq!(trace.evaluated(), vec![0, 3, 4, 5, 1, 2]);
    assert_eq!(trace.subroutine_calls, vec![(Pc(0), Pc(3))]);
    // Inside the body the slot holds the concrete return address.
    assert_eq!(
        result.locals_at(Pc(4)).unwrap().get(0),
        Some(&Val::RetAddr(Pc(1)))
    );
    // The return-address slot is cleared when control re-enters the caller.
    assert!(result.locals_at(Pc(1)).unwrap().get(0).is_none());
}

// ---------------------------------------------------------------------------
// Multiple call sites
// ---------------------------------------------------------------------------

/// 0: jsr 5   1: nop   2: jsr 5   3: nop   4: return
/// 5: store ret-addr   6: nop   7: ret 0
#[test]
fn second_call_site_re_enters_with_a_fresh_state() {
    let b = body(
        vec![
            I::Jsr(Pc(5)),
            I::Nop,
            I::Jsr(Pc(5)),
            I::Nop,
            I::Return,
            I::Store(0),
            I::Nop,
            I::Ret(0),
        ],
        vec![],
        1,
    );
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let result = Engine::new()
        .interpret_with(&b, vec![], &mut domain, &mut trace, || false)
        .unwrap();

    assert!(result.is_completed());
    assert_eq!(trace.evaluated(), vec![0, 5, 6, 7, 1, 2, 5, 6, 7, 3, 4]);
    assert_eq!(
        trace.subroutine_calls,
        vec![(Pc(0), Pc(5)), (Pc(2), Pc(5))]
    );
    // The reported body state merges both entries: two distinct return
    // addresses join to the uninformative top value.
    assert_eq!(
        result.locals_at(Pc(6)).unwrap().get(0),
        Some(&Val::Unknown)
    );
}

// ---------------------------------------------------------------------------
// Calls inside loops
// ---------------------------------------------------------------------------

/// 0: i = 0   2: jsr 7 (loop header)   3: load i   4: push 3
/// 5: if i < 3 goto 2   6: return
/// 7: store ret-addr   8..11: i = i + 1   12: ret 0
#[test]
fn loop_re_entrant_subroutine_converges() {
    let b = body(
        vec![
            I::IConst(0),
            I::Store(1),
            I::Jsr(Pc(7)),
            I::Load(1),
            I::IConst(3),
            I::IfCmp(IfCond::Lt, Pc(2)),
            I::Return,
            I::Store(0),
            I::Load(1),
            I::IConst(1),
            I::Binary(sable_code::BinOp::Add),
            I::Store(1),
            I::Ret(0),
        ],
        vec![],
        2,
    );
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let result = Engine::new()
        .interpret_with(&b, vec![], &mut domain, &mut trace, || false)
        .unwrap();

    assert!(result.is_completed());
    assert!(domain.escaped().is_empty());
    // The subroutine ran more than once before the fixpoint.
    assert!(trace.subroutine_calls.len() > 1);
    assert!(trace
        .subroutine_calls
        .iter()
        .all(|&(site, entry)| site == Pc(2) && entry == Pc(7)));
    // The counter is an integer at the exit.
    assert!(matches!(
        result.locals_at(Pc(6)).unwrap().get(1),
        Some(Val::Int(_))
    ));
}

// ---------------------------------------------------------------------------
// Bodies that never return
// ---------------------------------------------------------------------------

/// 0: jsr 2   1: return (never reached)
/// 2: store ret-addr   3: new throwable   4: throw
#[test]
fn subroutine_throwing_on_all_paths_never_returns() {
    let b = body(
        vec![
            I::Jsr(Pc(2)),
            I::Return,
            I::Store(0),
            I::New(hierarchy::THROWABLE),
            I::Throw,
        ],
        vec![],
        1,
    );
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let result = Engine::new()
        .interpret_with(&b, vec![], &mut domain, &mut trace, || false)
        .unwrap();

    assert!(result.is_completed());
    assert_eq!(trace.evaluated(), vec![0, 2, 3, 4]);
    assert!(result.operands_at(Pc(1)).is_none());
    // The folded body states are still reported.
    assert!(result.operands_at(Pc(3)).is_some());
    assert_eq!(
        domain.escaped(),
        &[(Pc(4), Val::reference(hierarchy::THROWABLE))]
    );
}

// ---------------------------------------------------------------------------
// Abrupt termination across nesting levels
// ---------------------------------------------------------------------------

/// 0: jsr 4 (outer)   1: return   2: pop   3: return (handler code)
/// 4: store outer ret-addr   5: jsr 8   6: nop   7: ret 0
/// 8: store inner ret-addr   9: new NPE   10: throw
/// catch-all over the whole method -> 2
#[test]
fn exception_in_nested_subroutine_unwinds_to_the_method_handler() {
    let b = body(
        vec![
            I::Jsr(Pc(4)),
            I::Return,
            I::Pop,
            I::Return,
            I::Store(0),
            I::Jsr(Pc(8)),
            I::Nop,
            I::Ret(0),
            I::Store(1),
            I::New(hierarchy::NULL_POINTER_EXCEPTION),
            I::Throw,
        ],
        vec![handler(0, 11, 2, None)],
        2,
    );
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let result = Engine::new()
        .interpret_with(&b, vec![], &mut domain, &mut trace, || false)
        .unwrap();

    assert!(result.is_completed());
    assert!(domain.escaped().is_empty());
    // The throw leaves both open subroutine levels at once.
    assert_eq!(trace.unwinds, vec![(Pc(10), Pc(2), 2)]);
    // The handler runs exactly once, after both levels resolved; the
    // return points of the interrupted calls are never reached.
    assert_eq!(trace.evaluated(), vec![0, 4, 5, 8, 9, 10, 2, 3]);
    assert!(result.operands_at(Pc(1)).is_none());
    assert!(result.operands_at(Pc(6)).is_none());
    assert_eq!(
        result.operands_at(Pc(2)).unwrap().values(),
        &[Val::reference(hierarchy::NULL_POINTER_EXCEPTION)]
    );
}

/// 0: jsr 4   1: return   2: pop   3: return (handler code)
/// 4: store ret-addr   5: new NPE   6: throw
/// catch-all over the whole method -> 2
#[test]
fn exception_in_a_subroutine_caught_at_method_level_unwinds_one_level() {
    let b = body(
        vec![
            I::Jsr(Pc(4)),
            I::Return,
            I::Pop,
            I::Return,
            I::Store(0),
            I::New(hierarchy::NULL_POINTER_EXCEPTION),
            I::Throw,
        ],
        vec![handler(0, 7, 2, None)],
        1,
    );
    let mut domain = TypeDomain::new();
    let mut trace = Recording::new();
    let result = Engine::new()
        .interpret_with(&b, vec![], &mut domain, &mut trace, || false)
        .unwrap();

    assert!(result.is_completed());
    assert!(domain.escaped().is_empty());
    assert_eq!(trace.unwinds, vec![(Pc(6), Pc(2), 1)]);
    assert_eq!(trace.evaluated(), vec![0, 4, 5, 6, 2, 3]);
    // The subroutine's return point is never reached.
    assert!(result.operands_at(Pc(1)).is_none());
    assert_eq!(
        result.operands_at(Pc(2)).unwrap().values(),
        &[Val::reference(hierarchy::NULL_POINTER_EXCEPTION)]
    );
}
