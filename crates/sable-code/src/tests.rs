use crate::{
    Body, Handler, IfCond, Instruction as I, JoinPcs, LiveSlots, Pc, SubroutineMembership, TypeRef,
};

fn body(instructions: Vec<I>, handlers: Vec<Handler>, max_locals: u16) -> Body {
    Body::new(instructions, handlers, max_locals)
}

#[test]
fn straight_line_has_no_joins() {
    let b = body(
        vec![I::IConst(1), I::Store(0), I::Load(0), I::Return],
        vec![],
        1,
    );
    let m = SubroutineMembership::compute(&b);
    let joins = JoinPcs::compute(&b, &m);
    assert!(b.pcs().all(|pc| !joins.is_join(pc)));
}

#[test]
fn diamond_merge_is_a_join() {
    // 0: iconst 0
    // 1: if-eq -> 4
    // 2: iconst 1
    // 3: goto 5
    // 4: iconst 2
    // 5: return        <- two predecessors
    let b = body(
        vec![
            I::IConst(0),
            I::If(IfCond::Eq, Pc(4)),
            I::IConst(1),
            I::Goto(Pc(5)),
            I::IConst(2),
            I::Return,
        ],
        vec![],
        0,
    );
    let m = SubroutineMembership::compute(&b);
    let joins = JoinPcs::compute(&b, &m);
    assert!(joins.is_join(Pc(5)));
    assert!(!joins.is_join(Pc(2)));
    assert!(!joins.is_join(Pc(4)));
}

#[test]
fn loop_header_is_a_join() {
    // 0: iconst 1
    // 1: if-eq -> 3
    // 2: goto 0
    // 3: return
    let b = body(
        vec![
            I::IConst(1),
            I::If(IfCond::Eq, Pc(3)),
            I::Goto(Pc(0)),
            I::Return,
        ],
        vec![],
        0,
    );
    let m = SubroutineMembership::compute(&b);
    let joins = JoinPcs::compute(&b, &m);
    assert!(joins.is_join(Pc(0)));
    assert!(!joins.is_join(Pc(3)));
}

#[test]
fn handler_entry_with_two_throwing_predecessors_is_a_join() {
    let t = TypeRef(1);
    // 0: load 0
    // 1: getfield   (may throw)
    // 2: pop
    // 3: load 0
    // 4: getfield   (may throw)
    // 5: pop
    // 6: return
    // 7: pop        <- handler for [0, 6)
    // 8: return
    let f = crate::FieldRef { class: t, id: 0 };
    let b = body(
        vec![
            I::Load(0),
            I::GetField(f),
            I::Pop,
            I::Load(0),
            I::GetField(f),
            I::Pop,
            I::Return,
            I::Pop,
            I::Return,
        ],
        vec![Handler {
            start: Pc(0),
            end: Pc(6),
            handler: Pc(7),
            catch_type: None,
        }],
        1,
    );
    let m = SubroutineMembership::compute(&b);
    let joins = JoinPcs::compute(&b, &m);
    assert!(joins.is_join(Pc(7)));
}

#[test]
fn handler_entry_of_a_single_throwing_instruction_is_a_join() {
    // One throwing instruction can deliver several exception values to
    // the same handler, so a single covered throwing pc is enough.
    let f = crate::FieldRef {
        class: TypeRef(1),
        id: 0,
    };
    let b = body(
        vec![I::Load(0), I::GetField(f), I::Return, I::Pop, I::Return],
        vec![Handler {
            start: Pc(0),
            end: Pc(3),
            handler: Pc(3),
            catch_type: None,
        }],
        1,
    );
    let m = SubroutineMembership::compute(&b);
    let joins = JoinPcs::compute(&b, &m);
    assert!(joins.is_join(Pc(3)));
}

#[test]
fn subroutine_membership_claims_body_and_return_edges() {
    // 0: jsr 3
    // 1: jsr 3
    // 2: return
    // 3: store 0   <- subroutine entry
    // 4: nop
    // 5: ret 0
    let b = body(
        vec![
            I::Jsr(Pc(3)),
            I::Jsr(Pc(3)),
            I::Return,
            I::Store(0),
            I::Nop,
            I::Ret(0),
        ],
        vec![],
        1,
    );
    let m = SubroutineMembership::compute(&b);
    assert_eq!(m.entry_of(Pc(0)), None);
    assert_eq!(m.entry_of(Pc(2)), None);
    assert_eq!(m.entry_of(Pc(3)), Some(Pc(3)));
    assert_eq!(m.entry_of(Pc(5)), Some(Pc(3)));

    // The shared entry and both return targets have two predecessors each.
    let joins = JoinPcs::compute(&b, &m);
    assert!(joins.is_join(Pc(3)));
}

#[test]
fn nested_subroutine_membership() {
    // 0: jsr 2
    // 1: return
    // 2: store 0    <- outer entry
    // 3: jsr 6
    // 4: nop        <- still outer
    // 5: ret 0
    // 6: store 1    <- inner entry
    // 7: ret 1
    let b = body(
        vec![
            I::Jsr(Pc(2)),
            I::Return,
            I::Store(0),
            I::Jsr(Pc(6)),
            I::Nop,
            I::Ret(0),
            I::Store(1),
            I::Ret(1),
        ],
        vec![],
        2,
    );
    let m = SubroutineMembership::compute(&b);
    assert_eq!(m.entry_of(Pc(2)), Some(Pc(2)));
    assert_eq!(m.entry_of(Pc(4)), Some(Pc(2)));
    assert_eq!(m.entry_of(Pc(5)), Some(Pc(2)));
    assert_eq!(m.entry_of(Pc(6)), Some(Pc(6)));
    assert_eq!(m.entry_of(Pc(7)), Some(Pc(6)));
}

#[test]
fn liveness_kills_overwritten_slot() {
    // 0: iconst 1
    // 1: store 0
    // 2: iconst 2
    // 3: store 0
    // 4: load 0
    // 5: return
    let b = body(
        vec![
            I::IConst(1),
            I::Store(0),
            I::IConst(2),
            I::Store(0),
            I::Load(0),
            I::Return,
        ],
        vec![],
        1,
    );
    let m = SubroutineMembership::compute(&b);
    let live = LiveSlots::compute(&b, &m);
    // Before the second store, slot 0 is not live (it is overwritten).
    assert!(!live.live_before(Pc(2)).contains(0));
    // After it, the load keeps it live.
    assert!(live.live_before(Pc(4)).contains(0));
}

#[test]
fn liveness_flows_through_branches_and_loops() {
    // 0: load 0
    // 1: if-eq -> 4
    // 2: load 1
    // 3: goto 0
    // 4: return
    let b = body(
        vec![
            I::Load(0),
            I::If(IfCond::Eq, Pc(4)),
            I::Load(1),
            I::Goto(Pc(0)),
            I::Return,
        ],
        vec![],
        2,
    );
    let m = SubroutineMembership::compute(&b);
    let live = LiveSlots::compute(&b, &m);
    assert!(live.live_before(Pc(0)).contains(0));
    // Slot 1 is live at the loop header because the loop body reads it.
    assert!(live.live_before(Pc(0)).contains(1));
    assert!(!live.live_before(Pc(4)).contains(0));
}
