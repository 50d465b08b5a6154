use atpg_core::{
    Config, DtpgEngine, DtpgResult, Fault, FaultId, FaultModel, FaultSite, GateType, NetworkBuilder,
    StructuralIndex, Val3,
};

/// `g1 = AND(a,b)` fans out to both `g2 = AND(g1,c)` and `g3 = OR(g1,d)`,
/// which reconverge at `g4 = AND(g2,g3)` before the sole primary output.
/// `g1`'s own FFR is just `{g1,a,b}`, but its dominance chain runs through
/// `g4` to the output FFR, so the MFFC rooted at the output swallows both
/// FFRs. A fault on `g1` is out of scope for an FFR-scoped engine rooted at
/// the output, but in scope for an MFFC-scoped one rooted there.
fn reconvergent_network() -> (atpg_core::NetworkModel, atpg_core::NodeId, atpg_core::NodeId, atpg_core::NodeId) {
    let mut b = NetworkBuilder::new();
    let a = b.add_primary_input();
    let bb = b.add_primary_input();
    let c = b.add_primary_input();
    let d = b.add_primary_input();
    let g1 = b.add_logic(GateType::And, vec![a, bb]);
    let g2 = b.add_logic(GateType::And, vec![g1, c]);
    let g3 = b.add_logic(GateType::Or, vec![g1, d]);
    let g4 = b.add_logic(GateType::And, vec![g2, g3]);
    let po = b.add_primary_output(g4);
    let net = b.build().unwrap();
    (net, g1, g2, po)
}

#[test]
fn fault_on_shared_stem_is_out_of_scope_for_the_narrower_ffr() {
    let (net, g1, _g2, po) = reconvergent_network();
    let structural = StructuralIndex::build(&net);
    assert_eq!(structural.ffr_root_of(g1), g1);
    assert_eq!(structural.ffr_root_of(po), po);

    let fault = Fault {
        id: FaultId::from_raw(0),
        site: FaultSite::Stem(g1),
        stuck_at: Val3::V1,
        model: FaultModel::StuckAt,
        representative: FaultId::from_raw(0),
    };
    let engine = DtpgEngine::for_ffr(&net, &structural, po, Config::default());
    assert!(
        engine.solve(&fault).is_err(),
        "g1's own FFR root is g1, not the output, so an FFR engine rooted at the output must reject it"
    );
}

#[test]
fn mffc_rooted_at_output_covers_the_shared_stem_and_detects_its_fault() {
    let (net, g1, _g2, po) = reconvergent_network();
    let structural = StructuralIndex::build(&net);
    assert_eq!(structural.mffc_members(po).len(), 2);

    let fault = Fault {
        id: FaultId::from_raw(0),
        site: FaultSite::Stem(g1),
        stuck_at: Val3::V1,
        model: FaultModel::StuckAt,
        representative: FaultId::from_raw(0),
    };
    let engine = DtpgEngine::for_mffc(&net, &structural, po, Config::default());
    let (result, stats) = engine.solve(&fault).unwrap();
    assert!(matches!(result, DtpgResult::Detected(_)), "got {:?}", result);
    assert_eq!(stats.detected, 1);
}

/// The same MFFC-scoped engine instance also covers a fault inside the
/// output's own FFR (a branch fault on `g2`'s `c` input), showing one
/// engine spans multiple structurally distinct fault sites.
#[test]
fn mffc_engine_also_covers_a_fault_in_the_outer_ffr() {
    let (net, _g1, g2, po) = reconvergent_network();
    let structural = StructuralIndex::build(&net);

    let fault = Fault {
        id: FaultId::from_raw(1),
        site: FaultSite::Branch { node: g2, pin: 1 },
        stuck_at: Val3::V0,
        model: FaultModel::StuckAt,
        representative: FaultId::from_raw(1),
    };
    let engine = DtpgEngine::for_mffc(&net, &structural, po, Config::default());
    let (result, stats) = engine.solve(&fault).unwrap();
    assert!(matches!(result, DtpgResult::Detected(_)), "got {:?}", result);
    assert_eq!(stats.detected, 1);
}

/// `g3 = OR(AND(a,c), AND(NOT(a),c))` always equals `c`, independent of `a`:
/// a stuck-at-1 on the first AND's `a` input is structurally masked at every
/// input combination. `a` and `c` each fan out twice (into both ANDs), so
/// they're their own trivial FFRs, and their dominance chains both run
/// through `g3`'s FFR to the primary output — the MFFC rooted there swallows
/// all three. The faulted AND (`g1`) is an interior, non-root member of that
/// FFR, and the fault must still come back untestable under MFFC scope: the
/// per-root control XOR must not let the solver manufacture a divergence
/// that doesn't actually reach the output.
#[test]
fn masked_branch_fault_stays_untestable_under_mffc_scope() {
    let mut b = NetworkBuilder::new();
    let a = b.add_primary_input();
    let c = b.add_primary_input();
    let g1 = b.add_logic(GateType::And, vec![a, c]);
    let not_a = b.add_logic(GateType::Not, vec![a]);
    let g2 = b.add_logic(GateType::And, vec![not_a, c]);
    let g3 = b.add_logic(GateType::Or, vec![g1, g2]);
    let po = b.add_primary_output(g3);
    let net = b.build().unwrap();
    let structural = StructuralIndex::build(&net);
    assert_eq!(structural.mffc_members(po).len(), 3);

    let fault = Fault {
        id: FaultId::from_raw(2),
        site: FaultSite::Branch { node: g1, pin: 0 },
        stuck_at: Val3::V1,
        model: FaultModel::StuckAt,
        representative: FaultId::from_raw(2),
    };
    let engine = DtpgEngine::for_mffc(&net, &structural, po, Config::default());
    let (result, stats) = engine.solve(&fault).unwrap();
    assert!(
        matches!(result, DtpgResult::Untestable),
        "expected the masked fault to stay untestable under MFFC scope, got {:?}",
        result
    );
    assert_eq!(stats.untestable, 1);
}
