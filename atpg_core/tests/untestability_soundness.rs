use atpg_core::{Config, DtpgEngine, DtpgResult, Fault, FaultId, FaultModel, FaultSite, GateType, NetworkBuilder, StructuralIndex, Val3};

/// `y = OR(AND(a,b), AND(NOT(a),b))` always equals `b`, independent of `a`.
/// Forcing the first AND's `a` input stuck-at-1 never changes `y`: the
/// second AND already supplies `b` whenever the first one's output would
/// differ, so the fault's effect is structurally masked at every input
/// combination and detection must be UNSAT.
#[test]
fn structurally_redundant_fault_is_untestable() {
    let mut b = NetworkBuilder::new();
    let a = b.add_primary_input();
    let c = b.add_primary_input();
    let g1 = b.add_logic(GateType::And, vec![a, c]);
    let not_a = b.add_logic(GateType::Not, vec![a]);
    let g2 = b.add_logic(GateType::And, vec![not_a, c]);
    let g3 = b.add_logic(GateType::Or, vec![g1, g2]);
    b.add_primary_output(g3);
    let net = b.build().unwrap();
    let structural = StructuralIndex::build(&net);

    let fault = Fault {
        id: FaultId::from_raw(0),
        site: FaultSite::Branch { node: g1, pin: 0 },
        stuck_at: Val3::V1,
        model: FaultModel::StuckAt,
        representative: FaultId::from_raw(0),
    };
    let ffr_root = structural.ffr_root_of(g1);
    let engine = DtpgEngine::for_ffr(&net, &structural, ffr_root, Config::default());
    let (result, stats) = engine.solve(&fault).unwrap();
    assert!(
        matches!(result, DtpgResult::Untestable),
        "expected the masked fault to be untestable, got {:?}",
        result
    );
    assert_eq!(stats.untestable, 1);
}
