use atpg_core::{Config, DtpgEngine, DtpgResult, Fault, FaultId, FaultModel, FaultSite, GateType, NetworkBuilder, StructuralIndex, Val3};

/// Every stuck-at fault at the output of a simple two-input gate is
/// testable: some input combination drives the gate to each of its two
/// possible output values, so both SA0 and SA1 are detectable.
fn assert_stem_faults_detected(gate: GateType) {
    let mut b = NetworkBuilder::new();
    let a = b.add_primary_input();
    let c = b.add_primary_input();
    let g = b.add_logic(gate, vec![a, c]);
    b.add_primary_output(g);
    let net = b.build().unwrap();
    let structural = StructuralIndex::build(&net);

    for stuck_at in [Val3::V0, Val3::V1] {
        let fault = Fault {
            id: FaultId::from_raw(0),
            site: FaultSite::Stem(g),
            stuck_at,
            model: FaultModel::StuckAt,
            representative: FaultId::from_raw(0),
        };
        let engine = DtpgEngine::for_ffr(&net, &structural, g, Config::default());
        let (result, stats) = engine.solve(&fault).unwrap_or_else(|e| {
            panic!("{:?} stuck-at-{} rejected: {}", gate, stuck_at, e)
        });
        assert!(
            matches!(result, DtpgResult::Detected(_)),
            "{:?} stuck-at-{} should be detected, got {:?}",
            gate,
            stuck_at,
            result
        );
        assert_eq!(stats.detected, 1);
    }
}

#[test]
fn and_gate_output_faults_are_detected() {
    assert_stem_faults_detected(GateType::And);
}

#[test]
fn nand_gate_output_faults_are_detected() {
    assert_stem_faults_detected(GateType::Nand);
}

#[test]
fn or_gate_output_faults_are_detected() {
    assert_stem_faults_detected(GateType::Or);
}

#[test]
fn nor_gate_output_faults_are_detected() {
    assert_stem_faults_detected(GateType::Nor);
}

#[test]
fn xor_gate_output_faults_are_detected() {
    assert_stem_faults_detected(GateType::Xor);
}

#[test]
fn xnor_gate_output_faults_are_detected() {
    assert_stem_faults_detected(GateType::Xnor);
}

#[test]
fn not_gate_output_faults_are_detected() {
    let mut b = NetworkBuilder::new();
    let a = b.add_primary_input();
    let g = b.add_logic(GateType::Not, vec![a]);
    b.add_primary_output(g);
    let net = b.build().unwrap();
    let structural = StructuralIndex::build(&net);

    for stuck_at in [Val3::V0, Val3::V1] {
        let fault = Fault {
            id: FaultId::from_raw(0),
            site: FaultSite::Stem(g),
            stuck_at,
            model: FaultModel::StuckAt,
            representative: FaultId::from_raw(0),
        };
        let engine = DtpgEngine::for_ffr(&net, &structural, g, Config::default());
        let (result, _) = engine.solve(&fault).unwrap();
        assert!(matches!(result, DtpgResult::Detected(_)));
    }
}

#[test]
fn branch_fault_on_multi_input_gate_is_detected() {
    let mut b = NetworkBuilder::new();
    let a = b.add_primary_input();
    let c = b.add_primary_input();
    let g = b.add_logic(GateType::Or, vec![a, c]);
    b.add_primary_output(g);
    let net = b.build().unwrap();
    let structural = StructuralIndex::build(&net);

    let fault = Fault {
        id: FaultId::from_raw(0),
        site: FaultSite::Branch { node: g, pin: 0 },
        stuck_at: Val3::V1,
        model: FaultModel::StuckAt,
        representative: FaultId::from_raw(0),
    };
    let engine = DtpgEngine::for_ffr(&net, &structural, g, Config::default());
    let (result, _) = engine.solve(&fault).unwrap();
    assert!(matches!(result, DtpgResult::Detected(_)));
}
