use atpg_core::{Config, DtpgEngine, DtpgResult, Fault, FaultId, FaultModel, FaultSite, GateType, NetworkBuilder, StructuralIndex, Val3};

/// A flip-flop's Q output feeds a buffer to a primary output. A
/// transition-delay fault at Q is injected in the capture frame, but
/// detecting it still requires justifying Q's captured value back through
/// the clock edge to D's launch-frame value, so the resulting pattern must
/// carry an assignment for the launch frame as well as the capture frame.
#[test]
fn transition_delay_fault_across_storage_boundary_is_detected() {
    let mut b = NetworkBuilder::new();
    let d = b.add_primary_input();
    let (_ff_input, q) = b.add_storage_element("ff0", d);
    let g = b.add_logic(GateType::Buff, vec![q]);
    b.add_primary_output(g);
    let net = b.build().unwrap();
    let structural = StructuralIndex::build(&net);

    let fault = Fault {
        id: FaultId::from_raw(0),
        site: FaultSite::Stem(q),
        stuck_at: Val3::V0,
        model: FaultModel::TransitionDelay,
        representative: FaultId::from_raw(0),
    };
    let ffr_root = structural.ffr_root_of(q);
    let engine = DtpgEngine::for_ffr(&net, &structural, ffr_root, Config::default());
    let (result, stats) = engine.solve(&fault).unwrap();
    match result {
        DtpgResult::Detected(pattern) => {
            let launch_value = pattern.iter().find(|a| a.node == d && a.time == 0);
            assert!(
                launch_value.is_some(),
                "detecting a transition-delay fault should justify a launch-frame value for D, got {:?}",
                pattern
            );
        }
        other => panic!("expected the transition fault to be detected, got {:?}", other),
    }
    assert_eq!(stats.detected, 1);
}
