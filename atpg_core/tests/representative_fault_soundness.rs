use atpg_core::{Config, DtpgEngine, DtpgResult, FaultSet, FaultSite, GateType, NetworkBuilder, StructuralIndex, Val3};

/// Structural collapsing merges an AND gate's input-0 stuck-at-0 branch
/// fault into the gate's own output stuck-at-0 stem fault. If collapsing is
/// sound the two faults must actually be equivalent under simulation, not
/// just structurally similar: solving them independently (bypassing the
/// collapsing and picking whichever one the fault set names as
/// non-representative) must land on the same detected/untestable verdict.
#[test]
fn collapsed_branch_and_stem_faults_agree_on_outcome() {
    let mut b = NetworkBuilder::new();
    let a = b.add_primary_input();
    let c = b.add_primary_input();
    let g = b.add_logic(GateType::And, vec![a, c]);
    b.add_primary_output(g);
    let net = b.build().unwrap();
    let structural = StructuralIndex::build(&net);
    let set = FaultSet::collapsed_stuck_at(&net);

    let stem_sa0 = *set
        .faults()
        .iter()
        .find(|f| f.site == FaultSite::Stem(g) && f.stuck_at == Val3::V0)
        .unwrap();
    let branch_sa0 = *set
        .faults()
        .iter()
        .find(|f| f.site == (FaultSite::Branch { node: g, pin: 0 }) && f.stuck_at == Val3::V0)
        .unwrap();
    assert_eq!(
        stem_sa0.representative, branch_sa0.representative,
        "this pair is expected to collapse into one class"
    );

    let stem_result = DtpgEngine::for_ffr(&net, &structural, g, Config::default())
        .solve(&stem_sa0)
        .unwrap()
        .0;
    let branch_result = DtpgEngine::for_ffr(&net, &structural, g, Config::default())
        .solve(&branch_sa0)
        .unwrap()
        .0;

    assert_eq!(
        std::mem::discriminant(&stem_result),
        std::mem::discriminant(&branch_result),
        "collapsed-equivalent faults disagreed: stem={:?} branch={:?}",
        stem_result,
        branch_result
    );
    assert!(matches!(stem_result, DtpgResult::Detected(_)));
}
