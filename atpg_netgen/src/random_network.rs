use atpg_core::gate::GateType;
use atpg_core::network::{NetworkBuilder, NetworkModel, NodeId};
use rand::{rngs::StdRng, seq::IteratorRandom, seq::SliceRandom, Rng, SeedableRng};

const EPSILON: f64 = f64::EPSILON;

/// Relative rates of each two-or-more-input gate kind among generated logic
/// nodes. Unary gates (Not/Buff) are drawn separately, at `rate_unary`.
#[derive(Debug, Clone)]
pub struct RandomNetConfig {
    pub rate_and: f64,
    pub rate_nand: f64,
    pub rate_or: f64,
    pub rate_nor: f64,
    pub rate_xor: f64,
    pub rate_xnor: f64,
    pub rate_unary: f64,
    pub max_fanin: usize,
}

impl RandomNetConfig {
    pub fn from_vec(args: Vec<f64>) -> Self {
        assert!(args.len() == 7, "expected 7 gate-kind rates");
        let sum: f64 = args.iter().sum();
        assert!(
            (sum - 1.0).abs() < EPSILON.sqrt(),
            "gate-kind rates must sum to 1.0, got {}",
            sum
        );
        RandomNetConfig {
            rate_and: args[0],
            rate_nand: args[1],
            rate_or: args[2],
            rate_nor: args[3],
            rate_xor: args[4],
            rate_xnor: args[5],
            rate_unary: args[6],
            max_fanin: 4,
        }
    }

    fn pick_gate(&self, rng: &mut StdRng) -> GateType {
        let v: f64 = rng.gen();
        let mut acc = 0.0;
        acc += self.rate_and;
        if v < acc {
            return GateType::And;
        }
        acc += self.rate_nand;
        if v < acc {
            return GateType::Nand;
        }
        acc += self.rate_or;
        if v < acc {
            return GateType::Or;
        }
        acc += self.rate_nor;
        if v < acc {
            return GateType::Nor;
        }
        acc += self.rate_xor;
        if v < acc {
            return GateType::Xor;
        }
        acc += self.rate_xnor;
        if v < acc {
            return GateType::Xnor;
        }
        let _ = self.rate_unary;
        if rng.gen_bool(0.5) {
            GateType::Not
        } else {
            GateType::Buff
        }
    }
}

/// A randomly generated gate-level network, used to exercise the ATPG
/// engine over structurally varied circuits. Built in two combinational
/// stages straddling an optional bank of storage elements, so
/// transition-delay faults have a real launch/capture boundary to cross.
pub struct RandomNetwork {
    pub net: NetworkModel,
    pub seed: u64,
}

impl RandomNetwork {
    /// `n_pi` primary inputs feed `n_gates1` combinational gates (stage one).
    /// `n_ff` storage elements are then driven from randomly chosen stage-one
    /// nodes; their outputs, together with the stage-one nodes, feed
    /// `n_gates2` further gates (stage two, empty for a purely combinational
    /// network). `n_po` primary outputs are driven from the final node pool.
    pub fn new_random(
        n_pi: usize,
        n_gates1: usize,
        n_ff: usize,
        n_gates2: usize,
        n_po: usize,
        config: RandomNetConfig,
        seed: u64,
    ) -> Self {
        assert!(n_pi >= 1, "need at least one primary input");
        assert!(n_po >= 1, "need at least one primary output");
        let mut rng = StdRng::seed_from_u64(seed);
        let mut b = NetworkBuilder::new();

        let mut pool: Vec<NodeId> = (0..n_pi).map(|_| b.add_primary_input()).collect();

        for _ in 0..n_gates1 {
            let gate = config.pick_gate(&mut rng);
            let fanins = choose_fanins(&pool, gate, config.max_fanin, &mut rng);
            let id = b.add_logic(gate, fanins);
            pool.push(id);
        }

        for i in 0..n_ff {
            let driver = *pool.choose(&mut rng).expect("pool is non-empty");
            let (_d, q) = b.add_storage_element(format!("ff{}", i), driver);
            pool.push(q);
        }

        for _ in 0..n_gates2 {
            let gate = config.pick_gate(&mut rng);
            let fanins = choose_fanins(&pool, gate, config.max_fanin, &mut rng);
            let id = b.add_logic(gate, fanins);
            pool.push(id);
        }

        let po_drivers: Vec<NodeId> = (0..n_po)
            .map(|_| *pool.choose(&mut rng).expect("pool is non-empty"))
            .collect();
        for driver in po_drivers {
            b.add_primary_output(driver);
        }

        let net = b.build().expect("random generator only emits well-formed networks");
        RandomNetwork { net, seed }
    }
}

fn choose_fanins(pool: &[NodeId], gate: GateType, max_fanin: usize, rng: &mut StdRng) -> Vec<NodeId> {
    let arity = match gate.arity_fixed() {
        Some(a) => a,
        None => rng.gen_range(2..=max_fanin.max(2)),
    };
    let arity = arity.min(pool.len()).max(1);
    pool.iter().copied().choose_multiple(rng, arity)
}
