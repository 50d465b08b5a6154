use std::fmt;
use std::ops::Not;

use varisat::ExtendFormula;

use crate::val3::Val3;

/// A CNF variable. Indices are dense and start at 0; the encoder hands them
/// out via `CnfBuilder::new_var`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u32);

impl Var {
    pub fn index(self) -> u32 {
        self.0
    }

    pub fn pos(self) -> Lit {
        Lit { var: self, neg: false }
    }

    pub fn neg(self) -> Lit {
        Lit { var: self, neg: true }
    }

    pub fn lit(self, polarity: bool) -> Lit {
        if polarity {
            self.pos()
        } else {
            self.neg()
        }
    }
}

/// A literal: a variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    var: Var,
    neg: bool,
}

impl Lit {
    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_negative(self) -> bool {
        self.neg
    }
}

impl Not for Lit {
    type Output = Lit;
    fn not(self) -> Lit {
        Lit {
            var: self.var,
            neg: !self.neg,
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.neg {
            write!(f, "-{}", self.var.0 + 1)
        } else {
            write!(f, "{}", self.var.0 + 1)
        }
    }
}

fn to_varisat(lit: Lit) -> varisat::Lit {
    varisat::Lit::from_index(lit.var.0 as usize, !lit.neg)
}

/// Outcome of a single `solve_with_assumptions` call.
pub enum SatOutcome {
    Sat(Model),
    Unsat,
    /// The resource limit (conflict budget) was hit before a verdict.
    Unknown,
}

/// A satisfying assignment. Variables never mentioned by the solver (pure
/// literals it eliminated, or variables allocated but never used in a
/// clause reachable from the assumptions) read back as `Val3::X`.
pub struct Model {
    solver: varisat::Solver<'static>,
}

impl Model {
    pub fn value(&self, var: Var) -> Val3 {
        let vlit = varisat::Lit::from_index(var.0 as usize, true);
        Val3::from_lbool(self.solver.model().and_then(|m| {
            m.iter()
                .find(|l| l.var() == vlit.var())
                .map(|l| l.is_positive())
        }))
    }

    pub fn lit_value(&self, lit: Lit) -> Val3 {
        let v = self.value(lit.var());
        if lit.is_negative() {
            !v
        } else {
            v
        }
    }
}

/// Thin wrapper over the embedded SAT backend. The CNF-emission code in
/// `gate_encoder`/`dchain`/etc. only ever talks to `Var`/`Lit`/`CnfBuilder`,
/// never to `varisat` directly.
pub struct CnfBuilder {
    next_var: u32,
    solver: varisat::Solver<'static>,
}

impl Default for CnfBuilder {
    fn default() -> Self {
        CnfBuilder::new()
    }
}

impl CnfBuilder {
    pub fn new() -> Self {
        CnfBuilder {
            next_var: 0,
            solver: varisat::Solver::new(),
        }
    }

    pub fn new_var(&mut self) -> Var {
        let v = Var(self.next_var);
        self.next_var += 1;
        v
    }

    pub fn add_clause(&mut self, lits: &[Lit]) {
        let formula: Vec<varisat::Lit> = lits.iter().map(|&l| to_varisat(l)).collect();
        self.solver.add_clause(&formula);
    }

    pub fn num_vars(&self) -> u32 {
        self.next_var
    }

    /// Runs the solver with `assumptions` held fixed. `conflict_limit`
    /// caps the search effort; `None` means unbounded.
    pub fn solve_with_assumptions(
        mut self,
        assumptions: &[Lit],
        conflict_limit: Option<u64>,
    ) -> SatOutcome {
        let alits: Vec<varisat::Lit> = assumptions.iter().map(|&l| to_varisat(l)).collect();
        self.solver.assume(&alits);
        if let Some(limit) = conflict_limit {
            self.solver
                .set_limit(varisat::Limit::Conflicts(limit as usize))
        }
        match self.solver.solve() {
            Ok(true) => SatOutcome::Sat(Model {
                solver: self.solver,
            }),
            Ok(false) => SatOutcome::Unsat,
            Err(_) => SatOutcome::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_clauses_force_assignment() {
        let mut cnf = CnfBuilder::new();
        let a = cnf.new_var();
        cnf.add_clause(&[a.pos()]);
        match cnf.solve_with_assumptions(&[], None) {
            SatOutcome::Sat(model) => assert_eq!(model.value(a), Val3::V1),
            _ => panic!("expected SAT"),
        }
    }

    #[test]
    fn contradictory_unit_clauses_are_unsat() {
        let mut cnf = CnfBuilder::new();
        let a = cnf.new_var();
        cnf.add_clause(&[a.pos()]);
        cnf.add_clause(&[a.neg()]);
        assert!(matches!(
            cnf.solve_with_assumptions(&[], None),
            SatOutcome::Unsat
        ));
    }
}
