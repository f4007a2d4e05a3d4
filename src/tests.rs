use paste::paste;

use crate::{
    parser::parse_file,
    solver::{CdclSolver, DpllSolver, Solver},
};

macro_rules! sat_testcase_with_solver {
    ($solver:ident, $dir:ident, $name:ident) => {
        paste! {
            #[test]
            fn [< $solver:lower _ $dir _ $name >]() {
                let formula = parse_file(
                    concat!("testcases/", stringify!($dir), "/", stringify!($name), ".cnf")
                ).unwrap();
                let solver = $solver::new(formula);
                assert!(solver.solve().is_some());
            }
        }
    };
}

macro_rules! unsat_testcase_with_solver {
    ($solver:ident, $dir:ident, $name:ident) => {
        paste! {
            #[test]
            fn [< $solver:lower _ $dir _ $name >]() {
                let formula = parse_file(
                    concat!("testcases/", stringify!($dir), "/", stringify!($name), ".cnf")
                ).unwrap();
                let solver = $solver::new(formula);
                assert!(solver.solve().is_none());
            }
        }
    };
}

macro_rules! sat_testcase {
    ($dir:ident, $name:ident) => {
        sat_testcase_with_solver!(DpllSolver, $dir, $name);
        sat_testcase_with_solver!(CdclSolver, $dir, $name);
    };
}

macro_rules! unsat_testcase {
    ($dir:ident, $name:ident) => {
        unsat_testcase_with_solver!(DpllSolver, $dir, $name);
        unsat_testcase_with_solver!(CdclSolver, $dir, $name);
    };
}

sat_testcase!(basic, simple);
sat_testcase!(basic, empty);
sat_testcase!(basic, tautology);
sat_testcase!(basic, units);
sat_testcase!(basic, chain_sat);
sat_testcase!(basic, dup_literals);
sat_testcase!(basic, planted20);

unsat_testcase!(basic, trivial_contradiction);
unsat_testcase!(basic, chain);
unsat_testcase!(basic, empty_clause);
unsat_testcase!(basic, units_conflict);
unsat_testcase!(basic, learning);

unsat_testcase!(pigeonhole, php32);
unsat_testcase!(pigeonhole, php43);

mod random {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::formula::Cnf;
    use crate::solver::{CdclSolver, DpllSolver, Solver, Strategy};

    /// Truth-table oracle over the raw clause list.
    fn brute_force_satisfiable(num_variables: usize, clauses: &[Vec<i64>]) -> bool {
        assert!(num_variables <= 12);

        (0u32..1 << num_variables).any(|candidate| {
            clauses.iter().all(|clause| {
                clause.iter().any(|&code| {
                    let value = candidate & (1 << (code.abs() - 1)) != 0;
                    if code > 0 {
                        value
                    } else {
                        !value
                    }
                })
            })
        })
    }

    fn random_3cnf(rng: &mut StdRng, num_variables: usize, num_clauses: usize) -> Vec<Vec<i64>> {
        (0..num_clauses)
            .map(|_| {
                let mut variables = Vec::new();
                while variables.len() < 3 {
                    let variable = rng.gen_range(1..=num_variables as i64);
                    if !variables.contains(&variable) {
                        variables.push(variable);
                    }
                }

                variables
                    .into_iter()
                    .map(|variable| if rng.gen() { variable } else { -variable })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn solvers_agree_with_the_truth_table_oracle() {
        let mut rng = StdRng::seed_from_u64(0x11707);

        for round in 0..40 {
            let num_variables = rng.gen_range(3..=10);
            let num_clauses = rng.gen_range(num_variables..=4 * num_variables);
            let clauses = random_3cnf(&mut rng, num_variables, num_clauses);
            let expected = brute_force_satisfiable(num_variables, &clauses);

            let build = || Cnf::from_dimacs(num_variables, &clauses).unwrap();

            // `Model::new` already asserts the assignment satisfies the
            // formula, so only the decision needs cross-checking here.
            for decision in [
                CdclSolver::with_strategy(build(), Strategy::Vsids).solve(),
                CdclSolver::with_strategy(build(), Strategy::Basic).solve(),
                DpllSolver::new(build()).solve(),
            ] {
                assert_eq!(
                    decision.is_some(),
                    expected,
                    "solver disagrees with the oracle in round {}",
                    round
                );
            }
        }
    }
}
