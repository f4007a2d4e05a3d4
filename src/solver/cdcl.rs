use crate::formula::{Clause, Cnf, Literal, Model, Variable};

use self::conflict::{Analysis, ConflictAnalyzer, ConflictDataProvider};
use self::database::{ClauseDb, ClauseIdx, ClauseStatus};
use self::store::VariableStore;
use self::vsids::VsidsScoring;

use super::Solver;

mod conflict;
mod database;
mod store;
mod vsids;

/// Decision heuristic selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// First unassigned variable in ascending order.
    Basic,
    /// Highest VSIDS activity.
    Vsids,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Vsids
    }
}

/// Outcome of Boolean constraint propagation.
enum Propagation {
    /// Fixpoint reached without falsifying any clause.
    Normal,
    /// The referenced clause has every literal falsified.
    Conflict(ClauseIdx),
}

/// Implication graph exposed to the conflict analyzer: the store knows
/// values, levels, and antecedent indices; the database resolves the
/// indices to clauses.
struct ImplicationView<'solver> {
    store: &'solver VariableStore,
    database: &'solver ClauseDb,
}

impl ConflictDataProvider for ImplicationView<'_> {
    fn value(&self, variable: Variable) -> bool {
        self.store
            .value(variable)
            .expect("implication graph variable is unassigned")
    }

    fn level(&self, variable: Variable) -> usize {
        self.store.level(variable)
    }

    fn antecedent(&self, variable: Variable) -> Option<&Clause> {
        self.store
            .antecedent(variable)
            .map(|index| self.database.get(index))
    }
}

pub struct CdclSolver {
    formula: Cnf,
    store: VariableStore,
    database: ClauseDb,
    analyzer: ConflictAnalyzer,
    scoring: VsidsScoring,
    strategy: Strategy,
    level: usize,
}

impl CdclSolver {
    /// Creates a solver with an explicit decision strategy.
    pub fn with_strategy(mut formula: Cnf, strategy: Strategy) -> Self {
        // Unit and binary clauses first, so early propagation passes hit
        // them before longer clauses.
        formula.sort_clauses_by_len();

        let num_variables = formula.num_variables();
        let store = VariableStore::new(num_variables);
        let mut database = ClauseDb::new(num_variables);
        for clause in formula.clauses() {
            database.append(clause.clone(), &store);
        }

        CdclSolver {
            formula,
            store,
            database,
            analyzer: ConflictAnalyzer::new(num_variables),
            scoring: VsidsScoring::new(num_variables),
            strategy,
            level: 0,
        }
    }

    fn assign(&mut self, literal: Literal, antecedent: Option<ClauseIdx>) {
        self.store.assign(literal, self.level, antecedent);
        self.database.on_assign(literal);
        self.scoring.remove(literal.variable());
    }

    /// Runs unit propagation to fixpoint at the current decision level.
    ///
    /// Falsified clauses take priority over unit ones, so the first
    /// conflict ends propagation immediately. Both are taken lowest
    /// database index first, which keeps runs reproducible.
    fn propagate(&mut self) -> Propagation {
        loop {
            if let Some(conflict) = self.database.first_falsified() {
                debug!("conflict in clause {} at level {}", conflict, self.level);
                return Propagation::Conflict(conflict);
            }

            let unit = match self.database.first_unit() {
                Some(unit) => unit,
                None => return Propagation::Normal,
            };
            debug_assert_eq!(self.database.status(unit), ClauseStatus::Unit);

            let literal = self
                .database
                .free_literal(unit, &self.store)
                .expect("unit clause without a free literal");
            trace!("propagate {} forced by clause {}", literal, unit);
            self.assign(literal, Some(unit));
        }
    }

    /// Derives the learned clause and backjump level for a conflict.
    fn analyze(&mut self, conflict: ClauseIdx) -> Analysis {
        let view = ImplicationView {
            store: &self.store,
            database: &self.database,
        };
        self.analyzer.analyze(
            &view,
            self.level,
            self.database.get(conflict),
            self.store.trail(),
        )
    }

    /// Undoes every assignment above `target_level` and makes it the
    /// current decision level.
    fn backtrack(&mut self, target_level: usize) {
        while let Some(literal) = self.store.pop_above(target_level) {
            self.database.on_unassign(literal);
            self.scoring.insert(literal.variable());
        }
        self.level = target_level;
    }

    fn choose_literal(&self) -> Option<Literal> {
        let variable = match self.strategy {
            Strategy::Basic => self.store.first_unassigned(),
            Strategy::Vsids => self.scoring.top(),
        }?;

        Some(Literal::new(variable, true))
    }
}

impl Solver for CdclSolver {
    fn new(formula: Cnf) -> Self {
        CdclSolver::with_strategy(formula, Strategy::default())
    }

    fn solve(mut self) -> Option<Model> {
        if self.formula.empty_clause_count() > 0 {
            return None;
        }

        // Root-level propagation. A conflict here needs no analysis.
        if let Propagation::Conflict(_) = self.propagate() {
            return None;
        }

        while self.store.num_assigned() < self.store.num_variables() {
            let literal = match self.choose_literal() {
                Some(literal) => literal,
                None => break,
            };

            self.level += 1;
            debug!("decide {} at level {}", literal, self.level);
            self.assign(literal, None);

            loop {
                let conflict = match self.propagate() {
                    Propagation::Normal => break,
                    Propagation::Conflict(conflict) => conflict,
                };

                if self.level == 0 {
                    return None;
                }

                let Analysis {
                    clause,
                    backjump_level,
                } = self.analyze(conflict);
                debug!("learned {} (backjump to level {})", clause, backjump_level);

                self.scoring.learn_clause(&clause);
                self.scoring.decay();

                self.backtrack(backjump_level);

                // Under the truncated assignment the learned clause is
                // unit on the UIP literal, so the next propagation pass
                // asserts it.
                self.database.append(clause, &self.store);
            }
        }

        debug!(
            "satisfiable with {} clauses in the database ({} learned)",
            self.database.len(),
            self.database.len() - self.formula.clauses().len()
        );

        let assignment = self
            .store
            .assignments()
            .iter()
            .map(|value| value.unwrap_or(true))
            .collect();

        Some(Model::new(self.formula, assignment))
    }
}
