use crate::formula::{Cnf, Literal, Model, Variable};

use self::inner::Occurrences;

use super::Solver;

/// Internal modules whose implementation details are hidden from the solver.
mod inner {
    use std::ops::{Index, IndexMut};

    use crate::formula::{Clause, Literal};

    /// Literal -> indices of clauses containing it.
    #[derive(Debug)]
    pub struct Occurrences {
        rows: Vec<Vec<usize>>,
    }

    impl Occurrences {
        pub fn new(num_variables: usize, clauses: &[Clause]) -> Self {
            let mut occurrences = Occurrences {
                rows: vec![Vec::new(); num_variables * 2],
            };

            for (index, clause) in clauses.iter().enumerate() {
                for literal in clause.iter() {
                    occurrences[literal].push(index);
                }
            }

            occurrences
        }

        fn row(literal: Literal) -> usize {
            literal.index() * 2 + literal.positive() as usize
        }
    }

    impl Index<Literal> for Occurrences {
        type Output = Vec<usize>;

        fn index(&self, literal: Literal) -> &Self::Output {
            &self.rows[Self::row(literal)]
        }
    }

    impl IndexMut<Literal> for Occurrences {
        fn index_mut(&mut self, literal: Literal) -> &mut Self::Output {
            &mut self.rows[Self::row(literal)]
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ClauseCount {
    /// Satisfied literal count in the clause.
    satisfied: usize,
    /// Falsified literal count in the clause.
    falsified: usize,
}

/// Trail entry; decisions remember whether their flip was already tried.
#[derive(Clone, Copy, Debug)]
enum TrailEntry {
    Decision { literal: Literal, flipped: bool },
    Forced(Literal),
}

impl TrailEntry {
    fn literal(self) -> Literal {
        match self {
            TrailEntry::Decision { literal, .. } => literal,
            TrailEntry::Forced(literal) => literal,
        }
    }
}

/// DPLL solver with chronological backtracking.
///
/// The simpler fallback next to [`CdclSolver`](super::CdclSolver): no
/// clause learning, conflicts roll the trail back to the deepest decision
/// whose other phase is untried.
#[derive(Debug)]
pub struct DpllSolver {
    formula: Cnf,
    occurrences: Occurrences,
    /// Variable index -> assigned status
    assignment: Vec<Option<bool>>,
    /// Clause index -> literal counts under the current assignment
    counts: Vec<ClauseCount>,
    /// Cache for `clauses.count(satisfied > 0)`
    satisfied_clauses: usize,
    /// Cache for `clauses.count(falsified == clause.len())`
    falsified_clauses: usize,
    trail: Vec<TrailEntry>,
}

impl DpllSolver {
    fn assign(&mut self, entry: TrailEntry) {
        let literal = entry.literal();
        self.trail.push(entry);
        self.assignment[literal.index()] = Some(literal.positive());

        for &index in &self.occurrences[literal] {
            let count = &mut self.counts[index];
            if count.satisfied == 0 {
                self.satisfied_clauses += 1;
            }
            count.satisfied += 1;
        }

        for &index in &self.occurrences[!literal] {
            let count = &mut self.counts[index];
            count.falsified += 1;
            if count.falsified == self.formula.clauses()[index].len() {
                self.falsified_clauses += 1;
            }
        }
    }

    fn unassign_last(&mut self) -> TrailEntry {
        let entry = self.trail.pop().expect("backtrack on an empty trail");
        let literal = entry.literal();
        self.assignment[literal.index()] = None;

        for &index in &self.occurrences[literal] {
            let count = &mut self.counts[index];
            count.satisfied -= 1;
            if count.satisfied == 0 {
                self.satisfied_clauses -= 1;
            }
        }

        for &index in &self.occurrences[!literal] {
            let count = &mut self.counts[index];
            if count.falsified == self.formula.clauses()[index].len() {
                self.falsified_clauses -= 1;
            }
            count.falsified -= 1;
        }

        entry
    }

    /// Finds the forced literal of some unit clause.
    fn find_unit(&self) -> Option<Literal> {
        for (index, clause) in self.formula.clauses().iter().enumerate() {
            let count = self.counts[index];
            if count.satisfied == 0 && count.falsified + 1 == clause.len() {
                return clause
                    .iter()
                    .find(|&literal| self.assignment[literal.index()].is_none());
            }
        }

        None
    }

    fn first_unassigned(&self) -> Option<Literal> {
        let index = self.assignment.iter().position(|value| value.is_none())?;
        Some(Literal::new(Variable::from_index(index).unwrap(), true))
    }

    /// Chronological backtrack: undo the trail up to the deepest decision
    /// with an untried phase and assign its flip. Returns false when no
    /// such decision remains.
    fn backtrack(&mut self) -> bool {
        while !self.trail.is_empty() {
            if let TrailEntry::Decision {
                literal,
                flipped: false,
            } = self.unassign_last()
            {
                trace!("flip {}", literal);
                self.assign(TrailEntry::Decision {
                    literal: !literal,
                    flipped: true,
                });
                return true;
            }
        }

        false
    }
}

impl Solver for DpllSolver {
    fn new(formula: Cnf) -> Self {
        let num_variables = formula.num_variables();
        let num_clauses = formula.clauses().len();
        let occurrences = Occurrences::new(num_variables, formula.clauses());

        DpllSolver {
            formula,
            occurrences,
            assignment: vec![None; num_variables],
            counts: vec![Default::default(); num_clauses],
            satisfied_clauses: 0,
            falsified_clauses: 0,
            trail: Vec::with_capacity(num_variables),
        }
    }

    fn solve(mut self) -> Option<Model> {
        if self.formula.empty_clause_count() > 0 {
            return None;
        }

        loop {
            if self.falsified_clauses > 0 {
                // Some clause can never be satisfied on this branch.
                if !self.backtrack() {
                    return None;
                }
                continue;
            }

            if self.satisfied_clauses == self.formula.clauses().len() {
                // All clauses are satisfied, fill remaining variables and return.
                let assignment = self
                    .assignment
                    .iter()
                    .map(|value| value.unwrap_or(true))
                    .collect::<Vec<_>>();

                return Some(Model::new(self.formula, assignment));
            }

            if let Some(literal) = self.find_unit() {
                self.assign(TrailEntry::Forced(literal));
            } else {
                let literal = self
                    .first_unassigned()
                    .expect("an unresolved clause has a free literal");
                trace!("decide {}", literal);
                self.assign(TrailEntry::Decision {
                    literal,
                    flipped: false,
                });
            }
        }
    }
}
