use crate::formula::{Clause, Literal, Variable};

/// Read-only view of the implication graph during analysis.
pub trait ConflictDataProvider {
    /// Returns the current value assigned to a variable.
    fn value(&self, variable: Variable) -> bool;

    /// Returns the decision level of a variable.
    fn level(&self, variable: Variable) -> usize;

    /// Returns the clause that propagated a variable.
    /// `None` if the variable is a decision variable.
    fn antecedent(&self, variable: Variable) -> Option<&Clause>;
}

/// Result of analyzing one conflict.
pub struct Analysis {
    /// The learned clause; its last literal is the First-UIP literal.
    pub clause: Clause,
    /// Highest level below the conflict level appearing in the clause,
    /// or 0 for a unit learned clause.
    pub backjump_level: usize,
}

pub struct ConflictAnalyzer {
    /// Bitmap to check if each variable is previously seen.
    seen: Vec<bool>,
    /// A queue that records seen variables.
    seen_queue: Vec<Variable>,
}

struct Session<'inner, 'solver, P> {
    inner: &'inner mut ConflictAnalyzer,
    conflict_level: usize,
    data_provider: &'solver P,
    /// Literals of the clause to learn, all below the conflict level.
    recorded: Vec<Literal>,
    /// Conflict-level variables marked but not yet resolved away.
    open_on_conflict_level: usize,
}

impl<'inner, 'solver, P> Session<'inner, 'solver, P>
where
    P: ConflictDataProvider,
{
    fn new(
        inner: &'inner mut ConflictAnalyzer,
        data_provider: &'solver P,
        conflict_level: usize,
    ) -> Self {
        Session {
            inner,
            conflict_level,
            data_provider,
            recorded: Vec::new(),
            open_on_conflict_level: 0,
        }
    }

    /// Folds a clause into the working resolvent. Previously seen
    /// variables are skipped, which removes the pivot and deduplicates;
    /// level-0 literals are permanently false and dropped.
    fn resolve_with(&mut self, clause: &Clause) {
        for literal in clause.iter() {
            if self.inner.mark_if_unseen(literal.variable()) {
                let level = self.data_provider.level(literal.variable());
                if level == self.conflict_level {
                    self.open_on_conflict_level += 1;
                } else if level != 0 {
                    self.recorded.push(literal);
                }
            }
        }
    }

    fn seen(&self, variable: Variable) -> bool {
        self.inner.seen[variable.index()]
    }

    fn finish(self, uip: Literal) -> Analysis {
        let Session {
            inner,
            data_provider,
            mut recorded,
            ..
        } = self;

        let backjump_level = recorded
            .iter()
            .map(|literal| data_provider.level(literal.variable()))
            .max()
            .unwrap_or(0);

        recorded.push(uip);
        inner.clear();

        Analysis {
            clause: Clause::new(recorded),
            backjump_level,
        }
    }
}

impl ConflictAnalyzer {
    pub fn new(num_variables: usize) -> Self {
        ConflictAnalyzer {
            seen: vec![false; num_variables],
            seen_queue: Vec::new(),
        }
    }

    fn clear(&mut self) {
        for &variable in &self.seen_queue {
            self.seen[variable.index()] = false;
        }
        self.seen_queue.clear();
    }

    /// Mark the variable, return true if the variable is previously unseen.
    fn mark_if_unseen(&mut self, variable: Variable) -> bool {
        if self.seen[variable.index()] {
            false
        } else {
            self.seen[variable.index()] = true;
            self.seen_queue.push(variable);
            true
        }
    }

    /// Derives the First-UIP learned clause for a conflict at
    /// `conflict_level` and the level to backjump to.
    ///
    /// Walks the trail from the most recent assignment backwards.
    /// Each seen variable closes one open conflict-level path; while more
    /// than one remains, the variable was propagated (resolution always
    /// stops at or before the decision) and is resolved away through its
    /// antecedent. When exactly one remains, that variable is the First
    /// UIP and its falsifying literal completes the learned clause.
    pub fn analyze<P>(
        &mut self,
        data_provider: &P,
        conflict_level: usize,
        conflicting_clause: &Clause,
        trail: &[Literal],
    ) -> Analysis
    where
        P: ConflictDataProvider,
    {
        debug_assert!(conflict_level > 0);

        let mut session = Session::new(self, data_provider, conflict_level);
        session.resolve_with(conflicting_clause);

        for literal in trail.iter().rev().copied() {
            let variable = literal.variable();
            if !session.seen(variable) {
                continue;
            }

            session.open_on_conflict_level -= 1;
            if session.open_on_conflict_level == 0 {
                // First UIP reached
                let uip = Literal::new(variable, !data_provider.value(variable));
                return session.finish(uip);
            }

            let antecedent = data_provider
                .antecedent(variable)
                .expect("open conflict paths remain past the decision variable");
            session.resolve_with(antecedent);
        }

        unreachable!("conflict without an implication point at its level")
    }
}
