use std::{cmp::Ordering, collections::BTreeSet};

use crate::formula::{Clause, Variable};

#[derive(PartialEq, Clone, Copy)]
struct QueueEntry {
    score: f64,
    variable: Variable,
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        let ordering = self
            .score
            .partial_cmp(&other.score)
            .expect("NaN in queue entry");
        if ordering != Ordering::Equal {
            return ordering;
        }

        // Equal scores: the smaller variable ID must compare greater, so
        // that taking the queue maximum picks it.
        other.variable.index().cmp(&self.variable.index())
    }
}

/// Variable State Independent Decaying Sum (VSIDS) heuristic.
///
/// Decay is folded into a growing bump value: adding a larger
/// `current_rate` for recent conflicts is equivalent to multiplying every
/// older score by the decay factor. Scores are rescaled before they can
/// overflow.
pub struct VsidsScoring {
    current_rate: f64,
    scores: Vec<f64>,
    queue: BTreeSet<QueueEntry>,
}

impl VsidsScoring {
    const DECAY_RATE: f64 = 0.95;
    const REBALANCE_THRESHOLD: f64 = 1e100;

    pub fn new(num_variables: usize) -> Self {
        let scores = vec![0.0; num_variables];
        let mut queue = BTreeSet::new();

        for index in 0..num_variables {
            queue.insert(QueueEntry {
                score: 0.0,
                variable: Variable::from_index(index).unwrap(),
            });
        }

        VsidsScoring {
            current_rate: 1.0,
            scores,
            queue,
        }
    }

    fn entry(&self, variable: Variable) -> QueueEntry {
        QueueEntry {
            score: self.scores[variable.index()],
            variable,
        }
    }

    fn bump(&mut self, variable: Variable) {
        let present = self.queue.remove(&self.entry(variable));

        self.scores[variable.index()] += self.current_rate;

        if present {
            self.queue.insert(self.entry(variable));
        }

        if self.scores[variable.index()] >= Self::REBALANCE_THRESHOLD {
            self.rebalance();
        }
    }

    fn rebalance(&mut self) {
        self.current_rate /= Self::REBALANCE_THRESHOLD;
        for index in 0..self.scores.len() {
            let variable = Variable::from_index(index).unwrap();
            let present = self.queue.remove(&self.entry(variable));
            self.scores[index] /= Self::REBALANCE_THRESHOLD;
            if present {
                self.queue.insert(self.entry(variable));
            }
        }
    }

    /// Puts an unassigned variable (back) into the decision queue.
    pub fn insert(&mut self, variable: Variable) {
        trace!("VSIDS insert {}", variable);
        self.queue.insert(self.entry(variable));
    }

    /// Removes an assigned variable from the decision queue.
    pub fn remove(&mut self, variable: Variable) {
        trace!("VSIDS remove {}", variable);
        self.queue.remove(&self.entry(variable));
    }

    /// The queued variable with the highest score; ties go to the
    /// smallest variable ID.
    pub fn top(&self) -> Option<Variable> {
        self.queue.iter().next_back().map(|entry| entry.variable)
    }

    pub fn decay(&mut self) {
        self.current_rate /= Self::DECAY_RATE;
    }

    /// Bumps every variable that participates in a learned clause.
    pub fn learn_clause(&mut self, clause: &Clause) {
        for literal in clause.iter() {
            self.bump(literal.variable());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Literal;

    fn variable(index: usize) -> Variable {
        Variable::from_index(index).unwrap()
    }

    fn clause_of(indices: &[usize]) -> Clause {
        Clause::new(
            indices
                .iter()
                .map(|&index| Literal::new(variable(index), true))
                .collect(),
        )
    }

    #[test]
    fn zero_scores_tie_break_to_smallest_id() {
        let scoring = VsidsScoring::new(3);
        assert_eq!(scoring.top(), Some(variable(0)));
    }

    #[test]
    fn bumped_variable_wins() {
        let mut scoring = VsidsScoring::new(3);
        scoring.learn_clause(&clause_of(&[2]));
        assert_eq!(scoring.top(), Some(variable(2)));
    }

    #[test]
    fn recent_bumps_outweigh_old_ones() {
        let mut scoring = VsidsScoring::new(2);
        scoring.learn_clause(&clause_of(&[0]));
        scoring.decay();
        scoring.learn_clause(&clause_of(&[1]));
        assert_eq!(scoring.top(), Some(variable(1)));
    }

    #[test]
    fn removed_variables_are_not_picked() {
        let mut scoring = VsidsScoring::new(2);
        scoring.remove(variable(0));
        assert_eq!(scoring.top(), Some(variable(1)));

        scoring.insert(variable(0));
        assert_eq!(scoring.top(), Some(variable(0)));
    }

    #[test]
    fn scores_survive_queue_removal() {
        let mut scoring = VsidsScoring::new(2);
        scoring.remove(variable(1));
        scoring.learn_clause(&clause_of(&[1]));
        scoring.insert(variable(1));
        assert_eq!(scoring.top(), Some(variable(1)));
    }

    #[test]
    fn rebalance_preserves_ordering() {
        let mut scoring = VsidsScoring::new(3);
        scoring.learn_clause(&clause_of(&[2]));

        // Grow the bump value past the rescale threshold.
        for _ in 0..5000 {
            scoring.decay();
        }
        scoring.learn_clause(&clause_of(&[1]));

        assert!(scoring.scores.iter().all(|score| score.is_finite()));
        assert_eq!(scoring.top(), Some(variable(1)));
    }
}
