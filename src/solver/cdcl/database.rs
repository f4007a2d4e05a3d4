use std::{
    collections::BTreeSet,
    fmt::Display,
    ops::{Index, IndexMut},
};

use typed_index_collections::TiVec;

use crate::formula::{Clause, Literal};

use super::store::VariableStore;

/// Stable handle of a clause in the database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClauseIdx(usize);

impl From<usize> for ClauseIdx {
    fn from(index: usize) -> Self {
        ClauseIdx(index)
    }
}

impl From<ClauseIdx> for usize {
    fn from(index: ClauseIdx) -> Self {
        index.0
    }
}

impl Display for ClauseIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClauseStatus {
    Falsified,
    Satisfied,
    Unit,
    Unresolved,
}

impl ClauseStatus {
    fn from_count(total: usize, satisfied: usize, falsified: usize) -> Self {
        if falsified == total {
            ClauseStatus::Falsified
        } else if satisfied > 0 {
            ClauseStatus::Satisfied
        } else if falsified + 1 == total {
            ClauseStatus::Unit
        } else {
            ClauseStatus::Unresolved
        }
    }
}

#[derive(Clone, Copy)]
struct StatusChange {
    old: ClauseStatus,
    new: ClauseStatus,
}

/// Literal counts of one clause under the current assignment.
#[derive(Clone, Debug)]
struct ClauseCounts {
    total: usize,
    satisfied: usize,
    falsified: usize,
    status: ClauseStatus,
}

impl ClauseCounts {
    fn new(total: usize, satisfied: usize, falsified: usize) -> Self {
        assert!(satisfied.checked_add(falsified).unwrap() <= total);

        ClauseCounts {
            total,
            satisfied,
            falsified,
            status: ClauseStatus::from_count(total, satisfied, falsified),
        }
    }

    fn status(&self) -> ClauseStatus {
        self.status
    }

    fn update(&mut self, satisfied_delta: isize, falsified_delta: isize) -> StatusChange {
        let old = self.status;
        self.satisfied = (self.satisfied as isize + satisfied_delta) as usize;
        self.falsified = (self.falsified as isize + falsified_delta) as usize;
        self.status = ClauseStatus::from_count(self.total, self.satisfied, self.falsified);
        StatusChange {
            old,
            new: self.status,
        }
    }
}

/// Indices of the clauses BCP cares about, keyed by status.
///
/// `BTreeSet` iteration is ascending, so "first unit" and "first
/// falsified" mean lowest database index: the deterministic
/// first-in-database-order choice. Satisfied and unresolved clauses are
/// never queried and are not indexed.
#[derive(Default)]
struct StatusIndex {
    unit: BTreeSet<ClauseIdx>,
    falsified: BTreeSet<ClauseIdx>,
}

impl StatusIndex {
    fn set_for(&mut self, status: ClauseStatus) -> Option<&mut BTreeSet<ClauseIdx>> {
        match status {
            ClauseStatus::Unit => Some(&mut self.unit),
            ClauseStatus::Falsified => Some(&mut self.falsified),
            ClauseStatus::Satisfied | ClauseStatus::Unresolved => None,
        }
    }

    fn insert(&mut self, index: ClauseIdx, status: ClauseStatus) {
        if let Some(set) = self.set_for(status) {
            set.insert(index);
        }
    }

    fn update(&mut self, index: ClauseIdx, change: StatusChange) {
        if change.old == change.new {
            return;
        }

        if let Some(set) = self.set_for(change.old) {
            set.remove(&index);
        }
        self.insert(index, change.new);
    }
}

/// Literal -> indices of clauses containing it.
struct OccurLists {
    rows: Vec<Vec<ClauseIdx>>,
}

impl OccurLists {
    fn new(num_variables: usize) -> Self {
        OccurLists {
            rows: vec![Vec::new(); num_variables * 2],
        }
    }

    fn row(literal: Literal) -> usize {
        literal.index() * 2 + literal.positive() as usize
    }
}

impl Index<Literal> for OccurLists {
    type Output = Vec<ClauseIdx>;

    fn index(&self, literal: Literal) -> &Self::Output {
        &self.rows[Self::row(literal)]
    }
}

impl IndexMut<Literal> for OccurLists {
    fn index_mut(&mut self, literal: Literal) -> &mut Self::Output {
        &mut self.rows[Self::row(literal)]
    }
}

struct StoredClause {
    clause: Clause,
    counts: ClauseCounts,
}

/// Append-only clause database.
///
/// Holds the original clauses and every clause learned during the solve,
/// and keeps per-clause literal counts current as the assignment evolves
/// so BCP can ask for unit and falsified clauses without scanning.
pub struct ClauseDb {
    clauses: TiVec<ClauseIdx, StoredClause>,
    occur: OccurLists,
    index: StatusIndex,
}

impl ClauseDb {
    pub fn new(num_variables: usize) -> Self {
        ClauseDb {
            clauses: TiVec::new(),
            occur: OccurLists::new(num_variables),
            index: StatusIndex::default(),
        }
    }

    /// Appends a clause, counting its literals under the current partial
    /// assignment so mid-search insertion of learned clauses is sound.
    pub fn append(&mut self, clause: Clause, store: &VariableStore) -> ClauseIdx {
        debug_assert!(!clause.is_empty());

        let index = self.clauses.next_key();
        let mut satisfied = 0;
        let mut falsified = 0;

        for literal in clause.iter() {
            match store.literal_value(literal) {
                Some(true) => satisfied += 1,
                Some(false) => falsified += 1,
                None => {}
            }
            self.occur[literal].push(index);
        }

        let counts = ClauseCounts::new(clause.len(), satisfied, falsified);
        self.index.insert(index, counts.status());
        self.clauses.push(StoredClause { clause, counts });

        index
    }

    pub fn get(&self, index: ClauseIdx) -> &Clause {
        &self.clauses[index].clause
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn status(&self, index: ClauseIdx) -> ClauseStatus {
        self.clauses[index].counts.status()
    }

    /// Propagates a fresh assignment into the counts.
    pub fn on_assign(&mut self, literal: Literal) {
        for &index in &self.occur[literal] {
            let change = self.clauses[index].counts.update(1, 0);
            self.index.update(index, change);
        }
        for &index in &self.occur[!literal] {
            let change = self.clauses[index].counts.update(0, 1);
            self.index.update(index, change);
        }
    }

    /// Reverts the effect of `on_assign` for an unassigned literal.
    pub fn on_unassign(&mut self, literal: Literal) {
        for &index in &self.occur[literal] {
            let change = self.clauses[index].counts.update(-1, 0);
            self.index.update(index, change);
        }
        for &index in &self.occur[!literal] {
            let change = self.clauses[index].counts.update(0, -1);
            self.index.update(index, change);
        }
    }

    /// Lowest-index clause with exactly one free literal and none satisfied.
    pub fn first_unit(&self) -> Option<ClauseIdx> {
        self.index.unit.iter().next().copied()
    }

    /// Lowest-index clause with every literal falsified.
    pub fn first_falsified(&self) -> Option<ClauseIdx> {
        self.index.falsified.iter().next().copied()
    }

    /// The single free literal of a unit clause.
    pub fn free_literal(&self, index: ClauseIdx, store: &VariableStore) -> Option<Literal> {
        self.get(index)
            .iter()
            .find(|&literal| store.literal_value(literal).is_none())
    }
}
