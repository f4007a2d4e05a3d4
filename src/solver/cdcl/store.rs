use crate::formula::{Literal, Variable};

use super::database::ClauseIdx;

/// Per-variable search state and the assignment trail.
///
/// A variable is assigned iff its value is present; level and antecedent
/// are meaningful only while assigned. Assignments push onto the trail in
/// order, so the variables above any level form a trail suffix and
/// backtracking is truncation.
pub struct VariableStore {
    values: Vec<Option<bool>>,
    levels: Vec<usize>,
    antecedents: Vec<Option<ClauseIdx>>,
    trail: Vec<Literal>,
}

impl VariableStore {
    pub fn new(num_variables: usize) -> Self {
        VariableStore {
            values: vec![None; num_variables],
            levels: vec![0; num_variables],
            antecedents: vec![None; num_variables],
            trail: Vec::with_capacity(num_variables),
        }
    }

    pub fn num_variables(&self) -> usize {
        self.values.len()
    }

    pub fn num_assigned(&self) -> usize {
        self.trail.len()
    }

    pub fn value(&self, variable: Variable) -> Option<bool> {
        self.values[variable.index()]
    }

    pub fn literal_value(&self, literal: Literal) -> Option<bool> {
        literal.partial_value(&self.values)
    }

    /// Decision level of an assigned variable.
    pub fn level(&self, variable: Variable) -> usize {
        debug_assert!(self.values[variable.index()].is_some());
        self.levels[variable.index()]
    }

    /// The clause that propagated the variable.
    /// `None` for decisions and unassigned variables.
    pub fn antecedent(&self, variable: Variable) -> Option<ClauseIdx> {
        self.antecedents[variable.index()]
    }

    pub fn assignments(&self) -> &[Option<bool>] {
        &self.values
    }

    /// Assigned literals, oldest first.
    pub fn trail(&self) -> &[Literal] {
        &self.trail
    }

    pub fn first_unassigned(&self) -> Option<Variable> {
        let index = self.values.iter().position(|value| value.is_none())?;
        Variable::from_index(index)
    }

    /// Installs an assignment making `literal` true.
    ///
    /// # Panics
    ///
    /// Panics if the variable is already assigned.
    pub fn assign(&mut self, literal: Literal, level: usize, antecedent: Option<ClauseIdx>) {
        let index = literal.index();
        let old_value = self.values[index].replace(literal.positive());
        assert!(
            old_value.is_none(),
            "variable {} assigned twice",
            literal.variable()
        );

        self.levels[index] = level;
        self.antecedents[index] = antecedent;
        self.trail.push(literal);
    }

    /// Undoes the most recent assignment if it lives above `target_level`,
    /// returning the removed literal. Level-0 assignments are permanent
    /// since no target below them is expressible.
    pub fn pop_above(&mut self, target_level: usize) -> Option<Literal> {
        let &literal = self.trail.last()?;
        if self.levels[literal.index()] <= target_level {
            return None;
        }

        self.trail.pop();
        self.values[literal.index()] = None;
        self.antecedents[literal.index()] = None;
        Some(literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(code: i64) -> Literal {
        Literal::from_dimacs(code).unwrap()
    }

    #[test]
    fn assign_records_value_level_antecedent() {
        let mut store = VariableStore::new(3);
        store.assign(lit(-2), 1, Some(ClauseIdx::from(4)));

        let variable = lit(2).variable();
        assert_eq!(store.value(variable), Some(false));
        assert_eq!(store.level(variable), 1);
        assert_eq!(store.antecedent(variable), Some(ClauseIdx::from(4)));
        assert_eq!(store.num_assigned(), 1);
        assert_eq!(store.literal_value(lit(-2)), Some(true));
    }

    #[test]
    fn pop_above_truncates_to_target_level() {
        let mut store = VariableStore::new(4);
        store.assign(lit(1), 0, None);
        store.assign(lit(2), 1, None);
        store.assign(lit(3), 2, None);
        store.assign(lit(4), 2, Some(ClauseIdx::from(0)));

        assert_eq!(store.pop_above(1), Some(lit(4)));
        assert_eq!(store.pop_above(1), Some(lit(3)));
        assert_eq!(store.pop_above(1), None);
        assert_eq!(store.trail(), &[lit(1), lit(2)]);
        assert_eq!(store.antecedent(lit(4).variable()), None);
        assert_eq!(store.first_unassigned(), Some(lit(3).variable()));
    }

    #[test]
    fn level_zero_assignments_are_permanent() {
        let mut store = VariableStore::new(1);
        store.assign(lit(1), 0, None);
        assert_eq!(store.pop_above(0), None);
        assert_eq!(store.value(lit(1).variable()), Some(true));
    }

    #[test]
    #[should_panic(expected = "assigned twice")]
    fn double_assignment_panics() {
        let mut store = VariableStore::new(1);
        store.assign(lit(1), 0, None);
        store.assign(lit(-1), 1, None);
    }
}
