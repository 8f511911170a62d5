use crate::error::{Error, Result};
use indexmap::IndexMap;
use nalgebra as na;
use rustc_hash::FxHashMap;

mod expr;

pub use expr::{Expression, Variable};

const SINGULAR_EPS: f64 = 1e-10;
const FEASIBILITY_TOL: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    Eq,
    Le,
    Ge,
}

/// Constraint priority. `Required` constraints are hard; the others are weighted by
/// [`Strength::weight`] in a least-squares objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Required,
    Strong,
    Medium,
    Weak,
}

impl Strength {
    pub fn weight(self) -> f64 {
        match self {
            Strength::Required => f64::INFINITY,
            Strength::Strong => 1e6,
            Strength::Medium => 1e3,
            Strength::Weak => 1.0,
        }
    }
}

/// `expression <op> 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub expression: Expression,
    pub op: RelationalOperator,
    pub strength: Strength,
}

impl Constraint {
    pub fn new(expression: Expression, op: RelationalOperator, strength: Strength) -> Self {
        Self {
            expression,
            op,
            strength,
        }
    }

    /// `lhs == rhs`.
    pub fn eq(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: Strength) -> Self {
        Self::new(lhs.into() - rhs.into(), RelationalOperator::Eq, strength)
    }

    /// `lhs >= rhs`.
    pub fn ge(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: Strength) -> Self {
        Self::new(lhs.into() - rhs.into(), RelationalOperator::Ge, strength)
    }

    /// `lhs <= rhs`.
    pub fn le(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: Strength) -> Self {
        Self::new(lhs.into() - rhs.into(), RelationalOperator::Le, strength)
    }

    /// The constraint rewritten so that inequalities read `expression >= 0`.
    fn canonical(&self) -> Expression {
        let e = self.expression.normalized();
        match self.op {
            RelationalOperator::Le => -e,
            RelationalOperator::Eq | RelationalOperator::Ge => e,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(usize);

#[derive(Debug, Clone, Copy)]
struct EditInfo {
    strength: Strength,
    value: f64,
}

/// One linear row `coefficients . x + constant = 0` with a least-squares weight
/// (`None` = hard).
struct Row {
    expression: Expression,
    weight: Option<f64>,
}

/// Linear constraint solver.
///
/// `update_variables` is a pure function of the registered constraints and suggested edit
/// values, so re-solving without changes reproduces the same values bit for bit.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    names: Vec<String>,
    constraints: IndexMap<ConstraintId, Constraint>,
    next_constraint: usize,
    edits: FxHashMap<Variable, EditInfo>,
    values: Vec<f64>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_variable(&mut self, name: impl Into<String>) -> Variable {
        self.names.push(name.into());
        self.values.push(0.0);
        Variable(self.names.len() - 1)
    }

    pub fn variable_name(&self, variable: Variable) -> Option<&str> {
        self.names.get(variable.0).map(String::as_str)
    }

    pub fn value(&self, variable: Variable) -> f64 {
        self.values.get(variable.0).copied().unwrap_or(f64::NAN)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId> {
        for (v, _) in &constraint.expression.terms {
            if v.0 >= self.names.len() {
                return Err(Error::UnknownVariable { index: v.0 });
            }
        }
        let id = ConstraintId(self.next_constraint);
        self.next_constraint += 1;
        self.constraints.insert(id, constraint);
        Ok(id)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Constraint> {
        self.constraints
            .shift_remove(&id)
            .ok_or(Error::UnknownConstraint { id: id.0 })
    }

    pub fn add_edit_variable(&mut self, variable: Variable, strength: Strength) -> Result<()> {
        if strength == Strength::Required {
            return Err(Error::RequiredEditStrength);
        }
        if variable.0 >= self.names.len() {
            return Err(Error::UnknownVariable { index: variable.0 });
        }
        if self.edits.contains_key(&variable) {
            return Err(Error::DuplicateEditVariable {
                name: self.names[variable.0].clone(),
            });
        }
        let value = self.values[variable.0];
        self.edits.insert(variable, EditInfo { strength, value });
        Ok(())
    }

    pub fn remove_edit_variable(&mut self, variable: Variable) -> Result<()> {
        match self.edits.remove(&variable) {
            Some(_) => Ok(()),
            None => Err(self.unknown_edit(variable)),
        }
    }

    pub fn has_edit_variable(&self, variable: Variable) -> bool {
        self.edits.contains_key(&variable)
    }

    pub fn suggest_value(&mut self, variable: Variable, value: f64) -> Result<()> {
        let Some(edit) = self.edits.get_mut(&variable) else {
            return Err(self.unknown_edit(variable));
        };
        edit.value = value;
        Ok(())
    }

    fn unknown_edit(&self, variable: Variable) -> Error {
        Error::UnknownEditVariable {
            name: self
                .variable_name(variable)
                .unwrap_or("<unknown>")
                .to_string(),
        }
    }

    /// Solves the system and stores the new variable values.
    ///
    /// Inequalities start inactive; any inequality violated by the current solution is turned
    /// into an equality (hard if required, weighted otherwise) and the system is re-solved until
    /// no inequality is violated.
    pub fn update_variables(&mut self) -> Result<()> {
        let n = self.names.len();
        if n == 0 {
            return Ok(());
        }

        let canonical: Vec<(Expression, RelationalOperator, Strength)> = self
            .constraints
            .values()
            .map(|c| (c.canonical(), c.op, c.strength))
            .collect();
        let mut active = vec![false; canonical.len()];

        let mut edits: Vec<(Variable, EditInfo)> =
            self.edits.iter().map(|(v, e)| (*v, *e)).collect();
        edits.sort_by_key(|(v, _)| *v);

        let max_rounds = canonical
            .iter()
            .filter(|(_, op, _)| *op != RelationalOperator::Eq)
            .count()
            + 1;

        let mut x = vec![0.0; n];
        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut rows: Vec<Row> = Vec::new();
            for (i, (expression, op, strength)) in canonical.iter().enumerate() {
                if *op != RelationalOperator::Eq && !active[i] {
                    continue;
                }
                rows.push(Row {
                    expression: expression.clone(),
                    weight: (*strength != Strength::Required).then(|| strength.weight()),
                });
            }
            for (v, edit) in &edits {
                rows.push(Row {
                    expression: Expression::term(*v, 1.0) - edit.value,
                    weight: Some(edit.strength.weight()),
                });
            }

            x = solve_rows(n, &rows)?;
            let tol = tolerance(&x);

            let mut changed = false;
            for (i, (expression, op, _)) in canonical.iter().enumerate() {
                if *op == RelationalOperator::Eq || active[i] {
                    continue;
                }
                if expression.evaluate(|v| x[v.0]) < -tol {
                    active[i] = true;
                    changed = true;
                }
            }
            if !changed || rounds >= max_rounds {
                break;
            }
        }

        let tol = tolerance(&x);
        for (i, (expression, op, strength)) in canonical.iter().enumerate() {
            if *strength != Strength::Required {
                continue;
            }
            let residual = expression.evaluate(|v| x[v.0]);
            let violated = match op {
                RelationalOperator::Eq => residual.abs() > tol,
                _ => residual < -tol,
            };
            if violated || (active[i] && !residual.is_finite()) {
                return Err(Error::Unsatisfiable { residual });
            }
        }

        tracing::debug!(
            variables = n,
            constraints = canonical.len(),
            rounds,
            "constraint system solved"
        );
        self.values = x;
        Ok(())
    }
}

/// Absolute tolerance scaled by the magnitude of the solution.
fn tolerance(x: &[f64]) -> f64 {
    let scale = x.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    FEASIBILITY_TOL * scale
}

/// Minimizes `sum(w * row^2)` over the weighted rows subject to the hard rows, via the KKT
/// system `[H A^T; A 0] [x; mu] = [g; d]`, solved with an SVD pseudo-inverse so redundant hard
/// rows and unconstrained variables stay well defined (minimum-norm).
fn solve_rows(n: usize, rows: &[Row]) -> Result<Vec<f64>> {
    let hard: Vec<&Row> = rows.iter().filter(|r| r.weight.is_none()).collect();
    let m = hard.len();
    let size = n + m;

    let mut kkt = na::DMatrix::<f64>::zeros(size, size);
    let mut rhs = na::DVector::<f64>::zeros(size);

    for row in rows {
        let Some(w) = row.weight else {
            continue;
        };
        let b = -row.expression.constant;
        for (vi, ci) in &row.expression.terms {
            for (vj, cj) in &row.expression.terms {
                kkt[(vi.0, vj.0)] += w * ci * cj;
            }
            rhs[vi.0] += w * ci * b;
        }
    }

    for (k, row) in hard.iter().enumerate() {
        for (v, c) in &row.expression.terms {
            kkt[(n + k, v.0)] += c;
            kkt[(v.0, n + k)] += c;
        }
        rhs[n + k] = -row.expression.constant;
    }

    let solution = kkt
        .svd(true, true)
        .solve(&rhs, SINGULAR_EPS)
        .map_err(|message| Error::Numerical {
            message: message.to_string(),
        })?;

    Ok(solution.iter().take(n).copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn required_equalities_follow_suggested_values() {
        let mut s = Solver::new();
        let left = s.new_variable("left");
        let width = s.new_variable("width");
        let right = s.new_variable("right");
        s.add_constraint(Constraint::eq(left + width, right, Strength::Required))
            .unwrap();
        s.add_edit_variable(left, Strength::Strong).unwrap();
        s.add_edit_variable(width, Strength::Strong).unwrap();
        s.suggest_value(left, 10.0).unwrap();
        s.suggest_value(width, 30.0).unwrap();
        s.update_variables().unwrap();

        assert!(close(s.value(left), 10.0));
        assert!(close(s.value(width), 30.0));
        assert!(close(s.value(right), 40.0));
    }

    #[test]
    fn violated_inequalities_become_active() {
        let mut s = Solver::new();
        let x = s.new_variable("x");
        s.add_constraint(Constraint::ge(x, 5.0, Strength::Required))
            .unwrap();
        s.add_edit_variable(x, Strength::Weak).unwrap();
        s.suggest_value(x, 1.0).unwrap();
        s.update_variables().unwrap();
        assert!(close(s.value(x), 5.0));

        s.suggest_value(x, 7.0).unwrap();
        s.update_variables().unwrap();
        assert!(close(s.value(x), 7.0));
    }

    #[test]
    fn stronger_constraints_dominate_weaker_ones() {
        let mut s = Solver::new();
        let x = s.new_variable("x");
        s.add_constraint(Constraint::eq(x, 100.0, Strength::Weak))
            .unwrap();
        s.add_constraint(Constraint::eq(x, 0.0, Strength::Strong))
            .unwrap();
        s.update_variables().unwrap();
        assert!(s.value(x).abs() < 1e-3);
    }

    #[test]
    fn conflicting_required_constraints_are_unsatisfiable() {
        let mut s = Solver::new();
        let x = s.new_variable("x");
        s.add_constraint(Constraint::eq(x, 1.0, Strength::Required))
            .unwrap();
        s.add_constraint(Constraint::eq(x, 2.0, Strength::Required))
            .unwrap();
        assert!(matches!(
            s.update_variables(),
            Err(Error::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn edit_variable_bookkeeping_is_checked() {
        let mut s = Solver::new();
        let x = s.new_variable("x");
        assert_eq!(
            s.add_edit_variable(x, Strength::Required),
            Err(Error::RequiredEditStrength)
        );
        s.add_edit_variable(x, Strength::Strong).unwrap();
        assert!(s.add_edit_variable(x, Strength::Strong).is_err());
        s.remove_edit_variable(x).unwrap();
        assert!(s.suggest_value(x, 1.0).is_err());
    }

    #[test]
    fn removed_constraints_no_longer_apply() {
        let mut s = Solver::new();
        let x = s.new_variable("x");
        let pin = s
            .add_constraint(Constraint::eq(x, 3.0, Strength::Required))
            .unwrap();
        s.update_variables().unwrap();
        assert!(close(s.value(x), 3.0));

        s.remove_constraint(pin).unwrap();
        s.update_variables().unwrap();
        assert!(close(s.value(x), 0.0));
        assert!(s.remove_constraint(pin).is_err());
    }
}
