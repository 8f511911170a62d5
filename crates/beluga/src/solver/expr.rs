use std::ops::{Add, Mul, Neg, Sub};

/// Handle to a solver variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub(crate) usize);

impl Variable {
    pub fn index(self) -> usize {
        self.0
    }
}

/// `sum(coefficient * variable) + constant`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub terms: Vec<(Variable, f64)>,
    pub constant: f64,
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(variable: Variable, coefficient: f64) -> Self {
        Self {
            terms: vec![(variable, coefficient)],
            constant: 0.0,
        }
    }

    /// Evaluates the expression against a value lookup.
    pub fn evaluate(&self, value: impl Fn(Variable) -> f64) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, (v, c)| acc + c * value(*v))
    }

    /// Merges repeated variables and drops zero coefficients, keeping first-seen order.
    pub(crate) fn normalized(&self) -> Self {
        let mut terms: Vec<(Variable, f64)> = Vec::with_capacity(self.terms.len());
        for (v, c) in &self.terms {
            match terms.iter_mut().find(|(tv, _)| tv == v) {
                Some((_, tc)) => *tc += c,
                None => terms.push((*v, *c)),
            }
        }
        terms.retain(|(_, c)| *c != 0.0);
        Self {
            terms,
            constant: self.constant,
        }
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Expression::term(variable, 1.0)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::constant(value)
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        self * -1.0
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(mut self, rhs: f64) -> Expression {
        for (_, c) in self.terms.iter_mut() {
            *c *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        Expression::term(self, rhs)
    }
}

impl<T: Into<Expression>> Add<T> for Expression {
    type Output = Expression;

    fn add(mut self, rhs: T) -> Expression {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<T: Into<Expression>> Sub<T> for Expression {
    type Output = Expression;

    fn sub(self, rhs: T) -> Expression {
        self + (-rhs.into())
    }
}

impl<T: Into<Expression>> Add<T> for Variable {
    type Output = Expression;

    fn add(self, rhs: T) -> Expression {
        Expression::from(self) + rhs
    }
}

impl<T: Into<Expression>> Sub<T> for Variable {
    type Output = Expression;

    fn sub(self, rhs: T) -> Expression {
        Expression::from(self) - rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_build_normalized_terms() {
        let a = Variable(0);
        let b = Variable(1);
        let e = (a + b * 0.5 - a * 2.0 + 3.0).normalized();
        assert_eq!(e.terms, vec![(a, -1.0), (b, 0.5)]);
        assert_eq!(e.constant, 3.0);
        assert_eq!(e.evaluate(|v| if v == a { 2.0 } else { 4.0 }), 3.0);
    }
}
