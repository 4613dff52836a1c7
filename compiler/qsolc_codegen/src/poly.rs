// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Quadratic polynomials over binary variables. Terms are kept in ordered maps so
//! iteration, serialization, and energy evaluation are deterministic. Products reduce
//! `x * x` to `x` (variables are binary) and fail once a term would exceed degree two.


use qsolc_gir::gir::VarId;
use std::collections::BTreeMap;

/// Coefficients smaller than this are dropped when terms cancel.
const COEF_EPSILON: f64 = 1e-12;

/// A polynomial of degree at most two over binary variables, plus a constant offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Poly {
    /// The constant term.
    pub offset: f64,
    /// Linear coefficients.
    pub linear: BTreeMap<VarId, f64>,
    /// Quadratic coefficients, keyed by canonically ordered pairs (`u < v`).
    pub quadratic: BTreeMap<(VarId, VarId), f64>,
}

/// The sign that a polynomial multiplication overflowed degree two.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DegreeOverflow;

impl Poly {
    /// The zero polynomial.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant polynomial.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self {
            offset: value,
            ..Self::default()
        }
    }

    /// The polynomial `x` for a single binary variable.
    #[must_use]
    pub fn var(id: VarId) -> Self {
        let mut linear = BTreeMap::new();
        linear.insert(id, 1.0);
        Self {
            offset: 0.0,
            linear,
            quadratic: BTreeMap::new(),
        }
    }

    /// Whether the polynomial has no variable terms.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.linear.is_empty() && self.quadratic.is_empty()
    }

    /// Whether the polynomial has no quadratic terms.
    #[must_use]
    pub fn is_linear(&self) -> bool {
        self.quadratic.is_empty()
    }

    /// If the polynomial is exactly one variable with coefficient one and no offset,
    /// that variable.
    #[must_use]
    pub fn as_var(&self) -> Option<VarId> {
        if self.offset == 0.0 && self.quadratic.is_empty() && self.linear.len() == 1 {
            let (&id, &coef) = self.linear.iter().next()?;
            if (coef - 1.0).abs() < COEF_EPSILON {
                return Some(id);
            }
        }
        None
    }

    pub fn add_assign(&mut self, other: &Poly) {
        self.offset += other.offset;
        for (&id, &coef) in &other.linear {
            add_term(&mut self.linear, id, coef);
        }
        for (&pair, &coef) in &other.quadratic {
            add_term(&mut self.quadratic, pair, coef);
        }
    }

    #[must_use]
    pub fn add(mut self, other: &Poly) -> Poly {
        self.add_assign(other);
        self
    }

    #[must_use]
    pub fn sub(self, other: &Poly) -> Poly {
        self.add(&other.clone().scale(-1.0))
    }

    #[must_use]
    pub fn scale(mut self, factor: f64) -> Poly {
        self.offset *= factor;
        for coef in self.linear.values_mut() {
            *coef *= factor;
        }
        for coef in self.quadratic.values_mut() {
            *coef *= factor;
        }
        self.prune();
        self
    }

    /// Multiplies two polynomials, reducing `x * x` to `x`.
    ///
    /// # Errors
    /// Fails if any resulting term would have degree greater than two.
    pub fn mul(&self, other: &Poly) -> Result<Poly, DegreeOverflow> {
        if !self.is_linear() && !other.is_constant() {
            return Err(DegreeOverflow);
        }
        if !other.is_linear() && !self.is_constant() {
            return Err(DegreeOverflow);
        }

        let mut out = Poly::constant(self.offset * other.offset);

        for (&id, &coef) in &other.linear {
            add_term(&mut out.linear, id, self.offset * coef);
        }
        for (&pair, &coef) in &other.quadratic {
            add_term(&mut out.quadratic, pair, self.offset * coef);
        }
        for (&id, &coef) in &self.linear {
            add_term(&mut out.linear, id, coef * other.offset);
        }
        for (&pair, &coef) in &self.quadratic {
            add_term(&mut out.quadratic, pair, coef * other.offset);
        }

        for (&a, &ca) in &self.linear {
            for (&b, &cb) in &other.linear {
                let coef = ca * cb;
                if a == b {
                    // x * x = x for binary variables.
                    add_term(&mut out.linear, a, coef);
                } else {
                    add_term(&mut out.quadratic, pair(a, b), coef);
                }
            }
        }

        out.prune();
        Ok(out)
    }

    /// Squares the polynomial, reducing `x * x` to `x`.
    ///
    /// Beyond squared linear polynomials, one shape stays quadratic: a single
    /// quadratic term plus an offset, since `(c*xy + d)^2 = (c^2 + 2cd)*xy + d^2`
    /// over binaries. Penalty conversion relies on this for product constraints like
    /// `x * y = 0`.
    ///
    /// # Errors
    /// Fails if any resulting term would have degree greater than two.
    pub fn square(&self) -> Result<Poly, DegreeOverflow> {
        if self.is_linear() {
            return self.mul(self);
        }
        if self.linear.is_empty() && self.quadratic.len() == 1 {
            let (&pair, &coef) = self
                .quadratic
                .iter()
                .next()
                .expect("quadratic term should exist");
            let mut out = Poly::constant(self.offset * self.offset);
            add_term(
                &mut out.quadratic,
                pair,
                coef * coef + 2.0 * coef * self.offset,
            );
            out.prune();
            return Ok(out);
        }
        Err(DegreeOverflow)
    }

    /// The sum of absolute coefficient magnitudes, used to size penalty weights.
    #[must_use]
    pub fn abs_sum(&self) -> f64 {
        self.linear.values().map(|c| c.abs()).sum::<f64>()
            + self.quadratic.values().map(|c| c.abs()).sum::<f64>()
            + self.offset.abs()
    }

    /// The smallest value the polynomial can take over independent binary assignments.
    /// A lower bound only: quadratic terms are bounded term-by-term.
    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        self.offset
            + self.linear.values().map(|c| c.min(0.0)).sum::<f64>()
            + self.quadratic.values().map(|c| c.min(0.0)).sum::<f64>()
    }

    /// Evaluates the polynomial over a sample, where `sample(id)` is 0 or 1.
    #[must_use]
    pub fn evaluate(&self, sample: impl Fn(VarId) -> bool) -> f64 {
        let mut total = self.offset;
        for (&id, &coef) in &self.linear {
            if sample(id) {
                total += coef;
            }
        }
        for (&(a, b), &coef) in &self.quadratic {
            if sample(a) && sample(b) {
                total += coef;
            }
        }
        total
    }

    /// Variables appearing in the polynomial, in order.
    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        let mut seen = std::collections::BTreeSet::new();
        for &id in self.linear.keys() {
            seen.insert(id);
        }
        for &(a, b) in self.quadratic.keys() {
            seen.insert(a);
            seen.insert(b);
        }
        seen.into_iter()
    }

    fn prune(&mut self) {
        self.linear.retain(|_, coef| coef.abs() > COEF_EPSILON);
        self.quadratic.retain(|_, coef| coef.abs() > COEF_EPSILON);
    }
}

/// The canonical ordering of a quadratic pair.
fn pair(a: VarId, b: VarId) -> (VarId, VarId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn add_term<K: Ord + Copy>(terms: &mut BTreeMap<K, f64>, key: K, coef: f64) {
    let entry = terms.entry(key).or_insert(0.0);
    *entry += coef;
    if entry.abs() <= COEF_EPSILON {
        terms.remove(&key);
    }
}
