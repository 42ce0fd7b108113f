// Rank-1 constraint system: a single-owner builder that accumulates
// `A(z) * B(z) = C(z)` rows and freezes into an immutable `R1CS`.
//
// Variables are allocated per role and only receive their global index at
// finalization, using the layout `[1, public..., secret..., internal...]`.

use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};

use ark_bn254::Fr;
use ark_ff::{One, Zero};

use crate::error::{Error, Result};

/// Role of a variable in the circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariableKind {
    /// Known to the verifier. Index 0 is the constant `1`.
    Public,
    /// Known only to the prover.
    Secret,
    /// Auxiliary value introduced by a gadget.
    Internal,
}

/// Handle to a variable of a `ConstraintSystemBuilder`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    kind: VariableKind,
    index: usize,
}

impl Variable {
    /// The constant `1`, present in every constraint system.
    pub const ONE: Variable = Variable {
        kind: VariableKind::Public,
        index: 0,
    };

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// Position among the variables of the same kind.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// `sum(coeff * var)`; duplicate variables are merged, zero terms dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearCombination {
    terms: BTreeMap<Variable, Fr>,
}

impl LinearCombination {
    pub fn zero() -> Self {
        Self::default()
    }

    /// The constant `c`, expressed as a coefficient on `Variable::ONE`.
    pub fn constant(c: Fr) -> Self {
        Self::term(Variable::ONE, c)
    }

    pub fn term(var: Variable, coeff: Fr) -> Self {
        let mut lc = Self::zero();
        lc.add_term(var, coeff);
        lc
    }

    pub fn add_term(&mut self, var: Variable, coeff: Fr) {
        let entry = self.terms.entry(var).or_insert_with(Fr::zero);
        *entry += coeff;
        if entry.is_zero() {
            self.terms.remove(&var);
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Fr)> {
        self.terms.iter()
    }
}

impl From<Variable> for LinearCombination {
    fn from(var: Variable) -> Self {
        Self::term(var, Fr::one())
    }
}

impl From<&LinearCombination> for LinearCombination {
    fn from(lc: &LinearCombination) -> Self {
        lc.clone()
    }
}

impl Add for LinearCombination {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        for (var, coeff) in other.terms {
            self.add_term(var, coeff);
        }
        self
    }
}

impl Add<Variable> for LinearCombination {
    type Output = Self;

    fn add(mut self, var: Variable) -> Self {
        self.add_term(var, Fr::one());
        self
    }
}

impl Sub for LinearCombination {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl Neg for LinearCombination {
    type Output = Self;

    fn neg(mut self) -> Self {
        for coeff in self.terms.values_mut() {
            *coeff = -*coeff;
        }
        self
    }
}

impl Mul<Fr> for LinearCombination {
    type Output = Self;

    fn mul(mut self, scalar: Fr) -> Self {
        if scalar.is_zero() {
            return Self::zero();
        }
        for coeff in self.terms.values_mut() {
            *coeff *= scalar;
        }
        self
    }
}

/// One row of the system: `a * b = c`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub a: LinearCombination,
    pub b: LinearCombination,
    pub c: LinearCombination,
}

/// How the assigner computes an internal variable: `a(z) * b(z)`.
#[derive(Clone, Debug)]
struct Derivation {
    a: LinearCombination,
    b: LinearCombination,
}

/// Accumulates variables and constraints while a circuit is being built.
#[derive(Debug)]
pub struct ConstraintSystemBuilder {
    num_public: usize,
    num_secret: usize,
    internals: Vec<Option<Derivation>>,
    constraints: Vec<Constraint>,
    frozen: bool,
}

impl Default for ConstraintSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSystemBuilder {
    pub fn new() -> Self {
        Self {
            num_public: 1,
            num_secret: 0,
            internals: Vec::new(),
            constraints: Vec::new(),
            frozen: false,
        }
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::FrozenCircuit);
        }
        Ok(())
    }

    /// Allocate a fresh variable of the given role.
    ///
    /// Internal variables allocated this way carry no derivation and will make
    /// `finalize` fail; gadgets introduce internals through [`Self::mul`].
    pub fn new_variable(&mut self, kind: VariableKind) -> Result<Variable> {
        self.ensure_mutable()?;
        let index = match kind {
            VariableKind::Public => {
                self.num_public += 1;
                self.num_public - 1
            }
            VariableKind::Secret => {
                self.num_secret += 1;
                self.num_secret - 1
            }
            VariableKind::Internal => {
                self.internals.push(None);
                self.internals.len() - 1
            }
        };
        Ok(Variable { kind, index })
    }

    pub fn add_constraint(
        &mut self,
        a: impl Into<LinearCombination>,
        b: impl Into<LinearCombination>,
        c: impl Into<LinearCombination>,
    ) -> Result<()> {
        self.ensure_mutable()?;
        self.constraints.push(Constraint {
            a: a.into(),
            b: b.into(),
            c: c.into(),
        });
        Ok(())
    }

    /// Enforce `x = y` as `(x - y) * 1 = 0`.
    pub fn assert_equal(
        &mut self,
        x: impl Into<LinearCombination>,
        y: impl Into<LinearCombination>,
    ) -> Result<()> {
        let diff = x.into() - y.into();
        self.add_constraint(diff, Variable::ONE, LinearCombination::zero())
    }

    /// Introduce `v = a * b` as a new internal variable and constrain it.
    pub fn mul(
        &mut self,
        a: impl Into<LinearCombination>,
        b: impl Into<LinearCombination>,
    ) -> Result<Variable> {
        self.ensure_mutable()?;
        let (a, b) = (a.into(), b.into());
        let out = Variable {
            kind: VariableKind::Internal,
            index: self.internals.len(),
        };
        self.internals.push(Some(Derivation {
            a: a.clone(),
            b: b.clone(),
        }));
        self.add_constraint(a, b, out)?;
        Ok(out)
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn global_index(&self, var: &Variable) -> Result<usize> {
        let (bound, offset) = match var.kind {
            VariableKind::Public => (self.num_public, 0),
            VariableKind::Secret => (self.num_secret, self.num_public),
            VariableKind::Internal => (self.internals.len(), self.num_public + self.num_secret),
        };
        if var.index >= bound {
            return Err(Error::Gadget(format!(
                "{:?} variable {} was not allocated by this builder",
                var.kind, var.index
            )));
        }
        Ok(offset + var.index)
    }

    fn lower(&self, lc: &LinearCombination) -> Result<SparseRow> {
        lc.iter()
            .map(|(var, coeff)| Ok((*coeff, self.global_index(var)?)))
            .collect()
    }

    /// Freeze the builder and produce the immutable constraint system.
    pub fn finalize(&mut self) -> Result<R1CS> {
        self.ensure_mutable()?;

        let mut derivations = Vec::with_capacity(self.internals.len());
        for (i, derivation) in self.internals.iter().enumerate() {
            let derivation = derivation.as_ref().ok_or_else(|| {
                Error::Gadget(format!("internal variable {i} has no derivation"))
            })?;
            let (a, b) = (self.lower(&derivation.a)?, self.lower(&derivation.b)?);
            // values are solved in allocation order
            let solved = self.num_public + self.num_secret + i;
            if a.iter().chain(&b).any(|(_, index)| *index >= solved) {
                return Err(Error::Gadget(format!(
                    "internal variable {i} depends on a later variable"
                )));
            }
            derivations.push((a, b));
        }

        let mut a = Vec::with_capacity(self.constraints.len());
        let mut b = Vec::with_capacity(self.constraints.len());
        let mut c = Vec::with_capacity(self.constraints.len());
        for constraint in &self.constraints {
            a.push(self.lower(&constraint.a)?);
            b.push(self.lower(&constraint.b)?);
            c.push(self.lower(&constraint.c)?);
        }

        self.frozen = true;
        tracing::debug!(
            constraints = a.len(),
            public = self.num_public,
            secret = self.num_secret,
            internal = self.internals.len(),
            "constraint system frozen"
        );

        Ok(R1CS {
            shape: CircuitShape {
                num_constraints: a.len(),
                num_public: self.num_public,
                num_secret: self.num_secret,
                num_internal: self.internals.len(),
            },
            matrices: ConstraintMatrices { a, b, c },
            derivations,
        })
    }
}

/// Sparse row of a constraint matrix: `(coefficient, variable index)`.
pub type SparseRow = Vec<(Fr, usize)>;

/// Size metadata identifying a compiled circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CircuitShape {
    pub num_constraints: usize,
    /// Public variables, including the constant `1`.
    pub num_public: usize,
    pub num_secret: usize,
    pub num_internal: usize,
}

impl CircuitShape {
    pub fn num_variables(&self) -> usize {
        self.num_public + self.num_secret + self.num_internal
    }

    /// Number of values the verifier supplies (the constant excluded).
    pub fn num_public_inputs(&self) -> usize {
        self.num_public.saturating_sub(1)
    }
}

/// The `A`, `B`, `C` matrices of a constraint system, one sparse row per constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintMatrices {
    pub a: Vec<SparseRow>,
    pub b: Vec<SparseRow>,
    pub c: Vec<SparseRow>,
}

impl ConstraintMatrices {
    pub fn num_constraints(&self) -> usize {
        self.a.len()
    }

    /// Check a full assignment, reporting the first unsatisfied row.
    pub fn check(&self, assignment: &[Fr]) -> Result<()> {
        for (index, ((a, b), c)) in self.a.iter().zip(&self.b).zip(&self.c).enumerate() {
            let lhs = evaluate_row(a, assignment) * evaluate_row(b, assignment);
            if lhs != evaluate_row(c, assignment) {
                return Err(Error::ConstraintViolation { index });
            }
        }
        Ok(())
    }
}

/// A frozen rank-1 constraint system.
#[derive(Clone, Debug)]
pub struct R1CS {
    shape: CircuitShape,
    matrices: ConstraintMatrices,
    derivations: Vec<(SparseRow, SparseRow)>,
}

impl R1CS {
    pub fn shape(&self) -> CircuitShape {
        self.shape
    }

    pub fn matrices(&self) -> &ConstraintMatrices {
        &self.matrices
    }

    pub fn num_constraints(&self) -> usize {
        self.shape.num_constraints
    }

    pub fn num_variables(&self) -> usize {
        self.shape.num_variables()
    }

    /// Extend `[1, public..., secret...]` with every internal value, in order.
    pub(crate) fn solve(&self, assignment: &mut Vec<Fr>) {
        for (a, b) in &self.derivations {
            let value = evaluate_row(a, assignment) * evaluate_row(b, assignment);
            assignment.push(value);
        }
    }

    /// Check a full assignment against every constraint.
    pub fn check(&self, assignment: &[Fr]) -> Result<()> {
        if assignment.len() != self.num_variables() {
            return Err(Error::mismatch(
                format!("{} variables", self.num_variables()),
                format!("{} variables", assignment.len()),
            ));
        }
        if assignment[0] != Fr::one() {
            return Err(Error::mismatch("variable 0 = 1", "variable 0 != 1"));
        }
        self.matrices.check(assignment)
    }
}

pub(crate) fn evaluate_row(row: &[(Fr, usize)], assignment: &[Fr]) -> Fr {
    row.iter().map(|(coeff, index)| *coeff * assignment[*index]).sum()
}
