// Witness assignment: evaluates every internal variable from the declared
// inputs, then checks the full assignment against the constraint system.

use std::fmt;

use ark_bn254::Fr;
use ark_ff::One;
use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::r1cs::{CircuitShape, R1CS};

/// Full assignment `[1, public..., secret..., internal...]`.
///
/// Contains the secret preimage; the values are wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Witness {
    shape: CircuitShape,
    values: Vec<Fr>,
}

impl Witness {
    pub(crate) fn from_parts(shape: CircuitShape, values: Vec<Fr>) -> Self {
        Self { shape, values }
    }

    pub fn shape(&self) -> CircuitShape {
        self.shape
    }

    pub fn values(&self) -> &[Fr] {
        &self.values
    }

    /// The values the verifier receives, without the leading constant.
    pub fn public_projection(&self) -> PublicWitness {
        PublicWitness(self.values[1..self.shape.num_public].to_vec())
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("shape", &self.shape)
            .field("values", &format_args!("[{} redacted]", self.values.len()))
            .finish()
    }
}

impl Drop for Witness {
    fn drop(&mut self) {
        self.values.zeroize();
    }
}

/// Public inputs in layout order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicWitness(Vec<Fr>);

impl PublicWitness {
    pub fn new(inputs: Vec<Fr>) -> Self {
        Self(inputs)
    }

    pub fn inputs(&self) -> &[Fr] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build a witness for `r1cs` from its declared inputs.
///
/// Inputs are given in declaration order within each role. Fails with
/// `ConstraintViolation` when the inputs do not satisfy the circuit.
#[tracing::instrument(skip_all)]
pub fn assign(r1cs: &R1CS, secret_inputs: &[Fr], public_inputs: &[Fr]) -> Result<Witness> {
    let shape = r1cs.shape();
    if public_inputs.len() != shape.num_public_inputs() {
        return Err(Error::mismatch(
            format!("{} public inputs", shape.num_public_inputs()),
            public_inputs.len(),
        ));
    }
    if secret_inputs.len() != shape.num_secret {
        return Err(Error::mismatch(
            format!("{} secret inputs", shape.num_secret),
            secret_inputs.len(),
        ));
    }

    let mut values = Vec::with_capacity(shape.num_variables());
    values.push(Fr::one());
    values.extend_from_slice(public_inputs);
    values.extend_from_slice(secret_inputs);
    r1cs.solve(&mut values);

    let witness = Witness { shape, values };
    r1cs.check(&witness.values)?;
    tracing::debug!(variables = witness.values.len(), "witness satisfies all constraints");
    Ok(witness)
}
