// Defines the preimage circuit: one secret input x, one public input y, and
// the constraint MiMC(x) = y. `compile` runs a circuit definition against a
// fresh builder and freezes the result.

use ark_bn254::Fr;

use crate::error::Result;
use crate::mimc::{MimcGadget, MimcParams};
use crate::r1cs::{ConstraintSystemBuilder, R1CS, VariableKind};
use crate::witness::{self, Witness};

/// A circuit definition that lays out its constraints on a builder.
pub trait Circuit {
    fn build(&self, cs: &mut ConstraintSystemBuilder) -> Result<()>;
}

/// "I know x such that MiMC(x) = y."
#[derive(Clone, Debug)]
pub struct HashPreimageCircuit {
    params: MimcParams,
}

impl HashPreimageCircuit {
    pub fn new(params: MimcParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MimcParams {
        &self.params
    }
}

impl Default for HashPreimageCircuit {
    fn default() -> Self {
        Self::new(MimcParams::bn254().clone())
    }
}

impl Circuit for HashPreimageCircuit {
    fn build(&self, cs: &mut ConstraintSystemBuilder) -> Result<()> {
        let preimage = cs.new_variable(VariableKind::Secret)?;
        let hash = cs.new_variable(VariableKind::Public)?;

        let computed = MimcGadget::new(&self.params).hash(cs, &[preimage.into()])?;
        cs.assert_equal(hash, computed)
    }
}

/// Global indices of the public inputs, in the order the verifier supplies them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicLayout {
    indices: Vec<usize>,
}

impl PublicLayout {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Output of `compile`: the frozen system and its public-input layout.
#[derive(Clone, Debug)]
pub struct CompiledCircuit {
    pub r1cs: R1CS,
    pub layout: PublicLayout,
}

impl CompiledCircuit {
    /// See [`witness::assign`].
    pub fn assign(&self, secret_inputs: &[Fr], public_inputs: &[Fr]) -> Result<Witness> {
        witness::assign(&self.r1cs, secret_inputs, public_inputs)
    }
}

#[tracing::instrument(skip_all)]
pub fn compile(circuit: &impl Circuit) -> Result<CompiledCircuit> {
    let mut cs = ConstraintSystemBuilder::new();
    circuit.build(&mut cs)?;
    let r1cs = cs.finalize()?;

    // Public variable 0 is the constant; inputs follow it contiguously.
    let shape = r1cs.shape();
    let layout = PublicLayout {
        indices: (1..shape.num_public).collect(),
    };

    tracing::info!(
        constraints = shape.num_constraints,
        variables = shape.num_variables(),
        public_inputs = layout.len(),
        "circuit compiled"
    );
    Ok(CompiledCircuit { r1cs, layout })
}
