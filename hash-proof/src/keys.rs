// Groth16 key and proof types for BN254.

use ark_bn254::{Bn254, G1Affine, G2Affine};
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_poly::EvaluationDomain;

use crate::error::VerificationError;
use crate::qap;
use crate::r1cs::{CircuitShape, ConstraintMatrices, R1CS};

/// A Groth16 proof: two G1 points and one G2 point, independent of circuit size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proof {
    pub a: G1Affine,
    pub b: G2Affine,
    pub c: G1Affine,
}

/// Pairing-check elements, bound to the shape of the circuit they came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKey {
    pub shape: CircuitShape,
    pub alpha_g1: G1Affine,
    pub beta_g2: G2Affine,
    pub gamma_g2: G2Affine,
    pub delta_g2: G2Affine,
    /// `(beta*A_i + alpha*B_i + C_i)(tau) / gamma` for each public variable,
    /// starting with the constant.
    pub gamma_abc_g1: Vec<G1Affine>,
}

impl VerifyingKey {
    pub fn num_public_inputs(&self) -> usize {
        self.gamma_abc_g1.len().saturating_sub(1)
    }

    /// Reject a key that was derived from a differently compiled circuit.
    pub fn check_circuit(&self, r1cs: &R1CS) -> Result<(), VerificationError> {
        if self.shape != r1cs.shape() {
            return Err(VerificationError::CircuitMismatch(format!(
                "key expects {:?}, circuit has {:?}",
                self.shape,
                r1cs.shape()
            )));
        }
        Ok(())
    }
}

/// Everything the prover needs: per-variable query points, the quotient
/// basis and the constraint matrices used to compute the quotient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvingKey {
    pub vk: VerifyingKey,
    pub beta_g1: G1Affine,
    pub delta_g1: G1Affine,
    /// `A_i(tau)` for every variable.
    pub a_query: Vec<G1Affine>,
    /// `B_i(tau)` for every variable, in G1.
    pub b_g1_query: Vec<G1Affine>,
    /// `B_i(tau)` for every variable, in G2.
    pub b_g2_query: Vec<G2Affine>,
    /// `tau^i * Z(tau) / delta` for `i < domain_size - 1`.
    pub h_query: Vec<G1Affine>,
    /// `(beta*A_i + alpha*B_i + C_i)(tau) / delta` for every non-public variable.
    pub l_query: Vec<G1Affine>,
    pub matrices: ConstraintMatrices,
}

impl ProvingKey {
    pub fn shape(&self) -> CircuitShape {
        self.vk.shape
    }

    /// Check that every query has the length the circuit shape implies.
    pub(crate) fn layout_error(&self) -> Option<String> {
        let shape = self.shape();
        let n = shape.num_variables();
        let domain_size = match qap::domain_for(&shape) {
            Ok(domain) => domain.size(),
            Err(e) => return Some(e.to_string()),
        };
        let checks = [
            ("a_query", self.a_query.len(), n),
            ("b_g1_query", self.b_g1_query.len(), n),
            ("b_g2_query", self.b_g2_query.len(), n),
            ("h_query", self.h_query.len(), domain_size - 1),
            ("l_query", self.l_query.len(), n - shape.num_public),
            ("gamma_abc_g1", self.vk.gamma_abc_g1.len(), shape.num_public),
            ("constraints", self.matrices.num_constraints(), shape.num_constraints),
        ];
        checks
            .iter()
            .find(|(_, found, expected)| found != expected)
            .map(|(name, found, expected)| {
                format!("{name} has {found} entries, expected {expected}")
            })
    }
}

/// Verifying key with `e(alpha, beta)` and the negated G2 elements precomputed.
#[derive(Clone, Debug)]
pub struct PreparedVerifyingKey {
    pub vk: VerifyingKey,
    pub alpha_g1_beta_g2: PairingOutput<Bn254>,
    pub gamma_g2_neg_pc: <Bn254 as Pairing>::G2Prepared,
    pub delta_g2_neg_pc: <Bn254 as Pairing>::G2Prepared,
}

pub fn prepare_verifying_key(vk: &VerifyingKey) -> PreparedVerifyingKey {
    PreparedVerifyingKey {
        vk: vk.clone(),
        alpha_g1_beta_g2: Bn254::pairing(vk.alpha_g1, vk.beta_g2),
        gamma_g2_neg_pc: (-vk.gamma_g2).into(),
        delta_g2_neg_pc: (-vk.delta_g2).into(),
    }
}

impl From<&VerifyingKey> for PreparedVerifyingKey {
    fn from(vk: &VerifyingKey) -> Self {
        prepare_verifying_key(vk)
    }
}
