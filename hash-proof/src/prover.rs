// Groth16 prover: a single pass of multi-scalar multiplications over the
// proving key, blinded by fresh (r, s) so proofs of one witness are unlinkable.

use ark_bn254::{Fr, G1Projective, G2Projective};
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{One, UniformRand};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::keys::{Proof, ProvingKey};
use crate::qap;
use crate::witness::Witness;

/// Produce a proof that `witness` satisfies the circuit `pk` was derived from.
#[tracing::instrument(skip_all, fields(variables = witness.values().len()))]
pub fn prove<R: RngCore + CryptoRng>(
    pk: &ProvingKey,
    witness: &Witness,
    rng: &mut R,
) -> Result<Proof> {
    let shape = pk.shape();
    if witness.shape() != shape {
        return Err(Error::mismatch(
            format!("{shape:?}"),
            format!("{:?}", witness.shape()),
        ));
    }
    if let Some(problem) = pk.layout_error() {
        return Err(Error::mismatch("consistent proving key", problem));
    }
    let z = witness.values();
    if z[0] != Fr::one() {
        return Err(Error::mismatch("variable 0 = 1", "variable 0 != 1"));
    }
    pk.matrices.check(z)?;

    let domain = qap::domain_for(&shape)?;
    let h = qap::quotient_coefficients(&pk.matrices, &shape, &domain, z)?;
    let private = &z[shape.num_public..];

    let ((a_acc, b_g1_acc), ((b_g2_acc, h_acc), l_acc)) = rayon::join(
        || {
            rayon::join(
                || G1Projective::msm_unchecked(&pk.a_query, z),
                || G1Projective::msm_unchecked(&pk.b_g1_query, z),
            )
        },
        || {
            rayon::join(
                || {
                    rayon::join(
                        || G2Projective::msm_unchecked(&pk.b_g2_query, z),
                        || G1Projective::msm_unchecked(&pk.h_query, &h),
                    )
                },
                || G1Projective::msm_unchecked(&pk.l_query, private),
            )
        },
    );

    let r = Zeroizing::new(Fr::rand(rng));
    let s = Zeroizing::new(Fr::rand(rng));
    let delta_g1 = pk.delta_g1.into_group();

    let a = pk.vk.alpha_g1.into_group() + a_acc + delta_g1 * *r;
    let b_g2 = pk.vk.beta_g2.into_group() + b_g2_acc + pk.vk.delta_g2 * *s;
    let b_g1 = pk.beta_g1.into_group() + b_g1_acc + delta_g1 * *s;
    let c = h_acc + l_acc + a * *s + b_g1 * *r - delta_g1 * (*r * *s);

    tracing::debug!("proof generated");
    Ok(Proof {
        a: a.into_affine(),
        b: b_g2.into_affine(),
        c: c.into_affine(),
    })
}
