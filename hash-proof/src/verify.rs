// Groth16 verification: one multi-pairing against the prepared key.
// A proof that fails the pairing check yields `Ok(false)`; only malformed
// keys, proofs or input vectors are errors.

use ark_bn254::{Bn254, G1Affine, G1Projective, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};

use crate::error::{Result, VerificationError};
use crate::keys::{prepare_verifying_key, Proof, PreparedVerifyingKey, VerifyingKey};
use crate::witness::PublicWitness;

/// Check `proof` against `public` with a raw verifying key.
pub fn verify(vk: &VerifyingKey, public: &PublicWitness, proof: &Proof) -> Result<bool> {
    verify_prepared(&prepare_verifying_key(vk), public, proof)
}

/// Check `proof` against `public` with a key prepared once for many proofs.
#[tracing::instrument(skip_all, fields(inputs = public.len()))]
pub fn verify_prepared(
    pvk: &PreparedVerifyingKey,
    public: &PublicWitness,
    proof: &Proof,
) -> Result<bool> {
    let vk = &pvk.vk;
    check_key(vk)?;
    if public.len() != vk.num_public_inputs() {
        return Err(VerificationError::PublicInputCount {
            expected: vk.num_public_inputs(),
            found: public.len(),
        }
        .into());
    }
    check_g1("A", &proof.a).map_err(VerificationError::MalformedProof)?;
    check_g2("B", &proof.b).map_err(VerificationError::MalformedProof)?;
    check_g1("C", &proof.c).map_err(VerificationError::MalformedProof)?;

    let acc = vk.gamma_abc_g1[0].into_group()
        + G1Projective::msm_unchecked(&vk.gamma_abc_g1[1..], public.inputs());

    let lhs = Bn254::multi_pairing(
        [proof.a, acc.into_affine(), proof.c],
        [
            proof.b.into(),
            pvk.gamma_g2_neg_pc.clone(),
            pvk.delta_g2_neg_pc.clone(),
        ],
    );
    let valid = lhs == pvk.alpha_g1_beta_g2;
    tracing::debug!(valid, "pairing check done");
    Ok(valid)
}

fn check_key(vk: &VerifyingKey) -> std::result::Result<(), VerificationError> {
    if vk.gamma_abc_g1.is_empty() || vk.gamma_abc_g1.len() != vk.shape.num_public {
        return Err(VerificationError::MalformedKey(format!(
            "gamma_abc_g1 has {} entries but the circuit has {} public variables",
            vk.gamma_abc_g1.len(),
            vk.shape.num_public
        )));
    }
    let mut points = vec![check_g1("alpha_g1", &vk.alpha_g1)];
    for (name, point) in [
        ("beta_g2", &vk.beta_g2),
        ("gamma_g2", &vk.gamma_g2),
        ("delta_g2", &vk.delta_g2),
    ] {
        points.push(check_g2(name, point));
    }
    points.extend(vk.gamma_abc_g1.iter().map(|p| check_g1("gamma_abc_g1", p)));
    points
        .into_iter()
        .collect::<std::result::Result<(), String>>()
        .map_err(VerificationError::MalformedKey)
}

fn check_g1(name: &str, p: &G1Affine) -> std::result::Result<(), String> {
    if p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve() {
        Ok(())
    } else {
        Err(format!("{name} is not a point of G1"))
    }
}

fn check_g2(name: &str, p: &G2Affine) -> std::result::Result<(), String> {
    if p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve() {
        Ok(())
    } else {
        Err(format!("{name} is not a point of G2"))
    }
}
