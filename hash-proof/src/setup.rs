// Circuit-specific Groth16 trusted setup.
//
// The toxic waste (alpha, beta, gamma, delta, tau) and every value derived
// from it exist only inside `setup` and are wiped when it returns.

use ark_bn254::{Fr, G1Projective, G2Projective};
use ark_ec::{CurveGroup, Group};
use ark_ff::{Field, UniformRand};
use ark_poly::EvaluationDomain;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};
use crate::keys::{ProvingKey, VerifyingKey};
use crate::qap;
use crate::r1cs::R1CS;

#[derive(Zeroize, ZeroizeOnDrop)]
struct ToxicWaste {
    alpha: Fr,
    beta: Fr,
    gamma: Fr,
    delta: Fr,
    tau: Fr,
}

impl ToxicWaste {
    fn sample<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            alpha: Fr::rand(rng),
            beta: Fr::rand(rng),
            gamma: Fr::rand(rng),
            delta: Fr::rand(rng),
            tau: Fr::rand(rng),
        }
    }
}

/// Sample a structured reference string for `r1cs`.
///
/// Deterministic given `rng`. Fails only when the system is degenerate or the
/// sampled values hit a zero denominator.
#[tracing::instrument(skip_all, fields(constraints = r1cs.num_constraints()))]
pub fn setup<R: RngCore + CryptoRng>(
    r1cs: &R1CS,
    rng: &mut R,
) -> Result<(ProvingKey, VerifyingKey)> {
    let shape = r1cs.shape();
    if shape.num_constraints == 0 {
        return Err(Error::Setup("constraint system is empty".into()));
    }
    let domain = qap::domain_for(&shape)?;
    tracing::debug!(domain_size = domain.size(), "evaluation domain selected");

    let toxic = ToxicWaste::sample(rng);
    let keys = derive_keys(r1cs, &domain, &toxic);
    drop(toxic);

    if keys.is_ok() {
        tracing::info!(variables = shape.num_variables(), "trusted setup complete");
    }
    keys
}

fn derive_keys(
    r1cs: &R1CS,
    domain: &qap::Domain,
    toxic: &ToxicWaste,
) -> Result<(ProvingKey, VerifyingKey)> {
    let shape = r1cs.shape();
    let gamma_inv = Zeroizing::new(
        toxic
            .gamma
            .inverse()
            .ok_or_else(|| Error::Setup("gamma is zero".into()))?,
    );
    let delta_inv = Zeroizing::new(
        toxic
            .delta
            .inverse()
            .ok_or_else(|| Error::Setup("delta is zero".into()))?,
    );

    let qap = qap::evaluate_at(r1cs.matrices(), &shape, domain, toxic.tau)?;

    let abc: Zeroizing<Vec<Fr>> = Zeroizing::new(
        (0..shape.num_variables())
            .into_par_iter()
            .map(|i| toxic.beta * qap.a[i] + toxic.alpha * qap.b[i] + qap.c[i])
            .collect(),
    );
    let (public_abc, private_abc) = abc.split_at(shape.num_public);
    let gamma_abc: Zeroizing<Vec<Fr>> =
        Zeroizing::new(public_abc.iter().map(|v| *v * *gamma_inv).collect());
    let l: Zeroizing<Vec<Fr>> =
        Zeroizing::new(private_abc.iter().map(|v| *v * *delta_inv).collect());

    // tau^i * Z(tau) / delta
    let mut h: Zeroizing<Vec<Fr>> = Zeroizing::new(Vec::with_capacity(domain.size() - 1));
    let mut power = *qap.zt * *delta_inv;
    for _ in 0..domain.size() - 1 {
        h.push(power);
        power *= toxic.tau;
    }
    power.zeroize();

    let g1 = G1Projective::generator();
    let g2 = G2Projective::generator();

    let vk = VerifyingKey {
        shape,
        alpha_g1: (g1 * toxic.alpha).into_affine(),
        beta_g2: (g2 * toxic.beta).into_affine(),
        gamma_g2: (g2 * toxic.gamma).into_affine(),
        delta_g2: (g2 * toxic.delta).into_affine(),
        gamma_abc_g1: batch_mul(g1, &gamma_abc),
    };

    let pk = ProvingKey {
        beta_g1: (g1 * toxic.beta).into_affine(),
        delta_g1: (g1 * toxic.delta).into_affine(),
        a_query: batch_mul(g1, &qap.a),
        b_g1_query: batch_mul(g1, &qap.b),
        b_g2_query: batch_mul(g2, &qap.b),
        h_query: batch_mul(g1, &h),
        l_query: batch_mul(g1, &l),
        matrices: r1cs.matrices().clone(),
        vk: vk.clone(),
    };

    Ok((pk, vk))
}

/// `[s * base for s in scalars]`, normalized to affine in one batch.
fn batch_mul<G>(base: G, scalars: &[Fr]) -> Vec<G::Affine>
where
    G: CurveGroup<ScalarField = Fr>,
{
    let points: Vec<G> = scalars.par_iter().map(|s| base * s).collect();
    G::normalize_batch(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{compile, HashPreimageCircuit};
    use crate::mimc::MimcParams;
    use crate::test_rng;

    #[test]
    fn key_sizes_follow_circuit_shape() {
        let params = MimcParams::from_seed(b"seed", 4).unwrap();
        let compiled = compile(&HashPreimageCircuit::new(params)).unwrap();
        let shape = compiled.r1cs.shape();

        let (pk, vk) = setup(&compiled.r1cs, &mut test_rng()).unwrap();
        let domain = qap::domain_for(&shape).unwrap();

        assert_eq!(vk.shape, shape);
        assert_eq!(vk.gamma_abc_g1.len(), shape.num_public);
        assert_eq!(vk.num_public_inputs(), 1);
        assert_eq!(pk.a_query.len(), shape.num_variables());
        assert_eq!(pk.b_g2_query.len(), shape.num_variables());
        assert_eq!(pk.l_query.len(), shape.num_variables() - shape.num_public);
        assert_eq!(pk.h_query.len(), domain.size() - 1);
        assert_eq!(pk.vk, vk);
    }

    #[test]
    fn setup_is_deterministic_given_rng() {
        let params = MimcParams::from_seed(b"seed", 2).unwrap();
        let compiled = compile(&HashPreimageCircuit::new(params)).unwrap();

        let (_, vk1) = setup(&compiled.r1cs, &mut test_rng()).unwrap();
        let (_, vk2) = setup(&compiled.r1cs, &mut test_rng()).unwrap();
        assert_eq!(vk1, vk2);
    }

    #[test]
    fn empty_system_is_rejected() {
        let r1cs = crate::r1cs::ConstraintSystemBuilder::new().finalize().unwrap();
        assert!(matches!(setup(&r1cs, &mut test_rng()), Err(Error::Setup(_))));
    }
}
