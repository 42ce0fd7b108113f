// Core zkSNARK logic: prove knowledge of a MiMC preimage with Groth16 over BN254.
// Shared by the CLI, the integration tests and the generated on-chain verifier.

// Includes:
// - `r1cs`, `mimc`, `circuit`, `witness`: constraint system, hash gadget, compiler, assigner
// - `setup`, `prover`, `verify`: the Groth16 pipeline
// - `codec`, `export`, `solidity`: artifact bytes, EVM calldata/JSON, verifier contract
// - `prove_preimage` / `verify_preimage`: the one-call paths for the fixed BN254 circuit

pub mod circuit;
pub mod codec;
pub mod error;
pub mod export;
pub mod keys;
pub mod mimc;
pub mod prover;
mod qap;
pub mod r1cs;
pub mod setup;
pub mod solidity;
pub mod verify;
pub mod witness;

use ark_bn254::Fr;
use rand::{CryptoRng, RngCore};

pub use circuit::{compile, Circuit, CompiledCircuit, HashPreimageCircuit, PublicLayout};
pub use codec::Artifact;
pub use error::{CodecError, Error, Result, VerificationError};
pub use export::{calldata, ProofCalldata};
pub use keys::{prepare_verifying_key, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
pub use mimc::{mimc_hash, MimcParams};
pub use prover::prove;
pub use setup::setup;
pub use solidity::solidity_verifier;
pub use verify::{verify, verify_prepared};
pub use witness::{assign, PublicWitness, Witness};

/// Compile the preimage circuit and run the trusted setup for it.
pub fn setup_preimage_circuit<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<(CompiledCircuit, ProvingKey, VerifyingKey)> {
    let compiled = compile(&HashPreimageCircuit::default())?;
    let (pk, vk) = setup(&compiled.r1cs, rng)?;
    Ok((compiled, pk, vk))
}

/// Prove knowledge of `preimage` with `MiMC(preimage) = hash`.
///
/// Fails with `ConstraintViolation` when the pair does not match, and with
/// `CircuitMismatch` when `pk` belongs to another circuit.
pub fn prove_preimage<R: RngCore + CryptoRng>(
    pk: &ProvingKey,
    preimage: Fr,
    hash: Fr,
    rng: &mut R,
) -> Result<(Proof, PublicWitness)> {
    let compiled = compile(&HashPreimageCircuit::default())?;
    pk.vk.check_circuit(&compiled.r1cs)?;
    let witness = compiled.assign(&[preimage], &[hash])?;
    let proof = prove(pk, &witness, rng)?;
    Ok((proof, witness.public_projection()))
}

/// Check a proof that the prover knows a preimage of `hash`.
pub fn verify_preimage(vk: &VerifyingKey, hash: Fr, proof: &Proof) -> Result<bool> {
    verify(vk, &PublicWitness::new(vec![hash]), proof)
}

/// Seeded RNG for unit tests; setup and proving need a `CryptoRng`.
#[cfg(test)]
pub(crate) fn test_rng() -> ark_std::rand::rngs::StdRng {
    use ark_std::rand::SeedableRng;
    ark_std::rand::rngs::StdRng::seed_from_u64(0x5eed)
}
