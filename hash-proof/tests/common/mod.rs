// One trusted setup of the BN254 preimage circuit, shared by every test in a binary.

use std::str::FromStr;
use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_std::rand::rngs::StdRng;
use ark_std::rand::SeedableRng;
use hash_proof::{setup_preimage_circuit, CompiledCircuit, ProvingKey, VerifyingKey};

pub const PREIMAGE: u64 = 35;

/// MiMC(35) for the 110-round, keccak("seed") instantiation.
pub const PREIMAGE_HASH: &str =
    "2474112249751028531650252582366798049474486386634137916759752348728204118534";

pub struct Fixture {
    pub compiled: CompiledCircuit,
    pub pk: ProvingKey,
    pub vk: VerifyingKey,
}

/// Deterministic RNG; setup and proving need a `CryptoRng`.
pub fn test_rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

pub fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let (compiled, pk, vk) = setup_preimage_circuit(&mut test_rng()).unwrap();
        Fixture { compiled, pk, vk }
    })
}

pub fn preimage() -> Fr {
    Fr::from(PREIMAGE)
}

pub fn preimage_hash() -> Fr {
    Fr::from_str(PREIMAGE_HASH).unwrap()
}
