// MiMC over the BN254 scalar field, natively and as an R1CS gadget.
//
// Round function `m <- (m + k + c_i)^5`, 110 rounds, output `m + k`; hashing
// chains blocks Miyaguchi-Preneel style: `h <- h + E_h(x) + x` from `h = 0`.
// Round constants come from iterating legacy Keccak-256 over the seed.

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_ff::{Field, PrimeField, Zero};
use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};
use crate::r1cs::{ConstraintSystemBuilder, LinearCombination};

/// Number of rounds for a ~254-bit field with exponent 5.
pub const MIMC_ROUNDS: usize = 110;

/// Domain separator the round constants are derived from.
pub const MIMC_SEED: &[u8] = b"seed";

/// Round-constant table for one MiMC instantiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MimcParams {
    round_constants: Vec<Fr>,
}

impl MimcParams {
    pub fn new(round_constants: Vec<Fr>) -> Result<Self> {
        if round_constants.is_empty() {
            return Err(Error::Gadget("MiMC round-constant table is empty".into()));
        }
        Ok(Self { round_constants })
    }

    /// Derive `rounds` constants from `seed`.
    pub fn from_seed(seed: &[u8], rounds: usize) -> Result<Self> {
        Self::new(derive_round_constants(seed, rounds))
    }

    /// The BN254 instantiation used by the preimage circuit.
    pub fn bn254() -> &'static MimcParams {
        static PARAMS: OnceLock<MimcParams> = OnceLock::new();
        PARAMS.get_or_init(|| MimcParams {
            round_constants: derive_round_constants(MIMC_SEED, MIMC_ROUNDS),
        })
    }

    pub fn rounds(&self) -> usize {
        self.round_constants.len()
    }

    pub fn round_constants(&self) -> &[Fr] {
        &self.round_constants
    }

    /// Keyed permutation `E_key(message)`.
    pub fn encrypt(&self, message: Fr, key: Fr) -> Fr {
        let mut m = message;
        for c in &self.round_constants {
            let t = m + key + c;
            m = t.square().square() * t;
        }
        m + key
    }

    pub fn hasher(&self) -> MimcHasher<'_> {
        MimcHasher::new(self)
    }

    pub fn hash(&self, inputs: &[Fr]) -> Fr {
        let mut hasher = self.hasher();
        for x in inputs {
            hasher.update(*x);
        }
        hasher.finalize()
    }
}

fn derive_round_constants(seed: &[u8], rounds: usize) -> Vec<Fr> {
    let mut digest = Keccak256::digest(seed);
    (0..rounds)
        .map(|_| {
            digest = Keccak256::digest(digest);
            Fr::from_be_bytes_mod_order(&digest)
        })
        .collect()
}

/// MiMC hash of a single field element with the BN254 parameters.
pub fn mimc_hash(preimage: Fr) -> Fr {
    MimcParams::bn254().hash(&[preimage])
}

/// Streaming Miyaguchi-Preneel hasher over field elements.
#[derive(Clone, Debug)]
pub struct MimcHasher<'a> {
    params: &'a MimcParams,
    state: Fr,
}

impl<'a> MimcHasher<'a> {
    pub fn new(params: &'a MimcParams) -> Self {
        Self {
            params,
            state: Fr::zero(),
        }
    }

    pub fn update(&mut self, block: Fr) {
        let encrypted = self.params.encrypt(block, self.state);
        self.state += encrypted + block;
    }

    pub fn finalize(&self) -> Fr {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = Fr::zero();
    }
}

/// In-circuit MiMC. Each round costs three multiplication constraints
/// (`t^2`, `t^4`, `t^5`); additions are folded into linear combinations.
#[derive(Clone, Copy, Debug)]
pub struct MimcGadget<'a> {
    params: &'a MimcParams,
}

impl<'a> MimcGadget<'a> {
    pub fn new(params: &'a MimcParams) -> Self {
        Self { params }
    }

    pub fn encrypt(
        &self,
        cs: &mut ConstraintSystemBuilder,
        message: LinearCombination,
        key: &LinearCombination,
    ) -> Result<LinearCombination> {
        let mut state = message;
        for c in self.params.round_constants() {
            let t = state + key.clone() + LinearCombination::constant(*c);
            let t2 = cs.mul(&t, &t)?;
            let t4 = cs.mul(t2, t2)?;
            state = cs.mul(t4, t)?.into();
        }
        Ok(state + key.clone())
    }

    pub fn hash(
        &self,
        cs: &mut ConstraintSystemBuilder,
        inputs: &[LinearCombination],
    ) -> Result<LinearCombination> {
        if inputs.is_empty() {
            return Err(Error::Gadget("MiMC gadget needs at least one input".into()));
        }
        let mut h = LinearCombination::zero();
        for x in inputs {
            let encrypted = self.encrypt(cs, x.clone(), &h)?;
            h = h + encrypted + x.clone();
        }
        Ok(h)
    }
}
