// EVM-facing export of proofs and public inputs.
//
// A proof becomes eight big-endian 256-bit words
// [A.x, A.y, B.x.c1, B.x.c0, B.y.c1, B.y.c0, C.x, C.y], the layout the BN254
// pairing precompiles expect. The point at infinity is written as zeros.

use ark_bn254::{Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField, Zero};
use ethabi::{ParamType, Token, Uint};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerificationError};
use crate::keys::Proof;
use crate::witness::PublicWitness;

pub type Word = [u8; 32];

pub const VERIFY_FUNCTION: &str = "verifyProof";

fn to_word<F: PrimeField>(f: &F) -> Word {
    let mut word = [0u8; 32];
    let bytes = f.into_bigint().to_bytes_be();
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    word
}

/// Parse a canonical big-endian element; values >= the modulus are rejected.
fn from_word<F: PrimeField>(word: &Word) -> Option<F> {
    let f = F::from_be_bytes_mod_order(word);
    (to_word(&f) == *word).then_some(f)
}

/// Decimal rendering of a field element, as Solidity and JSON consume it.
pub(crate) fn decimal<F: PrimeField>(f: &F) -> String {
    Uint::from_big_endian(&to_word(f)).to_string()
}

pub fn fr_from_word(word: &Word) -> Option<Fr> {
    from_word(word)
}

fn g1_words(p: &G1Affine) -> [Word; 2] {
    match p.xy() {
        Some((x, y)) => [to_word(x), to_word(y)],
        None => [[0; 32]; 2],
    }
}

fn g2_words(p: &G2Affine) -> [Word; 4] {
    match p.xy() {
        Some((x, y)) => [to_word(&x.c1), to_word(&x.c0), to_word(&y.c1), to_word(&y.c0)],
        None => [[0; 32]; 4],
    }
}

fn fq(word: &Word, what: &str) -> std::result::Result<Fq, VerificationError> {
    from_word(word)
        .ok_or_else(|| VerificationError::MalformedProof(format!("{what} is not a canonical Fq")))
}

fn g1_from_words(
    x: &Word,
    y: &Word,
    what: &str,
) -> std::result::Result<G1Affine, VerificationError> {
    let (x, y) = (fq(x, what)?, fq(y, what)?);
    if x.is_zero() && y.is_zero() {
        return Ok(G1Affine::identity());
    }
    let p = G1Affine::new_unchecked(x, y);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(VerificationError::MalformedProof(format!("{what} is not a point of G1")));
    }
    Ok(p)
}

fn g2_from_words(words: &[Word], what: &str) -> std::result::Result<G2Affine, VerificationError> {
    let x = Fq2::new(fq(&words[1], what)?, fq(&words[0], what)?);
    let y = Fq2::new(fq(&words[3], what)?, fq(&words[2], what)?);
    if x.is_zero() && y.is_zero() {
        return Ok(G2Affine::identity());
    }
    let p = G2Affine::new_unchecked(x, y);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(VerificationError::MalformedProof(format!("{what} is not a point of G2")));
    }
    Ok(p)
}

impl Proof {
    pub fn to_evm_words(&self) -> [Word; 8] {
        let [ax, ay] = g1_words(&self.a);
        let [bx1, bx0, by1, by0] = g2_words(&self.b);
        let [cx, cy] = g1_words(&self.c);
        [ax, ay, bx1, bx0, by1, by0, cx, cy]
    }

    /// Inverse of [`Proof::to_evm_words`], validating every point.
    pub fn from_evm_words(words: &[Word; 8]) -> std::result::Result<Self, VerificationError> {
        Ok(Proof {
            a: g1_from_words(&words[0], &words[1], "A")?,
            b: g2_from_words(&words[2..6], "B")?,
            c: g1_from_words(&words[6], &words[7], "C")?,
        })
    }
}

/// ABI-encoded call `verifyProof(uint256[8], uint256[n])`, selector included.
pub fn calldata(proof: &Proof, public: &PublicWitness) -> Vec<u8> {
    let uint_array = |n| ParamType::FixedArray(Box::new(ParamType::Uint(256)), n);
    let selector =
        ethabi::short_signature(VERIFY_FUNCTION, &[uint_array(8), uint_array(public.len())]);

    let proof_words = proof
        .to_evm_words()
        .iter()
        .map(|w| Token::Uint(Uint::from_big_endian(w)))
        .collect();
    let input_words = public
        .inputs()
        .iter()
        .map(|f| Token::Uint(Uint::from_big_endian(&to_word(f))))
        .collect();

    let mut out = selector.to_vec();
    out.extend(ethabi::encode(&[
        Token::FixedArray(proof_words),
        Token::FixedArray(input_words),
    ]));
    out
}

/// JSON document handed to wallets and scripts calling the verifier contract.
/// Carries only the proof and public inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofCalldata {
    /// Proof words as decimal strings.
    pub proof: [String; 8],
    /// Public inputs as decimal strings.
    pub input: Vec<String>,
    /// `0x`-prefixed hex of the 256 proof bytes.
    pub full_proof_hex: String,
}

impl ProofCalldata {
    pub fn new(proof: &Proof, public: &PublicWitness) -> Self {
        let words = proof.to_evm_words();
        Self {
            proof: words.each_ref().map(|w| Uint::from_big_endian(w).to_string()),
            input: public.inputs().iter().map(decimal).collect(),
            full_proof_hex: format!("0x{}", hex::encode(words.concat())),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Recover the proof and public inputs, validating every element.
    pub fn parse(&self) -> Result<(Proof, PublicWitness)> {
        let mut words = [[0u8; 32]; 8];
        for (word, dec) in words.iter_mut().zip(&self.proof) {
            *word = decimal_word(dec)?;
        }
        let proof = Proof::from_evm_words(&words)?;

        let inputs = self
            .input
            .iter()
            .map(|dec| {
                fr_from_word(&decimal_word(dec)?).ok_or_else(|| {
                    VerificationError::MalformedProof(format!(
                        "input {dec} exceeds the scalar field"
                    ))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((proof, PublicWitness::new(inputs)))
    }
}

fn decimal_word(dec: &str) -> std::result::Result<Word, VerificationError> {
    let value = Uint::from_dec_str(dec).map_err(|e| {
        VerificationError::MalformedProof(format!("{dec:?} is not a uint256: {e:?}"))
    })?;
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    Ok(word)
}
