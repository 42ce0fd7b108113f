// Binary artifact format.
//
// Layout: 4-byte ASCII tag, 1-byte format version, then the body. Curve points
// and field elements use the arkworks uncompressed encoding (Fr/Fq 32 bytes,
// G1 64 bytes, G2 128 bytes); counts and indices are u64 little-endian.

use ark_bn254::{Fr, G1Affine, G2Affine};
use ark_ff::One;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::error::CodecError;
use crate::keys::{Proof, ProvingKey, VerifyingKey};
use crate::r1cs::{CircuitShape, ConstraintMatrices, SparseRow};
use crate::witness::{PublicWitness, Witness};

pub const FORMAT_VERSION: u8 = 1;

type CodecResult<T> = std::result::Result<T, CodecError>;

/// A value with a canonical, versioned byte encoding.
pub trait Artifact: Sized {
    const TAG: [u8; 4];

    fn write_body(&self, w: &mut Writer) -> CodecResult<()>;

    fn read_body(r: &mut Reader<'_>) -> CodecResult<Self>;

    fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut w = Writer::default();
        w.raw(&Self::TAG);
        w.raw(&[FORMAT_VERSION]);
        self.write_body(&mut w)?;
        Ok(w.into_bytes())
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = Reader::new(bytes);
        let tag = r.take(4)?;
        if tag != Self::TAG {
            return Err(CodecError::WrongTag {
                expected: String::from_utf8_lossy(&Self::TAG).into_owned(),
                found: String::from_utf8_lossy(tag).into_owned(),
            });
        }
        let version = r.take(1)?[0];
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let value = Self::read_body(&mut r)?;
        r.finish()?;
        Ok(value)
    }
}

#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn u64(&mut self, v: u64) {
        self.raw(&v.to_le_bytes());
    }

    pub fn count(&mut self, n: usize) {
        self.u64(n as u64);
    }

    pub fn element<T: CanonicalSerialize>(&mut self, value: &T) -> CodecResult<()> {
        value
            .serialize_uncompressed(&mut self.buf)
            .map_err(|e| CodecError::InvalidElement(e.to_string()))
    }

    pub fn elements<T: CanonicalSerialize>(&mut self, values: &[T]) -> CodecResult<()> {
        self.count(values.len());
        values.iter().try_for_each(|v| self.element(v))
    }

    fn shape(&mut self, shape: &CircuitShape) {
        self.count(shape.num_constraints);
        self.count(shape.num_public);
        self.count(shape.num_secret);
        self.count(shape.num_internal);
    }
}

pub struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(CodecError::Truncated {
                needed: n,
                available: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn finish(&self) -> CodecResult<()> {
        match self.bytes.len() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    pub fn u64(&mut self) -> CodecResult<u64> {
        let mut word = [0u8; 8];
        word.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(word))
    }

    pub fn count(&mut self) -> CodecResult<usize> {
        let n = self.u64()?;
        usize::try_from(n).map_err(|_| CodecError::Inconsistent(format!("length {n} overflows")))
    }

    pub fn element<T>(&mut self, what: &str) -> CodecResult<T>
    where
        T: CanonicalDeserialize + CanonicalSerialize + Default,
    {
        let size = T::default().uncompressed_size();
        let mut bytes = self.take(size)?;
        T::deserialize_uncompressed(&mut bytes)
            .map_err(|e| CodecError::InvalidElement(format!("{what}: {e}")))
    }

    /// A length-prefixed run of elements. The length is checked against the
    /// remaining input before anything is allocated.
    pub fn elements<T>(&mut self, what: &str) -> CodecResult<Vec<T>>
    where
        T: CanonicalDeserialize + CanonicalSerialize + Default,
    {
        let n = self.count()?;
        let size = T::default().uncompressed_size();
        self.ensure(n, size)?;
        (0..n).map(|_| self.element(what)).collect()
    }

    fn ensure(&self, count: usize, width: usize) -> CodecResult<()> {
        let needed = count.checked_mul(width).unwrap_or(usize::MAX);
        if needed > self.bytes.len() {
            return Err(CodecError::Truncated {
                needed,
                available: self.bytes.len(),
            });
        }
        Ok(())
    }

    fn shape(&mut self) -> CodecResult<CircuitShape> {
        let shape = CircuitShape {
            num_constraints: self.count()?,
            num_public: self.count()?,
            num_secret: self.count()?,
            num_internal: self.count()?,
        };
        if shape.num_public == 0 {
            return Err(CodecError::Inconsistent(
                "circuit has no constant variable".into(),
            ));
        }
        shape
            .num_public
            .checked_add(shape.num_secret)
            .and_then(|n| n.checked_add(shape.num_internal))
            .ok_or_else(|| CodecError::Inconsistent("variable count overflows".into()))?;
        shape
            .num_constraints
            .checked_add(shape.num_public)
            .ok_or_else(|| CodecError::Inconsistent("row count overflows".into()))?;
        Ok(shape)
    }
}

impl Artifact for Proof {
    const TAG: [u8; 4] = *b"HPPF";

    fn write_body(&self, w: &mut Writer) -> CodecResult<()> {
        w.element(&self.a)?;
        w.element(&self.b)?;
        w.element(&self.c)
    }

    fn read_body(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Proof {
            a: r.element::<G1Affine>("proof.a")?,
            b: r.element::<G2Affine>("proof.b")?,
            c: r.element::<G1Affine>("proof.c")?,
        })
    }
}

impl Artifact for VerifyingKey {
    const TAG: [u8; 4] = *b"HPVK";

    fn write_body(&self, w: &mut Writer) -> CodecResult<()> {
        w.shape(&self.shape);
        w.element(&self.alpha_g1)?;
        w.element(&self.beta_g2)?;
        w.element(&self.gamma_g2)?;
        w.element(&self.delta_g2)?;
        w.elements(&self.gamma_abc_g1)
    }

    fn read_body(r: &mut Reader<'_>) -> CodecResult<Self> {
        let vk = VerifyingKey {
            shape: r.shape()?,
            alpha_g1: r.element("alpha_g1")?,
            beta_g2: r.element("beta_g2")?,
            gamma_g2: r.element("gamma_g2")?,
            delta_g2: r.element("delta_g2")?,
            gamma_abc_g1: r.elements("gamma_abc_g1")?,
        };
        if vk.gamma_abc_g1.len() != vk.shape.num_public {
            return Err(CodecError::Inconsistent(format!(
                "{} gamma_abc_g1 entries for {} public variables",
                vk.gamma_abc_g1.len(),
                vk.shape.num_public
            )));
        }
        Ok(vk)
    }
}

impl Artifact for ProvingKey {
    const TAG: [u8; 4] = *b"HPPK";

    fn write_body(&self, w: &mut Writer) -> CodecResult<()> {
        self.vk.write_body(w)?;
        w.element(&self.beta_g1)?;
        w.element(&self.delta_g1)?;
        w.elements(&self.a_query)?;
        w.elements(&self.b_g1_query)?;
        w.elements(&self.b_g2_query)?;
        w.elements(&self.h_query)?;
        w.elements(&self.l_query)?;
        for matrix in [&self.matrices.a, &self.matrices.b, &self.matrices.c] {
            write_matrix(w, matrix)?;
        }
        Ok(())
    }

    fn read_body(r: &mut Reader<'_>) -> CodecResult<Self> {
        let vk = VerifyingKey::read_body(r)?;
        let num_variables = vk.shape.num_variables();
        let beta_g1 = r.element("beta_g1")?;
        let delta_g1 = r.element("delta_g1")?;
        let a_query = r.elements("a_query")?;
        let b_g1_query = r.elements("b_g1_query")?;
        let b_g2_query = r.elements("b_g2_query")?;
        let h_query = r.elements("h_query")?;
        let l_query = r.elements("l_query")?;
        let matrices = ConstraintMatrices {
            a: read_matrix(r, num_variables)?,
            b: read_matrix(r, num_variables)?,
            c: read_matrix(r, num_variables)?,
        };
        if matrices.b.len() != matrices.a.len() || matrices.c.len() != matrices.a.len() {
            return Err(CodecError::Inconsistent(
                "constraint matrices differ in row count".into(),
            ));
        }

        let pk = ProvingKey {
            vk,
            beta_g1,
            delta_g1,
            a_query,
            b_g1_query,
            b_g2_query,
            h_query,
            l_query,
            matrices,
        };
        match pk.layout_error() {
            Some(problem) => Err(CodecError::Inconsistent(problem)),
            None => Ok(pk),
        }
    }
}

fn write_matrix(w: &mut Writer, rows: &[SparseRow]) -> CodecResult<()> {
    w.count(rows.len());
    for row in rows {
        w.count(row.len());
        for (coeff, index) in row {
            w.element(coeff)?;
            w.count(*index);
        }
    }
    Ok(())
}

fn read_matrix(r: &mut Reader<'_>, num_variables: usize) -> CodecResult<Vec<SparseRow>> {
    // every row carries at least its own length prefix
    let num_rows = r.count()?;
    r.ensure(num_rows, 8)?;
    let mut rows = Vec::with_capacity(num_rows);
    for _ in 0..num_rows {
        let len = r.count()?;
        r.ensure(len, 32 + 8)?;
        let mut row = Vec::with_capacity(len);
        for _ in 0..len {
            let coeff: Fr = r.element("matrix coefficient")?;
            let index = r.count()?;
            if index >= num_variables {
                return Err(CodecError::Inconsistent(format!(
                    "matrix references variable {index} of {num_variables}"
                )));
            }
            row.push((coeff, index));
        }
        rows.push(row);
    }
    Ok(rows)
}

impl Artifact for Witness {
    const TAG: [u8; 4] = *b"HPWT";

    fn write_body(&self, w: &mut Writer) -> CodecResult<()> {
        w.shape(&self.shape());
        w.elements(self.values())
    }

    fn read_body(r: &mut Reader<'_>) -> CodecResult<Self> {
        let shape = r.shape()?;
        let values: Vec<Fr> = r.elements("witness value")?;
        if values.len() != shape.num_variables() {
            return Err(CodecError::Inconsistent(format!(
                "{} witness values for {} variables",
                values.len(),
                shape.num_variables()
            )));
        }
        if values[0] != Fr::one() {
            return Err(CodecError::Inconsistent(
                "witness does not start with the constant 1".into(),
            ));
        }
        Ok(Witness::from_parts(shape, values))
    }
}

impl Artifact for PublicWitness {
    const TAG: [u8; 4] = *b"HPPW";

    fn write_body(&self, w: &mut Writer) -> CodecResult<()> {
        w.elements(self.inputs())
    }

    fn read_body(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(PublicWitness::new(r.elements("public input")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{compile, HashPreimageCircuit};
    use crate::mimc::MimcParams;
    use crate::prover::prove;
    use crate::setup::setup;
    use crate::witness::assign;
    use ark_ff::Zero;
    use crate::test_rng;

    struct Artifacts {
        pk: ProvingKey,
        vk: VerifyingKey,
        witness: Witness,
        proof: Proof,
    }

    fn artifacts() -> Artifacts {
        let params = MimcParams::from_seed(b"seed", 3).unwrap();
        let x = Fr::from(11u64);
        let y = params.hash(&[x]);
        let compiled = compile(&HashPreimageCircuit::new(params)).unwrap();
        let mut rng = test_rng();
        let (pk, vk) = setup(&compiled.r1cs, &mut rng).unwrap();
        let witness = assign(&compiled.r1cs, &[x], &[y]).unwrap();
        let proof = prove(&pk, &witness, &mut rng).unwrap();
        Artifacts {
            pk,
            vk,
            witness,
            proof,
        }
    }

    #[test]
    fn artifacts_survive_encoding() {
        let a = artifacts();
        let public = a.witness.public_projection();

        assert_eq!(ProvingKey::decode(&a.pk.encode().unwrap()).unwrap(), a.pk);
        assert_eq!(VerifyingKey::decode(&a.vk.encode().unwrap()).unwrap(), a.vk);
        assert_eq!(Witness::decode(&a.witness.encode().unwrap()).unwrap(), a.witness);
        assert_eq!(PublicWitness::decode(&public.encode().unwrap()).unwrap(), public);
        assert_eq!(Proof::decode(&a.proof.encode().unwrap()).unwrap(), a.proof);
    }

    #[test]
    fn proof_encoding_has_fixed_size() {
        let a = artifacts();
        // header + G1 + G2 + G1
        assert_eq!(a.proof.encode().unwrap().len(), 5 + 64 + 128 + 64);
    }

    #[test]
    fn header_is_checked() {
        let a = artifacts();
        let bytes = a.proof.encode().unwrap();

        assert!(matches!(
            VerifyingKey::decode(&bytes),
            Err(CodecError::WrongTag { .. })
        ));

        let mut bumped = bytes.clone();
        bumped[4] = 2;
        assert_eq!(Proof::decode(&bumped), Err(CodecError::UnsupportedVersion(2)));

        assert!(matches!(
            Proof::decode(&bytes[..3]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn truncated_and_padded_buffers_are_rejected() {
        let a = artifacts();
        let bytes = a.vk.encode().unwrap();

        assert!(matches!(
            VerifyingKey::decode(&bytes[..bytes.len() - 1]),
            Err(CodecError::Truncated { .. })
        ));

        let mut padded = bytes;
        padded.push(0);
        assert_eq!(VerifyingKey::decode(&padded), Err(CodecError::TrailingBytes(1)));
    }

    #[test]
    fn off_curve_point_is_rejected() {
        let a = artifacts();
        let mut bytes = a.proof.encode().unwrap();
        // perturb A.x; (x+1, y) is almost surely not on the curve
        bytes[5] ^= 0x01;
        assert!(matches!(
            Proof::decode(&bytes),
            Err(CodecError::InvalidElement(_))
        ));
    }

    #[test]
    fn huge_length_prefix_does_not_allocate() {
        let mut w = Writer::default();
        w.raw(&PublicWitness::TAG);
        w.raw(&[FORMAT_VERSION]);
        w.u64(u64::MAX / 2);
        assert!(matches!(
            PublicWitness::decode(&w.into_bytes()),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn witness_must_start_with_one() {
        let a = artifacts();
        let mut values = a.witness.values().to_vec();
        values[0] = Fr::zero();
        let forged = Witness::from_parts(a.witness.shape(), values);
        assert!(matches!(
            Witness::decode(&forged.encode().unwrap()),
            Err(CodecError::Inconsistent(_))
        ));
    }

    #[test]
    fn proving_key_with_short_query_is_inconsistent() {
        let mut a = artifacts();
        a.pk.l_query.pop();
        assert!(matches!(
            ProvingKey::decode(&a.pk.encode().unwrap()),
            Err(CodecError::Inconsistent(_))
        ));
    }
}
