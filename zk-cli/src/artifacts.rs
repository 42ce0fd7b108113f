// Reading and writing proof-system artifacts in the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hash_proof::Artifact;

pub const PROVING_KEY: &str = "proving_key.bin";
pub const VERIFYING_KEY: &str = "verifying_key.bin";
pub const VERIFIER_CONTRACT: &str = "HashProofVerifier.sol";
pub const PROOF: &str = "proof.bin";
pub const PUBLIC_WITNESS: &str = "public_witness.bin";
pub const CALLDATA: &str = "proof_calldata.json";

/// Artifact directory, created on first write.
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating {}", self.root.display()))
    }

    pub fn save<A: Artifact>(&self, name: &str, artifact: &A) -> Result<PathBuf> {
        let bytes = artifact
            .encode()
            .with_context(|| format!("encoding {name}"))?;
        self.write(name, &bytes)
    }

    pub fn load<A: Artifact>(&self, name: &str) -> Result<A> {
        let path = self.path(name);
        let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        A::decode(&bytes).with_context(|| format!("decoding {}", path.display()))
    }

    pub fn save_text(&self, name: &str, text: &str) -> Result<PathBuf> {
        self.write(name, text.as_bytes())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure()?;
        let path = self.path(name);
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use hash_proof::PublicWitness;

    #[test]
    fn artifacts_round_trip_through_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::new(tmp.path().join("nested"));

        let public = PublicWitness::new(vec![Fr::from(5u64)]);
        let path = dir.save(PUBLIC_WITNESS, &public).unwrap();
        assert!(path.exists());

        let loaded: PublicWitness = dir.load(PUBLIC_WITNESS).unwrap();
        assert_eq!(loaded, public);
    }

    #[test]
    fn missing_and_corrupt_files_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::new(tmp.path());

        let err = dir.load::<PublicWitness>(PUBLIC_WITNESS).unwrap_err();
        assert!(format!("{err:#}").contains("reading"));

        dir.save_text(PUBLIC_WITNESS, "not an artifact").unwrap();
        let err = dir.load::<PublicWitness>(PUBLIC_WITNESS).unwrap_err();
        assert!(format!("{err:#}").contains("decoding"));
    }
}
