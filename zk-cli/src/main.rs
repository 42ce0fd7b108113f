mod artifacts;

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use ark_bn254::Fr;
use ark_ff::PrimeField;
use clap::{Parser, Subcommand};
use hash_proof::{
    mimc_hash, prove_preimage, setup_preimage_circuit, solidity_verifier, verify, Error,
    ProofCalldata, ProvingKey, Proof, PublicWitness, VerifyingKey,
};
use rand::thread_rng;
use tracing_subscriber::EnvFilter;

use artifacts::{
    ArtifactDir, CALLDATA, PROOF, PROVING_KEY, PUBLIC_WITNESS, VERIFIER_CONTRACT, VERIFYING_KEY,
};

/// zkcli: prove knowledge of a MiMC preimage with Groth16 over BN254
#[derive(Parser)]
#[command(name = "zkcli")]
#[command(about = "Generate and check zkSNARK proofs of a MiMC preimage")]
struct Cli {
    /// Directory artifacts are read from and written to
    #[arg(long, global = true, default_value = "artifacts")]
    out_dir: PathBuf,

    /// Repeat for more log output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print MiMC(preimage) in decimal
    Hash {
        #[arg(long, value_parser = parse_field)]
        preimage: Fr,
    },
    /// Run the trusted setup and export the verifier contract
    Setup,
    /// Prove knowledge of a preimage of the given hash
    Prove {
        #[arg(long, value_parser = parse_field)]
        preimage: Fr,
        #[arg(long, value_parser = parse_field)]
        hash: Fr,
    },
    /// Check the stored proof against the stored verifying key
    Verify,
    /// Setup, prove and verify in one go
    Run {
        #[arg(long, value_parser = parse_field)]
        preimage: Fr,
        #[arg(long, value_parser = parse_field)]
        hash: Fr,
    },
}

/// Canonical decimal scalar-field element.
fn parse_field(s: &str) -> std::result::Result<Fr, String> {
    let digits = match s.trim_start_matches('0') {
        "" if !s.is_empty() => "0",
        digits => digits,
    };
    let value = Fr::from_str(digits).map_err(|_| format!("{s:?} is not a decimal integer"))?;
    if decimal(value) != digits {
        return Err(format!("{s} is not below the BN254 scalar field modulus"));
    }
    Ok(value)
}

fn decimal(f: Fr) -> String {
    f.into_bigint().to_string()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let dir = ArtifactDir::new(&cli.out_dir);
    let result = match cli.command {
        Commands::Hash { preimage } => {
            println!("{}", decimal(mimc_hash(preimage)));
            Ok(true)
        }
        Commands::Setup => run_setup(&dir).map(|_| true),
        Commands::Prove { preimage, hash } => run_prove(&dir, preimage, hash).map(|_| true),
        Commands::Verify => run_verify(&dir),
        Commands::Run { preimage, hash } => run_all(&dir, preimage, hash),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run_setup(dir: &ArtifactDir) -> Result<(ProvingKey, VerifyingKey)> {
    let mut rng = thread_rng();
    let (compiled, pk, vk) = setup_preimage_circuit(&mut rng).context("trusted setup")?;
    tracing::info!(constraints = compiled.r1cs.num_constraints(), "keys generated");

    dir.save(PROVING_KEY, &pk)?;
    dir.save(VERIFYING_KEY, &vk)?;
    let contract = dir.save_text(VERIFIER_CONTRACT, &solidity_verifier(&vk))?;

    println!("✅ Keys saved to {}", dir.root().display());
    println!("✅ Verifier contract saved to {}", contract.display());
    Ok((pk, vk))
}

fn run_prove(dir: &ArtifactDir, preimage: Fr, hash: Fr) -> Result<(Proof, PublicWitness)> {
    let pk: ProvingKey = dir.load(PROVING_KEY)?;
    prove_and_save(dir, &pk, preimage, hash)
}

fn prove_and_save(
    dir: &ArtifactDir,
    pk: &ProvingKey,
    preimage: Fr,
    hash: Fr,
) -> Result<(Proof, PublicWitness)> {
    let (proof, public) = match prove_preimage(pk, preimage, hash, &mut thread_rng()) {
        Ok(out) => out,
        Err(e @ Error::ConstraintViolation { .. }) => {
            bail!(
                "MiMC({}) != {}; no proof can be made ({e})",
                decimal(preimage),
                decimal(hash)
            )
        }
        Err(e) => return Err(e).context("proving"),
    };

    dir.save(PROOF, &proof)?;
    dir.save(PUBLIC_WITNESS, &public)?;
    let json = ProofCalldata::new(&proof, &public)
        .to_json()
        .context("rendering calldata")?;
    let calldata = dir.save_text(CALLDATA, &json)?;

    println!("✅ Proof saved to {}", dir.path(PROOF).display());
    println!("✅ Calldata saved to {}", calldata.display());
    Ok((proof, public))
}

fn run_verify(dir: &ArtifactDir) -> Result<bool> {
    let vk: VerifyingKey = dir.load(VERIFYING_KEY)?;
    let proof: Proof = dir.load(PROOF)?;
    let public: PublicWitness = dir.load(PUBLIC_WITNESS)?;
    check(&vk, &public, &proof)
}

fn check(vk: &VerifyingKey, public: &PublicWitness, proof: &Proof) -> Result<bool> {
    let valid = verify(vk, public, proof).context("verifying")?;
    println!("Proof is valid: {valid}");
    Ok(valid)
}

fn run_all(dir: &ArtifactDir, preimage: Fr, hash: Fr) -> Result<bool> {
    let (pk, vk) = run_setup(dir)?;
    let (proof, public) = prove_and_save(dir, &pk, preimage, hash)?;
    check(&vk, &public, &proof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_arguments_must_be_canonical() {
        assert_eq!(parse_field("35").unwrap(), Fr::from(35u64));
        assert_eq!(parse_field("0").unwrap(), Fr::from(0u64));
        assert_eq!(parse_field("007").unwrap(), Fr::from(7u64));
        assert!(parse_field("").is_err());
        assert!(parse_field("-1").is_err());
        assert!(parse_field("0x10").is_err());
        // the modulus itself
        assert!(parse_field(
            "21888242871839275222246405745257275088548364400416034343698204186575808495617"
        )
        .is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let args = [
            "zkcli", "-vv", "--out-dir", "out", "prove", "--preimage", "35", "--hash", "1",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.out_dir, PathBuf::from("out"));
        assert!(matches!(cli.command, Commands::Prove { .. }));
    }

    #[test]
    fn full_pipeline_writes_every_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ArtifactDir::new(tmp.path());
        let preimage = Fr::from(35u64);

        assert!(run_all(&dir, preimage, mimc_hash(preimage)).unwrap());
        let expected = [
            PROVING_KEY,
            VERIFYING_KEY,
            VERIFIER_CONTRACT,
            PROOF,
            PUBLIC_WITNESS,
            CALLDATA,
        ];
        for name in expected {
            assert!(dir.path(name).exists(), "{name} missing");
        }
        assert!(run_verify(&dir).unwrap());

        let err = run_prove(&dir, Fr::from(42u64), Fr::from(42u64)).unwrap_err();
        assert!(format!("{err:#}").contains("no proof can be made"));
    }
}
