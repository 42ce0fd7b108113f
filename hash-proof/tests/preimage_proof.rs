mod common;

use std::str::FromStr;

use ark_bn254::Fr;
use ark_std::rand::rngs::StdRng;
use ark_std::rand::SeedableRng;

use common::{fixture, preimage, preimage_hash, test_rng, PREIMAGE_HASH};
use hash_proof::{
    assign, compile, mimc_hash, prepare_verifying_key, prove, prove_preimage, setup, verify,
    verify_preimage, verify_prepared, Error, HashPreimageCircuit, MimcParams, PublicWitness,
    VerificationError,
};

#[test]
fn canonical_preimage_proves_and_verifies() {
    let f = fixture();
    let mut rng = test_rng();

    // Reference vector and circuit profile
    assert_eq!(mimc_hash(preimage()), preimage_hash());
    assert_eq!(f.compiled.r1cs.num_constraints(), 331);

    // Assign and prove
    let witness = assign(&f.compiled.r1cs, &[preimage()], &[preimage_hash()]).unwrap();
    let public = witness.public_projection();
    assert_eq!(public.inputs(), &[preimage_hash()]);
    let proof = prove(&f.pk, &witness, &mut rng).unwrap();

    // Verify through every entry point
    assert!(verify(&f.vk, &public, &proof).unwrap(), "preimage proof verification failed");
    let pvk = prepare_verifying_key(&f.vk);
    assert!(verify_prepared(&pvk, &public, &proof).unwrap());
    assert!(verify_preimage(&f.vk, preimage_hash(), &proof).unwrap());
}

#[test]
fn published_vector_proves_without_native_hash() {
    let f = fixture();
    let mut rng = test_rng();
    let x = Fr::from(35u64);
    let y = Fr::from_str(PREIMAGE_HASH).unwrap();

    let witness = assign(&f.compiled.r1cs, &[x], &[y]).unwrap();
    let public = witness.public_projection();
    let proof = prove(&f.pk, &witness, &mut rng).unwrap();

    assert!(verify(&f.vk, &public, &proof).unwrap());
    assert!(verify(&f.vk, &PublicWitness::new(vec![y]), &proof).unwrap());
}

#[test]
fn one_call_pipeline() {
    let f = fixture();
    let (proof, public) =
        prove_preimage(&f.pk, preimage(), preimage_hash(), &mut test_rng()).unwrap();
    assert_eq!(public, PublicWitness::new(vec![preimage_hash()]));
    assert!(verify(&f.vk, &public, &proof).unwrap());
}

#[test]
fn wrong_preimage_is_a_constraint_violation() {
    let f = fixture();
    let err = assign(&f.compiled.r1cs, &[Fr::from(42u64)], &[Fr::from(42u64)]).unwrap_err();
    assert!(err.is_constraint_violation());
    // the gadget is satisfiable for any input; only the final equality fails
    assert!(matches!(err, Error::ConstraintViolation { index: 330 }));

    let err = prove_preimage(&f.pk, Fr::from(36u64), preimage_hash(), &mut test_rng()).unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn tampered_public_input_is_rejected() {
    let f = fixture();
    let (proof, _) = prove_preimage(&f.pk, preimage(), preimage_hash(), &mut test_rng()).unwrap();

    for forged in [Fr::from(0u64), preimage(), preimage_hash() + Fr::from(1u64)] {
        assert!(!verify_preimage(&f.vk, forged, &proof).unwrap());
    }
}

#[test]
fn verification_is_deterministic() {
    let f = fixture();
    let (proof, public) =
        prove_preimage(&f.pk, preimage(), preimage_hash(), &mut test_rng()).unwrap();
    let forged = PublicWitness::new(vec![Fr::from(1u64)]);

    for _ in 0..3 {
        assert!(verify(&f.vk, &public, &proof).unwrap());
        assert!(!verify(&f.vk, &forged, &proof).unwrap());
    }
}

#[test]
fn proofs_of_one_witness_are_unlinkable() {
    let f = fixture();
    let mut rng = test_rng();
    let (p1, _) = prove_preimage(&f.pk, preimage(), preimage_hash(), &mut rng).unwrap();
    let (p2, _) = prove_preimage(&f.pk, preimage(), preimage_hash(), &mut rng).unwrap();
    assert_ne!(p1, p2);
    assert!(verify_preimage(&f.vk, preimage_hash(), &p2).unwrap());
}

#[test]
fn keys_are_bound_to_their_circuit() {
    let f = fixture();

    // A structurally different circuit: one round fewer
    let params = MimcParams::from_seed(b"seed", 109).unwrap();
    let hash = params.hash(&[preimage()]);
    let other = compile(&HashPreimageCircuit::new(params)).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let (other_pk, other_vk) = setup(&other.r1cs, &mut rng).unwrap();

    let witness = assign(&other.r1cs, &[preimage()], &[hash]).unwrap();
    let proof = prove(&other_pk, &witness, &mut rng).unwrap();
    assert!(verify(&other_vk, &witness.public_projection(), &proof).unwrap());

    // The canonical key rejects it, and refuses the foreign circuit outright
    assert!(!verify(&f.vk, &witness.public_projection(), &proof).unwrap());
    assert!(matches!(
        f.vk.check_circuit(&other.r1cs),
        Err(VerificationError::CircuitMismatch(_))
    ));
    assert!(f.vk.check_circuit(&f.compiled.r1cs).is_ok());

    // The foreign proving key cannot be used for the canonical circuit
    assert!(matches!(
        prove_preimage(&other_pk, preimage(), preimage_hash(), &mut rng),
        Err(Error::Verification(VerificationError::CircuitMismatch(_)))
    ));

    // A canonical witness does not fit the foreign proving key
    let canonical = assign(&f.compiled.r1cs, &[preimage()], &[preimage_hash()]).unwrap();
    assert!(matches!(
        prove(&other_pk, &canonical, &mut rng),
        Err(Error::WitnessMismatch { .. })
    ));
}

#[test]
fn independent_setups_do_not_share_proofs() {
    let f = fixture();
    let mut rng = StdRng::seed_from_u64(99);
    let (_, vk2) = setup(&f.compiled.r1cs, &mut rng).unwrap();

    let (proof, public) = prove_preimage(&f.pk, preimage(), preimage_hash(), &mut rng).unwrap();
    assert!(!verify(&vk2, &public, &proof).unwrap());
}
