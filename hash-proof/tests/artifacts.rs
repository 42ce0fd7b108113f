mod common;

use common::{fixture, preimage, preimage_hash, test_rng};
use hash_proof::{
    assign, calldata, prove, solidity_verifier, verify, Artifact, CodecError, Proof,
    ProofCalldata, ProvingKey, PublicWitness, VerifyingKey, Witness,
};

#[test]
fn decoded_artifacts_still_prove_and_verify() {
    let f = fixture();
    let mut rng = test_rng();

    // Keys through bytes
    let pk = ProvingKey::decode(&f.pk.encode().unwrap()).unwrap();
    let vk = VerifyingKey::decode(&f.vk.encode().unwrap()).unwrap();
    assert_eq!(pk, f.pk);
    assert_eq!(vk, f.vk);

    // Witness through bytes
    let witness = assign(&f.compiled.r1cs, &[preimage()], &[preimage_hash()]).unwrap();
    let witness = Witness::decode(&witness.encode().unwrap()).unwrap();

    // Proof and public witness through bytes
    let proof = prove(&pk, &witness, &mut rng).unwrap();
    let proof = Proof::decode(&proof.encode().unwrap()).unwrap();
    let public = witness.public_projection();
    let public = PublicWitness::decode(&public.encode().unwrap()).unwrap();

    assert!(verify(&vk, &public, &proof).unwrap());
}

#[test]
fn every_flipped_proof_bit_is_caught() {
    let f = fixture();
    let witness = assign(&f.compiled.r1cs, &[preimage()], &[preimage_hash()]).unwrap();
    let public = witness.public_projection();
    let proof = prove(&f.pk, &witness, &mut test_rng()).unwrap();
    let bytes = proof.encode().unwrap();

    for i in 0..bytes.len() {
        let mut tampered = bytes.clone();
        tampered[i] ^= 0x01;
        match Proof::decode(&tampered) {
            Err(_) => {}
            Ok(p) => assert!(
                !verify(&f.vk, &public, &p).unwrap(),
                "flipping byte {i} produced a valid proof"
            ),
        }
    }
}

#[test]
fn verifying_key_bytes_are_checked() {
    let f = fixture();
    let bytes = f.vk.encode().unwrap();

    assert!(matches!(
        ProvingKey::decode(&bytes),
        Err(CodecError::WrongTag { .. })
    ));
    assert!(matches!(
        VerifyingKey::decode(&bytes[..bytes.len() / 2]),
        Err(CodecError::Truncated { .. })
    ));
}

#[test]
fn evm_export_matches_the_proof() {
    let f = fixture();
    let witness = assign(&f.compiled.r1cs, &[preimage()], &[preimage_hash()]).unwrap();
    let public = witness.public_projection();
    let proof = prove(&f.pk, &witness, &mut test_rng()).unwrap();

    // ABI calldata: selector + 8 proof words + 1 input word
    let data = calldata(&proof, &public);
    assert_eq!(data.len(), 4 + 32 * 9);

    // JSON document parses back into something that verifies
    let doc = ProofCalldata::new(&proof, &public);
    let json = doc.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, ["fullProofHex", "input", "proof"]);
    let (parsed_proof, parsed_public) = ProofCalldata::from_json(&json).unwrap().parse().unwrap();
    assert_eq!(parsed_proof, proof);
    assert!(verify(&f.vk, &parsed_public, &parsed_proof).unwrap());

    let words = proof.to_evm_words();
    assert_eq!(doc.full_proof_hex, format!("0x{}", hex::encode(words.concat())));
}

#[test]
fn generated_contract_targets_the_canonical_key() {
    let f = fixture();
    let source = solidity_verifier(&f.vk);
    assert!(source.contains("contract Verifier"));
    assert!(source.contains("uint256[1] calldata input"));
    assert!(source.contains("331 constraints"));
}
