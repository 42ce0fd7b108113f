// Solidity verifier generation. The contract checks
// e(-A, B) * e(alpha, beta) * e(vk_x, gamma) * e(C, delta) == 1
// through the BN254 precompiles at 0x06 (add), 0x07 (mul) and 0x08 (pairing).

use ark_bn254::{Fq, Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{PrimeField, Zero};

use crate::export::decimal;
use crate::keys::VerifyingKey;

fn g1_literal(p: &G1Affine) -> String {
    let (x, y) = p.xy().map_or((Fq::zero(), Fq::zero()), |(x, y)| (*x, *y));
    format!("G1Point({}, {})", decimal(&x), decimal(&y))
}

fn g2_literal(p: &G2Affine) -> String {
    let zero = (Default::default(), Default::default());
    let (x, y) = p.xy().map_or(zero, |(x, y)| (*x, *y));
    format!(
        "G2Point([uint256({}), {}], [uint256({}), {}])",
        decimal(&x.c1),
        decimal(&x.c0),
        decimal(&y.c1),
        decimal(&y.c0)
    )
}

/// Source of a `Verifier` contract bound to `vk`. Output depends only on `vk`.
pub fn solidity_verifier(vk: &VerifyingKey) -> String {
    let n = vk.num_public_inputs();
    let ic = vk
        .gamma_abc_g1
        .iter()
        .enumerate()
        .map(|(i, p)| format!("        ic[{i}] = {};\n", g1_literal(p)))
        .collect::<String>();

    format!(
        r#"// SPDX-License-Identifier: MIT
// Generated by hash-proof. Circuit: {constraints} constraints, {variables} variables.
pragma solidity ^0.8.20;

contract Verifier {{
    uint256 constant SNARK_SCALAR_FIELD = {r};
    uint256 constant PRIME_Q = {q};

    struct G1Point {{
        uint256 X;
        uint256 Y;
    }}

    // Coordinates are [imaginary, real].
    struct G2Point {{
        uint256[2] X;
        uint256[2] Y;
    }}

    function negate(G1Point memory p) internal pure returns (G1Point memory) {{
        if (p.X == 0 && p.Y == 0) {{
            return G1Point(0, 0);
        }}
        return G1Point(p.X, PRIME_Q - (p.Y % PRIME_Q));
    }}

    function add(G1Point memory p1, G1Point memory p2) internal view returns (G1Point memory r) {{
        uint256[4] memory input = [p1.X, p1.Y, p2.X, p2.Y];
        bool success;
        assembly {{
            success := staticcall(gas(), 0x06, input, 0x80, r, 0x40)
        }}
        require(success, "ec-add-failed");
    }}

    function scalarMul(G1Point memory p, uint256 s) internal view returns (G1Point memory r) {{
        uint256[3] memory input = [p.X, p.Y, s];
        bool success;
        assembly {{
            success := staticcall(gas(), 0x07, input, 0x60, r, 0x40)
        }}
        require(success, "ec-mul-failed");
    }}

    function pairing(G1Point[4] memory a, G2Point[4] memory b) internal view returns (bool) {{
        uint256[24] memory input;
        for (uint256 i = 0; i < 4; i++) {{
            input[i * 6 + 0] = a[i].X;
            input[i * 6 + 1] = a[i].Y;
            input[i * 6 + 2] = b[i].X[0];
            input[i * 6 + 3] = b[i].X[1];
            input[i * 6 + 4] = b[i].Y[0];
            input[i * 6 + 5] = b[i].Y[1];
        }}
        uint256[1] memory out;
        bool success;
        assembly {{
            success := staticcall(gas(), 0x08, input, 0x300, out, 0x20)
        }}
        require(success, "pairing-failed");
        return out[0] == 1;
    }}

    function verifyingKey()
        internal
        pure
        returns (
            G1Point memory alpha,
            G2Point memory beta,
            G2Point memory gamma,
            G2Point memory delta,
            G1Point[{ic_len}] memory ic
        )
    {{
        alpha = {alpha};
        beta = {beta};
        gamma = {gamma};
        delta = {delta};
{ic}    }}

    function verifyProof(
        uint256[8] calldata proof,
        uint256[{n}] calldata input
    ) public view returns (bool) {{
        for (uint256 i = 0; i < 8; i++) {{
            require(proof[i] < PRIME_Q, "proof-element-out-of-field");
        }}
        (
            G1Point memory alpha,
            G2Point memory beta,
            G2Point memory gamma,
            G2Point memory delta,
            G1Point[{ic_len}] memory ic
        ) = verifyingKey();

        G1Point memory vkX = ic[0];
        for (uint256 i = 0; i < {n}; i++) {{
            require(input[i] < SNARK_SCALAR_FIELD, "input-out-of-field");
            vkX = add(vkX, scalarMul(ic[i + 1], input[i]));
        }}

        G1Point memory a = G1Point(proof[0], proof[1]);
        G2Point memory b = G2Point([proof[2], proof[3]], [proof[4], proof[5]]);
        G1Point memory c = G1Point(proof[6], proof[7]);
        return pairing([negate(a), alpha, vkX, c], [b, beta, gamma, delta]);
    }}
}}
"#,
        constraints = vk.shape.num_constraints,
        variables = vk.shape.num_variables(),
        r = Fr::MODULUS,
        q = Fq::MODULUS,
        ic_len = vk.gamma_abc_g1.len(),
        alpha = g1_literal(&vk.alpha_g1),
        beta = g2_literal(&vk.beta_g2),
        gamma = g2_literal(&vk.gamma_g2),
        delta = g2_literal(&vk.delta_g2),
    )
}
