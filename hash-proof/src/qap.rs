// R1CS -> QAP reduction over a radix-2 evaluation domain.
//
// Row i of the matrices is interpolated at the i-th domain element. After the
// constraints come one "input consistency" row per public variable (A = z_j,
// B = C = 0) so the public A-polynomials stay linearly independent.

use ark_bn254::Fr;
use ark_ff::{FftField, Field, One, Zero};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use rayon::prelude::*;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::r1cs::{evaluate_row, CircuitShape, ConstraintMatrices, SparseRow};

pub(crate) type Domain = Radix2EvaluationDomain<Fr>;

/// Smallest radix-2 domain holding every constraint plus the input rows.
pub(crate) fn domain_for(shape: &CircuitShape) -> Result<Domain> {
    let rows = shape.num_constraints + shape.num_public;
    Domain::new(rows)
        .ok_or_else(|| Error::Setup(format!("no radix-2 domain of size >= {rows}")))
}

/// Every variable's A, B, C polynomial evaluated at tau, plus Z(tau).
pub(crate) struct QapEvaluations {
    pub a: Zeroizing<Vec<Fr>>,
    pub b: Zeroizing<Vec<Fr>>,
    pub c: Zeroizing<Vec<Fr>>,
    pub zt: Zeroizing<Fr>,
}

pub(crate) fn evaluate_at(
    matrices: &ConstraintMatrices,
    shape: &CircuitShape,
    domain: &Domain,
    tau: Fr,
) -> Result<QapEvaluations> {
    let zt = Zeroizing::new(domain.evaluate_vanishing_polynomial(tau));
    if zt.is_zero() {
        return Err(Error::Setup("tau lies in the evaluation domain".into()));
    }
    let lagrange = Zeroizing::new(domain.evaluate_all_lagrange_coefficients(tau));

    let n = shape.num_variables();
    let mut a = Zeroizing::new(vec![Fr::zero(); n]);
    let mut b = Zeroizing::new(vec![Fr::zero(); n]);
    let mut c = Zeroizing::new(vec![Fr::zero(); n]);

    let rows = matrices.a.iter().zip(&matrices.b).zip(&matrices.c);
    for (((row_a, row_b), row_c), l) in rows.zip(lagrange.iter()) {
        for (coeff, index) in row_a {
            a[*index] += *l * coeff;
        }
        for (coeff, index) in row_b {
            b[*index] += *l * coeff;
        }
        for (coeff, index) in row_c {
            c[*index] += *l * coeff;
        }
    }

    let m = matrices.num_constraints();
    for j in 0..shape.num_public {
        a[j] += lagrange[m + j];
    }

    Ok(QapEvaluations { a, b, c, zt })
}

/// Coefficients of `h = (A(X) B(X) - C(X)) / Z(X)` for a satisfying assignment.
///
/// Division happens on the coset `g * H`, where `Z` is the constant `g^n - 1`.
pub(crate) fn quotient_coefficients(
    matrices: &ConstraintMatrices,
    shape: &CircuitShape,
    domain: &Domain,
    assignment: &[Fr],
) -> Result<Vec<Fr>> {
    let size = domain.size();
    let m = matrices.num_constraints();

    let mut a = evaluate_rows(&matrices.a, assignment, size);
    let mut b = evaluate_rows(&matrices.b, assignment, size);
    let mut c = evaluate_rows(&matrices.c, assignment, size);
    a[m..m + shape.num_public].copy_from_slice(&assignment[..shape.num_public]);

    let g = Fr::GENERATOR;
    let g_inv = g
        .inverse()
        .ok_or_else(|| Error::Setup("coset generator is not invertible".into()))?;
    let z_inv = (g.pow([size as u64]) - Fr::one())
        .inverse()
        .ok_or_else(|| Error::Setup("vanishing polynomial is zero on the coset".into()))?;

    for evals in [&mut a, &mut b, &mut c] {
        domain.ifft_in_place(&mut *evals);
        distribute_powers(&mut *evals, g);
        domain.fft_in_place(&mut *evals);
    }

    a.par_iter_mut()
        .zip(b.par_iter())
        .zip(c.par_iter())
        .for_each(|((a, b), c)| *a = (*a * b - c) * z_inv);

    domain.ifft_in_place(&mut a);
    distribute_powers(&mut a, g_inv);
    // deg h <= n - 2
    a.truncate(size - 1);
    Ok(a)
}

fn evaluate_rows(rows: &[SparseRow], assignment: &[Fr], size: usize) -> Vec<Fr> {
    let mut evals: Vec<Fr> = rows
        .par_iter()
        .map(|row| evaluate_row(row, assignment))
        .collect();
    evals.resize(size, Fr::zero());
    evals
}

fn distribute_powers(coeffs: &mut [Fr], g: Fr) {
    let mut power = Fr::one();
    for coeff in coeffs.iter_mut() {
        *coeff *= power;
        power *= g;
    }
}
