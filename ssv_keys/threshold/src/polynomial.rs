use crate::SplitError;
use bls12_381_plus::Scalar;
use ff::Field;
use rand::{CryptoRng, RngCore};
use std::sync::atomic::{compiler_fence, Ordering};

/// A polynomial over the BLS12-381 scalar field whose constant term is the secret being shared.
///
/// Coefficients are overwritten when the polynomial is dropped.
pub(crate) struct Polynomial {
    coefficients: Vec<Scalar>,
}

impl Polynomial {
    /// Random polynomial of the given degree with `P(0) = secret`
    pub fn random<R: RngCore + CryptoRng>(secret: Scalar, degree: usize, rng: &mut R) -> Self {
        let mut coefficients = Vec::with_capacity(degree + 1);
        coefficients.push(secret);
        coefficients.extend((0..degree).map(|_| Scalar::random(&mut *rng)));
        Self { coefficients }
    }

    /// Evaluate with Horner's rule
    pub fn evaluate(&self, x: &Scalar) -> Scalar {
        self.coefficients
            .iter()
            .rev()
            .fold(Scalar::ZERO, |acc, coefficient| acc * x + coefficient)
    }
}

impl Drop for Polynomial {
    fn drop(&mut self) {
        for coefficient in self.coefficients.iter_mut() {
            *coefficient = Scalar::ZERO;
        }
        compiler_fence(Ordering::SeqCst);
    }
}

/// Lagrange basis coefficients `λ_i(x)` for the evaluation points `xs`
pub(crate) fn lagrange_coefficients(xs: &[Scalar], x: &Scalar) -> Result<Vec<Scalar>, SplitError> {
    xs.iter()
        .enumerate()
        .map(|(i, x_i)| {
            let (numerator, denominator) = xs.iter().enumerate().filter(|(j, _)| *j != i).fold(
                (Scalar::ONE, Scalar::ONE),
                |(num, den), (_, x_j)| (num * (x - x_j), den * (x_i - x_j)),
            );
            let inverse = Option::<Scalar>::from(denominator.invert()).ok_or_else(|| {
                SplitError::InvalidSecret("Evaluation points are not distinct".to_string())
            })?;
            Ok(numerator * inverse)
        })
        .collect()
}

#[cfg(test)]
mod polynomial_tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_constant_term_is_secret() {
        let secret = Scalar::from(1234u64);
        let polynomial = Polynomial::random(secret, 3, &mut OsRng);
        assert_eq!(polynomial.evaluate(&Scalar::ZERO), secret);
    }

    #[test]
    fn test_evaluate() {
        // 5 + 3x + 2x^2
        let polynomial = Polynomial {
            coefficients: vec![Scalar::from(5u64), Scalar::from(3u64), Scalar::from(2u64)],
        };
        assert_eq!(polynomial.evaluate(&Scalar::from(1u64)), Scalar::from(10u64));
        assert_eq!(polynomial.evaluate(&Scalar::from(4u64)), Scalar::from(49u64));
    }

    #[test]
    fn test_interpolation_recovers_polynomial() {
        let polynomial = Polynomial::random(Scalar::from(99u64), 2, &mut OsRng);
        let xs: Vec<Scalar> = [3u64, 8, 11].into_iter().map(Scalar::from).collect();
        let ys: Vec<Scalar> = xs.iter().map(|x| polynomial.evaluate(x)).collect();

        for target in [0u64, 1, 42] {
            let target = Scalar::from(target);
            let lambdas = lagrange_coefficients(&xs, &target).unwrap();
            let interpolated = lambdas
                .iter()
                .zip(&ys)
                .fold(Scalar::ZERO, |acc, (l, y)| acc + l * y);
            assert_eq!(interpolated, polynomial.evaluate(&target));
        }
    }

    #[test]
    fn test_repeated_points_are_rejected() {
        let xs = [Scalar::from(1u64), Scalar::from(1u64)];
        assert!(lagrange_coefficients(&xs, &Scalar::ZERO).is_err());
    }
}
