use crate::committee::{threshold, validate_operator_ids};
use crate::polynomial::{lagrange_coefficients, Polynomial};
use crate::SplitError;
use bls12_381_plus::{G1Projective, Scalar};
use group::Group;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use ssv_types::{BlsPublicKey, OperatorId, SecretKey, ValidatorKeyMaterial};
use tracing::{debug, instrument};

/// The plaintext contribution of a single operator. Only lives until it has been encrypted.
#[derive(Debug)]
pub struct SecretShare {
    pub operator_id: OperatorId,
    pub secret: SecretKey,
    pub public_key: BlsPublicKey,
}

/// Split the validator secret into one share per operator.
///
/// Shamir sharing with a random polynomial of degree `t-1` where `t = N - f`, evaluated at each
/// operator id. Any `t` shares reconstruct the secret, fewer reveal nothing about it.
pub fn split(
    key_material: &ValidatorKeyMaterial,
    operator_ids: &[OperatorId],
) -> Result<Vec<SecretShare>, SplitError> {
    split_with_rng(key_material, operator_ids, &mut OsRng)
}

#[instrument(skip_all, fields(operators = operator_ids.len()))]
pub fn split_with_rng<R: RngCore + CryptoRng>(
    key_material: &ValidatorKeyMaterial,
    operator_ids: &[OperatorId],
    rng: &mut R,
) -> Result<Vec<SecretShare>, SplitError> {
    validate_operator_ids(operator_ids)?;

    let threshold = threshold(operator_ids.len());
    let polynomial = Polynomial::random(key_material.secret().to_scalar(), threshold - 1, rng);

    let shares = operator_ids
        .iter()
        .map(|operator_id| {
            let secret = SecretKey::from_scalar(&polynomial.evaluate(&Scalar::from(**operator_id)))
                .map_err(SplitError::InvalidSecret)?;
            let public_key = secret.public_key();
            Ok(SecretShare {
                operator_id: *operator_id,
                secret,
                public_key,
            })
        })
        .collect::<Result<Vec<_>, SplitError>>()?;

    debug!(threshold, "Split validator key into shares");
    Ok(shares)
}

/// Recover the secret from a quorum of shares by interpolating at zero
pub fn reconstruct(shares: &[&SecretShare]) -> Result<SecretKey, SplitError> {
    let xs: Vec<Scalar> = shares
        .iter()
        .map(|share| Scalar::from(*share.operator_id))
        .collect();
    let lambdas = lagrange_coefficients(&xs, &Scalar::ZERO)?;

    let secret = lambdas
        .iter()
        .zip(shares)
        .fold(Scalar::ZERO, |acc, (lambda, share)| {
            acc + lambda * share.secret.to_scalar()
        });
    SecretKey::from_scalar(&secret).map_err(SplitError::InvalidSecret)
}

/// Check share public keys against the validator key without access to any secret.
///
/// Interpolates in G1 over the first quorum of shares; every remaining share must lie on the same
/// polynomial and the value at zero must be the validator public key.
pub fn verify_share_public_keys(
    validator_pubkey: &BlsPublicKey,
    share_pubkeys: &[(OperatorId, BlsPublicKey)],
) -> Result<(), SplitError> {
    let ids: Vec<OperatorId> = share_pubkeys.iter().map(|(id, _)| *id).collect();
    validate_operator_ids(&ids)?;

    let quorum = threshold(share_pubkeys.len());
    let (basis, rest) = share_pubkeys.split_at(quorum);
    let xs: Vec<Scalar> = basis.iter().map(|(id, _)| Scalar::from(**id)).collect();
    let points: Vec<G1Projective> = basis
        .iter()
        .map(|(_, pk)| G1Projective::from(pk.point()))
        .collect();

    let interpolate = |x: Scalar| -> Result<G1Projective, SplitError> {
        let lambdas = lagrange_coefficients(&xs, &x)?;
        Ok(lambdas
            .iter()
            .zip(&points)
            .fold(G1Projective::identity(), |acc, (lambda, point)| {
                acc + point * lambda
            }))
    };

    if interpolate(Scalar::ZERO)? != G1Projective::from(validator_pubkey.point()) {
        return Err(SplitError::InconsistentShares(
            "Share public keys do not interpolate to the validator public key".to_string(),
        ));
    }

    for (id, pk) in rest {
        if interpolate(Scalar::from(**id))? != G1Projective::from(pk.point()) {
            return Err(SplitError::InconsistentShares(format!(
                "Public key of operator {id} is not on the sharing polynomial"
            )));
        }
    }

    Ok(())
}
