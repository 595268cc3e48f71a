#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use tracing_subscriber::EnvFilter;
use zkat_core::htlc::claim_message;
use zkat_core::identity::certificate::Certificate;
use zkat_core::{
    ActionInput, ClaimSignature, FixedClock, IssueAction, IssueProof, PublicParams, Token,
    TokenRequest, TokenWitness, TransferAction, TransferProof, Validator,
};

pub const PRECISION: u8 = 16;
pub const TX_ID: &str = "tx-0001";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn params() -> PublicParams {
    PublicParams::setup(PRECISION).unwrap()
}

pub fn validator(params: PublicParams, now: u64) -> Validator {
    Validator::builder(Arc::new(params))
        .clock(Arc::new(FixedClock(now)))
        .build()
        .unwrap()
}

/// A certificate holder.
pub struct Party {
    pub key: SigningKey,
    pub identity: Vec<u8>,
}

impl Party {
    pub fn new() -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let identity = Certificate::ed25519(&key.verifying_key()).to_identity().unwrap();
        Self { key, identity }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key.sign(message).to_bytes().to_vec()
    }
}

/// A token together with its opening.
#[derive(Clone)]
pub struct Minted {
    pub token: Token,
    pub witness: TokenWitness,
}

fn mint(params: &PublicParams, token_type: &str, outputs: &[(Vec<u8>, u64)]) -> Vec<Minted> {
    let gens = params.commitment_generators().unwrap();
    outputs
        .iter()
        .map(|(owner, value)| {
            let witness = TokenWitness::new(token_type, *value, &mut OsRng);
            let token = Token::new(owner.clone(), witness.commitment(&gens).unwrap());
            Minted { token, witness }
        })
        .collect()
}

/// An issue of `token_type` with a valid proof.
pub fn issue(
    params: &PublicParams,
    issuer: &Party,
    token_type: &str,
    outputs: &[(Vec<u8>, u64)],
) -> (IssueAction, Vec<Minted>) {
    let minted = mint(params, token_type, outputs);
    let witnesses: Vec<_> = minted.iter().map(|m| m.witness.clone()).collect();
    let proof = IssueProof::prove(params, &witnesses, &mut OsRng).unwrap();
    let action = IssueAction {
        issuer: issuer.identity.clone(),
        outputs: minted.iter().map(|m| m.token.clone()).collect(),
        proof: proof.to_bytes().unwrap(),
        metadata: BTreeMap::new(),
    };
    (action, minted)
}

/// A transfer spending `inputs` into `outputs` with a valid proof.
pub fn transfer(
    params: &PublicParams,
    inputs: &[&Minted],
    outputs: &[(Vec<u8>, u64)],
) -> (TransferAction, Vec<Minted>) {
    let token_type = inputs[0].witness.token_type.clone();
    let minted = mint(params, &token_type, outputs);
    let in_w: Vec<_> = inputs.iter().map(|m| m.witness.clone()).collect();
    let out_w: Vec<_> = minted.iter().map(|m| m.witness.clone()).collect();
    let proof = TransferProof::prove(params, &in_w, &out_w, &mut OsRng).unwrap();
    let action = TransferAction {
        inputs: inputs
            .iter()
            .map(|m| ActionInput::new(m.token.clone()))
            .collect(),
        outputs: minted.iter().map(|m| m.token.clone()).collect(),
        issuer: None,
        proof: proof.to_bytes().unwrap(),
        metadata: BTreeMap::new(),
    };
    (action, minted)
}

/// Who produces each request signature, in request order.
pub enum Signer<'a> {
    Party(&'a Party),
    /// A script recipient claiming with `preimage`.
    Claim(&'a Party, &'a [u8]),
    Raw(Vec<u8>),
}

impl Signer<'_> {
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Signer::Party(p) => p.sign(message),
            Signer::Claim(recipient, preimage) => ClaimSignature {
                preimage: preimage.to_vec(),
                recipient_signature: recipient.sign(&claim_message(message, preimage)),
            }
            .to_bytes()
            .unwrap(),
            Signer::Raw(bytes) => bytes.clone(),
        }
    }
}

/// Assembles and signs a request over `TX_ID`.
pub fn request(
    issues: &[IssueAction],
    transfers: &[TransferAction],
    signers: &[Signer],
) -> TokenRequest {
    let mut request = TokenRequest {
        issues: issues.iter().map(|a| a.to_bytes().unwrap()).collect(),
        transfers: transfers.iter().map(|a| a.to_bytes().unwrap()).collect(),
        ..Default::default()
    };
    let message = request.message_to_sign(TX_ID).unwrap();
    request.signatures = signers.iter().map(|s| s.sign(&message)).collect();
    request
}
