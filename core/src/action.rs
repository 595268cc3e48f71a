//! Issue and transfer actions, and their decoding from a token request.

use std::collections::BTreeMap;

use bincode::{Decode, Encode};

use crate::error::ValidationError;
use crate::group::Commitment;
use crate::request::TokenRequest;
use crate::token::{Token, UpgradeWitness};
use crate::{wire, Result};

/// The two kinds of actions a token request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Issue,
    Transfer,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Issue => f.write_str("issue"),
            Self::Transfer => f.write_str("transfer"),
        }
    }
}

/// A token spent by a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ActionInput {
    pub token: Token,
    /// Plaintext opening, present only when upgrading a legacy token.
    pub upgrade_witness: Option<UpgradeWitness>,
}

impl ActionInput {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            upgrade_witness: None,
        }
    }

    pub fn with_upgrade_witness(mut self, witness: UpgradeWitness) -> Self {
        self.upgrade_witness = Some(witness);
        self
    }
}

/// Creation of new tokens by an issuer.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct IssueAction {
    pub issuer: Vec<u8>,
    pub outputs: Vec<Token>,
    /// Serialized [`IssueProof`](crate::proof::IssueProof).
    pub proof: Vec<u8>,
    pub metadata: BTreeMap<String, Vec<u8>>,
}

impl IssueAction {
    /// Structural checks that need no cryptography beyond point decoding.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Err(ValidationError::InvalidIssueAction(reason.to_string()));
        if self.issuer.is_empty() {
            return invalid("issuer is not set");
        }
        if self.outputs.is_empty() {
            return invalid("no outputs");
        }
        if let Some(i) = self.outputs.iter().position(Token::is_redeemed) {
            return Err(ValidationError::InvalidIssueAction(format!(
                "output {i} has no owner"
            )));
        }
        if let Some(i) = self.outputs.iter().position(|t| t.data.decompress().is_err()) {
            return Err(ValidationError::InvalidIssueAction(format!(
                "output {i} is not a valid commitment"
            )));
        }
        if self.proof.is_empty() {
            return invalid("proof is empty");
        }
        Ok(())
    }

    pub fn output_commitments(&self) -> Vec<Commitment> {
        self.outputs.iter().map(|t| t.data).collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        wire::encode(self).map_err(|e| ValidationError::Encoding(e.to_string()))
    }
}

/// Movement of existing tokens, possibly burning some of them.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferAction {
    pub inputs: Vec<ActionInput>,
    pub outputs: Vec<Token>,
    /// Issuer co-signing a redeem. Absent otherwise.
    pub issuer: Option<Vec<u8>>,
    /// Serialized [`TransferProof`](crate::proof::TransferProof).
    pub proof: Vec<u8>,
    /// Script bookkeeping: lock hashes and claimed preimages.
    pub metadata: BTreeMap<String, Vec<u8>>,
}

impl TransferAction {
    pub fn validate(&self) -> Result<()> {
        if self.outputs.is_empty() {
            return Err(ValidationError::InvalidTransferAction("no outputs".into()));
        }
        let commitments = self
            .inputs
            .iter()
            .map(|i| ("input", &i.token))
            .enumerate()
            .chain(self.outputs.iter().map(|t| ("output", t)).enumerate());
        for (i, (side, token)) in commitments {
            if token.data.decompress().is_err() {
                return Err(ValidationError::InvalidTransferAction(format!(
                    "{side} {i} is not a valid commitment"
                )));
            }
        }
        if self.proof.is_empty() {
            return Err(ValidationError::InvalidTransferAction("proof is empty".into()));
        }
        Ok(())
    }

    /// A transfer burning at least one output.
    pub fn is_redeem(&self) -> bool {
        self.outputs.iter().any(Token::is_redeemed)
    }

    pub fn input_tokens(&self) -> Vec<Token> {
        self.inputs.iter().map(|i| i.token.clone()).collect()
    }

    pub fn input_commitments(&self) -> Vec<Commitment> {
        self.inputs.iter().map(|i| i.token.data).collect()
    }

    pub fn output_commitments(&self) -> Vec<Commitment> {
        self.outputs.iter().map(|t| t.data).collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        wire::encode(self).map_err(|e| ValidationError::Encoding(e.to_string()))
    }
}

/// Decodes every serialized action of `request`, all or nothing.
pub fn deserialize_actions(
    request: &TokenRequest,
) -> Result<(Vec<IssueAction>, Vec<TransferAction>)> {
    let issues = decode_all(ActionKind::Issue, &request.issues)?;
    let transfers = decode_all(ActionKind::Transfer, &request.transfers)?;
    Ok((issues, transfers))
}

fn decode_all<T: Decode<()>>(kind: ActionKind, raw: &[Vec<u8>]) -> Result<Vec<T>> {
    raw.iter()
        .enumerate()
        .map(|(index, bytes)| {
            wire::decode(bytes).map_err(|e| ValidationError::MalformedAction {
                kind,
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use k256::ProjectivePoint;

    use super::*;
    use crate::group::CompressedPoint;

    fn commitment(n: u64) -> Commitment {
        CompressedPoint::from_point(&(ProjectivePoint::GENERATOR * k256::Scalar::from(n))).unwrap()
    }

    fn issue() -> IssueAction {
        IssueAction {
            issuer: b"issuer".to_vec(),
            outputs: vec![Token::new(b"alice".to_vec(), commitment(1))],
            proof: vec![1],
            metadata: BTreeMap::new(),
        }
    }

    fn transfer() -> TransferAction {
        TransferAction {
            inputs: vec![ActionInput::new(Token::new(b"alice".to_vec(), commitment(1)))],
            outputs: vec![Token::new(b"bob".to_vec(), commitment(2))],
            issuer: None,
            proof: vec![1],
            metadata: BTreeMap::new(),
        }
    }

    fn off_curve() -> Commitment {
        let mut bytes = [0xffu8; 33];
        bytes[0] = 0x02;
        CompressedPoint(bytes)
    }

    #[test]
    fn issue_structure() {
        assert!(issue().validate().is_ok());

        let mut a = issue();
        a.issuer.clear();
        assert!(matches!(a.validate(), Err(ValidationError::InvalidIssueAction(_))));

        let mut a = issue();
        a.outputs.clear();
        assert!(a.validate().is_err());

        let mut a = issue();
        a.outputs[0].owner.clear();
        assert!(a.validate().is_err());

        let mut a = issue();
        a.outputs[0].data = off_curve();
        assert!(a.validate().is_err());

        let mut a = issue();
        a.proof.clear();
        assert!(a.validate().is_err());
    }

    #[test]
    fn transfer_structure() {
        assert!(transfer().validate().is_ok());
        assert!(!transfer().is_redeem());

        let mut t = transfer();
        t.outputs[0].owner.clear();
        assert!(t.validate().is_ok());
        assert!(t.is_redeem());

        let mut t = transfer();
        t.outputs.clear();
        assert!(matches!(t.validate(), Err(ValidationError::InvalidTransferAction(_))));

        let mut t = transfer();
        t.inputs[0].token.data = off_curve();
        assert_eq!(
            t.validate(),
            Err(ValidationError::InvalidTransferAction(
                "input 0 is not a valid commitment".into()
            ))
        );

        let mut t = transfer();
        t.proof.clear();
        assert!(t.validate().is_err());
    }

    #[test]
    fn deserialize_reports_failing_index() {
        let request = TokenRequest {
            issues: vec![issue().to_bytes().unwrap()],
            transfers: vec![transfer().to_bytes().unwrap(), vec![0xde, 0xad]],
            ..Default::default()
        };
        assert!(matches!(
            deserialize_actions(&request),
            Err(ValidationError::MalformedAction {
                kind: ActionKind::Transfer,
                index: 1,
                ..
            })
        ));

        let request = TokenRequest {
            issues: vec![issue().to_bytes().unwrap()],
            transfers: vec![transfer().to_bytes().unwrap()],
            ..Default::default()
        };
        let (issues, transfers) = deserialize_actions(&request).unwrap();
        assert_eq!(issues, vec![issue()]);
        assert_eq!(transfers, vec![transfer()]);
    }
}
