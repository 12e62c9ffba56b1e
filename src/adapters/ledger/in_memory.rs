//! In-memory ledger with the DAO contract's voting rules.
//!
//! Used by tests and by the `in_memory` backend for local development.
//! Handles created with [`InMemoryLedger::for_signer`] share state but vote
//! with different addresses, mirroring agents that each own a credential.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::foundation::{ObjectId, ProposalId};
use crate::domain::proposal::{Ballot, DaoState, ProposalDraft, ProposalRecord, TransactionReceipt};
use crate::ports::{LedgerError, LedgerGateway};

/// One ledger call, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerCall {
    pub function: &'static str,
    pub signer: String,
    pub proposal_id: Option<ProposalId>,
}

#[derive(Debug)]
struct StoredProposal {
    record: ProposalRecord,
    open: bool,
    round: u32,
    voters: HashSet<(u32, String)>,
}

#[derive(Debug, Default)]
struct LedgerState {
    proposals: Vec<StoredProposal>,
    members: Vec<ObjectId>,
    next_id: u64,
    tx_counter: u64,
    injected: VecDeque<LedgerError>,
    calls: Vec<LedgerCall>,
}

impl LedgerState {
    fn find_mut(&mut self, id: &ProposalId) -> Result<&mut StoredProposal, LedgerError> {
        self.proposals
            .iter_mut()
            .find(|p| &p.record.id == id)
            .ok_or_else(|| LedgerError::rejected_with_code(format!("unknown proposal {}", id), "1"))
    }

    fn receipt(&mut self) -> TransactionReceipt {
        self.tx_counter += 1;
        TransactionReceipt::new(format!("mem-tx-{}", self.tx_counter))
    }
}

/// Process-local ledger.
#[derive(Clone)]
pub struct InMemoryLedger {
    dao_id: ObjectId,
    signer: String,
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new(dao_id: ObjectId) -> Self {
        Self {
            dao_id,
            signer: "0xc0ffee".to_string(),
            state: Arc::new(Mutex::new(LedgerState::default())),
        }
    }

    /// A handle on the same ledger signing as `address`.
    pub fn for_signer(&self, address: impl Into<String>) -> Self {
        Self {
            dao_id: self.dao_id.clone(),
            signer: address.into(),
            state: self.state.clone(),
        }
    }

    /// Makes the next call fail with `error` instead of executing.
    pub fn fail_next(&self, error: LedgerError) {
        self.lock().injected.push_back(error);
    }

    /// Makes the next `count` calls fail with `error`.
    pub fn fail_times(&self, count: usize, error: LedgerError) {
        let mut state = self.lock();
        for _ in 0..count {
            state.injected.push_back(error.clone());
        }
    }

    /// Every call that reached the ledger, including injected failures.
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.lock().calls.clone()
    }

    /// Number of calls to `function`.
    pub fn call_count(&self, function: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.function == function)
            .count()
    }

    /// Votes stored for a proposal across all rounds.
    pub fn votes_for(&self, id: &ProposalId) -> usize {
        self.lock()
            .proposals
            .iter()
            .find(|p| &p.record.id == id)
            .map(|p| p.record.votes.len())
            .unwrap_or(0)
    }

    pub fn members(&self) -> Vec<ObjectId> {
        self.lock().members.clone()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the call and pops an injected failure if one is queued.
    fn begin(
        &self,
        function: &'static str,
        proposal_id: Option<&ProposalId>,
    ) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        let mut state = self.lock();
        state.calls.push(LedgerCall {
            function,
            signer: self.signer.clone(),
            proposal_id: proposal_id.cloned(),
        });
        match state.injected.pop_front() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn get_dao_state(&self, dao_id: &ObjectId) -> Result<DaoState, LedgerError> {
        let state = self.begin("get_object", None)?;
        if dao_id != &self.dao_id {
            return Err(LedgerError::object_not_found(dao_id.as_str()));
        }
        Ok(DaoState {
            dao_id: self.dao_id.clone(),
            next_id: Some(state.next_id.to_string()),
            proposals: state.proposals.iter().map(|p| p.record.clone()).collect(),
        })
    }

    async fn create_proposal(
        &self,
        draft: &ProposalDraft,
    ) -> Result<TransactionReceipt, LedgerError> {
        let mut state = self.begin("create_proposal", None)?;
        let id = ProposalId::new(state.next_id.to_string())
            .map_err(|e| LedgerError::rejected(e.to_string()))?;
        state.next_id += 1;
        state.proposals.push(StoredProposal {
            record: ProposalRecord {
                id,
                title: draft.title().to_string(),
                description: draft.description().to_string(),
                votes: Vec::new(),
                status: Some("created".to_string()),
            },
            open: false,
            round: 0,
            voters: HashSet::new(),
        });
        Ok(state.receipt())
    }

    async fn start_voting(
        &self,
        proposal_id: &ProposalId,
    ) -> Result<TransactionReceipt, LedgerError> {
        let mut state = self.begin("start_voting", Some(proposal_id))?;
        let proposal = state.find_mut(proposal_id)?;
        if proposal.open {
            return Err(LedgerError::rejected_with_code("voting already open", "2"));
        }
        proposal.open = true;
        proposal.round += 1;
        proposal.record.status = Some("open".to_string());
        Ok(state.receipt())
    }

    async fn submit_vote(&self, ballot: &Ballot) -> Result<TransactionReceipt, LedgerError> {
        let mut state = self.begin("vote", Some(&ballot.proposal_id))?;
        let signer = self.signer.clone();
        let proposal = state.find_mut(&ballot.proposal_id)?;
        if !proposal.open {
            return Err(LedgerError::rejected_with_code("voting is not open", "3"));
        }
        if !proposal.voters.insert((proposal.round, signer.clone())) {
            return Err(LedgerError::rejected_with_code("already voted", "4"));
        }
        proposal.record.votes.push(json!({
            "voter": signer,
            "round": proposal.round,
            "vote_code": ballot.vote_code,
            "sentiment": ballot.scaled_score.value(),
            "confidence": ballot.scaled_confidence.value(),
        }));
        Ok(state.receipt())
    }

    async fn close_voting(
        &self,
        proposal_id: &ProposalId,
    ) -> Result<TransactionReceipt, LedgerError> {
        let mut state = self.begin("close_voting", Some(proposal_id))?;
        let proposal = state.find_mut(proposal_id)?;
        if !proposal.open {
            return Err(LedgerError::rejected_with_code("voting is not open", "3"));
        }
        proposal.open = false;
        proposal.record.status = Some("closed".to_string());
        Ok(state.receipt())
    }

    async fn invite_member(&self, address: &ObjectId) -> Result<TransactionReceipt, LedgerError> {
        let mut state = self.begin("invite_member", None)?;
        if state.members.contains(address) {
            return Err(LedgerError::rejected_with_code("already a member", "5"));
        }
        state.members.push(address.clone());
        Ok(state.receipt())
    }

    fn dao_id(&self) -> &ObjectId {
        &self.dao_id
    }

    fn signer_address(&self) -> String {
        self.signer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Percentage, Timestamp};

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::new(ObjectId::new("0xda0").unwrap())
    }

    fn draft() -> ProposalDraft {
        ProposalDraft::new("Fund docs", "Pay writers").unwrap()
    }

    fn ballot(id: &str) -> Ballot {
        Ballot {
            proposal_id: ProposalId::new(id).unwrap(),
            vote_code: 2,
            scaled_score: Percentage::new(80),
            scaled_confidence: Percentage::new(90),
            cast_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn created_proposals_get_sequential_ids() {
        let ledger = ledger();
        ledger.create_proposal(&draft()).await.unwrap();
        ledger.create_proposal(&draft()).await.unwrap();

        let state = ledger.get_dao_state(ledger.dao_id()).await.unwrap();
        let ids: Vec<_> = state.proposals.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1"]);
        assert_eq!(state.next_id.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn vote_requires_open_voting() {
        let ledger = ledger();
        ledger.create_proposal(&draft()).await.unwrap();

        let err = ledger.submit_vote(&ballot("0")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));

        ledger.start_voting(&ProposalId::new("0").unwrap()).await.unwrap();
        ledger.submit_vote(&ballot("0")).await.unwrap();
        assert_eq!(ledger.votes_for(&ProposalId::new("0").unwrap()), 1);
    }

    #[tokio::test]
    async fn same_signer_cannot_vote_twice_per_round() {
        let ledger = ledger();
        ledger.create_proposal(&draft()).await.unwrap();
        let id = ProposalId::new("0").unwrap();
        ledger.start_voting(&id).await.unwrap();

        ledger.submit_vote(&ballot("0")).await.unwrap();
        assert!(ledger.submit_vote(&ballot("0")).await.is_err());

        ledger.for_signer("0xb").submit_vote(&ballot("0")).await.unwrap();
        assert_eq!(ledger.votes_for(&id), 2);
    }

    #[tokio::test]
    async fn vote_after_close_is_rejected() {
        let ledger = ledger();
        ledger.create_proposal(&draft()).await.unwrap();
        let id = ProposalId::new("0").unwrap();
        ledger.start_voting(&id).await.unwrap();
        ledger.close_voting(&id).await.unwrap();

        assert!(ledger.submit_vote(&ballot("0")).await.is_err());
        assert!(ledger.close_voting(&id).await.is_err());
    }

    #[tokio::test]
    async fn unknown_dao_is_not_found() {
        let err = ledger()
            .get_dao_state(&ObjectId::new("0x1").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::object_not_found("0x1"));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let ledger = ledger();
        ledger.fail_times(2, LedgerError::unavailable("down"));

        assert!(ledger.create_proposal(&draft()).await.is_err());
        assert!(ledger.create_proposal(&draft()).await.is_err());
        ledger.create_proposal(&draft()).await.unwrap();
        assert_eq!(ledger.call_count("create_proposal"), 3);
    }

    #[tokio::test]
    async fn invite_member_rejects_duplicates() {
        let ledger = ledger();
        let address = ObjectId::new("0xbeef").unwrap();
        ledger.invite_member(&address).await.unwrap();
        assert!(ledger.invite_member(&address).await.is_err());
        assert_eq!(ledger.members(), vec![address]);
    }
}
