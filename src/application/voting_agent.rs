//! Voting agent: turns `voting_started` into one on-chain vote.
//!
//! Each agent owns its collector, its ledger credential (through its own
//! gateway) and its own subscription. For every round it runs, strictly in
//! order: claim, drain, decide, submit, record, publish.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::decision::VoteCodeMapping;
use crate::domain::feedback::{MessageBatch, MessageCollector};
use crate::domain::foundation::{AgentId, DomainError, EventEnvelope, EventId, Timestamp};
use crate::domain::proposal::events::{VOTING_CLOSED, VOTING_STARTED};
use crate::domain::proposal::{Ballot, VoteRecord, VoteSubmitted, VotingClosed, VotingStarted};
use crate::ports::{EventHandler, EventPublisher, LedgerGateway};

use super::chat_ingress::MessageIntake;
use super::decision_engine::DecisionEngine;
use super::errors::VotingError;
use super::retry::RetryPolicy;
use super::vote_registry::{Claim, VoteRegistry};

/// Event types an agent subscribes to.
pub const AGENT_EVENT_TYPES: &[&str] = &[VOTING_STARTED, VOTING_CLOSED];

/// Result of handling one `voting_started` delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    Cast(VoteRecord),
    /// Another delivery already claimed this round for the agent.
    AlreadyClaimed,
    /// The round is closed or a newer one is already being voted on.
    Stale,
}

pub struct VotingAgent {
    id: AgentId,
    collector: Arc<MessageCollector>,
    intake: Option<MessageIntake>,
    engine: Arc<DecisionEngine>,
    ledger: Arc<dyn LedgerGateway>,
    publisher: Arc<dyn EventPublisher>,
    mapping: VoteCodeMapping,
    retry: RetryPolicy,
    registry: VoteRegistry,
}

impl VotingAgent {
    pub fn new(
        id: AgentId,
        collector: Arc<MessageCollector>,
        engine: Arc<DecisionEngine>,
        ledger: Arc<dyn LedgerGateway>,
        publisher: Arc<dyn EventPublisher>,
        mapping: VoteCodeMapping,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            id,
            collector,
            intake: None,
            engine,
            ledger,
            publisher,
            mapping,
            retry,
            registry: VoteRegistry::new(),
        }
    }

    /// Intake feeding the agent's collector; drained only after it catches up.
    pub fn with_intake(mut self, intake: MessageIntake) -> Self {
        self.intake = Some(intake);
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn collector(&self) -> &Arc<MessageCollector> {
        &self.collector
    }

    pub fn registry(&self) -> &VoteRegistry {
        &self.registry
    }

    /// Decides and votes once per claimed round.
    pub async fn on_voting_started(&self, event: VotingStarted) -> Result<VoteOutcome, VotingError> {
        let proposal_id = event.proposal_id.clone();
        let round = event.round;
        match self.registry.try_claim(&proposal_id, &self.id, round) {
            Claim::Taken => {}
            Claim::Duplicate => {
                tracing::debug!(
                    agent = %self.id,
                    proposal_id = %proposal_id,
                    round,
                    "Duplicate voting_started ignored"
                );
                return Ok(VoteOutcome::AlreadyClaimed);
            }
            Claim::Stale => {
                tracing::info!(
                    agent = %self.id,
                    proposal_id = %proposal_id,
                    round,
                    "Stale voting_started ignored"
                );
                return Ok(VoteOutcome::Stale);
            }
        }

        match self.vote(event).await {
            Ok(record) => {
                self.registry
                    .mark_cast(&proposal_id, &self.id, record.round, &record.ledger_digest);
                self.announce(&record).await;
                Ok(VoteOutcome::Cast(record))
            }
            Err(err) => {
                self.registry.release(&proposal_id, &self.id, round);
                tracing::warn!(
                    agent = %self.id,
                    proposal_id = %proposal_id,
                    error = %err,
                    "Vote failed; claim released"
                );
                Err(err)
            }
        }
    }

    /// Closes the round's claims; a reopened round votes afresh.
    pub fn on_voting_closed(&self, event: &VotingClosed) {
        let cleared = self.registry.close_round(&event.proposal_id, event.round);
        tracing::debug!(
            agent = %self.id,
            proposal_id = %event.proposal_id,
            round = event.round,
            cleared,
            "Round closed"
        );
    }

    async fn vote(&self, event: VotingStarted) -> Result<VoteRecord, VotingError> {
        if let Some(intake) = &self.intake {
            if let Err(e) = intake.flush().await {
                tracing::warn!(agent = %self.id, error = %e, "Message intake flush failed");
            }
        }
        let own = self.collector.drain_and_reset();
        let batch = MessageBatch::new(event.messages).merge_bounded(own, self.collector.capacity());

        let result = self.engine.decide(&batch).await?;
        let vote = self.engine.vote_for(&result);
        let ballot = Ballot::from_decision(event.proposal_id.clone(), vote, &result, &self.mapping);

        let receipt = self
            .retry
            .run("vote", || self.ledger.submit_vote(&ballot))
            .await?;

        tracing::info!(
            agent = %self.id,
            proposal_id = %ballot.proposal_id,
            round = event.round,
            vote = %vote,
            score = ballot.scaled_score.value(),
            confidence = ballot.scaled_confidence.value(),
            messages = batch.len(),
            digest = %receipt.digest,
            "Vote submitted"
        );

        Ok(VoteRecord {
            proposal_id: ballot.proposal_id,
            agent_id: self.id.clone(),
            round: event.round,
            vote,
            scaled_score: ballot.scaled_score,
            scaled_confidence: ballot.scaled_confidence,
            submitted_at: Timestamp::now(),
            ledger_digest: receipt.digest,
        })
    }

    /// The vote is on the ledger already; a publish failure only loses the
    /// notification.
    async fn announce(&self, record: &VoteRecord) {
        let event = VoteSubmitted {
            event_id: EventId::new(),
            proposal_id: record.proposal_id.clone(),
            agent_id: record.agent_id.clone(),
            round: record.round,
            vote: record.vote,
            vote_code: self.mapping.encode(record.vote),
            scaled_score: record.scaled_score,
            scaled_confidence: record.scaled_confidence,
            digest: record.ledger_digest.clone(),
            submitted_at: record.submitted_at,
        };

        let published = match EventEnvelope::from_event(&event) {
            Ok(envelope) => self.publisher.publish(envelope.with_source(self.id.to_string())).await,
            Err(e) => Err(e),
        };
        if let Err(e) = published {
            tracing::warn!(agent = %self.id, error = %e, "Failed to publish vote_submitted");
        }
    }
}

#[async_trait]
impl EventHandler for VotingAgent {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        match event.event_type.as_str() {
            VOTING_STARTED => {
                let started: VotingStarted = event.payload_as()?;
                self.on_voting_started(started)
                    .await
                    .map(|_| ())
                    .map_err(DomainError::from)
            }
            VOTING_CLOSED => {
                let closed: VotingClosed = event.payload_as()?;
                self.on_voting_closed(&closed);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "VotingAgent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::ledger::InMemoryLedger;
    use crate::adapters::scoring::MockScorer;
    use crate::domain::decision::{DecisionResult, Thresholds, VoteCode};
    use crate::domain::foundation::{ObjectId, ProposalId};
    use crate::domain::proposal::events::VOTE_SUBMITTED;
    use crate::domain::proposal::{LifecycleStatus, ProposalDraft};
    use crate::ports::LedgerError;
    use std::time::Duration;

    struct Fixture {
        agent: VotingAgent,
        ledger: InMemoryLedger,
        scorer: MockScorer,
        bus: Arc<InMemoryEventBus>,
    }

    async fn fixture(scorer: MockScorer) -> Fixture {
        let ledger = InMemoryLedger::new(ObjectId::new("0xda0").unwrap());
        ledger
            .create_proposal(&ProposalDraft::new("Fund docs", "Pay writers").unwrap())
            .await
            .unwrap();
        ledger.start_voting(&pid()).await.unwrap();

        let fast = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(1));
        let engine = DecisionEngine::new(
            Arc::new(scorer.clone()),
            Thresholds::default(),
            Duration::from_secs(1),
            fast,
        );
        let bus = Arc::new(InMemoryEventBus::new());
        let agent = VotingAgent::new(
            AgentId::new("agent-a").unwrap(),
            Arc::new(MessageCollector::new(3)),
            Arc::new(engine),
            Arc::new(ledger.for_signer("0xa")),
            bus.clone(),
            VoteCodeMapping::default(),
            fast,
        );
        Fixture {
            agent,
            ledger,
            scorer,
            bus,
        }
    }

    fn pid() -> ProposalId {
        ProposalId::new("0").unwrap()
    }

    fn started(messages: &[&str]) -> VotingStarted {
        started_in(1, messages)
    }

    fn started_in(round: u32, messages: &[&str]) -> VotingStarted {
        VotingStarted {
            event_id: EventId::new(),
            proposal_id: pid(),
            round,
            status: LifecycleStatus::VotingOpen,
            messages: messages.iter().map(|m| m.to_string()).collect(),
            digest: "open".to_string(),
            started_at: Timestamp::now(),
        }
    }

    fn positive() -> MockScorer {
        MockScorer::new().always(DecisionResult::new(0.8, 0.9).unwrap())
    }

    #[tokio::test]
    async fn votes_yes_and_publishes_vote_submitted() {
        let f = fixture(positive()).await;

        let outcome = f.agent.on_voting_started(started(&["great"])).await.unwrap();

        let VoteOutcome::Cast(record) = outcome else {
            panic!("expected a cast vote");
        };
        assert_eq!(record.vote, VoteCode::Yes);
        assert_eq!(record.scaled_score.value(), 80);
        assert_eq!(record.scaled_confidence.value(), 90);
        assert_eq!(f.ledger.votes_for(&pid()), 1);

        let published: Vec<VoteSubmitted> = f.bus.payloads_of(VOTE_SUBMITTED);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].vote_code, 2);
        assert_eq!(published[0].digest, record.ledger_digest);
    }

    #[tokio::test]
    async fn duplicate_voting_started_submits_once() {
        let f = fixture(positive()).await;

        f.agent.on_voting_started(started(&["great"])).await.unwrap();
        let second = f.agent.on_voting_started(started(&["great"])).await.unwrap();

        assert_eq!(second, VoteOutcome::AlreadyClaimed);
        assert_eq!(f.ledger.call_count("vote"), 1);
        assert_eq!(f.scorer.call_count(), 1);
    }

    #[tokio::test]
    async fn event_messages_precede_own_messages_and_are_trimmed() {
        let f = fixture(positive()).await;
        f.agent.collector().push("own-1");
        f.agent.collector().push("own-2");

        f.agent.on_voting_started(started(&["ev-1", "ev-2"])).await.unwrap();

        let batch = &f.scorer.batches()[0];
        assert_eq!(batch.messages(), &["ev-2", "own-1", "own-2"]);
        assert!(f.agent.collector().is_empty());
    }

    #[tokio::test]
    async fn queued_feedback_is_collected_before_deciding() {
        let f = fixture(positive()).await;
        let (intake, _task) = MessageIntake::spawn(vec![f.agent.collector().clone()], 4);
        let agent = f.agent.with_intake(intake.clone());

        intake.submit("queued").await.unwrap();
        agent.on_voting_started(started(&[])).await.unwrap();

        assert_eq!(f.scorer.batches()[0].messages(), &["queued"]);
    }

    #[tokio::test]
    async fn empty_round_abstains_without_scoring() {
        let f = fixture(positive()).await;

        let outcome = f.agent.on_voting_started(started(&[])).await.unwrap();

        let VoteOutcome::Cast(record) = outcome else {
            panic!("expected a cast vote");
        };
        assert_eq!(record.vote, VoteCode::Abstain);
        assert_eq!(record.scaled_confidence.value(), 0);
        assert_eq!(f.scorer.call_count(), 0);
    }

    #[tokio::test]
    async fn rejected_vote_releases_the_claim() {
        let f = fixture(positive()).await;
        f.ledger.fail_next(LedgerError::rejected("MoveAbort(4)"));

        let err = f.agent.on_voting_started(started(&["great"])).await.unwrap_err();
        assert!(matches!(err, VotingError::Ledger(LedgerError::Rejected { .. })));
        assert_eq!(f.agent.registry().state(&pid(), f.agent.id()), None);
        assert!(!f.bus.has_event(VOTE_SUBMITTED));

        // Redelivery tries again.
        let retry = f.agent.on_voting_started(started(&["great"])).await.unwrap();
        assert!(matches!(retry, VoteOutcome::Cast(_)));
    }

    #[tokio::test]
    async fn unavailable_ledger_is_retried() {
        let f = fixture(positive()).await;
        f.ledger.fail_next(LedgerError::unavailable("timeout"));

        let outcome = f.agent.on_voting_started(started(&["great"])).await.unwrap();

        assert!(matches!(outcome, VoteOutcome::Cast(_)));
        assert_eq!(f.ledger.call_count("vote"), 2);
    }

    fn closed(round: u32) -> VotingClosed {
        VotingClosed {
            event_id: EventId::new(),
            proposal_id: pid(),
            round,
            digest: "close".to_string(),
            closed_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn voting_closed_allows_next_round() {
        let f = fixture(positive()).await;
        f.agent.on_voting_started(started(&["great"])).await.unwrap();

        f.agent.on_voting_closed(&closed(1));

        assert_eq!(f.agent.registry().try_claim(&pid(), f.agent.id(), 2), Claim::Taken);
    }

    #[tokio::test]
    async fn late_delivery_of_a_closed_round_does_not_take_the_next_round() {
        let f = fixture(positive()).await;
        f.agent.on_voting_started(started_in(1, &["round one"])).await.unwrap();
        f.agent.on_voting_closed(&closed(1));
        f.ledger.close_voting(&pid()).await.unwrap();
        f.ledger.start_voting(&pid()).await.unwrap();

        let stale = f.agent.on_voting_started(started_in(1, &["round one"])).await.unwrap();
        assert_eq!(stale, VoteOutcome::Stale);

        let current = f.agent.on_voting_started(started_in(2, &["round two"])).await.unwrap();
        let VoteOutcome::Cast(record) = current else {
            panic!("expected round 2 to be voted");
        };
        assert_eq!(record.round, 2);
        assert_eq!(f.ledger.call_count("vote"), 2);
        assert_eq!(f.scorer.batches()[1].messages(), &["round two"]);
    }

    #[tokio::test]
    async fn older_round_arriving_after_a_newer_one_is_ignored() {
        let f = fixture(positive()).await;
        f.agent.on_voting_started(started_in(2, &["new"])).await.unwrap();

        let outcome = f.agent.on_voting_started(started_in(1, &["old"])).await.unwrap();

        assert_eq!(outcome, VoteOutcome::Stale);
        assert_eq!(f.ledger.call_count("vote"), 1);
    }

    #[tokio::test]
    async fn handler_decodes_envelopes() {
        let f = fixture(positive()).await;
        let envelope = EventEnvelope::from_event(&started(&["great"])).unwrap();

        f.agent.handle(envelope.clone()).await.unwrap();
        f.agent.handle(envelope).await.unwrap();

        assert_eq!(f.ledger.call_count("vote"), 1);
    }
}
