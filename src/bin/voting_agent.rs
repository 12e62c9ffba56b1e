//! Standalone voting agent.
//!
//! Receives lifecycle events over Redis, keeps its own feedback buffer fed
//! from stdin (one message per line) and votes with its own signing key.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::watch;

use dao_sentiment::adapters::events::{ChannelEventBus, RedisEventPublisher, RedisEventRelay};
use dao_sentiment::adapters::ledger::build_gateway;
use dao_sentiment::adapters::scoring::ProcessScorer;
use dao_sentiment::application::{
    DecisionEngine, MessageIntake, RetryPolicy, VotingAgent, AGENT_EVENT_TYPES,
};
use dao_sentiment::config::{AppConfig, ValidationError};
use dao_sentiment::domain::feedback::MessageCollector;
use dao_sentiment::domain::foundation::AgentId;
use dao_sentiment::ports::{EventPublisher, EventSubscriber};
use dao_sentiment::telemetry::init_tracing;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server)?;
    config.validate()?;

    let redis_url = config
        .redis
        .url
        .as_deref()
        .ok_or(ValidationError::MissingRequired("REDIS__URL"))?;
    let id = match config.agent.agent_id.as_deref() {
        Some(id) => AgentId::new(id)?,
        None => AgentId::generate(),
    };
    let retry = RetryPolicy::from_config(&config.retry);
    let ledger = build_gateway(&config.ledger)?;

    let publisher: Arc<dyn EventPublisher> = Arc::new(
        RedisEventPublisher::connect(redis_url, config.redis.channel.clone(), id.to_string())
            .await?,
    );

    let collector = Arc::new(MessageCollector::new(config.agent.buffer_capacity));
    let engine = Arc::new(DecisionEngine::new(
        Arc::new(ProcessScorer::from_config(&config.scorer)),
        config.agent.thresholds,
        config.scorer.timeout(),
        retry,
    ));
    let (intake, intake_task) =
        MessageIntake::spawn(vec![collector.clone()], config.agent.intake_capacity);
    let agent = Arc::new(
        VotingAgent::new(
            id.clone(),
            collector,
            engine,
            ledger.clone(),
            publisher,
            config.agent.vote_codes,
            retry,
        )
        .with_intake(intake.clone()),
    );

    let bus = Arc::new(ChannelEventBus::new());
    bus.subscribe_all(AGENT_EVENT_TYPES, agent);

    let stdin_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if let Err(e) = intake.submit(line).await {
                tracing::warn!(error = %e, "Feedback dropped");
                break;
            }
        }
        tracing::debug!("Feedback input closed");
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        }
        shutdown_tx.send(true).ok();
    });

    tracing::info!(
        agent = %id,
        signer = %ledger.signer_address(),
        channel = %config.redis.channel,
        "Voting agent listening"
    );

    let relay = RedisEventRelay::new(redis_url, config.redis.channel.clone(), id.to_string())?;
    let result = relay.run(bus, shutdown_rx).await;

    stdin_task.abort();
    intake_task.abort();
    result?;
    tracing::info!(agent = %id, "Voting agent stopped");
    Ok(())
}
