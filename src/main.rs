//! DAO sentiment server: lifecycle API, dashboard feed and hosted agents.

use std::sync::Arc;

use http::HeaderValue;
use tokio::signal;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use dao_sentiment::adapters::events::{
    ChannelEventBus, FanoutPublisher, RedisEventPublisher, RedisEventRelay,
};
use dao_sentiment::adapters::http::app_router;
use dao_sentiment::adapters::ledger::build_gateways;
use dao_sentiment::adapters::scoring::ProcessScorer;
use dao_sentiment::adapters::websocket::{DashboardEventBridge, DashboardHub};
use dao_sentiment::application::{
    ChatIngress, DecisionEngine, LifecycleCoordinator, MessageIntake, RetryPolicy, VotingAgent,
    AGENT_EVENT_TYPES,
};
use dao_sentiment::config::AppConfig;
use dao_sentiment::domain::feedback::MessageCollector;
use dao_sentiment::domain::foundation::AgentId;
use dao_sentiment::domain::proposal::events::VOTE_SUBMITTED;
use dao_sentiment::ports::{EventPublisher, EventSubscriber};
use dao_sentiment::telemetry::init_tracing;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server)?;
    config.validate()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let retry = RetryPolicy::from_config(&config.retry);
    let ledgers = build_gateways(&config.ledger, config.agent.agent_count)?;

    // Local bus; Redis extends it across processes when configured.
    let bus = Arc::new(ChannelEventBus::new());
    let origin = format!("server-{}", Uuid::new_v4().simple());
    let publisher: Arc<dyn EventPublisher> = match &config.redis.url {
        Some(url) => {
            let redis =
                RedisEventPublisher::connect(url, config.redis.channel.clone(), origin.clone())
                    .await?;
            let relay = RedisEventRelay::new(url, config.redis.channel.clone(), origin.clone())?;
            let local: Arc<dyn EventPublisher> = bus.clone();
            let relay_shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                if let Err(e) = relay.run(local, relay_shutdown).await {
                    tracing::error!(error = %e, "Redis relay stopped");
                }
            });
            let targets: Vec<Arc<dyn EventPublisher>> = vec![bus.clone(), Arc::new(redis)];
            Arc::new(FanoutPublisher::new(targets))
        }
        None => bus.clone(),
    };

    // Chat feedback lands in the coordinator's collector and reaches every
    // agent inside voting_started.
    let collector = Arc::new(MessageCollector::new(config.agent.buffer_capacity));
    let (intake, intake_task) =
        MessageIntake::spawn(vec![collector.clone()], config.agent.intake_capacity);
    let coordinator = Arc::new(
        LifecycleCoordinator::new(ledgers.coordinator.clone(), publisher.clone(), retry)
            .with_collector(collector)
            .with_intake(intake.clone())
            .with_vote_codes(config.agent.vote_codes),
    );
    bus.subscribe(VOTE_SUBMITTED, coordinator.clone());

    let scorer = Arc::new(ProcessScorer::from_config(&config.scorer));
    let engine = Arc::new(DecisionEngine::new(
        scorer,
        config.agent.thresholds,
        config.scorer.timeout(),
        retry,
    ));

    for (index, ledger) in ledgers.agents.into_iter().enumerate() {
        let id = agent_id(config.agent.agent_id.as_deref(), index)?;
        let agent = Arc::new(VotingAgent::new(
            id.clone(),
            Arc::new(MessageCollector::new(config.agent.buffer_capacity)),
            engine.clone(),
            ledger,
            publisher.clone(),
            config.agent.vote_codes,
            retry,
        ));
        bus.subscribe_all(AGENT_EVENT_TYPES, agent);
        tracing::info!(agent = %id, "Voting agent started");
    }

    let hub = Arc::new(DashboardHub::default());
    DashboardEventBridge::new_shared(hub.clone()).register(bus.as_ref());

    let ingress = Arc::new(ChatIngress::new(intake, coordinator.clone()));

    let app = app_router(coordinator, ingress, hub)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server.cors_origins_list()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        environment = ?config.server.environment,
        redis = config.redis.is_enabled(),
        "DAO sentiment server listening"
    );

    let server_shutdown = {
        let mut rx = shutdown_rx.clone();
        async move {
            rx.changed().await.ok();
            tracing::info!("Shutting down gracefully");
        }
    };
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        }
        shutdown_tx.send(true).ok();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(server_shutdown)
        .await?;

    intake_task.abort();
    Ok(())
}

/// A configured id names a single agent; further agents get a suffix.
fn agent_id(configured: Option<&str>, index: usize) -> Result<AgentId, BoxError> {
    let id = match (configured, index) {
        (Some(base), 0) => AgentId::new(base)?,
        (Some(base), n) => AgentId::new(format!("{}-{}", base, n + 1))?,
        (None, _) => AgentId::generate(),
    };
    Ok(id)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
