//! HTTP handlers for DAO endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{LifecycleCoordinator, ManualVote, VotingError};
use crate::domain::foundation::{DomainError, ErrorCode, ObjectId, ProposalId};

use super::dto::{
    CreateProposalRequest, DigestResponse, ErrorResponse, InviteMemberRequest, LifecycleResponse,
    VoteRequest,
};

#[derive(Clone)]
pub struct DaoAppState {
    coordinator: Arc<LifecycleCoordinator>,
}

impl DaoAppState {
    pub fn new(coordinator: Arc<LifecycleCoordinator>) -> Self {
        Self { coordinator }
    }
}

/// Error that renders as an [`ErrorResponse`] with a mapped status.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl From<VotingError> for ApiError {
    fn from(err: VotingError) -> Self {
        Self(err.into())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);
        if status.is_server_error() {
            tracing::warn!(code = %self.0.code, error = %self.0.message, "Request failed");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// Maps error codes to HTTP statuses.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed
        | ErrorCode::EmptyField
        | ErrorCode::OutOfRange
        | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
        ErrorCode::ProposalNotFound | ErrorCode::ObjectNotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidStateTransition | ErrorCode::VoteAlreadyCast => StatusCode::CONFLICT,
        ErrorCode::LedgerRejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::MalformedState
        | ErrorCode::UnsupportedObjectKind
        | ErrorCode::ScoringMalformed => StatusCode::BAD_GATEWAY,
        ErrorCode::LedgerUnavailable | ErrorCode::ScoringUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorCode::EventBusError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn parse_proposal_id(raw: &str) -> Result<ProposalId, ApiError> {
    ProposalId::new(raw).map_err(|e| ApiError(e.into()))
}

fn narrow(field: &str, value: i64) -> Result<u8, ApiError> {
    u8::try_from(value).map_err(|_| {
        ApiError(DomainError::validation(
            field,
            format!("{} must be between 0 and 255, got {}", field, value),
        ))
    })
}

/// GET /dao/state
pub async fn get_dao_state(State(state): State<DaoAppState>) -> Result<Response, ApiError> {
    let dao = state.coordinator.dao_state().await?;
    Ok(Json(dao).into_response())
}

/// POST /dao/proposal
///
/// Answers 200 with `{digest}` like the dashboard expects, plus the
/// resolved `proposalId` when the refresh found it.
pub async fn create_proposal(
    State(state): State<DaoAppState>,
    Json(req): Json<CreateProposalRequest>,
) -> Result<Response, ApiError> {
    let created = state
        .coordinator
        .create_proposal(&req.title, &req.description)
        .await?;
    Ok(Json(created).into_response())
}

/// POST /dao/vote
pub async fn submit_vote(
    State(state): State<DaoAppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Response, ApiError> {
    let proposal_id = parse_proposal_id(&req.proposal_id)?;
    let vote = ManualVote {
        vote_code: narrow("voteCode", req.vote_code)?,
        sentiment: narrow("sentiment", req.sentiment)?,
        confidence: narrow("confidence", req.confidence)?,
    };

    let receipt = state
        .coordinator
        .submit_manual_vote(&proposal_id, vote)
        .await?;
    Ok(Json(DigestResponse {
        digest: receipt.digest,
    })
    .into_response())
}

/// POST /dao/voting/:proposal_id/start
pub async fn start_voting(
    State(state): State<DaoAppState>,
    Path(proposal_id): Path<String>,
) -> Result<Response, ApiError> {
    let proposal_id = parse_proposal_id(&proposal_id)?;
    let transition = state.coordinator.open_voting(&proposal_id).await?;
    Ok(Json(transition).into_response())
}

/// POST /dao/voting/:proposal_id/close
pub async fn close_voting(
    State(state): State<DaoAppState>,
    Path(proposal_id): Path<String>,
) -> Result<Response, ApiError> {
    let proposal_id = parse_proposal_id(&proposal_id)?;
    let transition = state.coordinator.close_voting(&proposal_id).await?;
    Ok(Json(transition).into_response())
}

/// GET /dao/proposals/:proposal_id/lifecycle
pub async fn get_lifecycle(
    State(state): State<DaoAppState>,
    Path(proposal_id): Path<String>,
) -> Result<Response, ApiError> {
    let proposal_id = parse_proposal_id(&proposal_id)?;
    let lifecycle = state.coordinator.lifecycle(&proposal_id).ok_or_else(|| {
        ApiError(DomainError::new(
            ErrorCode::ProposalNotFound,
            format!("Proposal not found: {}", proposal_id),
        ))
    })?;
    Ok(Json(LifecycleResponse::from(lifecycle)).into_response())
}

/// POST /dao/members
pub async fn invite_member(
    State(state): State<DaoAppState>,
    Json(req): Json<InviteMemberRequest>,
) -> Result<Response, ApiError> {
    let address = ObjectId::new(req.address).map_err(|e| ApiError(e.into()))?;
    let receipt = state.coordinator.invite_member(&address).await?;
    Ok(Json(DigestResponse {
        digest: receipt.digest,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::LedgerError;

    #[test]
    fn error_classes_map_to_statuses() {
        assert_eq!(status_for(ErrorCode::EmptyField), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::ProposalNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::InvalidStateTransition), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::LedgerRejected), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorCode::UnsupportedObjectKind), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorCode::LedgerUnavailable), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn ledger_unavailable_renders_503() {
        let response = ApiError::from(VotingError::from(LedgerError::unavailable("down")))
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn narrow_rejects_out_of_range() {
        assert_eq!(narrow("sentiment", 80).unwrap(), 80);
        assert!(narrow("sentiment", 256).is_err());
        assert!(narrow("sentiment", -1).is_err());
    }
}
