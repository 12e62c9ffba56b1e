//! HTTP routes for DAO endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    close_voting, create_proposal, get_dao_state, get_lifecycle, invite_member, start_voting,
    submit_vote, DaoAppState,
};

pub fn dao_routes(state: DaoAppState) -> Router {
    Router::new()
        .route("/dao/state", get(get_dao_state))
        .route("/dao/proposal", post(create_proposal))
        .route("/dao/vote", post(submit_vote))
        .route("/dao/voting/:proposal_id/start", post(start_voting))
        .route("/dao/voting/:proposal_id/close", post(close_voting))
        .route("/dao/proposals/:proposal_id/lifecycle", get(get_lifecycle))
        .route("/dao/members", post(invite_member))
        .with_state(state)
}
