//! DAO HTTP adapter.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CreateProposalRequest, DigestResponse, ErrorResponse, InviteMemberRequest, LifecycleResponse,
    VoteRequest,
};
pub use handlers::{status_for, ApiError, DaoAppState};
pub use routes::dao_routes;
