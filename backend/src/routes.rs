use std::sync::Arc;
use rocket::{State, get, post, put, delete, http::Status, serde::json::Json};
use tracing::instrument;
use shared::{
    models::*, user_info::UserInfo, CoreError,
};
use crate::{
    auth::AdminToken,
    config::AppConfig,
    error::ApiError,
    processor::BallotProcessor,
    rate_limiter::RateLimiter,
    session::SessionGuard,
    store::Store,
};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionGuard>,
    pub identity_limiter: RateLimiter,
    pub ballot_limiter: RateLimiter,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            sessions: Arc::new(SessionGuard::new(config.session_ttl_minutes)),
            identity_limiter: RateLimiter::new(config.identity_rate_limit, config.identity_rate_window_minutes),
            ballot_limiter: RateLimiter::new(config.ballot_rate_limit, config.ballot_rate_window_minutes),
            config,
        }
    }
}

#[get("/candidates")]
pub async fn list_candidates(state: &State<AppState>) -> Result<Json<Vec<Candidate>>, ApiError> {
    Ok(Json(BallotProcessor::list_candidates(state.store.as_ref()).await?))
}

#[instrument(skip_all, fields(ip = %user_info.ip))]
#[post("/identity", format = "json", data = "<request>")]
pub async fn resolve_identity(
    state: &State<AppState>,
    request: Json<ResolveIdentityRequest>,
    user_info: UserInfo,
) -> Result<Json<ResolvedIdentity>, ApiError> {
    state.identity_limiter.check_rate_limit(&format!("identity:{}", user_info.ip))?;

    let claim = BallotProcessor::claim_from_request(request.into_inner());
    let voter_id = BallotProcessor::resolve_identity(state.store.as_ref(), claim).await?;
    let session_token = state.sessions.issue(voter_id)?;

    Ok(Json(ResolvedIdentity { voter_id, session_token }))
}

#[instrument(skip_all, fields(ip = %user_info.ip))]
#[post("/ballot", format = "json", data = "<ballot>")]
pub async fn submit_ballot(
    state: &State<AppState>,
    ballot: Json<SubmitBallotRequest>,
    user_info: UserInfo,
) -> Result<Json<BallotReceipt>, ApiError> {
    state.ballot_limiter.check_rate_limit(&format!("ballot:{}", user_info.ip))?;

    let ballot = ballot.into_inner();
    let voter_id = state.sessions.voter_for(&ballot.session_token)?;

    match BallotProcessor::submit_ballot(state.store.as_ref(), voter_id, &ballot.candidate_ids).await {
        Ok(receipt) => {
            state.sessions.revoke(&ballot.session_token);
            Ok(Json(receipt))
        }
        Err(e @ CoreError::AlreadyVoted(_)) => {
            state.sessions.revoke(&ballot.session_token);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[get("/results")]
pub async fn get_results(state: &State<AppState>) -> Result<Json<TallyResult>, ApiError> {
    Ok(Json(BallotProcessor::get_results(state.store.as_ref()).await?))
}

#[get("/voters")]
pub async fn list_voted_voters(state: &State<AppState>) -> Result<Json<Vec<VotedVoter>>, ApiError> {
    Ok(Json(BallotProcessor::list_voted_voters(state.store.as_ref()).await?))
}

#[post("/admin/candidates", format = "json", data = "<candidate>")]
pub async fn add_candidate(
    _admin: AdminToken,
    state: &State<AppState>,
    candidate: Json<NewCandidate>,
) -> Result<(Status, Json<Candidate>), ApiError> {
    let created = BallotProcessor::add_candidate(state.store.as_ref(), candidate.into_inner()).await?;
    Ok((Status::Created, Json(created)))
}

#[put("/admin/candidates/<id>", format = "json", data = "<candidate>")]
pub async fn update_candidate(
    _admin: AdminToken,
    state: &State<AppState>,
    id: i64,
    candidate: Json<NewCandidate>,
) -> Result<Json<Candidate>, ApiError> {
    BallotProcessor::update_candidate(state.store.as_ref(), id, candidate.into_inner())
        .await?
        .map(Json)
        .ok_or(ApiError::CandidateNotFound(id))
}

#[delete("/admin/candidates/<id>")]
pub async fn delete_candidate(
    _admin: AdminToken,
    state: &State<AppState>,
    id: i64,
) -> Result<Status, ApiError> {
    if BallotProcessor::delete_candidate(state.store.as_ref(), id).await? {
        Ok(Status::NoContent)
    } else {
        Err(ApiError::CandidateNotFound(id))
    }
}

#[post("/admin/reset")]
pub async fn reset_election(_admin: AdminToken, state: &State<AppState>) -> Result<Status, ApiError> {
    BallotProcessor::reset_election(state.store.as_ref()).await?;
    Ok(Status::NoContent)
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}
