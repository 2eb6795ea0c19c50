#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::{Client, LocalResponse};
    use serde_json::json;
    use shared::{
        BallotReceipt, Candidate, CoreError, DeviceSignals, ErrorCode, ErrorResponse,
        IdentityClaim, NewCandidate, ResolveIdentityRequest, ResolvedIdentity, TallyResult,
        ValidationError, VoteChannel, VotedVoter,
    };
    use crate::{
        build_rocket,
        config::AppConfig,
        processor::BallotProcessor,
        routes::AppState,
        store::{MemoryStore, Store},
    };

    const ADMIN_TOKEN: &str = "test-admin-token";

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn claim(name: &str, email: &str, fingerprint: &str) -> IdentityClaim {
        IdentityClaim { name: name.into(), email: email.into(), fingerprint: fingerprint.into() }
    }

    async fn store_with(candidates: &[&str]) -> (MemoryStore, Vec<Candidate>) {
        init_tracing();
        let store = MemoryStore::new();
        let mut created = Vec::new();
        for name in candidates {
            let candidate = NewCandidate { name: name.to_string(), position: "President".into() };
            created.push(store.create_candidate(&candidate).await.unwrap());
        }
        (store, created)
    }

    async fn vote(store: &dyn Store, email: &str, fingerprint: &str, candidate_ids: &[i64]) -> Result<BallotReceipt, CoreError> {
        let voter_id = BallotProcessor::resolve_identity(store, claim("Voter", email, fingerprint)).await?;
        BallotProcessor::submit_ballot(store, voter_id, candidate_ids).await
    }

    fn votes_for(result: &TallyResult, candidate_id: i64) -> i64 {
        result.standings.iter()
            .find(|s| s.candidate.id == candidate_id)
            .map(|s| s.votes)
            .unwrap()
    }

    #[tokio::test]
    async fn test_same_email_keeps_voter_and_refreshes_fingerprint() {
        let (store, _) = store_with(&["Alice"]).await;

        let first = BallotProcessor::resolve_identity(&store, claim("Ada", "ada@x.com", "fp-one")).await.unwrap();
        let second = BallotProcessor::resolve_identity(&store, claim("Ada", "ada@x.com", "fp-two")).await.unwrap();
        assert_eq!(first, second);

        let voter = store.find_voter(first).await.unwrap().unwrap();
        assert_eq!(voter.fingerprint, "fp-two");
        assert!(!voter.has_voted);
        assert_eq!(voter.voted_at, None);
    }

    #[tokio::test]
    async fn test_email_is_case_sensitive() {
        let (store, _) = store_with(&[]).await;
        let lower = BallotProcessor::resolve_identity(&store, claim("Ada", "ada@x.com", "fp")).await.unwrap();
        let upper = BallotProcessor::resolve_identity(&store, claim("Ada", "ADA@x.com", "fp")).await.unwrap();
        assert_ne!(lower, upper);
    }

    #[tokio::test]
    async fn test_resolve_rejects_invalid_input() {
        let (store, _) = store_with(&[]).await;

        for email in ["foo@bar", "foo.bar.com"] {
            assert_eq!(
                BallotProcessor::resolve_identity(&store, claim("Ada", email, "fp")).await,
                Err(CoreError::Validation(ValidationError::InvalidEmail))
            );
        }
        assert_eq!(
            BallotProcessor::resolve_identity(&store, claim("Ada", "foo@bar.com", "")).await,
            Err(CoreError::Validation(ValidationError::MissingFingerprint))
        );
        assert!(BallotProcessor::resolve_identity(&store, claim("Ada", "foo@bar.com", "fp")).await.is_ok());

        let long_fingerprint = "f".repeat(65);
        assert!(BallotProcessor::resolve_identity(&store, claim("Bo", "bo@bar.com", &long_fingerprint)).await.is_ok());
    }

    #[tokio::test]
    async fn test_voter_names_are_not_screened() {
        let (store, _) = store_with(&[]).await;
        for (i, name) in ["Dick Van Dyke", "Dick Cheney"].into_iter().enumerate() {
            let voter_id = BallotProcessor::resolve_identity(&store, claim(name, &format!("v{i}@x.com"), &format!("fp-{i}")))
                .await
                .unwrap();
            assert_eq!(store.find_voter(voter_id).await.unwrap().unwrap().name, name);
        }
    }

    #[tokio::test]
    async fn test_candidate_names_are_screened() {
        let (store, _) = store_with(&[]).await;
        let candidate = NewCandidate { name: "fuck".into(), position: String::new() };
        assert!(matches!(
            BallotProcessor::add_candidate(&store, candidate).await,
            Err(CoreError::Validation(ValidationError::InappropriateName(_)))
        ));
    }

    #[tokio::test]
    async fn test_voted_identity_is_locked_out() {
        let (store, candidates) = store_with(&["Alice", "Bob"]).await;
        let voter_id = BallotProcessor::resolve_identity(&store, claim("V", "v@x.com", "device-v")).await.unwrap();
        BallotProcessor::submit_ballot(&store, voter_id, &[candidates[0].id]).await.unwrap();

        // Same email from a new device.
        assert_eq!(
            BallotProcessor::resolve_identity(&store, claim("V", "v@x.com", "device-w")).await,
            Err(CoreError::AlreadyVoted(VoteChannel::Email))
        );
        // Same device with a new email.
        assert_eq!(
            BallotProcessor::resolve_identity(&store, claim("W", "w@x.com", "device-v")).await,
            Err(CoreError::AlreadyVoted(VoteChannel::Device))
        );
        // Submitting again for the same voter id.
        assert!(matches!(
            BallotProcessor::submit_ballot(&store, voter_id, &[candidates[1].id]).await,
            Err(CoreError::AlreadyVoted(_))
        ));

        let result = BallotProcessor::get_results(&store).await.unwrap();
        assert_eq!(result.total_voters_voted, 1);
        assert_eq!(result.total_entries, 1);
    }

    #[tokio::test]
    async fn test_empty_ballot_leaves_state_untouched() {
        let (store, _) = store_with(&["Alice"]).await;
        let voter_id = BallotProcessor::resolve_identity(&store, claim("V", "v@x.com", "fp")).await.unwrap();
        let before = BallotProcessor::get_results(&store).await.unwrap();

        assert_eq!(
            BallotProcessor::submit_ballot(&store, voter_id, &[]).await,
            Err(CoreError::Validation(ValidationError::EmptyBallot))
        );

        assert_eq!(BallotProcessor::get_results(&store).await.unwrap(), before);
        assert!(!store.find_voter(voter_id).await.unwrap().unwrap().has_voted);
    }

    #[tokio::test]
    async fn test_unknown_voter_and_candidate() {
        let (store, candidates) = store_with(&["Alice"]).await;
        assert_eq!(
            BallotProcessor::submit_ballot(&store, 999, &[candidates[0].id]).await,
            Err(CoreError::Validation(ValidationError::UnknownVoter(999)))
        );

        let voter_id = BallotProcessor::resolve_identity(&store, claim("V", "v@x.com", "fp")).await.unwrap();
        assert_eq!(
            BallotProcessor::submit_ballot(&store, voter_id, &[candidates[0].id, 42]).await,
            Err(CoreError::Validation(ValidationError::UnknownCandidate(42)))
        );

        // Nothing was written, so the voter can still vote.
        let result = BallotProcessor::get_results(&store).await.unwrap();
        assert_eq!(result.total_entries, 0);
        assert!(BallotProcessor::submit_ballot(&store, voter_id, &[candidates[0].id]).await.is_ok());
    }

    #[tokio::test]
    async fn test_ballot_counts_every_selected_candidate() {
        let (store, c) = store_with(&["C1", "C2", "C3"]).await;
        let receipt = vote(&store, "v@x.com", "fp", &[c[0].id, c[2].id]).await.unwrap();
        assert_eq!(receipt.entries, 2);

        let result = BallotProcessor::get_results(&store).await.unwrap();
        assert_eq!(votes_for(&result, c[0].id), 1);
        assert_eq!(votes_for(&result, c[1].id), 0);
        assert_eq!(votes_for(&result, c[2].id), 1);
        assert_eq!(result.total_voters_voted, 1);

        let voter = store.find_voter(receipt.voter_id).await.unwrap().unwrap();
        assert!(voter.has_voted);
        assert_eq!(voter.voted_at, Some(receipt.voted_at));
    }

    #[tokio::test]
    async fn test_duplicate_selections_are_recorded_as_submitted() {
        let (store, c) = store_with(&["Alice", "Bob"]).await;
        vote(&store, "v@x.com", "fp", &[c[1].id, c[1].id]).await.unwrap();

        let result = BallotProcessor::get_results(&store).await.unwrap();
        assert_eq!(votes_for(&result, c[1].id), 2);
        assert_eq!(result.total_voters_voted, 1);
    }

    #[tokio::test]
    async fn test_two_voters_one_device_scenario() {
        let (store, c) = store_with(&["Alice", "Bob"]).await;
        let (alice, bob) = (c[0].id, c[1].id);

        vote(&store, "a@x.com", "device-a", &[bob]).await.unwrap();
        vote(&store, "b@x.com", "device-b", &[alice]).await.unwrap();
        assert_eq!(
            vote(&store, "c@x.com", "device-b", &[alice]).await,
            Err(CoreError::AlreadyVoted(VoteChannel::Device))
        );

        let result = BallotProcessor::get_results(&store).await.unwrap();
        let standings: Vec<_> = result.standings.iter()
            .map(|s| (s.candidate.name.as_str(), s.votes))
            .collect();
        assert_eq!(standings, [("Alice", 1), ("Bob", 1)]);
        assert_eq!(result.total_voters_voted, 2);
    }

    #[tokio::test]
    async fn test_results_break_ties_by_insertion_order() {
        let (store, c) = store_with(&["A", "B", "C"]).await;
        let mut n = 0;
        for (candidate, count) in [(c[1].id, 5), (c[0].id, 5), (c[2].id, 2)] {
            for _ in 0..count {
                n += 1;
                vote(&store, &format!("v{n}@x.com"), &format!("fp-{n}"), &[candidate]).await.unwrap();
            }
        }

        let result = BallotProcessor::get_results(&store).await.unwrap();
        let names: Vec<_> = result.standings.iter().map(|s| s.candidate.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(result.total_voters_voted, 12);
    }

    #[tokio::test]
    async fn test_concurrent_ballots_from_one_device() {
        let (store, c) = store_with(&["Alice"]).await;
        let store = Arc::new(store);
        let alice = c[0].id;

        let mut voter_ids = Vec::new();
        for i in 0..16 {
            let id = BallotProcessor::resolve_identity(store.as_ref(), claim("V", &format!("v{i}@x.com"), "shared-device"))
                .await
                .unwrap();
            voter_ids.push(id);
        }

        let handles: Vec<_> = voter_ids.into_iter().map(|voter_id| {
            let store = store.clone();
            tokio::spawn(async move {
                BallotProcessor::submit_ballot(store.as_ref(), voter_id, &[alice]).await
            })
        }).collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert_eq!(e, CoreError::AlreadyVoted(VoteChannel::Device)),
            }
        }
        assert_eq!(accepted, 1);

        let result = BallotProcessor::get_results(store.as_ref()).await.unwrap();
        assert_eq!(result.total_voters_voted, 1);
        assert_eq!(votes_for(&result, alice), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_one_voter() {
        let (store, _) = store_with(&[]).await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                BallotProcessor::resolve_identity(store.as_ref(), claim("Ada", "ada@x.com", &format!("fp-{i}"))).await
            })
        }).collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_voted_voters_newest_first() {
        let (store, c) = store_with(&["Alice"]).await;
        vote(&store, "first@x.com", "fp-1", &[c[0].id]).await.unwrap();
        vote(&store, "second@x.com", "fp-2", &[c[0].id]).await.unwrap();
        BallotProcessor::resolve_identity(&store, claim("Pending", "pending@x.com", "fp-3")).await.unwrap();

        let voters = BallotProcessor::list_voted_voters(&store).await.unwrap();
        let emails: Vec<_> = voters.iter().map(|v| v.email.as_str()).collect();
        assert_eq!(emails, ["second@x.com", "first@x.com"]);
    }

    #[tokio::test]
    async fn test_candidate_management_and_reset() {
        let (store, c) = store_with(&["Alice", "Bob"]).await;

        let renamed = NewCandidate { name: "Alicia".into(), position: "Treasurer".into() };
        let updated = BallotProcessor::update_candidate(&store, c[0].id, renamed.clone()).await.unwrap().unwrap();
        assert_eq!(updated.name, "Alicia");
        assert_eq!(BallotProcessor::update_candidate(&store, 99, renamed).await.unwrap(), None);

        vote(&store, "v@x.com", "fp", &[c[0].id]).await.unwrap();
        assert_eq!(
            BallotProcessor::delete_candidate(&store, c[0].id).await,
            Err(CoreError::Validation(ValidationError::CandidateHasBallots(c[0].id)))
        );
        assert!(BallotProcessor::delete_candidate(&store, c[1].id).await.unwrap());
        assert!(!BallotProcessor::delete_candidate(&store, c[1].id).await.unwrap());

        BallotProcessor::reset_election(&store).await.unwrap();
        let result = BallotProcessor::get_results(&store).await.unwrap();
        assert!(result.standings.is_empty());
        assert_eq!(result.total_voters_voted, 0);
        assert!(BallotProcessor::list_voted_voters(&store).await.unwrap().is_empty());

        // The device is free again after a reset.
        assert!(BallotProcessor::resolve_identity(&store, claim("V", "v@x.com", "fp")).await.is_ok());
    }

    #[test]
    fn test_claim_prefers_explicit_fingerprint() {
        let device = DeviceSignals { user_agent: "Mozilla/5.0".into(), ..DeviceSignals::default() };

        let explicit = BallotProcessor::claim_from_request(ResolveIdentityRequest {
            name: "Ada".into(),
            email: "ada@x.com".into(),
            fingerprint: Some("client-fp".into()),
            device: Some(device.clone()),
        });
        assert_eq!(explicit.fingerprint, "client-fp");

        let derived = BallotProcessor::claim_from_request(ResolveIdentityRequest {
            name: "Ada".into(),
            email: "ada@x.com".into(),
            fingerprint: None,
            device: Some(device.clone()),
        });
        assert_eq!(derived.fingerprint, device.fingerprint());

        let missing = BallotProcessor::claim_from_request(ResolveIdentityRequest {
            name: "Ada".into(),
            email: "ada@x.com".into(),
            fingerprint: None,
            device: None,
        });
        assert!(missing.fingerprint.is_empty());
    }

    async fn client_with(config: AppConfig) -> Client {
        init_tracing();
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        Client::tracked(build_rocket(state)).await.unwrap()
    }

    fn test_config() -> AppConfig {
        AppConfig {
            admin_token: Some(ADMIN_TOKEN.into()),
            identity_rate_limit: 100,
            ballot_rate_limit: 100,
            ..AppConfig::default()
        }
    }

    fn admin() -> Header<'static> {
        Header::new("Authorization", format!("Bearer {ADMIN_TOKEN}"))
    }

    async fn add_candidate(client: &Client, name: &str) -> Candidate {
        let response = client.post("/api/admin/candidates")
            .header(ContentType::JSON)
            .header(admin())
            .body(json!({ "name": name, "position": "Chair" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        response.into_json().await.unwrap()
    }

    async fn sign_in<'a>(client: &'a Client, email: &str, fingerprint: &str) -> LocalResponse<'a> {
        client.post("/api/identity")
            .header(ContentType::JSON)
            .body(json!({ "name": "Voter", "email": email, "fingerprint": fingerprint }).to_string())
            .dispatch()
            .await
    }

    async fn cast<'a>(client: &'a Client, token: &str, candidate_ids: &[i64]) -> LocalResponse<'a> {
        client.post("/api/ballot")
            .header(ContentType::JSON)
            .body(json!({ "sessionToken": token, "candidateIds": candidate_ids }).to_string())
            .dispatch()
            .await
    }

    #[rocket::async_test]
    async fn test_http_voting_flow() {
        let client = client_with(test_config()).await;
        let alice = add_candidate(&client, "Alice").await;
        let bob = add_candidate(&client, "Bob").await;

        let candidates: Vec<Candidate> = client.get("/api/candidates").dispatch().await.into_json().await.unwrap();
        assert_eq!(candidates, vec![alice.clone(), bob.clone()]);

        let response = sign_in(&client, "a@x.com", "device-a").await;
        assert_eq!(response.status(), Status::Ok);
        let identity: ResolvedIdentity = response.into_json().await.unwrap();

        let response = cast(&client, &identity.session_token, &[bob.id]).await;
        assert_eq!(response.status(), Status::Ok);
        let receipt: BallotReceipt = response.into_json().await.unwrap();
        assert_eq!(receipt.voter_id, identity.voter_id);
        assert_eq!(receipt.entries, 1);

        let results: TallyResult = client.get("/api/results").dispatch().await.into_json().await.unwrap();
        assert_eq!(results.standings[0].candidate, bob);
        assert_eq!(results.standings[0].rank, 1);
        assert_eq!(results.standings[1].candidate, alice);
        assert_eq!(results.total_voters_voted, 1);

        let voters: Vec<VotedVoter> = client.get("/api/voters").dispatch().await.into_json().await.unwrap();
        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].email, "a@x.com");
    }

    #[rocket::async_test]
    async fn test_http_repeat_vote_is_refused() {
        let client = client_with(test_config()).await;
        let alice = add_candidate(&client, "Alice").await;

        let identity: ResolvedIdentity = sign_in(&client, "a@x.com", "device-a").await.into_json().await.unwrap();
        assert_eq!(cast(&client, &identity.session_token, &[alice.id]).await.status(), Status::Ok);

        // The session is spent once the ballot is in.
        let response = cast(&client, &identity.session_token, &[alice.id]).await;
        assert_eq!(response.status(), Status::Unauthorized);

        let response = sign_in(&client, "other@x.com", "device-a").await;
        assert_eq!(response.status(), Status::Forbidden);
        let body: ErrorResponse = response.into_json().await.unwrap();
        assert_eq!(body.code, ErrorCode::AlreadyVoted);
        assert_eq!(body.error, "A ballot has already been cast from this device");

        let response = sign_in(&client, "a@x.com", "device-b").await;
        assert_eq!(response.status(), Status::Forbidden);
        let body: ErrorResponse = response.into_json().await.unwrap();
        assert_eq!(body.error, "A ballot has already been cast from this email");
    }

    #[rocket::async_test]
    async fn test_http_validation_errors() {
        let client = client_with(test_config()).await;
        add_candidate(&client, "Alice").await;

        let response = sign_in(&client, "foo@bar", "device-a").await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: ErrorResponse = response.into_json().await.unwrap();
        assert_eq!(body.code, ErrorCode::ValidationFailed);

        let identity: ResolvedIdentity = sign_in(&client, "foo@bar.com", "device-a").await.into_json().await.unwrap();
        let response = cast(&client, &identity.session_token, &[]).await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = cast(&client, "not-a-session", &[1]).await;
        assert_eq!(response.status(), Status::Unauthorized);

        let response = client.post("/api/identity")
            .header(ContentType::JSON)
            .body(r#"{"name":"Ada"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn test_http_identity_from_device_signals() {
        let client = client_with(test_config()).await;
        let device = DeviceSignals { user_agent: "Mozilla/5.0 (X11)".into(), ..DeviceSignals::default() };

        let response = client.post("/api/identity")
            .header(ContentType::JSON)
            .body(json!({ "name": "Ada", "email": "ada@x.com", "device": device }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_http_admin_requires_token() {
        let client = client_with(test_config()).await;

        let response = client.post("/api/admin/candidates")
            .header(ContentType::JSON)
            .body(json!({ "name": "Mallory" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        let response = client.post("/api/admin/reset")
            .header(Header::new("Authorization", "Bearer wrong"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        let disabled = client_with(AppConfig { admin_token: None, ..test_config() }).await;
        let response = disabled.post("/api/admin/reset")
            .header(admin())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_http_candidate_admin() {
        let client = client_with(test_config()).await;
        let alice = add_candidate(&client, "Alice").await;

        let response = client.put(format!("/api/admin/candidates/{}", alice.id))
            .header(ContentType::JSON)
            .header(admin())
            .body(json!({ "name": "Alicia", "position": "Chair" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.put("/api/admin/candidates/999")
            .header(ContentType::JSON)
            .header(admin())
            .body(json!({ "name": "Nobody" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);

        let response = client.delete(format!("/api/admin/candidates/{}", alice.id))
            .header(admin())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let response = client.post("/api/admin/reset").header(admin()).dispatch().await;
        assert_eq!(response.status(), Status::NoContent);
    }

    #[rocket::async_test]
    async fn test_http_cors_matches_exact_origin() {
        let client = client_with(AppConfig { allowed_origin: "http://localhost".into(), ..test_config() }).await;

        let response = client.get("/api/candidates")
            .header(Header::new("Origin", "http://localhost"))
            .dispatch()
            .await;
        assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("http://localhost"));

        let response = client.get("/api/candidates")
            .header(Header::new("Origin", "http://localhost.evil.com"))
            .dispatch()
            .await;
        assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), None);
    }

    #[rocket::async_test]
    async fn test_http_identity_rate_limit() {
        let client = client_with(AppConfig { identity_rate_limit: 2, ..test_config() }).await;

        assert_eq!(sign_in(&client, "a@x.com", "fp-a").await.status(), Status::Ok);
        assert_eq!(sign_in(&client, "b@x.com", "fp-b").await.status(), Status::Ok);
        let response = sign_in(&client, "c@x.com", "fp-c").await;
        assert_eq!(response.status(), Status::TooManyRequests);
        let body: ErrorResponse = response.into_json().await.unwrap();
        assert_eq!(body.code, ErrorCode::RateLimited);
    }

    mod postgres {
        use sqlx::PgPool;
        use super::*;
        use crate::queries::PgStore;

        async fn seeded(pool: PgPool) -> (PgStore, Vec<Candidate>) {
            let store = PgStore::new(pool);
            let mut created = Vec::new();
            for name in ["Alice", "Bob"] {
                let candidate = NewCandidate { name: name.into(), position: String::new() };
                created.push(store.create_candidate(&candidate).await.unwrap());
            }
            (store, created)
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "requires DATABASE_URL"]
        async fn test_pg_scenario(pool: PgPool) {
            let (store, c) = seeded(pool).await;

            vote(&store, "a@x.com", "device-a", &[c[1].id]).await.unwrap();
            vote(&store, "b@x.com", "device-b", &[c[0].id]).await.unwrap();
            assert_eq!(
                vote(&store, "c@x.com", "device-b", &[c[0].id]).await,
                Err(CoreError::AlreadyVoted(VoteChannel::Device))
            );

            let result = BallotProcessor::get_results(&store).await.unwrap();
            let names: Vec<_> = result.standings.iter().map(|s| s.candidate.name.as_str()).collect();
            assert_eq!(names, ["Alice", "Bob"]);
            assert_eq!(result.total_voters_voted, 2);

            assert_eq!(
                BallotProcessor::delete_candidate(&store, c[0].id).await,
                Err(CoreError::Validation(ValidationError::CandidateHasBallots(c[0].id)))
            );
        }

        #[sqlx::test(migrations = "./migrations")]
        #[ignore = "requires DATABASE_URL"]
        async fn test_pg_concurrent_ballots_from_one_device(pool: PgPool) {
            let (store, c) = seeded(pool).await;
            let store = Arc::new(store);

            let mut voter_ids = Vec::new();
            for i in 0..8 {
                voter_ids.push(
                    BallotProcessor::resolve_identity(store.as_ref(), claim("V", &format!("v{i}@x.com"), "shared"))
                        .await
                        .unwrap(),
                );
            }

            let alice = c[0].id;
            let handles: Vec<_> = voter_ids.into_iter().map(|voter_id| {
                let store = store.clone();
                tokio::spawn(async move {
                    BallotProcessor::submit_ballot(store.as_ref(), voter_id, &[alice]).await
                })
            }).collect();

            let mut accepted = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => accepted += 1,
                    Err(e) => assert_eq!(e, CoreError::AlreadyVoted(VoteChannel::Device)),
                }
            }
            assert_eq!(accepted, 1);

            let result = BallotProcessor::get_results(store.as_ref()).await.unwrap();
            assert_eq!(result.total_entries, 1);
        }
    }
}
