use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};

use crate::block::Block;
use crate::config::NodeConfig;
use crate::crypto;
use crate::eligibility::VoterRegistry;
use crate::keys::Wallet;
use crate::ledger::{Ledger, SharedLedger};
use crate::models::{HistoryEntry, Rejection, TipInfo, ValidatorKey, VoterRegistration};
use crate::policy::PositionPolicy;

pub struct AppState {
    pub ledger: SharedLedger,
    pub registry: Arc<VoterRegistry>,
    /// This node's own validator identity, used by `/cosign`.
    pub validator: Wallet,
}

impl AppState {
    /// Fresh ledger and voter roll; the node's own key is an authorized validator.
    pub fn new(config: &NodeConfig, validator: Wallet) -> Self {
        let registry = Arc::new(VoterRegistry::new());
        let mut ledger = Ledger::new(registry.clone(), config.ledger);
        ledger.register_validator(&validator.public_key);

        Self {
            ledger: ledger.into_shared(),
            registry,
            validator,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/validator", web::get().to(get_validator))
        .route("/validators", web::post().to(register_validator))
        .route("/voters", web::post().to(register_voter))
        .route("/positions", web::post().to(configure_position))
        .route("/tip", web::get().to(get_tip))
        .route("/cosign", web::post().to(cosign_block))
        .route("/blocks", web::post().to(submit_block))
        .route("/tally", web::get().to(get_tally))
        .route("/history", web::get().to(get_history));
}

async fn get_validator(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ValidatorKey {
        public_key: data.validator.public_key.clone(),
    })
}

async fn register_validator(
    data: web::Data<AppState>,
    key: web::Json<ValidatorKey>,
) -> impl Responder {
    if let Err(err) = crypto::parse_public_key(&key.public_key) {
        log::warn!("refusing validator registration: {}", err);
        return HttpResponse::BadRequest().body(format!("Invalid validator key: {}", err));
    }
    data.ledger.write().await.register_validator(&key.public_key);
    log::info!("validator registered");
    HttpResponse::Ok().body("Validator registered")
}

async fn register_voter(
    data: web::Data<AppState>,
    voter: web::Json<VoterRegistration>,
) -> impl Responder {
    if voter.verified {
        data.registry
            .register_verified(&voter.public_key, &voter.department);
    } else {
        data.registry.register(&voter.public_key, &voter.department);
    }
    log::info!("voter registered in {}", voter.department);
    HttpResponse::Ok().body("Voter registered")
}

async fn configure_position(
    data: web::Data<AppState>,
    policy: web::Json<PositionPolicy>,
) -> impl Responder {
    let policy = policy.into_inner();
    log::info!("position {} configured ({:?})", policy.name, policy.scope);
    data.ledger.write().await.configure_position(policy);
    HttpResponse::Ok().body("Position configured")
}

async fn get_tip(data: web::Data<AppState>) -> impl Responder {
    let ledger = data.ledger.read().await;
    HttpResponse::Ok().json(TipInfo {
        index: ledger.len() - 1,
        hash: ledger.tip_hash().to_owned(),
    })
}

async fn cosign_block(data: web::Data<AppState>, block: web::Json<Block>) -> impl Responder {
    let mut block = block.into_inner();
    match data.validator.cosign(&mut block) {
        Ok(()) => HttpResponse::Ok().json(block),
        Err(err) => {
            log::error!("failed to co-sign block: {}", err);
            HttpResponse::InternalServerError().body(format!("Failed to co-sign block: {}", err))
        }
    }
}

async fn submit_block(data: web::Data<AppState>, block: web::Json<Block>) -> impl Responder {
    let outcome = data.ledger.write().await.submit_block(block.into_inner());
    match outcome {
        Ok(accepted) => HttpResponse::Ok().json(accepted),
        Err(reason) => HttpResponse::UnprocessableEntity().json(Rejection::from(reason)),
    }
}

async fn get_tally(data: web::Data<AppState>) -> impl Responder {
    let tally = data.ledger.read().await.tally();
    HttpResponse::Ok().json(tally)
}

async fn get_history(data: web::Data<AppState>) -> impl Responder {
    let ledger = data.ledger.read().await;
    let history: Vec<HistoryEntry> = ledger
        .blocks()
        .iter()
        .skip(1)
        .map(|block| {
            let vote = block.vote();
            HistoryEntry {
                voter: vote.voter_public_key().to_owned(),
                candidate: vote.candidate().to_owned(),
                position: vote.position().to_owned(),
                department: vote.department().to_owned(),
                hash: block.content_hash(),
            }
        })
        .collect();
    HttpResponse::Ok().json(history)
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::keys::testing::wallets;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(&NodeConfig::default(), wallets()[2].clone()))
    }

    #[actix_web::test]
    async fn vote_flows_through_cosign_and_submit() {
        let data = state();
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;
        let voter = &wallets()[0];
        let second_validator = &wallets()[3];

        let req = test::TestRequest::post()
            .uri("/validators")
            .set_json(json!({ "publicKey": second_validator.public_key }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::post()
            .uri("/voters")
            .set_json(json!({ "publicKey": voter.public_key, "department": "Cebu", "verified": true }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::post()
            .uri("/positions")
            .set_json(json!({ "name": "Mayor", "scope": "local" }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get().uri("/tip").to_request();
        let tip: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tip["index"], 0);

        let vote = voter.create_vote("Alice", "Mayor", "Cebu").unwrap();
        let block = Block::new(tip["hash"].as_str().unwrap(), vote);
        let req = test::TestRequest::post().uri("/cosign").set_json(&block).to_request();
        let mut block: Block = test::call_and_read_body_json(&app, req).await;
        assert_eq!(block.signatures().len(), 1);
        second_validator.cosign(&mut block).unwrap();

        let req = test::TestRequest::post().uri("/blocks").set_json(&block).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let accepted: Value = test::read_body_json(resp).await;
        assert_eq!(accepted["index"], 1);
        assert_eq!(accepted["hash"], block.content_hash());

        let req = test::TestRequest::get().uri("/tally").to_request();
        let tally: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tally, json!({ "Mayor": { "Alice": 1 } }));

        let req = test::TestRequest::get().uri("/history").to_request();
        let history: Vec<HistoryEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].candidate, "Alice");
        assert_eq!(history[0].hash, block.content_hash());
    }

    #[actix_web::test]
    async fn rejected_block_reports_reason() {
        let data = state();
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;
        let voter = &wallets()[0];
        data.registry.register_verified(&voter.public_key, "Cebu");

        let tip = data.ledger.read().await.tip_hash().to_owned();
        let vote = voter.create_vote("Alice", "Mayor", "Cebu").unwrap();
        let mut block = Block::new(&tip, vote);
        data.validator.cosign(&mut block).unwrap();

        let req = test::TestRequest::post().uri("/blocks").set_json(&block).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["reason"], "insufficientSignatures");
        assert_eq!(data.ledger.read().await.len(), 1);
    }

    #[actix_web::test]
    async fn malformed_validator_key_is_refused() {
        let data = state();
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/validators")
            .set_json(json!({ "publicKey": "not a pem key" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let ledger = data.ledger.read().await;
        assert!(!ledger.is_validator("not a pem key"));
        assert_eq!(ledger.validator_count(), 1);
    }

    #[actix_web::test]
    async fn exposes_node_validator_key() {
        let data = state();
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/validator").to_request();
        let key: ValidatorKey = test::call_and_read_body_json(&app, req).await;
        assert_eq!(key.public_key, wallets()[2].public_key);
        assert!(data.ledger.read().await.is_validator(&key.public_key));
    }
}
