use super::*;
use crate::test_support::{png, RecordingNavigator};
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::{
    domain::{VoterId, WalletAddress},
    protocol::{CreateVoterRequest, IpfsAddResponse, TransactionStatus, VoterListResponse},
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct UploadedPart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    size: usize,
}

#[derive(Clone, Default)]
struct IpfsState {
    hash: String,
    parts: Arc<Mutex<Vec<UploadedPart>>>,
    pin_flags: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Deserialize)]
struct AddQuery {
    pin: Option<String>,
}

async fn handle_add(
    State(state): State<IpfsState>,
    Query(query): Query<AddQuery>,
    mut multipart: Multipart,
) -> Json<IpfsAddResponse> {
    state
        .pin_flags
        .lock()
        .await
        .push(query.pin.unwrap_or_default());
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default();
        state.parts.lock().await.push(UploadedPart {
            field: field_name,
            file_name,
            content_type,
            size: bytes.len(),
        });
    }
    Json(IpfsAddResponse {
        name: "alice.png".to_string(),
        hash: state.hash.clone(),
        size: "1024".to_string(),
    })
}

async fn spawn_ipfs_server(hash: &str) -> Result<(String, IpfsState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = IpfsState {
        hash: hash.to_string(),
        ..IpfsState::default()
    };
    let app = Router::new()
        .route("/api/v0/add", post(handle_add))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[derive(Clone)]
struct GatewayState {
    status: TransactionStatus,
    requests: Arc<Mutex<Vec<CreateVoterRequest>>>,
}

async fn handle_create_voter(
    State(state): State<GatewayState>,
    Json(request): Json<CreateVoterRequest>,
) -> Json<TransactionReceipt> {
    state.requests.lock().await.push(request);
    let reason = match state.status {
        TransactionStatus::Confirmed => None,
        TransactionStatus::Reverted => Some("only organizer".to_string()),
    };
    Json(TransactionReceipt {
        transaction_hash: "0xabc123".to_string(),
        status: state.status,
        voter_id: Some(VoterId(42)),
        reason,
    })
}

async fn handle_list_voters() -> Json<VoterListResponse> {
    Json(VoterListResponse {
        voters: vec![VoterRecord {
            voter_id: VoterId(1),
            name: "Alice".to_string(),
            address: format!("0x{}", "a".repeat(40)),
            image: Some("https://ipfs.io/ipfs/bafyalice".to_string()),
            voting_status: true,
        }],
    })
}

async fn spawn_gateway_server(status: TransactionStatus) -> Result<(String, GatewayState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = GatewayState {
        status,
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/voters", post(handle_create_voter).get(handle_list_voters))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

async fn spawn_failing_server() -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/api/v0/add", post(|| async { StatusCode::BAD_GATEWAY }))
        .route("/voters", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn registration() -> ValidatedRegistration {
    ValidatedRegistration {
        name: "Alice".to_string(),
        wallet_address: WalletAddress::parse(&format!("0x{}", "a".repeat(40))).expect("address"),
        position: "Observer".to_string(),
        content_uri: "https://ipfs.io/ipfs/bafyalice".to_string(),
    }
}

async fn connected_wallet() -> Arc<ConfiguredWallet> {
    let wallet = Arc::new(ConfiguredWallet::new(Some(format!("0x{}", "f".repeat(40)))));
    wallet.connect().await.expect("connect");
    wallet
}

#[tokio::test]
async fn ipfs_store_pins_multipart_file_and_returns_gateway_uri() {
    let (api_url, state) = spawn_ipfs_server("bafyalice").await.expect("spawn ipfs");
    let store = IpfsHttpStore::new(format!("{api_url}/"), "https://ipfs.io/");

    let uri = store
        .upload(&png("alice.png", 1024))
        .await
        .expect("upload");

    assert_eq!(uri.as_deref(), Some("https://ipfs.io/ipfs/bafyalice"));
    let parts = state.parts.lock().await.clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].field, "file");
    assert_eq!(parts[0].file_name.as_deref(), Some("alice.png"));
    assert_eq!(parts[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(parts[0].size, 1024);
    assert_eq!(state.pin_flags.lock().await.clone(), vec!["true".to_string()]);
}

#[tokio::test]
async fn ipfs_store_maps_empty_hash_to_absent_uri() {
    let (api_url, _state) = spawn_ipfs_server("").await.expect("spawn ipfs");
    let store = IpfsHttpStore::new(api_url, "https://ipfs.io");

    let uri = store.upload(&png("alice.png", 8)).await.expect("upload");

    assert_eq!(uri, None);
}

#[tokio::test]
async fn ipfs_store_surfaces_http_errors() {
    let api_url = spawn_failing_server().await.expect("spawn");
    let store = IpfsHttpStore::new(api_url, "https://ipfs.io");

    assert!(store.upload(&png("alice.png", 8)).await.is_err());
}

#[tokio::test]
async fn gateway_contract_submits_organizer_stamped_request() {
    let (gateway_url, state) = spawn_gateway_server(TransactionStatus::Confirmed)
        .await
        .expect("spawn gateway");
    let contract = GatewayVoterContract::new(gateway_url, connected_wallet().await);
    let navigator = Arc::new(RecordingNavigator::default());

    let receipt = contract
        .create_voter(&registration(), navigator.clone())
        .expect("settlement handle")
        .await
        .expect("confirmed");

    assert_eq!(receipt.transaction_hash, "0xabc123");
    assert_eq!(receipt.voter_id, Some(VoterId(42)));
    assert_eq!(navigator.routes(), vec![Route::VoterList]);

    let requests = state.requests.lock().await.clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].organizer, format!("0x{}", "f".repeat(40)));
    assert_eq!(requests[0].address, format!("0x{}", "a".repeat(40)));
    assert_eq!(requests[0].image, "https://ipfs.io/ipfs/bafyalice");
}

#[tokio::test]
async fn gateway_contract_rejects_reverted_receipt() {
    let (gateway_url, _state) = spawn_gateway_server(TransactionStatus::Reverted)
        .await
        .expect("spawn gateway");
    let contract = GatewayVoterContract::new(gateway_url, connected_wallet().await);
    let navigator = Arc::new(RecordingNavigator::default());

    let err = contract
        .create_voter(&registration(), navigator.clone())
        .expect("settlement handle")
        .await
        .expect_err("reverted");

    assert!(err.to_string().contains("only organizer"));
    assert!(navigator.routes().is_empty());
}

#[tokio::test]
async fn gateway_contract_requires_connected_wallet() {
    let (gateway_url, state) = spawn_gateway_server(TransactionStatus::Confirmed)
        .await
        .expect("spawn gateway");
    let wallet = Arc::new(ConfiguredWallet::new(Some(format!("0x{}", "f".repeat(40)))));
    let contract = GatewayVoterContract::new(gateway_url, wallet);

    let err = contract
        .create_voter(&registration(), Arc::new(NoopNavigator))
        .expect("settlement handle")
        .await
        .expect_err("not connected");

    assert!(err.to_string().contains("wallet not connected"));
    assert!(state.requests.lock().await.is_empty());
}

#[tokio::test]
async fn gateway_contract_lists_voters() {
    let (gateway_url, _state) = spawn_gateway_server(TransactionStatus::Confirmed)
        .await
        .expect("spawn gateway");
    let contract = GatewayVoterContract::new(gateway_url, Arc::new(MissingWalletSession));

    let voters = contract.voters().await.expect("voters");

    assert_eq!(voters.len(), 1);
    assert!(voters[0].voting_status);

    let failing = GatewayVoterContract::new(
        spawn_failing_server().await.expect("spawn"),
        Arc::new(MissingWalletSession),
    );
    assert!(failing.voters().await.is_err());
}

#[tokio::test]
async fn orchestrator_drives_http_collaborators_end_to_end() {
    let (api_url, _ipfs) = spawn_ipfs_server("bafyalice").await.expect("spawn ipfs");
    let (gateway_url, gateway) = spawn_gateway_server(TransactionStatus::Confirmed)
        .await
        .expect("spawn gateway");
    let orchestrator = RegistrationOrchestrator::new(
        Arc::new(IpfsHttpStore::new(api_url, "https://ipfs.io")),
        Arc::new(GatewayVoterContract::new(gateway_url, connected_wallet().await)),
        Arc::new(NoopNavigator),
    );

    for intent in [
        RegistrationIntent::EditName("Alice".to_string()),
        RegistrationIntent::EditWalletAddress(format!("0x{}", "a".repeat(40))),
        RegistrationIntent::EditPosition("Observer".to_string()),
        RegistrationIntent::DropFile(png("alice.png", 64)),
    ] {
        orchestrator.dispatch(intent).await;
    }

    assert!(matches!(
        orchestrator.submit().await,
        SubmitOutcome::Registered(_)
    ));
    assert_eq!(gateway.requests.lock().await.len(), 1);
    assert!(orchestrator.snapshot().await.form.is_empty());
}

#[tokio::test]
async fn missing_collaborators_fail_loudly() {
    assert!(MissingContentStore.upload(&png("a.png", 1)).await.is_err());
    assert!(MissingWalletSession.connect().await.is_err());
    assert!(MissingVoterContract.voters().await.is_err());
    let settled = MissingVoterContract
        .create_voter(&registration(), Arc::new(NoopNavigator))
        .expect("handle")
        .await;
    assert!(settled.is_err());
}
