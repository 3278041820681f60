#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::broadcast;

use citysecrets_backend::{NewComment, UserRegistration};
use citysecrets_chain::{
    ChainError, ContractConnector, KeyWallet, MemoryChain, PendingTx, SpotsContract,
    WalletProvider, WalletSigner, U256,
};
use citysecrets_client::{ClientConfig, ClientEvent, FanoutPolicy, SpotsClient};
use citysecrets_shared::validation::SpotForm;
use citysecrets_shared::{
    Address, ChainSpot, Comment, PhotoUpload, SpotCategory, SpotCreated, SpotDocument, SpotId,
    UserRecord,
};
use citysecrets_store::Database;

// ---------------------------------------------------------------------------
// Mock content backend
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct BackendState {
    pub spots: Vec<SpotDocument>,
    pub comments: HashMap<u64, Vec<Comment>>,
    pub users: Vec<UserRegistration>,
    pub uploads: usize,
}

pub type SharedBackend = Arc<Mutex<BackendState>>;

async fn list_spots(State(db): State<SharedBackend>) -> Json<Vec<SpotDocument>> {
    Json(db.lock().unwrap().spots.clone())
}

async fn spots_by_city(
    State(db): State<SharedBackend>,
    Path(city): Path<String>,
) -> Json<Vec<SpotDocument>> {
    let spots = db
        .lock()
        .unwrap()
        .spots
        .iter()
        .filter(|s| s.location.city.eq_ignore_ascii_case(&city))
        .cloned()
        .collect();
    Json(spots)
}

async fn spots_by_user(
    State(db): State<SharedBackend>,
    Path(address): Path<String>,
) -> Result<Json<Vec<SpotDocument>>, StatusCode> {
    let creator: Address = address.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let spots = db
        .lock()
        .unwrap()
        .spots
        .iter()
        .filter(|s| s.creator == creator)
        .cloned()
        .collect();
    Ok(Json(spots))
}

async fn spot_by_id(
    State(db): State<SharedBackend>,
    Path(id): Path<u64>,
) -> Result<Json<SpotDocument>, (StatusCode, &'static str)> {
    db.lock()
        .unwrap()
        .spots
        .iter()
        .find(|s| s.spot_id == SpotId(id))
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Spot not found"))
}

async fn create_spot(
    State(db): State<SharedBackend>,
    Json(mut doc): Json<SpotDocument>,
) -> (StatusCode, Json<SpotDocument>) {
    doc.document_id = Some(format!("doc-{}", doc.spot_id));
    doc.created_at = Some(Utc::now());
    db.lock().unwrap().spots.push(doc.clone());
    (StatusCode::CREATED, Json(doc))
}

async fn delete_spot(State(db): State<SharedBackend>, Path(id): Path<u64>) -> StatusCode {
    db.lock().unwrap().spots.retain(|s| s.spot_id != SpotId(id));
    StatusCode::NO_CONTENT
}

async fn upload(
    State(db): State<SharedBackend>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    let mut urls = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("photos") {
            let name = field.file_name().unwrap_or("unnamed").to_string();
            field.bytes().await.unwrap();
            urls.push(format!("https://cdn.example/{name}"));
        }
    }
    db.lock().unwrap().uploads += urls.len();
    Json(serde_json::json!({ "urls": urls }))
}

async fn list_comments(
    State(db): State<SharedBackend>,
    Path(id): Path<u64>,
) -> Json<Vec<Comment>> {
    Json(db.lock().unwrap().comments.get(&id).cloned().unwrap_or_default())
}

async fn add_comment(
    State(db): State<SharedBackend>,
    Path(id): Path<u64>,
    Json(body): Json<NewComment>,
) -> StatusCode {
    db.lock().unwrap().comments.entry(id).or_default().push(Comment {
        spot_id: Some(SpotId(id)),
        commenter: body.commenter,
        username: body.username,
        content: body.content,
        created_at: Some(Utc::now()),
    });
    StatusCode::CREATED
}

async fn register_user(
    State(db): State<SharedBackend>,
    Json(body): Json<UserRegistration>,
) -> StatusCode {
    db.lock().unwrap().users.push(body);
    StatusCode::CREATED
}

/// Serve the mock backend on an ephemeral port; returns its base URL.
pub async fn spawn_backend() -> (String, SharedBackend) {
    let db: SharedBackend = Arc::default();
    let router = Router::new()
        .route("/api/spots", get(list_spots))
        .route("/api/spots/city/:city", get(spots_by_city))
        .route("/api/spots/user/:address", get(spots_by_user))
        .route("/api/spots/id/:id", get(spot_by_id))
        .route("/api/spots/create", post(create_spot))
        .route("/api/spots/:id", delete(delete_spot))
        .route("/api/upload", post(upload))
        .route("/api/comments/:id", get(list_comments))
        .route("/api/comments/:id/comment", post(add_comment))
        .route("/api/users/register", post(register_user))
        .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), db)
}

// ---------------------------------------------------------------------------
// Contract that counts transactions
// ---------------------------------------------------------------------------

/// Connector wrapping a [`MemoryChain`] that counts submitted transactions.
#[derive(Clone)]
pub struct CountingChain {
    pub chain: MemoryChain,
    sent: Arc<AtomicUsize>,
}

impl CountingChain {
    pub fn new(chain: MemoryChain) -> Self {
        Self {
            chain,
            sent: Arc::default(),
        }
    }

    pub fn transactions(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl ContractConnector for CountingChain {
    fn connect(
        &self,
        signer: &WalletSigner,
        contract: Address,
    ) -> Result<Arc<dyn SpotsContract>, ChainError> {
        Ok(Arc::new(CountingContract {
            inner: self.chain.connect(signer, contract)?,
            sent: self.sent.clone(),
        }))
    }
}

struct CountingContract {
    inner: Arc<dyn SpotsContract>,
    sent: Arc<AtomicUsize>,
}

impl CountingContract {
    fn count(&self) {
        self.sent.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpotsContract for CountingContract {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn signer_address(&self) -> Address {
        self.inner.signer_address()
    }

    async fn user(&self, who: Address) -> Result<UserRecord, ChainError> {
        self.inner.user(who).await
    }

    async fn spot(&self, id: SpotId) -> Result<ChainSpot, ChainError> {
        self.inner.spot(id).await
    }

    async fn has_voted(&self, voter: Address, id: SpotId) -> Result<bool, ChainError> {
        self.inner.has_voted(voter, id).await
    }

    async fn register_user(&self, username: &str) -> Result<PendingTx<()>, ChainError> {
        self.count();
        self.inner.register_user(username).await
    }

    async fn create_spot(
        &self,
        category: SpotCategory,
    ) -> Result<PendingTx<SpotCreated>, ChainError> {
        self.count();
        self.inner.create_spot(category).await
    }

    async fn vote_spot(
        &self,
        id: SpotId,
        is_upvote: bool,
        value: U256,
    ) -> Result<PendingTx<()>, ChainError> {
        self.count();
        self.inner.vote_spot(id, is_upvote, value).await
    }

    async fn delete_spot(&self, id: SpotId) -> Result<PendingTx<()>, ChainError> {
        self.count();
        self.inner.delete_spot(id).await
    }
}

// ---------------------------------------------------------------------------
// Client harness
// ---------------------------------------------------------------------------

/// One backend and one chain shared by any number of clients.
pub struct World {
    pub api_url: String,
    pub backend: SharedBackend,
    pub chain: CountingChain,
}

impl World {
    pub async fn new() -> Self {
        let (api_url, backend) = spawn_backend().await;
        Self {
            api_url,
            backend,
            chain: CountingChain::new(MemoryChain::default()),
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_api_base_url(self.api_url.clone())
            .with_contract_address(self.chain.chain.address())
    }

    pub fn client(&self, wallet: Arc<KeyWallet>) -> Arc<SpotsClient> {
        self.client_with(self.config(), Some(wallet), Database::open_in_memory().unwrap())
    }

    pub fn client_with(
        &self,
        config: ClientConfig,
        wallet: Option<Arc<KeyWallet>>,
        database: Database,
    ) -> Arc<SpotsClient> {
        let mut builder = SpotsClient::builder(config)
            .connector(Arc::new(self.chain.clone()))
            .database(database);
        if let Some(wallet) = wallet {
            builder = builder.wallet(wallet as Arc<dyn WalletProvider>);
        }
        builder.build().unwrap()
    }

    /// A connected and registered client.
    pub async fn registered(&self, username: &str) -> (Arc<SpotsClient>, Arc<KeyWallet>) {
        let wallet = Arc::new(KeyWallet::random(1));
        let client = self.client(wallet.clone());
        client.connect_wallet().await.unwrap();
        client.register_user(username).await.unwrap();
        (client, wallet)
    }

    pub fn with_policy(&self, policy: FanoutPolicy) -> ClientConfig {
        ClientConfig {
            fanout_policy: policy,
            ..self.config()
        }
    }
}

pub fn temp_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

pub fn hidden_cafe() -> SpotForm {
    SpotForm {
        name: "Hidden Cafe".into(),
        description: "Espresso behind the bookshop".into(),
        category: "FOOD_BEVERAGES".into(),
        city: "Austin".into(),
        state: "TX".into(),
        address: "1 Main St".into(),
        latitude: "30.27".into(),
        longitude: "-97.74".into(),
        photos: vec![PhotoUpload::new("cafe.jpg", "image/jpeg", vec![0xFFu8, 0xD8, 0xFF])],
    }
}

/// Wait for the first event matching `pred`.
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<ClientEvent>, pred: F) -> ClientEvent
where
    F: Fn(&ClientEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for client event")
}
