//! In-process mock of the speech analysis service
//!
//! Implements the minimum API surface the client exercises: the blocking
//! analyze submission, the token-keyed progress endpoints (poll + SSE), and
//! canned auth/participants/results/reports handlers. Progress state is an
//! in-memory map plus one broadcast channel per token, matching the real
//! service's progress store semantics.
#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use sesan_common::progress::{default_steps, ProgressSnapshot, ProgressStatus, TOTAL_STEPS};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

pub const TEST_TOKEN: &str = "test-access-token";
pub const TEST_PASSWORD: &str = "correct-horse";
pub const TEST_CODE: &str = "123456";

/// Build a snapshot the way the service does
pub fn snapshot(step: u32, status: ProgressStatus, message: &str) -> ProgressSnapshot {
    ProgressSnapshot {
        current_step: step,
        total_steps: TOTAL_STEPS,
        message: message.to_string(),
        status,
        steps: default_steps(),
    }
}

pub fn running(step: u32) -> ProgressSnapshot {
    snapshot(step, ProgressStatus::Running, &format!("step {}", step))
}

/// Shared state of the mock service
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<Inner>,
}

struct Inner {
    /// Latest snapshot per token, served by the poll endpoint
    poll_state: Mutex<HashMap<String, ProgressSnapshot>>,
    /// Push channel per token, feeding SSE subscribers
    channels: Mutex<HashMap<String, broadcast::Sender<ProgressSnapshot>>>,
    /// When false, the stream endpoint answers 404 (simulates a network
    /// path that blocks SSE)
    sse_enabled: AtomicBool,
    /// Number of poll requests served, for teardown assertions
    poll_hits: AtomicU64,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                poll_state: Mutex::new(HashMap::new()),
                channels: Mutex::new(HashMap::new()),
                sse_enabled: AtomicBool::new(true),
                poll_hits: AtomicU64::new(0),
            }),
        }
    }
}

impl ServiceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable_sse(&self) {
        self.inner.sse_enabled.store(false, Ordering::SeqCst);
    }

    pub fn poll_hits(&self) -> u64 {
        self.inner.poll_hits.load(Ordering::SeqCst)
    }

    fn sender(&self, token: &str) -> broadcast::Sender<ProgressSnapshot> {
        self.inner
            .channels
            .lock()
            .unwrap()
            .entry(token.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }

    /// Update both channels: the poll endpoint's state and SSE subscribers
    pub fn set_progress(&self, token: &str, snap: ProgressSnapshot) {
        self.inner
            .poll_state
            .lock()
            .unwrap()
            .insert(token.to_string(), snap.clone());
        let _ = self.sender(token).send(snap);
    }

    /// Update only the poll endpoint's state (channel-skew tests)
    pub fn set_poll_state(&self, token: &str, snap: ProgressSnapshot) {
        self.inner
            .poll_state
            .lock()
            .unwrap()
            .insert(token.to_string(), snap);
    }

    /// Push only to SSE subscribers (channel-skew tests)
    pub fn push_only(&self, token: &str, snap: ProgressSnapshot) {
        let _ = self.sender(token).send(snap);
    }

    /// Number of live SSE subscriptions for a token
    pub fn subscriber_count(&self, token: &str) -> usize {
        self.sender(token).receiver_count()
    }

    /// Wait until an SSE subscription for `token` is established
    pub async fn wait_for_subscriber(&self, token: &str) {
        for _ in 0..200 {
            if self.subscriber_count(token) > 0 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("no SSE subscriber appeared for token {}", token);
    }
}

/// Start the mock service on an ephemeral port
pub async fn spawn_service(state: ServiceState) -> SocketAddr {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Client wired to the mock, with test-friendly timings
pub fn client_for(addr: SocketAddr) -> sesan_client::ApiClient {
    let mut config = sesan_common::config::Config::default();
    config.api_base_url = format!("http://{}", addr);
    config.poll_interval_ms = 25;
    config.connect_timeout_secs = 2;
    config.upload_timeout_secs = 30;
    sesan_client::ApiClient::new(&config).unwrap()
}

fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/api/analyze/", post(analyze))
        .route("/api/analyze/progress/:token", get(poll_progress))
        .route("/api/analyze/progress/:token/stream", get(stream_progress))
        .route("/api/auth/register", post(auth_register))
        .route("/api/auth/verify-register", post(auth_verify))
        .route("/api/auth/login", post(auth_login))
        .route("/api/auth/verify-login", post(auth_verify))
        .route("/api/auth/me", get(auth_me))
        .route("/api/participants/", post(create_participant).get(list_participants))
        .route("/api/participants/:id", get(get_participant))
        .route("/api/results/", get(list_results))
        .route("/api/results/:id", get(get_result).delete(delete_result))
        .route("/api/results/participant/:id", get(participant_results))
        .route("/api/reports/statistics", get(statistics))
        .route("/api/reports/pdf/:id", get(report_pdf))
        .with_state(state)
}

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "detail": message })))
}

// ============================================================================
// Analyze + progress
// ============================================================================

async fn analyze(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut participant_id: Option<i64> = None;
    let mut progress_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name().unwrap_or("") {
            "file" => file_bytes = Some(field.bytes().await.unwrap().to_vec()),
            "participant_id" => {
                participant_id = field.text().await.unwrap().parse().ok();
            }
            "progress_id" => progress_id = Some(field.text().await.unwrap()),
            _ => {}
        }
    }

    let (Some(_bytes), Some(participant_id), Some(token)) =
        (file_bytes, participant_id, progress_id)
    else {
        return detail(StatusCode::BAD_REQUEST, "Missing form fields").into_response();
    };

    // Walk the whole pipeline, publishing progress on both channels
    for step in 1..=TOTAL_STEPS {
        state.set_progress(&token, running(step));
        tokio::time::sleep(std::time::Duration::from_millis(15)).await;
    }
    state.set_progress(
        &token,
        snapshot(TOTAL_STEPS, ProgressStatus::Completed, "Analysis complete"),
    );

    Json(sample_result(7, participant_id)).into_response()
}

async fn poll_progress(
    State(state): State<ServiceState>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    state.inner.poll_hits.fetch_add(1, Ordering::SeqCst);
    match state.inner.poll_state.lock().unwrap().get(&token) {
        Some(snap) => Json(snap.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Progress not found").into_response(),
    }
}

async fn stream_progress(
    State(state): State<ServiceState>,
    Path(token): Path<String>,
) -> axum::response::Response {
    if !state.inner.sse_enabled.load(Ordering::SeqCst) {
        return detail(StatusCode::NOT_FOUND, "Stream unavailable").into_response();
    }

    let current = state
        .inner
        .poll_state
        .lock()
        .unwrap()
        .get(&token)
        .cloned();
    let mut rx = state.sender(&token).subscribe();

    let stream: std::pin::Pin<
        Box<dyn Stream<Item = Result<Event, Infallible>> + Send>,
    > = Box::pin(async_stream::stream! {
        if let Some(snap) = current {
            let terminal = snap.is_terminal();
            yield Ok(Event::default().data(serde_json::to_string(&snap).unwrap()));
            if terminal {
                return;
            }
        }
        while let Ok(snap) = rx.recv().await {
            let terminal = snap.is_terminal();
            yield Ok(Event::default().data(serde_json::to_string(&snap).unwrap()));
            if terminal {
                return;
            }
        }
    });

    Sse::new(stream).into_response()
}

// ============================================================================
// Auth
// ============================================================================

async fn auth_register(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    if body.get("email").and_then(|e| e.as_str()).is_none() {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "email required").into_response();
    }
    Json(serde_json::json!({ "message": "Verification code sent" })).into_response()
}

async fn auth_login(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    if body.get("password").and_then(|p| p.as_str()) != Some(TEST_PASSWORD) {
        return detail(StatusCode::UNAUTHORIZED, "Email veya şifre hatalı").into_response();
    }
    Json(serde_json::json!({ "message": "Doğrulama kodu email adresinize gönderildi" }))
        .into_response()
}

async fn auth_verify(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    if body.get("code").and_then(|c| c.as_str()) != Some(TEST_CODE) {
        return detail(StatusCode::BAD_REQUEST, "Geçersiz doğrulama kodu").into_response();
    }
    Json(serde_json::json!({ "access_token": TEST_TOKEN, "token_type": "bearer" }))
        .into_response()
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(&format!("Bearer {}", TEST_TOKEN))
}

async fn auth_me(headers: HeaderMap) -> impl IntoResponse {
    if !bearer_ok(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated").into_response();
    }
    Json(serde_json::json!({
        "id": 1,
        "email": "researcher@example.org",
        "is_verified": true,
        "created_at": "2026-01-15T09:00:00Z"
    }))
    .into_response()
}

// ============================================================================
// Participants
// ============================================================================

fn sample_participant(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": "A. Yılmaz",
        "age": 72,
        "gender": "female",
        "group_type": "alzheimer",
        "mmse_score": 21,
        "created_at": "2026-02-01T12:00:00Z"
    })
}

async fn create_participant(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    let mut participant = sample_participant(42);
    if let Some(obj) = participant.as_object_mut() {
        for key in ["name", "age", "gender", "group_type", "mmse_score"] {
            if let Some(value) = body.get(key) {
                obj.insert(key.to_string(), value.clone());
            }
        }
    }
    Json(participant)
}

async fn list_participants() -> impl IntoResponse {
    Json(serde_json::json!([sample_participant(1), sample_participant(2)]))
}

async fn get_participant(Path(id): Path<i64>) -> impl IntoResponse {
    if id == 99 {
        return detail(StatusCode::NOT_FOUND, "Katılımcı bulunamadı").into_response();
    }
    Json(sample_participant(id)).into_response()
}

// ============================================================================
// Results + reports
// ============================================================================

fn sample_result(id: i64, participant_id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "participant_id": participant_id,
        "transcript": "bugün sabah kahvaltıda çay içtim",
        "acoustic_features": {
            "duration": 38.2,
            "energy": { "mean": 0.14, "max": 0.91 },
            "pitch": { "mean": 176.4, "std": 31.2 },
            "mfcc": { "mean": [2.1, -1.3, 0.4], "std": [0.6, 0.5, 0.3] },
            "spectral": { "centroid": 1483.0, "rolloff": 3120.0, "zero_crossing_rate": 0.06 },
            "tempo": 92.5
        },
        "emotion_analysis": { "tone": "neutral", "intensity": 0.35, "emotions": ["calm"] },
        "content_analysis": {
            "word_count": 96, "unique_words": 71,
            "fluency_score": 0.68, "coherence_score": 0.74
        },
        "created_at": "2026-02-10T14:30:00Z"
    })
}

fn sample_summary(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "participant_id": 1,
        "transcript": "bugün sabah kahvaltıda...",
        "emotion_analysis": { "tone": "neutral", "intensity": 0.35, "emotions": ["calm"] },
        "content_analysis": {
            "word_count": 96, "unique_words": 71,
            "fluency_score": 0.68, "coherence_score": 0.74
        },
        "has_clinical_report": true,
        "has_pdf": true,
        "created_at": "2026-02-10T14:30:00Z"
    })
}

async fn list_results(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(100);
    let items: Vec<_> = (1..=3).take(limit).map(sample_summary).collect();
    Json(serde_json::json!({ "total": 3, "items": items }))
}

async fn get_result(Path(id): Path<i64>) -> impl IntoResponse {
    if id == 99 {
        return detail(StatusCode::NOT_FOUND, "Analysis not found").into_response();
    }
    Json(sample_result(id, 1)).into_response()
}

async fn delete_result(Path(id): Path<i64>) -> impl IntoResponse {
    if id == 99 {
        return detail(StatusCode::NOT_FOUND, "Analysis not found").into_response();
    }
    Json(serde_json::json!({ "message": "Analiz silindi" })).into_response()
}

async fn participant_results(Path(_id): Path<i64>) -> impl IntoResponse {
    Json(serde_json::json!([sample_summary(1)]))
}

async fn statistics() -> impl IntoResponse {
    Json(serde_json::json!({
        "total_participants": 12,
        "group_counts": { "alzheimer": 5, "mci": 3, "control": 4 },
        "total_analyses": 27,
        "average_mmse_scores": { "alzheimer": 19.4, "mci": 25.1, "control": null }
    }))
}

async fn report_pdf(Path(id): Path<i64>) -> impl IntoResponse {
    if id == 99 {
        return detail(StatusCode::NOT_FOUND, "PDF raporu bulunamadı").into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/pdf")],
        b"%PDF-1.4 mock report".to_vec(),
    )
        .into_response()
}
