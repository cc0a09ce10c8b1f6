//! Servidor web Axum com WebSocket para extração de seções e conversão de anotações de editais

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use edital_core::{
    conll::render_conll,
    corpus::{demo_annotations, demo_edital},
    dedup::{DedupOutcome, DEFAULT_THRESHOLD},
    extract_edital,
    tag_sentence,
    tagger::{collect_entities, EntityMention},
    AnnotatedRecord, BaseTask, ConllExport, DedupScope, DiscardReport, Error, ExportConfig, ExportEvent,
    JsonFileStore, MemoryStore, PagedDocument, SentenceBaseStore, SentenceDeduplicator, TaggedToken,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Estado compartilhado da aplicação
struct AppState {
    /// Base do dataset de sentenças (`/dedup`).
    ner_base: Arc<dyn SentenceBaseStore>,
    /// Base da conversão para CONLL (`/ws`).
    conll_base: Arc<dyn SentenceBaseStore>,
    /// Uma escrita na base por vez: deduplicações globais e conversões são serializadas.
    base_lock: Mutex<()>,
}

impl AppState {
    fn from_env() -> Self {
        let base_dir = std::env::var("EDITAL_BASE_DIR").ok();
        let store = |task: BaseTask| -> Arc<dyn SentenceBaseStore> {
            match &base_dir {
                Some(dir) => Arc::new(JsonFileStore::new(dir, task)),
                None => Arc::new(MemoryStore::default()),
            }
        };
        match &base_dir {
            Some(dir) => info!("bases de sentenças em '{dir}'"),
            None => info!("EDITAL_BASE_DIR não definido; bases de sentenças apenas em memória"),
        }
        Self {
            ner_base: store(BaseTask::Ner),
            conll_base: store(BaseTask::Conll),
            base_lock: Mutex::new(()),
        }
    }
}

#[derive(Deserialize)]
struct TagRequest {
    #[serde(flatten)]
    record: AnnotatedRecord,
    #[serde(default = "default_uppercase")]
    uppercase_labels: bool,
}

fn default_uppercase() -> bool {
    true
}

#[derive(Serialize)]
struct TagResponse {
    tokens: Vec<TaggedToken>,
    entities: Vec<EntityMention>,
    conll: String,
}

#[derive(Deserialize)]
struct DedupRequest {
    documents: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    scope: DedupScope,
    #[serde(default = "default_threshold")]
    threshold: f64,
    #[serde(default)]
    reprocess: bool,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Serialize)]
struct DedupResponse {
    documents: BTreeMap<String, Vec<String>>,
    kept: usize,
    discarded: usize,
    report: DiscardReport,
}

impl From<DedupOutcome<String>> for DedupResponse {
    fn from(outcome: DedupOutcome<String>) -> Self {
        Self {
            kept: outcome.documents.values().map(Vec::len).sum(),
            discarded: outcome.report.total_discarded(),
            documents: outcome.documents,
            report: outcome.report,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = Arc::new(AppState::from_env());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/sections", post(sections_handler))
        .route("/tag", post(tag_handler))
        .route("/dedup", post(dedup_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state);

    let addr = std::env::var("EDITAL_WEB_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Servidor de editais iniciado em http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Status HTTP de um erro do núcleo: entrada ruim é 400, o resto 500.
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::EmptyDocument(_)
        | Error::InvalidThreshold(_)
        | Error::InvalidTestFraction(_)
        | Error::DegenerateSplit { .. }
        | Error::MalformedRecord { .. }
        | Error::NoAnnotatedFiles { .. }
        | Error::NoTokens => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, Json(serde_json::json!({"error": message.to_string()}))).into_response()
}

/// Lista de rotas
async fn index_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "edital-web",
        "routes": [
            {"method": "POST", "path": "/sections", "body": "PagedDocument"},
            {"method": "POST", "path": "/tag", "body": "AnnotatedRecord"},
            {"method": "POST", "path": "/dedup", "body": "{documents, scope, threshold, reprocess}"},
            {"method": "GET", "path": "/demo-texts"},
            {"method": "GET", "path": "/ws", "body": "ExportConfig"}
        ]
    }))
}

/// Extração de seções de um edital
async fn sections_handler(Json(document): Json<PagedDocument>) -> Response {
    match tokio::task::spawn_blocking(move || extract_edital(&document)).await {
        Ok(Ok(edital)) => Json(edital).into_response(),
        Ok(Err(err)) => error_response(status_for(&err), err),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

/// Conversão de uma única sentença anotada para BIO
async fn tag_handler(Json(req): Json<TagRequest>) -> Response {
    if req.record.data.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Sentença vazia");
    }

    let tagged = tag_sentence(&req.record.data, &req.record.label, req.uppercase_labels);
    let entities = collect_entities(&tagged.tokens);
    let conll = render_conll(std::slice::from_ref(&tagged));

    Json(TagResponse {
        tokens: tagged.tokens,
        entities,
        conll,
    })
    .into_response()
}

/// Remoção de sentenças semelhantes com a base compartilhada do servidor
async fn dedup_handler(State(state): State<Arc<AppState>>, Json(req): Json<DedupRequest>) -> Response {
    let dedup = match SentenceDeduplicator::new(req.threshold, req.scope) {
        Ok(dedup) => dedup,
        Err(err) => return error_response(status_for(&err), err),
    };

    let result = tokio::task::spawn_blocking(move || {
        let _guard = state.base_lock.lock().unwrap_or_else(PoisonError::into_inner);
        dedup.run(req.documents, state.ner_base.as_ref(), req.reprocess)
    })
    .await;

    match result {
        Ok(Ok(outcome)) => Json(DedupResponse::from(outcome)).into_response(),
        Ok(Err(err)) => error_response(status_for(&err), err),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

/// Edital e anotações de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "edital": demo_edital(),
        "annotations": demo_annotations(),
    }))
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe um `ExportConfig`, executa a conversão e envia os eventos em tempo real
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let config: ExportConfig = match serde_json::from_str(&text) {
                    Ok(config) => config,
                    Err(err) => {
                        let event = ExportEvent::Error {
                            message: format!("configuração inválida: {err}"),
                        };
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                        continue;
                    }
                };

                info!("Convertendo via WebSocket: '{}'", config.source_dir.display());

                // Executa a conversão (síncrona) fora do runtime
                let (tx_std, rx_std) = std::sync::mpsc::channel::<ExportEvent>();
                let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ExportEvent>();

                let export_state = Arc::clone(&state);
                let export = tokio::task::spawn_blocking(move || {
                    let _guard = export_state.base_lock.lock().unwrap_or_else(PoisonError::into_inner);
                    ConllExport::with_store(config, Arc::clone(&export_state.conll_base)).run_streaming(tx_std);
                });

                // Repassa os eventos do canal std para o canal tokio
                let bridge = tokio::task::spawn_blocking(move || {
                    for event in rx_std {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                });

                while let Some(event) = rx.recv().await {
                    if send_event(&mut socket, &event).await.is_err() {
                        warn!("cliente desconectou durante a conversão");
                        return;
                    }
                }

                if let Err(err) = export.await {
                    warn!("tarefa de conversão falhou: {err}");
                }
                let _ = bridge.await;
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &ExportEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(err) => {
            warn!("evento não serializável: {err}");
            Ok(())
        }
    }
}
