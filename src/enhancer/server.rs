//! Enhancer Server - HTTP server for the Web UI
//! Serves the single-page UI and the JSON API it calls

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::prompt_enhancer::{
    Enhancement, ModelListing, PromptEnhancer, EMPTY_ENHANCE_PROMPT, EMPTY_GENERATE_PROMPT,
};
use super::techniques::{Technique, TechniqueParams};
use super::templates::ENHANCER_UI_HTML;

/// Maximum request body size (1MB)
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// How many consecutive ports to try when the configured one is taken
const PORT_ATTEMPTS: u16 = 100;

/// Enhancer HTTP Server
pub struct EnhancerServer {
    enhancer: Arc<PromptEnhancer>,
    port: Arc<RwLock<u16>>,
    running: Arc<RwLock<bool>>,
}

impl EnhancerServer {
    pub fn new(enhancer: Arc<PromptEnhancer>) -> Self {
        let port = enhancer.config().ui_port;
        Self {
            enhancer,
            port: Arc::new(RwLock::new(port)),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start HTTP server, returning the bound port
    pub async fn start(&self) -> Result<u16> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Ok(*self.port.read().await);
            }
            *running = true;
        }

        let mut port = *self.port.read().await;
        let mut listener: Option<TcpListener> = None;

        // Try to bind to port, increment if in use
        for _ in 0..PORT_ATTEMPTS {
            match TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).await {
                Ok(l) => {
                    listener = Some(l);
                    break;
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::AddrInUse && port < u16::MAX {
                        warn!("Port {} is in use, trying {}", port, port + 1);
                        port += 1;
                    } else {
                        *self.running.write().await = false;
                        return Err(anyhow!("Failed to bind to port: {}", e));
                    }
                }
            }
        }

        let listener = match listener {
            Some(l) => l,
            None => {
                *self.running.write().await = false;
                return Err(anyhow!("Could not find available port"));
            }
        };

        // Port 0 asks the OS for a free port; record the real one
        let port = listener.local_addr()?.port();
        *self.port.write().await = port;

        info!("Enhancer server started: http://localhost:{}", port);

        let enhancer = self.enhancer.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let enhancer = enhancer.clone();

                tokio::spawn(async move {
                    let service = service_fn(|req| {
                        let enhancer = enhancer.clone();
                        async move { handle_request(req, enhancer).await }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        if !e.to_string().contains("connection closed") {
                            error!("Error serving connection: {}", e);
                        }
                    }
                });
            }
        });

        Ok(port)
    }

    /// Get server port
    pub async fn get_port(&self) -> u16 {
        *self.port.read().await
    }

    pub async fn url(&self) -> String {
        format!("http://localhost:{}/", self.get_port().await)
    }
}

/// Handle HTTP request
async fn handle_request(
    req: Request<Incoming>,
    enhancer: Arc<PromptEnhancer>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Ok(cors_response(
            Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap(),
        ));
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/") | (Method::GET, "/index.html") => serve_enhancer_ui(),
        (Method::GET, "/api/models") => get_models(&enhancer).await,
        (Method::GET, "/api/techniques") => get_techniques(),
        (Method::GET, "/api/history") => get_history(&enhancer).await,
        (Method::POST, "/api/enhance") => handle_enhance(req, &enhancer).await,
        (Method::POST, "/api/generate") => handle_generate(req, &enhancer).await,
        (Method::POST, "/api/analyze") => handle_analyze(req, &enhancer).await,
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "text/plain")
            .body(Full::new(Bytes::from("Not Found")))
            .unwrap(),
    };

    Ok(cors_response(response))
}

/// Add CORS headers (restricted to localhost only)
fn cors_response(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        "http://localhost".parse().unwrap(),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        "GET, POST, OPTIONS".parse().unwrap(),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        "Content-Type".parse().unwrap(),
    );
    response
}

/// Serve Web UI HTML
fn serve_enhancer_ui() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(ENHANCER_UI_HTML)))
        .unwrap()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelsResponse<'a> {
    #[serde(flatten)]
    listing: ModelListing,
    default_model: &'a str,
}

async fn get_models(enhancer: &PromptEnhancer) -> Response<Full<Bytes>> {
    let response = ModelsResponse {
        listing: enhancer.list_models().await,
        default_model: &enhancer.config().default_model,
    };
    json_serialize_response(StatusCode::OK, &response)
}

fn get_techniques() -> Response<Full<Bytes>> {
    let techniques: Vec<_> = Technique::ALL
        .iter()
        .map(|t| {
            json!({
                "key": t.key(),
                "name": t.name(),
                "description": t.description(),
            })
        })
        .collect();
    json_value_response(StatusCode::OK, &json!(techniques))
}

async fn get_history(enhancer: &PromptEnhancer) -> Response<Full<Bytes>> {
    let history = enhancer.history().await;
    json_value_response(StatusCode::OK, &json!(history))
}

#[derive(Serialize)]
struct EnhanceResponse {
    technique: String,
    name: String,
    description: String,
    #[serde(rename = "enhancedPrompt")]
    enhanced_prompt: String,
    critique: Option<String>,
}

impl From<Enhancement> for EnhanceResponse {
    fn from(e: Enhancement) -> Self {
        Self {
            technique: e.technique.key().to_string(),
            name: e.technique.name().to_string(),
            description: e.technique.description().to_string(),
            enhanced_prompt: e.enhanced_prompt,
            critique: e.critique,
        }
    }
}

/// Handle enhance request; without a technique the strategy is chosen automatically
async fn handle_enhance(req: Request<Incoming>, enhancer: &PromptEnhancer) -> Response<Full<Bytes>> {
    let body = match read_body_with_limit(req.into_body(), MAX_BODY_SIZE).await {
        Ok(b) => b,
        Err(e) => {
            return json_error_response(StatusCode::BAD_REQUEST, &e);
        }
    };

    #[derive(Deserialize)]
    struct EnhanceRequest {
        prompt: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        technique: Option<String>,
        #[serde(default)]
        params: TechniqueParams,
    }

    let request: EnhanceRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(_) => {
            return json_error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    if request.prompt.trim().is_empty() {
        return json_error_response(StatusCode::BAD_REQUEST, EMPTY_ENHANCE_PROMPT);
    }

    let model = request.model.as_deref();
    let result = match request.technique.as_deref().map(str::trim) {
        None | Some("") | Some("auto") => enhancer.auto_enhance(&request.prompt, model).await,
        Some(key) => {
            match enhancer
                .enhance_by_key(&request.prompt, key, &request.params, model)
                .await
            {
                Ok(Some(enhancement)) => Ok(enhancement),
                Ok(None) => {
                    let unchanged = EnhanceResponse {
                        technique: key.to_string(),
                        name: key.to_string(),
                        description: "Unknown technique; prompt returned unchanged".to_string(),
                        enhanced_prompt: request.prompt,
                        critique: None,
                    };
                    return json_serialize_response(StatusCode::OK, &unchanged);
                }
                Err(e) => Err(e),
            }
        }
    };

    match result {
        Ok(enhancement) => {
            json_serialize_response(StatusCode::OK, &EnhanceResponse::from(enhancement))
        }
        Err(e) => {
            error!("Enhancement failed: {}", e);
            json_error_response(
                StatusCode::BAD_GATEWAY,
                &format!("Enhancement failed: {}", e),
            )
        }
    }
}

/// Handle generate request: run the (enhanced) prompt against the model
async fn handle_generate(req: Request<Incoming>, enhancer: &PromptEnhancer) -> Response<Full<Bytes>> {
    let body = match read_body_with_limit(req.into_body(), MAX_BODY_SIZE).await {
        Ok(b) => b,
        Err(e) => {
            return json_error_response(StatusCode::BAD_REQUEST, &e);
        }
    };

    #[derive(Deserialize)]
    struct GenerateRequest {
        prompt: String,
        #[serde(default)]
        model: Option<String>,
    }

    let request: GenerateRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(_) => {
            return json_error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    if request.prompt.trim().is_empty() {
        return json_error_response(StatusCode::BAD_REQUEST, EMPTY_GENERATE_PROMPT);
    }

    match enhancer
        .generate_response(&request.prompt, request.model.as_deref())
        .await
    {
        Ok(response) => json_value_response(StatusCode::OK, &json!({ "response": response })),
        Err(e) => {
            error!("Generation failed: {}", e);
            json_error_response(StatusCode::BAD_GATEWAY, &format!("Ollama Error: {}", e))
        }
    }
}

async fn handle_analyze(req: Request<Incoming>, enhancer: &PromptEnhancer) -> Response<Full<Bytes>> {
    let body = match read_body_with_limit(req.into_body(), MAX_BODY_SIZE).await {
        Ok(b) => b,
        Err(e) => {
            return json_error_response(StatusCode::BAD_REQUEST, &e);
        }
    };

    #[derive(Deserialize)]
    struct AnalyzeRequest {
        prompt: String,
    }

    match serde_json::from_slice::<AnalyzeRequest>(&body) {
        Ok(request) => json_serialize_response(StatusCode::OK, &enhancer.analyze(&request.prompt)),
        Err(_) => json_error_response(StatusCode::BAD_REQUEST, "Invalid request body"),
    }
}

/// Read request body with size limit (streaming enforcement to prevent memory exhaustion)
async fn read_body_with_limit<B>(body: B, max_size: usize) -> Result<Bytes, String>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limited = Limited::new(body, max_size);
    match limited.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => {
            if e.to_string().contains("length limit exceeded") {
                Err(format!("Request body too large (max {} bytes)", max_size))
            } else {
                Err("Failed to read body".to_string())
            }
        }
    }
}

/// Serialize a value into a JSON response, degrading to a 500 on failure
fn json_serialize_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_string(value) {
        Ok(body) => json_response(status, &body),
        Err(e) => json_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to serialize response: {}", e),
        ),
    }
}

fn json_value_response(status: StatusCode, value: &serde_json::Value) -> Response<Full<Bytes>> {
    json_response(status, &value.to_string())
}

/// Create JSON error response with safe serialization
fn json_error_response(status: StatusCode, error: &str) -> Response<Full<Bytes>> {
    json_value_response(status, &json!({ "error": error }))
}

/// Create JSON response
fn json_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
