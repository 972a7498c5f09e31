// ABOUTME: Local HTTP control plane ("agent hook") for external automation
// ABOUTME: Serves health, app-state, preview-url, open-project, and validate-project endpoints

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use url::{form_urlencoded::Serializer as UrlQuerySerializer, Url};

use crate::errors::{DeckError, Result};
use crate::project;

pub const DEFAULT_AGENT_HOOK_ADDR: &str = "127.0.0.1:38473";
pub const DEFAULT_PREVIEW_BASE_URL: &str = "http://127.0.0.1:34773";

#[derive(Debug, Serialize)]
struct HookStatus {
    ok: bool,
    service: String,
}

#[derive(Debug, Serialize)]
struct HookError {
    ok: bool,
    error: String,
}

#[derive(Debug, Serialize)]
struct PreviewUrlResponse {
    ok: bool,
    preview_url: String,
}

#[derive(Debug, Deserialize)]
struct PathPayload {
    path: String,
}

/// Status + JSON body, built by the route handlers and wrapped into a
/// `tiny_http` response at the server edge. Keeps routing testable without
/// sockets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReply {
    pub status: u16,
    pub body: String,
}

fn json_reply(status: u16, payload: impl Serialize) -> HookReply {
    let body = serde_json::to_string(&payload)
        .unwrap_or_else(|_| r#"{"ok":false,"error":"JSON serialization failed."}"#.to_string());
    HookReply { status, body }
}

fn error_reply(status: u16, message: String) -> HookReply {
    json_reply(
        status,
        HookError {
            ok: false,
            error: message,
        },
    )
}

/// Agent hook bind address, overridable via `FASTSLIDES_AGENT_HOOK_ADDR`.
pub fn agent_hook_addr() -> String {
    env::var("FASTSLIDES_AGENT_HOOK_ADDR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_AGENT_HOOK_ADDR.to_string())
}

fn preview_base_url() -> String {
    env::var("FASTSLIDES_PREVIEW_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PREVIEW_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Preview URL for a project path, with the path carried as a query pair.
pub fn build_preview_url_for_path(project_path: &str) -> String {
    let mut serializer = UrlQuerySerializer::new(String::new());
    serializer.append_pair("deckPath", project_path);
    let query = serializer.finish();
    format!("{}/?{}", preview_base_url(), query)
}

/// Route one request. `body` is the raw request body for POST routes.
pub fn handle_request(method: &Method, request_url: &str, body: &str) -> HookReply {
    let parsed_url = match Url::parse(&format!("http://localhost{request_url}")) {
        Ok(url) => url,
        Err(e) => return error_reply(400, format!("Invalid request URL: {e}")),
    };
    let path = parsed_url.path();

    match (method, path) {
        (&Method::Get, "/health") => json_reply(
            200,
            HookStatus {
                ok: true,
                service: "fastslides-agent-hook".to_string(),
            },
        ),
        (&Method::Get, "/app-state") => match project::build_state() {
            Ok(state) => json_reply(200, state),
            Err(e) => error_reply(500, e.to_string()),
        },
        (&Method::Get, "/preview-url") => {
            let project_path = parsed_url
                .query_pairs()
                .find_map(|(key, value)| (key == "path").then(|| value.into_owned()))
                .unwrap_or_default();

            if project_path.trim().is_empty() {
                return error_reply(400, "Missing required query parameter: path".to_string());
            }
            json_reply(
                200,
                PreviewUrlResponse {
                    ok: true,
                    preview_url: build_preview_url_for_path(&project_path),
                },
            )
        }
        (&Method::Post, "/open-project") => {
            let payload = match serde_json::from_str::<PathPayload>(body) {
                Ok(value) => value,
                Err(e) => return error_reply(400, format!("Invalid JSON payload: {e}")),
            };
            match project::open_project(&payload.path) {
                Ok(detail) => json_reply(200, detail),
                Err(e) => error_reply(400, e.to_string()),
            }
        }
        (&Method::Post, "/validate-project") => {
            let payload = match serde_json::from_str::<PathPayload>(body) {
                Ok(value) => value,
                Err(e) => return error_reply(400, format!("Invalid JSON payload: {e}")),
            };
            match project::validate_project(&payload.path) {
                Ok(report) => json_reply(200, report),
                Err(e) => error_reply(400, e.to_string()),
            }
        }
        _ => error_reply(404, format!("Unknown endpoint: {:?} {}", method, path)),
    }
}

fn to_response(reply: HookReply) -> Response<Cursor<Vec<u8>>> {
    let mut response =
        Response::from_string(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(content_type) = Header::from_bytes("Content-Type", "application/json") {
        response.add_header(content_type);
    }
    if let Ok(access_control) = Header::from_bytes("Access-Control-Allow-Origin", "*") {
        response.add_header(access_control);
    }
    response
}

fn read_body(request: &mut Request) -> String {
    let mut body = String::new();
    if let Err(e) = std::io::Read::read_to_string(request.as_reader(), &mut body) {
        error!("Failed to read request body: {}", e);
    }
    body
}

/// Run the agent hook server on the configured address, blocking the
/// calling thread.
pub fn serve() -> Result<()> {
    let bind_addr = agent_hook_addr();
    let server = Server::http(&bind_addr)
        .map_err(|e| DeckError::HookError(format!("Failed to bind {}: {}", bind_addr, e)))?;

    info!("Agent hook listening on http://{}", bind_addr);

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let request_url = request.url().to_string();
        let body = read_body(&mut request);
        let reply = handle_request(&method, &request_url, &body);
        if let Err(e) = request.respond(to_response(reply)) {
            error!("Failed to send response: {}", e);
        }
    }

    Ok(())
}
