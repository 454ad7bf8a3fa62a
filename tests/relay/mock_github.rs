//! Mock GitHub REST API.
//!
//! Serves a fixed set of repositories and commits. Commit SHAs select the
//! failure mode:
//! - `flaky`: 502 twice, then a valid detail
//! - `down`: always 502
//! - `missing`: 404
//! - `garbled`: 200 with a non-JSON body
//! - `locked`: 401
//! - `nameless`: a file with an empty filename

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, get, web};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use devscan_lib::config::GitHubApiSettings;
use devscan_lib::services::GitHubClient;

pub const TOKEN: &str = "gho_test_token";
pub const REPO_COUNT: i64 = 150;

#[derive(Default)]
pub struct MockGitHubState {
    /// Requests per path
    pub hits: HashMap<String, usize>,
    pub auth_headers: Vec<String>,
    pub user_agents: Vec<String>,
}

type SharedState = web::Data<Arc<Mutex<MockGitHubState>>>;

fn record(state: &SharedState, req: &HttpRequest) -> usize {
    let mut state = state.lock().unwrap();
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    state.auth_headers.push(header("authorization"));
    state.user_agents.push(header("user-agent"));
    let hits = state.hits.entry(req.path().to_string()).or_insert(0);
    *hits += 1;
    *hits
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<i64>,
    per_page: Option<i64>,
}

#[get("/user/repos")]
async fn list_repos(
    req: HttpRequest,
    state: SharedState,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    record(&state, &req);
    let per_page = query.per_page.unwrap_or(30);
    let page = query.page.unwrap_or(1);
    let start = (page - 1) * per_page + 1;
    let end = (page * per_page).min(REPO_COUNT);

    let repos: Vec<_> = (start..=end)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("repo-{}", id),
                "full_name": format!("octo/repo-{}", id),
                "html_url": format!("https://github.com/octo/repo-{}", id),
                "description": null,
                "language": "Rust",
                "private": id % 2 == 0,
                "fork": false,
                "stargazers_count": 3
            })
        })
        .collect();
    HttpResponse::Ok().json(repos)
}

#[get("/repos/{owner}/{name}/commits")]
async fn list_commits(req: HttpRequest, state: SharedState) -> HttpResponse {
    record(&state, &req);
    HttpResponse::Ok().json(json!([
        {
            "sha": "c0ffee",
            "commit": {
                "message": "Add login",
                "author": { "name": "octocat", "date": "2026-02-21T12:00:00Z" },
                "committer": { "name": "GitHub", "date": "2026-02-21T12:01:00Z" }
            }
        }
    ]))
}

fn commit_detail(sha: &str, filename: &str) -> serde_json::Value {
    json!({
        "sha": sha,
        "commit": {
            "message": "Fix security",
            "author": { "name": "octocat", "date": "2026-02-21T12:00:00Z" },
            "committer": null
        },
        "files": [
            {
                "filename": filename,
                "status": "modified",
                "additions": 3,
                "deletions": 1,
                "changes": 4,
                "patch": "@@ -1 +1 @@\n-a\n+b",
                "raw_url": "https://raw.example/a.js",
                "blob_url": "https://github.com/octo/app/blob/a.js"
            }
        ]
    })
}

#[get("/repos/{owner}/{name}/commits/{sha}")]
async fn get_commit(
    req: HttpRequest,
    state: SharedState,
    path: web::Path<(String, String, String)>,
) -> HttpResponse {
    let hits = record(&state, &req);
    let (_, _, sha) = path.into_inner();

    match sha.as_str() {
        "flaky" if hits <= 2 => HttpResponse::BadGateway().body("upstream hiccup"),
        "down" => HttpResponse::BadGateway().body("upstream down"),
        "missing" => HttpResponse::NotFound().json(json!({ "message": "Not Found" })),
        "locked" => HttpResponse::Unauthorized().json(json!({ "message": "Bad credentials" })),
        "garbled" => HttpResponse::Ok()
            .content_type("application/json")
            .body("<html>not json</html>"),
        "nameless" => HttpResponse::Ok().json(commit_detail(&sha, "")),
        _ => HttpResponse::Ok().json(commit_detail(&sha, "src/a.js")),
    }
}

#[get("/raw/{file}")]
async fn raw_file(req: HttpRequest, state: SharedState) -> HttpResponse {
    record(&state, &req);
    HttpResponse::Ok().body("console.log('hi');\n")
}

/// Mock GitHub server on an ephemeral port.
pub struct MockGitHub {
    pub url: String,
    pub state: Arc<Mutex<MockGitHubState>>,
}

impl MockGitHub {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockGitHubState::default()));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{}", port);

        let state_data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state_data.clone()))
                .service(list_repos)
                .service(list_commits)
                .service(get_commit)
                .service(raw_file)
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        tokio::spawn(server);

        MockGitHub { url, state }
    }

    /// Client pointed at this mock with a fast retry policy.
    pub fn client(&self) -> GitHubClient {
        GitHubClient::new(&GitHubApiSettings {
            api_url: self.url.clone(),
            service_token: None,
            max_attempts: 3,
            retry_base_ms: 10,
            request_timeout: Duration::from_secs(5),
            raw_fetch_timeout: Duration::from_secs(2),
        })
        .expect("failed to build client")
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

pub fn token() -> SecretString {
    SecretString::from(TOKEN)
}
