use actix_web::http::StatusCode;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared state behind the mock on-page and page-speed APIs
pub struct MockState {
    pub submit_response: Mutex<(u16, Value)>,
    pub submit_bodies: Mutex<Vec<Value>>,
    pub auth_headers: Mutex<Vec<String>>,
    pub status_script: Mutex<VecDeque<(u16, Value)>>,
    pub status_calls: AtomicUsize,
    pub speed_requests: Mutex<Vec<HashMap<String, String>>>,
    pub failing_strategy: Mutex<Option<String>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            submit_response: Mutex::new((200, task_created("task-123"))),
            submit_bodies: Mutex::new(Vec::new()),
            auth_headers: Mutex::new(Vec::new()),
            status_script: Mutex::new(VecDeque::new()),
            status_calls: AtomicUsize::new(0),
            speed_requests: Mutex::new(Vec::new()),
            failing_strategy: Mutex::new(None),
        }
    }
}

#[allow(dead_code)]
impl MockState {
    pub fn set_submit_response(&self, status: u16, body: Value) {
        *self.submit_response.lock().unwrap() = (status, body);
    }

    pub fn push_status(&self, status: u16, body: Value) {
        self.status_script.lock().unwrap().push_back((status, body));
    }

    pub fn fail_strategy(&self, strategy: &str) {
        *self.failing_strategy.lock().unwrap() = Some(strategy.to_string());
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[allow(dead_code)]
pub fn task_created(id: &str) -> Value {
    json!({
        "status_code": 20000,
        "status_message": "Ok.",
        "tasks": [{
            "id": id,
            "status_code": 20100,
            "status_message": "Task Created.",
            "result": null
        }]
    })
}

#[allow(dead_code)]
pub fn not_ready() -> Value {
    json!({
        "status_code": 20000,
        "status_message": "Ok.",
        "tasks": [{
            "id": "task-123",
            "status_code": 20000,
            "status_message": "Ok.",
            "result": null
        }]
    })
}

#[allow(dead_code)]
pub fn summary(progress: &str, pages_crawled: u64) -> Value {
    json!({
        "status_code": 20000,
        "status_message": "Ok.",
        "tasks": [{
            "id": "task-123",
            "status_code": 20000,
            "status_message": "Ok.",
            "result": [{
                "crawl_progress": progress,
                "crawl_status": {
                    "max_crawl_pages": 10,
                    "pages_in_queue": 0,
                    "pages_crawled": pages_crawled
                },
                "crawl_gateway_address": "168.119.141.170",
                "domain_info": { "name": "example.com", "cms": null },
                "page_metrics": {
                    "onpage_score": 87.5,
                    "links_external": 3,
                    "links_internal": 24,
                    "broken_links": 1,
                    "broken_resources": 0,
                    "duplicate_title": 2,
                    "duplicate_description": 0,
                    "checks": {
                        "no_description": 2,
                        "no_h1_tag": 0,
                        "is_broken": 1
                    }
                }
            }]
        }]
    })
}

#[allow(dead_code)]
pub fn category_score(strategy: &str, category: &str) -> f64 {
    match (strategy, category) {
        ("mobile", "performance") => 0.45,
        ("desktop", "performance") => 0.92,
        (_, "accessibility") => 0.88,
        _ => 1.0,
    }
}

async fn task_post(
    state: web::Data<MockState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    if let Some(auth) = req.headers().get("authorization")
        && let Ok(auth) = auth.to_str()
    {
        state.auth_headers.lock().unwrap().push(auth.to_string());
    }
    state.submit_bodies.lock().unwrap().push(body.into_inner());

    let (status, response) = state.submit_response.lock().unwrap().clone();
    HttpResponse::build(StatusCode::from_u16(status).unwrap()).json(response)
}

async fn task_summary(state: web::Data<MockState>, _id: web::Path<String>) -> HttpResponse {
    state.status_calls.fetch_add(1, Ordering::SeqCst);
    let (status, response) = state
        .status_script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| (200, not_ready()));
    HttpResponse::build(StatusCode::from_u16(status).unwrap()).json(response)
}

async fn run_pagespeed(
    state: web::Data<MockState>,
    query: web::Query<HashMap<String, String>>,
) -> HttpResponse {
    let query = query.into_inner();
    state.speed_requests.lock().unwrap().push(query.clone());

    let strategy = query.get("strategy").cloned().unwrap_or_default();
    if state.failing_strategy.lock().unwrap().as_deref() == Some(strategy.as_str()) {
        return HttpResponse::InternalServerError().json(json!({
            "error": { "code": 500, "message": "Lighthouse returned error: FAILED_DOCUMENT_REQUEST" }
        }));
    }

    let category = query
        .get("category")
        .map(|c| c.to_lowercase().replace('_', "-"))
        .unwrap_or_default();
    let score = category_score(&strategy, &category);

    let mut categories = serde_json::Map::new();
    categories.insert(
        category.clone(),
        json!({ "id": category, "title": category.to_uppercase(), "score": score }),
    );
    let mut audits = serde_json::Map::new();
    audits.insert(
        format!("{}-audit", category),
        json!({ "id": format!("{}-audit", category), "score": score, "displayValue": "1.2 s" }),
    );

    HttpResponse::Ok().json(json!({
        "id": query.get("url"),
        "lighthouseResult": { "categories": categories, "audits": audits }
    }))
}

/// Starts a mock server on a random port and returns its base URL
pub async fn start_mock_server(state: web::Data<MockState>) -> String {
    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/v3/on_page/task_post", web::post().to(task_post))
            .route("/v3/on_page/summary/{id}", web::get().to(task_summary))
            .route(
                "/pagespeedonline/v5/runPagespeed",
                web::get().to(run_pagespeed),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind mock server");

    let addr = http_server
        .addrs()
        .first()
        .cloned()
        .expect("No address bound");
    let url = format!("http://{}", addr);

    let app_server = http_server.run();

    tokio::spawn(async move {
        if let Err(e) = app_server.await {
            eprintln!("Mock server error: {}", e);
        }
    });

    url
}

#[allow(dead_code)]
pub fn onpage_base(server_url: &str) -> String {
    format!("{}/v3", server_url)
}

#[allow(dead_code)]
pub fn pagespeed_base(server_url: &str) -> String {
    format!("{}/pagespeedonline/v5", server_url)
}
