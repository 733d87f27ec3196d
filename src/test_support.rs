use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use axum::{
    body::{to_bytes, Body},
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, redis::RedisHandle, state::AppState};
use crate::services::upstream::UpstreamClient;

pub(crate) const ADMIN_TOKEN: &str = "admin-token";
pub(crate) const TEACHER_TOKEN: &str = "teacher-token";
pub(crate) const STUDENT_TOKEN: &str = "student-token";
/// A student without any quiz attempts.
pub(crate) const FRESH_STUDENT_TOKEN: &str = "student2-token";
pub(crate) const ONLINE_USER_IDS: [&str; 3] = ["a1", "t1", "s1"];

/// A lesson plan the teacher-tools service refuses to delete.
pub(crate) const LOCKED_LESSON_ID: &str = "l-locked";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) upstream: StubUpstream,
    _guard: OwnedMutexGuard<()>,
}

impl TestContext {
    /// Same gateway, but loaded with a presence service token.
    pub(crate) fn state_with_service_token(&self, token: &str) -> AppState {
        std::env::set_var("SERVICE_TOKEN", token);
        let settings = Settings::load();
        std::env::remove_var("SERVICE_TOKEN");
        build_state(settings.expect("settings"))
    }
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

/// Points every service at `base_url` and resets the tunables tests rely on.
pub(crate) fn set_test_env(base_url: &str) {
    std::env::set_var("LEARNBRIDGE_ENV", "test");
    std::env::set_var("LEARNBRIDGE_STRICT_CONFIG", "0");
    for name in [
        "AUTH_SERVICE_URL",
        "TEACHER_TOOLS_URL",
        "QUIZ_SERVICE_URL",
        "CONTENT_SERVICE_URL",
        "LEARNING_PATH_URL",
        "FORUM_SERVICE_URL",
        "AI_SERVICE_URL",
    ] {
        std::env::set_var(name, base_url);
    }
    std::env::set_var("REDIS_HOST", "127.0.0.1");
    std::env::set_var("REDIS_PORT", "6379");
    std::env::remove_var("REDIS_PASSWORD");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("SERVICE_TOKEN");
    for name in [
        "LIST_PAGE_SIZE",
        "MAX_PAGE_SIZE",
        "MAX_UPLOAD_SIZE_MB",
        "ALLOWED_UPLOAD_EXTENSIONS",
        "PRESENCE_REFRESH_SECONDS",
        "UPSTREAM_TIMEOUT_SECONDS",
        "API_PREFIX",
        "COLLECTION_CACHE_BACKEND",
        "COLLECTION_CACHE_SECONDS",
    ] {
        std::env::remove_var(name);
    }
}

pub(crate) fn build_state(settings: Settings) -> AppState {
    // Never connected: Redis-backed caches stay empty and rate limits always pass.
    let redis = RedisHandle::new(settings.redis().redis_url());
    let upstream = UpstreamClient::from_settings(&settings).expect("upstream client");
    AppState::new(settings, redis, upstream)
}

pub(crate) async fn setup_test_context() -> TestContext {
    start_context(false).await
}

/// Same as `setup_test_context`, but list snapshots are kept in memory so
/// paging and mutations hit the cache.
pub(crate) async fn setup_cached_test_context() -> TestContext {
    start_context(true).await
}

async fn start_context(cached: bool) -> TestContext {
    let guard = env_lock().await;
    let upstream = StubUpstream::start().await;
    set_test_env(&upstream.base_url);
    if cached {
        std::env::set_var("COLLECTION_CACHE_BACKEND", "memory");
    }

    let settings = Settings::load().expect("settings");
    let state = build_state(settings);
    let app = api::router::router(state.clone());

    TestContext { state, app, upstream, _guard: guard }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: Response<Body>) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}

/// In-process stand-in for every LearnBridge service, bound to an ephemeral
/// port for the lifetime of one test.
pub(crate) struct StubUpstream {
    pub(crate) base_url: String,
    data: Arc<StdMutex<StubData>>,
}

impl StubUpstream {
    pub(crate) async fn start() -> Self {
        let data = Arc::new(StdMutex::new(StubData::fixtures()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let app = stub_router(data.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url: format!("http://{addr}"), data }
    }

    /// Number of calls whose `"<METHOD> <path>"` starts with `prefix`.
    pub(crate) fn calls_matching(&self, prefix: &str) -> usize {
        self.data().calls.iter().filter(|call| call.starts_with(prefix)).count()
    }

    pub(crate) fn clear_users(&self) {
        self.data().users.clear();
    }

    pub(crate) fn rename_lesson(&self, id: &str, title: &str) {
        if let Some(lessons) = self.data().documents.get_mut("lessons") {
            for lesson in lessons.iter_mut().filter(|lesson| lesson["id"] == id) {
                lesson["title"] = json!(title);
            }
        }
    }

    /// Delays every `/api/users/online` response by `delay`.
    pub(crate) fn slow_online_users(&self, delay: std::time::Duration) {
        self.data().online_delay = delay;
    }

    pub(crate) fn lock_thread(&self, id: &str) {
        for thread in self.data().threads.iter_mut().filter(|thread| thread["id"] == id) {
            thread["is_locked"] = json!(true);
        }
    }

    fn data(&self) -> std::sync::MutexGuard<'_, StubData> {
        self.data.lock().expect("stub data")
    }
}

struct StubData {
    users: Vec<Value>,
    documents: HashMap<String, Vec<Value>>,
    quizzes: Vec<Value>,
    questions: HashMap<String, Vec<Value>>,
    attempts: Vec<Value>,
    threads: Vec<Value>,
    calls: Vec<String>,
    online_delay: std::time::Duration,
    next_id: u64,
}

fn user(id: &str, first: &str, last: &str, role: &str, school: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{}@learnbridge.io", first.to_lowercase()),
        "firstName": first,
        "lastName": last,
        "role": role,
        "school": school,
        "is_online": ONLINE_USER_IDS.contains(&id),
        "created_at": "2025-01-10T09:00:00Z"
    })
}

fn document(id: &str, title: &str, subject: &str, topic: &str) -> Value {
    json!({
        "id": id,
        "user_id": "t1",
        "title": title,
        "subject": subject,
        "grade": "7",
        "topic": topic,
        "content": format!("# {title}\n\nObjectives..."),
        "created_at": "2025-02-01T08:00:00Z",
        "updated_at": "2025-02-01T08:00:00Z"
    })
}

fn questions(quiz_id: &str, count: usize) -> Vec<Value> {
    (1..=count)
        .map(|index| {
            json!({
                "id": format!("{quiz_id}-{index}"),
                "question_type": "multiple_choice",
                "question_text": format!("Question {index}?"),
                "options": ["A", "B", "C", "D"],
                "correct_answer": "A"
            })
        })
        .collect()
}

impl StubData {
    fn fixtures() -> Self {
        let users = vec![
            user("a1", "Ada", "Lovelace", "admin", "Central Office"),
            user("a2", "Grace", "Hopper", "admin", "Central Office"),
            user("t1", "Tess", "Ng", "teacher", "Riverside High"),
            user("t2", "Linus", "Park", "teacher", "Riverside High"),
            user("t3", "Barbara", "Liskov", "teacher", "Hillview Middle"),
            user("s1", "Sam", "Rivera", "student", "Riverside High"),
            user("s2", "Alex", "Kim", "student", "Riverside High"),
            user("s3", "Jo", "Chen", "student", "Hillview Middle"),
            user("s4", "Kim", "Lee", "student", "Hillview Middle"),
            user("s5", "Lee", "Moss", "student", "Riverside High"),
        ];

        let mut documents = HashMap::new();
        documents.insert(
            "lessons".to_string(),
            vec![
                document("l1", "Photosynthesis Basics", "Biology", "Plants"),
                document("l2", "Fractions on a Number Line", "Math", "Fractions"),
                document("l3", "Cell Division", "Biology", "Cells"),
                document(LOCKED_LESSON_ID, "Locked Lesson", "History", "Archives"),
            ],
        );
        documents.insert(
            "assessments".to_string(),
            vec![document("as1", "Equations Checkpoint", "Math", "Equations")],
        );
        documents.insert(
            "rubrics".to_string(),
            vec![document("r1", "Lab Report Rubric", "Biology", "Lab work")],
        );
        documents.insert("tos".to_string(), Vec::new());

        let quizzes = vec![
            json!({"id": "q1", "title": "Algebra Basics", "subject": "Math", "book": "Math 7", "topic": "Equations", "question_count": 10}),
            json!({"id": "q2", "title": "Cell Biology", "subject": "Biology", "book": "Biology 7", "topic": "Cells", "question_count": 2}),
            json!({"id": "q3", "title": "Fractions Review", "subject": "Math", "book": "Math 6", "topic": "Fractions", "question_count": 2}),
        ];
        let mut question_bank = HashMap::new();
        question_bank.insert("q1".to_string(), questions("q1", 10));
        question_bank.insert("q2".to_string(), questions("q2", 2));
        question_bank.insert("q3".to_string(), questions("q3", 2));

        let attempts = vec![json!({
            "id": "att-1",
            "quiz_id": "q2",
            "user_id": "s1",
            "quiz_title": "Cell Biology",
            "score": 1,
            "total": 2,
            "percentage": 50.0,
            "submitted_at": "2025-03-02T10:00:00Z"
        })];

        let threads = vec![
            json!({"id": "th1", "category_id": "c1", "title": "Welcome to the forum", "author_name": "Ada Lovelace", "preview": "Read the rules first", "is_pinned": true, "reply_count": 3, "last_activity_at": "2025-01-05T12:00:00Z"}),
            json!({"id": "th2", "category_id": "c2", "title": "Help with fractions", "author_name": "Sam Rivera", "preview": "How do I add 1/3 and 1/4?", "reply_count": 1, "last_activity_at": "2025-03-01T15:30:00Z"}),
            json!({"id": "th3", "category_id": "c1", "title": "Old announcement", "author_name": "Grace Hopper", "preview": "Archived", "is_locked": true, "reply_count": 0, "last_activity_at": "2024-11-20T08:00:00Z"}),
        ];

        Self {
            users,
            documents,
            quizzes,
            questions: question_bank,
            attempts,
            threads,
            calls: Vec::new(),
            online_delay: std::time::Duration::ZERO,
            next_id: 100,
        }
    }

    fn caller(&self, headers: &HeaderMap) -> Option<Value> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let id = match token {
            ADMIN_TOKEN => "a1",
            TEACHER_TOKEN => "t1",
            STUDENT_TOKEN => "s1",
            FRESH_STUDENT_TOKEN => "s2",
            _ => return None,
        };
        self.users.iter().find(|user| user["id"] == id).cloned().or_else(|| {
            // users may have been cleared by a test; sessions still resolve
            StubData::fixtures().users.into_iter().find(|user| user["id"] == id)
        })
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

type Stub = Arc<StdMutex<StubData>>;

fn lock(stub: &Stub) -> std::sync::MutexGuard<'_, StubData> {
    stub.lock().expect("stub data")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn record(stub: &Stub, method: &str, path: String) {
    lock(stub).calls.push(format!("{method} {path}"));
}

fn stub_router(data: Stub) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/api/auth/me", get(auth_me))
        .route("/api/users", get(list_users))
        .route("/api/users/online", get(online_users))
        .route("/api/users/:id", get(get_user))
        .route("/api/users/:id/role", put(update_role))
        .route("/api/teacher-tools/:kind", get(list_documents))
        .route(
            "/api/teacher-tools/:kind/:id",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route("/api/quizzes", get(list_quizzes))
        .route("/api/quizzes/:id/questions", get(quiz_questions))
        .route("/api/quizzes/attempts/my", get(my_attempts))
        .route("/api/quizzes/attempts/:id", post(submit_attempt))
        .route("/api/quizzes/attempts/:id/review", get(review_attempt))
        .route("/api/daily-quizzes/today", get(daily_today))
        .route("/api/daily-quizzes/history", get(daily_history))
        .route("/api/daily-quizzes/:id/submit", post(daily_submit))
        .route("/api/content/upload/sbc", post(upload_sbc))
        .route("/api/content/textbooks/:id", get(textbook))
        .route("/api/ask", post(ask))
        .route("/api/learning-paths", get(learning_paths))
        .route("/api/learning-paths/skills", get(skills))
        .route("/api/learning-paths/achievements", get(achievements))
        .route("/api/learning-paths/progress", get(progress))
        .route("/api/learning-paths/recommendations", get(recommendations))
        .route("/api/learning-paths/:id", get(learning_path))
        .route("/api/learning-paths/:id/enroll", post(enroll))
        .route("/api/forum/categories", get(forum_categories))
        .route("/api/forum/threads", get(forum_threads).post(create_thread))
        .route("/api/forum/threads/:id", get(forum_thread).delete(delete_thread))
        .route("/api/forum/threads/:id/posts", post(create_post))
        .route("/api/forum/posts/:id/report", post(report_post))
        .with_state(data)
}

async fn auth_me(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    record(&stub, "GET", "/api/auth/me".to_string());
    match lock(&stub).caller(&headers) {
        Some(user) => Json(json!({ "user": user })).into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Invalid token"),
    }
}

async fn list_users(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/users".to_string());
    Json(json!({ "users": lock(&stub).users })).into_response()
}

async fn online_users(State(stub): State<Stub>) -> Response {
    let delay = lock(&stub).online_delay;
    tokio::time::sleep(delay).await;
    record(&stub, "GET", "/api/users/online".to_string());
    let online: Vec<Value> = ONLINE_USER_IDS.iter().map(|id| json!({ "id": id })).collect();
    Json(json!(online)).into_response()
}

async fn get_user(State(stub): State<Stub>, Path(id): Path<String>) -> Response {
    record(&stub, "GET", format!("/api/users/{id}"));
    match lock(&stub).users.iter().find(|user| user["id"] == id.as_str()) {
        Some(user) => Json(user.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_role(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&stub, "PUT", format!("/api/users/{id}/role"));
    let mut data = lock(&stub);
    match data.users.iter_mut().find(|user| user["id"] == id.as_str()) {
        Some(user) => {
            user["role"] = body["role"].clone();
            Json(json!({ "user": user.clone() })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn list_documents(State(stub): State<Stub>, Path(kind): Path<String>) -> Response {
    record(&stub, "GET", format!("/api/teacher-tools/{kind}"));
    let data = lock(&stub);
    match data.documents.get(&kind) {
        Some(items) => Json(json!({ kind.as_str(): items })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Unknown document type"),
    }
}

async fn get_document(
    State(stub): State<Stub>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    record(&stub, "GET", format!("/api/teacher-tools/{kind}/{id}"));
    let data = lock(&stub);
    let found = data
        .documents
        .get(&kind)
        .and_then(|items| items.iter().find(|item| item["id"] == id.as_str()));
    match found {
        Some(item) => Json(item.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Document not found"),
    }
}

async fn update_document(
    State(stub): State<Stub>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    record(&stub, "PUT", format!("/api/teacher-tools/{kind}/{id}"));
    let mut data = lock(&stub);
    let found = data
        .documents
        .get_mut(&kind)
        .and_then(|items| items.iter_mut().find(|item| item["id"] == id.as_str()));
    let Some(item) = found else {
        return error(StatusCode::NOT_FOUND, "Document not found");
    };
    if let (Some(target), Some(changes)) = (item.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
        target.insert("updated_at".to_string(), json!("2025-04-01T00:00:00Z"));
    }
    Json(item.clone()).into_response()
}

async fn delete_document(
    State(stub): State<Stub>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    record(&stub, "DELETE", format!("/api/teacher-tools/{kind}/{id}"));
    if id == LOCKED_LESSON_ID {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Lesson plan is locked");
    }
    let mut data = lock(&stub);
    let Some(items) = data.documents.get_mut(&kind) else {
        return error(StatusCode::NOT_FOUND, "Document not found");
    };
    let before = items.len();
    items.retain(|item| item["id"] != id.as_str());
    if items.len() == before {
        return error(StatusCode::NOT_FOUND, "Document not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_quizzes(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/quizzes".to_string());
    Json(json!({ "quizzes": lock(&stub).quizzes })).into_response()
}

async fn quiz_questions(State(stub): State<Stub>, Path(id): Path<String>) -> Response {
    record(&stub, "GET", format!("/api/quizzes/{id}/questions"));
    match lock(&stub).questions.get(&id) {
        Some(questions) => Json(json!({ "questions": questions })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Quiz not found"),
    }
}

async fn my_attempts(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    record(&stub, "GET", "/api/quizzes/attempts/my".to_string());
    let data = lock(&stub);
    let Some(caller) = data.caller(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    };
    let mine: Vec<Value> =
        data.attempts.iter().filter(|attempt| attempt["user_id"] == caller["id"]).cloned().collect();
    Json(json!({ "attempts": mine })).into_response()
}

async fn submit_attempt(
    State(stub): State<Stub>,
    Path(quiz_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&stub, "POST", format!("/api/quizzes/attempts/{quiz_id}"));
    let mut data = lock(&stub);
    let Some(caller) = data.caller(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    };
    if data.attempts.iter().any(|a| a["user_id"] == caller["id"] && a["quiz_id"] == quiz_id.as_str())
    {
        return error(StatusCode::CONFLICT, "Quiz already attempted");
    }
    let Some(questions) = data.questions.get(&quiz_id).cloned() else {
        return error(StatusCode::NOT_FOUND, "Quiz not found");
    };

    let answers = body["answers"].as_array().cloned().unwrap_or_default();
    let score = questions
        .iter()
        .filter(|question| {
            answers.iter().any(|answer| {
                answer["question_id"] == question["id"]
                    && answer["answer"] == question["correct_answer"]
            })
        })
        .count();
    let total = questions.len();
    let title = data
        .quizzes
        .iter()
        .find(|quiz| quiz["id"] == quiz_id.as_str())
        .map(|quiz| quiz["title"].clone())
        .unwrap_or(Value::Null);

    let attempt = json!({
        "id": data.next_id("att"),
        "quiz_id": quiz_id,
        "user_id": caller["id"],
        "quiz_title": title,
        "score": score,
        "total": total,
        "percentage": (score * 100) as f64 / total as f64,
        "submitted_at": "2025-04-02T10:00:00Z"
    });
    data.attempts.push(attempt.clone());
    (StatusCode::CREATED, Json(attempt)).into_response()
}

async fn review_attempt(State(stub): State<Stub>, Path(id): Path<String>) -> Response {
    record(&stub, "GET", format!("/api/quizzes/attempts/{id}/review"));
    match lock(&stub).attempts.iter().find(|attempt| attempt["id"] == id.as_str()) {
        Some(attempt) => {
            let mut review = attempt.clone();
            review["answers"] = json!([{"question_id": "q2-1", "answer": "A", "correct": true}]);
            Json(review).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Attempt not found"),
    }
}

async fn daily_today(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/daily-quizzes/today".to_string());
    Json(json!({
        "id": 7,
        "title": "Daily: Photosynthesis",
        "date": "2025-04-02",
        "questions": [{"id": 1, "question_text": "What gas do plants absorb?", "options": ["CO2", "O2"]}]
    }))
    .into_response()
}

async fn daily_history(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/daily-quizzes/history".to_string());
    let history: Vec<Value> = (1..=12)
        .map(|day| json!({"id": day, "title": format!("Daily #{day}"), "date": format!("2025-03-{day:02}"), "score": day % 3}))
        .collect();
    Json(json!(history)).into_response()
}

async fn daily_submit(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&stub, "POST", format!("/api/daily-quizzes/{id}/submit"));
    let answered = body["answers"].as_array().map(Vec::len).unwrap_or(0);
    Json(json!({"daily_quiz_id": id, "score": answered, "total": 1, "percentage": 100.0}))
        .into_response()
}

async fn upload_sbc(State(stub): State<Stub>, mut multipart: Multipart) -> Response {
    record(&stub, "POST", "/api/content/upload/sbc".to_string());
    let mut filename = None;
    let mut size = 0;
    let mut audience = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(str::to_string);
                size = field.bytes().await.map(|bytes| bytes.len()).unwrap_or(0);
            }
            Some("audience_type") => audience = field.text().await.ok(),
            _ => {}
        }
    }
    match (filename, audience) {
        (Some(filename), Some(audience)) => (
            StatusCode::CREATED,
            Json(json!({"id": "up-1", "filename": filename, "size": size, "audience_type": audience})),
        )
            .into_response(),
        _ => error(StatusCode::BAD_REQUEST, "file and audience_type are required"),
    }
}

async fn textbook(State(stub): State<Stub>, Path(id): Path<String>) -> Response {
    record(&stub, "GET", format!("/api/content/textbooks/{id}"));
    if id != "tb1" {
        return error(StatusCode::NOT_FOUND, "Textbook not found");
    }
    Json(json!({
        "id": "tb1",
        "title": "Biology Grade 7",
        "pages": [
            {"page_number": 1, "content": "Cells are the basic unit of life. Every cell has a membrane."},
            {"page_number": 2, "content": "Plant cells have walls."},
            {"page_number": 3, "content": "Animals move to find food."}
        ]
    }))
    .into_response()
}

async fn ask(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    record(&stub, "POST", "/api/ask".to_string());
    let question = body["question"].as_str().unwrap_or_default();
    Json(json!({
        "answer": format!("Here is a hint about: {question}"),
        "textbook_id": body.get("textbook_id").cloned().unwrap_or(Value::Null)
    }))
    .into_response()
}

fn paths() -> Vec<Value> {
    vec![
        json!({"id": "lp1", "title": "Foundations of Algebra", "description": "Equations and expressions", "subject": "Math", "status": "enrolled", "progress_percentage": 40.0}),
        json!({"id": "lp2", "title": "Intro to Biology", "description": "Cells and organisms", "subject": "Biology", "status": "available", "progress_percentage": 0.0}),
        json!({"id": "lp3", "title": "Reading Skills", "description": "Comprehension practice", "subject": "English", "status": "completed", "progress_percentage": 100.0}),
    ]
}

async fn learning_paths(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/learning-paths".to_string());
    Json(json!({ "paths": paths() })).into_response()
}

async fn learning_path(State(stub): State<Stub>, Path(id): Path<String>) -> Response {
    record(&stub, "GET", format!("/api/learning-paths/{id}"));
    match paths().into_iter().find(|path| path["id"] == id.as_str()) {
        Some(path) => Json(path).into_response(),
        None => error(StatusCode::NOT_FOUND, "Learning path not found"),
    }
}

async fn enroll(State(stub): State<Stub>, Path(id): Path<String>) -> Response {
    record(&stub, "POST", format!("/api/learning-paths/{id}/enroll"));
    match paths().into_iter().find(|path| path["id"] == id.as_str()) {
        Some(mut path) if path["status"] == "available" => {
            path["status"] = json!("enrolled");
            Json(path).into_response()
        }
        Some(_) => error(StatusCode::CONFLICT, "Already enrolled in this learning path"),
        None => error(StatusCode::NOT_FOUND, "Learning path not found"),
    }
}

async fn skills(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/learning-paths/skills".to_string());
    Json(json!({"skills": [
        {"id": "sk1", "name": "Linear equations", "category": "Math", "progress": 60.0},
        {"id": "sk2", "name": "Cell structure", "category": "Biology", "progress": 30.0},
        {"id": "sk3", "name": "Ratios", "category": "Math", "progress": 10.0}
    ]}))
    .into_response()
}

async fn achievements(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/learning-paths/achievements".to_string());
    Json(json!({"achievements": [
        {"id": "ach1", "name": "First Steps", "description": "Finish a lesson", "is_unlocked": true, "unlocked_at": "2025-02-02T10:00:00Z"},
        {"id": "ach2", "name": "Quiz Master", "description": "Score 100% on five quizzes", "is_unlocked": false, "progress": 40.0},
        {"id": "ach3", "name": "Streak", "description": "Seven daily quizzes in a row", "is_unlocked": false, "progress": 70.0}
    ]}))
    .into_response()
}

async fn progress(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/learning-paths/progress".to_string());
    Json(json!({"overall_percentage": 47.5, "paths_enrolled": 1, "paths_completed": 1}))
        .into_response()
}

async fn recommendations(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/learning-paths/recommendations".to_string());
    Json(json!([{"id": "lp2", "title": "Intro to Biology", "reason": "Matches your recent quizzes"}]))
        .into_response()
}

async fn forum_categories(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/forum/categories".to_string());
    Json(json!({"categories": [
        {"id": "c1", "name": "General", "description": "Announcements and chatter", "thread_count": 2},
        {"id": "c2", "name": "Homework Help", "description": "Ask for help", "thread_count": 1}
    ]}))
    .into_response()
}

async fn forum_threads(State(stub): State<Stub>) -> Response {
    record(&stub, "GET", "/api/forum/threads".to_string());
    Json(json!({ "threads": lock(&stub).threads })).into_response()
}

async fn forum_thread(State(stub): State<Stub>, Path(id): Path<String>) -> Response {
    record(&stub, "GET", format!("/api/forum/threads/{id}"));
    match lock(&stub).threads.iter().find(|thread| thread["id"] == id.as_str()) {
        Some(thread) => Json(json!({
            "thread": thread,
            "posts": [{"id": "p1", "author_name": "Tess Ng", "body": "Welcome everyone!"}]
        }))
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "Thread not found"),
    }
}

async fn create_thread(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&stub, "POST", "/api/forum/threads".to_string());
    let mut data = lock(&stub);
    let author = data
        .caller(&headers)
        .map(|user| {
            let first = user["firstName"].as_str().unwrap_or_default().to_string();
            let last = user["lastName"].as_str().unwrap_or_default();
            format!("{first} {last}")
        })
        .unwrap_or_default();
    let thread = json!({
        "id": data.next_id("th"),
        "category_id": body["category_id"],
        "title": body["title"],
        "author_name": author,
        "preview": body["body"],
        "reply_count": 0,
        "last_activity_at": "2025-04-02T09:00:00Z"
    });
    data.threads.insert(0, thread.clone());
    (StatusCode::CREATED, Json(thread)).into_response()
}

async fn delete_thread(State(stub): State<Stub>, Path(id): Path<String>) -> Response {
    record(&stub, "DELETE", format!("/api/forum/threads/{id}"));
    let mut data = lock(&stub);
    let before = data.threads.len();
    data.threads.retain(|thread| thread["id"] != id.as_str());
    if data.threads.len() == before {
        return error(StatusCode::NOT_FOUND, "Thread not found");
    }
    Json(json!({"deleted": id})).into_response()
}

async fn create_post(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&stub, "POST", format!("/api/forum/threads/{id}/posts"));
    let mut data = lock(&stub);
    if let Some(thread) = data.threads.iter().find(|thread| thread["id"] == id.as_str()) {
        if thread["is_locked"] == true {
            return error(StatusCode::FORBIDDEN, "Thread is locked");
        }
    } else {
        return error(StatusCode::NOT_FOUND, "Thread not found");
    }
    let post_id = data.next_id("p");
    (StatusCode::CREATED, Json(json!({"id": post_id, "thread_id": id, "body": body["body"]})))
        .into_response()
}

async fn report_post(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&stub, "POST", format!("/api/forum/posts/{id}/report"));
    Json(json!({"post_id": id, "reason": body["reason"], "status": "reported"})).into_response()
}
