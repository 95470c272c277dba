use std::sync::{
  Arc, Mutex,
  atomic::{AtomicUsize, Ordering},
};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Json, Router,
  body::Body,
  extract::{Path, State},
  http::{Request, StatusCode, header},
  routing::{get, post},
};
use chrono::NaiveDate;
use claimdesk_core::{
  store::ClaimStore as _,
  user::{NewUser, User},
  workflow::demo_risk_score,
};
use claimdesk_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;
use crate::{
  config::{AdminAccount, WebhookConfig},
  session::Principal,
};

// ─── Fake upstreams ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Upstream {
  uploads:   AtomicUsize,
  extracted: Mutex<Vec<String>>,
  completed: Mutex<Vec<String>>,
}

/// One router standing in for the document platform, the extraction
/// gateway, the automation tool and the workflow engine.
fn upstream(state: Arc<Upstream>) -> Router {
  Router::new()
    .route("/2.0/folders", post(|| async { Json(json!({ "id": "F1", "type": "folder" })) }))
    .route(
      "/2.0/files/content",
      post(|State(u): State<Arc<Upstream>>| async move {
        let n = u.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({ "entries": [{ "id": format!("file-{n}"), "name": format!("doc-{n}.pdf"), "size": 3 }] }))
      }),
    )
    .route("/webhook/claim-submitted", post(|| async { Json(json!({ "ok": true })) }))
    .route(
      "/extract",
      post(|State(u): State<Arc<Upstream>>, Json(body): Json<Value>| async move {
        let file_id = body["fileId"].as_str().unwrap_or_default().to_string();
        u.extracted.lock().unwrap().push(file_id.clone());
        Json(json!({
          "success": true,
          "fileId": file_id,
          "timestamp": "2026-01-01T00:00:00Z",
          "data": { "claimant_name": "Ada" },
        }))
      }),
    )
    .route(
      "/engine-rest/process-definition/key/claim_process/start",
      post(|| async { Json(json!({ "id": "PI-1", "ended": false, "suspended": false })) }),
    )
    .route(
      "/engine-rest/process-instance/{id}",
      get(|Path(id): Path<String>| async move { Json(json!({ "id": id, "ended": false, "suspended": false })) }),
    )
    .route(
      "/engine-rest/process-instance/{id}/variables/riskScore",
      get(|| async { Json(json!({ "value": 42.0, "type": "Double" })) }),
    )
    .route(
      "/engine-rest/task",
      get(|| async { Json(json!([{ "id": "T1", "name": "Adjuster Review", "taskDefinitionKey": "adjuster_review" }])) }),
    )
    .route(
      "/engine-rest/task/{id}/complete",
      post(|State(u): State<Arc<Upstream>>, Path(id): Path<String>| async move {
        u.completed.lock().unwrap().push(id);
        StatusCode::NO_CONTENT
      }),
    )
    .route("/engine-rest/message", post(|| async { StatusCode::NO_CONTENT }))
    .with_state(state)
}

async fn spawn(app: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}")
}

const UNREACHABLE: &str = "http://127.0.0.1:1";

fn hash(password: &str) -> String {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default().hash_password(password.as_bytes(), &salt).unwrap().to_string()
}

fn config_for(base: &str) -> PortalConfig {
  let mut cfg = PortalConfig::default();
  cfg.box_api.api_url = base.to_string();
  cfg.box_api.upload_url = base.to_string();
  cfg.box_api.developer_token = Some("dev".into());
  cfg.automation.base_url = base.to_string();
  cfg.extraction.base_url = base.to_string();
  cfg.workflow.base_url = format!("{base}/engine-rest");
  cfg.admins = vec![AdminAccount { username: "adjuster".into(), password_hash: hash("admin-pw") }];
  cfg
}

struct Harness {
  state:    AppState<SqliteStore>,
  upstream: Arc<Upstream>,
  member:   User,
}

impl Harness {
  async fn new(tweak: impl FnOnce(&mut PortalConfig, &str)) -> Self {
    let upstream = Arc::new(Upstream::default());
    let base = spawn(self::upstream(upstream.clone())).await;
    let mut cfg = config_for(&base);
    tweak(&mut cfg, &base);

    let store = SqliteStore::open_in_memory().await.unwrap();
    let member = store
      .upsert_user(NewUser {
        name:          "Ada Lovelace".into(),
        email:         "ada@example.com".into(),
        password_hash: hash("member-pw"),
        policy_number: "POL-1001".into(),
        member_since:  NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
      })
      .await
      .unwrap();

    Self { state: AppState::new(store, cfg, reqwest::Client::new()), upstream, member }
  }

  async fn member_cookie(&self) -> String {
    let token = self
      .state
      .sessions
      .create(Principal::Member {
        user_id: self.member.user_id,
        email:   self.member.email.clone(),
        name:    self.member.name.clone(),
      })
      .await;
    format!("{}={token}", session::COOKIE_NAME)
  }

  async fn admin_cookie(&self) -> String {
    let token = self.state.sessions.create(Principal::Admin { username: "adjuster".into() }).await;
    format!("{}={token}", session::COOKIE_NAME)
  }

  async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router(self.state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  async fn json(&self, method: &str, uri: &str, cookie: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
      req = req.header(header::COOKIE, c);
    }
    self.send(req.body(Body::from(body.to_string())).unwrap()).await
  }

  async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::builder().uri(uri);
    if let Some(c) = cookie {
      req = req.header(header::COOKIE, c);
    }
    self.send(req.body(Body::empty()).unwrap()).await
  }

  async fn submit(&self, cookie: &str, fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> (StatusCode, Value) {
    let (content_type, body) = multipart(fields, files);
    let req = Request::builder()
      .method("POST")
      .uri("/api/claims")
      .header(header::CONTENT_TYPE, content_type)
      .header(header::COOKIE, cookie)
      .body(Body::from(body))
      .unwrap();
    self.send(req).await
  }
}

const BOUNDARY: &str = "claimdesk-test-boundary";

fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
  let mut body = Vec::new();
  for (name, value) in fields {
    body.extend_from_slice(
      format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
    );
  }
  for (file_name, content_type, data) in files {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
  (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

const CLAIM_FIELDS: [(&str, &str); 4] = [
  ("claimType", "auto"),
  ("description", "Rear-ended at a junction"),
  ("incidentDate", "2026-02-14"),
  ("estimatedAmount", "7250"),
];

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_session() {
  let h = Harness::new(|_, _| {}).await;
  let (status, body) = h.get("/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn member_login_sets_cookie() {
  let h = Harness::new(|_, _| {}).await;
  let req = Request::builder()
    .method("POST")
    .uri("/api/auth/login")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(json!({ "email": "ADA@example.com", "password": "member-pw" }).to_string()))
    .unwrap();
  let resp = router(h.state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
  assert!(cookie.starts_with("claimdesk_session="));
  assert!(cookie.contains("HttpOnly"));

  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["user"]["email"], "ada@example.com");
  assert!(body["user"].get("passwordHash").is_none());

  let session = cookie.split(';').next().unwrap();
  let (status, me) = h.get("/api/auth/me", Some(session)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["role"], "member");
}

#[tokio::test]
async fn wrong_password_is_401() {
  let h = Harness::new(|_, _| {}).await;
  let (status, _) = h
    .json("POST", "/api/auth/login", None, json!({ "email": "ada@example.com", "password": "nope" }))
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = h
    .json("POST", "/api/admin/login", None, json!({ "username": "admin", "password": "admin" }))
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_login_with_configured_account() {
  let h = Harness::new(|_, _| {}).await;
  let (status, body) = h
    .json("POST", "/api/admin/login", None, json!({ "username": "adjuster", "password": "admin-pw" }))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["admin"]["username"], "adjuster");
}

#[tokio::test]
async fn missing_session_is_401_and_member_on_admin_route_is_403() {
  let h = Harness::new(|_, _| {}).await;
  assert_eq!(h.get("/api/claims", None).await.0, StatusCode::UNAUTHORIZED);
  assert_eq!(h.get("/api/claims", Some("claimdesk_session=stale")).await.0, StatusCode::UNAUTHORIZED);

  let member = h.member_cookie().await;
  assert_eq!(h.get("/api/admin/claims", Some(&member)).await.0, StatusCode::FORBIDDEN);

  let admin = h.admin_cookie().await;
  assert_eq!(h.get("/api/claims", Some(&admin)).await.0, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_ends_session() {
  let h = Harness::new(|_, _| {}).await;
  let cookie = h.member_cookie().await;
  let (status, _) = h.json("POST", "/api/auth/logout", Some(&cookie), Value::Null).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(h.get("/api/claims", Some(&cookie)).await.0, StatusCode::UNAUTHORIZED);
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submission_extracts_only_the_first_uploaded_file() {
  let h = Harness::new(|_, _| {}).await;
  let cookie = h.member_cookie().await;
  let (status, body) = h
    .submit(
      &cookie,
      &CLAIM_FIELDS,
      &[("a.pdf", "application/pdf", b"one"), ("b.png", "image/png", b"two")],
    )
    .await;

  assert_eq!(status, StatusCode::CREATED, "{body}");
  let claim = &body["claim"];
  assert_eq!(claim["status"], "submitted");
  assert_eq!(claim["folderId"], "F1");
  assert_eq!(claim["files"].as_array().unwrap().len(), 2);
  assert_eq!(claim["extraction"]["claimant_name"], "Ada");
  assert_eq!(claim["workflow"]["processKey"], "PI-1");
  assert_eq!(claim["workflow"]["workflowStatus"], "ACTIVE");
  assert_eq!(claim["workflow"]["riskScore"], 42.0);
  assert_eq!(claim["workflow"]["degraded"], false);
  assert_eq!(body["report"]["degraded"], false);

  assert_eq!(*h.upstream.extracted.lock().unwrap(), vec!["file-1".to_string()]);
}

#[tokio::test]
async fn unreachable_engine_falls_back_to_demo_process() {
  let h = Harness::new(|cfg, _| cfg.workflow.base_url = UNREACHABLE.into()).await;
  let cookie = h.member_cookie().await;
  let (status, body) = h.submit(&cookie, &CLAIM_FIELDS, &[]).await;

  assert_eq!(status, StatusCode::CREATED, "{body}");
  let wf = &body["claim"]["workflow"];
  assert!(wf["processKey"].as_str().unwrap().starts_with("DEMO-"));
  assert_eq!(wf["workflowStatus"], "DEMO");
  assert_eq!(wf["riskScore"], demo_risk_score(7250.0));
  assert_eq!(wf["degraded"], true);
  assert_eq!(body["report"]["degraded"], true);
  assert!(h.upstream.extracted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn storage_outage_still_records_the_claim() {
  let h = Harness::new(|cfg, _| {
    cfg.box_api.api_url = UNREACHABLE.into();
    cfg.box_api.upload_url = UNREACHABLE.into();
  })
  .await;
  let cookie = h.member_cookie().await;
  let (status, body) = h.submit(&cookie, &CLAIM_FIELDS, &[("a.pdf", "application/pdf", b"x")]).await;

  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert!(body["claim"]["folderId"].is_null());
  assert!(body["claim"]["files"].as_array().unwrap().is_empty());
  assert!(body["claim"]["extraction"].is_null());
  let steps = body["report"]["steps"].as_array().unwrap();
  assert!(steps.iter().any(|s| s["step"] == "folder" && s["ok"] == false));
}

// ─── Submission failures after side effects ──────────────────────────────────

/// Document platform whose folder endpoint either creates `NEW` or reports
/// a clash with `EXISTING`, recording every folder deletion.
fn folder_platform(clash: bool, deleted: Arc<Mutex<Vec<String>>>) -> Router {
  Router::new()
    .route(
      "/2.0/folders",
      post(move || async move {
        if clash {
          let body = json!({
            "type": "error",
            "status": 409,
            "code": "item_name_in_use",
            "context_info": { "conflicts": [{ "type": "folder", "id": "EXISTING" }] },
          });
          (StatusCode::CONFLICT, Json(body))
        } else {
          (StatusCode::CREATED, Json(json!({ "id": "NEW", "type": "folder" })))
        }
      }),
    )
    .route(
      "/2.0/folders/{id}",
      axum::routing::delete(|State(d): State<Arc<Mutex<Vec<String>>>>, Path(id): Path<String>| async move {
        d.lock().unwrap().push(id);
        StatusCode::NO_CONTENT
      }),
    )
    .with_state(deleted)
}

fn hail_claim() -> submission::ClaimSubmission {
  submission::ClaimSubmission {
    claim_type:       claimdesk_core::claim::ClaimType::Auto,
    description:      "Hail damage".into(),
    incident_date:    NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
    estimated_amount: 900.0,
    files:            Vec::new(),
  }
}

/// A member with no row in `users`, so the claim insert fails.
fn unknown_member() -> User {
  User {
    user_id:       uuid::Uuid::new_v4(),
    name:          "Nobody".into(),
    email:         "nobody@example.com".into(),
    password_hash: String::new(),
    policy_number: "POL-1001".into(),
    member_since:  NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
  }
}

async fn failed_insert_deletions(clash: bool) -> Vec<String> {
  let deleted: Arc<Mutex<Vec<String>>> = Arc::default();
  let platform = spawn(folder_platform(clash, deleted.clone())).await;
  let h = Harness::new(|cfg, _| {
    cfg.box_api.api_url = platform.clone();
    cfg.box_api.upload_url = platform.clone();
  })
  .await;

  let result = submission::submit(&h.state, &unknown_member(), hail_claim()).await;
  assert!(matches!(result, Err(crate::error::Error::Store(_))));
  deleted.lock().unwrap().clone()
}

#[tokio::test]
async fn failed_insert_removes_the_folder_it_created() {
  assert_eq!(failed_insert_deletions(false).await, vec!["NEW".to_string()]);
}

#[tokio::test]
async fn failed_insert_leaves_a_reused_folder_alone() {
  assert!(failed_insert_deletions(true).await.is_empty());
}

/// Delegates to SQLite but refuses to store workflow links.
struct LinkRejectingStore(SqliteStore);

impl claimdesk_core::store::ClaimStore for LinkRejectingStore {
  type Error = claimdesk_store_sqlite::Error;

  fn upsert_user(&self, user: NewUser) -> impl Future<Output = Result<User, Self::Error>> + Send + '_ {
    self.0.upsert_user(user)
  }

  fn get_user(&self, id: uuid::Uuid) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_ {
    self.0.get_user(id)
  }

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a {
    self.0.get_user_by_email(email)
  }

  fn create_claim(
    &self,
    input: claimdesk_core::claim::NewClaim,
  ) -> impl Future<Output = Result<claimdesk_core::claim::Claim, Self::Error>> + Send + '_ {
    self.0.create_claim(input)
  }

  fn get_claim(
    &self,
    id: uuid::Uuid,
  ) -> impl Future<Output = Result<Option<claimdesk_core::claim::Claim>, Self::Error>> + Send + '_ {
    self.0.get_claim(id)
  }

  fn list_claims(
    &self,
    filter: claimdesk_core::store::ClaimFilter,
  ) -> impl Future<Output = Result<Vec<claimdesk_core::claim::Claim>, Self::Error>> + Send + '_ {
    self.0.list_claims(filter)
  }

  fn update_status(
    &self,
    id: uuid::Uuid,
    change: claimdesk_core::claim::StatusChange,
  ) -> impl Future<Output = Result<claimdesk_core::claim::Claim, Self::Error>> + Send + '_ {
    self.0.update_status(id, change)
  }

  fn set_workflow(
    &self,
    id: uuid::Uuid,
    _link: claimdesk_core::claim::WorkflowLink,
  ) -> impl Future<Output = Result<claimdesk_core::claim::Claim, Self::Error>> + Send + '_ {
    async move { Err(claimdesk_store_sqlite::Error::ClaimNotFound(id)) }
  }

  fn add_files(
    &self,
    id: uuid::Uuid,
    files: Vec<claimdesk_core::claim::StoredFile>,
  ) -> impl Future<Output = Result<claimdesk_core::claim::Claim, Self::Error>> + Send + '_ {
    self.0.add_files(id, files)
  }

  fn find_claim_by_folder<'a>(
    &'a self,
    folder_id: &'a str,
  ) -> impl Future<Output = Result<Option<claimdesk_core::claim::Claim>, Self::Error>> + Send + 'a {
    self.0.find_claim_by_folder(folder_id)
  }

  fn status_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<(claimdesk_core::claim::ClaimStatus, u64)>, Self::Error>> + Send + '_ {
    self.0.status_counts()
  }
}

#[tokio::test]
async fn unsaved_workflow_link_still_returns_the_committed_claim() {
  let base = spawn(upstream(Arc::default())).await;
  let store = SqliteStore::open_in_memory().await.unwrap();
  let member = store
    .upsert_user(NewUser {
      name:          "Grace Hopper".into(),
      email:         "grace@example.com".into(),
      password_hash: hash("member-pw"),
      policy_number: "POL-2002".into(),
      member_since:  NaiveDate::from_ymd_opt(2019, 9, 1).unwrap(),
    })
    .await
    .unwrap();
  let state = AppState::new(LinkRejectingStore(store), config_for(&base), reqwest::Client::new());

  let (claim, report) = submission::submit(&state, &member, hail_claim()).await.unwrap();

  assert_eq!(claim.workflow.process_key.as_deref(), Some("PI-1"));
  assert!(report.degraded);
  assert!(!report.step("workflow_link").unwrap().ok);
  assert!(report.step("insert").unwrap().ok);

  let stored = state.store.list_claims(Default::default()).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].claim_id, claim.claim_id);
}

#[tokio::test]
async fn missing_field_is_400() {
  let h = Harness::new(|_, _| {}).await;
  let cookie = h.member_cookie().await;
  let (status, body) = h.submit(&cookie, &CLAIM_FIELDS[..3], &[]).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "estimatedAmount is required");
}

#[tokio::test]
async fn disallowed_type_is_415() {
  let h = Harness::new(|_, _| {}).await;
  let cookie = h.member_cookie().await;
  let (status, _) = h
    .submit(&cookie, &CLAIM_FIELDS, &[("run.exe", "application/x-msdownload", b"MZ")])
    .await;
  assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn oversized_file_is_413() {
  let h = Harness::new(|cfg, _| cfg.uploads.max_file_bytes = 8).await;
  let cookie = h.member_cookie().await;
  let (status, _) = h
    .submit(&cookie, &CLAIM_FIELDS, &[("big.pdf", "application/pdf", b"0123456789")])
    .await;
  assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
  assert_eq!(h.upstream.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn members_only_see_their_own_claims() {
  let h = Harness::new(|_, _| {}).await;
  let cookie = h.member_cookie().await;
  let (_, body) = h.submit(&cookie, &CLAIM_FIELDS, &[]).await;
  let id = body["claim"]["claimId"].as_str().unwrap().to_string();

  let (status, list) = h.get("/api/claims", Some(&cookie)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);

  let other = h
    .state
    .sessions
    .create(Principal::Member {
      user_id: uuid::Uuid::new_v4(),
      email:   "eve@example.com".into(),
      name:    "Eve".into(),
    })
    .await;
  let other = format!("claimdesk_session={other}");
  assert_eq!(h.get(&format!("/api/claims/{id}"), Some(&other)).await.0, StatusCode::NOT_FOUND);
  assert_eq!(h.get(&format!("/api/claims/{id}"), Some(&cookie)).await.0, StatusCode::OK);
}

#[tokio::test]
async fn additional_documents_are_appended() {
  let h = Harness::new(|_, _| {}).await;
  let cookie = h.member_cookie().await;
  let (_, body) = h.submit(&cookie, &CLAIM_FIELDS, &[("a.pdf", "application/pdf", b"1")]).await;
  let id = body["claim"]["claimId"].as_str().unwrap().to_string();

  let (content_type, payload) = multipart(&[], &[("c.pdf", "application/pdf", b"3")]);
  let req = Request::builder()
    .method("POST")
    .uri(format!("/api/claims/{id}/documents"))
    .header(header::CONTENT_TYPE, content_type)
    .header(header::COOKIE, &cookie)
    .body(Body::from(payload))
    .unwrap();
  let (status, body) = h.send(req).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  let files = body["claim"]["files"].as_array().unwrap();
  assert_eq!(files.len(), 2);
  assert_eq!(files[1]["fileId"], "file-2");
}

#[tokio::test]
async fn workflow_poll_reports_demo_claims_as_degraded() {
  let h = Harness::new(|cfg, _| cfg.workflow.base_url = UNREACHABLE.into()).await;
  let cookie = h.member_cookie().await;
  let (_, body) = h.submit(&cookie, &CLAIM_FIELDS, &[]).await;
  let id = body["claim"]["claimId"].as_str().unwrap().to_string();

  let (status, body) = h.get(&format!("/api/claims/{id}/workflow"), Some(&cookie)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["workflow"]["workflowStatus"], "DEMO");
  assert_eq!(body["workflow"]["degraded"], true);
}

#[tokio::test]
async fn workflow_poll_reads_engine_state() {
  let h = Harness::new(|_, _| {}).await;
  let cookie = h.member_cookie().await;
  let (_, body) = h.submit(&cookie, &CLAIM_FIELDS, &[]).await;
  let id = body["claim"]["claimId"].as_str().unwrap().to_string();

  let (_, body) = h.get(&format!("/api/claims/{id}/workflow"), Some(&cookie)).await;
  assert_eq!(body["workflow"]["workflowStatus"], "ACTIVE");
  assert_eq!(body["workflow"]["riskScore"], 42.0);
  assert_eq!(body["workflow"]["degraded"], false);
}

// ─── Administration ──────────────────────────────────────────────────────────

async fn submitted_claim(h: &Harness) -> String {
  let cookie = h.member_cookie().await;
  let (_, body) = h.submit(&cookie, &CLAIM_FIELDS, &[]).await;
  body["claim"]["claimId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn status_update_keeps_history_in_step() {
  let h = Harness::new(|_, _| {}).await;
  let id = submitted_claim(&h).await;
  let admin = h.admin_cookie().await;

  let (status, _) = h
    .json("PUT", &format!("/api/admin/claims/{id}/status"), Some(&admin), json!({ "status": "escalated" }))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, claim) = h
    .json(
      "PUT",
      &format!("/api/admin/claims/{id}/status"),
      Some(&admin),
      json!({ "status": "under_review", "note": "assigned" }),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(claim["status"], "under_review");
  let history = claim["statusHistory"].as_array().unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[1]["status"], "under_review");
  assert_eq!(history[1]["changedBy"], "adjuster");
  assert_eq!(history[1]["note"], "assigned");
}

#[tokio::test]
async fn unknown_claim_is_404_for_admin() {
  let h = Harness::new(|_, _| {}).await;
  let admin = h.admin_cookie().await;
  let uri = format!("/api/admin/claims/{}/status", uuid::Uuid::new_v4());
  let (status, _) = h.json("PUT", &uri, Some(&admin), json!({ "status": "approved" })).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_list_filters_and_stats_count() {
  let h = Harness::new(|_, _| {}).await;
  let first = submitted_claim(&h).await;
  submitted_claim(&h).await;
  let admin = h.admin_cookie().await;
  h.json("PUT", &format!("/api/admin/claims/{first}/status"), Some(&admin), json!({ "status": "approved" }))
    .await;

  let (_, approved) = h.get("/api/admin/claims?status=approved", Some(&admin)).await;
  assert_eq!(approved.as_array().unwrap().len(), 1);
  let (status, _) = h.get("/api/admin/claims?status=lost", Some(&admin)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, stats) = h.get("/api/admin/stats", Some(&admin)).await;
  assert_eq!(stats["total"], 2);
  assert_eq!(stats["byStatus"]["approved"], 1);
  assert_eq!(stats["byStatus"]["submitted"], 1);
  assert_eq!(stats["byStatus"]["paid"], 0);
}

#[tokio::test]
async fn crm_lead_without_configuration_is_400() {
  let h = Harness::new(|_, _| {}).await;
  let id = submitted_claim(&h).await;
  let admin = h.admin_cookie().await;
  let (status, _) = h.json("POST", &format!("/api/admin/claims/{id}/crm-lead"), Some(&admin), Value::Null).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn engine_tasks_are_listed() {
  let h = Harness::new(|_, _| {}).await;
  let id = submitted_claim(&h).await;
  let admin = h.admin_cookie().await;
  let (_, body) = h.get(&format!("/api/admin/claims/{id}/tasks"), Some(&admin)).await;
  assert_eq!(body["degraded"], false);
  assert_eq!(body["tasks"][0]["id"], "T1");
}

#[tokio::test]
async fn demo_claims_get_a_synthetic_task_and_decisions_still_apply() {
  let h = Harness::new(|cfg, _| cfg.workflow.base_url = UNREACHABLE.into()).await;
  let id = submitted_claim(&h).await;
  let admin = h.admin_cookie().await;

  let (_, body) = h.get(&format!("/api/admin/claims/{id}/tasks"), Some(&admin)).await;
  assert_eq!(body["degraded"], true);
  let task = &body["tasks"][0];
  assert_eq!(task["taskDefinitionKey"], "initial_review");
  let task_id = task["id"].as_str().unwrap().to_string();

  let uri = format!("/api/admin/claims/{id}/tasks/{task_id}/complete");
  let (status, body) = h.json("POST", &uri, Some(&admin), json!({ "decision": "Approve" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["statusChanged"], true);
  assert_eq!(body["degraded"], true);
  assert_eq!(body["claim"]["status"], "approved");
  let history = body["claim"]["statusHistory"].as_array().unwrap();
  assert_eq!(history.last().unwrap()["status"], "approved");
}

#[tokio::test]
async fn remote_task_completion_and_unknown_decision() {
  let h = Harness::new(|_, _| {}).await;
  let id = submitted_claim(&h).await;
  let admin = h.admin_cookie().await;

  let uri = format!("/api/admin/claims/{id}/tasks/T1/complete");
  let (status, body) = h
    .json("POST", &uri, Some(&admin), json!({ "decision": "escalate", "notes": "call back" }))
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["statusChanged"], false);
  assert_eq!(body["degraded"], false);
  assert_eq!(body["claim"]["status"], "submitted");
  assert_eq!(*h.upstream.completed.lock().unwrap(), vec!["T1".to_string()]);
}

// ─── Webhook ─────────────────────────────────────────────────────────────────

fn signed_request(key: &str, body: &Value) -> Request<Body> {
  let raw = body.to_string();
  let sig = webhook::sign(key, raw.as_bytes()).unwrap();
  Request::builder()
    .method("POST")
    .uri("/webhooks/box")
    .header(header::CONTENT_TYPE, "application/json")
    .header(webhook::PRIMARY_HEADER, sig)
    .body(Body::from(raw))
    .unwrap()
}

#[tokio::test]
async fn signed_upload_into_claim_folder_is_attached() {
  let h = Harness::new(|cfg, _| {
    cfg.webhook = WebhookConfig { primary_key: Some("hook-key".into()), secondary_key: None };
  })
  .await;
  let id = submitted_claim(&h).await;

  let delivery = json!({
    "trigger": "FILE.UPLOADED",
    "source": { "id": "ext-9", "type": "file", "name": "photo.jpg", "size": 1234, "parent": { "id": "F1" } },
  });
  let (status, body) = h.send(signed_request("hook-key", &delivery)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "received": true, "trigger": "FILE.UPLOADED" }));

  // Redelivery does not duplicate the file.
  h.send(signed_request("hook-key", &delivery)).await;

  let admin = h.admin_cookie().await;
  let (_, claim) = h.get(&format!("/api/admin/claims/{id}"), Some(&admin)).await;
  let files = claim["files"].as_array().unwrap();
  assert_eq!(files.len(), 1);
  assert_eq!(files[0]["fileId"], "ext-9");
}

#[tokio::test]
async fn bad_signature_is_401() {
  let h = Harness::new(|cfg, _| {
    cfg.webhook = WebhookConfig { primary_key: Some("hook-key".into()), secondary_key: None };
  })
  .await;
  let (status, _) = h.send(signed_request("wrong-key", &json!({ "trigger": "FILE.UPLOADED" }))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}
