//! `provision-webhooks`: make sure each folder/file webhook exists once.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{platform::PlatformClient, report::Report};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
  pub id:   String,
  #[serde(rename = "type")]
  pub kind: String,
}

/// One desired webhook, as listed in the spec file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSpec {
  pub target:   Target,
  pub address:  String,
  pub triggers: Vec<String>,
}

#[derive(Deserialize)]
struct MiniWebhook {
  id:     String,
  target: Target,
}

#[derive(Deserialize)]
struct WebhookPage {
  #[serde(default)]
  entries:     Vec<MiniWebhook>,
  next_marker: Option<String>,
}

/// An installed webhook with the fields used for matching.
#[derive(Debug, Deserialize)]
pub struct Installed {
  pub id:       String,
  pub target:   Target,
  #[serde(default)]
  pub triggers: Vec<String>,
}

fn trigger_set(triggers: &[String]) -> BTreeSet<&str> {
  triggers.iter().map(String::as_str).collect()
}

impl WebhookSpec {
  /// Same target and same set of triggers; order and duplicates ignored.
  pub fn matches(&self, installed: &Installed) -> bool {
    self.target == installed.target && trigger_set(&self.triggers) == trigger_set(&installed.triggers)
  }
}

/// Every installed webhook, with triggers fetched for those on a target the
/// spec mentions.
async fn installed(client: &PlatformClient, specs: &[WebhookSpec]) -> Result<Vec<Installed>> {
  let mut minis = Vec::new();
  let mut marker: Option<String> = None;
  loop {
    let mut query = vec![("limit", "200".to_string())];
    if let Some(m) = &marker {
      query.push(("marker", m.clone()));
    }
    let page: WebhookPage = client.get("/2.0/webhooks", &query).await?;
    minis.extend(page.entries);
    match page.next_marker.filter(|m| !m.is_empty()) {
      Some(m) => marker = Some(m),
      None => break,
    }
  }

  let mut full = Vec::new();
  for mini in minis {
    if specs.iter().any(|s| s.target == mini.target) {
      full.push(client.get(&format!("/2.0/webhooks/{}", mini.id), &[]).await?);
    }
  }
  Ok(full)
}

pub async fn provision(client: &PlatformClient, specs: Vec<WebhookSpec>) -> Result<Report> {
  let existing = installed(client, &specs).await?;
  tracing::info!(existing = existing.len(), wanted = specs.len(), "provisioning webhooks");

  let mut report = Report::default();
  for spec in specs {
    let entry = serde_json::to_value(&spec)?;
    if let Some(found) = existing.iter().find(|w| spec.matches(w)) {
      tracing::info!(id = %found.id, target = %spec.target.id, "webhook already present");
      report.skipped.push(json!({ "id": found.id, "spec": entry }));
      continue;
    }
    match client.post("/2.0/webhooks", &entry).await {
      Ok(created) => {
        let id = created.get("id").cloned().unwrap_or(Value::Null);
        tracing::info!(%id, target = %spec.target.id, "webhook created");
        report.created.push(json!({ "id": id, "spec": entry }));
      }
      Err(e) => report.fail(entry, format!("{e:#}")),
    }
  }
  Ok(report)
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
  };

  use super::*;
  use crate::platform::test_support::{client, spawn};

  fn spec(folder: &str, triggers: &[&str]) -> WebhookSpec {
    WebhookSpec {
      target:   Target { id: folder.into(), kind: "folder".into() },
      address:  "https://hooks.example.com/webhook/box-file-upload".into(),
      triggers: triggers.iter().map(|t| (*t).to_string()).collect(),
    }
  }

  #[test]
  fn trigger_order_is_ignored() {
    let installed = Installed {
      id:       "w1".into(),
      target:   Target { id: "10".into(), kind: "folder".into() },
      triggers: vec!["FILE.MOVED".into(), "FILE.UPLOADED".into()],
    };
    assert!(spec("10", &["FILE.UPLOADED", "FILE.MOVED"]).matches(&installed));
    assert!(!spec("10", &["FILE.UPLOADED"]).matches(&installed));
    assert!(!spec("11", &["FILE.UPLOADED", "FILE.MOVED"]).matches(&installed));
  }

  #[tokio::test]
  async fn existing_is_skipped_new_is_created_rejected_is_failed() {
    let created: Arc<Mutex<Vec<Value>>> = Arc::default();
    let app = Router::new()
      .route(
        "/2.0/webhooks",
        get(|| async {
          Json(json!({ "entries": [{ "id": "w1", "target": { "id": "10", "type": "folder" } }] }))
        })
        .post(|State(c): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
          if body["target"]["id"] == "99" {
            return Err((StatusCode::FORBIDDEN, "access_denied_insufficient_permissions"));
          }
          c.lock().unwrap().push(body);
          Ok(Json(json!({ "id": "w2" })))
        }),
      )
      .route(
        "/2.0/webhooks/{id}",
        get(|Path(id): Path<String>| async move {
          Json(json!({ "id": id, "target": { "id": "10", "type": "folder" }, "triggers": ["FILE.UPLOADED"] }))
        }),
      )
      .with_state(created.clone());
    let client = client(spawn(app).await);

    let report = provision(
      &client,
      vec![spec("10", &["FILE.UPLOADED"]), spec("20", &["FILE.UPLOADED"]), spec("99", &["FILE.MOVED"])],
    )
    .await
    .unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0]["id"], "w1");
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0]["id"], "w2");
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].error.contains("access_denied"));
    assert_eq!(created.lock().unwrap()[0]["target"]["id"], "20");
  }
}
