//! `import-workflows`: load exported automation workflows by name.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::report::Report;

/// Connection to the automation tool's public API.
#[derive(Clone)]
pub struct AutomationApi {
  http:     Client,
  base_url: String,
  api_key:  String,
}

#[derive(Deserialize)]
struct Workflow {
  id:   String,
  name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowPage {
  #[serde(default)]
  data:        Vec<Workflow>,
  next_cursor: Option<String>,
}

/// Fields the create endpoint accepts; everything else in an export is
/// dropped.
const ACCEPTED_FIELDS: [&str; 4] = ["name", "nodes", "connections", "settings"];

impl AutomationApi {
  pub fn new(http: Client, base_url: String, api_key: String) -> Self {
    Self { http, base_url, api_key }
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api/v1{}", self.base_url.trim_end_matches('/'), path)
  }

  async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
    let resp = req
      .header("X-N8N-API-KEY", &self.api_key)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    if !resp.status().is_success() {
      let status = resp.status();
      return Err(anyhow!("{what} → {status}: {}", resp.text().await.unwrap_or_default()));
    }
    Ok(resp)
  }

  async fn list(&self) -> Result<Vec<Workflow>> {
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
      let mut req = self.http.get(self.url("/workflows")).query(&[("limit", "250")]);
      if let Some(c) = &cursor {
        req = req.query(&[("cursor", c.as_str())]);
      }
      let page: WorkflowPage = self.send(req, "GET /workflows").await?.json().await?;
      all.extend(page.data);
      match page.next_cursor.filter(|c| !c.is_empty()) {
        Some(c) => cursor = Some(c),
        None => break,
      }
    }
    Ok(all)
  }

  async fn create(&self, definition: &Value) -> Result<String> {
    let mut body: Map<String, Value> = ACCEPTED_FIELDS
      .iter()
      .filter_map(|k| definition.get(*k).map(|v| ((*k).to_owned(), v.clone())))
      .collect();
    body.entry("settings").or_insert_with(|| json!({}));

    let req = self.http.post(self.url("/workflows")).json(&body);
    let created: Workflow = self.send(req, "POST /workflows").await?.json().await?;
    Ok(created.id)
  }

  async fn activate(&self, id: &str) -> Result<()> {
    let req = self.http.post(self.url(&format!("/workflows/{id}/activate")));
    self.send(req, &format!("POST /workflows/{id}/activate")).await?;
    Ok(())
  }
}

/// `*.json` files in `dir`, sorted by name.
fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
    .with_context(|| format!("reading {}", dir.display()))?
    .filter_map(|e| e.ok().map(|e| e.path()))
    .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
    .collect();
  files.sort();
  Ok(files)
}

pub async fn import(api: &AutomationApi, dir: &Path, activate: bool) -> Result<Report> {
  let existing = api.list().await?;
  let files = definition_files(dir)?;
  tracing::info!(existing = existing.len(), files = files.len(), "importing workflows");

  let mut report = Report::default();
  for path in files {
    let file = path.display().to_string();
    let definition: Value = match std::fs::read_to_string(&path)
      .map_err(anyhow::Error::from)
      .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from))
    {
      Ok(v) => v,
      Err(e) => {
        report.fail(json!({ "file": file }), format!("{e:#}"));
        continue;
      }
    };
    let Some(name) = definition.get("name").and_then(Value::as_str).map(str::to_owned) else {
      report.fail(json!({ "file": file }), "workflow has no name");
      continue;
    };

    if let Some(found) = existing.iter().find(|w| w.name == name) {
      tracing::info!(id = %found.id, name = %name, "workflow already present");
      report.skipped.push(json!({ "id": found.id, "name": name, "file": file }));
      continue;
    }

    let id = match api.create(&definition).await {
      Ok(id) => id,
      Err(e) => {
        report.fail(json!({ "file": file, "name": name }), format!("{e:#}"));
        continue;
      }
    };
    tracing::info!(%id, name = %name, "workflow created");

    // Created from here on: an activation failure stays on the created entry.
    let mut entry = json!({ "id": id, "name": name, "file": file, "active": false });
    if activate {
      match api.activate(&id).await {
        Ok(()) => entry["active"] = json!(true),
        Err(e) => {
          tracing::warn!(%id, name = %name, error = %e, "workflow created but not activated");
          entry["warning"] = json!(format!("not activated: {e:#}"));
        }
      }
    }
    report.created.push(entry);
  }
  Ok(report)
}
