//! `provision-agents`: create document-platform AI agents by name.

use anyhow::{Result, anyhow};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{platform::PlatformClient, report::Report};

#[derive(Deserialize)]
struct Agent {
  id:   String,
  name: String,
}

#[derive(Deserialize)]
struct AgentPage {
  #[serde(default)]
  entries:     Vec<Agent>,
  next_marker: Option<String>,
}

async fn existing(client: &PlatformClient) -> Result<Vec<Agent>> {
  let mut agents = Vec::new();
  let mut marker: Option<String> = None;
  loop {
    let mut query = vec![("limit", "1000".to_string())];
    if let Some(m) = &marker {
      query.push(("marker", m.clone()));
    }
    let page: AgentPage = client.get("/2.0/ai_agents", &query).await?;
    agents.extend(page.entries);
    match page.next_marker.filter(|m| !m.is_empty()) {
      Some(m) => marker = Some(m),
      None => break,
    }
  }
  Ok(agents)
}

/// Each spec entry is a complete agent definition with a `name`.
pub async fn provision(client: &PlatformClient, specs: Vec<Value>) -> Result<Report> {
  let agents = existing(client).await?;
  tracing::info!(existing = agents.len(), wanted = specs.len(), "provisioning agents");

  let mut report = Report::default();
  for spec in specs {
    let Some(name) = spec.get("name").and_then(Value::as_str).map(str::to_owned) else {
      report.fail(spec, anyhow!("agent definition has no name"));
      continue;
    };
    if let Some(found) = agents.iter().find(|a| a.name == name) {
      tracing::info!(id = %found.id, name = %name, "agent already present");
      report.skipped.push(json!({ "id": found.id, "name": name }));
      continue;
    }
    match client.post("/2.0/ai_agents", &spec).await {
      Ok(created) => {
        let id = created.get("id").cloned().unwrap_or(Value::Null);
        tracing::info!(%id, name = %name, "agent created");
        report.created.push(json!({ "id": id, "name": name }));
      }
      Err(e) => report.fail(spec, format!("{e:#}")),
    }
  }
  Ok(report)
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, routing::get};

  use super::*;
  use crate::platform::test_support::{client, spawn};

  #[tokio::test]
  async fn agents_are_matched_by_name() {
    let app = Router::new().route(
      "/2.0/ai_agents",
      get(|| async { Json(json!({ "entries": [{ "id": "a1", "name": "FNOL Extractor", "type": "ai_agent" }] })) })
        .post(|Json(body): Json<Value>| async move {
          Json(json!({ "id": "a2", "name": body["name"] }))
        }),
    );
    let client = client(spawn(app).await);

    let report = provision(
      &client,
      vec![
        json!({ "name": "FNOL Extractor", "access_state": "enabled" }),
        json!({ "name": "Claims Summariser", "access_state": "enabled" }),
        json!({ "access_state": "enabled" }),
      ],
    )
    .await
    .unwrap();

    assert_eq!(report.skipped, vec![json!({ "id": "a1", "name": "FNOL Extractor" })]);
    assert_eq!(report.created, vec![json!({ "id": "a2", "name": "Claims Summariser" })]);
    assert_eq!(report.failed.len(), 1);
  }
}
