//! Document-platform folders, uploads and metadata.

use bytes::Bytes;
use chrono::Utc;
use claimdesk_core::claim::StoredFile;
use claimdesk_extract::box_auth::BoxAuth;
use reqwest::{
  StatusCode,
  multipart::{Form, Part},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::check;
use crate::error::{Error, Result};

const SERVICE: &str = "storage";

#[derive(Deserialize)]
struct Item {
  id: String,
}

#[derive(Deserialize)]
struct UploadedEntry {
  id:   String,
  name: String,
  #[serde(default)]
  size: u64,
}

#[derive(Deserialize)]
struct UploadResponse {
  entries: Vec<UploadedEntry>,
}

/// A folder returned by [`StorageClient::create_folder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
  pub id:      String,
  /// False when the name clashed and an existing folder was returned.
  pub created: bool,
}

#[derive(Clone)]
pub struct StorageClient {
  auth: BoxAuth,
}

impl StorageClient {
  pub fn new(auth: BoxAuth) -> Self { Self { auth } }

  async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let token = self.auth.token().await?;
    let resp = req.bearer_auth(token).send().await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      self.auth.invalidate().await;
    }
    Ok(resp)
  }

  /// Create folder `name` under `parent_id`. A name clash resolves to the
  /// existing folder with `created: false`.
  pub async fn create_folder(&self, parent_id: &str, name: &str) -> Result<Folder> {
    let url = self.auth.config().api("/2.0/folders");
    let body = json!({ "name": name, "parent": { "id": parent_id } });
    let resp = self.send(self.auth.http().post(url).json(&body)).await?;

    if resp.status() == StatusCode::CONFLICT {
      let text = resp.text().await.unwrap_or_default();
      let existing = serde_json::from_str::<Value>(&text).ok().and_then(|v| {
        v["context_info"]["conflicts"][0]["id"].as_str().map(str::to_owned)
      });
      return match existing {
        Some(id) => {
          tracing::info!(folder_id = %id, name, "reusing existing folder");
          Ok(Folder { id, created: false })
        }
        None => Err(Error::Upstream { service: SERVICE, status: 409, body: text }),
      };
    }

    let item: Item = check(SERVICE, resp).await?.json().await?;
    Ok(Folder { id: item.id, created: true })
  }

  /// Upload one file into `folder_id`.
  pub async fn upload(
    &self,
    folder_id: &str,
    name: &str,
    content_type: &str,
    data: Bytes,
  ) -> Result<StoredFile> {
    let attributes = json!({ "name": name, "parent": { "id": folder_id } }).to_string();
    let file = Part::stream(data)
      .file_name(name.to_owned())
      .mime_str(content_type)?;
    let form = Form::new().text("attributes", attributes).part("file", file);

    let url = self.auth.config().upload("/2.0/files/content");
    let resp = self.send(self.auth.http().post(url).multipart(form)).await?;
    let uploaded: UploadResponse = check(SERVICE, resp).await?.json().await?;
    let entry = uploaded.entries.into_iter().next().ok_or_else(|| Error::Upstream {
      service: SERVICE,
      status:  200,
      body:    "upload response contained no entries".into(),
    })?;

    Ok(StoredFile {
      file_id:      entry.id,
      name:         entry.name,
      size:         entry.size,
      content_type: content_type.to_owned(),
      uploaded_at:  Utc::now(),
    })
  }

  /// Delete a folder and everything in it.
  pub async fn delete_folder(&self, folder_id: &str) -> Result<()> {
    let url = self.auth.config().api(&format!("/2.0/folders/{folder_id}"));
    let resp = self
      .send(self.auth.http().delete(url).query(&[("recursive", "true")]))
      .await?;
    check(SERVICE, resp).await?;
    Ok(())
  }

  /// Attach an enterprise metadata template instance to a file.
  pub async fn apply_metadata(&self, file_id: &str, template: &str, values: &Value) -> Result<()> {
    let url = self
      .auth
      .config()
      .api(&format!("/2.0/files/{file_id}/metadata/enterprise/{template}"));
    let resp = self.send(self.auth.http().post(url).json(values)).await?;
    check(SERVICE, resp).await?;
    Ok(())
  }
}
