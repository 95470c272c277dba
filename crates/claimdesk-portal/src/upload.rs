//! Multipart form reading with per-file size and type checks.

use std::collections::HashMap;

use axum::{extract::Multipart, http::StatusCode};
use bytes::Bytes;

use crate::{
  config::UploadConfig,
  error::{Error, Result},
};

/// A file part that passed validation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
  pub name:         String,
  pub content_type: String,
  pub data:         Bytes,
}

/// Text fields and files of a multipart request.
#[derive(Debug, Default)]
pub struct FormData {
  pub fields: HashMap<String, String>,
  pub files:  Vec<UploadedFile>,
}

impl FormData {
  /// A non-empty text field, or 400 naming it.
  pub fn required(&self, name: &str) -> Result<&str> {
    self
      .fields
      .get(name)
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
      .ok_or_else(|| Error::BadRequest(format!("{name} is required")))
  }

  pub fn optional(&self, name: &str) -> Option<&str> {
    self.fields.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
  }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> Error {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    Error::PayloadTooLarge(e.body_text())
  } else {
    Error::BadRequest(e.body_text())
  }
}

/// Read every part. Parts with a file name are files; the rest are text.
pub async fn read_form(mut multipart: Multipart, limits: &UploadConfig) -> Result<FormData> {
  let mut form = FormData::default();

  while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
    let field_name = field.name().unwrap_or_default().to_owned();

    let Some(file_name) = field.file_name().map(str::to_owned) else {
      let text = field.text().await.map_err(multipart_error)?;
      form.fields.insert(field_name, text);
      continue;
    };
    if file_name.is_empty() {
      continue;
    }

    let content_type = field
      .content_type()
      .unwrap_or("application/octet-stream")
      .to_owned();
    if !limits.allows(&content_type) {
      return Err(Error::UnsupportedMediaType(format!(
        "{file_name}: file type {content_type} is not allowed"
      )));
    }

    let data = field.bytes().await.map_err(multipart_error)?;
    if data.len() > limits.max_file_bytes {
      return Err(Error::PayloadTooLarge(format!(
        "{file_name} exceeds the {} byte limit",
        limits.max_file_bytes
      )));
    }

    form.files.push(UploadedFile { name: file_name, content_type, data });
    if form.files.len() > limits.max_files {
      return Err(Error::BadRequest(format!("at most {} files per request", limits.max_files)));
    }
  }

  Ok(form)
}
