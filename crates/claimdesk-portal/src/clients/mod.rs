//! Outbound HTTP clients for the services the portal orchestrates.
//!
//! Every client takes a shared [`reqwest::Client`]; none of them retries.

pub mod automation;
pub mod crm;
pub mod extraction;
pub mod storage;
pub mod workflow;

use std::sync::Arc;

use claimdesk_extract::box_auth::BoxAuth;

use crate::{
  config::PortalConfig,
  error::{Error, Result},
};

/// The set of outbound clients held in application state.
pub struct Services {
  pub storage:    storage::StorageClient,
  pub workflow:   workflow::WorkflowClient,
  pub automation: automation::AutomationClient,
  pub extraction: extraction::ExtractionClient,
  /// `None` when CRM credentials are not configured.
  pub crm:        Option<crm::CrmClient>,
}

impl Services {
  pub fn from_config(http: reqwest::Client, config: &PortalConfig) -> Self {
    let auth = BoxAuth::new(http.clone(), Arc::new(config.box_api.clone()));
    let crm = config
      .crm
      .is_configured()
      .then(|| crm::CrmClient::new(http.clone(), config.crm.clone()));
    Self {
      storage: storage::StorageClient::new(auth),
      workflow: workflow::WorkflowClient::new(http.clone(), config.workflow.clone()),
      automation: automation::AutomationClient::new(http.clone(), config.automation.base_url.clone()),
      extraction: extraction::ExtractionClient::new(http, config.extraction.base_url.clone()),
      crm,
    }
  }
}

/// Turn a non-2xx response into [`Error::Upstream`] carrying its body text.
pub(crate) async fn check(service: &'static str, resp: reqwest::Response) -> Result<reqwest::Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Upstream { service, status: status.as_u16(), body })
}
