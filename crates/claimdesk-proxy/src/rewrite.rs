//! The single static rewrite rule applied before forwarding.

use axum::http::Method;
use claimdesk_core::trigger::BoxTrigger;
use serde::Deserialize;

#[derive(Deserialize)]
struct TriggerProbe {
  trigger: Option<String>,
}

/// The downstream path for a request, if the rewrite rule applies.
///
/// Only POSTs to `source` whose JSON body carries a known `trigger` are
/// rewritten; everything else returns `None` and is forwarded unchanged.
pub fn rewrite_target(method: &Method, path: &str, source: &str, body: &[u8]) -> Option<&'static str> {
  if *method != Method::POST || path.trim_end_matches('/') != source.trim_end_matches('/') {
    return None;
  }
  let probe: TriggerProbe = serde_json::from_slice(body).ok()?;
  BoxTrigger::parse(probe.trigger?.as_str()).map(BoxTrigger::downstream_path)
}

#[cfg(test)]
mod tests {
  use super::*;

  const SOURCE: &str = "/webhook/box-file-upload";

  fn body(trigger: &str) -> Vec<u8> {
    format!(r#"{{"trigger":"{trigger}","source":{{"id":"1","type":"file"}}}}"#).into_bytes()
  }

  #[test]
  fn every_known_trigger_rewrites_to_its_path() {
    for t in BoxTrigger::ALL {
      assert_eq!(
        rewrite_target(&Method::POST, SOURCE, SOURCE, &body(t.as_str())),
        Some(t.downstream_path()),
        "{}",
        t.as_str()
      );
    }
  }

  #[test]
  fn sign_completion_never_goes_to_file_upload() {
    let target = rewrite_target(&Method::POST, SOURCE, SOURCE, &body("SIGN_REQUEST.COMPLETED"));
    assert_eq!(target, Some("/webhook/box-sign"));
  }

  #[test]
  fn unknown_trigger_is_unchanged() {
    assert_eq!(rewrite_target(&Method::POST, SOURCE, SOURCE, &body("COMMENT.CREATED")), None);
  }

  #[test]
  fn missing_trigger_or_bad_json_is_unchanged() {
    assert_eq!(rewrite_target(&Method::POST, SOURCE, SOURCE, b"{}"), None);
    assert_eq!(rewrite_target(&Method::POST, SOURCE, SOURCE, b"not json"), None);
    assert_eq!(rewrite_target(&Method::POST, SOURCE, SOURCE, b""), None);
  }

  #[test]
  fn other_paths_and_methods_are_unchanged() {
    let b = body("SIGN_REQUEST.COMPLETED");
    assert_eq!(rewrite_target(&Method::POST, "/webhook/other", SOURCE, &b), None);
    assert_eq!(rewrite_target(&Method::GET, SOURCE, SOURCE, &b), None);
  }

  #[test]
  fn trailing_slash_on_source_still_matches() {
    let b = body("FILE.MOVED");
    assert_eq!(
      rewrite_target(&Method::POST, "/webhook/box-file-upload/", SOURCE, &b),
      Some("/webhook/box-file-moved")
    );
  }
}
