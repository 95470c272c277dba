//! Document-platform webhook triggers and the automation paths they route to.

use serde::{Deserialize, Serialize};

/// The event names the document platform delivers that have a dedicated
/// automation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxTrigger {
  #[serde(rename = "FILE.UPLOADED")]
  FileUploaded,
  #[serde(rename = "FILE.COPIED")]
  FileCopied,
  #[serde(rename = "FILE.MOVED")]
  FileMoved,
  #[serde(rename = "FILE.TRASHED")]
  FileTrashed,
  #[serde(rename = "FILE.DELETED")]
  FileDeleted,
  #[serde(rename = "FOLDER.CREATED")]
  FolderCreated,
  #[serde(rename = "METADATA_INSTANCE.CREATED")]
  MetadataCreated,
  #[serde(rename = "METADATA_INSTANCE.UPDATED")]
  MetadataUpdated,
  #[serde(rename = "SIGN_REQUEST.COMPLETED")]
  SignCompleted,
  #[serde(rename = "SIGN_REQUEST.DECLINED")]
  SignDeclined,
  #[serde(rename = "TASK_ASSIGNMENT.UPDATED")]
  TaskAssignmentUpdated,
}

impl BoxTrigger {
  pub const ALL: [BoxTrigger; 11] = [
    BoxTrigger::FileUploaded,
    BoxTrigger::FileCopied,
    BoxTrigger::FileMoved,
    BoxTrigger::FileTrashed,
    BoxTrigger::FileDeleted,
    BoxTrigger::FolderCreated,
    BoxTrigger::MetadataCreated,
    BoxTrigger::MetadataUpdated,
    BoxTrigger::SignCompleted,
    BoxTrigger::SignDeclined,
    BoxTrigger::TaskAssignmentUpdated,
  ];

  /// The wire name, e.g. `"FILE.UPLOADED"`.
  pub fn as_str(self) -> &'static str {
    match self {
      BoxTrigger::FileUploaded => "FILE.UPLOADED",
      BoxTrigger::FileCopied => "FILE.COPIED",
      BoxTrigger::FileMoved => "FILE.MOVED",
      BoxTrigger::FileTrashed => "FILE.TRASHED",
      BoxTrigger::FileDeleted => "FILE.DELETED",
      BoxTrigger::FolderCreated => "FOLDER.CREATED",
      BoxTrigger::MetadataCreated => "METADATA_INSTANCE.CREATED",
      BoxTrigger::MetadataUpdated => "METADATA_INSTANCE.UPDATED",
      BoxTrigger::SignCompleted => "SIGN_REQUEST.COMPLETED",
      BoxTrigger::SignDeclined => "SIGN_REQUEST.DECLINED",
      BoxTrigger::TaskAssignmentUpdated => "TASK_ASSIGNMENT.UPDATED",
    }
  }

  /// Exact, case-sensitive match against the wire names.
  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.as_str() == s)
  }

  /// The automation-tool webhook path that handles this trigger.
  pub fn downstream_path(self) -> &'static str {
    match self {
      BoxTrigger::FileUploaded | BoxTrigger::FileCopied => "/webhook/box-file-upload",
      BoxTrigger::FileMoved => "/webhook/box-file-moved",
      BoxTrigger::FileTrashed | BoxTrigger::FileDeleted => "/webhook/box-file-trashed",
      BoxTrigger::FolderCreated => "/webhook/box-folder-created",
      BoxTrigger::MetadataCreated | BoxTrigger::MetadataUpdated => "/webhook/box-metadata",
      BoxTrigger::SignCompleted | BoxTrigger::SignDeclined => "/webhook/box-sign",
      BoxTrigger::TaskAssignmentUpdated => "/webhook/box-task",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_trigger_round_trips_through_parse() {
    for t in BoxTrigger::ALL {
      assert_eq!(BoxTrigger::parse(t.as_str()), Some(t));
    }
  }

  #[test]
  fn serde_uses_wire_names() {
    for t in BoxTrigger::ALL {
      let json = serde_json::to_string(&t).unwrap();
      assert_eq!(json, format!("\"{}\"", t.as_str()));
    }
  }

  #[test]
  fn unknown_and_lowercase_names_do_not_parse() {
    assert_eq!(BoxTrigger::parse("file.uploaded"), None);
    assert_eq!(BoxTrigger::parse("COLLABORATION.CREATED"), None);
    assert_eq!(BoxTrigger::parse(""), None);
  }

  #[test]
  fn sign_events_route_to_sign_workflow() {
    assert_eq!(BoxTrigger::SignCompleted.downstream_path(), "/webhook/box-sign");
    assert_eq!(BoxTrigger::SignDeclined.downstream_path(), "/webhook/box-sign");
  }
}
