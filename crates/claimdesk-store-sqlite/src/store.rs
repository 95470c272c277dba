//! [`SqliteStore`] — the SQLite implementation of [`ClaimStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use claimdesk_core::{
  claim::{Claim, ClaimStatus, NewClaim, StatusChange, StoredFile, WorkflowLink},
  store::{ClaimFilter, ClaimStore},
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{
    CLAIM_COLUMNS, RawClaim, RawUser, USER_COLUMNS, encode_change, encode_date, encode_dt,
    encode_file, encode_files, encode_history, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A claims database backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("claims schema ready");
    Ok(())
  }

  /// Fetch a claim that is known to exist, mapping absence to an error.
  async fn require_claim(&self, id: Uuid) -> Result<Claim> {
    self.get_claim(id).await?.ok_or(Error::ClaimNotFound(id))
  }
}

// ─── ClaimStore impl ─────────────────────────────────────────────────────────

impl ClaimStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn upsert_user(&self, user: NewUser) -> Result<User> {
    let id_str = encode_uuid(Uuid::new_v4());
    let since  = encode_date(user.member_since);

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO users (user_id, name, email, password_hash, policy_number, member_since)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(email) DO UPDATE SET
               name          = excluded.name,
               password_hash = excluded.password_hash,
               policy_number = excluded.policy_number,
               member_since  = excluded.member_since
             RETURNING {USER_COLUMNS}"
          ),
          rusqlite::params![
            id_str,
            user.name,
            user.email.trim(),
            user.password_hash,
            user.policy_number,
            since,
          ],
          RawUser::from_row,
        )?)
      })
      .await?;

    raw.into_user()
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_owned();
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"),
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  // ── Claims ────────────────────────────────────────────────────────────────

  async fn create_claim(&self, input: NewClaim) -> Result<Claim> {
    let now = Utc::now();
    let claim = Claim {
      claim_id:         Uuid::new_v4(),
      user_id:          input.user_id,
      user_name:        input.user_name,
      policy_number:    input.policy_number,
      claim_type:       input.claim_type,
      description:      input.description,
      incident_date:    input.incident_date,
      estimated_amount: input.estimated_amount,
      status:           ClaimStatus::Submitted,
      status_history:   vec![StatusChange {
        status:     ClaimStatus::Submitted,
        at:         now,
        note:       Some("Claim submitted".to_owned()),
        changed_by: input.submitted_by,
      }],
      folder_id:        input.folder_id,
      files:            input.files,
      extraction:       input.extraction,
      workflow:         WorkflowLink::default(),
      created_at:       now,
      updated_at:       now,
    };

    let claim_id_str  = encode_uuid(claim.claim_id);
    let user_id_str   = encode_uuid(claim.user_id);
    let user_name     = claim.user_name.clone();
    let policy_number = claim.policy_number.clone();
    let claim_type    = claim.claim_type.as_str();
    let description   = claim.description.clone();
    let incident_date = encode_date(claim.incident_date);
    let amount        = claim.estimated_amount;
    let status        = claim.status.as_str();
    let history_str   = encode_history(&claim.status_history)?;
    let folder_id     = claim.folder_id.clone();
    let files_str     = encode_files(&claim.files)?;
    let extraction    = claim
      .extraction
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;
    let at_str        = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO claims (
             claim_id, user_id, user_name, policy_number, claim_type,
             description, incident_date, estimated_amount, status, status_history,
             folder_id, files, extraction, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
          rusqlite::params![
            claim_id_str,
            user_id_str,
            user_name,
            policy_number,
            claim_type,
            description,
            incident_date,
            amount,
            status,
            history_str,
            folder_id,
            files_str,
            extraction,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(claim)
  }

  async fn get_claim(&self, id: Uuid) -> Result<Option<Claim>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawClaim> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_id = ?1"),
            rusqlite::params![id_str],
            RawClaim::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawClaim::into_claim).transpose()
  }

  async fn list_claims(&self, filter: ClaimFilter) -> Result<Vec<Claim>> {
    let user_str   = filter.user_id.map(encode_uuid);
    let status_str = filter.status.map(ClaimStatus::as_str);

    let raws: Vec<RawClaim> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CLAIM_COLUMNS} FROM claims
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR status  = ?2)
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, status_str], RawClaim::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawClaim::into_claim).collect()
  }

  async fn update_status(&self, id: Uuid, change: StatusChange) -> Result<Claim> {
    let id_str     = encode_uuid(id);
    let status     = change.status.as_str();
    let change_str = encode_change(&change)?;
    let at_str     = encode_dt(Utc::now());

    // Status and history move together in a single statement.
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE claims SET
             status         = ?2,
             status_history = json_insert(status_history, '$[#]', json(?3)),
             updated_at     = ?4
           WHERE claim_id = ?1",
          rusqlite::params![id_str, status, change_str, at_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::ClaimNotFound(id));
    }
    self.require_claim(id).await
  }

  async fn set_workflow(&self, id: Uuid, link: WorkflowLink) -> Result<Claim> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE claims SET
             process_key       = ?2,
             workflow_status   = ?3,
             risk_score        = ?4,
             workflow_degraded = ?5,
             updated_at        = ?6
           WHERE claim_id = ?1",
          rusqlite::params![
            id_str,
            link.process_key,
            link.workflow_status,
            link.risk_score,
            link.degraded,
            at_str,
          ],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::ClaimNotFound(id));
    }
    self.require_claim(id).await
  }

  async fn add_files(&self, id: Uuid, files: Vec<StoredFile>) -> Result<Claim> {
    let id_str  = encode_uuid(id);
    let at_str  = encode_dt(Utc::now());
    let encoded = files.iter().map(encode_file).collect::<Result<Vec<_>>>()?;

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM claims WHERE claim_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }
        for file in &encoded {
          tx.execute(
            "UPDATE claims SET files = json_insert(files, '$[#]', json(?2)) WHERE claim_id = ?1",
            rusqlite::params![id_str, file],
          )?;
        }
        tx.execute(
          "UPDATE claims SET updated_at = ?2 WHERE claim_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::ClaimNotFound(id));
    }
    self.require_claim(id).await
  }

  async fn find_claim_by_folder(&self, folder_id: &str) -> Result<Option<Claim>> {
    let folder_id = folder_id.to_owned();
    let raw: Option<RawClaim> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {CLAIM_COLUMNS} FROM claims WHERE folder_id = ?1
               ORDER BY created_at DESC LIMIT 1"
            ),
            rusqlite::params![folder_id],
            RawClaim::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawClaim::into_claim).transpose()
  }

  async fn status_counts(&self) -> Result<Vec<(ClaimStatus, u64)>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT status, COUNT(*) FROM claims GROUP BY status ORDER BY status")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(s, n)| Ok((s.parse::<ClaimStatus>()?, n.max(0) as u64)))
      .collect()
  }
}
