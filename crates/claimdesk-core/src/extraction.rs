//! Extraction types and their static field/prompt tables.
//!
//! Each [`ExtractionType`] names a kind of claim document and carries the
//! fields a structured extraction should return for it, plus the prompts
//! used for summary and analysis questions.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Field table ─────────────────────────────────────────────────────────────

/// The value type the AI is asked to produce for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
  String,
  Date,
  Float,
}

/// One entry of an extraction field table.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
  pub key:          &'static str,
  pub display_name: &'static str,
  #[serde(rename = "type")]
  pub kind:         FieldKind,
  pub description:  &'static str,
}

const fn field(
  key: &'static str,
  display_name: &'static str,
  kind: FieldKind,
  description: &'static str,
) -> FieldSpec {
  FieldSpec { key, display_name, kind, description }
}

use FieldKind::{Date, Float, String as Text};

const FNOL_FIELDS: &[FieldSpec] = &[
  field("claimant_name", "Claimant Name", Text, "Full name of the person reporting the loss"),
  field("policy_number", "Policy Number", Text, "Insurance policy number"),
  field("date_of_loss", "Date of Loss", Date, "Date the incident occurred"),
  field("time_of_loss", "Time of Loss", Text, "Time of day the incident occurred"),
  field("loss_location", "Loss Location", Text, "Address or description of where the loss occurred"),
  field("loss_description", "Loss Description", Text, "Narrative of what happened"),
  field("loss_type", "Loss Type", Text, "Category of loss, e.g. collision, theft, fire, water"),
  field("claimant_phone", "Claimant Phone", Text, "Contact phone number of the claimant"),
  field("claimant_email", "Claimant Email", Text, "Contact email of the claimant"),
  field("claimant_address", "Claimant Address", Text, "Mailing address of the claimant"),
  field("vehicle_make", "Vehicle Make", Text, "Manufacturer of the insured vehicle"),
  field("vehicle_model", "Vehicle Model", Text, "Model of the insured vehicle"),
  field("vehicle_year", "Vehicle Year", Text, "Model year of the insured vehicle"),
  field("vehicle_vin", "Vehicle VIN", Text, "Vehicle identification number"),
  field("injuries_reported", "Injuries Reported", Text, "Whether injuries were reported and a short description"),
  field("police_report_number", "Police Report Number", Text, "Police report or case number, if any"),
  field("witness_names", "Witness Names", Text, "Names of any witnesses"),
  field("estimated_damage", "Estimated Damage", Float, "Estimated monetary amount of the damage"),
  field("other_party_name", "Other Party Name", Text, "Name of the other party involved, if any"),
  field("other_party_insurance", "Other Party Insurance", Text, "Insurer and policy of the other party, if any"),
];

const MEDICAL_FIELDS: &[FieldSpec] = &[
  field("patient_name", "Patient Name", Text, "Full name of the patient"),
  field("date_of_service", "Date of Service", Date, "Date treatment was provided"),
  field("provider_name", "Provider Name", Text, "Treating physician or facility"),
  field("diagnosis", "Diagnosis", Text, "Diagnosis as written on the record"),
  field("diagnosis_codes", "Diagnosis Codes", Text, "ICD-10 codes listed on the record"),
  field("procedure_codes", "Procedure Codes", Text, "CPT codes listed on the record"),
  field("treatment_description", "Treatment", Text, "Treatment performed"),
  field("total_charges", "Total Charges", Float, "Total billed amount"),
  field("follow_up_required", "Follow-up Required", Text, "Whether follow-up care was ordered"),
];

const ESTIMATE_FIELDS: &[FieldSpec] = &[
  field("shop_name", "Shop Name", Text, "Repair shop or contractor issuing the estimate"),
  field("estimate_date", "Estimate Date", Date, "Date the estimate was written"),
  field("vehicle_or_property", "Vehicle or Property", Text, "What is being repaired"),
  field("labor_cost", "Labor Cost", Float, "Total labor amount"),
  field("parts_cost", "Parts Cost", Float, "Total parts or materials amount"),
  field("tax", "Tax", Float, "Tax amount"),
  field("total_estimate", "Total Estimate", Float, "Grand total of the estimate"),
  field("line_items", "Line Items", Text, "Itemised repair operations"),
];

const POLICE_FIELDS: &[FieldSpec] = &[
  field("report_number", "Report Number", Text, "Police report or case number"),
  field("agency", "Agency", Text, "Reporting law-enforcement agency"),
  field("officer_name", "Officer Name", Text, "Name and badge of the reporting officer"),
  field("incident_date", "Incident Date", Date, "Date of the incident"),
  field("incident_location", "Incident Location", Text, "Where the incident occurred"),
  field("parties_involved", "Parties Involved", Text, "Names of all parties involved"),
  field("citations_issued", "Citations Issued", Text, "Citations issued and to whom"),
  field("narrative", "Narrative", Text, "Officer narrative of the incident"),
  field("fault_determination", "Fault Determination", Text, "Party the officer found at fault, if stated"),
];

const INVOICE_FIELDS: &[FieldSpec] = &[
  field("vendor_name", "Vendor Name", Text, "Business issuing the invoice"),
  field("invoice_number", "Invoice Number", Text, "Invoice identifier"),
  field("invoice_date", "Invoice Date", Date, "Date of the invoice"),
  field("due_date", "Due Date", Date, "Payment due date"),
  field("bill_to", "Bill To", Text, "Name and address billed"),
  field("line_items", "Line Items", Text, "Itemised goods or services"),
  field("subtotal", "Subtotal", Float, "Amount before tax"),
  field("tax", "Tax", Float, "Tax amount"),
  field("total_amount", "Total Amount", Float, "Total amount due"),
];

const INSURANCE_CLAIM_FIELDS: &[FieldSpec] = &[
  field("claim_number", "Claim Number", Text, "Claim identifier, if already assigned"),
  field("policy_number", "Policy Number", Text, "Insurance policy number"),
  field("policyholder_name", "Policyholder Name", Text, "Name of the policyholder"),
  field("claim_type", "Claim Type", Text, "Type of claim, e.g. auto, property, medical"),
  field("date_of_loss", "Date of Loss", Date, "Date the loss occurred"),
  field("loss_description", "Loss Description", Text, "Description of the loss"),
  field("amount_claimed", "Amount Claimed", Float, "Amount the claimant is requesting"),
  field("deductible", "Deductible", Float, "Deductible stated on the claim"),
  field("supporting_documents", "Supporting Documents", Text, "Documents referenced as attached"),
  field("signature_present", "Signature Present", Text, "Whether the claimant signed the form"),
];

// ─── ExtractionType ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionType {
  Fnol,
  Medical,
  Estimate,
  Police,
  Invoice,
  InsuranceClaim,
}

impl ExtractionType {
  pub const ALL: [ExtractionType; 6] = [
    ExtractionType::Fnol,
    ExtractionType::Medical,
    ExtractionType::Estimate,
    ExtractionType::Police,
    ExtractionType::Invoice,
    ExtractionType::InsuranceClaim,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      ExtractionType::Fnol => "fnol",
      ExtractionType::Medical => "medical",
      ExtractionType::Estimate => "estimate",
      ExtractionType::Police => "police",
      ExtractionType::Invoice => "invoice",
      ExtractionType::InsuranceClaim => "insurance_claim",
    }
  }

  pub fn fields(self) -> &'static [FieldSpec] {
    match self {
      ExtractionType::Fnol => FNOL_FIELDS,
      ExtractionType::Medical => MEDICAL_FIELDS,
      ExtractionType::Estimate => ESTIMATE_FIELDS,
      ExtractionType::Police => POLICE_FIELDS,
      ExtractionType::Invoice => INVOICE_FIELDS,
      ExtractionType::InsuranceClaim => INSURANCE_CLAIM_FIELDS,
    }
  }

  pub fn field_keys(self) -> impl Iterator<Item = &'static str> {
    self.fields().iter().map(|f| f.key)
  }

  pub fn summary_prompt(self) -> &'static str {
    match self {
      ExtractionType::Fnol => {
        "Summarize this first notice of loss in three sentences: who is reporting, what happened, and what damage or injury is claimed."
      }
      ExtractionType::Medical => {
        "Summarize this medical record: the patient, the diagnosis, the treatment given and the total charges."
      }
      ExtractionType::Estimate => {
        "Summarize this repair estimate: what is being repaired, the major operations and the total amount."
      }
      ExtractionType::Police => {
        "Summarize this police report: when and where the incident happened, who was involved and any fault determination."
      }
      ExtractionType::Invoice => {
        "Summarize this invoice: the vendor, what was billed and the total amount due."
      }
      ExtractionType::InsuranceClaim => {
        "Summarize this insurance claim form: the policyholder, the type of loss and the amount claimed."
      }
    }
  }

  pub fn analysis_prompt(self) -> &'static str {
    match self {
      ExtractionType::Fnol => {
        "Review this first notice of loss for inconsistencies, missing information and indicators of possible fraud. List each finding with a severity of low, medium or high."
      }
      ExtractionType::Medical => {
        "Review this medical record for treatment that does not match the diagnosis, duplicate charges or unusually high costs. List each finding with a severity."
      }
      ExtractionType::Estimate => {
        "Review this estimate for inflated labor, parts unrelated to the described loss or pricing outside normal ranges. List each finding with a severity."
      }
      ExtractionType::Police => {
        "Review this police report for statements that conflict with a typical claimant account, and note any citations relevant to liability."
      }
      ExtractionType::Invoice => {
        "Review this invoice for arithmetic errors, duplicate line items or charges unrelated to an insurance loss. List each finding with a severity."
      }
      ExtractionType::InsuranceClaim => {
        "Review this claim form for missing required fields, date inconsistencies and indicators that the claim should be referred to the special investigations unit."
      }
    }
  }
}

impl fmt::Display for ExtractionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ExtractionType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ExtractionType::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| Error::UnknownExtractionType(s.to_owned()))
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// The uniform response shape of every gateway operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionEnvelope {
  pub success:         bool,
  pub file_id:         String,
  pub timestamp:       DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extraction_type: Option<ExtractionType>,
  pub data:            serde_json::Value,
}

impl ExtractionEnvelope {
  pub fn ok(
    file_id: impl Into<String>,
    extraction_type: Option<ExtractionType>,
    data: serde_json::Value,
  ) -> Self {
    Self {
      success: true,
      file_id: file_id.into(),
      timestamp: Utc::now(),
      extraction_type,
      data,
    }
  }
}

/// Keep only the documented keys of `answer` for `ty`.
///
/// Non-object answers are returned as an empty object.
pub fn retain_documented_fields(ty: ExtractionType, answer: serde_json::Value) -> serde_json::Value {
  let serde_json::Value::Object(mut map) = answer else {
    return serde_json::Value::Object(Default::default());
  };
  map.retain(|k, _| ty.field_keys().any(|f| f == k));
  serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use serde_json::json;

  use super::*;

  #[test]
  fn fnol_has_twenty_distinct_fields() {
    let keys: HashSet<_> = ExtractionType::Fnol.field_keys().collect();
    assert_eq!(keys.len(), 20);
    assert_eq!(ExtractionType::Fnol.fields().len(), 20);
  }

  #[test]
  fn every_type_has_unique_keys() {
    for ty in ExtractionType::ALL {
      let keys: HashSet<_> = ty.field_keys().collect();
      assert_eq!(keys.len(), ty.fields().len(), "duplicate key in {ty}");
      assert!(!keys.is_empty());
    }
  }

  #[test]
  fn parse_accepts_only_wire_names() {
    assert_eq!("insurance_claim".parse::<ExtractionType>().unwrap(), ExtractionType::InsuranceClaim);
    assert!("FNOL".parse::<ExtractionType>().is_err());
    assert!("receipt".parse::<ExtractionType>().is_err());
  }

  #[test]
  fn retain_drops_undocumented_keys() {
    let answer = json!({ "claimant_name": "Ada", "favourite_colour": "blue" });
    let kept = retain_documented_fields(ExtractionType::Fnol, answer);
    assert_eq!(kept, json!({ "claimant_name": "Ada" }));
  }

  #[test]
  fn retain_on_non_object_is_empty_object() {
    assert_eq!(retain_documented_fields(ExtractionType::Police, json!("text")), json!({}));
  }

  #[test]
  fn envelope_serialises_camel_case() {
    let env = ExtractionEnvelope::ok("123", Some(ExtractionType::Fnol), json!({}));
    let v = serde_json::to_value(&env).unwrap();
    assert_eq!(v["fileId"], "123");
    assert_eq!(v["success"], true);
    assert_eq!(v["extractionType"], "fnol");
  }
}
