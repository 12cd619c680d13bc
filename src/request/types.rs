// Core types for certification requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, immutable identifier of a certification request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, upper-cased. Used in minted document numbers.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_uppercase()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identifier of a user acting on the workflow (enterprise account or employee)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ActorId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Roles known to the certification platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Enterprise submitting certification requests
    Enterprise,
    /// Employee reviewing and validating requests
    Employee,
    /// Authority auditing outcomes (read-only)
    Authority,
    /// Administrator configuring the platform
    Admin,
}

impl Role {
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Employee | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enterprise" => Ok(Role::Enterprise),
            "employee" => Ok(Role::Employee),
            "authority" => Ok(Role::Authority),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A caller of a workflow operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: ActorId::new(id),
            role,
        }
    }

    pub fn enterprise(id: impl Into<String>) -> Self {
        Self::new(id, Role::Enterprise)
    }

    pub fn employee(id: impl Into<String>) -> Self {
        Self::new(id, Role::Employee)
    }
}

/// Category of DEEE handling activity; decides which laws and forms apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentType {
    Collection,
    Transport,
    Storage,
    Sorting,
    Dismantling,
    Recycling,
    Refurbishment,
    Disposal,
}

impl TreatmentType {
    pub const ALL: [TreatmentType; 8] = [
        TreatmentType::Collection,
        TreatmentType::Transport,
        TreatmentType::Storage,
        TreatmentType::Sorting,
        TreatmentType::Dismantling,
        TreatmentType::Recycling,
        TreatmentType::Refurbishment,
        TreatmentType::Disposal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentType::Collection => "collection",
            TreatmentType::Transport => "transport",
            TreatmentType::Storage => "storage",
            TreatmentType::Sorting => "sorting",
            TreatmentType::Dismantling => "dismantling",
            TreatmentType::Recycling => "recycling",
            TreatmentType::Refurbishment => "refurbishment",
            TreatmentType::Disposal => "disposal",
        }
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TreatmentType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown treatment type: {s}"))
    }
}

/// Lifecycle status of a certification request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Draft => "draft",
            RequestStatus::Submitted => "submitted",
            RequestStatus::UnderReview => "under_review",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// No further transition leaves this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Cancelled)
    }

    /// Rejected requests only allow resubmission, which creates a new request
    pub fn is_semi_terminal(&self) -> bool {
        matches!(self, RequestStatus::Rejected)
    }

    pub fn is_open(&self) -> bool {
        !self.is_terminal() && !self.is_semi_terminal()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        [
            RequestStatus::Draft,
            RequestStatus::Submitted,
            RequestStatus::UnderReview,
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Cancelled,
        ]
        .into_iter()
        .find(|status| status.as_str() == wanted)
        .ok_or_else(|| format!("unknown request status: {s}"))
    }
}

/// Operations that move a request through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateDraft,
    SubmitNew,
    Submit,
    AssignToMe,
    ApproveAndGenerate,
    Reject,
    Resubmit,
    Cancel,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateDraft => "create_draft",
            Operation::SubmitNew => "submit_new",
            Operation::Submit => "submit",
            Operation::AssignToMe => "assign_to_me",
            Operation::ApproveAndGenerate => "approve_and_generate",
            Operation::Reject => "reject",
            Operation::Resubmit => "resubmit",
            Operation::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file attached to a request, stored by the external document service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingDocument {
    pub name: String,
    /// Storage reference (URL or object key) of the uploaded file
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl SupportingDocument {
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
            content_type: None,
        }
    }
}

/// Data supplied by the enterprise when creating or resubmitting a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub company_name: String,
    pub site_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub documents: Vec<SupportingDocument>,
    /// Answers to the treatment-type form, when submitted as structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<serde_json::Value>,
}

impl RequestPayload {
    pub fn new(company_name: impl Into<String>, site_address: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            site_address: site_address.into(),
            ..Default::default()
        }
    }

    pub fn with_document(mut self, document: SupportingDocument) -> Self {
        self.documents.push(document);
        self
    }

    pub fn with_structured_data(mut self, data: serde_json::Value) -> Self {
        self.structured_data = Some(data);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn has_structured_data(&self) -> bool {
        match &self.structured_data {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Object(map)) => !map.is_empty(),
            Some(serde_json::Value::Array(items)) => !items.is_empty(),
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Fields missing for the payload to be submitted for review
    pub fn missing_for_submission(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.company_name.trim().is_empty() {
            missing.push("company_name");
        }
        if self.site_address.trim().is_empty() {
            missing.push("site_address");
        }
        if self.documents.is_empty() && !self.has_structured_data() {
            missing.push("documents_or_structured_data");
        }
        missing
    }

    /// Documents must carry both a name and a storage reference
    pub fn malformed_documents(&self) -> Vec<usize> {
        self.documents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.name.trim().is_empty() || d.reference.trim().is_empty())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Reviewer's verdict recorded on the checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Unset,
    Approve,
    Reject,
}

impl Decision {
    pub fn is_set(&self) -> bool {
        !matches!(self, Decision::Unset)
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unset" | "none" => Ok(Decision::Unset),
            "approve" => Ok(Decision::Approve),
            "reject" => Ok(Decision::Reject),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

/// Audit trail entry appended with every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: Option<RequestStatus>,
    pub to: RequestStatus,
    pub operation: Operation,
    pub actor: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub at: DateTime<Utc>,
}

/// A certification request submitted by an enterprise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationRequest {
    pub id: RequestId,
    pub requester: ActorId,
    pub treatment_type: TreatmentType,
    pub status: RequestStatus,
    pub assignee: Option<ActorId>,
    pub decision_comments: Option<String>,
    /// Maintained by the payment service; read-only for the workflow
    pub has_payment: bool,
    pub payload: RequestPayload,
    /// Rejected request this one was resubmitted from
    pub predecessor: Option<RequestId>,
    /// Optimistic concurrency version, bumped on every persisted change
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<TransitionRecord>,
}

impl CertificationRequest {
    /// Build a fresh request in `status`, recording the creating operation in history
    pub fn new(
        requester: ActorId,
        treatment_type: TreatmentType,
        payload: RequestPayload,
        status: RequestStatus,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> Self {
        let history = vec![TransitionRecord {
            from: None,
            to: status,
            operation,
            actor: Some(requester.clone()),
            comment: None,
            at: now,
        }];
        Self {
            id: RequestId::new(),
            requester,
            treatment_type,
            status,
            assignee: None,
            decision_comments: None,
            has_payment: false,
            payload,
            predecessor: None,
            version: 0,
            created_at: now,
            updated_at: now,
            history,
        }
    }

    pub fn is_requester(&self, actor: &ActorId) -> bool {
        &self.requester == actor
    }

    pub fn last_transition(&self) -> Option<&TransitionRecord> {
        self.history.last()
    }
}
