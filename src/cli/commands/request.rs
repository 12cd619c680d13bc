use anyhow::{anyhow, Context, Result};

use super::{CliContext, Command};
use crate::cli::PayloadArgs;
use crate::request::{
    allowed_operations, Actor, CertificationRequest, Operation, RequestId, RequestPayload, Role,
    SupportingDocument, TreatmentType,
};
use crate::store::RequestStore;

impl PayloadArgs {
    pub fn to_payload(&self) -> Result<RequestPayload> {
        let mut payload = RequestPayload::new(self.company.clone(), self.site.clone())
            .with_description(self.description.clone());
        for document in &self.documents {
            let (name, reference) = document
                .split_once('=')
                .ok_or_else(|| anyhow!("document '{document}' must be NAME=REFERENCE"))?;
            payload = payload.with_document(SupportingDocument::new(name, reference));
        }
        if let Some(data) = &self.data {
            let value = serde_json::from_str(data).context("--data is not valid JSON")?;
            payload = payload.with_structured_data(value);
        }
        Ok(payload)
    }
}

pub(crate) fn print_request(request: &CertificationRequest) {
    println!("📋 Request {} ({})", request.id, request.id.short());
    println!("   Status:      {}", request.status);
    println!("   Treatment:   {}", request.treatment_type);
    println!("   Requester:   {}", request.requester);
    println!("   Company:     {}", request.payload.company_name);
    if let Some(assignee) = &request.assignee {
        println!("   Assignee:    {assignee}");
    }
    println!(
        "   Payment:     {}",
        if request.has_payment { "received" } else { "pending" }
    );
    if let Some(predecessor) = &request.predecessor {
        println!("   Resubmits:   {predecessor}");
    }
    if let Some(comments) = &request.decision_comments {
        println!("   Decision:    {comments}");
    }
    let next: Vec<&str> = allowed_operations(request.status)
        .iter()
        .map(Operation::as_str)
        .collect();
    if next.is_empty() {
        println!("   Next:        none (final)");
    } else {
        println!("   Next:        {}", next.join(", "));
    }
}

pub struct CreateCommand {
    pub actor: String,
    pub role: Role,
    pub treatment: TreatmentType,
    pub payload: PayloadArgs,
    pub draft: bool,
}

impl Command for CreateCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let actor = Actor::new(self.actor.clone(), self.role);
        let payload = self.payload.to_payload()?;
        let request = if self.draft {
            ctx.orchestrator
                .create_draft(&actor, self.treatment, payload)
                .await?
        } else {
            ctx.orchestrator
                .submit_new(&actor, self.treatment, payload)
                .await?
        };
        ctx.emit(&request, || {
            println!("✅ Created request {}", request.id);
            print_request(&request);
        })
    }
}

pub struct SubmitCommand {
    pub id: RequestId,
    pub actor: String,
}

impl Command for SubmitCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let actor = Actor::enterprise(self.actor.clone());
        let request = ctx.orchestrator.submit(&self.id, &actor).await?;
        ctx.emit(&request, || {
            println!("📤 Submitted request {}", request.id);
        })
    }
}

pub struct ResubmitCommand {
    pub id: RequestId,
    pub payload: PayloadArgs,
}

impl Command for ResubmitCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let payload = self.payload.to_payload()?;
        let request = ctx.orchestrator.resubmit(&self.id, payload).await?;
        ctx.emit(&request, || {
            println!("🔁 Resubmitted {} as {}", self.id, request.id);
            print_request(&request);
        })
    }
}

pub struct CancelCommand {
    pub id: RequestId,
    pub actor: String,
}

impl Command for CancelCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let actor = Actor::enterprise(self.actor.clone());
        let request = ctx.orchestrator.cancel(&self.id, &actor).await?;
        ctx.emit(&request, || {
            println!("🛑 Cancelled request {}", request.id);
        })
    }
}

pub struct PayCommand {
    pub id: RequestId,
}

impl Command for PayCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let store = ctx.orchestrator.store();
        store.record_payment(&self.id).await?;
        let request = store.get_request(&self.id).await?;
        ctx.emit(&request, || {
            println!("💳 Payment recorded for request {}", request.id);
        })
    }
}
