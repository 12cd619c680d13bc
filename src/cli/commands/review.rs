use anyhow::{anyhow, Result};

use super::{CliContext, Command};
use crate::request::{Actor, Decision, RequestId, Role};
use crate::validation::{LawId, StepUpdate, ValidationStep};

pub struct AssignCommand {
    pub id: RequestId,
    pub actor: String,
    pub role: Role,
}

impl Command for AssignCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let actor = Actor::new(self.actor.clone(), self.role);
        let request = ctx.orchestrator.assign_to_me(&self.id, &actor).await?;
        ctx.emit(&request, || {
            println!("🔍 Request {} is now under review by {}", request.id, actor.id);
            if !request.has_payment {
                println!("⚠️  Payment has not been received yet");
            }
        })
    }
}

pub struct RecordCommand {
    pub id: RequestId,
    pub step: ValidationStep,
    pub law: Option<String>,
    pub value: String,
}

impl RecordCommand {
    pub fn to_update(&self) -> Result<StepUpdate> {
        let flag = || {
            self.value
                .trim()
                .parse::<bool>()
                .map_err(|_| anyhow!("value must be true or false, got '{}'", self.value))
        };
        Ok(match self.step {
            ValidationStep::DocumentsVerified => StepUpdate::DocumentsVerified { value: flag()? },
            ValidationStep::LegalCompliance => {
                let law_id = self
                    .law
                    .as_deref()
                    .ok_or_else(|| anyhow!("--law is required for the legal compliance step"))?;
                StepUpdate::LegalCompliance {
                    law_id: LawId::from(law_id),
                    value: flag()?,
                }
            }
            ValidationStep::TechnicalValidation => {
                StepUpdate::TechnicalValidation { value: flag()? }
            }
            ValidationStep::Decision => StepUpdate::Decision {
                value: self.value.parse::<Decision>().map_err(|e| anyhow!(e))?,
            },
        })
    }
}

impl Command for RecordCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let update = self.to_update()?;
        let review = ctx.orchestrator.record_step(&self.id, update).await?;
        let report = review.gate().report();
        ctx.emit(&report, || {
            println!("✏️  Recorded step {} on request {}", self.step, self.id);
            match report.current_step {
                Some(step) => println!("   Next step: {step}"),
                None => println!("   All steps complete"),
            }
            if report.can_approve {
                println!("✅ Ready for approval");
            }
        })
    }
}

pub struct ApproveCommand {
    pub id: RequestId,
    pub comments: Option<String>,
}

impl Command for ApproveCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let outcome = ctx
            .orchestrator
            .approve_with_comments(&self.id, self.comments.as_deref())
            .await?;
        ctx.emit(&outcome, || {
            println!("🎉 Request {} approved", outcome.request.id);
            match &outcome.certificate_id {
                Some(id) => println!("📜 Certificate {id} issued"),
                None => println!("⚠️  Certificate issuance failed; retry from the certificate service"),
            }
        })
    }
}

pub struct RejectCommand {
    pub id: RequestId,
    pub reason: String,
}

impl Command for RejectCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let outcome = ctx.orchestrator.reject(&self.id, &self.reason).await?;
        ctx.emit(&outcome, || {
            println!("❌ Request {} rejected", outcome.request.id);
            match &outcome.report_id {
                Some(id) => println!("📄 Rejection report {id} generated"),
                None => println!("⚠️  Rejection report could not be generated"),
            }
        })
    }
}
