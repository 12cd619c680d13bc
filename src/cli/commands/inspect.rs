use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use super::request::print_request;
use super::{CliContext, Command};
use crate::request::{RequestId, RequestStatus, TreatmentType, TRANSITIONS};
use crate::validation::{
    DynamicForm, GateReport, Law, ReviewRecord, ValidationChecklist, ValidationStep,
};

fn mark(done: bool) -> &'static str {
    if done {
        "✅"
    } else {
        "⬜"
    }
}

pub struct StatusCommand {
    pub id: RequestId,
}

impl Command for StatusCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let request = ctx.orchestrator.get_request(&self.id).await?;
        ctx.emit(&request, || print_request(&request))
    }
}

pub struct ListCommand {
    pub status: Option<RequestStatus>,
}

impl Command for ListCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let requests = ctx.orchestrator.list_requests(self.status).await?;
        ctx.emit(&requests, || {
            if requests.is_empty() {
                println!("📭 No certification requests");
                return;
            }
            println!("📋 {} certification request(s)", requests.len());
            for request in &requests {
                println!(
                    "   {}  {:<13} {:<14} {}",
                    request.id.short(),
                    request.status.as_str(),
                    request.treatment_type.as_str(),
                    request.payload.company_name
                );
            }
        })
    }
}

#[derive(Serialize)]
struct ChecklistView<'a> {
    checklist: &'a ValidationChecklist,
    gate: GateReport,
}

fn print_review(review: &ReviewRecord, report: &GateReport) {
    let checklist = &review.checklist;
    println!("🧾 Review of {} by {}", review.request_id, review.reviewer);
    println!("   {} 1. Documents verified", mark(checklist.documents_verified));
    println!(
        "   {} 2. Legal compliance",
        mark(report.is_complete(ValidationStep::LegalCompliance))
    );
    for law in &review.laws {
        println!(
            "        {} {} {}{}",
            mark(checklist.is_compliant(&law.id)),
            law.id,
            law.title,
            if law.is_mandatory { "" } else { " (optional)" }
        );
    }
    println!("   {} 3. Technical validation", mark(checklist.technical_validation));
    println!("   {} 4. Decision", mark(checklist.decision.is_set()));
    if !report.missing_mandatory_laws.is_empty() {
        let missing: Vec<&str> = report
            .missing_mandatory_laws
            .iter()
            .map(|id| id.as_str())
            .collect();
        println!("   Missing mandatory laws: {}", missing.join(", "));
    }
    println!(
        "   {}",
        if report.can_approve {
            "Ready for approval"
        } else {
            "Not ready for approval"
        }
    );
}

pub struct ChecklistCommand {
    pub id: RequestId,
}

impl Command for ChecklistCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let review = ctx.orchestrator.get_review(&self.id).await?;
        let view = ChecklistView {
            checklist: &review.checklist,
            gate: review.gate().report(),
        };
        ctx.emit(&view, || print_review(&review, &view.gate))
    }
}

pub struct HistoryCommand {
    pub id: RequestId,
}

impl Command for HistoryCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let history = ctx.orchestrator.history(&self.id).await?;
        ctx.emit(&history, || {
            println!("🕒 History of request {}", self.id);
            for record in &history {
                let from = record.from.map(|s| s.as_str()).unwrap_or("-");
                let actor = record.actor.as_ref().map(|a| a.as_str()).unwrap_or("system");
                println!(
                    "   {}  {:<20} {} -> {}  by {}",
                    record.at.format("%Y-%m-%d %H:%M:%S"),
                    record.operation.as_str(),
                    from,
                    record.to,
                    actor
                );
                if let Some(comment) = &record.comment {
                    println!("      {comment}");
                }
            }
        })
    }
}

#[derive(Serialize)]
struct LawsView<'a> {
    treatment_type: TreatmentType,
    laws: &'a [Law],
    form: Option<&'a DynamicForm>,
}

pub struct LawsCommand {
    pub treatment: TreatmentType,
}

impl Command for LawsCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let view = LawsView {
            treatment_type: self.treatment,
            laws: ctx.catalog.laws(self.treatment),
            form: ctx.catalog.form(self.treatment),
        };
        ctx.emit(&view, || {
            println!("⚖️  Laws for {}", self.treatment);
            for law in view.laws {
                println!(
                    "   {} {:<18} {}",
                    if law.is_mandatory { "●" } else { "○" },
                    law.id,
                    law.title
                );
            }
            if let Some(form) = view.form {
                println!("📝 Technical form: {} field(s)", form.fields.len());
                for field in &form.fields {
                    println!(
                        "   - {}{}",
                        field.label,
                        if field.required { " *" } else { "" }
                    );
                }
            }
        })
    }
}

/// Offline re-validation of a saved review record
pub struct GateCommand {
    pub file: PathBuf,
}

impl Command for GateCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let content = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("reading {}", self.file.display()))?;
        let review: ReviewRecord = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a review record", self.file.display()))?;

        let gate = review.gate();
        let report = gate.report();
        ctx.emit(&report, || print_review(&review, &report))?;
        gate.check_approval()?;
        Ok(())
    }
}

pub struct TransitionsCommand;

impl Command for TransitionsCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        ctx.emit(&TRANSITIONS, || {
            println!("🔀 Request lifecycle");
            for t in TRANSITIONS {
                let from = t.from.map(|s| s.as_str()).unwrap_or("(new)");
                println!(
                    "   {:<13} --{:<20}--> {:<13} [{}]",
                    from,
                    t.operation.as_str(),
                    t.to.as_str(),
                    t.precondition
                );
            }
        })
    }
}
