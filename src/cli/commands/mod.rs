use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

use super::{Cli, Commands};
use crate::config::CertifyConfig;
use crate::external::{
    CachedLawCatalog, LocalCertificateIssuer, LocalRejectionReporter, StaticCatalog,
};
use crate::request::{Operation, RequestId};
use crate::store::JsonFileStore;
use crate::telemetry::{generate_correlation_id, workflow_span};
use crate::workflow::{Collaborators, WorkflowOrchestrator};

pub mod inspect;
pub mod request;
pub mod review;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, ctx: &CliContext) -> Result<()>;
}

/// Everything a command needs, wired from configuration
pub struct CliContext {
    pub orchestrator: WorkflowOrchestrator,
    pub catalog: Arc<StaticCatalog>,
    pub json: bool,
}

impl CliContext {
    pub async fn open(config: &CertifyConfig, state: Option<PathBuf>, json: bool) -> Result<Self> {
        let catalog = Arc::new(match &config.catalog.path {
            Some(path) => StaticCatalog::from_path(path)
                .await
                .with_context(|| format!("loading catalog {}", path.display()))?,
            None => StaticCatalog::builtin()?,
        });
        let laws = Arc::new(CachedLawCatalog::new(
            catalog.clone(),
            config.catalog.cache_ttl(),
            config.catalog.cache_capacity,
        ));
        let state_path = state.unwrap_or_else(|| config.storage.state_file_path.clone());
        let store = Arc::new(JsonFileStore::new(state_path));

        let orchestrator = WorkflowOrchestrator::new(
            store,
            Collaborators {
                laws,
                forms: catalog.clone(),
                certificates: Arc::new(LocalCertificateIssuer::new(
                    config.workflow.certificate_validity_days,
                )),
                rejections: Arc::new(LocalRejectionReporter::new()),
            },
            &config.workflow,
        );

        Ok(Self {
            orchestrator,
            catalog,
            json,
        })
    }

    /// Print `value` as pretty JSON when `--json` was given, otherwise run `text`
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

/// Operation and target a command acts on, for the workflow span
fn workflow_target(command: &Commands) -> Option<(Operation, Option<&RequestId>)> {
    match command {
        Commands::Create { draft: true, .. } => Some((Operation::CreateDraft, None)),
        Commands::Create { .. } => Some((Operation::SubmitNew, None)),
        Commands::Submit { id, .. } => Some((Operation::Submit, Some(id))),
        Commands::Assign { id, .. } => Some((Operation::AssignToMe, Some(id))),
        Commands::Approve { id, .. } => Some((Operation::ApproveAndGenerate, Some(id))),
        Commands::Reject { id, .. } => Some((Operation::Reject, Some(id))),
        Commands::Resubmit { id, .. } => Some((Operation::Resubmit, Some(id))),
        Commands::Cancel { id, .. } => Some((Operation::Cancel, Some(id))),
        _ => None,
    }
}

pub async fn run(cli: Cli, config: &CertifyConfig) -> Result<()> {
    let ctx = CliContext::open(config, cli.state, cli.json).await?;

    let span = match workflow_target(&cli.command) {
        Some((operation, id)) => workflow_span(operation, id, &generate_correlation_id()),
        None => tracing::debug_span!("certify_query"),
    };

    dispatch(cli.command, &ctx).instrument(span).await
}

async fn dispatch(command: Commands, ctx: &CliContext) -> Result<()> {
    match command {
        Commands::Create {
            actor,
            role,
            treatment,
            payload,
            draft,
        } => {
            request::CreateCommand {
                actor,
                role,
                treatment,
                payload,
                draft,
            }
            .execute(ctx)
            .await
        }
        Commands::Submit { id, actor } => request::SubmitCommand { id, actor }.execute(ctx).await,
        Commands::Resubmit { id, payload } => {
            request::ResubmitCommand { id, payload }.execute(ctx).await
        }
        Commands::Cancel { id, actor } => request::CancelCommand { id, actor }.execute(ctx).await,
        Commands::Pay { id } => request::PayCommand { id }.execute(ctx).await,
        Commands::Assign { id, actor, role } => {
            review::AssignCommand { id, actor, role }.execute(ctx).await
        }
        Commands::Record {
            id,
            step,
            law,
            value,
        } => {
            review::RecordCommand {
                id,
                step,
                law,
                value,
            }
            .execute(ctx)
            .await
        }
        Commands::Approve { id, comments } => {
            review::ApproveCommand { id, comments }.execute(ctx).await
        }
        Commands::Reject { id, reason } => review::RejectCommand { id, reason }.execute(ctx).await,
        Commands::Status { id } => inspect::StatusCommand { id }.execute(ctx).await,
        Commands::List { status } => inspect::ListCommand { status }.execute(ctx).await,
        Commands::Checklist { id } => inspect::ChecklistCommand { id }.execute(ctx).await,
        Commands::History { id } => inspect::HistoryCommand { id }.execute(ctx).await,
        Commands::Laws { treatment } => inspect::LawsCommand { treatment }.execute(ctx).await,
        Commands::Gate { file } => inspect::GateCommand { file }.execute(ctx).await,
        Commands::Transitions => inspect::TransitionsCommand.execute(ctx).await,
    }
}
