use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::request::{RequestId, RequestStatus, Role, TreatmentType};
use crate::validation::ValidationStep;

pub mod commands;

#[derive(Parser)]
#[command(name = "deee-certify")]
#[command(about = "Certification workflow for e-waste treatment sites")]
#[command(long_about = "deee-certify tracks certification requests from submission through review \
                       to approval or rejection. Reviewers walk a four-step checklist; a request \
                       is only approved once every mandatory law for its treatment type is checked.")]
pub struct Cli {
    /// JSON state file to operate on
    #[arg(long, global = true, help = "State file (defaults to storage.state_file_path)")]
    pub state: Option<PathBuf>,
    /// Explicit configuration file
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

/// Request contents shared by `create` and `resubmit`
#[derive(Args, Debug, Clone)]
pub struct PayloadArgs {
    #[arg(long, help = "Legal name of the enterprise")]
    pub company: String,
    #[arg(long, help = "Address of the treatment site")]
    pub site: String,
    #[arg(long, default_value = "", help = "Free-text description of the activity")]
    pub description: String,
    /// Supporting documents as NAME=REFERENCE
    #[arg(long = "document", value_name = "NAME=REFERENCE", help = "Attach a supporting document (repeatable)")]
    pub documents: Vec<String>,
    /// Structured request data as a JSON document
    #[arg(long, value_name = "JSON", help = "Structured form data as JSON")]
    pub data: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a certification request
    Create {
        #[arg(long = "as", value_name = "ACTOR", help = "Requesting enterprise")]
        actor: String,
        #[arg(long, default_value = "enterprise", help = "Role of the acting user")]
        role: Role,
        #[arg(long, help = "Treatment type: collection, transport, storage, sorting, dismantling, recycling, refurbishment, disposal")]
        treatment: TreatmentType,
        #[command(flatten)]
        payload: PayloadArgs,
        /// Keep the request as a draft instead of submitting it
        #[arg(long, help = "Create as draft; submit later with 'submit'")]
        draft: bool,
    },
    /// Submit a draft request for review
    Submit {
        id: RequestId,
        #[arg(long = "as", value_name = "ACTOR", help = "Requesting enterprise")]
        actor: String,
    },
    /// Take a submitted request for review
    Assign {
        id: RequestId,
        #[arg(long = "as", value_name = "ACTOR", help = "Reviewing employee")]
        actor: String,
        #[arg(long, default_value = "employee", help = "Role of the acting user")]
        role: Role,
    },
    /// Record one checklist step of a review
    Record {
        id: RequestId,
        #[arg(long, help = "Step index (1-4) or name")]
        step: ValidationStep,
        #[arg(long, help = "Law id, required for legal_compliance")]
        law: Option<String>,
        #[arg(long, help = "true/false, or approve/reject for the decision step")]
        value: String,
    },
    /// Approve a reviewed request and issue its certificate
    Approve {
        id: RequestId,
        #[arg(long, help = "Comments stored with the decision")]
        comments: Option<String>,
    },
    /// Reject a request under review
    Reject {
        id: RequestId,
        #[arg(long, help = "Reason sent to the enterprise")]
        reason: String,
    },
    /// Resubmit a rejected request with corrected contents
    Resubmit {
        id: RequestId,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Cancel an open request
    Cancel {
        id: RequestId,
        #[arg(long = "as", value_name = "ACTOR", help = "Requesting enterprise")]
        actor: String,
    },
    /// Record that the certification fee was paid
    Pay { id: RequestId },
    /// Show a request
    Status { id: RequestId },
    /// List requests
    List {
        #[arg(long, help = "Only requests in this status")]
        status: Option<RequestStatus>,
    },
    /// Show the review checklist and gate state of a request
    Checklist { id: RequestId },
    /// Show the transition history of a request
    History { id: RequestId },
    /// Show the laws that apply to a treatment type
    Laws { treatment: TreatmentType },
    /// Evaluate the validation gate of a saved review file
    Gate {
        #[arg(help = "Review record JSON file")]
        file: PathBuf,
    },
    /// Print the request lifecycle table
    Transitions,
}
