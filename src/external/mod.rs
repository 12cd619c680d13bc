//! External collaborators consumed by the workflow
//!
//! The workflow never performs I/O itself. Law lookup, form lookup, certificate
//! issuance and rejection reports are reached through the traits in
//! [`traits`]; this module also ships in-process implementations used by the
//! CLI and the test suites.

pub mod catalog;
pub mod issuance;
pub mod traits;

pub use catalog::{CachedLawCatalog, CatalogLoadError, StaticCatalog};
pub use issuance::{Certificate, LocalCertificateIssuer, LocalRejectionReporter, RejectionReport};
pub use traits::{
    CertificateId, CertificateIssuer, CollaboratorError, FormCatalog, LawCatalog,
    RejectionReporter, ReportId,
};

#[cfg(any(test, feature = "testing"))]
pub use traits::{MockCertificateIssuer, MockFormCatalog, MockLawCatalog, MockRejectionReporter};
