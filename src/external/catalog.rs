// Law and form catalogs: a TOML-backed static catalog and a TTL cache decorator

use async_trait::async_trait;
use moka::future::Cache;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::traits::{CollaboratorError, FormCatalog, LawCatalog};
use crate::request::TreatmentType;
use crate::validation::{DynamicForm, FormField, Law, LawId};

static LAW_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid law id pattern"));

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.toml");

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("law id {0:?} is not a valid identifier")]
    InvalidLawId(String),
    #[error("law {0} is declared more than once")]
    DuplicateLaw(LawId),
    #[error("law {0} has an empty title")]
    MissingTitle(LawId),
    #[error("law {0} does not apply to any treatment type")]
    NoTreatmentTypes(LawId),
    #[error("more than one form declared for treatment type {0}")]
    DuplicateForm(TreatmentType),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    laws: Vec<LawEntry>,
    #[serde(default)]
    forms: Vec<FormEntry>,
}

#[derive(Debug, Deserialize)]
struct LawEntry {
    id: String,
    #[serde(default)]
    reference: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_mandatory: bool,
    treatment_types: Vec<TreatmentType>,
}

#[derive(Debug, Deserialize)]
struct FormEntry {
    treatment_type: TreatmentType,
    #[serde(default)]
    fields: Vec<FormField>,
}

/// Catalog held entirely in memory, loaded from TOML
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    laws: BTreeMap<TreatmentType, Vec<Law>>,
    forms: BTreeMap<TreatmentType, DynamicForm>,
}

impl StaticCatalog {
    /// The catalog bundled with the crate
    pub fn builtin() -> Result<Self, CatalogLoadError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_toml_str(&content)?;
        info!(path = %path.display(), laws = catalog.law_count(), "Loaded law catalog");
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogLoadError> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut catalog = Self::default();
        let mut seen = HashSet::new();

        for entry in file.laws {
            if !LAW_ID_PATTERN.is_match(&entry.id) {
                return Err(CatalogLoadError::InvalidLawId(entry.id));
            }
            let id = LawId::new(entry.id);
            if !seen.insert(id.clone()) {
                return Err(CatalogLoadError::DuplicateLaw(id));
            }
            if entry.title.trim().is_empty() {
                return Err(CatalogLoadError::MissingTitle(id));
            }
            if entry.treatment_types.is_empty() {
                return Err(CatalogLoadError::NoTreatmentTypes(id));
            }
            let law = Law {
                id,
                is_mandatory: entry.is_mandatory,
                reference: entry.reference,
                title: entry.title,
                description: entry.description,
            };
            for treatment_type in entry.treatment_types {
                catalog
                    .laws
                    .entry(treatment_type)
                    .or_default()
                    .push(law.clone());
            }
        }

        for entry in file.forms {
            let form = DynamicForm {
                treatment_type: entry.treatment_type,
                fields: entry.fields,
            };
            if catalog.forms.insert(entry.treatment_type, form).is_some() {
                return Err(CatalogLoadError::DuplicateForm(entry.treatment_type));
            }
        }

        Ok(catalog)
    }

    pub fn with_laws(mut self, treatment_type: TreatmentType, laws: Vec<Law>) -> Self {
        self.laws.insert(treatment_type, laws);
        self
    }

    pub fn with_form(mut self, form: DynamicForm) -> Self {
        self.forms.insert(form.treatment_type, form);
        self
    }

    /// Number of distinct laws across all treatment types
    pub fn law_count(&self) -> usize {
        self.laws
            .values()
            .flatten()
            .map(|law| &law.id)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn laws(&self, treatment_type: TreatmentType) -> &[Law] {
        self.laws
            .get(&treatment_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn form(&self, treatment_type: TreatmentType) -> Option<&DynamicForm> {
        self.forms.get(&treatment_type)
    }
}

#[async_trait]
impl LawCatalog for StaticCatalog {
    async fn laws_for_treatment_type(
        &self,
        treatment_type: TreatmentType,
    ) -> Result<Vec<Law>, CollaboratorError> {
        self.laws
            .get(&treatment_type)
            .cloned()
            .ok_or(CollaboratorError::UnknownTreatmentType { treatment_type })
    }
}

#[async_trait]
impl FormCatalog for StaticCatalog {
    async fn form_for_treatment_type(
        &self,
        treatment_type: TreatmentType,
    ) -> Result<Option<DynamicForm>, CollaboratorError> {
        Ok(self.forms.get(&treatment_type).cloned())
    }
}

/// Caches law lists per treatment type in front of a slower catalog
pub struct CachedLawCatalog {
    inner: Arc<dyn LawCatalog>,
    cache: Cache<TreatmentType, Vec<Law>>,
}

impl CachedLawCatalog {
    pub fn new(inner: Arc<dyn LawCatalog>, ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl LawCatalog for CachedLawCatalog {
    async fn laws_for_treatment_type(
        &self,
        treatment_type: TreatmentType,
    ) -> Result<Vec<Law>, CollaboratorError> {
        if let Some(laws) = self.cache.get(&treatment_type).await {
            debug!(%treatment_type, "Law catalog cache hit");
            return Ok(laws);
        }
        let laws = self.inner.laws_for_treatment_type(treatment_type).await?;
        self.cache.insert(treatment_type, laws.clone()).await;
        Ok(laws)
    }
}
