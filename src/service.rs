//! Spent address operations exposed to the node runtime
//!
//! [`SpentAddressService`] binds a registry handle to the configured file
//! locations and offers the export, verify and merge entry points that the
//! HTTP API and the command line tools call.

use crate::config::Config;
use crate::error::SpentError;
use crate::export::{self, ExportSummary};
use crate::merge::{self, MergeOptions, MergeReport};
use crate::registry::SpentAddressRegistry;
use crate::verify::{self, Verification};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct SpentAddressService {
    registry: Arc<dyn SpentAddressRegistry>,
    spent_file: PathBuf,
    merge_options: MergeOptions,
}

impl SpentAddressService {
    pub fn new(registry: Arc<dyn SpentAddressRegistry>, spent_file: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            spent_file: spent_file.into(),
            merge_options: MergeOptions::default(),
        }
    }

    pub fn from_config(registry: Arc<dyn SpentAddressRegistry>, config: &Config) -> Self {
        Self {
            registry,
            spent_file: config.spent_file(),
            merge_options: MergeOptions {
                strict_count: config.merge.strict_count,
            },
        }
    }

    pub fn with_merge_options(mut self, options: MergeOptions) -> Self {
        self.merge_options = options;
        self
    }

    pub fn registry(&self) -> &Arc<dyn SpentAddressRegistry> {
        &self.registry
    }

    pub fn spent_file(&self) -> &Path {
        &self.spent_file
    }

    /// Export the registry to the configured spent address file
    pub fn export_spent_addresses(&self) -> Result<ExportSummary, SpentError> {
        self.export_to(&self.spent_file)
    }

    pub fn export_to(&self, destination: &Path) -> Result<ExportSummary, SpentError> {
        export::export_spent_addresses(self.registry.as_ref(), destination)
    }

    /// Merge the given files, or the configured spent address file when none
    /// are given
    pub fn merge_spent_addresses(&self, files: Option<Vec<String>>) -> MergeReport {
        let paths: Vec<PathBuf> = files
            .unwrap_or_default()
            .into_iter()
            .map(PathBuf::from)
            .collect();
        merge::merge_spent_addresses(
            self.registry.as_ref(),
            &paths,
            &self.spent_file,
            &self.merge_options,
        )
    }

    /// Verify a file, defaulting to the configured spent address file
    pub fn verify_spent_addresses(&self, file: Option<&Path>) -> Result<Verification, SpentError> {
        verify::verify_file(file.unwrap_or(&self.spent_file))
    }

    pub fn address_count(&self) -> Result<usize, SpentError> {
        self.registry.len()
    }
}
