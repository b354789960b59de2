//! Named catalogue sources.
//!
//! A source spec reads `<source>,<options>`; the registry maps the source
//! name to a loader that receives the options string verbatim.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use corejet_error::{CoreJetError, Result};
use corejet_model::Catalogue;
use tracing::{debug, info};

/// Loads a catalogue from an options string.
pub type SourceLoader = fn(&str) -> Result<Catalogue>;

/// Name of the built-in file source.
pub const FILE_SOURCE: &str = "file";

/// A parsed `<source>,<options>` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub options: String,
}

impl SourceSpec {
    /// Split on the first comma. Without a comma the trimmed input is the
    /// source name and the options are empty.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(',') {
            Some((name, options)) => Self {
                name: name.trim().to_owned(),
                options: options.to_owned(),
            },
            None => Self {
                name: raw.trim().to_owned(),
                options: String::new(),
            },
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.name, self.options)
    }
}

/// Reads a CoreJet XML document from the path given as options.
pub fn file_source(options: &str) -> Result<Catalogue> {
    let path = Path::new(options.trim());
    debug!(path = %path.display(), "loading catalogue file");
    Catalogue::read_from_path(path)
}

pub struct SourceRegistry {
    loaders: BTreeMap<String, SourceLoader>,
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.names())
            .finish()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            loaders: BTreeMap::new(),
        }
    }

    /// Registry with the built-in `file` source.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FILE_SOURCE, file_source);
        registry
    }

    /// Register `loader` under `name`, replacing any previous loader.
    pub fn register(&mut self, name: impl Into<String>, loader: SourceLoader) {
        self.loaders.insert(name.into(), loader);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.loaders.contains_key(name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.loaders.keys().map(String::as_str).collect()
    }

    /// Fails fast with `UnknownSource` before any loading happens.
    pub fn loader(&self, name: &str) -> Result<SourceLoader> {
        self.loaders
            .get(name)
            .copied()
            .ok_or_else(|| CoreJetError::UnknownSource {
                name: name.to_owned(),
            })
    }

    pub fn load(&self, spec: &SourceSpec) -> Result<Catalogue> {
        let loader = self.loader(&spec.name)?;
        let catalogue = loader(&spec.options)?;
        info!(
            source = %spec.name,
            epics = catalogue.epics.len(),
            scenarios = catalogue.scenario_count(),
            "catalogue loaded"
        );
        Ok(catalogue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn empty_source(_options: &str) -> Result<Catalogue> {
        Ok(Catalogue::new())
    }

    #[test]
    fn test_spec_splits_on_first_comma_only() {
        let spec = SourceSpec::parse("file,reqs/a,b.xml");
        assert_eq!(spec.name, "file");
        assert_eq!(spec.options, "reqs/a,b.xml");
    }

    #[test]
    fn test_spec_without_comma_is_trimmed_name() {
        let spec = SourceSpec::parse("  jira \n");
        assert_eq!(spec.name, "jira");
        assert_eq!(spec.options, "");
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let registry = SourceRegistry::with_defaults();
        let err = registry
            .load(&SourceSpec::parse("jira,PROJ"))
            .expect_err("unknown source");
        assert!(matches!(err, CoreJetError::UnknownSource { ref name } if name == "jira"));
        assert!(err.is_fatal_configuration());
    }

    #[test]
    fn test_registered_source_is_used() {
        let mut registry = SourceRegistry::with_defaults();
        registry.register("empty", empty_source);
        assert_eq!(registry.names(), vec!["empty", "file"]);
        let catalogue = registry.load(&SourceSpec::parse("empty")).expect("load");
        assert_eq!(catalogue.scenario_count(), 0);
    }

    #[test]
    fn test_file_source_reads_catalogue() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reqs.xml");
        fs::write(
            &path,
            r#"<requirementscatalogue project="Shop">
  <epic id="E1" title="Buying">
    <story id="S1" title="Checkout">
      <scenario name="Pay"><given>a basket</given></scenario>
    </story>
  </epic>
</requirementscatalogue>"#,
        )
        .expect("write catalogue");
        let spec = SourceSpec::parse(&format!("file,{}", path.display()));
        let catalogue = SourceRegistry::with_defaults().load(&spec).expect("load");
        assert_eq!(catalogue.project.as_deref(), Some("Shop"));
        assert_eq!(catalogue.scenario_count(), 1);
    }
}
