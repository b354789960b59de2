//! Suite / test / class identity for executed tests.
//!
//! Several test-authoring conventions reach the runner, and each names its
//! tests differently. [`IdentityResolver`] tries an ordered list of
//! [`IdentityStrategy`] implementations and takes the first answer. An
//! unrecognized handle is a fatal integration error, never a dropped case.
//!
//! Default order:
//! 1. [`LiterateFileStrategy`]: `doctest-<path parts>` suites,
//! 2. [`DottedNameStrategy`]: `module.Class` suites,
//! 3. [`RegionsStrategy`]: `manuel-<path parts>` suites,
//! 4. [`GenericIdStrategy`]: suite named after the runtime class.

use std::path::{MAIN_SEPARATOR, Path};

use corejet_error::{CoreJetError, Result};
use tracing::{error, trace};

use crate::handle::TestHandle;

/// Suite prefix for file-based literate tests.
pub const LITERATE_FILE_PREFIX: &str = "doctest-";
/// Suite prefix for region-based literate tests.
pub const REGIONS_PREFIX: &str = "manuel-";

/// Resolved naming of one executed test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseIdentity {
    pub suite: String,
    pub test_name: String,
    pub class_name: String,
}

impl CaseIdentity {
    pub fn new(
        suite: impl Into<String>,
        test_name: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            suite: suite.into(),
            test_name: test_name.into(),
            class_name: class_name.into(),
        }
    }
}

/// One test-authoring convention.
pub trait IdentityStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Classify `handle`, or `None` if it was not authored this way.
    ///
    /// `cwd` is the working-directory baseline captured at startup.
    fn classify(&self, handle: &dyn TestHandle, cwd: &Path) -> Option<CaseIdentity>;
}

/// Split a test document path into suite-qualifying parts.
///
/// Path segments are compared positionally with `cwd` until they diverge.
/// When one list runs out first, the last shared segment counts as the
/// divergence point, so a file under `cwd` keeps the final `cwd` directory as
/// its first package part. The directories from the divergence point on,
/// walking back from the file, form the package path; a segment containing
/// `.` (an egg or distribution directory) stops the walk. The file name is
/// always the last part. Single-segment paths yield only the file name.
#[must_use]
pub fn suite_name_parts(filename: &str, cwd: &Path) -> Vec<String> {
    let file_parts: Vec<&str> = filename.split(MAIN_SEPARATOR).collect();
    let cwd = cwd.to_string_lossy();
    let cwd_parts: Vec<&str> = cwd.split(MAIN_SEPARATOR).collect();

    let Some((file_name, directories)) = file_parts.split_last() else {
        return Vec::new();
    };

    let common = file_parts.len().min(cwd_parts.len());
    let divergence = (0..common)
        .find(|&index| file_parts[index] != cwd_parts[index])
        .unwrap_or(common.saturating_sub(1));

    let mut parts: Vec<String> = if divergence < directories.len() {
        let mut package: Vec<String> = directories[divergence..]
            .iter()
            .rev()
            .take_while(|part| !part.contains('.'))
            .map(|part| (*part).to_owned())
            .collect();
        package.reverse();
        package
    } else {
        Vec::new()
    };
    parts.push((*file_name).to_owned());
    parts
}

fn literate_identity(prefix: &str, parts: &[String], test_name: String) -> CaseIdentity {
    let class_name = parts[..parts.len().saturating_sub(1)].join(".");
    CaseIdentity {
        suite: format!("{prefix}{}", parts.join("-")),
        test_name,
        class_name,
    }
}

/// File-based literate documents (`doctest-` suites).
#[derive(Debug, Default, Clone, Copy)]
pub struct LiterateFileStrategy;

impl IdentityStrategy for LiterateFileStrategy {
    fn name(&self) -> &'static str {
        "literate_file"
    }

    fn classify(&self, handle: &dyn TestHandle, cwd: &Path) -> Option<CaseIdentity> {
        let source = handle.doc_file()?;
        let parts = suite_name_parts(source.path, cwd);
        Some(literate_identity(
            LITERATE_FILE_PREFIX,
            &parts,
            source.name.to_owned(),
        ))
    }
}

/// Fully dotted identifiers: suite and class are everything but the last
/// segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct DottedNameStrategy;

impl IdentityStrategy for DottedNameStrategy {
    fn name(&self) -> &'static str {
        "dotted_name"
    }

    fn classify(&self, handle: &dyn TestHandle, _cwd: &Path) -> Option<CaseIdentity> {
        let (qualifier, test_name) = handle.dotted_name()?.rsplit_once('.')?;
        if qualifier.is_empty() || test_name.is_empty() {
            return None;
        }
        Some(CaseIdentity::new(qualifier, test_name, qualifier))
    }
}

/// Region-based literate documents (`manuel-` suites). The test name is the
/// document's file name.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionsStrategy;

impl IdentityStrategy for RegionsStrategy {
    fn name(&self) -> &'static str {
        "regions"
    }

    fn classify(&self, handle: &dyn TestHandle, cwd: &Path) -> Option<CaseIdentity> {
        let location = handle.regions_location()?;
        let parts = suite_name_parts(location, cwd);
        let test_name = parts.last()?.clone();
        Some(literate_identity(REGIONS_PREFIX, &parts, test_name))
    }
}

/// Any handle with an identifier and a class name.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericIdStrategy;

impl IdentityStrategy for GenericIdStrategy {
    fn name(&self) -> &'static str {
        "generic_id"
    }

    fn classify(&self, handle: &dyn TestHandle, _cwd: &Path) -> Option<CaseIdentity> {
        let test_id = handle.test_id()?;
        let class_name = handle.class_name()?;
        // Drop the class prefix and the one separator after it.
        let test_name = match test_id.strip_prefix(class_name.as_str()) {
            Some(rest) => {
                let mut chars = rest.chars();
                chars.next();
                chars.as_str().to_owned()
            }
            None => test_id.clone(),
        };
        let test_name = if test_name.is_empty() {
            test_id
        } else {
            test_name
        };
        Some(CaseIdentity::new(class_name.clone(), test_name, class_name))
    }
}

/// Ordered, extensible list of identity strategies.
pub struct IdentityResolver {
    strategies: Vec<Box<dyn IdentityStrategy>>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl IdentityResolver {
    /// Resolver with no strategies; every handle is unrecognized.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// The four built-in conventions in priority order.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut resolver = Self::empty();
        resolver.register(Box::new(LiterateFileStrategy));
        resolver.register(Box::new(DottedNameStrategy));
        resolver.register(Box::new(RegionsStrategy));
        resolver.register(Box::new(GenericIdStrategy));
        resolver
    }

    /// Append a strategy; it is tried after every existing one.
    pub fn register(&mut self, strategy: Box<dyn IdentityStrategy>) {
        self.strategies.push(strategy);
    }

    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    pub fn resolve(&self, handle: &dyn TestHandle, cwd: &Path) -> Result<CaseIdentity> {
        for strategy in &self.strategies {
            if let Some(identity) = strategy.classify(handle, cwd) {
                if identity.suite.is_empty() && identity.test_name.is_empty() {
                    continue;
                }
                trace!(
                    strategy = strategy.name(),
                    suite = %identity.suite,
                    test = %identity.test_name,
                    "test identity resolved"
                );
                return Ok(identity);
            }
        }

        let handle = format!("{handle:?}");
        error!(handle = %handle, "no identity strategy recognized test handle");
        Err(CoreJetError::UnknownTestType { handle })
    }
}
