//! In-memory runtime for tests.
//!
//! `TestRuntime` serves a map of virtual files and implements both
//! [`Resolver`] and [`Transformer`]. The "transform" is deliberately tiny:
//!
//! - `require('x')` becomes `require(_dependencyMap[N])` and records a
//!   dependency on `x`;
//! - `import('x')` records a lazy dependency;
//! - the body is wrapped in `__d(function (...) { ... });`;
//! - files starting with `// @script` are returned verbatim as scripts.
//!
//! Every transform call is logged, and individual paths can be made to fail or
//! every call delayed, which is what the delta calculator tests rely on.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use path_clean::PathClean;
use regex::{Captures, Regex};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Resolver, TransformOptions, Transformer};
use crate::{Dependency, GraphError, ModuleType, Result, TransformOutput};

static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(require|import)\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid require pattern")
});

/// Name of the dependency-map parameter in generated wrappers.
pub const DEPENDENCY_MAP: &str = "_dependencyMap";

/// Virtual-file runtime with call instrumentation.
#[derive(Debug, Default)]
pub struct TestRuntime {
    files: RwLock<FxHashMap<PathBuf, String>>,
    failing: RwLock<FxHashSet<PathBuf>>,
    transformed: Mutex<Vec<PathBuf>>,
    delay: RwLock<Option<Duration>>,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`TestRuntime::write`].
    pub fn with_file(self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.write(path, source);
        self
    }

    pub fn write(&self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.files.write().insert(path.into(), source.into());
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files.write().remove(path.as_ref());
    }

    /// Make every subsequent transform of `path` fail.
    pub fn fail_transform(&self, path: impl Into<PathBuf>) {
        self.failing.write().insert(path.into());
    }

    pub fn clear_failures(&self) {
        self.failing.write().clear();
    }

    /// Sleep for `delay` inside every transform call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write() = Some(delay);
    }

    /// Paths transformed so far, in call order.
    pub fn transformed(&self) -> Vec<PathBuf> {
        self.transformed.lock().clone()
    }

    pub fn transform_count(&self) -> usize {
        self.transformed.lock().len()
    }

    pub fn clear_log(&self) {
        self.transformed.lock().clear();
    }
}

impl Resolver for TestRuntime {
    fn resolve(&self, specifier: &str, from: &Path) -> Result<PathBuf> {
        let base = if specifier.starts_with('/') {
            PathBuf::from(specifier)
        } else {
            from.parent()
                .unwrap_or_else(|| Path::new("/"))
                .join(specifier)
                .clean()
        };

        let files = self.files.read();
        if files.contains_key(&base) {
            return Ok(base);
        }

        let with_extension = base.with_extension("js");
        if base.extension().is_none() && files.contains_key(&with_extension) {
            return Ok(with_extension);
        }

        Err(GraphError::resolution(
            specifier,
            from,
            "module does not exist",
        ))
    }
}

#[async_trait]
impl Transformer for TestRuntime {
    async fn transform(&self, path: &Path, _options: &TransformOptions) -> Result<TransformOutput> {
        self.transformed.lock().push(path.to_path_buf());

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().contains(path) {
            return Err(GraphError::transform(path, "injected failure"));
        }

        let source = self
            .files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| GraphError::transform(path, "file does not exist"))?;

        if source.starts_with("// @script") {
            return Ok(TransformOutput::new(source).with_module_type(ModuleType::Script));
        }

        let mut dependencies = Vec::new();
        let body = REQUIRE.replace_all(&source, |caps: &Captures<'_>| {
            let index = dependencies.len();
            if &caps[1] == "import" {
                dependencies.push(Dependency::lazy(&caps[2]));
            } else {
                dependencies.push(Dependency::new(&caps[2]));
            }
            format!("{}({DEPENDENCY_MAP}[{index}])", &caps[1])
        });

        let code = format!(
            "__d(function (global, require, module, exports, {DEPENDENCY_MAP}) {{\n{body}\n}});"
        );

        Ok(TransformOutput::new(code).with_dependencies(dependencies))
    }
}
