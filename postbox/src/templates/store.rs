use crate::error::TemplateError;
use async_trait::async_trait;
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Component, Path, PathBuf};

/// Read-only source of raw template documents, keyed by name.
///
/// Stores are consulted on every send; implementations should not cache
/// unless the backing medium is itself immutable.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn load(&self, name: &str) -> Result<String, TemplateError>;
}

#[async_trait]
impl<S: TemplateStore + ?Sized> TemplateStore for std::sync::Arc<S> {
    async fn load(&self, name: &str) -> Result<String, TemplateError> {
        (**self).load(name).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    templates: HashMap<String, String>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template<N, S>(mut self, name: N, source: S) -> Self
    where
        N: Into<String>,
        S: Into<String>,
    {
        self.insert(name, source);
        self
    }

    pub fn insert<N, S>(&mut self, name: N, source: S)
    where
        N: Into<String>,
        S: Into<String>,
    {
        self.templates.insert(name.into(), source.into());
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn load(&self, name: &str) -> Result<String, TemplateError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }
}

/// Loads `<root>/<name>` from disk on every call.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    root: PathBuf,
}

impl DirectoryTemplateStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        (contained && !name.is_empty()).then(|| self.root.join(relative))
    }
}

#[async_trait]
impl TemplateStore for DirectoryTemplateStore {
    async fn load(&self, name: &str) -> Result<String, TemplateError> {
        let Some(path) = self.resolve(name) else {
            tracing::warn!(template = name, "Rejected template name outside the store root");
            return Err(TemplateError::NotFound(name.to_string()));
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TemplateError::NotFound(name.to_string()))
            }
            Err(e) => Err(TemplateError::Store {
                template: name.to_string(),
                source: e,
            }),
        }
    }
}

/// Serves templates compiled into the binary with `rust_embed`.
///
/// ```ignore
/// #[derive(rust_embed::RustEmbed)]
/// #[folder = "templates/"]
/// struct Templates;
///
/// let store = EmbeddedTemplateStore::<Templates>::new();
/// ```
pub struct EmbeddedTemplateStore<E> {
    _assets: PhantomData<fn() -> E>,
}

impl<E: RustEmbed + 'static> EmbeddedTemplateStore<E> {
    pub fn new() -> Self {
        Self {
            _assets: PhantomData,
        }
    }

    /// Names of every bundled template.
    pub fn names() -> impl Iterator<Item = String> {
        E::iter().map(|name| name.into_owned())
    }
}

impl<E: RustEmbed + 'static> Default for EmbeddedTemplateStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: RustEmbed + 'static> TemplateStore for EmbeddedTemplateStore<E> {
    async fn load(&self, name: &str) -> Result<String, TemplateError> {
        let file = E::get(name).ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        String::from_utf8(file.data.into_owned()).map_err(|e| TemplateError::Store {
            template: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }
}
