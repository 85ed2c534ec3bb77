//! Partial lookup for `{{> name}}`.

use std::collections::HashMap;
use std::sync::Arc;

use curlybars_ast::CompileError;

use crate::{CompileOptions, Template};

/// Resolves partial names to compiled templates.
pub trait PartialResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<Template>>;
}

/// In-memory partial registry.
///
/// ```rust
/// use std::sync::Arc;
/// use curlybars::{PartialRegistry, Template};
///
/// let mut partials = PartialRegistry::new();
/// partials.register("byline", "by {{author}}").unwrap();
/// let template = Template::compile("{{> byline}}").unwrap().with_partials(Arc::new(partials));
/// # let _ = template;
/// ```
#[derive(Debug, Default)]
pub struct PartialRegistry {
    templates: HashMap<String, Arc<Template>>,
}

impl PartialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source` and register it under `name`. The partial's file
    /// name in diagnostics is `name`.
    pub fn register(&mut self, name: &str, source: &str) -> Result<(), CompileError> {
        let options = CompileOptions {
            file_name: name.to_string(),
        };
        let template = Template::compile_with(source, &options)?;
        self.insert(name, template);
        Ok(())
    }

    /// Register an already compiled template.
    pub fn insert(&mut self, name: &str, template: Template) {
        self.templates.insert(name.to_string(), Arc::new(template));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl PartialResolver for PartialRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.get(name).cloned()
    }
}
