//! Curlybars - Handlebars-style templates rendered against presenters
//!
//! Templates never touch application objects directly. Every value comes
//! from a [`Presenter`] whose [`PresenterType`] whitelists the methods a
//! template may call, and rendering fails closed on anything else.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use curlybars::{PresenterType, Record, Template};
//!
//! let user_type = PresenterType::builder("UserPresenter").allow("name").build().unwrap();
//! let user = Record::new(&user_type).with("name", "<Alice>");
//!
//! let template = Template::compile("Hello, {{name}}!").unwrap();
//! let output = template.render(Rc::new(user)).unwrap();
//! assert_eq!(output, "Hello, &lt;Alice&gt;!");
//! ```

pub mod error;
pub mod helper;
pub mod method_whitelist;
pub mod partials;
pub mod presenter;
pub mod renderer;
pub mod rendering_support;
pub mod safe_string;
pub mod value;

pub use curlybars_ast::{CompileErrorKind, Program, DEFAULT_FILE_NAME};
pub use error::{
    CompileError, CurlybarsError, DeclarationError, Position, RenderError, RenderErrorKind, Result,
};
pub use helper::{helper_fn, Block, FnHelper, Helper, HelperArgs, Options, Parameter};
pub use method_whitelist::{
    Dependency, DependencyTree, MethodType, PresenterType, PresenterTypeBuilder,
};
pub use partials::{PartialRegistry, PartialResolver};
pub use presenter::{BoundMethod, Presenter, Record};
pub use rendering_support::RenderingSupport;
pub use safe_string::{escape, SafeBuffer, SafeString};
pub use value::Value;

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Options for [`Template::compile_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name reported in every error position.
    pub file_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

/// A compiled template, ready to render any number of times.
#[derive(Clone)]
pub struct Template {
    program: Program,
    file_name: Arc<str>,
    partials: Option<Arc<dyn PartialResolver>>,
}

impl Template {
    /// Compile template source
    ///
    /// # Example
    ///
    /// ```rust
    /// let template = curlybars::Template::compile("{{#if ok}}yes{{/if}}").unwrap();
    /// assert_eq!(template.program().nodes().len(), 1);
    /// ```
    pub fn compile(source: &str) -> std::result::Result<Self, CompileError> {
        Self::compile_with(source, &CompileOptions::default())
    }

    pub fn compile_with(
        source: &str,
        options: &CompileOptions,
    ) -> std::result::Result<Self, CompileError> {
        let file_name: Arc<str> = Arc::from(options.file_name.as_str());
        let program = curlybars_ast::parse_file(source, Arc::clone(&file_name))?;
        tracing::debug!(file = %file_name, "compiled template");
        Ok(Self {
            program,
            file_name,
            partials: None,
        })
    }

    /// Resolve `{{> name}}` through `partials`.
    pub fn with_partials(mut self, partials: Arc<dyn PartialResolver>) -> Self {
        self.partials = Some(partials);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Render against `root`, which becomes the bottom of the context stack.
    pub fn render(&self, root: Rc<dyn Presenter>) -> std::result::Result<SafeString, RenderError> {
        tracing::debug!(
            file = %self.file_name,
            root = root.presenter_type().name(),
            "rendering template"
        );
        let mut hbs = RenderingSupport::new(root, Arc::clone(&self.file_name))
            .with_partials(self.partials.clone());
        let output = renderer::render_to_string(&self.program, &mut hbs);
        if let Err(err) = &output {
            tracing::debug!(kind = %err.kind, position = %err.position, "render failed");
        }
        output
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("file_name", &self.file_name)
            .field("program", &self.program)
            .field("partials", &self.partials.is_some())
            .finish()
    }
}

/// Compile template source
pub fn compile(source: &str) -> std::result::Result<Template, CompileError> {
    Template::compile(source)
}

/// Compile and render in one step
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use curlybars::{PresenterType, Record};
///
/// let post_type = PresenterType::builder("PostPresenter").allow("title").build().unwrap();
/// let post = Record::new(&post_type).with("title", "Hi");
///
/// let output = curlybars::render("<h1>{{title}}</h1>", Rc::new(post)).unwrap();
/// assert_eq!(output, "<h1>Hi</h1>");
/// ```
pub fn render(source: &str, root: Rc<dyn Presenter>) -> Result<SafeString> {
    let template = Template::compile(source)?;
    Ok(template.render(root)?)
}
