//! Runtime services shared by every node during a render.
//!
//! Holds the context stack (innermost presenter last) and implements path
//! resolution, the presenter checks and the helper calling convention.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use curlybars_ast::{Expression, Position};

use crate::error::{RenderError, RenderErrorKind};
use crate::helper::{Block, Helper, HelperArgs, Options, Parameter};
use crate::partials::PartialResolver;
use crate::presenter::{BoundMethod, Presenter};
use crate::value::Value;
use crate::Template;

type RenderResult<T> = std::result::Result<T, RenderError>;

pub struct RenderingSupport {
    root: Rc<dyn Presenter>,
    contexts: Vec<Rc<dyn Presenter>>,
    file_name: Arc<str>,
    partials: Option<Arc<dyn PartialResolver>>,
    partial_stack: Vec<String>,
}

impl RenderingSupport {
    pub fn new(root: Rc<dyn Presenter>, file_name: impl Into<Arc<str>>) -> Self {
        Self {
            root,
            contexts: Vec::new(),
            file_name: file_name.into(),
            partials: None,
            partial_stack: Vec::new(),
        }
    }

    pub(crate) fn with_partials(mut self, partials: Option<Arc<dyn PartialResolver>>) -> Self {
        self.partials = partials;
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Number of presenters on the context stack, the root included.
    pub fn depth(&self) -> usize {
        self.contexts.len() + 1
    }

    pub fn current_context(&self) -> &Rc<dyn Presenter> {
        self.contexts.last().unwrap_or(&self.root)
    }

    pub fn position(&self, line: usize, column: usize) -> Position {
        Position::new(Arc::clone(&self.file_name), line, column)
    }

    /// Run `f` with `context` pushed. The push is undone when `f` returns,
    /// whether it succeeded or not.
    pub fn with_context<T>(
        &mut self,
        context: Rc<dyn Presenter>,
        f: impl FnOnce(&mut Self) -> RenderResult<T>,
    ) -> RenderResult<T> {
        self.contexts.push(context);
        tracing::trace!(depth = self.depth(), "pushed context");
        let scope = ContextScope { support: self };
        f(&mut *scope.support)
    }

    /// Resolve a dotted path against the current context.
    ///
    /// Every hop is checked before it is taken: the receiver must be a
    /// presenter, must allow the method, and must respond to it.
    /// Intermediate methods are called to reach the next receiver; the
    /// final one is returned unevaluated.
    pub fn resolve_path(&self, path: &str, position: &Position) -> RenderResult<BoundMethod> {
        let (chain, method) = match path.rsplit_once('.') {
            Some((chain, method)) => (Some(chain), method),
            None => (None, path),
        };

        let mut current = Value::Presenter(Rc::clone(self.current_context()));
        for segment in chain.into_iter().flat_map(|c| c.split('.')) {
            let receiver = self.check_traversable(&current, segment, position)?;
            current = receiver.call(segment);
        }

        let receiver = self.check_traversable(&current, method, position)?;
        Ok(BoundMethod::new(receiver, method))
    }

    pub fn evaluate(&self, expression: &Expression) -> RenderResult<Value> {
        match expression {
            Expression::Path(path) => Ok(self.resolve_path(&path.path, &path.position)?.call()),
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Integer(n) => Ok(Value::Integer(*n)),
            Expression::Boolean(b) => Ok(Value::Bool(*b)),
        }
    }

    pub fn truthiness(value: &Value) -> bool {
        value.is_truthy()
    }

    pub fn check_context_is_presenter(
        &self,
        value: &Value,
        path: &str,
        position: &Position,
    ) -> RenderResult<Rc<dyn Presenter>> {
        value.as_presenter().cloned().ok_or_else(|| {
            RenderError::new(
                RenderErrorKind::ContextIsNotAPresenter,
                format!("`{path}` is not a context type object"),
                position.clone(),
            )
        })
    }

    pub fn check_collection_is_presenters(
        &self,
        value: &Value,
        path: &str,
        position: &Position,
    ) -> RenderResult<Vec<Rc<dyn Presenter>>> {
        value
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_presenter().cloned())
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| {
                RenderError::new(
                    RenderErrorKind::ContextIsNotAnArrayOfPresenters,
                    format!("`{path}` is not an array of presenters"),
                    position.clone(),
                )
            })
    }

    /// Resolve the helper named by `path`.
    pub fn resolve_helper(&self, path: &str, position: &Position) -> RenderResult<Rc<dyn Helper>> {
        match self.resolve_path(path, position)?.call() {
            Value::Helper(helper) => Ok(helper),
            other => Err(RenderError::new(
                RenderErrorKind::InvalidHelperSignature,
                format!("`{path}` is not a helper, got {}", other.type_name()),
                position.clone(),
            )),
        }
    }

    /// Call `helper` following the argument protocol.
    ///
    /// The signature is checked first; a helper with an unsupported
    /// parameter is never invoked.
    pub fn invoke_helper(
        helper: &dyn Helper,
        name: &str,
        position: &Position,
        arguments: Vec<Value>,
        options: Options,
        block: Option<Block<'_>>,
    ) -> RenderResult<Value> {
        let unexpected: Vec<&Parameter> = helper
            .parameters()
            .iter()
            .filter(|p| !p.is_allowed())
            .collect();
        if !unexpected.is_empty() {
            let listed = unexpected
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(RenderError::new(
                RenderErrorKind::InvalidHelperSignature,
                format!(
                    "{} - `{name}` bad signature for helper `{name}`: unexpected {listed} - \
                     possible named parameters are `context:` and `options:`",
                    helper.source_location()
                ),
                position.clone(),
            ));
        }

        let declares = |name: &str| helper.parameters().iter().any(|p| p.name() == name);
        let context = declares("context").then(|| arguments.first().cloned().unwrap_or_default());
        let options = declares("options").then_some(options);

        tracing::trace!(helper = name, arguments = arguments.len(), "invoking helper");
        helper.call(HelperArgs {
            arguments,
            context,
            options,
            block,
        })
    }

    /// Enter a partial, returning its template. Pair with [`leave_partial`](Self::leave_partial).
    pub(crate) fn enter_partial(
        &mut self,
        name: &str,
        position: &Position,
    ) -> RenderResult<Arc<Template>> {
        let template = self
            .partials
            .as_ref()
            .and_then(|partials| partials.resolve(name))
            .ok_or_else(|| {
                RenderError::new(
                    RenderErrorKind::PartialNotFound,
                    format!("partial `{name}` could not be found"),
                    position.clone(),
                )
            })?;

        if self.partial_stack.iter().any(|entered| entered == name) {
            let chain = self.partial_stack.join(" > ");
            return Err(RenderError::new(
                RenderErrorKind::CircularPartial,
                format!("partial `{name}` includes itself ({chain} > {name})"),
                position.clone(),
            ));
        }

        self.partial_stack.push(name.to_string());
        Ok(template)
    }

    pub(crate) fn leave_partial(&mut self) {
        self.partial_stack.pop();
    }

    fn check_traversable(
        &self,
        value: &Value,
        method: &str,
        position: &Position,
    ) -> RenderResult<Rc<dyn Presenter>> {
        let receiver = self.check_context_is_presenter(value, method, position)?;
        let type_name = receiver.presenter_type().name();

        if !receiver.allows_method(method) {
            return Err(RenderError::new(
                RenderErrorKind::PathNotAllowed,
                format!(
                    "`{method}` is not available. \
                     Add `allow(\"{method}\")` to {type_name} to allow this path"
                ),
                position.clone(),
            ));
        }
        if !receiver.responds_to(method) {
            return Err(RenderError::new(
                RenderErrorKind::PathNotAllowed,
                format!("`{method}` is not available in {type_name}"),
                position.clone(),
            ));
        }
        Ok(receiver)
    }
}

impl fmt::Debug for RenderingSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingSupport")
            .field("file_name", &self.file_name)
            .field("depth", &self.depth())
            .field("partial_stack", &self.partial_stack)
            .finish()
    }
}

/// Pops the context pushed by [`RenderingSupport::with_context`] on drop.
struct ContextScope<'s> {
    support: &'s mut RenderingSupport,
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.support.contexts.pop();
        tracing::trace!(depth = self.support.depth(), "popped context");
    }
}
