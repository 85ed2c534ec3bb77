//! Host-provided helpers.
//!
//! A helper is reached like any other presenter method: the path in
//! `{{date published_at format="short"}}` resolves `date` on the current
//! context, and the returned [`Value::Helper`] is invoked with the evaluated
//! arguments.
//!
//! Helpers declare named parameters. Only two names are accepted, both
//! required: `context` receives the first positional argument and `options`
//! receives the named arguments. Any other declaration makes the call fail
//! with `invalid_helper_signature` before the helper runs.

use std::fmt;
use std::panic::Location;

use indexmap::IndexMap;

use curlybars_ast::{Position, Program};

use crate::error::RenderError;
use crate::rendering_support::RenderingSupport;
use crate::safe_string::SafeString;
use crate::value::Value;

/// Named arguments, in the order they first appear in the template.
pub type Options = IndexMap<String, Value>;

/// Parameter names a helper may declare.
pub const ALLOWED_PARAMETERS: [&str; 2] = ["context", "options"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    required: bool,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn is_allowed(&self) -> bool {
        self.required && ALLOWED_PARAMETERS.contains(&self.name.as_str())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required {
            write!(f, "{}:", self.name)
        } else {
            write!(f, "{}: (optional)", self.name)
        }
    }
}

pub trait Helper {
    /// Declared named parameters.
    fn parameters(&self) -> &[Parameter];

    /// Where the helper is defined, used in error messages.
    fn source_location(&self) -> String;

    fn call(&self, args: HelperArgs<'_>) -> Result<Value, RenderError>;
}

/// What a helper receives.
pub struct HelperArgs<'a> {
    /// Every positional argument, evaluated.
    pub arguments: Vec<Value>,
    /// First positional argument (or nil), if `context` is declared.
    pub context: Option<Value>,
    /// Named arguments, if `options` is declared.
    pub options: Option<Options>,
    /// Body of a block helper invocation.
    pub block: Option<Block<'a>>,
}

/// Body and inverse of a block helper invocation.
///
/// Either can be rendered any number of times, each against a presenter
/// that is pushed for the duration of that render.
pub struct Block<'a> {
    support: &'a mut RenderingSupport,
    body: &'a Program,
    else_body: &'a Program,
    name: &'a str,
    position: &'a Position,
}

impl<'a> Block<'a> {
    pub(crate) fn new(
        support: &'a mut RenderingSupport,
        body: &'a Program,
        else_body: &'a Program,
        name: &'a str,
        position: &'a Position,
    ) -> Self {
        Self {
            support,
            body,
            else_body,
            name,
            position,
        }
    }

    /// Render the block body against `context`.
    pub fn render(&mut self, context: Value) -> Result<SafeString, RenderError> {
        let body = self.body;
        self.render_program(body, context)
    }

    /// Render the `{{else}}` body against `context`.
    pub fn inverse(&mut self, context: Value) -> Result<SafeString, RenderError> {
        let else_body = self.else_body;
        self.render_program(else_body, context)
    }

    pub fn has_inverse(&self) -> bool {
        !self.else_body.is_empty()
    }

    fn render_program(
        &mut self,
        program: &Program,
        context: Value,
    ) -> Result<SafeString, RenderError> {
        let presenter = self
            .support
            .check_context_is_presenter(&context, self.name, self.position)?;
        self.support.with_context(presenter, |support| {
            crate::renderer::render_to_string(program, support)
        })
    }
}

/// A helper built from a closure.
pub struct FnHelper<F> {
    parameters: Vec<Parameter>,
    location: &'static Location<'static>,
    f: F,
}

/// Build a helper from a closure, recording the caller as its source location.
///
/// ```rust
/// use curlybars::{helper_fn, Parameter, Value};
///
/// let shout = helper_fn([Parameter::required("context")], |args| {
///     let text = args.context.unwrap_or_default().to_string();
///     Ok(Value::from(text.to_uppercase()))
/// });
/// # let _ = Value::helper(shout);
/// ```
#[track_caller]
pub fn helper_fn<P, F>(parameters: P, f: F) -> FnHelper<F>
where
    P: IntoIterator<Item = Parameter>,
    F: Fn(HelperArgs<'_>) -> Result<Value, RenderError>,
{
    FnHelper {
        parameters: parameters.into_iter().collect(),
        location: Location::caller(),
        f,
    }
}

impl<F> Helper for FnHelper<F>
where
    F: Fn(HelperArgs<'_>) -> Result<Value, RenderError>,
{
    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn source_location(&self) -> String {
        format!("{}:{}", self.location.file(), self.location.line())
    }

    fn call(&self, args: HelperArgs<'_>) -> Result<Value, RenderError> {
        (self.f)(args)
    }
}
