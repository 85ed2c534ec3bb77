//! Presenters: the only objects a template can see.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::method_whitelist::PresenterType;
use crate::value::Value;

/// An object exposed to templates through a whitelist.
///
/// Templates only reach methods that are both allowed by
/// [`presenter_type`](Presenter::presenter_type) and answered by
/// [`responds_to`](Presenter::responds_to). Methods take no arguments and
/// must not have side effects.
pub trait Presenter {
    fn presenter_type(&self) -> &PresenterType;

    fn allows_method(&self, method: &str) -> bool {
        self.presenter_type().allows_method(method)
    }

    fn responds_to(&self, method: &str) -> bool;

    /// Invoke `method`. Only called after both checks above passed.
    fn call(&self, method: &str) -> Value;
}

/// A resolved path: the presenter that owns the final method, plus its name.
///
/// The method is not invoked until [`call`](BoundMethod::call).
#[derive(Clone)]
pub struct BoundMethod {
    receiver: Rc<dyn Presenter>,
    method: String,
}

impl BoundMethod {
    pub(crate) fn new(receiver: Rc<dyn Presenter>, method: impl Into<String>) -> Self {
        Self {
            receiver,
            method: method.into(),
        }
    }

    pub fn receiver(&self) -> &Rc<dyn Presenter> {
        &self.receiver
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn call(&self) -> Value {
        self.receiver.call(&self.method)
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BoundMethod({}#{})",
            self.receiver.presenter_type().name(),
            self.method
        )
    }
}

enum Accessor {
    Stored(Value),
    Computed(Box<dyn Fn() -> Value>),
}

/// A presenter backed by a table of values and closures.
///
/// Useful for hosts that build view data at runtime and for tests. A
/// `Record` may answer methods its type does not allow; those stay
/// unreachable from templates.
///
/// ```rust
/// use curlybars::{PresenterType, Presenter, Record, Value};
///
/// let user_type = PresenterType::builder("UserPresenter").allow("name").build().unwrap();
/// let user = Record::new(&user_type).with("name", "Libo");
///
/// assert!(user.responds_to("name"));
/// assert_eq!(user.call("name"), Value::from("Libo"));
/// ```
pub struct Record {
    presenter_type: Arc<PresenterType>,
    methods: IndexMap<String, Accessor>,
}

impl Record {
    pub fn new(presenter_type: &Arc<PresenterType>) -> Self {
        Self {
            presenter_type: Arc::clone(presenter_type),
            methods: IndexMap::new(),
        }
    }

    pub fn with(mut self, method: impl Into<String>, value: impl Into<Value>) -> Self {
        self.methods
            .insert(method.into(), Accessor::Stored(value.into()));
        self
    }

    /// Answer `method` by calling `f` each time it is invoked.
    pub fn with_method<F>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        self.methods
            .insert(method.into(), Accessor::Computed(Box::new(f)));
        self
    }

    pub fn into_value(self) -> Value {
        Value::presenter(self)
    }
}

impl Presenter for Record {
    fn presenter_type(&self) -> &PresenterType {
        &self.presenter_type
    }

    fn responds_to(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn call(&self, method: &str) -> Value {
        match self.methods.get(method) {
            Some(Accessor::Stored(value)) => value.clone(),
            Some(Accessor::Computed(f)) => f(),
            None => Value::Nil,
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("presenter_type", &self.presenter_type.name())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
