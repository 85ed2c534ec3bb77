//! Per-type whitelists of methods that templates may call.
//!
//! A [`PresenterType`] is declared once through [`PresenterTypeBuilder`] and
//! then shared behind an [`Arc`]. Its allowed methods aggregate, in order:
//! the base type's methods, then each included capability's methods in
//! inclusion order, then its own declarations. A name keeps the position
//! and type of its first declaration.
//!
//! ```rust
//! use curlybars::PresenterType;
//!
//! let link = PresenterType::builder("LinkPresenter").allow("url").build().unwrap();
//! let post = PresenterType::builder("PostPresenter")
//!     .allow("title")
//!     .allow_collection("links", [&link])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(post.allowed_methods(), ["title", "links"]);
//! assert!(post.allows_path("title"));
//! assert!(!post.allows_path("links.url"));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::DeclarationError;

/// What a whitelisted method returns.
#[derive(Clone)]
pub enum MethodType {
    /// A scalar (or anything that is not traversed further).
    Leaf,
    /// A single presenter of the given type.
    Presenter(Arc<PresenterType>),
    /// An array of presenters of the given type.
    Collection(Arc<PresenterType>),
}

impl PartialEq for MethodType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MethodType::Leaf, MethodType::Leaf) => true,
            (MethodType::Presenter(a), MethodType::Presenter(b))
            | (MethodType::Collection(a), MethodType::Collection(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodType::Leaf => f.write_str("Leaf"),
            MethodType::Presenter(t) => write!(f, "Presenter({})", t.name),
            MethodType::Collection(t) => write!(f, "Collection([{}])", t.name),
        }
    }
}

/// A presenter type and its whitelist.
pub struct PresenterType {
    name: String,
    methods_schema: IndexMap<String, MethodType>,
    schema: IndexMap<String, MethodType>,
}

impl PresenterType {
    pub fn builder(name: impl Into<String>) -> PresenterTypeBuilder {
        PresenterTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every method name a template may call, inherited and included ones first.
    pub fn allowed_methods(&self) -> Vec<&str> {
        self.schema.keys().map(String::as_str).collect()
    }

    pub fn allows_method(&self, method: &str) -> bool {
        self.schema.contains_key(method)
    }

    /// Type of an allowed method, including inherited and included ones.
    pub fn method_type(&self, method: &str) -> Option<&MethodType> {
        self.schema.get(method)
    }

    /// Declarations made on this type alone.
    pub fn methods_schema(&self) -> &IndexMap<String, MethodType> {
        &self.methods_schema
    }

    /// The whitelist expanded recursively through nested presenter types.
    pub fn dependency_tree(&self) -> DependencyTree {
        let entries = self
            .schema
            .iter()
            .map(|(name, method_type)| {
                let dependency = match method_type {
                    MethodType::Leaf => Dependency::Leaf,
                    MethodType::Presenter(t) => Dependency::Presenter(t.dependency_tree()),
                    MethodType::Collection(t) => Dependency::Collection(t.dependency_tree()),
                };
                (name.clone(), dependency)
            })
            .collect();
        DependencyTree(entries)
    }

    /// Whether a dotted path can be resolved from this type.
    ///
    /// Only single presenters are traversed; collections are reached through
    /// `each` and cannot appear in the middle of a path.
    pub fn allows_path(&self, path: &str) -> bool {
        let Some((chain, method)) = path.rsplit_once('.') else {
            return self.allows_method(path);
        };

        let mut current = self;
        for segment in chain.split('.') {
            match current.method_type(segment) {
                Some(MethodType::Presenter(next)) => current = next,
                _ => return false,
            }
        }
        current.allows_method(method)
    }
}

impl fmt::Debug for PresenterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterType")
            .field("name", &self.name)
            .field("allowed_methods", &self.allowed_methods())
            .finish()
    }
}

/// Declares a [`PresenterType`].
pub struct PresenterTypeBuilder {
    name: String,
    base: Option<Arc<PresenterType>>,
    includes: Vec<Arc<PresenterType>>,
    declared: IndexMap<String, MethodType>,
    error: Option<DeclarationError>,
}

impl PresenterTypeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            includes: Vec::new(),
            declared: IndexMap::new(),
            error: None,
        }
    }

    /// Inherit every method allowed on `base`.
    pub fn extends(mut self, base: &Arc<PresenterType>) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    /// Mix in the methods of a capability type.
    pub fn include(mut self, capability: &Arc<PresenterType>) -> Self {
        self.includes.push(Arc::clone(capability));
        self
    }

    pub fn allow(self, method: impl Into<String>) -> Self {
        self.declare(method.into(), MethodType::Leaf)
    }

    pub fn allow_methods<I, S>(self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        methods
            .into_iter()
            .fold(self, |builder, method| builder.allow(method))
    }

    pub fn allow_presenter(self, method: impl Into<String>, type_: &Arc<PresenterType>) -> Self {
        self.declare(method.into(), MethodType::Presenter(Arc::clone(type_)))
    }

    /// Declare a method returning an array of presenters. Exactly one
    /// element type must be given, otherwise [`build`](Self::build) fails.
    pub fn allow_collection<'a, I>(self, method: impl Into<String>, element_types: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<PresenterType>>,
    {
        let method = method.into();
        let mut distinct: Vec<&Arc<PresenterType>> = Vec::new();
        for t in element_types {
            if !distinct.iter().any(|seen| Arc::ptr_eq(seen, t)) {
                distinct.push(t);
            }
        }

        match distinct.as_slice() {
            [element] => {
                let element = Arc::clone(element);
                self.declare(method, MethodType::Collection(element))
            }
            _ => {
                let error = DeclarationError::InvalidCollection {
                    presenter: self.name.clone(),
                    method,
                    count: distinct.len(),
                };
                self.fail(error)
            }
        }
    }

    pub fn build(self) -> Result<Arc<PresenterType>, DeclarationError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut schema = IndexMap::new();
        let inherited = self.base.iter().chain(self.includes.iter());
        for source in inherited.map(|t| &t.schema).chain([&self.declared]) {
            for (method, method_type) in source {
                schema
                    .entry(method.clone())
                    .or_insert_with(|| method_type.clone());
            }
        }

        tracing::debug!(
            presenter = %self.name,
            allowed = schema.len(),
            "declared presenter type"
        );

        Ok(Arc::new(PresenterType {
            name: self.name,
            methods_schema: self.declared,
            schema,
        }))
    }

    fn declare(mut self, method: String, method_type: MethodType) -> Self {
        self.declared.entry(method).or_insert(method_type);
        self
    }

    fn fail(mut self, error: DeclarationError) -> Self {
        self.error.get_or_insert(error);
        self
    }
}

/// Recursive view of a whitelist.
///
/// Serializes to JSON as: leaf methods map to `null`, presenter methods to
/// their own tree, and collections to a one-element array holding the
/// element type's tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyTree(IndexMap<String, Dependency>);

#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    Leaf,
    Presenter(DependencyTree),
    Collection(DependencyTree),
}

impl DependencyTree {
    pub fn get(&self, method: &str) -> Option<&Dependency> {
        self.0.get(method)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dependency)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .0
            .iter()
            .map(|(method, dependency)| (method.clone(), dependency.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

impl Dependency {
    pub fn to_json(&self) -> JsonValue {
        match self {
            Dependency::Leaf => JsonValue::Null,
            Dependency::Presenter(tree) => tree.to_json(),
            Dependency::Collection(tree) => JsonValue::Array(vec![tree.to_json()]),
        }
    }
}

impl Serialize for DependencyTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (method, dependency) in &self.0 {
            map.serialize_entry(method, dependency)?;
        }
        map.end()
    }
}

impl Serialize for Dependency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Dependency::Leaf => serializer.serialize_none(),
            Dependency::Presenter(tree) => tree.serialize(serializer),
            Dependency::Collection(tree) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(tree)?;
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn link() -> Arc<PresenterType> {
        PresenterType::builder("LinkPresenter")
            .allow("url")
            .build()
            .unwrap()
    }

    #[test]
    fn aggregates_base_then_includes_then_own() {
        let base = PresenterType::builder("BasePresenter")
            .allow_methods(["cook", "link"])
            .build()
            .unwrap();
        let helpers = PresenterType::builder("FormHelpers")
            .allow("form")
            .build()
            .unwrap();
        let presenter = PresenterType::builder("WavePresenter")
            .extends(&base)
            .include(&helpers)
            .allow("wave")
            .build()
            .unwrap();

        assert_eq!(presenter.allowed_methods(), ["cook", "link", "form", "wave"]);
        assert_eq!(
            presenter.methods_schema().keys().collect::<Vec<_>>(),
            ["wave"]
        );
    }

    #[test]
    fn first_declaration_wins() {
        let link = link();
        let presenter = PresenterType::builder("PostPresenter")
            .allow("title")
            .allow_presenter("title", &link)
            .build()
            .unwrap();
        assert_eq!(presenter.method_type("title"), Some(&MethodType::Leaf));
    }

    #[test]
    fn inherited_method_keeps_base_position() {
        let base = PresenterType::builder("Base")
            .allow_methods(["a", "b"])
            .build()
            .unwrap();
        let child = PresenterType::builder("Child")
            .extends(&base)
            .allow_methods(["c", "a"])
            .build()
            .unwrap();
        assert_eq!(child.allowed_methods(), ["a", "b", "c"]);
    }

    #[test]
    fn collection_needs_exactly_one_element_type() {
        let link = link();
        let avatar = PresenterType::builder("AvatarPresenter")
            .allow("url")
            .build()
            .unwrap();

        let err = PresenterType::builder("PostPresenter")
            .allow_collection("links", [&link, &avatar])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::InvalidCollection {
                presenter: "PostPresenter".into(),
                method: "links".into(),
                count: 2,
            }
        );

        let err = PresenterType::builder("PostPresenter")
            .allow_collection("links", Vec::<&Arc<PresenterType>>::new())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::InvalidCollection { count: 0, .. }
        ));
    }

    #[test]
    fn repeated_element_type_counts_once() {
        let link = link();
        let presenter = PresenterType::builder("PostPresenter")
            .allow_collection("links", [&link, &link])
            .build()
            .unwrap();
        assert_eq!(
            presenter.method_type("links"),
            Some(&MethodType::Collection(link))
        );
    }

    #[test]
    fn dependency_tree_expands_nested_types() {
        let link = link();
        let avatar = PresenterType::builder("AvatarPresenter")
            .allow("url")
            .build()
            .unwrap();
        let user = PresenterType::builder("UserPresenter")
            .allow("first_name")
            .allow_presenter("avatar", &avatar)
            .build()
            .unwrap();
        let post = PresenterType::builder("PostPresenter")
            .allow("title")
            .allow_presenter("user", &user)
            .allow_collection("links", [&link])
            .build()
            .unwrap();

        let expected = json!({
            "title": null,
            "user": { "first_name": null, "avatar": { "url": null } },
            "links": [{ "url": null }],
        });
        let tree = post.dependency_tree();
        assert_eq!(tree.to_json(), expected);
        assert_eq!(serde_json::to_value(&tree).unwrap(), expected);
    }

    #[test]
    fn allows_path_walks_presenters_only() {
        let link = link();
        let user = PresenterType::builder("UserPresenter")
            .allow_presenter("homepage", &link)
            .build()
            .unwrap();
        let post = PresenterType::builder("PostPresenter")
            .allow_presenter("user", &user)
            .allow_collection("links", [&link])
            .build()
            .unwrap();

        assert!(post.allows_path("user.homepage.url"));
        assert!(!post.allows_path("user.homepage.title"));
        assert!(!post.allows_path("user.email"));
        assert!(!post.allows_path("links.url"));
        assert!(post.allows_path("links"));
    }
}
