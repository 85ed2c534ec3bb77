//! AST node set.
//!
//! Nodes are immutable once built and form a strict tree. Block nodes are
//! created through fallible constructors that check the closing tag, so a
//! mismatched block never exists as a value.

use std::str::Split;

use crate::{CompileError, CompileErrorKind, Position, Result};

/// A sequence of nodes: a whole template or a block body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    nodes: Vec<Node>,
}

impl Program {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(LiteralNode),
    Path(PathNode),
    RawPath(PathNode),
    Helper(HelperNode),
    BlockHelper(BlockHelperNode),
    If(IfNode),
    Unless(UnlessNode),
    Each(EachNode),
    With(WithNode),
    Partial(PartialNode),
}

impl Node {
    pub fn position(&self) -> &Position {
        match self {
            Node::Literal(n) => &n.position,
            Node::Path(n) | Node::RawPath(n) => &n.position,
            Node::Helper(n) => &n.position,
            Node::BlockHelper(n) => &n.helper.position,
            Node::If(n) => &n.position,
            Node::Unless(n) => &n.position,
            Node::Each(n) => &n.position,
            Node::With(n) => &n.position,
            Node::Partial(n) => &n.position,
        }
    }
}

/// Raw template text, emitted unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralNode {
    pub text: String,
    pub position: Position,
}

/// A dotted path such as `user.avatar.url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    pub path: String,
    pub position: Position,
}

impl PathNode {
    pub fn new(path: impl Into<String>, position: Position) -> Self {
        Self {
            path: path.into(),
            position,
        }
    }

    pub fn segments(&self) -> Split<'_, char> {
        self.path.split('.')
    }
}

/// Anything that can appear as an argument: a path or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Path(PathNode),
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl Expression {
    /// Describes the expression for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Expression::Path(p) => p.path.clone(),
            Expression::String(s) => format!("{s:?}"),
            Expression::Integer(n) => n.to_string(),
            Expression::Boolean(b) => b.to_string(),
        }
    }
}

/// Named helper argument: `key=expression`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionNode {
    pub key: String,
    pub expression: Expression,
    pub position: Position,
}

/// Inline helper invocation: `{{helper arg key=value}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperNode {
    pub helper: PathNode,
    pub arguments: Vec<Expression>,
    pub options: Vec<OptionNode>,
    pub position: Position,
}

/// The `{{/name}}` that ends a block, used to validate block construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingTag {
    pub name: String,
    pub position: Position,
}

impl ClosingTag {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    fn check(&self, opened: &str) -> Result<()> {
        if self.name == opened {
            return Ok(());
        }
        Err(CompileError::new(
            CompileErrorKind::ClosingTagMismatch,
            format!("block `{opened}` cannot be closed by `{}`", self.name),
            self.position.clone(),
        ))
    }
}

/// Block helper invocation: `{{#helper ...}}body{{else}}inverse{{/helper}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockHelperNode {
    helper: HelperNode,
    body: Program,
    else_body: Program,
}

impl BlockHelperNode {
    pub fn new(
        helper: HelperNode,
        body: Program,
        else_body: Program,
        close: &ClosingTag,
    ) -> Result<Self> {
        close.check(&helper.helper.path)?;
        Ok(Self {
            helper,
            body,
            else_body,
        })
    }

    pub fn helper(&self) -> &HelperNode {
        &self.helper
    }

    pub fn body(&self) -> &Program {
        &self.body
    }

    pub fn else_body(&self) -> &Program {
        &self.else_body
    }
}

/// `{{#if expr}}...{{else}}...{{/if}}`
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    condition: Expression,
    body: Program,
    else_body: Program,
    position: Position,
}

impl IfNode {
    pub fn new(
        condition: Expression,
        body: Program,
        else_body: Program,
        position: Position,
        close: &ClosingTag,
    ) -> Result<Self> {
        close.check("if")?;
        Ok(Self {
            condition,
            body,
            else_body,
            position,
        })
    }

    pub fn condition(&self) -> &Expression {
        &self.condition
    }

    pub fn body(&self) -> &Program {
        &self.body
    }

    pub fn else_body(&self) -> &Program {
        &self.else_body
    }

    pub fn position(&self) -> &Position {
        &self.position
    }
}

/// `{{#unless expr}}...{{else}}...{{/unless}}`
#[derive(Debug, Clone, PartialEq)]
pub struct UnlessNode {
    condition: Expression,
    body: Program,
    else_body: Program,
    position: Position,
}

impl UnlessNode {
    pub fn new(
        condition: Expression,
        body: Program,
        else_body: Program,
        position: Position,
        close: &ClosingTag,
    ) -> Result<Self> {
        close.check("unless")?;
        Ok(Self {
            condition,
            body,
            else_body,
            position,
        })
    }

    pub fn condition(&self) -> &Expression {
        &self.condition
    }

    pub fn body(&self) -> &Program {
        &self.body
    }

    pub fn else_body(&self) -> &Program {
        &self.else_body
    }

    pub fn position(&self) -> &Position {
        &self.position
    }
}

/// `{{#each collection}}...{{else}}...{{/each}}`
#[derive(Debug, Clone, PartialEq)]
pub struct EachNode {
    collection: Expression,
    body: Program,
    else_body: Program,
    position: Position,
}

impl EachNode {
    pub fn new(
        collection: Expression,
        body: Program,
        else_body: Program,
        position: Position,
        close: &ClosingTag,
    ) -> Result<Self> {
        close.check("each")?;
        Ok(Self {
            collection,
            body,
            else_body,
            position,
        })
    }

    pub fn collection(&self) -> &Expression {
        &self.collection
    }

    pub fn body(&self) -> &Program {
        &self.body
    }

    pub fn else_body(&self) -> &Program {
        &self.else_body
    }

    pub fn position(&self) -> &Position {
        &self.position
    }
}

/// `{{#with presenter}}...{{/with}}`
#[derive(Debug, Clone, PartialEq)]
pub struct WithNode {
    context: Expression,
    body: Program,
    position: Position,
}

impl WithNode {
    pub fn new(
        context: Expression,
        body: Program,
        position: Position,
        close: &ClosingTag,
    ) -> Result<Self> {
        close.check("with")?;
        Ok(Self {
            context,
            body,
            position,
        })
    }

    pub fn context(&self) -> &Expression {
        &self.context
    }

    pub fn body(&self) -> &Program {
        &self.body
    }

    pub fn position(&self) -> &Position {
        &self.position
    }
}

/// `{{> name}}`, resolved by the host at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialNode {
    pub name: String,
    pub position: Position,
}
