use std::fmt;

use crate::Position;

/// Token kinds in the Curlybars template language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Raw text outside of {{ }}
    Literal(String),

    /// Opening delimiter {{ of an interpolation or inline helper
    OpenPath,
    /// Opening delimiter {{{ of a raw interpolation
    OpenRaw,
    /// Block opener {{#name
    OpenBlock(String),
    /// Complete block closer {{/name}}
    CloseBlock(String),
    /// Complete {{else}}
    Else,
    /// Complete partial reference {{> name}}
    OpenPartial(String),
    /// A discarded {{! ... }} comment
    Comment,

    /// Dotted path expression, e.g. user.avatar.url
    Path(String),
    /// Quoted string literal, unescaped
    String(String),
    /// Integer literal
    Integer(i64),
    /// Keyword: true / false
    Boolean(bool),
    /// Option key, the `key` of `key=value`
    Key(String),

    /// Closing delimiter }}
    Close,
    /// Closing delimiter }}} of a raw interpolation
    CloseRaw,

    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Literal(_) => f.write_str("text"),
            TokenKind::OpenPath => f.write_str("`{{`"),
            TokenKind::OpenRaw => f.write_str("`{{{`"),
            TokenKind::OpenBlock(name) => write!(f, "`{{{{#{name}`"),
            TokenKind::CloseBlock(name) => write!(f, "`{{{{/{name}}}}}`"),
            TokenKind::Else => f.write_str("`{{else}}`"),
            TokenKind::OpenPartial(name) => write!(f, "`{{{{> {name}}}}}`"),
            TokenKind::Comment => f.write_str("comment"),
            TokenKind::Path(path) => write!(f, "path `{path}`"),
            TokenKind::String(s) => write!(f, "string {s:?}"),
            TokenKind::Integer(n) => write!(f, "integer {n}"),
            TokenKind::Boolean(b) => write!(f, "`{b}`"),
            TokenKind::Key(key) => write!(f, "option `{key}=`"),
            TokenKind::Close => f.write_str("`}}`"),
            TokenKind::CloseRaw => f.write_str("`}}}`"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with its kind and source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

/// Names of the block constructs handled by the language itself rather than
/// by a helper.
pub const BUILTIN_BLOCKS: &[&str] = &["if", "unless", "each", "with"];

pub fn is_builtin_block(name: &str) -> bool {
    BUILTIN_BLOCKS.contains(&name)
}
