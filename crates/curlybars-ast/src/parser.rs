//! Recursive descent parser for Curlybars templates.
//!
//! Consumes the lexer's token stream with a single token of lookahead and
//! produces a [`Program`]. Block nodes validate their closing tag as they are
//! built.

use crate::ast::{
    BlockHelperNode, ClosingTag, EachNode, Expression, HelperNode, IfNode, LiteralNode, Node,
    OptionNode, PartialNode, PathNode, Program, UnlessNode, WithNode,
};
use crate::token::{Token, TokenKind};
use crate::{CompileError, CompileErrorKind, Position, Result, DEFAULT_FILE_NAME};

/// Deepest block nesting a template may use.
pub const MAX_NESTING: usize = 256;

/// Recursive descent parser over a token stream.
pub struct Parser<I> {
    tokens: I,
    peeked: Option<Token>,
    last_position: Position,
    depth: usize,
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token>>,
{
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            peeked: None,
            last_position: Position::new(DEFAULT_FILE_NAME, 1, 1),
            depth: 0,
        }
    }

    /// Parse the whole token stream into a [`Program`].
    pub fn parse(mut self) -> Result<Program> {
        let program = self.parse_program()?;

        let token = self.next_token()?;
        match token.kind {
            TokenKind::Eof => Ok(program),
            TokenKind::Else => Err(CompileError::unexpected_token(
                "`{{else}}` outside of a block",
                token.position,
            )),
            TokenKind::CloseBlock(name) => Err(CompileError::unexpected_token(
                format!("`{{{{/{name}}}}}` closes a block that was never opened"),
                token.position,
            )),
            other => Err(unexpected(&other, token.position)),
        }
    }

    /// Parse nodes up to (not including) `{{else}}`, a block closer or the
    /// end of input.
    fn parse_program(&mut self) -> Result<Program> {
        let mut nodes = Vec::new();

        loop {
            if matches!(
                self.peek()?.kind,
                TokenKind::Eof | TokenKind::Else | TokenKind::CloseBlock(_)
            ) {
                break;
            }

            let token = self.next_token()?;
            let position = token.position;
            match token.kind {
                TokenKind::Literal(text) => {
                    nodes.push(Node::Literal(LiteralNode { text, position }));
                }
                TokenKind::Comment => {}
                TokenKind::OpenPath => nodes.push(self.parse_mustache(position)?),
                TokenKind::OpenRaw => nodes.push(self.parse_raw()?),
                TokenKind::OpenBlock(name) => nodes.push(self.parse_block(name, position)?),
                TokenKind::OpenPartial(name) => {
                    nodes.push(Node::Partial(PartialNode { name, position }));
                }
                other => return Err(unexpected(&other, position)),
            }
        }

        Ok(Program::new(nodes))
    }

    fn parse_mustache(&mut self, position: Position) -> Result<Node> {
        let helper = self.parse_helper_path()?;
        let (arguments, options) = self.parse_arguments()?;

        if arguments.is_empty() && options.is_empty() {
            return Ok(Node::Path(helper));
        }

        Ok(Node::Helper(HelperNode {
            helper,
            arguments,
            options,
            position,
        }))
    }

    fn parse_raw(&mut self) -> Result<Node> {
        let path = self.parse_helper_path()?;
        let token = self.next_token()?;
        match token.kind {
            TokenKind::CloseRaw => Ok(Node::RawPath(path)),
            other => Err(CompileError::unexpected_token(
                format!("expected `}}}}}}` after `{}`, got {other}", path.path),
                token.position,
            )),
        }
    }

    fn parse_helper_path(&mut self) -> Result<PathNode> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Path(path) => Ok(PathNode::new(path, token.position)),
            other => Err(CompileError::unexpected_token(
                format!("expected a path, got {other}"),
                token.position,
            )),
        }
    }

    /// Positional arguments followed by `key=value` options, up to `}}`.
    fn parse_arguments(&mut self) -> Result<(Vec<Expression>, Vec<OptionNode>)> {
        let mut arguments = Vec::new();
        let mut options: Vec<OptionNode> = Vec::new();

        loop {
            let token = self.next_token()?;
            let position = token.position;
            match token.kind {
                TokenKind::Close => break,
                TokenKind::Key(key) => {
                    if key.contains('.') {
                        return Err(CompileError::invalid_option(
                            format!("option key `{key}` cannot be a path"),
                            position,
                        ));
                    }
                    let value = self.next_token()?;
                    let Some(expression) = to_expression(value.kind, value.position) else {
                        return Err(CompileError::invalid_option(
                            format!("option `{key}` has no value"),
                            position,
                        ));
                    };
                    options.push(OptionNode {
                        key,
                        expression,
                        position,
                    });
                }
                kind => match to_expression(kind, position.clone()) {
                    Some(argument) if options.is_empty() => arguments.push(argument),
                    Some(argument) => {
                        return Err(CompileError::invalid_option(
                            format!(
                                "argument `{}` must come before the options",
                                argument.describe()
                            ),
                            position,
                        ));
                    }
                    None => return Err(self.unexpected_in_tag(position)),
                },
            }
        }

        Ok((arguments, options))
    }

    fn parse_block(&mut self, name: String, position: Position) -> Result<Node> {
        let (mut arguments, options) = self.parse_arguments()?;
        let builtin = crate::token::is_builtin_block(&name);

        if builtin {
            if let Some(option) = options.first() {
                return Err(CompileError::invalid_option(
                    format!("`{name}` does not accept options"),
                    option.position.clone(),
                ));
            }
            if arguments.len() != 1 {
                return Err(CompileError::unexpected_token(
                    format!("`{name}` expects exactly one argument"),
                    position,
                ));
            }
        }

        if self.depth == MAX_NESTING {
            return Err(CompileError::unexpected_token(
                format!("`{name}` is nested deeper than {MAX_NESTING} blocks"),
                position,
            ));
        }
        self.depth += 1;
        let body = self.parse_program()?;
        let else_body = self.parse_else(&name)?;
        self.depth -= 1;
        let close = self.parse_close(&name, &position)?;

        let node = match name.as_str() {
            "if" => Node::If(IfNode::new(
                arguments.remove(0),
                body,
                else_body,
                position,
                &close,
            )?),
            "unless" => Node::Unless(UnlessNode::new(
                arguments.remove(0),
                body,
                else_body,
                position,
                &close,
            )?),
            "each" => Node::Each(EachNode::new(
                arguments.remove(0),
                body,
                else_body,
                position,
                &close,
            )?),
            "with" => Node::With(WithNode::new(arguments.remove(0), body, position, &close)?),
            _ => {
                let helper = HelperNode {
                    helper: PathNode::new(name, position.clone()),
                    arguments,
                    options,
                    position,
                };
                Node::BlockHelper(BlockHelperNode::new(helper, body, else_body, &close)?)
            }
        };
        Ok(node)
    }

    fn parse_else(&mut self, name: &str) -> Result<Program> {
        if !matches!(self.peek()?.kind, TokenKind::Else) {
            return Ok(Program::default());
        }

        let token = self.next_token()?;
        if name == "with" {
            return Err(CompileError::unexpected_token(
                "`with` does not accept `{{else}}`",
                token.position,
            ));
        }

        let else_body = self.parse_program()?;
        if matches!(self.peek()?.kind, TokenKind::Else) {
            let token = self.next_token()?;
            return Err(CompileError::unexpected_token(
                format!("`{name}` already has an `{{{{else}}}}`"),
                token.position,
            ));
        }
        Ok(else_body)
    }

    fn parse_close(&mut self, name: &str, opened_at: &Position) -> Result<ClosingTag> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::CloseBlock(close) => Ok(ClosingTag::new(close, token.position)),
            TokenKind::Eof => Err(CompileError::new(
                CompileErrorKind::UnclosedBlock,
                format!("block `{name}` is never closed"),
                opened_at.clone(),
            )),
            other => Err(unexpected(&other, token.position)),
        }
    }

    fn unexpected_in_tag(&self, position: Position) -> CompileError {
        CompileError::unexpected_token("unexpected token inside `{{ }}`", position)
    }

    fn peek(&mut self) -> Result<&Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.pull()?,
        };
        Ok(self.peeked.insert(token))
    }

    fn next_token(&mut self) -> Result<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.pull(),
        }
    }

    fn pull(&mut self) -> Result<Token> {
        match self.tokens.next() {
            Some(Ok(token)) => {
                self.last_position = token.position.clone();
                Ok(token)
            }
            Some(Err(err)) => Err(err),
            None => Ok(Token::new(TokenKind::Eof, self.last_position.clone())),
        }
    }
}

fn to_expression(kind: TokenKind, position: Position) -> Option<Expression> {
    match kind {
        TokenKind::Path(path) => Some(Expression::Path(PathNode::new(path, position))),
        TokenKind::String(s) => Some(Expression::String(s)),
        TokenKind::Integer(n) => Some(Expression::Integer(n)),
        TokenKind::Boolean(b) => Some(Expression::Boolean(b)),
        _ => None,
    }
}

fn unexpected(kind: &TokenKind, position: Position) -> CompileError {
    CompileError::unexpected_token(format!("unexpected {kind}"), position)
}
