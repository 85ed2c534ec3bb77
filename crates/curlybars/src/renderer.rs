//! Renderer for evaluating a Curlybars [`Program`].
//!
//! Every node writes into a shared [`SafeBuffer`]; literal text goes in as-is
//! and every value goes through the escaping rules of the buffer.

use curlybars_ast::{
    BlockHelperNode, EachNode, HelperNode, IfNode, LiteralNode, Node, PartialNode, PathNode,
    Program, UnlessNode, WithNode,
};

use crate::error::RenderError;
use crate::helper::{Block, Options};
use crate::rendering_support::RenderingSupport;
use crate::safe_string::{SafeBuffer, SafeString};
use crate::value::Value;

type Result<T> = std::result::Result<T, RenderError>;

/// Render `program` into a fresh buffer.
pub(crate) fn render_to_string(
    program: &Program,
    hbs: &mut RenderingSupport,
) -> Result<SafeString> {
    let mut buffer = SafeBuffer::new();
    render_nodes(program, hbs, &mut buffer)?;
    Ok(buffer.into_safe_string())
}

fn render_nodes(
    program: &Program,
    hbs: &mut RenderingSupport,
    buffer: &mut SafeBuffer,
) -> Result<()> {
    for node in program.nodes() {
        match node {
            Node::Literal(n) => render_literal(n, buffer),
            Node::Path(n) => render_path(n, hbs, buffer)?,
            Node::RawPath(n) => render_raw_path(n, hbs, buffer)?,
            Node::Helper(n) => render_helper(n, hbs, buffer)?,
            Node::BlockHelper(n) => render_block_helper(n, hbs, buffer)?,
            Node::If(n) => render_if(n, hbs, buffer)?,
            Node::Unless(n) => render_unless(n, hbs, buffer)?,
            Node::Each(n) => render_each(n, hbs, buffer)?,
            Node::With(n) => render_with(n, hbs, buffer)?,
            Node::Partial(n) => render_partial(n, hbs, buffer)?,
        }
    }
    Ok(())
}

fn render_literal(node: &LiteralNode, buffer: &mut SafeBuffer) {
    buffer.safe_concat(&node.text);
}

/// Value of a path in output position. A bare helper is called with no arguments.
fn output_value(node: &PathNode, hbs: &RenderingSupport) -> Result<Value> {
    match hbs.resolve_path(&node.path, &node.position)?.call() {
        Value::Helper(helper) => RenderingSupport::invoke_helper(
            &*helper,
            &node.path,
            &node.position,
            Vec::new(),
            Options::new(),
            None,
        ),
        value => Ok(value),
    }
}

fn render_path(node: &PathNode, hbs: &RenderingSupport, buffer: &mut SafeBuffer) -> Result<()> {
    let value = output_value(node, hbs)?;
    buffer.concat(&value);
    Ok(())
}

fn render_raw_path(node: &PathNode, hbs: &RenderingSupport, buffer: &mut SafeBuffer) -> Result<()> {
    let value = output_value(node, hbs)?;
    buffer.safe_concat(&value.to_string());
    Ok(())
}

fn evaluate_arguments(node: &HelperNode, hbs: &RenderingSupport) -> Result<(Vec<Value>, Options)> {
    let arguments = node
        .arguments
        .iter()
        .map(|argument| hbs.evaluate(argument))
        .collect::<Result<Vec<_>>>()?;

    let mut options = Options::new();
    for option in &node.options {
        options.insert(option.key.clone(), hbs.evaluate(&option.expression)?);
    }
    Ok((arguments, options))
}

fn render_helper(
    node: &HelperNode,
    hbs: &mut RenderingSupport,
    buffer: &mut SafeBuffer,
) -> Result<()> {
    let name = node.helper.path.as_str();
    let helper = hbs.resolve_helper(name, &node.helper.position)?;
    let (arguments, options) = evaluate_arguments(node, hbs)?;

    let result =
        RenderingSupport::invoke_helper(&*helper, name, &node.position, arguments, options, None)?;
    buffer.concat(&result);
    Ok(())
}

fn render_block_helper(
    node: &BlockHelperNode,
    hbs: &mut RenderingSupport,
    buffer: &mut SafeBuffer,
) -> Result<()> {
    let call = node.helper();
    let name = call.helper.path.as_str();
    let helper = hbs.resolve_helper(name, &call.helper.position)?;
    let (arguments, options) = evaluate_arguments(call, hbs)?;

    let block = Block::new(hbs, node.body(), node.else_body(), name, &call.position);
    let result = RenderingSupport::invoke_helper(
        &*helper,
        name,
        &call.position,
        arguments,
        options,
        Some(block),
    )?;
    // The body is already rendered template output.
    buffer.safe_concat(&result.to_string());
    Ok(())
}

fn render_if(node: &IfNode, hbs: &mut RenderingSupport, buffer: &mut SafeBuffer) -> Result<()> {
    let value = hbs.evaluate(node.condition())?;
    if RenderingSupport::truthiness(&value) {
        render_nodes(node.body(), hbs, buffer)
    } else {
        render_nodes(node.else_body(), hbs, buffer)
    }
}

fn render_unless(
    node: &UnlessNode,
    hbs: &mut RenderingSupport,
    buffer: &mut SafeBuffer,
) -> Result<()> {
    let value = hbs.evaluate(node.condition())?;
    if RenderingSupport::truthiness(&value) {
        render_nodes(node.else_body(), hbs, buffer)
    } else {
        render_nodes(node.body(), hbs, buffer)
    }
}

fn render_each(node: &EachNode, hbs: &mut RenderingSupport, buffer: &mut SafeBuffer) -> Result<()> {
    let value = hbs.evaluate(node.collection())?;
    let path = node.collection().describe();
    let presenters = hbs.check_collection_is_presenters(&value, &path, node.position())?;

    if presenters.is_empty() {
        return render_nodes(node.else_body(), hbs, buffer);
    }

    for presenter in presenters {
        hbs.with_context(presenter, |hbs| render_nodes(node.body(), hbs, buffer))?;
    }
    Ok(())
}

fn render_with(node: &WithNode, hbs: &mut RenderingSupport, buffer: &mut SafeBuffer) -> Result<()> {
    let value = hbs.evaluate(node.context())?;
    let path = node.context().describe();
    let presenter = hbs.check_context_is_presenter(&value, &path, node.position())?;
    hbs.with_context(presenter, |hbs| render_nodes(node.body(), hbs, buffer))
}

fn render_partial(
    node: &PartialNode,
    hbs: &mut RenderingSupport,
    buffer: &mut SafeBuffer,
) -> Result<()> {
    let partial = hbs.enter_partial(&node.name, &node.position)?;
    tracing::trace!(partial = %node.name, "rendering partial");
    let result = render_nodes(partial.program(), hbs, buffer);
    hbs.leave_partial();
    result
}
