//! Helper invocation: positional context, options and block helpers.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{post, post_type, render, render_err, root, squish};
use curlybars::{
    helper_fn, Options, Parameter, Presenter, PresenterType, Record, RenderErrorKind, SafeString,
    Template, Value,
};
use pretty_assertions::assert_eq;

#[test]
fn renders_a_helper_with_expression_and_options() {
    let result = render("{{date user.created_at class='metadata'}}", root()).unwrap();
    assert_eq!(
        result,
        r#"<time datetime="2015-02-03T13:25:06Z" class="metadata">February 3, 2015 13:25</time>"#
    );
}

#[test]
fn renders_a_helper_with_only_expression() {
    let result = render(r#"<script src="{{asset "jquery_plugin.js"}}"></script>"#, root()).unwrap();
    assert_eq!(
        result,
        r#"<script src="http://cdn.example.com/jquery_plugin.js"></script>"#
    );
}

#[test]
fn renders_a_helper_with_only_options() {
    let source = r#"
        {{#with new_comment_form}}
          {{input title class="form-control"}}
        {{/with}}
    "#;
    let result = squish(&render(source, root()).unwrap());
    assert_eq!(
        result,
        r#"<input name="community_post[title]" id="community_post_title" type="text" class="form-control" value="some value persisted in the DB">"#
    );
}

// ============================================================================
// Calling convention
// ============================================================================

fn root_with(name: &str, helper: impl curlybars::Helper + 'static) -> Rc<dyn Presenter> {
    let helper_type = PresenterType::builder("HelperPresenter")
        .extends(post_type())
        .allow(name)
        .build()
        .unwrap();
    let mut record = Record::new(&helper_type).with(name, Value::helper(helper));
    for method in ["title", "user"] {
        record = record.with(method, post().call(method));
    }
    Rc::new(record)
}

#[test]
fn bad_signature_fails_before_the_helper_runs() {
    let called = Rc::new(Cell::new(false));
    let flag = Rc::clone(&called);
    let helper = helper_fn(
        [Parameter::required("context"), Parameter::required("format")],
        move |_| {
            flag.set(true);
            Ok(Value::Nil)
        },
    );
    let location = curlybars::Helper::source_location(&helper);

    let err = render_err("{{stamp title format='short'}}", root_with("stamp", helper));
    assert_eq!(err.kind, RenderErrorKind::InvalidHelperSignature);
    assert!(err.message.starts_with(&location), "{}", err.message);
    assert!(
        err.message
            .ends_with("possible named parameters are `context:` and `options:`"),
        "{}",
        err.message
    );
    assert!(!called.get());
}

#[test]
fn optional_context_is_a_bad_signature() {
    let helper = helper_fn([Parameter::optional("context")], |_| Ok(Value::Nil));
    let err = render_err("{{stamp title}}", root_with("stamp", helper));
    assert_eq!(err.kind, RenderErrorKind::InvalidHelperSignature);
}

#[test]
fn context_is_the_first_positional_argument() {
    let helper = helper_fn([Parameter::required("context")], |args| {
        assert_eq!(args.arguments.len(), 2);
        assert!(args.options.is_none());
        Ok(args.context.unwrap_or_default())
    });
    let result = render("{{first user.first_name title}}", root_with("first", helper)).unwrap();
    assert_eq!(result, "Libo");
}

#[test]
fn context_is_nil_without_positional_arguments() {
    let helper = helper_fn(
        [Parameter::required("context"), Parameter::required("options")],
        |args| {
            let context = args.context.unwrap_or(Value::from("missing"));
            Ok(Value::from(format!("{}|{}", context.is_nil(), args.options.map_or(0, |o| o.len()))))
        },
    );
    let result = render("{{probe class='x'}}", root_with("probe", helper)).unwrap();
    assert_eq!(result, "true|1");
}

#[test]
fn options_keep_first_position_and_last_value() {
    let helper = helper_fn([Parameter::required("options")], |args| {
        let options: Options = args.options.unwrap_or_default();
        let pairs: Vec<String> = options.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Ok(Value::from(pairs.join(",")))
    });
    let result = render(
        "{{opts a=1 b=true a='two' c=title}}",
        root_with("opts", helper),
    )
    .unwrap();
    assert_eq!(result, "a=two,b=true,c=Welcome &lt;home&gt;");
}

#[test]
fn plain_helper_output_is_escaped_and_safe_output_is_not() {
    let plain = helper_fn([], |_| Ok(Value::from("<i>x</i>")));
    assert_eq!(render("{{p 1}}", root_with("p", plain)).unwrap(), "&lt;i&gt;x&lt;/i&gt;");

    let safe = helper_fn([], |_| Ok(SafeString::trusted("<i>x</i>").into()));
    assert_eq!(render("{{s 1}}", root_with("s", safe)).unwrap(), "<i>x</i>");
}

#[test]
fn helper_errors_propagate() {
    let failing = helper_fn([], |_| {
        Err(curlybars::RenderError::new(
            RenderErrorKind::InvalidHelperSignature,
            "nope",
            curlybars::Position::new("helper", 1, 1),
        ))
    });
    let err = render_err("{{f 1}}", root_with("f", failing));
    assert_eq!(err.message, "nope");
}

#[test]
fn calling_a_non_helper_fails() {
    let err = render_err("{{title 'x'}}", root());
    assert_eq!(err.kind, RenderErrorKind::InvalidHelperSignature);
    assert_eq!(err.message, "`title` is not a helper, got string");
}

#[test]
fn helper_path_is_checked_against_the_whitelist() {
    let err = render_err("{{system 'x'}}", root());
    assert_eq!(err.kind, RenderErrorKind::PathNotAllowed);
}

// ============================================================================
// Block helpers
// ============================================================================

#[test]
fn block_helper_renders_its_body_against_the_given_presenter() {
    let result = render("{{#beautify}}{{first_name}}{{/beautify}}", root()).unwrap();
    assert_eq!(result, "<b>Libo</b>");
}

#[test]
fn block_helper_can_render_the_inverse() {
    let helper = helper_fn([Parameter::required("context")], |args| {
        let context = args.context.unwrap_or_default();
        let Some(mut block) = args.block else {
            return Ok(Value::Nil);
        };
        let admin = context
            .as_presenter()
            .map(|user| user.call("admin").is_truthy())
            .unwrap_or(false);
        let output = if admin {
            block.render(context)?
        } else {
            block.inverse(context)?
        };
        Ok(output.into())
    });
    let result = render(
        "{{#admin_only user}}admin {{first_name}}{{else}}guest {{first_name}}{{/admin_only}}",
        root_with("admin_only", helper),
    )
    .unwrap();
    assert_eq!(result, "guest Libo");
}

#[test]
fn block_body_can_render_many_times() {
    let helper = helper_fn([Parameter::required("context")], |args| {
        let context = args.context.unwrap_or_default();
        let Some(mut block) = args.block else {
            return Ok(Value::Nil);
        };
        let mut out = String::new();
        for _ in 0..3 {
            out.push_str(block.render(context.clone())?.as_str());
        }
        Ok(SafeString::trusted(out).into())
    });
    let result = render(
        "{{#thrice user}}{{first_name}};{{/thrice}}",
        root_with("thrice", helper),
    )
    .unwrap();
    assert_eq!(result, "Libo;Libo;Libo;");
}

#[test]
fn block_context_must_be_a_presenter() {
    let helper = helper_fn([Parameter::required("context")], |args| {
        let context = args.context.unwrap_or_default();
        match args.block {
            Some(mut block) => Ok(block.render(context)?.into()),
            None => Ok(Value::Nil),
        }
    });
    let err = render_err("{{#wrap title}}x{{/wrap}}", root_with("wrap", helper));
    assert_eq!(err.kind, RenderErrorKind::ContextIsNotAPresenter);
    assert_eq!(err.message, "`wrap` is not a context type object");
}

#[test]
fn block_render_restores_the_outer_context() {
    let template =
        Template::compile("{{#beautify}}{{first_name}}{{/beautify}} {{title}}").unwrap();
    let output = template.render(root()).unwrap();
    assert_eq!(output, "<b>Libo</b> Welcome &lt;home&gt;");
}

#[test]
fn block_helper_output_keeps_template_markup() {
    let helper = helper_fn([Parameter::required("context")], |args| {
        let context = args.context.unwrap_or_default();
        let Some(mut block) = args.block else {
            return Ok(Value::Nil);
        };
        let inner = block.render(context)?;
        Ok(Value::from(format!("<div>{inner}</div>")))
    });
    let result = render(
        "{{#wrap user}}<i>{{first_name}}</i>{{/wrap}}",
        root_with("wrap", helper),
    )
    .unwrap();
    assert_eq!(result, "<div><i>Libo</i></div>");
}

#[test]
fn inline_helper_output_is_still_escaped_next_to_a_block() {
    let plain = helper_fn([], |_| Ok(Value::from("<hr>")));
    let result = render("{{#if true}}<p>{{p 1}}</p>{{/if}}", root_with("p", plain)).unwrap();
    assert_eq!(result, "<p>&lt;hr&gt;</p>");
}
