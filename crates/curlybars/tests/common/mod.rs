//! Shared presenters and helpers for the integration tests.
//!
//! The root presenter models a post page: a post with an author, a comment
//! form and a handful of helpers.

#![allow(dead_code)]

use std::rc::Rc;
use std::sync::{Arc, OnceLock};

use curlybars::{
    helper_fn, escape, CurlybarsError, Parameter, Presenter, PresenterType, Record, RenderError,
    SafeString, Template, Value,
};

/// Collapse runs of whitespace so indented templates compare cleanly.
pub fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn render(source: &str, root: Rc<dyn Presenter>) -> Result<String, CurlybarsError> {
    let template = Template::compile(source)?;
    Ok(template.render(root)?.into_string())
}

pub fn render_err(source: &str, root: Rc<dyn Presenter>) -> RenderError {
    let template = Template::compile(source).unwrap();
    template.render(root).unwrap_err()
}

// ============================================================================
// Presenter types
// ============================================================================

pub fn avatar_type() -> &'static Arc<PresenterType> {
    static TYPE: OnceLock<Arc<PresenterType>> = OnceLock::new();
    TYPE.get_or_init(|| {
        PresenterType::builder("AvatarPresenter")
            .allow("url")
            .build()
            .unwrap()
    })
}

pub fn user_type() -> &'static Arc<PresenterType> {
    static TYPE: OnceLock<Arc<PresenterType>> = OnceLock::new();
    TYPE.get_or_init(|| {
        PresenterType::builder("UserPresenter")
            .allow_methods(["first_name", "created_at", "admin"])
            .allow_presenter("avatar", avatar_type())
            .build()
            .unwrap()
    })
}

pub fn comment_form_type() -> &'static Arc<PresenterType> {
    static TYPE: OnceLock<Arc<PresenterType>> = OnceLock::new();
    TYPE.get_or_init(|| {
        PresenterType::builder("CommentFormPresenter")
            .allow_methods(["title", "input"])
            .build()
            .unwrap()
    })
}

pub fn path_type() -> &'static Arc<PresenterType> {
    static TYPE: OnceLock<Arc<PresenterType>> = OnceLock::new();
    TYPE.get_or_init(|| {
        PresenterType::builder("PathPresenter")
            .allow("path")
            .build()
            .unwrap()
    })
}

pub fn post_type() -> &'static Arc<PresenterType> {
    static TYPE: OnceLock<Arc<PresenterType>> = OnceLock::new();
    TYPE.get_or_init(|| {
        PresenterType::builder("PostPresenter")
            .allow_methods(["title", "date", "asset", "beautify", "tags", "broken"])
            .allow_presenter("user", user_type())
            .allow_presenter("new_comment_form", comment_form_type())
            .allow_collection("paths", [path_type()])
            .allow_collection("empty_paths", [path_type()])
            .build()
            .unwrap()
    })
}

// ============================================================================
// Presenters
// ============================================================================

pub fn avatar() -> Record {
    Record::new(avatar_type()).with("url", "http://example.com/foo.png")
}

pub fn user() -> Record {
    Record::new(user_type())
        .with("first_name", "Libo")
        .with("created_at", "2015-02-03T13:25:06Z")
        .with("admin", false)
        .with("avatar", Rc::new(avatar()))
        .with("password", "hunter2")
}

pub fn comment_form() -> Record {
    Record::new(comment_form_type())
        .with("title", "some value persisted in the DB")
        .with("input", Value::helper(input_helper()))
}

pub fn path(path: &str) -> Value {
    Record::new(path_type()).with("path", path).into_value()
}

/// The root presenter of most tests.
///
/// `system` is answered but not allowed; `broken` is allowed but not
/// answered.
pub fn post() -> Record {
    Record::new(post_type())
        .with("title", "Welcome <home>")
        .with("user", Rc::new(user()))
        .with("new_comment_form", Rc::new(comment_form()))
        .with("date", Value::helper(date_helper()))
        .with("asset", Value::helper(asset_helper()))
        .with("beautify", Value::helper(beautify_helper()))
        .with("tags", vec!["news", "rust"])
        .with("paths", vec![path("a_path"), path("another_path")])
        .with("empty_paths", Vec::<Value>::new())
        .with("system", "rm -rf /")
}

pub fn root() -> Rc<dyn Presenter> {
    Rc::new(post())
}

// ============================================================================
// Helpers
// ============================================================================

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// `2015-02-03T13:25:06Z` as `February 3, 2015 13:25`.
fn humanize(timestamp: &str) -> String {
    let (date, time) = timestamp.split_once('T').unwrap_or((timestamp, ""));
    let parts: Vec<&str> = date.split('-').collect();
    let &[year, month, day] = parts.as_slice() else {
        return timestamp.to_string();
    };
    let month = month
        .parse::<usize>()
        .ok()
        .and_then(|m| MONTHS.get(m.wrapping_sub(1)))
        .copied()
        .unwrap_or(month);
    let day = day.trim_start_matches('0');
    let clock = time.get(..5).unwrap_or("");
    format!("{month} {day}, {year} {clock}")
}

/// `{{date timestamp class="..."}}`
pub fn date_helper() -> impl curlybars::Helper {
    helper_fn(
        [Parameter::required("context"), Parameter::required("options")],
        |args| {
            let timestamp = args.context.unwrap_or_default().to_string();
            let options = args.options.unwrap_or_default();
            let class = options
                .get("class")
                .map(|v| v.to_string())
                .unwrap_or_default();
            Ok(SafeString::trusted(format!(
                r#"<time datetime="{}" class="{}">{}</time>"#,
                escape(&timestamp),
                escape(&class),
                humanize(&timestamp)
            ))
            .into())
        },
    )
}

/// `{{asset "file.js"}}`
pub fn asset_helper() -> impl curlybars::Helper {
    helper_fn([Parameter::required("context")], |args| {
        let file = args.context.unwrap_or_default();
        Ok(Value::from(format!("http://cdn.example.com/{file}")))
    })
}

/// `{{input value class="..."}}`
pub fn input_helper() -> impl curlybars::Helper {
    helper_fn(
        [Parameter::required("context"), Parameter::required("options")],
        |args| {
            let value = args.context.unwrap_or_default().to_string();
            let class = args
                .options
                .unwrap_or_default()
                .get("class")
                .map(|v| v.to_string())
                .unwrap_or_default();
            Ok(SafeString::trusted(format!(
                r#"<input name="community_post[title]" id="community_post_title" type="text" class="{}" value="{}">"#,
                escape(&class),
                escape(&value)
            ))
            .into())
        },
    )
}

/// `{{#beautify}}...{{/beautify}}`: renders the body against a fresh author,
/// wrapped in `<b>`.
pub fn beautify_helper() -> impl curlybars::Helper {
    helper_fn([], |args| {
        let Some(mut block) = args.block else {
            return Ok(Value::Nil);
        };
        let author = Value::from(Rc::new(user()));
        let inner = block.render(author)?;
        Ok(SafeString::trusted(format!("<b>{inner}</b>")).into())
    })
}
