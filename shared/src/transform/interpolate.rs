//! Argument interpolation for query and condition templates.
//!
//! Templates reference analysis arguments with `{{ args.<name> }}`
//! placeholders. A placeholder runs from `{{` to the nearest following `}}`
//! on the same line. Placeholders that cannot be resolved are left verbatim.

use crate::models::Argument;
use nom::{
    bytes::complete::{tag, take_until},
    sequence::delimited,
    IResult, Parser,
};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const ARGS_PREFIX: &str = "args";

/// Replaces `{{ args.<name> }}` placeholders with argument values.
///
/// Returns `None` for an absent template and the template unchanged when no
/// arguments are given.
///
/// # Examples
///
/// ```
/// use shared::models::Argument;
/// use shared::transform::interpolate;
///
/// let args = vec![Argument::new("service", "checkout")];
/// let query = interpolate(Some("rate(errors{service=\"{{ args.service }}\"}[5m])"), &args);
///
/// assert_eq!(query.as_deref(), Some("rate(errors{service=\"checkout\"}[5m])"));
/// ```
#[must_use]
pub fn interpolate(template: Option<&str>, args: &[Argument]) -> Option<String> {
    let template = template?;
    if args.is_empty() {
        return Some(template.to_string());
    }
    Some(interpolate_str(template, args))
}

/// Replaces placeholders in a template that is known to be present.
#[must_use]
pub fn interpolate_str(template: &str, args: &[Argument]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let (before, candidate) = rest.split_at(start);
        output.push_str(before);

        match placeholder(candidate) {
            Ok((after, inner)) if !inner.contains('\n') => {
                let whole = &candidate[..candidate.len() - after.len()];
                match argument_name(inner).and_then(|name| argument_value(args, &name)) {
                    Some(value) => output.push_str(value),
                    None => output.push_str(whole),
                }
                rest = after;
            }
            _ => {
                // not a placeholder start, keep the brace and scan on
                output.push('{');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Looks up the value of the first argument with the given name.
#[must_use]
pub fn argument_value<'a>(args: &'a [Argument], name: &str) -> Option<&'a str> {
    args.iter()
        .find(|arg| arg.name == name)
        .and_then(|arg| arg.value.as_deref())
}

fn placeholder(input: &str) -> IResult<&str, &str> {
    delimited(tag(OPEN), take_until(CLOSE), tag(CLOSE)).parse(input)
}

/// Extracts the argument name from the inside of a placeholder.
///
/// Braces and spaces are ignored, the remaining path must be
/// `args.<name>[.<more>]`.
fn argument_name(inner: &str) -> Option<String> {
    let path: String = inner
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | ' '))
        .collect();
    let mut segments = path.split('.');

    if segments.next() != Some(ARGS_PREFIX) {
        return None;
    }
    segments.next().map(str::to_string)
}
