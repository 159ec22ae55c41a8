//! Inline constraint resolution.
//!
//! Turns constraint text written inside a route template, such as the
//! `int:range(1,100)` part of `{id:int:range(1,100)}`, into constraint instances.
//! Only parameter declarations are read here; segment matching belongs to the matcher.

use std::sync::Arc;

use crate::error::{Result, RoutingError};
use crate::routing::constraint_map::{ConstraintArgs, ConstraintMap};
use crate::routing::matcher::{CompositeRouteConstraint, OptionalRouteConstraint, RouteConstraint};

/// One `{...}` parameter declaration in a route template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteParameter {
    pub name: String,
    /// Inline constraint texts in declaration order.
    pub constraints: Vec<String>,
    pub optional: bool,
    pub catch_all: bool,
    pub default_value: Option<String>,
}

/// Split `token(args)` into its token and arguments.
pub fn parse_inline_constraint(text: &str) -> Result<(&str, ConstraintArgs<'_>)> {
    let syntax = |reason: &str| RoutingError::InvalidConstraintSyntax {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let (token, args) = match text.find('(') {
        Some(open) => {
            let Some(inner) = text[open + 1..].strip_suffix(')') else {
                return Err(syntax("missing closing ')'"));
            };
            (&text[..open], ConstraintArgs::new(inner))
        }
        None if text.contains(')') => return Err(syntax("unexpected ')'")),
        None => (text, ConstraintArgs::none()),
    };

    let token = token.trim();
    if token.is_empty() {
        return Err(syntax("constraint token is empty"));
    }
    Ok((token, args))
}

/// Resolves inline constraint text against a [`ConstraintMap`].
#[derive(Debug, Clone)]
pub struct InlineConstraintResolver {
    constraint_map: Arc<ConstraintMap>,
}

impl InlineConstraintResolver {
    pub fn new(constraint_map: Arc<ConstraintMap>) -> Self {
        Self { constraint_map }
    }

    /// Build the constraint described by `text`, e.g. `range(1,100)`.
    pub fn resolve(&self, text: &str) -> Result<Arc<dyn RouteConstraint>> {
        let (token, args) = parse_inline_constraint(text)?;
        self.constraint_map.resolve(token)?.create(token, &args)
    }

    /// Combined constraint for one parameter, or `None` when it declares none.
    pub fn resolve_parameter(&self, parameter: &RouteParameter) -> Result<Option<Arc<dyn RouteConstraint>>> {
        let mut resolved = parameter
            .constraints
            .iter()
            .map(|text| self.resolve(text))
            .collect::<Result<Vec<_>>>()?;

        let combined: Arc<dyn RouteConstraint> = match resolved.len() {
            0 => return Ok(None),
            1 => resolved.remove(0),
            _ => Arc::new(CompositeRouteConstraint::new(resolved)),
        };

        if parameter.optional {
            Ok(Some(Arc::new(OptionalRouteConstraint::new(combined))))
        } else {
            Ok(Some(combined))
        }
    }

    /// Every constrained parameter in `pattern`, paired with its constraint.
    pub fn resolve_pattern(&self, pattern: &str) -> Result<Vec<(String, Arc<dyn RouteConstraint>)>> {
        let mut constraints = Vec::new();
        for parameter in parse_route_parameters(pattern)? {
            if let Some(constraint) = self.resolve_parameter(&parameter)? {
                constraints.push((parameter.name, constraint));
            }
        }
        Ok(constraints)
    }
}

/// Extract the parameter declarations of a route template.
///
/// `{{` and `}}` are literal braces, both in literal text and inside a declaration.
pub fn parse_route_parameters(pattern: &str) -> Result<Vec<RouteParameter>> {
    let invalid = |reason: String| RoutingError::InvalidRoutePattern {
        pattern: pattern.to_string(),
        reason,
    };

    let mut parameters = Vec::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
            }
            '}' => return Err(invalid("unmatched '}'".to_string())),
            '{' => {
                let mut body = String::new();
                let mut depth = 0usize;
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '{' | '}' if chars.peek() == Some(&c) => {
                            chars.next();
                            body.push(c);
                        }
                        '}' if depth == 0 => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(invalid("'{' inside a parameter must be escaped as '{{'".to_string())),
                        '(' => {
                            depth += 1;
                            body.push(c);
                        }
                        ')' => {
                            depth = depth.saturating_sub(1);
                            body.push(c);
                        }
                        _ => body.push(c),
                    }
                }
                if !closed {
                    return Err(invalid("unterminated parameter".to_string()));
                }
                let parameter = parse_parameter(&body).map_err(invalid)?;
                if parameters
                    .iter()
                    .any(|p: &RouteParameter| p.name.eq_ignore_ascii_case(&parameter.name))
                {
                    return Err(invalid(format!("parameter '{}' declared twice", parameter.name)));
                }
                parameters.push(parameter);
            }
            _ => {}
        }
    }

    Ok(parameters)
}

/// Split at `separator` wherever it is outside parentheses.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_parameter(body: &str) -> std::result::Result<RouteParameter, String> {
    let mut parameter = RouteParameter::default();

    // name[:constraint...][?][=default]
    let mut declaration = body;
    let pieces = split_top_level(body, '=');
    if pieces.len() > 1 {
        declaration = pieces[0];
        parameter.default_value = Some(body[declaration.len() + 1..].to_string());
    }

    if let Some(stripped) = declaration.strip_suffix('?') {
        declaration = stripped;
        parameter.optional = true;
    }

    let mut parts = split_top_level(declaration, ':').into_iter();
    let mut name = parts.next().unwrap_or_default().trim();
    if let Some(rest) = name.strip_prefix('*') {
        parameter.catch_all = true;
        name = rest.strip_prefix('*').unwrap_or(rest);
    }

    if name.is_empty() {
        return Err(format!("parameter '{{{}}}' has no name", body));
    }
    if name.contains(['/', '?', '*', '(', ')']) {
        return Err(format!("parameter name '{}' contains an invalid character", name));
    }
    if parameter.optional && parameter.default_value.is_some() {
        return Err(format!("parameter '{}' cannot be optional and have a default", name));
    }

    parameter.name = name.to_string();
    for text in parts {
        if text.trim().is_empty() {
            return Err(format!("parameter '{}' has an empty constraint", name));
        }
        parameter.constraints.push(text.to_string());
    }
    Ok(parameter)
}
