//! Built-in route constraints.
//!
//! Each constraint here is registered in the default constraint map under the
//! token listed in [`default_constraints`].

use regex::{Regex, RegexBuilder};
use uuid::Uuid;

use crate::endpoint::RequestContext;
use crate::routing::constraint_map::{ConstraintArgs, ConstraintFactory, ConstructConstraint};
use crate::routing::matcher::{value_text, RouteConstraint, RouteDirection};
use crate::routing::values::RouteValueDictionary;

/// Token/factory pairs installed by `RouteOptions::new`.
pub fn default_constraints() -> Vec<(&'static str, ConstraintFactory)> {
    vec![
        ("int", ConstraintFactory::of::<IntRouteConstraint>()),
        ("long", ConstraintFactory::of::<LongRouteConstraint>()),
        ("bool", ConstraintFactory::of::<BoolRouteConstraint>()),
        ("double", ConstraintFactory::of::<DoubleRouteConstraint>()),
        ("float", ConstraintFactory::of::<FloatRouteConstraint>()),
        ("guid", ConstraintFactory::of::<GuidRouteConstraint>()),
        ("alpha", ConstraintFactory::of::<AlphaRouteConstraint>()),
        ("required", ConstraintFactory::of::<RequiredRouteConstraint>()),
        ("minlength", ConstraintFactory::of::<MinLengthRouteConstraint>()),
        ("maxlength", ConstraintFactory::of::<MaxLengthRouteConstraint>()),
        ("length", ConstraintFactory::of::<LengthRouteConstraint>()),
        ("min", ConstraintFactory::of::<MinRouteConstraint>()),
        ("max", ConstraintFactory::of::<MaxRouteConstraint>()),
        ("range", ConstraintFactory::of::<RangeRouteConstraint>()),
        ("regex", ConstraintFactory::of::<RegexRouteConstraint>()),
    ]
}

/// Implements a constraint that only inspects the value text.
macro_rules! text_constraint {
    ($name:ident, |$text:ident| $body:expr) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl RouteConstraint for $name {
            fn matches(
                &self,
                _request: Option<&RequestContext>,
                route_key: &str,
                values: &RouteValueDictionary,
                _direction: RouteDirection,
            ) -> bool {
                match value_text(values, route_key) {
                    Some($text) => $body,
                    None => false,
                }
            }
        }

        impl ConstructConstraint for $name {
            fn construct(args: &ConstraintArgs<'_>) -> Result<Self, String> {
                args.expect_none()?;
                Ok($name)
            }
        }
    };
}

text_constraint!(IntRouteConstraint, |text| text.parse::<i32>().is_ok());
text_constraint!(LongRouteConstraint, |text| text.parse::<i64>().is_ok());
text_constraint!(BoolRouteConstraint, |text| {
    let text = text.trim();
    text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false")
});
text_constraint!(DoubleRouteConstraint, |text| text.parse::<f64>().is_ok());
text_constraint!(FloatRouteConstraint, |text| text.parse::<f32>().is_ok());
text_constraint!(GuidRouteConstraint, |text| Uuid::parse_str(&text).is_ok());
text_constraint!(AlphaRouteConstraint, |text| text
    .chars()
    .all(|c| c.is_ascii_alphabetic()));
text_constraint!(RequiredRouteConstraint, |text| !text.is_empty());

fn parse_arg<T: std::str::FromStr>(text: &str, what: &str) -> Result<T, String> {
    text.parse::<T>()
        .map_err(|_| format!("{} must be a number, got '{}'", what, text))
}

/// Minimum string length, in characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLengthRouteConstraint {
    pub min_length: usize,
}

impl RouteConstraint for MinLengthRouteConstraint {
    fn matches(
        &self,
        _request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        _direction: RouteDirection,
    ) -> bool {
        value_text(values, route_key).is_some_and(|text| text.chars().count() >= self.min_length)
    }
}

impl ConstructConstraint for MinLengthRouteConstraint {
    fn construct(args: &ConstraintArgs<'_>) -> Result<Self, String> {
        let [min] = args.exactly::<1>()?;
        Ok(Self {
            min_length: parse_arg(min, "minimum length")?,
        })
    }
}

/// Maximum string length, in characters.
#[derive(Debug, Clone, Copy)]
pub struct MaxLengthRouteConstraint {
    pub max_length: usize,
}

impl RouteConstraint for MaxLengthRouteConstraint {
    fn matches(
        &self,
        _request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        _direction: RouteDirection,
    ) -> bool {
        value_text(values, route_key).is_some_and(|text| text.chars().count() <= self.max_length)
    }
}

impl ConstructConstraint for MaxLengthRouteConstraint {
    fn construct(args: &ConstraintArgs<'_>) -> Result<Self, String> {
        let [max] = args.exactly::<1>()?;
        Ok(Self {
            max_length: parse_arg(max, "maximum length")?,
        })
    }
}

/// Exact length `length(n)` or inclusive range `length(min,max)`.
#[derive(Debug, Clone, Copy)]
pub struct LengthRouteConstraint {
    pub min_length: usize,
    pub max_length: usize,
}

impl LengthRouteConstraint {
    pub fn exact(length: usize) -> Self {
        Self {
            min_length: length,
            max_length: length,
        }
    }

    pub fn between(min_length: usize, max_length: usize) -> Result<Self, String> {
        if min_length > max_length {
            return Err(format!(
                "minimum length {} is greater than maximum length {}",
                min_length, max_length
            ));
        }
        Ok(Self {
            min_length,
            max_length,
        })
    }
}

impl RouteConstraint for LengthRouteConstraint {
    fn matches(
        &self,
        _request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        _direction: RouteDirection,
    ) -> bool {
        value_text(values, route_key).is_some_and(|text| {
            let length = text.chars().count();
            length >= self.min_length && length <= self.max_length
        })
    }
}

impl ConstructConstraint for LengthRouteConstraint {
    fn construct(args: &ConstraintArgs<'_>) -> Result<Self, String> {
        match args.positional().as_slice() {
            [length] => Ok(Self::exact(parse_arg(length, "length")?)),
            [min, max] => Self::between(
                parse_arg(min, "minimum length")?,
                parse_arg(max, "maximum length")?,
            ),
            other => Err(format!("expected 1 or 2 arguments, got {}", other.len())),
        }
    }
}

/// Integer value at least `min`.
#[derive(Debug, Clone, Copy)]
pub struct MinRouteConstraint {
    pub min: i64,
}

impl MinRouteConstraint {
    pub fn new(min: i64) -> Self {
        Self { min }
    }
}

impl RouteConstraint for MinRouteConstraint {
    fn matches(
        &self,
        _request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        _direction: RouteDirection,
    ) -> bool {
        value_text(values, route_key)
            .and_then(|text| text.parse::<i64>().ok())
            .is_some_and(|value| value >= self.min)
    }
}

impl ConstructConstraint for MinRouteConstraint {
    fn construct(args: &ConstraintArgs<'_>) -> Result<Self, String> {
        let [min] = args.exactly::<1>()?;
        Ok(Self::new(parse_arg(min, "minimum")?))
    }
}

/// Integer value at most `max`.
#[derive(Debug, Clone, Copy)]
pub struct MaxRouteConstraint {
    pub max: i64,
}

impl MaxRouteConstraint {
    pub fn new(max: i64) -> Self {
        Self { max }
    }
}

impl RouteConstraint for MaxRouteConstraint {
    fn matches(
        &self,
        _request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        _direction: RouteDirection,
    ) -> bool {
        value_text(values, route_key)
            .and_then(|text| text.parse::<i64>().ok())
            .is_some_and(|value| value <= self.max)
    }
}

impl ConstructConstraint for MaxRouteConstraint {
    fn construct(args: &ConstraintArgs<'_>) -> Result<Self, String> {
        let [max] = args.exactly::<1>()?;
        Ok(Self::new(parse_arg(max, "maximum")?))
    }
}

/// Integer value within `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct RangeRouteConstraint {
    pub min: i64,
    pub max: i64,
}

impl RangeRouteConstraint {
    pub fn new(min: i64, max: i64) -> Result<Self, String> {
        if min > max {
            return Err(format!("minimum {} is greater than maximum {}", min, max));
        }
        Ok(Self { min, max })
    }
}

impl RouteConstraint for RangeRouteConstraint {
    fn matches(
        &self,
        _request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        _direction: RouteDirection,
    ) -> bool {
        value_text(values, route_key)
            .and_then(|text| text.parse::<i64>().ok())
            .is_some_and(|value| value >= self.min && value <= self.max)
    }
}

impl ConstructConstraint for RangeRouteConstraint {
    fn construct(args: &ConstraintArgs<'_>) -> Result<Self, String> {
        let [min, max] = args.exactly::<2>()?;
        Self::new(parse_arg(min, "minimum")?, parse_arg(max, "maximum")?)
    }
}

/// Case-insensitive, unanchored regular expression.
#[derive(Debug, Clone)]
pub struct RegexRouteConstraint {
    regex: Regex,
}

impl RegexRouteConstraint {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { regex })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl RouteConstraint for RegexRouteConstraint {
    fn matches(
        &self,
        _request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        _direction: RouteDirection,
    ) -> bool {
        value_text(values, route_key).is_some_and(|text| self.regex.is_match(&text))
    }
}

impl ConstructConstraint for RegexRouteConstraint {
    // The pattern may itself contain commas, so the raw text is used unsplit.
    fn construct(args: &ConstraintArgs<'_>) -> Result<Self, String> {
        let pattern = args
            .raw()
            .ok_or_else(|| "a regular expression argument is required".to_string())?;
        Self::new(pattern).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::values::RouteValue;

    fn check(constraint: &dyn RouteConstraint, value: impl Into<RouteValue>) -> bool {
        let values: RouteValueDictionary = [("p", value.into())].into_iter().collect();
        constraint.matches(None, "p", &values, RouteDirection::IncomingRequest)
    }

    fn build<C: ConstructConstraint>(raw: &str) -> Result<C, String> {
        C::construct(&ConstraintArgs::new(raw))
    }

    #[test]
    fn test_missing_value_never_matches() {
        let empty = RouteValueDictionary::new();
        let dir = RouteDirection::IncomingRequest;
        assert!(!IntRouteConstraint.matches(None, "p", &empty, dir));
        assert!(!AlphaRouteConstraint.matches(None, "p", &empty, dir));
        assert!(!RequiredRouteConstraint.matches(None, "p", &empty, dir));
    }

    #[test]
    fn test_numeric_types() {
        assert!(check(&IntRouteConstraint, "42"));
        assert!(check(&IntRouteConstraint, 42));
        assert!(!check(&IntRouteConstraint, "4000000000"));
        assert!(check(&LongRouteConstraint, "4000000000"));
        assert!(check(&DoubleRouteConstraint, "3.25"));
        assert!(check(&FloatRouteConstraint, "-1.5"));
        assert!(!check(&DoubleRouteConstraint, "abc"));
    }

    #[test]
    fn test_bool_and_guid() {
        assert!(check(&BoolRouteConstraint, "TRUE"));
        assert!(check(&BoolRouteConstraint, true));
        assert!(!check(&BoolRouteConstraint, "yes"));
        assert!(check(&GuidRouteConstraint, "67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(!check(&GuidRouteConstraint, "67e55044"));
    }

    #[test]
    fn test_alpha_and_required() {
        assert!(check(&AlphaRouteConstraint, "Hello"));
        assert!(!check(&AlphaRouteConstraint, "hello1"));
        assert!(check(&RequiredRouteConstraint, "x"));
        assert!(!check(&RequiredRouteConstraint, ""));
    }

    #[test]
    fn test_length_family() {
        let min: MinLengthRouteConstraint = build("3").unwrap();
        assert!(check(&min, "abc"));
        assert!(!check(&min, "ab"));

        let max: MaxLengthRouteConstraint = build("2").unwrap();
        assert!(check(&max, "ab"));
        assert!(!check(&max, "abc"));

        let exact: LengthRouteConstraint = build("4").unwrap();
        assert!(check(&exact, "über"));
        assert!(!check(&exact, "uber!"));

        let between: LengthRouteConstraint = build("2, 3").unwrap();
        assert!(check(&between, "abc"));
        assert!(!check(&between, "a"));

        assert!(build::<LengthRouteConstraint>("5,2").is_err());
        assert!(build::<LengthRouteConstraint>("1,2,3").is_err());
    }

    #[test]
    fn test_min_max_range() {
        let range: RangeRouteConstraint = build("1,100").unwrap();
        assert!(check(&range, "1"));
        assert!(check(&range, 100));
        assert!(!check(&range, "101"));
        assert!(!check(&range, "x"));

        assert!(check(&MinRouteConstraint::new(5), "5"));
        assert!(!check(&MaxRouteConstraint::new(5), "6"));

        assert!(build::<RangeRouteConstraint>("10,1").is_err());
        assert!(build::<RangeRouteConstraint>("1").is_err());
        assert!(build::<MinRouteConstraint>("one").is_err());
    }

    #[test]
    fn test_regex_is_case_insensitive_and_unanchored() {
        let constraint: RegexRouteConstraint = build(r"^[a-z]{2,3}$").unwrap();
        assert_eq!(constraint.pattern(), r"^[a-z]{2,3}$");
        assert!(check(&constraint, "AbC"));
        assert!(!check(&constraint, "abcd"));

        let unanchored = RegexRouteConstraint::new(r"\d").unwrap();
        assert!(check(&unanchored, "abc1def"));

        assert!(build::<RegexRouteConstraint>("(").is_err());
        assert!(RegexRouteConstraint::construct(&ConstraintArgs::none()).is_err());
    }

    #[test]
    fn test_argumentless_constraints_reject_arguments() {
        assert!(build::<IntRouteConstraint>("5").is_err());
        assert!(IntRouteConstraint::construct(&ConstraintArgs::none()).is_ok());
    }
}
