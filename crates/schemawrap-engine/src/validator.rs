use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::value::Loaded;

type CustomCheck = dyn Fn(&Loaded, &Map<String, Value>) -> Result<(), String> + Send + Sync;

/// Post-deserialization check attached to a field.
///
/// Validators only see values that already deserialized; every validator
/// on a field runs and all their messages are reported together.
#[derive(Clone)]
pub enum Validator {
    /// Character count for strings, item count for lists and objects.
    Length {
        min: Option<usize>,
        max: Option<usize>,
        equal: Option<usize>,
    },
    /// Numeric bounds.
    Range {
        min: Option<f64>,
        max: Option<f64>,
        min_inclusive: bool,
        max_inclusive: bool,
    },
    /// The value must equal one of the choices.
    OneOf(Vec<Value>),
    /// Caller-supplied check returning its own message. It also receives
    /// the context of the schema being loaded.
    Custom {
        name: String,
        check: Arc<CustomCheck>,
    },
}

impl Validator {
    /// Inclusive length bounds.
    pub fn length(min: usize, max: usize) -> Self {
        Self::Length {
            min: Some(min),
            max: Some(max),
            equal: None,
        }
    }

    pub fn min_length(min: usize) -> Self {
        Self::Length {
            min: Some(min),
            max: None,
            equal: None,
        }
    }

    pub fn max_length(max: usize) -> Self {
        Self::Length {
            min: None,
            max: Some(max),
            equal: None,
        }
    }

    /// Exact length.
    pub fn length_equal(equal: usize) -> Self {
        Self::Length {
            min: None,
            max: None,
            equal: Some(equal),
        }
    }

    /// Inclusive numeric bounds.
    pub fn range(min: f64, max: f64) -> Self {
        Self::range_with(Some(min), Some(max), true, true)
    }

    /// Numeric bounds with explicit inclusivity.
    pub fn range_with(
        min: Option<f64>,
        max: Option<f64>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Self {
        Self::Range {
            min,
            max,
            min_inclusive,
            max_inclusive,
        }
    }

    pub fn one_of<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::OneOf(choices.into_iter().map(Into::into).collect())
    }

    pub fn custom<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Loaded, &Map<String, Value>) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Check a loaded value with an empty context; `Err` carries the
    /// message to report.
    pub fn check(&self, value: &Loaded) -> Result<(), String> {
        self.check_in(value, &Map::new())
    }

    /// Check a loaded value against a schema context.
    pub fn check_in(&self, value: &Loaded, context: &Map<String, Value>) -> Result<(), String> {
        match self {
            Self::Length { min, max, equal } => check_length(value, *min, *max, *equal),
            Self::Range {
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => check_range(value, *min, *max, *min_inclusive, *max_inclusive),
            Self::OneOf(choices) => check_one_of(value, choices),
            Self::Custom { check, .. } => check(value, context),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { min, max, equal } => f
                .debug_struct("Length")
                .field("min", min)
                .field("max", max)
                .field("equal", equal)
                .finish(),
            Self::Range {
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .field("min_inclusive", min_inclusive)
                .field("max_inclusive", max_inclusive)
                .finish(),
            Self::OneOf(choices) => f.debug_tuple("OneOf").field(choices).finish(),
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

fn check_length(
    value: &Loaded,
    min: Option<usize>,
    max: Option<usize>,
    equal: Option<usize>,
) -> Result<(), String> {
    // Unsized values (numbers, booleans, timestamps) have no length to check.
    let Some(len) = value.size() else {
        return Ok(());
    };

    if let Some(equal) = equal {
        if len != equal {
            return Err(format!("Length must be {equal}."));
        }
        return Ok(());
    }

    let too_short = min.is_some_and(|min| len < min);
    let too_long = max.is_some_and(|max| len > max);
    if !too_short && !too_long {
        return Ok(());
    }

    let message = match (min, max) {
        (Some(min), Some(max)) => format!("Length must be between {min} and {max}."),
        (Some(min), None) => format!("Shorter than minimum length {min}."),
        (None, Some(max)) => format!("Longer than maximum length {max}."),
        (None, None) => return Ok(()),
    };
    Err(message)
}

fn check_range(
    value: &Loaded,
    min: Option<f64>,
    max: Option<f64>,
    min_inclusive: bool,
    max_inclusive: bool,
) -> Result<(), String> {
    let Some(number) = value.as_f64() else {
        return Ok(());
    };

    let below = min.is_some_and(|min| {
        if min_inclusive {
            number < min
        } else {
            number <= min
        }
    });
    let above = max.is_some_and(|max| {
        if max_inclusive {
            number > max
        } else {
            number >= max
        }
    });
    if !below && !above {
        return Ok(());
    }

    let min_op = if min_inclusive {
        "greater than or equal to"
    } else {
        "greater than"
    };
    let max_op = if max_inclusive {
        "less than or equal to"
    } else {
        "less than"
    };

    let message = match (min, max) {
        (Some(min), Some(max)) => format!("Must be {min_op} {min} and {max_op} {max}."),
        (Some(min), None) => format!("Must be {min_op} {min}."),
        (None, Some(max)) => format!("Must be {max_op} {max}."),
        (None, None) => return Ok(()),
    };
    Err(message)
}

fn check_one_of(value: &Loaded, choices: &[Value]) -> Result<(), String> {
    let candidate = value.to_json();
    if choices.iter().any(|choice| loosely_equal(choice, &candidate)) {
        return Ok(());
    }

    let rendered: Vec<String> = choices
        .iter()
        .map(|choice| match choice {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect();
    Err(format!("Must be one of: {}.", rendered.join(", ")))
}

// 1 and 1.0 count as the same choice.
fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text(value: &str) -> Loaded {
        Loaded::Str(value.to_string())
    }

    #[test]
    fn length_between_bounds() {
        let validator = Validator::length(2, 64);
        assert!(validator.check(&text("ok")).is_ok());
        assert_eq!(
            validator.check(&text("")),
            Err("Length must be between 2 and 64.".to_string())
        );
        assert_eq!(
            validator.check(&text(&"x".repeat(65))),
            Err("Length must be between 2 and 64.".to_string())
        );
    }

    #[test]
    fn length_one_sided_messages() {
        assert_eq!(
            Validator::min_length(3).check(&text("ab")),
            Err("Shorter than minimum length 3.".to_string())
        );
        assert_eq!(
            Validator::max_length(1).check(&Loaded::List(vec![Loaded::Null, Loaded::Null])),
            Err("Longer than maximum length 1.".to_string())
        );
        assert_eq!(
            Validator::length_equal(4).check(&text("abc")),
            Err("Length must be 4.".to_string())
        );
    }

    #[test]
    fn length_ignores_unsized_values() {
        assert!(Validator::length(1, 2).check(&Loaded::Int(100)).is_ok());
    }

    #[test]
    fn range_messages() {
        let validator = Validator::range(0.0, 100.0);
        assert!(validator.check(&Loaded::Int(100)).is_ok());
        assert_eq!(
            validator.check(&Loaded::Int(101)),
            Err("Must be greater than or equal to 0 and less than or equal to 100.".to_string())
        );

        let exclusive = Validator::range_with(Some(0.0), None, false, true);
        assert_eq!(
            exclusive.check(&Loaded::Int(0)),
            Err("Must be greater than 0.".to_string())
        );
        assert_eq!(
            Validator::range_with(None, Some(1.5), true, true).check(&Loaded::Float(2.0)),
            Err("Must be less than or equal to 1.5.".to_string())
        );
    }

    #[test]
    fn one_of_matches_numbers_loosely() {
        let validator = Validator::one_of([json!("a"), json!(1)]);
        assert!(validator.check(&text("a")).is_ok());
        assert!(validator.check(&Loaded::Float(1.0)).is_ok());
        assert_eq!(
            validator.check(&text("b")),
            Err("Must be one of: a, 1.".to_string())
        );
    }

    #[test]
    fn custom_validator_reports_its_message() {
        let validator = Validator::custom("even", |value, _| match value.as_i64() {
            Some(n) if n % 2 == 0 => Ok(()),
            _ => Err("Must be even.".to_string()),
        });
        assert!(validator.check(&Loaded::Int(4)).is_ok());
        assert_eq!(validator.check(&Loaded::Int(3)), Err("Must be even.".to_string()));
        assert!(format!("{validator:?}").contains("even"));
    }

    #[test]
    fn custom_validator_reads_context() {
        let validator = Validator::custom("below_limit", |value, context| {
            let limit = context.get("limit").and_then(Value::as_i64).unwrap_or(i64::MAX);
            match value.as_i64() {
                Some(n) if n <= limit => Ok(()),
                _ => Err(format!("Must be at most {limit}.")),
            }
        });
        let mut context = Map::new();
        context.insert("limit".to_string(), Value::from(10));

        assert!(validator.check_in(&Loaded::Int(10), &context).is_ok());
        assert_eq!(
            validator.check_in(&Loaded::Int(11), &context),
            Err("Must be at most 10.".to_string())
        );
        assert!(validator.check(&Loaded::Int(11)).is_ok());
    }

    #[test]
    fn validators_without_bounds_pass() {
        let validator = Validator::Length {
            min: None,
            max: None,
            equal: None,
        };
        assert!(validator.check(&Loaded::Str(String::new())).is_ok());

        let unbounded = Validator::range_with(None, None, true, true);
        assert!(unbounded.check(&Loaded::Int(-5)).is_ok());
    }
}
