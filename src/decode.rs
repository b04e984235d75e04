use crate::registry::{TypeCategory, TypeName};
use crate::types::{Keyword, Value};

/// Convert one non-NULL cell from its text form using the column's resolved type.
///
/// # Errors
/// Returns a reason string when the text does not have the shape the type
/// promises; callers attach row and column context.
pub(crate) fn decode_text(type_name: &TypeName, raw: &str) -> Result<Value, String> {
    match type_name.category() {
        TypeCategory::Integer => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| format!("'{raw}' is not an integer: {e}")),
        TypeCategory::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| format!("'{raw}' is not a number: {e}")),
        TypeCategory::Boolean => match raw {
            "t" => Ok(Value::Bool(true)),
            "f" => Ok(Value::Bool(false)),
            other => Err(format!("'{other}' is not a boolean")),
        },
        TypeCategory::Name => Ok(Value::Keyword(Keyword::new(raw))),
        TypeCategory::Text => Ok(Value::Text(raw.to_string())),
    }
}

/// Like [`decode_text`], with `None` standing for database NULL.
pub(crate) fn decode_cell(type_name: &TypeName, raw: Option<&str>) -> Result<Value, String> {
    match raw {
        None => Ok(Value::Null),
        Some(text) => decode_text(type_name, text),
    }
}
