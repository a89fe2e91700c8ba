//! Path descent and result shaping for JSON values.
//!
//! Paths are slash-separated. A literal slash inside a segment is written as
//! `!/`. Object segments select keys; array segments must be decimal indices.

use serde_json::Value;

use crate::errors::GatewayError;

/// Splits a path expression into its segments.
///
/// Empty segments are dropped, so `a//b` and `/a/b/` both select `a` then `b`.
pub fn parse_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '!' if chars.peek() == Some(&'/') => {
                current.push('/');
                chars.next();
            }
            '/' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Returns the inner value selected by `path`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidPath`] when a segment does not resolve.
pub fn extract_path(value: Value, path: &str) -> Result<Value, GatewayError> {
    let mut current = value;
    for segment in parse_path(path) {
        current = match current {
            Value::Object(mut map) => map.remove(&segment).ok_or_else(|| {
                GatewayError::invalid_path(path, format!("no key '{segment}'"))
            })?,
            Value::Array(mut items) => {
                let index = array_index(path, &segment, items.len())?;
                items.swap_remove(index)
            }
            _ => {
                return Err(GatewayError::invalid_path(
                    path,
                    format!("cannot descend into a scalar at '{segment}'"),
                ));
            }
        };
    }
    Ok(current)
}

/// Replaces the inner value selected by `path` and returns what it held.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidPath`] when the path is empty or a segment
/// does not resolve. The final object segment may name a new key.
pub fn replace_at_path(root: &mut Value, path: &str, new_value: Value) -> Result<Value, GatewayError> {
    let segments = parse_path(path);
    let Some((last, parents)) = segments.split_last() else {
        return Err(GatewayError::invalid_path(path, "path selects nothing"));
    };

    let mut current = root;
    for segment in parents {
        current = match current {
            Value::Object(map) => map.get_mut(segment).ok_or_else(|| {
                GatewayError::invalid_path(path, format!("no key '{segment}'"))
            })?,
            Value::Array(items) => {
                let index = array_index(path, segment, items.len())?;
                items.get_mut(index).ok_or_else(|| {
                    GatewayError::invalid_path(path, format!("index {index} out of range"))
                })?
            }
            _ => {
                return Err(GatewayError::invalid_path(
                    path,
                    format!("cannot descend into a scalar at '{segment}'"),
                ));
            }
        };
    }

    match current {
        Value::Object(map) => Ok(map.insert(last.clone(), new_value).unwrap_or(Value::Null)),
        Value::Array(items) => {
            let index = array_index(path, last, items.len())?;
            let slot = items.get_mut(index).ok_or_else(|| {
                GatewayError::invalid_path(path, format!("index {index} out of range"))
            })?;
            Ok(std::mem::replace(slot, new_value))
        }
        _ => Err(GatewayError::invalid_path(
            path,
            format!("cannot assign '{last}' on a scalar"),
        )),
    }
}

fn array_index(path: &str, segment: &str, len: usize) -> Result<usize, GatewayError> {
    let index: usize = segment.parse().map_err(|_| {
        GatewayError::invalid_path(path, format!("'{segment}' is not an array index"))
    })?;
    if index >= len {
        return Err(GatewayError::invalid_path(
            path,
            format!("index {index} out of range for {len} elements"),
        ));
    }
    Ok(index)
}

/// Applies path descent and serialisation limits to handler results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueConverter {
    max_depth: Option<usize>,
    max_collection_size: Option<usize>,
}

impl ValueConverter {
    /// Creates a converter. `None` disables the respective limit.
    pub fn new(max_depth: Option<usize>, max_collection_size: Option<usize>) -> Self {
        Self {
            max_depth,
            max_collection_size,
        }
    }

    /// Shapes a handler result for the response envelope.
    ///
    /// When `apply_path` is set the request path, if any, selects an inner
    /// value first. Limits are applied to whatever remains.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPath`] when the path does not resolve.
    pub fn convert(
        &self,
        value: Value,
        path: Option<&str>,
        apply_path: bool,
    ) -> Result<Value, GatewayError> {
        let selected = match path {
            Some(path) if apply_path => extract_path(value, path)?,
            _ => value,
        };
        Ok(self.limit(selected, 0))
    }

    fn limit(&self, value: Value, depth: usize) -> Value {
        let compound = matches!(value, Value::Array(_) | Value::Object(_));
        if compound && self.max_depth.is_some_and(|max| depth >= max) {
            return Value::String(value.to_string());
        }
        let keep = self.max_collection_size.unwrap_or(usize::MAX);
        match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .take(keep)
                    .map(|item| self.limit(item, depth + 1))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .take(keep)
                    .map(|(key, item)| (key, self.limit(item, depth + 1)))
                    .collect(),
            ),
            scalar => scalar,
        }
    }
}
