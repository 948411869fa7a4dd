// self
use crate::_prelude::*;

/// Removes `null` and empty string/array/object entries from `map`, recursing into nested
/// objects first so objects that end up empty are removed as well. Arrays are not descended.
pub fn prune(map: &mut JsonMap<String, JsonValue>) {
	map.retain(|_, value| {
		if let JsonValue::Object(inner) = value {
			prune(inner);
		}

		!is_blank(value)
	});
}

/// Prunes a standalone value, returning `None` when nothing is left.
pub fn prune_value(mut value: JsonValue) -> Option<JsonValue> {
	if let JsonValue::Object(inner) = &mut value {
		prune(inner);
	}

	if is_blank(&value) { None } else { Some(value) }
}

fn is_blank(value: &JsonValue) -> bool {
	match value {
		JsonValue::Null => true,
		JsonValue::String(text) => text.is_empty(),
		JsonValue::Array(items) => items.is_empty(),
		JsonValue::Object(entries) => entries.is_empty(),
		JsonValue::Bool(_) | JsonValue::Number(_) => false,
	}
}
