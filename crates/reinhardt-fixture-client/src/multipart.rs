//! Form field flattening and `multipart/form-data` encoding.
//!
//! Nested request data is flattened with bracket notation, so
//! `{"address": {"city": "Aarhus"}, "tags": ["a"]}` becomes the fields
//! `address[city]=Aarhus` and `tags[0]=a`. File paths are flattened the same
//! way.

use bytes::{BufMut, Bytes, BytesMut};
use reinhardt_fixture_builder::Files;
use serde_json::{Map, Value};

/// Flattens request data into ordered form fields.
///
/// Strings are sent as-is, `null` as an empty string, other scalars in their
/// JSON form. Empty mappings and arrays produce no field.
///
/// # Examples
///
/// ```
/// use reinhardt_fixture_client::multipart::flatten_fields;
/// use serde_json::json;
///
/// let data = json!({"name": "Luke", "address": {"city": "Aarhus"}, "tags": ["a", "b"]});
/// let fields = flatten_fields(data.as_object().unwrap());
/// assert!(fields.contains(&("address[city]".to_string(), "Aarhus".to_string())));
/// assert!(fields.contains(&("tags[1]".to_string(), "b".to_string())));
/// ```
pub fn flatten_fields(data: &Map<String, Value>) -> Vec<(String, String)> {
	let mut fields = Vec::new();
	for (key, value) in data {
		flatten_value(key.clone(), value, &mut fields);
	}
	fields
}

fn flatten_value(name: String, value: &Value, fields: &mut Vec<(String, String)>) {
	match value {
		Value::Object(map) => {
			for (key, inner) in map {
				flatten_value(format!("{}[{}]", name, key), inner, fields);
			}
		}
		Value::Array(items) => {
			for (index, inner) in items.iter().enumerate() {
				flatten_value(format!("{}[{}]", name, index), inner, fields);
			}
		}
		Value::String(s) => fields.push((name, s.clone())),
		Value::Null => fields.push((name, String::new())),
		other => fields.push((name, other.to_string())),
	}
}

/// Converts a dot-path such as `documents.cv` into `documents[cv]`.
pub fn field_name(path: &str) -> String {
	let mut segments = path.split('.');
	let mut name = segments.next().unwrap_or_default().to_string();
	for segment in segments {
		name.push('[');
		name.push_str(segment);
		name.push(']');
	}
	name
}

/// Encodes form `fields` followed by `files` as a multipart body.
pub fn encode(fields: &[(String, String)], files: &Files, boundary: &str) -> Bytes {
	let mut body = BytesMut::new();
	for (name, value) in fields {
		put_boundary(&mut body, boundary);
		body.put_slice(
			format!(
				"Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
				quote(name)
			)
			.as_bytes(),
		);
		body.put_slice(value.as_bytes());
		body.put_slice(b"\r\n");
	}
	for (path, file) in files.flatten() {
		put_boundary(&mut body, boundary);
		body.put_slice(
			format!(
				"Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
				quote(&field_name(&path)),
				quote(file.file_name()),
				file.content_type()
			)
			.as_bytes(),
		);
		body.put_slice(file.content());
		body.put_slice(b"\r\n");
	}
	body.put_slice(format!("--{}--\r\n", boundary).as_bytes());
	body.freeze()
}

fn put_boundary(body: &mut BytesMut, boundary: &str) {
	body.put_slice(format!("--{}\r\n", boundary).as_bytes());
}

fn quote(value: &str) -> String {
	value.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}
