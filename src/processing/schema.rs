/*! Record schema

The schema is a JSON Schema document kept next to the index (`index/sample.schema.json`).
It is loaded once per run and every record is checked against it before being trusted.

The document can be (re)generated from [SampleRecord] with [Schema::generated],
which is what the `schema` command writes out.

`$ref`s are either local (`#/definitions/...`) or name another document
relative to the schema's directory (`annotation.schema.json`, `annotation.schema.json#/definitions/x`).
Referenced documents are read when the schema is loaded.

Understood keywords:
- types and values: `type`, `enum`, `const`, `format: date`, `pattern`,
  `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum` (boolean or numeric), `multipleOf`,
  `minLength`, `maxLength`
- objects: `required`, `properties`, `patternProperties`, `additionalProperties`,
  `minProperties`, `maxProperties`, `dependencies`
- arrays: `items` (single schema), `minItems`, `maxItems`, `uniqueItems`
- combinators: `allOf`, `anyOf`, `oneOf`, `not`

A schema using any other keyword is refused when loaded: a rule that is silently ignored
would let invalid records through.
!*/
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::io::to_canonical_string;
use crate::types::{SampleRecord, Violation};

/// field name used for violations about the record itself.
const ROOT: &str = "(record)";

/// Keywords that carry no validation rule.
const ANNOTATIONS: [&str; 12] = [
    "$schema",
    "$id",
    "id",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
    "readOnly",
    "writeOnly",
    "deprecated",
    "format",
];

/// Keywords whose value is not a schema.
const ASSERTIONS: [&str; 16] = [
    "type",
    "enum",
    "const",
    "required",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minProperties",
    "maxProperties",
];

#[derive(Debug, Clone)]
pub struct Schema {
    root: Value,
    /// referenced documents, by the name used in `$ref`
    external: HashMap<String, Value>,
    /// compiled `pattern` and `patternProperties` expressions
    patterns: HashMap<String, Regex>,
}

/// What a pass over a schema document found.
#[derive(Default)]
struct Inspection {
    patterns: HashMap<String, Regex>,
    documents: Vec<String>,
}

impl Inspection {
    fn compile(&mut self, pattern: &str) -> Result<(), Error> {
        if !self.patterns.contains_key(pattern) {
            let re = Regex::new(pattern)
                .map_err(|e| Error::Config(format!("invalid schema pattern {:?}: {}", pattern, e)))?;
            self.patterns.insert(pattern.to_string(), re);
        }
        Ok(())
    }

    /// Check that every keyword of `schema` (and its subschemas) is understood.
    fn inspect(&mut self, schema: &Value, at: &str) -> Result<(), Error> {
        let schema = match schema {
            Value::Bool(_) => return Ok(()),
            Value::Object(schema) => schema,
            _ => {
                return Err(Error::Config(format!(
                    "schema at {} is neither an object nor a boolean",
                    at
                )))
            }
        };

        for (key, value) in schema {
            let here = format!("{}/{}", at, key);
            match key.as_str() {
                "properties" | "patternProperties" | "definitions" | "$defs" => {
                    let subschemas = value.as_object().ok_or_else(|| {
                        Error::Config(format!("{} must be an object", here))
                    })?;
                    for (name, sub) in subschemas {
                        if key == "patternProperties" {
                            self.compile(name)?;
                        }
                        self.inspect(sub, &format!("{}/{}", here, name))?;
                    }
                }
                "dependencies" => {
                    let dependencies = value.as_object().ok_or_else(|| {
                        Error::Config(format!("{} must be an object", here))
                    })?;
                    for (name, dependency) in dependencies {
                        if !dependency.is_array() {
                            self.inspect(dependency, &format!("{}/{}", here, name))?;
                        }
                    }
                }
                "items" if value.is_array() => {
                    return Err(Error::Config(format!(
                        "unsupported schema keyword at {}: tuple items",
                        here
                    )))
                }
                "items" | "additionalProperties" | "not" => self.inspect(value, &here)?,
                "allOf" | "anyOf" | "oneOf" => {
                    let alternatives = value.as_array().ok_or_else(|| {
                        Error::Config(format!("{} must be an array", here))
                    })?;
                    for (i, sub) in alternatives.iter().enumerate() {
                        self.inspect(sub, &format!("{}/{}", here, i))?;
                    }
                }
                "pattern" => {
                    let pattern = value
                        .as_str()
                        .ok_or_else(|| Error::Config(format!("{} must be a string", here)))?;
                    self.compile(pattern)?;
                }
                "$ref" => {
                    let reference = value
                        .as_str()
                        .ok_or_else(|| Error::Config(format!("{} must be a string", here)))?;
                    let document = split_reference(reference).0;
                    if !document.is_empty() {
                        self.documents.push(document.to_string());
                    }
                }
                k if ANNOTATIONS.contains(&k) || ASSERTIONS.contains(&k) => (),
                other => {
                    return Err(Error::Config(format!(
                        "unsupported schema keyword \"{}\" at {}",
                        other, at
                    )))
                }
            }
        }
        Ok(())
    }
}

/// `document.json#/pointer` -> (`document.json`, `/pointer`)
fn split_reference(reference: &str) -> (&str, &str) {
    reference.split_once('#').unwrap_or((reference, ""))
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn field_name(path: &str) -> String {
    if path.is_empty() {
        ROOT.to_string()
    } else {
        path.to_string()
    }
}

fn type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_matches(expected: &str, instance: &Value) -> bool {
    match expected {
        "integer" => match instance {
            Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().map_or(false, |f| f.fract() == 0.0),
            _ => false,
        },
        "number" => instance.is_number(),
        other => other == type_name(instance),
    }
}

impl Schema {
    /// Wrap a self-contained schema document.
    ///
    /// References to other documents cannot be resolved without a directory, use [Schema::load] for those.
    pub fn from_value(root: Value) -> Result<Self, Error> {
        let mut inspection = Inspection::default();
        inspection.inspect(&root, "#")?;
        if let Some(document) = inspection.documents.first() {
            return Err(Error::Config(format!(
                "cannot resolve schema reference to {} without a schema directory",
                document
            )));
        }

        Ok(Self {
            root,
            external: HashMap::new(),
            patterns: inspection.patterns,
        })
    }

    /// Load the schema document, and the documents it references (relative to its directory).
    ///
    /// A missing, invalid or unsupported document is a configuration error.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let root = read_document(path)?;

        let mut inspection = Inspection::default();
        inspection.inspect(&root, "#")?;

        let mut external = HashMap::new();
        while let Some(document) = inspection.documents.pop() {
            if external.contains_key(&document) {
                continue;
            }
            let value = read_document(&directory.join(&document))?;
            inspection.inspect(&value, &format!("{}#", document))?;
            external.insert(document, value);
        }

        debug!(
            "loaded schema from {:?} ({} referenced documents)",
            path,
            external.len()
        );
        Ok(Self {
            root,
            external,
            patterns: inspection.patterns,
        })
    }

    /// Schema derived from the [SampleRecord] type.
    pub fn generated() -> Self {
        let schema = schemars::schema_for!(SampleRecord);
        // a RootSchema always serializes to an object
        let root = serde_json::to_value(schema).unwrap_or(Value::Bool(true));
        Self {
            root,
            external: HashMap::new(),
            patterns: HashMap::new(),
        }
    }

    /// Canonical textual form of the schema document.
    pub fn to_pretty_string(&self) -> Result<String, Error> {
        to_canonical_string(&self.root)
    }

    /// Check `instance` against the schema, returning every violation found.
    pub fn validate(&self, instance: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.check(&self.root, &self.root, instance, "", &mut violations);
        violations
    }

    /// Resolve a reference made from `document`.
    /// Returns the document the target lives in along with the target.
    fn resolve<'s>(&'s self, document: &'s Value, reference: &str) -> Option<(&'s Value, &'s Value)> {
        let (name, pointer) = split_reference(reference);
        let document = if name.is_empty() {
            document
        } else {
            self.external.get(name)?
        };
        let target = if pointer.is_empty() {
            document
        } else {
            document.pointer(pointer)?
        };
        Some((document, target))
    }

    fn is_match(&self, pattern: &str, s: &str) -> bool {
        match self.patterns.get(pattern) {
            Some(re) => re.is_match(s),
            // invalid patterns never match
            None => Regex::new(pattern).map_or(false, |re| re.is_match(s)),
        }
    }

    fn check(
        &self,
        document: &Value,
        schema: &Value,
        instance: &Value,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        let schema = match schema {
            Value::Bool(true) => return,
            Value::Bool(false) => {
                out.push(Violation::new(field_name(path), "no value is allowed here"));
                return;
            }
            Value::Object(schema) => schema,
            _ => return,
        };

        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            match self.resolve(document, reference) {
                Some((target_document, target)) => {
                    self.check(target_document, target, instance, path, out)
                }
                None => out.push(Violation::new(
                    field_name(path),
                    format!("unresolvable schema reference {}", reference),
                )),
            }
        }

        if !self.check_type(schema, instance, path, out) {
            // nothing else is meaningful on a value of the wrong type
            return;
        }

        self.check_values(schema, instance, path, out);
        self.check_combinators(document, schema, instance, path, out);

        match instance {
            Value::Object(object) => self.check_object(document, schema, object, path, out),
            Value::Array(items) => self.check_array(document, schema, items, path, out),
            _ => (),
        }
    }

    /// returns false if the instance has the wrong type.
    fn check_type(
        &self,
        schema: &Map<String, Value>,
        instance: &Value,
        path: &str,
        out: &mut Vec<Violation>,
    ) -> bool {
        let expected: Vec<&str> = match schema.get("type") {
            Some(Value::String(t)) => vec![t.as_str()],
            Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
            _ => return true,
        };

        if expected.iter().any(|t| type_matches(t, instance)) {
            true
        } else {
            out.push(Violation::new(
                field_name(path),
                format!(
                    "expected {}, found {}",
                    expected.join(" or "),
                    type_name(instance)
                ),
            ));
            false
        }
    }

    fn check_number(&self, schema: &Map<String, Value>, n: f64, path: &str, out: &mut Vec<Violation>) {
        let mut violation = |reason: String| out.push(Violation::new(field_name(path), reason));

        // draft 4 uses booleans next to minimum/maximum, later drafts use numbers
        let exclusive_min = schema.get("exclusiveMinimum");
        let exclusive_max = schema.get("exclusiveMaximum");

        if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
            if exclusive_min == Some(&Value::Bool(true)) {
                if n <= min {
                    violation(format!("{} is not more than {}", n, min));
                }
            } else if n < min {
                violation(format!("{} is less than {}", n, min));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
            if exclusive_max == Some(&Value::Bool(true)) {
                if n >= max {
                    violation(format!("{} is not less than {}", n, max));
                }
            } else if n > max {
                violation(format!("{} is more than {}", n, max));
            }
        }
        if let Some(min) = exclusive_min.and_then(Value::as_f64) {
            if n <= min {
                violation(format!("{} is not more than {}", n, min));
            }
        }
        if let Some(max) = exclusive_max.and_then(Value::as_f64) {
            if n >= max {
                violation(format!("{} is not less than {}", n, max));
            }
        }
        if let Some(step) = schema.get("multipleOf").and_then(Value::as_f64) {
            let ratio = n / step;
            if step <= 0.0 || (ratio - ratio.round()).abs() > 1e-9 {
                violation(format!("{} is not a multiple of {}", n, step));
            }
        }
    }

    fn check_string(&self, schema: &Map<String, Value>, s: &str, path: &str, out: &mut Vec<Violation>) {
        let len = s.chars().count() as u64;
        if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
            if len < min {
                out.push(Violation::new(
                    field_name(path),
                    format!("shorter than {} characters", min),
                ));
            }
        }
        if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
            if len > max {
                out.push(Violation::new(
                    field_name(path),
                    format!("longer than {} characters", max),
                ));
            }
        }
        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
            if !self.is_match(pattern, s) {
                out.push(Violation::new(
                    field_name(path),
                    format!("{:?} does not match {}", s, pattern),
                ));
            }
        }
        if schema.get("format").and_then(Value::as_str) == Some("date")
            && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err()
        {
            out.push(Violation::new(
                field_name(path),
                format!("{:?} is not a YYYY-MM-DD date", s),
            ));
        }
    }

    fn check_values(
        &self,
        schema: &Map<String, Value>,
        instance: &Value,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        if let Some(Value::Array(allowed)) = schema.get("enum") {
            if !allowed.contains(instance) {
                out.push(Violation::new(
                    field_name(path),
                    format!("{} is not one of {}", instance, Value::Array(allowed.clone())),
                ));
            }
        }

        if let Some(constant) = schema.get("const") {
            if constant != instance {
                out.push(Violation::new(
                    field_name(path),
                    format!("{} is not {}", instance, constant),
                ));
            }
        }

        if let Some(n) = instance.as_f64() {
            self.check_number(schema, n, path, out);
        }

        if let Some(s) = instance.as_str() {
            self.check_string(schema, s, path, out);
        }
    }

    /// Does `instance` satisfy `schema`?
    fn matches(&self, document: &Value, schema: &Value, instance: &Value, path: &str) -> bool {
        let mut scratch = Vec::new();
        self.check(document, schema, instance, path, &mut scratch);
        scratch.is_empty()
    }

    fn check_combinators(
        &self,
        document: &Value,
        schema: &Map<String, Value>,
        instance: &Value,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        if let Some(Value::Array(all)) = schema.get("allOf") {
            for sub in all {
                self.check(document, sub, instance, path, out);
            }
        }

        // number of alternatives the instance satisfies
        let matching = |alternatives: &Vec<Value>| {
            alternatives
                .iter()
                .filter(|sub| self.matches(document, sub, instance, path))
                .count()
        };

        if let Some(Value::Array(any)) = schema.get("anyOf") {
            if matching(any) == 0 {
                out.push(Violation::new(
                    field_name(path),
                    format!("{} does not match any allowed shape", type_name(instance)),
                ));
            }
        }

        if let Some(Value::Array(one)) = schema.get("oneOf") {
            let n = matching(one);
            if n != 1 {
                out.push(Violation::new(
                    field_name(path),
                    format!("matches {} shapes, exactly one expected", n),
                ));
            }
        }

        if let Some(forbidden) = schema.get("not") {
            if self.matches(document, forbidden, instance, path) {
                out.push(Violation::new(
                    field_name(path),
                    format!("{} matches a forbidden shape", type_name(instance)),
                ));
            }
        }
    }

    fn check_object(
        &self,
        document: &Value,
        schema: &Map<String, Value>,
        object: &Map<String, Value>,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        if let Some(Value::Array(required)) = schema.get("required") {
            for key in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(key) {
                    out.push(Violation::new(child(path, key), "missing required field"));
                }
            }
        }

        let count = object.len() as u64;
        if let Some(min) = schema.get("minProperties").and_then(Value::as_u64) {
            if count < min {
                out.push(Violation::new(
                    field_name(path),
                    format!("fewer than {} fields", min),
                ));
            }
        }
        if let Some(max) = schema.get("maxProperties").and_then(Value::as_u64) {
            if count > max {
                out.push(Violation::new(
                    field_name(path),
                    format!("more than {} fields", max),
                ));
            }
        }

        if let Some(Value::Object(dependencies)) = schema.get("dependencies") {
            for (key, dependency) in dependencies {
                if !object.contains_key(key) {
                    continue;
                }
                match dependency {
                    Value::Array(names) => {
                        for name in names.iter().filter_map(Value::as_str) {
                            if !object.contains_key(name) {
                                out.push(Violation::new(
                                    child(path, name),
                                    format!("required when {} is present", key),
                                ));
                            }
                        }
                    }
                    sub => self.check(document, sub, &Value::Object(object.clone()), path, out),
                }
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        let pattern_properties = schema.get("patternProperties").and_then(Value::as_object);
        for (key, value) in object {
            let field = child(path, key);
            let mut described = false;

            if let Some(sub) = properties.and_then(|p| p.get(key)) {
                self.check(document, sub, value, &field, out);
                described = true;
            }
            for (pattern, sub) in pattern_properties.into_iter().flatten() {
                if self.is_match(pattern, key) {
                    self.check(document, sub, value, &field, out);
                    described = true;
                }
            }

            if !described {
                match schema.get("additionalProperties") {
                    Some(Value::Bool(false)) => out.push(Violation::new(field, "unexpected field")),
                    Some(sub @ Value::Object(_)) => self.check(document, sub, value, &field, out),
                    _ => (),
                }
            }
        }
    }

    fn check_array(
        &self,
        document: &Value,
        schema: &Map<String, Value>,
        items: &[Value],
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
            if (items.len() as u64) < min {
                out.push(Violation::new(
                    field_name(path),
                    format!("fewer than {} items", min),
                ));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
            if (items.len() as u64) > max {
                out.push(Violation::new(
                    field_name(path),
                    format!("more than {} items", max),
                ));
            }
        }

        if schema.get("uniqueItems").and_then(Value::as_bool) == Some(true) {
            for (i, item) in items.iter().enumerate() {
                if items[..i].contains(item) {
                    out.push(Violation::new(
                        format!("{}[{}]", field_name(path), i),
                        format!("duplicate item {}", item),
                    ));
                }
            }
        }

        if let Some(sub) = schema.get("items") {
            if sub.is_object() || sub.is_boolean() {
                for (i, item) in items.iter().enumerate() {
                    self.check(document, sub, item, &format!("{}[{}]", path, i), out);
                }
            }
        }
    }
}

fn read_document(path: &Path) -> Result<Value, Error> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot open schema {:?}: {}", path, e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("invalid schema {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    fn valid_record() -> Value {
        json!({
            "annotations": [{
                "annotator": "Jane Doe <jane@example.com>",
                "date": "2015-03-02",
                "duration": 20,
                "genders": "male",
                "label": "good",
                "offset": 0,
                "problems": [],
                "speakers": 1
            }],
            "checksum": "0a1b",
            "date": "2014-11-05",
            "language": "fra",
            "media_urls": ["http://example.com/a.mp3"],
            "source_name": "Radio",
            "source_url": "http://example.com/",
            "title": "Episode"
        })
    }

    fn fields(violations: Vec<Violation>) -> Vec<String> {
        violations.into_iter().map(|v| v.field).collect()
    }

    #[test]
    fn generated_accepts_valid_record() {
        let schema = Schema::generated();
        assert_eq!(schema.validate(&valid_record()), vec![]);
    }

    #[test]
    fn generated_uses_supported_keywords_only() {
        let generated = Schema::generated();
        assert!(Schema::from_value(generated.root).is_ok());
    }

    #[test]
    fn generated_accepts_stub_record() {
        let schema = Schema::generated();
        let stub = serde_json::to_value(SampleRecord::new("fra", "a", "http://a")).unwrap();
        assert_eq!(schema.validate(&stub), vec![]);
    }

    #[test]
    fn missing_and_unexpected_fields() {
        let schema = Schema::generated();
        let mut record = valid_record();
        let object = record.as_object_mut().unwrap();
        object.remove("checksum");
        object.insert("colour".to_string(), json!("blue"));

        let mut found = fields(schema.validate(&record));
        found.sort();
        assert_eq!(found, vec!["checksum", "colour"]);
    }

    #[test]
    fn nested_violations_name_their_field() {
        let schema = Schema::generated();
        let mut record = valid_record();
        record["annotations"][0]["label"] = json!("meh");
        record["annotations"][0]["offset"] = json!(-5);
        record["annotations"][0]["date"] = json!("yesterday");

        let mut found = fields(schema.validate(&record));
        found.sort();
        found.dedup();
        assert_eq!(
            found,
            vec![
                "annotations[0].date",
                "annotations[0].label",
                "annotations[0].offset"
            ]
        );
    }

    #[test]
    fn wrong_type() {
        let schema = Schema::generated();
        let mut record = valid_record();
        record["media_urls"] = json!("http://example.com/a.mp3");

        let violations = schema.validate(&record);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "media_urls");
        assert!(violations[0].reason.contains("expected array"));
    }

    #[test]
    fn hand_written_schema() {
        let schema = Schema::from_value(json!({
            "type": "object",
            "required": ["language"],
            "properties": {
                "language": {"$ref": "#/definitions/code"},
                "media_urls": {"type": "array", "uniqueItems": true, "items": {"type": "string"}}
            },
            "definitions": {"code": {"type": "string", "minLength": 3, "maxLength": 3}}
        }))
        .unwrap();

        assert!(schema.validate(&json!({"language": "fra"})).is_empty());
        assert_eq!(
            fields(schema.validate(&json!({"language": "fr"}))),
            vec!["language"]
        );
        assert_eq!(
            fields(schema.validate(&json!({"language": "fra", "media_urls": ["a", "a"]}))),
            vec!["media_urls[1]"]
        );
        assert_eq!(fields(schema.validate(&json!([]))), vec![ROOT]);
    }

    #[test]
    fn pattern_and_pattern_properties() {
        let schema = Schema::from_value(json!({
            "properties": {"checksum": {"type": "string", "pattern": "^[0-9a-f]{32}$"}},
            "patternProperties": {"^x-": {"type": "string"}},
            "additionalProperties": false
        }))
        .unwrap();

        assert_eq!(
            fields(schema.validate(&json!({"checksum": "NOT-A-CHECKSUM"}))),
            vec!["checksum"]
        );
        assert!(schema
            .validate(&json!({"checksum": "5d41402abc4b2a76b9719d911017c592", "x-note": "ok"}))
            .is_empty());
        assert_eq!(
            fields(schema.validate(&json!({"x-note": 1, "colour": "blue"}))),
            vec!["colour", "x-note"]
        );
    }

    #[test]
    fn not_dependencies_and_property_counts() {
        let schema = Schema::from_value(json!({
            "minProperties": 1,
            "maxProperties": 2,
            "dependencies": {"origin_checksum": ["checksum"]},
            "properties": {"title": {"not": {"enum": [""]}}}
        }))
        .unwrap();

        assert_eq!(fields(schema.validate(&json!({}))), vec![ROOT]);
        assert_eq!(
            fields(schema.validate(&json!({"a": 1, "b": 2, "c": 3}))),
            vec![ROOT]
        );
        assert_eq!(
            fields(schema.validate(&json!({"origin_checksum": "ff"}))),
            vec!["checksum"]
        );
        assert_eq!(
            fields(schema.validate(&json!({"title": ""}))),
            vec!["title"]
        );
    }

    #[test]
    fn draft4_exclusive_bounds() {
        let schema = Schema::from_value(json!({
            "properties": {"speakers": {"type": "integer", "minimum": 0, "exclusiveMinimum": true, "multipleOf": 1}}
        }))
        .unwrap();
        assert_eq!(
            fields(schema.validate(&json!({"speakers": 0}))),
            vec!["speakers"]
        );
        assert!(schema.validate(&json!({"speakers": 1})).is_empty());
    }

    #[test]
    fn unsupported_keywords_are_refused() {
        for schema in [
            json!({"properties": {"a": {"contains": {"type": "string"}}}}),
            json!({"items": [{"type": "string"}]}),
            json!({"if": {"required": ["a"]}}),
        ] {
            assert!(matches!(
                Schema::from_value(schema),
                Err(Error::Config(_))
            ));
        }
        assert!(matches!(
            Schema::from_value(json!({"pattern": "("})),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn references_to_other_documents() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("sample.schema.json"),
            r#"{"properties": {"annotations": {"type": "array", "items": {"$ref": "annotation.schema.json"}}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("annotation.schema.json"),
            r##"{"type": "object", "required": ["label"],
                "properties": {"label": {"$ref": "#/definitions/label"}},
                "definitions": {"label": {"enum": ["good", "bad"]}}}"##,
        )
        .unwrap();

        let schema = Schema::load(&dir.path().join("sample.schema.json")).unwrap();
        assert!(schema
            .validate(&json!({"annotations": [{"label": "good"}]}))
            .is_empty());
        assert_eq!(
            fields(schema.validate(&json!({"annotations": [{"label": "meh"}, {}]}))),
            vec!["annotations[0].label", "annotations[1].label"]
        );
    }

    #[test]
    fn missing_referenced_document_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.schema.json");
        fs::write(&path, r#"{"items": {"$ref": "nope.json"}}"#).unwrap();
        assert!(matches!(Schema::load(&path), Err(Error::Config(_))));

        assert!(matches!(
            Schema::from_value(json!({"items": {"$ref": "nope.json"}})),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn non_object_schema_is_config_error() {
        assert!(matches!(
            Schema::from_value(json!([1, 2])),
            Err(Error::Config(_))
        ));
    }
}
