//! Collects a multipart body into text fields and files keyed by field name.
//!
//! A trailing `[]` on a field name is ignored, so `files` and `files[]` (or
//! `signers` and `signers[]`) land in the same bucket.

use std::collections::HashMap;

use axum::extract::Multipart;
use serde_json::Value;

use crate::error::AppError;
use crate::models::document::SignerSelection;
use crate::services::storage::IncomingFile;

#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<IncomingFile>>,
}

impl FormData {
    pub async fn collect(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(|n| n.trim_end_matches("[]").to_string()) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    // An untouched file input arrives with an empty name.
                    if file_name.is_empty() {
                        continue;
                    }
                    form.files
                        .entry(name)
                        .or_default()
                        .push(IncomingFile::new(file_name, bytes));
                }
                None => {
                    let text = field.text().await?;
                    form.fields.entry(name).or_default().push(text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn texts(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.text(name).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("1" | "true" | "on" | "yes")
        )
    }

    /// All files posted under any of `names`, in arrival order per name.
    pub fn take_files(&mut self, names: &[&str]) -> Vec<IncomingFile> {
        names
            .iter()
            .flat_map(|name| self.files.remove(*name).unwrap_or_default())
            .collect()
    }

    pub fn take_file(&mut self, names: &[&str]) -> Option<IncomingFile> {
        self.take_files(names).into_iter().next()
    }

    /// Signer ids from repeated `signers` fields (a value may also hold a
    /// comma-separated or JSON list) and the optional `signer_roles` object.
    /// `None` when no `signers` field was sent.
    pub fn signer_selection(&self) -> Result<Option<SignerSelection>, AppError> {
        if !self.has("signers") {
            return Ok(None);
        }

        let ids = self.texts("signers").iter().flat_map(|v| split_ids(v)).collect();
        let roles = match self.text("signer_roles").map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_roles(raw)?,
            _ => HashMap::new(),
        };

        Ok(Some(SignerSelection { ids, roles }))
    }

    /// Links as sent: one JSON value in `links`, or repeated `links[]` entries
    /// that are each a URL or a JSON object. A blank value clears the links.
    pub fn links(&self) -> Option<Value> {
        let values = self.texts("links");
        match values {
            [] => None,
            [single] => {
                let single = single.trim();
                if single.is_empty() {
                    return Some(Value::Null);
                }
                Some(serde_json::from_str(single).unwrap_or_else(|_| Value::Array(vec![link_entry(single)])))
            }
            many => Some(Value::Array(many.iter().map(|v| link_entry(v.trim())).collect())),
        }
    }
}

fn link_entry(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(obj @ Value::Object(_)) => obj,
        _ => Value::String(raw.to_string()),
    }
}

fn split_ids(raw: &str) -> Vec<i64> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .filter_map(|part| part.trim().trim_matches('"').parse().ok())
        .collect()
}

fn parse_roles(raw: &str) -> Result<HashMap<i64, String>, AppError> {
    let map: HashMap<String, Value> = serde_json::from_str(raw)
        .map_err(|_| AppError::BadRequest("signer_roles must be a JSON object".to_string()))?;

    Ok(map
        .into_iter()
        .filter_map(|(id, role)| Some((id.trim().parse().ok()?, role.as_str()?.to_string())))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_lists_and_skip_garbage() {
        assert_eq!(split_ids("3"), vec![3]);
        assert_eq!(split_ids("1, 2,x"), vec![1, 2]);
        assert_eq!(split_ids("[4,\"5\"]"), vec![4, 5]);
        assert_eq!(split_ids(""), Vec::<i64>::new());
    }

    #[test]
    fn roles_map_numeric_keys() {
        let roles = parse_roles(r#"{"1": "Ketua", "x": "ignored", "2": 5}"#).unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[&1], "Ketua");
        assert!(matches!(parse_roles("[1]"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn links_from_fields() {
        let mut form = FormData::default();
        assert_eq!(form.links(), None);

        form.fields.insert("links".into(), vec![r#"[{"label":"Web","url":"http://w"}]"#.into()]);
        assert!(form.links().unwrap().is_array());

        form.fields.insert(
            "links".into(),
            vec!["http://a.example".into(), r#"{"url":"http://b"}"#.into()],
        );
        assert_eq!(
            form.links().unwrap(),
            serde_json::json!(["http://a.example", {"url": "http://b"}])
        );

        form.fields.insert("links".into(), vec!["  ".into()]);
        assert_eq!(form.links(), Some(Value::Null));
    }
}
