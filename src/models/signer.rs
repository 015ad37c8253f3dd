use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::entities::signer;
use crate::error::AppError;
use crate::services::storage::IncomingFile;

const DEFAULT_LABEL: &str = "Link";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LinkItem {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SignerView {
    pub id: i32,
    pub nama: String,
    pub jabatan: Option<String>,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub foto_url: Option<String>,
    pub links: Vec<LinkItem>,
}

impl SignerView {
    pub fn from_model(model: signer::Model, public_base_url: &str) -> Self {
        Self {
            id: model.id,
            foto_url: model.photo.as_deref().map(|p| photo_url(public_base_url, p)),
            links: normalize_links(model.links_json.as_deref()),
            nama: model.nama,
            jabatan: model.jabatan,
            bio: model.bio,
            photo: model.photo,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSigner {
    pub nama: String,
    pub jabatan: Option<String>,
    pub bio: Option<String>,
    pub links: Option<Value>,
    pub photo: Option<IncomingFile>,
}

/// `None` fields are left unchanged; `Some("")` clears an optional text field.
#[derive(Debug, Clone, Default)]
pub struct SignerUpdate {
    pub nama: String,
    pub jabatan: Option<String>,
    pub bio: Option<String>,
    pub links: Option<Value>,
    pub photo: Option<IncomingFile>,
    pub remove_photo: bool,
}

pub fn photo_url(public_base_url: &str, photo: &str) -> String {
    format!("{}/files/signers/{}", public_base_url, photo)
}

/// Serializes submitted links for storage. Only arrays are accepted; an empty
/// array or `null` clears the links.
pub fn encode_links(links: Option<Value>) -> Result<Option<String>, AppError> {
    match links {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) if items.is_empty() => Ok(None),
        Some(value @ Value::Array(_)) => Ok(Some(value.to_string())),
        Some(_) => Err(AppError::Validation("links must be a JSON array".to_string())),
    }
}

/// Reads stored links into `{label, url}` form.
///
/// Bare strings become `{label: <Host>, url}`, objects without a `url` are
/// dropped and anything that is not a JSON array reads as empty.
pub fn normalize_links(raw: Option<&str>) -> Vec<LinkItem> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Vec::new();
    };
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(url) => Some(LinkItem {
                label: label_from_host(&url),
                url,
            }),
            Value::Object(map) => {
                let url = map.get("url")?.as_str()?.to_string();
                let label = map
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .unwrap_or(DEFAULT_LABEL)
                    .to_string();
                Some(LinkItem { label, url })
            }
            _ => None,
        })
        .collect()
}

fn label_from_host(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(capitalize))
        .unwrap_or_else(|| DEFAULT_LABEL.to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_strings_are_promoted() {
        let stored = json!([{"label": "X", "url": "http://x"}, "http://bare.example"]).to_string();
        assert_eq!(
            normalize_links(Some(&stored)),
            vec![
                LinkItem { label: "X".into(), url: "http://x".into() },
                LinkItem { label: "Bare.example".into(), url: "http://bare.example".into() },
            ]
        );
    }

    #[test]
    fn malformed_entries_are_tolerated() {
        let stored = json!([{"label": "no url"}, 42, {"url": "https://a.example/p"}, "not a url"]).to_string();
        assert_eq!(
            normalize_links(Some(&stored)),
            vec![
                LinkItem { label: "Link".into(), url: "https://a.example/p".into() },
                LinkItem { label: "Link".into(), url: "not a url".into() },
            ]
        );
        assert!(normalize_links(Some("{oops")).is_empty());
        assert!(normalize_links(Some(r#"{"url": "x"}"#)).is_empty());
        assert!(normalize_links(None).is_empty());
    }

    #[test]
    fn encode_accepts_arrays_only() {
        assert_eq!(encode_links(None).unwrap(), None);
        assert_eq!(encode_links(Some(json!([]))).unwrap(), None);
        assert_eq!(
            encode_links(Some(json!(["http://a"]))).unwrap(),
            Some(r#"["http://a"]"#.to_string())
        );
        assert!(matches!(
            encode_links(Some(json!({"url": "http://a"}))),
            Err(AppError::Validation(_))
        ));
    }
}
