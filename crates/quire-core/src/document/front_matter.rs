//! Front matter carried at the top of a notebook.
//!
//! The block is YAML inside `# ---` comment markers. Only a handful of
//! publishing fields are typed; everything else is kept as an opaque mapping
//! for the publishing pipeline.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Publishing metadata from the notebook header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Remaining keys (e.g. `jupyter`), in source order.
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

/// Kernel description found under `jupyter.kernelspec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSpecInfo {
    pub display_name: String,
    pub language: String,
    pub name: String,
}

impl FrontMatter {
    /// Parse front matter from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize back to YAML (without the `---` markers).
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The `jupyter.kernelspec` entry, if all of its fields are strings.
    pub fn kernelspec(&self) -> Option<KernelSpecInfo> {
        let spec = self
            .extra
            .get("jupyter")?
            .get("kernelspec")?
            .as_mapping()?;
        let field = |key: &str| spec.get(key).and_then(|v| v.as_str()).map(String::from);
        Some(KernelSpecInfo {
            display_name: field("display_name")?,
            language: field("language")?,
            name: field("name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"title: Post With Code
author: Ada
date: now
categories:
  - news
  - code
jupyter:
  kernelspec:
    display_name: Python 3 (ipykernel)
    language: python
    name: python3
"#;

    #[test]
    fn test_typed_fields() {
        let fm = FrontMatter::from_yaml(HEADER).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Post With Code"));
        assert_eq!(fm.categories, vec!["news", "code"]);
        assert!(fm.extra.contains_key("jupyter"));
    }

    #[test]
    fn test_kernelspec_lookup() {
        let fm = FrontMatter::from_yaml(HEADER).unwrap();
        let spec = fm.kernelspec().unwrap();
        assert_eq!(spec.name, "python3");
        assert_eq!(spec.language, "python");
    }

    #[test]
    fn test_empty_front_matter() {
        let fm = FrontMatter::from_yaml("  \n").unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert!(fm.kernelspec().is_none());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(FrontMatter::from_yaml("title: [unclosed").is_err());
    }
}
