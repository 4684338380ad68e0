//! Build catalog documents
//!
//! A catalog names the current build of an application and lists where its
//! manifest can be downloaded. Only single-element catalogs are understood.

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};

/// Catalog document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Catalog entries, one per application build
    #[serde(default)]
    pub elements: Vec<CatalogElement>,
}

/// One application build
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogElement {
    /// Application name
    #[serde(default)]
    pub app_name: String,
    /// Release label, e.g. `Live`
    #[serde(default)]
    pub label_name: String,
    /// Build version string
    #[serde(default)]
    pub build_version: String,
    /// Locations the manifest is served from
    #[serde(default)]
    pub manifests: Vec<ManifestLocation>,
}

/// Manifest download location
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestLocation {
    /// Base URI of the manifest
    pub uri: String,
    /// Query parameters to append to `uri`
    #[serde(default)]
    pub query_params: Vec<QueryParam>,
}

/// Query parameter name/value pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryParam {
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: String,
}

impl Catalog {
    /// Decode a JSON catalog and check that it has a usable shape
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let catalog: Self = serde_json::from_slice(data)?;
        catalog.element()?;
        Ok(catalog)
    }

    /// The single build element
    ///
    /// Fails unless the catalog has exactly one element carrying at least one
    /// manifest location.
    pub fn element(&self) -> Result<&CatalogElement> {
        match self.elements.as_slice() {
            [element] if !element.manifests.is_empty() => Ok(element),
            [_] => Err(FormatError::UnsupportedCatalog(
                "catalog element lists no manifests".to_string(),
            )),
            elements => Err(FormatError::UnsupportedCatalog(format!(
                "expected exactly one element, found {}",
                elements.len()
            ))),
        }
    }

    /// First manifest location of the single element
    pub fn manifest_location(&self) -> Result<&ManifestLocation> {
        let element = self.element()?;
        element.manifests.first().ok_or_else(|| {
            FormatError::UnsupportedCatalog("catalog element lists no manifests".to_string())
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "elements": [{
            "appName": "Splice",
            "labelName": "Live",
            "buildVersion": "++Release-1.0-CL-1",
            "hash": "ignored",
            "manifests": [
                {
                    "uri": "https://cdn.example.com/Builds/abc.manifest",
                    "queryParams": [{ "name": "token", "value": "xyz" }]
                },
                { "uri": "https://mirror.example.com/Builds/abc.manifest" }
            ]
        }]
    }"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_json(CATALOG.as_bytes()).unwrap();
        let element = catalog.element().unwrap();
        assert_eq!(element.app_name, "Splice");
        assert_eq!(element.label_name, "Live");
        assert_eq!(element.build_version, "++Release-1.0-CL-1");

        let location = catalog.manifest_location().unwrap();
        assert_eq!(location.uri, "https://cdn.example.com/Builds/abc.manifest");
        assert_eq!(
            location.query_params,
            vec![QueryParam {
                name: "token".to_string(),
                value: "xyz".to_string()
            }]
        );
    }

    #[test]
    fn test_rejects_multiple_elements() {
        let json = br#"{ "elements": [
            { "manifests": [{ "uri": "a" }] },
            { "manifests": [{ "uri": "b" }] }
        ] }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(FormatError::UnsupportedCatalog(_))
        ));
    }

    #[test]
    fn test_rejects_empty_catalogs() {
        assert!(matches!(
            Catalog::from_json(b"{}"),
            Err(FormatError::UnsupportedCatalog(_))
        ));
        assert!(matches!(
            Catalog::from_json(br#"{ "elements": [{ "appName": "x" }] }"#),
            Err(FormatError::UnsupportedCatalog(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Catalog::from_json(b"not json"),
            Err(FormatError::Json(_))
        ));
    }
}
