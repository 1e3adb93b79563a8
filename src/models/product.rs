use serde::{Deserialize, Serialize};

/// An installed product as reported by the package manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub version: String,
    pub arch: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub is_base: bool,
    /// OEM release type, empty when the product has none.
    #[serde(default)]
    pub release_type: String,
}

impl Product {
    /// The `name/version/arch` identifier used by the registration flow.
    pub fn triplet(&self) -> String {
        format!("{}/{}/{}", self.name, self.version, self.arch)
    }
}

/// A repository service known to the package manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub autorefresh: bool,
}

/// A configured package repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub alias: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub priority: i32,
    pub enabled: bool,
    #[serde(default)]
    pub autorefresh: bool,
}

/// A product package found by a package-manager search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPackage {
    pub name: String,
    pub edition: String,
    #[serde(default)]
    pub arch: String,
    pub repository: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplet() {
        let product = Product {
            name: "LinkOS".into(),
            version: "2.0".into(),
            arch: "x86_64".into(),
            ..Product::default()
        };
        assert_eq!(product.triplet(), "LinkOS/2.0/x86_64");
    }
}
