//! Package-manager metadata extraction.
//!
//! The registration flow needs the installed products (and which of them is
//! the base product), the repository services, and the configured
//! repositories. All of it comes from the package manager's `--xmlout`
//! interface; the parsers here are pure so they can be tested against
//! inline documents.

use crate::constants;
use crate::models::product::{Product, ProductPackage, Repository, Service};
use crate::util::exec::CommandRunner;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

/// Enumerate installed products.
pub fn installed_products(runner: &dyn CommandRunner) -> Result<Vec<Product>> {
    let doc = runner.output(
        constants::PACKAGE_MANAGER,
        &[
            "--disable-repositories",
            "--xmlout",
            "--non-interactive",
            "products",
            "-i",
        ],
        &[],
    )?;
    parse_products_xml(&doc, Path::new(constants::DEFAULT_FILESYSTEM_ROOT))
}

/// The installed product flagged as the base of the system.
pub fn base_product(runner: &dyn CommandRunner) -> Result<Product> {
    installed_products(runner)?
        .into_iter()
        .find(|product| product.is_base)
        .context("cannot detect base product")
}

/// Enumerate repository services.
pub fn installed_services(runner: &dyn CommandRunner) -> Result<Vec<Service>> {
    let doc = runner.output(
        constants::PACKAGE_MANAGER,
        &["--xmlout", "--non-interactive", "services"],
        &[],
    )?;
    parse_services_xml(&doc)
}

/// Enumerate configured repositories.
pub fn repositories(runner: &dyn CommandRunner) -> Result<Vec<Repository>> {
    let doc = runner.output(
        constants::PACKAGE_MANAGER,
        &["--xmlout", "--non-interactive", "repos", "-d"],
        &[constants::ZYPPER_EXIT_NO_REPOS],
    )?;
    parse_repos_xml(&doc)
}

/// Search for product packages matching `identifier` exactly.
pub fn search_products(runner: &dyn CommandRunner, identifier: &str) -> Result<Vec<ProductPackage>> {
    let doc = runner.output(
        constants::PACKAGE_MANAGER,
        &[
            "--xmlout",
            "--non-interactive",
            "search",
            "--match-exact",
            "--details",
            "-t",
            "product",
            identifier,
        ],
        &[constants::ZYPPER_EXIT_CAP_NOT_FOUND],
    )?;
    parse_search_result_xml(&doc)
}

#[derive(Debug, Default, Deserialize)]
struct ProductStream {
    #[serde(rename = "product-list")]
    product_list: Option<ProductList>,
}

#[derive(Debug, Deserialize)]
struct ProductList {
    #[serde(rename = "product", default)]
    products: Vec<XmlProduct>,
}

#[derive(Debug, Deserialize)]
struct XmlProduct {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@version")]
    version: String,
    #[serde(rename = "@arch")]
    arch: String,
    #[serde(rename = "@summary", default)]
    summary: String,
    #[serde(rename = "@isbase", default, deserialize_with = "xml_flag")]
    is_base: bool,
    #[serde(rename = "@registerrelease", default)]
    register_release: String,
    #[serde(rename = "@productline", default)]
    product_line: String,
}

/// Parse a `products -i` document. The release type comes from the OEM file
/// named after the product line when one exists under `filesystem_root`,
/// otherwise from the `registerrelease` attribute.
pub fn parse_products_xml(doc: &[u8], filesystem_root: &Path) -> Result<Vec<Product>> {
    let stream: ProductStream = parse_stream(doc).context("parse product list")?;
    let products = stream
        .product_list
        .map(|list| list.products)
        .unwrap_or_default();
    Ok(products
        .into_iter()
        .map(|xml| {
            let release_type = oem_release_type(filesystem_root, &xml.product_line)
                .unwrap_or(xml.register_release);
            Product {
                name: xml.name,
                version: xml.version,
                arch: xml.arch,
                summary: xml.summary,
                is_base: xml.is_base,
                release_type,
            }
        })
        .collect())
}

fn oem_release_type(filesystem_root: &Path, product_line: &str) -> Option<String> {
    if product_line.is_empty() {
        return None;
    }
    let oem_file = filesystem_root
        .join(constants::OEM_RELEASE_DIR)
        .join(product_line);
    fs::read_to_string(oem_file)
        .ok()
        .map(|content| content.trim().to_string())
}

#[derive(Debug, Default, Deserialize)]
struct ServiceStream {
    #[serde(rename = "service-list")]
    service_list: Option<ServiceList>,
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(rename = "service", default)]
    services: Vec<XmlService>,
}

#[derive(Debug, Deserialize)]
struct XmlService {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@url", default)]
    url: String,
    #[serde(rename = "@enabled", default, deserialize_with = "xml_flag")]
    enabled: bool,
    #[serde(rename = "@autorefresh", default, deserialize_with = "xml_flag")]
    autorefresh: bool,
}

pub fn parse_services_xml(doc: &[u8]) -> Result<Vec<Service>> {
    let stream: ServiceStream = parse_stream(doc).context("parse service list")?;
    let services = stream
        .service_list
        .map(|list| list.services)
        .unwrap_or_default();
    Ok(services
        .into_iter()
        .map(|xml| Service {
            name: xml.name,
            url: xml.url,
            enabled: xml.enabled,
            autorefresh: xml.autorefresh,
        })
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct RepoStream {
    #[serde(rename = "repo-list")]
    repo_list: Option<RepoList>,
}

#[derive(Debug, Deserialize)]
struct RepoList {
    #[serde(rename = "repo", default)]
    repos: Vec<XmlRepo>,
}

#[derive(Debug, Deserialize)]
struct XmlRepo {
    #[serde(rename = "@alias")]
    alias: String,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@priority", default = "default_priority")]
    priority: i32,
    #[serde(rename = "@enabled", default, deserialize_with = "xml_flag")]
    enabled: bool,
    #[serde(rename = "@autorefresh", default, deserialize_with = "xml_flag")]
    autorefresh: bool,
    #[serde(default)]
    url: Option<String>,
}

fn default_priority() -> i32 {
    constants::DEFAULT_REPO_PRIORITY
}

pub fn parse_repos_xml(doc: &[u8]) -> Result<Vec<Repository>> {
    let stream: RepoStream = parse_stream(doc).context("parse repository list")?;
    let repos = stream.repo_list.map(|list| list.repos).unwrap_or_default();
    Ok(repos
        .into_iter()
        .map(|xml| Repository {
            alias: xml.alias,
            name: xml.name,
            url: xml.url.unwrap_or_default(),
            priority: xml.priority,
            enabled: xml.enabled,
            autorefresh: xml.autorefresh,
        })
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct SearchStream {
    #[serde(rename = "search-result")]
    search_result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "solvable-list")]
    solvable_list: Option<SolvableList>,
}

#[derive(Debug, Deserialize)]
struct SolvableList {
    #[serde(rename = "solvable", default)]
    solvables: Vec<XmlSolvable>,
}

#[derive(Debug, Deserialize)]
struct XmlSolvable {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@edition", default)]
    edition: String,
    #[serde(rename = "@arch", default)]
    arch: String,
    #[serde(rename = "@repository", default)]
    repository: String,
    #[serde(rename = "@status", default)]
    status: String,
}

pub fn parse_search_result_xml(doc: &[u8]) -> Result<Vec<ProductPackage>> {
    let stream: SearchStream = parse_stream(doc).context("parse search result")?;
    let solvables = stream
        .search_result
        .and_then(|result| result.solvable_list)
        .map(|list| list.solvables)
        .unwrap_or_default();
    Ok(solvables
        .into_iter()
        .map(|xml| ProductPackage {
            name: xml.name,
            edition: xml.edition,
            arch: xml.arch,
            repository: xml.repository,
            status: xml.status,
        })
        .collect())
}

/// Deserialize an `--xmlout` stream document. A blank document (some
/// tolerated non-zero exits produce none) parses as empty.
fn parse_stream<'a, T>(doc: &'a [u8]) -> Result<T>
where
    T: Deserialize<'a> + Default,
{
    let text = std::str::from_utf8(doc).context("document is not valid UTF-8")?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    quick_xml::de::from_str(text).context("deserialize XML stream")
}

fn xml_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(raw.as_str(), "1" | "true" | "yes"))
}
