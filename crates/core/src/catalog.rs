//! Medical test and package catalog.
//!
//! The catalog is quasi-static reference data. A default copy is bundled with the crate and
//! may be overridden at startup by a YAML file of the same shape.

use crate::{LabError, LabResult};
use api_shared::{MedicalTestRes, TestPackageRes};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

const BUNDLED_CATALOG: &str = include_str!("../data/default-catalog.yaml");

/// Label that stands for "no category restriction" at parsing boundaries.
pub const ALL_CATEGORIES: &str = "All";

/// A single orderable medical test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MedicalTest {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub preparation: String,
    #[serde(default)]
    pub sample_type: String,
    #[serde(default)]
    pub turnaround_time: String,
    #[serde(default)]
    pub common_uses: Vec<String>,
}

/// A bundle of tests sold together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestPackage {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Constituent test ids. Ids with no matching test are tolerated.
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub popular: bool,
    /// Price before discount, in naira.
    pub estimated_price: u64,
    /// Discount percentage, `0..=100`.
    #[serde(default)]
    pub discount: u8,
}

impl TestPackage {
    /// Estimated price with the discount applied, rounded down.
    pub fn discounted_price(&self) -> u64 {
        let discount = u128::from(self.discount.min(100));
        let kept = u128::from(self.estimated_price) * (100 - discount) / 100;
        u64::try_from(kept).unwrap_or(self.estimated_price)
    }
}

impl From<MedicalTest> for MedicalTestRes {
    fn from(t: MedicalTest) -> Self {
        MedicalTestRes {
            id: t.id,
            name: t.name,
            category: t.category,
            description: t.description,
            preparation: t.preparation,
            sample_type: t.sample_type,
            turnaround_time: t.turnaround_time,
            common_uses: t.common_uses,
        }
    }
}

impl From<TestPackage> for TestPackageRes {
    fn from(p: TestPackage) -> Self {
        TestPackageRes {
            id: p.id,
            name: p.name,
            description: p.description,
            category: p.category,
            tests: p.tests,
            popular: p.popular,
            estimated_price: p.estimated_price,
            discount: p.discount,
        }
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Category restriction for catalog listings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    /// Parses a user-supplied category. Blank input and the `All` label mean no restriction.
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim).filter(|c| !c.is_empty()) {
            None => CategoryFilter::All,
            Some(c) if c.eq_ignore_ascii_case(ALL_CATEGORIES) => CategoryFilter::All,
            Some(c) => CategoryFilter::Named(c.to_string()),
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => name == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(Some(s)))
    }
}

/// Anything that can be listed and searched by category and free text.
pub trait CatalogEntry {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> &str;
}

impl CatalogEntry for MedicalTest {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> &str {
        &self.category
    }
}

impl CatalogEntry for TestPackage {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> &str {
        &self.category
    }
}

/// Returns the entries in `category` whose name or description contains `query`
/// (case-insensitive). A blank query matches everything. Order is preserved.
pub fn filter_catalog<T: CatalogEntry + Clone>(
    items: &[T],
    category: &CategoryFilter,
    query: &str,
) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| category.matches(item.category()))
        .filter(|item| {
            needle.is_empty()
                || item.name().to_lowercase().contains(&needle)
                || item.description().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

// ============================================================================
// Catalog
// ============================================================================

/// On-disk shape of a catalog file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    tests: Vec<MedicalTest>,
    #[serde(default)]
    packages: Vec<TestPackage>,
}

/// The loaded test and package collections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    tests: Vec<MedicalTest>,
    packages: Vec<TestPackage>,
}

impl Catalog {
    pub fn new(tests: Vec<MedicalTest>, packages: Vec<TestPackage>) -> Self {
        Self { tests, packages }
    }

    /// The catalog compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns `LabError::CatalogYaml` if the bundled file does not match the schema.
    pub fn bundled() -> LabResult<Self> {
        Self::from_yaml_str(BUNDLED_CATALOG)
    }

    /// Strictly parses a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `LabError::CatalogYaml` naming the failing path (e.g. `tests[3].name`) when the
    /// text does not match the catalog schema, including unknown keys.
    pub fn from_yaml_str(yaml_text: &str) -> LabResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        match serde_path_to_error::deserialize::<_, CatalogFile>(deserializer) {
            Ok(file) => Ok(Self::new(file.tests, file.packages)),
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>".to_string()
                } else {
                    path
                };
                Err(LabError::CatalogYaml {
                    path,
                    message: source.to_string(),
                })
            }
        }
    }

    /// Loads the bundled catalog, overlaid by `override_path` when given.
    ///
    /// Each collection of the override replaces the bundled one only if it is non-empty.
    ///
    /// # Errors
    ///
    /// Returns `LabError::CatalogRead` if the override cannot be read, or
    /// `LabError::CatalogYaml` if either catalog fails to parse.
    pub fn load(override_path: Option<&Path>) -> LabResult<Self> {
        let bundled = Self::bundled()?;
        let Some(path) = override_path else {
            return Ok(bundled);
        };

        let text = std::fs::read_to_string(path).map_err(LabError::CatalogRead)?;
        let custom = Self::from_yaml_str(&text)?;

        if custom.tests.is_empty() {
            tracing::warn!(path = %path.display(), "catalog override has no tests, using bundled tests");
        }
        if custom.packages.is_empty() {
            tracing::warn!(path = %path.display(), "catalog override has no packages, using bundled packages");
        }

        let catalog = Self {
            tests: if custom.tests.is_empty() {
                bundled.tests
            } else {
                custom.tests
            },
            packages: if custom.packages.is_empty() {
                bundled.packages
            } else {
                custom.packages
            },
        };
        tracing::info!(
            tests = catalog.tests.len(),
            packages = catalog.packages.len(),
            "loaded catalog from {}",
            path.display()
        );
        Ok(catalog)
    }

    pub fn tests(&self) -> &[MedicalTest] {
        &self.tests
    }

    pub fn packages(&self) -> &[TestPackage] {
        &self.packages
    }

    pub fn test(&self, id: &str) -> Option<&MedicalTest> {
        self.tests.iter().find(|t| t.id == id)
    }

    pub fn package(&self, id: &str) -> Option<&TestPackage> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// The tests a package bundles, in package order. Unknown ids are skipped.
    pub fn resolve_package(&self, package: &TestPackage) -> Vec<MedicalTest> {
        package
            .tests
            .iter()
            .filter_map(|id| self.test(id))
            .cloned()
            .collect()
    }

    pub fn popular_packages(&self) -> Vec<TestPackage> {
        self.packages.iter().filter(|p| p.popular).cloned().collect()
    }

    /// Restricts the tests to those a lab offers, keeping catalog order.
    pub fn tests_offered(&self, offered_ids: &[String]) -> Vec<MedicalTest> {
        let offered: HashSet<&str> = offered_ids.iter().map(String::as_str).collect();
        self.tests
            .iter()
            .filter(|t| offered.contains(t.id.as_str()))
            .cloned()
            .collect()
    }

    /// Distinct test categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tests
            .iter()
            .filter(|t| seen.insert(t.category.as_str()))
            .map(|t| t.category.clone())
            .collect()
    }
}
