//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `sample_fragments`: a small land-model documentation set with pages and sections
//! - `sample_index`: `sample_fragments` built with the default configuration
//! - `documenter_payload`: a `documenterSearchIndex` script with one record per paragraph
//!
//! [`TempWorkspace`] provides a temp directory for tests that write index or config files.

use docsearch::{Category, Fragment, IndexBuilder, InvertedIndex};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is removed when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content. Parent directories are created as needed.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }
}

#[fixture]
#[allow(dead_code)] // Fixtures used across different integration test crates
pub fn sample_fragments() -> Vec<Fragment> {
    vec![
        Fragment::new(
            "generated/model_tutorial/",
            "Using AbstractModel functionality",
            "Using AbstractModel functionality",
            "The AbstractModel framework allows users to define land component models \
             (e.g. for snow, soil, vegetation, carbon) which can be run in standalone mode.",
            Category::Page,
        ),
        Fragment::new(
            "generated/model_tutorial/#Background",
            "Using AbstractModel functionality",
            "Background",
            "Each model defines its prognostic variables and auxiliary variables.",
            Category::Section,
        ),
        Fragment::new(
            "generated/soil_water/",
            "Richards equation",
            "Richards equation",
            "Soil water content evolves according to Richards equation with a \
             hydraulic conductivity that depends on the matric potential.",
            Category::Page,
        ),
        Fragment::new(
            "generated/soil_water/#Boundary-conditions",
            "Richards equation",
            "Boundary conditions",
            "A flux boundary condition is applied at the surface and free drainage at the bottom.",
            Category::Section,
        ),
        Fragment::new(
            "generated/carbon/",
            "Soil carbon",
            "Soil carbon",
            "Soil CO2 production and diffusion couple the carbon model to soil water and temperature.",
            Category::Page,
        ),
        Fragment::new(
            "APIs/",
            "API reference",
            "API reference",
            "Docstrings for make_ode_function, make_rhs and initialize.",
            Category::Page,
        ),
    ]
}

#[fixture]
#[allow(dead_code)] // Fixtures used across different integration test crates
pub fn sample_index(sample_fragments: Vec<Fragment>) -> InvertedIndex {
    IndexBuilder::default()
        .build_fragments(sample_fragments)
        .expect("sample fragments build")
}

#[fixture]
#[allow(dead_code)] // Fixtures used across different integration test crates
pub fn documenter_payload() -> String {
    r##"var documenterSearchIndex = {"docs":
[{"location":"generated/model_tutorial/","page":"Using AbstractModel functionality","title":"Using AbstractModel functionality","text":"The AbstractModel framework allows users to define land component models.","category":"page"},{"location":"generated/model_tutorial/","page":"Using AbstractModel functionality","title":"Using AbstractModel functionality","text":"This tutorial introduces the interface functions and types.","category":"page"},{"location":"generated/model_tutorial/#Background","page":"Using AbstractModel functionality","title":"Background","text":"Prognostic and auxiliary variables.","category":"section"},{"location":"#ClimaLSM.jl","page":"Home","title":"ClimaLSM.jl","text":"A land surface model framework.","category":"section"}]
}
"##
    .to_string()
}
