pub mod classification;
pub mod image;
pub mod loaders;
pub mod taxonomy;
pub mod variant;

pub use classification::{Classification, ClassificationPolicy};
pub use image::{MediaType, ProblemImage};
pub use loaders::{load_taxonomy_from_toml, parse_taxonomy_toml};
pub use taxonomy::{GradeEntry, Taxonomy, TaxonomyNode, UnitEntry};
pub use variant::{Solution, SolutionKind, SolutionPart, VariantProblem};
