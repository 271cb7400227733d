pub mod classification_service;
pub mod correction;
pub mod solution_service;
pub mod variant_service;

pub use classification_service::{parse_classification, strip_code_fence, ClassificationService};
pub use correction::{ClassificationEdit, CorrectionForm};
pub use solution_service::SolutionService;
pub use variant_service::VariantService;
