pub mod presenter;
pub mod session_state;
pub mod tutor_flow;

pub use presenter::{Presenter, UserEvent};
pub use session_state::{ClassificationOrigin, PipelineStage, SessionState};
pub use tutor_flow::TutorFlow;
