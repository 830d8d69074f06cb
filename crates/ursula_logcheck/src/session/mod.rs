mod error;
mod events;
mod ingest;
mod scene;

pub use error::{CheckError, BAD_PARAMETERS_CODE, FORMAT_ERROR_CODE};
pub use ingest::IngestedSession;
pub use scene::{SceneObject, SceneValidation};

pub(crate) use ingest::ingest_log;
