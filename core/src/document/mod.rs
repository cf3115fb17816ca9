mod kind;
mod model;

pub use kind::{DocumentKind, UnknownKind};
pub use model::Document;
