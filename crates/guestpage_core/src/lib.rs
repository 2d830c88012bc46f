pub mod blocks;
pub mod config;
pub mod documents;
pub mod error;
pub mod markers;
pub mod model;
mod pipeline;
pub mod residual;
pub mod structural;
pub mod variable_block;

pub use crate::documents::{DocumentRole, render_document};
pub use crate::error::RewriteError;
pub use crate::model::{RenderConfig, Rewritten, StepOutcome};
