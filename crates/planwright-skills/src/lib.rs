//! # Planwright Skills
//!
//! Concrete skill providers registered into the function registry at
//! startup. The engine core only depends on the registry's read
//! contract; everything here is an external collaborator supplying
//! descriptors through [`SkillProvider`].

pub mod email;
pub mod search;
pub mod text;

use planwright_core::{FunctionRegistry, Result};

pub use email::{EmailSkill, SmtpConfig};
pub use search::{SearchConfig, SearchSkill};
pub use text::TextSkill;

/// A source of function descriptors, wired in once at process start.
pub trait SkillProvider {
    /// Register this skill's functions.
    fn register_into(&self, registry: &mut FunctionRegistry) -> Result<()>;
}
