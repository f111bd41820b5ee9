//! Compiles shader effect modules into a [BindingTable](sfxir::BindingTable).
//!
//! The passes run in a fixed order:
//!
//! 1. global inputs of all modules are bound ([input::bind_globals]);
//! 2. every module is merged with its includes ([include::resolve_includes]) and its call sites
//!    are checked ([validate::validate_call_sites]);
//! 3. the variant axes of every module are recorded ([variant::bind_variants]);
//! 4. every module is unrolled into its concrete variants ([variant::unroll]), and for each
//!    variant the inputs are bound, the source is assembled, the effects are resolved and bound
//!    and the programs are compiled by the [Backend](backend::Backend).
//!
//! [Compiler] drives these passes.

pub mod artifact;
pub mod backend;
pub mod compiler;
pub mod effect;
pub mod error;
pub mod include;
pub mod input;
pub mod source;
pub mod validate;
pub mod variant;

pub use self::compiler::{CompileOutput, Compiler, CompilerConfig, DebugArtifact};
pub use self::error::CompileError;
