//! The seam between the target-independent passes and a concrete graphics API.
//!
//! A [Backend] decides where inputs live (through its [SlotAllocator]), how generated
//! declarations and intrinsics are spelled, and turns assembled source text into program byte
//! code.

mod text;

pub use self::text::{RegisterAllocator, TextBackend};

use sfxir::module::{ConstantDecl, Module, ProgramKind, TextureDecl};
use sfxir::ty::TY_FLOAT2;
use sfxir::{BindingDecoder, InputBinding, LayoutDecl};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Assigns addresses to inputs.
///
/// An allocator is cloned from the state left behind by the global inputs for every module, so
/// addresses only need to be deterministic for a given declaration order. Allocation fails when
/// the input does not fit in the remaining address space.
pub trait SlotAllocator: Clone {
    fn allocate_constant(&mut self, constant: &ConstantDecl) -> Result<u32, BackendError>;

    fn allocate_texture(&mut self, texture: &TextureDecl) -> Result<u32, BackendError>;
}

/// Describes the program that a backend is asked to compile.
#[derive(Clone, Copy, Debug)]
pub struct ProgramSource<'a> {
    /// The name under which the byte code is stored in the binding table.
    pub name: &'a str,
    pub entry_point: &'a str,
    pub kind: ProgramKind,
    pub instancing: bool,
    pub optimize: bool,
    /// The complete source text of the variant the program belongs to.
    pub source: &'a str,
}

pub trait Backend: BindingDecoder {
    type Allocator: SlotAllocator;

    /// A short name that prefixes every artifact the backend produces.
    fn identifier(&self) -> &str;

    fn new_allocator(&self) -> Self::Allocator;

    /// The constant that holds the size of one texel of `texture`.
    fn texel_size_constant(&self, texture: &str) -> ConstantDecl {
        ConstantDecl::new(&format!("{}TexelSize", texture), TY_FLOAT2)
    }

    /// The expression a body uses to read the texel size of `texture`.
    fn texel_size_expression(&self, texture: &str) -> String {
        format!("{}TexelSize", texture)
    }

    fn sampling_expression(&self, texture: &str, coords: &str, lod: Option<&str>) -> String;

    /// Constants that the backend needs in addition to the ones a module declares.
    fn implicit_constants(&self, _module: &Module) -> Vec<ConstantDecl> {
        Vec::new()
    }

    /// Puts textures in the order in which they receive slots.
    fn order_textures<'a>(&self, textures: Vec<&'a TextureDecl>) -> Vec<&'a TextureDecl> {
        textures
    }

    /// Declares every input a variant uses, at the address recorded in its binding.
    fn input_declarations(&self, inputs: &[InputBinding]) -> String;

    fn layout_declaration(&self, layout: &LayoutDecl) -> String;

    fn preprocess(&self, body: &str) -> String {
        body.to_string()
    }

    fn compile(&self, program: &ProgramSource) -> Result<Vec<u8>, BackendError>;

    fn disassemble(&self, _byte_code: &[u8]) -> Option<String> {
        None
    }
}
