use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;
use sfxir::module::{ConstantDecl, Module, ProgramKind, TextureDecl};
use sfxir::ty::{ConstantType, ScalarKind, TY_FLOAT4X4};
use sfxir::{BindingDecoder, InputBinding, LayoutDecl};

use crate::backend::{Backend, BackendError, ProgramSource, SlotAllocator};

pub const INSTANCE_MATRIX: &str = "INSTANCE_MATRIX";

static PAT_INSTANCE_MATRIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bINSTANCE_MATRIX\b").unwrap());

/// A register based backend whose "byte code" is the fully assembled source text.
///
/// Useful for inspecting the compiler's output and as the default when no native toolchain is
/// available.
#[derive(Clone, Debug)]
pub struct TextBackend {
    identifier: String,
}

impl TextBackend {
    pub fn new(identifier: &str) -> Self {
        TextBackend {
            identifier: identifier.to_string(),
        }
    }
}

impl Default for TextBackend {
    fn default() -> Self {
        TextBackend::new("text")
    }
}

/// Hands out float (`c`), int (`i`) and bool (`b`) constant registers and sampler (`s`) slots.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct RegisterAllocator {
    float: u32,
    int: u32,
    bool: u32,
    sampler: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum RegisterClass {
    Float,
    Int,
    Bool,
}

impl RegisterClass {
    fn of(ty: &ConstantType) -> Self {
        match ty.scalar() {
            ScalarKind::Int | ScalarKind::UInt => RegisterClass::Int,
            ScalarKind::Bool => RegisterClass::Bool,
            ScalarKind::Float | ScalarKind::Half => RegisterClass::Float,
        }
    }

    fn prefix(&self) -> char {
        match self {
            RegisterClass::Float => 'c',
            RegisterClass::Int => 'i',
            RegisterClass::Bool => 'b',
        }
    }
}

/// The number of 4-component registers one element of `ty` occupies.
fn register_count(ty: &ConstantType) -> u32 {
    match ty {
        ConstantType::Matrix { columns, .. } => columns.to_u32(),
        _ => 1,
    }
}

impl SlotAllocator for RegisterAllocator {
    fn allocate_constant(&mut self, constant: &ConstantDecl) -> Result<u32, BackendError> {
        let class = RegisterClass::of(&constant.ty);
        let counter = match class {
            RegisterClass::Float => &mut self.float,
            RegisterClass::Int => &mut self.int,
            RegisterClass::Bool => &mut self.bool,
        };

        let address = *counter;

        *counter = register_count(&constant.ty)
            .checked_mul(constant.array_size())
            .and_then(|count| address.checked_add(count))
            .ok_or_else(|| {
                BackendError::new(format!(
                    "constant `{}` does not fit in the `{}` registers",
                    constant.name,
                    class.prefix()
                ))
            })?;

        Ok(address)
    }

    fn allocate_texture(&mut self, texture: &TextureDecl) -> Result<u32, BackendError> {
        let address = self.sampler;

        self.sampler = address.checked_add(1).ok_or_else(|| {
            BackendError::new(format!(
                "texture `{}` does not fit in the sampler slots",
                texture.name
            ))
        })?;

        Ok(address)
    }
}

impl BindingDecoder for TextBackend {}

impl Backend for TextBackend {
    type Allocator = RegisterAllocator;

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn new_allocator(&self) -> Self::Allocator {
        RegisterAllocator::default()
    }

    fn sampling_expression(&self, texture: &str, coords: &str, lod: Option<&str>) -> String {
        match lod {
            Some(lod) => format!("tex2Dlod({}, float4({}, 0, {}))", texture, coords, lod),
            None => format!("tex2D({}, {})", texture, coords),
        }
    }

    fn implicit_constants(&self, module: &Module) -> Vec<ConstantDecl> {
        if PAT_INSTANCE_MATRIX.is_match(&module.body) {
            vec![ConstantDecl::new(INSTANCE_MATRIX, TY_FLOAT4X4)]
        } else {
            Vec::new()
        }
    }

    fn order_textures<'a>(&self, textures: Vec<&'a TextureDecl>) -> Vec<&'a TextureDecl> {
        let (geometry, shading): (Vec<_>, Vec<_>) = textures
            .into_iter()
            .partition(|t| t.options.is_geometry_visible());

        geometry.into_iter().chain(shading).collect()
    }

    fn input_declarations(&self, inputs: &[InputBinding]) -> String {
        let mut out = String::new();

        for input in inputs {
            match input {
                InputBinding::Constant(constant) => {
                    let array = if constant.array_size > 1 {
                        format!("[{}]", constant.array_size)
                    } else {
                        String::new()
                    };

                    writeln!(
                        out,
                        "{} {}{} : register({}{});",
                        constant.ty,
                        constant.header.name,
                        array,
                        RegisterClass::of(&constant.ty).prefix(),
                        constant.header.address
                    )
                    .unwrap();
                }
                InputBinding::Texture(texture) => {
                    writeln!(
                        out,
                        "sampler {} : register(s{});",
                        texture.header.name, texture.header.address
                    )
                    .unwrap();
                }
            }
        }

        out
    }

    fn layout_declaration(&self, layout: &LayoutDecl) -> String {
        let mut out = format!("struct {}\n{{\n", layout.name);

        for element in &layout.elements {
            writeln!(
                out,
                "    {} {} : {};",
                element.ty, element.name, element.semantic
            )
            .unwrap();
        }

        out.push_str("};\n");

        out
    }

    fn compile(&self, program: &ProgramSource) -> Result<Vec<u8>, BackendError> {
        if program.entry_point.is_empty() {
            return Err(BackendError::new("missing entry point"));
        }

        let kind = match program.kind {
            ProgramKind::Vertex => "vertex",
            ProgramKind::Pixel => "pixel",
        };

        let mut out = format!(
            "// {} program `{}` (entry point `{}`)\n",
            kind, program.name, program.entry_point
        );

        if program.instancing {
            out.push_str("#define INSTANCING 1\n");
        }

        if !program.optimize {
            out.push_str("#define DEBUG 1\n");
        }

        out.push_str(program.source);

        Ok(out.into_bytes())
    }

    fn disassemble(&self, byte_code: &[u8]) -> Option<String> {
        Some(String::from_utf8_lossy(byte_code).into_owned())
    }
}
