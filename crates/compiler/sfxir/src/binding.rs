use serde::{Deserialize, Serialize};

use crate::layout::{SurfaceFormat, VertexElement};
use crate::texture::TextureBindingOptions;
use crate::ty::ConstantType;
use crate::variant::VariantValues;

/// Name of the pseudo-module under which global inputs are recorded.
pub const GLOBALS_MODULE: &str = "$globals";

/// The discriminant written before every input binding payload in a serialized table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum BindingKind {
    Constant,
    Texture,
}

/// Where a named shader input lives, as seen by the run-time.
#[derive(Clone, PartialEq, Debug)]
pub enum InputBinding {
    Constant(ConstantBinding),
    Texture(TextureBinding),
}

impl InputBinding {
    pub fn kind(&self) -> BindingKind {
        match self {
            InputBinding::Constant(_) => BindingKind::Constant,
            InputBinding::Texture(_) => BindingKind::Texture,
        }
    }

    pub fn header(&self) -> &BindingHeader {
        match self {
            InputBinding::Constant(binding) => &binding.header,
            InputBinding::Texture(binding) => &binding.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn module(&self) -> &str {
        &self.header().module
    }

    pub fn address(&self) -> u32 {
        self.header().address
    }

    pub fn as_constant(&self) -> Option<&ConstantBinding> {
        if let InputBinding::Constant(binding) = self {
            Some(binding)
        } else {
            None
        }
    }

    pub fn as_texture(&self) -> Option<&TextureBinding> {
        if let InputBinding::Texture(binding) = self {
            Some(binding)
        } else {
            None
        }
    }
}

impl From<ConstantBinding> for InputBinding {
    fn from(binding: ConstantBinding) -> Self {
        InputBinding::Constant(binding)
    }
}

impl From<TextureBinding> for InputBinding {
    fn from(binding: TextureBinding) -> Self {
        InputBinding::Texture(binding)
    }
}

/// The data shared by all input bindings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BindingHeader {
    pub name: String,
    pub module: String,
    pub address: u32,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ConstantBinding {
    pub header: BindingHeader,
    pub ty: ConstantType,
    pub array_size: u32,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct TextureBinding {
    pub header: BindingHeader,
    pub options: TextureBindingOptions,
    pub border_color: [f32; 3],
    pub global: bool,
}

/// A fully resolved effect for one template and one concrete variant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct EffectBinding {
    pub effect: String,
    pub module: String,
    pub template: String,
    pub vertex_program: String,
    pub pixel_program: String,
    pub input_layout: Vec<VertexElement>,
    pub target_formats: Vec<SurfaceFormat>,
    pub instancing: bool,
    pub variant: VariantValues,
}
