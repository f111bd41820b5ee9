use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named, ordered group of fields used as a program's input or output signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct LayoutDecl {
    pub name: String,
    pub elements: Vec<LayoutElement>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct LayoutElement {
    pub ty: String,
    pub semantic: String,
    pub name: String,
}

impl LayoutElement {
    pub fn new(ty: &str, semantic: &str, name: &str) -> Self {
        LayoutElement {
            ty: ty.to_string(),
            semantic: semantic.to_string(),
            name: name.to_string(),
        }
    }

    fn is_position(&self) -> bool {
        let semantic = self.semantic.to_ascii_uppercase();

        semantic == "POSITION" || semantic == "POSITION0"
    }

    /// The render target index encoded as the trailing digit of the semantic, `COLOR1` -> `1`.
    fn attachment_index(&self) -> usize {
        self.semantic
            .chars()
            .last()
            .and_then(|c| c.to_digit(10))
            .unwrap_or(0) as usize
    }
}

impl LayoutDecl {
    pub fn new(name: &str, elements: Vec<LayoutElement>) -> Self {
        LayoutDecl {
            name: name.to_string(),
            elements,
        }
    }

    /// The vertex stream layout equivalent to this layout when used as a vertex program input.
    pub fn to_vertex_layout(&self) -> Vec<VertexElement> {
        self.elements
            .iter()
            .map(|element| match element.ty.as_str() {
                "float" => VertexElement::Float,
                "float2" if element.is_position() => VertexElement::Position2,
                "float2" => VertexElement::Float2,
                "float3" if element.is_position() => VertexElement::Position3,
                "float3" => VertexElement::Float3,
                "float4" if element.is_position() => VertexElement::Position4,
                "float4" => VertexElement::Float4,
                ty => {
                    warn!(
                        layout = self.name.as_str(),
                        field = element.name.as_str(),
                        "unsupported vertex element type `{}`, using float3",
                        ty
                    );

                    VertexElement::Float3
                }
            })
            .collect()
    }

    /// The render target formats equivalent to this layout when used as a pixel program output.
    ///
    /// There is one format per element, and each element lands at the index given by its
    /// semantic. Elements whose index is out of range are ignored.
    pub fn to_surface_formats(&self) -> Vec<SurfaceFormat> {
        let mut formats = vec![SurfaceFormat::Color; self.elements.len()];

        for element in &self.elements {
            let format = match element.ty.as_str() {
                "color" => SurfaceFormat::Color,
                "float" => SurfaceFormat::Float,
                "float2" => SurfaceFormat::Float2,
                "float4" => SurfaceFormat::Float4,
                "half" => SurfaceFormat::Half,
                "half2" => SurfaceFormat::Half2,
                "half4" => SurfaceFormat::Half4,
                ty => {
                    warn!(
                        layout = self.name.as_str(),
                        field = element.name.as_str(),
                        "unsupported surface format type `{}`, using color",
                        ty
                    );

                    SurfaceFormat::Color
                }
            };

            let index = element.attachment_index();

            match formats.get_mut(index) {
                Some(slot) => *slot = format,
                None => warn!(
                    layout = self.name.as_str(),
                    field = element.name.as_str(),
                    "attachment index {} is outside of the {} outputs, ignoring it",
                    index,
                    self.elements.len()
                ),
            }
        }

        formats
    }
}

/// The layout used for vertex programs that declare no input layout.
pub fn default_vertex_layout() -> Vec<VertexElement> {
    vec![VertexElement::Position3]
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum VertexElement {
    Position2 = 1,
    Position3 = 2,
    Position4 = 4,
    Float = 8,
    Float2 = 16,
    Float3 = 32,
    Float4 = 64,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum SurfaceFormat {
    Dds = 0,
    Color = 1,
    Half = 2,
    Half2 = 3,
    Half4 = 4,
    Float = 5,
    Float2 = 6,
    Float4 = 7,
    AntialiasedColor = 8,
}
