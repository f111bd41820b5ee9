use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::layout::LayoutDecl;
use crate::texture::TextureBindingOptions;
use crate::ty::ConstantType;
use crate::variant::VariantAxis;

/// One unit of shader source: its body text and all of the declarations a front-end extracted
/// from it.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Module {
    pub name: String,
    pub body: String,
    pub includes: Vec<String>,
    pub constants: Vec<ConstantDecl>,
    pub textures: Vec<TextureDecl>,
    pub layouts: Vec<LayoutDecl>,
    pub programs: Vec<ProgramDecl>,
    pub effects: Vec<EffectDecl>,
    pub variants: Vec<VariantAxis>,
    pub structs: Vec<StructDecl>,
    pub template_types: Vec<TemplateTypeDecl>,
    pub functions: Vec<FunctionDecl>,
    pub call_sites: Vec<CallSite>,
    /// Textures that the body references but that the module does not declare itself.
    pub external_textures: IndexSet<String>,
}

impl Module {
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Appends all declarations of `other` to this module.
    ///
    /// Declarations already present keep their position; by-name lookups on the module resolve
    /// to the last declaration, so appended declarations shadow earlier ones.
    pub fn append(&mut self, other: &Module) {
        if !other.body.is_empty() {
            if !self.body.is_empty() && !self.body.ends_with('\n') {
                self.body.push('\n');
            }

            self.body.push_str(&other.body);
        }

        self.constants.extend(other.constants.iter().cloned());
        self.textures.extend(other.textures.iter().cloned());
        self.layouts.extend(other.layouts.iter().cloned());
        self.programs.extend(other.programs.iter().cloned());
        self.effects.extend(other.effects.iter().cloned());
        self.structs.extend(other.structs.iter().cloned());
        self.functions.extend(other.functions.iter().cloned());
        self.call_sites.extend(other.call_sites.iter().cloned());

        for axis in &other.variants {
            if let Some(existing) = self.variants.iter_mut().find(|a| a.name == axis.name) {
                existing.values = axis.values.clone();
            } else {
                self.variants.push(axis.clone());
            }
        }

        for template_type in &other.template_types {
            if let Some(existing) = self
                .template_types
                .iter_mut()
                .find(|t| t.function == template_type.function)
            {
                existing.merge(template_type);
            } else {
                self.template_types.push(template_type.clone());
            }
        }

        self.external_textures
            .extend(other.external_textures.iter().cloned());
        self.external_textures
            .retain(|name| !self.textures.iter().any(|t| &t.name == name));
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantDecl> {
        self.constants.iter().rev().find(|c| c.name == name)
    }

    pub fn texture(&self, name: &str) -> Option<&TextureDecl> {
        self.textures.iter().rev().find(|t| t.name == name)
    }

    pub fn layout(&self, name: &str) -> Option<&LayoutDecl> {
        self.layouts.iter().rev().find(|l| l.name == name)
    }

    pub fn program(&self, kind: ProgramKind, entry_point: &str) -> Option<&ProgramDecl> {
        self.programs
            .iter()
            .rev()
            .find(|p| p.kind == kind && p.entry_point == entry_point)
    }

    pub fn effect(&self, name: &str) -> Option<&EffectDecl> {
        self.effects.iter().rev().find(|e| e.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().rev().find(|f| f.name == name)
    }

    /// Whether the module defines at least one effect that is bound and compiled.
    pub fn has_concrete_effects(&self) -> bool {
        self.effects.iter().any(|e| !e.is_template)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct ConstantFlags {
    /// Shared by all modules and bound once.
    pub global: bool,
    /// Expected to change frequently at run time.
    pub dynamic: bool,
    /// Folded into the source; never visible to the CPU.
    pub compile_time: bool,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ConstantDecl {
    pub name: String,
    pub ty: ConstantType,
    #[serde(default)]
    pub array_len: Option<u32>,
    #[serde(default)]
    pub flags: ConstantFlags,
}

impl ConstantDecl {
    pub fn new(name: &str, ty: ConstantType) -> Self {
        ConstantDecl {
            name: name.to_string(),
            ty,
            array_len: None,
            flags: ConstantFlags::default(),
        }
    }

    pub fn global(mut self) -> Self {
        self.flags.global = true;

        self
    }

    pub fn dynamic(mut self) -> Self {
        self.flags.dynamic = true;

        self
    }

    pub fn compile_time(mut self) -> Self {
        self.flags.compile_time = true;

        self
    }

    pub fn array(mut self, len: u32) -> Self {
        self.array_len = Some(len);

        self
    }

    /// The number of elements; `1` for non-array constants.
    pub fn array_size(&self) -> u32 {
        self.array_len.unwrap_or(1)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct TextureDecl {
    pub name: String,
    #[serde(default)]
    pub options: TextureBindingOptions,
    #[serde(default)]
    pub border_color: [f32; 3],
    #[serde(default)]
    pub global: bool,
    /// Function parameters only name a texture within a call and are never bound.
    #[serde(default)]
    pub is_parameter: bool,
}

impl TextureDecl {
    pub fn new(name: &str) -> Self {
        TextureDecl {
            name: name.to_string(),
            options: TextureBindingOptions::default(),
            border_color: [0.0; 3],
            global: false,
            is_parameter: false,
        }
    }

    pub fn with_options(mut self, options: TextureBindingOptions) -> Self {
        self.options = options;

        self
    }

    pub fn global(mut self) -> Self {
        self.global = true;

        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum ProgramKind {
    Vertex,
    Pixel,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ProgramDecl {
    pub entry_point: String,
    pub kind: ProgramKind,
    #[serde(default)]
    pub input_layout: String,
    #[serde(default)]
    pub output_layout: String,
    #[serde(default)]
    pub instancing: bool,
}

impl ProgramDecl {
    pub fn vertex(entry_point: &str, input_layout: &str, output_layout: &str) -> Self {
        ProgramDecl {
            entry_point: entry_point.to_string(),
            kind: ProgramKind::Vertex,
            input_layout: input_layout.to_string(),
            output_layout: output_layout.to_string(),
            instancing: false,
        }
    }

    pub fn pixel(entry_point: &str, input_layout: &str, output_layout: &str) -> Self {
        ProgramDecl {
            entry_point: entry_point.to_string(),
            kind: ProgramKind::Pixel,
            input_layout: input_layout.to_string(),
            output_layout: output_layout.to_string(),
            instancing: false,
        }
    }
}

/// A (parent template, layout override) pair of a derived effect.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Debug)]
pub struct TemplateRef {
    pub name: String,
    #[serde(default)]
    pub layout: String,
}

impl TemplateRef {
    pub fn new(name: &str, layout: &str) -> Self {
        TemplateRef {
            name: name.to_string(),
            layout: layout.to_string(),
        }
    }

    /// The reference used by effects that derive from nothing.
    pub fn none() -> Self {
        TemplateRef::default()
    }

    pub fn is_none(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct EffectDecl {
    pub name: String,
    pub is_template: bool,
    pub vertex: String,
    pub pixel: String,
    pub instancing: bool,
    pub templates: Vec<TemplateRef>,
}

impl EffectDecl {
    pub fn root(name: &str, vertex: &str, pixel: &str) -> Self {
        EffectDecl {
            name: name.to_string(),
            vertex: vertex.to_string(),
            pixel: pixel.to_string(),
            ..Default::default()
        }
    }

    pub fn template(name: &str, vertex: &str, pixel: &str) -> Self {
        EffectDecl {
            is_template: true,
            ..EffectDecl::root(name, vertex, pixel)
        }
    }

    pub fn derived(name: &str, templates: Vec<TemplateRef>) -> Self {
        EffectDecl {
            name: name.to_string(),
            templates,
            ..Default::default()
        }
    }

    pub fn as_template(mut self) -> Self {
        self.is_template = true;

        self
    }

    /// The first parent template, if this effect derives from one.
    pub fn parent(&self) -> Option<&TemplateRef> {
        self.templates.first().filter(|t| !t.is_none())
    }

    pub fn is_derived(&self) -> bool {
        self.parent().is_some()
    }

    pub fn has_entry_points(&self) -> bool {
        !self.vertex.is_empty() && !self.pixel.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct StructDecl {
    pub name: String,
    pub source: String,
}

/// A type that a template forward-declares and that a derived module implements.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct TemplateTypeDecl {
    /// The template function whose signature introduces the type.
    pub function: String,
    #[serde(default)]
    pub declared: String,
    #[serde(default)]
    pub implementation: String,
}

impl TemplateTypeDecl {
    pub fn declare(function: &str, declared: &str) -> Self {
        TemplateTypeDecl {
            function: function.to_string(),
            declared: declared.to_string(),
            implementation: String::new(),
        }
    }

    pub fn implement(function: &str, implementation: &str) -> Self {
        TemplateTypeDecl {
            function: function.to_string(),
            declared: String::new(),
            implementation: implementation.to_string(),
        }
    }

    pub fn merge(&mut self, other: &TemplateTypeDecl) {
        if !other.declared.is_empty() {
            self.declared = other.declared.clone();
        }

        if self.implementation.is_empty() {
            self.implementation = other.implementation.clone();
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Debug)]
pub enum ParamModifier {
    #[default]
    None,
    Out,
    InOut,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<ParamModifier>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct CallSite {
    pub function: String,
    pub args: Vec<ParamModifier>,
    #[serde(default)]
    pub line: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::TY_FLOAT3;

    #[test]
    fn test_append_resolves_external_textures() {
        let mut module = Module::new("Main");

        module.external_textures.insert("Albedo".to_string());
        module.external_textures.insert("Normals".to_string());

        let mut lib = Module::new("Lib");

        lib.textures.push(TextureDecl::new("Albedo"));

        module.append(&lib);

        assert_eq!(
            module.external_textures.iter().collect::<Vec<_>>(),
            vec!["Normals"]
        );
    }

    #[test]
    fn test_append_shadows_by_name() {
        let mut module = Module::new("Main");

        module.constants.push(ConstantDecl::new("Tint", TY_FLOAT3));

        let mut other = Module::new("Other");

        other
            .constants
            .push(ConstantDecl::new("Tint", TY_FLOAT3).dynamic());

        module.append(&other);

        assert_eq!(module.constants.len(), 2);
        assert!(module.constant("Tint").unwrap().flags.dynamic);
    }

    #[test]
    fn test_append_deduplicates_axes() {
        let mut module = Module::new("Main");

        module.variants.push(VariantAxis::new("Quality", &["Low", "High"]));

        let mut other = Module::new("Other");

        other
            .variants
            .push(VariantAxis::new("Quality", &["Low", "Medium", "High"]));
        other.variants.push(VariantAxis::boolean("Fog"));

        module.append(&other);

        assert_eq!(module.variants.len(), 2);
        assert_eq!(module.variants[0].values.len(), 3);
        assert_eq!(module.variants[1].name, "Fog");
    }

    #[test]
    fn test_template_type_merge() {
        let mut decl = TemplateTypeDecl::declare("shade", "Material");

        decl.merge(&TemplateTypeDecl::implement("shade", "PhongMaterial"));
        decl.merge(&TemplateTypeDecl::implement("shade", "OtherMaterial"));

        assert_eq!(decl.declared, "Material");
        assert_eq!(decl.implementation, "PhongMaterial");
    }

    #[test]
    fn test_effect_parent() {
        assert!(!EffectDecl::root("E", "vs", "ps").is_derived());
        assert!(!EffectDecl::derived("E", vec![TemplateRef::none()]).is_derived());
        assert!(EffectDecl::derived("E", vec![TemplateRef::new("T", "Layout")]).is_derived());
    }
}
