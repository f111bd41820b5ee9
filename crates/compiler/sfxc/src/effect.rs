use rustc_hash::FxHashSet;
use sfxir::layout::default_vertex_layout;
use sfxir::module::{EffectDecl, ProgramKind, TemplateRef};
use sfxir::{program_name, EffectBinding, Module, VariantValues};

use crate::error::CompileError;

/// An effect with its template chain followed to the effect that implements it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResolvedEffect<'a> {
    pub effect: &'a EffectDecl,
    /// The template this resolution derives from; empty for the effect's own implementation.
    pub template: TemplateRef,
    pub vertex: &'a str,
    pub pixel: &'a str,
    pub instancing: bool,
}

/// Resolves `effect` once for each template it derives from.
///
/// An effect that declares no templates, like every empty entry of the template list, resolves
/// to its own entry points under the empty template.
pub fn resolve_effect<'a>(
    module: &'a Module,
    effect: &'a EffectDecl,
) -> Result<Vec<ResolvedEffect<'a>>, CompileError> {
    if effect.templates.is_empty() {
        return Ok(vec![ResolvedEffect {
            effect,
            template: TemplateRef::none(),
            vertex: &effect.vertex,
            pixel: &effect.pixel,
            instancing: effect.instancing,
        }]);
    }

    effect
        .templates
        .iter()
        .map(|template| {
            if template.is_none() {
                return Ok(ResolvedEffect {
                    effect,
                    template: TemplateRef::none(),
                    vertex: &effect.vertex,
                    pixel: &effect.pixel,
                    instancing: effect.instancing,
                });
            }

            let root = resolve_template_root(module, effect, &template.name)?;

            Ok(ResolvedEffect {
                effect,
                template: template.clone(),
                vertex: &root.vertex,
                pixel: &root.pixel,
                instancing: root.instancing,
            })
        })
        .collect()
}

/// Follows the first parent of each ancestor without entry points, starting at `template`, to
/// the effect that supplies them.
fn resolve_template_root<'a>(
    module: &'a Module,
    effect: &EffectDecl,
    template: &str,
) -> Result<&'a EffectDecl, CompileError> {
    let missing = |name: &str| CompileError::MissingTemplate {
        module: module.name.clone(),
        effect: effect.name.clone(),
        template: name.to_string(),
    };

    let mut visited = FxHashSet::default();

    visited.insert(effect.name.as_str());

    let mut current = module.effect(template).ok_or_else(|| missing(template))?;

    while !current.has_entry_points() {
        let Some(parent) = current.parent() else {
            break;
        };

        if !visited.insert(current.name.as_str()) {
            return Err(CompileError::TemplateCycle {
                module: module.name.clone(),
                effect: effect.name.clone(),
                template: current.name.clone(),
            });
        }

        current = module
            .effect(&parent.name)
            .ok_or_else(|| missing(&parent.name))?;
    }

    if !current.has_entry_points() {
        return Err(CompileError::UnimplementedTemplate {
            module: module.name.clone(),
            effect: effect.name.clone(),
            template: current.name.clone(),
        });
    }

    Ok(current)
}

/// Resolves the programs and layouts of a resolved effect for one concrete variant.
pub fn bind_effect(
    backend: &str,
    module: &Module,
    resolved: &ResolvedEffect,
    variant: &VariantValues,
) -> Result<EffectBinding, CompileError> {
    let effect = &resolved.effect.name;

    let vertex = module
        .program(ProgramKind::Vertex, resolved.vertex)
        .ok_or_else(|| CompileError::MissingVertexProgram {
            module: module.name.clone(),
            effect: effect.clone(),
            entry_point: resolved.vertex.to_string(),
        })?;
    let pixel = module
        .program(ProgramKind::Pixel, resolved.pixel)
        .ok_or_else(|| CompileError::MissingPixelProgram {
            module: module.name.clone(),
            effect: effect.clone(),
            entry_point: resolved.pixel.to_string(),
        })?;

    let input_layout_name = if resolved.template.layout.is_empty() {
        &vertex.input_layout
    } else {
        &resolved.template.layout
    };

    let input_layout = if input_layout_name.is_empty() {
        default_vertex_layout()
    } else {
        module
            .layout(input_layout_name)
            .ok_or_else(|| CompileError::MissingInputLayout {
                module: module.name.clone(),
                effect: effect.clone(),
                layout: input_layout_name.clone(),
            })?
            .to_vertex_layout()
    };

    let target_formats = module
        .layout(&pixel.output_layout)
        .ok_or_else(|| CompileError::MissingOutputLayout {
            module: module.name.clone(),
            effect: effect.clone(),
            layout: pixel.output_layout.clone(),
        })?
        .to_surface_formats();

    let template = &resolved.template.name;
    let id = variant.id();

    Ok(EffectBinding {
        effect: effect.clone(),
        module: module.name.clone(),
        template: template.clone(),
        vertex_program: program_name(backend, &module.name, resolved.vertex, template, id),
        pixel_program: program_name(backend, &module.name, resolved.pixel, template, id),
        input_layout,
        target_formats,
        instancing: resolved.instancing,
        variant: variant.clone(),
    })
}
