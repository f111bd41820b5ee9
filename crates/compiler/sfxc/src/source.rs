use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use sfxir::{InputBinding, Module};

use crate::backend::Backend;
use crate::error::CompileError;

static PAT_TEXEL_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btexelSize\(\s*(\w+)\s*\)").unwrap());
static PAT_SAMPLE_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bsampleLevel\(\s*(\w+)\s*,\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)").unwrap()
});
static PAT_SAMPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsample\(\s*(\w+)\s*,\s*([^,()]+?)\s*\)").unwrap());

/// Rewrites the texture intrinsics of a body into the backend's spelling.
///
/// - `texelSize(tex)`
/// - `sample(tex, coords)`
/// - `sampleLevel(tex, coords, lod)`
///
/// Arguments may not contain parentheses or commas.
pub fn lower_intrinsics<B: Backend>(backend: &B, body: &str) -> String {
    let body = PAT_TEXEL_SIZE.replace_all(body, |caps: &Captures| {
        backend.texel_size_expression(&caps[1])
    });
    let body = PAT_SAMPLE_LEVEL.replace_all(&body, |caps: &Captures| {
        backend.sampling_expression(&caps[1], &caps[2], Some(&caps[3]))
    });
    let body = PAT_SAMPLE.replace_all(&body, |caps: &Captures| {
        backend.sampling_expression(&caps[1], &caps[2], None)
    });

    body.into_owned()
}

/// Assembles the complete source text of one concrete variant.
///
/// The text consists of the input declarations, the template type definitions, the layout and
/// struct declarations and finally the preprocessed body.
pub fn assemble_source<B: Backend>(
    backend: &B,
    module: &Module,
    inputs: &[InputBinding],
) -> Result<String, CompileError> {
    let mut source = backend.input_declarations(inputs);

    for template_type in &module.template_types {
        if template_type.declared.is_empty() {
            continue;
        }

        if template_type.implementation.is_empty() {
            if module.has_concrete_effects() {
                return Err(CompileError::IncompleteTemplateType {
                    module: module.name.clone(),
                    function: template_type.function.clone(),
                    declared: template_type.declared.clone(),
                });
            }

            continue;
        }

        writeln!(
            source,
            "#define {} {}",
            template_type.declared, template_type.implementation
        )
        .unwrap();
    }

    for layout in &module.layouts {
        source.push_str(&backend.layout_declaration(layout));
    }

    for decl in &module.structs {
        source.push_str(&decl.source);

        if !decl.source.ends_with('\n') {
            source.push('\n');
        }
    }

    source.push_str(&backend.preprocess(&module.body));

    Ok(source)
}

#[cfg(test)]
mod tests {
    use sfxir::module::{EffectDecl, StructDecl, TemplateTypeDecl};
    use sfxir::{LayoutDecl, LayoutElement};

    use super::*;
    use crate::backend::TextBackend;

    #[test]
    fn test_lower_intrinsics() {
        let backend = TextBackend::default();

        let body = "float2 px = texelSize(Albedo);\n\
                    float4 a = sample(Albedo, uv + px);\n\
                    float4 b = sampleLevel( Albedo , uv, 2 );\n\
                    float4 c = resample(x, y);";

        assert_eq!(
            lower_intrinsics(&backend, body),
            "float2 px = AlbedoTexelSize;\n\
             float4 a = tex2D(Albedo, uv + px);\n\
             float4 b = tex2Dlod(Albedo, float4(uv, 0, 2));\n\
             float4 c = resample(x, y);"
        );
    }

    #[test]
    fn test_assemble_source_order() {
        let backend = TextBackend::default();
        let mut module = Module::new("Main");

        module.body = "body".to_string();
        module.layouts.push(LayoutDecl::new(
            "In",
            vec![LayoutElement::new("float3", "POSITION", "pos")],
        ));
        module.structs.push(StructDecl {
            name: "Light".to_string(),
            source: "struct Light { float3 dir; };".to_string(),
        });

        let mut material = TemplateTypeDecl::declare("shade", "Material");

        material.merge(&TemplateTypeDecl::implement("shade", "Phong"));
        module.template_types.push(material);

        let source = assemble_source(&backend, &module, &[]).unwrap();

        assert_eq!(
            source,
            "#define Material Phong\n\
             struct In\n{\n    float3 pos : POSITION;\n};\n\
             struct Light { float3 dir; };\n\
             body"
        );
    }

    #[test]
    fn test_unimplemented_template_type() {
        let backend = TextBackend::default();
        let mut module = Module::new("Main");

        module
            .template_types
            .push(TemplateTypeDecl::declare("shade", "Material"));

        assert!(assemble_source(&backend, &module, &[]).is_ok());

        module.effects.push(EffectDecl::root("E", "vs", "ps"));

        assert_eq!(
            assemble_source(&backend, &module, &[]).unwrap_err().code(),
            "SC0005"
        );
    }
}
