//! The data model shared by the shader effect compiler and the run-time that consumes its
//! output.
//!
//! [Module] describes one unit of shader source as handed over by a front-end. The compiler
//! turns a set of modules into a [BindingTable], which can be written with
//! [BindingTable::to_bytes] and read back with [BindingTable::from_bytes].

pub mod binding;
pub mod layout;
pub mod module;
pub mod serialize;
pub mod table;
pub mod texture;
pub mod ty;
pub mod variant;

pub use self::binding::{
    BindingHeader, BindingKind, ConstantBinding, EffectBinding, InputBinding, TextureBinding,
    GLOBALS_MODULE,
};
pub use self::layout::{LayoutDecl, LayoutElement, SurfaceFormat, VertexElement};
pub use self::module::*;
pub use self::serialize::{BindingDecoder, DecodeError, EncodeError, StandardDecoder};
pub use self::table::{BindingTable, EffectRecord, ModuleRecord};
pub use self::texture::TextureBindingOptions;
pub use self::ty::ConstantType;
pub use self::variant::{VariantAxis, VariantId, VariantValues};

/// The folder, relative to the resource root, that holds compiled shader artifacts.
pub const SHADER_FOLDER: &str = "shaders";

/// The name of the binding table file produced for `backend`.
pub fn binding_table_file_name(backend: &str) -> String {
    format!("{}_bindingTable.bin", backend)
}

/// The name under which a program's byte code is stored.
///
/// `template` is empty for effects that do not derive from a template.
pub fn program_name(
    backend: &str,
    module: &str,
    entry_point: &str,
    template: &str,
    variant: VariantId,
) -> String {
    format!(
        "{}_{}.{}{}-{}",
        backend, module, entry_point, template, variant
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_name() {
        let variant: VariantValues = [("Quality", "Low")].into_iter().collect();

        assert_eq!(
            program_name("text", "Main", "vsMain", "", VariantId::from_u32(0)),
            "text_Main.vsMain-0"
        );
        assert_eq!(
            program_name("text", "Main", "vsMain", "Lit", variant.id()),
            format!("text_Main.vsMainLit-{}", variant.id())
        );
        assert_eq!(binding_table_file_name("text"), "text_bindingTable.bin");
    }
}
