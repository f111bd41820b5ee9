use indexmap::IndexMap;
use regex::Regex;
use sfxir::module::{ConstantDecl, TextureDecl};
use sfxir::{
    BindingHeader, BindingTable, ConstantBinding, InputBinding, Module, TextureBinding,
    GLOBALS_MODULE,
};
use tracing::debug;

use crate::backend::{Backend, BackendError, SlotAllocator};
use crate::error::CompileError;

/// Binds the global inputs of all modules under [GLOBALS_MODULE].
///
/// Returns the allocator state every module starts from when its own inputs are bound.
pub fn bind_globals<B: Backend>(
    backend: &B,
    modules: &[Module],
    table: &mut BindingTable,
) -> Result<B::Allocator, CompileError> {
    let mut constants: IndexMap<&str, &ConstantDecl> = IndexMap::new();
    let mut textures: IndexMap<&str, &TextureDecl> = IndexMap::new();

    for module in modules {
        for constant in &module.constants {
            if constant.flags.global && !constant.flags.compile_time {
                constants.entry(&constant.name).or_insert(constant);
            }
        }

        for texture in &module.textures {
            if texture.global && !texture.is_parameter {
                textures.entry(&texture.name).or_insert(texture);
            }
        }
    }

    let mut allocator = backend.new_allocator();

    for constant in constants.into_values() {
        let address = allocator
            .allocate_constant(constant)
            .map_err(allocation_error(GLOBALS_MODULE, &constant.name))?;

        table.bind_input(constant_binding(GLOBALS_MODULE, constant, address));
    }

    for texture in backend.order_textures(textures.into_values().collect()) {
        let address = allocator
            .allocate_texture(texture)
            .map_err(allocation_error(GLOBALS_MODULE, &texture.name))?;

        table.bind_input(texture_binding(GLOBALS_MODULE, texture, address));
    }

    Ok(allocator)
}

/// Binds the inputs of one concrete variant of a module.
///
/// Returns the bindings of every input the module uses, globals included, in declaration order.
pub fn bind_module<B: Backend>(
    backend: &B,
    local_base: &B::Allocator,
    module: &Module,
    table: &mut BindingTable,
) -> Result<Vec<InputBinding>, CompileError> {
    let derived = derived_constants(backend, module);

    // Later declarations of the same name shadow earlier ones.
    let mut constants: IndexMap<&str, &ConstantDecl> = IndexMap::new();

    for constant in module.constants.iter().chain(&derived) {
        if !constant.flags.compile_time {
            constants.insert(&constant.name, constant);
        }
    }

    let mut textures: IndexMap<&str, &TextureDecl> = IndexMap::new();

    for texture in &module.textures {
        if !texture.is_parameter {
            textures.insert(&texture.name, texture);
        }
    }

    let mut allocator = local_base.clone();
    let mut used = Vec::with_capacity(constants.len() + textures.len());

    for constant in constants.into_values() {
        if constant.flags.global {
            used.extend(table.get_input(GLOBALS_MODULE, &constant.name).cloned());
        } else {
            let address = allocator
                .allocate_constant(constant)
                .map_err(allocation_error(&module.name, &constant.name))?;
            let binding = constant_binding(&module.name, constant, address);

            debug!(
                module = module.name.as_str(),
                constant = constant.name.as_str(),
                address,
                "bound constant"
            );

            table.bind_input(binding.clone());
            used.push(binding.into());
        }
    }

    for texture in backend.order_textures(textures.into_values().collect()) {
        if texture.global {
            used.extend(table.get_input(GLOBALS_MODULE, &texture.name).cloned());
        } else {
            let address = allocator
                .allocate_texture(texture)
                .map_err(allocation_error(&module.name, &texture.name))?;
            let binding = texture_binding(&module.name, texture, address);

            debug!(
                module = module.name.as_str(),
                texture = texture.name.as_str(),
                address,
                "bound texture"
            );

            table.bind_input(binding.clone());
            used.push(binding.into());
        }
    }

    Ok(used)
}

fn allocation_error<'a>(
    module: &'a str,
    input: &'a str,
) -> impl FnOnce(BackendError) -> CompileError + 'a {
    move |source| CompileError::Allocation {
        module: module.to_string(),
        input: input.to_string(),
        source,
    }
}

/// Constants the module needs without declaring them: texel sizes of textures the body asks for
/// and whatever the backend adds implicitly.
fn derived_constants<B: Backend>(backend: &B, module: &Module) -> Vec<ConstantDecl> {
    let mut derived = Vec::new();

    for texture in &module.textures {
        if texture.is_parameter {
            continue;
        }

        let expression = backend.texel_size_expression(&texture.name);

        if references(&module.body, &expression) {
            let constant = backend.texel_size_constant(&texture.name);

            if module.constant(&constant.name).is_none() {
                derived.push(constant);
            }
        }
    }

    for constant in backend.implicit_constants(module) {
        if module.constant(&constant.name).is_none() {
            derived.push(constant);
        }
    }

    derived
}

/// Whether `body` contains `expression` as a whole token.
fn references(body: &str, expression: &str) -> bool {
    let pattern = format!(r"(^|[^\w]){}($|[^\w])", regex::escape(expression));

    Regex::new(&pattern)
        .map(|re| re.is_match(body))
        .unwrap_or(false)
}

fn constant_binding(module: &str, constant: &ConstantDecl, address: u32) -> ConstantBinding {
    ConstantBinding {
        header: BindingHeader {
            name: constant.name.clone(),
            module: module.to_string(),
            address,
        },
        ty: constant.ty,
        array_size: constant.array_size(),
    }
}

fn texture_binding(module: &str, texture: &TextureDecl, address: u32) -> TextureBinding {
    TextureBinding {
        header: BindingHeader {
            name: texture.name.clone(),
            module: module.to_string(),
            address,
        },
        options: texture.options,
        border_color: texture.border_color,
        global: texture.global,
    }
}
