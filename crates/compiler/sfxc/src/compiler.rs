use serde::{Deserialize, Serialize};
use sfxir::module::ProgramKind;
use sfxir::{BindingTable, EffectBinding, Module};
use tracing::{debug, info, instrument};

use crate::backend::{Backend, ProgramSource};
use crate::effect::{bind_effect, resolve_effect};
use crate::error::CompileError;
use crate::include::{resolve_includes, ModuleSet};
use crate::input::{bind_globals, bind_module};
use crate::source::{assemble_source, lower_intrinsics};
use crate::validate::validate_call_sites;
use crate::variant::{apply_variant, bind_variants, unroll, CompiledVariant};

#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct CompilerConfig {
    /// Asks the backend for optimized byte code.
    pub optimize: bool,
    /// Produces the assembled source text of every variant.
    pub emit_sources: bool,
    /// Produces the backend's disassembly of every compiled variant.
    pub emit_disassembly: bool,
    /// Only these modules are recompiled; the programs of all other modules are taken from the
    /// previous binding table when it has them. `None` recompiles everything.
    pub recompile: Option<Vec<String>>,
}

/// A text file produced for inspection alongside the binding table.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DebugArtifact {
    pub file_name: String,
    pub text: String,
}

#[derive(Debug)]
pub struct CompileOutput {
    pub table: BindingTable,
    pub debug_artifacts: Vec<DebugArtifact>,
}

pub struct Compiler<'a, B> {
    backend: &'a B,
    config: CompilerConfig,
    previous: Option<&'a BindingTable>,
}

impl<'a, B> Compiler<'a, B>
where
    B: Backend,
{
    pub fn new(backend: &'a B, config: CompilerConfig) -> Self {
        Compiler {
            backend,
            config,
            previous: None,
        }
    }

    /// Reuses byte code from `previous` for programs of modules that are not recompiled.
    pub fn with_previous(mut self, previous: &'a BindingTable) -> Self {
        self.previous = Some(previous);

        self
    }

    #[instrument(skip_all, fields(backend = self.backend.identifier(), modules = modules.len()))]
    pub fn compile(&self, modules: &[Module]) -> Result<CompileOutput, CompileError> {
        let mut table = BindingTable::new();
        let mut debug_artifacts = Vec::new();

        let local_base = bind_globals(self.backend, modules, &mut table)?;

        let known = ModuleSet::new(modules);
        let mut merged = Vec::with_capacity(modules.len());

        for module in modules {
            let mut module = resolve_includes(module, &known)?;

            validate_call_sites(&module)?;
            module.body = lower_intrinsics(self.backend, &module.body);
            merged.push(module);
        }

        for module in &merged {
            bind_variants(&mut table, module);
        }

        for module in &merged {
            let variants = unroll(module);

            info!(
                module = module.name.as_str(),
                variants = variants.len(),
                "exporting module"
            );

            for mut variant in variants {
                apply_variant(&mut variant);

                self.compile_variant(&variant, &local_base, &mut table, &mut debug_artifacts)?;
            }
        }

        Ok(CompileOutput {
            table,
            debug_artifacts,
        })
    }

    fn compile_variant(
        &self,
        variant: &CompiledVariant,
        local_base: &B::Allocator,
        table: &mut BindingTable,
        debug_artifacts: &mut Vec<DebugArtifact>,
    ) -> Result<(), CompileError> {
        let module = &variant.module;
        let backend_id = self.backend.identifier();
        let id = variant.id();

        debug!(
            module = module.name.as_str(),
            variant = %id,
            index = variant.index,
            "compiling variant"
        );

        let inputs = bind_module(self.backend, local_base, module, table)?;
        let source = assemble_source(self.backend, module, &inputs)?;
        let mut disassembly = String::new();

        for effect in module.effects.iter().filter(|e| !e.is_template) {
            for resolved in resolve_effect(module, effect)? {
                let binding = bind_effect(backend_id, module, &resolved, &variant.values)?;

                let source = if resolved.template.is_none() || resolved.template.layout.is_empty()
                {
                    source.clone()
                } else {
                    format!("#define vertex_t {}\n{}", resolved.template.layout, source)
                };

                for (kind, entry_point, name) in [
                    (ProgramKind::Vertex, resolved.vertex, &binding.vertex_program),
                    (ProgramKind::Pixel, resolved.pixel, &binding.pixel_program),
                ] {
                    let program = ProgramSource {
                        name,
                        entry_point,
                        kind,
                        instancing: binding.instancing,
                        optimize: self.config.optimize,
                        source: &source,
                    };

                    if let Some(text) = self.compile_program(&module.name, &program, table)? {
                        disassembly.push_str(&text);
                    }
                }

                self.bind_effect(table, binding)?;
            }
        }

        if self.config.emit_sources {
            debug_artifacts.push(DebugArtifact {
                file_name: source_file_name(backend_id, &module.name, &id.to_string()),
                text: source,
            });
        }

        if self.config.emit_disassembly && !disassembly.is_empty() {
            debug_artifacts.push(DebugArtifact {
                file_name: format!(
                    "{}.debuginfo.txt",
                    source_file_name(backend_id, &module.name, &id.to_string())
                ),
                text: disassembly,
            });
        }

        Ok(())
    }

    /// Compiles `program` unless its byte code is already available.
    ///
    /// Returns the disassembly of newly compiled byte code when it was requested.
    fn compile_program(
        &self,
        module: &str,
        program: &ProgramSource,
        table: &mut BindingTable,
    ) -> Result<Option<String>, CompileError> {
        if table.contains_program(program.name) {
            return Ok(None);
        }

        if !self.should_recompile(module) {
            if let Some(byte_code) = self.previous.and_then(|p| p.get_program(program.name)) {
                debug!(program = program.name, "reusing byte code");

                table.bind_program(program.name, byte_code.to_vec());

                return Ok(None);
            }
        }

        debug!(program = program.name, "compiling program");

        let byte_code =
            self.backend
                .compile(program)
                .map_err(|source| CompileError::Backend {
                    program: program.name.to_string(),
                    source,
                })?;

        let disassembly = if self.config.emit_disassembly {
            self.backend.disassemble(&byte_code)
        } else {
            None
        };

        table.bind_program(program.name, byte_code);

        Ok(disassembly)
    }

    fn bind_effect(
        &self,
        table: &mut BindingTable,
        binding: EffectBinding,
    ) -> Result<(), CompileError> {
        let module = binding.module.clone();
        let effect = binding.effect.clone();
        let template = binding.template.clone();
        let variant = binding.variant.id();

        if table.bind_effect(binding).is_some() {
            return Err(CompileError::DuplicateEffect {
                module,
                effect,
                template,
                variant: variant.to_string(),
            });
        }

        Ok(())
    }

    fn should_recompile(&self, module: &str) -> bool {
        self.config
            .recompile
            .as_ref()
            .map(|modules| modules.iter().any(|m| m == module))
            .unwrap_or(true)
    }
}

/// The name of the file that holds the assembled source of one variant of a module.
pub fn source_file_name(backend: &str, module: &str, variant: &str) -> String {
    format!("{}_{}-{}.txt", backend, module, variant)
}
