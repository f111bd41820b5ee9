use indexmap::IndexSet;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use sfxir::Module;

use crate::error::CompileError;

/// All modules taking part in a compilation, by name.
pub struct ModuleSet<'a> {
    modules: FxHashMap<&'a str, &'a Module>,
}

impl<'a> ModuleSet<'a> {
    pub fn new(modules: &'a [Module]) -> Self {
        ModuleSet {
            modules: modules.iter().map(|m| (m.name.as_str(), m)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Module> {
        self.modules.get(name).copied()
    }
}

/// Merges `module` with every module it transitively includes.
///
/// Each included module contributes exactly once, after all of the modules it includes itself,
/// and the root module's own declarations come last.
pub fn resolve_includes(module: &Module, known: &ModuleSet) -> Result<Module, CompileError> {
    let reachable = collect_reachable(module, known)?;
    let order = dependency_order(reachable, known);

    let mut merged = Module::new(&module.name);

    merged.includes = module.includes.clone();

    for name in order {
        // Presence was checked when the name was collected.
        if let Some(include) = known.get(name) {
            merged.append(include);
        }
    }

    merged.append(module);

    if !merged.external_textures.is_empty() {
        return Err(CompileError::UnresolvedTextures {
            module: module.name.clone(),
            textures: merged.external_textures.iter().cloned().sorted().collect(),
        });
    }

    Ok(merged)
}

/// Collects the names of all modules reachable through includes, in discovery order.
fn collect_reachable<'a>(
    module: &'a Module,
    known: &ModuleSet<'a>,
) -> Result<IndexSet<&'a str>, CompileError> {
    let mut reachable = IndexSet::new();
    let mut worklist: Vec<(&'a str, &'a str)> = module
        .includes
        .iter()
        .rev()
        .map(|include| (module.name.as_str(), include.as_str()))
        .collect();

    while let Some((referrer, name)) = worklist.pop() {
        if name == module.name || reachable.contains(name) {
            continue;
        }

        let include = known.get(name).ok_or_else(|| CompileError::MissingInclude {
            module: referrer.to_string(),
            include: name.to_string(),
        })?;

        reachable.insert(include.name.as_str());

        for next in include.includes.iter().rev() {
            worklist.push((include.name.as_str(), next.as_str()));
        }
    }

    Ok(reachable)
}

/// Orders `pending` so that every module comes after the modules it includes.
///
/// Modules that include each other are emitted in discovery order.
fn dependency_order<'a>(mut pending: IndexSet<&'a str>, known: &ModuleSet<'a>) -> Vec<&'a str> {
    let mut order = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending.iter().position(|name| {
            known
                .get(name)
                .map(|m| m.includes.iter().all(|i| !pending.contains(i.as_str())))
                .unwrap_or(true)
        });

        let name = pending
            .shift_remove_index(ready.unwrap_or(0))
            .expect("pending is not empty");

        order.push(name);
    }

    order
}

#[cfg(test)]
mod tests {
    use sfxir::module::TextureDecl;

    use super::*;

    fn module(name: &str, body: &str, includes: &[&str]) -> Module {
        let mut module = Module::new(name);

        module.body = body.to_string();
        module.includes = includes.iter().map(|i| i.to_string()).collect();

        module
    }

    #[test]
    fn test_dependencies_come_first() {
        let modules = vec![
            module("Main", "main", &["Lighting", "Common"]),
            module("Lighting", "lighting", &["Common"]),
            module("Common", "common", &[]),
        ];
        let known = ModuleSet::new(&modules);

        let merged = resolve_includes(&modules[0], &known).unwrap();

        assert_eq!(merged.body, "common\nlighting\nmain");
    }

    #[test]
    fn test_shared_include_merged_once() {
        let modules = vec![
            module("Main", "main", &["A", "B"]),
            module("A", "a", &["Common"]),
            module("B", "b", &["Common"]),
            module("Common", "common", &[]),
        ];
        let known = ModuleSet::new(&modules);

        let merged = resolve_includes(&modules[0], &known).unwrap();

        assert_eq!(merged.body.matches("common").count(), 1);
        assert!(merged.body.starts_with("common"));
        assert!(merged.body.ends_with("main"));
    }

    #[test]
    fn test_include_cycles_terminate() {
        let modules = vec![
            module("Main", "main", &["Main", "A"]),
            module("A", "a", &["B"]),
            module("B", "b", &["A", "Main"]),
        ];
        let known = ModuleSet::new(&modules);

        let merged = resolve_includes(&modules[0], &known).unwrap();

        assert_eq!(merged.body.matches('a').count(), 2);
        assert_eq!(merged.body.matches('b').count(), 1);
        assert!(merged.body.ends_with("main"));
    }

    #[test]
    fn test_missing_include() {
        let modules = vec![module("Main", "", &["A"]), module("A", "", &["Missing"])];
        let known = ModuleSet::new(&modules);

        match resolve_includes(&modules[0], &known) {
            Err(CompileError::MissingInclude { module, include }) => {
                assert_eq!(module, "A");
                assert_eq!(include, "Missing");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_external_textures_resolved_by_include() {
        let mut main = module("Main", "", &["Lib"]);

        main.external_textures.insert("Albedo".to_string());

        let mut lib = module("Lib", "", &[]);

        lib.textures.push(TextureDecl::new("Albedo"));

        let modules = vec![main, lib];
        let known = ModuleSet::new(&modules);

        let merged = resolve_includes(&modules[0], &known).unwrap();

        assert!(merged.external_textures.is_empty());
        assert!(merged.texture("Albedo").is_some());
    }

    #[test]
    fn test_unresolved_textures_are_all_listed() {
        let mut main = module("Main", "", &[]);

        main.external_textures.insert("Normals".to_string());
        main.external_textures.insert("Albedo".to_string());

        let modules = vec![main];
        let known = ModuleSet::new(&modules);

        match resolve_includes(&modules[0], &known) {
            Err(CompileError::UnresolvedTextures { module, textures }) => {
                assert_eq!(module, "Main");
                assert_eq!(textures, vec!["Albedo".to_string(), "Normals".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
