use indexmap::{IndexMap, IndexSet};

use crate::binding::{EffectBinding, InputBinding, GLOBALS_MODULE};
use crate::variant::{VariantAxis, VariantId, VariantValues};

/// The input bindings of one module and the variant axes it was unrolled over.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct ModuleRecord {
    pub(crate) bindings: IndexMap<String, InputBinding>,
    pub(crate) axes: IndexSet<String>,
}

impl ModuleRecord {
    pub fn get(&self, name: &str) -> Option<&InputBinding> {
        self.bindings.get(name)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &InputBinding> {
        self.bindings.values()
    }

    pub fn axes(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|a| a.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// All bindings of one effect, keyed by template name and then by variant.
#[derive(Clone, PartialEq, Debug)]
pub struct EffectRecord {
    pub(crate) module: String,
    pub(crate) default_template: String,
    pub(crate) templates: IndexMap<String, IndexMap<VariantId, EffectBinding>>,
}

impl EffectRecord {
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The template used when the run-time does not ask for one; the first template bound.
    pub fn default_template(&self) -> &str {
        &self.default_template
    }

    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|t| t.as_str())
    }

    pub fn variants(&self, template: &str) -> impl Iterator<Item = (&VariantId, &EffectBinding)> {
        self.templates.get(template).into_iter().flatten()
    }

    pub fn get(&self, template: &str, variant: VariantId) -> Option<&EffectBinding> {
        self.templates.get(template)?.get(&variant)
    }
}

/// The compiler's output: where every shader input lives, how every effect resolves for every
/// template and variant, and the byte code of every program.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct BindingTable {
    pub(crate) inputs: IndexMap<String, ModuleRecord>,
    pub(crate) axes: IndexMap<String, Vec<String>>,
    pub(crate) effects: IndexMap<String, EffectRecord>,
    pub(crate) programs: IndexMap<String, Vec<u8>>,
}

impl BindingTable {
    pub fn new() -> Self {
        BindingTable::default()
    }

    /// Records an input binding, replacing any earlier binding of the same name in the same
    /// module.
    pub fn bind_input(&mut self, binding: impl Into<InputBinding>) -> Option<InputBinding> {
        let binding = binding.into();

        self.inputs
            .entry(binding.module().to_string())
            .or_default()
            .bindings
            .insert(binding.name().to_string(), binding)
    }

    /// Records the axes `module` is unrolled over and the value set of each axis.
    pub fn bind_axes<'a, I>(&mut self, module: &str, axes: I)
    where
        I: IntoIterator<Item = &'a VariantAxis>,
    {
        let record = self.inputs.entry(module.to_string()).or_default();

        for axis in axes {
            record.axes.insert(axis.name.clone());
            self.axes.insert(axis.name.clone(), axis.value_set());
        }
    }

    /// Records an effect binding, returning the binding it replaced for the same effect,
    /// template and variant.
    pub fn bind_effect(&mut self, binding: EffectBinding) -> Option<EffectBinding> {
        let record = self
            .effects
            .entry(binding.effect.clone())
            .or_insert_with(|| EffectRecord {
                module: binding.module.clone(),
                default_template: binding.template.clone(),
                templates: IndexMap::new(),
            });

        record
            .templates
            .entry(binding.template.clone())
            .or_default()
            .insert(binding.variant.id(), binding)
    }

    pub fn bind_program(&mut self, name: &str, byte_code: Vec<u8>) {
        self.programs.insert(name.to_string(), byte_code);
    }

    pub fn contains_program(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn get_program(&self, name: &str) -> Option<&[u8]> {
        self.programs.get(name).map(|p| p.as_slice())
    }

    /// Returns the byte code of the program called `name`.
    ///
    /// Panics if no program of that name was compiled.
    pub fn program(&self, name: &str) -> &[u8] {
        self.get_program(name)
            .unwrap_or_else(|| panic!("no program named `{}`", name))
    }

    pub fn programs(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.programs
            .iter()
            .map(|(name, code)| (name.as_str(), code.as_slice()))
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(|m| m.as_str())
    }

    pub fn get_module(&self, module: &str) -> Option<&ModuleRecord> {
        self.inputs.get(module)
    }

    pub fn get_input(&self, module: &str, name: &str) -> Option<&InputBinding> {
        self.inputs.get(module)?.get(name)
    }

    /// Returns the binding of input `name` of `module`.
    ///
    /// Panics if the input was never bound.
    pub fn input(&self, module: &str, name: &str) -> &InputBinding {
        self.get_input(module, name)
            .unwrap_or_else(|| panic!("input `{}` of module `{}` is not bound", name, module))
    }

    /// Looks up input `name` as `effect` sees it: the binding of the module that owns the effect,
    /// or else the global binding of that name.
    pub fn get_effect_input(&self, effect: &str, name: &str) -> Option<&InputBinding> {
        let module = &self.effects.get(effect)?.module;

        self.get_input(module, name)
            .or_else(|| self.get_input(GLOBALS_MODULE, name))
    }

    pub fn contains_effect_input(&self, effect: &str, name: &str) -> bool {
        self.get_effect_input(effect, name).is_some()
    }

    /// Returns the binding of input `name` as seen by `effect`.
    ///
    /// Panics if neither the effect's module nor the globals bind an input of that name.
    pub fn effect_input(&self, effect: &str, name: &str) -> &InputBinding {
        self.get_effect_input(effect, name).unwrap_or_else(|| {
            panic!("input `{}` is not visible to effect `{}`", name, effect)
        })
    }

    /// The axes of the module that owns `effect`.
    pub fn effect_axes(&self, effect: &str) -> impl Iterator<Item = &str> {
        self.effects
            .get(effect)
            .and_then(|record| self.inputs.get(&record.module))
            .into_iter()
            .flat_map(|module| module.axes())
    }

    /// Every axis of every module.
    pub fn axes(&self) -> impl Iterator<Item = &str> {
        self.axes.keys().map(|a| a.as_str())
    }

    pub fn axis_values(&self, axis: &str) -> Option<&[String]> {
        self.axes.get(axis).map(|v| v.as_slice())
    }

    pub fn is_valid_value(&self, axis: &str, value: &str) -> bool {
        self.axis_values(axis)
            .map(|values| values.iter().any(|v| v == value))
            .unwrap_or(false)
    }

    pub fn effects(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(|e| e.as_str())
    }

    pub fn get_effect_record(&self, effect: &str) -> Option<&EffectRecord> {
        self.effects.get(effect)
    }

    pub fn get_effect(
        &self,
        effect: &str,
        template: &str,
        variant: VariantId,
    ) -> Option<&EffectBinding> {
        self.effects.get(effect)?.get(template, variant)
    }

    /// Returns the binding of `effect` for the given template and variant.
    ///
    /// Panics if that combination was never bound.
    pub fn effect(&self, effect: &str, template: &str, variant: VariantId) -> &EffectBinding {
        self.get_effect(effect, template, variant).unwrap_or_else(|| {
            panic!(
                "effect `{}` has no binding for template `{}` and variant {}",
                effect, template, variant
            )
        })
    }

    /// The variant of `effect` selected when the run-time does not ask for one: every axis of
    /// the owning module at its first declared value.
    pub fn default_variant(&self, effect: &str) -> Option<VariantValues> {
        let record = self.effects.get(effect)?;
        let module = self.inputs.get(&record.module);

        let values = module
            .into_iter()
            .flat_map(|m| m.axes.iter())
            .filter_map(|axis| {
                let first = self.axes.get(axis)?.first()?;

                Some((axis.as_str(), first.as_str()))
            })
            .collect();

        Some(values)
    }

    /// The binding of `effect` for its default template and default variant.
    pub fn default_effect(&self, effect: &str) -> Option<&EffectBinding> {
        let record = self.effects.get(effect)?;
        let variant = self.default_variant(effect)?;

        record.get(&record.default_template, variant.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingHeader, ConstantBinding};
    use crate::ty::TY_FLOAT3;

    fn constant(module: &str, name: &str, address: u32) -> ConstantBinding {
        ConstantBinding {
            header: BindingHeader {
                name: name.to_string(),
                module: module.to_string(),
                address,
            },
            ty: TY_FLOAT3,
            array_size: 1,
        }
    }

    fn effect(effect: &str, template: &str, variant: VariantValues) -> EffectBinding {
        EffectBinding {
            effect: effect.to_string(),
            module: "Main".to_string(),
            template: template.to_string(),
            vertex_program: "vs".to_string(),
            pixel_program: "ps".to_string(),
            input_layout: vec![],
            target_formats: vec![],
            instancing: false,
            variant,
        }
    }

    #[test]
    fn test_bind_input_upserts() {
        let mut table = BindingTable::new();

        assert!(table.bind_input(constant("Main", "Tint", 0)).is_none());
        assert!(table.bind_input(constant("Main", "Tint", 4)).is_some());

        assert_eq!(table.input("Main", "Tint").address(), 4);
        assert_eq!(table.get_module("Main").unwrap().len(), 1);
        assert!(table.get_input("Other", "Tint").is_none());
    }

    #[test]
    #[should_panic(expected = "input `Missing` of module `Main` is not bound")]
    fn test_missing_input_panics() {
        let table = BindingTable::new();

        table.input("Main", "Missing");
    }

    #[test]
    fn test_bind_effect_returns_replaced() {
        let mut table = BindingTable::new();

        assert!(table.bind_effect(effect("E", "", VariantValues::new())).is_none());
        assert!(table.bind_effect(effect("E", "", VariantValues::new())).is_some());
        assert!(table
            .bind_effect(effect("E", "Other", VariantValues::new()))
            .is_none());

        let record = table.get_effect_record("E").unwrap();

        assert_eq!(record.default_template(), "");
        assert_eq!(record.templates().collect::<Vec<_>>(), vec!["", "Other"]);
    }

    #[test]
    fn test_effect_input_falls_back_to_globals() {
        let mut table = BindingTable::new();

        table.bind_input(constant(GLOBALS_MODULE, "ViewProjection", 0));
        table.bind_input(constant(GLOBALS_MODULE, "Tint", 4));
        table.bind_input(constant("Main", "Tint", 5));
        table.bind_input(constant("Other", "Gloss", 5));
        table.bind_effect(effect("E", "", VariantValues::new()));

        assert_eq!(table.effect_input("E", "ViewProjection").module(), GLOBALS_MODULE);
        assert_eq!(table.effect_input("E", "Tint").module(), "Main");
        assert_eq!(table.effect_input("E", "Tint").address(), 5);
        assert!(table.contains_effect_input("E", "Tint"));
        assert!(!table.contains_effect_input("E", "Gloss"));
        assert!(!table.contains_effect_input("Missing", "Tint"));
    }

    #[test]
    #[should_panic(expected = "input `Gloss` is not visible to effect `E`")]
    fn test_missing_effect_input_panics() {
        let mut table = BindingTable::new();

        table.bind_effect(effect("E", "", VariantValues::new()));
        table.effect_input("E", "Gloss");
    }

    #[test]
    fn test_axis_listing() {
        let mut table = BindingTable::new();

        table.bind_axes("Main", &[VariantAxis::new("Quality", &["Low", "High"])]);
        table.bind_axes("Other", &[VariantAxis::boolean("Fog")]);
        table.bind_effect(effect("E", "", VariantValues::new()));

        assert_eq!(table.axes().collect::<Vec<_>>(), vec!["Quality", "Fog"]);
        assert_eq!(table.effect_axes("E").collect::<Vec<_>>(), vec!["Quality"]);
        assert_eq!(table.effect_axes("Missing").count(), 0);
    }

    #[test]
    fn test_default_variant_uses_first_values() {
        let mut table = BindingTable::new();

        table.bind_axes(
            "Main",
            &[
                VariantAxis::new("Quality", &["Low", "High"]),
                VariantAxis::boolean("Fog"),
            ],
        );

        let low: VariantValues = [("Quality", "Low"), ("Fog", "False")].into_iter().collect();
        let high: VariantValues = [("Quality", "High"), ("Fog", "True")].into_iter().collect();

        table.bind_effect(effect("E", "", high));
        table.bind_effect(effect("E", "", low.clone()));

        assert_eq!(table.default_variant("E"), Some(low.clone()));
        assert_eq!(table.default_effect("E").unwrap().variant, low);
        assert!(table.is_valid_value("Quality", "High"));
        assert!(!table.is_valid_value("Quality", "Ultra"));
    }
}
