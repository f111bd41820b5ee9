use std::fmt::Write;

use rustc_hash::FxHashSet;
use sfxir::variant::{FALSE, TRUE};
use sfxir::{BindingTable, Module, VariantId, VariantValues};

/// One module with every variant axis fixed to a single value.
#[derive(Clone, Debug)]
pub struct CompiledVariant {
    pub module: Module,
    pub values: VariantValues,
    pub index: usize,
    applied: bool,
}

impl CompiledVariant {
    pub fn id(&self) -> VariantId {
        self.values.id()
    }
}

/// Records the axes `module` uses and the value set of each of them.
pub fn bind_variants(table: &mut BindingTable, module: &Module) {
    table.bind_axes(&module.name, &module.variants);
}

/// Expands `module` into one copy per combination of axis values.
///
/// The first axis varies fastest. A module without axes yields a single unchanged copy.
pub fn unroll(module: &Module) -> Vec<CompiledVariant> {
    let value_sets: Vec<Vec<String>> = module.variants.iter().map(|a| a.value_set()).collect();
    let count = value_sets.iter().map(|v| v.len()).product::<usize>();

    (0..count)
        .map(|index| {
            let mut values = VariantValues::new();
            let mut stride = 1;

            for (axis, set) in module.variants.iter().zip(&value_sets) {
                let value = &set[(index / stride) % set.len()];

                values.insert(&axis.name, value);
                stride *= set.len();
            }

            CompiledVariant {
                module: module.clone(),
                values,
                index,
                applied: false,
            }
        })
        .collect()
}

/// Prefixes the variant's body with the preprocessor definitions that select its values.
///
/// The definitions are added once; applying a variant again leaves its body unchanged.
pub fn apply_variant(variant: &mut CompiledVariant) {
    if variant.applied {
        return;
    }

    let header = variant_header(&variant.module, &variant.values);

    variant.module.body.insert_str(0, &header);
    variant.applied = true;
}

fn variant_header(module: &Module, values: &VariantValues) -> String {
    let mut header = format!("#define {} 0\n#define {} 1\n", FALSE, TRUE);
    let mut defined: FxHashSet<String> = FxHashSet::default();
    let mut ordinal = 0;

    for axis in &module.variants {
        for value in axis.value_set() {
            if value == FALSE || value == TRUE || defined.contains(&value) {
                continue;
            }

            writeln!(header, "#define {} {}", value, ordinal).unwrap();
            ordinal += 1;
            defined.insert(value);
        }

        if let Some(chosen) = values.get(&axis.name) {
            if chosen != FALSE {
                writeln!(header, "#define {} {}", axis.name, chosen).unwrap();
            }
        }
    }

    header
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;
    use sfxir::VariantAxis;

    use super::*;

    fn module_with_axes(axes: Vec<VariantAxis>) -> Module {
        let mut module = Module::new("Main");

        module.body = "body".to_string();
        module.variants = axes;

        module
    }

    #[test]
    fn test_unroll_without_axes() {
        let module = module_with_axes(vec![]);
        let variants = unroll(&module);

        assert_eq!(variants.len(), 1);
        assert!(variants[0].values.is_empty());
        assert_eq!(variants[0].id(), VariantId::from_u32(0));
        assert_eq!(variants[0].module.body, "body");
    }

    #[test]
    fn test_unroll_count_and_distinctness() {
        let module = module_with_axes(vec![
            VariantAxis::new("Quality", &["Low", "Medium", "High"]),
            VariantAxis::boolean("Fog"),
            VariantAxis::new("Lights", &["One", "Two"]),
        ]);
        let variants = unroll(&module);

        assert_eq!(variants.len(), 12);

        let ids: FxHashSet<VariantId> = variants.iter().map(|v| v.id()).collect();

        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn test_first_axis_varies_fastest() {
        let module = module_with_axes(vec![
            VariantAxis::new("Quality", &["Low", "High"]),
            VariantAxis::boolean("Fog"),
        ]);
        let variants = unroll(&module);

        let combos: Vec<(&str, &str)> = variants
            .iter()
            .map(|v| (v.values.get("Quality").unwrap(), v.values.get("Fog").unwrap()))
            .collect();

        assert_eq!(
            combos,
            vec![
                ("Low", "False"),
                ("High", "False"),
                ("Low", "True"),
                ("High", "True"),
            ]
        );
    }

    #[test]
    fn test_apply_variant_header() {
        let module = module_with_axes(vec![
            VariantAxis::new("Quality", &["Low", "High"]),
            VariantAxis::new("Detail", &["High", "Extreme"]),
            VariantAxis::boolean("Fog"),
        ]);
        let mut variants = unroll(&module);
        let mut variant = variants.remove(1);

        apply_variant(&mut variant);

        assert_eq!(
            variant.module.body,
            "#define False 0\n\
             #define True 1\n\
             #define Low 0\n\
             #define High 1\n\
             #define Quality High\n\
             #define Extreme 2\n\
             #define Detail High\n\
             body"
        );
    }

    #[test]
    fn test_apply_variant_twice() {
        let module = module_with_axes(vec![VariantAxis::new("Quality", &["Low", "Medium", "High"])]);
        let mut variant = unroll(&module).remove(2);

        apply_variant(&mut variant);

        let once = variant.module.body.clone();

        apply_variant(&mut variant);

        assert_eq!(variant.module.body, once);
        assert_eq!(variant.module.body.matches("#define Quality ").count(), 1);
        assert_eq!(variant.module.body.matches("#define False ").count(), 1);
    }

    #[test]
    fn test_true_boolean_is_defined() {
        let module = module_with_axes(vec![VariantAxis::boolean("Fog")]);
        let mut variant = unroll(&module).remove(1);

        apply_variant(&mut variant);

        assert!(variant.module.body.contains("#define Fog True\n"));
    }

    #[test]
    fn test_bind_variants() {
        let module = module_with_axes(vec![VariantAxis::new("Quality", &["Low", "High"])]);
        let mut table = BindingTable::new();

        bind_variants(&mut table, &module);

        assert_eq!(
            table.get_module("Main").unwrap().axes().collect::<Vec<_>>(),
            vec!["Quality"]
        );
        assert!(table.is_valid_value("Quality", "Low"));
    }
}
