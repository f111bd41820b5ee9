use sfxir::module::ParamModifier;
use sfxir::Module;

use crate::error::CompileError;

/// Checks that every call passes each argument with the modifier of the matching parameter.
///
/// Calls to functions the module does not declare (intrinsics) are not checked.
pub fn validate_call_sites(module: &Module) -> Result<(), CompileError> {
    for call in &module.call_sites {
        let Some(function) = module.function(&call.function) else {
            continue;
        };

        for (argument, found) in call.args.iter().copied().enumerate() {
            let expected = function
                .params
                .get(argument)
                .copied()
                .unwrap_or(ParamModifier::None);

            if found != expected {
                return Err(CompileError::ArgumentModifierMismatch {
                    module: module.name.clone(),
                    function: call.function.clone(),
                    line: call.line,
                    argument,
                    expected,
                    found,
                });
            }
        }
    }

    Ok(())
}
