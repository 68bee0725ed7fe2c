//! %Function.prototype% and Function.prototype.call

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::JsValue;

use super::arg;

/// Make `%Function.prototype%` callable and give it `call`
pub fn initialize(interp: &mut Interpreter) -> ThrowCompletionOr<()> {
    interp.realm.mark_initialized("Function.prototype")?;
    let proto = interp.realm.intrinsics.function_prototype;
    interp.make_intrinsic_constructor(proto, "", function_prototype_fn, None, 0)?;
    interp.register_method(proto, "call", function_call, 1)?;
    Ok(())
}

/// %Function.prototype% itself accepts any arguments and returns undefined
fn function_prototype_fn(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    Ok(JsValue::Undefined)
}

/// Function.prototype.call(thisArg, ...args)
pub fn function_call(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    if !interp.is_callable(&this) {
        return Err(JsError::type_error(
            "Function.prototype.call called on non-function",
        ));
    }
    let this_arg = arg(args, 0);
    interp.call(&this, this_arg, args.get(1..).unwrap_or_default())
}
