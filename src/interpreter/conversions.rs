//! Type conversion abstract operations (ToPrimitive, ToNumber, ToLength, ...)

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    ExoticObject, JsObject, JsObjectRef, JsString, JsValue, MAX_SAFE_INTEGER, PropertyKey,
};

/// Hint passed to ToPrimitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

impl PreferredType {
    fn as_str(self) -> &'static str {
        match self {
            PreferredType::Default => "default",
            PreferredType::Number => "number",
            PreferredType::String => "string",
        }
    }
}

impl Interpreter {
    /// ToPrimitive(input, preferredType)
    pub fn to_primitive(
        &mut self,
        value: &JsValue,
        hint: PreferredType,
    ) -> ThrowCompletionOr<JsValue> {
        let JsValue::Object(obj) = value else {
            return Ok(value.clone());
        };
        let key = PropertyKey::Symbol(self.symbols.to_primitive.clone());
        if let Some(exotic_to_prim) = self.get_method(value, &key)? {
            let result = self.call_function(
                exotic_to_prim,
                value.clone(),
                &[JsValue::from(hint.as_str())],
            )?;
            if result.is_object() {
                return Err(JsError::type_error(
                    "Cannot convert object to primitive value",
                ));
            }
            return Ok(result);
        }
        let hint = if hint == PreferredType::Default {
            PreferredType::Number
        } else {
            hint
        };
        self.ordinary_to_primitive(*obj, hint)
    }

    /// OrdinaryToPrimitive: try `valueOf`/`toString` in hint order
    fn ordinary_to_primitive(
        &mut self,
        obj: JsObjectRef,
        hint: PreferredType,
    ) -> ThrowCompletionOr<JsValue> {
        let method_names = if hint == PreferredType::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for name in method_names {
            let method = self.get(obj, &PropertyKey::from(name))?;
            if self.is_callable(&method) {
                let result = self.call(&method, JsValue::Object(obj), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(JsError::type_error(
            "Cannot convert object to primitive value",
        ))
    }

    /// ToNumber(argument)
    pub fn to_number(&mut self, value: &JsValue) -> ThrowCompletionOr<f64> {
        match value {
            JsValue::Undefined => Ok(f64::NAN),
            JsValue::Null => Ok(0.0),
            JsValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            JsValue::Number(n) => Ok(*n),
            JsValue::String(s) => Ok(string_to_number(s.as_str())),
            JsValue::Symbol(_) => Err(JsError::type_error(
                "Cannot convert a Symbol value to a number",
            )),
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::Number)?;
                self.to_number(&prim)
            }
        }
    }

    /// ToString(argument)
    pub fn to_string(&mut self, value: &JsValue) -> ThrowCompletionOr<JsString> {
        match value {
            JsValue::Undefined => Ok(JsString::from("undefined")),
            JsValue::Null => Ok(JsString::from("null")),
            JsValue::Boolean(b) => Ok(JsString::from(if *b { "true" } else { "false" })),
            JsValue::Number(n) => Ok(JsString::from(number_to_string(*n))),
            JsValue::String(s) => Ok(s.clone()),
            JsValue::Symbol(_) => Err(JsError::type_error(
                "Cannot convert a Symbol value to a string",
            )),
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                self.to_string(&prim)
            }
        }
    }

    /// ToPropertyKey(argument)
    pub fn to_property_key(&mut self, value: &JsValue) -> ThrowCompletionOr<PropertyKey> {
        match value {
            JsValue::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n < u32::MAX as f64 => {
                Ok(PropertyKey::Index(*n as u32))
            }
            JsValue::Symbol(sym) => Ok(PropertyKey::Symbol(sym.clone())),
            JsValue::String(s) => Ok(PropertyKey::from(s.clone())),
            _ => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                if let JsValue::Symbol(sym) = prim {
                    return Ok(PropertyKey::Symbol(sym));
                }
                Ok(PropertyKey::from(self.to_string(&prim)?))
            }
        }
    }

    /// ToIntegerOrInfinity(argument)
    pub fn to_integer_or_infinity(&mut self, value: &JsValue) -> ThrowCompletionOr<f64> {
        let number = self.to_number(value)?;
        Ok(integer_or_infinity(number))
    }

    /// ToLength(argument): clamp to `[0, 2^53 - 1]`
    pub fn to_length(&mut self, value: &JsValue) -> ThrowCompletionOr<u64> {
        let len = self.to_integer_or_infinity(value)?;
        if len <= 0.0 {
            return Ok(0);
        }
        Ok(len.min(MAX_SAFE_INTEGER) as u64)
    }

    /// ToUint32(argument)
    pub fn to_uint32(&mut self, value: &JsValue) -> ThrowCompletionOr<u32> {
        let number = self.to_number(value)?;
        Ok(number_to_uint32(number))
    }

    /// ToObject(argument): primitives are wrapped, null/undefined throw
    pub fn to_object(&mut self, value: &JsValue) -> ThrowCompletionOr<JsObjectRef> {
        let intrinsics = &self.realm.intrinsics;
        let proto = match value {
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot convert {:?} to object",
                    value
                )));
            }
            JsValue::Object(obj) => return Ok(*obj),
            JsValue::Boolean(_) => intrinsics.boolean_prototype,
            JsValue::Number(_) => intrinsics.number_prototype,
            JsValue::String(_) => intrinsics.string_prototype,
            JsValue::Symbol(_) => intrinsics.symbol_prototype,
        };
        Ok(self.heap.alloc(JsObject::with_exotic(
            Some(proto),
            ExoticObject::PrimitiveWrapper(value.clone()),
        )))
    }
}

/// Truncate toward zero, mapping NaN to 0 and keeping infinities
pub fn integer_or_infinity(number: f64) -> f64 {
    if number.is_nan() || number == 0.0 {
        return 0.0;
    }
    if number.is_infinite() {
        return number;
    }
    number.trunc()
}

/// The numeric half of ToUint32
pub fn number_to_uint32(number: f64) -> u32 {
    if !number.is_finite() || number == 0.0 {
        return 0;
    }
    number.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// SameValue(x, y)
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                return true;
            }
            x == y && x.is_sign_negative() == y.is_sign_negative()
        }
        _ => a.strict_equals(b),
    }
}

/// SameValueZero(x, y)
pub fn same_value_zero(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => (x.is_nan() && y.is_nan()) || x == y,
        _ => a.strict_equals(b),
    }
}

/// StringToNumber: the StringNumericLiteral grammar
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix_body = |prefix_lower: &str, prefix_upper: &str| {
        trimmed
            .strip_prefix(prefix_lower)
            .or_else(|| trimmed.strip_prefix(prefix_upper))
    };
    for (lower, upper, radix) in [("0x", "0X", 16), ("0o", "0O", 8), ("0b", "0B", 2)] {
        if let Some(body) = radix_body(lower, upper) {
            if body.is_empty() {
                return f64::NAN;
            }
            return body.chars().try_fold(0.0_f64, |acc, c| {
                c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
            })
            .unwrap_or(f64::NAN);
        }
    }

    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    if unsigned.starts_with(['+', '-']) {
        return f64::NAN;
    }
    // Rust also accepts "inf", "nan" and friends; JavaScript does not
    let valid = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !valid || !unsigned.bytes().any(|b| b.is_ascii_digit()) {
        return f64::NAN;
    }
    unsigned.parse::<f64>().map_or(f64::NAN, |n| sign * n)
}

/// Number::toString(x) for radix 10
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }

    // Shortest round-tripping digits and exponent, e.g. "1.2345e6"
    let sci = format!("{:e}", n);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = digits.len() as i32;
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let e = point - 1;
        let sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, e.abs())
        }
    }
}
