use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use parser::ast::DeclarationStruct;

/// Non-local control flow and fatal failures share one channel: `Break`,
/// `Continue`, and `Return` unwind to the construct that consumes them,
/// `Runtime` unwinds the whole program. The diagnostic is already emitted
/// by the time a `Runtime` value exists.
pub enum InterpreterError {
  Break,
  Continue,
  Return(Option<Value>),
  Runtime,
}

/// A runtime value. Arrays and structs are shared by handle: cloning the
/// value clones the handle, so mutation through one alias is visible
/// through every alias.
#[derive(Debug, Clone)]
pub enum Value {
  Int(i64),
  Float(f64),
  Bool(bool),
  Str(String),
  Array(Rc<RefCell<Vec<Value>>>),
  Struct(StructInstance),
}

#[derive(Debug, Clone)]
pub struct StructInstance {
  pub name: String,
  pub fields: Rc<RefCell<HashMap<String, Value>>>,
}

impl Value {
  pub fn array(elements: Vec<Value>) -> Self {
    Value::Array(Rc::new(RefCell::new(elements)))
  }

  pub fn struct_instance(name: String, fields: HashMap<String, Value>) -> Self {
    Value::Struct(StructInstance {
      name,
      fields: Rc::new(RefCell::new(fields)),
    })
  }

  pub fn kind_name(&self) -> &'static str {
    match self {
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Bool(_) => "bool",
      Value::Str(_) => "string",
      Value::Array(_) => "array",
      Value::Struct(_) => "struct",
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", render(self, &HashMap::new(), false))
  }
}

/// Renders a value for `print`. Structs need the declaration table for
/// member order and types; at the print top level they spread over
/// multiple lines with 4-space indent, nested ones stay inline.
pub fn render(
  value: &Value,
  structs: &HashMap<String, Rc<DeclarationStruct>>,
  top_level: bool,
) -> String {
  match value {
    Value::Int(n) => n.to_string(),
    Value::Float(x) => format_float(*x),
    Value::Bool(b) => b.to_string(),
    // The lexer stores the raw contents; the two-byte `\n` sequence
    // becomes a line break only here.
    Value::Str(s) => s.replace("\\n", "\n"),

    Value::Array(elements) => {
      let parts: Vec<String> = elements
        .borrow()
        .iter()
        .map(|element| render(element, structs, false))
        .collect();
      format!("[{}]", parts.join(", "))
    },

    Value::Struct(instance) => {
      let fields = instance.fields.borrow();

      // Member order comes from the declaration; unknown structs fall
      // back to name order so the output stays deterministic.
      let ordered: Vec<(String, String)> = match structs.get(&instance.name) {
        Some(declaration) => declaration
          .members
          .iter()
          .filter_map(|member| {
            fields.get(&member.name.lexeme).map(|value| {
              (
                format!("{}: {}", member.name.lexeme, member.ty),
                render(value, structs, false),
              )
            })
          })
          .collect(),
        None => {
          let mut names: Vec<&String> = fields.keys().collect();
          names.sort();
          names
            .into_iter()
            .map(|name| {
              (
                name.clone(),
                render(&fields[name], structs, false),
              )
            })
            .collect()
        },
      };

      if top_level {
        let lines: Vec<String> = ordered
          .iter()
          .map(|(head, value)| format!("    {} = {}", head, value))
          .collect();
        format!("{{\n{}\n}}", lines.join(",\n"))
      } else {
        let parts: Vec<String> = ordered
          .iter()
          .map(|(head, value)| format!("{} = {}", head, value))
          .collect();
        format!("{{ {} }}", parts.join(", "))
      }
    },
  }
}

/// Shortest form at five significant digits, the `%.5g` contract: fixed
/// notation while the exponent fits, scientific (`1.2346e+05`) otherwise,
/// trailing zeros trimmed either way.
pub fn format_float(value: f64) -> String {
  format_g(value, 5)
}

fn format_g(value: f64, precision: usize) -> String {
  if value == 0.0 {
    return "0".to_string();
  }
  if value.is_nan() {
    return "NaN".to_string();
  }
  if value.is_infinite() {
    return if value < 0.0 { "-inf" } else { "+inf" }.to_string();
  }

  // `{:.*e}` normalizes to one leading digit and handles rounding, so a
  // value like 99999.6 re-enters the scientific range cleanly.
  let scientific = format!("{:.*e}", precision - 1, value);
  let Some((mantissa, exponent)) = scientific.split_once('e') else {
    return scientific;
  };
  let Ok(exponent) = exponent.parse::<i32>() else {
    return scientific;
  };

  if exponent < -4 || exponent >= precision as i32 {
    let mantissa = trim_trailing_zeros(mantissa);
    let sign = if exponent < 0 { '-' } else { '+' };
    return format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs());
  }

  let (sign, digits) = match mantissa.strip_prefix('-') {
    Some(rest) => ("-", rest),
    None => ("", mantissa),
  };
  let digits: String = digits.chars().filter(|c| *c != '.').collect();

  let rendered = if exponent >= 0 {
    let split = (exponent as usize + 1).min(digits.len());
    let integer = &digits[..split];
    let fraction = &digits[split..];
    if fraction.is_empty() {
      integer.to_string()
    } else {
      format!("{}.{}", integer, fraction)
    }
  } else {
    let zeros = "0".repeat((-exponent - 1) as usize);
    format!("0.{}{}", zeros, digits)
  };

  format!("{}{}", sign, trim_trailing_zeros(&rendered))
}

fn trim_trailing_zeros(text: &str) -> String {
  if !text.contains('.') {
    return text.to_string();
  }

  text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_float_fixed_range() {
    assert_eq!(format_float(4.0), "4");
    assert_eq!(format_float(2.5), "2.5");
    assert_eq!(format_float(11.0), "11");
    assert_eq!(format_float(3.14159), "3.1416");
    assert_eq!(format_float(-1.5), "-1.5");
    assert_eq!(format_float(0.0), "0");
    assert_eq!(format_float(99999.0), "99999");
  }

  #[test]
  fn test_format_float_scientific_range() {
    assert_eq!(format_float(100000.0), "1e+05");
    assert_eq!(format_float(123456.0), "1.2346e+05");
    assert_eq!(format_float(0.00012345), "0.00012345");
    assert_eq!(format_float(0.00001), "1e-05");
    assert_eq!(format_float(-250000.0), "-2.5e+05");
  }

  #[test]
  fn test_format_float_rounding_renormalizes() {
    assert_eq!(format_float(99999.6), "1e+05");
    assert_eq!(format_float(0.999999), "1");
  }

  #[test]
  fn test_render_scalars() {
    let structs = HashMap::new();
    assert_eq!(render(&Value::Int(11), &structs, true), "11");
    assert_eq!(render(&Value::Bool(true), &structs, true), "true");
    assert_eq!(
      render(&Value::Str("a\\nb".to_string()), &structs, true),
      "a\nb"
    );
  }

  #[test]
  fn test_render_array() {
    let structs = HashMap::new();
    let value = Value::array(vec![Value::Int(1), Value::Int(4), Value::Int(3)]);
    assert_eq!(render(&value, &structs, true), "[1, 4, 3]");

    let nested = Value::array(vec![
      Value::array(vec![Value::Int(1), Value::Int(2)]),
      Value::array(vec![]),
    ]);
    assert_eq!(render(&nested, &structs, true), "[[1, 2], []]");
  }
}
