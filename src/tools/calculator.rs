/// Calculator Tools
///
/// Seven arithmetic tools. Tool identity is the `CalcOp` enum, so the name
/// advertised by `tools/list` and the name accepted by `tools/call` come from
/// the same variant.

use num_bigint::BigUint;
use serde_json::{Map, Value, json};

use crate::core::error::{RegistryError, ToolError};
use crate::core::protocol::MCPTool;
use crate::core::registry::{ToolRegistry, as_integer};

/// Largest `n` accepted by `factorial`. 171! overflows an f64, and callers
/// expect results they can still treat as ordinary numbers.
pub const MAX_FACTORIAL: i64 = 170;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Sqrt,
    Factorial,
}

impl CalcOp {
    pub const ALL: [CalcOp; 7] = [
        CalcOp::Add,
        CalcOp::Subtract,
        CalcOp::Multiply,
        CalcOp::Divide,
        CalcOp::Power,
        CalcOp::Sqrt,
        CalcOp::Factorial,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CalcOp::Add => "add",
            CalcOp::Subtract => "subtract",
            CalcOp::Multiply => "multiply",
            CalcOp::Divide => "divide",
            CalcOp::Power => "power",
            CalcOp::Sqrt => "sqrt",
            CalcOp::Factorial => "factorial",
        }
    }

    fn description(self) -> &'static str {
        match self {
            CalcOp::Add => "Add two numbers together",
            CalcOp::Subtract => "Subtract the second number from the first",
            CalcOp::Multiply => "Multiply two numbers",
            CalcOp::Divide => "Divide the first number by the second",
            CalcOp::Power => "Raise a base to the power of an exponent",
            CalcOp::Sqrt => "Calculate the square root of a non-negative number",
            CalcOp::Factorial => "Calculate the factorial of a non-negative integer (max 170)",
        }
    }

    fn input_schema(self) -> Value {
        let (properties, required) = match self {
            CalcOp::Add | CalcOp::Subtract | CalcOp::Multiply | CalcOp::Divide => (
                json!({
                    "a": {"type": "number", "description": "First number"},
                    "b": {"type": "number", "description": "Second number"}
                }),
                json!(["a", "b"]),
            ),
            CalcOp::Power => (
                json!({
                    "base": {"type": "number", "description": "Base number"},
                    "exponent": {"type": "number", "description": "Exponent"}
                }),
                json!(["base", "exponent"]),
            ),
            CalcOp::Sqrt => (
                json!({
                    "number": {"type": "number", "description": "Number to take the square root of"}
                }),
                json!(["number"]),
            ),
            CalcOp::Factorial => (
                json!({
                    "n": {"type": "integer", "description": "Non-negative integer"}
                }),
                json!(["n"]),
            ),
        };

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }

    pub fn descriptor(self) -> MCPTool {
        MCPTool {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    /// Evaluate the operation and render the summary text.
    pub fn apply(self, args: &Map<String, Value>) -> Result<String, ToolError> {
        match self {
            CalcOp::Add => {
                let (a, b) = (number(args, "a")?, number(args, "b")?);
                Ok(format!("Addition: {a} + {b} = {}", a + b))
            }
            CalcOp::Subtract => {
                let (a, b) = (number(args, "a")?, number(args, "b")?);
                Ok(format!("Subtraction: {a} - {b} = {}", a - b))
            }
            CalcOp::Multiply => {
                let (a, b) = (number(args, "a")?, number(args, "b")?);
                Ok(format!("Multiplication: {a} * {b} = {}", a * b))
            }
            CalcOp::Divide => {
                let (a, b) = (number(args, "a")?, number(args, "b")?);
                if b == 0.0 {
                    return Err(ToolError::domain("Division by zero is undefined"));
                }
                Ok(format!("Division: {a} / {b} = {}", a / b))
            }
            CalcOp::Power => {
                let (base, exponent) = (number(args, "base")?, number(args, "exponent")?);
                Ok(format!("Power: {base} ^ {exponent} = {}", base.powf(exponent)))
            }
            CalcOp::Sqrt => {
                let n = number(args, "number")?;
                if n < 0.0 {
                    return Err(ToolError::domain(
                        "Cannot calculate square root of negative number",
                    ));
                }
                Ok(format!("Square root: √{n} = {}", n.sqrt()))
            }
            CalcOp::Factorial => {
                let n = integer(args, "n")?;
                if n < 0 {
                    return Err(ToolError::domain(
                        "Factorial is not defined for negative numbers",
                    ));
                }
                if n > i128::from(MAX_FACTORIAL) {
                    return Err(ToolError::domain(format!(
                        "Number too large for factorial (maximum is {MAX_FACTORIAL})"
                    )));
                }
                Ok(format!("Factorial: {n}! = {}", factorial(n as u64)))
            }
        }
    }
}

/// Exact n! as a big integer.
pub fn factorial(n: u64) -> BigUint {
    (2..=n).fold(BigUint::from(1u32), |acc, k| acc * k)
}

fn number(args: &Map<String, Value>, name: &str) -> Result<f64, ToolError> {
    let value = args
        .get(name)
        .ok_or_else(|| ToolError::MissingArgument(name.to_string()))?;
    value.as_f64().ok_or_else(|| ToolError::InvalidType {
        name: name.to_string(),
        expected: "number".to_string(),
    })
}

fn integer(args: &Map<String, Value>, name: &str) -> Result<i128, ToolError> {
    let value = args
        .get(name)
        .ok_or_else(|| ToolError::MissingArgument(name.to_string()))?;
    as_integer(value).ok_or_else(|| ToolError::InvalidType {
        name: name.to_string(),
        expected: "integer".to_string(),
    })
}

/// Register every calculator tool.
pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    for op in CalcOp::ALL {
        registry.register(op.descriptor(), Box::new(move |args: &Map<String, Value>| op.apply(args)))?;
    }
    Ok(())
}
