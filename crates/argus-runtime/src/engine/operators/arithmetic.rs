//! Arithmetic operator execution

use super::number_arg;
use crate::context::EvaluationContext;
use crate::environment::{Arguments, Evaluator};
use argus_core::{ExecutionError, Function, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    fn function(self) -> Function {
        match self {
            ArithmeticOp::Add => Function::Add,
            ArithmeticOp::Subtract => Function::Subtract,
            ArithmeticOp::Multiply => Function::Multiply,
            ArithmeticOp::Divide => Function::Divide,
        }
    }
}

/// Execute an arithmetic operation. A null operand yields null.
pub(crate) fn execute_arithmetic(op: ArithmeticOp, args: &[Value]) -> Result<Value, ExecutionError> {
    let function = op.function();
    let mut operands = Vec::with_capacity(args.len());
    let mut has_null = false;
    for value in args {
        match number_arg(&function, value)? {
            Some(n) => operands.push(n),
            None => has_null = true,
        }
    }
    if has_null {
        return Ok(Value::Null);
    }

    let (first, rest) = operands
        .split_first()
        .ok_or_else(|| ExecutionError::invalid_argument(function.name(), "no operands"))?;

    let result = match op {
        ArithmeticOp::Add => operands.iter().sum(),
        ArithmeticOp::Multiply => operands.iter().product(),
        ArithmeticOp::Subtract => rest.iter().fold(*first, |acc, n| acc - n),
        ArithmeticOp::Divide => {
            let mut acc = *first;
            for divisor in rest {
                if *divisor == 0.0 {
                    return Err(ExecutionError::DivisionByZero);
                }
                acc /= divisor;
            }
            acc
        }
    };
    Ok(Value::Number(result))
}

#[async_trait::async_trait]
impl Evaluator for ArithmeticOp {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        execute_arithmetic(*self, &args.args).map_err(|e| vec![e])
    }
}
