//! Functions available in Argus expression trees
//!
//! Every built-in operation is a variant of the closed [`Function`] union, so
//! descriptors and evaluator dispatch are checked exhaustively at compile time.
//! Functions backed by an external collaborator and not known to the engine
//! are carried by [`Function::External`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Function identifier of an expression node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Function {
    // Logic
    And,
    Or,
    Not,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,

    // Strings
    StringContains,
    StringNotContain,
    StringStartsWith,
    StringEndsWith,
    ContainsAnyOf,
    ContainsNoneOf,
    StringConcat,

    // Lists
    List,
    IsInList,
    IsNotInList,
    IsEmpty,
    IsNotEmpty,

    // Time
    TimeNow,
    TimeAdd,
    ParseTime,

    // Control
    Switch,
    ScoreComputation,

    // Data access
    Payload,
    DatabaseAccess,
    CustomListAccess,

    /// Function provided by a collaborator, resolved by name at lookup time
    External(String),
}

/// Number of children a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` positional children
    Fixed(usize),
    /// At least `min` positional children
    Variadic { min: usize },
    /// No positional children, these named children are required
    Named { required: &'static [&'static str] },
}

/// When evaluation of the remaining children may stop early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortCircuit {
    None,
    /// Stop once a child evaluates to this boolean (null counts as false)
    StopOn(bool),
    /// Positional `[when, then]` pairs, the first true `when` wins, then the `default`
    FirstMatchingBranch,
}

/// Static metadata about a function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub arity: Arity,
    pub commutative: bool,
    /// Relative evaluation cost, only used to order commutative operands
    pub cost: u32,
    pub short_circuit: ShortCircuit,
}

impl FunctionDescriptor {
    const fn new(arity: Arity, cost: u32) -> Self {
        Self {
            arity,
            commutative: false,
            cost,
            short_circuit: ShortCircuit::None,
        }
    }

    const fn commutative(mut self) -> Self {
        self.commutative = true;
        self
    }

    const fn short_circuit(mut self, short_circuit: ShortCircuit) -> Self {
        self.short_circuit = short_circuit;
        self
    }

    /// Check positional/named children against the declared arity
    pub fn check_shape(
        &self,
        positional: usize,
        has_named: impl Fn(&str) -> bool,
    ) -> Result<(), String> {
        match self.arity {
            Arity::Fixed(n) if positional != n => {
                Err(format!("expected {} children, got {}", n, positional))
            }
            Arity::Variadic { min } if positional < min => {
                Err(format!("expected at least {} children, got {}", min, positional))
            }
            Arity::Named { required } => {
                if positional != 0 {
                    return Err(format!(
                        "expected only named children, got {} positional",
                        positional
                    ));
                }
                match required.iter().find(|name| !has_named(name)) {
                    Some(missing) => Err(format!("missing named child '{}'", missing)),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

impl Function {
    /// Every built-in function, in declaration order
    pub const BUILTINS: &'static [Function] = &[
        Function::And,
        Function::Or,
        Function::Not,
        Function::Add,
        Function::Subtract,
        Function::Multiply,
        Function::Divide,
        Function::Equal,
        Function::NotEqual,
        Function::Greater,
        Function::GreaterOrEqual,
        Function::Less,
        Function::LessOrEqual,
        Function::StringContains,
        Function::StringNotContain,
        Function::StringStartsWith,
        Function::StringEndsWith,
        Function::ContainsAnyOf,
        Function::ContainsNoneOf,
        Function::StringConcat,
        Function::List,
        Function::IsInList,
        Function::IsNotInList,
        Function::IsEmpty,
        Function::IsNotEmpty,
        Function::TimeNow,
        Function::TimeAdd,
        Function::ParseTime,
        Function::Switch,
        Function::ScoreComputation,
        Function::Payload,
        Function::DatabaseAccess,
        Function::CustomListAccess,
    ];

    /// Wire identifier of the function
    pub fn name(&self) -> &str {
        match self {
            Function::And => "And",
            Function::Or => "Or",
            Function::Not => "Not",
            Function::Add => "+",
            Function::Subtract => "-",
            Function::Multiply => "*",
            Function::Divide => "/",
            Function::Equal => "=",
            Function::NotEqual => "≠",
            Function::Greater => ">",
            Function::GreaterOrEqual => ">=",
            Function::Less => "<",
            Function::LessOrEqual => "<=",
            Function::StringContains => "StringContains",
            Function::StringNotContain => "StringNotContain",
            Function::StringStartsWith => "StringStartsWith",
            Function::StringEndsWith => "StringEndsWith",
            Function::ContainsAnyOf => "ContainsAnyOf",
            Function::ContainsNoneOf => "ContainsNoneOf",
            Function::StringConcat => "StringConcat",
            Function::List => "List",
            Function::IsInList => "IsInList",
            Function::IsNotInList => "IsNotInList",
            Function::IsEmpty => "IsEmpty",
            Function::IsNotEmpty => "IsNotEmpty",
            Function::TimeNow => "TimeNow",
            Function::TimeAdd => "TimeAdd",
            Function::ParseTime => "ParseTime",
            Function::Switch => "Switch",
            Function::ScoreComputation => "ScoreComputation",
            Function::Payload => "Payload",
            Function::DatabaseAccess => "DatabaseAccess",
            Function::CustomListAccess => "CustomListAccess",
            Function::External(name) => name,
        }
    }

    /// Resolve a wire identifier; unknown names become [`Function::External`]
    pub fn from_name(name: &str) -> Function {
        match name {
            "!=" => return Function::NotEqual,
            "≥" => return Function::GreaterOrEqual,
            "≤" => return Function::LessOrEqual,
            _ => {}
        }
        Function::BUILTINS
            .iter()
            .find(|f| f.name() == name)
            .cloned()
            .unwrap_or_else(|| Function::External(name.to_string()))
    }

    pub fn descriptor(&self) -> FunctionDescriptor {
        use Arity::*;
        match self {
            Function::And => FunctionDescriptor::new(Variadic { min: 1 }, 1)
                .commutative()
                .short_circuit(ShortCircuit::StopOn(false)),
            Function::Or => FunctionDescriptor::new(Variadic { min: 1 }, 1)
                .commutative()
                .short_circuit(ShortCircuit::StopOn(true)),
            Function::Not => FunctionDescriptor::new(Fixed(1), 1),
            Function::Add | Function::Multiply => {
                FunctionDescriptor::new(Variadic { min: 2 }, 1).commutative()
            }
            Function::Subtract | Function::Divide => FunctionDescriptor::new(Fixed(2), 1),
            Function::Equal | Function::NotEqual => {
                FunctionDescriptor::new(Fixed(2), 1).commutative()
            }
            Function::Greater
            | Function::GreaterOrEqual
            | Function::Less
            | Function::LessOrEqual => FunctionDescriptor::new(Fixed(2), 1),
            Function::StringContains
            | Function::StringNotContain
            | Function::StringStartsWith
            | Function::StringEndsWith
            | Function::ContainsAnyOf
            | Function::ContainsNoneOf => FunctionDescriptor::new(Fixed(2), 2),
            Function::StringConcat => FunctionDescriptor::new(Variadic { min: 1 }, 2),
            Function::List => FunctionDescriptor::new(Variadic { min: 0 }, 1),
            Function::IsInList | Function::IsNotInList => FunctionDescriptor::new(Fixed(2), 2),
            Function::IsEmpty | Function::IsNotEmpty => FunctionDescriptor::new(Fixed(1), 1),
            Function::TimeNow => FunctionDescriptor::new(Fixed(0), 1),
            Function::TimeAdd => FunctionDescriptor::new(
                Named {
                    required: &["timestampField", "duration", "sign"],
                },
                1,
            ),
            Function::ParseTime => FunctionDescriptor::new(Fixed(1), 1),
            Function::Switch => FunctionDescriptor::new(Variadic { min: 0 }, 2)
                .short_circuit(ShortCircuit::FirstMatchingBranch),
            Function::ScoreComputation => FunctionDescriptor::new(
                Named {
                    required: &["condition", "modifier"],
                },
                1,
            ),
            Function::Payload => FunctionDescriptor::new(Fixed(1), 5),
            Function::DatabaseAccess => FunctionDescriptor::new(
                Named {
                    required: &["tableName", "fieldName", "path"],
                },
                50,
            ),
            Function::CustomListAccess => FunctionDescriptor::new(
                Named {
                    required: &["customListId"],
                },
                30,
            ),
            Function::External(_) => FunctionDescriptor::new(Variadic { min: 0 }, 100),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Function {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Function {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Function::from_name(&name))
    }
}
