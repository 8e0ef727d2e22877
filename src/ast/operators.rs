use std::fmt;

/// The operator families the semantic analyzer and translator dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCategory {
    /// `$add $subtract $multiply $divide $modulo`
    Arithmetic,
    /// `$equals $notequals $less $lessorequal $greater $greaterorequal`
    Relational,
    /// `$like $regex`
    StringRelational,
    /// `$and $or $not`
    Logical,
    /// `$aggregate $new`
    Semantic,
    /// `$filter $select $selectmany $orderby $orderbydescending $limit $skip`
    CollectionManipulation,
    /// `$count $contains $index $any $all $min $max $sum $average`
    CollectionAggregation,
}

/// How many operands an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
    /// Two or more operands (`$and` / `$or`)
    Nary,
    /// Source alone, or source plus a lambda/value operand
    UnaryOrBinary,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Unary => count == 1,
            Arity::Binary => count == 2,
            Arity::Nary => count >= 2,
            Arity::UnaryOrBinary => count == 1 || count == 2,
        }
    }
}

/// Closed operator table of the query language.
///
/// Every operator key in a document (`"$greater"`, `"$filter"`, ...)
/// resolves against this enum; anything else is either a field name or
/// an unknown-operator error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // Relational
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,

    // String-relational
    Like,
    Regex,

    // Logical
    And,
    Or,
    Not,

    // Semantic
    Aggregate,
    New,

    // Collection manipulation
    Filter,
    Select,
    SelectMany,
    OrderBy,
    OrderByDescending,
    Limit,
    Skip,

    // Collection aggregation
    Count,
    Contains,
    Index,
    Any,
    All,
    Min,
    Max,
    Sum,
    Average,
}

/// The reserved prefix marking a key as an operator rather than a field.
pub const OPERATOR_SIGIL: char = '$';

impl Operator {
    /// Resolve a document key against the operator table.
    ///
    /// Keys are matched case-insensitively after the sigil. Returns
    /// `None` for keys without the sigil (field shorthand); a sigil key
    /// that matches nothing is the caller's unknown-operator error.
    pub fn from_key(key: &str) -> Option<Operator> {
        let name = key.strip_prefix(OPERATOR_SIGIL)?;
        let name = name.to_ascii_lowercase();
        let op = match name.as_str() {
            "add" => Operator::Add,
            "subtract" => Operator::Subtract,
            "multiply" => Operator::Multiply,
            "divide" => Operator::Divide,
            "modulo" => Operator::Modulo,
            "equals" => Operator::Equals,
            "notequals" => Operator::NotEquals,
            "less" => Operator::Less,
            "lessorequal" => Operator::LessOrEqual,
            "greater" => Operator::Greater,
            "greaterorequal" => Operator::GreaterOrEqual,
            "like" => Operator::Like,
            "regex" => Operator::Regex,
            "and" => Operator::And,
            "or" => Operator::Or,
            "not" => Operator::Not,
            "aggregate" => Operator::Aggregate,
            "new" => Operator::New,
            "filter" => Operator::Filter,
            "select" => Operator::Select,
            "selectmany" => Operator::SelectMany,
            "orderby" => Operator::OrderBy,
            "orderbydescending" => Operator::OrderByDescending,
            "limit" => Operator::Limit,
            "skip" => Operator::Skip,
            "count" => Operator::Count,
            "contains" => Operator::Contains,
            "index" => Operator::Index,
            "any" => Operator::Any,
            "all" => Operator::All,
            "min" => Operator::Min,
            "max" => Operator::Max,
            "sum" => Operator::Sum,
            "average" => Operator::Average,
            _ => return None,
        };
        Some(op)
    }

    /// True if the key carries the operator sigil, whether or not it
    /// resolves to a known operator.
    pub fn is_operator_key(key: &str) -> bool {
        key.starts_with(OPERATOR_SIGIL)
    }

    pub fn category(self) -> OperatorCategory {
        use Operator::*;
        match self {
            Add | Subtract | Multiply | Divide | Modulo => OperatorCategory::Arithmetic,
            Equals | NotEquals | Less | LessOrEqual | Greater | GreaterOrEqual => {
                OperatorCategory::Relational
            }
            Like | Regex => OperatorCategory::StringRelational,
            And | Or | Not => OperatorCategory::Logical,
            Aggregate | New => OperatorCategory::Semantic,
            Filter | Select | SelectMany | OrderBy | OrderByDescending | Limit | Skip => {
                OperatorCategory::CollectionManipulation
            }
            Count | Contains | Index | Any | All | Min | Max | Sum | Average => {
                OperatorCategory::CollectionAggregation
            }
        }
    }

    /// Operand counts checked during AST construction, before any
    /// semantic analysis runs.
    pub fn arity(self) -> Arity {
        use Operator::*;
        match self {
            Add | Subtract | Multiply | Divide | Modulo => Arity::Binary,
            Equals | NotEquals | Less | LessOrEqual | Greater | GreaterOrEqual => Arity::Binary,
            Like | Regex => Arity::Binary,
            And | Or => Arity::Nary,
            Not => Arity::Unary,
            Aggregate | New => Arity::Unary,
            Filter | Select | SelectMany | OrderBy | OrderByDescending | Limit | Skip => {
                Arity::Binary
            }
            Contains | Index => Arity::Binary,
            Count | Any | All | Min | Max | Sum | Average => Arity::UnaryOrBinary,
        }
    }

    /// The canonical document key for the operator.
    pub fn key(self) -> &'static str {
        use Operator::*;
        match self {
            Add => "$add",
            Subtract => "$subtract",
            Multiply => "$multiply",
            Divide => "$divide",
            Modulo => "$modulo",
            Equals => "$equals",
            NotEquals => "$notequals",
            Less => "$less",
            LessOrEqual => "$lessorequal",
            Greater => "$greater",
            GreaterOrEqual => "$greaterorequal",
            Like => "$like",
            Regex => "$regex",
            And => "$and",
            Or => "$or",
            Not => "$not",
            Aggregate => "$aggregate",
            New => "$new",
            Filter => "$filter",
            Select => "$select",
            SelectMany => "$selectmany",
            OrderBy => "$orderby",
            OrderByDescending => "$orderbydescending",
            Limit => "$limit",
            Skip => "$skip",
            Count => "$count",
            Contains => "$contains",
            Index => "$index",
            Any => "$any",
            All => "$all",
            Min => "$min",
            Max => "$max",
            Sum => "$sum",
            Average => "$average",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
