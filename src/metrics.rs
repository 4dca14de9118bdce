//! SELECT-clause classification and metric compilation
//!
//! Scans the projection list for aggregate function calls and compiles each
//! one into a metric aggregation (value_count, cardinality, avg, ...).

use crate::node::{AggNode, AggTree};
use sqlparser::ast::{DuplicateTreatment, Expr, Function, FunctionArguments, SelectItem};
use tracing::debug;

/// Synthetic field used for `count(*)`: every document carries `_index`, so a
/// value_count over it counts all documents in scope.
pub const COUNT_ALL_FIELD: &str = "_index";

/// One aggregate function call lifted out of the SELECT clause.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    /// Function name as written in the statement
    pub name: String,
    /// Rendered argument list, e.g. `*` or `price`
    pub args: String,
    /// Whether the call uses DISTINCT
    pub distinct: bool,
}

impl AggregateCall {
    fn from_function(func: &Function) -> Self {
        let (args, distinct) = match &func.args {
            FunctionArguments::List(list) => {
                let rendered = list
                    .args
                    .iter()
                    .map(|arg| arg.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let distinct =
                    matches!(list.duplicate_treatment, Some(DuplicateTreatment::Distinct));
                (rendered, distinct)
            }
            FunctionArguments::None | FunctionArguments::Subquery(_) => (String::new(), false),
        };

        AggregateCall {
            name: func.name.to_string(),
            args,
            distinct,
        }
    }

    /// Key of the metric node: upper-cased name plus parenthesized arguments,
    /// e.g. `COUNT(*)` or `AVG(price)`. Identical calls collide.
    pub fn key(&self) -> String {
        format!("{}({})", self.name.to_uppercase(), self.args)
    }
}

/// Collect aggregate function calls from the SELECT projection, in source order.
///
/// Wildcards and plain column references carry no aggregation semantics and
/// are dropped; so is any other expression shape.
pub fn extract_aggregate_calls(projection: &[SelectItem]) -> Vec<AggregateCall> {
    let mut calls = Vec::new();

    for item in projection {
        let expr = match item {
            SelectItem::UnnamedExpr(expr) => expr,
            SelectItem::ExprWithAlias { expr, .. } => expr,
            // * and table.* are meaningless as aggregation fields
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => continue,
        };

        match expr {
            Expr::Function(func) => calls.push(AggregateCall::from_function(func)),
            Expr::Identifier(_) | Expr::CompoundIdentifier(_) => continue,
            other => {
                debug!("ignoring SELECT expression without aggregation semantics: {:?}", other);
            }
        }
    }

    calls
}

/// Compile aggregate calls into the innermost metric subtree.
pub fn compile_metrics(calls: &[AggregateCall]) -> AggTree {
    let mut metrics = AggTree::new();

    for call in calls {
        let node = match call.name.to_lowercase().as_str() {
            // count needs to distinguish * from a field name
            "count" if call.args == "*" => AggNode::Metric {
                operator: "value_count".to_string(),
                field: COUNT_ALL_FIELD.to_string(),
            },
            "count" if call.distinct => AggNode::Metric {
                operator: "cardinality".to_string(),
                field: call.args.clone(),
            },
            "count" => AggNode::Metric {
                operator: "value_count".to_string(),
                field: call.args.clone(),
            },
            // min/avg/max and anything else pass through as the operator
            name => AggNode::Metric {
                operator: name.to_string(),
                field: call.args.clone(),
            },
        };
        metrics.insert(call.key(), node);
    }

    metrics
}
