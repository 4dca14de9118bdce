//! GROUP BY bucket compilation
//!
//! A plain column becomes a `terms` bucket; the bucket functions
//! `date_histogram` and `range` become their corresponding bucket types.

use crate::error::{AggError, Result};
use crate::node::{AggNode, AggTree, BucketParams, RangeBound};
use serde_json::Value as JsonValue;
use sqlparser::ast::{
    BinaryOperator, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, Value,
};

/// Default `date_histogram` interval when the call does not set one
const DEFAULT_INTERVAL: &str = "1h";
/// Default `date_histogram` format when the call does not set one
const DEFAULT_FORMAT: &str = "yyyy-MM-dd HH:mm:ss";

/// Compile a plain GROUP BY column into a `terms` bucket wrapping `child`.
///
/// `size` caps the number of returned buckets; 0 means return all of them.
pub fn compile_terms_bucket(column: &str, size: u64, child: AggTree) -> AggTree {
    let node = AggNode::Bucket {
        params: BucketParams::Terms {
            field: column.to_string(),
            size,
        },
        child: (!child.is_empty()).then_some(child),
    };

    let mut tree = AggTree::new();
    tree.insert(column, node);
    tree
}

/// Compile a GROUP BY bucket function call, wrapping `child` beneath it.
///
/// The node key is the call rendered with whitespace and quotes stripped,
/// which doubles as the bucket's display label.
pub fn compile_function_bucket(func: &Function, child: AggTree) -> Result<AggTree> {
    let params = match func.name.to_string().to_lowercase().as_str() {
        "date_histogram" => date_histogram_params(func)?,
        "range" => range_params(func)?,
        "date_range" => {
            return Err(AggError::NotSupported(
                "date_range buckets are not implemented yet".to_string(),
            ))
        }
        _ => return Err(AggError::UnsupportedFunction(func.to_string())),
    };

    let node = AggNode::Bucket {
        params,
        child: (!child.is_empty()).then_some(child),
    };

    let mut tree = AggTree::new();
    tree.insert(bucket_key(func), node);
    Ok(tree)
}

/// Node key for a function bucket: the rendered call without spaces or quotes
fn bucket_key(func: &Function) -> String {
    func.to_string()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
        .collect()
}

/// Parse `date_histogram(field = x, interval = y, format = z)` arguments.
///
/// Every argument must be an equality between a bare name and a value;
/// missing keys fall back to defaults.
fn date_histogram_params(func: &Function) -> Result<BucketParams> {
    let mut field = String::new();
    let mut interval = DEFAULT_INTERVAL.to_string();
    let mut format = DEFAULT_FORMAT.to_string();

    for arg in function_args(func) {
        let (left, right) = match unnamed_expr(arg) {
            Some(Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            }) => (left.as_ref(), right.as_ref()),
            _ => {
                return Err(AggError::UnsupportedExpression(format!(
                    "date_histogram arguments must look like name = value, got: {}",
                    arg
                )))
            }
        };

        let name = match left {
            Expr::Identifier(ident) => ident.value.as_str(),
            _ => {
                return Err(AggError::UnsupportedExpression(format!(
                    "date_histogram parameter name must be a bare identifier, got: {}",
                    left
                )))
            }
        };

        let value = literal_string(right);
        match name {
            "field" => field = value,
            "interval" => interval = value,
            "format" => format = value,
            _ => {}
        }
    }

    Ok(BucketParams::DateHistogram {
        field,
        interval,
        format,
    })
}

/// Parse `range(field, b0, b1, ..., bn)` into adjacent boundary pairs:
/// N boundaries produce N-1 `{from, to}` entries.
fn range_params(func: &Function) -> Result<BucketParams> {
    let args = function_args(func);
    if args.len() < 3 {
        return Err(AggError::MalformedArguments(format!(
            "range takes a field plus at least two boundaries, got: {}",
            func
        )));
    }

    let field = arg_display(&args[0]);
    let bounds: Vec<JsonValue> = args[1..].iter().map(boundary_value).collect();
    let ranges = bounds
        .windows(2)
        .map(|pair| RangeBound {
            from: pair[0].clone(),
            to: pair[1].clone(),
        })
        .collect();

    Ok(BucketParams::Range { field, ranges })
}

fn function_args(func: &Function) -> &[FunctionArg] {
    match &func.args {
        FunctionArguments::List(list) => &list.args,
        FunctionArguments::None | FunctionArguments::Subquery(_) => &[],
    }
}

fn unnamed_expr(arg: &FunctionArg) -> Option<&Expr> {
    match arg {
        FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => Some(expr),
        _ => None,
    }
}

/// Render an argument with surrounding quote characters stripped
fn arg_display(arg: &FunctionArg) -> String {
    arg.to_string().replace(['\'', '"'], "")
}

/// Render a literal with its surrounding quote characters stripped
fn literal_string(expr: &Expr) -> String {
    match expr {
        Expr::Value(value) => match &value.value {
            Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => s.clone(),
            other => other.to_string(),
        },
        other => other.to_string().replace(['\'', '"'], ""),
    }
}

/// Render a range boundary: numeric literals become JSON numbers, anything
/// else keeps its rendered string.
fn boundary_value(arg: &FunctionArg) -> JsonValue {
    if let Some(Expr::Value(value)) = unnamed_expr(arg) {
        if let Value::Number(n, _) = &value.value {
            if let Ok(i) = n.parse::<i64>() {
                return JsonValue::from(i);
            }
            if let Ok(f) = n.parse::<f64>() {
                return JsonValue::from(f);
            }
        }
    }
    JsonValue::from(arg_display(arg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SqlParser;
    use sqlparser::ast::GroupByExpr;
    use serde_json::json;

    fn group_by_function(sql: &str) -> Function {
        let select = SqlParser::parse_select(sql).unwrap();
        match &select.group_by {
            GroupByExpr::Expressions(exprs, _) => match &exprs[0] {
                Expr::Function(func) => func.clone(),
                other => panic!("expected function in GROUP BY, got {:?}", other),
            },
            other => panic!("expected GROUP BY expressions, got {:?}", other),
        }
    }

    #[test]
    fn test_terms_bucket_outer_size() {
        let tree = compile_terms_bucket("color", 200, AggTree::new());
        assert_eq!(
            tree.to_value(),
            json!({ "color": { "terms": { "field": "color", "size": 200 } } })
        );
    }

    #[test]
    fn test_terms_bucket_wraps_child() {
        let child = compile_terms_bucket("brand", 0, AggTree::new());
        let tree = compile_terms_bucket("color", 200, child);
        assert_eq!(
            tree.to_value(),
            json!({
                "color": {
                    "terms": { "field": "color", "size": 200 },
                    "aggregations": {
                        "brand": { "terms": { "field": "brand", "size": 0 } }
                    }
                }
            })
        );
    }

    #[test]
    fn test_date_histogram_full() {
        let func = group_by_function(
            "SELECT count(*) FROM t GROUP BY date_histogram(field = 'ts', interval = '1d', format = 'yyyy-MM-dd')",
        );
        let tree = compile_function_bucket(&func, AggTree::new()).unwrap();
        assert_eq!(
            tree.to_value(),
            json!({
                "date_histogram(field=ts,interval=1d,format=yyyy-MM-dd)": {
                    "date_histogram": {
                        "field": "ts",
                        "interval": "1d",
                        "format": "yyyy-MM-dd"
                    }
                }
            })
        );
    }

    #[test]
    fn test_date_histogram_defaults() {
        let func =
            group_by_function("SELECT count(*) FROM t GROUP BY date_histogram(field = 'ts')");
        let tree = compile_function_bucket(&func, AggTree::new()).unwrap();
        assert_eq!(
            tree.to_value(),
            json!({
                "date_histogram(field=ts)": {
                    "date_histogram": {
                        "field": "ts",
                        "interval": "1h",
                        "format": "yyyy-MM-dd HH:mm:ss"
                    }
                }
            })
        );
    }

    #[test]
    fn test_date_histogram_interval_with_default_format() {
        let func = group_by_function(
            "SELECT count(*) FROM t GROUP BY date_histogram(field = 'ts', interval = '1d')",
        );
        let tree = compile_function_bucket(&func, AggTree::new()).unwrap();
        assert_eq!(
            tree.to_value(),
            json!({
                "date_histogram(field=ts,interval=1d)": {
                    "date_histogram": {
                        "field": "ts",
                        "interval": "1d",
                        "format": "yyyy-MM-dd HH:mm:ss"
                    }
                }
            })
        );
    }

    #[test]
    fn test_date_histogram_rejects_non_equality_argument() {
        let func = group_by_function("SELECT count(*) FROM t GROUP BY date_histogram('ts')");
        let result = compile_function_bucket(&func, AggTree::new());
        assert!(matches!(result, Err(AggError::UnsupportedExpression(_))));
    }

    #[test]
    fn test_date_histogram_rejects_non_identifier_name() {
        let func =
            group_by_function("SELECT count(*) FROM t GROUP BY date_histogram(1 = 'ts')");
        let result = compile_function_bucket(&func, AggTree::new());
        assert!(matches!(result, Err(AggError::UnsupportedExpression(_))));
    }

    #[test]
    fn test_range_adjacent_pairs() {
        let func = group_by_function("SELECT count(*) FROM t GROUP BY range(price, 0, 10, 20)");
        let tree = compile_function_bucket(&func, AggTree::new()).unwrap();
        assert_eq!(
            tree.to_value(),
            json!({
                "range(price,0,10,20)": {
                    "range": {
                        "field": "price",
                        "ranges": [
                            { "from": 0, "to": 10 },
                            { "from": 10, "to": 20 }
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn test_range_too_few_arguments() {
        let func = group_by_function("SELECT count(*) FROM t GROUP BY range(price, 0)");
        let result = compile_function_bucket(&func, AggTree::new());
        assert!(matches!(result, Err(AggError::MalformedArguments(_))));
    }

    #[test]
    fn test_date_range_reserved() {
        let func =
            group_by_function("SELECT count(*) FROM t GROUP BY date_range(ts, '2024', '2025')");
        let result = compile_function_bucket(&func, AggTree::new());
        assert!(matches!(result, Err(AggError::NotSupported(_))));
    }

    #[test]
    fn test_unknown_bucket_function_rejected() {
        let func = group_by_function("SELECT count(*) FROM t GROUP BY histogram(price, 10)");
        let result = compile_function_bucket(&func, AggTree::new());
        assert!(matches!(result, Err(AggError::UnsupportedFunction(_))));
    }
}
