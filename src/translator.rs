//! SQL AST to aggregation tree translation
//!
//! Folds the GROUP BY list (last item first) over the metric subtree compiled
//! from the SELECT clause, producing one nested aggregation tree.

use crate::buckets::{compile_function_bucket, compile_terms_bucket};
use crate::error::{AggError, Result};
use crate::metrics::{compile_metrics, extract_aggregate_calls};
use crate::node::AggTree;
use sqlparser::ast::{Expr, GroupByExpr, Select, SetExpr, Statement};
use tracing::debug;

/// Tunables for aggregation compilation
#[derive(Debug, Clone)]
pub struct AggConfig {
    /// Bucket cap for the outermost `terms` aggregation. The outer group may
    /// have unbounded cardinality, so it is capped to protect the serving
    /// cluster; inner terms buckets stay uncapped (size 0).
    pub outer_terms_size: u64,
}

impl Default for AggConfig {
    fn default() -> Self {
        Self {
            outer_terms_size: 200,
        }
    }
}

/// Compiles SELECT aggregates and GROUP BY clauses into an aggregation tree
#[derive(Debug, Clone, Default)]
pub struct AggTranslator {
    config: AggConfig,
}

impl AggTranslator {
    /// Translator with the default configuration
    pub fn new() -> Self {
        Self::with_config(AggConfig::default())
    }

    /// Translator with an explicit configuration
    pub fn with_config(config: AggConfig) -> Self {
        Self { config }
    }

    /// Translate a parsed statement into its aggregation tree
    pub fn translate(&self, stmt: &Statement) -> Result<AggTree> {
        match stmt {
            Statement::Query(query) => match query.body.as_ref() {
                SetExpr::Select(select) => self.translate_select(select),
                other => Err(AggError::UnsupportedStatement(format!(
                    "only plain SELECT queries are supported, got: {}",
                    other
                ))),
            },
            other => Err(AggError::UnsupportedStatement(format!(
                "only SELECT queries are supported, got: {}",
                other
            ))),
        }
    }

    /// Translate a SELECT body: metrics first, then the GROUP BY fold
    pub fn translate_select(&self, select: &Select) -> Result<AggTree> {
        let calls = extract_aggregate_calls(&select.projection);
        debug!("extracted {} aggregate calls from SELECT clause", calls.len());

        let metrics = compile_metrics(&calls);
        self.fold_group_by(&select.group_by, metrics)
    }

    /// Fold the GROUP BY items, last to first, each step returning a new
    /// single-key tree wrapping the tree built so far. The first item ends up
    /// outermost, the last sits directly above the metrics. The first bucket
    /// compilation error aborts the fold.
    fn fold_group_by(&self, group_by: &GroupByExpr, metrics: AggTree) -> Result<AggTree> {
        let exprs = match group_by {
            GroupByExpr::Expressions(exprs, _) => exprs,
            GroupByExpr::All(_) => {
                debug!("GROUP BY ALL carries no bucket columns, skipping");
                return Ok(metrics);
            }
        };

        let mut child = metrics;
        for (position, expr) in exprs.iter().enumerate().rev() {
            child = match expr {
                Expr::Identifier(ident) => {
                    compile_terms_bucket(&ident.value, self.terms_size(position), child)
                }
                Expr::CompoundIdentifier(idents) => {
                    // table.column groups on the column
                    let column = idents.last().map(|i| i.value.clone()).unwrap_or_default();
                    compile_terms_bucket(&column, self.terms_size(position), child)
                }
                Expr::Function(func) => compile_function_bucket(func, child)?,
                other => {
                    debug!("ignoring GROUP BY expression: {:?}", other);
                    child
                }
            };
        }

        Ok(child)
    }

    fn terms_size(&self, position: usize) -> u64 {
        if position == 0 {
            self.config.outer_terms_size
        } else {
            0
        }
    }
}
