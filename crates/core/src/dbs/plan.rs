//! Building the operator tree for a query.
//!
//! Planning resolves identifiers against child schemas, compiles the
//! expressions, picks the join strategy, and decides where the sort
//! sits relative to the projection. The only rewrites are local ones:
//! a single-equality inner join upgrades to a hash join, UNION without
//! ALL and SELECT DISTINCT become grouping passes.

use crate::cat::{system, Catalog};
use crate::dbs::compile::{self, CompiledExpr};
use crate::dbs::node::group::GroupNode;
use crate::dbs::node::join::{CrossJoinNode, HashJoinNode};
use crate::dbs::node::limit::LimitNode;
use crate::dbs::node::project::{ProjectNode, Projection};
use crate::dbs::node::scan::{ScanNode, SystemScanNode};
use crate::dbs::node::select::SelectNode;
use crate::dbs::node::sort::SortNode;
use crate::dbs::node::union::UnionNode;
use crate::dbs::node::{BoxedOperator, Operator};
use crate::dbs::symbol::{self, ColumnInfo};
use crate::err::{Error, Result};
use crate::exe::aggr::Aggregator;
use crate::exe::block::BlockManager;
use crate::exe::iter::SortOrder;
use crate::exe::vm::VariableStore;
use crate::sql::{
	AggregateOp, BinaryOperator, Expr, FromItem, Join, JoinKind, Literal, OrderBy, Query, Select,
	SelectItem, TableRef,
};
use crate::val::{Kind, Value};
use tracing::debug;

pub struct Planner<'a> {
	catalog: &'a Catalog,
	manager: BlockManager,
}

impl<'a> Planner<'a> {
	pub fn new(catalog: &'a Catalog, manager: BlockManager) -> Planner<'a> {
		Planner {
			catalog,
			manager,
		}
	}

	// ------------------------------------------------------------------
	// Queries

	pub fn plan_query(&self, query: &Query) -> Result<BoxedOperator> {
		match query {
			Query::Select(select) => self.plan_select(select),
			Query::Union {
				left,
				right,
				all,
			} => {
				let left = self.plan_query(left)?;
				let right = self.plan_query(right)?;
				let mut node: BoxedOperator = Box::new(UnionNode::new(left, right)?);
				if !all {
					node = Box::new(GroupNode::distinct(node, self.manager.clone()));
				}
				Ok(node)
			}
		}
	}

	fn plan_select(&self, select: &Select) -> Result<BoxedOperator> {
		let mut node = self.plan_from(&select.from)?;
		if let Some(selection) = &select.selection {
			let predicate = compile::compile(selection, node.column_infos())?;
			node = Box::new(SelectNode::new(node, predicate)?);
		}
		let grouped = !select.group_by.is_empty()
			|| select.items.iter().any(|item| {
				matches!(item, SelectItem::Expr { expr, .. } if expr.contains_aggregate())
			});
		if grouped {
			node = self.plan_group(node, select)?;
			if !select.order_by.is_empty() {
				let orders = resolve_sort(&select.order_by, node.column_infos())?;
				node = Box::new(SortNode::new(node, self.manager.clone(), orders));
			}
		} else {
			node = self.plan_projection(node, select)?;
		}
		if select.distinct {
			node = Box::new(GroupNode::distinct(node, self.manager.clone()));
		}
		if select.limit.is_some() || select.offset.is_some() {
			let limit = select.limit.as_ref().map(const_count).transpose()?;
			let offset = select.offset.as_ref().map(const_count).transpose()?.unwrap_or(0);
			node = Box::new(LimitNode::new(node, limit, offset));
		}
		Ok(node)
	}

	// ------------------------------------------------------------------
	// From clause

	fn plan_from(&self, from: &[FromItem]) -> Result<BoxedOperator> {
		if from.is_empty() {
			return Err(Error::SqlValidation("the from list is empty".into()));
		}
		let mut node: Option<BoxedOperator> = None;
		for item in from {
			let mut current = self.plan_scan(&item.table)?;
			for join in &item.joins {
				current = self.plan_join(current, join)?;
			}
			node = Some(match node {
				// comma-separated from entries form a cartesian product
				Some(left) => {
					Box::new(CrossJoinNode::new(left, current, self.manager.clone()))
				}
				None => current,
			});
		}
		Ok(node.expect("from list was checked to be non-empty"))
	}

	fn plan_scan(&self, table: &TableRef) -> Result<BoxedOperator> {
		let qualifier = table.output_name();
		if let Some(schema) = system::table(&table.name) {
			debug!(table = %table.name, "planning system table scan");
			return Ok(Box::new(SystemScanNode::new(&schema, qualifier, self.catalog)));
		}
		let schema = self.catalog.table(&table.name)?;
		let mapping = self.catalog.mapping(&table.name)?;
		let files = mapping.resolve(self.catalog.directory())?;
		debug!(table = %table.name, files = files.len(), "planning table scan");
		Ok(Box::new(ScanNode::new(
			&schema,
			mapping,
			files,
			qualifier,
			self.manager.clone(),
		)))
	}

	fn plan_join(&self, lhs: BoxedOperator, join: &Join) -> Result<BoxedOperator> {
		let rhs = self.plan_scan(&join.table)?;
		match join.kind {
			JoinKind::Cross => {
				Ok(Box::new(CrossJoinNode::new(lhs, rhs, self.manager.clone())))
			}
			JoinKind::Inner => {
				let on = join
					.on
					.as_ref()
					.ok_or_else(|| Error::SqlValidation("an inner join needs ON".into()))?;
				if let Some((lhs_key, rhs_key)) = equi_join_keys(on, &*lhs, &*rhs) {
					debug!("upgrading inner join to hash join");
					return Ok(Box::new(HashJoinNode::new(
						lhs,
						rhs,
						lhs_key,
						rhs_key,
						self.manager.clone(),
					)));
				}
				let cross = Box::new(CrossJoinNode::new(lhs, rhs, self.manager.clone()));
				let predicate = compile::compile(on, cross.column_infos())?;
				Ok(Box::new(SelectNode::new(cross, predicate)?))
			}
			kind => Err(Error::SqlValidation(format!("{kind} is not supported yet"))),
		}
	}

	// ------------------------------------------------------------------
	// Projection and sorting

	fn plan_projection(&self, node: BoxedOperator, select: &Select) -> Result<BoxedOperator> {
		let input_schema = node.column_infos().to_vec();
		let (projections, infos) = build_projection(&select.items, &input_schema)?;
		if select.order_by.is_empty() {
			return Ok(Box::new(ProjectNode::new(node, projections, infos)));
		}
		// sort keys may name columns the projection drops, so the sort
		// sits below it when they resolve against the scan schema, and
		// above it when they name select-list aliases instead
		match resolve_sort(&select.order_by, &input_schema) {
			Ok(orders) => {
				let sorted = Box::new(SortNode::new(node, self.manager.clone(), orders));
				Ok(Box::new(ProjectNode::new(sorted, projections, infos)))
			}
			Err(below) => {
				let project = Box::new(ProjectNode::new(node, projections, infos));
				match resolve_sort(&select.order_by, project.column_infos()) {
					Ok(orders) => {
						Ok(Box::new(SortNode::new(project, self.manager.clone(), orders)))
					}
					Err(_) => Err(below),
				}
			}
		}
	}

	// ------------------------------------------------------------------
	// Grouping

	fn plan_group(&self, node: BoxedOperator, select: &Select) -> Result<BoxedOperator> {
		let input_schema = node.column_infos().to_vec();
		// the grouping keys in declaration order
		let mut key_slots = Vec::with_capacity(select.group_by.len());
		for column in &select.group_by {
			key_slots.push(symbol::resolve(&input_schema, column)?);
		}
		// the projection feeding the group: keys first, aggregate
		// arguments appended
		let mut pre_projections: Vec<Projection> = Vec::new();
		let mut pre_infos: Vec<ColumnInfo> = Vec::new();
		for slot in &key_slots {
			pre_projections.push(Projection::Column(*slot));
			pre_infos.push(input_schema[*slot].clone());
		}
		let mut prototypes: Vec<Aggregator> = Vec::new();
		let mut input_indices: Vec<usize> = Vec::new();
		let mut output_infos: Vec<ColumnInfo> = Vec::new();
		let mut selected_keys: Vec<usize> = Vec::new();
		for item in &select.items {
			let (expr, alias) = match item {
				SelectItem::Expr {
					expr,
					alias,
				} => (expr, alias),
				_ => {
					return Err(Error::SqlValidation(
						"a wildcard cannot appear in a grouped select list".into(),
					))
				}
			};
			match expr {
				Expr::Aggregate {
					op,
					distinct,
					arg,
				} => {
					let arg_expr = match arg {
						Some(arg) => (**arg).clone(),
						None => Expr::Literal(Literal::Int(1)),
					};
					let compiled = compile::compile(&arg_expr, &input_schema)?;
					let input_kind = compiled.kind();
					if matches!(op, AggregateOp::Sum | AggregateOp::Avg)
						&& !input_kind.is_numeric()
					{
						return Err(Error::SqlValidation(format!(
							"{op} needs a numeric argument, found {input_kind}"
						)));
					}
					input_indices.push(pre_projections.len());
					pre_projections.push(to_projection(&arg_expr, compiled, &input_schema)?);
					pre_infos.push(ColumnInfo::new(None, arg_expr.to_string(), input_kind));
					prototypes.push(Aggregator::function(*op, input_kind, *distinct));
					let name = alias.clone().unwrap_or_else(|| expr.to_string());
					output_infos.push(ColumnInfo::new(
						None,
						name,
						Aggregator::output_kind(*op, input_kind),
					));
				}
				Expr::Column(column) => {
					let slot = symbol::resolve(&input_schema, column)?;
					let key = key_slots.iter().position(|s| *s == slot).ok_or_else(|| {
						Error::SqlValidation(format!(
							"column '{column}' must appear in the GROUP BY clause"
						))
					})?;
					selected_keys.push(key);
					input_indices.push(key);
					prototypes
						.push(Aggregator::pass_through(input_schema[slot].kind, false));
					let mut info = input_schema[slot].clone();
					if let Some(alias) = alias {
						info = ColumnInfo::new(None, alias.clone(), info.kind);
					}
					output_infos.push(info);
				}
				other => {
					return Err(Error::SqlValidation(format!(
						"'{other}' must be an aggregate or a grouping column"
					)))
				}
			}
		}
		// grouping keys that are not selected still flow through the
		// iterator, suppressed on output
		for key in 0..key_slots.len() {
			if !selected_keys.contains(&key) {
				input_indices.push(key);
				prototypes.push(Aggregator::pass_through(pre_infos[key].kind, true));
			}
		}
		let pre_project = Box::new(ProjectNode::new(node, pre_projections, pre_infos));
		let key_indices: Vec<usize> = (0..key_slots.len()).collect();
		let mut grouped: BoxedOperator = Box::new(GroupNode::new(
			pre_project,
			self.manager.clone(),
			key_indices,
			input_indices,
			prototypes,
			output_infos,
		));
		if let Some(having) = &select.having {
			let rewritten = rewrite_aggregates(having);
			let predicate = compile::compile(&rewritten, grouped.column_infos())?;
			grouped = Box::new(SelectNode::new(grouped, predicate)?);
		}
		Ok(grouped)
	}
}

/// A pure column reference passes through without re-evaluation
fn to_projection(
	expr: &Expr,
	compiled: CompiledExpr,
	schema: &[ColumnInfo],
) -> Result<Projection> {
	if let Expr::Column(column) = expr {
		return Ok(Projection::Column(symbol::resolve(schema, column)?));
	}
	Ok(Projection::Expr(compiled))
}

fn build_projection(
	items: &[SelectItem],
	schema: &[ColumnInfo],
) -> Result<(Vec<Projection>, Vec<ColumnInfo>)> {
	let mut projections = Vec::new();
	let mut infos = Vec::new();
	for item in items {
		match item {
			SelectItem::Wildcard => {
				for (slot, info) in schema.iter().enumerate() {
					projections.push(Projection::Column(slot));
					infos.push(info.clone());
				}
			}
			SelectItem::QualifiedWildcard(qualifier) => {
				let before = projections.len();
				for (slot, info) in schema.iter().enumerate() {
					let matches = info
						.qualifier
						.as_deref()
						.is_some_and(|q| q.eq_ignore_ascii_case(qualifier));
					if matches {
						projections.push(Projection::Column(slot));
						infos.push(info.clone());
					}
				}
				if projections.len() == before {
					return Err(Error::SqlValidation(format!(
						"unknown table or alias '{qualifier}'"
					)));
				}
			}
			SelectItem::Expr {
				expr,
				alias,
			} => {
				let compiled = compile::compile(expr, schema)?;
				let kind = compiled.kind();
				let info = match (expr, alias) {
					(_, Some(alias)) => ColumnInfo::new(None, alias.clone(), kind),
					(Expr::Column(column), None) => {
						schema[symbol::resolve(schema, column)?].clone()
					}
					(_, None) => ColumnInfo::new(None, expr.to_string(), kind),
				};
				projections.push(to_projection(expr, compiled, schema)?);
				infos.push(info);
			}
		}
	}
	Ok((projections, infos))
}

/// Resolve ORDER BY entries to column slots with directions
fn resolve_sort(order_by: &[OrderBy], schema: &[ColumnInfo]) -> Result<Vec<SortOrder>> {
	let mut orders = Vec::with_capacity(order_by.len());
	for order in order_by {
		let column = match &order.expr {
			Expr::Column(column) => column,
			other => {
				return Err(Error::SqlValidation(format!(
					"ORDER BY must name a column, found '{other}'"
				)))
			}
		};
		orders.push(SortOrder {
			index: symbol::resolve(schema, column)?,
			descending: order.descending,
		});
	}
	Ok(orders)
}

/// Replace aggregate calls with references to the select-list columns
/// carrying their results, so HAVING can compile against the group
/// output schema.
fn rewrite_aggregates(expr: &Expr) -> Expr {
	match expr {
		Expr::Aggregate {
			..
		} => Expr::Column(crate::sql::ColumnRef::new(None, expr.to_string())),
		Expr::Binary {
			op,
			left,
			right,
		} => Expr::binary(*op, rewrite_aggregates(left), rewrite_aggregates(right)),
		Expr::Unary {
			op,
			expr,
		} => Expr::unary(*op, rewrite_aggregates(expr)),
		Expr::Between {
			expr,
			negated,
			low,
			high,
		} => Expr::Between {
			expr: Box::new(rewrite_aggregates(expr)),
			negated: *negated,
			low: Box::new(rewrite_aggregates(low)),
			high: Box::new(rewrite_aggregates(high)),
		},
		Expr::InList {
			expr,
			negated,
			list,
		} => Expr::InList {
			expr: Box::new(rewrite_aggregates(expr)),
			negated: *negated,
			list: list.iter().map(rewrite_aggregates).collect(),
		},
		Expr::Like {
			expr,
			negated,
			pattern,
		} => Expr::Like {
			expr: Box::new(rewrite_aggregates(expr)),
			negated: *negated,
			pattern: pattern.clone(),
		},
		Expr::Cast {
			expr,
			into,
		} => Expr::Cast {
			expr: Box::new(rewrite_aggregates(expr)),
			into: *into,
		},
		Expr::Function {
			name,
			args,
		} => Expr::Function {
			name: name.clone(),
			args: args.iter().map(rewrite_aggregates).collect(),
		},
		Expr::Literal(_) | Expr::Column(_) => expr.clone(),
	}
}

/// Detect `left.column = right.column` across the two join sides
fn equi_join_keys(on: &Expr, lhs: &dyn Operator, rhs: &dyn Operator) -> Option<(usize, usize)> {
	let (left, right) = match on {
		Expr::Binary {
			op: BinaryOperator::Eq,
			left,
			right,
		} => (left, right),
		_ => return None,
	};
	let (left, right) = match (&**left, &**right) {
		(Expr::Column(left), Expr::Column(right)) => (left, right),
		_ => return None,
	};
	let keys = if let (Ok(l), Ok(r)) = (
		symbol::resolve(lhs.column_infos(), left),
		symbol::resolve(rhs.column_infos(), right),
	) {
		(l, r)
	} else if let (Ok(l), Ok(r)) = (
		symbol::resolve(lhs.column_infos(), right),
		symbol::resolve(rhs.column_infos(), left),
	) {
		(l, r)
	} else {
		return None;
	};
	let lhs_kind = lhs.column_infos()[keys.0].kind;
	let rhs_kind = rhs.column_infos()[keys.1].kind;
	// hashing compares exactly, which does not hold for the tolerant
	// real equality, so real keys stay on the nested loop path
	if lhs_kind != rhs_kind || lhs_kind == Kind::Real {
		return None;
	}
	Some(keys)
}

/// Evaluate a constant LIMIT / OFFSET count
fn const_count(expr: &Expr) -> Result<u64> {
	let compiled = compile::compile(expr, &[])?;
	match compiled.evaluate(&VariableStore::new())? {
		Value::Int(count) if count >= 0 => Ok(count as u64),
		other => Err(Error::SqlValidation(format!(
			"LIMIT and OFFSET need a non-negative integer, found '{other}'"
		))),
	}
}
