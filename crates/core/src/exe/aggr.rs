//! Running aggregate accumulators.
//!
//! One [`Aggregator`] instance exists per aggregate column per group.
//! The grouping iterator steps every accumulator of a group with each
//! input row, then drains each non-suppressed accumulator once with
//! [`Aggregator::finalize`].

use crate::err::Result;
use crate::fnc::operate;
use crate::sql::operator::{AggregateOp, BinaryOperator};
use crate::val::{Kind, Value};
use ahash::AHashSet;
use std::cmp::Ordering;

enum State {
	Count {
		acc: Option<i64>,
	},
	CountStar {
		acc: i64,
	},
	Sum {
		acc: Option<Value>,
	},
	Avg {
		sum: Option<Value>,
		count: i64,
	},
	Min {
		acc: Option<Value>,
	},
	Max {
		acc: Option<Value>,
	},
	Arbitrary {
		acc: Option<Value>,
	},
	/// Carries a grouping column through to the output row. Suppressed
	/// instances exist only to keep the group key stable and are not
	/// drained.
	PassThrough {
		acc: Option<Value>,
	},
}

pub struct Aggregator {
	state: State,
	output: Kind,
	suppress: bool,
	seen: Option<AHashSet<Value>>,
}

impl Aggregator {
	/// An accumulator for a SQL aggregate call
	pub fn function(op: AggregateOp, input: Kind, distinct: bool) -> Aggregator {
		let state = match op {
			AggregateOp::Count => State::Count {
				acc: None,
			},
			AggregateOp::CountStar => State::CountStar {
				acc: 0,
			},
			AggregateOp::Sum => State::Sum {
				acc: None,
			},
			AggregateOp::Avg => State::Avg {
				sum: None,
				count: 0,
			},
			AggregateOp::Min => State::Min {
				acc: None,
			},
			AggregateOp::Max => State::Max {
				acc: None,
			},
			AggregateOp::Arbitrary => State::Arbitrary {
				acc: None,
			},
		};
		Aggregator {
			state,
			output: Self::output_kind(op, input),
			suppress: false,
			seen: distinct.then(AHashSet::new),
		}
	}

	/// A pass-through accumulator for a grouping column
	pub fn pass_through(input: Kind, suppress: bool) -> Aggregator {
		Aggregator {
			state: State::PassThrough {
				acc: None,
			},
			output: input,
			suppress,
			seen: None,
		}
	}

	/// The result kind of an aggregate over the given input kind
	pub fn output_kind(op: AggregateOp, input: Kind) -> Kind {
		match op {
			AggregateOp::Count | AggregateOp::CountStar => Kind::Int,
			AggregateOp::Sum
			| AggregateOp::Avg
			| AggregateOp::Min
			| AggregateOp::Max
			| AggregateOp::Arbitrary => input,
		}
	}

	/// A fresh accumulator with the same configuration
	pub fn new_instance(&self) -> Aggregator {
		let state = match &self.state {
			State::Count {
				..
			} => State::Count {
				acc: None,
			},
			State::CountStar {
				..
			} => State::CountStar {
				acc: 0,
			},
			State::Sum {
				..
			} => State::Sum {
				acc: None,
			},
			State::Avg {
				..
			} => State::Avg {
				sum: None,
				count: 0,
			},
			State::Min {
				..
			} => State::Min {
				acc: None,
			},
			State::Max {
				..
			} => State::Max {
				acc: None,
			},
			State::Arbitrary {
				..
			} => State::Arbitrary {
				acc: None,
			},
			State::PassThrough {
				..
			} => State::PassThrough {
				acc: None,
			},
		};
		Aggregator {
			state,
			output: self.output,
			suppress: self.suppress,
			seen: self.seen.as_ref().map(|_| AHashSet::new()),
		}
	}

	/// Whether this accumulator is excluded from the output row
	pub fn suppress(&self) -> bool {
		self.suppress
	}

	pub fn output(&self) -> Kind {
		self.output
	}

	/// Update the accumulator with one input value
	pub fn step(&mut self, value: &Value) -> Result<()> {
		// COUNT(*) counts rows, so it steps before the DISTINCT filter
		if let State::CountStar {
			acc,
		} = &mut self.state
		{
			*acc += 1;
			return Ok(());
		}
		if let Some(seen) = &mut self.seen {
			if !value.is_null() && !seen.insert(value.clone()) {
				return Ok(());
			}
		}
		match &mut self.state {
			State::CountStar {
				..
			} => unreachable!("handled above"),
			State::Count {
				acc,
			} => {
				if !value.is_null() {
					*acc = Some(acc.unwrap_or(0) + 1);
				}
			}
			State::Sum {
				acc,
			} => {
				if !value.is_null() {
					*acc = Some(match acc.take() {
						Some(sum) => operate::binary(BinaryOperator::Add, &sum, value)?,
						None => value.clone(),
					});
				}
			}
			State::Avg {
				sum,
				count,
			} => {
				if !value.is_null() {
					*sum = Some(match sum.take() {
						Some(sum) => operate::binary(BinaryOperator::Add, &sum, value)?,
						None => value.clone(),
					});
					*count += 1;
				}
			}
			State::Min {
				acc,
			} => {
				if !value.is_null() {
					match acc {
						Some(min) if value.compare(min) == Ordering::Less => {
							*acc = Some(value.clone())
						}
						None => *acc = Some(value.clone()),
						_ => (),
					}
				}
			}
			State::Max {
				acc,
			} => {
				if !value.is_null() {
					match acc {
						Some(max) if value.compare(max) == Ordering::Greater => {
							*acc = Some(value.clone())
						}
						None => *acc = Some(value.clone()),
						_ => (),
					}
				}
			}
			State::Arbitrary {
				acc,
			}
			| State::PassThrough {
				acc,
			} => {
				if acc.is_none() && !value.is_null() {
					*acc = Some(value.clone());
				}
			}
		}
		Ok(())
	}

	/// Produce the final value of this accumulator
	pub fn finalize(&self) -> Result<Value> {
		let null = Value::null_of(self.output);
		Ok(match &self.state {
			State::Count {
				acc,
			} => acc.map(Value::Int).unwrap_or(null),
			State::CountStar {
				acc,
			} => Value::Int(*acc),
			State::Sum {
				acc,
			}
			| State::Min {
				acc,
			}
			| State::Max {
				acc,
			}
			| State::Arbitrary {
				acc,
			}
			| State::PassThrough {
				acc,
			} => acc.clone().unwrap_or(null),
			State::Avg {
				sum,
				count,
			} => match sum {
				Some(sum) => operate::binary(BinaryOperator::Div, sum, &Value::Int(*count))?,
				None => null,
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(mut agg: Aggregator, input: &[Value]) -> Value {
		for value in input {
			agg.step(value).unwrap();
		}
		agg.finalize().unwrap()
	}

	fn ints(values: &[i64]) -> Vec<Value> {
		values.iter().copied().map(Value::Int).collect()
	}

	#[test]
	fn count_ignores_nulls() {
		let mut input = ints(&[1, 2, 3]);
		input.push(Value::null_of(Kind::Int));
		let agg = Aggregator::function(AggregateOp::Count, Kind::Int, false);
		assert_eq!(run(agg, &input), Value::Int(3));
	}

	#[test]
	fn count_over_all_nulls_is_null() {
		let input = vec![Value::null_of(Kind::Int); 3];
		let agg = Aggregator::function(AggregateOp::Count, Kind::Int, false);
		assert!(run(agg, &input).is_null());
	}

	#[test]
	fn count_star_counts_every_row() {
		let input = vec![Value::null_of(Kind::Int), Value::Int(1)];
		let agg = Aggregator::function(AggregateOp::CountStar, Kind::Int, false);
		assert_eq!(run(agg, &input), Value::Int(2));
	}

	#[test]
	fn sum_avg_min_max() {
		let input = ints(&[4, 1, 7]);
		assert_eq!(
			run(Aggregator::function(AggregateOp::Sum, Kind::Int, false), &input),
			Value::Int(12)
		);
		assert_eq!(
			run(Aggregator::function(AggregateOp::Avg, Kind::Int, false), &input),
			Value::Int(4)
		);
		assert_eq!(
			run(Aggregator::function(AggregateOp::Min, Kind::Int, false), &input),
			Value::Int(1)
		);
		assert_eq!(
			run(Aggregator::function(AggregateOp::Max, Kind::Int, false), &input),
			Value::Int(7)
		);
	}

	#[test]
	fn avg_of_reals_divides_exactly() {
		let input = vec![Value::Real(1.0), Value::Real(2.0)];
		let agg = Aggregator::function(AggregateOp::Avg, Kind::Real, false);
		assert_eq!(run(agg, &input), Value::Real(1.5));
	}

	#[test]
	fn arbitrary_keeps_the_first_non_null() {
		let input = vec![Value::null_of(Kind::Int), Value::Int(9), Value::Int(1)];
		let agg = Aggregator::function(AggregateOp::Arbitrary, Kind::Int, false);
		assert_eq!(run(agg, &input), Value::Int(9));
	}

	#[test]
	fn distinct_sum_skips_duplicates() {
		let input = ints(&[2, 2, 3]);
		let agg = Aggregator::function(AggregateOp::Sum, Kind::Int, true);
		assert_eq!(run(agg, &input), Value::Int(5));
	}

	#[test]
	fn empty_input_finalizes_to_null() {
		let agg = Aggregator::function(AggregateOp::Sum, Kind::Int, false);
		assert!(run(agg, &[]).is_null());
		let agg = Aggregator::function(AggregateOp::Avg, Kind::Real, false);
		assert!(run(agg, &[]).is_null());
	}
}
