//! Streaming iterators over block chains.
//!
//! Five flavors share one framing discipline: `Forward` streams blocks
//! from a producer and keeps at most two alive, `Caching` materializes
//! rows so they can be replayed, `Sorting` materializes and reorders a
//! side vector of row positions, `Grouping` hash-aggregates into a
//! result chain, and `Hashing` materializes the probe side of an
//! equi-join.

use crate::err::{Error, Result};
use crate::exe::aggr::Aggregator;
use crate::exe::block::{Block, BlockManager, TAG_END, TAG_NEXT_BLOCK, TAG_ROW_END};
use crate::val::{Kind, Value};
use ahash::AHashMap;
use std::cmp::Ordering;

/// One materialized row. Values are detached from their block, so a
/// row stays valid after the iterator advances.
pub type Row = Vec<Value>;

/// A producer of completed blocks, pulled by the forward iterator
pub trait BlockProvider {
	fn next_block(&mut self) -> Result<Option<Block>>;
}

/// A producer of rows, pulled by the materializing iterators
pub trait RowProvider {
	fn next_row(&mut self) -> Result<Option<Row>>;
}

/// The start position of a row inside a block chain
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockPosition {
	pub block: usize,
	pub offset: usize,
}

/// A sort key: the column index to compare and its direction
#[derive(Clone, Copy, Debug)]
pub struct SortOrder {
	pub index: usize,
	pub descending: bool,
}

// ----------------------------------------------------------------------
// Chain writing

/// Appends rows to a growing chain of blocks, spilling into a fresh
/// block whenever a value does not fit.
pub(crate) struct ChainWriter {
	manager: BlockManager,
	blocks: Vec<Block>,
}

impl ChainWriter {
	pub(crate) fn new(manager: BlockManager) -> Result<ChainWriter> {
		let first = manager.create()?;
		Ok(ChainWriter {
			manager,
			blocks: vec![first],
		})
	}

	fn current(&mut self) -> &mut Block {
		self.blocks.last_mut().expect("chain always holds one block")
	}

	fn spill(&mut self) -> Result<()> {
		self.current().mark_next_block();
		let block = self.manager.create()?;
		self.blocks.push(block);
		Ok(())
	}

	fn push_value(&mut self, value: &Value) -> Result<bool> {
		if self.current().add_value(value) {
			return Ok(false);
		}
		self.spill()?;
		if !self.current().add_value(value) {
			return Err(Error::ValueTooLarge {
				size: value.to_string().len(),
				capacity: self.manager.capacity(),
			});
		}
		Ok(true)
	}

	/// Append one row, returning the position of its first value
	pub(crate) fn push_row(&mut self, row: &[Value]) -> Result<BlockPosition> {
		let mut start = BlockPosition {
			block: self.blocks.len() - 1,
			offset: self.current().offset(),
		};
		for (n, value) in row.iter().enumerate() {
			let spilled = self.push_value(value)?;
			// a spill on the first value moves the row start with it
			if spilled && n == 0 {
				start = BlockPosition {
					block: self.blocks.len() - 1,
					offset: 0,
				};
			}
		}
		self.current().next_row();
		Ok(start)
	}

	/// Close the chain with the end-of-stream tag
	pub(crate) fn finish(mut self) -> Vec<Block> {
		self.current().end_blocks();
		self.blocks
	}
}

// ----------------------------------------------------------------------
// Chain reading

/// Decodes rows back out of a finished chain of blocks.
pub(crate) struct ChainReader {
	blocks: Vec<Block>,
	types: Vec<Kind>,
	current: usize,
	offset: usize,
	done: bool,
}

impl ChainReader {
	pub(crate) fn new(blocks: Vec<Block>, types: Vec<Kind>) -> ChainReader {
		ChainReader {
			blocks,
			types,
			current: 0,
			offset: 0,
			done: false,
		}
	}

	pub(crate) fn rewind(&mut self) {
		self.current = 0;
		self.offset = 0;
		self.done = false;
	}

	fn tag(&self) -> Result<u8> {
		self.blocks[self.current].tag_at(self.offset)
	}

	/// Decode the next row in stream order
	pub(crate) fn next_row(&mut self) -> Result<Option<Row>> {
		if self.done || self.blocks.is_empty() {
			return Ok(None);
		}
		if self.offset != 0 {
			let tag = self.tag()?;
			if tag != TAG_ROW_END {
				return Err(Error::Framing {
					expected: TAG_ROW_END,
					actual: tag,
					block: self.blocks[self.current].id(),
					offset: self.offset,
				});
			}
			self.offset += 1;
		}
		if self.tag()? == TAG_END {
			self.done = true;
			return Ok(None);
		}
		if self.tag()? == TAG_NEXT_BLOCK {
			self.current += 1;
			self.offset = 0;
		}
		let mut position = BlockPosition {
			block: self.current,
			offset: self.offset,
		};
		let row = decode_row(&self.blocks, &mut position, &self.types)?;
		self.current = position.block;
		self.offset = position.offset;
		Ok(Some(row))
	}

	/// Decode the row starting at an arbitrary recorded position,
	/// without touching the sequential cursor.
	pub(crate) fn row_at(&self, position: BlockPosition) -> Result<Row> {
		let mut position = position;
		decode_row(&self.blocks, &mut position, &self.types)
	}
}

/// Decode one full row at `position`, crossing block boundaries on the
/// continuation tag, and advance the position past the row's values.
fn decode_row(blocks: &[Block], position: &mut BlockPosition, types: &[Kind]) -> Result<Row> {
	let mut row = Row::with_capacity(types.len());
	for kind in types {
		if blocks[position.block].tag_at(position.offset)? == TAG_NEXT_BLOCK {
			position.block += 1;
			position.offset = 0;
		}
		let value = blocks[position.block].decode_value(&mut position.offset, *kind)?;
		row.push(value);
	}
	Ok(row)
}

// ----------------------------------------------------------------------
// Forward

/// Streams rows straight out of a block provider. At most two blocks
/// are alive at a time; the previous block is released as soon as the
/// cursor moves past a boundary.
pub struct ForwardIter {
	types: Vec<Kind>,
	block: Option<Block>,
	previous: Option<Block>,
	offset: usize,
	done: bool,
}

impl ForwardIter {
	pub fn new(types: Vec<Kind>) -> ForwardIter {
		ForwardIter {
			types,
			block: None,
			previous: None,
			offset: 0,
			done: false,
		}
	}

	fn advance_block(&mut self, provider: &mut dyn BlockProvider) -> Result<()> {
		let next = provider.next_block()?.ok_or(Error::Framing {
			expected: TAG_END,
			actual: TAG_NEXT_BLOCK,
			block: self.block.as_ref().map(|b| b.id()).unwrap_or(0),
			offset: self.offset,
		})?;
		// releasing the previous block hands it back to the manager
		self.previous = self.block.take();
		self.block = Some(next);
		self.offset = 0;
		Ok(())
	}

	pub fn next_row(&mut self, provider: &mut dyn BlockProvider) -> Result<Option<Row>> {
		if self.done {
			return Ok(None);
		}
		if self.block.is_none() {
			match provider.next_block()? {
				Some(block) => {
					self.block = Some(block);
					self.offset = 0;
				}
				None => {
					self.done = true;
					return Ok(None);
				}
			}
		}
		if self.offset != 0 {
			let block = self.block.as_ref().expect("block was just ensured");
			let tag = block.tag_at(self.offset)?;
			if tag != TAG_ROW_END {
				return Err(Error::Framing {
					expected: TAG_ROW_END,
					actual: tag,
					block: block.id(),
					offset: self.offset,
				});
			}
			self.offset += 1;
		}
		loop {
			let block = self.block.as_ref().expect("block was just ensured");
			match block.tag_at(self.offset)? {
				TAG_END => {
					self.done = true;
					return Ok(None);
				}
				TAG_NEXT_BLOCK => {
					self.advance_block(provider)?;
				}
				_ => break,
			}
		}
		let mut row = Row::with_capacity(self.types.len());
		for n in 0..self.types.len() {
			let kind = self.types[n];
			let block = self.block.as_ref().expect("block was just ensured");
			if block.tag_at(self.offset)? == TAG_NEXT_BLOCK {
				self.advance_block(provider)?;
			}
			let block = self.block.as_ref().expect("block was just ensured");
			let value = block.decode_value(&mut self.offset, kind)?;
			row.push(value);
		}
		Ok(Some(row))
	}
}

// ----------------------------------------------------------------------
// Caching

/// Materializes every upstream row once, then replays the cache any
/// number of times.
pub struct CachingIter {
	reader: Option<ChainReader>,
	types: Vec<Kind>,
}

impl CachingIter {
	pub fn new(types: Vec<Kind>) -> CachingIter {
		CachingIter {
			reader: None,
			types,
		}
	}

	/// Whether the upstream has been materialized yet
	pub fn filled(&self) -> bool {
		self.reader.is_some()
	}

	/// Pull the upstream dry and materialize it into the cache
	pub fn fill<P: RowProvider + ?Sized>(
		&mut self,
		provider: &mut P,
		manager: &BlockManager,
	) -> Result<()> {
		let mut writer = ChainWriter::new(manager.clone())?;
		while let Some(row) = provider.next_row()? {
			writer.push_row(&row)?;
		}
		self.reader = Some(ChainReader::new(writer.finish(), self.types.clone()));
		Ok(())
	}

	/// Reset the replay cursor to the first row
	pub fn rewind(&mut self) {
		if let Some(reader) = &mut self.reader {
			reader.rewind();
		}
	}

	pub fn next_row(&mut self) -> Result<Option<Row>> {
		match &mut self.reader {
			Some(reader) => reader.next_row(),
			None => Ok(None),
		}
	}
}

// ----------------------------------------------------------------------
// Sorting

/// Materializes the upstream, sorts a side vector of row positions,
/// then yields rows in sorted order.
pub struct SortingIter {
	types: Vec<Kind>,
	orders: Vec<SortOrder>,
	reader: Option<ChainReader>,
	rows: Vec<BlockPosition>,
	cursor: usize,
}

impl SortingIter {
	pub fn new(types: Vec<Kind>, orders: Vec<SortOrder>) -> SortingIter {
		SortingIter {
			types,
			orders,
			reader: None,
			rows: Vec::new(),
			cursor: 0,
		}
	}

	pub fn filled(&self) -> bool {
		self.reader.is_some()
	}

	pub fn fill<P: RowProvider + ?Sized>(
		&mut self,
		provider: &mut P,
		manager: &BlockManager,
	) -> Result<()> {
		let mut writer = ChainWriter::new(manager.clone())?;
		let mut rows = Vec::new();
		while let Some(row) = provider.next_row()? {
			rows.push(writer.push_row(&row)?);
		}
		let reader = ChainReader::new(writer.finish(), self.types.clone());
		// a stable sort keeps equal keys in source order
		let mut error = None;
		rows.sort_by(|a, b| {
			match compare_positions(&reader, *a, *b, &self.orders) {
				Ok(ordering) => ordering,
				Err(err) => {
					error.get_or_insert(err);
					Ordering::Equal
				}
			}
		});
		if let Some(err) = error {
			return Err(err);
		}
		self.rows = rows;
		self.reader = Some(reader);
		self.cursor = 0;
		Ok(())
	}

	pub fn next_row(&mut self) -> Result<Option<Row>> {
		let reader = match &self.reader {
			Some(reader) => reader,
			None => return Ok(None),
		};
		if self.cursor >= self.rows.len() {
			return Ok(None);
		}
		let row = reader.row_at(self.rows[self.cursor])?;
		self.cursor += 1;
		Ok(Some(row))
	}
}

fn compare_positions(
	reader: &ChainReader,
	left: BlockPosition,
	right: BlockPosition,
	orders: &[SortOrder],
) -> Result<Ordering> {
	let left = reader.row_at(left)?;
	let right = reader.row_at(right)?;
	for order in orders {
		let ordering = left[order.index].compare(&right[order.index]);
		let ordering = if order.descending {
			ordering.reverse()
		} else {
			ordering
		};
		if ordering != Ordering::Equal {
			return Ok(ordering);
		}
	}
	Ok(Ordering::Equal)
}

// ----------------------------------------------------------------------
// Grouping

/// Hash aggregation: one map entry per grouping key, one accumulator
/// per configured aggregate inside each entry. Draining the map builds
/// a result chain which is then replayed like a forward scan.
pub struct GroupingIter {
	output_types: Vec<Kind>,
	reader: Option<ChainReader>,
}

impl GroupingIter {
	pub fn new(output_types: Vec<Kind>) -> GroupingIter {
		GroupingIter {
			output_types,
			reader: None,
		}
	}

	pub fn filled(&self) -> bool {
		self.reader.is_some()
	}

	/// Consume the upstream, aggregating each row into its group.
	///
	/// `key_indices` name the grouping columns, `input_indices` name
	/// the input column feeding each prototype accumulator.
	pub fn fill<P: RowProvider + ?Sized>(
		&mut self,
		provider: &mut P,
		manager: &BlockManager,
		key_indices: &[usize],
		input_indices: &[usize],
		prototypes: &[Aggregator],
	) -> Result<()> {
		debug_assert_eq!(input_indices.len(), prototypes.len());
		let mut groups: AHashMap<Vec<Value>, Vec<Aggregator>> = AHashMap::new();
		while let Some(row) = provider.next_row()? {
			let key: Vec<Value> =
				key_indices.iter().map(|index| row[*index].clone()).collect();
			let aggregators = groups
				.entry(key)
				.or_insert_with(|| prototypes.iter().map(Aggregator::new_instance).collect());
			for (aggregator, index) in aggregators.iter_mut().zip(input_indices) {
				aggregator.step(&row[*index])?;
			}
		}
		// an aggregation without grouping keys always yields one row
		if key_indices.is_empty() && groups.is_empty() {
			groups.insert(Vec::new(), prototypes.iter().map(Aggregator::new_instance).collect());
		}
		let mut writer = ChainWriter::new(manager.clone())?;
		for aggregators in groups.values() {
			let mut row = Row::new();
			for aggregator in aggregators {
				if !aggregator.suppress() {
					row.push(aggregator.finalize()?);
				}
			}
			writer.push_row(&row)?;
		}
		self.reader = Some(ChainReader::new(writer.finish(), self.output_types.clone()));
		Ok(())
	}

	pub fn next_row(&mut self) -> Result<Option<Row>> {
		match &mut self.reader {
			Some(reader) => reader.next_row(),
			None => Ok(None),
		}
	}
}

// ----------------------------------------------------------------------
// Hashing

/// The probe side of an equi-join: materializes the upstream and
/// indexes each row start by its key column value.
pub struct HashingIter {
	types: Vec<Kind>,
	key_position: usize,
	reader: Option<ChainReader>,
	table: AHashMap<Value, Vec<BlockPosition>>,
	context: Vec<BlockPosition>,
	context_cursor: usize,
}

impl HashingIter {
	pub fn new(types: Vec<Kind>, key_position: usize) -> HashingIter {
		HashingIter {
			types,
			key_position,
			reader: None,
			table: AHashMap::new(),
			context: Vec::new(),
			context_cursor: 0,
		}
	}

	pub fn filled(&self) -> bool {
		self.reader.is_some()
	}

	pub fn fill<P: RowProvider + ?Sized>(
		&mut self,
		provider: &mut P,
		manager: &BlockManager,
	) -> Result<()> {
		let mut writer = ChainWriter::new(manager.clone())?;
		while let Some(row) = provider.next_row()? {
			let position = writer.push_row(&row)?;
			let key = row[self.key_position].clone();
			// null keys never match an equi-join predicate
			if !key.is_null() {
				self.table.entry(key).or_default().push(position);
			}
		}
		self.reader = Some(ChainReader::new(writer.finish(), self.types.clone()));
		Ok(())
	}

	/// Position the context cursor at the first row matching this key
	pub fn set_context_for_key(&mut self, key: &Value) {
		self.context = self.table.get(key).cloned().unwrap_or_default();
		self.context_cursor = 0;
	}

	/// The next row matching the current context key
	pub fn next_key_value_row(&mut self) -> Result<Option<Row>> {
		let reader = match &self.reader {
			Some(reader) => reader,
			None => return Ok(None),
		};
		if self.context_cursor >= self.context.len() {
			return Ok(None);
		}
		let row = reader.row_at(self.context[self.context_cursor])?;
		self.context_cursor += 1;
		Ok(Some(row))
	}

	/// A full scan over the materialized rows in insertion order
	pub fn next_row(&mut self) -> Result<Option<Row>> {
		match &mut self.reader {
			Some(reader) => reader.next_row(),
			None => Ok(None),
		}
	}

	/// Drop the cache and hash table so the iterator can be refilled
	pub fn reset(&mut self) {
		self.reader = None;
		self.table.clear();
		self.context.clear();
		self.context_cursor = 0;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sql::operator::AggregateOp;

	struct VecRows {
		rows: Vec<Row>,
		cursor: usize,
	}

	impl VecRows {
		fn new(rows: Vec<Row>) -> VecRows {
			VecRows {
				rows,
				cursor: 0,
			}
		}
	}

	impl RowProvider for VecRows {
		fn next_row(&mut self) -> Result<Option<Row>> {
			if self.cursor >= self.rows.len() {
				return Ok(None);
			}
			let row = self.rows[self.cursor].clone();
			self.cursor += 1;
			Ok(Some(row))
		}
	}

	fn manager() -> BlockManager {
		BlockManager::new(64, 256)
	}

	fn people() -> (Vec<Row>, Vec<Kind>) {
		let rows = vec![
			vec![Value::Int(1), Value::from("Lars")],
			vec![Value::Int(2), Value::from("Mark")],
			vec![Value::Int(3), Value::from("Grete")],
		];
		(rows, vec![Kind::Int, Kind::String])
	}

	#[test]
	fn caching_replays_identically_after_rewind() {
		let (rows, types) = people();
		let mut provider = VecRows::new(rows.clone());
		let mut iter = CachingIter::new(types);
		iter.fill(&mut provider, &manager()).unwrap();
		let mut first = Vec::new();
		while let Some(row) = iter.next_row().unwrap() {
			first.push(row);
		}
		iter.rewind();
		let mut second = Vec::new();
		while let Some(row) = iter.next_row().unwrap() {
			second.push(row);
		}
		assert_eq!(first, rows);
		assert_eq!(first, second);
		// exhausted means exhausted
		assert!(iter.next_row().unwrap().is_none());
	}

	#[test]
	fn caching_spills_across_small_blocks() {
		let (rows, types) = people();
		let mut provider = VecRows::new(rows.clone());
		let mut iter = CachingIter::new(types);
		// tiny blocks force continuation tags between values
		iter.fill(&mut provider, &BlockManager::new(64, 24)).unwrap();
		let mut out = Vec::new();
		while let Some(row) = iter.next_row().unwrap() {
			out.push(row);
		}
		assert_eq!(out, rows);
	}

	#[test]
	fn sorting_orders_and_breaks_ties_stably() {
		let rows = vec![
			vec![Value::Int(2), Value::from("b")],
			vec![Value::Int(1), Value::from("x")],
			vec![Value::Int(2), Value::from("a")],
		];
		let mut provider = VecRows::new(rows);
		let mut iter = SortingIter::new(
			vec![Kind::Int, Kind::String],
			vec![SortOrder {
				index: 0,
				descending: false,
			}],
		);
		iter.fill(&mut provider, &manager()).unwrap();
		let mut out = Vec::new();
		while let Some(row) = iter.next_row().unwrap() {
			out.push(row);
		}
		assert_eq!(out[0][0], Value::Int(1));
		// the two key ties keep their source order
		assert_eq!(out[1][1], Value::from("b"));
		assert_eq!(out[2][1], Value::from("a"));
	}

	#[test]
	fn sorting_descending() {
		let rows = vec![
			vec![Value::Int(1)],
			vec![Value::Int(3)],
			vec![Value::Int(2)],
		];
		let mut provider = VecRows::new(rows);
		let mut iter = SortingIter::new(
			vec![Kind::Int],
			vec![SortOrder {
				index: 0,
				descending: true,
			}],
		);
		iter.fill(&mut provider, &manager()).unwrap();
		let mut out = Vec::new();
		while let Some(row) = iter.next_row().unwrap() {
			out.push(row[0].clone());
		}
		assert_eq!(out, vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
	}

	#[test]
	fn grouping_counts_per_key() {
		let rows = vec![
			vec![Value::from("M"), Value::Int(10)],
			vec![Value::from("F"), Value::Int(20)],
			vec![Value::from("M"), Value::Int(30)],
		];
		let mut provider = VecRows::new(rows);
		let prototypes = vec![
			Aggregator::pass_through(Kind::String, false),
			Aggregator::function(AggregateOp::CountStar, Kind::Int, false),
			Aggregator::function(AggregateOp::Sum, Kind::Int, false),
		];
		let mut iter = GroupingIter::new(vec![Kind::String, Kind::Int, Kind::Int]);
		iter.fill(&mut provider, &manager(), &[0], &[0, 0, 1], &prototypes).unwrap();
		let mut out = Vec::new();
		while let Some(row) = iter.next_row().unwrap() {
			out.push(row);
		}
		out.sort_by(|a, b| a[0].compare(&b[0]));
		assert_eq!(out.len(), 2);
		assert_eq!(out[0], vec![Value::from("F"), Value::Int(1), Value::Int(20)]);
		assert_eq!(out[1], vec![Value::from("M"), Value::Int(2), Value::Int(60)]);
	}

	#[test]
	fn grouping_without_keys_yields_one_row_for_empty_input() {
		let mut provider = VecRows::new(Vec::new());
		let prototypes = vec![Aggregator::function(AggregateOp::CountStar, Kind::Int, false)];
		let mut iter = GroupingIter::new(vec![Kind::Int]);
		iter.fill(&mut provider, &manager(), &[], &[0], &prototypes).unwrap();
		let row = iter.next_row().unwrap().unwrap();
		assert_eq!(row, vec![Value::Int(0)]);
		assert!(iter.next_row().unwrap().is_none());
	}

	#[test]
	fn hashing_probes_by_key() {
		let rows = vec![
			vec![Value::Int(10), Value::from("A")],
			vec![Value::Int(20), Value::from("B")],
			vec![Value::Int(10), Value::from("C")],
		];
		let mut provider = VecRows::new(rows);
		let mut iter = HashingIter::new(vec![Kind::Int, Kind::String], 0);
		iter.fill(&mut provider, &manager()).unwrap();
		iter.set_context_for_key(&Value::Int(10));
		let mut matched = Vec::new();
		while let Some(row) = iter.next_key_value_row().unwrap() {
			matched.push(row[1].clone());
		}
		assert_eq!(matched, vec![Value::from("A"), Value::from("C")]);
		iter.set_context_for_key(&Value::Int(99));
		assert!(iter.next_key_value_row().unwrap().is_none());
	}

	#[test]
	fn hashing_full_scan_preserves_insertion_order() {
		let rows = vec![
			vec![Value::Int(10)],
			vec![Value::Int(20)],
		];
		let mut provider = VecRows::new(rows.clone());
		let mut iter = HashingIter::new(vec![Kind::Int], 0);
		iter.fill(&mut provider, &manager()).unwrap();
		let mut out = Vec::new();
		while let Some(row) = iter.next_row().unwrap() {
			out.push(row);
		}
		assert_eq!(out, rows);
	}
}
