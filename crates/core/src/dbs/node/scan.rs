//! Table and system-table scans.

use crate::cat::{system, Catalog, Mapping, Table};
use crate::dbs::node::Operator;
use crate::dbs::symbol::ColumnInfo;
use crate::err::Result;
use crate::exe::block::BlockManager;
use crate::exe::csv::CsvContext;
use crate::exe::iter::{ForwardIter, Row, RowProvider};
use crate::exe::reader::BlockReader;
use crate::val::Kind;
use std::path::PathBuf;
use tracing::debug;

/// Decodes the CSV files behind a mapped table, in file order. The
/// decode itself runs on a producer thread; this node consumes the
/// completed blocks on demand.
pub struct ScanNode {
	infos: Vec<ColumnInfo>,
	types: Vec<Kind>,
	files: Vec<PathBuf>,
	context: CsvContext,
	manager: BlockManager,
	reader: Option<BlockReader>,
	iter: ForwardIter,
}

impl ScanNode {
	pub fn new(
		table: &Table,
		mapping: &Mapping,
		files: Vec<PathBuf>,
		qualifier: &str,
		manager: BlockManager,
	) -> ScanNode {
		let infos = table
			.columns
			.iter()
			.map(|column| {
				ColumnInfo::new(Some(qualifier.to_string()), column.name.clone(), column.kind)
			})
			.collect();
		let types = table.column_kinds();
		let context = CsvContext {
			file: String::new(),
			delimiter: mapping.delimiter,
			skip_first_line: mapping.skip_first_line,
		};
		ScanNode {
			infos,
			iter: ForwardIter::new(types.clone()),
			types,
			files,
			context,
			manager,
			reader: None,
		}
	}
}

impl Operator for ScanNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		&self.infos
	}
}

impl RowProvider for ScanNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		if self.reader.is_none() {
			debug!(files = self.files.len(), "starting csv producer");
			self.reader = Some(BlockReader::spawn(
				self.files.clone(),
				self.context.clone(),
				self.types.clone(),
				self.manager.clone(),
			));
		}
		match &mut self.reader {
			Some(reader) => self.iter.next_row(reader),
			None => Ok(None),
		}
	}
}

/// Serves one of the virtual system tables from catalog state captured
/// at plan time.
pub struct SystemScanNode {
	infos: Vec<ColumnInfo>,
	rows: Vec<Row>,
	cursor: usize,
}

impl SystemScanNode {
	pub fn new(table: &Table, qualifier: &str, catalog: &Catalog) -> SystemScanNode {
		let infos = table
			.columns
			.iter()
			.map(|column| {
				ColumnInfo::new(Some(qualifier.to_string()), column.name.clone(), column.kind)
			})
			.collect();
		SystemScanNode {
			infos,
			rows: system::rows(&table.name, catalog),
			cursor: 0,
		}
	}
}

impl Operator for SystemScanNode {
	fn column_infos(&self) -> &[ColumnInfo] {
		&self.infos
	}
}

impl RowProvider for SystemScanNode {
	fn next_row(&mut self) -> Result<Option<Row>> {
		if self.cursor >= self.rows.len() {
			return Ok(None);
		}
		let row = self.rows[self.cursor].clone();
		self.cursor += 1;
		Ok(Some(row))
	}
}
