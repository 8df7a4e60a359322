//! The CSV producer thread.
//!
//! A [`BlockReader`] spawns one background thread which decodes CSV
//! rows into blocks and pushes the completed blocks into a bounded
//! queue. The scan operator consumes blocks on demand from the other
//! end; dropping the reader closes the queue, which the producer
//! observes on its next send and exits.

use crate::err::{Error, Result};
use crate::exe::block::{Block, BlockManager};
use crate::exe::csv::{CsvContext, CsvParser, RowSink};
use crate::exe::iter::BlockProvider;
use crate::val::{Date, Kind, Strand, Time, Timestamp, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Collects one row's callbacks into values, so a row is only written
/// to a block once the whole line decoded cleanly.
#[derive(Default)]
struct RowBuffer {
	row: Vec<Value>,
}

impl RowSink for RowBuffer {
	fn on_long(&mut self, value: i64, null: bool) -> Result<()> {
		self.row.push(if null {
			Value::null_of(Kind::Int)
		} else {
			Value::Int(value)
		});
		Ok(())
	}

	fn on_double(&mut self, value: f64, null: bool) -> Result<()> {
		self.row.push(if null {
			Value::null_of(Kind::Real)
		} else {
			Value::Real(value)
		});
		Ok(())
	}

	fn on_string(&mut self, value: &str, null: bool) -> Result<()> {
		self.row.push(if null {
			Value::null_of(Kind::String)
		} else {
			Value::Strand(Strand::from(value))
		});
		Ok(())
	}

	fn on_date(&mut self, value: Date, null: bool) -> Result<()> {
		self.row.push(if null {
			Value::null_of(Kind::Date)
		} else {
			Value::Date(value)
		});
		Ok(())
	}

	fn on_time(&mut self, value: Time, null: bool) -> Result<()> {
		self.row.push(if null {
			Value::null_of(Kind::Time)
		} else {
			Value::Time(value)
		});
		Ok(())
	}

	fn on_timestamp(&mut self, value: Timestamp, null: bool) -> Result<()> {
		self.row.push(if null {
			Value::null_of(Kind::Timestamp)
		} else {
			Value::Timestamp(value)
		});
		Ok(())
	}

	fn on_boolean(&mut self, value: bool, null: bool) -> Result<()> {
		self.row.push(if null {
			Value::null_of(Kind::Bool)
		} else {
			Value::Bool(value)
		});
		Ok(())
	}
}

/// Writes rows into blocks, shipping each block downstream once the
/// next value no longer fits.
struct BlockShipper {
	manager: BlockManager,
	sender: flume::Sender<Result<Block>>,
	block: Option<Block>,
}

enum Shipped {
	Accepted,
	ConsumerGone,
}

impl BlockShipper {
	fn block(&mut self) -> Result<&mut Block> {
		if self.block.is_none() {
			self.block = Some(self.manager.create()?);
		}
		Ok(self.block.as_mut().expect("block was just created"))
	}

	fn push_row(&mut self, row: &[Value]) -> Result<Shipped> {
		for value in row {
			if !self.block()?.add_value(value) {
				let mut full = self.block.take().expect("block was just filled");
				full.mark_next_block();
				if self.sender.send(Ok(full)).is_err() {
					return Ok(Shipped::ConsumerGone);
				}
				if !self.block()?.add_value(value) {
					return Err(Error::ValueTooLarge {
						size: value.to_string().len(),
						capacity: self.manager.capacity(),
					});
				}
			}
		}
		self.block()?.next_row();
		Ok(Shipped::Accepted)
	}

	fn finish(mut self) {
		if let Ok(block) = self.block() {
			block.end_blocks();
		}
		if let Some(block) = self.block.take() {
			let _ = self.sender.send(Ok(block));
		}
	}
}

/// The consumer handle of a CSV producer thread
pub struct BlockReader {
	receiver: flume::Receiver<Result<Block>>,
	handle: Option<JoinHandle<()>>,
}

impl BlockReader {
	/// Spawn the producer over the given files, which are decoded in
	/// order with a shared schema.
	pub fn spawn(
		files: Vec<PathBuf>,
		context: CsvContext,
		types: Vec<Kind>,
		manager: BlockManager,
	) -> BlockReader {
		let (sender, receiver) = flume::bounded(*crate::cnf::SCAN_QUEUE_DEPTH);
		let handle = std::thread::spawn(move || {
			produce(files, context, types, manager, sender);
		});
		BlockReader {
			receiver,
			handle: Some(handle),
		}
	}
}

impl BlockProvider for BlockReader {
	fn next_block(&mut self) -> Result<Option<Block>> {
		match self.receiver.recv() {
			Ok(Ok(block)) => Ok(Some(block)),
			Ok(Err(err)) => Err(err),
			Err(flume::RecvError::Disconnected) => Ok(None),
		}
	}
}

impl Drop for BlockReader {
	fn drop(&mut self) {
		// disconnecting the queue is the stop signal; the producer sees
		// it on its next send and exits, so the join cannot hang
		let (_, disconnected) = flume::bounded(0);
		drop(std::mem::replace(&mut self.receiver, disconnected));
		if let Some(handle) = self.handle.take() {
			let _ = handle.join();
		}
	}
}

fn produce(
	files: Vec<PathBuf>,
	context: CsvContext,
	types: Vec<Kind>,
	manager: BlockManager,
	sender: flume::Sender<Result<Block>>,
) {
	let mut shipper = BlockShipper {
		manager,
		sender: sender.clone(),
		block: None,
	};
	let mut skipped = 0usize;
	for file in &files {
		let context = CsvContext {
			file: file.display().to_string(),
			..context.clone()
		};
		let handle = match File::open(file) {
			Ok(handle) => handle,
			Err(err) => {
				let _ = sender.send(Err(Error::Io(err)));
				return;
			}
		};
		debug!(file = %context.file, "scanning csv source");
		let mut parser = CsvParser::new(context, BufReader::new(handle), types.clone());
		loop {
			let mut buffer = RowBuffer::default();
			match parser.parse_line(&mut buffer) {
				Ok(true) => match shipper.push_row(&buffer.row) {
					Ok(Shipped::Accepted) => (),
					Ok(Shipped::ConsumerGone) => return,
					Err(err) => {
						let _ = sender.send(Err(err));
						return;
					}
				},
				Ok(false) => break,
				// a bad row is diagnosed and skipped
				Err(err) if err.is_recoverable() => {
					warn!("{err}");
					skipped += 1;
				}
				Err(err) => {
					let _ = sender.send(Err(err));
					return;
				}
			}
		}
	}
	if skipped > 0 {
		debug!(skipped, "skipped malformed csv rows");
	}
	shipper.finish();
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::exe::iter::ForwardIter;
	use std::io::Write;

	fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
		let path = dir.path().join(name);
		let mut file = File::create(&path).unwrap();
		file.write_all(content.as_bytes()).unwrap();
		path
	}

	fn scan(files: Vec<PathBuf>, types: Vec<Kind>) -> Vec<Vec<Value>> {
		let manager = BlockManager::new(16, 256);
		let mut reader = BlockReader::spawn(files, CsvContext::default(), types.clone(), manager);
		let mut iter = ForwardIter::new(types);
		let mut rows = Vec::new();
		while let Some(row) = iter.next_row(&mut reader).unwrap() {
			rows.push(row);
		}
		rows
	}

	#[test]
	fn produces_rows_in_file_order() {
		let dir = tempfile::tempdir().unwrap();
		let a = write_file(&dir, "a.csv", "1,one\n2,two\n");
		let b = write_file(&dir, "b.csv", "3,three\n");
		let rows = scan(vec![a, b], vec![Kind::Int, Kind::String]);
		assert_eq!(rows.len(), 3);
		assert_eq!(rows[0][0], Value::Int(1));
		assert_eq!(rows[2][1], Value::from("three"));
	}

	#[test]
	fn malformed_rows_are_skipped() {
		let dir = tempfile::tempdir().unwrap();
		let file = write_file(&dir, "bad.csv", "1,one\nnot-a-number,two\n3,three\n");
		let rows = scan(vec![file], vec![Kind::Int, Kind::String]);
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0][0], Value::Int(1));
		assert_eq!(rows[1][0], Value::Int(3));
	}

	#[test]
	fn dropping_the_reader_stops_the_producer() {
		let dir = tempfile::tempdir().unwrap();
		let mut content = String::new();
		for n in 0..10_000 {
			content.push_str(&format!("{n},row-{n}\n"));
		}
		let file = write_file(&dir, "big.csv", &content);
		let manager = BlockManager::new(1024, 256);
		let reader = BlockReader::spawn(
			vec![file],
			CsvContext::default(),
			vec![Kind::Int, Kind::String],
			manager,
		);
		// dropping joins the producer thread without reading a row
		drop(reader);
	}
}
