use crate::val::Kind;
use thiserror::Error;

/// The error type for everything that can go wrong while parsing,
/// validating, planning, or executing a query.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The statement text could not be tokenized or parsed
	#[error("Parse error at line {line}, column {column}: {message}")]
	SqlParse {
		line: usize,
		column: usize,
		message: String,
	},

	/// The statement parsed, but does not validate against the catalog
	#[error("Validation error: {0}")]
	SqlValidation(String),

	/// No operation is registered for this operator / operand combination
	#[error("Cannot execute {op} on {lhs} and {rhs}")]
	UnsupportedOperation {
		op: String,
		lhs: Kind,
		rhs: Kind,
	},

	/// No unary operation is registered for this operator / operand
	#[error("Cannot execute unary {op} on {rhs}")]
	UnsupportedUnaryOperation {
		op: String,
		rhs: Kind,
	},

	/// A value could not be converted into the requested type
	#[error("Cannot cast {from} value '{value}' into {into}")]
	Cast {
		from: Kind,
		into: Kind,
		value: String,
	},

	/// A CSV field could not be decoded. Recoverable: the offending row
	/// is skipped and scanning continues.
	#[error("CSV error in {file} at line {line}, column {column}, field {field}: {reason}")]
	CsvParse {
		file: String,
		line: usize,
		column: usize,
		field: usize,
		reason: String,
	},

	/// A block reader found a tag byte it did not expect. Indicates a
	/// producer bug and is terminal for the iterator.
	#[error(
		"Framing error in block {block} at offset {offset}: expected tag {expected:#04x}, found {actual:#04x}"
	)]
	Framing {
		expected: u8,
		actual: u8,
		block: u64,
		offset: usize,
	},

	/// The block manager refused to allocate beyond its ceiling
	#[error("Exceeded the maximum number of active blocks ({ceiling})")]
	TooManyActiveBlocks {
		ceiling: usize,
	},

	/// A block id was requested after the block had been released
	#[error("Block {0} not found")]
	BlockNotFound(u64),

	/// A single serialized value does not fit into an empty block
	#[error("Value of {size} bytes exceeds the block capacity of {capacity} bytes")]
	ValueTooLarge {
		size: usize,
		capacity: usize,
	},

	/// The table does not exist in the catalog
	#[error("Table '{0}' does not exist")]
	TableNotFound(String),

	/// The table already exists in the catalog
	#[error("Table '{0}' already exists")]
	TableExists(String),

	/// The mapping does not exist in the catalog
	#[error("Mapping '{0}' does not exist")]
	MappingNotFound(String),

	/// The column does not exist on the referenced table
	#[error("Column '{column}' does not exist on table '{table}'")]
	ColumnNotFound {
		table: String,
		column: String,
	},

	/// Integer or real division / modulo by zero
	#[error("Division by zero")]
	DivisionByZero,

	/// Integer arithmetic left the representable range
	#[error("Integer arithmetic overflow")]
	ArithmeticOverflow,

	/// A date, time, or timestamp field was out of range or malformed
	#[error("Invalid {field} value '{value}'")]
	DateTime {
		field: &'static str,
		value: String,
	},

	/// A function name could not be resolved in the registry
	#[error("Function '{0}' not found")]
	FunctionNotFound(String),

	/// A function was called with the wrong number of arguments
	#[error("Function '{name}' expects {expected} arguments, found {found}")]
	FunctionArity {
		name: String,
		expected: usize,
		found: usize,
	},

	/// The stack machine was asked to pop from an empty operand stack
	#[error("Expression stack exhausted")]
	StackExhausted,

	/// An underlying I/O error
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The catalog file on disk could not be read or written
	#[error("Catalog serialization error: {0}")]
	CatalogIo(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Whether the scan layer may recover from this error by skipping
	/// the current row.
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Error::CsvParse { .. })
	}
}
