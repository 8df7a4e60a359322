use once_cell::sync::Lazy;

macro_rules! lazy_env_parse {
	($key:expr, $t:ty, $default:expr) => {
		Lazy::new(|| {
			std::env::var($key)
				.ok()
				.and_then(|s| s.parse::<$t>().ok())
				.unwrap_or($default)
		})
	};
}

/// The byte capacity of a single block in the block store.
pub static BLOCK_CAPACITY: Lazy<usize> =
	lazy_env_parse!("CSVDB_BLOCK_CAPACITY", usize, 1024 * 1024);

/// The maximum number of blocks a single query may hold live at once.
/// Exceeding this ceiling aborts the query.
pub static MAX_ACTIVE_BLOCKS: Lazy<usize> = lazy_env_parse!("CSVDB_MAX_ACTIVE_BLOCKS", usize, 100);

/// The depth of the bounded queue between a CSV producer thread and the
/// scan operator consuming its blocks.
pub static SCAN_QUEUE_DEPTH: Lazy<usize> = lazy_env_parse!("CSVDB_SCAN_QUEUE_DEPTH", usize, 4);

/// The publicly visible name of the engine
pub const ENGINE_NAME: &str = "csvdb";
