//! Reference-counted chunk cache for splice installs
//!
//! A chunk is usually shared by several files. Downloading it once and keeping
//! the decompressed payload around until the last part that needs it has been
//! written avoids refetching, while dropping it at that moment keeps memory
//! bounded by the set of chunks that still have pending parts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │          ChunkCache          │
//! │  get / put / consume         │
//! │  release_file                │
//! └──────────────────────────────┘
//!         │               │
//! ┌───────────────┐ ┌────────────┐
//! │ReferenceTracker│ │ CacheStats │
//! │ guid -> parts │ │ counters   │
//! └───────────────┘ └────────────┘
//! ```
//!
//! The tracker is seeded once from the selected files. Every chunk part is
//! then consumed exactly once, either by being written or by being released
//! because its file was already valid on disk or was abandoned.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use splice_cache::{ChunkCache, ReferenceTracker};
//! use splice_formats::ChunkGuid;
//! use splice_formats::manifest::{ChunkPart, ManifestFile};
//!
//! let guid = ChunkGuid::from_words([1, 1, 1, 1]);
//! let file = ManifestFile {
//!     file_name: "a.txt".to_string(),
//!     expected_sha1: [0; 20],
//!     chunk_parts: vec![ChunkPart::new(guid, 0, 5), ChunkPart::new(guid, 5, 5)],
//! };
//!
//! let mut cache = ChunkCache::new(ReferenceTracker::seed([&file]));
//! assert_eq!(cache.remaining_uses(&guid), 2);
//!
//! assert!(cache.put(guid, Bytes::from_static(b"HelloWorld")));
//! cache.consume(&guid);
//! assert!(cache.get(&guid).is_some());
//! cache.consume(&guid);
//! assert!(cache.get(&guid).is_none());
//! ```

#![warn(missing_docs)]

mod cache;
mod stats;
mod tracker;

pub use cache::ChunkCache;
pub use stats::CacheStats;
pub use tracker::ReferenceTracker;
