//! Twine - immutable, structurally shared ropes over encoded byte strings.
//!
//! A [`Rope`] is a byte string tagged with an [`Encoding`]. Concatenation,
//! substring and repetition build small tree nodes over the ropes they were
//! given instead of copying, and the bytes are only laid out contiguously
//! when somebody asks for them.
//!
//! # Quick Start
//!
//! ```
//! use twine::{CodeRange, Rope};
//!
//! let greeting = Rope::from("Hello, ");
//! let name = Rope::from("Wörld");
//! let line = greeting.concat(&name).unwrap();
//!
//! assert_eq!(line.bytes(), "Hello, Wörld".as_bytes());
//! assert_eq!(line.byte_len(), 13);
//! assert_eq!(line.char_len(), 12);
//! assert_eq!(line.code_range(), CodeRange::Valid);
//!
//! let world = line.char_range(7, 5).unwrap();
//! assert_eq!(world.bytes(), "Wörld".as_bytes());
//!
//! let ruler = Rope::from("-").repeat(40).unwrap();
//! assert_eq!(ruler.byte_len(), 40);
//! ```
//!
//! # Modules
//!
//! - [`node`]: the rope type, its metadata and flattening.
//! - [`tree`]: concat, substring and repeat with an explicit [`RopeConfig`].
//! - [`index`]: byte ↔ character offset translation.
//! - [`cache`]: interning of leaves.
//! - [`container`]: a swappable slot for strings that change.

pub mod cache;
pub mod code_range;
pub mod config;
pub mod container;
pub mod error;
pub mod hash;
pub mod index;
pub mod node;
pub mod stats;
pub mod tree;

pub use code_range::CodeRange;
pub use config::RopeConfig;
pub use encodings::Encoding;
pub use error::{Result, RopeError};
pub use index::IndexStrategy;
pub use node::Rope;
