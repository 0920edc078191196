//! chained-hashmap: a single-threaded, string-keyed hash table built from
//! first principles, with enumeration in insertion order.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a separate-chaining table whose hashing, bucket layout, growth
//!   and ordering are all explicit and small enough to reason about.
//! - Layers:
//!   - `link`: owned chain nodes. A bucket slot owns the head link, each
//!     link owns its successor. Cursor helpers hand out `&mut` slots so
//!     splicing is a single `take`/assign.
//!   - `entry_log`: insertion-ordered doubly linked list of keys stored in
//!     a `SlotMap`. Each chain link remembers its log id, so unlinking is
//!     O(1).
//!   - `HashTable<V>`: the public map. Hashes, walks chains, grows, and
//!     keeps the bucket chains and the entry log in lockstep.
//!
//! Hashing
//! - Polynomial rolling hash with multiplier 31 over the key's UTF-16 code
//!   units, reduced modulo the capacity at every step. The result always
//!   lies in `[0, capacity)` but depends on the capacity, so growth must
//!   recompute every key's bucket.
//! - Not DoS resistant and not generic over key types; keys are strings.
//!
//! Growth
//! - Capacity starts at 16 and doubles before an insert that finds the
//!   table holding `capacity * 0.75` entries. It never shrinks, except that
//!   `clear()` returns to the initial 16.
//! - Growth moves the existing boxed links into the new bucket array
//!   without reallocating them. The entry log is untouched, so enumeration
//!   order survives growth.
//!
//! Traversal
//! - Every keyed operation hashes, checks the index against the bucket
//!   array, then walks the chain iteratively. The walk yields one of
//!   `Empty`, `NotFound { len }`, `Found { depth, link }` and each caller
//!   matches on it.
//! - An index outside the bucket array is reported as
//!   `TableError::IndexOutOfRange` before any mutation. A consistent table
//!   cannot produce it.
//!
//! Constraints
//! - Single-threaded: keys are shared between chain links and the entry
//!   log through `Rc<str>`, which keeps the table `!Send`/`!Sync`.
//! - Unique keys: inserting an existing key overwrites its value in place
//!   and keeps its enumeration position. Removing and re-inserting moves
//!   the key to the end.
//! - Iterators borrow the table, so the sequence they yield cannot change
//!   underneath them.
//!
//! Logging
//! - Uses the `log` facade: `debug!` on growth and `clear`, `trace!` per
//!   insert/remove. No logger is installed here.

mod entry_log;
mod error;
pub mod hash_table;
mod hash_table_proptest;
mod link;

// Public surface
pub use error::TableError;
pub use hash_table::{Entries, HashTable, Keys, Values, DEFAULT_CAPACITY, LOAD_FACTOR};
