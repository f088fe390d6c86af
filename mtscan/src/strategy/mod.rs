//! The two parallel execution strategies. Both guarantee the same output:
//! the total count first, then every finding in ascending
//! `(line_number, in_line_offset)` order, whatever the worker count.

pub mod divide_and_conquer;
pub mod round_robin;

pub use divide_and_conquer::divide_and_conquer;
pub use round_robin::round_robin;
