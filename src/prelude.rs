/*!
Common imports used across the crate.
*/

pub use snafu::{ensure, OptionExt, ResultExt, Snafu};
