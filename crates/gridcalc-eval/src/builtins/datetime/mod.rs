//! Calendar functions over date serials: DATE, YEAR, MONTH, DAY, EDATE, EOMONTH.
//!
//! Serials follow the workbook's [`DateSystem`](gridcalc_common::DateSystem);
//! under the 1900 system serial 60 is the phantom 1900-02-29.

mod date_parts;
mod edate_eomonth;

pub use date_parts::*;
pub use edate_eomonth::*;

use crate::function_registry::FunctionRegistry;

pub fn register_builtins(registry: &mut FunctionRegistry) {
    date_parts::register_builtins(registry);
    edate_eomonth::register_builtins(registry);
}
