//! Maps each occupied memory address back to the statement that put a byte
//! there, so a debugger built on top of `vcpu8::step` can show source
//! alongside execution (spec §4.3).

use std::collections::BTreeMap;

use crate::statement::Statement;

pub type SourceMap = BTreeMap<u8, Statement>;
