pub mod controller_defs;
pub mod parser;

pub use controller_defs::*;
pub use parser::{ConfigLine, ConfigLines, ConfigToken, ConfigWriter};
