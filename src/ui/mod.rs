pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, progress_bar, section, success, summary_row, warn};
pub use table::{status_table, TableBuilder};
pub use theme::{theme, Theme};
