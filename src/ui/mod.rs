pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    added, backend, banner, changed, error, label, note, placeholder, section, status, success,
    summary_row, toast, warn,
};
pub use progress::Spinner;
pub use table::{TableBuilder, projects_table, services_table, stats_table};
pub use theme::{theme, Theme};
