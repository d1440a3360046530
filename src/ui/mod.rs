mod confirm;
mod output;
pub mod shell;

pub use confirm::{is_yes, TerminalConfirm};
pub use output::{
    render_identity, render_records, render_status, render_view, terminal_width, View,
};
