//! Table formatting utilities

use prettytable::{Cell, Row, Table};

/// Create a two-column property table
pub fn create_property_table() -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(vec![
        Cell::new("Property").style_spec("b"),
        Cell::new("Value").style_spec("b"),
    ]));
    table
}

/// Add a property row to a table
pub fn add_property(table: &mut Table, name: &str, value: impl ToString) {
    table.add_row(Row::new(vec![
        Cell::new(name),
        Cell::new(&value.to_string()),
    ]));
}
