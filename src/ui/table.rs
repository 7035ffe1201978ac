use tabled::{settings::Style, Table, Tabled};
use crate::storage::Status;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) -> &mut Self {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn status_table(status: &Status) -> String {
    let mut builder = TableBuilder::new();
    builder
        .add_row("Total", status.total)
        .add_row("Pending", status.pending)
        .add_row("Done", status.done)
        .add_row("Progress", format!("{:.1}%", status.percent_done()));
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        let table = status_table(&Status { total: 2, pending: 1, done: 1 });
        assert!(table.contains("Pending"));
        assert!(table.contains("50.0%"));
        assert!(TableBuilder::new().build().is_empty());
    }
}
