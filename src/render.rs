use sweeper::Reporter;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Prints rounded tables with a `Total` footer to stdout
pub struct TableReporter;

impl TableReporter {
    fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
        let total = rows.len();
        let mut builder = Builder::default();
        builder.push_record(headers.iter().map(|h| h.to_string()));
        for row in rows {
            builder.push_record(row);
        }

        let footer = if headers.len() > 1 {
            let mut footer = vec![String::from("Total"), total.to_string()];
            footer.resize(headers.len(), String::new());
            footer
        } else {
            vec![format!("Total {total}")]
        };
        builder.push_record(footer);

        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }
}

impl Reporter for TableReporter {
    fn render(&self, headers: &[&str], rows: Vec<Vec<String>>) {
        println!("{}", Self::table(headers, rows));
    }

    fn notice(&self, message: &str) {
        println!("\n{message}");
    }
}
