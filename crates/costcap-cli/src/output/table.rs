use std::io::{self, Write};
use tabled::builder::Builder;

use super::{Report, YEAR_COLUMNS};

/// Column titles for the scenario year table, matching [`YEAR_COLUMNS`].
const YEAR_TITLES: [&str; YEAR_COLUMNS.len()] = [
    "Year",
    "Policy year",
    "Regime",
    "Matrices",
    "Negative rho",
    "Files",
];

pub fn write_table<W: Write>(out: &mut W, report: &Report<'_>) -> io::Result<()> {
    match report {
        Report::Envelope {
            fields,
            warnings,
            methodology,
        } => {
            writeln!(out, "{}", field_table(fields))?;
            write_warnings(out, warnings)?;
            if let Some(m) = methodology {
                writeln!(out, "\nMethodology: {m}")?;
            }
        }
        Report::Years {
            key,
            rows,
            warnings,
        } => {
            if let Some(key) = key {
                writeln!(out, "Scenario: {key}")?;
            }
            let mut builder = Builder::default();
            builder.push_record(YEAR_TITLES);
            for row in rows {
                builder.push_record(row.iter().map(String::as_str));
            }
            writeln!(out, "{}", builder.build())?;
            write_warnings(out, warnings)?;
        }
        Report::Fields(fields) => writeln!(out, "{}", field_table(fields))?,
    }
    Ok(())
}

fn field_table(fields: &[(String, String)]) -> tabled::Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (field, value) in fields {
        builder.push_record([field.as_str(), value.as_str()]);
    }
    builder.build()
}

fn write_warnings<W: Write>(out: &mut W, warnings: &[&str]) -> io::Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }
    writeln!(out, "\nWarnings:")?;
    for w in warnings {
        writeln!(out, "  - {w}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &Report<'_>) -> String {
        let mut buf = Vec::new();
        write_table(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_envelope_lists_fields_then_warnings_and_methodology() {
        let report = Report::Envelope {
            fields: vec![("breakdown.cost_of_capital".into(), "0.0513".into())],
            warnings: vec!["Negative METR"],
            methodology: Some("METR = (rho - r + pi) / rho"),
        };
        let text = render(&report);
        let field = text.find("breakdown.cost_of_capital").unwrap();
        let warning = text.find("  - Negative METR").unwrap();
        let methodology = text.find("Methodology: METR").unwrap();
        assert!(field < warning && warning < methodology);
    }

    #[test]
    fn test_years_table_names_the_scenario() {
        let report = Report::Years {
            key: Some("tcja"),
            rows: vec![["2024", "2024", "static", "18", "0", "0"].map(String::from).to_vec()],
            warnings: Vec::new(),
        };
        let text = render(&report);
        assert!(text.starts_with("Scenario: tcja\n"));
        assert!(text.contains("Negative rho"));
        assert!(!text.contains("Warnings"));
    }
}
