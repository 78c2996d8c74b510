use std::io::Write;

use super::{Report, YEAR_COLUMNS};

/// CSV on `out`: `field,value` pairs for single computations, one row per
/// year for scenario runs. Warnings go to stderr so the CSV stays clean.
pub fn write_csv<W: Write>(out: W, report: &Report<'_>) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);
    match report {
        Report::Envelope {
            fields, warnings, ..
        } => {
            write_fields(&mut wtr, fields)?;
            log_warnings(warnings);
        }
        Report::Years { rows, warnings, .. } => {
            wtr.write_record(YEAR_COLUMNS)?;
            for row in rows {
                wtr.write_record(row)?;
            }
            log_warnings(warnings);
        }
        Report::Fields(fields) => write_fields(&mut wtr, fields)?,
    }
    wtr.flush()?;
    Ok(())
}

fn write_fields<W: Write>(
    wtr: &mut csv::Writer<W>,
    fields: &[(String, String)],
) -> Result<(), csv::Error> {
    wtr.write_record(["field", "value"])?;
    for (field, value) in fields {
        wtr.write_record([field, value])?;
    }
    Ok(())
}

fn log_warnings(warnings: &[&str]) {
    for w in warnings {
        log::warn!("{w}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &Report<'_>) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_envelope_writes_field_value_pairs() {
        let report = Report::Envelope {
            fields: vec![
                ("cost_of_capital".into(), "0.0513".into()),
                ("regime".into(), "static".into()),
            ],
            warnings: vec!["ignored"],
            methodology: Some("rho"),
        };
        assert_eq!(
            render(&report),
            "field,value\ncost_of_capital,0.0513\nregime,static\n"
        );
    }

    #[test]
    fn test_year_rows_share_one_header() {
        let report = Report::Years {
            key: Some("baseline"),
            rows: vec![
                ["2024", "2024", "static", "18", "0", "18"].map(String::from).to_vec(),
                ["2035", "2029", "static", "18", "3", "0"].map(String::from).to_vec(),
            ],
            warnings: Vec::new(),
        };
        let text = render(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "year,policy_year,regime,matrices,negative_cost_of_capital,files"
        );
        assert_eq!(lines[2], "2035,2029,static,18,3,0");
    }
}
