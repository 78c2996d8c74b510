use std::io::{self, Write};

use super::Report;

/// Headline measures, most specific first: `effective-rates` reports METR
/// next to its breakdown, `cost-of-capital` only the breakdown.
const HEADLINES: [&str; 4] = [
    "metr",
    "cost_of_capital",
    "breakdown.cost_of_capital",
    "mettr",
];

/// The single number a script usually wants, or one line per scenario year.
pub fn write_minimal<W: Write>(out: &mut W, report: &Report<'_>) -> io::Result<()> {
    match report {
        Report::Envelope { fields, .. } => {
            let headline = HEADLINES
                .iter()
                .find_map(|h| fields.iter().find(|(name, value)| name == h && !value.is_empty()));
            match headline.or_else(|| fields.first()) {
                Some((_, value)) => writeln!(out, "{value}"),
                None => Ok(()),
            }
        }
        Report::Years { rows, .. } => {
            for row in rows {
                writeln!(out, "{}", row.join(" "))?;
            }
            Ok(())
        }
        Report::Fields(fields) => {
            for (name, value) in fields {
                writeln!(out, "{name}: {value}")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &Report<'_>) -> String {
        let mut buf = Vec::new();
        write_minimal(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn envelope(fields: &[(&str, &str)]) -> Report<'static> {
        Report::Envelope {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            warnings: Vec::new(),
            methodology: None,
        }
    }

    #[test]
    fn test_metr_preferred_over_breakdown() {
        let report = envelope(&[
            ("breakdown.cost_of_capital", "0.0513"),
            ("eatr_domestic", "0.19"),
            ("metr", "0.2204"),
        ]);
        assert_eq!(render(&report), "0.2204\n");
    }

    #[test]
    fn test_cost_of_capital_headline() {
        let report = envelope(&[("cost_of_capital", "0.0513"), ("regime", "static")]);
        assert_eq!(render(&report), "0.0513\n");
    }
}
