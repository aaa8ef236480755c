//! Fee-rule catalog exported as CSV.
//!
//! Header: feeName,feeType,amount,applicableClasses,isActive
//! `applicableClasses` is `;`-separated. Column order is taken from the header.

use anyhow::{bail, Context, Result};
use feeledger_core::{FeeRule, FeeType};
use std::io::Read;
use std::path::Path;
use tracing::debug;

fn parse_active(s: &str) -> bool {
    !matches!(
        s.trim().to_lowercase().as_str(),
        "false" | "no" | "0" | "inactive"
    )
}

pub fn parse_fee_rules_csv(path: impl AsRef<Path>) -> Result<Vec<FeeRule>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_fee_rules_reader(file).with_context(|| format!("parsing {}", path.as_ref().display()))
}

pub fn parse_fee_rules_reader<R: Read>(reader: R) -> Result<Vec<FeeRule>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let (Some(name_col), Some(type_col), Some(amount_col)) =
        (col("feeName"), col("feeType"), col("amount"))
    else {
        bail!("fee rule CSV needs feeName, feeType and amount columns");
    };
    let classes_col = col("applicableClasses");
    let active_col = col("isActive");

    let mut rules = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let fee_name = record.get(name_col).unwrap_or("");
        if fee_name.is_empty() {
            continue;
        }

        let amount: f64 = match record.get(amount_col).unwrap_or("").replace(',', "").parse() {
            Ok(a) => a,
            Err(_) => {
                debug!(line = line + 2, fee = fee_name, "skipping fee rule with bad amount");
                continue;
            }
        };

        let fee_type: FeeType = record
            .get(type_col)
            .unwrap_or("")
            .parse()
            .unwrap_or(FeeType::Other);

        let classes = classes_col
            .and_then(|c| record.get(c))
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let mut rule = FeeRule::new(fee_name, fee_type, amount).with_classes(classes);
        rule.is_active = active_col
            .and_then(|c| record.get(c))
            .map(parse_active)
            .unwrap_or(true);
        rules.push(rule);
    }

    Ok(rules)
}
