//! CSV export of the recipient registry.

use crate::recipient::Recipient;

/// Header line of the export.
pub const CSV_HEADER: &str = "Numero";

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn push_field(out: &mut String, field: &str) {
    if needs_quotes(field) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// One-column CSV: the header, then one registered number per line in
/// registration order. Lines are joined with `\n`; there is no trailing
/// newline.
#[must_use]
pub fn recipients_csv(recipients: &[Recipient]) -> String {
    let mut out = String::from(CSV_HEADER);
    for recipient in recipients {
        out.push('\n');
        push_field(&mut out, recipient.as_str());
    }
    out
}
