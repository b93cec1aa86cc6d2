//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Lists render as
//! aligned columns; single resources render as indented JSON in both modes.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use triton_cloudapi::types::{
    Account, ChangeFeedEvent, FirewallRule, Image, Machine, Network, Nic, Package, Policy, Role,
    Snapshot, SshKey, User, Volume, Vpc,
};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay + ?Sized,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay + ?Sized,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// First group of a UUID, as the CLI shows ids in listings.
#[must_use]
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

/// Writes `rows` under `headers` with columns padded to their widest cell.
fn write_columns<W: Write>(
    writer: &mut W,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<(), CliError> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let line = |cells: Vec<&str>| -> String {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == last {
                    (*c).to_string()
                } else {
                    format!("{c:<width$}", width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };
    writeln!(writer, "{}", line(headers.to_vec()))?;
    for row in rows {
        writeln!(writer, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Renders a JSON value for a table cell: strings unquoted.
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

macro_rules! list_table {
    ($ty:ty, [$($header:literal),+], |$item:ident| $row:expr) => {
        impl TableDisplay for Vec<$ty> {
            fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
                let rows: Vec<Vec<String>> = self.iter().map(|$item| $row).collect();
                write_columns(writer, &[$($header),+], &rows)
            }
        }
    };
}

macro_rules! json_detail {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl TableDisplay for $ty {
                fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
                    serde_json::to_writer_pretty(&mut *writer, self)
                        .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                    writeln!(writer)?;
                    Ok(())
                }
            }
        )+
    };
}

json_detail!(
    Account, FirewallRule, Image, Machine, Network, Nic, Package, Policy, Role, Snapshot, SshKey,
    User, Volume, Vpc,
);

list_table!(Machine, ["SHORTID", "NAME", "STATE", "PRIMARYIP", "PACKAGE"], |m| vec![
    short_id(&m.id).to_string(),
    m.name.clone(),
    m.state.clone(),
    opt(m.primary_ip.as_deref()),
    opt(m.package.as_deref()),
]);

list_table!(Image, ["SHORTID", "NAME", "VERSION", "STATE", "PUBLISHED"], |i| vec![
    short_id(&i.id).to_string(),
    i.name.clone(),
    i.version.clone(),
    opt(i.state.as_deref()),
    opt(i.published_at.as_deref().map(|p| p.get(..10).unwrap_or(p))),
]);

list_table!(Package, ["SHORTID", "NAME", "MEMORY", "DISK", "VCPUS"], |p| vec![
    short_id(&p.id).to_string(),
    p.name.clone(),
    format!("{}M", p.memory),
    format!("{}M", p.disk),
    p.vcpus.to_string(),
]);

list_table!(Network, ["SHORTID", "NAME", "SUBNET", "PUBLIC"], |n| vec![
    short_id(&n.id).to_string(),
    n.name.clone(),
    opt(n.subnet.as_deref()),
    n.public.to_string(),
]);

list_table!(Vpc, ["SHORTID", "NAME", "SUBNET"], |v| vec![
    short_id(&v.id).to_string(),
    v.name.clone(),
    opt(v.subnet.as_deref()),
]);

list_table!(Volume, ["SHORTID", "NAME", "SIZE", "TYPE", "STATE"], |v| vec![
    short_id(&v.id).to_string(),
    v.name.clone(),
    opt(v.size.map(|s| format!("{s}M"))),
    opt(v.volume_type.as_deref()),
    opt(v.state.as_deref()),
]);

list_table!(FirewallRule, ["SHORTID", "ENABLED", "RULE"], |r| vec![
    short_id(&r.id).to_string(),
    r.enabled.to_string(),
    r.rule.clone(),
]);

list_table!(SshKey, ["FINGERPRINT", "NAME"], |k| vec![
    k.fingerprint.clone(),
    k.name.clone(),
]);

list_table!(User, ["SHORTID", "LOGIN", "EMAIL"], |u| vec![
    short_id(&u.id).to_string(),
    u.login.clone(),
    opt(u.email.as_deref()),
]);

list_table!(Role, ["SHORTID", "NAME", "MEMBERS"], |r| vec![
    short_id(&r.id).to_string(),
    r.name.clone(),
    r.members.len().to_string(),
]);

list_table!(Policy, ["SHORTID", "NAME", "RULES"], |p| vec![
    short_id(&p.id).to_string(),
    p.name.clone(),
    p.rules.len().to_string(),
]);

list_table!(Snapshot, ["NAME", "STATE", "CREATED"], |s| vec![
    s.name.clone(),
    s.state.clone(),
    opt(s.created.as_deref()),
]);

list_table!(Nic, ["MAC", "IP", "NETWORK", "STATE", "PRIMARY"], |n| vec![
    n.mac.clone(),
    opt(n.ip.as_deref()),
    opt(n.network.as_deref()),
    opt(n.state.as_deref()),
    n.primary.to_string(),
]);

/// Tags and metadata.
impl TableDisplay for BTreeMap<String, Value> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let rows: Vec<Vec<String>> = self.iter().map(|(k, v)| vec![k.clone(), cell(v)]).collect();
        write_columns(writer, &["KEY", "VALUE"], &rows)
    }
}

/// Role tags: one per line.
impl TableDisplay for Vec<String> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for tag in self {
            writeln!(writer, "{tag}")?;
        }
        Ok(())
    }
}

/// One change-feed event per line.
impl TableDisplay for ChangeFeedEvent {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "{}  {}  {}:{}",
            cell(&self.published),
            self.changed_resource_id,
            self.change_kind.resource,
            self.change_kind.sub_resources.join(",")
        )?;
        Ok(())
    }
}

/// Simple message for command results.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn machines() -> Vec<Machine> {
        vec![
            Machine {
                id: "b4f0b46c-1111-4000-8000-000000000001".into(),
                name: "web".into(),
                state: "running".into(),
                primary_ip: Some("10.0.0.5".into()),
                package: Some("g4-highcpu-1G".into()),
                ..Machine::default()
            },
            Machine {
                id: "c0ffee00-3333-4000-8000-000000000003".into(),
                name: "database-primary".into(),
                state: "stopped".into(),
                ..Machine::default()
            },
        ]
    }

    #[test]
    fn output_format_default_is_table() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt.format(), Format::Table);
        assert!(!fmt.is_json());
    }

    #[test]
    fn machine_list_table_output() {
        let out = OutputFormat::new(Format::Table)
            .to_string(&machines())
            .expect("should format");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("SHORTID   NAME              STATE"));
        assert!(lines[1].starts_with("b4f0b46c  web               running"));
        assert!(lines[2].contains("database-primary  stopped  -"));
    }

    #[test]
    fn machine_list_json_output() {
        let out = OutputFormat::new(Format::Json)
            .to_string(&machines())
            .expect("should format");
        let parsed: Value = serde_json::from_str(&out).expect("valid JSON");
        assert_eq!(parsed[0]["name"], "web");
        assert_eq!(parsed[1]["state"], "stopped");
    }

    #[test]
    fn single_resource_is_json_in_table_mode() {
        let out = OutputFormat::new(Format::Table)
            .to_string(&machines()[0])
            .expect("should format");
        assert!(out.contains("\"name\": \"web\""));
    }

    #[test]
    fn tags_table_unquotes_strings() {
        let tags: BTreeMap<String, Value> = [
            ("env".to_string(), json!("prod")),
            ("tier".to_string(), json!(2)),
        ]
        .into_iter()
        .collect();
        let out = OutputFormat::default().to_string(&tags).expect("should format");
        assert!(out.contains("env   prod"));
        assert!(out.contains("tier  2"));
    }

    #[test]
    fn message_success() {
        let out = OutputFormat::default()
            .to_string(&Message::success("Stopped instance web"))
            .expect("should format");
        assert_eq!(out, "✓ Stopped instance web\n");
    }

    #[test]
    fn short_id_of_non_uuid() {
        assert_eq!(short_id("b4f0b46c-1111-4000"), "b4f0b46c");
        assert_eq!(short_id("aa:bb"), "aa:bb");
    }
}
