//! Log viewing command handlers.

use tabled::Tabled;

use netgate_api::NetgateClient;
use netgate_core::{BlockedPacket, LogEntry, LogQuery};

use crate::cli::{GlobalOpts, LogsArgs, LogsCommand};
use crate::error::CliError;
use crate::output;

use super::util::or_dash;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Request")]
    request: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "ms")]
    elapsed: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&LogEntry> for LogRow {
    fn from(e: &LogEntry) -> Self {
        let request = match (&e.method, &e.path) {
            (Some(m), Some(p)) => match &e.query_string {
                Some(q) => format!("{m} {p}?{q}"),
                None => format!("{m} {p}"),
            },
            _ => "-".into(),
        };
        Self {
            time: e.timestamp.format(TIME_FORMAT).to_string(),
            level: e.level.to_string(),
            source: or_dash(e.source_ip),
            request,
            status: or_dash(e.status_code),
            elapsed: or_dash(e.process_time_ms),
            message: e.message.clone(),
        }
    }
}

#[derive(Tabled)]
struct BlockedRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Packet")]
    line: String,
}

impl From<&BlockedPacket> for BlockedRow {
    fn from(b: &BlockedPacket) -> Self {
        Self {
            time: b.timestamp.format(TIME_FORMAT).to_string(),
            line: b.raw_log_line.clone(),
        }
    }
}

fn truncate<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

fn print_entries(entries: &[LogEntry], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(&global.output, entries, |e| LogRow::from(e), |e| {
        e.message.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    client: &NetgateClient,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LogsCommand::List { level, ip, limit } => {
            let query = LogQuery {
                level: level.map(Into::into),
                ip,
            };
            let entries = truncate(client.logs(&query).await?, limit);
            print_entries(&entries, global)
        }

        LogsCommand::Blocked { limit } => {
            let packets = truncate(client.blocked_packets().await?, limit);
            let out = output::render_list(&global.output, &packets, |b| BlockedRow::from(b), |b| {
                b.raw_log_line.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LogsCommand::Alerts => {
            let alerts = client.alerts().await?;
            print_entries(&alerts, global)
        }
    }
}
